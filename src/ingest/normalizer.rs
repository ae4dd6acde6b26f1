//! Raw provider records to canonical records.
//!
//! Pure and deterministic: the same raw input always yields the same id
//! and fields, which is what makes cross-run dedup work.

use crate::data::{CanonicalFiling, CanonicalTrade, Direction};
use crate::error::NormalizeError;
use crate::sources::types::{Enrichment, RawFiling, RawTrade};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept in an id
const ID_DIGEST_BYTES: usize = 12;

/// Human-readable meaning of a Form 4 transaction code
pub fn transaction_description(code: &str) -> &'static str {
    match code {
        "P" => "Open market purchase",
        "S" => "Open market sale",
        "A" => "Grant/award",
        "D" => "Sale to issuer",
        "F" => "Tax withholding",
        "I" => "Discretionary transaction",
        "M" => "Exercise/conversion",
        "C" => "Conversion",
        "E" => "Expiration",
        "G" => "Gift",
        "L" => "Small acquisition",
        "W" => "Acquisition/disposition by will",
        "Z" => "Deposit/withdrawal from voting trust",
        _ => "Other",
    }
}

/// EDGAR Form 4 listing for the issuer
pub fn insider_filings_link(symbol: &str) -> String {
    format!(
        "https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&CIK={}&type=4&dateb=&owner=include&count=100",
        symbol
    )
}

fn digest_id(symbol: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(symbol.as_bytes());
    for part in parts {
        hasher.update(b"|");
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    format!("{}-{}", symbol, hex::encode(&digest[..ID_DIGEST_BYTES]))
}

/// Id of a trade: symbol, insider, transaction date, share count and signed change
pub fn trade_id(
    symbol: &str,
    insider_name: &str,
    transaction_date: NaiveDate,
    shares: u64,
    signed_change: i64,
) -> String {
    digest_id(
        symbol,
        &[
            insider_name,
            &transaction_date.to_string(),
            &shares.to_string(),
            &signed_change.to_string(),
        ],
    )
}

/// Id of a filing: symbol, acceptance timestamp and accession number.
/// Computable before enrichment so seen filings never hit the network.
pub fn filing_id(symbol: &str, raw: &RawFiling) -> String {
    digest_id(symbol, &[raw.accepted_date.trim(), raw.access_number.trim()])
}

/// Accepts `2024-05-02`, `2024-05-02 00:00:00` and `2024-05-02T16:30:11.000Z`
fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, NormalizeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NormalizeError::MissingField(field));
    }

    value
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| NormalizeError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

fn whole_number(field: &'static str, value: f64) -> Result<i64, NormalizeError> {
    if !value.is_finite() || value.abs() > i64::MAX as f64 {
        return Err(NormalizeError::InvalidValue {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.round() as i64)
}

pub fn normalize_trade(raw: &RawTrade, symbol: &str) -> Result<CanonicalTrade, NormalizeError> {
    let insider_name = raw.name.trim();
    if insider_name.is_empty() {
        return Err(NormalizeError::MissingField("name"));
    }

    let signed_change = whole_number(
        "change",
        raw.change.ok_or(NormalizeError::MissingField("change"))?,
    )?;
    let shares = signed_change.unsigned_abs();

    let transaction_date = parse_date(
        "transactionDate",
        raw.transaction_date.as_deref().unwrap_or(""),
    )?;
    // Late filings still carry a transaction date; fall back to it
    let filing_date = match raw.filing_date.as_deref() {
        Some(date) if !date.trim().is_empty() => parse_date("filingDate", date)?,
        _ => transaction_date,
    };

    let shares_owned_after = match raw.share {
        Some(share) => whole_number("share", share)?,
        None => 0,
    };

    // Unknown or zero price means unknown value, not a zero-value trade
    let price_per_share = raw.transaction_price.filter(|p| *p > Decimal::ZERO);
    let total_value = match price_per_share {
        Some(price) => Some(price.checked_mul(Decimal::from(shares)).ok_or_else(|| {
            NormalizeError::InvalidValue {
                field: "transactionPrice",
                value: price.to_string(),
            }
        })?),
        None => None,
    };

    let code = raw.transaction_code.trim().to_uppercase();

    Ok(CanonicalTrade {
        id: trade_id(symbol, insider_name, transaction_date, shares, signed_change),
        symbol: symbol.to_string(),
        insider_name: insider_name.to_string(),
        direction: Direction::from_change(signed_change),
        shares,
        price_per_share,
        total_value,
        shares_owned_after,
        transaction_date,
        filing_date,
        transaction_description: transaction_description(&code).to_string(),
        transaction_code: code,
        source_link: insider_filings_link(symbol),
    })
}

/// Report date preference: extracted from the document, then the
/// provider's own report date, then the filed date.
pub fn normalize_filing(
    raw: &RawFiling,
    symbol: &str,
    enrichment: &Enrichment,
) -> Result<CanonicalFiling, NormalizeError> {
    if raw.access_number.trim().is_empty() {
        return Err(NormalizeError::MissingField("accessNumber"));
    }

    let filed_date = parse_date("filedDate", &raw.filed_date)?;
    let accepted_date = if raw.accepted_date.trim().is_empty() {
        raw.filed_date.trim().to_string()
    } else {
        raw.accepted_date.trim().to_string()
    };

    let provider_report_date = raw
        .report_date
        .as_deref()
        .and_then(|d| parse_date("reportDate", d).ok());
    let report_date = enrichment
        .report_date
        .or(provider_report_date)
        .unwrap_or(filed_date);

    let id = filing_id(symbol, raw);

    Ok(CanonicalFiling {
        id,
        symbol: symbol.to_string(),
        form_type: raw.form.trim().to_string(),
        filed_date,
        accepted_date,
        report_date,
        report_url: raw.report_url.trim().to_string(),
        access_number: raw.access_number.trim().to_string(),
        items: enrichment.items.clone(),
    })
}
