//! Telegram HTML rendering for alerts

use crate::data::{CanonicalFiling, CanonicalTrade, Direction};
use crate::sources::sec::item_title;
use rust_decimal::{Decimal, RoundingStrategy};

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

pub fn format_count(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// `$1,234.50` with `dp` decimals
pub fn format_usd(amount: Decimal, dp: usize) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(dp as u32, RoundingStrategy::MidpointAwayFromZero);
    let rendered = format!("{:.*}", dp, rounded);
    let (whole, fraction) = match rendered.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (rendered.as_str(), None),
    };

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{}${}.{}", sign, group_thousands(whole), fraction),
        None => format!("{}${}", sign, group_thousands(whole)),
    }
}

pub fn render_trade(trade: &CanonicalTrade) -> String {
    let icon = match trade.direction {
        Direction::Buy => "🟢",
        Direction::Sell => "🔴",
    };
    let price = trade
        .price_per_share
        .map(|p| format_usd(p, 2))
        .unwrap_or_else(|| "n/a".to_string());
    let value = trade
        .total_value
        .map(|v| format_usd(v, 0))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "🚨 <b>New Insider Trade</b>\n\n\
         Ticker: <b>{symbol}</b>\n\
         Type: {icon} <b>{direction}</b>\n\
         Insider: {name}\n\
         Shares: {shares}\n\
         Price: {price}\n\
         Value: {value}\n\
         Date: {date}\n\
         Code: {code} ({description})\n\n\
         <a href=\"{link}\">View SEC Filing</a>",
        symbol = escape_html(&trade.symbol),
        icon = icon,
        direction = trade.direction,
        name = escape_html(&trade.insider_name),
        shares = format_count(trade.shares),
        price = price,
        value = value,
        date = trade.transaction_date,
        code = escape_html(&trade.transaction_code),
        description = escape_html(&trade.transaction_description),
        link = escape_html(&trade.source_link),
    )
}

pub fn render_filing(filing: &CanonicalFiling) -> String {
    let items = if filing.items.is_empty() {
        "not identified".to_string()
    } else {
        filing
            .items
            .iter()
            .map(|code| match item_title(code) {
                Some(title) => format!("\n• {} {}", code, escape_html(title)),
                None => format!("\n• {}", code),
            })
            .collect::<String>()
    };

    format!(
        "📋 <b>New Form {form} Filing</b>\n\n\
         Ticker: <b>{symbol}</b>\n\
         Items: {items}\n\
         Report Date: {report}\n\
         Filed: {filed}\n\n\
         <a href=\"{link}\">View 8-K Filing</a>",
        form = escape_html(&filing.form_type),
        symbol = escape_html(&filing.symbol),
        items = items,
        report = filing.report_date,
        filed = filing.filed_date,
        link = escape_html(&filing.report_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ItemSet;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade() -> CanonicalTrade {
        CanonicalTrade {
            id: "id".to_string(),
            symbol: "NVDA".to_string(),
            insider_name: "Smith & <Jones>".to_string(),
            direction: Direction::Buy,
            shares: 1_234_567,
            price_per_share: Some(dec!(852.5)),
            total_value: Some(dec!(1052469367.5)),
            shares_owned_after: 0,
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            filing_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            transaction_code: "P".to_string(),
            transaction_description: "Open market purchase".to_string(),
            source_link: "https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&CIK=NVDA".to_string(),
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec!(852.5), 2), "$852.50");
        assert_eq!(format_usd(dec!(100000), 0), "$100,000");
        assert_eq!(format_usd(dec!(-1234.567), 2), "-$1,234.57");
    }

    #[test]
    fn test_render_trade_escapes_and_formats() {
        let message = render_trade(&trade());
        assert!(message.contains("Ticker: <b>NVDA</b>"));
        assert!(message.contains("Smith &amp; &lt;Jones&gt;"));
        assert!(message.contains("Shares: 1,234,567"));
        assert!(message.contains("Price: $852.50"));
        assert!(message.contains("Value: $1,052,469,368"));
        assert!(message.contains("CIK=NVDA\">View SEC Filing"));
        assert!(message.contains("&amp;CIK=NVDA"));
    }

    #[test]
    fn test_render_trade_unknown_value() {
        let mut t = trade();
        t.price_per_share = None;
        t.total_value = None;
        let message = render_trade(&t);
        assert!(message.contains("Price: n/a"));
        assert!(message.contains("Value: n/a"));
    }

    #[test]
    fn test_render_filing_items() {
        let mut items = ItemSet::new();
        items.insert("5.02".to_string());
        let filing = CanonicalFiling {
            id: "f".to_string(),
            symbol: "AAPL".to_string(),
            form_type: "8-K".to_string(),
            filed_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            accepted_date: "2024-05-02 16:30:32".to_string(),
            report_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            report_url: "https://www.sec.gov/x.htm".to_string(),
            access_number: "0000320193-24-000069".to_string(),
            items,
        };

        let message = render_filing(&filing);
        assert!(message.contains("5.02 Departure or Appointment of Directors or Officers"));
        assert!(message.contains("Report Date: 2024-05-01"));

        let mut bare = filing;
        bare.items.clear();
        assert!(render_filing(&bare).contains("Items: not identified"));
    }
}
