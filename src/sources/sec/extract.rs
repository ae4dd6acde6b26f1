//! Text heuristics for 8-K documents.
//!
//! Everything here works on plain text; run HTML through [`html_to_text`]
//! first. All functions are pure so they can be exercised with fixture
//! documents.

use crate::data::ItemSet;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Standard 8-K item codes and their titles
pub const ITEM_CODES: &[(&str, &str)] = &[
    ("1.01", "Entry into a Material Definitive Agreement"),
    ("1.02", "Termination of a Material Definitive Agreement"),
    ("1.03", "Bankruptcy or Receivership"),
    ("1.04", "Mine Safety"),
    ("1.05", "Material Cybersecurity Incidents"),
    ("2.01", "Completion of Acquisition or Disposition of Assets"),
    ("2.02", "Results of Operations and Financial Condition"),
    ("2.03", "Creation of a Direct Financial Obligation"),
    ("2.04", "Triggering Events That Accelerate a Financial Obligation"),
    ("2.05", "Costs Associated with Exit or Disposal Activities"),
    ("2.06", "Material Impairments"),
    ("3.01", "Notice of Delisting or Failure to Satisfy a Listing Rule"),
    ("3.02", "Unregistered Sales of Equity Securities"),
    ("3.03", "Material Modification to Rights of Security Holders"),
    ("4.01", "Changes in Registrant's Certifying Accountant"),
    ("4.02", "Non-Reliance on Previously Issued Financial Statements"),
    ("5.01", "Changes in Control of Registrant"),
    ("5.02", "Departure or Appointment of Directors or Officers"),
    ("5.03", "Amendments to Articles of Incorporation or Bylaws"),
    ("5.04", "Temporary Suspension of Trading Under Employee Benefit Plans"),
    ("5.05", "Amendments to the Code of Ethics"),
    ("5.06", "Change in Shell Company Status"),
    ("5.07", "Submission of Matters to a Vote of Security Holders"),
    ("5.08", "Shareholder Director Nominations"),
    ("6.01", "ABS Informational and Computational Material"),
    ("6.02", "Change of Servicer or Trustee"),
    ("6.03", "Change in Credit Enhancement"),
    ("6.04", "Failure to Make a Required Distribution"),
    ("6.05", "Securities Act Updating Disclosure"),
    ("7.01", "Regulation FD Disclosure"),
    ("8.01", "Other Events"),
    ("9.01", "Financial Statements and Exhibits"),
];

/// Characters searched on either side of a "Date of Report" label
const LABEL_WINDOW: usize = 200;

/// Only the cover page is searched for a bare date
const HEADER_SPAN: usize = 4000;

pub fn item_title(code: &str) -> Option<&'static str> {
    ITEM_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, title)| *title)
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?is)<(script|style)[^>]*>.*?</(script|style)>|<[^>]*>")
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"\s+")
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)\bitems?\s*(\d{1,2})\s*\.\s*(\d{2})\b")
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)date\s+of\s+report")
}

fn long_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(
        &RE,
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+(\d{1,2}),?\s+(\d{4})\b",
    )
}

fn slash_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"\b(\d{4})-(\d{2})-(\d{2})\b")
}

/// Strip markup and decode the entities filings actually use
pub fn html_to_text(html: &str) -> String {
    let stripped = tag_re().replace_all(html, " ");

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#xa0;", " ")
        .replace("&#xA0;", " ")
        .replace("&#8211;", "-")
        .replace("&#8212;", "-")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&#8217;", "'")
        .replace("&rsquo;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    whitespace_re().replace_all(&decoded, " ").trim().to_string()
}

/// Item codes mentioned in the text, restricted to the known vocabulary
pub fn extract_items(text: &str) -> ItemSet {
    item_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let major: u32 = caps[1].parse().ok()?;
            let code = format!("{}.{}", major, &caps[2]);
            item_title(&code).map(|_| code)
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct DateHit {
    start: usize,
    end: usize,
    date: NaiveDate,
}

fn month_number(name: &str) -> Option<u32> {
    let month = match &name.to_ascii_lowercase()[..3] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Every parseable date in the text, in position order
fn find_dates(text: &str) -> Vec<DateHit> {
    let mut hits = Vec::new();

    for caps in long_date_re().captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        let date = month_number(&caps[1]).and_then(|month| {
            let day = caps[2].parse().ok()?;
            let year = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        });
        if let Some(date) = date {
            hits.push(DateHit { start: whole.start(), end: whole.end(), date });
        }
    }

    for caps in slash_date_re().captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        let date = (|| {
            let month = caps[1].parse().ok()?;
            let day = caps[2].parse().ok()?;
            let year = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })();
        if let Some(date) = date {
            hits.push(DateHit { start: whole.start(), end: whole.end(), date });
        }
    }

    for caps in iso_date_re().captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        let date = (|| {
            let year = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let day = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })();
        if let Some(date) = date {
            hits.push(DateHit { start: whole.start(), end: whole.end(), date });
        }
    }

    hits.sort_by_key(|hit| hit.start);
    hits
}

/// Report date from the cover page.
///
/// Attempts in order, first match wins:
/// 1. first date within the window after a "Date of Report" label
/// 2. last date within the window before the label (table layouts put
///    the date above its caption)
/// 3. first month-name date in the document header
pub fn extract_report_date(text: &str) -> Option<NaiveDate> {
    let hits = find_dates(text);
    if hits.is_empty() {
        return None;
    }

    let labels: Vec<_> = label_re().find_iter(text).collect();

    for label in &labels {
        let limit = label.end() + LABEL_WINDOW;
        if let Some(hit) = hits
            .iter()
            .find(|hit| hit.start >= label.end() && hit.start <= limit)
        {
            return Some(hit.date);
        }
    }

    for label in &labels {
        let floor = label.start().saturating_sub(LABEL_WINDOW);
        if let Some(hit) = hits
            .iter()
            .rev()
            .find(|hit| hit.end <= label.start() && hit.start >= floor)
        {
            return Some(hit.date);
        }
    }

    let header_end = HEADER_SPAN.min(text.len());
    long_date_re()
        .find_iter(text)
        .take_while(|m| m.start() < header_end)
        .find_map(|m| hits.iter().find(|hit| hit.start == m.start()).map(|hit| hit.date))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVER_PAGE: &str = r#"
        <html><body>
        <p style="text-align:center">UNITED STATES<br/>SECURITIES AND EXCHANGE COMMISSION</p>
        <p>FORM 8-K</p>
        <p>Date of Report (Date of earliest event reported):&nbsp;<b>October&#160;30, 2024</b></p>
        <p>Apple Inc.</p>
        <p><b>Item&nbsp;2.02</b> Results of Operations and Financial Condition.</p>
        <p><b>Item 9.01</b> Financial Statements and Exhibits.</p>
        <p>Item 99.99 is not a thing.</p>
        </body></html>
    "#;

    #[test]
    fn test_html_to_text_strips_tags_and_entities() {
        let text = html_to_text("<p>A&nbsp;&amp;&#160;B</p><script>var x = 1;</script><b>C</b>");
        assert_eq!(text, "A & B C");
    }

    #[test]
    fn test_extract_items_from_cover_page() {
        let items = extract_items(&html_to_text(COVER_PAGE));
        let codes: Vec<_> = items.iter().map(String::as_str).collect();
        assert_eq!(codes, vec!["2.02", "9.01"]);
    }

    #[test]
    fn test_extract_items_ignores_unknown_and_dedups() {
        let items = extract_items("Item 5.02 ... ITEM 5.02 again, item 7.01, Item 10.01, Item 05.07");
        let codes: Vec<_> = items.iter().map(String::as_str).collect();
        assert_eq!(codes, vec!["5.02", "5.07", "7.01"]);
    }

    #[test]
    fn test_extract_items_empty_when_none() {
        assert!(extract_items("Press release attached as exhibit.").is_empty());
    }

    #[test]
    fn test_report_date_after_label() {
        let date = extract_report_date(&html_to_text(COVER_PAGE));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 10, 30));
    }

    #[test]
    fn test_report_date_before_label() {
        let text = "FORM 8-K CURRENT REPORT March 5, 2024 (Date of Report) Commission File 001-36743";
        assert_eq!(extract_report_date(text), NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn test_report_date_numeric_formats() {
        assert_eq!(
            extract_report_date("Date of report: 07/15/2024"),
            NaiveDate::from_ymd_opt(2024, 7, 15)
        );
        assert_eq!(
            extract_report_date("Date of Report: 2024-07-16"),
            NaiveDate::from_ymd_opt(2024, 7, 16)
        );
    }

    #[test]
    fn test_report_date_header_fallback() {
        let text = "CURRENT REPORT Pursuant to Section 13 Dated Sept. 9, 2024 Tesla, Inc.";
        assert_eq!(extract_report_date(text), NaiveDate::from_ymd_opt(2024, 9, 9));
    }

    #[test]
    fn test_report_date_none_without_dates() {
        assert_eq!(extract_report_date("Date of Report: to be announced"), None);
        assert_eq!(extract_report_date(""), None);
    }

    #[test]
    fn test_invalid_calendar_dates_are_skipped() {
        let text = "Date of Report: February 30, 2024 then February 28, 2024";
        assert_eq!(extract_report_date(text), NaiveDate::from_ymd_opt(2024, 2, 28));
    }

    #[test]
    fn test_item_title_lookup() {
        assert_eq!(item_title("8.01"), Some("Other Events"));
        assert_eq!(item_title("8.02"), None);
    }
}
