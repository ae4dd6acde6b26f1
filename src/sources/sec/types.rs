use crate::sources::types::RawFiling;
use serde::Deserialize;

/// `submissions/CIK##########.json` response, trimmed to what we read
#[derive(Debug, Clone, Deserialize)]
pub struct Submissions {
    #[serde(default)]
    pub cik: String,

    #[serde(default)]
    pub filings: SubmissionFilings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionFilings {
    #[serde(default)]
    pub recent: RecentFilings,
}

/// Column-oriented filing history: entry `i` is spread across every array
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    #[serde(default)]
    pub form: Vec<String>,

    #[serde(default)]
    pub filing_date: Vec<String>,

    #[serde(default)]
    pub acceptance_date_time: Vec<String>,

    #[serde(default)]
    pub accession_number: Vec<String>,

    #[serde(default)]
    pub primary_document: Vec<String>,

    #[serde(default)]
    pub report_date: Vec<String>,
}

/// One zipped row of [`RecentFilings`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecentFiling<'a> {
    pub form: &'a str,
    pub filing_date: &'a str,
    pub acceptance_date_time: &'a str,
    pub accession_number: &'a str,
    pub primary_document: &'a str,
    pub report_date: &'a str,
}

impl RecentFilings {
    /// Zip the parallel arrays by index. Rows missing from any required
    /// column are dropped; `reportDate` and `acceptanceDateTime` are
    /// optional and read as empty.
    pub fn entries(&self) -> impl Iterator<Item = RecentFiling<'_>> {
        let rows = self
            .form
            .len()
            .min(self.filing_date.len())
            .min(self.accession_number.len())
            .min(self.primary_document.len());

        (0..rows).map(move |i| RecentFiling {
            form: &self.form[i],
            filing_date: &self.filing_date[i],
            acceptance_date_time: self
                .acceptance_date_time
                .get(i)
                .map(String::as_str)
                .unwrap_or(""),
            accession_number: &self.accession_number[i],
            primary_document: &self.primary_document[i],
            report_date: self.report_date.get(i).map(String::as_str).unwrap_or(""),
        })
    }
}

impl RecentFiling<'_> {
    /// `{archive}/{unpadded cik}/{accession without dashes}/{primary document}`
    pub fn document_url(&self, archive_base: &str, cik: u64) -> String {
        format!(
            "{}/{}/{}/{}",
            archive_base.trim_end_matches('/'),
            cik,
            self.accession_number.replace('-', ""),
            self.primary_document
        )
    }

    pub fn to_raw(&self, archive_base: &str, cik: u64) -> RawFiling {
        let accepted = if self.acceptance_date_time.is_empty() {
            self.filing_date
        } else {
            self.acceptance_date_time
        };

        RawFiling {
            access_number: self.accession_number.to_string(),
            form: self.form.to_string(),
            filed_date: self.filing_date.to_string(),
            accepted_date: accepted.to_string(),
            report_url: self.document_url(archive_base, cik),
            report_date: Some(self.report_date.to_string()).filter(|d| !d.is_empty()),
        }
    }
}
