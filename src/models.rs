use chrono::NaiveDate;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone)]
pub struct TickerRecord {
    pub ticker: String,
    pub history_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FinancialRow {
    pub ticker: String,
    pub year: i32,
    pub revenue: f64,
    pub net_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceCategory {
    Listing,
    Trading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateEvidence {
    pub date: NaiveDate,
    pub category: EvidenceCategory,
}

/// Dates found in one history text, split by category. Unsorted, may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceSet {
    pub listing: Vec<NaiveDate>,
    pub trading: Vec<NaiveDate>,
}

impl EvidenceSet {
    pub fn push(&mut self, evidence: DateEvidence) {
        match evidence.category {
            EvidenceCategory::Listing => self.listing.push(evidence.date),
            EvidenceCategory::Trading => self.trading.push(evidence.date),
        }
    }

    /// Most recent trading date, falling back to the most recent listing date.
    pub fn latest_qualifying(&self) -> Option<NaiveDate> {
        self.trading
            .iter()
            .max()
            .or_else(|| self.listing.iter().max())
            .copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    Eligible,
    NoData,
    NoQualifyingDate,
    NotOnExchange,
    ListedUnderMinimum,
}

impl VerdictReason {
    pub fn label(&self) -> &'static str {
        match self {
            VerdictReason::Eligible => "eligible (>= 5 years on HOSE)",
            VerdictReason::NoData => "no data",
            VerdictReason::NoQualifyingDate => "no qualifying date found",
            VerdictReason::NotOnExchange => "not on the exchange",
            VerdictReason::ListedUnderMinimum => "listed under 5 years",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityVerdict {
    pub ticker: String,
    #[serde(serialize_with = "serialize_day_first")]
    pub last_qualifying_date: Option<NaiveDate>,
    pub years_active: Option<f64>,
    pub passed: bool,
    pub reason: VerdictReason,
    pub history_text: Option<String>,
}

pub fn format_day_first(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn serialize_day_first<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(date) => serializer.serialize_some(&format_day_first(*date)),
        None => serializer.serialize_none(),
    }
}
