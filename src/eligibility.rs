use chrono::NaiveDate;

use crate::dates::DateParser;
use crate::evidence::{DateEvidenceExtractor, ExchangeVocabulary};
use crate::models::{EligibilityVerdict, TickerRecord, VerdictReason};

pub const DEFAULT_MIN_YEARS_ACTIVE: f64 = 5.0;

/// Decides whether a ticker has been trading on HOSE long enough.
#[derive(Debug, Clone)]
pub struct ListingEligibilityEvaluator {
    extractor: DateEvidenceExtractor,
    as_of: NaiveDate,
    min_years_active: f64,
}

impl ListingEligibilityEvaluator {
    pub fn new(as_of: NaiveDate, vocabulary: ExchangeVocabulary) -> Self {
        Self {
            extractor: DateEvidenceExtractor::new(DateParser::for_date(as_of), vocabulary),
            as_of,
            min_years_active: DEFAULT_MIN_YEARS_ACTIVE,
        }
    }

    pub fn with_min_years(mut self, min_years_active: f64) -> Self {
        self.min_years_active = min_years_active;
        self
    }

    pub fn evaluate(&self, ticker: &str, history_text: Option<&str>) -> EligibilityVerdict {
        let mut verdict = EligibilityVerdict {
            ticker: ticker.to_string(),
            last_qualifying_date: None,
            years_active: None,
            passed: false,
            reason: VerdictReason::NoData,
            history_text: history_text.map(str::to_string),
        };

        let Some(text) = history_text.filter(|text| !text.is_empty()) else {
            return verdict;
        };

        let Some(last_date) = self.extractor.extract(text).latest_qualifying() else {
            verdict.reason = VerdictReason::NoQualifyingDate;
            return verdict;
        };

        let years_active = years_between(last_date, self.as_of);
        let long_enough = years_active >= self.min_years_active;
        let on_exchange = self.extractor.vocabulary().mentioned_in(&text.to_lowercase());

        verdict.last_qualifying_date = Some(last_date);
        verdict.years_active = Some(years_active);
        verdict.passed = long_enough && on_exchange;
        verdict.reason = match (long_enough, on_exchange) {
            (true, true) => VerdictReason::Eligible,
            (true, false) => VerdictReason::NotOnExchange,
            (false, _) => VerdictReason::ListedUnderMinimum,
        };
        verdict
    }

    pub fn evaluate_all(&self, records: &[TickerRecord]) -> Vec<EligibilityVerdict> {
        records
            .iter()
            .map(|record| {
                let verdict = self.evaluate(&record.ticker, record.history_text.as_deref());
                tracing::debug!(
                    ticker = %verdict.ticker,
                    passed = verdict.passed,
                    reason = verdict.reason.label(),
                    "listing verdict"
                );
                verdict
            })
            .collect()
    }
}

/// Whole days divided by 365, rounded to two decimals.
pub fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    let days = (to - from).num_days() as f64;
    (days / 365.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn evaluator() -> ListingEligibilityEvaluator {
        ListingEligibilityEvaluator::new(as_of(), ExchangeVocabulary::default())
    }

    #[test]
    fn missing_history_is_no_data() {
        for text in [None, Some("")] {
            let verdict = evaluator().evaluate("AAA", text);
            assert!(!verdict.passed);
            assert_eq!(verdict.reason, VerdictReason::NoData);
            assert_eq!(verdict.years_active, None);
        }
    }

    #[test]
    fn text_without_evidence_has_no_qualifying_date() {
        let verdict = evaluator().evaluate("AAA", Some("Công ty thành lập năm 1995 tại Hà Nội."));
        assert!(!verdict.passed);
        assert_eq!(verdict.reason, VerdictReason::NoQualifyingDate);
    }

    #[test]
    fn exactly_five_years_of_trading_passes() {
        let start = as_of() - Duration::days(5 * 365);
        let text = format!(
            "Ngày {} cổ phiếu bắt đầu giao dịch trên HOSE.",
            start.format("%d/%m/%Y")
        );
        let verdict = evaluator().evaluate("AAA", Some(&text));
        assert_eq!(verdict.last_qualifying_date, Some(start));
        assert_eq!(verdict.years_active, Some(5.0));
        assert!(verdict.passed);
        assert_eq!(verdict.reason, VerdictReason::Eligible);
    }

    #[test]
    fn recent_listing_fails_but_keeps_audit_fields() {
        let text = "Ngày 02/03/2024 niêm yết trên HOSE.";
        let verdict = evaluator().evaluate("BBB", Some(text));
        assert!(!verdict.passed);
        assert_eq!(verdict.reason, VerdictReason::ListedUnderMinimum);
        assert_eq!(
            verdict.last_qualifying_date,
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
        assert!(verdict.years_active.is_some());
    }

    #[test]
    fn year_zero_fragment_is_not_evidence() {
        let verdict = evaluator().evaluate("AAA", Some("Niêm yết trên HOSE ngày 01/01/0000"));
        assert!(!verdict.passed);
        assert_eq!(verdict.reason, VerdictReason::NoQualifyingDate);
        assert_eq!(verdict.last_qualifying_date, None);
    }

    #[test]
    fn latest_trading_date_is_used() {
        let text = "Niêm yết trên HOSE ngày 19/01/2006. \
                    Ngày 05/06/2023 chuyển sang giao dịch trên HOSE theo lô mới.";
        let verdict = evaluator().evaluate("CCC", Some(text));
        assert_eq!(
            verdict.last_qualifying_date,
            NaiveDate::from_ymd_opt(2023, 6, 5)
        );
        assert_eq!(verdict.reason, VerdictReason::ListedUnderMinimum);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2020, 4, 10).unwrap();
        assert_eq!(years_between(from, to), 0.27);
    }
}
