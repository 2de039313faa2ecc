use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::eligibility::{ListingEligibilityEvaluator, DEFAULT_MIN_YEARS_ACTIVE};
use crate::evidence::ExchangeVocabulary;
use crate::financials::{FinancialHistory, YearWindow};
use crate::models::{EligibilityVerdict, FinancialRow, TickerRecord};

/// Screening criteria. Declaration order is the order they are applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriterionId {
    /// Trading on HOSE for at least five years
    ListedOverFiveYears,
    /// No net loss in any year of the window
    PositiveNetProfit,
    /// Revenue grew every year of the window
    PositiveRevenueGrowth,
    /// Net profit grew every year of the window
    PositiveProfitGrowth,
}

impl CriterionId {
    pub fn label(&self) -> &'static str {
        match self {
            CriterionId::ListedOverFiveYears => "Listed on HOSE for over 5 years",
            CriterionId::PositiveNetProfit => "Positive net profit every year",
            CriterionId::PositiveRevenueGrowth => "Positive revenue growth every year",
            CriterionId::PositiveProfitGrowth => "Positive profit growth every year",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    pub as_of: NaiveDate,
    pub min_years_active: f64,
    pub year_window: YearWindow,
    pub fold_exchange_case: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            as_of: Utc::now().date_naive(),
            min_years_active: DEFAULT_MIN_YEARS_ACTIVE,
            year_window: YearWindow::default(),
            fold_exchange_case: false,
        }
    }
}

impl ScreeningConfig {
    pub fn evaluator(&self) -> ListingEligibilityEvaluator {
        ListingEligibilityEvaluator::new(
            self.as_of,
            ExchangeVocabulary::new(self.fold_exchange_case),
        )
        .with_min_years(self.min_years_active)
    }
}

/// Intersects `all_tickers` with the passing set of each selected criterion,
/// in [`CriterionId`] order. A selected criterion with no passing set yields
/// an empty result.
pub fn screen(
    all_tickers: &BTreeSet<String>,
    selected: &BTreeSet<CriterionId>,
    passing: &BTreeMap<CriterionId, BTreeSet<String>>,
) -> BTreeSet<String> {
    let mut remaining = all_tickers.clone();
    for criterion in selected {
        let Some(pass_set) = passing.get(criterion) else {
            return BTreeSet::new();
        };
        remaining = remaining.intersection(pass_set).cloned().collect();
        tracing::debug!(?criterion, remaining = remaining.len(), "applied criterion");
    }
    remaining
}

pub fn listing_pass_set(verdicts: &[EligibilityVerdict]) -> BTreeSet<String> {
    verdicts
        .iter()
        .filter(|verdict| verdict.passed)
        .map(|verdict| verdict.ticker.clone())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningOutcome {
    pub as_of: NaiveDate,
    pub criteria: Vec<CriterionId>,
    pub universe_size: usize,
    pub tickers: Vec<String>,
    pub verdicts: Vec<EligibilityVerdict>,
}

/// Runs one screening pass over both datasets. Only the selected criteria are
/// computed; listing verdicts are empty unless that criterion is selected.
pub fn run(
    config: &ScreeningConfig,
    selected: &BTreeSet<CriterionId>,
    financials: &[FinancialRow],
    profiles: &[TickerRecord],
) -> ScreeningOutcome {
    let history = FinancialHistory::new(financials, config.year_window);
    let universe = history.tickers();
    let mut verdicts = Vec::new();
    let mut passing = BTreeMap::new();

    for criterion in selected {
        let pass_set = match criterion {
            CriterionId::ListedOverFiveYears => {
                verdicts = config.evaluator().evaluate_all(profiles);
                listing_pass_set(&verdicts)
            }
            CriterionId::PositiveNetProfit => history.positive_net_profit_tickers(),
            CriterionId::PositiveRevenueGrowth => history.positive_revenue_growth_tickers(),
            CriterionId::PositiveProfitGrowth => history.positive_profit_growth_tickers(),
        };
        tracing::info!(
            criterion = criterion.label(),
            passing = pass_set.len(),
            "criterion evaluated"
        );
        passing.insert(*criterion, pass_set);
    }

    let tickers = screen(&universe, selected, &passing);
    ScreeningOutcome {
        as_of: config.as_of,
        criteria: selected.iter().copied().collect(),
        universe_size: universe.len(),
        tickers: tickers.into_iter().collect(),
        verdicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn passing() -> BTreeMap<CriterionId, BTreeSet<String>> {
        BTreeMap::from([
            (CriterionId::ListedOverFiveYears, set(&["AAA", "BBB", "ZZZ"])),
            (CriterionId::PositiveNetProfit, set(&["AAA", "CCC"])),
            (CriterionId::PositiveRevenueGrowth, set(&["AAA", "BBB", "CCC"])),
            (CriterionId::PositiveProfitGrowth, set(&[])),
        ])
    }

    fn sample_row(ticker: &str, year: i32, revenue: f64, net_profit: f64) -> FinancialRow {
        FinancialRow {
            ticker: ticker.to_string(),
            year,
            revenue,
            net_profit,
        }
    }

    #[test]
    fn no_criteria_returns_everything() {
        let all = set(&["AAA", "BBB", "CCC"]);
        assert_eq!(screen(&all, &BTreeSet::new(), &passing()), all);
    }

    #[test]
    fn intersection_narrows_with_each_criterion() {
        let all = set(&["AAA", "BBB", "CCC"]);
        let listed = BTreeSet::from([CriterionId::ListedOverFiveYears]);
        let profit = BTreeSet::from([CriterionId::PositiveNetProfit]);
        let both = BTreeSet::from([
            CriterionId::ListedOverFiveYears,
            CriterionId::PositiveNetProfit,
        ]);

        let a = screen(&all, &listed, &passing());
        let b = screen(&all, &profit, &passing());
        let ab = screen(&all, &both, &passing());
        assert_eq!(a, set(&["AAA", "BBB"]));
        assert_eq!(b, set(&["AAA", "CCC"]));
        assert_eq!(ab, set(&["AAA"]));
        assert!(ab.is_subset(&a) && ab.is_subset(&b));
    }

    #[test]
    fn empty_pass_set_empties_the_result() {
        let all = set(&["AAA"]);
        let selected = BTreeSet::from([CriterionId::PositiveProfitGrowth]);
        assert!(screen(&all, &selected, &passing()).is_empty());
        assert!(screen(&all, &selected, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn run_combines_listing_and_financials() {
        let config = ScreeningConfig {
            as_of: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            ..ScreeningConfig::default()
        };
        let financials = vec![
            sample_row("VNM", 2019, 100.0, 10.0),
            sample_row("VNM", 2020, 110.0, 12.0),
            sample_row("NEW", 2019, 100.0, 10.0),
            sample_row("NEW", 2020, 120.0, 14.0),
            sample_row("OLD", 2017, 100.0, 10.0),
        ];
        let profiles = vec![
            TickerRecord {
                ticker: "VNM".to_string(),
                history_text: Some("Ngày 19/01/2006 niêm yết và giao dịch trên HOSE.".to_string()),
            },
            TickerRecord {
                ticker: "NEW".to_string(),
                history_text: Some("Ngày 10/10/2023 niêm yết trên HOSE.".to_string()),
            },
            TickerRecord {
                ticker: "OLD".to_string(),
                history_text: Some("Ngày 01/02/2000 giao dịch trên HOSE.".to_string()),
            },
        ];

        let everything = run(&config, &BTreeSet::new(), &financials, &profiles);
        assert_eq!(everything.tickers, vec!["NEW", "VNM"]);
        assert!(everything.verdicts.is_empty());

        let selected = BTreeSet::from([
            CriterionId::ListedOverFiveYears,
            CriterionId::PositiveRevenueGrowth,
        ]);
        let outcome = run(&config, &selected, &financials, &profiles);
        assert_eq!(outcome.tickers, vec!["VNM"]);
        assert_eq!(outcome.universe_size, 2);
        assert_eq!(outcome.verdicts.len(), 3);
    }
}
