use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::FinancialRow;

pub const DEFAULT_SINCE_YEAR: i32 = 2019;

/// Which fiscal years take part in the financial criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearWindow {
    /// Years at or after a fixed cutoff.
    Since(i32),
    /// The last `n` years up to the latest year present in the dataset.
    Trailing(u32),
}

impl Default for YearWindow {
    fn default() -> Self {
        YearWindow::Since(DEFAULT_SINCE_YEAR)
    }
}

impl YearWindow {
    fn first_year(&self, rows: &[FinancialRow]) -> Option<i32> {
        match *self {
            YearWindow::Since(year) => Some(year),
            YearWindow::Trailing(0) => None,
            YearWindow::Trailing(count) => {
                let span = i32::try_from(count - 1).unwrap_or(i32::MAX);
                rows.iter()
                    .map(|row| row.year)
                    .max()
                    .map(|latest| latest.saturating_sub(span))
            }
        }
    }
}

/// Financial rows restricted to a year window, grouped by ticker with each
/// group ordered by year ascending.
#[derive(Debug, Clone, Default)]
pub struct FinancialHistory {
    groups: BTreeMap<String, Vec<FinancialRow>>,
}

impl FinancialHistory {
    pub fn new(rows: &[FinancialRow], window: YearWindow) -> Self {
        let mut groups: BTreeMap<String, Vec<FinancialRow>> = BTreeMap::new();
        if let Some(first_year) = window.first_year(rows) {
            for row in rows.iter().filter(|row| row.year >= first_year) {
                groups.entry(row.ticker.clone()).or_default().push(row.clone());
            }
        }
        for group in groups.values_mut() {
            group.sort_by_key(|row| row.year);
        }
        Self { groups }
    }

    pub fn tickers(&self) -> BTreeSet<String> {
        self.groups.keys().cloned().collect()
    }

    /// Every row of every ticker that never reported a net loss.
    pub fn positive_net_profit(&self) -> Vec<&FinancialRow> {
        let excluded: HashSet<&str> = self
            .groups
            .values()
            .flatten()
            .filter(|row| row.net_profit < 0.0)
            .map(|row| row.ticker.as_str())
            .collect();

        self.groups
            .values()
            .flatten()
            .filter(|row| !excluded.contains(row.ticker.as_str()))
            .collect()
    }

    pub fn positive_net_profit_tickers(&self) -> BTreeSet<String> {
        self.positive_net_profit()
            .into_iter()
            .map(|row| row.ticker.clone())
            .collect()
    }

    pub fn positive_revenue_growth_tickers(&self) -> BTreeSet<String> {
        self.tickers_where(|rows| is_positive_continuous(&growth(rows, |row| row.revenue)))
    }

    pub fn positive_profit_growth_tickers(&self) -> BTreeSet<String> {
        self.tickers_where(|rows| is_positive_continuous(&growth(rows, |row| row.net_profit)))
    }

    fn tickers_where<F>(&self, predicate: F) -> BTreeSet<String>
    where
        F: Fn(&[FinancialRow]) -> bool,
    {
        self.groups
            .iter()
            .filter(|(_, rows)| predicate(rows))
            .map(|(ticker, _)| ticker.clone())
            .collect()
    }
}

/// Period-over-period fractional change. Division by a zero prior period
/// gives an infinity or NaN, as float division does.
pub fn growth<F>(rows: &[FinancialRow], value: F) -> Vec<f64>
where
    F: Fn(&FinancialRow) -> f64,
{
    rows.windows(2)
        .map(|pair| {
            let (previous, current) = (value(&pair[0]), value(&pair[1]));
            (current - previous) / previous
        })
        .collect()
}

/// True when every computable value is strictly positive. NaNs are skipped.
pub fn is_positive_continuous(values: &[f64]) -> bool {
    values
        .iter()
        .filter(|value| !value.is_nan())
        .all(|value| *value > 0.0)
}
