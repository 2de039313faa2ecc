use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{format_day_first, EligibilityVerdict, VerdictReason};
use crate::screening::{CriterionId, ScreeningOutcome};

pub const NO_MATCH_MESSAGE: &str = "No ticker satisfies all selected criteria.";

#[derive(Debug, Clone, PartialEq)]
pub struct ReasonSummary {
    pub reason: VerdictReason,
    pub count: usize,
    pub avg_years_active: Option<f64>,
}

pub fn summarize_by_reason(verdicts: &[EligibilityVerdict]) -> Vec<ReasonSummary> {
    let mut map: std::collections::HashMap<VerdictReason, (usize, f64, usize)> =
        std::collections::HashMap::new();

    for verdict in verdicts {
        let entry = map.entry(verdict.reason).or_insert((0, 0.0, 0));
        entry.0 += 1;
        if let Some(years) = verdict.years_active {
            entry.1 += years;
            entry.2 += 1;
        }
    }

    let mut summaries: Vec<ReasonSummary> = map
        .into_iter()
        .map(|(reason, (count, total_years, dated))| ReasonSummary {
            reason,
            count,
            avg_years_active: (dated > 0).then(|| total_years / dated as f64),
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.reason.label().cmp(b.reason.label())));
    summaries
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

pub fn write_verdict_table(output: &mut String, verdicts: &[EligibilityVerdict]) {
    let _ = writeln!(
        output,
        "| Ticker | Last qualifying date | Years active | Result | Reason | Listing history |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for verdict in verdicts {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            verdict.ticker,
            verdict
                .last_qualifying_date
                .map(format_day_first)
                .unwrap_or_default(),
            verdict
                .years_active
                .map(|years| format!("{years:.2}"))
                .unwrap_or_default(),
            if verdict.passed { "Pass" } else { "Fail" },
            verdict.reason.label(),
            cell(verdict.history_text.as_deref().unwrap_or(""))
        );
    }
}

pub fn build_audit(as_of: NaiveDate, verdicts: &[EligibilityVerdict]) -> String {
    let summaries = summarize_by_reason(verdicts);
    let passed = verdicts.iter().filter(|v| v.passed).count();

    let mut output = String::new();
    let _ = writeln!(output, "# HOSE Listing Audit");
    let _ = writeln!(
        output,
        "Evaluated {} tickers as of {} ({} passed)",
        verdicts.len(),
        format_day_first(as_of),
        passed
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Outcomes");

    if summaries.is_empty() {
        let _ = writeln!(output, "No company profiles were evaluated.");
    } else {
        for summary in summaries.iter() {
            match summary.avg_years_active {
                Some(avg) => {
                    let _ = writeln!(
                        output,
                        "- {}: {} tickers (avg {:.2} years active)",
                        summary.reason.label(),
                        summary.count,
                        avg
                    );
                }
                None => {
                    let _ = writeln!(
                        output,
                        "- {}: {} tickers",
                        summary.reason.label(),
                        summary.count
                    );
                }
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Verdicts");
    write_verdict_table(&mut output, verdicts);
    output
}

pub fn build_report(outcome: &ScreeningOutcome) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Stock Screening Report");
    let _ = writeln!(
        output,
        "Screened {} tickers as of {}",
        outcome.universe_size,
        format_day_first(outcome.as_of)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Criteria");

    if outcome.criteria.is_empty() {
        let _ = writeln!(output, "No criteria selected; every ticker is kept.");
    } else {
        for criterion in outcome.criteria.iter() {
            let _ = writeln!(output, "- {}", criterion.label());
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Qualifying Tickers");

    if outcome.tickers.is_empty() {
        let _ = writeln!(output, "{NO_MATCH_MESSAGE}");
    } else {
        let _ = writeln!(output, "{}", outcome.tickers.join(", "));
    }

    if outcome.criteria.contains(&CriterionId::ListedOverFiveYears) {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Listing Verdicts");
        write_verdict_table(&mut output, &outcome.verdicts);
    }

    output
}

pub fn to_json(outcome: &ScreeningOutcome) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}
