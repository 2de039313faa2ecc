use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod dates;
mod eligibility;
mod evidence;
mod financials;
mod loader;
mod models;
mod report;
mod screening;

use evidence::{DateEvidenceExtractor, ExchangeVocabulary};
use financials::YearWindow;
use models::format_day_first;
use screening::{CriterionId, ScreeningConfig};

#[derive(Parser)]
#[command(name = "hose-stock-screener")]
#[command(about = "Screen HOSE tickers by listing age and financial history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EvaluationArgs {
    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,
    /// Minimum years of trading on HOSE
    #[arg(long, default_value_t = eligibility::DEFAULT_MIN_YEARS_ACTIVE)]
    min_years: f64,
    /// Lower-case the exchange vocabulary before matching
    #[arg(long)]
    fold_exchange_case: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Intersect tickers passing every selected criterion
    #[command(group(
        ArgGroup::new("window")
            .args(["since_year", "trailing_years"])
            .multiple(false)
    ))]
    Screen {
        #[arg(long)]
        financials: PathBuf,
        #[arg(long)]
        profiles: PathBuf,
        #[arg(long = "criterion", value_enum)]
        criteria: Vec<CriterionId>,
        #[command(flatten)]
        evaluation: EvaluationArgs,
        /// Keep financial years at or after this year
        #[arg(long)]
        since_year: Option<i32>,
        /// Keep the last N financial years of the dataset
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        trailing_years: Option<u32>,
        /// Write a markdown report here
        #[arg(long)]
        audit: Option<PathBuf>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the HOSE listing verdict of every company profile
    Audit {
        #[arg(long)]
        profiles: PathBuf,
        #[command(flatten)]
        evaluation: EvaluationArgs,
        #[arg(long, default_value = "listing-audit.md")]
        out: PathBuf,
    },
    /// Show the listing and trading dates found in a history text
    Evidence {
        #[arg(long)]
        text: String,
        #[arg(long)]
        fold_exchange_case: bool,
    },
}

impl EvaluationArgs {
    fn config(&self, year_window: YearWindow) -> ScreeningConfig {
        let defaults = ScreeningConfig::default();
        ScreeningConfig {
            as_of: self.as_of.unwrap_or(defaults.as_of),
            min_years_active: self.min_years,
            year_window,
            fold_exchange_case: self.fold_exchange_case,
        }
    }
}

fn print_dates(label: &str, dates: &[NaiveDate]) {
    let formatted: Vec<String> = dates.iter().copied().map(format_day_first).collect();
    if formatted.is_empty() {
        println!("{label}: none");
    } else {
        println!("{label}: {}", formatted.join(", "));
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "hose_stock_screener=info"
                    .parse()
                    .context("invalid default log directive")?,
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            financials,
            profiles,
            criteria,
            evaluation,
            since_year,
            trailing_years,
            audit,
            json,
        } => {
            let year_window = match (since_year, trailing_years) {
                (_, Some(count)) => YearWindow::Trailing(count),
                (Some(year), None) => YearWindow::Since(year),
                (None, None) => YearWindow::default(),
            };
            let config = evaluation.config(year_window);
            let selected: BTreeSet<CriterionId> = criteria.into_iter().collect();

            let financial_rows = loader::load_financials(&financials)?;
            let profile_rows = if selected.contains(&CriterionId::ListedOverFiveYears) {
                loader::load_profiles(&profiles)?
            } else {
                Vec::new()
            };

            let outcome = screening::run(&config, &selected, &financial_rows, &profile_rows);
            tracing::info!(
                universe = outcome.universe_size,
                qualifying = outcome.tickers.len(),
                "screening finished"
            );

            if json {
                println!("{}", report::to_json(&outcome)?);
            } else if outcome.tickers.is_empty() {
                println!("{}", report::NO_MATCH_MESSAGE);
            } else {
                println!("Qualifying tickers:");
                for ticker in outcome.tickers.iter() {
                    println!("- {ticker}");
                }
            }

            if let Some(out) = audit {
                std::fs::write(&out, report::build_report(&outcome))
                    .with_context(|| format!("failed to write {}", out.display()))?;
                tracing::info!(path = %out.display(), "report written");
            }
        }
        Commands::Audit {
            profiles,
            evaluation,
            out,
        } => {
            let config = evaluation.config(YearWindow::default());
            let records = loader::load_profiles(&profiles)?;
            let verdicts = config.evaluator().evaluate_all(&records);
            std::fs::write(&out, report::build_audit(config.as_of, &verdicts))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Audit of {} profiles written to {}.",
                verdicts.len(),
                out.display()
            );
        }
        Commands::Evidence {
            text,
            fold_exchange_case,
        } => {
            let extractor = DateEvidenceExtractor::new(
                dates::DateParser::today(),
                ExchangeVocabulary::new(fold_exchange_case),
            );
            let evidence = extractor.extract(&text);
            print_dates("Listing", &evidence.listing);
            print_dates("Trading", &evidence.trading);
            match evidence.latest_qualifying() {
                Some(date) => println!("Latest qualifying date: {}", format_day_first(date)),
                None => println!("No qualifying date found."),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_args(extra: &[&str]) -> Vec<String> {
        let base = [
            "hose-stock-screener",
            "screen",
            "--financials",
            "income.csv",
            "--profiles",
            "profile.csv",
        ];
        base.iter().chain(extra).map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn trailing_years_must_be_positive() {
        assert!(Cli::try_parse_from(screen_args(&["--trailing-years", "0"])).is_err());
        assert!(Cli::try_parse_from(screen_args(&["--trailing-years", "5"])).is_ok());
    }

    #[test]
    fn year_window_flags_are_exclusive() {
        let args = screen_args(&["--since-year", "2019", "--trailing-years", "5"]);
        assert!(Cli::try_parse_from(args).is_err());
    }
}
