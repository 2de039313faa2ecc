use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::{FinancialRow, TickerRecord};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{file}: missing required column {column} (accepted headers: {accepted})")]
    MissingColumn {
        file: String,
        column: &'static str,
        accepted: String,
    },
}

struct RequiredColumn {
    name: &'static str,
    headers: &'static [&'static str],
}

const FINANCIAL_COLUMNS: [RequiredColumn; 4] = [
    RequiredColumn {
        name: "ticker",
        headers: &["ticker", "CP"],
    },
    RequiredColumn {
        name: "year",
        headers: &["year", "Năm"],
    },
    RequiredColumn {
        name: "revenue",
        headers: &["revenue", "Doanh thu (Tỷ đồng)"],
    },
    RequiredColumn {
        name: "net_profit",
        headers: &["net_profit", "Lợi nhuận thuần"],
    },
];

const PROFILE_COLUMNS: [RequiredColumn; 2] = [
    RequiredColumn {
        name: "ticker",
        headers: &["ticker", "CP"],
    },
    RequiredColumn {
        name: "history",
        headers: &["history", "history_dev"],
    },
];

#[derive(Deserialize)]
struct FinancialCsvRow {
    #[serde(alias = "CP")]
    ticker: String,
    #[serde(alias = "Năm")]
    year: i32,
    #[serde(alias = "Doanh thu (Tỷ đồng)")]
    revenue: f64,
    #[serde(alias = "Lợi nhuận thuần")]
    net_profit: f64,
}

#[derive(Deserialize)]
struct ProfileCsvRow {
    #[serde(alias = "CP")]
    ticker: String,
    #[serde(alias = "history_dev")]
    history: Option<String>,
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(input)
}

fn check_columns(
    headers: &csv::StringRecord,
    required: &[RequiredColumn],
    file: &str,
) -> Result<(), LoadError> {
    for column in required {
        if !headers.iter().any(|header| column.headers.contains(&header)) {
            return Err(LoadError::MissingColumn {
                file: file.to_string(),
                column: column.name,
                accepted: column.headers.join(", "),
            });
        }
    }
    Ok(())
}

pub fn read_financials<R: Read>(input: R, file: &str) -> anyhow::Result<Vec<FinancialRow>> {
    let mut reader = reader(input);
    check_columns(reader.headers()?, &FINANCIAL_COLUMNS, file)?;

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<FinancialCsvRow>().enumerate() {
        let row = result.with_context(|| format!("{file}: invalid financial row {}", index + 1))?;
        rows.push(FinancialRow {
            ticker: row.ticker.trim().to_string(),
            year: row.year,
            revenue: row.revenue,
            net_profit: row.net_profit,
        });
    }
    Ok(rows)
}

pub fn read_profiles<R: Read>(input: R, file: &str) -> anyhow::Result<Vec<TickerRecord>> {
    let mut reader = reader(input);
    check_columns(reader.headers()?, &PROFILE_COLUMNS, file)?;

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<ProfileCsvRow>().enumerate() {
        let row = result.with_context(|| format!("{file}: invalid profile row {}", index + 1))?;
        records.push(TickerRecord {
            ticker: row.ticker.trim().to_string(),
            history_text: row.history,
        });
    }
    Ok(records)
}

pub fn load_financials(path: &Path) -> anyhow::Result<Vec<FinancialRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open financial statements {}", path.display()))?;
    let rows = read_financials(file, &path.display().to_string())?;
    tracing::info!(rows = rows.len(), path = %path.display(), "loaded financial statements");
    Ok(rows)
}

pub fn load_profiles(path: &Path) -> anyhow::Result<Vec<TickerRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open company profiles {}", path.display()))?;
    let records = read_profiles(file, &path.display().to_string())?;
    let missing = records.iter().filter(|r| r.history_text.is_none()).count();
    if missing > 0 {
        tracing::warn!(missing, "profiles without history text");
    }
    tracing::info!(rows = records.len(), path = %path.display(), "loaded company profiles");
    Ok(records)
}
