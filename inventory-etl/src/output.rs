use serde::Serialize;
use std::io::Write;

use crate::error::ReportError;
use crate::reports::{Report, ReportRows};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

pub fn write_reports<W: Write>(
    reports: &[Report],
    format: OutputFormat,
    mut out: W,
) -> Result<(), ReportError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, reports)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "# {}", report.report)?;
                write_csv(&report.rows, &mut out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn write_csv<W: Write>(rows: &ReportRows, out: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);
    match rows {
        ReportRows::Stock(rows) => serialize_all(&mut writer, rows)?,
        ReportRows::ProductTotals(rows) => serialize_all(&mut writer, rows)?,
        ReportRows::SupplierTotals(rows) => serialize_all(&mut writer, rows)?,
        ReportRows::DailyChanges(rows) => serialize_all(&mut writer, rows)?,
        ReportRows::Products(rows) => serialize_all(&mut writer, rows)?,
        ReportRows::Values(rows) => serialize_all(&mut writer, rows)?,
    }
    writer.flush()?;
    Ok(())
}

fn serialize_all<W: Write, T: Serialize>(
    writer: &mut csv::Writer<W>,
    rows: &[T],
) -> Result<(), csv::Error> {
    for row in rows {
        writer.serialize(row)?;
    }
    Ok(())
}
