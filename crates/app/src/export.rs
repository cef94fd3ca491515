use std::io;

use csv::Writer;
use engine::HistoryRow;
use serde::Serialize;

use crate::error::Result;

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Date/Time")]
    created_at: String,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "Case")]
    case_key: &'a str,
    #[serde(rename = "Employee ID")]
    employee_id: &'a str,
    #[serde(rename = "Name")]
    display_name: &'a str,
    #[serde(rename = "Change")]
    quantity: i64,
    #[serde(rename = "Balance")]
    balance: i64,
}

/// Writes `rows` as CSV with a header line.
pub fn write_csv<W: io::Write>(rows: &[HistoryRow], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    for row in rows {
        writer.serialize(ExportRow {
            created_at: row.entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            category: row.entry.category.label(),
            case_key: row.entry.related_case_key.as_deref().unwrap_or(""),
            employee_id: &row.entry.employee_id,
            display_name: &row.entry.display_name,
            quantity: row.entry.quantity,
            balance: row.balance_after,
        })?;
    }
    writer.flush()?;
    Ok(())
}
