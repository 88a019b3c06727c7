//! `idguard init-db` and `idguard records`.

use anyhow::Result;
use idguard_config::IdGuardConfig;
use idguard_core::{RecordStore, StoredRecord};
use idguard_logging::mask_id_number;

use crate::config::open_store;
use crate::terminal_output::{note_success, note_warn, render_table, Column};

pub async fn init_db(config: &IdGuardConfig) -> Result<()> {
    let store = open_store(config)?;
    let count = store.count().await?;
    note_success(&format!(
        "Database ready at {} ({} record{})",
        config.database_path().display(),
        count,
        if count == 1 { "" } else { "s" }
    ));
    Ok(())
}

fn record_row(index: usize, stored: &StoredRecord, mask: bool) -> Vec<String> {
    let record = &stored.record;
    let attributes: Vec<String> = record
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    vec![
        (index + 1).to_string(),
        if mask {
            mask_id_number(&record.id_number)
        } else {
            record.id_number.clone()
        },
        record.full_name.clone(),
        record.birth_date.format("%Y-%m-%d").to_string(),
        stored.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        attributes.join(", "),
    ]
}

pub fn render_records(records: &[StoredRecord], mask: bool) -> String {
    let columns = vec![
        Column::right("#"),
        Column::left("Identity number"),
        Column::left("Full name").max(32),
        Column::left("Birth date"),
        Column::left("Recorded at (UTC)"),
        Column::left("Attributes").max(48),
    ];
    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(i, r)| record_row(i, r, mask))
        .collect();
    render_table(&columns, &rows)
}

pub async fn records(config: &IdGuardConfig, limit: usize, mask: bool) -> Result<()> {
    let store = open_store(config)?;
    let total = store.count().await?;
    if total == 0 {
        note_warn("No records stored yet");
        return Ok(());
    }
    let rows = store.list(limit).await?;
    print!("{}", render_records(&rows, mask));
    println!("\n  Showing {} of {} record(s), newest first.", rows.len(), total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use idguard_core::IdentityRecord;

    #[test]
    fn masked_table_hides_identity_numbers() {
        let record = IdentityRecord::new(
            "3171234567890001",
            "Jane Doe",
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        )
        .unwrap()
        .with_attribute("gol_darah", "O");
        let stored = StoredRecord {
            record,
            recorded_at: Utc::now(),
        };

        let masked = render_records(std::slice::from_ref(&stored), true);
        assert!(!masked.contains("3171234567890001"));
        assert!(masked.contains("gol_darah=O"));

        let plain = render_records(&[stored], false);
        assert!(plain.contains("3171234567890001"));
    }
}
