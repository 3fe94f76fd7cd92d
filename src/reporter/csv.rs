use crate::error::Result;
use crate::types::{TimetableSet, DAY_NAMES, SLOTS};

/// Concatenated CSV export: one row per (teacher, day), slot cells as
/// columns, slot type last
pub fn generate_csv_export(set: &TimetableSet) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Teacher".to_string(), "Day".to_string()];
    header.extend((0..SLOTS).map(|s| format!("Slot {}", s + 1)));
    header.push("SlotType".to_string());
    writer.write_record(&header)?;

    for table in set.tables.values() {
        for (d, row) in table.days.iter().enumerate() {
            let mut record = vec![table.teacher.to_string(), DAY_NAMES[d].to_string()];
            record.extend(
                row.cells
                    .iter()
                    .map(|cell| cell.as_ref().map(|c| c.display()).unwrap_or_default()),
            );
            record.push(row.slot_type.label().to_string());
            writer.write_record(&record)?;
        }
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(String::from_utf8(bytes)?)
}
