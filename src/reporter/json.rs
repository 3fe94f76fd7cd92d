use crate::error::Result;
use crate::types::TimetableSet;

/// Serialize the full timetable set to pretty JSON
pub fn generate_json_report(set: &TimetableSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(set)?)
}

/// One-line machine-readable summary for quiet mode
pub fn generate_json_summary(set: &TimetableSet) -> Result<String> {
    let summary = serde_json::json!({
        "teachers_scheduled": set.tables.len(),
        "teachers_unscheduled": set.unscheduled_teachers().len(),
        "total_assignments": set.total_assignments(),
        "batches": set.metadata.batches,
        "solve_time_ms": set.metadata.solve_time_ms,
    });
    Ok(summary.to_string())
}
