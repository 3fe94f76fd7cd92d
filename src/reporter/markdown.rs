use crate::types::{TimetableSet, DAY_NAMES, SLOTS};
use crate::validator::ValidationReport;

/// Generate a markdown report of all timetables
pub fn generate_markdown_report(set: &TimetableSet, validation: &ValidationReport) -> String {
    let mut lines = vec![
        "# Faculty Timetables".to_string(),
        String::new(),
        format!("Generated: {}", set.metadata.generated_at),
        format!("Algorithm: v{}", set.metadata.algorithm_version),
        format!("Solve time: {}ms", set.metadata.solve_time_ms),
        String::new(),
    ];

    lines.push("## Summary\n".to_string());
    lines.push("| Metric | Value |".to_string());
    lines.push("|--------|-------|".to_string());
    lines.push(format!(
        "| Teachers Scheduled | {} |",
        validation.statistics.teachers_scheduled
    ));
    lines.push(format!(
        "| Teachers Unscheduled | {} |",
        validation.statistics.teachers_unscheduled
    ));
    lines.push(format!(
        "| Total Assignments | {} |",
        validation.statistics.total_assignments
    ));
    lines.push(format!(
        "| Practical Assignments | {} |",
        validation.statistics.practical_assignments
    ));
    lines.push(format!("| Solver Batches | {} |", set.metadata.batches));
    lines.push(String::new());

    if validation.is_valid {
        lines.push("## Validation: ✅ PASSED\n".to_string());
    } else {
        lines.push("## Validation: ❌ FAILED\n".to_string());
        for violation in &validation.violations {
            lines.push(format!(
                "- **{}**: {}",
                violation.constraint, violation.message
            ));
        }
        lines.push(String::new());
    }

    for table in set.tables.values() {
        lines.push(format!("## {}\n", table.teacher));

        let mut header = "| Day |".to_string();
        let mut rule = "|-----|".to_string();
        for s in 0..SLOTS {
            header.push_str(&format!(" Slot {} |", s + 1));
            rule.push_str("--------|");
        }
        header.push_str(" SlotType |");
        rule.push_str("----------|");
        lines.push(header);
        lines.push(rule);

        for (d, row) in table.days.iter().enumerate() {
            let mut line = format!("| {} |", DAY_NAMES[d]);
            for cell in &row.cells {
                let text = cell.as_ref().map(|c| c.display()).unwrap_or_default();
                line.push_str(&format!(" {} |", text));
            }
            line.push_str(&format!(" {} |", row.slot_type.label()));
            lines.push(line);
        }
        lines.push(String::new());
    }

    if !set.failures.is_empty() {
        lines.push("## Unscheduled Teachers\n".to_string());
        lines.push("| Batch | Teachers | Reason |".to_string());
        lines.push("|-------|----------|--------|".to_string());
        for failure in &set.failures {
            let names: Vec<String> = failure.teachers.iter().map(|t| t.to_string()).collect();
            lines.push(format!(
                "| {} | {} | {} |",
                failure.batch,
                names.join(", "),
                failure.reason
            ));
        }
    }

    lines.join("\n")
}
