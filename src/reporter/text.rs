use crate::types::{TeacherTimetable, TimetableSet, DAY_NAMES, SLOTS};
use crate::validator::ValidationReport;
use colored::Colorize;

/// Generate a plain text report (with colors for terminal)
pub fn generate_text_report(set: &TimetableSet, validation: &ValidationReport) -> String {
    let mut lines = Vec::new();

    lines.push("═".repeat(72));
    lines.push("               FACULTY TIMETABLES".to_string());
    lines.push("═".repeat(72));
    lines.push(String::new());

    lines.push(format!("Generated: {}", set.metadata.generated_at));
    lines.push(format!("Solve Time: {}ms", set.metadata.solve_time_ms));
    lines.push(format!("Batches: {}", set.metadata.batches));
    lines.push(String::new());

    lines.push("─".repeat(40));
    lines.push("STATISTICS".to_string());
    lines.push("─".repeat(40));
    lines.push(format!(
        "  Teachers:      {} scheduled, {} unscheduled",
        validation.statistics.teachers_scheduled, validation.statistics.teachers_unscheduled
    ));
    lines.push(format!(
        "  Assignments:   {} ({} practical)",
        validation.statistics.total_assignments, validation.statistics.practical_assignments
    ));
    lines.push(String::new());

    lines.push("─".repeat(40));
    if validation.is_valid {
        lines.push("VALIDATION: PASSED".green().to_string());
    } else {
        lines.push("VALIDATION: FAILED".red().to_string());
        for v in &validation.violations {
            lines.push(format!("  ! {}: {}", v.constraint, v.message));
        }
    }
    lines.push("─".repeat(40));
    lines.push(String::new());

    for table in set.tables.values() {
        lines.push(format!("{}", table.teacher.to_string().bold()));
        lines.push(render_grid(table));
        lines.push(String::new());
    }

    if !set.failures.is_empty() {
        lines.push("UNSCHEDULED".to_string());
        for failure in &set.failures {
            let names: Vec<String> = failure.teachers.iter().map(|t| t.to_string()).collect();
            lines.push(format!(
                "  batch {}: {} ({})",
                failure.batch,
                names.join(", "),
                failure.reason
            ));
        }
        lines.push(String::new());
    }

    lines.push("═".repeat(72));

    lines.join("\n")
}

/// Fixed-width weekly grid for one teacher
pub fn render_grid(table: &TeacherTimetable) -> String {
    let width = cell_width(table);
    let mut lines = Vec::new();

    let mut header = format!("{:<4}", "Day");
    for s in 0..SLOTS {
        header.push_str(&format!("{:<width$}", format!("Slot {}", s + 1)));
    }
    header.push_str("SlotType");
    lines.push(header);

    for (d, row) in table.days.iter().enumerate() {
        let mut line = format!("{:<4}", DAY_NAMES[d]);
        for cell in &row.cells {
            let text = cell.as_ref().map(|c| c.display()).unwrap_or_default();
            line.push_str(&format!("{:<width$}", text));
        }
        line.push_str(row.slot_type.label());
        lines.push(line);
    }

    lines.join("\n")
}

fn cell_width(table: &TeacherTimetable) -> usize {
    let longest = table
        .occupied_cells()
        .map(|(_, _, c)| c.display().len())
        .max()
        .unwrap_or(0);
    longest.max(8) + 2
}

/// Print a quick summary to stdout
pub fn print_summary(set: &TimetableSet, validation: &ValidationReport) {
    println!();
    if validation.is_valid && set.is_complete() {
        println!("{}", "✓ Timetables generated successfully".green().bold());
    } else if !validation.is_valid {
        println!("{}", "✗ Timetables violate hard constraints".red().bold());
    } else {
        println!("{}", "! Some teachers were left unscheduled".yellow().bold());
    }
    println!();
    println!(
        "  Teachers:    {} scheduled, {} unscheduled",
        validation.statistics.teachers_scheduled, validation.statistics.teachers_unscheduled
    );
    println!(
        "  Assignments: {} ({} practical)",
        validation.statistics.total_assignments, validation.statistics.practical_assignments
    );
    println!("  Batches:     {}", set.metadata.batches);
    println!("  Time:        {}ms", set.metadata.solve_time_ms);
    println!();
}
