mod csv;
mod json;
mod markdown;
mod text;

pub use self::csv::*;
pub use self::json::*;
pub use self::markdown::*;
pub use self::text::*;

use crate::error::Result;
use crate::types::{TeacherName, TimetableSet};
use std::fs;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
    Csv,
}

/// Generate all reports and write to output directory
pub fn generate_reports(
    set: &TimetableSet,
    validation: &crate::validator::ValidationReport,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    for format in formats {
        match format {
            OutputFormat::Json => {
                let json = generate_json_report(set)?;
                fs::write(output_dir.join("timetables.json"), json)?;
            }
            OutputFormat::Markdown => {
                let md = generate_markdown_report(set, validation);
                fs::write(output_dir.join("timetables.md"), md)?;
            }
            OutputFormat::Text => {
                let txt = generate_text_report(set, validation);
                fs::write(output_dir.join("timetables.txt"), txt)?;
            }
            OutputFormat::Csv => {
                let csv = generate_csv_export(set)?;
                fs::write(output_dir.join("timetables.csv"), csv)?;
            }
        }
    }

    Ok(())
}

/// Render a single teacher's weekly grid
pub fn generate_teacher_view(set: &TimetableSet, teacher: &TeacherName) -> Option<String> {
    let table = set.tables.get(teacher)?;
    let mut lines = vec![format!("# Timetable for {}", teacher), String::new()];
    lines.push(render_grid(table));
    Some(lines.join("\n"))
}
