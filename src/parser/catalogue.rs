use crate::error::{Result, TimetableError};
use crate::types::{Catalogue, CourseCode, CourseOffering, TeacherName, TimetableConfig};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Columns every catalogue must carry
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "course_code",
    "Faculty",
    "lecture_hours",
    "tutorial_hours",
    "practical_hours",
    "credits",
];

/// Load the course catalogue from a CSV file
pub fn load_catalogue(path: &Path) -> Result<Catalogue> {
    let path_str = path.display().to_string();
    let file = fs::File::open(path).map_err(|e| TimetableError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    read_catalogue(file).map_err(|e| match e.downcast::<csv::Error>() {
        Ok(csv_err) => TimetableError::CsvParse {
            path: path_str,
            message: csv_err.to_string(),
        }
        .into(),
        Err(other) => other,
    })
}

/// Read a catalogue from any CSV source.
///
/// Rows with missing, non-numeric or out-of-range credits are dropped.
/// Hour fields are coerced to non-negative integers, missing meaning 0.
/// Duplicate (teacher, course) rows collapse to the first occurrence.
pub fn read_catalogue<R: Read>(reader: R) -> Result<Catalogue> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TimetableError::MissingColumn { column: name }.into())
    };

    let code_col = column("course_code")?;
    let faculty_col = column("Faculty")?;
    let lecture_col = column("lecture_hours")?;
    let tutorial_col = column("tutorial_hours")?;
    let practical_col = column("practical_hours")?;
    let credits_col = column("credits")?;
    let registration_col = headers.iter().position(|h| h == "registration");

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut offerings = Vec::new();

    for record in rdr.records() {
        let record = record?;

        let code = record.get(code_col).unwrap_or("").trim();
        let teacher = record.get(faculty_col).unwrap_or("").trim();
        if code.is_empty() || teacher.is_empty() {
            continue;
        }

        let credits = match parse_credits(record.get(credits_col)) {
            Some(c) => c,
            None => continue,
        };

        if !seen.insert((teacher.to_string(), code.to_string())) {
            continue;
        }

        offerings.push(CourseOffering {
            code: CourseCode(code.to_string()),
            teacher: TeacherName(teacher.to_string()),
            lecture_hours: parse_hours(record.get(lecture_col)),
            tutorial_hours: parse_hours(record.get(tutorial_col)),
            practical_hours: parse_hours(record.get(practical_col)),
            credits,
            registration: registration_col
                .and_then(|i| record.get(i))
                .and_then(parse_count),
        });
    }

    if offerings.is_empty() {
        return Err(TimetableError::EmptyCatalogue.into());
    }

    log::info!(
        "loaded {} offerings across {} teachers",
        offerings.len(),
        offerings
            .iter()
            .map(|o| &o.teacher)
            .collect::<HashSet<_>>()
            .len()
    );

    Ok(Catalogue::new(offerings))
}

/// Load config from TOML file, or use defaults
pub fn load_config_or_default(path: &Path) -> TimetableConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => TimetableConfig::default(),
        }
    } else {
        TimetableConfig::default()
    }
}

/// Hour fields coerce to a non-negative integer, anything unparsable to 0
fn parse_hours(field: Option<&str>) -> u32 {
    field
        .and_then(|f| f.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u32)
        .unwrap_or(0)
}

/// Credits must parse to a number in 1..=5, otherwise the row is dropped
fn parse_credits(field: Option<&str>) -> Option<u32> {
    field
        .and_then(|f| f.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && (1.0..=5.0).contains(v))
        .map(|v| v.round() as u32)
}

fn parse_count(field: &str) -> Option<u32> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32)
}
