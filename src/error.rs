use thiserror::Error;

/// Domain-specific errors for the timetabler
#[derive(Error, Debug)]
pub enum TimetableError {
    // Input errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalogue '{path}': {message}")]
    CsvParse { path: String, message: String },

    #[error("Missing required column '{column}' in the catalogue")]
    MissingColumn { column: &'static str },

    #[error("No valid catalogue rows left after filtering")]
    EmptyCatalogue,

    // Derivation errors
    #[error("Course '{course}' of '{teacher}' has {hours} practical hours; labs come in 2-hour blocks")]
    OddPracticalHours {
        teacher: String,
        course: String,
        hours: u32,
    },

    // Solver errors surface per batch inside the result set; a run that
    // leaves teachers unscheduled fails at the boundary with this
    #[error("{unscheduled} teacher(s) received no schedule")]
    IncompleteSchedule { unscheduled: usize },
}

/// Use anyhow::Result at application boundaries
pub type Result<T> = anyhow::Result<T>;
