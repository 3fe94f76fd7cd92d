mod config;
mod course;
mod grid;
mod timetable;

pub use config::*;
pub use course::*;
pub use grid::*;
pub use timetable::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for course codes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseCode(pub String);

impl CourseCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for faculty names
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeacherName(pub String);

impl TeacherName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeacherName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
