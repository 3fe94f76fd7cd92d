use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CourseCode, SlotType, TeacherName, DAYS, DAY_NAMES, SLOTS};

/// One occupied cell of a teacher's weekly grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCell {
    pub course: CourseCode,
    /// True when the cell belongs to a 2-slot practical block
    pub practical: bool,
}

impl ScheduledCell {
    /// Cell text as printed in reports
    pub fn display(&self) -> String {
        if self.practical {
            format!("{} (Practical)", self.course)
        } else {
            self.course.0.clone()
        }
    }
}

/// One day of a teacher's timetable: seven cells plus the derived slot type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRow {
    pub cells: [Option<ScheduledCell>; SLOTS],
    pub slot_type: SlotType,
}

impl DayRow {
    pub fn empty() -> Self {
        Self {
            cells: Default::default(),
            slot_type: SlotType::A,
        }
    }

    pub fn occupied_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(|(s, _)| s)
    }

    pub fn load(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// A complete weekly grid for one teacher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherTimetable {
    pub teacher: TeacherName,
    pub days: Vec<DayRow>,
}

impl TeacherTimetable {
    pub fn empty(teacher: TeacherName) -> Self {
        Self {
            teacher,
            days: (0..DAYS).map(|_| DayRow::empty()).collect(),
        }
    }

    /// All occupied (day, slot, cell) triples
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize, &ScheduledCell)> + '_ {
        self.days.iter().enumerate().flat_map(|(d, row)| {
            row.cells
                .iter()
                .enumerate()
                .filter_map(move |(s, c)| c.as_ref().map(|cell| (d, s, cell)))
        })
    }

    /// Cells occupied by one course
    pub fn cells_for(&self, code: &CourseCode) -> Vec<(usize, usize)> {
        self.occupied_cells()
            .filter(|(_, _, cell)| &cell.course == code)
            .map(|(d, s, _)| (d, s))
            .collect()
    }

    pub fn total_load(&self) -> usize {
        self.days.iter().map(|row| row.load()).sum()
    }

    pub fn day_name(day: usize) -> &'static str {
        DAY_NAMES.get(day).copied().unwrap_or("???")
    }
}

/// Why a solver batch produced no timetable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    Infeasible,
    Timeout { seconds: u64 },
    Internal { message: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Infeasible => write!(f, "infeasible"),
            FailureReason::Timeout { seconds } => write!(f, "timed out after {}s", seconds),
            FailureReason::Internal { message } => write!(f, "solver error: {}", message),
        }
    }
}

/// A failed batch and the teachers left unscheduled by it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub batch: usize,
    pub teachers: Vec<TeacherName>,
    pub reason: FailureReason,
}

/// Metadata about a generation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimetableMetadata {
    pub generated_at: String,
    pub algorithm_version: String,
    pub solve_time_ms: u64,
    pub batches: usize,
}

/// The complete output of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableSet {
    pub tables: BTreeMap<TeacherName, TeacherTimetable>,
    pub failures: Vec<BatchFailure>,
    pub metadata: TimetableMetadata,
}

impl TimetableSet {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            failures: Vec::new(),
            metadata: TimetableMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
                solve_time_ms: 0,
                batches: 0,
            },
        }
    }

    /// Teachers that received no schedule
    pub fn unscheduled_teachers(&self) -> Vec<&TeacherName> {
        self.failures.iter().flat_map(|f| f.teachers.iter()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_assignments(&self) -> usize {
        self.tables.values().map(|t| t.total_load()).sum()
    }
}

impl Default for TimetableSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupied_cells_roundtrip() {
        let mut table = TeacherTimetable::empty(TeacherName("T1".to_string()));
        table.days[2].cells[4] = Some(ScheduledCell {
            course: CourseCode("CS1".to_string()),
            practical: false,
        });
        table.days[2].cells[5] = Some(ScheduledCell {
            course: CourseCode("CS2".to_string()),
            practical: true,
        });

        assert_eq!(table.total_load(), 2);
        assert_eq!(table.cells_for(&CourseCode("CS1".to_string())), vec![(2, 4)]);
        let texts: Vec<String> = table
            .occupied_cells()
            .map(|(_, _, c)| c.display())
            .collect();
        assert_eq!(texts, vec!["CS1".to_string(), "CS2 (Practical)".to_string()]);
    }

    #[test]
    fn test_set_serialization_roundtrip() {
        let mut set = TimetableSet::new();
        set.tables.insert(
            TeacherName("T1".to_string()),
            TeacherTimetable::empty(TeacherName("T1".to_string())),
        );
        set.failures.push(BatchFailure {
            batch: 1,
            teachers: vec![TeacherName("T2".to_string())],
            reason: FailureReason::Timeout { seconds: 120 },
        });

        let json = serde_json::to_string(&set).unwrap();
        let back: TimetableSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tables.len(), 1);
        assert_eq!(back.failures.len(), 1);
        assert!(!back.is_complete());
    }
}
