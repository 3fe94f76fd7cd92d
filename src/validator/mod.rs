mod hard_constraints;

pub use hard_constraints::*;

use crate::scheduler::DerivedPlan;
use crate::types::{TimetableConfig, TimetableSet};

/// Result of timetable validation
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub statistics: TimetableStatistics,
}

/// A constraint violation
#[derive(Debug, Clone)]
pub struct Violation {
    pub constraint: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Statistics about the generated timetables
#[derive(Debug, Clone)]
pub struct TimetableStatistics {
    pub teachers_scheduled: usize,
    pub teachers_unscheduled: usize,
    pub total_assignments: usize,
    pub practical_assignments: usize,
}

/// Validate a complete timetable set against the catalogue-derived plan
pub fn validate_timetables(
    set: &TimetableSet,
    plan: &DerivedPlan,
    config: &TimetableConfig,
) -> ValidationReport {
    let mut violations = Vec::new();

    violations.extend(check_weekly_workload(set, plan));
    violations.extend(check_practical_blocks(set, plan));
    violations.extend(check_consecutive_runs(set, config));
    violations.extend(check_daily_load(set, config));
    violations.extend(check_off_day(set));
    violations.extend(check_slot_types(set, config));
    violations.extend(check_free_windows(set));
    violations.extend(check_morning_after_evening(set, config));
    violations.extend(check_morning_only(set, config));
    violations.extend(check_open_elective_coupling(set, plan));

    let statistics = TimetableStatistics {
        teachers_scheduled: set.tables.len(),
        teachers_unscheduled: set.unscheduled_teachers().len(),
        total_assignments: set.total_assignments(),
        practical_assignments: set
            .tables
            .values()
            .flat_map(|t| t.occupied_cells())
            .filter(|(_, _, c)| c.practical)
            .count(),
    };

    ValidationReport {
        is_valid: violations.iter().all(|v| v.severity != Severity::Error),
        violations,
        statistics,
    }
}
