use serde::{Deserialize, Serialize};

/// Tunable parameters of the timetable model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableConfig {
    /// Maximum teaching hours per teacher per day
    #[serde(default = "default_max_hours_per_day")]
    pub max_hours_per_day: u32,
    /// Maximum consecutive occupied slots
    #[serde(default = "default_max_consecutive_slots")]
    pub max_consecutive_slots: u32,
    /// Slots considered "morning" for the morning-only lab rule
    #[serde(default = "default_morning_slots")]
    pub morning_slots: Vec<usize>,
    /// Course code restricted to morning slots
    #[serde(default = "default_morning_only_course_code")]
    pub morning_only_course_code: String,
    /// Substring marking open-elective course codes
    #[serde(default = "default_open_elective_marker")]
    pub open_elective_marker: String,
    /// Wall-clock budget per solve, in seconds
    #[serde(default = "default_solver_time_limit_sec")]
    pub solver_time_limit_sec: u64,
    /// Maximum teachers per solver batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Minimum days per week each slot type must occur
    #[serde(default = "default_slot_type_min_days")]
    pub slot_type_min_days: u32,
    /// Maximum days per week each slot type may occur
    #[serde(default = "default_slot_type_max_days")]
    pub slot_type_max_days: u32,
    /// Forbid a Morning-type day directly after an Evening-type day
    #[serde(default = "default_true")]
    pub forbid_morning_after_evening: bool,
    /// Reject catalogues with odd practical hours instead of rounding down
    #[serde(default = "default_true")]
    pub strict_even_practicals: bool,
}

fn default_max_hours_per_day() -> u32 {
    5
}

fn default_max_consecutive_slots() -> u32 {
    2
}

fn default_morning_slots() -> Vec<usize> {
    vec![0, 1, 2]
}

fn default_morning_only_course_code() -> String {
    "CE23331".to_string()
}

fn default_open_elective_marker() -> String {
    "OpenElective".to_string()
}

fn default_solver_time_limit_sec() -> u64 {
    120
}

fn default_batch_size() -> usize {
    50
}

fn default_slot_type_min_days() -> u32 {
    1
}

fn default_slot_type_max_days() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            max_hours_per_day: default_max_hours_per_day(),
            max_consecutive_slots: default_max_consecutive_slots(),
            morning_slots: default_morning_slots(),
            morning_only_course_code: default_morning_only_course_code(),
            open_elective_marker: default_open_elective_marker(),
            solver_time_limit_sec: default_solver_time_limit_sec(),
            batch_size: default_batch_size(),
            slot_type_min_days: default_slot_type_min_days(),
            slot_type_max_days: default_slot_type_max_days(),
            forbid_morning_after_evening: true,
            strict_even_practicals: true,
        }
    }
}

impl TimetableConfig {
    /// Configuration for tiny catalogues where the slot-type rotation
    /// bounds would dominate feasibility (every teacher would need at
    /// least two afternoon-led and two evening-led days).
    pub fn relaxed_rotation() -> Self {
        Self {
            slot_type_min_days: 0,
            slot_type_max_days: crate::types::DAYS as u32,
            ..Self::default()
        }
    }
}
