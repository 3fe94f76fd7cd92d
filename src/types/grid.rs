use serde::{Deserialize, Serialize};

/// Days in the teaching week (Mon..Sat)
pub const DAYS: usize = 6;

/// Teaching slots per day
pub const SLOTS: usize = 7;

pub const DAY_NAMES: [&str; DAYS] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub const MONDAY: usize = 0;
pub const SATURDAY: usize = 5;

/// Morning/Afternoon/Evening partition over the seven daily slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotCategory {
    Morning = 0,
    Afternoon = 1,
    Evening = 2,
}

impl SlotCategory {
    /// Category of a slot index: 0-2 Morning, 3-4 Afternoon, 5-6 Evening
    pub fn of(slot: usize) -> Self {
        match slot {
            0..=2 => SlotCategory::Morning,
            3 | 4 => SlotCategory::Afternoon,
            _ => SlotCategory::Evening,
        }
    }

    pub fn value(self) -> usize {
        self as usize
    }

    /// Slot indices belonging to this category
    pub fn slots(self) -> &'static [usize] {
        match self {
            SlotCategory::Morning => &[0, 1, 2],
            SlotCategory::Afternoon => &[3, 4],
            SlotCategory::Evening => &[5, 6],
        }
    }
}

/// A teacher's working window on one day, derived from the highest
/// slot category used that day (Evening > Afternoon > Morning).
///
/// The numeric values mirror the category values: A=0, C=1, B=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotType {
    A = 0,
    C = 1,
    B = 2,
}

impl SlotType {
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(SlotType::A),
            1 => Some(SlotType::C),
            2 => Some(SlotType::B),
            _ => None,
        }
    }

    pub fn value(self) -> usize {
        self as usize
    }

    /// Human label as printed in the SlotType column
    pub fn label(self) -> &'static str {
        match self {
            SlotType::A => "A (8–3)",
            SlotType::B => "B (10–5)",
            SlotType::C => "C (12–7)",
        }
    }

    /// Window edge that must keep at least one free slot for this type
    pub fn free_window(self) -> &'static [usize] {
        match self {
            SlotType::A => &[3, 4, 5],
            SlotType::B => &[1, 2, 3],
            SlotType::C => &[0, 1],
        }
    }

    pub fn all() -> [SlotType; 3] {
        [SlotType::A, SlotType::C, SlotType::B]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_categories_partition_the_day() {
        let cats: Vec<SlotCategory> = (0..SLOTS).map(SlotCategory::of).collect();
        assert_eq!(
            cats,
            vec![
                SlotCategory::Morning,
                SlotCategory::Morning,
                SlotCategory::Morning,
                SlotCategory::Afternoon,
                SlotCategory::Afternoon,
                SlotCategory::Evening,
                SlotCategory::Evening,
            ]
        );
    }

    #[test]
    fn test_slot_type_values_match_category_priority() {
        assert_eq!(SlotType::from_value(0), Some(SlotType::A));
        assert_eq!(SlotType::from_value(1), Some(SlotType::C));
        assert_eq!(SlotType::from_value(2), Some(SlotType::B));
        assert_eq!(SlotType::from_value(3), None);
    }

    #[test]
    fn test_free_windows() {
        assert_eq!(SlotType::A.free_window(), &[3, 4, 5]);
        assert_eq!(SlotType::B.free_window(), &[1, 2, 3]);
        assert_eq!(SlotType::C.free_window(), &[0, 1]);
    }
}
