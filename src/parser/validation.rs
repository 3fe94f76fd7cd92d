use crate::error::Result;
use crate::types::{Catalogue, TimetableConfig, DAYS};
use std::collections::BTreeMap;

/// Validation result with collected errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate the catalogue before building a model
pub fn validate_catalogue(
    catalogue: &Catalogue,
    config: &TimetableConfig,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    for offering in &catalogue.offerings {
        if offering.weekly_slots() == 0 {
            result.add_error(format!(
                "Course '{}' of '{}' has no teaching hours",
                offering.code, offering.teacher
            ));
        }

        if config.strict_even_practicals && offering.practical_hours % 2 != 0 {
            result.add_error(format!(
                "Course '{}' of '{}' has odd practical hours ({})",
                offering.code, offering.teacher, offering.practical_hours
            ));
        }
    }

    // A teacher can use at most five working days after the off-day rule
    let teachable = (DAYS as u32 - 1) * config.max_hours_per_day;
    let mut weekly: BTreeMap<&str, u32> = BTreeMap::new();
    for offering in &catalogue.offerings {
        *weekly.entry(offering.teacher.as_str()).or_default() += offering.weekly_slots();
    }
    for (teacher, total) in weekly {
        if total > teachable {
            result.add_warning(format!(
                "Teacher '{}' carries {} weekly hours; at most {} are schedulable",
                teacher, total, teachable
            ));
        }
    }

    // Open electives must share one cell pattern, so their weekly totals
    // have to agree
    let oe_units: Vec<_> = catalogue
        .offerings
        .iter()
        .filter(|o| o.code.as_str().contains(&config.open_elective_marker))
        .collect();
    if oe_units.len() == 1 {
        result.add_warning(format!(
            "Only one open-elective unit ('{}'); nothing to couple",
            oe_units[0].code
        ));
    }
    if let Some(first) = oe_units.first() {
        for unit in &oe_units[1..] {
            if unit.weekly_slots() != first.weekly_slots() {
                result.add_warning(format!(
                    "Open electives '{}' ({}h) and '{}' ({}h) differ in weekly hours; coupling them is infeasible",
                    first.code,
                    first.weekly_slots(),
                    unit.code,
                    unit.weekly_slots()
                ));
            }
        }
    }

    // Morning-only teaching is capped at the morning window
    let morning_capacity = (config.morning_slots.len() * DAYS) as u32;
    for offering in &catalogue.offerings {
        if offering.code.as_str() == config.morning_only_course_code
            && offering.weekly_slots() > morning_capacity
        {
            result.add_warning(format!(
                "Morning-only course '{}' needs {} slots but the morning window offers {}",
                offering.code,
                offering.weekly_slots(),
                morning_capacity
            ));
        }
    }

    if !result.is_valid() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} errors:\n{}",
            result.errors.len(),
            result.errors.join("\n")
        ));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseCode, CourseOffering, TeacherName};

    fn offering(teacher: &str, code: &str, l: u32, t: u32, p: u32) -> CourseOffering {
        CourseOffering {
            code: CourseCode(code.to_string()),
            teacher: TeacherName(teacher.to_string()),
            lecture_hours: l,
            tutorial_hours: t,
            practical_hours: p,
            credits: 3,
            registration: None,
        }
    }

    #[test]
    fn test_odd_practicals_rejected() {
        let catalogue = Catalogue::new(vec![offering("ANN", "CS1", 2, 0, 3)]);
        let err = validate_catalogue(&catalogue, &TimetableConfig::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_odd_practicals_allowed_when_relaxed() {
        let catalogue = Catalogue::new(vec![offering("ANN", "CS1", 2, 0, 3)]);
        let config = TimetableConfig {
            strict_even_practicals: false,
            ..TimetableConfig::default()
        };
        let result = validate_catalogue(&catalogue, &config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_overloaded_teacher_warns() {
        let catalogue = Catalogue::new(vec![
            offering("ANN", "CS1", 10, 2, 0),
            offering("ANN", "CS2", 10, 2, 0),
            offering("ANN", "CS3", 2, 0, 0),
        ]);
        let result = validate_catalogue(&catalogue, &TimetableConfig::default()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("ANN"));
    }

    #[test]
    fn test_mismatched_open_electives_warn() {
        let catalogue = Catalogue::new(vec![
            offering("ANN", "OpenElective-ML", 2, 0, 0),
            offering("BEA", "OpenElective-IoT", 3, 0, 0),
        ]);
        let result = validate_catalogue(&catalogue, &TimetableConfig::default()).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("differ in weekly hours")));
    }
}
