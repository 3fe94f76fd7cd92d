use crate::error::{Result, TimetableError};
use crate::types::{Catalogue, CourseCode, TeacherName, TimetableConfig};
use std::collections::{BTreeMap, BTreeSet};

/// Registration count that triggers lab batch splitting
pub const SPLIT_REGISTRATION: u32 = 60;

/// Weekly slot counts for one (teacher, course) unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLoad {
    pub lecture: u32,
    pub tutorial: u32,
    pub practical: u32,
    /// Total weekly slots, lecture + tutorial + practical
    pub weekly: u32,
    /// Practical hours must land in contiguous 2-slot blocks
    pub needs_consecutive: bool,
}

impl UnitLoad {
    /// Number of 2-slot lab sessions per week
    pub fn sessions(&self) -> u32 {
        self.practical / 2
    }
}

/// An oversize lab delivered as two parallel batches
#[derive(Debug, Clone)]
pub struct SplitLab {
    pub primary: TeacherName,
    pub sessions: u32,
}

/// Everything the model needs, computed once from the catalogue
#[derive(Debug, Clone)]
pub struct DerivedPlan {
    pub units: BTreeMap<(TeacherName, CourseCode), UnitLoad>,
    /// Courses per teacher, sorted
    pub teacher_courses: BTreeMap<TeacherName, Vec<CourseCode>>,
    /// Qualified teachers per course, sorted
    pub qualified: BTreeMap<CourseCode, Vec<TeacherName>>,
    pub open_electives: BTreeSet<CourseCode>,
    pub morning_only: BTreeSet<CourseCode>,
    pub split_labs: BTreeMap<CourseCode, SplitLab>,
}

impl DerivedPlan {
    pub fn unit(&self, teacher: &TeacherName, course: &CourseCode) -> &UnitLoad {
        &self.units[&(teacher.clone(), course.clone())]
    }

    /// Teachers in lexicographic order
    pub fn teachers(&self) -> Vec<&TeacherName> {
        self.teacher_courses.keys().collect()
    }

    pub fn is_open_elective(&self, course: &CourseCode) -> bool {
        self.open_electives.contains(course)
    }

    /// Number of (teacher, course) units marked open-elective
    pub fn open_elective_unit_count(&self) -> usize {
        self.units
            .keys()
            .filter(|(_, c)| self.open_electives.contains(c))
            .count()
    }

    /// Teachers delivering at least one open elective
    pub fn open_elective_teachers(&self) -> Vec<&TeacherName> {
        self.teacher_courses
            .iter()
            .filter(|(_, courses)| courses.iter().any(|c| self.open_electives.contains(c)))
            .map(|(t, _)| t)
            .collect()
    }
}

/// Derive per-unit slot counts and course groupings from the catalogue
pub fn derive_plan(catalogue: &Catalogue, config: &TimetableConfig) -> Result<DerivedPlan> {
    let mut units = BTreeMap::new();
    let mut teacher_courses: BTreeMap<TeacherName, Vec<CourseCode>> = BTreeMap::new();
    let mut qualified: BTreeMap<CourseCode, Vec<TeacherName>> = BTreeMap::new();
    let mut open_electives = BTreeSet::new();
    let mut morning_only = BTreeSet::new();

    for offering in &catalogue.offerings {
        if config.strict_even_practicals && offering.practical_hours % 2 != 0 {
            return Err(TimetableError::OddPracticalHours {
                teacher: offering.teacher.to_string(),
                course: offering.code.to_string(),
                hours: offering.practical_hours,
            }
            .into());
        }

        units.insert(
            (offering.teacher.clone(), offering.code.clone()),
            UnitLoad {
                lecture: offering.lecture_hours,
                tutorial: offering.tutorial_hours,
                practical: offering.practical_hours,
                weekly: offering.weekly_slots(),
                needs_consecutive: offering.practical_hours >= 2,
            },
        );

        teacher_courses
            .entry(offering.teacher.clone())
            .or_default()
            .push(offering.code.clone());
        qualified
            .entry(offering.code.clone())
            .or_default()
            .push(offering.teacher.clone());

        if offering.code.as_str().contains(&config.open_elective_marker) {
            open_electives.insert(offering.code.clone());
        }
        if offering.code.as_str() == config.morning_only_course_code {
            morning_only.insert(offering.code.clone());
        }
    }

    for courses in teacher_courses.values_mut() {
        courses.sort();
    }
    for teachers in qualified.values_mut() {
        teachers.sort();
        teachers.dedup();
    }

    // Oversize labs: practical course at the split registration count with
    // at least two qualified teachers
    let mut split_labs = BTreeMap::new();
    for offering in &catalogue.offerings {
        if offering.registration != Some(SPLIT_REGISTRATION) || offering.practical_hours < 2 {
            continue;
        }
        if split_labs.contains_key(&offering.code) {
            continue;
        }
        if qualified[&offering.code].len() < 2 {
            log::warn!(
                "course {} is at the split threshold but has a single qualified teacher",
                offering.code
            );
            continue;
        }
        let primary = catalogue
            .primary_teacher(&offering.code)
            .cloned()
            .unwrap_or_else(|| offering.teacher.clone());
        split_labs.insert(
            offering.code.clone(),
            SplitLab {
                primary,
                sessions: offering.practical_hours / 2,
            },
        );
    }

    log::info!(
        "derived {} units, {} open electives, {} split labs",
        units.len(),
        open_electives.len(),
        split_labs.len()
    );

    Ok(DerivedPlan {
        units,
        teacher_courses,
        qualified,
        open_electives,
        morning_only,
        split_labs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CourseOffering;

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
    fn test_unit_loads() {
        let catalogue = Catalogue::new(vec![
            offering("ANN", "CS1", 3, 1, 0),
            offering("ANN", "CS2", 2, 0, 2),
        ]);
        let plan = derive_plan(&catalogue, &TimetableConfig::default()).unwrap();

        let cs1 = plan.unit(
            &TeacherName("ANN".to_string()),
            &CourseCode("CS1".to_string()),
        );
        assert_eq!(cs1.weekly, 4);
        assert!(!cs1.needs_consecutive);

        let cs2 = plan.unit(
            &TeacherName("ANN".to_string()),
            &CourseCode("CS2".to_string()),
        );
        assert_eq!(cs2.weekly, 4);
        assert!(cs2.needs_consecutive);
        assert_eq!(cs2.sessions(), 1);
    }

    #[test]
    fn test_odd_practicals_are_fatal_by_default() {
        let catalogue = Catalogue::new(vec![offering("ANN", "CS1", 0, 0, 3)]);
        let err = derive_plan(&catalogue, &TimetableConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast::<TimetableError>().unwrap(),
            TimetableError::OddPracticalHours { hours: 3, .. }
        ));
    }

    #[test]
    fn test_odd_practicals_round_down_when_relaxed() {
        let catalogue = Catalogue::new(vec![offering("ANN", "CS1", 0, 0, 3)]);
        let config = TimetableConfig {
            strict_even_practicals: false,
            ..TimetableConfig::default()
        };
        let plan = derive_plan(&catalogue, &config).unwrap();
        let unit = plan.unit(
            &TeacherName("ANN".to_string()),
            &CourseCode("CS1".to_string()),
        );
        assert_eq!(unit.sessions(), 1);
    }

    #[test]
    fn test_open_elective_and_morning_only_detection() {
        let catalogue = Catalogue::new(vec![
            offering("ANN", "OpenElective-ML", 2, 0, 0),
            offering("BEA", "OpenElective-IoT", 2, 0, 0),
            offering("BEA", "CE23331", 0, 0, 2),
        ]);
        let plan = derive_plan(&catalogue, &TimetableConfig::default()).unwrap();
        assert_eq!(plan.open_electives.len(), 2);
        assert_eq!(plan.open_elective_unit_count(), 2);
        assert_eq!(plan.open_elective_teachers().len(), 2);
        assert!(plan
            .morning_only
            .contains(&CourseCode("CE23331".to_string())));
    }

    #[test]
    fn test_split_lab_requires_two_qualified_teachers() {
        let mut single = offering("ANN", "CS9", 0, 0, 2);
        single.registration = Some(SPLIT_REGISTRATION);

        let catalogue = Catalogue::new(vec![single.clone()]);
        let plan = derive_plan(&catalogue, &TimetableConfig::default()).unwrap();
        assert!(plan.split_labs.is_empty());

        let mut second = offering("BEA", "CS9", 0, 0, 2);
        second.registration = Some(SPLIT_REGISTRATION);
        let catalogue = Catalogue::new(vec![single, second]);
        let plan = derive_plan(&catalogue, &TimetableConfig::default()).unwrap();
        let split = &plan.split_labs[&CourseCode("CS9".to_string())];
        assert_eq!(split.primary, TeacherName("ANN".to_string()));
        assert_eq!(split.sessions, 1);
    }
}
