use serde::{Deserialize, Serialize};

use super::{CourseCode, TeacherName};

/// One (teacher, course) row of the catalogue after coercion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOffering {
    pub code: CourseCode,
    pub teacher: TeacherName,
    pub lecture_hours: u32,
    pub tutorial_hours: u32,
    pub practical_hours: u32,
    /// Credit value, already filtered to 1..=5
    pub credits: u32,
    /// Enrolment count, when the input carries a registration column
    #[serde(default)]
    pub registration: Option<u32>,
}

impl CourseOffering {
    /// Weekly slots this unit occupies
    pub fn weekly_slots(&self) -> u32 {
        self.lecture_hours + self.tutorial_hours + self.practical_hours
    }

    pub fn has_practicals(&self) -> bool {
        self.practical_hours > 0
    }
}

/// The normalised course catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogue {
    /// Deduplicated offerings, in input order
    pub offerings: Vec<CourseOffering>,
    /// Teachers in lexicographic order
    pub teachers: Vec<TeacherName>,
}

impl Catalogue {
    /// Build from deduplicated offerings, deriving the sorted teacher list
    pub fn new(offerings: Vec<CourseOffering>) -> Self {
        let mut teachers: Vec<TeacherName> = offerings
            .iter()
            .map(|o| o.teacher.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        teachers.sort();
        Self { offerings, teachers }
    }

    /// Course codes delivered by a teacher, sorted
    pub fn courses_for(&self, teacher: &TeacherName) -> Vec<&CourseCode> {
        let mut codes: Vec<&CourseCode> = self
            .offerings
            .iter()
            .filter(|o| &o.teacher == teacher)
            .map(|o| &o.code)
            .collect();
        codes.sort();
        codes
    }

    /// Teachers qualified for a course, sorted
    pub fn qualified_teachers(&self, code: &CourseCode) -> Vec<&TeacherName> {
        let mut names: Vec<&TeacherName> = self
            .offerings
            .iter()
            .filter(|o| &o.code == code)
            .map(|o| &o.teacher)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Faculty of the first catalogue row carrying this course
    pub fn primary_teacher(&self, code: &CourseCode) -> Option<&TeacherName> {
        self.offerings
            .iter()
            .find(|o| &o.code == code)
            .map(|o| &o.teacher)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn offering(teacher: &str, code: &str) -> CourseOffering {
        CourseOffering {
            code: CourseCode(code.to_string()),
            teacher: TeacherName(teacher.to_string()),
            lecture_hours: 3,
            tutorial_hours: 1,
            practical_hours: 0,
            credits: 4,
            registration: None,
        }
    }

    #[test]
    fn test_teachers_are_sorted_and_unique() {
        let catalogue = Catalogue::new(vec![
            offering("ZED", "CS1"),
            offering("ANN", "CS2"),
            offering("ZED", "CS3"),
        ]);
        assert_eq!(
            catalogue.teachers,
            vec![
                TeacherName("ANN".to_string()),
                TeacherName("ZED".to_string())
            ]
        );
        assert_eq!(
            catalogue.courses_for(&TeacherName("ZED".to_string())),
            vec![
                &CourseCode("CS1".to_string()),
                &CourseCode("CS3".to_string())
            ]
        );
    }

    #[test]
    fn test_primary_teacher_is_first_occurrence() {
        let catalogue = Catalogue::new(vec![offering("ZED", "CS1"), offering("ANN", "CS1")]);
        assert_eq!(
            catalogue.primary_teacher(&CourseCode("CS1".to_string())),
            Some(&TeacherName("ZED".to_string()))
        );
        assert_eq!(
            catalogue.qualified_teachers(&CourseCode("CS1".to_string())).len(),
            2
        );
    }
}
