use crate::scheduler::DerivedPlan;
use crate::types::{
    CourseCode, SlotCategory, SlotType, TeacherTimetable, TimetableConfig, TimetableSet, DAYS,
    MONDAY, SATURDAY, SLOTS,
};
use crate::validator::{Severity, Violation};
use std::collections::BTreeMap;

fn error(constraint: &str, message: String) -> Violation {
    Violation {
        constraint: constraint.to_string(),
        message,
        severity: Severity::Error,
    }
}

/// Every unit occupies exactly its weekly slot count. Split labs are
/// checked on their lecture share plus an even practical share.
pub fn check_weekly_workload(set: &TimetableSet, plan: &DerivedPlan) -> Vec<Violation> {
    let mut violations = Vec::new();

    for ((teacher, course), unit) in &plan.units {
        let Some(table) = set.tables.get(teacher) else {
            continue;
        };
        let cells = table.cells_for(course);
        let practical = table
            .occupied_cells()
            .filter(|(_, _, c)| &c.course == course && c.practical)
            .count();

        if plan.split_labs.contains_key(course) {
            let lectures = cells.len() - practical;
            if lectures as u32 != unit.lecture + unit.tutorial || practical % 2 != 0 {
                violations.push(error(
                    "WeeklyWorkload",
                    format!(
                        "Split lab '{}' of '{}': {} lecture cells (want {}), {} practical cells",
                        course,
                        teacher,
                        lectures,
                        unit.lecture + unit.tutorial,
                        practical
                    ),
                ));
            }
        } else if cells.len() as u32 != unit.weekly {
            violations.push(error(
                "WeeklyWorkload",
                format!(
                    "Course '{}' of '{}' occupies {} cells, expected {}",
                    course,
                    teacher,
                    cells.len(),
                    unit.weekly
                ),
            ));
        }
    }

    violations
}

/// Practical cells come in contiguous 2-slot blocks
pub fn check_practical_blocks(set: &TimetableSet, plan: &DerivedPlan) -> Vec<Violation> {
    let mut violations = Vec::new();

    for ((teacher, course), unit) in &plan.units {
        if unit.practical == 0 {
            continue;
        }
        let Some(table) = set.tables.get(teacher) else {
            continue;
        };

        let mut practical_count = 0;
        for (d, row) in table.days.iter().enumerate() {
            let mut run = 0;
            for s in 0..=SLOTS {
                let in_block = s < SLOTS
                    && row.cells[s]
                        .as_ref()
                        .map(|c| &c.course == course && c.practical)
                        .unwrap_or(false);
                if in_block {
                    run += 1;
                    practical_count += 1;
                } else if run > 0 {
                    if run % 2 != 0 {
                        violations.push(error(
                            "PracticalBlocks",
                            format!(
                                "Course '{}' of '{}' has a {}-slot practical run on {}",
                                course,
                                teacher,
                                run,
                                TeacherTimetable::day_name(d)
                            ),
                        ));
                    }
                    run = 0;
                }
            }
        }

        if !plan.split_labs.contains_key(course) && practical_count as u32 != unit.practical {
            violations.push(error(
                "PracticalBlocks",
                format!(
                    "Course '{}' of '{}' has {} practical cells, expected {}",
                    course, teacher, practical_count, unit.practical
                ),
            ));
        }
    }

    violations
}

/// No window of max_consecutive_slots + 1 slots is fully occupied
pub fn check_consecutive_runs(set: &TimetableSet, config: &TimetableConfig) -> Vec<Violation> {
    let cap = config.max_consecutive_slots as usize;
    let mut violations = Vec::new();

    for table in set.tables.values() {
        for (d, row) in table.days.iter().enumerate() {
            let mut run = 0;
            for s in 0..SLOTS {
                if row.cells[s].is_some() {
                    run += 1;
                    if run > cap {
                        violations.push(error(
                            "ConsecutiveSlots",
                            format!(
                                "Teacher '{}' teaches {} consecutive slots on {}",
                                table.teacher,
                                run,
                                TeacherTimetable::day_name(d)
                            ),
                        ));
                    }
                } else {
                    run = 0;
                }
            }
        }
    }

    violations
}

/// Daily load stays at or below the configured cap
pub fn check_daily_load(set: &TimetableSet, config: &TimetableConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    for table in set.tables.values() {
        for (d, row) in table.days.iter().enumerate() {
            if row.load() as u32 > config.max_hours_per_day {
                violations.push(error(
                    "DailyLoad",
                    format!(
                        "Teacher '{}' has {} hours on {}, cap is {}",
                        table.teacher,
                        row.load(),
                        TeacherTimetable::day_name(d),
                        config.max_hours_per_day
                    ),
                ));
            }
        }
    }

    violations
}

/// Either Monday or Saturday is completely free
pub fn check_off_day(set: &TimetableSet) -> Vec<Violation> {
    let mut violations = Vec::new();

    for table in set.tables.values() {
        if table.days[MONDAY].load() > 0 && table.days[SATURDAY].load() > 0 {
            violations.push(error(
                "OffDay",
                format!(
                    "Teacher '{}' works both Monday and Saturday",
                    table.teacher
                ),
            ));
        }
    }

    violations
}

/// The rendered slot type matches the highest category used, and each
/// type occurs within the configured day bounds
pub fn check_slot_types(set: &TimetableSet, config: &TimetableConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    for table in set.tables.values() {
        let mut occurrences: BTreeMap<SlotType, usize> = BTreeMap::new();

        for (d, row) in table.days.iter().enumerate() {
            let derived = row
                .occupied_slots()
                .map(SlotCategory::of)
                .map(|cat| cat.value())
                .max()
                .and_then(|v| SlotType::from_value(v as i64))
                .unwrap_or(SlotType::A);

            if derived != row.slot_type {
                violations.push(error(
                    "SlotTypeDerivation",
                    format!(
                        "Teacher '{}' {} is labelled {:?} but teaches as {:?}",
                        table.teacher,
                        TeacherTimetable::day_name(d),
                        row.slot_type,
                        derived
                    ),
                ));
            }
            *occurrences.entry(row.slot_type).or_default() += 1;
        }

        for slot_type in SlotType::all() {
            let days = occurrences.get(&slot_type).copied().unwrap_or(0);
            let (lo, hi) = (
                config.slot_type_min_days as usize,
                config.slot_type_max_days as usize,
            );
            if days < lo || days > hi {
                violations.push(error(
                    "SlotTypeDiversity",
                    format!(
                        "Teacher '{}' uses type {:?} on {} days (allowed {}..={})",
                        table.teacher, slot_type, days, lo, hi
                    ),
                ));
            }
        }
    }

    violations
}

/// The working window's edge keeps at least one free slot
pub fn check_free_windows(set: &TimetableSet) -> Vec<Violation> {
    let mut violations = Vec::new();

    for table in set.tables.values() {
        for (d, row) in table.days.iter().enumerate() {
            let window = row.slot_type.free_window();
            if window.iter().all(|&s| row.cells[s].is_some()) {
                violations.push(error(
                    "FreeWindow",
                    format!(
                        "Teacher '{}' {} ({:?}) has no free slot in {:?}",
                        table.teacher,
                        TeacherTimetable::day_name(d),
                        row.slot_type,
                        window
                    ),
                ));
            }
        }
    }

    violations
}

/// No Morning-type day directly after an Evening-type day
pub fn check_morning_after_evening(
    set: &TimetableSet,
    config: &TimetableConfig,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !config.forbid_morning_after_evening {
        return violations;
    }

    for table in set.tables.values() {
        for d in 0..DAYS - 1 {
            if table.days[d].slot_type == SlotType::B && table.days[d + 1].slot_type == SlotType::A
            {
                violations.push(error(
                    "MorningAfterEvening",
                    format!(
                        "Teacher '{}' has a Morning day right after Evening day {}",
                        table.teacher,
                        TeacherTimetable::day_name(d)
                    ),
                ));
            }
        }
    }

    violations
}

/// The designated morning-only course never leaves the morning window
pub fn check_morning_only(set: &TimetableSet, config: &TimetableConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    let code = CourseCode(config.morning_only_course_code.clone());

    for table in set.tables.values() {
        for (d, s) in table.cells_for(&code) {
            if !config.morning_slots.contains(&s) {
                violations.push(error(
                    "MorningOnly",
                    format!(
                        "Course '{}' of '{}' sits at {} slot {}, outside the morning window",
                        code,
                        table.teacher,
                        TeacherTimetable::day_name(d),
                        s + 1
                    ),
                ));
            }
        }
    }

    violations
}

/// All open-elective courses share one multiset of time cells
pub fn check_open_elective_coupling(set: &TimetableSet, plan: &DerivedPlan) -> Vec<Violation> {
    let mut violations = Vec::new();
    if plan.open_electives.len() < 2 {
        return violations;
    }

    let mut cells_by_course: BTreeMap<&CourseCode, Vec<(usize, usize)>> = BTreeMap::new();
    for table in set.tables.values() {
        for course in &plan.open_electives {
            let mut cells = table.cells_for(course);
            cells_by_course
                .entry(course)
                .or_default()
                .append(&mut cells);
        }
    }
    for cells in cells_by_course.values_mut() {
        cells.sort();
    }

    let mut present = cells_by_course.iter().filter(|(_, v)| !v.is_empty());
    if let Some((first_course, first_cells)) = present.next() {
        for (course, cells) in present {
            if cells != first_cells {
                violations.push(error(
                    "OpenElectiveCoupling",
                    format!(
                        "Open electives '{}' and '{}' occupy different cells",
                        first_course, course
                    ),
                ));
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::derive_plan;
    use crate::types::{Catalogue, CourseOffering, ScheduledCell, TeacherName, TimetableSet};

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

    fn cell(code: &str, practical: bool) -> Option<ScheduledCell> {
        Some(ScheduledCell {
            course: CourseCode(code.to_string()),
            practical,
        })
    }

    fn set_with_table(table: crate::types::TeacherTimetable) -> TimetableSet {
        let mut set = TimetableSet::new();
        set.tables.insert(table.teacher.clone(), table);
        set
    }

    #[test]
    fn test_detects_workload_mismatch() {
        let catalogue = Catalogue::new(vec![offering("T1", "K1", 2, 0, 0)]);
        let plan = derive_plan(&catalogue, &TimetableConfig::default()).unwrap();

        let mut table = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        table.days[1].cells[0] = cell("K1", false);
        let set = set_with_table(table);

        let violations = check_weekly_workload(&set, &plan);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("expected 2"));
    }

    #[test]
    fn test_detects_three_in_a_row() {
        let mut table = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        table.days[1].cells[2] = cell("K1", false);
        table.days[1].cells[3] = cell("K1", false);
        table.days[1].cells[4] = cell("K1", false);
        let set = set_with_table(table);

        let violations = check_consecutive_runs(&set, &TimetableConfig::default());
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_detects_missing_off_day() {
        let mut table = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        table.days[MONDAY].cells[0] = cell("K1", false);
        table.days[SATURDAY].cells[0] = cell("K1", false);
        let set = set_with_table(table);

        assert_eq!(check_off_day(&set).len(), 1);
    }

    #[test]
    fn test_detects_wrong_slot_type_label() {
        let mut table = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        // evening teaching labelled as a morning day
        table.days[2].cells[6] = cell("K1", false);
        table.days[2].slot_type = SlotType::A;
        let set = set_with_table(table);

        let violations = check_slot_types(&set, &TimetableConfig::relaxed_rotation());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, "SlotTypeDerivation");
    }

    #[test]
    fn test_detects_blocked_free_window() {
        let mut table = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        // type C window is slots 0..=1
        table.days[2].cells[0] = cell("K1", false);
        table.days[2].cells[1] = cell("K2", false);
        table.days[2].cells[3] = cell("K1", false);
        table.days[2].slot_type = SlotType::C;
        let set = set_with_table(table);

        assert_eq!(check_free_windows(&set).len(), 1);
    }

    #[test]
    fn test_detects_morning_after_evening() {
        let mut table = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        table.days[1].cells[6] = cell("K1", false);
        table.days[1].slot_type = SlotType::B;
        table.days[2].cells[0] = cell("K1", false);
        table.days[2].slot_type = SlotType::A;
        let set = set_with_table(table);

        assert_eq!(
            check_morning_after_evening(&set, &TimetableConfig::default()).len(),
            1
        );
    }

    #[test]
    fn test_detects_odd_practical_run() {
        let catalogue = Catalogue::new(vec![offering("T1", "K1", 0, 0, 2)]);
        let plan = derive_plan(&catalogue, &TimetableConfig::default()).unwrap();

        let mut table = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        table.days[1].cells[0] = cell("K1", true);
        table.days[1].cells[3] = cell("K1", true);
        let set = set_with_table(table);

        let violations = check_practical_blocks(&set, &plan);
        assert!(violations.iter().any(|v| v.message.contains("1-slot")));
    }

    #[test]
    fn test_detects_decoupled_open_electives() {
        let catalogue = Catalogue::new(vec![
            offering("T1", "OpenElective-ML", 1, 0, 0),
            offering("T2", "OpenElective-IoT", 1, 0, 0),
        ]);
        let plan = derive_plan(&catalogue, &TimetableConfig::default()).unwrap();

        let mut t1 = crate::types::TeacherTimetable::empty(TeacherName("T1".to_string()));
        t1.days[1].cells[3] = cell("OpenElective-ML", false);
        t1.days[1].slot_type = SlotType::C;
        let mut t2 = crate::types::TeacherTimetable::empty(TeacherName("T2".to_string()));
        t2.days[2].cells[4] = cell("OpenElective-IoT", false);
        t2.days[2].slot_type = SlotType::C;

        let mut set = TimetableSet::new();
        set.tables.insert(t1.teacher.clone(), t1);
        set.tables.insert(t2.teacher.clone(), t2);

        assert_eq!(check_open_elective_coupling(&set, &plan).len(), 1);
    }
}
