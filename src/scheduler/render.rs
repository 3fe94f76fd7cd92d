//! Reads a completed solution back into per-teacher weekly grids.

use crate::scheduler::model::TimetableModel;
use crate::scheduler::solver::CpSolution;
use crate::types::{
    DayRow, ScheduledCell, SlotType, TeacherName, TeacherTimetable, DAYS, SLOTS,
};
use std::collections::BTreeMap;

/// Materialise one table per teacher from the solved model
pub fn render_tables(
    model: &TimetableModel<'_>,
    solution: &CpSolution,
) -> BTreeMap<TeacherName, TeacherTimetable> {
    let mut tables = BTreeMap::new();

    for (t, teacher) in model.teachers().iter().enumerate() {
        let mut table = TeacherTimetable::empty((*teacher).clone());

        for d in 0..DAYS {
            let mut row = DayRow::empty();

            for s in 0..SLOTS {
                for (c, code) in model.courses_of(t).iter().enumerate() {
                    if !solution.is_true(model.assignment(t, c, d, s)) {
                        continue;
                    }
                    row.cells[s] = Some(ScheduledCell {
                        course: (*code).clone(),
                        practical: model.is_practical_cell(solution, t, c, d, s),
                    });
                    break;
                }
            }

            row.slot_type = SlotType::from_value(solution.value(model.day_slot_type(t, d)))
                .unwrap_or(SlotType::A);
            table.days[d] = row;
        }

        tables.insert((*teacher).clone(), table);
    }

    tables
}
