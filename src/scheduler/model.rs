//! Decision variables and hard constraints of the weekly timetable.
//!
//! Variable families, per batch of teachers:
//! - `x[t,c,d,s]`: teacher t delivers course c at (day, slot)
//! - `teaches[t,d,s]`: t delivers anything at (day, slot)
//! - `start[t,c,d,s]`: a 2-slot lab session of c starts at (day, slot)
//! - `is_type[t,d,k]`: one-hot slot-type selector for the day
//! - `slot_type[t,d]`: the day's working window as an integer in 0..=2
//! - `mon_to_fri[t]`: the teacher works Mon-Fri (Saturday off) rather
//!   than Tue-Sat (Monday off)
//! - `oe[d,s]`: shared open-elective cell pattern
//! - batch-split start indicators for oversize labs

use crate::scheduler::plan::{DerivedPlan, UnitLoad};
use crate::scheduler::solver::{Cmp, CpModel, CpSolution, LinExpr, VarId};
use crate::types::{
    CourseCode, SlotCategory, SlotType, TeacherName, TimetableConfig, DAYS, MONDAY, SATURDAY,
    SLOTS,
};
use itertools::iproduct;
use std::collections::{BTreeMap, BTreeSet};

/// How the model treats open-elective coupling
#[derive(Debug, Clone, Copy)]
pub enum OpenElectiveMode<'p> {
    /// Couple OE units through shared per-cell variables
    Coupled,
    /// Pin OE units to a pattern fixed by an earlier global solve
    Fixed(&'p BTreeSet<(usize, usize)>),
}

pub struct TimetableModel<'a> {
    pub cp: CpModel,
    plan: &'a DerivedPlan,
    teachers: Vec<&'a TeacherName>,
    courses: Vec<Vec<&'a CourseCode>>,
    x: BTreeMap<(usize, usize, usize, usize), VarId>,
    teaches: BTreeMap<(usize, usize, usize), VarId>,
    starts: BTreeMap<(usize, usize, usize, usize), VarId>,
    slot_type: BTreeMap<(usize, usize), VarId>,
    is_type: BTreeMap<(usize, usize, usize), VarId>,
    oe_cells: BTreeMap<(usize, usize), VarId>,
    /// (course, batch, teacher index, day, slot) -> lab session start
    split_starts: BTreeMap<(&'a CourseCode, usize, usize, usize, usize), VarId>,
}

impl<'a> TimetableModel<'a> {
    /// Build the full constraint model for a subset of teachers.
    pub fn build(
        plan: &'a DerivedPlan,
        config: &TimetableConfig,
        teachers: Vec<&'a TeacherName>,
        oe_mode: OpenElectiveMode<'_>,
    ) -> Self {
        let courses: Vec<Vec<&'a CourseCode>> = teachers
            .iter()
            .map(|t| plan.teacher_courses[*t].iter().collect())
            .collect();

        let mut model = Self {
            cp: CpModel::new(),
            plan,
            teachers,
            courses,
            x: BTreeMap::new(),
            teaches: BTreeMap::new(),
            starts: BTreeMap::new(),
            slot_type: BTreeMap::new(),
            is_type: BTreeMap::new(),
            oe_cells: BTreeMap::new(),
            split_starts: BTreeMap::new(),
        };

        let split_applied = model.split_courses_in_scope();

        model.create_assignment_vars();
        model.create_split_start_vars(&split_applied);
        model.post_weekly_workload(&split_applied);
        model.post_one_course_per_slot();
        model.post_practical_continuity(&split_applied);
        model.post_split_lab_rules(&split_applied);
        model.post_slot_type_derivation();
        model.post_slot_type_diversity(config);
        model.post_free_windows();
        model.post_consecutive_cap(config);
        model.post_daily_load(config);
        model.post_off_day();
        model.post_morning_only(config);
        model.post_open_electives(oe_mode);
        if config.forbid_morning_after_evening {
            model.post_no_morning_after_evening();
        }

        log::debug!(
            "model over {} teachers: {} vars, {} constraints",
            model.teachers.len(),
            model.cp.num_vars(),
            model.cp.num_constraints()
        );

        model
    }

    pub fn teachers(&self) -> &[&'a TeacherName] {
        &self.teachers
    }

    pub fn courses_of(&self, t: usize) -> &[&'a CourseCode] {
        &self.courses[t]
    }

    pub fn assignment(&self, t: usize, c: usize, d: usize, s: usize) -> VarId {
        self.x[&(t, c, d, s)]
    }

    pub fn day_slot_type(&self, t: usize, d: usize) -> VarId {
        self.slot_type[&(t, d)]
    }

    fn unit(&self, t: usize, c: usize) -> &'a UnitLoad {
        self.plan.unit(self.teachers[t], self.courses[t][c])
    }

    /// Split-lab courses whose qualified teachers all sit in this model
    fn split_courses_in_scope(&self) -> BTreeSet<&'a CourseCode> {
        let present: BTreeSet<&TeacherName> = self.teachers.iter().copied().collect();
        self.plan
            .split_labs
            .keys()
            .filter(|code| {
                let qualified = &self.plan.qualified[*code];
                let all_present = qualified.iter().all(|t| present.contains(t));
                if !all_present && qualified.iter().any(|t| present.contains(t)) {
                    log::warn!(
                        "split lab {} spans batch boundaries; falling back to unsplit sessions",
                        code
                    );
                }
                all_present
            })
            .collect()
    }

    fn teacher_indices_for(&self, code: &CourseCode) -> Vec<usize> {
        self.plan.qualified[code]
            .iter()
            .filter_map(|name| self.teachers.iter().position(|t| *t == name))
            .collect()
    }

    /// Index of the course within the teacher's list. Every qualified
    /// teacher carries the course, so a miss only happens on an
    /// inconsistent plan.
    fn course_index(&self, t: usize, code: &CourseCode) -> Option<usize> {
        let index = self.courses[t].iter().position(|c| *c == code);
        debug_assert!(index.is_some(), "qualified teacher carries the course");
        index
    }

    /// Boolean that is 1 exactly when the teacher occupies any slot of
    /// the category on that day
    fn reify_category_use(&mut self, t: usize, d: usize, cat: SlotCategory) -> VarId {
        let over: Vec<VarId> = cat
            .slots()
            .iter()
            .map(|&s| self.teaches[&(t, d, s)])
            .collect();
        let used = self.cp.add_bool_var();
        self.cp.add_max_equality(used, &over);
        used
    }

    fn create_assignment_vars(&mut self) {
        for t in 0..self.teachers.len() {
            for c in 0..self.courses[t].len() {
                for (d, s) in iproduct!(0..DAYS, 0..SLOTS) {
                    let var = self.cp.add_bool_var();
                    self.x.insert((t, c, d, s), var);
                }
            }
        }

        // teaches[t,d,s] reifies "any course of t occupies the cell"
        for t in 0..self.teachers.len() {
            for (d, s) in iproduct!(0..DAYS, 0..SLOTS) {
                let over: Vec<VarId> = (0..self.courses[t].len())
                    .map(|c| self.x[&(t, c, d, s)])
                    .collect();
                let teaching = self.cp.add_bool_var();
                self.cp.add_max_equality(teaching, &over);
                self.teaches.insert((t, d, s), teaching);
            }
        }
    }

    fn create_split_start_vars(&mut self, split_applied: &BTreeSet<&'a CourseCode>) {
        for &code in split_applied {
            let teacher_idxs = self.teacher_indices_for(code);
            for (batch, t) in iproduct!(0..2usize, teacher_idxs) {
                for (d, s) in iproduct!(0..DAYS, 0..SLOTS - 1) {
                    let var = self.cp.add_bool_var();
                    self.split_starts.insert((code, batch, t, d, s), var);
                }
            }
        }
    }

    /// Every unit occupies exactly its weekly slot count. For split
    /// labs the practical share depends on how many sessions the teacher
    /// hosts, so the constraint becomes sum(x) - 2*hosted = L + T.
    fn post_weekly_workload(&mut self, split_applied: &BTreeSet<&'a CourseCode>) {
        for t in 0..self.teachers.len() {
            for c in 0..self.courses[t].len() {
                let code = self.courses[t][c];
                let unit = self.unit(t, c);
                let mut expr = LinExpr::sum(
                    iproduct!(0..DAYS, 0..SLOTS).map(|(d, s)| self.x[&(t, c, d, s)]),
                );

                if split_applied.contains(code) {
                    for (batch, (d, s)) in iproduct!(0..2usize, iproduct!(0..DAYS, 0..SLOTS - 1)) {
                        expr.add_term(-2, self.split_starts[&(code, batch, t, d, s)]);
                    }
                    let lectures = (unit.lecture + unit.tutorial) as i64;
                    self.cp.add_linear(expr, Cmp::Eq, lectures);
                } else {
                    self.cp.add_linear(expr, Cmp::Eq, unit.weekly as i64);
                }
            }
        }
    }

    /// At most one course per (teacher, day, slot)
    fn post_one_course_per_slot(&mut self) {
        for t in 0..self.teachers.len() {
            for (d, s) in iproduct!(0..DAYS, 0..SLOTS) {
                let expr = LinExpr::sum((0..self.courses[t].len()).map(|c| self.x[&(t, c, d, s)]));
                self.cp.add_linear(expr, Cmp::Le, 1);
            }
        }
    }

    /// Practical hours arrive as 2-slot sessions. A start at (d,s)
    /// forces the unit's cells at s and s+1; each unit needs P/2 starts.
    fn post_practical_continuity(&mut self, split_applied: &BTreeSet<&'a CourseCode>) {
        for t in 0..self.teachers.len() {
            for c in 0..self.courses[t].len() {
                let code = self.courses[t][c];
                let unit = self.unit(t, c);
                if !unit.needs_consecutive || split_applied.contains(code) {
                    continue;
                }

                for (d, s) in iproduct!(0..DAYS, 0..SLOTS - 1) {
                    let start = self.cp.add_bool_var();
                    self.cp.add_reified_implication(
                        start,
                        self.x[&(t, c, d, s)].into(),
                        Cmp::Ge,
                        1,
                    );
                    self.cp.add_reified_implication(
                        start,
                        self.x[&(t, c, d, s + 1)].into(),
                        Cmp::Ge,
                        1,
                    );
                    self.starts.insert((t, c, d, s), start);
                }

                let total = LinExpr::sum(
                    iproduct!(0..DAYS, 0..SLOTS - 1).map(|(d, s)| self.starts[&(t, c, d, s)]),
                );
                self.cp.add_linear(total, Cmp::Eq, unit.sessions() as i64);
            }
        }
    }

    /// Oversize labs run as two batches: per batch the session count, a
    /// disjoint time-cell footprint, disjoint hosts, and batch 1 pinned
    /// to the course's primary teacher.
    fn post_split_lab_rules(&mut self, split_applied: &BTreeSet<&'a CourseCode>) {
        for &code in split_applied {
            let split = &self.plan.split_labs[code];
            let teacher_idxs = self.teacher_indices_for(code);

            // A session start forces the host's two assignment cells
            for (batch, &t) in iproduct!(0..2usize, teacher_idxs.iter()) {
                let Some(c) = self.course_index(t, code) else {
                    continue;
                };
                for (d, s) in iproduct!(0..DAYS, 0..SLOTS - 1) {
                    let start = self.split_starts[&(code, batch, t, d, s)];
                    self.cp
                        .add_reified_implication(start, self.x[&(t, c, d, s)].into(), Cmp::Ge, 1);
                    self.cp.add_reified_implication(
                        start,
                        self.x[&(t, c, d, s + 1)].into(),
                        Cmp::Ge,
                        1,
                    );
                }
            }

            // Each batch delivers its weekly sessions
            for batch in 0..2usize {
                let expr = LinExpr::sum(
                    iproduct!(teacher_idxs.iter().copied(), 0..DAYS, 0..SLOTS - 1)
                        .map(|(t, d, s)| self.split_starts[&(code, batch, t, d, s)]),
                );
                self.cp.add_linear(expr, Cmp::Eq, split.sessions as i64);
            }

            // The two batches never share a covered time cell
            for (d, s) in iproduct!(0..DAYS, 0..SLOTS) {
                let mut covering = LinExpr::new();
                for (batch, &t) in iproduct!(0..2usize, teacher_idxs.iter()) {
                    if s < SLOTS - 1 {
                        covering.add_term(1, self.split_starts[&(code, batch, t, d, s)]);
                    }
                    if s > 0 {
                        covering.add_term(1, self.split_starts[&(code, batch, t, d, s - 1)]);
                    }
                }
                self.cp.add_linear(covering, Cmp::Le, 1);
            }

            // A teacher hosts at most one of the two batches; the primary
            // teacher hosts batch 1
            for &t in &teacher_idxs {
                let mut hosts = Vec::with_capacity(2);
                for batch in 0..2usize {
                    let sessions: Vec<VarId> = iproduct!(0..DAYS, 0..SLOTS - 1)
                        .map(|(d, s)| self.split_starts[&(code, batch, t, d, s)])
                        .collect();
                    let host = self.cp.add_bool_var();
                    self.cp.add_max_equality(host, &sessions);
                    hosts.push(host);
                }
                self.cp
                    .add_linear(LinExpr::sum(hosts.iter().copied()), Cmp::Le, 1);

                if self.teachers[t] == &split.primary {
                    self.cp.add_linear(hosts[0].into(), Cmp::Eq, 1);
                }
            }
        }
    }

    /// The day's slot type follows the highest category used.
    /// `is_type` is a one-hot selector: Evening usage forces type 2,
    /// Afternoon without Evening forces type 1, anything else is type 0.
    fn post_slot_type_derivation(&mut self) {
        for t in 0..self.teachers.len() {
            for d in 0..DAYS {
                let uses_afternoon = self.reify_category_use(t, d, SlotCategory::Afternoon);
                let uses_evening = self.reify_category_use(t, d, SlotCategory::Evening);

                // type 2 exactly when the evening is used
                let type2 = uses_evening;

                // type 1 = afternoon and not evening
                let type1 = self.cp.add_bool_var();
                self.cp
                    .add_linear(LinExpr::from(type1).plus(-1, uses_afternoon), Cmp::Le, 0);
                self.cp
                    .add_linear(LinExpr::sum([type1, uses_evening]), Cmp::Le, 1);
                self.cp.add_linear(
                    LinExpr::from(type1)
                        .plus(-1, uses_afternoon)
                        .plus(1, uses_evening),
                    Cmp::Ge,
                    0,
                );

                // one-hot; an empty day lands on type 0
                let type0 = self.cp.add_bool_var();
                self.cp
                    .add_linear(LinExpr::sum([type0, type1, type2]), Cmp::Eq, 1);

                let slot_type = self.cp.add_int_var(0, 2);
                for (k, selector) in [(0, type0), (1, type1), (2, type2)] {
                    self.cp
                        .add_reified_implication(selector, slot_type.into(), Cmp::Eq, k);
                }

                self.is_type.insert((t, d, 0), type0);
                self.is_type.insert((t, d, 1), type1);
                self.is_type.insert((t, d, 2), type2);
                self.slot_type.insert((t, d), slot_type);
            }
        }
    }

    /// Each slot type occurs on a bounded number of days per week
    fn post_slot_type_diversity(&mut self, config: &TimetableConfig) {
        for t in 0..self.teachers.len() {
            for k in 0..3 {
                let occurrences = LinExpr::sum((0..DAYS).map(|d| self.is_type[&(t, d, k)]));
                if config.slot_type_min_days > 0 {
                    self.cp.add_linear(
                        occurrences.clone(),
                        Cmp::Ge,
                        config.slot_type_min_days as i64,
                    );
                }
                if (config.slot_type_max_days as usize) < DAYS {
                    self.cp
                        .add_linear(occurrences, Cmp::Le, config.slot_type_max_days as i64);
                }
            }
        }
    }

    /// The working window's edge keeps at least one free slot
    fn post_free_windows(&mut self) {
        for t in 0..self.teachers.len() {
            for d in 0..DAYS {
                for slot_type in SlotType::all() {
                    let window = slot_type.free_window();
                    let selector = self.is_type[&(t, d, slot_type.value())];
                    let occupied = LinExpr::sum(window.iter().map(|&s| self.teaches[&(t, d, s)]));
                    self.cp.add_reified_implication(
                        selector,
                        occupied,
                        Cmp::Le,
                        window.len() as i64 - 1,
                    );
                }
            }
        }
    }

    /// Never more than `max_consecutive_slots` occupied slots in a row
    fn post_consecutive_cap(&mut self, config: &TimetableConfig) {
        let cap = config.max_consecutive_slots as usize;
        if cap >= SLOTS {
            return;
        }
        for t in 0..self.teachers.len() {
            for d in 0..DAYS {
                for window_start in 0..SLOTS - cap {
                    let expr = LinExpr::sum(
                        (window_start..=window_start + cap).map(|s| self.teaches[&(t, d, s)]),
                    );
                    self.cp.add_linear(expr, Cmp::Le, cap as i64);
                }
            }
        }
    }

    /// Daily teaching load cap
    fn post_daily_load(&mut self, config: &TimetableConfig) {
        for t in 0..self.teachers.len() {
            for d in 0..DAYS {
                let expr = LinExpr::sum(
                    iproduct!(0..self.courses[t].len(), 0..SLOTS)
                        .map(|(c, s)| self.x[&(t, c, d, s)]),
                );
                self.cp
                    .add_linear(expr, Cmp::Le, config.max_hours_per_day as i64);
            }
        }
    }

    /// Mon-Fri teachers rest on Saturday, Tue-Sat teachers on Monday
    fn post_off_day(&mut self) {
        for t in 0..self.teachers.len() {
            let mon_to_fri = self.cp.add_bool_var();
            let saturday = LinExpr::sum(
                iproduct!(0..self.courses[t].len(), 0..SLOTS)
                    .map(|(c, s)| self.x[&(t, c, SATURDAY, s)]),
            );
            let monday = LinExpr::sum(
                iproduct!(0..self.courses[t].len(), 0..SLOTS)
                    .map(|(c, s)| self.x[&(t, c, MONDAY, s)]),
            );
            self.cp
                .add_reified_implication(mon_to_fri, saturday, Cmp::Le, 0);
            self.cp
                .add_reified_implication(mon_to_fri.negated(), monday, Cmp::Le, 0);
        }
    }

    /// Designated lab courses stay inside the morning window
    fn post_morning_only(&mut self, config: &TimetableConfig) {
        for t in 0..self.teachers.len() {
            for c in 0..self.courses[t].len() {
                if !self.plan.morning_only.contains(self.courses[t][c]) {
                    continue;
                }
                let outside = LinExpr::sum(
                    iproduct!(0..DAYS, 0..SLOTS)
                        .filter(|(_, s)| !config.morning_slots.contains(s))
                        .map(|(d, s)| self.x[&(t, c, d, s)]),
                );
                if !outside.is_empty() {
                    self.cp.add_linear(outside, Cmp::Eq, 0);
                }
            }
        }
    }

    /// All open electives share one time-cell pattern
    fn post_open_electives(&mut self, mode: OpenElectiveMode<'_>) {
        let mut oe_units: Vec<(usize, usize)> = Vec::new();
        for t in 0..self.teachers.len() {
            for c in 0..self.courses[t].len() {
                if self.plan.is_open_elective(self.courses[t][c]) {
                    oe_units.push((t, c));
                }
            }
        }

        match mode {
            OpenElectiveMode::Coupled => {
                if oe_units.len() < 2 {
                    return;
                }
                for (d, s) in iproduct!(0..DAYS, 0..SLOTS) {
                    let cell = self.cp.add_bool_var();
                    self.oe_cells.insert((d, s), cell);
                }
                for &(t, c) in &oe_units {
                    for (d, s) in iproduct!(0..DAYS, 0..SLOTS) {
                        let expr =
                            LinExpr::from(self.x[&(t, c, d, s)]).plus(-1, self.oe_cells[&(d, s)]);
                        self.cp.add_linear(expr, Cmp::Eq, 0);
                    }
                }
            }
            OpenElectiveMode::Fixed(pattern) => {
                for &(t, c) in &oe_units {
                    for (d, s) in iproduct!(0..DAYS, 0..SLOTS) {
                        let pinned = i64::from(pattern.contains(&(d, s)));
                        self.cp
                            .add_linear(self.x[&(t, c, d, s)].into(), Cmp::Eq, pinned);
                    }
                }
            }
        }
    }

    /// An Evening day is never followed by a Morning day
    fn post_no_morning_after_evening(&mut self) {
        for t in 0..self.teachers.len() {
            for d in 0..DAYS - 1 {
                let expr = LinExpr::sum([self.is_type[&(t, d, 2)], self.is_type[&(t, d + 1, 0)]]);
                self.cp.add_linear(expr, Cmp::Le, 1);
            }
        }
    }

    /// The open-elective cell pattern chosen by a coupled solve
    pub fn oe_pattern(&self, solution: &CpSolution) -> BTreeSet<(usize, usize)> {
        self.oe_cells
            .iter()
            .filter(|(_, &var)| solution.is_true(var))
            .map(|(&cell, _)| cell)
            .collect()
    }

    /// True when the cell belongs to a practical session of the course
    pub fn is_practical_cell(
        &self,
        solution: &CpSolution,
        t: usize,
        c: usize,
        d: usize,
        s: usize,
    ) -> bool {
        let covered_by = |slot: usize| -> bool {
            if let Some(&start) = self.starts.get(&(t, c, d, slot)) {
                if solution.is_true(start) {
                    return true;
                }
            }
            let code = self.courses[t][c];
            for batch in 0..2usize {
                if let Some(&start) = self.split_starts.get(&(code, batch, t, d, slot)) {
                    if solution.is_true(start) {
                        return true;
                    }
                }
            }
            false
        };

        covered_by(s) || (s > 0 && covered_by(s - 1))
    }
}
