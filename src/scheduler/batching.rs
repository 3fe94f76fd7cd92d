//! Batch orchestration: lexicographic teacher chunks, the open-elective
//! pre-pass, and failure isolation between batches.

use crate::scheduler::model::{OpenElectiveMode, TimetableModel};
use crate::scheduler::plan::DerivedPlan;
use crate::scheduler::render::render_tables;
use crate::scheduler::solver::{SolveStatus, SolveOutcome};
use crate::types::{
    BatchFailure, FailureReason, TeacherName, TeacherTimetable, TimetableConfig,
};
use indicatif::ProgressBar;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Tables and failures accumulated across all batches
pub struct BatchOutcome {
    pub tables: BTreeMap<TeacherName, TeacherTimetable>,
    pub failures: Vec<BatchFailure>,
    pub batches: usize,
}

/// Solve the whole plan, batching when the teacher count exceeds the
/// configured batch size.
pub fn solve_in_batches(
    plan: &DerivedPlan,
    config: &TimetableConfig,
    progress: &ProgressBar,
) -> BatchOutcome {
    let teachers = plan.teachers();
    let mut outcome = BatchOutcome {
        tables: BTreeMap::new(),
        failures: Vec::new(),
        batches: 0,
    };

    if teachers.len() <= config.batch_size {
        progress.set_message(format!("Solving {} teachers...", teachers.len()));
        outcome.batches = 1;
        run_batch(
            plan,
            config,
            1,
            teachers,
            OpenElectiveMode::Coupled,
            &mut outcome,
        );
        return outcome;
    }

    // The only cross-teacher constraint is open-elective coupling, so fix
    // its cell pattern globally before the independent batch solves.
    let mut oe_pattern: Option<BTreeSet<(usize, usize)>> = None;
    let mut excluded: BTreeSet<&TeacherName> = BTreeSet::new();

    if plan.open_elective_unit_count() > 1 {
        let oe_teachers = plan.open_elective_teachers();
        progress.set_message(format!(
            "Fixing open-elective cells across {} teachers...",
            oe_teachers.len()
        ));
        let model = TimetableModel::build(
            plan,
            config,
            oe_teachers.clone(),
            OpenElectiveMode::Coupled,
        );
        let solved = model.cp.solve(Duration::from_secs(config.solver_time_limit_sec));
        match classify(&solved, config) {
            Ok(solution) => {
                let pattern = model.oe_pattern(solution);
                info!("open-elective pre-pass fixed {} cells", pattern.len());
                oe_pattern = Some(pattern);
            }
            Err(reason) => {
                warn!("open-elective pre-pass failed: {}", reason);
                excluded.extend(oe_teachers.iter().copied());
                outcome.failures.push(BatchFailure {
                    batch: 0,
                    teachers: oe_teachers.into_iter().cloned().collect(),
                    reason,
                });
            }
        }
    }

    let remaining: Vec<&TeacherName> = teachers
        .into_iter()
        .filter(|t| !excluded.contains(*t))
        .collect();

    let chunks: Vec<Vec<&TeacherName>> = remaining
        .chunks(config.batch_size)
        .map(|c| c.to_vec())
        .collect();
    outcome.batches = chunks.len();

    for (idx, chunk) in chunks.into_iter().enumerate() {
        let batch_no = idx + 1;
        progress.set_message(format!(
            "Solving batch {}/{} ({} teachers)...",
            batch_no,
            outcome.batches,
            chunk.len()
        ));

        let mode = match &oe_pattern {
            Some(pattern) => OpenElectiveMode::Fixed(pattern),
            None => OpenElectiveMode::Coupled,
        };
        run_batch(plan, config, batch_no, chunk, mode, &mut outcome);
    }

    outcome
}

fn run_batch<'a>(
    plan: &'a DerivedPlan,
    config: &TimetableConfig,
    batch_no: usize,
    teachers: Vec<&'a TeacherName>,
    mode: OpenElectiveMode<'_>,
    outcome: &mut BatchOutcome,
) {
    let names: Vec<TeacherName> = teachers.iter().map(|t| (*t).clone()).collect();
    let model = TimetableModel::build(plan, config, teachers, mode);
    info!(
        "batch {}: {} teachers, {} vars",
        batch_no,
        names.len(),
        model.cp.num_vars()
    );

    let solved = model.cp.solve(Duration::from_secs(config.solver_time_limit_sec));
    match classify(&solved, config) {
        Ok(solution) => {
            outcome.tables.extend(render_tables(&model, solution));
        }
        Err(reason) => {
            warn!("batch {} failed: {}", batch_no, reason);
            outcome.failures.push(BatchFailure {
                batch: batch_no,
                teachers: names,
                reason,
            });
        }
    }
}

/// Map a solve outcome to either its solution or a failure reason.
/// An Unknown status past the wall-clock budget counts as a timeout.
fn classify<'s>(
    outcome: &'s SolveOutcome,
    config: &TimetableConfig,
) -> Result<&'s crate::scheduler::solver::CpSolution, FailureReason> {
    match outcome.status {
        SolveStatus::Optimal | SolveStatus::Feasible => outcome
            .solution
            .as_ref()
            .ok_or_else(|| FailureReason::Internal {
                message: "solver reported success without a solution".to_string(),
            }),
        SolveStatus::Infeasible => Err(FailureReason::Infeasible),
        SolveStatus::Unknown => {
            if outcome.wall_time >= Duration::from_secs(config.solver_time_limit_sec) {
                Err(FailureReason::Timeout {
                    seconds: config.solver_time_limit_sec,
                })
            } else {
                Err(FailureReason::Internal {
                    message: outcome
                        .message
                        .clone()
                        .unwrap_or_else(|| "unexpected solver status".to_string()),
                })
            }
        }
    }
}
