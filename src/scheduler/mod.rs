mod batching;
mod model;
mod plan;
mod render;
mod solver;

pub use batching::*;
pub use model::*;
pub use plan::*;
pub use render::*;
pub use solver::*;

use crate::error::Result;
use crate::types::{Catalogue, TimetableConfig, TimetableMetadata, TimetableSet};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Main entry point for timetable generation
pub fn generate_timetables(
    catalogue: &Catalogue,
    config: &TimetableConfig,
    quiet: bool,
) -> Result<TimetableSet> {
    let start_time = Instant::now();

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb
    };

    progress.set_message("Deriving teaching plan...");
    let plan = derive_plan(catalogue, config)?;

    let outcome = solve_in_batches(&plan, config, &progress);

    let scheduled = outcome.tables.len();
    let failed: usize = outcome.failures.iter().map(|f| f.teachers.len()).sum();
    if failed == 0 {
        progress.finish_with_message(format!("Scheduled {} teachers", scheduled));
    } else {
        progress.finish_with_message(format!(
            "Scheduled {} teachers, {} left unscheduled",
            scheduled, failed
        ));
    }

    Ok(TimetableSet {
        tables: outcome.tables,
        failures: outcome.failures,
        metadata: TimetableMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            solve_time_ms: start_time.elapsed().as_millis() as u64,
            batches: outcome.batches,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CourseCode, CourseOffering, FailureReason, SlotType, TeacherName, MONDAY, SATURDAY,
    };

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

    fn solve(offerings: Vec<CourseOffering>, config: &TimetableConfig) -> TimetableSet {
        let catalogue = Catalogue::new(offerings);
        generate_timetables(&catalogue, config, true).unwrap()
    }

    fn table<'a>(set: &'a TimetableSet, teacher: &str) -> &'a crate::types::TeacherTimetable {
        &set.tables[&TeacherName(teacher.to_string())]
    }

    #[test]
    fn test_single_lecture_course() {
        let config = TimetableConfig::relaxed_rotation();
        let set = solve(vec![offering("T1", "K1", 2, 0, 0)], &config);

        assert!(set.is_complete());
        let t1 = table(&set, "T1");
        assert_eq!(t1.total_load(), 2);

        // one of Monday and Saturday stays empty
        assert!(t1.days[MONDAY].load() == 0 || t1.days[SATURDAY].load() == 0);

        // no run of three occupied slots
        for row in &t1.days {
            for w in 0..crate::types::SLOTS - 2 {
                let run = (w..w + 3).filter(|&s| row.cells[s].is_some()).count();
                assert!(run <= 2);
            }
        }
    }

    #[test]
    fn test_practical_block_is_contiguous() {
        let config = TimetableConfig::relaxed_rotation();
        let set = solve(vec![offering("T1", "K1", 1, 0, 2)], &config);

        let t1 = table(&set, "T1");
        assert_eq!(t1.total_load(), 3);

        let practical: Vec<(usize, usize)> = t1
            .occupied_cells()
            .filter(|(_, _, c)| c.practical)
            .map(|(d, s, _)| (d, s))
            .collect();
        assert_eq!(practical.len(), 2);
        assert_eq!(practical[0].0, practical[1].0, "block stays within one day");
        assert_eq!(practical[0].1 + 1, practical[1].1, "block is contiguous");
    }

    #[test]
    fn test_morning_only_lab_stays_in_morning() {
        let config = TimetableConfig::relaxed_rotation();
        let set = solve(vec![offering("T1", "CE23331", 0, 0, 2)], &config);

        let t1 = table(&set, "T1");
        let cells: Vec<(usize, usize)> = t1.cells_for(&CourseCode("CE23331".to_string()));
        assert_eq!(cells.len(), 2);
        for (_, s) in &cells {
            assert!(config.morning_slots.contains(s));
        }
        // a 2-slot morning block can only start at slot 0 or 1
        let first = cells.iter().map(|(_, s)| *s).min().unwrap();
        assert!(first <= 1);
    }

    #[test]
    fn test_full_week_under_default_rules() {
        let config = TimetableConfig::default();
        let set = solve(
            vec![
                offering("T1", "K1", 4, 0, 0),
                offering("T1", "K2", 3, 0, 0),
                offering("T1", "K3", 3, 0, 0),
                offering("T1", "K4", 3, 0, 0),
                offering("T1", "K5", 2, 0, 0),
            ],
            &config,
        );

        assert!(set.is_complete(), "failures: {:?}", set.failures);
        let t1 = table(&set, "T1");
        assert_eq!(t1.total_load(), 15);

        // daily cap and off day
        assert!(t1.days.iter().all(|row| row.load() <= 5));
        assert!(t1.days[MONDAY].load() == 0 || t1.days[SATURDAY].load() == 0);

        // every slot type occurs on one or two days
        for slot_type in SlotType::all() {
            let days = t1
                .days
                .iter()
                .filter(|row| row.slot_type == slot_type)
                .count();
            assert!(
                (1..=2).contains(&days),
                "{:?} occurs on {} days",
                slot_type,
                days
            );
        }

        // no Morning day right after an Evening day
        for d in 0..t1.days.len() - 1 {
            if t1.days[d].slot_type == SlotType::B {
                assert_ne!(t1.days[d + 1].slot_type, SlotType::A);
            }
        }
    }

    #[test]
    fn test_open_electives_share_cells() {
        let config = TimetableConfig::relaxed_rotation();
        let set = solve(
            vec![
                offering("T1", "OpenElective-ML", 1, 0, 0),
                offering("T2", "OpenElective-IoT", 1, 0, 0),
            ],
            &config,
        );

        assert!(set.is_complete());
        let ml = table(&set, "T1").cells_for(&CourseCode("OpenElective-ML".to_string()));
        let iot = table(&set, "T2").cells_for(&CourseCode("OpenElective-IoT".to_string()));
        assert_eq!(ml.len(), 1);
        assert_eq!(ml, iot, "open electives must land on the same cells");
    }

    #[test]
    fn test_overloaded_week_is_infeasible() {
        // 26 weekly hours cannot fit into 5 working days of 5 hours
        let config = TimetableConfig::default();
        let set = solve(
            vec![
                offering("T1", "K1", 5, 0, 0),
                offering("T1", "K2", 5, 0, 0),
                offering("T1", "K3", 4, 0, 0),
                offering("T1", "K4", 4, 0, 0),
                offering("T1", "K5", 4, 0, 0),
                offering("T1", "K6", 4, 0, 0),
            ],
            &config,
        );

        assert!(!set.is_complete());
        assert_eq!(set.failures.len(), 1);
        assert_eq!(set.failures[0].reason, FailureReason::Infeasible);
        assert!(set.tables.is_empty());
    }

    #[test]
    fn test_split_lab_uses_two_hosts_at_distinct_times() {
        let config = TimetableConfig::relaxed_rotation();
        let mut first = offering("T1", "CS9", 0, 0, 2);
        first.registration = Some(60);
        let mut second = offering("T2", "CS9", 0, 0, 2);
        second.registration = Some(60);

        let set = solve(
            vec![
                first,
                second,
                offering("T1", "K1", 2, 0, 0),
                offering("T2", "K2", 2, 0, 0),
            ],
            &config,
        );

        assert!(set.is_complete(), "failures: {:?}", set.failures);
        let code = CourseCode("CS9".to_string());
        let host1 = table(&set, "T1").cells_for(&code);
        let host2 = table(&set, "T2").cells_for(&code);

        // each host delivers one 2-slot session
        assert_eq!(host1.len(), 2);
        assert_eq!(host2.len(), 2);

        // the two batches occupy disjoint time cells
        for cell in &host1 {
            assert!(!host2.contains(cell));
        }
    }

    #[test]
    fn test_batched_solve_covers_all_teachers() {
        let config = TimetableConfig {
            batch_size: 1,
            ..TimetableConfig::relaxed_rotation()
        };
        let set = solve(
            vec![
                offering("T1", "K1", 3, 0, 0),
                offering("T2", "K2", 3, 0, 0),
                offering("T3", "K3", 3, 0, 0),
            ],
            &config,
        );

        assert!(set.is_complete());
        assert_eq!(set.tables.len(), 3);
        assert_eq!(set.metadata.batches, 3);
    }

    #[test]
    fn test_open_elective_prepass_feeds_batches() {
        let config = TimetableConfig {
            batch_size: 1,
            ..TimetableConfig::relaxed_rotation()
        };
        let set = solve(
            vec![
                offering("T1", "OpenElective-ML", 1, 0, 0),
                offering("T1", "K1", 2, 0, 0),
                offering("T2", "OpenElective-IoT", 1, 0, 0),
                offering("T3", "K3", 2, 0, 0),
            ],
            &config,
        );

        assert!(set.is_complete(), "failures: {:?}", set.failures);
        let ml = table(&set, "T1").cells_for(&CourseCode("OpenElective-ML".to_string()));
        let iot = table(&set, "T2").cells_for(&CourseCode("OpenElective-IoT".to_string()));
        assert_eq!(ml, iot);
    }

    #[test]
    fn test_one_course_per_cell_and_workloads() {
        let config = TimetableConfig::relaxed_rotation();
        let offerings = vec![
            offering("T1", "K1", 3, 1, 0),
            offering("T1", "K2", 2, 0, 2),
            offering("T1", "K3", 1, 1, 0),
        ];
        let catalogue = Catalogue::new(offerings.clone());
        let set = solve(offerings, &config);

        let t1 = table(&set, "T1");
        for o in &catalogue.offerings {
            assert_eq!(
                t1.cells_for(&o.code).len() as u32,
                o.weekly_slots(),
                "course {} must fill exactly its weekly slots",
                o.code
            );
        }
    }
}
