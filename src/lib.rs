//! Faculty Timetabler - Constraint-based weekly timetable generator
//!
//! This library schedules every teaching hour of a faculty body into a
//! fixed six-day, seven-slot weekly grid using a CP model solved through
//! Integer Linear Programming.
//!
//! # Pipeline
//!
//! 1. **Ingest**: load and normalise the CSV course catalogue
//! 2. **Derive**: compute per-(teacher, course) slot counts and groupings
//! 3. **Model**: build decision variables and all hard constraints
//! 4. **Solve**: run HiGHS per teacher batch under a time budget
//! 5. **Render**: read the solution into per-teacher weekly grids
//!
//! # Example
//!
//! ```no_run
//! use faculty_timetabler::parser::{load_catalogue, load_config_or_default};
//! use faculty_timetabler::scheduler::{derive_plan, generate_timetables};
//! use faculty_timetabler::validator::validate_timetables;
//! use std::path::Path;
//!
//! let catalogue = load_catalogue(Path::new("./data/catalogue.csv")).unwrap();
//! let config = load_config_or_default(Path::new("./data/config.toml"));
//! let set = generate_timetables(&catalogue, &config, false).unwrap();
//! let plan = derive_plan(&catalogue, &config).unwrap();
//! let report = validate_timetables(&set, &plan, &config);
//! assert!(report.is_valid);
//! ```

pub mod error;
pub mod parser;
pub mod reporter;
pub mod scheduler;
pub mod types;
pub mod validator;

pub use error::{Result, TimetableError};
