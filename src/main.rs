use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use faculty_timetabler::error::TimetableError;
use faculty_timetabler::parser::{load_catalogue, load_config_or_default, validate_catalogue};
use faculty_timetabler::reporter::{
    generate_json_summary, generate_reports, generate_teacher_view, print_summary, OutputFormat,
};
use faculty_timetabler::scheduler::{derive_plan, generate_timetables};
use faculty_timetabler::types::{TeacherName, TimetableSet};
use faculty_timetabler::validator::validate_timetables;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "faculty-timetabler")]
#[command(about = "Constraint-based faculty timetable generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run demo with sample data
    Demo,

    /// Generate timetables from a course catalogue
    Schedule {
        /// Path to the catalogue CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Optional TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for timetable files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, markdown, text, csv, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Suppress progress output, print JSON summary only
        #[arg(short, long)]
        quiet: bool,
    },

    /// Validate an existing timetable set
    Validate {
        /// Path to timetables.json
        #[arg(short, long)]
        schedule: PathBuf,

        /// Path to the catalogue CSV used to generate it
        #[arg(short, long)]
        data: PathBuf,

        /// Optional TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print a single teacher's grid
        #[arg(long)]
        teacher: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Schedule {
            data,
            config,
            output,
            format,
            quiet,
        } => run_schedule(&data, config.as_deref(), &output, &format, quiet),
        Commands::Validate {
            schedule,
            data,
            config,
            teacher,
        } => run_validate(&schedule, &data, config.as_deref(), teacher),
    }
}

fn run_demo() -> Result<()> {
    println!("{}", "Faculty Timetabler Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let demo_path = PathBuf::from("data/demo");
    let catalogue_path = demo_path.join("catalogue.csv");

    if !catalogue_path.exists() {
        println!(
            "{}",
            "Demo data not found. Creating sample catalogue...".yellow()
        );
        create_demo_data(&demo_path)?;
    }

    run_schedule(
        &catalogue_path,
        None,
        &PathBuf::from("output"),
        "all",
        false,
    )
}

fn run_schedule(
    data: &Path,
    config_path: Option<&Path>,
    output: &Path,
    format: &str,
    quiet: bool,
) -> Result<()> {
    let catalogue = load_catalogue(data).context("Failed to load catalogue")?;
    let config = load_config_or_default(
        config_path.unwrap_or_else(|| Path::new("config.toml")),
    );

    let validation = validate_catalogue(&catalogue, &config)?;
    if !quiet {
        for warning in &validation.warnings {
            println!("{} {}", "Warning:".yellow(), warning);
        }
        println!(
            "Loaded {} offerings across {} teachers",
            catalogue.offerings.len(),
            catalogue.teachers.len()
        );
        println!("\nGenerating timetables...\n");
    }

    let set = generate_timetables(&catalogue, &config, quiet)?;
    let plan = derive_plan(&catalogue, &config)?;
    let report = validate_timetables(&set, &plan, &config);

    generate_reports(&set, &report, output, &parse_formats(format))?;

    if quiet {
        println!("{}", generate_json_summary(&set)?);
    } else {
        print_summary(&set, &report);
        println!(
            "Reports written to: {}",
            output.display().to_string().green()
        );
    }

    if !set.is_complete() {
        return Err(TimetableError::IncompleteSchedule {
            unscheduled: set.unscheduled_teachers().len(),
        }
        .into());
    }

    Ok(())
}

fn run_validate(
    schedule_path: &Path,
    data: &Path,
    config_path: Option<&Path>,
    teacher: Option<String>,
) -> Result<()> {
    let catalogue = load_catalogue(data)?;
    let config = load_config_or_default(
        config_path.unwrap_or_else(|| Path::new("config.toml")),
    );

    let schedule_json = std::fs::read_to_string(schedule_path)?;
    let set: TimetableSet = serde_json::from_str(&schedule_json)?;

    if let Some(name) = teacher {
        match generate_teacher_view(&set, &TeacherName(name)) {
            Some(view) => println!("{}", view),
            None => println!("Teacher not found"),
        }
        return Ok(());
    }

    let plan = derive_plan(&catalogue, &config)?;
    let report = validate_timetables(&set, &plan, &config);

    if report.is_valid {
        println!("{}", "✓ Timetables are valid".green().bold());
    } else {
        println!("{}", "✗ Timetables have violations".red().bold());
        for v in &report.violations {
            println!("  - {}: {}", v.constraint.red(), v.message);
        }
    }

    println!();
    println!(
        "  Teachers:    {} scheduled, {} unscheduled",
        report.statistics.teachers_scheduled, report.statistics.teachers_unscheduled
    );
    println!("  Assignments: {}", report.statistics.total_assignments);

    if !report.is_valid {
        anyhow::bail!("validation failed with {} violations", report.violations.len());
    }

    Ok(())
}

fn parse_formats(format: &str) -> Vec<OutputFormat> {
    if format == "all" {
        return vec![
            OutputFormat::Json,
            OutputFormat::Markdown,
            OutputFormat::Text,
            OutputFormat::Csv,
        ];
    }

    format
        .split(',')
        .filter_map(|f| match f.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "text" | "txt" => Some(OutputFormat::Text),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        })
        .collect()
}

fn create_demo_data(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;

    let catalogue = "\
course_code,Faculty,lecture_hours,tutorial_hours,practical_hours,credits
CS23401,ALICE,3,1,0,4
CS23402,ALICE,2,0,2,3
OpenElective-ML,ALICE,2,0,0,2
CS23403,BOB,3,1,0,4
OpenElective-IoT,BOB,2,0,0,2
CE23331,BOB,0,0,2,1
CS23404,CARA,3,0,2,4
CS23405,CARA,3,1,0,3
";
    std::fs::write(path.join("catalogue.csv"), catalogue)?;

    println!("{}", "Demo catalogue created successfully!".green());
    Ok(())
}
