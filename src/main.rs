use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use readyrs::baseline::BaselineRegistry;
use readyrs::composite::CompositeReadiness;
use readyrs::config::ReadinessConfig;
use readyrs::error::{ErrorSeverity, ReadinessError};
use readyrs::import::{self, ImportManager};
use readyrs::logging::init_logging;
use readyrs::models::{Methodology, SampleLog};
use readyrs::modification::{ModificationLevel, WorkoutModification};
use readyrs::pipeline::{DailyReadiness, ReadinessPipeline};
use readyrs::trends::{HistoryEntry, Severity, TrendWarningReport};
use readyrs::ReadinessTier;

/// ReadyRS - Athlete Readiness CLI
///
/// Scores morning HRV, resting heart rate and wellness answers against the
/// athlete's baselines and adjusts the day's planned workouts.
#[derive(Parser)]
#[command(name = "readyrs")]
#[command(author = "ReadyRS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Athlete readiness and workout modification CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute HRV and resting HR baselines from daily samples
    Baseline {
        /// Samples file (CSV or JSON)
        #[arg(short, long)]
        samples: PathBuf,

        #[arg(short, long)]
        athlete: String,

        /// Last day included in the baseline window (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Assess readiness for one morning
    Assess {
        #[arg(short, long)]
        samples: PathBuf,

        #[arg(short, long)]
        athlete: String,

        /// Day to assess (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Acute:chronic workload ratio
        #[arg(long, default_value = "1.0")]
        acwr: f64,
    },

    /// Assess readiness and adjust the day's planned workouts
    Plan {
        #[arg(short, long)]
        samples: PathBuf,

        /// Planned workouts (JSON array)
        #[arg(short, long)]
        workouts: PathBuf,

        #[arg(short, long)]
        athlete: String,

        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Training methodology (generic, norwegian_double_threshold, polarized)
        #[arg(short, long, value_parser = parse_methodology)]
        methodology: Option<Methodology>,

        #[arg(long, default_value = "1.0")]
        acwr: f64,
    },

    /// Build readiness history over a date range
    History {
        #[arg(short, long)]
        samples: PathBuf,

        #[arg(short, long)]
        athlete: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Planned workouts (JSON array), decided day by day
        #[arg(short, long)]
        workouts: Option<PathBuf>,

        /// Training methodology (generic, norwegian_double_threshold, polarized)
        #[arg(short, long, value_parser = parse_methodology)]
        methodology: Option<Methodology>,

        #[arg(long, default_value = "1.0")]
        acwr: f64,

        /// Write the history as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan readiness history for warning patterns
    Trends {
        /// History file (JSON array)
        #[arg(long)]
        history: PathBuf,
    },

    /// Configure application settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file location
    Path,
}

fn parse_methodology(value: &str) -> std::result::Result<Methodology, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| format!("unknown methodology '{}'", value))
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<ReadinessError>() {
            Some(readiness_err) => {
                let marker = match readiness_err.severity() {
                    ErrorSeverity::Info => "ℹ".blue().bold(),
                    ErrorSeverity::Warning => "⚠".yellow().bold(),
                    ErrorSeverity::Error => "✗".red().bold(),
                };
                eprintln!("{} {}", marker, readiness_err.user_message());
            }
            None => eprintln!("{} {:#}", "✗".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ReadinessConfig::load_or_default(cli.config.as_deref())?;
    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    let pipeline = ReadinessPipeline::new(&config);
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Baseline { samples, athlete, date } => {
            let log = load_samples(&samples)?;
            let date = date.unwrap_or(today);
            let baselines = pipeline.compute_baselines(&log, &athlete, date, start_of_day(date))?;

            if cli.json {
                return print_json(&baselines);
            }

            println!("{}", format!("Baselines for {} through {}", athlete, date).blue().bold());
            let rows: Vec<BaselineRow> = baselines
                .iter()
                .map(|b| BaselineRow {
                    metric: b.metric.to_string(),
                    mean: format!("{:.1} {}", b.mean, b.metric.unit()),
                    std_dev: format!("{:.1}", b.std_dev),
                    cv: format!("{:.1}%", b.cv_percent),
                    normal: format!("{:.1}", b.bands.normal),
                    yellow: format!("{:.1}", b.bands.yellow),
                    red: format!("{:.1}", b.bands.red),
                    days: format!("{} ({} rejected)", b.sample_count, b.rejected_count),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            for warning in baselines.iter().flat_map(|b| &b.warnings) {
                println!("  {} {}", "⚠".yellow(), warning);
            }
        }

        Commands::Assess {
            samples,
            athlete,
            date,
            acwr,
        } => {
            let log = load_samples(&samples)?;
            let readiness = assess(&pipeline, &log, &athlete, date.unwrap_or(today), acwr)?;

            if cli.json {
                return print_json(&readiness);
            }
            print_readiness(&readiness);
        }

        Commands::Plan {
            samples,
            workouts,
            athlete,
            date,
            methodology,
            acwr,
        } => {
            let log = load_samples(&samples)?;
            let planned = import::load_workouts(&workouts)?;
            let readiness = assess(&pipeline, &log, &athlete, date.unwrap_or(today), acwr)?;
            let methodology = methodology.unwrap_or(config.default_methodology);
            let decisions = pipeline.plan_day(&readiness, &planned, methodology)?;

            if cli.json {
                #[derive(Serialize)]
                struct PlanOutput<'a> {
                    readiness: &'a DailyReadiness,
                    modifications: &'a [WorkoutModification],
                }
                return print_json(&PlanOutput {
                    readiness: &readiness,
                    modifications: &decisions,
                });
            }

            print_readiness(&readiness);
            println!();
            if decisions.is_empty() {
                println!("{}", format!("No workouts planned for {}", readiness.date).dimmed());
            }
            for decision in &decisions {
                print_modification(decision);
            }
        }

        Commands::History {
            samples,
            athlete,
            from,
            to,
            workouts,
            methodology,
            acwr,
            output,
        } => {
            if from > to {
                anyhow::bail!("--from {} is after --to {}", from, to);
            }
            let log = load_samples(&samples)?;
            let planned = match workouts {
                Some(path) => import::load_workouts(&path)?,
                None => Vec::new(),
            };
            let methodology = methodology.unwrap_or(config.default_methodology);

            let replay = pipeline.replay_history(&log, &athlete, from, to, &planned, methodology, acwr);
            for skipped in &replay.skipped {
                eprintln!("  {} {}: {}", "skip".yellow(), skipped.date, skipped.reason);
            }
            let history = replay.entries;

            match output {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_string_pretty(&history)?)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!(
                        "{}",
                        format!("✓ {} days written to {}", history.len(), path.display()).green()
                    );
                }
                None => print_json(&history)?,
            }
        }

        Commands::Trends { history } => {
            let entries: Vec<HistoryEntry> = import::load_history(&history)?;
            let report = pipeline.analyze_trends(&entries)?;

            if cli.json {
                return print_json(&report);
            }
            print_trends(&report);
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Init { force } => {
                let path = cli.config.unwrap_or_else(ReadinessConfig::default_config_path);
                if path.exists() && !force {
                    anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
                }
                ReadinessConfig::default().save_to_file(&path)?;
                println!("{}", format!("✓ Configuration written to {}", path.display()).green());
            }
            ConfigAction::Path => {
                println!("{}", ReadinessConfig::default_config_path().display());
            }
        },
    }

    Ok(())
}

fn load_samples(path: &Path) -> Result<SampleLog> {
    Ok(ImportManager::new().import_log(&[path])?)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Baselines computed from the days before `date`, then the day's assessment
fn assess(
    pipeline: &ReadinessPipeline,
    log: &SampleLog,
    athlete: &str,
    date: NaiveDate,
    acwr: f64,
) -> Result<DailyReadiness> {
    let mut registry = BaselineRegistry::new();
    pipeline.refresh_baselines(&mut registry, log, athlete, start_of_day(date - Duration::days(1)))?;
    Ok(pipeline.assess_day(log, &registry, athlete, date, acwr)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Tabled)]
struct BaselineRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "SD")]
    std_dev: String,
    #[tabled(rename = "CV")]
    cv: String,
    #[tabled(rename = "Normal")]
    normal: String,
    #[tabled(rename = "Yellow")]
    yellow: String,
    #[tabled(rename = "Red")]
    red: String,
    #[tabled(rename = "Days")]
    days: String,
}

#[derive(Tabled)]
struct FactorRow {
    #[tabled(rename = "Factor")]
    factor: String,
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Flag")]
    flag: String,
}

fn tier_colored(tier: ReadinessTier) -> ColoredString {
    let label = tier.label();
    match tier {
        ReadinessTier::Excellent | ReadinessTier::Good => label.green().bold(),
        ReadinessTier::Moderate => label.yellow().bold(),
        ReadinessTier::Suboptimal => label.truecolor(255, 140, 0).bold(),
        ReadinessTier::Poor => label.red(),
        ReadinessTier::Critical => label.red().bold(),
    }
}

fn print_readiness(readiness: &DailyReadiness) {
    let composite: &CompositeReadiness = &readiness.composite;
    println!(
        "{} {} {}",
        format!("Readiness for {} on {}:", readiness.athlete_id, readiness.date).blue().bold(),
        format!("{:.2}/10", composite.score).bold(),
        tier_colored(composite.tier)
    );
    println!(
        "  HRV {:.1} ms ({:.0}% of baseline), {}, trend {:?}",
        readiness.hrv.value,
        readiness.hrv.percent_of_baseline,
        readiness.hrv.status_label(),
        readiness.hrv.trend
    );
    println!(
        "  RHR {:.0} bpm ({:+.1} bpm), {}",
        readiness.resting_hr.value,
        readiness.resting_hr.deviation,
        readiness.resting_hr.status_label()
    );
    println!(
        "  Wellness {:.2} ({:?}): {}",
        readiness.wellness.composite, readiness.wellness.tier, readiness.wellness.recommendation
    );

    let rows: Vec<FactorRow> = composite
        .factors
        .iter()
        .map(|f| FactorRow {
            factor: f.factor.to_string(),
            input: format!("{:.2}", f.input),
            score: format!("{:.1}", f.score),
            weight: format!("{:.1}", f.weight),
            flag: f.flag.map(|l| l.to_string()).unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    for flag in &composite.red_flags {
        println!("  {} {}", "●".red(), flag.message);
    }
    for flag in &composite.yellow_flags {
        println!("  {} {}", "●".yellow(), flag.message);
    }
    if composite.is_low_confidence() {
        println!("  {}", "Low confidence: data quality warnings present".yellow());
        for warning in &composite.warnings {
            println!("    {} {}", "⚠".yellow(), warning);
        }
    }
    println!("  {}", format!("Tier decided by: {}", composite.decided_by).dimmed());
}

fn print_modification(decision: &WorkoutModification) {
    let level = match decision.level {
        ModificationLevel::Proceed => decision.level.to_string().green().bold(),
        ModificationLevel::Minor => decision.level.to_string().yellow().bold(),
        ModificationLevel::Moderate | ModificationLevel::Major => {
            decision.level.to_string().truecolor(255, 140, 0).bold()
        }
        ModificationLevel::Cancel => decision.level.to_string().red().bold(),
    };
    println!(
        "{} {} ({}, {} min): {}",
        "Workout".bold(),
        decision.workout_id,
        decision.original.workout_type,
        decision.original.duration_minutes,
        level
    );
    if let Some(modified) = &decision.modified {
        if !decision.is_unchanged() {
            let pace = modified
                .target_pace
                .map(|p| format!(" @ {} min/km", p))
                .unwrap_or_default();
            println!(
                "  → {} {} min{}",
                modified.workout_type, modified.duration_minutes, pace
            );
        }
    }
    for adjustment in &decision.adjustments {
        println!("  • {}", adjustment);
    }
    println!("  {}", decision.reasoning);
    if let Some(rule) = &decision.override_rule {
        println!("  {}", format!("Methodology rule: {}", rule).dimmed());
    }
    if let Some(reschedule) = &decision.reschedule {
        println!(
            "  {} wait at least {}h (not before {}), resume when readiness ≥ {:.1}",
            "Reschedule:".cyan(),
            reschedule.min_wait_hours,
            reschedule.earliest_date,
            reschedule.resume_when_composite_at_least
        );
    }
    if let Some(suggestion) = &decision.suggestion {
        println!("  {} {}", "Tip:".green(), suggestion);
    }
}

fn print_trends(report: &TrendWarningReport) {
    println!(
        "{}",
        format!(
            "Trend analysis {} to {} ({} days)",
            report.window_start, report.window_end, report.days_analyzed
        )
        .blue()
        .bold()
    );

    if report.warnings.is_empty() {
        println!("{}", "✓ No warning patterns detected".green());
        return;
    }

    for warning in &report.warnings {
        let severity = match warning.severity {
            Severity::Low => warning.severity.to_string().normal(),
            Severity::Medium => warning.severity.to_string().yellow(),
            Severity::High => warning.severity.to_string().truecolor(255, 140, 0),
            Severity::Critical => warning.severity.to_string().red().bold(),
        };
        println!("[{}] {}", severity, warning.title.bold());
        println!("  {}", warning.recommended_action);
        let stats: Vec<String> = warning
            .statistics
            .iter()
            .map(|(name, value)| format!("{}={:.2}", name, value))
            .collect();
        println!("  {}", stats.join(", ").dimmed());
    }

    if report.requires_urgent_attention() {
        println!("{}", "Urgent attention required".red().bold());
    }
}
