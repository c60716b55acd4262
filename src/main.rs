use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod db;
mod models;
mod report;
mod simulator;
mod stats;

use models::AttendanceStatus;

#[derive(Parser)]
#[command(name = "attendance-tracker")]
#[command(about = "Personal class attendance tracker with compliance projections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data for the current user
    Seed,
    /// Add a subject with a weekly schedule
    AddSubject {
        #[arg(long)]
        name: String,
        /// Attendance target in percent; 75 when omitted
        #[arg(long)]
        target: Option<f64>,
        /// Comma-separated weekday names, e.g. Mon,Wed,Fri
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
    },
    /// Change a subject's name, target or schedule
    EditSubject {
        #[arg(long)]
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<String>>,
    },
    /// Delete a subject; its logs stop counting
    DeleteSubject {
        #[arg(long)]
        name: String,
    },
    /// List subjects
    Subjects,
    /// Toggle the primary attendance log for a subject on a date
    Mark {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        status: AttendanceStatus,
    },
    /// Log an extra class beyond the weekly schedule
    Extra {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        status: AttendanceStatus,
    },
    /// Remove one attendance log by id
    RemoveLog {
        #[arg(long)]
        id: Uuid,
    },
    /// Mark every subject scheduled on a date as cancelled or absent
    MarkDay {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        status: AttendanceStatus,
    },
    /// Show computed attendance statistics
    Stats {
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Project a hypothetical attend/bunk streak for one subject
    Simulate {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value_t = 0)]
        attend: u32,
        #[arg(long, default_value_t = 0)]
        bunk: u32,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Write a markdown report
    Report {
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export all logs as Date,Subject,Status CSV
    ExportCsv {
        #[arg(long, default_value = "attendance.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let user = require_user()?;
            db::seed(&pool, &user).await?;
            println!("Seed data inserted.");
        }
        Commands::AddSubject { name, target, days } => {
            let user = require_user()?;
            let target = validate_target(target)?;
            let days = models::normalize_days(&days)?;
            let created_on = Local::now().date_naive();
            db::insert_subject(&pool, &user, &name, target, &days, created_on).await?;
            println!("Added {name}.");
        }
        Commands::EditSubject {
            name,
            rename,
            target,
            days,
        } => {
            let user = require_user()?;
            let mut subject = db::fetch_subject_by_name(&pool, &user, &name).await?;
            if let Some(rename) = rename {
                subject.name = rename;
            }
            if let Some(target) = target {
                subject.target_percentage = validate_target(Some(target))?;
            }
            if let Some(days) = days {
                subject.days = models::normalize_days(&days)?;
            }
            db::update_subject(&pool, &subject).await?;
            println!("Updated {}.", subject.name);
        }
        Commands::DeleteSubject { name } => {
            let user = require_user()?;
            let subject = db::fetch_subject_by_name(&pool, &user, &name).await?;
            db::delete_subject(&pool, &user, subject.id).await?;
            println!("Deleted {}.", subject.name);
        }
        Commands::Subjects => {
            let Some(user) = current_user() else {
                println!("No user session; nothing to list.");
                return Ok(());
            };
            let subjects = db::fetch_subjects(&pool, &user).await?;
            if subjects.is_empty() {
                println!("No subjects yet.");
            }
            for subject in subjects {
                let schedule = if subject.days.is_empty() {
                    "unscheduled".to_string()
                } else {
                    subject.days.join("/")
                };
                println!(
                    "- {} ({schedule}), target {:.0}%, tracked since {}",
                    subject.name,
                    subject.effective_target(),
                    subject.created_on
                );
            }
        }
        Commands::Mark {
            subject,
            date,
            status,
        } => {
            let user = require_user()?;
            let sub = db::fetch_subject_by_name(&pool, &user, &subject).await?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            match db::toggle_log(&pool, &user, sub.id, date, status).await? {
                db::ToggleOutcome::Inserted => {
                    println!("Marked {} {} on {}.", sub.name, status, date);
                }
                db::ToggleOutcome::Updated => {
                    println!("Re-marked {} {} on {}.", sub.name, status, date);
                }
                db::ToggleOutcome::Removed => {
                    println!("Un-marked {} on {}.", sub.name, date);
                }
            }
        }
        Commands::Extra {
            subject,
            date,
            status,
        } => {
            let user = require_user()?;
            if !status.is_active() {
                anyhow::bail!("extra classes are logged present or absent, not cancelled");
            }
            let sub = db::fetch_subject_by_name(&pool, &user, &subject).await?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            db::insert_log(&pool, &user, sub.id, date, status).await?;
            println!("Extra class logged for {} on {}: {}.", sub.name, date, status);
        }
        Commands::RemoveLog { id } => {
            let user = require_user()?;
            if db::delete_log(&pool, &user, id).await? {
                println!("Log removed.");
            } else {
                println!("No such log.");
            }
        }
        Commands::MarkDay { date, status } => {
            let user = require_user()?;
            if status == AttendanceStatus::Present {
                anyhow::bail!("whole-day marking is for cancelled or absent days");
            }
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let touched = db::mark_whole_day(&pool, &user, date, status).await?;
            if touched == 0 {
                println!("No classes scheduled on {date}.");
            } else {
                println!("Marked {touched} scheduled classes {status} on {date}.");
            }
        }
        Commands::Stats { as_of, json } => {
            let Some(user) = current_user() else {
                println!("No user session; nothing to report.");
                return Ok(());
            };
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            let subjects = db::fetch_subjects(&pool, &user).await?;
            let logs = db::fetch_logs(&pool, &user).await?;
            let all_stats = stats::compute_stats(&subjects, &logs, as_of);

            if json {
                println!("{}", serde_json::to_string_pretty(&all_stats)?);
            } else if all_stats.is_empty() {
                println!("No subjects yet.");
            } else {
                for stat in &all_stats {
                    let recovery = match stat.classes_to_recover {
                        Some(0) => String::new(),
                        Some(needed) => format!(", attend next {needed} to recover"),
                        None => ", target unreachable".to_string(),
                    };
                    println!(
                        "- {}: {}/{} classes, {:.1}% (target {:.0}%) [{}]{}",
                        stat.subject_name,
                        stat.present,
                        stat.total_classes,
                        stat.percentage,
                        stat.target,
                        stat.status,
                        recovery
                    );
                }
            }
        }
        Commands::Simulate {
            subject,
            attend,
            bunk,
            as_of,
        } => {
            let Some(user) = current_user() else {
                println!("No user session; nothing to simulate.");
                return Ok(());
            };
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            let sub = db::fetch_subject_by_name(&pool, &user, &subject).await?;
            let logs = db::fetch_logs(&pool, &user).await?;
            let all_stats = stats::compute_stats(&[sub], &logs, as_of);
            let stat = &all_stats[0];
            let projection = simulator::project(stat, attend, bunk);
            println!(
                "{}: attend {attend}, bunk {bunk} -> {:.1}% ({}/{} classes), {}",
                stat.subject_name,
                projection.hypothetical_percentage,
                projection.hypothetical_present,
                projection.hypothetical_total,
                if projection.is_safe {
                    "safe"
                } else {
                    "below target"
                }
            );
        }
        Commands::Report { as_of, out } => {
            let Some(user) = current_user() else {
                println!("No user session; nothing to report.");
                return Ok(());
            };
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            let subjects = db::fetch_subjects(&pool, &user).await?;
            let logs = db::fetch_logs(&pool, &user).await?;
            let all_stats = stats::compute_stats(&subjects, &logs, as_of);
            let report = report::build_report(&user, as_of, &all_stats);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::ExportCsv { out } => {
            let Some(user) = current_user() else {
                println!("No user session; nothing to export.");
                return Ok(());
            };
            let subjects = db::fetch_subjects(&pool, &user).await?;
            let logs = db::fetch_logs(&pool, &user).await?;
            if logs.is_empty() {
                println!("No data available to export.");
                return Ok(());
            }
            let csv = report::export_csv(&subjects, &logs)?;
            std::fs::write(&out, csv)?;
            println!("CSV written to {}.", out.display());
        }
    }

    Ok(())
}

fn current_user() -> Option<String> {
    std::env::var("ATTENDANCE_USER")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn require_user() -> anyhow::Result<String> {
    current_user().context("ATTENDANCE_USER must be set to record attendance")
}

fn validate_target(target: Option<f64>) -> anyhow::Result<Option<f64>> {
    if let Some(value) = target {
        if !(value > 0.0 && value <= 100.0) {
            anyhow::bail!("target must be within (0, 100], got {value}");
        }
    }
    Ok(target)
}
