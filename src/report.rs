use std::collections::HashMap;
use std::fmt::Write;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{AttendanceLog, RiskStatus, Subject, SubjectStats};

pub fn build_report(user_label: &str, as_of: NaiveDate, stats: &[SubjectStats]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(output, "Generated for {} (as of {})", user_label, as_of);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Subjects");

    if stats.is_empty() {
        let _ = writeln!(output, "No subjects tracked yet.");
    } else {
        for stat in stats {
            let schedule = if stat.days.is_empty() {
                "unscheduled".to_string()
            } else {
                stat.days.join("/")
            };
            let _ = writeln!(
                output,
                "- {} ({}): {}/{} classes attended, {:.1}% against a {:.0}% target [{}]",
                stat.subject_name,
                schedule,
                stat.present,
                stat.total_classes,
                stat.percentage,
                stat.target,
                stat.status
            );
        }
    }

    let at_risk: Vec<&SubjectStats> = stats
        .iter()
        .filter(|s| s.status == RiskStatus::AtRisk)
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## At Risk");

    if at_risk.is_empty() {
        let _ = writeln!(output, "Every subject is at or above target.");
    } else {
        for stat in at_risk {
            match stat.classes_to_recover {
                Some(needed) => {
                    let _ = writeln!(
                        output,
                        "- {}: attend the next {} classes to get back to {:.0}%",
                        stat.subject_name, needed, stat.target
                    );
                }
                None => {
                    let _ = writeln!(
                        output,
                        "- {}: the {:.0}% target is unreachable from here",
                        stat.subject_name, stat.target
                    );
                }
            }
        }
    }

    output
}

/// Formats every log as a Date,Subject,Status row, oldest first. Logs
/// whose subject no longer exists are skipped, matching the stats pass.
pub fn export_csv(subjects: &[Subject], logs: &[AttendanceLog]) -> anyhow::Result<String> {
    let names: HashMap<Uuid, &str> = subjects
        .iter()
        .map(|subject| (subject.id, subject.name.as_str()))
        .collect();

    let mut rows: Vec<&AttendanceLog> = logs
        .iter()
        .filter(|log| names.contains_key(&log.subject_id))
        .collect();
    rows.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| names[&a.subject_id].cmp(names[&b.subject_id]))
    });

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Date", "Subject", "Status"])?;
    for log in rows {
        writer.write_record([
            log.date.to_string().as_str(),
            names[&log.subject_id],
            log.status.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv: {err}"))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use chrono::Utc;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn subject(name: &str) -> Subject {
        Subject {
            id: Uuid::new_v4(),
            user_id: "sam@example.com".to_string(),
            name: name.to_string(),
            target_percentage: None,
            days: vec!["Mon".to_string()],
            created_on: date(2024, 1, 1),
        }
    }

    fn log(subject: &Subject, on: NaiveDate, status: AttendanceStatus) -> AttendanceLog {
        AttendanceLog {
            id: Uuid::new_v4(),
            user_id: subject.user_id.clone(),
            subject_id: subject.id,
            date: on,
            status,
            created_at: Utc::now(),
        }
    }

    fn stat(name: &str, status: RiskStatus, classes_to_recover: Option<u32>) -> SubjectStats {
        SubjectStats {
            subject_id: Uuid::new_v4(),
            subject_name: name.to_string(),
            days: vec!["Mon".to_string(), "Wed".to_string()],
            target: 75.0,
            total_classes: 10,
            present: 5,
            absent: 5,
            percentage: 50.0,
            status,
            classes_to_recover,
        }
    }

    #[test]
    fn report_lists_at_risk_subjects_with_recovery_counts() {
        let stats = vec![
            stat("Compilers", RiskStatus::AtRisk, Some(10)),
            stat("Databases", RiskStatus::Safe, Some(0)),
        ];
        let report = build_report("sam@example.com", date(2024, 1, 31), &stats);

        assert!(report.contains("# Attendance Report"));
        assert!(report.contains("Compilers: attend the next 10 classes"));
        assert!(!report.contains("Databases: attend"));
    }

    #[test]
    fn report_flags_unreachable_targets() {
        let stats = vec![stat("Compilers", RiskStatus::AtRisk, None)];
        let report = build_report("sam@example.com", date(2024, 1, 31), &stats);
        assert!(report.contains("unreachable"));
    }

    #[test]
    fn csv_orders_by_date_then_subject_and_skips_orphans() {
        let maths = subject("Maths");
        let physics = subject("Physics");
        let ghost = subject("Ghost");

        let logs = vec![
            log(&physics, date(2024, 1, 2), AttendanceStatus::Absent),
            log(&maths, date(2024, 1, 2), AttendanceStatus::Present),
            log(&maths, date(2024, 1, 1), AttendanceStatus::Present),
            log(&ghost, date(2024, 1, 1), AttendanceStatus::Present),
        ];

        let csv = export_csv(&[maths, physics], &logs).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Date,Subject,Status",
                "2024-01-01,Maths,present",
                "2024-01-02,Maths,present",
                "2024-01-02,Physics,absent",
            ]
        );
    }
}
