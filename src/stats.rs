use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{AttendanceLog, AttendanceStatus, RiskStatus, Subject, SubjectStats, Tally};

/// Recovery projections longer than this are reported as unreachable.
pub const MAX_RECOVERY_CLASSES: u32 = 10_000;

/// One full recompute: every subject is reconciled independently against
/// the shared log set. `as_of` is the caller's "today"; nothing past it
/// counts.
pub fn compute_stats(
    subjects: &[Subject],
    logs: &[AttendanceLog],
    as_of: NaiveDate,
) -> Vec<SubjectStats> {
    subjects
        .iter()
        .map(|subject| {
            let tally = reconcile(subject, logs, as_of);
            let target = subject.effective_target();
            let pct = percentage(tally.present, tally.total_classes);

            SubjectStats {
                subject_id: subject.id,
                subject_name: subject.name.clone(),
                days: subject.days.clone(),
                target,
                total_classes: tally.total_classes,
                present: tally.present,
                absent: tally.absent,
                percentage: pct,
                status: status_for(pct, target),
                classes_to_recover: classes_to_recover(tally.present, tally.total_classes, target),
            }
        })
        .collect()
}

/// Walks every local calendar day from the subject's window start through
/// `as_of` inclusive and merges the weekly schedule with logged events.
///
/// The window starts at the earlier of the creation date and the subject's
/// chronologically-first log, so backdated extra classes are absorbed. Per
/// day, a cancellation suppresses the scheduled class, each present/absent
/// log counts on its own, and a scheduled day with no logs at all counts
/// as one implicit absence.
pub fn reconcile(subject: &Subject, logs: &[AttendanceLog], as_of: NaiveDate) -> Tally {
    let subject_logs: Vec<&AttendanceLog> = logs
        .iter()
        .filter(|log| log.subject_id == subject.id)
        .collect();

    let mut start = subject.created_on;
    if let Some(first_log_date) = subject_logs.iter().map(|log| log.date).min() {
        if first_log_date < start {
            start = first_log_date;
        }
    }

    let mut tally = Tally::default();
    let mut cursor = start;

    while cursor <= as_of {
        let day_logs: Vec<_> = subject_logs
            .iter()
            .filter(|log| log.date == cursor)
            .collect();
        let cancelled = day_logs.iter().any(|log| !log.status.is_active());
        let active_count = day_logs.iter().filter(|log| log.status.is_active()).count() as u32;

        let scheduled = subject.is_scheduled_on(cursor.weekday());
        let theoretical = u32::from(scheduled && !cancelled);

        // A day never counts fewer classes than were actually logged, and
        // an unscheduled day with no logs contributes nothing.
        let classes_this_day = theoretical.max(active_count);
        tally.total_classes += classes_this_day;

        if active_count > 0 {
            for log in &day_logs {
                match log.status {
                    AttendanceStatus::Present => tally.present += 1,
                    AttendanceStatus::Absent => tally.absent += 1,
                    AttendanceStatus::Cancelled => {}
                }
            }
        } else if classes_this_day > 0 {
            // Scheduled, not cancelled, nothing logged: implicit absence.
            tally.absent += 1;
        }

        cursor += Duration::days(1);
    }

    tally
}

pub fn percentage(present: u32, total_classes: u32) -> f64 {
    if total_classes > 0 {
        f64::from(present) / f64::from(total_classes) * 100.0
    } else {
        100.0
    }
}

pub fn status_for(percentage: f64, target: f64) -> RiskStatus {
    if percentage < target {
        RiskStatus::AtRisk
    } else if percentage > target + 10.0 {
        RiskStatus::Safe
    } else {
        RiskStatus::OnTrack
    }
}

/// How many consecutive attended classes bring the percentage back up to
/// target, assuming every upcoming class is attended. `Some(0)` when
/// already at or above target; `None` when the target is unreachable
/// within [`MAX_RECOVERY_CLASSES`] (a 100% target with any absence never
/// converges).
pub fn classes_to_recover(present: u32, total_classes: u32, target: f64) -> Option<u32> {
    if percentage(present, total_classes) >= target {
        return Some(0);
    }

    let mut p = u64::from(present);
    let mut t = u64::from(total_classes);
    let mut needed = 0u32;

    while needed < MAX_RECOVERY_CLASSES {
        p += 1;
        t += 1;
        needed += 1;
        if (p as f64 / t as f64) * 100.0 >= target {
            return Some(needed);
        }
    }

    None
}
