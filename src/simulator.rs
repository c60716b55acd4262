use serde::Serialize;

use crate::models::SubjectStats;
use crate::stats::percentage;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub hypothetical_present: u32,
    pub hypothetical_total: u32,
    pub hypothetical_percentage: f64,
    pub is_safe: bool,
}

/// Read-only what-if projection: re-runs the percentage formula as if the
/// user attends `attend_next` and misses `bunk_next` upcoming classes.
/// Counters are non-negative by type; the snapshot is never mutated.
pub fn project(stats: &SubjectStats, attend_next: u32, bunk_next: u32) -> Projection {
    let hypothetical_present = stats.present + attend_next;
    let hypothetical_total = stats.total_classes + attend_next + bunk_next;
    let hypothetical_percentage = percentage(hypothetical_present, hypothetical_total);

    Projection {
        hypothetical_present,
        hypothetical_total,
        hypothetical_percentage,
        is_safe: hypothetical_percentage >= stats.target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskStatus;
    use uuid::Uuid;

    fn snapshot(present: u32, total_classes: u32, target: f64) -> SubjectStats {
        SubjectStats {
            subject_id: Uuid::new_v4(),
            subject_name: "Compilers".to_string(),
            days: vec!["Tue".to_string(), "Thu".to_string()],
            target,
            total_classes,
            present,
            absent: total_classes - present,
            percentage: percentage(present, total_classes),
            status: RiskStatus::OnTrack,
            classes_to_recover: Some(0),
        }
    }

    #[test]
    fn attending_ten_straight_reaches_the_target_exactly() {
        let stats = snapshot(5, 10, 75.0);
        let projection = project(&stats, 10, 0);

        assert_eq!(projection.hypothetical_present, 15);
        assert_eq!(projection.hypothetical_total, 20);
        assert_eq!(projection.hypothetical_percentage, 75.0);
        assert!(projection.is_safe);
    }

    #[test]
    fn bunking_lowers_the_projection_below_target() {
        let stats = snapshot(8, 10, 75.0);
        let projection = project(&stats, 0, 2);

        assert_eq!(projection.hypothetical_total, 12);
        assert!((projection.hypothetical_percentage - 800.0 / 12.0).abs() < 0.001);
        assert!(!projection.is_safe);
    }

    #[test]
    fn zero_deltas_reproduce_the_current_percentage() {
        let stats = snapshot(7, 9, 75.0);
        let projection = project(&stats, 0, 0);
        assert_eq!(projection.hypothetical_percentage, stats.percentage);
    }

    #[test]
    fn empty_history_projects_fully_compliant() {
        let stats = snapshot(0, 0, 75.0);
        let projection = project(&stats, 0, 0);
        assert_eq!(projection.hypothetical_percentage, 100.0);
        assert!(projection.is_safe);
    }
}
