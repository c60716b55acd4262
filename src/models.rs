use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_TARGET: f64 = 75.0;

pub const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Validates a weekday list against the closed name set, rejects Sunday
/// (schedule-free holiday), and normalizes to unique names in week order.
pub fn normalize_days(days: &[String]) -> anyhow::Result<Vec<String>> {
    for day in days {
        if day == "Sun" {
            anyhow::bail!("Sunday is a holiday and cannot be scheduled");
        }
        if !WEEKDAY_NAMES.contains(&day.as_str()) {
            anyhow::bail!("unknown weekday {day:?}, expected one of Mon,Tue,Wed,Thu,Fri,Sat");
        }
    }

    Ok(WEEKDAY_NAMES
        .iter()
        .filter(|name| days.iter().any(|d| d == *name))
        .map(|name| (*name).to_string())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Cancelled,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, AttendanceStatus::Cancelled)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "cancelled" => Ok(AttendanceStatus::Cancelled),
            other => Err(anyhow::anyhow!(
                "unknown attendance status {other:?}, expected present, absent or cancelled"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Subject {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub target_percentage: Option<f64>,
    pub days: Vec<String>,
    pub created_on: NaiveDate,
}

impl Subject {
    pub fn effective_target(&self) -> f64 {
        self.target_percentage.unwrap_or(DEFAULT_TARGET)
    }

    pub fn is_scheduled_on(&self, weekday: Weekday) -> bool {
        let name = day_name(weekday);
        self.days.iter().any(|d| d == name)
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceLog {
    pub id: Uuid,
    pub user_id: String,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total_classes: u32,
    pub present: u32,
    pub absent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    Safe,
    OnTrack,
    AtRisk,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Safe => "SAFE",
            RiskStatus::OnTrack => "ON_TRACK",
            RiskStatus::AtRisk => "AT_RISK",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub days: Vec<String>,
    pub target: f64,
    pub total_classes: u32,
    pub present: u32,
    pub absent: u32,
    pub percentage: f64,
    pub status: RiskStatus,
    pub classes_to_recover: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_names_cover_the_week() {
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert!(WEEKDAY_NAMES.contains(&day_name(weekday)));
        }
        assert_eq!(day_name(Weekday::Mon), "Mon");
        assert_eq!(day_name(Weekday::Sun), "Sun");
    }

    #[test]
    fn normalize_days_orders_and_dedupes() {
        let input = vec!["Fri".to_string(), "Mon".to_string(), "Fri".to_string()];
        let days = normalize_days(&input).unwrap();
        assert_eq!(days, vec!["Mon".to_string(), "Fri".to_string()]);
    }

    #[test]
    fn normalize_days_rejects_sunday_and_unknown_names() {
        assert!(normalize_days(&["Sun".to_string()]).is_err());
        assert!(normalize_days(&["Monday".to_string()]).is_err());
    }

    #[test]
    fn status_parses_closed_set_only() {
        assert_eq!(
            "present".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Present
        );
        assert!("Present".parse::<AttendanceStatus>().is_err());
        assert!(!AttendanceStatus::Cancelled.is_active());
    }
}
