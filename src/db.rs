use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{AttendanceLog, AttendanceStatus, Subject};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool, user_id: &str) -> anyhow::Result<()> {
    let subjects = vec![
        (
            Uuid::parse_str("7b0d2c64-55f3-4f21-9a51-2f1a4c6d8e01")?,
            "Data Structures",
            Some(75.0),
            vec!["Mon", "Wed", "Fri"],
            NaiveDate::from_ymd_opt(2026, 7, 6).context("invalid date")?,
        ),
        (
            Uuid::parse_str("c3a9e7f2-1d48-4b06-8a3d-5e9b0c2f7a12")?,
            "Linear Algebra",
            Some(80.0),
            vec!["Tue", "Thu"],
            NaiveDate::from_ymd_opt(2026, 7, 7).context("invalid date")?,
        ),
    ];

    let mut subject_ids = Vec::new();
    for (id, name, target, days, created_on) in subjects {
        let days: Vec<String> = days.into_iter().map(String::from).collect();
        let subject_id: Uuid = sqlx::query(
            r#"
            INSERT INTO attendance_tracker.subjects
            (id, user_id, name, target_percentage, days, created_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, name) DO UPDATE
            SET target_percentage = EXCLUDED.target_percentage, days = EXCLUDED.days
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(target)
        .bind(&days)
        .bind(created_on)
        .fetch_one(pool)
        .await?
        .get("id");
        subject_ids.push(subject_id);
    }

    let logs = vec![
        (
            "f7d1a9b3-6c2e-4d80-b1f4-0a3c5e7d9b21",
            subject_ids[0],
            NaiveDate::from_ymd_opt(2026, 7, 6).context("invalid date")?,
            AttendanceStatus::Present,
        ),
        (
            "2e8b4c6d-9f01-4a23-8d5e-7b9c1a3f5d02",
            subject_ids[0],
            NaiveDate::from_ymd_opt(2026, 7, 8).context("invalid date")?,
            AttendanceStatus::Absent,
        ),
        (
            "a1c3e5f7-0b2d-4e68-9a0c-3d5f7b9e1c13",
            subject_ids[0],
            NaiveDate::from_ymd_opt(2026, 7, 10).context("invalid date")?,
            AttendanceStatus::Cancelled,
        ),
        (
            "58f0b2d4-7a9c-4e13-b6d8-1f3a5c7e9b04",
            subject_ids[1],
            NaiveDate::from_ymd_opt(2026, 7, 7).context("invalid date")?,
            AttendanceStatus::Present,
        ),
        (
            "90b2d4f6-3e5a-4c79-8b0d-5f7a9c1e3d15",
            subject_ids[1],
            NaiveDate::from_ymd_opt(2026, 7, 9).context("invalid date")?,
            AttendanceStatus::Present,
        ),
    ];

    for (id, subject_id, date, status) in logs {
        sqlx::query(
            r#"
            INSERT INTO attendance_tracker.attendance_logs
            (id, user_id, subject_id, date, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(user_id)
        .bind(subject_id)
        .bind(date)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    }

    Ok(())
}

fn subject_from_row(row: &sqlx::postgres::PgRow) -> anyhow::Result<Subject> {
    Ok(Subject {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        target_percentage: row.get("target_percentage"),
        days: row.get("days"),
        created_on: row.get("created_on"),
    })
}

fn log_from_row(row: &sqlx::postgres::PgRow) -> anyhow::Result<AttendanceLog> {
    let status: String = row.get("status");
    Ok(AttendanceLog {
        id: row.get("id"),
        user_id: row.get("user_id"),
        subject_id: row.get("subject_id"),
        date: row.get("date"),
        status: status.parse()?,
        created_at: row.get("created_at"),
    })
}

pub async fn fetch_subjects(pool: &PgPool, user_id: &str) -> anyhow::Result<Vec<Subject>> {
    let rows = sqlx::query(
        "SELECT id, user_id, name, target_percentage, days, created_on \
         FROM attendance_tracker.subjects \
         WHERE user_id = $1 \
         ORDER BY created_on, name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(subject_from_row).collect()
}

pub async fn fetch_subject_by_name(
    pool: &PgPool,
    user_id: &str,
    name: &str,
) -> anyhow::Result<Subject> {
    let row = sqlx::query(
        "SELECT id, user_id, name, target_percentage, days, created_on \
         FROM attendance_tracker.subjects \
         WHERE user_id = $1 AND name = $2",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no subject named {name:?}"))?;

    subject_from_row(&row)
}

pub async fn insert_subject(
    pool: &PgPool,
    user_id: &str,
    name: &str,
    target_percentage: Option<f64>,
    days: &[String],
    created_on: NaiveDate,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO attendance_tracker.subjects
        (id, user_id, name, target_percentage, days, created_on)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(target_percentage)
    .bind(days)
    .bind(created_on)
    .execute(pool)
    .await
    .with_context(|| format!("failed to create subject {name:?}"))?;

    Ok(id)
}

pub async fn update_subject(pool: &PgPool, subject: &Subject) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE attendance_tracker.subjects \
         SET name = $2, target_percentage = $3, days = $4 \
         WHERE id = $1",
    )
    .bind(subject.id)
    .bind(&subject.name)
    .bind(subject.target_percentage)
    .bind(&subject.days)
    .execute(pool)
    .await?;

    Ok(())
}

/// Logs are left in place on purpose; the stats pass iterates subjects, so
/// orphaned logs simply stop contributing.
pub async fn delete_subject(pool: &PgPool, user_id: &str, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM attendance_tracker.subjects WHERE user_id = $1 AND id = $2",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_logs(pool: &PgPool, user_id: &str) -> anyhow::Result<Vec<AttendanceLog>> {
    let rows = sqlx::query(
        "SELECT id, user_id, subject_id, date, status, created_at \
         FROM attendance_tracker.attendance_logs \
         WHERE user_id = $1 \
         ORDER BY date, created_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(log_from_row).collect()
}

/// Logs for one subject on one day, primary first. The earliest row by
/// (created_at, id) is the primary log; everything after it is an extra
/// class.
pub async fn fetch_day_logs(
    pool: &PgPool,
    user_id: &str,
    subject_id: Uuid,
    date: NaiveDate,
) -> anyhow::Result<Vec<AttendanceLog>> {
    let rows = sqlx::query(
        "SELECT id, user_id, subject_id, date, status, created_at \
         FROM attendance_tracker.attendance_logs \
         WHERE user_id = $1 AND subject_id = $2 AND date = $3 \
         ORDER BY created_at, id",
    )
    .bind(user_id)
    .bind(subject_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    rows.iter().map(log_from_row).collect()
}

pub async fn insert_log(
    pool: &PgPool,
    user_id: &str,
    subject_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO attendance_tracker.attendance_logs
        (id, user_id, subject_id, date, status)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(subject_id)
    .bind(date)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn update_log_status(
    pool: &PgPool,
    id: Uuid,
    status: AttendanceStatus,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE attendance_tracker.attendance_logs SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_log(pool: &PgPool, user_id: &str, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM attendance_tracker.attendance_logs WHERE user_id = $1 AND id = $2",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Inserted,
    Updated,
    Removed,
}

/// Quick-toggle write path for a subject on a day. Re-marking the primary
/// log with its current status un-marks it, a different status re-labels
/// it, and with no primary a fresh log is inserted.
pub async fn toggle_log(
    pool: &PgPool,
    user_id: &str,
    subject_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
) -> anyhow::Result<ToggleOutcome> {
    let day_logs = fetch_day_logs(pool, user_id, subject_id, date).await?;

    match day_logs.first() {
        Some(primary) if primary.status == status => {
            delete_log(pool, user_id, primary.id).await?;
            Ok(ToggleOutcome::Removed)
        }
        Some(primary) => {
            update_log_status(pool, primary.id, status).await?;
            Ok(ToggleOutcome::Updated)
        }
        None => {
            insert_log(pool, user_id, subject_id, date, status).await?;
            Ok(ToggleOutcome::Inserted)
        }
    }
}

/// Bulk calendar action: every subject scheduled on `date`'s weekday gets
/// its primary log set to `status` (inserted when missing). Returns how
/// many subjects were touched.
pub async fn mark_whole_day(
    pool: &PgPool,
    user_id: &str,
    date: NaiveDate,
    status: AttendanceStatus,
) -> anyhow::Result<usize> {
    let subjects = fetch_subjects(pool, user_id).await?;
    let weekday = date.weekday();
    let mut touched = 0;

    for subject in subjects.iter().filter(|s| s.is_scheduled_on(weekday)) {
        let day_logs = fetch_day_logs(pool, user_id, subject.id, date).await?;
        match day_logs.first() {
            Some(primary) => update_log_status(pool, primary.id, status).await?,
            None => {
                insert_log(pool, user_id, subject.id, date, status).await?;
            }
        }
        touched += 1;
    }

    Ok(touched)
}
