use chrono::{DateTime, Duration, Local, NaiveDate, Weekday};
use itertools::Itertools;
use serde::Serialize;

use crate::models::WorkoutSession;

/// Week start policy, held constant across the system.
const WEEK_START: Weekday = Weekday::Mon;

/// Fixed estimate of calories burned per active minute. A placeholder
/// heuristic, not a physiological model.
const CALORIES_PER_MINUTE: f64 = 8.0;

/// One calendar day of derived history statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    /// Total active minutes across sessions that started this day. Sessions
    /// without an end time count as workouts but contribute zero minutes.
    pub minutes: i64,
    pub calories: i64,
    pub workouts: usize,
}

/// Current-calendar-week rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub workouts: usize,
    pub minutes: i64,
    pub calories: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyGoal {
    pub name: &'static str,
    pub target: f64,
    pub current: f64,
    pub unit: &'static str,
}

fn active_minutes(session: &WorkoutSession) -> f64 {
    match session.end_time {
        Some(end) => (end - session.start_time).num_seconds() as f64 / 60.0,
        None => 0.0,
    }
}

/// Day-bucketed statistics for the trailing 30 days, oldest first, today
/// included. Pure: identical history and `now` yield identical output.
pub fn daily_stats(history: &[WorkoutSession], now: DateTime<Local>) -> Vec<DailyStats> {
    let today = now.date_naive();
    let by_day = history
        .iter()
        .into_group_map_by(|s| s.start_time.date_naive());

    (0..30)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let sessions = by_day.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let minutes: f64 = sessions.iter().map(|s| active_minutes(s)).sum();

            DailyStats {
                date,
                minutes: minutes.round() as i64,
                calories: (minutes * CALORIES_PER_MINUTE).round() as i64,
                workouts: sessions.len(),
            }
        })
        .collect()
}

/// Rollup of the calendar week containing `now`.
pub fn weekly_summary(history: &[WorkoutSession], now: DateTime<Local>) -> WeeklySummary {
    let week = now.date_naive().week(WEEK_START);
    let (week_start, week_end) = (week.first_day(), week.last_day());

    let in_week: Vec<&WorkoutSession> = history
        .iter()
        .filter(|s| {
            let day = s.start_time.date_naive();
            day >= week_start && day <= week_end
        })
        .collect();

    let minutes: f64 = in_week.iter().map(|s| active_minutes(s)).sum();

    WeeklySummary {
        week_start,
        week_end,
        workouts: in_week.len(),
        minutes: minutes.round() as i64,
        calories: (minutes * CALORIES_PER_MINUTE).round() as i64,
    }
}

/// Weekly targets against the current rollup. Targets follow the user's
/// preferred workout duration; 30 minutes when no profile is set.
pub fn weekly_goals(workout_duration: Option<u32>, summary: &WeeklySummary) -> Vec<WeeklyGoal> {
    let duration = workout_duration.unwrap_or(30) as f64;

    vec![
        WeeklyGoal {
            name: "Workouts",
            target: 5.0,
            current: summary.workouts as f64,
            unit: "sessions",
        },
        WeeklyGoal {
            name: "Active Minutes",
            target: duration * 5.0,
            current: summary.minutes as f64,
            unit: "minutes",
        },
        WeeklyGoal {
            name: "Calories Burned",
            target: 2000.0,
            current: summary.calories as f64,
            unit: "kcal",
        },
    ]
}
