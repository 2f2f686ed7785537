use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use colored::Colorize;

use crate::aggregate::{self, DailyStats};
use crate::catalog;
use crate::cli::ProgressCmd;
use crate::store::StateStore;

pub async fn handle(cmd: ProgressCmd, json: bool, store: &StateStore) -> Result<()> {
    match cmd {
        ProgressCmd::Daily => daily(json, store).await,
        ProgressCmd::Weekly => weekly(json, store).await,
        ProgressCmd::Calendar { year, month } => calendar(year, month, store).await,
    }
}

async fn daily(json: bool, store: &StateStore) -> Result<()> {
    let history = store.read_all().await?;
    let stats = aggregate::daily_stats(&history, Local::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Last 30 days".cyan().bold());
    print_minutes_graph(&stats);

    let total_minutes: i64 = stats.iter().map(|d| d.minutes).sum();
    let total_workouts: usize = stats.iter().map(|d| d.workouts).sum();
    let total_calories: i64 = stats.iter().map(|d| d.calories).sum();

    println!();
    println!("{}: {} sessions", "Workouts".cyan().bold(), total_workouts);
    println!("{}: {} min", "Active time".cyan().bold(), total_minutes);
    println!("{}: {} kcal", "Calories".cyan().bold(), total_calories);

    if total_workouts == 0 {
        println!(
            "\n{} no sessions recorded yet — run one with `formcoach session run <workout>`",
            "note:".yellow().bold()
        );
    }

    Ok(())
}

/// One bar per day, scaled to the terminal width. Plain ASCII, no graphics
/// backend.
fn print_minutes_graph(stats: &[DailyStats]) {
    let max_minutes = stats.iter().map(|d| d.minutes).max().unwrap_or(0);
    if max_minutes == 0 {
        println!("{}", "(no activity in this window)".dimmed());
        return;
    }

    let (term_width, _) = term_size::dimensions().unwrap_or((80, 24));
    let bar_width = (term_width.saturating_sub(30)).clamp(10, 50);

    for day in stats {
        let filled = (day.minutes as f64 / max_minutes as f64 * bar_width as f64).round() as usize;
        let bar = "█".repeat(filled);

        if day.workouts > 0 {
            let bar_column = format!("{:<width$}", bar, width = bar_width).green();
            println!(
                "{} │{} {}m, {} kcal",
                day.date.format("%b %d"),
                bar_column,
                day.minutes,
                day.calories
            );
        } else {
            println!("{} │", day.date.format("%b %d").to_string().dimmed());
        }
    }
}

async fn weekly(json: bool, store: &StateStore) -> Result<()> {
    let history = store.read_all().await?;
    let summary = aggregate::weekly_summary(&history, Local::now());

    let preferred_duration = store
        .load()
        .await?
        .user
        .and_then(|u| u.profile)
        .map(|p| p.workout_duration);
    let goals = aggregate::weekly_goals(preferred_duration, &summary);

    if json {
        println!(
            "{}",
            serde_json::json!({ "summary": summary, "goals": goals })
        );
        return Ok(());
    }

    println!(
        "{} {} — {}",
        "Week:".cyan().bold(),
        summary.week_start.format("%d %b"),
        summary.week_end.format("%d %b %Y")
    );
    println!("{}: {} sessions", "Workouts".cyan().bold(), summary.workouts);
    println!("{}: {} min", "Active time".cyan().bold(), summary.minutes);
    println!("{}: {} kcal", "Calories".cyan().bold(), summary.calories);

    println!("\n{}", "Weekly goals:".cyan().bold());
    for goal in goals {
        let reached = goal.current >= goal.target;
        let mark = if reached {
            "✓".green().bold()
        } else {
            "▲".yellow()
        };
        println!(
            "  {} {} — {:.0}/{:.0} {}",
            mark,
            goal.name.bold(),
            goal.current,
            goal.target,
            goal.unit
        );
    }

    Ok(())
}

async fn calendar(year: Option<i32>, month: Option<u32>, store: &StateStore) -> Result<()> {
    // Get current date if year/month not specified
    let now = Local::now();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());

    if !(1..=12).contains(&month) {
        println!("{} month must be between 1 and 12", "error:".red().bold());
        return Ok(());
    }

    let first_day = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let last_day = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    }
    .pred_opt()
    .unwrap();

    let sessions: Vec<_> = store
        .read_all()
        .await?
        .into_iter()
        .filter(|s| {
            let day = s.start_time.date_naive();
            day >= first_day && day <= last_day
        })
        .collect();

    // Print calendar header
    let month_name = first_day.format("%B %Y").to_string();
    println!("\n{}", month_name.bold().cyan());
    println!("{}", "Mo Tu We Th Fr Sa Su".dimmed());

    // Week rows start on Monday, matching the aggregation policy.
    let first_weekday = first_day.weekday().num_days_from_monday() as usize;
    print!("{}", "   ".repeat(first_weekday));

    let mut sessions_by_day = std::collections::HashMap::new();
    for session in &sessions {
        let day = session.start_time.day() as usize;
        sessions_by_day
            .entry(day)
            .or_insert_with(Vec::new)
            .push(session);
    }

    for day in 1..=last_day.day() {
        let day_num = day as usize;

        if sessions_by_day.contains_key(&day_num) {
            print!("{:>2} ", day.to_string().green().bold());
        } else {
            print!("{:>2} ", day);
        }

        if (first_weekday + day_num) % 7 == 0 {
            println!();
        }
    }
    println!("\n");

    if !sessions.is_empty() {
        println!("{}", "Sessions:".cyan().bold());
        for session in &sessions {
            let name = catalog::find(&session.workout_id)
                .map(|w| w.name.to_string())
                .unwrap_or_else(|| format!("workout {}", session.workout_id));

            let end_display = match session.end_time {
                Some(end) => {
                    let duration = end - session.start_time;
                    format!("{} ({})", end.format("%H:%M"), format_duration(duration))
                }
                None => "unfinished".to_string(),
            };

            println!(
                "  {} - {} | {}",
                session
                    .start_time
                    .format("%a %b %d %H:%M")
                    .to_string()
                    .green(),
                end_display,
                name.bold()
            );
        }
    }

    Ok(())
}

fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
