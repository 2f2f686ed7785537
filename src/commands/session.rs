use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use crate::catalog;
use crate::cli::SessionCmd;
use crate::commands::workout;
use crate::engine::{EngineState, Outcome, SessionEngine};
use crate::feedback;
use crate::models::WorkoutSession;
use crate::store::StateStore;
use crate::timer::RestTicker;

pub async fn handle(cmd: SessionCmd, store: Arc<StateStore>) -> Result<()> {
    match cmd {
        SessionCmd::Run { workout } => run(&workout, store).await,
        SessionCmd::Log { date } => log(&date, &store).await,
    }
}

const HELP: &str =
    "commands: done, skip, pause, resume, pose <score>, status, retry, quit";

async fn run(arg: &str, store: Arc<StateStore>) -> Result<()> {
    let Some(workout) = workout::resolve(arg) else {
        return Ok(());
    };

    let engine = SessionEngine::start(workout.id, store)?;

    println!(
        "{} session started (id: {})",
        "ok:".green().bold(),
        engine.session().id
    );
    println!("\n{}", "Exercises:".cyan().bold());
    for (i, exercise) in workout.exercises.iter().enumerate() {
        let idx = format!("{}", i + 1).yellow();
        println!(
            "{} • {} — {} sets × {} reps, {}s rest",
            idx,
            exercise.name.bold(),
            exercise.sets,
            exercise.reps,
            exercise.rest_time
        );
    }
    println!("\n{}", HELP.dimmed());

    let engine = Arc::new(Mutex::new(engine));
    let mut ticker = RestTicker::start(engine.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_status(&*engine.lock().await);

        // EOF abandons the session the same way `quit` does.
        let Some(line) = lines.next_line().await? else {
            abandon(&mut ticker);
            return Ok(());
        };

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("done") | Some("d") => {
                let mut e = engine.lock().await;
                match e.complete_current_set().await {
                    Ok(Outcome::Rejected) => report_rejection(&e),
                    Ok(Outcome::SetCompleted { next_set }) => {
                        println!(
                            "{} set done — rest {}s, then set {}",
                            "ok:".green().bold(),
                            e.seconds_remaining(),
                            next_set
                        );
                    }
                    Ok(Outcome::ExerciseAdvanced { exercise }) => report_advance(&e, exercise),
                    Ok(Outcome::SessionFinished) => {}
                    Err(err) => report_commit_failure(err),
                }
            }

            Some("skip") | Some("k") => {
                let mut e = engine.lock().await;
                match e.skip_to_next_exercise().await {
                    Ok(Outcome::Rejected) => report_rejection(&e),
                    Ok(Outcome::ExerciseAdvanced { exercise }) => {
                        println!("{} exercise skipped", "ok:".green().bold());
                        report_advance(&e, exercise);
                    }
                    Ok(Outcome::SessionFinished) | Ok(Outcome::SetCompleted { .. }) => {}
                    Err(err) => report_commit_failure(err),
                }
            }

            Some("pause") => {
                engine.lock().await.pause();
                println!("{} paused", "ok:".green().bold());
            }

            Some("resume") => {
                engine.lock().await.resume();
                println!("{} resumed", "ok:".green().bold());
            }

            Some("pose") => match parts.next().map(str::parse::<f64>) {
                Some(Ok(score)) => {
                    // Advisory only: a pose reading never drives a transition.
                    let result = feedback::evaluate(score);
                    match result.advice {
                        feedback::Advice::GoodForm => {
                            println!("{} {}", "ok:".green().bold(), result.message())
                        }
                        feedback::Advice::CheckForm => {
                            println!("{} {}", "note:".yellow().bold(), result.message())
                        }
                    }
                }
                _ => println!("{} usage: pose <score>", "error:".red().bold()),
            },

            Some("retry") => {
                let mut e = engine.lock().await;
                match e.retry_commit().await {
                    Ok(()) => {}
                    Err(err) => report_commit_failure(err),
                }
            }

            Some("status") | None => {}

            Some("help") => println!("{}", HELP.dimmed()),

            Some("quit") | Some("q") => {
                abandon(&mut ticker);
                return Ok(());
            }

            Some(other) => {
                println!("{} unknown command `{}`", "error:".red().bold(), other);
                println!("{}", HELP.dimmed());
            }
        }

        let e = engine.lock().await;
        if e.is_finished() && e.is_committed() {
            ticker.stop();
            print_summary(&e);
            return Ok(());
        }
    }
}

/// Teardown without an append: the abandoned session is discarded, and the
/// ticker must die with it.
fn abandon(ticker: &mut RestTicker) {
    ticker.stop();
    println!("{} session discarded", "ok:".green().bold());
}

fn print_status(engine: &SessionEngine<StateStore>) {
    let workout = engine.workout();
    let exercise = &workout.exercises[engine.current_exercise_index()];
    let total_sets = exercise.sets;

    match engine.state() {
        EngineState::Resting {
            set,
            seconds_remaining,
            ..
        } => {
            println!(
                "{} {} — set {} of {} | rest: {}s",
                "Session:".cyan().bold(),
                exercise.name.bold(),
                set,
                total_sets,
                seconds_remaining
            );
        }
        EngineState::ReadyToComplete { set, .. } => {
            println!(
                "{} {} — set {} of {} | {} ({} reps)",
                "Session:".cyan().bold(),
                exercise.name.bold(),
                set,
                total_sets,
                "ready".green().bold(),
                exercise.reps
            );
        }
        EngineState::Paused => {
            println!(
                "{} {} — {}",
                "Session:".cyan().bold(),
                exercise.name.bold(),
                "paused".yellow().bold()
            );
        }
        EngineState::Finished => {}
    }
}

fn report_rejection(engine: &SessionEngine<StateStore>) {
    match engine.state() {
        EngineState::Resting {
            seconds_remaining, ..
        } => println!(
            "{} rest not finished ({}s remaining)",
            "error:".red().bold(),
            seconds_remaining
        ),
        EngineState::Paused => println!("{} session is paused", "error:".red().bold()),
        EngineState::Finished => println!("{} session already finished", "error:".red().bold()),
        EngineState::ReadyToComplete { .. } => {}
    }
}

fn report_advance(engine: &SessionEngine<StateStore>, exercise_idx: usize) {
    let next = &engine.workout().exercises[exercise_idx];
    println!(
        "{} next up: {} ({} sets × {} reps)",
        "ok:".green().bold(),
        next.name.bold(),
        next.sets,
        next.reps
    );
}

fn report_commit_failure(err: anyhow::Error) {
    println!("{} {:#}", "error:".red().bold(), err);
    println!(
        "{} the session is kept in memory — type `retry` to attempt the save again",
        "note:".yellow().bold()
    );
}

fn print_summary(engine: &SessionEngine<StateStore>) {
    let session = engine.session();
    let workout = engine.workout();

    println!(
        "\n{} session ended (id: {})",
        "ok:".green().bold(),
        session.id
    );

    let duration = session
        .end_time
        .map(|end| end - session.start_time)
        .unwrap_or_else(chrono::Duration::zero);
    println!(
        "{} {} (duration: {})",
        "Session:".cyan().bold(),
        workout.name.bold(),
        format_duration(duration)
    );

    println!("\n{}", "Exercises:".cyan().bold());
    for (progress, exercise) in session.exercises.iter().zip(&workout.exercises) {
        let done = progress.sets.iter().filter(|s| s.completed).count();
        let mark = if progress.completed {
            "✓".green().bold().to_string()
        } else {
            "•".dimmed().to_string()
        };
        println!(
            "{} {} — {}/{} sets",
            mark,
            exercise.name.bold(),
            done,
            progress.sets.len()
        );
    }
}

async fn log(date: &str, store: &StateStore) -> Result<()> {
    let Ok(date) = NaiveDate::parse_from_str(date, "%d-%m-%Y") else {
        println!(
            "{} invalid date `{}` (expected DD-MM-YYYY)",
            "error:".red().bold(),
            date
        );
        return Ok(());
    };

    let sessions: Vec<WorkoutSession> = store
        .read_all()
        .await?
        .into_iter()
        .filter(|s| s.start_time.date_naive() == date)
        .collect();

    if sessions.is_empty() {
        println!(
            "{} no sessions recorded on {}",
            "warning:".yellow().bold(),
            date.format("%d-%m-%Y")
        );
        return Ok(());
    }

    println!("{} {}", "Sessions:".cyan().bold(), date.format("%A %d %B %Y"));
    for session in sessions {
        let name = catalog::find(&session.workout_id)
            .map(|w| w.name.to_string())
            .unwrap_or_else(|| format!("workout {}", session.workout_id));

        let state = if session.completed {
            "completed".green().bold().to_string()
        } else {
            "partial".yellow().bold().to_string()
        };

        let duration = session
            .end_time
            .map(|end| format_duration(end - session.start_time))
            .unwrap_or_else(|| "in progress".to_string());

        println!(
            "  {} — {} ({}) [{}]",
            session.start_time.format("%H:%M").to_string().green(),
            name.bold(),
            duration,
            state
        );

        for progress in &session.exercises {
            let done = progress.sets.iter().filter(|s| s.completed).count();
            let ex_name = catalog::find(&session.workout_id)
                .and_then(|w| w.exercises.iter().find(|e| e.id == progress.exercise_id))
                .map(|e| e.name)
                .unwrap_or(progress.exercise_id.as_str());
            println!("    • {} — {}/{} sets", ex_name, done, progress.sets.len());
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
