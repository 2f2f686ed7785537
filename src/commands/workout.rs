use anyhow::Result;
use colored::Colorize;

use crate::catalog;
use crate::cli::WorkoutCmd;
use crate::models::Workout;
use crate::types::{self, Difficulty};

pub fn handle(cmd: WorkoutCmd, json: bool) -> Result<()> {
    match cmd {
        WorkoutCmd::List { category } => {
            let workouts: Vec<&Workout> = match category {
                Some(cat) => catalog::by_category(cat).collect(),
                None => catalog::all().iter().collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&workouts)?);
                return Ok(());
            }

            if workouts.is_empty() {
                println!("{} no workouts in that category", "warning:".yellow().bold());
                return Ok(());
            }

            println!("{}", "Workouts:".cyan().bold());
            for (i, workout) in workouts.iter().enumerate() {
                let idx = format!("{}", i + 1).yellow();
                println!(
                    "{} • {} — {} / {} ({} min, {} exercises)",
                    idx,
                    workout.name.bold(),
                    workout.category,
                    colorize_difficulty(workout.difficulty),
                    workout.duration,
                    workout.exercises.len()
                );
            }

            Ok(())
        }

        WorkoutCmd::Show { workout } => {
            let Some(workout) = resolve(&workout) else {
                return Ok(());
            };

            if json {
                println!("{}", serde_json::to_string_pretty(workout)?);
                return Ok(());
            }

            println!(
                "{} {} — {} / {} ({} min)",
                "Workout:".cyan().bold(),
                workout.name.bold(),
                workout.category,
                colorize_difficulty(workout.difficulty),
                workout.duration
            );
            println!("{}", workout.description.dimmed());

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

            Ok(())
        }
    }
}

/// Resolve a workout argument by 1-based catalog index, id or name. Prints an
/// error (with a fuzzy suggestion when one is clear) on a miss.
pub fn resolve(input: &str) -> Option<&'static Workout> {
    if let Ok(idx) = input.parse::<usize>() {
        // Bare numbers double as catalog ids ("1".."3"), so try ids first.
        if let Some(w) = catalog::find(input) {
            return Some(w);
        }
        if idx >= 1 {
            if let Some(w) = catalog::all().get(idx - 1) {
                return Some(w);
            }
        }
        println!("{} no workout at index {}", "error:".red().bold(), idx);
        return None;
    }

    if let Some(w) = catalog::find(input).or_else(|| catalog::find_by_name(input)) {
        return Some(w);
    }

    println!("{} no workout named `{}`", "error:".red().bold(), input);
    if let Some(suggestion) = types::best_workout_suggestion(input) {
        println!("{} did you mean `{}`?", "note:".yellow().bold(), suggestion);
    }
    None
}

fn colorize_difficulty(difficulty: Difficulty) -> colored::ColoredString {
    match difficulty {
        Difficulty::Beginner => "Beginner".green(),
        Difficulty::Intermediate => "Intermediate".yellow(),
        Difficulty::Advanced => "Advanced".red(),
    }
}
