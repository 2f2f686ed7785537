use anyhow::Result;
use colored::Colorize;

use crate::feedback::{self, Advice};

pub fn handle(score: f64, json: bool) -> Result<()> {
    let result = feedback::evaluate(score);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "score": result.score,
                "advice": match result.advice {
                    Advice::GoodForm => "good-form",
                    Advice::CheckForm => "check-form",
                },
            })
        );
        return Ok(());
    }

    match result.advice {
        Advice::GoodForm => println!("{} {}", "ok:".green().bold(), result.message()),
        Advice::CheckForm => println!("{} {}", "note:".yellow().bold(), result.message()),
    }
    println!("{}", format!("score: {:.2}", result.score).dimmed());

    Ok(())
}
