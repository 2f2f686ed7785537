use clap::{Parser, Subcommand};

use crate::types::Category;

#[derive(Parser)]
#[command(name = "formcoach", version, about = "CLI fitness coach")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse the workout catalog
    #[command(subcommand, visible_alias = "w")]
    Workout(WorkoutCmd),

    /// Run and inspect workout sessions
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Progress statistics derived from session history
    #[command(subcommand, visible_alias = "p")]
    Progress(ProgressCmd),

    /// Map a pose-quality score to form advice
    Feedback {
        /// Pose-quality score, nominally between 0 and 1
        score: f64,
    },

    /// View or edit formcoach config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum WorkoutCmd {
    /// List catalog workouts
    #[command(visible_alias = "l")]
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Show a single workout in detail
    #[command(visible_alias = "s")]
    Show {
        /// Workout index (from `w list`), id or name
        workout: String,
    },
}

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Run a guided session for a workout
    #[command(visible_alias = "r")]
    Run {
        /// Workout index (from `w list`), id or name
        workout: String,
    },

    /// Show recorded sessions for a specific date
    Log {
        /// Date in DD-MM-YYYY format
        #[arg(short, long)]
        date: String,
    },
}

#[derive(Subcommand)]
pub enum ProgressCmd {
    /// Day-by-day statistics for the trailing 30 days
    #[command(visible_alias = "d")]
    Daily,

    /// Current-week summary and goals
    #[command(visible_alias = "w")]
    Weekly,

    /// Show training days in a calendar view
    #[command(visible_alias = "cal")]
    Calendar {
        /// Year to show (defaults to current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show (1-12, defaults to current month)
        #[arg(short, long)]
        month: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
