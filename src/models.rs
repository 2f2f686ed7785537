use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::{Category, Difficulty};

/// A single movement with prescribed sets, reps and rest, owned by the catalog.
/// Immutable at runtime; sessions copy the prescription at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub id: &'static str,
    pub name: &'static str,
    pub sets: u32,
    pub reps: u32,
    /// Mandatory rest between sets, in seconds.
    pub rest_time: u32,
    pub image: &'static str,
}

/// A catalog template describing an ordered list of exercises.
#[derive(Debug, Clone, Serialize)]
pub struct Workout {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub difficulty: Difficulty,
    /// Nominal total duration in minutes.
    pub duration: u32,
    pub image: &'static str,
    pub exercises: Vec<Exercise>,
}

/// One timed execution instance of a workout, with per-set completion tracking.
/// Mutable while the session runs; immutable once closed and appended to history.
///
/// Invariant: `completed == true` implies `end_time` is set and every
/// exercise progress entry is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub workout_id: String,
    pub start_time: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Local>>,
    pub completed: bool,
    pub exercises: Vec<ExerciseProgress>,
}

/// Per-exercise progress within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgress {
    pub exercise_id: String,
    pub completed: bool,
    pub sets: Vec<SetProgress>,
}

/// Per-set progress. `reps` is the prescription copied from the catalog when
/// the session started, so a later catalog edit never alters an in-flight run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProgress {
    /// 1-based set index.
    pub set_number: u32,
    pub completed: bool,
    pub reps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub age: u32,
    pub weight: f32,
    pub height: f32,
    pub gender: Gender,
    pub fitness_goal: FitnessGoal,
    pub activity_level: ActivityLevel,
    pub medical_conditions: Vec<String>,
    pub preferred_workout_time: WorkoutTime,
    /// Preferred session length in minutes (15, 30, 45 or 60).
    pub workout_duration: u32,
    pub last_updated: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitnessGoal {
    WeightLoss,
    MuscleGain,
    Endurance,
    Flexibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Moderate,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutTime {
    Morning,
    Afternoon,
    Evening,
}

/// The durable document other surfaces rely on. Field names and the flat
/// array-of-session shape are a compatibility contract with previously
/// persisted data; do not rename.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub user: Option<User>,
    pub workout_history: Vec<WorkoutSession>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_state_uses_legacy_field_names() {
        let state = PersistedState {
            user: None,
            workout_history: vec![WorkoutSession {
                id: "s1".into(),
                workout_id: "1".into(),
                start_time: Local::now(),
                end_time: None,
                completed: false,
                exercises: vec![ExerciseProgress {
                    exercise_id: "e1".into(),
                    completed: false,
                    sets: vec![SetProgress {
                        set_number: 1,
                        completed: false,
                        reps: 12,
                    }],
                }],
            }],
        };

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"workoutHistory\""));
        assert!(json.contains("\"workoutId\""));
        assert!(json.contains("\"startTime\""));
        assert!(json.contains("\"exerciseId\""));
        assert!(json.contains("\"setNumber\""));
        // An open session has no endTime key at all.
        assert!(!json.contains("\"endTime\""));
    }

    #[test]
    fn profile_enums_keep_original_encodings() {
        let profile = UserProfile {
            age: 30,
            weight: 72.5,
            height: 178.0,
            gender: Gender::Other,
            fitness_goal: FitnessGoal::WeightLoss,
            activity_level: ActivityLevel::Moderate,
            medical_conditions: vec![],
            preferred_workout_time: WorkoutTime::Morning,
            workout_duration: 30,
            last_updated: "2025-01-01T00:00:00Z".into(),
        };

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"weight-loss\""));
        assert!(json.contains("\"morning\""));
        assert!(json.contains("\"fitnessGoal\""));
        assert!(json.contains("\"preferredWorkoutTime\""));

        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fitness_goal, FitnessGoal::WeightLoss);
    }
}
