use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use uuid::Uuid;

use crate::catalog;
use crate::models::{ExerciseProgress, SetProgress, Workout, WorkoutSession};
use crate::store::HistoryStore;

/// Observable state of a running session.
///
/// `Resting` and `ReadyToComplete` are derived from the countdown: the rest
/// gate opens exactly when the countdown hits zero, so a zero-rest exercise is
/// ready the moment it becomes current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Resting {
        exercise: usize,
        set: u32,
        seconds_remaining: u32,
    },
    ReadyToComplete {
        exercise: usize,
        set: u32,
    },
    Paused,
    Finished,
}

/// What a completion or skip attempt did to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Invalid transition: rest not elapsed, paused, or already finished.
    /// Expected UI races land here; the machine is unchanged.
    Rejected,
    SetCompleted { next_set: u32 },
    ExerciseAdvanced { exercise: usize },
    SessionFinished,
}

/// Drives one workout session through its sets, rest countdowns and exercise
/// transitions, and commits the closed session to history exactly once.
#[derive(Debug)]
pub struct SessionEngine<S: HistoryStore> {
    store: Arc<S>,
    workout: Workout,
    session: WorkoutSession,
    exercise_idx: usize,
    /// 1-based, like the set numbers shown to the user.
    current_set: u32,
    seconds_remaining: u32,
    paused: bool,
    finished: bool,
    committed: bool,
}

impl<S: HistoryStore> SessionEngine<S> {
    /// Start a session for a catalog workout. Fails fast if the id no longer
    /// resolves: prescriptions are copied here, at creation, and a catalog gap
    /// must block a new session rather than alter a running one.
    pub fn start(workout_id: &str, store: Arc<S>) -> Result<Self> {
        let workout = catalog::find(workout_id)
            .ok_or_else(|| anyhow!("workout `{}` is not in the catalog", workout_id))?;

        Self::from_workout(workout.clone(), store)
    }

    /// Build the engine from an already-resolved workout template.
    pub fn from_workout(workout: Workout, store: Arc<S>) -> Result<Self> {
        if workout.exercises.is_empty() {
            bail!("workout `{}` has no exercises", workout.id);
        }

        let exercises = workout
            .exercises
            .iter()
            .map(|e| ExerciseProgress {
                exercise_id: e.id.to_string(),
                completed: false,
                sets: (1..=e.sets)
                    .map(|n| SetProgress {
                        set_number: n,
                        completed: false,
                        reps: e.reps,
                    })
                    .collect(),
            })
            .collect();

        let session = WorkoutSession {
            id: Uuid::new_v4().to_string(),
            workout_id: workout.id.to_string(),
            start_time: Local::now(),
            end_time: None,
            completed: false,
            exercises,
        };

        let first_rest = workout.exercises[0].rest_time;

        Ok(Self {
            store,
            workout,
            session,
            exercise_idx: 0,
            current_set: 1,
            seconds_remaining: first_rest,
            paused: false,
            finished: false,
            committed: false,
        })
    }

    pub fn state(&self) -> EngineState {
        if self.finished {
            EngineState::Finished
        } else if self.paused {
            EngineState::Paused
        } else if self.seconds_remaining > 0 {
            EngineState::Resting {
                exercise: self.exercise_idx,
                set: self.current_set,
                seconds_remaining: self.seconds_remaining,
            }
        } else {
            EngineState::ReadyToComplete {
                exercise: self.exercise_idx,
                set: self.current_set,
            }
        }
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn current_exercise_index(&self) -> usize {
        self.exercise_idx
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True once the closed session has actually landed in history.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Advance the countdown by one second. A no-op while paused or finished;
    /// the countdown floors at zero and never goes negative.
    pub fn tick(&mut self) {
        if self.paused || self.finished {
            return;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
    }

    /// Idempotent. A finished machine cannot be paused.
    pub fn pause(&mut self) {
        if !self.finished {
            self.paused = true;
        }
    }

    /// Idempotent.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Mark the current set done. Legal only once its rest has fully elapsed
    /// and the machine is neither paused nor finished; anything else is
    /// rejected without a state change. This is the one hard gate separating
    /// form discipline from a free-running timer.
    pub async fn complete_current_set(&mut self) -> Result<Outcome> {
        if self.finished || self.paused || self.seconds_remaining > 0 {
            return Ok(Outcome::Rejected);
        }

        let set_idx = (self.current_set - 1) as usize;
        self.session.exercises[self.exercise_idx].sets[set_idx].completed = true;

        let total_sets = self.session.exercises[self.exercise_idx].sets.len() as u32;
        if self.current_set < total_sets {
            self.current_set += 1;
            self.seconds_remaining = self.workout.exercises[self.exercise_idx].rest_time;
            return Ok(Outcome::SetCompleted {
                next_set: self.current_set,
            });
        }

        self.session.exercises[self.exercise_idx].completed = true;
        self.advance_exercise().await
    }

    /// Force a jump to the next exercise, leaving unfinished sets unfinished.
    /// This is the designed escape hatch past the rest gate; it also clears an
    /// active pause, since the session visibly moves on. Skipping the last
    /// exercise finishes the session the same way natural completion does.
    pub async fn skip_to_next_exercise(&mut self) -> Result<Outcome> {
        if self.finished {
            return Ok(Outcome::Rejected);
        }

        self.paused = false;
        self.advance_exercise().await
    }

    async fn advance_exercise(&mut self) -> Result<Outcome> {
        if self.exercise_idx + 1 < self.workout.exercises.len() {
            self.exercise_idx += 1;
            self.current_set = 1;
            self.seconds_remaining = self.workout.exercises[self.exercise_idx].rest_time;
            return Ok(Outcome::ExerciseAdvanced {
                exercise: self.exercise_idx,
            });
        }

        self.finished = true;
        self.session.completed = self.session.exercises.iter().all(|e| e.completed);
        self.session.end_time = Some(Local::now());
        self.commit().await?;
        Ok(Outcome::SessionFinished)
    }

    /// Append the closed session to history, at most once per session
    /// instance. On failure the error surfaces and the session is retained in
    /// memory so the caller can retry.
    async fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Ok(());
        }

        self.store
            .append(self.session.clone())
            .await
            .context("failed to record finished session")?;
        self.committed = true;
        Ok(())
    }

    /// Re-attempt the history append after a persistence failure. A no-op
    /// unless the session is finished and still uncommitted.
    pub async fn retry_commit(&mut self) -> Result<()> {
        if self.finished && !self.committed {
            return self.commit().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Exercise;
    use crate::store::testing::MemoryHistory;
    use crate::types::{Category, Difficulty};
    use std::sync::atomic::Ordering;

    fn two_exercise_workout(rest: u32) -> Workout {
        Workout {
            id: "w-test",
            name: "Test Pair",
            description: "two exercises, one set each",
            category: Category::Strength,
            difficulty: Difficulty::Beginner,
            duration: 5,
            image: "",
            exercises: vec![
                Exercise {
                    id: "x1",
                    name: "First",
                    sets: 1,
                    reps: 5,
                    rest_time: rest,
                    image: "",
                },
                Exercise {
                    id: "x2",
                    name: "Second",
                    sets: 1,
                    reps: 5,
                    rest_time: rest,
                    image: "",
                },
            ],
        }
    }

    fn engine_for(workout: Workout) -> (SessionEngine<MemoryHistory>, Arc<MemoryHistory>) {
        let store = Arc::new(MemoryHistory::default());
        let engine = SessionEngine::from_workout(workout, store.clone()).unwrap();
        (engine, store)
    }

    #[test]
    fn fresh_session_copies_catalog_prescriptions() {
        for workout in catalog::all() {
            let store = Arc::new(MemoryHistory::default());
            let engine = SessionEngine::start(workout.id, store).unwrap();

            let session = engine.session();
            assert_eq!(session.exercises.len(), workout.exercises.len());
            for (progress, exercise) in session.exercises.iter().zip(&workout.exercises) {
                assert_eq!(progress.sets.len(), exercise.sets as usize);
                assert!(progress.sets.iter().all(|s| s.reps == exercise.reps));
                assert!(progress.sets.iter().all(|s| !s.completed));
            }
        }
    }

    #[test]
    fn unknown_workout_is_rejected_at_creation() {
        let store = Arc::new(MemoryHistory::default());
        let err = SessionEngine::start("999", store).unwrap_err();
        assert!(err.to_string().contains("not in the catalog"));
    }

    #[tokio::test]
    async fn complete_is_rejected_while_resting() {
        let (mut engine, store) = engine_for(two_exercise_workout(30));
        assert!(matches!(
            engine.state(),
            EngineState::Resting {
                seconds_remaining: 30,
                ..
            }
        ));

        assert_eq!(engine.complete_current_set().await.unwrap(), Outcome::Rejected);
        assert_eq!(engine.seconds_remaining(), 30);
        assert!(!engine.session().exercises[0].sets[0].completed);
        assert!(store.sessions.lock().unwrap().is_empty());
    }

    #[test]
    fn pause_freezes_the_countdown() {
        let (mut engine, _) = engine_for(two_exercise_workout(10));
        engine.tick();
        assert_eq!(engine.seconds_remaining(), 9);

        engine.pause();
        engine.pause(); // idempotent
        assert_eq!(engine.state(), EngineState::Paused);

        for _ in 0..50 {
            engine.tick();
        }
        assert_eq!(engine.seconds_remaining(), 9);

        engine.resume();
        engine.resume(); // idempotent
        engine.tick();
        assert_eq!(engine.seconds_remaining(), 8);
    }

    #[tokio::test]
    async fn complete_is_rejected_while_paused() {
        let (mut engine, _) = engine_for(two_exercise_workout(0));
        engine.pause();
        assert_eq!(engine.complete_current_set().await.unwrap(), Outcome::Rejected);
        engine.resume();
        assert!(matches!(
            engine.complete_current_set().await.unwrap(),
            Outcome::ExerciseAdvanced { .. }
        ));
    }

    #[tokio::test]
    async fn completing_everything_finishes_and_appends_once() {
        let store = Arc::new(MemoryHistory::default());
        let workout = catalog::find("1").unwrap().clone();
        let mut engine = SessionEngine::from_workout(workout.clone(), store.clone()).unwrap();

        while !engine.is_finished() {
            while engine.seconds_remaining() > 0 {
                engine.tick();
            }
            let outcome = engine.complete_current_set().await.unwrap();
            assert_ne!(outcome, Outcome::Rejected);
        }

        assert_eq!(engine.state(), EngineState::Finished);
        assert!(engine.session().completed);
        assert!(engine.session().end_time.is_some());
        assert!(
            engine
                .session()
                .exercises
                .iter()
                .all(|e| e.completed && e.sets.iter().all(|s| s.completed))
        );

        let recorded = store.sessions.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].completed);
    }

    #[tokio::test]
    async fn tick_after_finish_is_a_noop() {
        let (mut engine, _) = engine_for(two_exercise_workout(0));
        engine.skip_to_next_exercise().await.unwrap();
        engine.skip_to_next_exercise().await.unwrap();
        assert!(engine.is_finished());

        engine.tick();
        assert_eq!(engine.state(), EngineState::Finished);
        assert_eq!(engine.complete_current_set().await.unwrap(), Outcome::Rejected);
        assert_eq!(engine.skip_to_next_exercise().await.unwrap(), Outcome::Rejected);
    }

    #[tokio::test]
    async fn skipping_the_last_exercise_finishes_without_marking_sets() {
        let (mut engine, store) = engine_for(two_exercise_workout(30));

        assert_eq!(
            engine.skip_to_next_exercise().await.unwrap(),
            Outcome::ExerciseAdvanced { exercise: 1 }
        );
        assert_eq!(engine.seconds_remaining(), 30);

        assert_eq!(
            engine.skip_to_next_exercise().await.unwrap(),
            Outcome::SessionFinished
        );
        let session = engine.session();
        assert!(!session.completed);
        assert!(session.end_time.is_some());
        assert!(session.exercises.iter().all(|e| !e.completed));
        assert!(session.exercises.iter().flat_map(|e| &e.sets).all(|s| !s.completed));

        // Abandon-by-skip still commits the closed record exactly once.
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_rest_walkthrough_matches_end_to_end_scenario() {
        let (mut engine, store) = engine_for(two_exercise_workout(0));

        assert_eq!(
            engine.state(),
            EngineState::ReadyToComplete { exercise: 0, set: 1 }
        );

        assert_eq!(
            engine.complete_current_set().await.unwrap(),
            Outcome::ExerciseAdvanced { exercise: 1 }
        );
        assert_eq!(
            engine.state(),
            EngineState::ReadyToComplete { exercise: 1, set: 1 }
        );

        assert_eq!(
            engine.complete_current_set().await.unwrap(),
            Outcome::SessionFinished
        );
        assert_eq!(engine.state(), EngineState::Finished);

        let recorded = store.sessions.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].completed);
    }

    #[tokio::test]
    async fn append_failure_surfaces_and_can_be_retried() {
        let (mut engine, store) = engine_for(two_exercise_workout(0));
        store.fail_next.store(true, Ordering::SeqCst);

        engine.complete_current_set().await.unwrap();
        let err = engine.complete_current_set().await.unwrap_err();
        assert!(err.to_string().contains("failed to record finished session"));

        // The machine is finished, the session retained, nothing recorded yet.
        assert!(engine.is_finished());
        assert!(store.sessions.lock().unwrap().is_empty());

        engine.retry_commit().await.unwrap();
        assert_eq!(store.sessions.lock().unwrap().len(), 1);

        // A second retry must not append again.
        engine.retry_commit().await.unwrap();
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
    }
}
