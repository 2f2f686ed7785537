use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Local;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::sync::{Mutex, watch};

use crate::models::{PersistedState, User, UserProfile, WorkoutSession};

/// Single storage key for the whole durable document. Kept identical to the
/// legacy store name so previously persisted data keeps loading.
const STORE_KEY: &str = "fitness-store";

/// Where a finished session gets committed. The engine only ever needs the
/// append half of the store; a real append must either succeed or surface its
/// error to the caller, never fail silently.
pub trait HistoryStore {
    async fn append(&self, session: WorkoutSession) -> Result<()>;
}

pub type DB = SqlitePool;

pub async fn open(path: &str) -> Result<DB> {
    let opts = SqliteConnectOptions::from_str(path)?.create_if_missing(true);

    Ok(SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?)
}

/// Application state store: one JSON document in a key/value table, with
/// watch-based change notification for read-side subscribers.
pub struct StateStore {
    pool: DB,
    /// Serializes read-modify-write cycles so two appends can never interleave.
    write_lock: Mutex<()>,
    tx: watch::Sender<PersistedState>,
}

impl StateStore {
    pub async fn open(path: &str) -> Result<Self> {
        let pool = open(path).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS app_state (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;

        let initial = Self::load_from(&pool).await?;
        let (tx, _) = watch::channel(initial);

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
            tx,
        })
    }

    async fn load_from(pool: &DB) -> Result<PersistedState> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_state WHERE key = ?")
                .bind(STORE_KEY)
                .fetch_optional(pool)
                .await
                .context("Failed to read application state")?;

        match raw {
            Some(json) => {
                serde_json::from_str(&json).context("Corrupt application state document")
            }
            None => Ok(PersistedState::default()),
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        let json = serde_json::to_string(state)?;

        sqlx::query("INSERT OR REPLACE INTO app_state (key, value) VALUES (?, ?)")
            .bind(STORE_KEY)
            .bind(&json)
            .execute(&self.pool)
            .await
            .context("Failed to persist application state")?;

        // Notify read-side subscribers regardless of receiver count.
        self.tx.send_replace(state.clone());
        Ok(())
    }

    /// Snapshot of the full persisted document.
    pub async fn load(&self) -> Result<PersistedState> {
        Self::load_from(&self.pool).await
    }

    /// Snapshot of the session history, oldest first.
    pub async fn read_all(&self) -> Result<Vec<WorkoutSession>> {
        Ok(self.load().await?.workout_history)
    }

    /// Observe state changes. The receiver always holds the latest document.
    pub fn subscribe(&self) -> watch::Receiver<PersistedState> {
        self.tx.subscribe()
    }

    pub async fn set_user(&self, user: Option<User>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load().await?;
        state.user = user;
        self.save(&state).await
    }

    /// Replace the signed-in user's profile, stamping `lastUpdated`.
    pub async fn update_profile(&self, profile: UserProfile) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load().await?;

        let Some(user) = state.user.as_mut() else {
            bail!("no signed-in user to update");
        };

        user.profile = Some(UserProfile {
            last_updated: Local::now().to_rfc3339(),
            ..profile
        });
        self.save(&state).await
    }
}

impl HistoryStore for StateStore {
    async fn append(&self, session: WorkoutSession) -> Result<()> {
        // History is append-only: entries are never edited in place, a
        // correction means appending a new record.
        let _guard = self.write_lock.lock().await;
        let mut state = self.load().await?;
        state.workout_history.push(session);
        self.save(&state).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// In-memory history double. `fail_next` makes the next append report a
    /// persistence failure without recording anything.
    #[derive(Default, Debug)]
    pub struct MemoryHistory {
        pub sessions: Mutex<Vec<WorkoutSession>>,
        pub fail_next: AtomicBool,
    }

    impl HistoryStore for MemoryHistory {
        async fn append(&self, session: WorkoutSession) -> Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                bail!("simulated storage failure");
            }
            self.sessions.lock().unwrap().push(session);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::ExerciseProgress;

    fn temp_db_path() -> String {
        std::env::temp_dir()
            .join(format!("formcoach-test-{}.db", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    fn session(id: &str, completed: bool) -> WorkoutSession {
        let start = Local::now();
        WorkoutSession {
            id: id.to_string(),
            workout_id: "1".to_string(),
            start_time: start,
            end_time: completed.then(|| start + Duration::minutes(20)),
            completed,
            exercises: vec![ExerciseProgress {
                exercise_id: "e1".to_string(),
                completed,
                sets: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn appends_preserve_arrival_order() {
        let store = StateStore::open(&temp_db_path()).await.unwrap();

        store.append(session("a", true)).await.unwrap();
        store.append(session("b", false)).await.unwrap();
        store.append(session("c", true)).await.unwrap();

        let ids: Vec<String> = store
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn on_disk_document_keeps_legacy_shape() {
        let store = StateStore::open(&temp_db_path()).await.unwrap();
        store.append(session("a", true)).await.unwrap();

        let raw: String = sqlx::query_scalar("SELECT value FROM app_state WHERE key = ?")
            .bind(STORE_KEY)
            .fetch_one(&store.pool)
            .await
            .unwrap();

        assert!(raw.contains("\"workoutHistory\""));
        assert!(raw.contains("\"startTime\""));
        assert!(raw.contains("\"user\":null"));
    }

    #[tokio::test]
    async fn survives_reopen() {
        let path = temp_db_path();
        {
            let store = StateStore::open(&path).await.unwrap();
            store.append(session("a", true)).await.unwrap();
        }

        let reopened = StateStore::open(&path).await.unwrap();
        assert_eq!(reopened.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_appends() {
        let store = StateStore::open(&temp_db_path()).await.unwrap();
        let mut rx = store.subscribe();
        assert!(rx.borrow().workout_history.is_empty());

        store.append(session("a", true)).await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().workout_history.len(), 1);
    }

    #[tokio::test]
    async fn profile_update_requires_user() {
        let store = StateStore::open(&temp_db_path()).await.unwrap();

        let profile = UserProfile {
            age: 28,
            weight: 70.0,
            height: 175.0,
            gender: crate::models::Gender::Female,
            fitness_goal: crate::models::FitnessGoal::Endurance,
            activity_level: crate::models::ActivityLevel::Active,
            medical_conditions: vec![],
            preferred_workout_time: crate::models::WorkoutTime::Evening,
            workout_duration: 45,
            last_updated: String::new(),
        };

        assert!(store.update_profile(profile.clone()).await.is_err());

        store
            .set_user(Some(User {
                id: "u1".into(),
                email: "u@example.com".into(),
                name: "U".into(),
                profile: None,
            }))
            .await
            .unwrap();
        store.update_profile(profile).await.unwrap();

        let state = store.load().await.unwrap();
        let saved = state.user.unwrap().profile.unwrap();
        assert_eq!(saved.workout_duration, 45);
        assert!(!saved.last_updated.is_empty());
    }
}
