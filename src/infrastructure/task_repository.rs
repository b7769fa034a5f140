use crate::domain::models::Task;
use crate::infrastructure::error::CoreError;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Single namespaced key the whole collection lives under, mirroring
/// the browser clients' localStorage layout.
const TASKS_KEY: &str = "focusmate.tasks";

/// The injected stand-in for the clients' persisted task collection:
/// one flat list, loaded at startup and rewritten whole on every
/// mutation. No migrations, no versioning.
pub trait TaskRepository: Send + Sync {
    fn load(&self) -> Result<Vec<Task>, CoreError>;
    fn save(&self, tasks: &[Task]) -> Result<(), CoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    db_path: PathBuf,
}

impl SqliteTaskRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, CoreError> {
        Connection::open(&self.db_path).map_err(CoreError::from)
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn load(&self) -> Result<Vec<Task>, CoreError> {
        let connection = self.connect()?;
        let raw: Option<String> = connection
            .query_row(
                "SELECT value FROM app_store WHERE key = ?1",
                params![TASKS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        let tasks: Vec<Task> = serde_json::from_str(&raw)?;
        Ok(tasks)
    }

    fn save(&self, tasks: &[Task]) -> Result<(), CoreError> {
        for task in tasks {
            task.validate().map_err(CoreError::Validation)?;
        }

        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO app_store (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value",
            params![TASKS_KEY, serde_json::to_string(tasks)?],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<Vec<Task>>,
}

impl TaskRepository for InMemoryTaskRepository {
    fn load(&self) -> Result<Vec<Task>, CoreError> {
        let tasks = self
            .tasks
            .lock()
            .map_err(|error| CoreError::InvalidConfig(format!("task store lock poisoned: {error}")))?;
        Ok(tasks.clone())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), CoreError> {
        for task in tasks {
            task.validate().map_err(CoreError::Validation)?;
        }
        let mut stored = self
            .tasks
            .lock()
            .map_err(|error| CoreError::InvalidConfig(format!("task store lock poisoned: {error}")))?;
        *stored = tasks.to_vec();
        Ok(())
    }
}
