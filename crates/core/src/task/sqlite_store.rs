//! SQLite-backed task store implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{FhirTask, TaskStatus, TaskStore, TaskStoreError};

/// SQLite-backed task store.
///
/// The connection lives behind a mutex holding an `Option` so that
/// [`TaskStore::teardown`] can drop it exactly once while later calls see a
/// closed store instead of a poisoned handle.
pub struct SqliteTaskStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteTaskStore {
    /// Create a new SQLite task store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TaskStoreError> {
        let conn = Connection::open(path).map_err(|e| TaskStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Create an in-memory SQLite task store. Contents are lost when the
    /// store is dropped or torn down.
    pub fn in_memory() -> Result<Self, TaskStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TaskStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TaskStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                description TEXT,
                fhir_task TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| TaskStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<FhirTask> {
        let snapshot: String = row.get(0)?;
        serde_json::from_str(&snapshot).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    }

    fn insert(conn: &Connection, task: &FhirTask) -> Result<(), TaskStoreError> {
        let snapshot =
            serde_json::to_string(task).map_err(|e| TaskStoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO tasks (id, description, fhir_task) VALUES (?, ?, ?)",
            params![task.id, task.description, snapshot],
        )
        .map_err(|e| TaskStoreError::Database(e.to_string()))?;

        Ok(())
    }
}

impl TaskStore for SqliteTaskStore {
    fn create(&self, intent: &str, description: Option<&str>) -> Result<FhirTask, TaskStoreError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(TaskStoreError::Closed)?;

        let task = FhirTask::draft(intent, description.map(str::to_string));
        Self::insert(conn, &task)?;

        Ok(task)
    }

    fn create_with_overwrite(&self, candidate: FhirTask) -> Result<FhirTask, TaskStoreError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(TaskStoreError::Closed)?;

        // The store owns identity: whatever id the submission carried is
        // replaced, and the task always starts out as a draft.
        let mut task = candidate;
        task.resource_type = "Task".to_string();
        task.id = uuid::Uuid::new_v4().to_string();
        task.status = TaskStatus::Draft;

        Self::insert(conn, &task)?;

        Ok(task)
    }

    fn get(&self, id: &str) -> Result<Option<FhirTask>, TaskStoreError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(TaskStoreError::Closed)?;

        let result = conn.query_row(
            "SELECT fhir_task FROM tasks WHERE id = ?",
            params![id],
            Self::row_to_task,
        );

        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TaskStoreError::Database(e.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<FhirTask>, TaskStoreError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(TaskStoreError::Closed)?;

        let mut stmt = conn
            .prepare("SELECT fhir_task FROM tasks ORDER BY id ASC")
            .map_err(|e| TaskStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_task)
            .map_err(|e| TaskStoreError::Database(e.to_string()))?;

        let mut tasks = Vec::new();
        for row_result in rows {
            let task = row_result.map_err(|e| TaskStoreError::Database(e.to_string()))?;
            tasks.push(task);
        }

        Ok(tasks)
    }

    fn set_status(&self, id: &str, status: TaskStatus) -> Result<FhirTask, TaskStoreError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(TaskStoreError::Closed)?;

        // Read-modify-write of the snapshot under the connection lock, so
        // concurrent writers serialize and the stored JSON stays consistent.
        let result = conn.query_row(
            "SELECT fhir_task FROM tasks WHERE id = ?",
            params![id],
            Self::row_to_task,
        );

        let mut task = match result {
            Ok(task) => task,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(TaskStoreError::NotFound(id.to_string()))
            }
            Err(e) => return Err(TaskStoreError::Database(e.to_string())),
        };

        // Lifecycle only moves forward. A write that does not advance the
        // task (a late or repeated writer) is dropped, not applied.
        if !task.status.can_advance_to(status) {
            tracing::debug!(
                task_id = %id,
                "Ignoring status write {} on task already {}", status, task.status
            );
            return Ok(task);
        }

        task.status = status;

        let snapshot =
            serde_json::to_string(&task).map_err(|e| TaskStoreError::Database(e.to_string()))?;

        conn.execute(
            "UPDATE tasks SET fhir_task = ? WHERE id = ?",
            params![snapshot, id],
        )
        .map_err(|e| TaskStoreError::Database(e.to_string()))?;

        Ok(task)
    }

    fn teardown(&self) {
        let mut guard = self.conn.lock().unwrap();
        if guard.take().is_some() {
            tracing::info!("Task store torn down");
        }
    }
}
