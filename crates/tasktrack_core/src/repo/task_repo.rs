//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD plus the filtered/sorted read queries over `tasks`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `TaskItem::validate()` before SQL mutations.
//! - Timestamps are persisted exactly as held by the item; the repository
//!   never re-stamps them.
//! - `update`/`delete` on a missing id fail with `NotFound`; there is no upsert.
//! - Undated tasks sort after dated ones in `get_pending`.
//! - Read paths reject undecodable persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::entity::{now_epoch_ms, TaskId};
use crate::model::task::{TaskItem, TaskPriority, TaskValidationError};
use log::{debug, info};
use rusqlite::{params, Connection, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    priority,
    is_completed,
    created_at,
    updated_at
FROM tasks";

const TASK_COLUMNS: [&str; 8] = [
    "id",
    "title",
    "description",
    "due_date",
    "priority",
    "is_completed",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    /// The item has no id yet, so it cannot be updated or deleted.
    NotPersisted,
    /// The item already carries an id and cannot be added again.
    AlreadyPersisted(TaskId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::NotPersisted => write!(f, "task has not been persisted yet"),
            Self::AlreadyPersisted(id) => write!(f, "task already persisted with id {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for task persistence and queries.
pub trait TaskRepository {
    /// Returns the task with `id`, or `None` when absent.
    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<TaskItem>>;
    /// All tasks, newest `created_at` first.
    fn get_all(&self) -> RepoResult<Vec<TaskItem>>;
    /// Persists a new task and returns it with its assigned id.
    fn add(&self, item: TaskItem) -> RepoResult<TaskItem>;
    /// Persists mutations of an existing task.
    fn update(&self, item: &TaskItem) -> RepoResult<()>;
    /// Permanently removes the task.
    fn delete(&self, item: &TaskItem) -> RepoResult<()>;
    /// Permanently removes the task with `id`.
    fn delete_by_id(&self, id: TaskId) -> RepoResult<()>;
    /// Incomplete tasks whose due date has passed, soonest-due first.
    fn get_overdue(&self) -> RepoResult<Vec<TaskItem>>;
    /// Tasks with `priority`, newest `created_at` first.
    fn get_by_priority(&self, priority: TaskPriority) -> RepoResult<Vec<TaskItem>>;
    /// Completed tasks, most recently updated first.
    fn get_completed(&self) -> RepoResult<Vec<TaskItem>>;
    /// Incomplete tasks by due date (undated last), then priority descending.
    fn get_pending(&self) -> RepoResult<Vec<TaskItem>>;
    /// Tasks due at or before `date` (epoch ms), soonest-due first.
    fn get_due_before(&self, date: i64) -> RepoResult<Vec<TaskItem>>;
    /// Number of persisted tasks.
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is incomplete.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_task_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_tasks<P: Params>(&self, tail_sql: &str, params: P) -> RepoResult<Vec<TaskItem>> {
        let mut stmt = self.conn.prepare(&format!("{TASK_SELECT_SQL} {tail_sql}"))?;
        let mut rows = stmt.query(params)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<TaskItem>> {
        let mut tasks = self.query_tasks("WHERE id = ?1;", [id])?;
        Ok(tasks.pop())
    }

    fn get_all(&self) -> RepoResult<Vec<TaskItem>> {
        self.query_tasks("ORDER BY created_at DESC, id DESC;", [])
    }

    fn add(&self, mut item: TaskItem) -> RepoResult<TaskItem> {
        if let Some(id) = item.id() {
            return Err(RepoError::AlreadyPersisted(id));
        }
        item.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                due_date,
                priority,
                is_completed,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.title(),
                item.description(),
                item.due_date(),
                item.priority().as_db(),
                i64::from(item.is_completed()),
                item.created_at(),
                item.updated_at(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        item.assign_id(id);
        info!("event=task_add module=repo status=ok id={id}");
        Ok(item)
    }

    fn update(&self, item: &TaskItem) -> RepoResult<()> {
        let id = item.id().ok_or(RepoError::NotPersisted)?;
        item.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                due_date = ?3,
                priority = ?4,
                is_completed = ?5,
                updated_at = ?6
             WHERE id = ?7;",
            params![
                item.title(),
                item.description(),
                item.due_date(),
                item.priority().as_db(),
                i64::from(item.is_completed()),
                item.updated_at(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=task_update module=repo status=ok id={id}");
        Ok(())
    }

    fn delete(&self, item: &TaskItem) -> RepoResult<()> {
        let id = item.id().ok_or(RepoError::NotPersisted)?;
        self.delete_by_id(id)
    }

    fn delete_by_id(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=task_delete module=repo status=ok id={id}");
        Ok(())
    }

    fn get_overdue(&self) -> RepoResult<Vec<TaskItem>> {
        let now = now_epoch_ms();
        debug!("event=task_query module=repo query=overdue now_ms={now}");
        self.query_tasks(
            "WHERE due_date IS NOT NULL
               AND due_date < ?1
               AND is_completed = 0
             ORDER BY due_date ASC, id ASC;",
            [now],
        )
    }

    fn get_by_priority(&self, priority: TaskPriority) -> RepoResult<Vec<TaskItem>> {
        self.query_tasks(
            "WHERE priority = ?1
             ORDER BY created_at DESC, id DESC;",
            [priority.as_db()],
        )
    }

    fn get_completed(&self) -> RepoResult<Vec<TaskItem>> {
        self.query_tasks(
            "WHERE is_completed = 1
             ORDER BY updated_at DESC, id DESC;",
            [],
        )
    }

    fn get_pending(&self) -> RepoResult<Vec<TaskItem>> {
        self.query_tasks(
            "WHERE is_completed = 0
             ORDER BY due_date IS NULL ASC, due_date ASC, priority DESC, id ASC;",
            [],
        )
    }

    fn get_due_before(&self, date: i64) -> RepoResult<Vec<TaskItem>> {
        self.query_tasks(
            "WHERE due_date IS NOT NULL
               AND due_date <= ?1
             ORDER BY due_date ASC, id ASC;",
            [date],
        )
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative task count `{count}`")))
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskItem> {
    let id: TaskId = row.get("id")?;

    let priority_value: i64 = row.get("priority")?;
    let priority = TaskPriority::from_db(priority_value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_value}` in tasks.priority (id={id})"
        ))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed (id={id})"
            )));
        }
    };

    Ok(TaskItem::from_storage(
        id,
        row.get("title")?,
        row.get("description")?,
        row.get("due_date")?,
        priority,
        is_completed,
        row.get("created_at")?,
        row.get("updated_at")?,
    ))
}

fn ensure_task_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "tasks")? {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }

    for column in TASK_COLUMNS {
        if !table_has_column(conn, "tasks", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
