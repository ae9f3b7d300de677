//! gtd-store: SQLite-backed `TaskStore`.
//!
//! One `tasks` table, one connection per store handle. Timestamps are RFC3339
//! text; `pre_task` is a foreign key into the same table.

use chrono::{DateTime, Utc};
use gtd_core::{
    Error, MergePlan, NewTask, Result, Task, TaskFilter, TaskId, TaskStore, TaskUpdate, ensure_mergeable,
    plan_merge,
};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    due_date TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    effort INTEGER NOT NULL DEFAULT 5,
    consequences INTEGER NOT NULL DEFAULT 5,
    desire INTEGER NOT NULL DEFAULT 5,
    repetitions INTEGER NOT NULL DEFAULT 1,
    score REAL NOT NULL,
    pre_task INTEGER REFERENCES tasks(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_completed_score ON tasks(completed, score DESC);
CREATE INDEX IF NOT EXISTS idx_tasks_pre_task ON tasks(pre_task);
";

const COLUMNS: &str = "id, title, description, due_date, completed, effort, consequences, desire, \
                       repetitions, score, pre_task, created_at, updated_at";

pub struct SqliteTaskStore {
    conn: Connection,
}

impl SqliteTaskStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| Error::Store(format!("open {}: {e}", path.display())))?;
        Self::init(conn)
    }

    /// In-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Store(format!("open in-memory: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Store(format!("enable foreign keys: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::Store(format!("create schema: {e}")))?;
        Ok(Self { conn })
    }

    fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        let due_date: Option<String> = row.get(3)?;
        let created_at: String = row.get(11)?;
        let updated_at: String = row.get(12)?;

        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            due_date: due_date.map(|s| parse_timestamp(3, &s)).transpose()?,
            completed: row.get(4)?,
            effort: row.get(5)?,
            consequences: row.get(6)?,
            desire: row.get(7)?,
            repetitions: row.get(8)?,
            score: row.get(9)?,
            pre_task: row.get(10)?,
            created_at: parse_timestamp(11, &created_at)?,
            updated_at: parse_timestamp(12, &updated_at)?,
        })
    }

    fn begin(&mut self, behavior: TransactionBehavior) -> Result<Transaction<'_>> {
        self.conn
            .transaction_with_behavior(behavior)
            .map_err(|e| Error::Store(format!("begin transaction: {e}")))
    }
}

fn parse_timestamp(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}

fn store_err(context: &str) -> impl Fn(rusqlite::Error) -> Error + '_ {
    move |e| Error::Store(format!("{context}: {e}"))
}

fn select_task(conn: &Connection, id: TaskId) -> Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        SqliteTaskStore::row_to_task,
    )
    .optional()
    .map_err(store_err("get task"))
}

/// Overwrite every mutable column of an existing row.
fn write_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3, completed = ?4,
             effort = ?5, consequences = ?6, desire = ?7, repetitions = ?8, score = ?9,
             pre_task = ?10, updated_at = ?11
         WHERE id = ?12",
        params![
            task.title,
            task.description,
            task.due_date.map(|d| d.to_rfc3339()),
            task.completed,
            task.effort,
            task.consequences,
            task.desire,
            task.repetitions,
            task.score,
            task.pre_task,
            task.updated_at.to_rfc3339(),
            task.id,
        ],
    )
    .map_err(store_err("write task"))?;
    Ok(())
}

impl TaskStore for SqliteTaskStore {
    fn create(&mut self, new: &NewTask, now: DateTime<Utc>) -> Result<TaskId> {
        new.validate()?;
        // id is assigned by SQLite; the placeholder is never written.
        let task = Task::from_new(0, new, now);

        self.conn
            .execute(
                "INSERT INTO tasks (title, description, due_date, completed, effort, consequences,
                     desire, repetitions, score, pre_task, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    task.title,
                    task.description,
                    task.due_date.map(|d| d.to_rfc3339()),
                    task.completed,
                    task.effort,
                    task.consequences,
                    task.desire,
                    task.repetitions,
                    task.score,
                    task.pre_task,
                    task.created_at.to_rfc3339(),
                    task.updated_at.to_rfc3339(),
                ],
            )
            .map_err(store_err("insert task"))?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, score = task.score, "created task");
        Ok(id)
    }

    fn get(&self, id: TaskId) -> Result<Option<Task>> {
        select_task(&self.conn, id)
    }

    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut sql = format!("SELECT {COLUMNS} FROM tasks");
        if filter.completed.is_some() {
            sql.push_str(" WHERE completed = ?1");
        }
        sql.push_str(" ORDER BY score DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql).map_err(store_err("list tasks"))?;
        let rows = match filter.completed {
            Some(completed) => stmt.query_map(params![completed], Self::row_to_task),
            None => stmt.query_map([], Self::row_to_task),
        }
        .map_err(store_err("list tasks"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_err("read task row"))
    }

    fn update(&mut self, id: TaskId, update: &TaskUpdate, now: DateTime<Utc>) -> Result<bool> {
        let tx = self.begin(TransactionBehavior::Immediate)?;
        let Some(mut task) = select_task(&tx, id)? else {
            return Ok(false);
        };
        task.apply(update, now)?;
        write_task(&tx, &task)?;
        tx.commit().map_err(store_err("commit update"))?;

        tracing::debug!(id, score = task.score, "updated task");
        Ok(true)
    }

    fn complete(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<bool> {
        let tx = self.begin(TransactionBehavior::Immediate)?;
        let Some(mut task) = select_task(&tx, id)? else {
            return Ok(false);
        };
        task.mark_completed(now);
        write_task(&tx, &task)?;
        tx.commit().map_err(store_err("commit completion"))?;
        Ok(true)
    }

    fn increase_repetition(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE tasks SET repetitions = repetitions + 1, score = score + 1, updated_at = ?1
                 WHERE id = ?2",
                params![now.to_rfc3339(), id],
            )
            .map_err(store_err("increase repetition"))?;
        Ok(changed > 0)
    }

    fn delete(&mut self, id: TaskId) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .map_err(store_err("delete task"))?;
        Ok(changed > 0)
    }

    fn apply_merge(&mut self, a: TaskId, b: TaskId) -> Result<MergePlan> {
        if a == b {
            return Err(Error::InvalidMerge(format!("task {a} merged with itself")));
        }

        // Dropping `tx` without commit rolls everything back. The write lock is
        // held from here, so the rows read below are the rows that get merged.
        let tx = self.begin(TransactionBehavior::Immediate)?;
        let first = select_task(&tx, a)?.ok_or(Error::NotFound(a))?;
        let second = select_task(&tx, b)?.ok_or(Error::NotFound(b))?;
        ensure_mergeable(&first)?;
        ensure_mergeable(&second)?;
        let plan = plan_merge(&first, &second);

        tx.execute(
            "UPDATE tasks SET pre_task = NULL WHERE id = ?1 AND pre_task = ?2",
            params![plan.keeper, plan.loser],
        )
        .map_err(store_err("merge: clear keeper prerequisite"))?;
        tx.execute(
            "UPDATE tasks SET pre_task = ?1 WHERE pre_task = ?2",
            params![plan.keeper, plan.loser],
        )
        .map_err(store_err("merge: re-point prerequisites"))?;
        tx.execute(
            "UPDATE tasks SET repetitions = repetitions + ?1, score = score + 1 WHERE id = ?2",
            params![plan.added_repetitions, plan.keeper],
        )
        .map_err(store_err("merge: update keeper"))?;
        tx.execute("DELETE FROM tasks WHERE id = ?1", params![plan.loser])
            .map_err(store_err("merge: delete loser"))?;

        tx.commit().map_err(store_err("commit merge"))?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn schema_is_idempotent() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        store.conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn unknown_pre_task_is_rejected() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let err = store
            .create(&NewTask::new("orphan").with_pre_task(999), now())
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(store.list(&TaskFilter::all()).unwrap().is_empty());
    }

    #[test]
    fn corrupt_timestamp_surfaces_as_store_error() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let id = store.create(&NewTask::new("x"), now()).unwrap();
        store
            .conn
            .execute("UPDATE tasks SET due_date = 'tomorrow' WHERE id = ?1", params![id])
            .unwrap();
        assert!(matches!(store.get(id), Err(Error::Store(_))));
    }

    #[test]
    fn update_of_missing_task_returns_false() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let update = TaskUpdate {
            effort: Some(1),
            ..Default::default()
        };
        assert!(!store.update(3, &update, now()).unwrap());
        assert!(!store.complete(3, now()).unwrap());
    }
}
