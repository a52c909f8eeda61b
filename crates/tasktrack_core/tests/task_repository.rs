use rusqlite::Connection;
use tasktrack_core::db::migrations::latest_version;
use tasktrack_core::db::open_db_in_memory;
use tasktrack_core::{
    now_epoch_ms, RepoError, SqliteTaskRepository, TaskItem, TaskPriority, TaskRepository,
    TaskValidationError,
};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn task(title: &str, due_date: Option<i64>, priority: TaskPriority) -> TaskItem {
    TaskItem::new(title, None, due_date, priority).unwrap()
}

fn titles(tasks: &[TaskItem]) -> Vec<&str> {
    tasks.iter().map(TaskItem::title).collect()
}

#[test]
fn add_assigns_positive_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let added = repo.add(TaskItem::with_title("Test Task").unwrap()).unwrap();

    assert!(added.id().unwrap() > 0);
    assert_eq!(added.title(), "Test Task");
}

#[test]
fn add_then_get_by_id_roundtrips_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut item = TaskItem::new(
        "Write report",
        Some("quarterly numbers"),
        Some(1_700_000_000_000),
        TaskPriority::High,
    )
    .unwrap();
    item.mark_complete();
    let added = repo.add(item).unwrap();

    let loaded = repo.get_by_id(added.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded, added);
}

#[test]
fn get_by_id_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    assert!(repo.get_by_id(999).unwrap().is_none());
}

#[test]
fn add_rejects_already_persisted_item() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let added = repo.add(TaskItem::with_title("once").unwrap()).unwrap();
    let id = added.id().unwrap();
    let err = repo.add(added).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyPersisted(existing) if existing == id));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn add_rejects_description_over_storage_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let long = "d".repeat(1001);
    let item = TaskItem::new("Task", Some(&long), None, TaskPriority::Medium).unwrap();
    let err = repo.add(item).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::DescriptionTooLong { .. })
    ));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn add_and_update_reject_unnormalized_deserialized_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let decode = |title: &str, description: Option<&str>| -> TaskItem {
        serde_json::from_value(serde_json::json!({
            "id": null,
            "created_at": 1_000,
            "updated_at": 1_000,
            "title": title,
            "description": description,
            "due_date": null,
            "priority": "medium",
            "is_completed": false,
        }))
        .unwrap()
    };

    let err = repo.add(decode("   padded   ", Some("   "))).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::UntrimmedTitle)
    ));
    let err = repo.add(decode("padded", Some("   "))).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::UnnormalizedDescription)
    ));
    let err = repo.add(decode("padded", Some(" notes"))).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::UnnormalizedDescription)
    ));
    assert_eq!(repo.count().unwrap(), 0);

    let stored = repo.add(decode("padded", Some("notes"))).unwrap();
    let mut json = serde_json::to_value(&stored).unwrap();
    json["title"] = serde_json::json!(" padded");
    let tampered: TaskItem = serde_json::from_value(json).unwrap();
    let err = repo.update(&tampered).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::UntrimmedTitle)
    ));
    let loaded = repo.get_by_id(stored.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded.title(), "padded");
    assert_eq!(loaded.description(), Some("notes"));
}

#[test]
fn completion_flag_is_stored_as_zero_or_one() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let stored_flag = |id: i64| -> i64 {
        conn.query_row("SELECT is_completed FROM tasks WHERE id = ?1", [id], |row| row.get(0))
            .unwrap()
    };

    let mut item = repo.add(TaskItem::with_title("flag").unwrap()).unwrap();
    let id = item.id().unwrap();
    assert_eq!(stored_flag(id), 0);

    item.mark_complete();
    repo.update(&item).unwrap();
    assert_eq!(stored_flag(id), 1);

    item.mark_incomplete();
    repo.update(&item).unwrap();
    assert_eq!(stored_flag(id), 0);
}

#[test]
fn get_all_returns_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    repo.add(TaskItem::with_title("Task 1").unwrap()).unwrap();
    repo.add(TaskItem::with_title("Task 2").unwrap()).unwrap();

    let all = repo.get_all().unwrap();
    assert_eq!(titles(&all), vec!["Task 2", "Task 1"]);
}

#[test]
fn update_persists_mutations_and_timestamps_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut item = repo.add(TaskItem::with_title("draft").unwrap()).unwrap();
    item.set_title("final").unwrap();
    item.set_description(Some("ready"));
    item.set_priority(TaskPriority::Low);
    item.set_due_date(Some(42));
    repo.update(&item).unwrap();

    let loaded = repo.get_by_id(item.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded, item);
}

#[test]
fn update_unknown_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let item = repo.add(TaskItem::with_title("gone").unwrap()).unwrap();
    repo.delete(&item).unwrap();

    let err = repo.update(&item).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if Some(id) == item.id()));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn update_and_delete_require_persisted_item() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let fresh = TaskItem::with_title("never added").unwrap();
    assert!(matches!(repo.update(&fresh), Err(RepoError::NotPersisted)));
    assert!(matches!(repo.delete(&fresh), Err(RepoError::NotPersisted)));
}

#[test]
fn delete_is_hard_and_second_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let item = repo.add(TaskItem::with_title("remove me").unwrap()).unwrap();
    let id = item.id().unwrap();
    repo.delete(&item).unwrap();

    assert!(repo.get_by_id(id).unwrap().is_none());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(rows, 0);
    assert!(matches!(repo.delete_by_id(id), Err(RepoError::NotFound(missing)) if missing == id));
}

#[test]
fn get_by_priority_filters_and_orders_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    repo.add(task("High Priority Task", None, TaskPriority::High)).unwrap();
    repo.add(task("Low Priority Task", None, TaskPriority::Low)).unwrap();
    repo.add(task("Another High Priority Task", None, TaskPriority::High)).unwrap();

    let high = repo.get_by_priority(TaskPriority::High).unwrap();
    assert_eq!(high.len(), 2);
    assert!(high.iter().all(|t| t.priority() == TaskPriority::High));
    assert_eq!(
        titles(&high),
        vec!["Another High Priority Task", "High Priority Task"]
    );
    assert!(high[0].created_at() >= high[1].created_at());
}

#[test]
fn overdue_task_leaves_overdue_list_once_completed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let yesterday = now_epoch_ms() - DAY_MS;
    let mut late = repo.add(task("late", Some(yesterday), TaskPriority::Medium)).unwrap();
    repo.add(task("future", Some(now_epoch_ms() + DAY_MS), TaskPriority::High)).unwrap();
    repo.add(task("undated", None, TaskPriority::High)).unwrap();

    let overdue = repo.get_overdue().unwrap();
    assert_eq!(titles(&overdue), vec!["late"]);

    late.mark_complete();
    repo.update(&late).unwrap();
    assert!(repo.get_overdue().unwrap().is_empty());
}

#[test]
fn get_overdue_orders_soonest_due_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let now = now_epoch_ms();
    repo.add(task("one day late", Some(now - DAY_MS), TaskPriority::Low)).unwrap();
    repo.add(task("three days late", Some(now - 3 * DAY_MS), TaskPriority::Low)).unwrap();

    let overdue = repo.get_overdue().unwrap();
    assert_eq!(titles(&overdue), vec!["three days late", "one day late"]);
}

#[test]
fn get_completed_orders_most_recently_updated_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut first = repo.add(TaskItem::with_title("first").unwrap()).unwrap();
    let mut second = repo.add(TaskItem::with_title("second").unwrap()).unwrap();
    repo.add(TaskItem::with_title("still open").unwrap()).unwrap();

    second.mark_complete();
    repo.update(&second).unwrap();
    first.mark_complete();
    repo.update(&first).unwrap();

    conn.execute(
        "UPDATE tasks SET updated_at = updated_at + 1000 WHERE id = ?1",
        [first.id().unwrap()],
    )
    .unwrap();

    let completed = repo.get_completed().unwrap();
    assert_eq!(titles(&completed), vec!["first", "second"]);
}

#[test]
fn completion_restamp_reaches_storage_without_delay() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut item = repo.add(TaskItem::with_title("quick").unwrap()).unwrap();
    let added_at = item.updated_at();
    item.mark_complete();
    repo.update(&item).unwrap();

    let loaded = repo.get_by_id(item.id().unwrap()).unwrap().unwrap();
    assert!(loaded.updated_at() > added_at);
    assert_eq!(loaded.created_at(), item.created_at());
}

#[test]
fn get_pending_sorts_by_due_date_then_priority_with_undated_last() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    repo.add(task("undated low", None, TaskPriority::Low)).unwrap();
    repo.add(task("later", Some(2_000), TaskPriority::Low)).unwrap();
    repo.add(task("soon low", Some(1_000), TaskPriority::Low)).unwrap();
    repo.add(task("soon high", Some(1_000), TaskPriority::High)).unwrap();
    repo.add(task("undated high", None, TaskPriority::High)).unwrap();
    let mut done = repo.add(task("done", Some(500), TaskPriority::High)).unwrap();
    done.mark_complete();
    repo.update(&done).unwrap();

    let pending = repo.get_pending().unwrap();
    assert_eq!(
        titles(&pending),
        vec!["soon high", "soon low", "later", "undated high", "undated low"]
    );
}

#[test]
fn get_due_before_is_inclusive_and_ignores_undated() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    repo.add(task("after", Some(3_000), TaskPriority::Medium)).unwrap();
    repo.add(task("exact", Some(2_000), TaskPriority::Medium)).unwrap();
    repo.add(task("before", Some(1_000), TaskPriority::Medium)).unwrap();
    repo.add(task("undated", None, TaskPriority::Medium)).unwrap();

    let due = repo.get_due_before(2_000).unwrap();
    assert_eq!(titles(&due), vec!["before", "exact"]);
}

#[test]
fn invalid_persisted_priority_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let item = repo.add(TaskItem::with_title("corrupt").unwrap()).unwrap();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
    conn.execute(
        "UPDATE tasks SET priority = 7 WHERE id = ?1",
        [item.id().unwrap()],
    )
    .unwrap();

    let err = repo.get_by_id(item.id().unwrap()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("priority")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_tasks_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version())).unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("tasks"))));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            priority INTEGER NOT NULL,
            is_completed INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version())).unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "tasks",
            column: "due_date"
        })
    ));
}
