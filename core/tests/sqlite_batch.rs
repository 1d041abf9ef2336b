use bulkdb::{
    sql_row, BatchError, BatchWriter, FieldSet, SqliteExecutor, StatementExecutor,
    StatementVariant,
};

fn executor_with(schema: &str) -> SqliteExecutor {
    let executor = SqliteExecutor::open_in_memory().unwrap();
    executor.batch_execute(schema).unwrap();
    executor
}

fn count_rows(executor: &SqliteExecutor, table: &str) -> i64 {
    executor
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_batches_of_three() {
    let executor = executor_with("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)");
    let mut writer = BatchWriter::new(
        executor,
        3,
        "users",
        FieldSet::insert_only(["id", "name"]).unwrap(),
        StatementVariant::insert_do_nothing(),
    )
    .unwrap();

    assert!(!writer.queue(sql_row![1, "a"]).unwrap());
    assert!(!writer.queue(sql_row![2, "b"]).unwrap());
    assert_eq!(count_rows(writer.executor(), "users"), 0);

    assert!(writer.queue(sql_row![3, "c"]).unwrap());
    assert_eq!(writer.statement_text().matches("(?, ?)").count(), 3);
    assert_eq!(writer.affected_row_count(), 3);
    assert_eq!(count_rows(writer.executor(), "users"), 3);

    writer.queue(sql_row![4, "d"]).unwrap();
    writer.flush().unwrap();

    assert_eq!(writer.total_operations(), 4);
    assert_eq!(writer.flushed_operations(), 4);
    assert_eq!(writer.pending_operations(), 0);
    assert_eq!(writer.affected_row_count(), 4);
    assert_eq!(count_rows(writer.executor(), "users"), 4);
}

#[test]
fn test_conflicting_rows_are_skipped() {
    let executor = executor_with(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO users (id, name) VALUES (1, 'existing');",
    );
    let mut writer = BatchWriter::new(
        executor,
        10,
        "users",
        FieldSet::insert_only(["id", "name"]).unwrap(),
        StatementVariant::insert_do_nothing(),
    )
    .unwrap();

    writer.queue(sql_row![1, "dup"]).unwrap();
    writer.queue(sql_row![2, "new"]).unwrap();
    writer.flush().unwrap();

    assert_eq!(writer.affected_row_count(), 1);

    let name: String = writer
        .executor()
        .connection()
        .query_row("SELECT name FROM users WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "existing");
}

#[test]
fn test_returning_counts_inserted_rows() {
    let executor = executor_with(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO users (id, name) VALUES (1, 'existing');",
    );
    let mut writer = BatchWriter::new(
        executor,
        2,
        "users",
        FieldSet::insert_only(["id", "name"]).unwrap(),
        StatementVariant::InsertDoNothing { returning: vec!["id".to_string()] },
    )
    .unwrap();

    assert!(writer.statement_text().ends_with("ON CONFLICT DO NOTHING RETURNING id"));

    writer.queue(sql_row![1, "dup"]).unwrap();
    assert!(writer.queue(sql_row![2, "b"]).unwrap());
    writer.queue(sql_row![3, "c"]).unwrap();
    writer.flush().unwrap();

    assert_eq!(writer.affected_row_count(), 2);
    assert_eq!(count_rows(writer.executor(), "users"), 3);
}

#[test]
fn test_upsert_applies_expression_rules() {
    let executor = executor_with(
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY, name TEXT, balance INTEGER, amount INTEGER);
         INSERT INTO accounts (id, name, balance, amount) VALUES (1, 'old', 10, 5);",
    );
    let mut writer = BatchWriter::new(
        executor,
        2,
        "accounts",
        FieldSet::new(["id", "name", "balance", "amount"], ["id"], ["name", "balance+amount"])
            .unwrap(),
        StatementVariant::UpsertExcluded,
    )
    .unwrap();

    writer.queue(sql_row![1, "new", 100, 0]).unwrap();
    assert!(writer.queue(sql_row![2, "fresh", 7, 3]).unwrap());

    let rows: Vec<(i64, String, i64, i64)> = {
        let connection = writer.executor().connection();
        let mut statement = connection
            .prepare("SELECT id, name, balance, amount FROM accounts ORDER BY id")
            .unwrap();
        let mapped = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .unwrap();
        mapped.collect::<Result<_, _>>().unwrap()
    };

    assert_eq!(
        rows,
        vec![(1, "new".to_string(), 105, 5), (2, "fresh".to_string(), 7, 3)]
    );
}

#[test]
fn test_execution_error_keeps_rows_buffered() {
    let executor =
        executor_with("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)");
    let mut writer = BatchWriter::new(
        executor,
        5,
        "users",
        FieldSet::insert_only(["id", "name"]).unwrap(),
        StatementVariant::insert_do_nothing(),
    )
    .unwrap();

    writer.queue(sql_row![1, None::<String>]).unwrap();
    let err = writer.flush().unwrap_err();

    assert!(matches!(err, BatchError::Execution(_)));
    assert_eq!(writer.pending_operations(), 1);
    assert_eq!(writer.affected_row_count(), 0);

    writer.reset();
    writer.queue(sql_row![1, "ok"]).unwrap();
    writer.flush().unwrap();
    assert_eq!(count_rows(writer.executor(), "users"), 1);
}

#[test]
fn test_prepare_fails_for_unknown_table() {
    let mut executor = SqliteExecutor::open_in_memory().unwrap();
    assert!(executor.prepare("INSERT INTO nowhere (id) VALUES (?)").is_err());

    let result = BatchWriter::new(
        executor,
        5,
        "nowhere",
        FieldSet::insert_only(["id"]).unwrap(),
        StatementVariant::insert_do_nothing(),
    );
    assert!(matches!(result, Err(BatchError::Execution(_))));
}
