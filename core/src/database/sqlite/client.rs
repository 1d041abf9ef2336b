use std::{env, path::Path};

use dotenv::dotenv;
use rusqlite::{
    params_from_iter,
    types::{ToSqlOutput, Value, ValueRef},
    Connection, ToSql,
};
use tracing::{error, info};

use crate::database::{
    executor::{PlaceholderStyle, StatementExecutor},
    sql_value::SqlValue,
};

const DEFAULT_DATABASE_PATH: &str = "./bulkdb.db";

pub fn connection_string() -> Result<String, env::VarError> {
    dotenv().ok();
    // Default to ./bulkdb.db if DATABASE_URL is not set
    let connection =
        env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
    Ok(connection)
}

#[derive(thiserror::Error, Debug)]
pub enum SqliteConnectionError {
    #[error("The database connection string is wrong please check your environment: {0}")]
    DatabaseConnectionConfigWrong(#[from] env::VarError),

    #[error("Can not connect to the database please make sure your connection string is correct")]
    CanNotConnectToDatabase,
}

#[derive(thiserror::Error, Debug)]
pub enum SqliteError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            SqlValue::Bool(value) => ToSqlOutput::Owned(Value::Integer(i64::from(*value))),
            SqlValue::Int(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            SqlValue::Float(value) => ToSqlOutput::Owned(Value::Real(*value)),
            SqlValue::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            SqlValue::Bytes(value) => ToSqlOutput::Borrowed(ValueRef::Blob(value.as_slice())),
        })
    }
}

/// Statement handle for [`SqliteExecutor`]. A cached statement's compiled form lives in
/// the connection's statement cache; a transient one is compiled when it is executed.
#[derive(Debug, Clone)]
pub struct SqliteStatement {
    sql: String,
    cached: bool,
}

impl SqliteStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }
}

fn run_statement(
    statement: &mut rusqlite::Statement<'_>,
    params: &[SqlValue],
) -> Result<u64, SqliteError> {
    // RETURNING statements produce rows; count them instead of the change count
    if statement.column_count() > 0 {
        let mut rows = statement.query(params_from_iter(params.iter()))?;
        let mut returned = 0_u64;
        while rows.next()?.is_some() {
            returned += 1;
        }
        return Ok(returned);
    }

    let changed = statement.execute(params_from_iter(params.iter()))?;
    Ok(changed as u64)
}

/// Executes batches against a SQLite database.
pub struct SqliteExecutor {
    connection: Connection,
}

impl SqliteExecutor {
    pub fn new(connection: Connection) -> Self {
        SqliteExecutor { connection }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteConnectionError> {
        let path = path.as_ref();
        info!("Connecting to SQLite database at: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create parent directories for SQLite database: {}", e);
                    SqliteConnectionError::CanNotConnectToDatabase
                })?;
            }
        }

        let connection = Connection::open(path).map_err(|e| {
            error!("Error connecting to SQLite database: {}", e);
            SqliteConnectionError::CanNotConnectToDatabase
        })?;

        connection.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;").map_err(
            |e| {
                error!("Error setting SQLite pragmas: {}", e);
                SqliteConnectionError::CanNotConnectToDatabase
            },
        )?;

        Ok(SqliteExecutor { connection })
    }

    pub fn open_in_memory() -> Result<Self, SqliteConnectionError> {
        let connection = Connection::open_in_memory().map_err(|e| {
            error!("Error opening in-memory SQLite database: {}", e);
            SqliteConnectionError::CanNotConnectToDatabase
        })?;
        Ok(SqliteExecutor { connection })
    }

    /// Opens the database named by `DATABASE_URL`, or `./bulkdb.db` when unset.
    pub fn from_env() -> Result<Self, SqliteConnectionError> {
        let connection_str = connection_string()?;
        Self::open(connection_str)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn batch_execute(&self, sql: &str) -> Result<(), SqliteError> {
        self.connection.execute_batch(sql).map_err(SqliteError::SqliteError)
    }
}

impl StatementExecutor for SqliteExecutor {
    type Statement = SqliteStatement;
    type Error = SqliteError;

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionMark
    }

    fn prepare(&mut self, sql: &str) -> Result<SqliteStatement, SqliteError> {
        self.connection.prepare_cached(sql)?;
        Ok(SqliteStatement { sql: sql.to_string(), cached: true })
    }

    fn prepare_transient(&mut self, sql: &str) -> Result<SqliteStatement, SqliteError> {
        Ok(SqliteStatement { sql: sql.to_string(), cached: false })
    }

    fn execute(
        &mut self,
        statement: &mut SqliteStatement,
        params: &[SqlValue],
    ) -> Result<u64, SqliteError> {
        if statement.cached {
            let mut cached = self.connection.prepare_cached(&statement.sql)?;
            run_statement(&mut cached, params)
        } else {
            let mut transient = self.connection.prepare(&statement.sql)?;
            run_statement(&mut transient, params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_rejects_invalid_sql() {
        let mut executor = SqliteExecutor::open_in_memory().unwrap();
        assert!(executor.prepare("INSERT INTO missing (id) VALUES (?)").is_err());
    }

    #[test]
    fn test_execute_binds_every_value_type() {
        let mut executor = SqliteExecutor::open_in_memory().unwrap();
        executor
            .batch_execute("CREATE TABLE t (a INTEGER, b REAL, c TEXT, d BLOB, e INTEGER, f TEXT)")
            .unwrap();

        let mut statement = executor.prepare("INSERT INTO t VALUES (?, ?, ?, ?, ?, ?)").unwrap();
        let params = crate::sql_row![7, 1.5, "text", vec![1_u8, 2], true, None::<String>];
        assert_eq!(executor.execute(&mut statement, &params).unwrap(), 1);

        let (a, b, c, d, e, f): (i64, f64, String, Vec<u8>, i64, Option<String>) = executor
            .connection()
            .query_row("SELECT a, b, c, d, e, f FROM t", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
            })
            .unwrap();

        assert_eq!((a, b, c.as_str(), d, e, f), (7, 1.5, "text", vec![1, 2], 1, None));
    }

    #[test]
    fn test_transient_statement_is_compiled_on_execute() {
        let mut executor = SqliteExecutor::open_in_memory().unwrap();
        executor.batch_execute("CREATE TABLE t (id INTEGER)").unwrap();

        let mut cached = executor.prepare("INSERT INTO t VALUES (?)").unwrap();
        let mut transient = executor.prepare_transient("INSERT INTO t VALUES (?), (?)").unwrap();
        assert!(cached.is_cached());
        assert!(!transient.is_cached());

        assert_eq!(executor.execute(&mut transient, &crate::sql_row![1, 2]).unwrap(), 2);
        assert_eq!(executor.execute(&mut cached, &crate::sql_row![3]).unwrap(), 1);

        let mut broken = executor.prepare_transient("INSERT INTO missing VALUES (?)").unwrap();
        assert!(executor.execute(&mut broken, &crate::sql_row![4]).is_err());
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("batch.db");

        let executor = SqliteExecutor::open(&path).unwrap();
        executor.batch_execute("CREATE TABLE t (id INTEGER)").unwrap();

        assert!(path.exists());
    }
}
