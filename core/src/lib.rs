//! Batches row-level inserts and upserts into size-bounded groups, writing each group as
//! one parameterized multi-row statement.
//!
//! ```no_run
//! use bulkdb::{sql_row, BatchWriter, FieldSet, SqliteExecutor, StatementVariant};
//!
//! let executor = SqliteExecutor::open("./accounts.db").unwrap();
//! let fields = FieldSet::new(["id", "balance"], ["id"], ["balance+amount"]).unwrap();
//! let mut writer =
//!     BatchWriter::new(executor, 500, "accounts", fields, StatementVariant::UpsertExcluded)
//!         .unwrap();
//!
//! writer.queue(sql_row![1, 10]).unwrap();
//! writer.flush().unwrap();
//! ```

mod database;
pub use database::{
    batch_operations::{
        build_insert_body, build_values_clause, BatchError, BatchWriter, StatementBuilder,
        StatementVariant,
    },
    error::ConfigurationError,
    executor::{PlaceholderStyle, StatementExecutor},
    expression::{compile_expressions, Dialect, ExpressionRule, Operator},
    fields::FieldSet,
    postgres::client::{
        connection_string as postgres_connection_string, PostgresConnectionError, PostgresError,
        PostgresExecutor,
    },
    postgres::sql_type_wrapper::WrongParameterType,
    sql_value::SqlValue,
    sqlite::client::{
        connection_string as sqlite_connection_string, SqliteConnectionError, SqliteError,
        SqliteExecutor, SqliteStatement,
    },
};

pub mod manifest;
pub use manifest::{
    batch::{BatchManifest, StatementKind},
    yaml::{parse_manifest, read_manifest, write_manifest, ReadManifestError, WriteManifestError},
};

mod logger;
pub use logger::{log_filter, setup_info_logger, setup_logger, LOG_TARGET};
