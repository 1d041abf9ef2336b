use std::{env, time::Duration};

use dotenv::dotenv;
use tokio::{runtime::Runtime, time::timeout};
use tokio_postgres::{types::ToSql, Client, Error as PgError, NoTls, Statement};
use tracing::{error, info};

use crate::database::{
    executor::{PlaceholderStyle, StatementExecutor},
    sql_value::SqlValue,
};

pub fn connection_string() -> Result<String, env::VarError> {
    dotenv().ok();
    let connection = env::var("DATABASE_URL")?;
    Ok(connection)
}

#[derive(thiserror::Error, Debug)]
pub enum PostgresConnectionError {
    #[error("The database connection string is wrong please check your environment: {0}")]
    DatabaseConnectionConfigWrong(#[from] env::VarError),

    #[error("Could not start the postgres runtime: {0}")]
    CouldNotStartRuntime(#[from] std::io::Error),

    #[error("Can not connect to the database please make sure your connection string is correct")]
    CanNotConnectToDatabase,
}

#[derive(thiserror::Error, Debug)]
pub enum PostgresError {
    #[error("PgError {0}")]
    PgError(#[from] PgError),
}

/// Executes batches against PostgreSQL.
///
/// `tokio-postgres` is asynchronous, so the executor owns a current-thread runtime and
/// blocks on every call. The connection task is driven while a call is in flight.
pub struct PostgresExecutor {
    runtime: Runtime,
    client: Client,
}

impl PostgresExecutor {
    pub fn connect(connection_str: &str) -> Result<Self, PostgresConnectionError> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        let (client, connection) = runtime.block_on(async {
            let connect = tokio_postgres::connect(connection_str, NoTls);
            match timeout(Duration::from_millis(5000), connect).await {
                Ok(Ok(pair)) => Ok(pair),
                Ok(Err(e)) => {
                    error!("Error connecting to database: {}", e);
                    Err(PostgresConnectionError::CanNotConnectToDatabase)
                }
                Err(e) => {
                    error!("Timeout connecting to database: {}", e);
                    Err(PostgresConnectionError::CanNotConnectToDatabase)
                }
            }
        })?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!("Postgres connection closed with error: {}", e);
            }
        });

        info!("Connected to postgres");

        Ok(PostgresExecutor { runtime, client })
    }

    /// Connects using `DATABASE_URL` (a `.env` file is loaded first if present).
    pub fn from_env() -> Result<Self, PostgresConnectionError> {
        let connection_str = connection_string()?;
        Self::connect(&connection_str)
    }

    pub fn batch_execute(&self, sql: &str) -> Result<(), PostgresError> {
        self.runtime.block_on(self.client.batch_execute(sql)).map_err(PostgresError::PgError)
    }
}

impl StatementExecutor for PostgresExecutor {
    type Statement = Statement;
    type Error = PostgresError;

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn prepare(&mut self, sql: &str) -> Result<Statement, PostgresError> {
        self.runtime.block_on(self.client.prepare(sql)).map_err(PostgresError::PgError)
    }

    fn execute(
        &mut self,
        statement: &mut Statement,
        params: &[SqlValue],
    ) -> Result<u64, PostgresError> {
        let params: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|param| param as &(dyn ToSql + Sync)).collect();

        self.runtime
            .block_on(self.client.execute(&*statement, &params))
            .map_err(PostgresError::PgError)
    }
}
