use tracing::{debug, trace};

use super::query_builder::{StatementBuilder, StatementVariant};
use crate::database::{
    error::ConfigurationError, executor::StatementExecutor, fields::FieldSet,
    sql_value::SqlValue,
};
use crate::manifest::batch::BatchManifest;

#[derive(thiserror::Error, Debug)]
pub enum BatchError<E: std::error::Error + 'static> {
    #[error("Invalid batch configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("The number of values ({actual}) does not match the insert field count ({expected})")]
    Arity { expected: usize, actual: usize },

    #[error("Statement execution failed: {0}")]
    Execution(#[source] E),
}

/// Buffers rows and writes them as one multi-row statement per batch.
///
/// The full-size statement is prepared once at construction and executed every time
/// `batch_size` rows have been queued. `flush` writes whatever is left with a statement
/// sized to the remainder. Not safe to share across threads without external locking.
pub struct BatchWriter<E: StatementExecutor> {
    executor: E,
    builder: StatementBuilder,
    batch_size: usize,
    statement: E::Statement,
    statement_text: String,
    buffer: Vec<SqlValue>,
    buffered_rows: usize,
    total_queued: u64,
    affected_rows: u64,
}

impl<E: StatementExecutor> BatchWriter<E> {
    pub fn new(
        mut executor: E,
        batch_size: usize,
        table: impl Into<String>,
        fields: FieldSet,
        variant: StatementVariant,
    ) -> Result<Self, BatchError<E::Error>> {
        if batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize.into());
        }

        let builder =
            StatementBuilder::new(table, fields, variant, executor.placeholder_style())?;

        let statement_text = builder.build_statement_text(batch_size);
        trace!("Preparing {} row statement: {}", batch_size, statement_text);
        let statement = executor.prepare(&statement_text).map_err(BatchError::Execution)?;

        debug!(
            "Configured {} batch writer for {} with {} rows per statement",
            builder.variant().name(),
            builder.table(),
            batch_size
        );

        Ok(BatchWriter {
            executor,
            buffer: Vec::with_capacity(batch_size * builder.fields().arity()),
            builder,
            batch_size,
            statement,
            statement_text,
            buffered_rows: 0,
            total_queued: 0,
            affected_rows: 0,
        })
    }

    pub fn from_manifest(
        executor: E,
        manifest: &BatchManifest,
    ) -> Result<Self, BatchError<E::Error>> {
        let fields = manifest.field_set()?;
        let variant = manifest.statement_variant()?;
        Self::new(
            executor,
            manifest.operations_per_statement,
            manifest.table.clone(),
            fields,
            variant,
        )
    }

    /// Buffers one row. Returns `true` when the call wrote a batch to the database.
    ///
    /// A row with the wrong number of values is rejected before the buffer is touched. If
    /// an earlier batch failed to execute, it is retried before the row is accepted.
    pub fn queue(&mut self, row: Vec<SqlValue>) -> Result<bool, BatchError<E::Error>> {
        let expected = self.builder.fields().arity();
        if row.len() != expected {
            return Err(BatchError::Arity { expected, actual: row.len() });
        }

        let mut flushed = false;
        if self.buffered_rows == self.batch_size {
            self.execute_full_batch()?;
            flushed = true;
        }

        self.buffer.extend(row);
        self.buffered_rows += 1;
        self.total_queued += 1;

        if self.buffered_rows == self.batch_size {
            self.execute_full_batch()?;
            flushed = true;
        }

        Ok(flushed)
    }

    /// Writes every buffered row. Does nothing when the buffer is empty.
    pub fn flush(&mut self) -> Result<(), BatchError<E::Error>> {
        if self.buffered_rows == 0 {
            return Ok(());
        }

        if self.buffered_rows == self.batch_size {
            return self.execute_full_batch();
        }

        let query = self.builder.build_statement_text(self.buffered_rows);
        trace!("Preparing {} row statement: {}", self.buffered_rows, query);

        let mut statement =
            self.executor.prepare_transient(&query).map_err(BatchError::Execution)?;
        let affected = self
            .executor
            .execute(&mut statement, &self.buffer)
            .map_err(BatchError::Execution)?;

        debug!(
            "Flushed {} rows into {} ({} affected)",
            self.buffered_rows,
            self.builder.table(),
            affected
        );

        self.affected_rows += affected;
        self.clear_buffer();
        Ok(())
    }

    /// Drops buffered rows and zeroes every counter. The prepared statement stays usable.
    pub fn reset(&mut self) {
        self.clear_buffer();
        self.total_queued = 0;
        self.affected_rows = 0;
    }

    pub fn total_operations(&self) -> u64 {
        self.total_queued
    }

    pub fn flushed_operations(&self) -> u64 {
        self.total_queued - self.buffered_rows as u64
    }

    pub fn pending_operations(&self) -> usize {
        self.buffered_rows
    }

    pub fn affected_row_count(&self) -> u64 {
        self.affected_rows
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn table(&self) -> &str {
        self.builder.table()
    }

    /// Text of the prepared full-size statement.
    pub fn statement_text(&self) -> &str {
        &self.statement_text
    }

    pub fn builder(&self) -> &StatementBuilder {
        &self.builder
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Gives back the executor. Buffered rows that were never flushed are dropped.
    pub fn into_executor(self) -> E {
        self.executor
    }

    fn execute_full_batch(&mut self) -> Result<(), BatchError<E::Error>> {
        let affected = self
            .executor
            .execute(&mut self.statement, &self.buffer)
            .map_err(BatchError::Execution)?;

        debug!(
            "Wrote batch of {} rows into {} ({} affected)",
            self.batch_size,
            self.builder.table(),
            affected
        );

        self.affected_rows += affected;
        self.clear_buffer();
        Ok(())
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.buffered_rows = 0;
    }
}
