//! Buffered batch writes: rows are queued one at a time and written as a single
//! multi-row INSERT / upsert statement per batch.

mod query_builder;
mod writer;

pub use query_builder::{
    build_insert_body, build_values_clause, StatementBuilder, StatementVariant,
};
pub use writer::{BatchError, BatchWriter};
