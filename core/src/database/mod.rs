pub mod batch_operations;
pub mod error;
pub mod executor;
pub mod expression;
pub mod fields;
pub mod postgres;
pub mod sql_value;
pub mod sqlite;
