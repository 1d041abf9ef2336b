pub mod client;
pub mod sql_type_wrapper;
