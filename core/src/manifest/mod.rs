pub mod batch;
pub mod yaml;
