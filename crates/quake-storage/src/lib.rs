//! Event table sources for the range query executor

pub mod csv;
pub mod memory;

pub use csv::CsvDataSource;
pub use memory::MemoryDataSource;
