// src/process/mod.rs

pub mod aggregate;
pub mod filter;
pub mod header;
pub mod raw_table;
pub mod reshape;
pub mod schema;
pub mod utils;

pub use aggregate::combine;
pub use filter::FilterOptions;
pub use header::{normalize_header, CompositeHeader, DataColumn};
pub use raw_table::{Cell, RawSheet};
pub use reshape::reshape;
pub use schema::validate_columns;
