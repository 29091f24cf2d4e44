pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod source;
pub mod table;

pub use catalog::{Indicator, IndicatorCatalog, Variable};
pub use config::Config;
pub use error::WgiError;
pub use pipeline::{load_all, load_indicator, LoadOptions};
pub use process::FilterOptions;
pub use source::{MemorySource, RawTableSource, SheetRef, WorkbookSource};
pub use table::{LongRecord, LongTable};
