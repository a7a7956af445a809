//! Tabular input and output: reading rows into [`Record`]s and writing
//! projected results back out as delimited text or a workbook.

pub mod record;
pub mod source;
pub mod writer;

pub use record::Record;
pub use source::{RowSource, TableFormat};
pub use writer::{write_failures, ResultWriter};
