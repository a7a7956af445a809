use std::path::Path;

use paperlens::config::{parse_column_list, scaffold_output_columns};
use paperlens::table::TableFormat;
use paperlens::RowSource;

use super::Outcome;

/// Prints the header columns of `table`, one per line.
pub fn columns(table: &Path) -> paperlens::Result<Outcome> {
    let headers = RowSource::headers(table, TableFormat::from_path(table))?;
    for (i, name) in headers.iter().enumerate() {
        println!("{:>3}  {}", i + 1, name);
    }
    Ok(Outcome::Done)
}

pub fn scaffold(columns: &str) -> paperlens::Result<Outcome> {
    let columns = parse_column_list(columns);
    if columns.is_empty() {
        return Err(paperlens::ConfigError::Validation {
            message: "--columns must name at least one column".to_string(),
        }
        .into());
    }
    println!("{}", scaffold_output_columns(&columns));
    Ok(Outcome::Done)
}
