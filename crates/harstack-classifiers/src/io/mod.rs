//! Readers for delimited observation tables and writers for prediction files.
pub mod predictions;
pub mod table;

pub use predictions::{prediction_file_name, write_prediction_files};
pub use table::{read_table, read_table_with_config, LoaderConfig};
