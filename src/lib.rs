//! Read delimited astronomical catalogs into typed, immutable tables and
//! turn sexagesimal coordinates into plottable decimal degrees.

pub mod data;

pub use data::angle::{format_sexagesimal, parse_sexagesimal, wrap_angle, AngleUnit};
pub use data::error::{AngleParseError, TableError};
pub use data::model::{Column, ColumnData, ColumnType, SkippedRow, Table, Value};
pub use data::options::{Delimiter, MalformedRowPolicy, ReadOptions};
pub use data::reader::{read_file, read_lines, read_str};
