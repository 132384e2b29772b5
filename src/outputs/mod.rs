//! Table export.
//!
//! - [`csv`]: flat `Outbreak, Date, Year, Month, Day, Description, Link` file
//! - [`json`]: every record field, including raw date, stage and error; also
//!   read back to resume a run

pub mod csv;
pub mod json;
