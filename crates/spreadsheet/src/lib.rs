//! Spreadsheet skills: build workbooks from JSON, convert to and from CSV,
//! summarize columns, diff two workbooks, and add filter/freeze formatting.

pub mod analyze;
pub mod compare;
pub mod convert;
pub mod create;
pub mod error;
pub mod filter;
pub mod read;
pub mod value;
mod write;

pub use {
    error::{Result, SheetError},
    value::{CellValue, Grid},
};
