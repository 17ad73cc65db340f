//! BookProbe Common Library
//!
//! Form records, shape validators, fixture tables and test-data generators
//! shared by the browser driver and the CLI. Nothing in here touches a
//! browser.

pub mod error;
pub mod fixtures;
pub mod generate;
pub mod types;
pub mod validate;

pub use error::{Error, Result};
pub use fixtures::{valid_record, CaseTable, PerformanceData, RapidSubmissions};
pub use types::*;
pub use validate::{is_valid_phone, is_valid_plate, is_valid_vin};

/// BookProbe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
