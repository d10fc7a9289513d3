//! Input/output helpers.
//!
//! - `year;hdi;tap` ingest (`ingest`)
//! - entries → weighted observations per year (`observations`)
//! - JSON export of fit results (`export`)

pub mod export;
pub mod ingest;
pub mod observations;

pub use export::*;
pub use ingest::*;
pub use observations::*;
