//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod fact;
pub mod report;

pub use fact::*;
pub use report::*;
