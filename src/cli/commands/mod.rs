//! Command implementations

pub mod check;
pub mod report;
pub mod stats;
