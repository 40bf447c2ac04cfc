//! Fundamental types for the Lower Colorado River loss-assessment model:
//! annual acre-feet series and their arithmetic, water-year reduction of
//! dated records, and the shared model error type.

pub mod annual;
pub mod error;
pub mod water_year;
