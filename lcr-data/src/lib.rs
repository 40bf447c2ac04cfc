//! Time-series feed providers for the basin model.
//!
//! Retrieval and parsing of gage/report data live behind the narrow
//! [`feed::SeriesProvider`] seam: the model only ever sees already-reduced
//! annual acre-feet series. The shipped providers read local CSV feed files
//! ([`provider::CsvProvider`]) or pre-materialized in-memory series
//! ([`provider::MemoryProvider`]).

pub mod feed;
pub mod provider;
