//! The Lower Colorado River basin model.
//!
//! A basin is a directed chain of reservoirs ([`lake::Lake`]) joined by
//! river segments ([`reach::Reach`]). Each reach carries a constant annual
//! loss (reservoir evaporation plus channel/corridor loss) that gets
//! apportioned among the states and water users active in that reach and
//! every reach downstream of it, in proportion to trailing three-year
//! consumptive-use averages.
//!
//! The apportionment runs as a strict forward pipeline over the reach chain
//! ([`basin::Basin::model`]); each phase produces immutable result structs
//! ([`assessment`]) consumed by later phases and by reporting.

pub mod assessment;
pub mod basin;
pub mod lake;
pub mod lower_colorado;
pub mod reach;
pub mod registry;
