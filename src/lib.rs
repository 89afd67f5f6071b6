//! Bikeshare trip explorer: load a city's trips, filter them by month, day,
//! time of day and bike type, and compute descriptive statistics.

pub mod config;
pub mod data;
pub mod error;
pub mod pager;
pub mod report;
pub mod session;
pub mod stats;
