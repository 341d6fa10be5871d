//! Comparative statistics over normalized reception records.
//!
//! Records are grouped by configuration and band, summarised, ranked within
//! each band, and shaped into a [`types::ComparisonReport`] together with
//! shared-edge histograms, a head-to-head view over common reporters, and a
//! cross-band summary.

pub mod aggregate;
pub mod analyzer;
pub mod grade;
pub mod histogram;
pub mod report;
pub mod types;
pub mod utility;
