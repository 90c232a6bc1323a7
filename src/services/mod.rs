// SPDX-License-Identifier: MIT

//! Domain services: the activity ledger and the analytics aggregator.

pub mod analytics;
pub mod ledger;

pub use analytics::{CategoryShare, ChartSeries, DaySummary, TimelineSegment};
pub use ledger::Ledger;
