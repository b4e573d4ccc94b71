//! # curtail-core: Curtailment Statistics Data Model
//!
//! Shared types for the curtailment pipeline: the unified error type, the
//! calendar-month [`Period`] used as the aggregation unit, unit-safe power and
//! energy newtypes, and the row types that flow between the normalizer, the
//! calculator, the monthly aggregator and the merge engine.
//!
//! ## Pipeline shape
//!
//! ```text
//! raw rows -> RawSample -> IntervalRecord -> MonthlyAggregate -> history CSV
//! ```
//!
//! `RawSample` is the untyped row after column-alias resolution; everything
//! downstream is strongly typed. `MonthlyAggregate` is the persisted unit:
//! at most one row per (period, entity[, restriction code]).

pub mod error;
pub mod period;
pub mod record;
pub mod units;

pub use error::{CurtailError, CurtailResult};
pub use period::Period;
pub use record::{safe_ratio, IntervalRecord, MonthlyAggregate, RawSample};
pub use units::{Hours, MegawattHours, Megawatts};
