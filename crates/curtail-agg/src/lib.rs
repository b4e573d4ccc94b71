//! # curtail-agg: Curtailment Computation Core
//!
//! The four computation stages between raw telemetry and the persisted
//! monthly history:
//!
//! - [`normalize`] — timestamp parsing, numeric coercion and per-entity
//!   interval-duration estimation; bad rows are dropped, never fatal.
//! - [`curtail`] — per-interval curtailed and generated energy under the
//!   configured capacity variant and restriction policy.
//! - [`monthly`] — monthly totals per (period, entity[, restriction code])
//!   with a division-safe ratio, plus the company-level view.
//! - [`merge`] — the incremental replace-window merge into persisted history.
//!
//! [`pipeline`] wires the stages into one `update` run over a source feed.

pub mod curtail;
pub mod merge;
pub mod monthly;
pub mod normalize;
pub mod pipeline;

pub use curtail::{interval_energy, IntervalEnergy};
pub use merge::{merge_history, recompute_window};
pub use monthly::{aggregate_monthly, company_view};
pub use normalize::{normalize_samples, NormalizeOutcome};
pub use pipeline::{run_update, UpdateConfig, UpdateSummary};
