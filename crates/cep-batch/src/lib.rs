//! Configuration sweeps over one input data set.
//!
//! A [`SweepSpec`] names a baseline [`cep_core::ModelConfig`] and a list of
//! scenarios that override parts of it. [`run_sweep`] assembles and solves
//! every scenario on a rayon pool, records one [`SweepJobRecord`] per
//! scenario and writes a JSON [`SweepManifest`]. A failed or timed-out
//! scenario is recorded and the sweep carries on.

pub mod job;
pub mod manifest;
pub mod runner;
pub mod spec;

pub use job::{
    jobs_from_spec, BoundKeyword, BoundOverride, SweepJob, SweepJobRecord, SweepScenario,
};
pub use manifest::{load_sweep_manifest, write_sweep_manifest, SweepManifest};
pub use runner::{run_sweep, SweepRunnerConfig, SweepSummary};
pub use spec::SweepSpec;
