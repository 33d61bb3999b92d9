//! # cep-algo: capacity expansion model assembly and solve workflow
//!
//! Turns an [`InputData`](cep_core::InputData), a
//! [`ClusteredTimeSeries`](cep_core::ClusteredTimeSeries) and a
//! [`ModelConfig`](cep_core::ModelConfig) into a linear program, solves it
//! through a pluggable backend and packages the solved values.
//!
//! ## Pipeline
//!
//! | Stage | Type | Module |
//! |-------|------|--------|
//! | Index sets | [`IndexSets`] | [`sets`] |
//! | Declaration plan | [`DeclarationPlan`] | [`plan`] |
//! | Assembly | [`ModelBuilder`] → [`CepModel`] | [`model`] |
//! | Solve | [`GoodLpBackend`] via [`run_opt`] | [`backends`], [`run`] |
//! | Packaging | [`OptResult`] | [`result`] |
//!
//! The plan is fixed from the configuration before any array is allocated,
//! so the active constraint families can be listed in the result's
//! `model_info` without re-running assembly.
//!
//! ## Two-stage design and dispatch
//!
//! [`run_design_dispatch`] solves once for capacities on the clustered
//! series, then assembles a second, independent model over the dispatch
//! series (usually the full-resolution input) with those capacities pinned,
//! optionally scaled per technology, and finite slack prices to expose
//! operational shortfalls.
//!
//! ## Solvers
//!
//! Clarabel is always available. HiGHS is compiled in with the
//! `solver-highs` feature. Select at runtime with [`LpSolverKind`].

pub mod backends;
pub mod model;
pub mod plan;
pub mod result;
pub mod run;
pub mod sets;

pub use backends::{GoodLpBackend, LpSolverKind};
pub use model::{CepModel, ModelBuilder, ModelVariable};
pub use plan::{ConstraintFamily, DeclarationPlan};
pub use result::{OptResult, OptVariable};
pub use run::{run_design_dispatch, run_opt, solve_model, DesignDispatch, DispatchStage};
pub use sets::IndexSets;
