//! # cep-core: data model for capacity expansion planning
//!
//! This crate holds everything the model assembler consumes:
//!
//! - [`NamedArray`]: dense arrays addressed by named, labelled axes
//! - [`InputData`]: technologies, node capacities, lines and the cost table
//! - [`ClusteredTimeSeries`]: representative periods, weights and series
//! - [`ModelConfig`]: the toggles of one model run
//! - [`CepError`]: the error taxonomy shared by all crates
//!
//! ## Quick Start
//!
//! ```
//! use cep_core::{Account, ClusteredTimeSeries, InputData, ModelConfig, NodeData, Technology};
//!
//! let data = InputData::builder("EUR")
//!     .tech(Technology::generation("gas", "el"))
//!     .node("n1")
//!     .node_data("gas", "n1", NodeData::new(0.0, Some(100.0)))
//!     .cost("gas", "n1", 2030, Account::Capital, "EUR", 600.0)
//!     .build()?;
//! let ts = ClusteredTimeSeries::new(vec![365.0], 24).with_flat_series("el_demand-n1", 50.0);
//! let config = ModelConfig::default().with_lost_load_price(10_000.0);
//! assert!(ts.validate().is_ok() && config.validate().is_ok());
//! # let _ = data;
//! # Ok::<(), cep_core::CepError>(())
//! ```

pub mod array;
pub mod config;
pub mod costs;
pub mod error;
pub mod input;
pub mod network;
pub mod tech;
pub mod timeseries;
pub mod variables;

pub use array::{Axis, Label, NamedArray};
pub use config::{FixedDesign, ModelConfig, StorageMode};
pub use costs::{Account, ImpactCategories, COST_AXES};
pub use error::{CepError, CepResult, SolveFailure};
pub use input::{InputData, InputDataBuilder};
pub use network::{LineData, NodeData};
pub use tech::{capital_recovery_factor, Efficiency, StoragePart, TechCategory, Technology};
pub use timeseries::{availability_key, demand_key, ClusteredTimeSeries};
pub use variables::{VariableKind, VariableName};
