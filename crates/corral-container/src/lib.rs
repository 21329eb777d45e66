//! Container lifecycle management for Corral.
//!
//! A container wraps a pluggable backend (the "interior") behind a
//! lifecycle engine that reconciles user intent with the state the
//! backend actually reports. This crate contains:
//!
//! - the state vocabulary ([`state`]),
//! - the pure transition table ([`transition`]),
//! - the per-container lifecycle engine ([`engine`]),
//! - the interior contract ([`interior`]),
//! - the registry that maps ids to engines and feeds the pub/sub bus
//!   ([`registry`]).
//!
//! Interior implementations live elsewhere (see `corral-core` for the
//! built-in process supervisor); tests in this crate use scripted mocks.

pub mod config;
pub mod engine;
pub mod error;
pub mod interior;
pub mod registry;
pub mod state;
pub mod transition;

pub use config::ContainerConfig;
pub use engine::{Engine, EngineEvent, Snapshot};
pub use error::{ContainerError, Result};
pub use interior::{ActionOpts, DynInterior, Interior, InteriorError, InteriorFactory, Monitor};
pub use registry::{BusEvent, Registry};
pub use state::{ContainerId, ContainerState, StableState};
pub use transition::{plan, Action, Plan};
