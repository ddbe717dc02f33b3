//! alpr-script - scripting bindings for a license plate recognition engine
//!
//! Wraps an external ALPR engine behind a single-instance facade and exposes
//! it to rhai scripts. Recognition itself happens entirely inside the engine;
//! this crate validates arguments, manages the instance lifecycle and
//! forwards the engine's JSON results.

pub mod binding;
pub mod config;
pub mod engine;
pub mod facade;
pub mod results;
pub mod storage;

pub use binding::{register, BindingError, UsageError};
pub use engine::{AlprEngine, BackendFactory, EngineBackend, EngineError, EngineFactory, EngineOptions};
pub use facade::{AlprFacade, FacadeError};
pub use results::AlprResults;
