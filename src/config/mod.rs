//! Configuration module for loading simulation parameters.
//!
//! Physical constants, mode switches and integrator settings are kept in
//! separate structures so each can be serialised and validated on its own.

mod parameters;

pub use parameters::{
    ConfigError, IntegratorConfig, LaplacianKind, Options, Parameters, PressureMode,
};
