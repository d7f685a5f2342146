// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod feedback;
pub mod loader;
pub mod model;
pub mod persistence;
pub mod strategy;

pub use crate::config::EngineConfig;
pub use crate::core::context::Context;
pub use crate::core::engine::{DiagnosisEngine, Status};
pub use crate::core::types::{PredictionResult, UnknownSymptomWarning};
pub use crate::error::{DiagnosisError, DiagnosisResult};
