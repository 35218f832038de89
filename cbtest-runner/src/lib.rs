//! cbtest runner — everything around the compiler that touches the outside.
//!
//! This crate builds on `cbtest-core` to provide:
//! - State documents (TOML/JSON) on disk
//! - API environment profiles (development/production)
//! - Explicit session holding the bearer credential
//! - Backtest engine client (HTTP) and response interpretation
//! - Compile + submit with 401 handling and an in-flight guard

pub mod config;
pub mod engine;
pub mod env;
pub mod session;
pub mod submit;

pub use config::{ConfigError, StateDocument};
pub use engine::{
    interpret_response, BacktestEngine, EngineResult, HttpEngine, PerformanceSummary, SubmitError,
};
pub use env::{ApiConfig, AppEnv};
pub use session::{Credential, Session};
pub use submit::{compile_and_submit, Submission, Submitter};
