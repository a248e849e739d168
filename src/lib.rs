pub mod config;
pub mod engine;
pub mod metrics;

pub use config::EngineConfig;
pub use engine::{EngineStats, SyndicEngine};
pub use metrics::Metrics;
