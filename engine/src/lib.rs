//! banksim Engine
//!
//! The engine is the transfer-admission and execution pipeline: a
//! single manager serializes lock acquisition for each transfer's two
//! accounts, and a pool of executors performs the balance mutation once
//! both accounts are exclusively held.

pub mod config;
pub mod manager;
pub mod metrics;
pub mod pipeline;
pub mod pool;

pub use config::EngineConfig;
pub use manager::Manager;
pub use metrics::{EngineMetrics, MetricsSnapshot, SharedMetrics};
pub use pipeline::TransferPipeline;
pub use pool::ExecutorPool;
