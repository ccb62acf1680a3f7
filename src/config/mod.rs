//! Configuration models for runs and worker pools.

pub mod load;
pub mod pool;

pub use load::LoadConfig;
pub use pool::WorkerPoolConfig;
