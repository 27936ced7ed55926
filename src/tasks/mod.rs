//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is in use.
//!
//! # Tasks
//! - Expiration sweep: removes expired entries at the configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
