//! Background Tasks Module
//!
//! Contains background tasks owned by the admission components.
//!
//! # Tasks
//! - Expiry sweep: drops expired cache entries and elapsed rate-limit windows

mod sweep;

pub use sweep::{spawn_sweep_task, Sweep};
