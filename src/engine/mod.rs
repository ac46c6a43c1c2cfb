//! Engine module housing the threaded monitoring session.
//!
//! `EngineHandle` connects any [`crate::source::FrameSource`] to the
//! distance monitor through a lock-free ring and exposes frame reports as
//! a broadcast stream.

pub mod core;

pub use core::{EngineHandle, DEFAULT_QUEUE_CAPACITY, REPORT_CHANNEL_CAPACITY};
