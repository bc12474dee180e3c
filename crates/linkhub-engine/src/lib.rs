//! # LinkHub Engine
//! The two background loops: the rotation engine that drains the link queue
//! on a timer, and the backup scheduler that archives the snapshot file.
//! Both are spawned once at startup and never exit on error.

pub mod backup;
pub mod rotation;

pub use backup::BackupScheduler;
pub use rotation::{CycleOutcome, RotationEngine};
