//! Registration forms with schema validation, add-only tech rows and an
//! optional avatar upload to an object-storage bucket.

pub mod config;
pub mod error;
pub mod forms;
pub mod storage;
pub mod telemetry;
