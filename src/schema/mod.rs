//! Input schema for care-log records
//!
//! Upstream payloads are parsed into [`RawLogRecord`] and validated into
//! [`crate::types::LogRecord`] by [`RecordAdapter`].

mod adapter;
mod raw_record;

pub use adapter::*;
pub use raw_record::*;
