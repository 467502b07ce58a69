//! The transformation job run by the managed job engine.
//!
//! Input is raw delimited text with a header row. Rows with any empty field
//! are removed, column names are lowercased and the result is written as a
//! single Parquet file followed by a `_SUCCESS` marker.

mod args;
mod job;
mod record_set;
mod writer;

pub use args::{JobArguments, REQUIRED_ARGUMENTS};
pub use job::{TransformJob, TransformStats, SUCCESS_MARKER};
pub use record_set::RecordSet;
pub use writer::{codec, convert_to_parquet};
