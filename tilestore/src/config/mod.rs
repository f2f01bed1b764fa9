//! Shared configuration helpers.

mod size;

pub use size::{format_size, parse_size, SizeParseError};
