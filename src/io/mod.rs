//! File input and output for jobs.
//!
//! - [`glob`] -- turning input arguments (files, directories, patterns) into files.
//! - [`compression`] -- transparent `.gz` decoding (feature `compression-gzip`).
//! - [`text`] -- line sources, count-line parsing and the output directory layout.

pub mod compression;
pub mod glob;
pub mod text;

pub use glob::{expand_glob, expand_inputs};
pub use text::{PART_FILE, SUCCESS_MARKER, parse_count_line, read_lines, write_output};
