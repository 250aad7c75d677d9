//! # tagtally
//!
//! Frequency counting and top-K ranking over line-oriented bibliography
//! dumps, run as small partitioned batch jobs.
//!
//! Three jobs ship with the crate (see [`jobs`]):
//! - **author-count**: the text inside a field tag (`<author>` by default),
//!   counted per distinct value.
//! - **publication-count**: closing publication tags (`</article>`, ...),
//!   counted per tag name.
//! - **top-k**: the K highest counts in a count job's output.
//!
//! ## Quick Start
//!
//! ```
//! use tagtally::*;
//!
//! let p = Pipeline::default();
//! let lines = from_vec(&p, vec![
//!     "<author>Jane Doe</author>".to_string(),
//!     "<author>Ed Codd</author>".to_string(),
//!     "<author>Jane Doe</author>".to_string(),
//! ]);
//!
//! let counts = count_job(lines, TagExtractor::field("author")).collect_par_sorted(None, Some(2))?;
//! assert_eq!(counts, vec![("Ed Codd".to_string(), 1), ("Jane Doe".to_string(), 2)]);
//! # Ok::<_, anyhow::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! ### Pipeline
//!
//! A [`Pipeline`] holds the computation graph. Sources such as [`from_vec`]
//! or [`read_lines`] attach to it and return a [`PCollection<T>`]; transforms
//! on a collection append nodes and hand back a new collection. Nothing runs
//! until one of the collect methods is called.
//!
//! ### Transforms
//!
//! Element-wise:
//! - [`map`](PCollection::map), [`filter`](PCollection::filter),
//!   [`flat_map`](PCollection::flat_map)
//! - [`try_map`](PCollection::try_map), which fails the run on the first error
//!
//! Keyed and global barriers:
//! - [`key_by`](PCollection::key_by) and [`map_values`](PCollection::map_values)
//! - [`group_by_key`](PCollection::group_by_key)
//! - [`combine_values`](PCollection::combine_values) with a [`CombineFn`]
//! - [`combine_globally`](PCollection::combine_globally), always exactly one output
//!
//! ### Execution
//!
//! A [`Runner`] splits the source into partitions, runs the element-wise
//! steps of each partition independently and serializes partial results at
//! every barrier. [`CombinePolicy`] decides how many times the combiner runs
//! on the map side; every policy yields the same result.
//!
//! ## Errors
//!
//! Engine and job entry points return [`anyhow::Result`]. The failures the
//! jobs name are [`TallyError`] values inside it:
//! - [`TallyError::MalformedRecord`]: dropped by the extractor, never fatal.
//! - [`TallyError::InvalidPartialResult`]: corrupted intermediate state.
//! - [`TallyError::CapacityViolation`]: top-K asked for `k = 0`.

pub mod collection;
pub mod combiners;
pub mod config;
pub mod error;
pub mod extract;
mod helpers;
pub mod io;
pub mod jobs;
mod node;
pub mod node_id;
pub mod pipeline;
pub mod runner;
mod shuffle;
pub mod type_token;

pub use collection::{CombineFn, PCollection, RFBound, from_iter, from_vec};
pub use combiners::{BoundedTopK, Sum, TopK, TopKEntry, TopKMergeReducer, merge_counts};
pub use config::{DEFAULT_K, JobConfig};
pub use error::{TallyError, TallyResult};
pub use extract::{Emission, PUBLICATION_TAGS, TagExtractor};
pub use io::{expand_inputs, parse_count_line, read_lines, write_output};
pub use jobs::{JobKind, JobReport, count_job, run, top_k_job};
pub use node_id::NodeId;
pub use pipeline::Pipeline;
pub use runner::{CombinePolicy, ExecMode, Runner};
pub use shuffle::Shuffled;
pub use type_token::Partition;
