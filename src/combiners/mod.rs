//! Built-in combiners for `combine_values` and `combine_globally`.
//!
//! - [`Sum`] -- total of `u64` counts; also the global reducer of count jobs.
//! - [`TopK`] -- the `k` highest-ranked [`TopKEntry`] values, built per
//!   partition as a [`BoundedTopK`] and merged by a [`TopKMergeReducer`].
//!
//! # Example
//! ```
//! use tagtally::*;
//!
//! let p = Pipeline::default();
//! let totals = from_vec(&p, vec![("a".to_string(), 1u64), ("a".to_string(), 2)])
//!     .combine_values(Sum)
//!     .collect_seq()?;
//! assert_eq!(totals, vec![("a".to_string(), 3)]);
//!
//! let top = from_vec(&p, vec![TopKEntry::new("x", 3), TopKEntry::new("y", 7)])
//!     .combine_globally(TopK::new(1)?)
//!     .collect_seq()?;
//! assert_eq!(top, vec![vec![TopKEntry::new("y", 7)]]);
//! # Ok::<_, anyhow::Error>(())
//! ```

mod sum;
mod topk;

pub use sum::{Sum, merge_counts};
pub use topk::{BoundedTopK, TopK, TopKEntry, TopKMergeReducer};
