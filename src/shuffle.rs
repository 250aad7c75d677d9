//! Encoding of partial results as they cross a barrier.
//!
//! Whatever a partition hands to the reduce side is serialized here and
//! decoded again on the other side, the way a map task's output would be
//! written out and fetched by reducers. Decoding is where corrupted
//! intermediate state gets caught: a blob that does not parse as the
//! expected shape becomes [`TallyError::InvalidPartialResult`].

use crate::error::TallyError;
use crate::runner::CombinePolicy;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// One serialized partial result.
pub type Shuffled = Vec<u8>;

/// Serialize a partial result produced by `stage`.
pub(crate) fn encode<T: Serialize>(stage: &str, value: &T) -> Result<Shuffled, TallyError> {
    serde_json::to_vec(value).map_err(|e| TallyError::partial(stage, e.to_string()))
}

/// Decode a partial result received by `stage`.
pub(crate) fn decode<T: DeserializeOwned>(stage: &str, blob: &[u8]) -> Result<T, TallyError> {
    serde_json::from_slice(blob).map_err(|e| TallyError::partial(stage, e.to_string()))
}

/// Split one partition's elements into the runs a combiner sees separately.
///
/// `Never` yields one single-element run per emission, which is exactly what
/// the reduce side would get if no combiner existed.
pub(crate) fn combiner_runs<T>(items: Vec<T>, policy: CombinePolicy) -> Vec<Vec<T>> {
    match policy {
        CombinePolicy::Never => items.into_iter().map(|i| vec![i]).collect(),
        CombinePolicy::Once => vec![items],
        CombinePolicy::Spill(n) => {
            let mut runs = Vec::with_capacity(items.len().div_ceil(n.max(1)));
            let mut it = items.into_iter();
            loop {
                let run: Vec<T> = it.by_ref().take(n.max(1)).collect();
                if run.is_empty() {
                    break;
                }
                runs.push(run);
            }
            runs
        }
    }
}
