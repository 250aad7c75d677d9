//! The three end-to-end jobs: field counts, publication counts and top-K.
//!
//! Count jobs run `lines -> flat_map(extract) -> combine_values(Sum)` and
//! write their totals sorted by key. The top-K job reads such an output back,
//! parses each `key<TAB>count` line and folds everything through one global
//! [`TopK`] combine.

use crate::collection::PCollection;
use crate::combiners::{Sum, TopK, TopKEntry};
use crate::config::{JobConfig, check_k, check_tag, check_tags};
use crate::error::TallyResult;
use crate::extract::TagExtractor;
use crate::io::{expand_inputs, parse_count_line, read_lines, write_output};
use crate::pipeline::Pipeline;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which job to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Count the contents of one field tag (`<author>` by default).
    AuthorCount { tag: String },
    /// Count closing markers of publication-type tags.
    PublicationCount { tags: Vec<String> },
    /// The `k` keys with the highest counts in a count job's output.
    TopK { k: usize },
}

impl JobKind {
    /// Kind built from the defaults of `config`.
    pub fn author_count(config: &JobConfig) -> Self {
        Self::AuthorCount {
            tag: config.tag.clone(),
        }
    }

    pub fn publication_count(config: &JobConfig) -> Self {
        Self::PublicationCount {
            tags: config.publication_tags.clone(),
        }
    }

    pub fn top_k(config: &JobConfig) -> Self {
        Self::TopK { k: config.k }
    }

    /// Reject a kind no input could make sense of: empty or marker-like
    /// tags, an empty tag list, or `k = 0`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::AuthorCount { tag } => check_tag(tag),
            Self::PublicationCount { tags } => check_tags(tags),
            Self::TopK { k } => check_k(*k),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::AuthorCount { .. } => "author-count",
            Self::PublicationCount { .. } => "publication-count",
            Self::TopK { .. } => "top-k",
        }
    }
}

/// What a finished job did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobReport {
    pub job: &'static str,
    pub input_files: usize,
    pub records_written: usize,
    pub output: PathBuf,
}

/// Count every key `extractor` finds in `lines`.
///
/// Malformed records are dropped by the extractor and never reach the sum.
pub fn count_job(lines: PCollection<String>, extractor: TagExtractor) -> PCollection<(String, u64)> {
    lines
        .flat_map(move |line: &String| extractor.emissions(line))
        .combine_values(Sum)
}

/// The `k` highest counts among `key<TAB>count` lines, best first.
///
/// Blank lines are skipped; any other line that does not parse fails the
/// run with an invalid partial result. Fails up front when `k` is zero.
pub fn top_k_job(lines: PCollection<String>, k: usize) -> TallyResult<PCollection<Vec<TopKEntry>>> {
    let top = TopK::new(k)?;
    Ok(lines
        .filter(|line: &String| !line.trim().is_empty())
        .try_map(|line: &String| parse_count_line(line))
        .map(|(key, count): &(String, u64)| TopKEntry::new(key.clone(), *count))
        .combine_globally(top))
}

/// Run `kind` over `inputs` and write the result into `output`.
///
/// `kind` and `config` are validated and `output` must not exist yet; all
/// of it is checked before any input is read.
pub fn run<S: AsRef<str>>(
    kind: &JobKind,
    inputs: &[S],
    output: &Path,
    config: &JobConfig,
) -> Result<JobReport> {
    kind.validate()?;
    config.validate()?;
    if output.exists() {
        bail!("output directory {} already exists", output.display());
    }
    let started = Instant::now();
    let files = expand_inputs(inputs)?;
    debug!(job = kind.name(), files = files.len(), "resolved inputs");

    let p = Pipeline::default();
    let lines = read_lines(&p, &files)?;
    let runner = config.runner();

    let records_written = match kind {
        JobKind::AuthorCount { tag } => {
            let counts = count_job(lines, TagExtractor::field(tag));
            let rows = counts.collect_sorted_by_key_with(&runner)?;
            if rows.is_empty() {
                warn!(tag = %tag, "no field found in any input line");
            }
            write_output(output, &rows)?
        }
        JobKind::PublicationCount { tags } => {
            let counts = count_job(lines, TagExtractor::events(tags));
            let rows = counts.collect_sorted_by_key_with(&runner)?;
            if rows.is_empty() {
                warn!(tags = ?tags, "no publication end tag found in any input line");
            }
            write_output(output, &rows)?
        }
        JobKind::TopK { k } => {
            let ranked = top_k_job(lines, *k)?.collect_with(&runner)?;
            let rows: Vec<(String, u64)> = ranked
                .into_iter()
                .flatten()
                .map(TopKEntry::into_pair)
                .collect();
            if rows.len() < *k {
                warn!(k, found = rows.len(), "fewer distinct entries than k");
            }
            write_output(output, &rows)?
        }
    };

    info!(
        job = kind.name(),
        files = files.len(),
        records = records_written,
        output = %output.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "job finished"
    );
    Ok(JobReport {
        job: kind.name(),
        input_files: files.len(),
        records_written,
        output: output.to_path_buf(),
    })
}
