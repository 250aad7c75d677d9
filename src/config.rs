//! Job settings loaded from TOML and overridden from the command line.
//!
//! ```toml
//! tag = "editor"
//! publication_tags = ["article", "book"]
//! k = 10
//! partitions = 16
//! threads = 4
//! combine = "spill:10000"
//! ```
//!
//! Every key is optional; missing keys keep their [`Default`] values.

use crate::error::TallyError;
use crate::extract::PUBLICATION_TAGS;
use crate::runner::{CombinePolicy, ExecMode, Runner};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

/// Default number of entries kept by the top-K job.
pub const DEFAULT_K: usize = 5;

/// Tunables shared by every job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Field tag counted by the author-count job.
    pub tag: String,
    /// End tags counted by the publication-count job.
    pub publication_tags: Vec<String>,
    /// Number of entries kept by the top-K job.
    pub k: usize,
    /// Run as one partition on the calling thread.
    pub sequential: bool,
    /// Partition count for parallel runs.
    pub partitions: Option<usize>,
    /// Dedicated worker threads for parallel runs.
    pub threads: Option<usize>,
    pub combine: CombinePolicy,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            tag: "author".to_string(),
            publication_tags: PUBLICATION_TAGS.iter().map(|t| (*t).to_string()).collect(),
            k: DEFAULT_K,
            sequential: false,
            partitions: None,
            threads: None,
            combine: CombinePolicy::default(),
        }
    }
}

impl JobConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("parse job config")?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Reject settings no job could run with.
    pub fn validate(&self) -> Result<()> {
        check_tag(&self.tag)?;
        check_tags(&self.publication_tags)?;
        check_k(self.k)?;
        if self.partitions == Some(0) {
            bail!("partitions must be at least 1");
        }
        if self.threads == Some(0) {
            bail!("threads must be at least 1");
        }
        Ok(())
    }

    /// The runner these settings describe.
    #[must_use]
    pub fn runner(&self) -> Runner {
        let mode = if self.sequential {
            ExecMode::Sequential
        } else {
            ExecMode::Parallel {
                threads: self.threads,
                partitions: self.partitions,
            }
        };
        Runner {
            mode,
            combine: self.combine,
            ..Runner::default()
        }
    }
}

pub(crate) fn check_tags(tags: &[String]) -> Result<()> {
    if tags.is_empty() {
        bail!("publication tags must name at least one tag");
    }
    tags.iter().try_for_each(|t| check_tag(t))
}

pub(crate) fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(TallyError::CapacityViolation { k }.into());
    }
    Ok(())
}

pub(crate) fn check_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        bail!("tag names must not be empty");
    }
    if tag.contains(['<', '>', '/']) {
        bail!("tag name {tag:?} must not contain '<', '>' or '/'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_default() -> Result<()> {
        let config = JobConfig::from_toml_str("")?;
        assert_eq!(config, JobConfig::default());
        assert_eq!(config.k, 5);
        assert_eq!(config.tag, "author");
        assert_eq!(
            config.publication_tags,
            vec!["article", "inproceedings", "phdthesis", "masterthesis"]
        );
        config.validate()
    }

    #[test]
    fn every_key_is_read() -> Result<()> {
        let config = JobConfig::from_toml_str(
            r#"
            tag = "editor"
            publication_tags = ["book"]
            k = 3
            sequential = true
            partitions = 7
            threads = 2
            combine = "spill:100"
            "#,
        )?;
        assert_eq!(config.tag, "editor");
        assert_eq!(config.publication_tags, vec!["book"]);
        assert_eq!(config.k, 3);
        assert_eq!(config.partitions, Some(7));
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.combine, CombinePolicy::Spill(100));
        assert_eq!(config.runner().mode, ExecMode::Sequential);
        Ok(())
    }

    #[test]
    fn unknown_keys_and_policies_are_rejected() {
        assert!(JobConfig::from_toml_str("tags = 3").is_err());
        assert!(JobConfig::from_toml_str("combine = \"spill:0\"").is_err());
    }

    #[test]
    fn zero_k_is_a_capacity_violation() {
        let config = JobConfig {
            k: 0,
            ..JobConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TallyError>(),
            Some(TallyError::CapacityViolation { k: 0 })
        ));
    }

    #[test]
    fn bad_tags_are_rejected() {
        for config in [
            JobConfig {
                tag: String::new(),
                ..JobConfig::default()
            },
            JobConfig {
                tag: "<author>".to_string(),
                ..JobConfig::default()
            },
            JobConfig {
                publication_tags: Vec::new(),
                ..JobConfig::default()
            },
        ] {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn parallel_runner_carries_partitions_and_threads() {
        let config = JobConfig {
            partitions: Some(4),
            threads: Some(2),
            combine: CombinePolicy::Never,
            ..JobConfig::default()
        };
        let runner = config.runner();
        assert_eq!(
            runner.mode,
            ExecMode::Parallel {
                threads: Some(2),
                partitions: Some(4)
            }
        );
        assert_eq!(runner.combine, CombinePolicy::Never);
    }
}
