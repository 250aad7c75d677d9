//! Resolving input arguments into the list of files a job reads.
//!
//! An input may be:
//! - a plain file path,
//! - a directory, meaning every visible file directly inside it (the layout
//!   a previous job's output directory has),
//! - a glob pattern such as `dumps/*.xml.gz`.
//!
//! Files whose name starts with `_` or `.` (`_SUCCESS`, editor droppings)
//! are skipped when expanding directories and patterns. Results are sorted
//! and de-duplicated so repeated runs see the same partition layout.

use anyhow::{Context, Result, bail};
use glob::glob;
use std::fs::read_dir;
use std::path::{Path, PathBuf};

/// Expand a glob pattern into the sorted list of matching visible files.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() && is_visible(&path) {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// Resolve every input argument; zero resulting files is an error.
pub fn expand_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let path = Path::new(input);
        if path.is_dir() {
            files.extend(list_dir(path)?);
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else if input.contains(['*', '?', '[']) {
            files.extend(expand_glob(input)?);
        } else {
            bail!("input not found: {input}");
        }
    }
    files.sort();
    files.dedup();
    if files.is_empty() {
        bail!("no input files found in {} argument(s)", inputs.len());
    }
    Ok(files)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("list {}", dir.display()))?
            .path();
        if path.is_file() && is_visible(&path) {
            out.push(path);
        }
    }
    Ok(out)
}

fn is_visible(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| !n.starts_with('_') && !n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, create_dir};
    use tempfile::tempdir;

    #[test]
    fn directory_input_skips_markers() -> Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("part-r-00000"))?;
        File::create(dir.path().join("part-r-00001"))?;
        File::create(dir.path().join("_SUCCESS"))?;
        File::create(dir.path().join(".part-r-00000.crc"))?;
        create_dir(dir.path().join("nested"))?;

        let files = expand_inputs(&[dir.path().to_string_lossy()])?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["part-r-00000", "part-r-00001"]);
        Ok(())
    }

    #[test]
    fn patterns_and_files_are_merged_and_deduplicated() -> Result<()> {
        let dir = tempdir()?;
        let a = dir.path().join("a.xml");
        let b = dir.path().join("b.xml");
        File::create(&a)?;
        File::create(&b)?;
        let pattern = dir.path().join("*.xml").to_string_lossy().into_owned();

        let files = expand_inputs(&[pattern, a.to_string_lossy().into_owned()])?;
        assert_eq!(files, vec![a, b]);
        Ok(())
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(expand_inputs(&["/definitely/not/here.xml"]).is_err());
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("*.none").to_string_lossy().into_owned();
        assert!(expand_inputs(&[pattern]).is_err());
    }
}
