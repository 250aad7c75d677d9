//! Line-oriented input and tab-separated job output.
//!
//! Output uses the layout of a classic map/reduce text job: an output
//! directory holding `part-r-00000` with one `key<TAB>value` line per record
//! and an empty `_SUCCESS` marker written last. That same layout is what the
//! top-K job reads back through [`parse_count_line`].

use crate::collection::{PCollection, from_vec};
use crate::error::{TallyError, TallyResult};
use crate::io::compression::open_text;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result, bail};
use std::fmt::Display;
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the single data file a job writes.
pub const PART_FILE: &str = "part-r-00000";

/// Marker written once the data file is complete.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Read every line of `reader`, dropping line terminators.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the read;
/// older bibliography dumps are not always clean.
pub fn read_lines_from<R: BufRead>(mut reader: R) -> TallyResult<Vec<String>> {
    let mut out = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        out.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(out)
}

/// Source collection over the lines of `files`, in file order.
pub fn read_lines(p: &Pipeline, files: &[PathBuf]) -> Result<PCollection<String>> {
    let mut lines = Vec::new();
    for path in files {
        let before = lines.len();
        lines.extend(
            read_lines_from(open_text(path)?).with_context(|| format!("read {}", path.display()))?,
        );
        debug!(file = %path.display(), lines = lines.len() - before, "read input");
    }
    Ok(from_vec(p, lines))
}

/// Parse one `key<TAB>count` line written by a count job.
///
/// The count is taken after the last tab, so keys may themselves contain
/// tabs. Anything else is corrupted intermediate output and is reported as
/// [`TallyError::InvalidPartialResult`].
pub fn parse_count_line(line: &str) -> TallyResult<(String, u64)> {
    let (key, count) = line
        .rsplit_once('\t')
        .ok_or_else(|| TallyError::partial("count line", format!("no tab in {line:?}")))?;
    let count = count.parse::<u64>().map_err(|e| {
        TallyError::partial("count line", format!("bad count {count:?} in {line:?}: {e}"))
    })?;
    Ok((key.to_string(), count))
}

/// Write `rows` as `key<TAB>value` lines into a fresh output directory.
///
/// Refuses to touch an existing directory. Returns the number of rows
/// written.
pub fn write_output<K: Display, V: Display>(dir: &Path, rows: &[(K, V)]) -> Result<usize> {
    if dir.exists() {
        bail!("output directory {} already exists", dir.display());
    }
    create_dir_all(dir).with_context(|| format!("mkdir -p {}", dir.display()))?;

    let part = dir.join(PART_FILE);
    let f = File::create(&part).with_context(|| format!("create {}", part.display()))?;
    let mut w = BufWriter::new(f);
    for (k, v) in rows {
        writeln!(w, "{k}\t{v}").with_context(|| format!("write {}", part.display()))?;
    }
    w.flush()
        .with_context(|| format!("write {}", part.display()))?;

    let marker = dir.join(SUCCESS_MARKER);
    File::create(&marker).with_context(|| format!("create {}", marker.display()))?;
    Ok(rows.len())
}
