//! Transparent decompression of input files, detected by extension.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Whether `path` names a gzip file.
pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Open `path` for line reading, decompressing `.gz` files on the fly.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    if is_gzip(path) {
        return gzip_reader(file, path);
    }
    Ok(Box::new(BufReader::new(file)))
}

#[cfg(feature = "compression-gzip")]
fn gzip_reader(file: File, _path: &Path) -> Result<Box<dyn BufRead + Send>> {
    // Multi-member aware: concatenated .gz dumps decode as one stream.
    let decoder = flate2::read::MultiGzDecoder::new(file);
    Ok(Box::new(BufReader::new(decoder)))
}

#[cfg(not(feature = "compression-gzip"))]
fn gzip_reader(_file: File, path: &Path) -> Result<Box<dyn BufRead + Send>> {
    anyhow::bail!(
        "{} is gzip-compressed but the compression-gzip feature is disabled",
        path.display()
    )
}

#[cfg(all(test, feature = "compression-gzip"))]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::{Read, Write};
    use tempfile::tempdir;

    #[test]
    fn gz_input_is_decompressed() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dblp.xml.gz");
        let mut enc = GzEncoder::new(File::create(&path)?, Compression::default());
        enc.write_all(b"<author>Jane Doe</author>\n")?;
        enc.finish()?;

        let mut text = String::new();
        open_text(&path)?.read_to_string(&mut text)?;
        assert_eq!(text, "<author>Jane Doe</author>\n");
        Ok(())
    }
}
