//! Pulling keys out of raw bibliography lines.
//!
//! Recognized syntax is the literal substring `<name>` ... `</name>`. There
//! is no escaping, no attributes and no nesting: this is a substring scan,
//! not a markup parser.

use crate::error::{TallyError, TallyResult};
use tracing::trace;

/// Publication end tags counted by the publication job unless configured
/// otherwise.
pub const PUBLICATION_TAGS: [&str; 4] = ["article", "inproceedings", "phdthesis", "masterthesis"];

/// One emission: a freshly owned key with a count of 1.
pub type Emission = (String, u64);

#[derive(Clone, Debug, PartialEq, Eq)]
struct Marker {
    name: String,
    open: String,
    close: String,
}

impl Marker {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            open: format!("<{name}>"),
            close: format!("</{name}>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Mode {
    Field(Marker),
    Events(Vec<Marker>),
}

/// Extracts keys from one line at a time.
///
/// Two modes:
/// - [`field`](Self::field): the text between the first `<name>` and the
///   first `</name>` after it becomes the key.
/// - [`events`](Self::events): every configured tag whose closing marker
///   occurs in the line emits the tag name itself as the key.
///
/// # Example
/// ```
/// use tagtally::TagExtractor;
///
/// let authors = TagExtractor::field("author");
/// assert_eq!(
///     authors.extract("<author>Jane Doe</author>")?,
///     vec![("Jane Doe".to_string(), 1)]
/// );
///
/// let kinds = TagExtractor::events(["article", "phdthesis"]);
/// assert_eq!(kinds.extract("</article>")?, vec![("article".to_string(), 1)]);
/// # Ok::<_, tagtally::TallyError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagExtractor {
    mode: Mode,
}

impl TagExtractor {
    /// Extract the content of the first `<tag>...</tag>` pair of a line.
    pub fn field(tag: &str) -> Self {
        Self {
            mode: Mode::Field(Marker::new(tag)),
        }
    }

    /// Emit one event per configured tag whose closing marker is present.
    ///
    /// Repeated names are kept once, in first-seen order.
    pub fn events<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut markers: Vec<Marker> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref();
            if !markers.iter().any(|m| m.name == tag) {
                markers.push(Marker::new(tag));
            }
        }
        Self {
            mode: Mode::Events(markers),
        }
    }

    /// Publication-type events over [`PUBLICATION_TAGS`].
    #[must_use]
    pub fn publications() -> Self {
        Self::events(PUBLICATION_TAGS)
    }

    /// Emissions for `line`, or [`TallyError::MalformedRecord`] when an
    /// opening marker is not followed by its closing marker.
    ///
    /// Only the first opening marker of a line is considered; later pairs
    /// on the same line are ignored.
    pub fn extract(&self, line: &str) -> TallyResult<Vec<Emission>> {
        match &self.mode {
            Mode::Field(m) => {
                let Some(start) = line.find(&m.open) else {
                    return Ok(Vec::new());
                };
                let body = &line[start + m.open.len()..];
                let Some(end) = body.find(&m.close) else {
                    return Err(TallyError::MalformedRecord {
                        tag: m.name.clone(),
                    });
                };
                Ok(vec![(body[..end].to_string(), 1)])
            }
            Mode::Events(markers) => Ok(markers
                .iter()
                .filter(|m| line.contains(&m.close))
                .map(|m| (m.name.clone(), 1))
                .collect()),
        }
    }

    /// Like [`extract`](Self::extract), but a malformed line yields nothing.
    ///
    /// This is the map function of the count jobs: a bad line costs only
    /// itself.
    pub fn emissions(&self, line: &str) -> Vec<Emission> {
        match self.extract(line) {
            Ok(found) => found,
            Err(err) => {
                trace!(%err, line, "skipping record");
                Vec::new()
            }
        }
    }

    /// Tag names this extractor looks for.
    pub fn tags(&self) -> Vec<&str> {
        match &self.mode {
            Mode::Field(m) => vec![m.name.as_str()],
            Mode::Events(markers) => markers.iter().map(|m| m.name.as_str()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(found: Vec<Emission>) -> Vec<String> {
        found.into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn field_extracts_text_between_markers() {
        let x = TagExtractor::field("author");
        assert_eq!(
            x.extract("<author>Jane Doe</author>").unwrap(),
            vec![("Jane Doe".to_string(), 1)]
        );
        assert_eq!(
            keys(x.extract("  <author>Ed Codd</author> trailing").unwrap()),
            vec!["Ed Codd"]
        );
    }

    #[test]
    fn line_without_the_tag_emits_nothing() {
        let x = TagExtractor::field("author");
        assert!(x.extract("<title>Relational Model</title>").unwrap().is_empty());
        assert!(x.extract("").unwrap().is_empty());
    }

    #[test]
    fn only_the_first_pair_counts() {
        let x = TagExtractor::field("author");
        assert_eq!(
            keys(x.extract("<author>X</author><author>Y</author>").unwrap()),
            vec!["X"]
        );
    }

    #[test]
    fn closing_marker_must_follow_the_opening_one() {
        let x = TagExtractor::field("author");
        assert!(matches!(
            x.extract("<author>Jane Doe"),
            Err(TallyError::MalformedRecord { .. })
        ));
        assert!(matches!(
            x.extract("</author> <author>Jane"),
            Err(TallyError::MalformedRecord { .. })
        ));
        assert!(x.emissions("<author>Jane Doe").is_empty());
    }

    #[test]
    fn empty_field_is_an_empty_key() {
        let x = TagExtractor::field("author");
        assert_eq!(keys(x.extract("<author></author>").unwrap()), vec![""]);
    }

    #[test]
    fn events_fire_once_per_distinct_tag() {
        let x = TagExtractor::publications();
        assert!(x.extract("<article key=\"a/b\">").unwrap().is_empty());
        assert_eq!(keys(x.extract("</article>").unwrap()), vec!["article"]);
        assert_eq!(
            keys(x.extract("</phdthesis></article></article>").unwrap()),
            vec!["article", "phdthesis"]
        );
    }

    #[test]
    fn events_deduplicate_configured_tags() {
        let x = TagExtractor::events(["book", "book", "www"]);
        assert_eq!(x.tags(), vec!["book", "www"]);
        assert_eq!(keys(x.extract("</book></www>").unwrap()), vec!["book", "www"]);
    }
}
