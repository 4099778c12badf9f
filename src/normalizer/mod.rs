use std::borrow::Cow;

use chrono::Utc;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{FeedhookError, Result};
use crate::domain::FeedEntry;

/// Entries extracted from one feed body.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub entries: Vec<FeedEntry>,
    /// Set when the body only parsed after repair.
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parses RSS, Atom or JSON Feed content into entries, in feed order.
    ///
    /// Bodies that need cleanup (bare ampersands, control characters, junk
    /// before the root, invalid UTF-8) are parsed only after repair, since
    /// the strict parser can accept them while silently dropping fields.
    /// A body that still fails is cut back to its last complete entry.
    /// Either recovery returns the entries together with a warning.
    pub fn normalize(&self, body: &[u8]) -> Result<ParsedFeed> {
        let (text, error) = match repair(body) {
            Some(repaired) if !repaired.fixes.is_empty() => {
                let note = format!("malformed feed repaired: {}", repaired.fixes.join(", "));
                match self.parse(repaired.text.as_bytes()) {
                    Ok(entries) => {
                        return Ok(ParsedFeed {
                            entries,
                            warning: Some(note),
                        })
                    }
                    Err(e) => (repaired.text, format!("{} ({})", e, note)),
                }
            }
            repaired => {
                let input = repaired.as_ref().map_or(body, |r| r.text.as_bytes());
                match self.parse(input) {
                    Ok(entries) => {
                        return Ok(ParsedFeed {
                            entries,
                            warning: None,
                        })
                    }
                    Err(e) => match repaired {
                        Some(repaired) => (repaired.text, e),
                        None => return Err(FeedhookError::FeedParse(e)),
                    },
                }
            }
        };

        let Some(truncated) = truncate_to_complete_entries(&text) else {
            return Err(FeedhookError::FeedParse(error));
        };
        match self.parse(truncated.as_bytes()) {
            Ok(entries) if !entries.is_empty() => Ok(ParsedFeed {
                warning: Some(format!("{}; kept {} complete entries", error, entries.len())),
                entries,
            }),
            _ => Err(FeedhookError::FeedParse(error)),
        }
    }

    fn parse(&self, body: &[u8]) -> std::result::Result<Vec<FeedEntry>, String> {
        // An empty generated id lets callers tell provider ids apart from
        // entries that had none.
        let feed = parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(body)
            .map_err(|e| e.to_string())?;

        let entries = feed
            .entries
            .into_iter()
            .map(|entry| {
                let id = Some(entry.id).filter(|id| !id.trim().is_empty());
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default();

                FeedEntry {
                    id,
                    title: entry
                        .title
                        .map(|t| decode_html_entities(&t.content).trim().to_string()),
                    link,
                    published_at: entry
                        .published
                        .or(entry.updated)
                        .map(|dt| dt.with_timezone(&Utc)),
                }
            })
            .collect();

        Ok(entries)
    }
}

struct Repaired {
    text: String,
    /// What had to change; empty when the body was already clean.
    fixes: Vec<&'static str>,
}

/// Best-effort cleanup: lossy UTF-8, junk before the document root,
/// XML-illegal control characters and bare ampersands outside CDATA.
fn repair(body: &[u8]) -> Option<Repaired> {
    let mut fixes = Vec::new();

    let decoded = String::from_utf8_lossy(body);
    if matches!(decoded, Cow::Owned(_)) {
        fixes.push("invalid UTF-8 replaced");
    }
    let text = decoded.trim_start_matches('\u{feff}');
    let start = text.find(['<', '{'])?;
    if !text[..start].trim().is_empty() {
        fixes.push("leading junk dropped");
    }
    let text = &text[start..];
    let is_xml = text.starts_with('<');

    let mut out = String::with_capacity(text.len());
    let mut dropped_control = false;
    let mut escaped_amp = false;
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if is_xml && rest.starts_with(CDATA_OPEN) {
            let end = rest.find(CDATA_CLOSE).map_or(rest.len(), |i| i + CDATA_CLOSE.len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        let tail = &rest[c.len_utf8()..];
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => dropped_control = true,
            '&' if is_xml && !starts_with_entity(tail) => {
                escaped_amp = true;
                out.push_str("&amp;");
            }
            c => out.push(c),
        }
        rest = tail;
    }

    if dropped_control {
        fixes.push("control characters removed");
    }
    if escaped_amp {
        fixes.push("bare ampersands escaped");
    }

    Some(Repaired { text: out, fixes })
}

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Cuts an XML body after its last `</item>` or `</entry>` and closes the
/// elements still open at that point. `None` when there is no complete
/// entry or the markup before it does not nest.
fn truncate_to_complete_entries(text: &str) -> Option<String> {
    let cut = ["</item>", "</entry>"]
        .iter()
        .filter_map(|tag| text.rfind(tag).map(|i| i + tag.len()))
        .max()?;
    let kept = &text[..cut];

    let mut out = kept.to_string();
    for name in open_elements(kept)?.iter().rev() {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
    Some(out)
}

fn open_elements(text: &str) -> Option<Vec<&str>> {
    let mut stack = Vec::new();
    let mut rest = text;

    while let Some(i) = rest.find('<') {
        rest = &rest[i..];
        let consumed = if rest.starts_with("<!--") {
            end_of(rest, "-->")?
        } else if rest.starts_with(CDATA_OPEN) {
            end_of(rest, CDATA_CLOSE)?
        } else if rest.starts_with("<?") || rest.starts_with("<!") {
            end_of(rest, ">")?
        } else {
            let end = rest.find('>')?;
            let tag = &rest[1..end];
            if let Some(name) = tag.strip_prefix('/') {
                if stack.pop() != Some(name.trim()) {
                    return None;
                }
            } else if !tag.ends_with('/') {
                let name = tag.split(char::is_whitespace).next().unwrap_or_default();
                stack.push(name);
            }
            end + 1
        };
        rest = &rest[consumed..];
    }

    Some(stack)
}

fn end_of(s: &str, terminator: &str) -> Option<usize> {
    s.find(terminator).map(|i| i + terminator.len())
}

fn starts_with_entity(s: &str) -> bool {
    let Some(end) = s.find(';') else {
        return false;
    };
    let name = &s[..end];

    if let Some(num) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        !num.is_empty() && num.chars().all(|c| c.is_ascii_hexdigit())
    } else if let Some(num) = name.strip_prefix('#') {
        !num.is_empty() && num.chars().all(|c| c.is_ascii_digit())
    } else {
        !name.is_empty() && name.len() <= 32 && name.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
