// src/parsers/history.rs

//! Package revision history parser
//!
//! ```xml
//! <revisionlist>
//!   <revision rev="1" vrev="1">
//!     <srcmd5>0123456789abcdef0123456789abcdef</srcmd5>
//!     <version>1.0</version>
//!     <time>1239900000</time>
//!     <user>alice</user>
//!   </revision>
//! </revisionlist>
//! ```

use super::{attribute, element_name};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// One commit of a package's sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub rev: u64,
    pub srcmd5: String,
}

/// Parse every revision in a history document, in document order
pub fn parse_history(xml: &[u8]) -> Result<Vec<Revision>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut revisions = Vec::new();
    let mut seen_root = false;

    let mut current: Option<RevisionBuilder> = None;
    let mut in_srcmd5 = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = element_name(&e);
                if !seen_root {
                    check_root(&tag)?;
                    seen_root = true;
                } else {
                    match tag.as_str() {
                        "revision" => current = Some(RevisionBuilder::from_element(&e)?),
                        "srcmd5" if current.is_some() => in_srcmd5 = true,
                        _ => {}
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let tag = element_name(&e);
                if !seen_root {
                    check_root(&tag)?;
                    seen_root = true;
                } else if tag == "revision" {
                    // <revision rev="N"/> has no srcmd5 child
                    revisions.push(RevisionBuilder::from_element(&e)?.build()?);
                }
            }
            Ok(Event::Text(e)) if in_srcmd5 => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::DocumentParse(format!("Invalid srcmd5 text: {}", e)))?;
                if let Some(builder) = current.as_mut() {
                    builder.srcmd5 = Some(text.trim().to_string());
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"srcmd5" => in_srcmd5 = false,
                b"revision" => {
                    if let Some(builder) = current.take() {
                        revisions.push(builder.build()?);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::DocumentParse(format!(
                    "Failed to parse revision history: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Error::DocumentParse(
            "Empty revision history document".to_string(),
        ));
    }

    Ok(revisions)
}

/// Checksum of the revision with the greatest revision number
///
/// List order is irrelevant; histories are not guaranteed to be sorted.
pub fn current_checksum(revisions: &[Revision]) -> Option<&str> {
    revisions
        .iter()
        .max_by_key(|revision| revision.rev)
        .map(|revision| revision.srcmd5.as_str())
}

fn check_root(tag: &str) -> Result<()> {
    if tag == "revisionlist" {
        Ok(())
    } else {
        Err(Error::DocumentParse(format!(
            "Expected <revisionlist> history, found <{}>",
            tag
        )))
    }
}

struct RevisionBuilder {
    rev: u64,
    srcmd5: Option<String>,
}

impl RevisionBuilder {
    fn from_element(element: &BytesStart<'_>) -> Result<Self> {
        let rev = attribute(element, b"rev")?
            .ok_or_else(|| Error::DocumentParse("Revision without a rev attribute".to_string()))?;
        let rev = rev
            .trim()
            .parse::<u64>()
            .map_err(|e| Error::DocumentParse(format!("Invalid revision number '{}': {}", rev, e)))?;

        Ok(Self { rev, srcmd5: None })
    }

    fn build(self) -> Result<Revision> {
        let rev = self.rev;
        let srcmd5 = self
            .srcmd5
            .filter(|sum| !sum.is_empty())
            .ok_or_else(|| Error::DocumentParse(format!("Revision {} has no srcmd5", rev)))?;

        Ok(Revision { rev, srcmd5 })
    }
}
