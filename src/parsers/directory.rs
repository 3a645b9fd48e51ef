// src/parsers/directory.rs

//! Source directory listing parser
//!
//! A project listing looks like:
//!
//! ```xml
//! <directory count="2">
//!   <entry name="clutter"/>
//!   <entry name="moblin-panel"/>
//! </directory>
//! ```

use super::{attribute, element_name};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Extract every entry name, in document order
pub fn parse_directory(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut names = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                let tag = element_name(&e);
                if !seen_root {
                    if tag != "directory" {
                        return Err(Error::DocumentParse(format!(
                            "Expected <directory> listing, found <{}>",
                            tag
                        )));
                    }
                    seen_root = true;
                } else if tag == "entry" {
                    let name = attribute(&e, b"name")?.ok_or_else(|| {
                        Error::DocumentParse("Directory entry without a name".to_string())
                    })?;
                    names.push(name);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::DocumentParse(format!(
                    "Failed to parse directory listing: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Error::DocumentParse(
            "Empty directory listing document".to_string(),
        ));
    }

    Ok(names)
}
