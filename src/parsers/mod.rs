// src/parsers/mod.rs

//! Build service API document parsers
//!
//! - Source directory listings (`/source/<project>`)
//! - Package revision histories (`/source/<project>/<package>/_history`)

pub mod directory;
pub mod history;

pub use directory::parse_directory;
pub use history::{Revision, current_checksum, parse_history};

use crate::error::{Error, Result};
use quick_xml::events::BytesStart;

/// Value of an attribute on an element, unescaped
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| Error::DocumentParse(format!("Invalid attribute: {}", e)))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::DocumentParse(format!("Invalid attribute value: {}", e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).to_string()
}
