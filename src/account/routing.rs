// src/account/routing.rs

//! Project reference parsing
//!
//! A project on the command line is either a bare name, which is served
//! by the default account, or a fully qualified URL whose last path
//! segment is the project and whose prefix is the API URL of the account
//! to use (`https://api.example.org/Moblin:Base`).

use crate::error::{Error, Result};
use std::fmt;

/// A project name plus the API URL it should be queried under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    /// API URL selecting the account, or None for the default account
    pub api_url: Option<String>,
    pub project: String,
}

impl ProjectRef {
    /// Parse a command line project reference
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();

        if !is_url(reference) {
            if reference.is_empty() || reference.contains('/') {
                return Err(invalid(reference));
            }
            return Ok(Self {
                api_url: None,
                project: reference.to_string(),
            });
        }

        // The host must be followed by at least one more segment
        let after_scheme = reference
            .find("://")
            .map(|idx| idx + 3)
            .ok_or_else(|| invalid(reference))?;
        let split = reference.rfind('/').ok_or_else(|| invalid(reference))?;
        if split < after_scheme {
            return Err(invalid(reference));
        }

        let api_url = &reference[..split];
        let project = &reference[split + 1..];
        if project.is_empty() || api_url.len() <= after_scheme {
            return Err(invalid(reference));
        }

        Ok(Self {
            api_url: Some(api_url.to_string()),
            project: project.to_string(),
        })
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.api_url {
            Some(api_url) => write!(f, "{}/{}", api_url, self.project),
            None => write!(f, "{}", self.project),
        }
    }
}

fn is_url(reference: &str) -> bool {
    reference.starts_with("http:") || reference.starts_with("https:")
}

fn invalid(reference: &str) -> Error {
    Error::Usage(format!("Invalid project reference: '{}'", reference))
}
