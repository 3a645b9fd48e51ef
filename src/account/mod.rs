// src/account/mod.rs

//! Build service accounts
//!
//! This module provides:
//! - The `Account` value (API URL plus optional credentials)
//! - An `AccountRegistry` loaded from the osc client configuration
//! - Routing of project references to accounts (see `routing`)

pub mod routing;

pub use routing::ProjectRef;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// API URL used when the configuration does not name one
pub const DEFAULT_API_URL: &str = "https://api.opensuse.org";

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV_VAR: &str = "OSC_CONFIG";

/// Username and password for HTTP basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A build service endpoint and the credentials used to talk to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    api_url: String,
    credentials: Option<Credentials>,
}

impl Account {
    /// Create an account; the API URL is stored without trailing slashes
    pub fn new(api_url: &str, credentials: Option<Credentials>) -> Self {
        Self {
            api_url: normalize_api_url(api_url),
            credentials,
        }
    }

    /// Create an account that sends no credentials
    pub fn anonymous(api_url: &str) -> Self {
        Self::new(api_url, None)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// All accounts known to a run, keyed by normalized API URL
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    default_api_url: String,
    accounts: HashMap<String, Arc<Account>>,
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self {
            default_api_url: DEFAULT_API_URL.to_string(),
            accounts: HashMap::new(),
        }
    }
}

impl AccountRegistry {
    /// Load the registry from an explicit path or the osc default locations
    ///
    /// An explicit path must exist. When no path is given and no
    /// configuration file is found, an empty registry is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    info!("No osc configuration found, using anonymous access");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Loading accounts from {}", path.display());
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let registry = Self::parse(&content)?;
        info!(
            "Loaded {} account(s) from {}",
            registry.accounts.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parse osc configuration text
    ///
    /// `[general]` may set `apiurl`; every other section is an API URL
    /// holding `user` and `pass` keys.
    pub fn parse(content: &str) -> Result<Self> {
        let mut registry = Self::default();
        let mut section: Option<String> = None;
        let mut fields: HashMap<String, String> = HashMap::new();

        for (idx, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| {
                    Error::Config(format!("Malformed section header on line {}", idx + 1))
                })?;
                registry.finish_section(section.take(), std::mem::take(&mut fields))?;
                section = Some(name.trim().to_string());
                continue;
            }

            let (key, value) = split_key_value(line).ok_or_else(|| {
                Error::Config(format!("Expected 'key = value' on line {}", idx + 1))
            })?;

            if section.is_none() {
                return Err(Error::Config(format!(
                    "Key '{}' on line {} is outside of any section",
                    key,
                    idx + 1
                )));
            }
            // Keys are case-insensitive, section names are not
            fields.insert(key.to_ascii_lowercase(), value.to_string());
        }
        registry.finish_section(section, fields)?;

        Ok(registry)
    }

    fn finish_section(
        &mut self,
        section: Option<String>,
        mut fields: HashMap<String, String>,
    ) -> Result<()> {
        let Some(section) = section else {
            return Ok(());
        };

        if section == "general" {
            if let Some(api_url) = fields.remove("apiurl") {
                self.default_api_url = normalize_api_url(&api_url);
            }
            return Ok(());
        }

        if fields.contains_key("passx") && !fields.contains_key("pass") {
            warn!(
                "Obfuscated password (passx) for {} is not supported, ignoring it",
                section
            );
        }

        let credentials = match (fields.remove("user"), fields.remove("pass")) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (Some(username), None) => Some(Credentials {
                username,
                password: String::new(),
            }),
            (None, Some(_)) => {
                return Err(Error::Config(format!(
                    "Section [{}] has a password but no user",
                    section
                )));
            }
            (None, None) => None,
        };

        let account = Account::new(&section, credentials);
        self.accounts
            .insert(account.api_url().to_string(), Arc::new(account));
        Ok(())
    }

    /// Replace the API URL used for bare project names
    pub fn with_default_api_url(mut self, api_url: &str) -> Self {
        self.default_api_url = normalize_api_url(api_url);
        self
    }

    pub fn default_api_url(&self) -> &str {
        &self.default_api_url
    }

    /// Number of accounts with a configuration section
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Account for the default API URL, anonymous if it has no section
    pub fn default_account(&self) -> Arc<Account> {
        self.accounts
            .get(&self.default_api_url)
            .cloned()
            .unwrap_or_else(|| Arc::new(Account::anonymous(&self.default_api_url)))
    }

    /// Account registered for an API URL
    pub fn get(&self, api_url: &str) -> Result<Arc<Account>> {
        let key = normalize_api_url(api_url);
        if key == self.default_api_url {
            return Ok(self.default_account());
        }
        self.accounts
            .get(&key)
            .cloned()
            .ok_or(Error::AccountNotFound(key))
    }

    /// Account a project reference should be queried under
    pub fn resolve(&self, project: &ProjectRef) -> Result<Arc<Account>> {
        match &project.api_url {
            Some(api_url) => self.get(api_url),
            None => Ok(self.default_account()),
        }
    }
}

/// Location of the osc configuration when none is given explicitly
///
/// Checks `$OSC_CONFIG`, then `~/.config/osc/oscrc`, then `~/.oscrc`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("osc").join("oscrc");
        if path.exists() {
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(".oscrc"))
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[idx + 1..].trim()))
}

fn normalize_api_url(api_url: &str) -> String {
    api_url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OSCRC: &str = "\
[general]
apiurl = https://api.example.org/

# the default instance
[https://api.example.org]
user = alice
pass = secret

[https://obs.moblin.test]
user: bob
pass: hunter2

[http://anon.test]
";

    #[test]
    fn test_parse_default_account() {
        let registry = AccountRegistry::parse(OSCRC).unwrap();
        assert_eq!(registry.default_api_url(), "https://api.example.org");

        let account = registry.default_account();
        assert_eq!(account.api_url(), "https://api.example.org");
        let creds = account.credentials().unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let registry = AccountRegistry::parse(
            "[general]\nApiUrl = https://obs.case.test\n\n[https://obs.case.test]\nUser = alice\nPASS = pw\n",
        )
        .unwrap();

        assert_eq!(registry.default_api_url(), "https://obs.case.test");
        let account = registry.default_account();
        let creds = account.credentials().unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "pw");
    }

    #[test]
    fn test_lookup_by_api_url() {
        let registry = AccountRegistry::parse(OSCRC).unwrap();
        assert_eq!(registry.len(), 3);

        let account = registry.get("https://obs.moblin.test/").unwrap();
        assert_eq!(account.credentials().unwrap().username, "bob");

        let anon = registry.get("http://anon.test").unwrap();
        assert!(anon.credentials().is_none());

        let missing = registry.get("https://unknown.test");
        assert!(matches!(missing, Err(Error::AccountNotFound(_))));
    }

    #[test]
    fn test_resolve_project_refs() {
        let registry = AccountRegistry::parse(OSCRC).unwrap();

        let bare = ProjectRef::parse("Moblin:Base").unwrap();
        assert_eq!(registry.resolve(&bare).unwrap().api_url(), "https://api.example.org");

        let qualified = ProjectRef::parse("https://obs.moblin.test/Moblin:UI").unwrap();
        let account = registry.resolve(&qualified).unwrap();
        assert_eq!(account.api_url(), "https://obs.moblin.test");
    }

    #[test]
    fn test_default_api_url_without_section_is_anonymous() {
        let registry = AccountRegistry::default();
        assert_eq!(registry.default_api_url(), DEFAULT_API_URL);
        assert!(registry.default_account().credentials().is_none());
        assert!(registry.get(DEFAULT_API_URL).is_ok());
    }

    #[test]
    fn test_override_default_api_url() {
        let registry = AccountRegistry::parse(OSCRC)
            .unwrap()
            .with_default_api_url("https://obs.moblin.test");
        let account = registry.default_account();
        assert_eq!(account.credentials().unwrap().username, "bob");
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            AccountRegistry::parse("[general\napiurl = x"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AccountRegistry::parse("apiurl = https://x.test"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AccountRegistry::parse("[https://x.test]\njunk"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AccountRegistry::parse("[https://x.test]\npass = p"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let registry = AccountRegistry::parse(OSCRC).unwrap();
        let output = format!("{:?}", registry.default_account());
        assert!(output.contains("alice"));
        assert!(!output.contains("secret"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(OSCRC.as_bytes()).unwrap();

        let registry = AccountRegistry::load(Some(file.path())).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = AccountRegistry::load(Some(Path::new("/nonexistent/oscrc")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
