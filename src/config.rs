use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use unicase::UniCase;

use crate::directory::DN_ATTRIBUTE;
use crate::error::{Error, Result};


/// The placeholder in `basefilter` that is replaced by each username.
pub const USERNAME_PLACEHOLDER: &str = "%uid";

const DEFAULT_PORT: u16 = 389;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;


fn default_port() -> u16 { DEFAULT_PORT }
fn default_cache_ttl() -> u64 { DEFAULT_CACHE_TTL_SECONDS }
fn default_user_dn() -> String { DN_ATTRIBUTE.to_owned() }


#[derive(Clone, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct DirectoryConfig {
    pub server: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub binddn: String,

    #[serde(default)]
    pub bindpassword: Option<String>,

    #[serde(default)]
    pub peopledn: Option<String>,

    pub basefilter: String,

    pub attributes: Vec<String>,

    pub key: String,

    /// Cache lifetime of a looked-up entry, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cachettl: u64,

    #[serde(default = "default_user_dn")]
    pub userdn: String,
}
impl DirectoryConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("failed to parse configuration: {}", e)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let toml_string = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&toml_string)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(Error::Config("server is required".to_owned()));
        }
        if !self.basefilter.contains(USERNAME_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "basefilter {:?} does not contain the placeholder {}",
                self.basefilter, USERNAME_PLACEHOLDER,
            )));
        }
        if self.attributes.is_empty() {
            return Err(Error::Config("attributes must not be empty".to_owned()));
        }
        let key = UniCase::new(self.key.as_str());
        if !self.attributes.iter().any(|a| UniCase::new(a.as_str()) == key) {
            return Err(Error::Config(format!(
                "key attribute {:?} is not one of the configured attributes",
                self.key,
            )));
        }
        let user_dn = UniCase::new(self.userdn.as_str());
        if user_dn != UniCase::new(DN_ATTRIBUTE)
                && !self.attributes.iter().any(|a| UniCase::new(a.as_str()) == user_dn) {
            return Err(Error::Config(format!(
                "userdn {:?} is neither {:?} nor one of the configured attributes",
                self.userdn, DN_ATTRIBUTE,
            )));
        }
        Ok(())
    }

    /// The URL to connect to.
    ///
    /// `server` may be a bare host name or a full `ldap://`, `ldaps://` or `ldapi://` URL; the
    /// configured port is appended unless the URL already names one.
    pub fn server_url(&self) -> String {
        let server = self.server.trim().trim_end_matches('/');
        let (scheme, authority) = match server.split_once("://") {
            Some((s, a)) => (s, a),
            None => ("ldap", server),
        };
        // a bare IPv6 literal needs brackets before a port can follow it
        let bracketed;
        let authority = if !authority.starts_with('[') && authority.matches(':').count() > 1 {
            bracketed = format!("[{}]", authority);
            bracketed.as_str()
        } else {
            authority
        };
        if scheme.eq_ignore_ascii_case("ldapi") || authority_has_port(authority) {
            format!("{}://{}", scheme, authority)
        } else {
            format!("{}://{}:{}", scheme, authority, self.port)
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cachettl)
    }

    pub fn attribute_names(&self) -> Vec<UniCase<String>> {
        self.attributes
            .iter()
            .map(|a| UniCase::new(a.clone()))
            .collect()
    }
}
impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("binddn", &self.binddn)
            .field("bindpassword", &self.bindpassword.as_ref().map(|_| "<redacted>"))
            .field("peopledn", &self.peopledn)
            .field("basefilter", &self.basefilter)
            .field("attributes", &self.attributes)
            .field("key", &self.key)
            .field("cachettl", &self.cachettl)
            .field("userdn", &self.userdn)
            .finish()
    }
}

fn authority_has_port(authority: &str) -> bool {
    // [v6addr]:port vs. host:port
    let host_end = match authority.rfind(']') {
        Some(bracket) => bracket,
        None => 0,
    };
    authority[host_end..].contains(':')
}
