use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde::{Serialize, Serializer};
use unicase::UniCase;

use crate::error::Result;


/// The pseudo-attribute that resolves to an entry's distinguished name.
pub const DN_ATTRIBUTE: &str = "dn";


#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DirectoryEntry {
    pub dn: String,

    /// Values in the order the directory returned them.
    pub attributes: BTreeMap<UniCase<String>, Vec<Vec<u8>>>,
}
impl DirectoryEntry {
    pub fn new(dn: String) -> Self {
        Self {
            dn,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute<N: Into<String>, V: Into<Vec<u8>>>(mut self, name: N, value: V) -> Self {
        self.attributes
            .entry(UniCase::new(name.into()))
            .or_insert_with(Vec::new)
            .push(value.into());
        self
    }

    /// All values of the given attribute; `dn` yields the entry's distinguished name unless the
    /// directory returned a real attribute by that name.
    pub fn get_attribute(&self, name: &str) -> Option<Vec<AttributeValue>> {
        let key = UniCase::new(name.to_owned());
        if let Some(values) = self.attributes.get(&key) {
            return Some(values.iter().map(|v| AttributeValue::from_bytes(v)).collect());
        }
        if key == UniCase::new(DN_ATTRIBUTE.to_owned()) {
            return Some(vec![AttributeValue::Text(self.dn.clone())]);
        }
        None
    }

    pub fn first_value(&self, name: &str) -> Option<AttributeValue> {
        self.get_attribute(name)?
            .into_iter()
            .next()
    }
}


#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AttributeValue {
    Text(String),
    Binary(Vec<u8>),
}
impl AttributeValue {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(s) => Self::Text(s.to_owned()),
            Err(_) => Self::Binary(bytes.to_vec()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Binary(_) => None,
        }
    }
}
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Binary(b) => write!(f, "{}", BASE64_STANDARD.encode(b)),
        }
    }
}
impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Binary(b) => serializer.serialize_str(&BASE64_STANDARD.encode(b)),
        }
    }
}


/// Opens sessions to a directory server.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    /// Opens a session speaking protocol version 3 that does not chase referrals.
    async fn connect(&self, server_url: &str) -> Result<Self::Session>;
}


/// An open connection to a directory server.
#[async_trait]
pub trait Session: Send {
    /// Binds with the given credentials.
    ///
    /// Returns `Ok(false)` if the server rejects the credentials and `Err` if the bind could not
    /// be performed at all.
    async fn bind(&mut self, dn: &str, password: &str) -> Result<bool>;

    /// Searches the subtree below `base_dn`.
    async fn search(&mut self, base_dn: &str, filter: &str, attribute_names: &[UniCase<String>]) -> Result<Vec<DirectoryEntry>>;

    async fn close(&mut self) -> Result<()>;
}
