//! Caching people lookups and password checks against an LDAP directory.
//!
//! Usernames are resolved with one batched search per request, cached with a time-to-live and
//! projected onto the requested attributes. Passwords are verified by binding as the user.
//!
//! ```no_run
//! # async fn run() -> ldap_people::Result<()> {
//! use std::sync::Arc;
//! use ldap_people::{DirectoryConfig, LdapConnector, MemoryCache, PeopleDirectory};
//!
//! let config = DirectoryConfig::load("people.toml")?;
//! let mut people = PeopleDirectory::new(config, LdapConnector::new(), Arc::new(MemoryCache::new()))?;
//!
//! let mail = people.people("alice").await?.get("mail").await?;
//! println!("{}", mail.as_scalar().map(|v| v.to_string()).unwrap_or_default());
//!
//! let ok = people.authenticate("alice", "hunter2").await;
//! people.close().await?;
//! # let _ = ok;
//! # Ok(())
//! # }
//! ```

mod auth;
pub mod cache;
pub mod command;
pub mod config;
pub mod connection;
pub mod directory;
pub mod error;
pub mod ldap;
pub mod people;
pub mod projection;
pub mod query;
#[cfg(test)]
mod testing;


pub use crate::cache::{CacheStore, MemoryCache};
pub use crate::command::{Command, CommandOutput};
pub use crate::config::DirectoryConfig;
pub use crate::directory::{AttributeValue, Connector, DirectoryEntry, Session};
pub use crate::error::{Error, Result};
pub use crate::ldap::{LdapConnection, LdapConnector};
pub use crate::people::PeopleDirectory;
pub use crate::projection::{AttributeSelection, PeopleQuery, Projection};
pub use crate::query::{IntoUsernames, Usernames};
