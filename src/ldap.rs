use std::collections::BTreeMap;

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, warn};
use unicase::UniCase;

use crate::directory::{Connector, DirectoryEntry, Session};
use crate::error::{Error, Result};


/// Result code of a bind with a wrong DN or password.
const RC_INVALID_CREDENTIALS: u32 = 49;


/// Opens sessions with `ldap3`.
///
/// `ldap3` always speaks LDAPv3 and hands referrals back to the caller instead of following them,
/// so no further session options are required.
#[derive(Clone, Default)]
pub struct LdapConnector {
    settings: Option<LdapConnSettings>,
}
impl LdapConnector {
    pub fn new() -> Self { Self::default() }

    pub fn with_settings(settings: LdapConnSettings) -> Self {
        Self { settings: Some(settings) }
    }
}
#[async_trait]
impl Connector for LdapConnector {
    type Session = LdapConnection;

    async fn connect(&self, server_url: &str) -> Result<Self::Session> {
        let settings = self.settings.clone().unwrap_or_else(LdapConnSettings::new);
        debug!("connecting to LDAP server {}", server_url);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, server_url)
            .await
            .map_err(|e| Error::Connection {
                server: server_url.to_owned(),
                reason: e.to_string(),
            })?;
        ldap3::drive!(conn);
        Ok(LdapConnection::new(ldap))
    }
}


#[derive(Debug)]
pub struct LdapConnection {
    ldap: ldap3::Ldap,
}
impl LdapConnection {
    pub fn new(ldap: ldap3::Ldap) -> Self { Self { ldap } }
}
#[async_trait]
impl Session for LdapConnection {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<bool> {
        let ldap_result = self.ldap.simple_bind(dn, password)
            .await
            .map_err(|e| Error::Directory(format!("bind as {:?} failed: {}", dn, e)))?;
        match ldap_result.rc {
            0 => Ok(true),
            RC_INVALID_CREDENTIALS => Ok(false),
            rc => Err(Error::Directory(format!(
                "bind as {:?} failed with result code {}: {}", dn, rc, ldap_result.text,
            ))),
        }
    }

    async fn search(&mut self, base_dn: &str, filter: &str, attribute_names: &[UniCase<String>]) -> Result<Vec<DirectoryEntry>> {
        let ldap_attribute_names: Vec<&str> = attribute_names
            .into_iter()
            .map(|n| n.as_ref())
            .collect();
        let ldap_response = self.ldap.search(
            base_dn,
            Scope::Subtree,
            filter,
            ldap_attribute_names,
        )
            .await
            .map_err(|e| Error::Directory(format!("search below {:?} failed: {}", base_dn, e)))?;
        let (ldap_entries, _) = ldap_response
            .success()
            .map_err(|e| Error::Directory(format!("search below {:?} failed: {}", base_dn, e)))?;

        let mut entries = Vec::with_capacity(ldap_entries.len());
        for ldap_entry in ldap_entries {
            let search_entry = SearchEntry::construct(ldap_entry);
            let mut attributes = BTreeMap::new();
            for (key, string_values) in search_entry.attrs {
                let all_values: &mut Vec<Vec<u8>> = attributes
                    .entry(UniCase::new(key))
                    .or_insert_with(Vec::new);
                for string_value in string_values {
                    all_values.push(string_value.into_bytes());
                }
            }
            for (key, bytes_values) in search_entry.bin_attrs {
                let all_values = attributes
                    .entry(UniCase::new(key))
                    .or_insert_with(Vec::new);
                for bytes_value in bytes_values {
                    all_values.push(bytes_value);
                }
            }
            entries.push(DirectoryEntry {
                dn: search_entry.dn,
                attributes,
            });
        }
        Ok(entries)
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.ldap.unbind().await {
            warn!("failed to unbind from LDAP server: {}", e);
            return Err(Error::Directory(format!("unbind failed: {}", e)));
        }
        Ok(())
    }
}
