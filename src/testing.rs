//! An in-memory directory server for tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use unicase::UniCase;

use crate::directory::{Connector, DirectoryEntry, Session};
use crate::error::{Error, Result};


pub(crate) const ADMIN_DN: &str = "cn=admin,dc=example,dc=com";
pub(crate) const ADMIN_PASSWORD: &str = "adminpw";


#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct Stats {
    pub connects: usize,
    pub binds: usize,
    pub searches: usize,
    pub closes: usize,
}


#[derive(Default)]
struct State {
    // uid -> (entry, password)
    people: BTreeMap<String, (DirectoryEntry, String)>,
    unreachable: bool,
    stats: Stats,
    filters: Vec<String>,
    requested_attributes: Vec<Vec<String>>,
}


#[derive(Clone, Default)]
pub(crate) struct FakeDirectory {
    state: Arc<Mutex<State>>,
}
impl FakeDirectory {
    /// Holds `alice` (password `rightpw`) and `bob` (password `bobpw`).
    pub fn example() -> Self {
        let directory = Self::default();
        directory.add_person(
            DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=com".to_owned())
                .with_attribute("uid", "alice")
                .with_attribute("cn", "Alice Example")
                .with_attribute("mail", "alice@example.com")
                .with_attribute("mail", "alice.example@example.com"),
            "rightpw",
        );
        directory.add_person(
            DirectoryEntry::new("uid=bob,ou=people,dc=example,dc=com".to_owned())
                .with_attribute("uid", "bob")
                .with_attribute("cn", "Bob Example")
                .with_attribute("mail", "bob@example.com"),
            "bobpw",
        );
        directory
    }

    pub fn add_person(&self, entry: DirectoryEntry, password: &str) {
        let uid = entry.first_value("uid")
            .map(|v| v.to_string())
            .unwrap_or_default();
        self.state.lock().unwrap()
            .people.insert(uid, (entry, password.to_owned()));
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn stats(&self) -> Stats {
        self.state.lock().unwrap().stats
    }

    pub fn filters(&self) -> Vec<String> {
        self.state.lock().unwrap().filters.clone()
    }

    pub fn requested_attributes(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().requested_attributes.clone()
    }
}
#[async_trait]
impl Connector for FakeDirectory {
    type Session = FakeSession;

    async fn connect(&self, server_url: &str) -> Result<Self::Session> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(Error::Connection {
                server: server_url.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        state.stats.connects += 1;
        Ok(FakeSession {
            state: Arc::clone(&self.state),
            bound_as: None,
        })
    }
}


pub(crate) struct FakeSession {
    state: Arc<Mutex<State>>,
    bound_as: Option<String>,
}
#[async_trait]
impl Session for FakeSession {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(Error::Directory("connection reset".to_owned()));
        }
        state.stats.binds += 1;
        let accepted = if dn == ADMIN_DN {
            password == ADMIN_PASSWORD
        } else {
            state.people.values()
                .any(|(entry, pw)| entry.dn == dn && pw == password)
        };
        self.bound_as = if accepted { Some(dn.to_owned()) } else { None };
        Ok(accepted)
    }

    async fn search(&mut self, _base_dn: &str, filter: &str, attribute_names: &[UniCase<String>]) -> Result<Vec<DirectoryEntry>> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(Error::Directory("connection reset".to_owned()));
        }
        if self.bound_as.as_deref() != Some(ADMIN_DN) {
            return Err(Error::Directory("insufficient access rights".to_owned()));
        }
        state.stats.searches += 1;
        state.filters.push(filter.to_owned());
        state.requested_attributes.push(
            attribute_names.iter().map(|a| a.to_string()).collect()
        );
        // uid matches case-insensitively, as on a real server
        let lowercase_filter = filter.to_lowercase();
        let found = state.people.iter()
            .filter(|(uid, _)| lowercase_filter.contains(&format!("(uid={})", uid.to_lowercase())))
            .map(|(_, (entry, _))| entry.clone())
            .collect();
        Ok(found)
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().stats.closes += 1;
        Ok(())
    }
}
