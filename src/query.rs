use std::str::FromStr;

use ldap3::ldap_escape;
use tracing::{debug, info, warn};

use crate::config::USERNAME_PLACEHOLDER;
use crate::directory::{Connector, Session};
use crate::error::{Error, Result};
use crate::people::PeopleDirectory;


const USERNAME_DELIMITER: char = ',';
const WILDCARD: &str = "*";


/// An ordered list of distinct usernames.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Usernames(Vec<String>);
impl Usernames {
    /// Parses a single username or a comma-delimited list of them.
    pub fn parse(request: &str) -> Result<Self> {
        Self::from_list([request])
    }

    /// Collects usernames from a list; every item may itself be comma-delimited.
    pub fn from_list<I, S>(requests: I) -> Result<Self>
        where
            I: IntoIterator<Item = S>,
            S: AsRef<str>,
    {
        let mut usernames = Self::default();
        for request in requests {
            for piece in request.as_ref().split(USERNAME_DELIMITER) {
                usernames.push(piece)?;
            }
        }
        Ok(usernames)
    }

    /// A request for exactly one username, taken verbatim apart from surrounding whitespace.
    pub fn single(username: &str) -> Result<Self> {
        let mut usernames = Self::default();
        usernames.push(username)?;
        if usernames.is_empty() {
            return Err(Error::Validation("empty username".to_owned()));
        }
        Ok(usernames)
    }

    fn push(&mut self, username: &str) -> Result<()> {
        let username = username.trim();
        if username == WILDCARD {
            return Err(Error::Validation("cannot enumerate entire directory".to_owned()));
        }
        if username.len() > 0 && !self.0.iter().any(|u| u == username) {
            self.0.push(username.to_owned());
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn as_slice(&self) -> &[String] { &self.0 }
    pub fn iter(&self) -> std::slice::Iter<'_, String> { self.0.iter() }
}
impl FromStr for Usernames {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}
impl<'a> IntoIterator for &'a Usernames {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}


/// Anything a username request can be given as.
pub trait IntoUsernames {
    fn into_usernames(self) -> Result<Usernames>;
}
impl IntoUsernames for Usernames {
    fn into_usernames(self) -> Result<Usernames> { Ok(self) }
}
impl IntoUsernames for &Usernames {
    fn into_usernames(self) -> Result<Usernames> { Ok(self.clone()) }
}
impl IntoUsernames for &str {
    fn into_usernames(self) -> Result<Usernames> { Usernames::parse(self) }
}
impl IntoUsernames for &String {
    fn into_usernames(self) -> Result<Usernames> { Usernames::parse(self) }
}
impl IntoUsernames for String {
    fn into_usernames(self) -> Result<Usernames> { Usernames::parse(&self) }
}
impl<S: AsRef<str>> IntoUsernames for Vec<S> {
    fn into_usernames(self) -> Result<Usernames> { Usernames::from_list(self) }
}
impl<S: AsRef<str>> IntoUsernames for &[S] {
    fn into_usernames(self) -> Result<Usernames> { Usernames::from_list(self) }
}
impl<S: AsRef<str>, const N: usize> IntoUsernames for [S; N] {
    fn into_usernames(self) -> Result<Usernames> { Usernames::from_list(self) }
}


/// Builds one filter matching any of the given usernames.
///
/// Each username is escaped and substituted for every placeholder in `base_filter`; the
/// resulting fragments are combined in an OR group.
pub fn build_filter<S: AsRef<str>>(base_filter: &str, usernames: &[S]) -> String {
    let mut filter = String::from("(|");
    for username in usernames {
        let username: &str = username.as_ref();
        let escaped = ldap_escape(username);
        filter.push_str(&base_filter.replace(USERNAME_PLACEHOLDER, &escaped));
    }
    filter.push(')');
    filter
}


impl<C: Connector> PeopleDirectory<C> {
    /// Makes sure the entries of the given usernames are buffered or cached.
    ///
    /// Usernames neither buffered nor cached are fetched with a single search. Usernames the
    /// directory does not know are left out without an error.
    pub async fn lookup(&mut self, usernames: &Usernames) -> Result<()> {
        let mut missing = Vec::new();
        for username in usernames {
            if self.in_store(username).await {
                debug!("{} is already known", username);
            } else {
                missing.push(username.as_str());
            }
        }
        if missing.is_empty() {
            return Ok(());
        }

        let people_dn = match self.config.peopledn.as_deref() {
            Some(dn) if dn.len() > 0 => dn.to_owned(),
            _ => return Err(Error::Config("no people DN configured".to_owned())),
        };
        let filter = build_filter(&self.config.basefilter, &missing);
        let attribute_names = self.config.attribute_names();

        let session = self.connection.bind().await?;
        debug!("searching below {} with filter {}", people_dn, filter);
        let entries = session.search(&people_dn, &filter, &attribute_names).await?;
        info!("found {} of {} requested people", entries.len(), missing.len());

        for entry in entries {
            let Some(key) = entry.first_value(&self.config.key) else {
                warn!("skipping {}: it has no {} attribute", entry.dn, self.config.key);
                continue;
            };
            self.store(&key.to_string(), entry).await;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryCache};
    use crate::directory::DirectoryEntry;
    use crate::people::tests::example_people;
    use crate::testing::FakeDirectory;

    fn names(usernames: &Usernames) -> Vec<&str> {
        usernames.iter().map(|u| u.as_str()).collect()
    }

    #[test]
    fn test_usernames_are_split_trimmed_and_deduplicated() {
        let usernames = Usernames::parse("bob, alice,,bob ,carol").unwrap();
        assert_eq!(names(&usernames), vec!["bob", "alice", "carol"]);

        let usernames = Usernames::from_list(["alice,bob", "alice", "dave"]).unwrap();
        assert_eq!(names(&usernames), vec!["alice", "bob", "dave"]);
    }

    #[test]
    fn test_wildcard_is_rejected() {
        assert!(matches!(Usernames::parse("*"), Err(Error::Validation(_))));
        assert!(matches!(Usernames::parse("alice, *"), Err(Error::Validation(_))));
        assert!(matches!(Usernames::single(" * "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_single_keeps_commas() {
        let usernames = Usernames::single(" smith, john ").unwrap();
        assert_eq!(names(&usernames), vec!["smith, john"]);
        assert!(matches!(Usernames::single("  "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_build_filter() {
        assert_eq!(
            build_filter("(uid=%uid)", &["alice", "bob"]),
            "(|(uid=alice)(uid=bob))",
        );
        assert_eq!(
            build_filter("(&(objectClass=person)(|(uid=%uid)(mail=%uid)))", &["alice"]),
            "(|(&(objectClass=person)(|(uid=alice)(mail=alice))))",
        );
    }

    #[test]
    fn test_build_filter_escapes_usernames() {
        assert_eq!(
            build_filter("(uid=%uid)", &["a*)(uid=b"]),
            "(|(uid=a\\2a\\29\\28uid=b))",
        );
    }

    #[tokio::test]
    async fn test_lookup_searches_once_for_all_missing() {
        let directory = FakeDirectory::example();
        let cache = MemoryCache::new();
        let mut people = example_people(&directory, &cache);

        people.lookup(&Usernames::parse("alice,bob,mallory").unwrap()).await.unwrap();

        assert_eq!(directory.stats().searches, 1);
        assert_eq!(directory.filters(), vec!["(|(uid=alice)(uid=bob)(uid=mallory))"]);
        assert_eq!(directory.requested_attributes(), vec![vec!["uid", "cn", "mail"]]);
        assert!(people.buffered("alice").is_some());
        assert!(people.buffered("bob").is_some());
        assert!(people.buffered("mallory").is_none());
        assert!(cache.has("alice").await);
        assert!(!cache.has("mallory").await);
    }

    #[tokio::test]
    async fn test_each_entry_is_stored_under_its_own_key() {
        let directory = FakeDirectory::example();
        let cache = MemoryCache::new();
        let mut people = example_people(&directory, &cache);

        people.lookup(&Usernames::parse("alice,bob").unwrap()).await.unwrap();

        let alice = people.buffered("alice").unwrap();
        let bob = people.buffered("bob").unwrap();
        assert_eq!(alice.dn, "uid=alice,ou=people,dc=example,dc=com");
        assert_eq!(bob.dn, "uid=bob,ou=people,dc=example,dc=com");
        assert_eq!(cache.get("bob").await.map(|e| e.dn), Some(bob.dn.clone()));
    }

    #[tokio::test]
    async fn test_second_lookup_does_not_search() {
        let directory = FakeDirectory::example();
        let cache = MemoryCache::new();
        let mut people = example_people(&directory, &cache);
        let usernames = Usernames::parse("alice,bob").unwrap();

        people.lookup(&usernames).await.unwrap();
        people.lookup(&usernames).await.unwrap();
        assert_eq!(directory.stats().searches, 1);

        // a fresh instance sharing the cache does not even connect
        let other_directory = FakeDirectory::example();
        let mut other = example_people(&other_directory, &cache);
        other.lookup(&usernames).await.unwrap();
        assert_eq!(other_directory.stats().connects, 0);
    }

    #[tokio::test]
    async fn test_only_missing_usernames_are_searched() {
        let directory = FakeDirectory::example();
        let cache = MemoryCache::new();
        cache.put(
            "alice",
            DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=com".to_owned())
                .with_attribute("uid", "alice"),
            std::time::Duration::from_secs(60),
        ).await;
        let mut people = example_people(&directory, &cache);

        people.lookup(&Usernames::parse("alice,bob").unwrap()).await.unwrap();
        assert_eq!(directory.filters(), vec!["(|(uid=bob))"]);
    }

    #[tokio::test]
    async fn test_missing_people_dn() {
        let directory = FakeDirectory::example();
        let mut people = example_people(&directory, &MemoryCache::new());
        people.config.peopledn = None;

        let result = people.lookup(&Usernames::parse("alice").unwrap()).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(directory.stats().connects, 0);
    }

    #[tokio::test]
    async fn test_entries_are_keyed_by_the_key_attribute() {
        let directory = FakeDirectory::example();
        let mut people = example_people(&directory, &MemoryCache::new());
        people.config.key = "cn".to_owned();

        people.lookup(&Usernames::parse("alice").unwrap()).await.unwrap();
        assert!(people.buffered("Alice Example").is_some());
        assert!(people.buffered("alice").is_none());
    }

    #[tokio::test]
    async fn test_entries_without_key_are_skipped() {
        let directory = FakeDirectory::example();
        let cache = MemoryCache::new();
        let mut people = example_people(&directory, &cache);
        people.config.key = "employeeNumber".to_owned();

        people.lookup(&Usernames::parse("alice").unwrap()).await.unwrap();
        assert_eq!(directory.stats().searches, 1);
        assert!(people.buffered("alice").is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_usernames_match_stored_keys_regardless_of_case() {
        let directory = FakeDirectory::example();
        let cache = MemoryCache::new();
        let mut people = example_people(&directory, &cache);

        people.lookup(&Usernames::parse("Alice").unwrap()).await.unwrap();
        people.lookup(&Usernames::parse("ALICE,alice").unwrap()).await.unwrap();
        assert_eq!(directory.stats().searches, 1);

        let projection = people.people("Alice").await.unwrap()
            .get("mail").await.unwrap();
        assert_eq!(projection.as_scalar().map(|v| v.to_string()), Some("alice@example.com".to_owned()));
    }

    #[tokio::test]
    async fn test_unreachable_directory() {
        let directory = FakeDirectory::example();
        directory.set_unreachable(true);
        let mut people = example_people(&directory, &MemoryCache::new());

        let result = people.lookup(&Usernames::parse("alice").unwrap()).await;
        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
