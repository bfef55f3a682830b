use indexmap::IndexMap;
use serde::Serialize;

use crate::directory::{AttributeValue, Connector};
use crate::error::{Error, Result};
use crate::people::PeopleDirectory;
use crate::query::{IntoUsernames, Usernames};


const ATTRIBUTE_DELIMITER: char = ',';


/// Which attributes to project.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AttributeSelection {
    /// Every configured attribute.
    #[default]
    All,

    List(Vec<String>),

    /// One attribute; combined with a single username, its value is returned unwrapped.
    Single(String),
}
impl AttributeSelection {
    /// Parses a single attribute name or a comma-delimited list of them.
    pub fn parse(request: &str) -> Self {
        let request = request.trim();
        if request.len() == 0 {
            Self::All
        } else if request.contains(ATTRIBUTE_DELIMITER) {
            let names: Vec<String> = request
                .split(ATTRIBUTE_DELIMITER)
                .map(|n| n.trim())
                .filter(|n| n.len() > 0)
                .map(|n| n.to_owned())
                .collect();
            Self::List(names).normalized()
        } else {
            Self::Single(request.to_owned())
        }
    }

    fn normalized(self) -> Self {
        match self {
            Self::List(names) if names.is_empty() => Self::All,
            other => other,
        }
    }

    /// The attribute names this selection stands for.
    pub fn resolve(&self, configured: &[String]) -> Vec<String> {
        match self {
            Self::All => configured.to_vec(),
            Self::List(names) => names.clone(),
            Self::Single(name) => vec![name.clone()],
        }
    }
}
impl From<&str> for AttributeSelection {
    fn from(value: &str) -> Self { Self::parse(value) }
}
impl From<Option<&str>> for AttributeSelection {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(v) => Self::parse(v),
            None => Self::All,
        }
    }
}
impl From<Vec<String>> for AttributeSelection {
    fn from(value: Vec<String>) -> Self { Self::List(value).normalized() }
}
impl From<&[&str]> for AttributeSelection {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|v| (*v).to_owned()).collect()).normalized()
    }
}
impl<const N: usize> From<[&str; N]> for AttributeSelection {
    fn from(value: [&str; N]) -> Self { Self::from(&value[..]) }
}


/// The rendered answer to a lookup.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Projection {
    /// The first value of one attribute of one person.
    Scalar(AttributeValue),

    /// Username to attribute name to first value, in request order. Unknown people and attributes
    /// are left out.
    Table(IndexMap<String, IndexMap<String, AttributeValue>>),
}
impl Projection {
    pub fn as_scalar(&self) -> Option<&AttributeValue> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&IndexMap<String, IndexMap<String, AttributeValue>>> {
        match self {
            Self::Scalar(_) => None,
            Self::Table(t) => Some(t),
        }
    }
}


impl<C: Connector> PeopleDirectory<C> {
    /// Projects already looked-up entries without contacting the directory.
    pub async fn render(&self, usernames: &Usernames, attributes: &AttributeSelection) -> Result<Projection> {
        let attribute_names = attributes.resolve(&self.config.attributes);

        if let ([username], [attribute]) = (usernames.as_slice(), attribute_names.as_slice()) {
            let entry = self.get_store(username)
                .await
                .ok_or_else(|| Error::not_found(format!("person {:?}", username)))?;
            let value = entry.first_value(attribute)
                .ok_or_else(|| Error::not_found(format!("attribute {:?} of {:?}", attribute, username)))?;
            return Ok(Projection::Scalar(value));
        }

        let mut table = IndexMap::new();
        for username in usernames {
            let Some(entry) = self.get_store(username).await
                else { continue };
            let row = attribute_names
                .iter()
                .filter_map(|name| entry.first_value(name).map(|v| (name.clone(), v)))
                .collect();
            table.insert(username.clone(), row);
        }
        Ok(Projection::Table(table))
    }

    /// Looks up the given people and returns a handle for projecting their attributes.
    pub async fn people<U: IntoUsernames>(&mut self, usernames: U) -> Result<PeopleQuery<'_, C>> {
        let usernames = usernames.into_usernames()?;
        self.lookup(&usernames).await?;
        Ok(PeopleQuery {
            directory: self,
            usernames,
        })
    }
}


/// People that have been looked up, ready to be projected.
pub struct PeopleQuery<'a, C: Connector> {
    directory: &'a PeopleDirectory<C>,
    usernames: Usernames,
}
impl<'a, C: Connector> PeopleQuery<'a, C> {
    pub fn usernames(&self) -> &Usernames { &self.usernames }

    pub async fn get<A: Into<AttributeSelection>>(&self, attributes: A) -> Result<Projection> {
        self.directory.render(&self.usernames, &attributes.into()).await
    }

    pub async fn all(&self) -> Result<Projection> {
        self.get(AttributeSelection::All).await
    }

    /// Projects exactly one attribute.
    pub async fn get_attribute(&self, name: &str) -> Result<Projection> {
        self.get(AttributeSelection::Single(name.trim().to_owned())).await
    }
}
