use crate::directory::Connector;
use crate::error::{Error, Result};
use crate::people::PeopleDirectory;
use crate::projection::{AttributeSelection, Projection};
use crate::query::Usernames;


#[derive(Clone, Eq, Hash, PartialEq)]
pub enum Command {
    People {
        usernames: Usernames,
        attributes: AttributeSelection,
    },
    Auth {
        userid: String,
        password: String,
    },
}
impl Command {
    /// Builds a command from its name and positional arguments.
    pub fn from_name<S: AsRef<str>>(name: &str, arguments: &[S]) -> Result<Self> {
        match name {
            "people" => Ok(Self::People {
                usernames: Usernames::from_list(arguments)?,
                attributes: AttributeSelection::All,
            }),
            "auth" => match arguments {
                [userid, password] => Ok(Self::Auth {
                    userid: userid.as_ref().to_owned(),
                    password: password.as_ref().to_owned(),
                }),
                _ => Err(Error::Validation(
                    "auth takes a user ID and a password".to_owned()
                )),
            },
            other => Err(Error::NotImplemented(other.to_owned())),
        }
    }

    pub fn with_attributes(self, selection: AttributeSelection) -> Self {
        match self {
            Self::People { usernames, .. } => Self::People { usernames, attributes: selection },
            auth => auth,
        }
    }
}
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::People { usernames, attributes } => f.debug_struct("People")
                .field("usernames", usernames)
                .field("attributes", attributes)
                .finish(),
            Self::Auth { userid, .. } => f.debug_struct("Auth")
                .field("userid", userid)
                .finish_non_exhaustive(),
        }
    }
}


#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandOutput {
    People(Projection),
    Auth(bool),
}


impl<C: Connector> PeopleDirectory<C> {
    pub async fn execute(&mut self, command: Command) -> Result<CommandOutput> {
        match command {
            Command::People { usernames, attributes } => {
                self.lookup(&usernames).await?;
                let projection = self.render(&usernames, &attributes).await?;
                Ok(CommandOutput::People(projection))
            },
            Command::Auth { userid, password } => {
                Ok(CommandOutput::Auth(self.authenticate(userid.as_str(), password.as_str()).await))
            },
        }
    }
}
