use thiserror::Error;


pub type Result<T> = std::result::Result<T, Error>;


#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// The directory server could not be reached.
    #[error("cannot connect to directory server {server}: {reason}")]
    Connection { server: String, reason: String },

    /// The administrative bind was rejected.
    #[error("cannot bind to the directory server as {bind_dn}")]
    Auth { bind_dn: String },

    /// A required configuration option is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("command {0:?} is not implemented")]
    NotImplemented(String),

    #[error("{what} not found")]
    NotFound { what: String },

    /// A search or bind failed at the protocol level on an established session.
    #[error("directory operation failed: {0}")]
    Directory(String),
}
impl Error {
    pub fn not_found<W: Into<String>>(what: W) -> Self {
        Self::NotFound { what: what.into() }
    }
}
