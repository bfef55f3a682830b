use tracing::{debug, info, warn};

use crate::directory::{Connector, Session};
use crate::error::{Error, Result};


/// Owns the one session of a [`PeopleDirectory`](crate::people::PeopleDirectory).
///
/// The session is opened on first use and kept until [`close`](Self::close) is called or the
/// manager is dropped. A session that failed is not reopened automatically.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    server_url: String,
    bind_dn: String,
    bind_password: String,
    session: Option<C::Session>,
    bound: bool,
}
impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, server_url: String, bind_dn: String, bind_password: String) -> Self {
        Self {
            connector,
            server_url,
            bind_dn,
            bind_password,
            session: None,
            bound: false,
        }
    }

    pub fn is_connected(&self) -> bool { self.session.is_some() }
    pub fn is_bound(&self) -> bool { self.bound }

    /// Opens the session unless it is already open.
    pub async fn connect(&mut self) -> Result<&mut C::Session> {
        let session = match self.session.take() {
            Some(s) => s,
            None => {
                info!("connecting to directory server {}", self.server_url);
                self.bound = false;
                self.connector.connect(&self.server_url).await?
            },
        };
        Ok(self.session.insert(session))
    }

    /// Binds the session with the administrative credentials unless that has already happened.
    pub async fn bind(&mut self) -> Result<&mut C::Session> {
        if self.bound {
            return self.connect().await;
        }
        let bind_dn = self.bind_dn.clone();
        let bind_password = self.bind_password.clone();
        let session = self.connect().await?;
        debug!("binding as {}", bind_dn);
        if !session.bind(&bind_dn, &bind_password).await? {
            warn!("administrative bind as {} was rejected", bind_dn);
            return Err(Error::Auth { bind_dn });
        }
        self.bound = true;
        self.connect().await
    }

    /// Binds the session with someone else's credentials.
    ///
    /// Whatever the outcome, the session no longer counts as administratively bound, so the next
    /// [`bind`](Self::bind) restores the administrative identity.
    pub async fn rebind_as(&mut self, dn: &str, password: &str) -> Result<bool> {
        let session = self.connect().await?;
        let outcome = session.bind(dn, password).await;
        self.bound = false;
        outcome
    }

    /// Releases the session. Calling this again without reconnecting does nothing.
    pub async fn close(&mut self) -> Result<()> {
        self.bound = false;
        match self.session.take() {
            Some(mut session) => {
                debug!("closing session to {}", self.server_url);
                session.close().await
            },
            None => Ok(()),
        }
    }
}
