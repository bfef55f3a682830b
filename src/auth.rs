use tracing::{debug, info, warn};

use crate::directory::Connector;
use crate::error::{Error, Result};
use crate::people::PeopleDirectory;
use crate::query::Usernames;


impl<C: Connector> PeopleDirectory<C> {
    /// Checks a password by binding as the user.
    ///
    /// Returns `false` without touching the directory if either argument is missing or empty. Any
    /// failure along the way, including an unreachable server or an unknown user, also yields
    /// `false`.
    pub async fn authenticate<'u, 'p, U, P>(&mut self, userid: U, password: P) -> bool
        where
            U: Into<Option<&'u str>>,
            P: Into<Option<&'p str>>,
    {
        let (Some(userid), Some(password)) = (userid.into(), password.into())
            else { return false };
        if userid.len() == 0 || password.len() == 0 {
            return false;
        }

        match self.try_authenticate(userid, password).await {
            Ok(true) => {
                info!("authenticated {}", userid);
                true
            },
            Ok(false) => {
                info!("rejected credentials for {}", userid);
                false
            },
            Err(e) => {
                warn!("cannot authenticate {}: {}", userid, e);
                false
            },
        }
    }

    async fn try_authenticate(&mut self, userid: &str, password: &str) -> Result<bool> {
        let usernames = Usernames::single(userid)?;
        self.lookup(&usernames).await?;

        let username = &usernames.as_slice()[0];
        let entry = self.get_store(username)
            .await
            .ok_or_else(|| Error::not_found(format!("person {:?}", username)))?;
        let user_dn = entry.first_value(&self.config.userdn)
            .ok_or_else(|| Error::not_found(format!("attribute {:?} of {:?}", self.config.userdn, username)))?
            .to_string();

        debug!("binding as {}", user_dn);
        self.connection.rebind_as(&user_dn, password).await
    }
}
