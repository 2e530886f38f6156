//! Ownership of open channels under their interpreter-visible names.

use std::collections::HashMap;

use anyhow::anyhow;

use crate::session::Session;
use crate::{Error, Result};

const CHANNEL_NAME_PREFIX: &str = "visa_session";

/// Owns every registered [`Session`], keyed by channel name.
pub struct Registry {
    channels: HashMap<String, Session>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            channels: HashMap::new(),
        }
    }

    /// Register a session under a generated name and hand out the name.
    ///
    /// On failure the session is dropped, which releases the underlying
    /// handle: an unregisterable session must not leak its connection.
    pub fn register(&mut self, session: Session) -> Result<String> {
        let name = format!("{}{}", CHANNEL_NAME_PREFIX, session.vi());
        if self.channels.contains_key(&name) {
            return Err(Error::argument(anyhow!(
                "channel {} is already registered",
                name
            )));
        }
        log::debug!("registering channel {}", name);
        self.channels.insert(name.clone(), session);
        Ok(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Session> {
        self.channels
            .get_mut(name)
            .ok_or_else(|| Error::BadChannel(name.to_string()))
    }

    /// Close a channel and drop it from the registry. If the close fails the
    /// entry stays registered so the close can be retried.
    pub fn close(&mut self, name: &str) -> Result<()> {
        let session = self
            .channels
            .get_mut(name)
            .ok_or_else(|| Error::BadChannel(name.to_string()))?;
        session.close()?;
        log::debug!("dropping channel {}", name);
        self.channels.remove(name);
        Ok(())
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
