//! Signed-in user and bearer token.
//!
//! The session is the client's auth guard: it only checks that a token is
//! present, it never validates one. Changes of the current user are
//! broadcast through a `watch` channel so the counts controller can react to
//! login, logout and account switches.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{info, warn};

use findernate_shared::constants::{STORE_KEY_TOKEN, STORE_KEY_USER};
use findernate_shared::CurrentUser;

use crate::error::{ClientError, Result};
use crate::state::{lock, SharedStore};

pub struct Session {
    store: SharedStore,
    token: Mutex<Option<String>>,
    user_tx: watch::Sender<Option<CurrentUser>>,
}

impl Session {
    /// Reload the persisted session, if any.
    ///
    /// A user record that no longer decodes is discarded and the session
    /// starts signed out.
    pub fn restore(store: SharedStore) -> Result<Self> {
        let (user, token) = {
            let db = lock(&store)?;
            let user = match db.kv_get_json::<CurrentUser>(STORE_KEY_USER) {
                Ok(user) => user,
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable stored user");
                    db.kv_remove(STORE_KEY_USER)?;
                    None
                }
            };
            (user, db.kv_get(STORE_KEY_TOKEN)?)
        };

        // A user without a token (or the reverse) is not a usable session.
        let (user, token) = match (user, token) {
            (Some(user), Some(token)) if !token.is_empty() => (Some(user), Some(token)),
            _ => (None, None),
        };

        if let Some(ref user) = user {
            info!(user = %user.id, "Restored session");
        }

        let (user_tx, _) = watch::channel(user);
        Ok(Self {
            store,
            token: Mutex::new(token),
            user_tx,
        })
    }

    /// Persist and activate a session.
    pub fn login(&self, user: CurrentUser, token: String) -> Result<()> {
        if token.is_empty() {
            return Err(ClientError::NotSignedIn);
        }

        {
            let db = lock(&self.store)?;
            db.kv_set_json(STORE_KEY_USER, &user)?;
            db.kv_set(STORE_KEY_TOKEN, &token)?;
        }

        *lock(&self.token)? = Some(token);
        info!(user = %user.id, "Signed in");
        self.user_tx.send_replace(Some(user));
        Ok(())
    }

    /// Forget the session locally and in the store.
    pub fn logout(&self) -> Result<()> {
        {
            let db = lock(&self.store)?;
            db.kv_remove(STORE_KEY_USER)?;
            db.kv_remove(STORE_KEY_TOKEN)?;
        }

        *lock(&self.token)? = None;
        if self.user_tx.send_replace(None).is_some() {
            info!("Signed out");
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.user_tx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        lock(&self.token).ok().and_then(|guard| guard.clone())
    }

    /// Token presence check used to gate authenticated screens.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && self.user_tx.borrow().is_some()
    }

    /// Receiver notified whenever the current user changes.
    pub fn watch(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.user_tx.subscribe()
    }
}
