//! Drives [`SessionState`] against real storage, network and navigation

use async_trait::async_trait;
use std::{io, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    client::{AuthClient, ClientError},
    state::{Action, Effect, Profile, SessionState},
    storage::TokenStorage,
};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Token storage failed: {0}")]
    Storage(#[from] io::Error),
}

/// Anything able to resolve a token into its owner's profile
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ClientError>;
}

#[async_trait]
impl ProfileSource for AuthClient {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ClientError> {
        self.me(token).await
    }
}

/// Moves the user between views
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Profile fetch requested by the reducer and not yet performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub epoch: u64,
    pub token: String,
}

#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    storage: Arc<dyn TokenStorage>,
    profiles: Arc<dyn ProfileSource>,
    navigator: Arc<dyn Navigator>,
}

impl SessionController {
    pub fn new(
        storage: Arc<dyn TokenStorage>,
        profiles: Arc<dyn ProfileSource>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            storage,
            profiles,
            navigator,
        }
    }

    /// Reduce `action` and perform its effects, except profile fetches which are returned
    ///
    /// The state guard is held until storage and navigation effects are done,
    /// so durable storage always reflects transitions in the order they were reduced.
    pub async fn dispatch(&self, action: Action) -> Result<Vec<PendingFetch>, SessionError> {
        let mut state = self.state.lock().await;
        let effects = state.reduce(action);

        let mut fetches = Vec::new();
        for effect in effects {
            match effect {
                Effect::PersistToken(token) => self.storage.store(&token).await?,
                Effect::ClearToken => self.storage.clear().await?,
                Effect::Redirect(path) => {
                    debug!("Redirecting to {}", path);
                    self.navigator.redirect(&path);
                }
                Effect::FetchProfile { epoch, token } => {
                    fetches.push(PendingFetch { epoch, token })
                }
            }
        }
        drop(state);
        Ok(fetches)
    }

    /// Perform a fetch and feed its outcome back into the session
    pub async fn complete(&self, fetch: PendingFetch) -> Result<(), SessionError> {
        let action = match self.profiles.fetch_profile(&fetch.token).await {
            Ok(profile) => Action::ProfileLoaded {
                epoch: fetch.epoch,
                profile,
            },
            Err(e) => {
                debug!("Profile fetch for epoch {} failed: {}", fetch.epoch, e);
                Action::ProfileFailed {
                    epoch: fetch.epoch,
                    failure: e.profile_failure(),
                }
            }
        };
        // Loaded and failed results never ask for another fetch
        self.dispatch(action).await?;
        Ok(())
    }

    async fn run(&self, action: Action) -> Result<(), SessionError> {
        for fetch in self.dispatch(action).await? {
            self.complete(fetch).await?;
        }
        Ok(())
    }

    /// Restore the persisted token and settle on `path`
    pub async fn start(&self, path: &str) -> Result<(), SessionError> {
        let token = self.storage.load().await?;
        info!("Session starting, token present: {}", token.is_some());
        self.run(Action::Hydrate {
            token,
            path: path.to_string(),
        })
        .await
    }

    pub async fn login(&self, token: String) -> Result<(), SessionError> {
        self.run(Action::Login { token }).await
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.run(Action::Logout).await
    }

    pub async fn navigate(&self, path: &str) -> Result<(), SessionError> {
        self.run(Action::Navigate {
            path: path.to_string(),
        })
        .await
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }
}
