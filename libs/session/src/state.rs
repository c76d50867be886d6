//! Session state machine
//!
//! The session is a pure reducer: actions go in, effects come out, and the
//! caller performs the effects. Every change of token, and every navigation
//! while holding one, starts a new epoch. Profile results carry the epoch of
//! the fetch that produced them and are dropped when it is no longer current,
//! so a slow response can never undo a later login or logout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::{HOME_ROUTE, LOGIN_ROUTE, is_public};

/// Profile returned by the identity endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Why a profile fetch failed, as far as the session cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFailure {
    /// The server reported the token as expired
    Expired,
    /// The server reported the token as revoked
    Revoked,
    /// Anything else: network trouble, server errors, unexpected bodies
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start-up with whatever token durable storage held
    Hydrate { token: Option<String>, path: String },
    Login { token: String },
    Logout,
    Navigate { path: String },
    ProfileLoaded { epoch: u64, profile: Profile },
    ProfileFailed { epoch: u64, failure: ProfileFailure },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PersistToken(String),
    ClearToken,
    FetchProfile { epoch: u64, token: String },
    Redirect(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    token: Option<String>,
    profile: Option<Profile>,
    epoch: u64,
    path: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Route currently shown
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Apply `action`, returning the effects the caller must perform in order
    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Hydrate { token, path } => {
                self.token = token;
                self.profile = None;
                self.path = path;
                self.epoch += 1;
                self.fetch_or_guard()
            }
            Action::Login { token } => {
                self.token = Some(token.clone());
                self.profile = None;
                self.epoch += 1;
                self.path = HOME_ROUTE.to_string();
                vec![
                    Effect::PersistToken(token.clone()),
                    Effect::FetchProfile {
                        epoch: self.epoch,
                        token,
                    },
                    Effect::Redirect(HOME_ROUTE.to_string()),
                ]
            }
            Action::Logout => self.logout(),
            Action::Navigate { path } => {
                self.path = path;
                if self.token.is_some() {
                    self.epoch += 1;
                }
                self.fetch_or_guard()
            }
            Action::ProfileLoaded { epoch, profile } => {
                if epoch == self.epoch && self.token.is_some() {
                    self.profile = Some(profile);
                }
                Vec::new()
            }
            Action::ProfileFailed { epoch, failure } => {
                if epoch != self.epoch || self.token.is_none() {
                    return Vec::new();
                }
                match failure {
                    ProfileFailure::Expired | ProfileFailure::Revoked => self.logout(),
                    ProfileFailure::Other => {
                        self.profile = None;
                        Vec::new()
                    }
                }
            }
        }
    }

    fn logout(&mut self) -> Vec<Effect> {
        self.token = None;
        self.profile = None;
        self.epoch += 1;
        self.path = LOGIN_ROUTE.to_string();
        vec![Effect::ClearToken, Effect::Redirect(LOGIN_ROUTE.to_string())]
    }

    /// Fetch the profile when holding a token, otherwise keep the user on public views
    fn fetch_or_guard(&mut self) -> Vec<Effect> {
        match &self.token {
            Some(token) => vec![Effect::FetchProfile {
                epoch: self.epoch,
                token: token.clone(),
            }],
            None if is_public(&self.path) => Vec::new(),
            None => {
                self.path = LOGIN_ROUTE.to_string();
                vec![Effect::Redirect(LOGIN_ROUTE.to_string())]
            }
        }
    }
}
