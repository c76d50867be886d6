//! Client-side session handling for the dashboard
//!
//! The session holds the bearer token and the profile derived from it. Its
//! transitions live in [`state`] as a pure reducer; [`controller`] performs the
//! resulting effects against [`storage`], the auth service [`client`] and a
//! navigator supplied by the embedding UI.

pub mod client;
pub mod controller;
pub mod routes;
pub mod state;
pub mod storage;

pub use client::{AuthClient, ClientError, TokenGrant};
pub use controller::{Navigator, PendingFetch, ProfileSource, SessionController, SessionError};
pub use state::{Action, Effect, Profile, ProfileFailure, SessionState};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
