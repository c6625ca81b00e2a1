//! Parkgate - sign in to the parking marketplace and manage your lots
//!
//! This is the library interface for Parkgate: durable session storage,
//! session resolution against the backend, the route guard, and typed
//! clients for the parking and plan endpoints.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod parking;
pub mod plan;
pub mod storage;

pub use auth::{AuthContext, GuardState, RouteGuard, SessionResolver, User};
pub use config::Config;
pub use error::{Error, ErrorKind};
