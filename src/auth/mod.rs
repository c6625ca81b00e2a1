//! Authentication and session management
//!
//! The flow: [`SessionResolver`] reads the token store and user cache and,
//! when needed, asks the backend who the token belongs to. [`AuthContext`]
//! owns the resulting session state and is what the rest of the crate reads.
//! [`RouteGuard`] turns that state into navigation decisions.
//!
//! Tokens are secrets: they are never logged and their `Debug` output is
//! redacted.

pub mod client;
pub mod context;
pub mod guard;
pub mod models;
pub mod session;
pub mod validation;

pub use client::{AuthApi, HttpAuthApi};
pub use context::{AuthContext, SessionState};
pub use guard::{decide, GuardState, RouteGuard, RouteRule, ROUTE_RULES};
pub use models::{AuthToken, LoginRequest, Role, User};
pub use session::{Resolution, SessionResolver};
