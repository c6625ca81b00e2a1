//! Role-based route gating
//!
//! [`decide`] maps `(path, user, loading)` to a [`GuardState`] using the
//! compiled-in [`ROUTE_RULES`]. [`RouteGuard`] wraps it for hosts that call it
//! on every change event and only want to hear about navigations once.
//!
//! This is a UX guard only. Real access control lives on the backend.

use std::fmt;

use crate::auth::models::{Role, User};

/// Login page; also the only guest-only page
pub const LOGIN_PATH: &str = "/auth";

/// Shown to authenticated users lacking the required role
pub const FORBIDDEN_PATH: &str = "/forbidden";

/// Default landing page for authenticated users
pub const HOME_PATH: &str = "/";

/// Query parameter carrying the original path on a login redirect
pub const REDIRECT_PARAM: &str = "redirect";

/// Pages an authenticated user is sent away from
pub const GUEST_ONLY_PATHS: &[&str] = &[LOGIN_PATH];

const PARTNER_ROLES: &[Role] = &[Role::Partner, Role::SuperAdmin];

/// Static mapping from a path pattern to its access requirements.
///
/// A pattern ending in `/*` matches its base path and everything below it.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRule {
    pub pattern: &'static str,
    pub roles: &'static [Role],
    pub needs_auth: bool,
}

/// The route table, first match wins
pub const ROUTE_RULES: &[RouteRule] = &[
    RouteRule {
        pattern: HOME_PATH,
        roles: PARTNER_ROLES,
        needs_auth: true,
    },
    RouteRule {
        pattern: "/account",
        roles: PARTNER_ROLES,
        needs_auth: true,
    },
    RouteRule {
        pattern: "/parking/*",
        roles: PARTNER_ROLES,
        needs_auth: true,
    },
    RouteRule {
        pattern: LOGIN_PATH,
        roles: &[],
        needs_auth: false,
    },
    RouteRule {
        pattern: FORBIDDEN_PATH,
        roles: &[],
        needs_auth: false,
    },
];

impl RouteRule {
    /// Check whether a normalised path falls under this rule
    pub fn matches(&self, path: &str) -> bool {
        if self.pattern == path {
            return true;
        }
        match self.pattern.strip_suffix("/*") {
            Some(base) => {
                path == base
                    || path
                        .strip_prefix(base)
                        .map_or(false, |rest| rest.starts_with('/'))
            }
            None => false,
        }
    }
}

/// Outcome of evaluating the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Session still resolving; show a placeholder
    Loading,
    Allowed,
    /// Not logged in; `target` carries the original path
    RedirectLogin { target: String },
    /// Logged in without a permitted role
    RedirectForbidden { target: String },
    /// Logged in on a guest-only page
    RedirectHome { target: String },
}

impl GuardState {
    /// Navigation target, for redirect states
    pub fn target(&self) -> Option<&str> {
        match self {
            GuardState::RedirectLogin { target }
            | GuardState::RedirectForbidden { target }
            | GuardState::RedirectHome { target } => Some(target),
            GuardState::Loading | GuardState::Allowed => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.target().is_some()
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardState::Loading => write!(f, "loading"),
            GuardState::Allowed => write!(f, "allowed"),
            GuardState::RedirectLogin { target } => write!(f, "redirect to login ({})", target),
            GuardState::RedirectForbidden { target } => {
                write!(f, "redirect to forbidden ({})", target)
            }
            GuardState::RedirectHome { target } => write!(f, "redirect to home ({})", target),
        }
    }
}

/// Drop query and fragment and trim a trailing slash
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        HOME_PATH
    } else {
        trimmed
    }
}

/// First rule matching the path
pub fn find_rule<'a>(rules: &'a [RouteRule], path: &str) -> Option<&'a RouteRule> {
    let path = normalize_path(path);
    rules.iter().find(|rule| rule.matches(path))
}

/// Login page URL carrying `path`, query included, as the return parameter
pub fn login_redirect(path: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_PARAM, path)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

/// Evaluate the guard against the compiled-in route table
pub fn decide(path: &str, user: Option<&User>, is_auth_loading: bool) -> GuardState {
    decide_with(ROUTE_RULES, path, user, is_auth_loading)
}

/// Evaluate the guard against an explicit route table
pub fn decide_with(
    rules: &[RouteRule],
    path: &str,
    user: Option<&User>,
    is_auth_loading: bool,
) -> GuardState {
    if is_auth_loading {
        return GuardState::Loading;
    }

    let normalized = normalize_path(path);
    let Some(rule) = rules.iter().find(|rule| rule.matches(normalized)) else {
        return GuardState::Allowed;
    };

    match (rule.needs_auth, user) {
        (true, None) => GuardState::RedirectLogin {
            target: login_redirect(if path.is_empty() { HOME_PATH } else { path }),
        },
        (true, Some(user)) => {
            let allowed = user.has_any_role(rule.roles);
            tracing::debug!("Role {} allowed on {}: {}", user.role, rule.pattern, allowed);
            if allowed {
                GuardState::Allowed
            } else {
                GuardState::RedirectForbidden {
                    target: FORBIDDEN_PATH.to_string(),
                }
            }
        }
        (false, Some(_)) if GUEST_ONLY_PATHS.contains(&normalized) => GuardState::RedirectHome {
            target: HOME_PATH.to_string(),
        },
        (false, _) => GuardState::Allowed,
    }
}

/// Stateful guard for change-driven hosts.
///
/// Feed it every `(path, user, loading)` change; it hands back a navigation
/// only when the outcome for the current path differs from the last one, so
/// repeated evaluation never issues the same redirect twice.
#[derive(Debug)]
pub struct RouteGuard {
    rules: &'static [RouteRule],
    last: Option<(String, GuardState)>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::with_rules(ROUTE_RULES)
    }

    pub fn with_rules(rules: &'static [RouteRule]) -> Self {
        Self { rules, last: None }
    }

    /// State from the most recent evaluation
    pub fn state(&self) -> Option<&GuardState> {
        self.last.as_ref().map(|(_, state)| state)
    }

    /// Re-evaluate after a change. Returns the navigation target to follow,
    /// if any.
    pub fn on_change(
        &mut self,
        path: &str,
        user: Option<&User>,
        is_auth_loading: bool,
    ) -> Option<String> {
        let state = decide_with(self.rules, path, user, is_auth_loading);
        let path = normalize_path(path).to_string();

        if let Some((last_path, last_state)) = &self.last {
            if *last_path == path && *last_state == state {
                return None;
            }
        }

        let navigation = state.target().map(str::to_string);
        if let Some(target) = &navigation {
            tracing::info!("Guard on {}: {}", path, state);
            tracing::debug!("Navigating to {}", target);
        }
        self.last = Some((path, state));
        navigation
    }
}
