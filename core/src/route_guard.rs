//! Coarse pre-render gate plus the finer role check run after bootstrap.
//!
//! [`evaluate`] only looks at the path and whether a session marker is
//! present. It never validates the marker; a forged or expired cookie gets
//! through here and is caught by the profile probe in
//! [`crate::session::bootstrap`].

use helpdesk_protocol::Role;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// Where an authenticated visitor of a public auth page is sent before their
/// role is known.
pub const DEFAULT_LANDING: &str = "/admin/triage";

const ADMIN_ROOT: &str = "/admin";
const MANAGER_ROOT: &str = "/manager";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

impl GuardDecision {
    fn redirect(to: &str) -> Self {
        GuardDecision::Redirect(to.to_string())
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::Redirect(to) => Some(to),
        }
    }
}

/// Pre-render decision for `path` (query string and fragment ignored).
pub fn evaluate(path: &str, has_marker: bool) -> GuardDecision {
    let path = normalize(path);

    if path == "/" {
        return GuardDecision::redirect(LOGIN_PATH);
    }
    if let Some(landing) = role_root_landing(path) {
        return GuardDecision::redirect(landing);
    }
    if is_protected(path) && !has_marker {
        tracing::debug!(path, "no session marker, redirecting to login");
        return GuardDecision::redirect(LOGIN_PATH);
    }
    if is_public_auth(path) && has_marker {
        return GuardDecision::redirect(DEFAULT_LANDING);
    }
    GuardDecision::Allow
}

/// Post-bootstrap check: the admin section is admin-only. Admins may open
/// manager views.
pub fn check_role(path: &str, role: Role) -> GuardDecision {
    let path = normalize(path);
    if in_section(path, ADMIN_ROOT) && role != Role::Admin {
        tracing::info!(path, %role, "role cannot view admin section");
        return GuardDecision::redirect(role.landing_page());
    }
    GuardDecision::Allow
}

/// Whether `path` sits under a section that needs a session.
pub fn is_protected(path: &str) -> bool {
    let path = normalize(path);
    in_section(path, ADMIN_ROOT) || in_section(path, MANAGER_ROOT)
}

pub fn is_public_auth(path: &str) -> bool {
    matches!(normalize(path), LOGIN_PATH | REGISTER_PATH)
}

/// Landing page a bare role root (`/admin`, `/manager`) forwards to.
pub fn role_root_target(path: &str) -> Option<&'static str> {
    role_root_landing(normalize(path))
}

fn role_root_landing(path: &str) -> Option<&'static str> {
    match path {
        ADMIN_ROOT => Some(Role::Admin.landing_page()),
        MANAGER_ROOT => Some(Role::Manager.landing_page()),
        _ => None,
    }
}

/// `/admin` and `/admin/...`, but not `/administrator`.
fn in_section(path: &str, root: &str) -> bool {
    path.strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Path component without query, fragment, or trailing slashes.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
