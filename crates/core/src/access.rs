//! Route guard decisions.
//!
//! Every navigation is checked against the current [`SessionState`] before a
//! view is produced. The functions here are pure: they return a [`Decision`]
//! and leave the actual redirect to the HTTP shell, so they are re-evaluated
//! on every request and on every change of session state.

use crate::identity::SessionState;
use crate::types::Role;

/// The root path. Never renders; always redirects.
pub const ROOT_PATH: &str = "/";
/// The sign-in page.
pub const SIGN_IN_PATH: &str = "/signin";
/// Root of the customer subtree.
pub const CUSTOMER_ROOT: &str = "/home";
/// Root of the admin subtree.
pub const ADMIN_ROOT: &str = "/admin";
/// Root of the rider subtree.
pub const RIDER_ROOT: &str = "/rider";

const CUSTOMER_ONLY: &[Role] = &[Role::Customer];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const RIDER_ONLY: &[Role] = &[Role::Rider];

/// Outcome of checking a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Produce the requested view.
    Render,
    /// Send the client elsewhere instead.
    RedirectTo(&'static str),
    /// Session resolution is still running; show a neutral loading state and
    /// do not redirect yet.
    Pending,
}

/// Landing page for a role.
#[must_use]
pub const fn resolve_default_route(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_ROOT,
        Role::Rider => RIDER_ROOT,
        Role::Customer => CUSTOMER_ROOT,
    }
}

/// Decide a navigation to `requested_path`.
///
/// `required_roles` restricts a protected path to the listed roles; `None`
/// only requires a signed-in identity. A role mismatch is corrected by
/// redirecting to the identity's own landing page rather than reported.
#[must_use]
pub fn authorize(
    session: &SessionState,
    requested_path: &str,
    required_roles: Option<&[Role]>,
) -> Decision {
    let identity = match session {
        SessionState::Resolving => return Decision::Pending,
        SessionState::Anonymous => None,
        SessionState::Authenticated(identity) => Some(identity),
    };

    match (requested_path, identity) {
        (ROOT_PATH, None) => Decision::RedirectTo(SIGN_IN_PATH),
        (ROOT_PATH | SIGN_IN_PATH, Some(identity)) => {
            Decision::RedirectTo(resolve_default_route(identity.role))
        }
        (SIGN_IN_PATH, None) => Decision::Render,
        (_, None) => Decision::RedirectTo(SIGN_IN_PATH),
        (_, Some(identity)) => match required_roles {
            Some(roles) if !roles.contains(&identity.role) => {
                Decision::RedirectTo(resolve_default_route(identity.role))
            }
            _ => Decision::Render,
        },
    }
}

/// How the route table treats a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// `/` - redirect only.
    Root,
    /// `/signin` - only for anonymous visitors.
    SignIn,
    /// A subtree restricted to the listed roles.
    Protected(&'static [Role]),
    /// Not guarded (health checks, the not-found page).
    Public,
}

impl RoutePolicy {
    /// Classify a request path.
    ///
    /// Subtrees match on segment boundaries: `/home/cart` is in the customer
    /// subtree, `/homework` is not.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let path = match path.trim_end_matches('/') {
            "" => ROOT_PATH,
            trimmed => trimmed,
        };

        if path == ROOT_PATH {
            Self::Root
        } else if path == SIGN_IN_PATH {
            Self::SignIn
        } else if in_subtree(path, CUSTOMER_ROOT) {
            Self::Protected(CUSTOMER_ONLY)
        } else if in_subtree(path, ADMIN_ROOT) {
            Self::Protected(ADMIN_ONLY)
        } else if in_subtree(path, RIDER_ROOT) {
            Self::Protected(RIDER_ONLY)
        } else {
            Self::Public
        }
    }
}

fn in_subtree(path: &str, root: &str) -> bool {
    path.strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Look a path up in the route table and decide it.
#[must_use]
pub fn guard(session: &SessionState, path: &str) -> Decision {
    match RoutePolicy::for_path(path) {
        RoutePolicy::Root => authorize(session, ROOT_PATH, None),
        RoutePolicy::SignIn => authorize(session, SIGN_IN_PATH, None),
        RoutePolicy::Protected(roles) => authorize(session, path, Some(roles)),
        RoutePolicy::Public => Decision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::types::{Email, UserId};

    fn signed_in(role: Role) -> SessionState {
        SessionState::Authenticated(Identity {
            id: UserId::new(format!("{role}-1")),
            display_name: role.to_string(),
            email: Email::parse("someone@gamekart.in").unwrap_or_else(|e| panic!("{e}")),
            role,
        })
    }

    const PROTECTED: [(&str, &[Role]); 6] = [
        ("/home", CUSTOMER_ONLY),
        ("/home/cart", CUSTOMER_ONLY),
        ("/home/products/ps5", CUSTOMER_ONLY),
        ("/home/my-orders", CUSTOMER_ONLY),
        ("/admin", ADMIN_ONLY),
        ("/rider", RIDER_ONLY),
    ];

    #[test]
    fn test_default_route_per_role() {
        assert_eq!(resolve_default_route(Role::Admin), "/admin");
        assert_eq!(resolve_default_route(Role::Rider), "/rider");
        assert_eq!(resolve_default_route(Role::Customer), "/home");
    }

    #[test]
    fn test_protected_paths_render_iff_role_matches() {
        for (path, required) in PROTECTED {
            for role in Role::ALL {
                let decision = authorize(&signed_in(role), path, Some(required));
                if required.contains(&role) {
                    assert_eq!(decision, Decision::Render, "{role} on {path}");
                } else {
                    assert_eq!(
                        decision,
                        Decision::RedirectTo(resolve_default_route(role)),
                        "{role} on {path}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_anonymous_is_sent_to_sign_in() {
        for (path, required) in PROTECTED {
            assert_eq!(
                authorize(&SessionState::Anonymous, path, Some(required)),
                Decision::RedirectTo(SIGN_IN_PATH)
            );
        }
        assert_eq!(
            authorize(&SessionState::Anonymous, "/home", None),
            Decision::RedirectTo(SIGN_IN_PATH)
        );
    }

    #[test]
    fn test_resolving_session_is_pending_everywhere() {
        for path in ["/", "/signin", "/home", "/admin", "/rider"] {
            assert_eq!(
                authorize(&SessionState::Resolving, path, Some(ADMIN_ONLY)),
                Decision::Pending
            );
        }
    }

    #[test]
    fn test_sign_in_and_root_never_render_for_signed_in_identity() {
        for role in Role::ALL {
            let session = signed_in(role);
            let landing = Decision::RedirectTo(resolve_default_route(role));
            assert_eq!(authorize(&session, "/signin", None), landing);
            assert_eq!(authorize(&session, "/", None), landing);
        }
    }

    #[test]
    fn test_root_and_sign_in_for_anonymous() {
        assert_eq!(
            authorize(&SessionState::Anonymous, "/", None),
            Decision::RedirectTo(SIGN_IN_PATH)
        );
        assert_eq!(
            authorize(&SessionState::Anonymous, "/signin", None),
            Decision::Render
        );
    }

    #[test]
    fn test_without_required_roles_any_identity_renders() {
        assert_eq!(
            authorize(&signed_in(Role::Rider), "/home", None),
            Decision::Render
        );
    }

    #[test]
    fn test_route_policy_classification() {
        assert_eq!(RoutePolicy::for_path("/"), RoutePolicy::Root);
        assert_eq!(RoutePolicy::for_path(""), RoutePolicy::Root);
        assert_eq!(RoutePolicy::for_path("/signin"), RoutePolicy::SignIn);
        assert_eq!(RoutePolicy::for_path("/signin/"), RoutePolicy::SignIn);
        assert_eq!(
            RoutePolicy::for_path("/home/cart/add"),
            RoutePolicy::Protected(CUSTOMER_ONLY)
        );
        assert_eq!(
            RoutePolicy::for_path("/admin/orders/o1/ship"),
            RoutePolicy::Protected(ADMIN_ONLY)
        );
        assert_eq!(
            RoutePolicy::for_path("/rider/"),
            RoutePolicy::Protected(RIDER_ONLY)
        );
        assert_eq!(RoutePolicy::for_path("/homework"), RoutePolicy::Public);
        assert_eq!(RoutePolicy::for_path("/health"), RoutePolicy::Public);
        assert_eq!(RoutePolicy::for_path("/no/such/page"), RoutePolicy::Public);
    }

    #[test]
    fn test_guard_blocks_cross_role_access() {
        assert_eq!(
            guard(&signed_in(Role::Customer), "/admin"),
            Decision::RedirectTo("/home")
        );
        assert_eq!(
            guard(&signed_in(Role::Admin), "/rider"),
            Decision::RedirectTo("/admin")
        );
        assert_eq!(
            guard(&signed_in(Role::Rider), "/home/cart"),
            Decision::RedirectTo("/rider")
        );
        assert_eq!(guard(&signed_in(Role::Rider), "/rider"), Decision::Render);
    }

    #[test]
    fn test_guard_public_paths_always_render() {
        assert_eq!(guard(&SessionState::Anonymous, "/health"), Decision::Render);
        assert_eq!(guard(&SessionState::Resolving, "/missing"), Decision::Render);
    }
}
