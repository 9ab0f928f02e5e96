//! The authenticated principal and the state of resolving it.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Email, RiderId, Role, UserId};

/// The authenticated principal for the current session.
///
/// Built from the user document the backend returns for the session cookie.
/// Immutable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(alias = "name", default)]
    pub display_name: String,
    pub email: Email,
    /// Absent or unrecognised role claims decode as [`Role::Customer`].
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
}

impl Identity {
    /// The rider id for this identity, if it signed in as a rider.
    #[must_use]
    pub fn rider_id(&self) -> Option<RiderId> {
        match self.role {
            Role::Rider => Some(RiderId::from_user(&self.id)),
            Role::Customer | Role::Admin => None,
        }
    }
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let claim = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(Role::from_claim(
        claim.as_ref().and_then(serde_json::Value::as_str),
    ))
}

/// Where session resolution currently stands.
///
/// The three guard inputs (`is_loading`, `is_authenticated`, `identity`) are
/// derived from this enum, so they can never disagree with each other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The session lookup has not completed yet.
    #[default]
    Resolving,
    /// No session, an expired session, or a failed lookup.
    Anonymous,
    /// A session with a known identity.
    Authenticated(Identity),
}

impl SessionState {
    /// Build the state from a `current_user` answer.
    ///
    /// The backend may claim a session is authenticated while omitting the
    /// user document; without an identity there is no role to route by, so
    /// that answer resolves to [`SessionState::Anonymous`].
    #[must_use]
    pub fn from_current_user(is_authenticated: bool, user: Option<Identity>) -> Self {
        match (is_authenticated, user) {
            (true, Some(identity)) => Self::Authenticated(identity),
            _ => Self::Anonymous,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Resolving)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Resolving | Self::Anonymous => None,
        }
    }

    /// Role of the signed-in identity.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Identity {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_identity_from_backend_document() {
        let identity = decode(
            r#"{"_id":"u1","displayName":"Asha","email":"asha@gamekart.in","role":"admin"}"#,
        );
        assert_eq!(identity.id.as_str(), "u1");
        assert_eq!(identity.display_name, "Asha");
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn test_identity_accepts_alternate_field_names() {
        let identity =
            decode(r#"{"id":"u2","name":"Ravi","email":"ravi@gamekart.in","role":"rider"}"#);
        assert_eq!(identity.id.as_str(), "u2");
        assert_eq!(identity.display_name, "Ravi");
        assert_eq!(identity.rider_id().unwrap().as_str(), "u2");
    }

    #[test]
    fn test_missing_or_malformed_role_is_customer() {
        let missing = decode(r#"{"_id":"u3","email":"a@b.in"}"#);
        assert_eq!(missing.role, Role::Customer);

        let unknown = decode(r#"{"_id":"u3","email":"a@b.in","role":"owner"}"#);
        assert_eq!(unknown.role, Role::Customer);

        let null = decode(r#"{"_id":"u3","email":"a@b.in","role":null}"#);
        assert_eq!(null.role, Role::Customer);

        let numeric = decode(r#"{"_id":"u3","email":"a@b.in","role":7}"#);
        assert_eq!(numeric.role, Role::Customer);
        assert!(numeric.rider_id().is_none());
    }

    #[test]
    fn test_session_state_from_current_user() {
        let identity = decode(r#"{"_id":"u4","email":"c@d.in","role":"customer"}"#);

        let state = SessionState::from_current_user(true, Some(identity.clone()));
        assert!(state.is_authenticated());
        assert!(!state.is_loading());
        assert_eq!(state.identity(), Some(&identity));
        assert_eq!(state.role(), Some(Role::Customer));

        assert_eq!(
            SessionState::from_current_user(true, None),
            SessionState::Anonymous
        );
        assert_eq!(
            SessionState::from_current_user(false, Some(identity)),
            SessionState::Anonymous
        );
    }

    #[test]
    fn test_default_session_state_is_resolving() {
        let state = SessionState::default();
        assert!(state.is_loading());
        assert!(!state.is_authenticated());
        assert!(state.identity().is_none());
    }
}
