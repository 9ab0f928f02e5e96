//! Request and response bodies specific to the backend API.
//!
//! Order, rider and identity documents live in `gamekart_core`.

use serde::{Deserialize, Serialize};

use gamekart_core::{DeliveryOutcome, Identity, RiderId};

/// Answer of `GET /api/auth/current_user`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user: Option<Identity>,
}

/// Body of `PATCH /api/orders/:id/ship`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipRequest<'a> {
    pub rider_id: &'a RiderId,
}

/// Body of `PATCH /api/orders/:id/deliver`.
#[derive(Debug, Clone, Serialize)]
pub struct DeliverRequest {
    pub status: DeliveryOutcome,
}

/// Error body. The backend uses either key.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn message_from(body: &str) -> Option<String> {
        let parsed: Self = serde_json::from_str(body).ok()?;
        parsed
            .error
            .or(parsed.message)
            .filter(|message| !message.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gamekart_core::Role;

    use super::*;

    #[test]
    fn test_current_user_shapes() {
        let signed_in: CurrentUser = serde_json::from_str(
            r#"{"isAuthenticated":true,"user":{"_id":"u1","email":"a@b.in","role":"rider"}}"#,
        )
        .unwrap();
        assert!(signed_in.is_authenticated);
        assert_eq!(signed_in.user.unwrap().role, Role::Rider);

        let anonymous: CurrentUser =
            serde_json::from_str(r#"{"isAuthenticated":false,"user":null}"#).unwrap();
        assert!(!anonymous.is_authenticated);
        assert!(anonymous.user.is_none());

        let empty: CurrentUser = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_authenticated);
    }

    #[test]
    fn test_transition_bodies() {
        let rider = RiderId::new("r-9");
        assert_eq!(
            serde_json::to_value(ShipRequest { rider_id: &rider }).unwrap(),
            serde_json::json!({"riderId": "r-9"})
        );
        assert_eq!(
            serde_json::to_value(DeliverRequest {
                status: DeliveryOutcome::Undelivered
            })
            .unwrap(),
            serde_json::json!({"status": "Undelivered"})
        );
    }

    #[test]
    fn test_error_body_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"error":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"message":"also nope"}"#).as_deref(),
            Some("also nope")
        );
        assert_eq!(ErrorBody::message_from(r#"{"error":""}"#), None);
        assert_eq!(ErrorBody::message_from("not json"), None);
    }
}
