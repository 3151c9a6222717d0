//! Request bodies and endpoint-specific response payloads.

use serde::Deserialize;
use serde::Serialize;

use crate::models::Role;
use crate::models::SenderType;
use crate::models::TicketPriority;
use crate::models::TicketStatus;
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Payload of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub guest_email: String,
    pub guest_name: String,
    pub subject: String,
    pub initial_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDuplicatesRequest {
    pub guest_email: String,
    pub subject: String,
    pub message: String,
}

impl From<&CreateTicketRequest> for CheckDuplicatesRequest {
    fn from(ticket: &CreateTicketRequest) -> Self {
        Self {
            guest_email: ticket.guest_email.clone(),
            subject: ticket.subject.clone(),
            message: ticket.initial_message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarTicket {
    pub id: String,
    pub subject: String,
    /// Similarity score in `0.0..=1.0`.
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResponse {
    pub has_duplicates: bool,
    #[serde(default)]
    pub similar_tickets: Vec<SimilarTicket>,
}

/// Partial ticket update. Only the fields that are set travel over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub content: String,
    pub sender_type: SenderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn update_request_sends_only_the_patched_field() {
        let patch = UpdateTicketRequest {
            assigned_to_id: Some("mgr-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).expect("json"),
            json!({ "assignedToId": "mgr-1" })
        );
    }

    #[test]
    fn duplicate_check_reuses_ticket_form_fields() {
        let ticket = CreateTicketRequest {
            guest_email: "g@example.com".to_string(),
            guest_name: "Guest".to_string(),
            subject: "Cannot log in".to_string(),
            initial_message: "Password reset link is broken".to_string(),
        };
        let check = CheckDuplicatesRequest::from(&ticket);
        assert_eq!(
            serde_json::to_value(&check).expect("json"),
            json!({
                "guestEmail": "g@example.com",
                "subject": "Cannot log in",
                "message": "Password reset link is broken"
            })
        );
    }

    #[test]
    fn duplicate_response_tolerates_missing_list() {
        let parsed: DuplicateCheckResponse =
            serde_json::from_value(json!({ "hasDuplicates": false })).expect("parse");
        assert!(!parsed.has_duplicates);
        assert!(parsed.similar_tickets.is_empty());
    }
}
