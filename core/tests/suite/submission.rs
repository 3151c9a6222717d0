use std::sync::Arc;

use helpdesk_core::notify::Notice;
use helpdesk_core::notify::RecordingNotifier;
use helpdesk_core::submission::SubmitOutcome;
use helpdesk_core::submission::TicketSubmitter;
use helpdesk_protocol::requests::CreateTicketRequest;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::client_for;
use super::envelope;
use super::ticket_json;

fn form() -> CreateTicketRequest {
    CreateTicketRequest {
        guest_email: "sam@example.com".to_string(),
        guest_name: "Sam".to_string(),
        subject: "Cannot log in".to_string(),
        initial_message: "The login page spins forever.".to_string(),
    }
}

#[tokio::test]
async fn similar_ticket_holds_submission_until_confirmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tickets/check-duplicates"))
        .and(body_json(json!({
            "guestEmail": "sam@example.com",
            "subject": "Cannot log in",
            "message": "The login page spins forever."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "hasDuplicates": true,
            "similarTickets": [{ "id": "t7", "subject": "Login page hangs", "similarity": 0.92 }]
        }))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tickets"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(envelope(ticket_json("t8", "Cannot log in"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::new());
    let submitter = TicketSubmitter::new(client_for(&server, None), notifier.clone());

    let SubmitOutcome::DuplicatesFound(pending) = submitter.submit(form()).await.expect("submit")
    else {
        panic!("expected the submission to be held");
    };
    assert_eq!(pending.similar_tickets().len(), 1);
    assert_eq!(pending.similar_tickets()[0].similarity, 0.92);
    assert!(notifier.notices().is_empty());

    let SubmitOutcome::Created { ticket, redirect } =
        submitter.confirm(pending).await.expect("confirm")
    else {
        panic!("expected the ticket to be created");
    };
    assert_eq!(ticket.id, "t8");
    assert_eq!(redirect, "/ticket/tok-t8");
    assert_eq!(
        notifier.notices(),
        vec![Notice::success(
            "Ticket submitted successfully! Check your email for the link."
        )]
    );
}
