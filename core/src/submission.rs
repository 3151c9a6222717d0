//! Guest ticket submission with a duplicate pre-check.
//!
//! validate, then check for similar tickets, then hold for confirmation if
//! any were found, then create and redirect to the guest view. The
//! duplicate check is advisory: if it fails, submission carries on.

use std::sync::Arc;

use helpdesk_protocol::Ticket;
use helpdesk_protocol::requests::CreateTicketRequest;
use helpdesk_protocol::requests::SimilarTicket;
use thiserror::Error;

use crate::client::ApiClient;
use crate::endpoints::CheckDuplicates;
use crate::endpoints::CreateTicket;
use crate::error::ClientError;
use crate::notify::Notice;
use crate::notify::Notifier;
use crate::validation::Validate;
use crate::validation::ValidationErrors;

const CHECK_FAILED_NOTICE: &str = "AI check failed, but proceeding with submission...";
const CREATED_NOTICE: &str = "Ticket submitted successfully! Check your email for the link.";
const CREATE_FAILED_NOTICE: &str = "Failed to submit ticket";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid ticket: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("ticket was not created: {0}")]
    Rejected(String),
}

/// A submission held back because similar tickets exist. Confirm it with
/// [`TicketSubmitter::confirm`] or drop it to abandon.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    form: CreateTicketRequest,
    similar: Vec<SimilarTicket>,
}

impl PendingSubmission {
    pub fn form(&self) -> &CreateTicketRequest {
        &self.form
    }

    pub fn similar_tickets(&self) -> &[SimilarTicket] {
        &self.similar
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created { ticket: Ticket, redirect: String },
    DuplicatesFound(PendingSubmission),
}

pub struct TicketSubmitter {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl TicketSubmitter {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    pub async fn submit(&self, form: CreateTicketRequest) -> Result<SubmitOutcome, SubmitError> {
        form.validate()?;

        match self.client.mutate(&CheckDuplicates((&form).into())).await {
            Ok(response) => {
                if let Some(check) = response.into_data()
                    && check.has_duplicates
                {
                    tracing::info!(
                        similar = check.similar_tickets.len(),
                        "holding submission for duplicate confirmation"
                    );
                    return Ok(SubmitOutcome::DuplicatesFound(PendingSubmission {
                        form,
                        similar: check.similar_tickets,
                    }));
                }
            }
            Err(err) => {
                tracing::warn!("duplicate check failed, submitting anyway: {err}");
                self.notifier.notify(Notice::warning(CHECK_FAILED_NOTICE));
            }
        }

        self.create(form).await
    }

    /// Create a held submission exactly as it was entered.
    pub async fn confirm(&self, pending: PendingSubmission) -> Result<SubmitOutcome, SubmitError> {
        self.create(pending.form).await
    }

    async fn create(&self, form: CreateTicketRequest) -> Result<SubmitOutcome, SubmitError> {
        let response = match self.client.mutate(&CreateTicket(form)).await {
            Ok(response) => response,
            Err(err) => {
                self.notifier
                    .notify(Notice::error(err.user_message(CREATE_FAILED_NOTICE)));
                return Err(err.into());
            }
        };
        let message = response.message.clone();
        let Some(ticket) = response.into_data() else {
            let text = message.unwrap_or_else(|| CREATE_FAILED_NOTICE.to_string());
            self.notifier.notify(Notice::error(text.clone()));
            return Err(SubmitError::Rejected(text));
        };

        self.notifier.notify(Notice::success(CREATED_NOTICE));
        let redirect = format!("/ticket/{}", ticket.unique_token);
        Ok(SubmitOutcome::Created { ticket, redirect })
    }
}
