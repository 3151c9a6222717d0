//! Live view of one ticket and its thread.
//!
//! While mounted, the thread is refetched on a fixed interval. Field edits
//! are shown optimistically and fall back to the last server value if the
//! patch fails.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use helpdesk_async_utils::Poller;
use helpdesk_protocol::Message;
use helpdesk_protocol::Role;
use helpdesk_protocol::SenderType;
use helpdesk_protocol::Ticket;
use helpdesk_protocol::TicketPriority;
use helpdesk_protocol::TicketStatus;
use helpdesk_protocol::requests::CreateMessageRequest;
use helpdesk_protocol::requests::UpdateTicketRequest;
use thiserror::Error;

use crate::client::ApiClient;
use crate::client::QueryState;
use crate::client::Subscription;
use crate::endpoints::CreateMessage;
use crate::endpoints::GetMessages;
use crate::endpoints::GetTicket;
use crate::endpoints::TicketRef;
use crate::endpoints::UpdateTicket;
use crate::error::ClientError;
use crate::notify::Notice;
use crate::notify::Notifier;
use crate::validation::ValidationErrors;
use crate::validation::validate_message;

/// A single-field patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketFieldUpdate {
    Status(TicketStatus),
    Priority(TicketPriority),
    Assignee(String),
    Category(String),
}

impl TicketFieldUpdate {
    pub fn label(&self) -> &'static str {
        match self {
            TicketFieldUpdate::Status(_) => "Status",
            TicketFieldUpdate::Priority(_) => "Priority",
            TicketFieldUpdate::Assignee(_) => "Assignee",
            TicketFieldUpdate::Category(_) => "Category",
        }
    }

    pub fn to_patch(&self) -> UpdateTicketRequest {
        let mut patch = UpdateTicketRequest::default();
        match self {
            TicketFieldUpdate::Status(status) => patch.status = Some(*status),
            TicketFieldUpdate::Priority(priority) => patch.priority = Some(*priority),
            TicketFieldUpdate::Assignee(id) => patch.assigned_to_id = Some(id.clone()),
            TicketFieldUpdate::Category(id) => patch.category_id = Some(id.clone()),
        }
        patch
    }

    fn apply_to(&self, ticket: &mut Ticket) {
        match self {
            TicketFieldUpdate::Status(status) => ticket.status = *status,
            TicketFieldUpdate::Priority(priority) => ticket.priority = *priority,
            TicketFieldUpdate::Assignee(id) => ticket.assigned_to_id = Some(id.clone()),
            TicketFieldUpdate::Category(id) => ticket.category_id = Some(id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetail {
    /// Server state with any in-flight edit laid over it.
    pub ticket: Ticket,
    pub messages: Vec<Message>,
    pub is_updating: bool,
    /// Failure of the latest refetch; the data shown is the last good copy.
    pub refresh_error: Option<ClientError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loading,
    /// Unknown id, or a guest link that is invalid or expired.
    NotFound,
    Ready(Box<TicketDetail>),
}

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("invalid reply: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub struct TicketDetailSynchronizer {
    client: ApiClient,
    target: TicketRef,
    ticket: Subscription<Ticket>,
    messages: Subscription<Vec<Message>>,
    poller: Option<Poller>,
    /// In-flight edits in start order, each tagged so it only removes itself.
    pending: Mutex<Vec<(u64, TicketFieldUpdate)>>,
    next_edit: AtomicU64,
    notifier: Arc<dyn Notifier>,
}

impl TicketDetailSynchronizer {
    /// Subscribe to the ticket and its thread and start polling the thread.
    pub fn mount(
        client: &ApiClient,
        target: TicketRef,
        poll_interval: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let ticket = client.subscribe(&GetTicket(target.clone()));
        let messages = client.subscribe(&GetMessages(target.clone()));

        let poll_client = client.clone();
        let poll_query = GetMessages(target.clone());
        let poller = Poller::spawn(poll_interval, move || {
            let client = poll_client.clone();
            let query = poll_query.clone();
            async move {
                if let Err(err) = client.refetch(&query).await {
                    tracing::debug!(key = %query.0, "thread poll failed: {err}");
                }
            }
        });
        tracing::debug!(ticket = %target, ?poll_interval, "ticket detail mounted");

        Self {
            client: client.clone(),
            target,
            ticket,
            messages,
            poller: Some(poller),
            pending: Mutex::new(Vec::new()),
            next_edit: AtomicU64::new(0),
            notifier,
        }
    }

    pub fn target(&self) -> &TicketRef {
        &self.target
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_stopped())
    }

    pub fn view(&self) -> DetailView {
        self.render(self.ticket.state(), self.messages.state())
    }

    /// Wait for the ticket or the thread to change.
    pub async fn changed(&mut self) -> Option<DetailView> {
        tokio::select! {
            state = self.ticket.changed() => { state?; }
            state = self.messages.changed() => { state?; }
        }
        Some(self.view())
    }

    /// Wait until neither query is fetching.
    pub async fn settled(&mut self) -> Option<DetailView> {
        let ticket = self.ticket.settled().await?;
        let messages = self.messages.settled().await?;
        Some(self.render(ticket, messages))
    }

    /// Patch one field. The new value shows at once; on failure it is
    /// dropped so the last confirmed value shows again.
    pub async fn update_field(&self, update: TicketFieldUpdate) -> Result<Ticket, ClientError> {
        let id = self.ticket_id()?;
        let edit = self.next_edit.fetch_add(1, Ordering::Relaxed);
        self.pending_edits().push((edit, update.clone()));

        let result = self
            .client
            .mutate(&UpdateTicket {
                id,
                patch: update.to_patch(),
            })
            .await;
        self.pending_edits().retain(|(other, _)| *other != edit);

        match result {
            Ok(_) => {
                self.notifier
                    .notify(Notice::success(format!("{} updated", update.label())));
                let refreshed = self.client.refetch(&GetTicket(self.target.clone())).await?;
                refreshed.into_data().ok_or_else(|| ClientError::NotFound {
                    message: "ticket disappeared after update".to_string(),
                })
            }
            Err(err) => {
                tracing::warn!(ticket = %self.target, field = update.label(), "update failed: {err}");
                self.notifier.notify(Notice::error("Failed to update ticket"));
                Err(err)
            }
        }
    }

    pub async fn mark_resolved(&self) -> Result<Ticket, ClientError> {
        self.update_field(TicketFieldUpdate::Status(TicketStatus::Resolved))
            .await
    }

    /// Post a reply. Guests (token access) post as `GUEST` under the ticket's
    /// guest name; staff post under their session role and name.
    pub async fn reply(&self, content: &str) -> Result<Message, ReplyError> {
        validate_message(content)?;

        let (sender_type, sender_name) = match &self.target {
            TicketRef::Token(_) => {
                let name = self.confirmed_ticket().map(|t| t.guest_name);
                (SenderType::Guest, name)
            }
            TicketRef::Id(_) => {
                let user = self.client.session().current_user();
                let role = user.as_ref().map_or(Role::Manager, |u| u.role);
                let sender = match role {
                    Role::Admin => SenderType::Admin,
                    Role::Manager | Role::Guest => SenderType::Manager,
                };
                (sender, user.map(|u| u.name))
            }
        };

        let mutation = CreateMessage {
            ticket: self.target.clone(),
            body: CreateMessageRequest {
                content: content.to_string(),
                sender_type,
                sender_name,
            },
        };
        match self.client.mutate(&mutation).await {
            Ok(response) => {
                let message = response.message.clone();
                match response.into_data() {
                    Some(created) => {
                        self.notifier.notify(Notice::success("Reply sent"));
                        Ok(created)
                    }
                    None => {
                        let text = message.unwrap_or_else(|| "Failed to send reply".to_string());
                        self.notifier.notify(Notice::error(text.clone()));
                        Err(ClientError::Parse(text).into())
                    }
                }
            }
            Err(err) => {
                self.notifier
                    .notify(Notice::error(err.user_message("Failed to send reply")));
                Err(err.into())
            }
        }
    }

    /// Stop polling and wait for a running poll to drain. Requests already
    /// sent still complete; their results only reach the cache.
    pub async fn unmount(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
        tracing::debug!(ticket = %self.target, "ticket detail unmounted");
    }

    fn pending_edits(&self) -> std::sync::MutexGuard<'_, Vec<(u64, TicketFieldUpdate)>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn confirmed_ticket(&self) -> Option<Ticket> {
        self.ticket.state().data.and_then(|r| r.into_data())
    }

    fn ticket_id(&self) -> Result<String, ClientError> {
        match (&self.target, self.confirmed_ticket()) {
            (TicketRef::Id(id), _) => Ok(id.clone()),
            (TicketRef::Token(_), Some(ticket)) => Ok(ticket.id),
            (TicketRef::Token(token), None) => Err(ClientError::NotFound {
                message: format!("no ticket loaded for token {token}"),
            }),
        }
    }

    fn render(&self, ticket: QueryState<Ticket>, messages: QueryState<Vec<Message>>) -> DetailView {
        if ticket.is_loading() || messages.is_loading() {
            return DetailView::Loading;
        }
        let refresh_error = ticket.error.clone();
        let Some(mut confirmed) = ticket.data.and_then(|r| r.into_data()) else {
            return DetailView::NotFound;
        };
        let is_updating = {
            let pending = self.pending_edits();
            for (_, update) in pending.iter() {
                update.apply_to(&mut confirmed);
            }
            !pending.is_empty()
        };
        DetailView::Ready(Box::new(TicketDetail {
            ticket: confirmed,
            messages: messages.data.and_then(|r| r.into_data()).unwrap_or_default(),
            is_updating,
            refresh_error,
        }))
    }
}
