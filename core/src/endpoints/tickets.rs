use std::fmt;

use helpdesk_protocol::ListParams;
use helpdesk_protocol::Ticket;
use helpdesk_protocol::requests::CheckDuplicatesRequest;
use helpdesk_protocol::requests::CreateTicketRequest;
use helpdesk_protocol::requests::DuplicateCheckResponse;
use helpdesk_protocol::requests::UpdateTicketRequest;

use super::Mutation;
use super::Query;
use super::json_args;
use super::segment;
use crate::cache::Tag;
use crate::cache::TagRef;
use crate::error::ClientError;
use crate::transport::ApiRequest;

/// How a ticket is addressed: staff use the id, guests the unique token
/// from their confirmation link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TicketRef {
    Id(String),
    Token(String),
}

impl TicketRef {
    /// Raw id or token; used as the tag id either way.
    pub fn value(&self) -> &str {
        match self {
            TicketRef::Id(v) | TicketRef::Token(v) => v,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, TicketRef::Token(_))
    }

    /// Cache argument for lookups by this reference. The variant prefix
    /// keeps an id and a token with the same text apart.
    pub(crate) fn cache_args(&self) -> String {
        match self {
            TicketRef::Id(id) => format!("id:{id}"),
            TicketRef::Token(token) => format!("token:{token}"),
        }
    }

    /// Path under `prefix`: `/prefix/:id` or `/prefix/token/:token`.
    pub(crate) fn path(&self, prefix: &str) -> String {
        match self {
            TicketRef::Id(id) => format!("{prefix}/{}", segment(id)),
            TicketRef::Token(token) => format!("{prefix}/token/{}", segment(token)),
        }
    }
}

impl fmt::Display for TicketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketRef::Id(id) => write!(f, "{id}"),
            TicketRef::Token(token) => write!(f, "token:{token}"),
        }
    }
}

/// Paginated ticket list.
#[derive(Debug, Clone, Default)]
pub struct ListTickets(pub Option<ListParams>);

impl Query for ListTickets {
    type Data = Vec<Ticket>;
    const NAME: &'static str = "getTickets";

    fn request(&self) -> ApiRequest {
        let query = self
            .0
            .as_ref()
            .map(ListParams::to_query_pairs)
            .unwrap_or_default();
        ApiRequest::get("/tickets").with_query(query)
    }

    fn cache_args(&self) -> String {
        json_args(&self.0)
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Tickets)]
    }
}

/// Tickets awaiting triage (unassigned or uncategorised).
#[derive(Debug, Clone, Default)]
pub struct TriageQueue(pub Option<ListParams>);

impl Query for TriageQueue {
    type Data = Vec<Ticket>;
    const NAME: &'static str = "getTriageQueue";

    fn request(&self) -> ApiRequest {
        let query = self
            .0
            .as_ref()
            .map(ListParams::to_query_pairs)
            .unwrap_or_default();
        ApiRequest::get("/tickets/triage").with_query(query)
    }

    fn cache_args(&self) -> String {
        json_args(&self.0)
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Tickets)]
    }
}

#[derive(Debug, Clone)]
pub struct GetTicket(pub TicketRef);

impl Query for GetTicket {
    type Data = Ticket;
    const NAME: &'static str = "getTicket";

    fn request(&self) -> ApiRequest {
        ApiRequest::get(self.0.path("/tickets"))
    }

    fn cache_args(&self) -> String {
        self.0.cache_args()
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::id(Tag::Tickets, self.0.value())]
    }
}

#[derive(Debug, Clone)]
pub struct CreateTicket(pub CreateTicketRequest);

impl Mutation for CreateTicket {
    type Data = Ticket;
    const NAME: &'static str = "createTicket";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::post("/tickets", &self.0)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Tickets)]
    }
}

/// Similarity probe run before a guest submission. Invalidates nothing.
#[derive(Debug, Clone)]
pub struct CheckDuplicates(pub CheckDuplicatesRequest);

impl Mutation for CheckDuplicates {
    type Data = DuplicateCheckResponse;
    const NAME: &'static str = "checkDuplicates";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::post("/tickets/check-duplicates", &self.0)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        Vec::new()
    }
}

/// Partial field patch of one ticket.
#[derive(Debug, Clone)]
pub struct UpdateTicket {
    pub id: String,
    pub patch: UpdateTicketRequest,
}

impl Mutation for UpdateTicket {
    type Data = Ticket;
    const NAME: &'static str = "updateTicket";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::patch(format!("/tickets/{}", segment(&self.id)), &self.patch)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        vec![TagRef::id(Tag::Tickets, &self.id), TagRef::all(Tag::Tickets)]
    }
}
