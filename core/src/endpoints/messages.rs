use helpdesk_protocol::Message;
use helpdesk_protocol::requests::CreateMessageRequest;

use super::Mutation;
use super::Query;
use super::tickets::TicketRef;
use crate::cache::Tag;
use crate::cache::TagRef;
use crate::error::ClientError;
use crate::transport::ApiRequest;

/// Message thread of a ticket, by id or guest token.
#[derive(Debug, Clone)]
pub struct GetMessages(pub TicketRef);

impl Query for GetMessages {
    type Data = Vec<Message>;
    const NAME: &'static str = "getMessages";

    fn request(&self) -> ApiRequest {
        ApiRequest::get(self.0.path("/messages"))
    }

    fn cache_args(&self) -> String {
        self.0.cache_args()
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::id(Tag::Messages, self.0.value())]
    }
}

/// Reply on a thread. Staff replies also refresh the ticket itself since the
/// backend may move its status.
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub ticket: TicketRef,
    pub body: CreateMessageRequest,
}

impl Mutation for CreateMessage {
    type Data = Message;
    const NAME: &'static str = "createMessage";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::post(self.ticket.path("/messages"), &self.body)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        let key = self.ticket.value();
        match self.ticket {
            TicketRef::Id(_) => vec![TagRef::id(Tag::Messages, key), TagRef::id(Tag::Tickets, key)],
            TicketRef::Token(_) => vec![TagRef::id(Tag::Messages, key)],
        }
    }
}
