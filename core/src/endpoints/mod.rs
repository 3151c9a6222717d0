//! Typed catalogue of backend endpoints.
//!
//! Each endpoint is a small struct carrying its arguments. Queries name the
//! tags they provide so the cache knows what to refetch; mutations name the
//! tags they invalidate on success.

mod auth;
mod categories;
mod messages;
mod tickets;
mod users;

pub use auth::Login;
pub use auth::Logout;
pub use auth::Profile;
pub use auth::Register;
pub use categories::CreateCategory;
pub use categories::ListCategories;
pub use messages::CreateMessage;
pub use messages::GetMessages;
pub use tickets::CheckDuplicates;
pub use tickets::CreateTicket;
pub use tickets::GetTicket;
pub use tickets::ListTickets;
pub use tickets::TicketRef;
pub use tickets::TriageQueue;
pub use tickets::UpdateTicket;
pub use users::CreateUser;
pub use users::ListManagers;
pub use users::ListUsers;

use serde::de::DeserializeOwned;

use crate::cache::QueryKey;
use crate::cache::TagRef;
use crate::error::ClientError;
use crate::transport::ApiRequest;

/// A cacheable read.
pub trait Query: Send + Sync {
    /// Type of the envelope's `data` field.
    type Data: DeserializeOwned + Send + 'static;

    const NAME: &'static str;

    fn request(&self) -> ApiRequest;

    /// Canonical serialization of the arguments. Two calls with equal
    /// arguments must produce equal strings.
    fn cache_args(&self) -> String;

    fn provides(&self) -> Vec<TagRef>;

    fn key(&self) -> QueryKey {
        QueryKey::new(Self::NAME, self.cache_args())
    }
}

/// A write that invalidates cached reads when it succeeds.
pub trait Mutation: Send + Sync {
    type Data: DeserializeOwned + Send + 'static;

    const NAME: &'static str;

    fn request(&self) -> Result<ApiRequest, ClientError>;

    fn invalidates(&self) -> Vec<TagRef>;
}

/// Percent-encode one path segment.
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Canonical cache arguments for a serializable value.
pub(crate) fn json_args<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
