//! Wire types for the helpdesk HTTP+JSON API.
//!
//! Everything here is a plain serde shape: the backend owns the semantics,
//! the client only needs to agree on field names and enum spellings.

pub mod envelope;
pub mod models;
pub mod params;
pub mod requests;

pub use envelope::ApiResponse;
pub use envelope::ErrorDetails;
pub use envelope::Pagination;
pub use models::Category;
pub use models::Message;
pub use models::PersonSummary;
pub use models::Role;
pub use models::SenderType;
pub use models::Ticket;
pub use models::TicketPriority;
pub use models::TicketStatus;
pub use models::User;
pub use params::ListParams;
pub use params::SortOrder;
