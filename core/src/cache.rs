//! Cache bookkeeping for the remote data client: tags, keys, and the
//! per-key snapshot subscribers observe.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use strum_macros::Display;
use tokio::time::Instant;

use crate::error::ClientError;

/// Resource group a cached result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum Tag {
    Auth,
    Tickets,
    Messages,
    Categories,
    Users,
}

/// A tag, optionally narrowed to one resource id.
///
/// Queries declare the refs they *provide*, mutations the refs they
/// *invalidate*. A bare tag invalidates every provider of that tag whatever
/// its id; a tag with an id only hits providers of that exact pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagRef {
    pub tag: Tag,
    pub id: Option<String>,
}

impl TagRef {
    pub fn all(tag: Tag) -> Self {
        Self { tag, id: None }
    }

    pub fn id(tag: Tag, id: impl Into<String>) -> Self {
        Self {
            tag,
            id: Some(id.into()),
        }
    }

    pub fn invalidates(&self, provided: &TagRef) -> bool {
        self.tag == provided.tag && (self.id.is_none() || self.id == provided.id)
    }
}

impl From<Tag> for TagRef {
    fn from(tag: Tag) -> Self {
        TagRef::all(tag)
    }
}

impl fmt::Display for TagRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{id}", self.tag),
            None => write!(f, "{}", self.tag),
        }
    }
}

/// Identity of a cached query: endpoint name plus canonical arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub endpoint: &'static str,
    pub args: String,
}

impl QueryKey {
    pub fn new(endpoint: &'static str, args: impl Into<String>) -> Self {
        Self {
            endpoint,
            args: args.into(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Uninitialized,
    Pending,
    Fulfilled,
    Rejected,
}

/// Untyped state of one cache entry as broadcast to subscribers.
///
/// `data` survives a failed refetch so views keep showing the last good
/// response next to the error.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    pub data: Option<Arc<Value>>,
    pub error: Option<ClientError>,
    pub is_fetching: bool,
    pub fulfilled_at: Option<Instant>,
}

impl QuerySnapshot {
    pub(crate) fn empty() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            is_fetching: false,
            fulfilled_at: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.data.is_none() && matches!(self.status, QueryStatus::Uninitialized | QueryStatus::Pending)
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.is_fetching = true;
        if self.status == QueryStatus::Uninitialized {
            self.status = QueryStatus::Pending;
        }
    }

    pub(crate) fn finish_fetch(&mut self, result: &Result<Arc<Value>, ClientError>) {
        self.is_fetching = false;
        match result {
            Ok(value) => {
                self.status = QueryStatus::Fulfilled;
                self.data = Some(Arc::clone(value));
                self.error = None;
                self.fulfilled_at = Some(Instant::now());
            }
            Err(err) => {
                self.status = QueryStatus::Rejected;
                self.error = Some(err.clone());
            }
        }
    }
}
