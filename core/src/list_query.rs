//! URL-derived list state.
//!
//! The query string is the only source of truth for what a list view shows.
//! [`ListQueryState::from_location`] re-derives everything on each render,
//! and [`UrlUpdate`] is the single way to change it.

use std::collections::BTreeMap;
use std::str::FromStr;

use helpdesk_protocol::ListParams;
use helpdesk_protocol::SortOrder;
use helpdesk_protocol::TicketPriority;
use helpdesk_protocol::TicketStatus;

use crate::navigation::Location;

/// Filter sentinel meaning "no constraint". Never written to the URL.
pub const ALL: &str = "all";

/// Per-page defaults for absent URL parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListDefaults {
    pub page: u32,
    pub limit: u32,
    pub sort: &'static str,
    pub order: SortOrder,
    /// Filter parameters the page exposes, defaulting to [`ALL`].
    pub filters: &'static [&'static str],
}

impl ListDefaults {
    pub const TICKET_QUEUE: Self = Self {
        page: 1,
        limit: 10,
        sort: "createdAt",
        order: SortOrder::Desc,
        filters: &["status", "priority", "categoryId", "assignedToId"],
    };

    pub const USERS: Self = Self {
        page: 1,
        limit: 10,
        sort: "createdAt",
        order: SortOrder::Desc,
        filters: &[],
    };

    pub const CATEGORIES: Self = Self {
        page: 1,
        limit: 10,
        sort: "name",
        order: SortOrder::Asc,
        filters: &[],
    };

    /// Defaults of the list page mounted at `path`, if it is one.
    pub fn for_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/manager/tickets" | "/admin/tickets" | "/admin/triage" => Some(Self::TICKET_QUEUE),
            "/admin/users" => Some(Self::USERS),
            "/admin/categories" => Some(Self::CATEGORIES),
            _ => None,
        }
    }
}

/// Zero-based pagination as table widgets count it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page_index: u32,
    pub page_size: u32,
}

/// One sorted column as table widgets report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortColumn {
    pub id: String,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQueryState {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    pub sort: String,
    pub order: SortOrder,
    /// Committed search text; empty when none.
    pub search: String,
    /// Raw filter values keyed by parameter name, [`ALL`] when unset.
    pub filters: BTreeMap<String, String>,
}

impl ListQueryState {
    pub fn from_location(location: &Location, defaults: &ListDefaults) -> Self {
        let filters = defaults
            .filters
            .iter()
            .map(|name| {
                let value = non_empty(location.get(name)).unwrap_or(ALL);
                (name.to_string(), value.to_string())
            })
            .collect();

        Self {
            page: positive(location.get("page")).unwrap_or(defaults.page),
            limit: positive(location.get("limit")).unwrap_or(defaults.limit),
            sort: non_empty(location.get("sort"))
                .unwrap_or(defaults.sort)
                .to_string(),
            order: non_empty(location.get("order"))
                .and_then(|raw| SortOrder::from_str(raw).ok())
                .unwrap_or(defaults.order),
            search: location.get("search").unwrap_or_default().to_string(),
            filters,
        }
    }

    /// Effective filter value; `None` for [`ALL`].
    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters
            .get(name)
            .map(String::as_str)
            .filter(|v| *v != ALL)
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || self.filters.values().any(|v| v != ALL)
    }

    /// Parameters for the list endpoint. Deterministic in the URL.
    pub fn to_params(&self) -> ListParams {
        ListParams {
            page: Some(self.page),
            limit: Some(self.limit),
            sort: Some(self.sort.clone()),
            order: Some(self.order),
            search: Some(self.search.clone()).filter(|s| !s.is_empty()),
            status: self.typed_filter::<TicketStatus>("status"),
            priority: self.typed_filter::<TicketPriority>("priority"),
            category_id: self.filter("categoryId").map(str::to_string),
            assigned_to_id: self.filter("assignedToId").map(str::to_string),
        }
    }

    pub fn pagination(&self) -> PaginationState {
        PaginationState {
            page_index: self.page.saturating_sub(1),
            page_size: self.limit,
        }
    }

    pub fn sorting(&self) -> Vec<SortColumn> {
        vec![SortColumn {
            id: self.sort.clone(),
            desc: self.order == SortOrder::Desc,
        }]
    }

    fn typed_filter<T: FromStr>(&self, name: &str) -> Option<T> {
        let raw = self.filter(name)?;
        match T::from_str(raw) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::debug!(name, raw, "ignoring unrecognized filter value");
                None
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

/// A batch of query-string edits. Keys set to `None`, the empty string, or
/// [`ALL`] are removed; everything else is set in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlUpdate {
    entries: Vec<(String, Option<String>)>,
}

impl UrlUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.entries.push((key.to_string(), Some(value.to_string())));
        self
    }

    pub fn unset(mut self, key: &str) -> Self {
        self.entries.push((key.to_string(), None));
        self
    }

    pub fn page(self, page: u32) -> Self {
        self.set("page", page)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn apply(&self, location: &Location) -> Location {
        let mut next = location.clone();
        for (key, value) in &self.entries {
            match value.as_deref() {
                None | Some("") | Some(ALL) => next.remove(key),
                Some(value) => next.set(key, value),
            }
        }
        next
    }
}
