//! Locations and the navigator seam list views write through.

use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;

use tokio::sync::watch;
use url::form_urlencoded;

/// Path plus ordered query parameters, as seen in the address bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Parse `"/path?a=1&b=2"`. A fragment is dropped; an empty path means
    /// `/`.
    pub fn parse(href: &str) -> Self {
        let href = href.split_once('#').map_or(href, |(before, _)| before);
        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        let path = if path.is_empty() { "/" } else { path };
        Self {
            path: path.to_string(),
            query: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, keeping its position if already present and dropping any
    /// duplicates.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.query.iter().position(|(k, _)| k == key) {
            Some(first) => {
                self.query[first].1 = value;
                let mut index = 0;
                self.query.retain(|(k, _)| {
                    let keep = k != key || index == first;
                    index += 1;
                    keep
                });
            }
            None => self.query.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.query.retain(|(k, _)| k != key);
    }

    /// Same path, no query string.
    pub fn bare(&self) -> Self {
        Self::new(self.path.clone())
    }

    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

/// Where the current location lives and how it changes.
pub trait Navigator: Send + Sync {
    fn location(&self) -> Location;

    /// Navigate, adding a history entry.
    fn push(&self, href: &str);

    /// Navigate, replacing the current history entry.
    fn replace(&self, href: &str);
}

/// In-process navigator with a history stack. Observers follow the current
/// location through [`MemoryNavigator::subscribe`].
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<Location>>,
    current: watch::Sender<Location>,
}

impl MemoryNavigator {
    pub fn new(start: &str) -> Self {
        let start = Location::parse(start);
        let (current, _rx) = watch::channel(start.clone());
        Self {
            history: Mutex::new(vec![start]),
            current,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.current.subscribe()
    }

    pub fn history(&self) -> Vec<Location> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, href: &str, replace: bool) {
        let next = Location::parse(href);
        tracing::debug!(href = %next, replace, "navigating");
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            if replace {
                history.pop();
            }
            history.push(next.clone());
        }
        self.current.send_replace(next);
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> Location {
        self.current.borrow().clone()
    }

    fn push(&self, href: &str) {
        self.navigate(href, false);
    }

    fn replace(&self, href: &str) {
        self.navigate(href, true);
    }
}
