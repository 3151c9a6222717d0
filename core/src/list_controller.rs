use std::sync::Arc;
use std::time::Duration;

use helpdesk_async_utils::Debouncer;
use helpdesk_protocol::ListParams;
use helpdesk_protocol::SortOrder;

use crate::list_query::ListDefaults;
use crate::list_query::ListQueryState;
use crate::list_query::PaginationState;
use crate::list_query::SortColumn;
use crate::list_query::UrlUpdate;
use crate::navigation::Navigator;

/// Next state for a table widget: either a literal value or a function of
/// the previous one.
pub enum Updater<T> {
    Value(T),
    Update(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> Updater<T> {
    pub fn update(f: impl FnOnce(&T) -> T + Send + 'static) -> Self {
        Updater::Update(Box::new(f))
    }

    pub fn resolve(self, previous: &T) -> T {
        match self {
            Updater::Value(value) => value,
            Updater::Update(f) => f(previous),
        }
    }
}

impl<T> From<T> for Updater<T> {
    fn from(value: T) -> Self {
        Updater::Value(value)
    }
}

/// Binds one list page to the current location.
///
/// Holds no list state of its own apart from the search draft; every read
/// goes back to the navigator's URL. Must be created inside a tokio runtime
/// since the draft is debounced on a background task.
pub struct ListQueryController<N: Navigator + 'static> {
    navigator: Arc<N>,
    defaults: ListDefaults,
    search: Debouncer<String>,
}

impl<N: Navigator + 'static> ListQueryController<N> {
    pub fn new(navigator: Arc<N>, defaults: ListDefaults, debounce: Duration) -> Self {
        let committed = navigator
            .location()
            .get("search")
            .unwrap_or_default()
            .to_string();
        let nav = Arc::clone(&navigator);
        let search = Debouncer::spawn(committed, debounce, move |draft: String| {
            let nav = Arc::clone(&nav);
            async move { commit_search(nav.as_ref(), &draft) }
        });
        Self {
            navigator,
            defaults,
            search,
        }
    }

    pub fn state(&self) -> ListQueryState {
        ListQueryState::from_location(&self.navigator.location(), &self.defaults)
    }

    pub fn params(&self) -> ListParams {
        self.state().to_params()
    }

    /// Merge `update` into the current query string and navigate.
    pub fn update_url(&self, update: UrlUpdate) {
        update_url(self.navigator.as_ref(), update);
    }

    pub fn search_draft(&self) -> String {
        self.search.current()
    }

    /// Record a keystroke. The draft reaches the URL once typing pauses.
    pub fn set_search_draft(&self, text: impl Into<String>) {
        self.search.push(text.into());
    }

    /// Change one filter and go back to the first page.
    pub fn set_filter(&self, name: &str, value: &str) {
        self.update_url(UrlUpdate::new().set(name, value).page(1));
    }

    pub fn pagination(&self) -> PaginationState {
        self.state().pagination()
    }

    pub fn sorting(&self) -> Vec<SortColumn> {
        self.state().sorting()
    }

    pub fn on_pagination_change(&self, updater: impl Into<Updater<PaginationState>>) {
        let next = updater.into().resolve(&self.pagination());
        self.update_url(
            UrlUpdate::new()
                .page(next.page_index + 1)
                .set("limit", next.page_size),
        );
    }

    /// An empty sort list drops `sort` and `order` so the page defaults apply.
    pub fn on_sorting_change(&self, updater: impl Into<Updater<Vec<SortColumn>>>) {
        let next = updater.into().resolve(&self.sorting());
        let update = match next.first() {
            Some(column) => {
                let order = if column.desc {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                };
                UrlUpdate::new().set("sort", &column.id).set("order", order)
            }
            None => UrlUpdate::new().unset("sort").unset("order"),
        };
        self.update_url(update);
    }

    /// Drop the search draft and every query parameter.
    pub fn clear_filters(&self) {
        self.search.reset(String::new());
        let bare = self.navigator.location().bare();
        self.navigator.push(&bare.href());
    }
}

fn update_url(navigator: &dyn Navigator, update: UrlUpdate) {
    let next = update.apply(&navigator.location());
    navigator.push(&next.href());
}

fn commit_search(navigator: &dyn Navigator, draft: &str) {
    let committed = navigator.location().get("search").unwrap_or_default().to_string();
    if draft == committed {
        return;
    }
    tracing::debug!(draft, "committing search");
    update_url(navigator, UrlUpdate::new().set("search", draft).page(1));
}
