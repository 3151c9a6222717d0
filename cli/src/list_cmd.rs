use std::sync::Arc;

use anyhow::bail;
use helpdesk_core::GuardDecision;
use helpdesk_core::endpoints::ListCategories;
use helpdesk_core::endpoints::ListTickets;
use helpdesk_core::endpoints::ListUsers;
use helpdesk_core::endpoints::TriageQueue;
use helpdesk_core::list_controller::ListQueryController;
use helpdesk_core::list_query::ListDefaults;
use helpdesk_core::navigation::MemoryNavigator;
use helpdesk_core::navigation::Navigator;
use helpdesk_core::route_guard;
use helpdesk_core::session::authorize_view;
use serde_json::json;

use crate::AppContext;
use crate::RouteArgs;
use crate::output;

/// Which endpoint backs a list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListPage {
    Triage,
    Tickets,
    Users,
    Categories,
}

impl ListPage {
    fn for_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/admin/triage" => Some(ListPage::Triage),
            "/admin/tickets" | "/manager/tickets" => Some(ListPage::Tickets),
            "/admin/users" => Some(ListPage::Users),
            "/admin/categories" => Some(ListPage::Categories),
            _ => None,
        }
    }
}

pub(crate) fn route(args: &RouteArgs, json: bool) -> anyhow::Result<()> {
    let decision = route_guard::evaluate(&args.path, args.marker);
    if json {
        return output::print_json(&json!({
            "path": args.path,
            "allow": decision.is_allow(),
            "redirect": decision.target(),
        }));
    }
    match decision {
        GuardDecision::Allow => println!("allow"),
        GuardDecision::Redirect(to) => println!("redirect -> {to}"),
    }
    Ok(())
}

pub(crate) async fn list(ctx: &AppContext, href: &str) -> anyhow::Result<()> {
    let navigator = Arc::new(MemoryNavigator::new(href));
    let location = navigator.location();
    let path = location.path().to_string();

    if let GuardDecision::Redirect(to) = authorize_view(&ctx.client, &path).await {
        bail!("{path} is not available: redirected to {to}");
    }
    let (Some(page), Some(defaults)) = (ListPage::for_path(&path), ListDefaults::for_path(&path))
    else {
        bail!("{path} is not a list page");
    };

    let controller = ListQueryController::new(navigator, defaults, ctx.config.search_debounce);
    let params = controller.params();
    tracing::debug!(?params, "list parameters");

    match page {
        ListPage::Triage => {
            let response = ctx.client.query(&TriageQueue(Some(params))).await?;
            if ctx.json {
                return output::print_json(&response);
            }
            output::print_tickets(response.data.as_deref().unwrap_or_default());
            output::print_pagination(response.pagination.as_ref());
        }
        ListPage::Tickets => {
            let response = ctx.client.query(&ListTickets(Some(params))).await?;
            if ctx.json {
                return output::print_json(&response);
            }
            output::print_tickets(response.data.as_deref().unwrap_or_default());
            output::print_pagination(response.pagination.as_ref());
        }
        ListPage::Users => {
            let response = ctx.client.query(&ListUsers(Some(params))).await?;
            if ctx.json {
                return output::print_json(&response);
            }
            output::print_users(response.data.as_deref().unwrap_or_default());
            output::print_pagination(response.pagination.as_ref());
        }
        ListPage::Categories => {
            let response = ctx.client.query(&ListCategories(Some(params))).await?;
            if ctx.json {
                return output::print_json(&response);
            }
            output::print_categories(response.data.as_deref().unwrap_or_default());
            output::print_pagination(response.pagination.as_ref());
        }
    }
    Ok(())
}
