use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use anyhow::bail;
use helpdesk_core::endpoints::TicketRef;
use helpdesk_core::session;
use helpdesk_core::session::BootstrapOutcome;
use helpdesk_core::ticket_detail::DetailView;
use helpdesk_core::ticket_detail::TicketDetail;
use helpdesk_core::ticket_detail::TicketDetailSynchronizer;
use helpdesk_core::ticket_detail::TicketFieldUpdate;

use crate::AppContext;
use crate::ReplyArgs;
use crate::UpdateArgs;
use crate::WatchArgs;
use crate::output;

pub(crate) fn by_id(id: String) -> TicketRef {
    TicketRef::Id(id)
}

pub(crate) fn by_token(token: String) -> TicketRef {
    TicketRef::Token(token)
}

fn mount(ctx: &AppContext, target: TicketRef) -> TicketDetailSynchronizer {
    TicketDetailSynchronizer::mount(
        &ctx.client,
        target,
        ctx.config.message_poll_interval,
        Arc::clone(&ctx.notifier),
    )
}

/// Staff views need a live session before they mount.
async fn require_staff(ctx: &AppContext) -> anyhow::Result<()> {
    match session::bootstrap(&ctx.client).await {
        BootstrapOutcome::Authenticated(_) => Ok(()),
        BootstrapOutcome::RedirectToLogin(_) => bail!("sign in first (see `helpdesk login`)"),
    }
}

/// Wait for the first complete load of the detail view.
async fn load(detail: &mut TicketDetailSynchronizer) -> anyhow::Result<TicketDetail> {
    match detail.settled().await {
        Some(DetailView::Ready(ticket)) => Ok(*ticket),
        Some(DetailView::NotFound) => bail!("ticket {} not found", detail.target()),
        Some(DetailView::Loading) | None => bail!("ticket {} could not be loaded", detail.target()),
    }
}

fn print(ctx: &AppContext, detail: &TicketDetail) -> anyhow::Result<()> {
    if ctx.json {
        return output::print_json(&serde_json::json!({
            "ticket": detail.ticket,
            "messages": detail.messages,
        }));
    }
    output::print_detail(detail);
    Ok(())
}

pub(crate) async fn show(ctx: &AppContext, target: TicketRef) -> anyhow::Result<()> {
    if !target.is_guest() {
        require_staff(ctx).await?;
    }
    let mut detail = mount(ctx, target);
    let result = load(&mut detail).await;
    detail.unmount().await;
    print(ctx, &result?)
}

pub(crate) async fn watch(ctx: &AppContext, args: WatchArgs) -> anyhow::Result<()> {
    let target = if args.guest {
        by_token(args.target)
    } else {
        require_staff(ctx).await?;
        by_id(args.target)
    };
    let mut detail = mount(ctx, target);
    let first = match load(&mut detail).await {
        Ok(first) => first,
        Err(err) => {
            detail.unmount().await;
            return Err(err);
        }
    };
    print(ctx, &first)?;
    let mut seen: HashSet<String> = first.messages.iter().map(|m| m.id.clone()).collect();
    eprintln!(
        "watching {}; polling every {:?}, Ctrl-C to stop",
        detail.target(),
        ctx.config.message_poll_interval
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            view = detail.changed() => {
                let Some(view) = view else { break };
                let DetailView::Ready(current) = view else { continue };
                for message in current.messages.iter().filter(|m| !seen.contains(&m.id)) {
                    if ctx.json {
                        println!("{}", serde_json::to_string(message)?);
                    } else {
                        println!("{}", output::message_line(message));
                    }
                }
                seen.extend(current.messages.iter().map(|m| m.id.clone()));
            }
        }
    }

    detail.unmount().await;
    Ok(())
}

pub(crate) async fn update(ctx: &AppContext, args: UpdateArgs) -> anyhow::Result<()> {
    let mut updates = Vec::new();
    if let Some(status) = args.status {
        updates.push(TicketFieldUpdate::Status(status));
    }
    if let Some(priority) = args.priority {
        updates.push(TicketFieldUpdate::Priority(priority));
    }
    if let Some(assignee) = args.assignee {
        updates.push(TicketFieldUpdate::Assignee(assignee));
    }
    if let Some(category) = args.category {
        updates.push(TicketFieldUpdate::Category(category));
    }
    if updates.is_empty() {
        bail!("nothing to update; pass --status, --priority, --assignee, or --category");
    }

    require_staff(ctx).await?;
    let mut detail = mount(ctx, by_id(args.id));
    let result = apply_updates(&mut detail, updates).await;
    detail.unmount().await;
    print(ctx, &result?)
}

async fn apply_updates(
    detail: &mut TicketDetailSynchronizer,
    updates: Vec<TicketFieldUpdate>,
) -> anyhow::Result<TicketDetail> {
    load(detail).await?;
    for update in updates {
        let label = update.label();
        detail
            .update_field(update)
            .await
            .with_context(|| format!("{label} was not changed"))?;
    }
    load(detail).await
}

pub(crate) async fn resolve(ctx: &AppContext, id: String) -> anyhow::Result<()> {
    require_staff(ctx).await?;
    let mut detail = mount(ctx, by_id(id));
    let result = match load(&mut detail).await {
        Ok(_) => detail.mark_resolved().await.map_err(anyhow::Error::from),
        Err(err) => Err(err),
    };
    detail.unmount().await;
    let ticket = result?;
    if ctx.json {
        return output::print_json(&ticket);
    }
    println!("{}", output::ticket_line(&ticket));
    Ok(())
}

pub(crate) async fn reply(ctx: &AppContext, args: ReplyArgs) -> anyhow::Result<()> {
    let target = match (args.guest_token, args.id) {
        (Some(token), _) => by_token(token),
        (None, Some(id)) => {
            require_staff(ctx).await?;
            by_id(id)
        }
        (None, None) => bail!("pass a ticket id or --guest-token"),
    };

    let mut detail = mount(ctx, target);
    let result = match load(&mut detail).await {
        Ok(_) => detail
            .reply(&args.message)
            .await
            .map_err(anyhow::Error::from),
        Err(err) => Err(err),
    };
    detail.unmount().await;
    let message = result?;
    if ctx.json {
        return output::print_json(&message);
    }
    println!("{}", output::message_line(&message));
    Ok(())
}
