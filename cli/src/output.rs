//! Terminal rendering. Results go to stdout, notices to stderr.

use chrono::Utc;
use helpdesk_core::notify::Notice;
use helpdesk_core::notify::NoticeLevel;
use helpdesk_core::notify::Notifier;
use helpdesk_core::ticket_detail::TicketDetail;
use helpdesk_core::time_format::format_date;
use helpdesk_core::time_format::format_relative;
use helpdesk_protocol::Category;
use helpdesk_protocol::Message;
use helpdesk_protocol::Pagination;
use helpdesk_protocol::Ticket;
use helpdesk_protocol::User;
use serde::Serialize;

/// Prints notices to stderr, one per line, tagged with their level.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {}", notice.text);
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_user(user: &User) {
    println!("{} <{}> ({})", user.name, user.email, user.role);
}

pub(crate) fn ticket_line(ticket: &Ticket) -> String {
    let assignee = ticket
        .assigned_to
        .as_ref()
        .map_or("unassigned", |person| person.name.as_str());
    format!(
        "#{:<8}  {:<11}  {:<6}  {:<12}  {}  ({})",
        ticket.short_ref(),
        ticket.status.to_string(),
        ticket.priority.to_string(),
        assignee,
        ticket.subject,
        format_relative(ticket.created_at, Utc::now()),
    )
}

pub(crate) fn print_tickets(tickets: &[Ticket]) {
    if tickets.is_empty() {
        println!("No tickets found");
    }
    for ticket in tickets {
        println!("{}", ticket_line(ticket));
    }
}

pub(crate) fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users found");
    }
    for user in users {
        println!("{:<24}  {:<32}  {}", user.name, user.email, user.role);
    }
}

pub(crate) fn print_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found");
    }
    for category in categories {
        let manager = category
            .manager
            .as_ref()
            .map_or("-", |person| person.name.as_str());
        println!("{:<24}  {}", category.name, manager);
    }
}

pub(crate) fn print_pagination(pagination: Option<&Pagination>) {
    if let Some(p) = pagination {
        println!("page {} of {} ({} total)", p.page, p.total_pages.max(1), p.total);
    }
}

pub(crate) fn message_line(message: &Message) -> String {
    format!(
        "[{}] {} ({}): {}",
        format_relative(message.created_at, Utc::now()),
        message.sender_name,
        message.sender_type,
        message.content,
    )
}

pub(crate) fn print_detail(detail: &TicketDetail) {
    let ticket = &detail.ticket;
    println!("#{}  {}", ticket.short_ref(), ticket.subject);
    println!("status:   {}", ticket.status);
    println!("priority: {}", ticket.priority);
    println!("guest:    {} <{}>", ticket.guest_name, ticket.guest_email);
    if let Some(category) = &ticket.category {
        println!("category: {}", category.name);
    }
    if let Some(person) = &ticket.assigned_to {
        println!("assignee: {}", person.name);
    }
    println!("opened:   {}", format_date(ticket.created_at));
    if let Some(err) = &detail.refresh_error {
        println!("(showing last known state: {err})");
    }
    println!();
    println!("{}", ticket.initial_message);
    println!();
    for message in &detail.messages {
        println!("{}", message_line(message));
    }
}
