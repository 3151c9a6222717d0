//! `helpdesk` command-line front-end over `helpdesk-core`.
//!
//! Each subcommand mounts the same views a dashboard page would: the route
//! guard, the list-query controller, the ticket detail synchronizer. Notices
//! go to stderr, results to stdout.

mod auth_cmd;
mod list_cmd;
mod output;
mod submit_cmd;
mod ticket_cmd;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use helpdesk_core::ApiClient;
use helpdesk_core::ClientConfig;
use helpdesk_core::ConfigLoader;
use helpdesk_core::notify::Notifier;
use helpdesk_protocol::TicketPriority;
use helpdesk_protocol::TicketStatus;

use crate::output::ConsoleNotifier;

#[derive(Debug, Parser)]
#[command(name = "helpdesk", version, about = "Support desk client")]
pub struct Cli {
    /// API base URL, e.g. https://support.example.com/api.
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Session marker from a previous login.
    #[arg(long = "token", global = true)]
    pub token: Option<String>,

    /// Debug logging on stderr (RUST_LOG takes precedence).
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON.
    #[arg(long = "json", short = 'j', global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and print the issued session token.
    Login(LoginArgs),
    /// End the current session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Show where the route guard sends a path.
    Route(RouteArgs),
    /// Fetch a list page, e.g. "/manager/tickets?status=OPEN&page=2".
    List(ListArgs),
    /// Show a ticket and its thread.
    Show(ShowArgs),
    /// Show a ticket through its guest link token.
    Guest(GuestArgs),
    /// Follow a ticket thread until interrupted.
    Watch(WatchArgs),
    /// Change fields of a ticket.
    Update(UpdateArgs),
    /// Mark a ticket resolved.
    Resolve(ShowArgs),
    /// Post a reply to a ticket thread.
    Reply(ReplyArgs),
    /// Open a new ticket as a guest.
    Submit(SubmitArgs),
}

#[derive(Debug, Parser)]
pub struct LoginArgs {
    #[arg(long = "email", short = 'e')]
    pub email: String,

    #[arg(long = "password", short = 'p')]
    pub password: String,
}

#[derive(Debug, Parser)]
pub struct RouteArgs {
    /// Path to check, query string allowed.
    pub path: String,

    /// Pretend a session marker is present.
    #[arg(long = "marker")]
    pub marker: bool,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Page location including its query string.
    pub location: String,
}

#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Ticket id.
    pub id: String,
}

#[derive(Debug, Parser)]
pub struct GuestArgs {
    /// Unique token from the guest link.
    pub token: String,
}

#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Ticket id, or the guest token with --guest.
    pub target: String,

    #[arg(long = "guest")]
    pub guest: bool,
}

#[derive(Debug, Parser)]
pub struct UpdateArgs {
    /// Ticket id.
    pub id: String,

    #[arg(long = "status", value_parser = parse_status)]
    pub status: Option<TicketStatus>,

    #[arg(long = "priority", value_parser = parse_priority)]
    pub priority: Option<TicketPriority>,

    /// User id of the new assignee.
    #[arg(long = "assignee")]
    pub assignee: Option<String>,

    /// Category id.
    #[arg(long = "category")]
    pub category: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ReplyArgs {
    /// Ticket id. Omit when replying through --guest-token.
    #[arg(required_unless_present = "guest_token", conflicts_with = "guest_token")]
    pub id: Option<String>,

    /// Reply as the guest holding this ticket token.
    #[arg(long = "guest-token")]
    pub guest_token: Option<String>,

    #[arg(long = "message", short = 'm')]
    pub message: String,
}

#[derive(Debug, Parser)]
pub struct SubmitArgs {
    #[arg(long = "email")]
    pub email: String,

    #[arg(long = "name")]
    pub name: String,

    #[arg(long = "subject")]
    pub subject: String,

    #[arg(long = "message", short = 'm')]
    pub message: String,

    /// Submit even if similar tickets exist.
    #[arg(long = "yes", short = 'y')]
    pub yes: bool,
}

/// Accepts `in-progress`, `in_progress`, and `IN_PROGRESS` alike.
fn parse_status(raw: &str) -> Result<TicketStatus, String> {
    normalize_enum(raw)
        .parse()
        .map_err(|_| format!("unknown status '{raw}'"))
}

fn parse_priority(raw: &str) -> Result<TicketPriority, String> {
    normalize_enum(raw)
        .parse()
        .map_err(|_| format!("unknown priority '{raw}'"))
}

fn normalize_enum(raw: &str) -> String {
    raw.trim().replace('-', "_").to_ascii_uppercase()
}

/// What every command needs: resolved config, the shared client, and where
/// notices and results go.
pub(crate) struct AppContext {
    pub config: ClientConfig,
    pub client: ApiClient,
    pub notifier: Arc<dyn Notifier>,
    pub json: bool,
}

impl AppContext {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = ConfigLoader::new()
            .load()
            .context("failed to load configuration")?;
        if let Some(api_url) = &cli.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(token) = &cli.token {
            config.session_token = Some(token.clone());
        }
        tracing::debug!(api_url = %config.api_url, "configuration resolved");

        let client = ApiClient::from_config(&config)
            .with_context(|| format!("cannot reach API at {}", config.api_url))?;
        Ok(Self {
            config,
            client,
            notifier: Arc::new(ConsoleNotifier),
            json: cli.json,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(&cli)?;
    match cli.command {
        Command::Login(args) => auth_cmd::login(&ctx, args).await,
        Command::Logout => auth_cmd::logout(&ctx).await,
        Command::Whoami => auth_cmd::whoami(&ctx).await,
        Command::Route(args) => list_cmd::route(&args, ctx.json),
        Command::List(args) => list_cmd::list(&ctx, &args.location).await,
        Command::Show(args) => ticket_cmd::show(&ctx, ticket_cmd::by_id(args.id)).await,
        Command::Guest(args) => ticket_cmd::show(&ctx, ticket_cmd::by_token(args.token)).await,
        Command::Watch(args) => ticket_cmd::watch(&ctx, args).await,
        Command::Update(args) => ticket_cmd::update(&ctx, args).await,
        Command::Resolve(args) => ticket_cmd::resolve(&ctx, args.id).await,
        Command::Reply(args) => ticket_cmd::reply(&ctx, args).await,
        Command::Submit(args) => submit_cmd::submit(&ctx, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "helpdesk",
            "list",
            "/manager/tickets?status=OPEN",
            "--json",
            "--api-url",
            "http://localhost:9000/api",
        ])
        .expect("parse");
        assert!(cli.json);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/api"));
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.location, "/manager/tickets?status=OPEN");
    }

    #[test]
    fn update_accepts_loose_enum_spellings() {
        let cli = Cli::try_parse_from([
            "helpdesk",
            "update",
            "t1",
            "--status",
            "in-progress",
            "--priority",
            "urgent",
        ])
        .expect("parse");
        let Command::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.status, Some(TicketStatus::InProgress));
        assert_eq!(args.priority, Some(TicketPriority::Urgent));
        assert_eq!(args.assignee, None);
    }

    #[test]
    fn update_rejects_unknown_status() {
        let err = Cli::try_parse_from(["helpdesk", "update", "t1", "--status", "pending"])
            .expect_err("unknown status");
        assert!(err.to_string().contains("unknown status 'pending'"));
    }

    #[test]
    fn reply_needs_an_id_or_a_token() {
        assert!(Cli::try_parse_from(["helpdesk", "reply", "-m", "hi"]).is_err());
        assert!(
            Cli::try_parse_from([
                "helpdesk",
                "reply",
                "t1",
                "--guest-token",
                "abc",
                "-m",
                "hi"
            ])
            .is_err()
        );

        let cli = Cli::try_parse_from(["helpdesk", "reply", "--guest-token", "abc", "-m", "hi"])
            .expect("parse");
        let Command::Reply(args) = cli.command else {
            panic!("expected reply");
        };
        assert_eq!(args.guest_token.as_deref(), Some("abc"));
        assert_eq!(args.id, None);
        assert_eq!(cli.token, None);
    }

    #[test]
    fn submit_holds_by_default() {
        let cli = Cli::try_parse_from([
            "helpdesk",
            "submit",
            "--email",
            "sam@example.com",
            "--name",
            "Sam",
            "--subject",
            "Cannot log in",
            "--message",
            "The login page spins forever.",
        ])
        .expect("parse");
        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert!(!args.yes);
    }
}
