use std::sync::Arc;

use helpdesk_core::submission::SubmitOutcome;
use helpdesk_core::submission::TicketSubmitter;
use helpdesk_protocol::requests::CreateTicketRequest;
use serde_json::json;

use crate::AppContext;
use crate::SubmitArgs;
use crate::output;

pub(crate) async fn submit(ctx: &AppContext, args: SubmitArgs) -> anyhow::Result<()> {
    let form = CreateTicketRequest {
        guest_email: args.email,
        guest_name: args.name,
        subject: args.subject,
        initial_message: args.message,
    };
    let submitter = TicketSubmitter::new(ctx.client.clone(), Arc::clone(&ctx.notifier));

    let outcome = match submitter.submit(form).await? {
        SubmitOutcome::DuplicatesFound(pending) if args.yes => {
            tracing::info!(
                similar = pending.similar_tickets().len(),
                "submitting despite similar tickets"
            );
            submitter.confirm(pending).await?
        }
        outcome => outcome,
    };

    match outcome {
        SubmitOutcome::Created { ticket, redirect } => {
            if ctx.json {
                return output::print_json(&json!({ "ticket": ticket, "redirect": redirect }));
            }
            println!("{}", output::ticket_line(&ticket));
            println!("guest link: {redirect}");
        }
        SubmitOutcome::DuplicatesFound(pending) => {
            if ctx.json {
                return output::print_json(&json!({
                    "held": true,
                    "similarTickets": pending.similar_tickets(),
                }));
            }
            println!("Similar tickets already exist:");
            for similar in pending.similar_tickets() {
                println!(
                    "  {:>3.0}%  {}  {}",
                    similar.similarity * 100.0,
                    similar.id,
                    similar.subject
                );
            }
            println!("Nothing was submitted. Re-run with --yes to submit anyway.");
        }
    }
    Ok(())
}
