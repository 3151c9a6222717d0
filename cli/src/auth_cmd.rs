use anyhow::bail;
use helpdesk_core::auth;
use helpdesk_core::navigation::MemoryNavigator;
use helpdesk_core::navigation::Navigator;
use helpdesk_core::route_guard::LOGIN_PATH;
use helpdesk_core::session;
use helpdesk_core::session::BootstrapOutcome;
use helpdesk_protocol::requests::LoginRequest;
use serde_json::json;

use crate::AppContext;
use crate::LoginArgs;
use crate::output;

pub(crate) async fn login(ctx: &AppContext, args: LoginArgs) -> anyhow::Result<()> {
    let credentials = LoginRequest {
        email: args.email,
        password: args.password,
    };
    let signed_in = auth::login(&ctx.client, ctx.notifier.as_ref(), credentials).await?;

    if ctx.json {
        return output::print_json(&json!({
            "user": signed_in.user,
            "token": signed_in.token,
            "redirect": signed_in.redirect,
        }));
    }
    output::print_user(&signed_in.user);
    println!("landing page: {}", signed_in.redirect);
    println!("token: {}", signed_in.token);
    println!("pass it with --token or HELPDESK_TOKEN to stay signed in");
    Ok(())
}

pub(crate) async fn logout(ctx: &AppContext) -> anyhow::Result<()> {
    if !ctx.client.has_session_marker() {
        bail!("not signed in; pass --token to end a session");
    }
    let navigator = MemoryNavigator::new("/");
    auth::logout(&ctx.client, ctx.notifier.as_ref(), &navigator).await?;
    tracing::debug!(location = %navigator.location(), "signed out");
    Ok(())
}

pub(crate) async fn whoami(ctx: &AppContext) -> anyhow::Result<()> {
    match session::bootstrap(&ctx.client).await {
        BootstrapOutcome::Authenticated(user) => {
            if ctx.json {
                return output::print_json(&user);
            }
            output::print_user(&user);
            Ok(())
        }
        BootstrapOutcome::RedirectToLogin(Some(err)) => {
            bail!("not signed in ({err}); go to {LOGIN_PATH}")
        }
        BootstrapOutcome::RedirectToLogin(None) => bail!("not signed in; go to {LOGIN_PATH}"),
    }
}
