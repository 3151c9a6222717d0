//! Login, registration, and logout as complete user flows.

use helpdesk_protocol::User;
use helpdesk_protocol::requests::AuthResponse;
use helpdesk_protocol::requests::LoginRequest;
use helpdesk_protocol::requests::RegisterRequest;
use thiserror::Error;

use crate::client::ApiClient;
use crate::endpoints::Login;
use crate::endpoints::Logout;
use crate::endpoints::Register;
use crate::error::ClientError;
use crate::navigation::Navigator;
use crate::notify::Notice;
use crate::notify::Notifier;
use crate::route_guard::LOGIN_PATH;
use crate::validation::Validate;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// Caught before any request; shown next to the fields.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// 2xx envelope without a user.
    #[error("authentication rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub user: User,
    /// Session marker issued by the backend.
    pub token: String,
    /// Landing page for the user's role.
    pub redirect: &'static str,
}

pub async fn login(
    client: &ApiClient,
    notifier: &dyn Notifier,
    credentials: LoginRequest,
) -> Result<SignedIn, AuthFlowError> {
    credentials.validate()?;
    let result = client.mutate(&Login(credentials)).await;
    sign_in(client, notifier, result, "Logged in successfully", "Failed to login")
}

pub async fn register(
    client: &ApiClient,
    notifier: &dyn Notifier,
    form: RegisterRequest,
) -> Result<SignedIn, AuthFlowError> {
    form.validate()?;
    let result = client.mutate(&Register(form)).await;
    sign_in(
        client,
        notifier,
        result,
        "Account created successfully",
        "Failed to register",
    )
}

fn sign_in(
    client: &ApiClient,
    notifier: &dyn Notifier,
    result: Result<helpdesk_protocol::ApiResponse<AuthResponse>, ClientError>,
    success_text: &str,
    failure_text: &str,
) -> Result<SignedIn, AuthFlowError> {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            notifier.notify(Notice::error(err.user_message(failure_text)));
            return Err(err.into());
        }
    };
    let message = response.message.clone();
    let Some(AuthResponse { user, token }) = response.into_data() else {
        let text = message.unwrap_or_else(|| failure_text.to_string());
        notifier.notify(Notice::error(text.clone()));
        return Err(AuthFlowError::Rejected(text));
    };

    client.session().set_credentials(user.clone());
    notifier.notify(Notice::success(
        message.unwrap_or_else(|| success_text.to_string()),
    ));
    Ok(SignedIn {
        redirect: user.role.landing_page(),
        user,
        token,
    })
}

/// End the session. The local session is only cleared once the backend
/// confirms; a failed request leaves it in place.
pub async fn logout(
    client: &ApiClient,
    notifier: &dyn Notifier,
    navigator: &dyn Navigator,
) -> Result<(), ClientError> {
    match client.mutate(&Logout).await {
        Ok(_) => {
            client.session().clear();
            notifier.notify(Notice::success("Logged out successfully"));
            navigator.replace(LOGIN_PATH);
            Ok(())
        }
        Err(err) => {
            notifier.notify(Notice::error("Failed to logout"));
            Err(err)
        }
    }
}
