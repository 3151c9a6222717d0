use helpdesk_protocol::User;
use helpdesk_protocol::requests::AuthResponse;
use helpdesk_protocol::requests::LoginRequest;
use helpdesk_protocol::requests::RegisterRequest;

use super::Mutation;
use super::Query;
use crate::cache::Tag;
use crate::cache::TagRef;
use crate::error::ClientError;
use crate::transport::ApiRequest;

#[derive(Debug, Clone)]
pub struct Login(pub LoginRequest);

impl Mutation for Login {
    type Data = AuthResponse;
    const NAME: &'static str = "login";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::post("/auth/login", &self.0)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Auth)]
    }
}

#[derive(Debug, Clone)]
pub struct Register(pub RegisterRequest);

impl Mutation for Register {
    type Data = AuthResponse;
    const NAME: &'static str = "register";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::post("/auth/register", &self.0)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Auth)]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Logout;

impl Mutation for Logout {
    type Data = serde_json::Value;
    const NAME: &'static str = "logout";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        Ok(ApiRequest::post_empty("/auth/logout"))
    }

    fn invalidates(&self) -> Vec<TagRef> {
        vec![
            TagRef::all(Tag::Auth),
            TagRef::all(Tag::Tickets),
            TagRef::all(Tag::Messages),
        ]
    }
}

/// Profile probe used to rehydrate the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Profile;

impl Query for Profile {
    type Data = User;
    const NAME: &'static str = "getProfile";

    fn request(&self) -> ApiRequest {
        ApiRequest::get("/auth/profile")
    }

    fn cache_args(&self) -> String {
        String::new()
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Auth)]
    }
}
