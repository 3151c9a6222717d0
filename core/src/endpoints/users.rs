use helpdesk_protocol::ListParams;
use helpdesk_protocol::User;
use helpdesk_protocol::requests::CreateUserRequest;

use super::Mutation;
use super::Query;
use super::json_args;
use crate::cache::Tag;
use crate::cache::TagRef;
use crate::error::ClientError;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Default)]
pub struct ListUsers(pub Option<ListParams>);

impl Query for ListUsers {
    type Data = Vec<User>;
    const NAME: &'static str = "getUsers";

    fn request(&self) -> ApiRequest {
        let query = self
            .0
            .as_ref()
            .map(ListParams::to_query_pairs)
            .unwrap_or_default();
        ApiRequest::get("/users").with_query(query)
    }

    fn cache_args(&self) -> String {
        json_args(&self.0)
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Users)]
    }
}

/// Managers eligible for ticket assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListManagers;

impl Query for ListManagers {
    type Data = Vec<User>;
    const NAME: &'static str = "getManagers";

    fn request(&self) -> ApiRequest {
        ApiRequest::get("/users/managers")
    }

    fn cache_args(&self) -> String {
        String::new()
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Users)]
    }
}

#[derive(Debug, Clone)]
pub struct CreateUser(pub CreateUserRequest);

impl Mutation for CreateUser {
    type Data = User;
    const NAME: &'static str = "createUser";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::post("/users", &self.0)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Users)]
    }
}
