use helpdesk_protocol::Category;
use helpdesk_protocol::ListParams;
use helpdesk_protocol::requests::CreateCategoryRequest;

use super::Mutation;
use super::Query;
use super::json_args;
use crate::cache::Tag;
use crate::cache::TagRef;
use crate::error::ClientError;
use crate::transport::ApiRequest;

/// Category list; `None` fetches the unpaginated list used by pickers.
#[derive(Debug, Clone, Default)]
pub struct ListCategories(pub Option<ListParams>);

impl Query for ListCategories {
    type Data = Vec<Category>;
    const NAME: &'static str = "getCategories";

    fn request(&self) -> ApiRequest {
        let query = self
            .0
            .as_ref()
            .map(ListParams::to_query_pairs)
            .unwrap_or_default();
        ApiRequest::get("/categories").with_query(query)
    }

    fn cache_args(&self) -> String {
        json_args(&self.0)
    }

    fn provides(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Categories)]
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategory(pub CreateCategoryRequest);

impl Mutation for CreateCategory {
    type Data = Category;
    const NAME: &'static str = "createCategory";

    fn request(&self) -> Result<ApiRequest, ClientError> {
        ApiRequest::post("/categories", &self.0)
    }

    fn invalidates(&self) -> Vec<TagRef> {
        vec![TagRef::all(Tag::Categories)]
    }
}
