use reqwest::{Client, RequestBuilder, Url};

use common::ems::Policy;

use super::{endpoint, ApiRequest};

#[derive(Debug, Clone, Copy)]
pub struct ListPoliciesRequest;

impl ApiRequest for ListPoliciesRequest {
    type Response = Vec<Policy>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, "api/policies"))
    }
}
