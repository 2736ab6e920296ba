use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;

use super::{endpoint, ApiRequest};

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST api/sessions`. The session comes back as a cookie, the body is
/// ignored.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub user: Credentials,
}

impl ApiRequest for LoginRequest {
    type Response = serde_json::Value;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(endpoint(base_url, "api/sessions"))
            .json(&self)
    }
}
