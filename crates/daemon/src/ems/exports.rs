use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;

use common::ems::{Export, ExportCreateOpts};

use super::{endpoint, ApiRequest};

#[derive(Debug, Clone, Copy)]
pub struct ListExportsRequest;

impl ApiRequest for ListExportsRequest {
    type Response = Vec<Export>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, "api/exports"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateExportRequest {
    pub name: String,
    #[serde(flatten)]
    pub opts: ExportCreateOpts,
}

impl ApiRequest for CreateExportRequest {
    type Response = Export;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(endpoint(base_url, "api/exports")).json(&self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteExportRequest {
    pub id: u64,
}

impl ApiRequest for DeleteExportRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.delete(endpoint(base_url, &format!("api/exports/{}", self.id)))
    }
}
