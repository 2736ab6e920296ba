//! HTTP client for the Elastifile management service.

mod client;
mod data_containers;
mod error;
mod exports;
mod policies;
mod sessions;

pub use client::{management_url, EmsClient, SessionState};
pub use error::ApiError;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

pub use data_containers::{
    CreateDataContainerRequest, DeleteDataContainerRequest, GetDataContainerRequest,
    ListDataContainersRequest,
};
pub use exports::{CreateExportRequest, DeleteExportRequest, ListExportsRequest};
pub use policies::ListPoliciesRequest;
pub use sessions::{Credentials, LoginRequest};

pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}

/// `<base>/<path>`; `base` always ends with a slash.
///
/// An unparsable result is reported by reqwest when the request is sent.
pub(crate) fn endpoint(base_url: &Url, path: &str) -> String {
    format!("{}{}", base_url, path)
}
