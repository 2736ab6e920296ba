use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;

use common::ems::{DataContainer, DcCreateOpts};

use super::{endpoint, ApiRequest};

#[derive(Debug, Clone, Copy)]
pub struct ListDataContainersRequest;

impl ApiRequest for ListDataContainersRequest {
    type Response = Vec<DataContainer>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, "api/data_containers"))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetDataContainerRequest {
    pub id: u64,
}

impl ApiRequest for GetDataContainerRequest {
    type Response = DataContainer;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, &format!("api/data_containers/{}", self.id)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDataContainerRequest {
    pub policy_id: u64,
    #[serde(flatten)]
    pub opts: DcCreateOpts,
}

impl ApiRequest for CreateDataContainerRequest {
    type Response = DataContainer;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(endpoint(base_url, "api/data_containers"))
            .json(&self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteDataContainerRequest {
    pub id: u64,
}

impl ApiRequest for DeleteDataContainerRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.delete(endpoint(base_url, &format!("api/data_containers/{}", self.id)))
    }
}
