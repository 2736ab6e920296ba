use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::Mutex;

use common::ems::{
    DataContainer, DcCreateOpts, EmsError, Export, ExportCreateOpts, Policy, StorageManager,
};

use super::error::ApiError;
use super::*;

/// Build the service's base URL from an address that may omit the scheme.
pub fn management_url(addr: &str) -> Result<Url, url::ParseError> {
    let mut url = if addr.contains("://") {
        Url::parse(addr)?
    } else {
        Url::parse(&format!("http://{}", addr))?
    };
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Where the client stands with the service's session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Authenticated { cookie: HeaderValue },
}

/// Management service client holding one session.
///
/// Logs in lazily on the first call. A `401` drops the session and is
/// reported to the caller; the next call logs in again.
#[derive(Debug)]
pub struct EmsClient {
    pub remote: Url,
    client: Client,
    credentials: Credentials,
    session: Mutex<SessionState>,
}

impl EmsClient {
    pub fn new(remote: &Url, credentials: Credentials) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
            credentials,
            session: Mutex::new(SessionState::Uninitialized),
        })
    }

    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    /// Drop the current session and log in again.
    pub async fn reauthenticate(&self) -> Result<(), ApiError> {
        let mut session = self.session.lock().await;
        *session = SessionState::Uninitialized;
        let cookie = self.login().await?;
        *session = SessionState::Authenticated { cookie };
        Ok(())
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let cookie = self.session_cookie().await?;
        let response = request
            .build_request(&self.remote, &self.client)
            .header(COOKIE, cookie)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            *self.session.lock().await = SessionState::Uninitialized;
            tracing::warn!("management service rejected the session, it will be renewed on the next call");
            return Err(ApiError::Unauthorized(response.text().await?));
        }
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status, response.text().await?));
        }

        // Deletes answer with an empty body.
        let body = response.bytes().await?;
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &body
        };
        Ok(serde_json::from_slice(body)?)
    }

    async fn session_cookie(&self) -> Result<HeaderValue, ApiError> {
        let mut session = self.session.lock().await;
        if let SessionState::Authenticated { cookie } = &*session {
            return Ok(cookie.clone());
        }
        let cookie = self.login().await?;
        *session = SessionState::Authenticated {
            cookie: cookie.clone(),
        };
        Ok(cookie)
    }

    async fn login(&self) -> Result<HeaderValue, ApiError> {
        let request = LoginRequest {
            user: self.credentials.clone(),
        };
        let response = request
            .build_request(&self.remote, &self.client)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Login(status, response.text().await?));
        }

        // Keep only the `name=value` part of every cookie.
        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        if cookies.is_empty() {
            return Err(ApiError::MissingSessionCookie);
        }
        let cookie = HeaderValue::from_str(&cookies.join("; "))
            .map_err(|_| ApiError::MissingSessionCookie)?;

        tracing::info!(remote = %self.remote, user = %self.credentials.login, "logged into management service");
        Ok(cookie)
    }
}

#[async_trait]
impl StorageManager for EmsClient {
    async fn list_data_containers(&self) -> Result<Vec<DataContainer>, EmsError> {
        Ok(self.call(ListDataContainersRequest).await?)
    }

    async fn get_data_container(&self, id: u64) -> Result<DataContainer, EmsError> {
        Ok(self.call(GetDataContainerRequest { id }).await?)
    }

    async fn create_data_container(
        &self,
        policy_id: u64,
        opts: &DcCreateOpts,
    ) -> Result<DataContainer, EmsError> {
        let request = CreateDataContainerRequest {
            policy_id,
            opts: opts.clone(),
        };
        Ok(self.call(request).await?)
    }

    async fn delete_data_container(&self, dc: &DataContainer) -> Result<(), EmsError> {
        Ok(self.call(DeleteDataContainerRequest { id: dc.id }).await?)
    }

    async fn list_exports(&self) -> Result<Vec<Export>, EmsError> {
        Ok(self.call(ListExportsRequest).await?)
    }

    async fn create_export(&self, name: &str, opts: &ExportCreateOpts) -> Result<Export, EmsError> {
        let request = CreateExportRequest {
            name: name.to_owned(),
            opts: opts.clone(),
        };
        Ok(self.call(request).await?)
    }

    async fn delete_export(&self, export: &Export) -> Result<(), EmsError> {
        Ok(self.call(DeleteExportRequest { id: export.id }).await?)
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, EmsError> {
        Ok(self.call(ListPoliciesRequest).await?)
    }
}
