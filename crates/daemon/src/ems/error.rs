use reqwest::StatusCode;

use common::ems::EmsError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("login rejected with HTTP status {0}: {1}")]
    Login(StatusCode, String),
    #[error("session rejected: {0}")]
    Unauthorized(String),
    #[error("login response carried no session cookie")]
    MissingSessionCookie,
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ApiError> for EmsError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Reqwest(e) if e.is_decode() => EmsError::malformed(e),
            ApiError::Reqwest(e) => EmsError::transport(e),
            ApiError::UrlParse(e) => EmsError::transport(e),
            ApiError::HttpStatus(status, body) => EmsError::Status {
                code: status.as_u16(),
                body,
            },
            e @ (ApiError::Login(..) | ApiError::Unauthorized(_) | ApiError::MissingSessionCookie) => {
                EmsError::authentication(e)
            }
            ApiError::Decode(e) => EmsError::malformed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_keeps_code_and_body() {
        let err: EmsError = ApiError::HttpStatus(StatusCode::CONFLICT, "taken".into()).into();
        assert_eq!(
            err,
            EmsError::Status {
                code: 409,
                body: "taken".into()
            }
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn session_failures_are_authentication_errors() {
        let err: EmsError = ApiError::Unauthorized("expired".into()).into();
        assert!(matches!(err, EmsError::Authentication(_)));
        let err: EmsError = ApiError::MissingSessionCookie.into();
        assert!(matches!(err, EmsError::Authentication(_)));
    }

    #[test]
    fn bad_json_is_malformed() {
        let decode = serde_json::from_str::<u64>("nope").unwrap_err();
        let err: EmsError = ApiError::Decode(decode).into();
        assert!(matches!(err, EmsError::Malformed(_)));
    }
}
