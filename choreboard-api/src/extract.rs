/// Request extractors that reject with [`ApiError`]
///
/// axum's own `Json` and `Query` answer malformed input with plain-text 400s
/// and 422s. These wrappers route every rejection through `ApiError`, so a bad
/// body or query string gets the usual failure envelope and a 400.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// JSON body that may be left out entirely
///
/// An empty body is `None`. Anything else must parse as `T`; the
/// `Content-Type` header is not checked.
#[derive(Debug)]
pub struct OptionalJson<T>(pub Option<T>);

impl<T> OptionalJson<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(None));
        }

        serde_json::from_slice(&bytes)
            .map(|value| OptionalJson(Some(value)))
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Rename {
        name: String,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_optional_json_empty_body() {
        let OptionalJson(value) = OptionalJson::<Rename>::from_request(request(""), &())
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_optional_json_parses_without_content_type() {
        let parsed = OptionalJson::<Rename>::from_request(request(r#"{"name":"Cabin"}"#), &())
            .await
            .unwrap()
            .into_inner()
            .unwrap();
        assert_eq!(parsed.name, "Cabin");
    }

    #[tokio::test]
    async fn test_optional_json_rejects_malformed_body() {
        let err = OptionalJson::<Rename>::from_request(request("{\"name\":"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_json_missing_field_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let err = ApiJson::<Rename>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
