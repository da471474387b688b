//! Query-string extractor with validation.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Like [`ValidatedJson`](super::ValidatedJson), but for `?key=value` parameters.
///
/// ```ignore
/// async fn list(ValidatedQuery(p): ValidatedQuery<Pagination>) -> impl IntoResponse { .. }
/// ```
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedQuery(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Paging {
        #[serde(default = "one")]
        #[validate(range(min = 1))]
        page: u64,
    }

    fn one() -> u64 {
        1
    }

    async fn handler(ValidatedQuery(p): ValidatedQuery<Paging>) -> String {
        p.page.to_string()
    }

    async fn call(uri: &str) -> StatusCode {
        Router::new()
            .route("/", get(handler))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_defaults_apply_when_absent() {
        assert_eq!(call("/").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_out_of_range_is_rejected() {
        assert_eq!(call("/?page=0").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unparseable_is_rejected() {
        assert_eq!(call("/?page=two").await, StatusCode::BAD_REQUEST);
    }
}
