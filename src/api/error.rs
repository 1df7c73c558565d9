use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::catalog::{CatalogError, CssUrlError, UnknownSortMode, UpstreamError};
use crate::http::{Response, StatusCode};

/// Request-scoped failure, rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GOOGLE_FONTS_API_KEY not set in backend")]
    MissingConfiguration,

    /// `message` names what the endpoint was doing; the upstream cause is
    /// logged, never sent to the client.
    #[error("{message}")]
    UpstreamUnavailable {
        message: &'static str,
        #[source]
        source: Arc<UpstreamError>,
    },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Maps a pipeline failure, using `message` for upstream outages.
    pub fn catalog(err: CatalogError, message: &'static str) -> Self {
        match err {
            CatalogError::MissingConfiguration => Self::MissingConfiguration,
            CatalogError::UpstreamUnavailable(source) => Self::UpstreamUnavailable { message, source },
            CatalogError::NotFound { .. } => Self::NotFound("Family not found"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingConfiguration | Self::UpstreamUnavailable { .. } => {
                StatusCode::InternalServerError
            }
            Self::NotFound(_) => StatusCode::NotFound,
            Self::InvalidInput(_) => StatusCode::BadRequest,
        }
    }

    pub fn into_response(self) -> Response {
        if matches!(self, Self::MissingConfiguration) {
            warn!("catalog request rejected: no upstream API key configured");
        }
        Response::json(self.status(), &json!({ "error": self.to_string() }))
    }
}

impl From<CssUrlError> for ApiError {
    fn from(err: CssUrlError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<UnknownSortMode> for ApiError {
    fn from(err: UnknownSortMode) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        (res.status(), serde_json::from_slice(res.body_slice()).unwrap())
    }

    #[test]
    fn missing_configuration_is_500() {
        let (status, json) = body(ApiError::catalog(
            CatalogError::MissingConfiguration,
            "Failed to fetch Google Fonts list",
        ));
        assert_eq!(status, StatusCode::InternalServerError);
        assert_eq!(json["error"], "GOOGLE_FONTS_API_KEY not set in backend");
    }

    #[test]
    fn upstream_failure_hides_cause() {
        let err = ApiError::catalog(
            CatalogError::UpstreamUnavailable(Arc::new(UpstreamError::Status { status: 403 })),
            "Failed to fetch combined fonts",
        );
        assert!(std::error::Error::source(&err).is_some());
        let (status, json) = body(err);
        assert_eq!(status, StatusCode::InternalServerError);
        assert_eq!(json, json!({ "error": "Failed to fetch combined fonts" }));
    }

    #[test]
    fn unknown_family_is_404() {
        let (status, json) = body(ApiError::catalog(
            CatalogError::NotFound { family: "Nope".into() },
            "Failed to fetch family details",
        ));
        assert_eq!(status, StatusCode::NotFound);
        assert_eq!(json["error"], "Family not found");
    }

    #[test]
    fn invalid_input_is_400() {
        let (status, json) = body(CssUrlError::MissingFamily.into());
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(json["error"], "family is required");

        let (status, _) = body(UnknownSortMode("newest".into()).into());
        assert_eq!(status, StatusCode::BadRequest);
    }
}
