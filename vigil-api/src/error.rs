use anyhow::{anyhow, Context};
use serde_json::json;

use crate::CommentId;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Comment not found {0}")]
    NotFound(CommentId),

    #[error("Comment content is required")]
    EmptyContent,

    #[error("Parent comment not found {0}")]
    ParentNotFound(CommentId),

    #[error("Parent interaction {0} must be a comment of the same prayer request")]
    ParentMismatch(CommentId),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::ParentNotFound(_) => StatusCode::BAD_REQUEST,
            Error::ParentMismatch(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Body in the `{"error": message}` shape the backend answers with, plus
    /// enough structure to get the variant back
    pub fn contents(&self) -> Vec<u8> {
        let error = self.to_string();
        serde_json::to_vec(&match self {
            Error::Unknown(_) => json!({
                "error": error,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "error": error,
                "type": "permission-denied",
            }),
            Error::NotFound(id) => json!({
                "error": error,
                "type": "not-found",
                "id": id,
            }),
            Error::EmptyContent => json!({
                "error": error,
                "type": "empty-content",
            }),
            Error::ParentNotFound(id) => json!({
                "error": error,
                "type": "parent-not-found",
                "id": id,
            }),
            Error::ParentMismatch(id) => json!({
                "error": error,
                "type": "parent-mismatch",
                "id": id,
            }),
        })
        .expect("serializing error contents")
    }

    /// Parse an error body. Bodies without a `type` are what the real backend
    /// sends and become `Unknown` with their `error` (or `message`) text.
    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let id = || -> anyhow::Result<CommentId> {
            data.get("id")
                .and_then(|id| id.as_str())
                .map(CommentId::new)
                .ok_or_else(|| anyhow!("error is about a comment but has no comment id"))
        };
        Ok(match data.get("type").and_then(|t| t.as_str()) {
            Some("permission-denied") => Error::PermissionDenied,
            Some("not-found") => Error::NotFound(id()?),
            Some("empty-content") => Error::EmptyContent,
            Some("parent-not-found") => Error::ParentNotFound(id()?),
            Some("parent-mismatch") => Error::ParentMismatch(id()?),
            Some("unknown") | None => Error::Unknown(String::from(
                data.get("error")
                    .or_else(|| data.get("message"))
                    .and_then(|msg| msg.as_str())
                    .ok_or_else(|| anyhow!("error body has neither error nor message"))?,
            )),
            Some(_) => return Err(anyhow!("error contents has unknown type")),
        })
    }
}
