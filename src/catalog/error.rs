use std::time::Duration;

/// Everything that can go wrong between a page and the catalog API.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog API error for {path}: {status} {status_text}")]
    Upstream {
        path: String,
        status: u16,
        status_text: String,
    },
    #[error("catalog request for {path} failed: {message}")]
    Transport { path: String, message: String },
    #[error("catalog resource {path} not found")]
    NotFound { path: String },
    #[error("catalog response for {path} could not be parsed: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog request for {path} timed out after {after:?}")]
    Timeout { path: String, after: Duration },
    #[error("page render cancelled")]
    Cancelled,
    #[error("invalid catalog request: {0}")]
    InvalidRequest(String),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    /// Short description suitable for an unavailable page section.
    pub fn reason(&self) -> String {
        match self {
            CatalogError::Upstream { status, .. } => format!("upstream returned {status}"),
            CatalogError::Transport { .. } => "upstream unreachable".to_string(),
            CatalogError::NotFound { .. } => "not found".to_string(),
            CatalogError::Parse { .. } => "malformed upstream response".to_string(),
            CatalogError::Timeout { .. } => "upstream timed out".to_string(),
            CatalogError::Cancelled => "cancelled".to_string(),
            CatalogError::InvalidRequest(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_short_and_pathless() {
        let err = CatalogError::Upstream {
            path: "/movie/1".to_string(),
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        assert_eq!(err.reason(), "upstream returned 500");
        assert!(!err.is_not_found());
        assert!(CatalogError::NotFound {
            path: "/movie/1".to_string()
        }
        .is_not_found());
    }
}
