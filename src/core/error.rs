use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidValue,

    ValidationInvalidArgument,
    ValidationInvalidJson,

    PathNotFound,
    DeletionOutsideAllowedRoot,

    MetadataMissing,
    MetadataInvalid,

    RemoteRequestFailed,
    RemoteReadFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::PathNotFound => "path.not_found",
            ErrorCode::DeletionOutsideAllowedRoot => "deletion.outside_allowed_root",

            ErrorCode::MetadataMissing => "metadata.missing",
            ErrorCode::MetadataInvalid => "metadata.invalid",

            ErrorCode::RemoteRequestFailed => "remote.request_failed",
            ErrorCode::RemoteReadFailed => "remote.read_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDetails {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRefusedDetails {
    pub path: String,
    pub allowed_pattern: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDetails {
    pub metadata_dir: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRequestFailedDetails {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub error: String,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn validation_invalid_json(
        err: serde_json::Error,
        context: Option<String>,
        snippet: Option<String>,
    ) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
            "snippet": snippet,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
            .with_hint("Pass settings inline, as @path/to/settings.json, or - to read stdin")
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    /// A path that is neither a directory, a file, nor a symlink to something that exists.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PathNotFound,
            format!("{} is neither a directory, file, nor valid symlink", path),
            to_details(PathDetails { path }),
        )
    }

    /// Entry found while partitioning an upload that cannot be classified.
    pub fn path_possibly_broken(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PathNotFound,
            format!("Possible broken file path: {}", path),
            to_details(PathDetails { path }),
        )
    }

    pub fn deletion_outside_allowed_root(
        path: impl Into<String>,
        allowed_pattern: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::DeletionOutsideAllowedRoot,
            format!(
                "Directory {} is not under staging folder! Will not remove automatically!",
                path
            ),
            to_details(DeletionRefusedDetails {
                path,
                allowed_pattern: allowed_pattern.into(),
            }),
        )
    }

    pub fn metadata_missing(
        message: impl Into<String>,
        metadata_dir: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        Self::new(
            ErrorCode::MetadataMissing,
            message,
            to_details(MetadataDetails {
                metadata_dir: metadata_dir.into(),
                files,
            }),
        )
    }

    pub fn metadata_invalid(
        message: impl Into<String>,
        metadata_dir: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        Self::new(
            ErrorCode::MetadataInvalid,
            message,
            to_details(MetadataDetails {
                metadata_dir: metadata_dir.into(),
                files,
            }),
        )
    }

    pub fn remote_request_failed(details: RemoteRequestFailedDetails) -> Self {
        let message = match details.status {
            Some(status) => format!("Webhook request failed: HTTP {}", status),
            None => format!("Webhook request failed: {}", details.error),
        };
        let retryable = details.status.map_or(true, |status| status >= 500);
        let mut err = Self::new(ErrorCode::RemoteRequestFailed, message, to_details(details));
        err.retryable = Some(retryable);
        err
    }

    pub fn remote_read_failed(location: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::RemoteReadFailed,
            "Failed to read remote object",
            serde_json::json!({ "location": location.into(), "error": error.into() }),
        )
        .with_hint("Check AWS credentials and that the bucket and key exist")
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_not_found_message_names_path() {
        let err = Error::path_not_found("mocked_file");
        assert_eq!(
            err.message,
            "mocked_file is neither a directory, file, nor valid symlink"
        );
        assert_eq!(err.code.as_str(), "path.not_found");
        assert_eq!(err.details["path"], "mocked_file");
    }

    #[test]
    fn deletion_refusal_message_matches_staging_wording() {
        let err = Error::deletion_outside_allowed_root("/foo/abc/def", "^/allen/.*");
        assert_eq!(
            err.message,
            "Directory /foo/abc/def is not under staging folder! Will not remove automatically!"
        );
        assert_eq!(err.details["allowedPattern"], "^/allen/.*");
    }

    #[test]
    fn remote_request_failure_is_retryable_only_for_server_errors() {
        let client_err = Error::remote_request_failed(RemoteRequestFailedDetails {
            url: "https://example.com/hook".to_string(),
            status: Some(404),
            error: "not found".to_string(),
        });
        assert_eq!(client_err.retryable, Some(false));
        assert_eq!(client_err.message, "Webhook request failed: HTTP 404");

        let server_err = Error::remote_request_failed(RemoteRequestFailedDetails {
            url: "https://example.com/hook".to_string(),
            status: Some(503),
            error: "unavailable".to_string(),
        });
        assert_eq!(server_err.retryable, Some(true));
    }
}
