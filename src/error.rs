// Error type shared by every module of the library.
//
// Nothing here is recovered from: the binaries bubble these up to `main`,
// which prints the message on stderr and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP exchange itself failed (DNS, connection, TLS, ...).
    #[error("POST '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The HTTP client could not be constructed; no request was sent.
    #[error("cannot set up the HTTP client: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// The service answered with something other than 200.
    #[error("POST '{url}' failed, StatusCode=[{status}], X-Error=[{}], X-Error-Code=[{}]",
        .x_error.as_deref().unwrap_or(""), .x_error_code.as_deref().unwrap_or(""))]
    Status {
        url: String,
        status: u16,
        x_error: Option<String>,
        x_error_code: Option<String>,
    },

    /// The response body was not JSON.
    #[error("'{operation}' returned a body that is not JSON: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON was well formed but lacked (or mistyped) a field we need.
    #[error("unexpected '{operation}' response: {message}")]
    Schema { operation: String, message: String },

    /// `send` answered 200 but reported the action as not applied.
    #[error("'{action}' on item #{item_id} was rejected by the service")]
    ActionRejected { action: String, item_id: String },

    #[error("cannot access credential file {}: {source}", .path.display())]
    CredentialIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode credentials: {0}")]
    CredentialEncode(#[source] serde_json::Error),

    #[error("cannot determine the home directory")]
    HomeDirUnavailable,

    #[error("no API key entered")]
    MissingApiKey,

    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error("input closed while waiting for a command")]
    InputClosed,
}

impl Error {
    pub(crate) fn schema(operation: &str, message: impl ToString) -> Self {
        Error::Schema {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_url_and_provider_headers() {
        let err = Error::Status {
            url: "https://getpocket.com/v3/oauth/request".into(),
            status: 403,
            x_error: Some("Invalid consumer key.".into()),
            x_error_code: Some("152".into()),
        };
        let text = err.to_string();
        assert!(text.contains("oauth/request"));
        assert!(text.contains("StatusCode=[403]"));
        assert!(text.contains("X-Error-Code=[152]"));
    }

    #[test]
    fn status_error_without_headers_prints_empty_brackets() {
        let err = Error::Status {
            url: "https://getpocket.com/v3/get".into(),
            status: 503,
            x_error: None,
            x_error_code: None,
        };
        assert!(err.to_string().ends_with("X-Error=[], X-Error-Code=[]"));
    }

    #[test]
    fn client_setup_error_does_not_claim_a_request() {
        let source = reqwest::Proxy::http("http://[").unwrap_err();
        let text = Error::ClientSetup(source).to_string();
        assert!(text.starts_with("cannot set up the HTTP client"));
        assert!(!text.contains("POST"));
    }
}
