use crate::importers::ExportError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to login as {username} ({url}): {source}")]
    Login {
        username: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Login failed for {username}, login form is still there")]
    LoginRejected { username: String },
    #[error("Url call failed ({url}): {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Veolia consumption is temporarily unavailable ({url})")]
    TemporarilyUnavailable { url: String },
    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
}
