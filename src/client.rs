use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::classifier::{PortalMarkers, ResponseClassifier};
use crate::config::Config;
use crate::fetch_error::FetchError;
use crate::importers::ConsumptionImporter;
use crate::models::DailyConsumption;

pub const LOGIN_PATH: &str = "/home.loginAction.do";
pub const HISTORY_PATH: &str = "/home/espace-client/votre-consommation.html?vueConso=historique";
pub const EXPORT_PATH: &str =
    "/home/espace-client/votre-consommation.exportConsommationData.do?vueConso=historique";

/// Session client for the Veolia Eau customer portal
///
/// Every call to [`VeoliaClient::fetch_export`] opens its own cookie session:
/// login, history page, then export. Nothing is kept between calls.
#[derive(Clone)]
pub struct VeoliaClient {
    config: Config,
    classifier: Arc<dyn ResponseClassifier>,
    importer: ConsumptionImporter,
}

impl VeoliaClient {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            classifier: Arc::new(PortalMarkers::default()),
            importer: ConsumptionImporter::new(),
        }
    }

    /// Replace the marker matching used to detect refused logins and maintenance
    pub fn with_classifier(mut self, classifier: impl ResponseClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Log in and download the export, then parse it
    #[instrument(skip(self), fields(host = %self.config.host, username = %self.config.username))]
    pub async fn get_consumption(&self) -> Result<Vec<DailyConsumption>, FetchError> {
        let export = self.fetch_export().await?;
        let readings = self.importer.parse_bytes(&export)?;
        info!("Retrieved {} daily consumption readings", readings.len());
        Ok(readings)
    }

    /// Log in and download the raw export bytes
    #[instrument(skip(self), fields(host = %self.config.host, username = %self.config.username))]
    pub async fn fetch_export(&self) -> Result<Vec<u8>, FetchError> {
        let session = self.new_session()?;

        self.login(&session).await?;
        // The portal refuses the export until the history page has been opened
        self.open_history(&session).await?;
        self.download_export(&session).await
    }

    fn new_session(&self) -> Result<Client, FetchError> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(seconds) = self.config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        builder.build().map_err(FetchError::ClientBuild)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    async fn login(&self, session: &Client) -> Result<(), FetchError> {
        let url = self.url(LOGIN_PATH);
        let login_error = |source| FetchError::Login {
            username: self.config.username.clone(),
            url: url.clone(),
            source,
        };

        debug!("Posting login form to {url}");
        let response = session
            .post(&url)
            .form(&[
                ("veolia_username", self.config.username.as_str()),
                ("veolia_password", self.config.password.as_str()),
                ("login", "OK"),
            ])
            .send()
            .await
            .map_err(login_error)?;
        debug!("Login response status: {}", response.status());

        let body = response.bytes().await.map_err(login_error)?;
        if self
            .classifier
            .login_rejected(&String::from_utf8_lossy(&body))
        {
            warn!("Login refused, login form is still present");
            return Err(FetchError::LoginRejected {
                username: self.config.username.clone(),
            });
        }

        info!("Logged in to {}", self.config.host);
        Ok(())
    }

    async fn open_history(&self, session: &Client) -> Result<(), FetchError> {
        let url = self.url(HISTORY_PATH);
        let body = self.get(session, &url).await?.bytes().await.map_err(|source| {
            FetchError::Request {
                url: url.clone(),
                source,
            }
        })?;
        debug!("Retrieved history page, size: {} bytes", body.len());

        if self
            .classifier
            .temporarily_unavailable(&String::from_utf8_lossy(&body))
        {
            warn!("Consumption history is temporarily unavailable");
            return Err(FetchError::TemporarilyUnavailable { url });
        }

        Ok(())
    }

    async fn download_export(&self, session: &Client) -> Result<Vec<u8>, FetchError> {
        let url = self.url(EXPORT_PATH);
        let response = self.get(session, &url).await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Export endpoint answered {status}");
            return Err(FetchError::UnexpectedStatus { url, status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;
        info!("Downloaded consumption export ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn get(&self, session: &Client, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!("Sending HTTP request to {url}");
        session
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })
    }
}
