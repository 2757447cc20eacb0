//! Detection of portal failures that come back as ordinary HTML pages

/// Path of the login form; still present in the body when credentials are refused
pub const LOGIN_FORM_MARKER: &str = "/home/connexion-espace-client.loginAction.do";

/// Maintenance banner shown on the consumption page
pub const MAINTENANCE_MARKER: &str = "momentanément indisponible";

/// Inspects response bodies for the portal's failure pages
pub trait ResponseClassifier: Send + Sync {
    /// True when the login response still shows the login form
    fn login_rejected(&self, body: &str) -> bool;

    /// True when the consumption page shows the maintenance message
    fn temporarily_unavailable(&self, body: &str) -> bool;
}

/// Substring matching against the markers the Veolia portal currently serves
#[derive(Debug, Clone)]
pub struct PortalMarkers {
    login_form: String,
    maintenance: String,
}

impl PortalMarkers {
    pub fn new(login_form: impl Into<String>, maintenance: impl Into<String>) -> Self {
        Self {
            login_form: login_form.into(),
            maintenance: maintenance.into(),
        }
    }
}

impl Default for PortalMarkers {
    fn default() -> Self {
        Self::new(LOGIN_FORM_MARKER, MAINTENANCE_MARKER)
    }
}

impl ResponseClassifier for PortalMarkers {
    fn login_rejected(&self, body: &str) -> bool {
        body.contains(&self.login_form)
    }

    fn temporarily_unavailable(&self, body: &str) -> bool {
        body.contains(&self.maintenance)
    }
}
