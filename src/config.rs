use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::{
    account::{IdentityConfig, DEFAULT_AUTHORIZE_ENDPOINT, DEFAULT_REDIRECT_URI},
    storage::session_storage::SESSIONS_FILE_NAME,
};

/// Options of the identity provider, shared by the commands that sign in.
#[derive(Debug, Clone, Args)]
pub struct IdentityArgs {
    #[arg(long, help = "OAuth client id registered with the identity provider")]
    pub client_id: Option<String>,
    #[arg(long, default_value = DEFAULT_REDIRECT_URI, help = "Redirect URI registered for the client")]
    pub redirect_uri: String,
    #[arg(long, default_value = DEFAULT_AUTHORIZE_ENDPOINT, help = "Authorization endpoint of the provider")]
    pub authorize_endpoint: String,
}

impl Default for IdentityArgs {
    fn default() -> Self {
        Self {
            client_id: None,
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            authorize_endpoint: DEFAULT_AUTHORIZE_ENDPOINT.into(),
        }
    }
}

impl IdentityArgs {
    pub fn to_config(&self) -> Result<IdentityConfig> {
        IdentityConfig::new(
            &self.authorize_endpoint,
            self.client_id.clone(),
            self.redirect_uri.clone(),
        )
    }
}

/// Resolved configuration of a run. Shown in the settings view.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub log_to_console: bool,
    pub identity: IdentityConfig,
}

impl Settings {
    pub fn sessions_file(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
