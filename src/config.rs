use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, de::DeserializeOwned};

use crate::layout::ColumnLayout;

const DEFAULT_PORT: u16 = 8081;

pub const PORTAL_LOGIN_URL: &str = "https://lms.uaf.edu.pk/login/index.php";
pub const PORTAL_RESULT_URL: &str = "https://lms.uaf.edu.pk/course/uaf_student_result.php";
pub const PORTAL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DIAGNOSTIC_DUMP_PATH: &str = "last_failed_result.html";

/// The env vars read at startup. `PORT` is the only externally configurable value.
#[derive(Debug, Deserialize)]
pub struct ServerEnv {
    port: Option<u16>,
}

pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn new() -> anyhow::Result<Self> {
        let server_env = ServerEnv::load_from_env()?;
        Ok(Self::from_env(server_env))
    }

    fn from_env(server_env: ServerEnv) -> Self {
        let port = server_env.port.unwrap_or(DEFAULT_PORT);
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}

/// Where the portal lives and how its result page is laid out.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub login_url: String,
    pub result_url: String,
    pub timeout: Duration,
    /// Overwritten with the raw result page whenever no course rows are found.
    pub diagnostic_dump_path: PathBuf,
    pub layout: ColumnLayout,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: PORTAL_LOGIN_URL.to_string(),
            result_url: PORTAL_RESULT_URL.to_string(),
            timeout: PORTAL_TIMEOUT,
            diagnostic_dump_path: PathBuf::from(DIAGNOSTIC_DUMP_PATH),
            layout: ColumnLayout::standard(),
        }
    }
}

pub struct TokenExtractor {
    // Matches the script line that fills in the hidden token input on the login page.
    token_regex: Regex,
}

impl TokenExtractor {
    pub fn new() -> anyhow::Result<Self> {
        let token_regex = Regex::new(r"document\.getElementById\('token'\)\.value='(.*?)'")?;
        Ok(Self { token_regex })
    }

    pub fn extract<'a>(&self, login_page: &'a str) -> Option<&'a str> {
        let caps = self.token_regex.captures(login_page)?;
        caps.get(1).map(|match_| match_.as_str())
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
