//! Listener and CORS settings for the users service
//!
//! Filled from the `host`, `port` and `cors_origins` keys of `filedb.json`;
//! `serve --port` overrides the port afterwards.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Interface to listen on; all interfaces unless set
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Left empty, every origin is allowed, which
    /// is how the users service has always behaved.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// `host:port`, as handed to the listener
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty()
    }
}
