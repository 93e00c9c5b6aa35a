//! Proxy Configuration Types
//!
//! Proxy settings applied to every outbound HTTP client (chat providers,
//! model discovery, web search). The client factory lives in
//! `streamchat-llm`.

use serde::{Deserialize, Serialize};

/// Environment variable consulted for the proxy password
pub const PROXY_PASSWORD_ENV: &str = "STREAMCHAT_PROXY_PASSWORD";

/// Proxy protocol type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks5" | "socks5h" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Supplied at runtime through `STREAMCHAT_PROXY_PASSWORD`; never persisted.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Parse a proxy URL such as `socks5://user:pw@127.0.0.1:1080`.
    ///
    /// The port must be explicit for SOCKS proxies.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let parsed = url::Url::parse(raw.trim()).map_err(|e| format!("Invalid proxy URL: {}", e))?;

        let protocol = ProxyProtocol::from_scheme(parsed.scheme())
            .ok_or_else(|| format!("Unsupported proxy scheme: {}", parsed.scheme()))?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "Proxy URL has no host".to_string())?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| "Proxy URL has no port".to_string())?;

        let username = Some(parsed.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let password = parsed.password().map(str::to_string);

        Ok(Self {
            protocol,
            host,
            port,
            username,
            password,
        })
    }

    /// Fill the password from the environment when none is set.
    pub fn with_password_from_env(mut self) -> Self {
        if self.password.is_none() {
            self.password = std::env::var(PROXY_PASSWORD_ENV)
                .ok()
                .filter(|p| !p.is_empty());
        }
        self
    }

    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}
