use crate::config::EndpointConfig;
use crate::tools::whois::parser::{self, WhoisRecord};
use crate::tools::whois::WhoisError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Referral hops followed after the root server
const MAX_REFERRALS: usize = 2;

/// WHOIS seam
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn whois(&self, domain: &str) -> Result<WhoisRecord, WhoisError>;
}

/// WHOIS over TCP, starting at a root server and following referrals
#[derive(Debug, Clone)]
pub struct TcpWhois {
    root: String,
    port: u16,
    timeout: Duration,
}

impl TcpWhois {
    pub fn new(root: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(endpoints: &EndpointConfig, timeout: Duration) -> Self {
        Self::new(endpoints.whois_root.clone(), endpoints.whois_port, timeout)
    }

    /// Sends one query and reads the response until the server closes
    async fn query(&self, server: &str, domain: &str) -> Result<String, WhoisError> {
        tracing::debug!("WHOIS {} @ {}:{}", domain, server, self.port);

        let exchange = async {
            let mut stream = TcpStream::connect((server, self.port))
                .await
                .map_err(|e| WhoisError::Connect {
                    server: server.to_string(),
                    source: e,
                })?;
            stream.write_all(format!("{}\r\n", domain).as_bytes()).await?;

            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await?;
            Ok::<_, WhoisError>(String::from_utf8_lossy(&buf).into_owned())
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| WhoisError::Timeout(server.to_string()))?
    }
}

#[async_trait]
impl WhoisLookup for TcpWhois {
    async fn whois(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        let mut server = self.root.clone();
        let mut text = self.query(&server, domain).await?;

        for _ in 0..MAX_REFERRALS {
            let Some(next) = parser::referral(&text) else {
                break;
            };
            if next.eq_ignore_ascii_case(&server) {
                break;
            }

            match self.query(&next, domain).await {
                Ok(referred) if !referred.trim().is_empty() => {
                    server = next;
                    text = referred;
                }
                Ok(_) => break,
                // Keep what the previous server said
                Err(e) if server != self.root => {
                    tracing::warn!("WHOIS referral to {} failed: {}", next, e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!("WHOIS answer for {} came from {}", domain, server);
        let mut record = parser::parse(domain, &text)?;
        if record.whois_server.is_none() && server != self.root {
            record.whois_server = Some(server);
        }
        Ok(record)
    }
}
