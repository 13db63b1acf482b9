use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use dnsstress_domain::{DomainError, QueryOutcome};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Expected content type for DNS-over-HTTPS (RFC 8484 §4.2.1)
const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

/// Builds the HTTP/2 client shared by every worker of a run.
///
/// The client timeout bounds the whole exchange, so a slow server surfaces as
/// `reqwest::Error::is_timeout`.
pub fn build_client(timeout: Duration, concurrency: usize) -> Result<reqwest::Client, DomainError> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .pool_max_idle_per_host(concurrency.max(1))
        .user_agent(concat!("dnsstress/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DomainError::Initialization(format!("Failed to build DoH client: {}", e)))
}

/// DNS-over-HTTPS transport (RFC 8484), POST with a wire-format body.
pub struct HttpsTransport {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpsTransport {
    pub fn new(url: String, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            url,
            client,
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn query(&mut self, domain: &str) -> QueryOutcome {
        let message_bytes = match MessageBuilder::build_query_with_id(domain, 0) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(domain = %domain, error = %e, "Failed to build DoH query");
                return QueryOutcome::ProtocolError;
            }
        };

        let start = Instant::now();

        let response = match self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)
            .header(ACCEPT, DNS_MESSAGE_CONTENT_TYPE)
            .timeout(self.timeout)
            .body(message_bytes)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_error(&self.url, &e),
        };

        let status = response.status();
        if !status.is_success() {
            debug!(
                url = %self.url,
                status = status.as_u16(),
                "DoH server returned non-success status"
            );
            return QueryOutcome::ProtocolError;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return classify_error(&self.url, &e),
        };
        let latency = start.elapsed();

        trace!(url = %self.url, response_len = body.len(), "DoH response received");

        match ResponseParser::parse(&body) {
            Ok(_) => QueryOutcome::success(latency),
            Err(e) => {
                debug!(url = %self.url, error = %e, "Malformed DoH reply");
                QueryOutcome::ProtocolError
            }
        }
    }
}

fn classify_error(url: &str, error: &reqwest::Error) -> QueryOutcome {
    if error.is_timeout() {
        trace!(url = %url, "DoH query timed out");
        QueryOutcome::Timeout
    } else {
        debug!(url = %url, error = %error, "DoH request failed");
        QueryOutcome::ConnectionError
    }
}
