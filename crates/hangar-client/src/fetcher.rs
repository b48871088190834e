use std::net::IpAddr;
use std::time::Duration;

use hangar_core::error::AppError;
use hangar_core::traits::PageFetcher;
use reqwest::Client;
use url::Url;

/// Career-page fetcher using reqwest.
///
/// Listing pages come from the target registry, but detail links are taken
/// from remote HTML, so requests to private/reserved IP ranges are blocked by
/// default. [`allow_private_urls`](Self::allow_private_urls) lifts the check
/// for local fixtures.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
    ssrf_protection: bool,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let timeout_secs = timeout.as_secs();
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; HangarBot/0.1; pilot job harvester)")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
            ssrf_protection: true,
        })
    }

    /// Allow requests to private/reserved IPs.
    pub fn allow_private_urls(mut self) -> Self {
        self.ssrf_protection = false;
        self
    }
}

impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        if self.ssrf_protection {
            validate_url(url).await?;
        }

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}


/// Reject non-http(s) URLs and hosts resolving to private/reserved addresses.
async fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::HttpError(format!("Invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::HttpError(format!(
            "URL scheme '{}' is not allowed (only http/https)",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::HttpError(format!("URL has no host: {url}")))?;
    let blocked = |ip: IpAddr| {
        AppError::HttpError(format!("Blocked {host}: resolves to private address {ip}"))
    };

    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        return if is_private_ip(ip) { Err(blocked(ip)) } else { Ok(()) };
    }

    let port = parsed.port_or_known_default().unwrap_or(443);
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AppError::NetworkError(format!("DNS lookup failed for {host}: {e}")))?;

    let mut resolved = false;
    for addr in addrs {
        resolved = true;
        if is_private_ip(addr.ip()) {
            return Err(blocked(addr.ip()));
        }
    }
    if !resolved {
        return Err(AppError::NetworkError(format!(
            "DNS lookup returned no addresses for {host}"
        )));
    }
    Ok(())
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                // 100.64.0.0/10 carrier-grade NAT
                || (a == 100 && (b & 0xC0) == 64)
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xFFC0) == 0xFE80
                || (first & 0xFE00) == 0xFC00
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}
