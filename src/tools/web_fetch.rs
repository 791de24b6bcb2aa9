//! HTTP fetcher backing the `fetchWebsiteContent` tool.
//!
//! URLs arrive verbatim from model output. Only public addresses are fetched
//! unless private hosts are explicitly allowed in the configuration. Every
//! connection, redirects included, resolves through [`PublicResolver`], so a
//! host is checked against the address it is actually dialled on.

use std::error::Error as StdError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect::Policy;
use url::{Host, Url};

use crate::config::FetchConfig;
use crate::error::{BotError, Result};

const MAX_REDIRECTS: usize = 5;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Retrieves the raw body behind a URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Raised inside the HTTP client when a hop targets a non-public address.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct BlockedTarget(String);

/// DNS resolver that refuses any host with a non-public address.
struct PublicResolver;

impl Resolve for PublicResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs = resolve_public(&host).await?;
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

async fn resolve_public(host: &str) -> std::result::Result<Vec<SocketAddr>, BoxError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0)).await?.collect();
    if let Some(addr) = addrs.iter().find(|addr| !is_public(&addr.ip())) {
        warn!(
            "Blocked connection to {host}: resolves to non-public address {}",
            addr.ip()
        );
        return Err(BlockedTarget(format!(
            "{host} resolves to non-public address {}",
            addr.ip()
        ))
        .into());
    }
    Ok(addrs)
}

#[derive(Debug, PartialEq, Eq)]
enum RedirectDecision {
    Follow,
    Block,
    TooMany,
}

/// `visited` counts the URLs already requested, the original one included.
fn redirect_decision(visited: usize, next: &Url, allow_private_hosts: bool) -> RedirectDecision {
    if visited > MAX_REDIRECTS {
        RedirectDecision::TooMany
    } else if !allow_private_hosts
        && (!matches!(next.scheme(), "http" | "https") || is_blocked_literal(next))
    {
        RedirectDecision::Block
    } else {
        RedirectDecision::Follow
    }
}

/// `reqwest`-backed fetcher with address filtering and a body size cap.
pub struct WebFetcher {
    client: reqwest::Client,
    max_bytes: usize,
    allow_private_hosts: bool,
}

impl WebFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let allow_private_hosts = config.allow_private_hosts;
        let redirect = Policy::custom(move |attempt| {
            match redirect_decision(attempt.previous().len(), attempt.url(), allow_private_hosts) {
                RedirectDecision::Follow => attempt.follow(),
                RedirectDecision::TooMany => attempt.error("too many redirects"),
                RedirectDecision::Block => {
                    let message = format!("redirect to {} targets a local address", attempt.url());
                    attempt.error(BlockedTarget(message))
                }
            }
        });

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(redirect);
        if !allow_private_hosts {
            builder = builder.dns_resolver(Arc::new(PublicResolver));
        }

        Ok(Self {
            client: builder.build()?,
            max_bytes: config.max_bytes,
            allow_private_hosts,
        })
    }

    fn check_target(&self, url: &Url) -> Result<()> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BotError::BlockedUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.host().is_none() {
            return Err(BotError::BlockedUrl(format!("{url} has no host")));
        }
        if !self.allow_private_hosts && is_blocked_literal(url) {
            warn!("Blocked fetch of {url}: local address");
            return Err(BotError::BlockedUrl(format!("{url} targets a local address")));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentFetcher for WebFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| BotError::BlockedUrl(format!("{url}: {e}")))?;
        self.check_target(&parsed)?;

        debug!("Fetching website content from {parsed}");
        let mut response = self.client.get(parsed).send().await.map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Fetch(format!("{url} returned {status}")));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
            let remaining = self.max_bytes - body.len();
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                debug!("Truncated {url} at {} bytes", self.max_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

fn fetch_error(err: reqwest::Error) -> BotError {
    if err.is_timeout() {
        return BotError::Timeout("Website fetch");
    }
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(blocked) = cause.downcast_ref::<BlockedTarget>() {
            return BotError::BlockedUrl(blocked.to_string());
        }
        source = cause.source();
    }
    BotError::Fetch(err.to_string())
}

fn is_blocked_literal(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => !is_public(&IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => !is_public(&IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".local")
                || domain.ends_with(".internal")
        }
        None => true,
    }
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(*v4),
        IpAddr::V6(v6) => is_public_v6(*v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    let this_network = a == 0;
    let shared = a == 100 && (64..128).contains(&b);
    let protocol_assignments = a == 192 && b == 0 && c == 0;
    let benchmarking = a == 198 && (b == 18 || b == 19);
    let reserved = a >= 240;
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_documentation()
        || ip.is_multicast()
        || this_network
        || shared
        || protocol_assignments
        || benchmarking
        || reserved)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() || ip.is_multicast() {
        return false;
    }
    let segments = ip.segments();
    // IPv4-mapped, IPv4-compatible and NAT64 forms all carry an IPv4 address in the low bits.
    if let Some(v4) = ip.to_ipv4() {
        return is_public_v4(v4);
    }
    if segments[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        let [.., hi, lo] = segments;
        let v4 = Ipv4Addr::from((u32::from(hi) << 16) | u32::from(lo));
        return is_public_v4(v4);
    }
    let unique_local = segments[0] & 0xfe00 == 0xfc00;
    let link_local = segments[0] & 0xffc0 == 0xfe80;
    !(unique_local || link_local)
}
