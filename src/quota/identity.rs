//! Client identity derivation.
//!
//! # Responsibilities
//! - Turn a connection's origin into the key that partitions quota state
//! - Honor `x-forwarded-for` only when the directly-connected peer is a
//!   configured trusted proxy; the header is client-controlled otherwise

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

use crate::config::IdentityConfig;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolves the client identity for an inbound request.
pub struct IdentityResolver {
    trusted_proxies: Vec<IpAddr>,
}

impl IdentityResolver {
    /// Build a resolver from config. Entries that fail to parse are
    /// rejected by config validation before this runs.
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            trusted_proxies: config
                .trusted_proxies
                .iter()
                .filter_map(|entry| entry.parse().ok())
                .collect(),
        }
    }

    /// Derive the client identity for a request.
    ///
    /// The peer IP is the identity unless the peer is a trusted proxy and
    /// sent `x-forwarded-for`, in which case the first (original client)
    /// entry of that header is used.
    pub fn resolve(&self, peer: SocketAddr, headers: &HeaderMap) -> String {
        if self.trusted_proxies.contains(&peer.ip()) {
            if let Some(forwarded) = headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
                if let Some(client) = forwarded.split(',').next().map(str::trim) {
                    if !client.is_empty() {
                        return client.to_string();
                    }
                }
            }
        }
        peer.ip().to_string()
    }
}
