//! Header sanitization for both legs of a proxied exchange.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Strip headers nominated by the `Connection` header
//! - Strip the caller's `x-proxy-key` before anything goes upstream
//! - Strip policy headers (CSP, optionally Set-Cookie) from responses
//!
//! # Design Decisions
//! - Header names compare case-insensitively (`HeaderName` is lowercase)
//! - Repeated headers keep their relative order
//! - Filters return a fresh map; the input is never mutated

use axum::http::header::{self, HeaderMap, HeaderName};

use crate::config::ResponseConfig;
use crate::security::auth::PROXY_KEY_HEADER;

/// Headers that only describe a single transport hop.
pub const HOP_BY_HOP: [HeaderName; 10] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    HeaderName::from_static("trailers"),
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// Whether `name` is in the fixed hop-by-hop set.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Header names listed in `Connection` values. Those are hop-by-hop for
/// this message too.
fn connection_nominated(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Strips headers on the way in and on the way out.
#[derive(Debug, Clone)]
pub struct HeaderFilter {
    /// Policy-stripped response headers.
    response_strip: Vec<HeaderName>,
}

impl HeaderFilter {
    pub fn new(config: &ResponseConfig) -> Self {
        let mut response_strip: Vec<HeaderName> = config
            .strip_headers
            .iter()
            .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
            .collect();
        if !config.relay_set_cookie {
            response_strip.push(header::SET_COOKIE);
        }
        Self { response_strip }
    }

    /// Headers that may be sent upstream.
    pub fn filter_inbound(&self, headers: &HeaderMap) -> HeaderMap {
        copy_except(headers, |name| *name == PROXY_KEY_HEADER)
    }

    /// Headers that may be relayed to the caller.
    pub fn filter_outbound(&self, headers: &HeaderMap) -> HeaderMap {
        copy_except(headers, |name| self.response_strip.contains(name))
    }
}

fn copy_except<F>(headers: &HeaderMap, extra: F) -> HeaderMap
where
    F: Fn(&HeaderName) -> bool,
{
    let nominated = connection_nominated(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if is_hop_by_hop(name) || nominated.contains(name) || extra(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
