//! Target host whitelist.
//!
//! Matching is exact and case-sensitive on the hostname alone. There is no
//! suffix or wildcard matching: listing `example.com` does not admit
//! `evil.example.com`.

use std::collections::HashSet;

/// Immutable set of reachable hostnames, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    hosts: HashSet<String>,
}

impl Whitelist {
    /// Build from configured entries. Entries are trimmed, empties dropped.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        Self { hosts }
    }

    pub fn is_allowed(&self, hostname: &str) -> bool {
        self.hosts.contains(hostname)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
