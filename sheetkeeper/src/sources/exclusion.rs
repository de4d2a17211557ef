//! Rich-media exclusion policy
//!
//! Some hosts make the rich-media extractor misbehave (archive snapshots of
//! video pages are the known case). URLs on these hosts skip the rich-media
//! lookup and go straight to the page-title fallback.

use reqwest::Url;

/// Hosts excluded from rich-media lookups
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    hosts: Vec<String>,
}

impl ExclusionPolicy {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// True if the URL's host is listed, or is a subdomain of a listed host.
    /// Unparseable URLs are never excluded.
    pub fn excludes(&self, url: &str) -> bool {
        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_ascii_lowercase(),
                None => return false,
            },
            Err(_) => return false,
        };

        self.hosts.iter().any(|excluded| {
            host == *excluded
                || host
                    .strip_suffix(excluded.as_str())
                    .map(|rest| rest.ends_with('.'))
                    .unwrap_or(false)
        })
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}
