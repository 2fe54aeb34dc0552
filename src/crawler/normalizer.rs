//! URL normalization for crawl dedup
//!
//! A raw `href` is resolved against the page it appeared on, then reduced to
//! `scheme://host[:port]/path`. Query strings, fragments and credentials are
//! dropped, so two links differing only in those parts name the same crawl
//! target.

use thiserror::Error;
use url::Url;

/// Why a link could not be turned into a crawlable URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The href could not be resolved against its base
    #[error("cannot resolve {href:?}: {source}")]
    Unresolvable {
        href: String,
        #[source]
        source: url::ParseError,
    },

    /// The resolved URL has no scheme or no host (mailto:, javascript:, data:, ...)
    #[error("{0} has no scheme or host")]
    MissingHost(String),
}

/// Resolve `href` against `base` and canonicalize the result
pub fn normalize(base: &Url, href: &str) -> Result<Url, NormalizeError> {
    let resolved = base.join(href).map_err(|source| NormalizeError::Unresolvable {
        href: href.to_string(),
        source,
    })?;

    canonicalize(resolved)
}

/// Parse and canonicalize an absolute URL, such as a seed
pub fn normalize_absolute(raw: &str) -> Result<Url, NormalizeError> {
    let parsed = Url::parse(raw.trim()).map_err(|source| NormalizeError::Unresolvable {
        href: raw.to_string(),
        source,
    })?;

    canonicalize(parsed)
}

fn canonicalize(mut url: Url) -> Result<Url, NormalizeError> {
    let has_host = url.host_str().is_some_and(|host| !host.is_empty());
    if url.scheme().is_empty() || !has_host {
        return Err(NormalizeError::MissingHost(url.to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    // Only fails for URLs without a host, rejected above
    let _ = url.set_username("");
    let _ = url.set_password(None);

    Ok(url)
}
