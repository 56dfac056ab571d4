use url::Url;

/// Derive the tracked domain from a raw resource locator.
///
/// Only `http`/`https` locators yield a domain; the host is normalized by
/// stripping a single leading `www.`. Empty input, hostless locators,
/// browser-internal schemes and the new-tab placeholder yield `None`.
pub fn domain_from_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() || host == "newtab" {
        return None;
    }

    Some(host.to_string())
}
