//! Response body normalization
//!
//! Differential oracles compare a mutated response with a baseline. The
//! injected value itself tends to be echoed back somewhere in the page, so
//! before comparing, every encoding-variant occurrence of the noise strings
//! is removed from the body.

/// Form-style URL encoding, the shape in which a payload appears when a page
/// echoes the raw query string.
pub fn url_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn html_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// XML 1.0 escaping; unlike [`html_encode`] this also covers the apostrophe.
pub fn xml_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Removes every occurrence of `pattern` from `body`: raw, URL-encoded,
/// HTML-entity-encoded, HTML-encoded-of-URL-encoded, and XML-escaped.
///
/// The URL-decoded form is deliberately not stripped; decoding values such
/// as a lone `%` is ambiguous and the decoded form does not occur in
/// responses we compare.
pub fn strip_off(body: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        return body.to_string();
    }

    let url = url_encode(pattern);
    let html = html_encode(pattern);
    let html_of_url = html_encode(&url);
    let xml = xml_encode(pattern);

    body.replace(pattern, "")
        .replace(&url, "")
        .replace(&html, "")
        .replace(&html_of_url, "")
        .replace(&xml, "")
}

/// Strips the attack value first, then the original value.
///
/// Both must go: if the page always contains the original value ("you
/// searched for cats") and the attack value embeds it ("cats AND 1=1"),
/// stripping only one of them leaves residue that breaks the comparison.
pub fn strip_original_and_attack(body: &str, original: &str, attack: &str) -> String {
    strip_off(&strip_off(body, attack), original)
}
