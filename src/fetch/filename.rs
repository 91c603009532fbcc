//! Best-effort filename for a fetched image.

use percent_encoding::percent_decode_str;
use url::Url;

/// Pick a filename for a remote response.
///
/// The filename from `Content-Disposition` wins (`filename*` over `filename`);
/// otherwise the last non-empty path segment of the URL, percent-decoded;
/// otherwise an empty string.
pub fn extract_filename(content_disposition: Option<&str>, url: &Url) -> String {
    content_disposition
        .and_then(disposition_filename)
        .filter(|name| !name.is_empty())
        .or_else(|| last_segment(url))
        .map(|name| sanitize(&name))
        .unwrap_or_default()
}

/// The filename carried by a `Content-Disposition` value.
fn disposition_filename(value: &str) -> Option<String> {
    let mut parts = split_params(value).into_iter();

    let disposition = parts.next()?;
    if disposition.is_empty() || disposition.contains('=') {
        return None;
    }

    let mut plain = None;
    for param in parts {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.eq_ignore_ascii_case("filename*") {
            if let Some(decoded) = decode_extended(value.trim()).filter(|n| !n.is_empty()) {
                return Some(decoded);
            }
        } else if name.eq_ignore_ascii_case("filename") && plain.is_none() {
            plain = Some(unquote(value.trim()));
        }
    }

    plain
}

/// Decode an RFC 5987 extended value: `charset'language'percent-encoded`.
/// Only UTF-8 and US-ASCII are understood.
fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
    if charset.eq_ignore_ascii_case("utf-8")
        || (charset.eq_ignore_ascii_case("us-ascii") && decoded.is_ascii())
    {
        Some(decoded.into_owned())
    } else {
        None
    }
}

/// Split on `;` outside of quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());

    parts.retain(|p| !p.is_empty());
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
}

/// Keep the base name and drop characters that cannot go back into a header.
pub(crate) fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars().filter(|c| !c.is_control()).collect()
}
