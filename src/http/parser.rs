use thiserror::Error;

use crate::http::request::{Method, ParsedRequest};

/// Document served when the target names a directory.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Every way a request can be rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("peer sent no data")]
    Empty,
    #[error("request head is not valid UTF-8")]
    NotUtf8,
    #[error("invalid request line")]
    InvalidRequestLine,
    #[error("invalid header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("unsupported Transfer-Encoding: {0}")]
    UnsupportedTransferEncoding(String),
    #[error("invalid percent escape in target")]
    InvalidEscape,
    #[error("request exceeds {0} bytes")]
    TooLarge(usize),
    #[error("connection closed before the body was complete")]
    Truncated,
}

/// Parses `METHOD SP target SP version` and normalizes the target.
///
/// Exactly three whitespace separated tokens are accepted.
pub fn parse_request_line(line: &str) -> Result<ParsedRequest, ParseError> {
    let mut parts = line.split_whitespace();

    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequestLine);
    };

    Ok(ParsedRequest {
        method: Method::from(method),
        path: normalize_target(target)?,
        version: version.to_string(),
    })
}

/// Turns a request target into a document-root relative path.
///
/// The query string is dropped, one leading `/` is stripped, escapes are
/// decoded and `index.html` fills in for empty or directory targets. A NUL,
/// raw or escaped, is rejected. Traversal (`..`) is not handled here; see [`crate::handler`].
pub fn normalize_target(target: &str) -> Result<String, ParseError> {
    let target = match target.find('?') {
        Some(idx) => &target[..idx],
        None => target,
    };
    let target = target.strip_prefix('/').unwrap_or(target);

    let mut path = percent_decode(target)?;
    if path.contains('\0') {
        return Err(ParseError::InvalidEscape);
    }
    if path.is_empty() || path.ends_with('/') {
        path.push_str(DEFAULT_DOCUMENT);
    }
    Ok(path)
}

/// Decodes `%XX` escapes. A `%` not followed by two hex digits, or a
/// decoded sequence that is not UTF-8, is an error.
pub fn percent_decode(input: &str) -> Result<String, ParseError> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
            let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                _ => return Err(ParseError::InvalidEscape),
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(|_| ParseError::InvalidEscape)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
