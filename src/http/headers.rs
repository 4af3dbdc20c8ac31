//! Incremental header accumulation.
//!
//! [`HeaderState`] is fed the whole connection buffer after every read. It
//! scans only the bytes it has not looked at yet for the blank-line
//! delimiter, parses the head once, and from then on answers whether the
//! body declared by `Content-Length` has fully arrived.

use std::collections::HashMap;

use crate::http::parser::ParseError;

/// Result of folding another read into the header state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    NeedMore,
    Complete,
}

#[derive(Debug, Default)]
pub struct HeaderState {
    request_line: Option<String>,
    /// Names are kept as received. A repeated name keeps its last value,
    /// except the framing headers, whose repeats must agree.
    headers: HashMap<String, String>,
    /// Offset of the first body byte, set once the delimiter is seen.
    body_start: Option<usize>,
    content_length: Option<usize>,
    scanned: usize,
}

impl HeaderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-examines `buf`, which must be the previous buffer plus newly
    /// read bytes.
    pub fn update(&mut self, buf: &[u8]) -> Result<Progress, ParseError> {
        if self.body_start.is_none() {
            match find_delimiter(buf, self.scanned) {
                Some((head_end, body_start)) => {
                    self.parse_head(&buf[..head_end])?;
                    self.body_start = Some(body_start);
                }
                None => {
                    self.scanned = buf.len().saturating_sub(2);
                    return Ok(Progress::NeedMore);
                }
            }
        }

        if self.body_complete(buf) {
            Ok(Progress::Complete)
        } else {
            Ok(Progress::NeedMore)
        }
    }

    /// Called when the peer closed its side. Without a delimiter, the whole
    /// buffer is taken as the head.
    pub fn finish(&mut self, buf: &[u8]) -> Result<(), ParseError> {
        if self.body_start.is_none() {
            self.parse_head(buf)?;
            self.body_start = Some(buf.len());
        }

        if self.body_complete(buf) {
            Ok(())
        } else {
            Err(ParseError::Truncated)
        }
    }

    pub fn headers_complete(&self) -> bool {
        self.body_start.is_some()
    }

    pub fn body_complete(&self, buf: &[u8]) -> bool {
        match self.body_start {
            Some(start) => buf.len().saturating_sub(start) >= self.content_length.unwrap_or(0),
            None => false,
        }
    }

    /// Total size of head plus declared body, known once headers are complete.
    pub fn expected_len(&self) -> Option<usize> {
        self.body_start
            .map(|start| start.saturating_add(self.content_length.unwrap_or(0)))
    }

    pub fn request_line(&self) -> Option<&str> {
        self.request_line.as_deref()
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Case-insensitive header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn parse_head(&mut self, head: &[u8]) -> Result<(), ParseError> {
        let head = std::str::from_utf8(head).map_err(|_| ParseError::NotUtf8)?;
        let mut lines = head
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line));

        let request_line = lines
            .next()
            .filter(|line| !line.trim().is_empty())
            .ok_or(ParseError::InvalidRequestLine)?;
        self.request_line = Some(request_line.to_string());

        let mut last: Option<String> = None;
        for line in lines {
            if line.is_empty() {
                continue;
            }

            // obsolete line folding
            if line.starts_with([' ', '\t']) {
                let value = last
                    .as_ref()
                    .and_then(|key| self.headers.get_mut(key))
                    .ok_or(ParseError::InvalidHeader)?;
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }

            let (name, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ParseError::InvalidHeader);
            }

            let value = value.trim();
            self.check_repeat(name, value)?;
            self.headers.insert(name.to_string(), value.to_string());
            last = Some(name.to_string());
        }

        self.apply_framing()
    }

    /// Rejects a framing header that repeats with a different value.
    fn check_repeat(&self, name: &str, value: &str) -> Result<(), ParseError> {
        let Some(previous) = self.get(name) else {
            return Ok(());
        };

        if name.eq_ignore_ascii_case("Content-Length") {
            let same = match (previous.parse::<usize>(), value.parse::<usize>()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
            if !same {
                return Err(ParseError::InvalidContentLength);
            }
        } else if name.eq_ignore_ascii_case("Transfer-Encoding")
            && !previous.eq_ignore_ascii_case(value)
        {
            return Err(ParseError::UnsupportedTransferEncoding(value.to_string()));
        }

        Ok(())
    }

    fn apply_framing(&mut self) -> Result<(), ParseError> {
        if let Some(encoding) = self.get("Transfer-Encoding") {
            if !encoding.eq_ignore_ascii_case("identity") {
                return Err(ParseError::UnsupportedTransferEncoding(encoding.to_string()));
            }
        }

        let mut lengths = self
            .headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case("Content-Length"))
            .map(|(_, value)| value.parse::<usize>());

        if let Some(first) = lengths.next() {
            let first = first.map_err(|_| ParseError::InvalidContentLength)?;
            // differently-cased duplicates must agree
            for other in lengths {
                if other != Ok(first) {
                    return Err(ParseError::InvalidContentLength);
                }
            }
            self.content_length = Some(first);
        }

        Ok(())
    }
}

/// Finds the blank line ending the head, starting at `from`. Accepts
/// `CRLF CRLF` and bare `LF LF`. Returns (end of head, start of body).
fn find_delimiter(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    (from..buf.len())
        .filter(|&i| buf[i] == b'\n')
        .find_map(|i| {
            let rest = &buf[i + 1..];
            if rest.starts_with(b"\n") {
                Some((i, i + 2))
            } else if rest.starts_with(b"\r\n") {
                Some((i, i + 3))
            } else {
                None
            }
        })
}
