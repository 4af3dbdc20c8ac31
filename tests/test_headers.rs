use staticd::http::headers::{HeaderState, Progress};
use staticd::http::parser::ParseError;

#[test]
fn test_headers_complete_on_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let mut state = HeaderState::new();

    assert_eq!(state.update(req).unwrap(), Progress::Complete);
    assert!(state.headers_complete());
    assert_eq!(state.request_line(), Some("GET / HTTP/1.1"));
    assert_eq!(state.get("Host"), Some("example.com"));
}

#[test]
fn test_incomplete_without_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let mut state = HeaderState::new();

    assert_eq!(state.update(req).unwrap(), Progress::NeedMore);
    assert!(!state.headers_complete());
    assert_eq!(state.request_line(), None);
}

#[test]
fn test_incremental_feeding_byte_by_byte() {
    let req = b"GET /a.txt HTTP/1.1\r\nHost: x\r\nUser-Agent: test\r\n\r\n";
    let mut state = HeaderState::new();

    for end in 1..req.len() {
        assert_eq!(state.update(&req[..end]).unwrap(), Progress::NeedMore, "at {}", end);
    }
    assert_eq!(state.update(req).unwrap(), Progress::Complete);
    assert_eq!(state.get("User-Agent"), Some("test"));
}

#[test]
fn test_bare_lf_delimiter() {
    let mut state = HeaderState::new();

    assert_eq!(state.update(b"GET / HTTP/1.0\nHost: x\n\n").unwrap(), Progress::Complete);
    assert_eq!(state.get("Host"), Some("x"));
}

#[test]
fn test_content_length_waits_for_body() {
    let head = b"POST /form HTTP/1.1\r\nContent-Length: 5\r\n\r\n".to_vec();
    let mut state = HeaderState::new();

    assert_eq!(state.update(&head).unwrap(), Progress::NeedMore);
    assert!(state.headers_complete());
    assert_eq!(state.content_length(), Some(5));

    let mut partial = head.clone();
    partial.extend_from_slice(b"hell");
    assert_eq!(state.update(&partial).unwrap(), Progress::NeedMore);
    assert!(!state.body_complete(&partial));

    let mut full = head.clone();
    full.extend_from_slice(b"hello");
    assert_eq!(state.update(&full).unwrap(), Progress::Complete);
    assert_eq!(state.expected_len(), Some(head.len() + 5));
}

#[test]
fn test_content_length_lookup_is_case_insensitive() {
    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\ncontent-length: 2\r\n\r\nok";

    assert_eq!(state.update(req).unwrap(), Progress::Complete);
    assert_eq!(state.content_length(), Some(2));
    // stored as received
    assert!(state.headers().contains_key("content-length"));
}

#[test]
fn test_zero_content_length_completes_at_delimiter() {
    let mut state = HeaderState::new();
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n";

    assert_eq!(state.update(req).unwrap(), Progress::Complete);
}

#[test]
fn test_invalid_content_length() {
    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n";

    assert_eq!(state.update(req), Err(ParseError::InvalidContentLength));
}

#[test]
fn test_conflicting_content_lengths() {
    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\nContent-Length: 3\r\ncontent-length: 4\r\n\r\nabcd";

    assert_eq!(state.update(req), Err(ParseError::InvalidContentLength));

    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\nContent-Length: 10\r\nContent-Length: 0\r\n\r\n";

    assert_eq!(state.update(req), Err(ParseError::InvalidContentLength));
}

#[test]
fn test_repeated_equal_content_lengths_allowed() {
    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\nContent-Length: 2\r\nContent-Length: 2\r\n\r\nab";

    assert_eq!(state.update(req).unwrap(), Progress::Complete);
    assert_eq!(state.content_length(), Some(2));
}

#[test]
fn test_repeated_transfer_encoding_must_agree() {
    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nTransfer-Encoding: identity\r\n\r\n";

    assert_eq!(
        state.update(req),
        Err(ParseError::UnsupportedTransferEncoding("identity".to_string()))
    );
}

#[test]
fn test_repeated_plain_header_keeps_last_value() {
    let mut state = HeaderState::new();
    let req = b"GET / HTTP/1.1\r\nAccept: text/html\r\nAccept: text/plain\r\n\r\n";

    assert_eq!(state.update(req).unwrap(), Progress::Complete);
    assert_eq!(state.get("accept"), Some("text/plain"));
}

#[test]
fn test_chunked_transfer_encoding_rejected() {
    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";

    assert_eq!(
        state.update(req),
        Err(ParseError::UnsupportedTransferEncoding("chunked".to_string()))
    );
}

#[test]
fn test_identity_transfer_encoding_allowed() {
    let mut state = HeaderState::new();
    let req = b"GET / HTTP/1.1\r\nTransfer-Encoding: Identity\r\n\r\n";

    assert_eq!(state.update(req).unwrap(), Progress::Complete);
}

#[test]
fn test_malformed_header_line() {
    let mut state = HeaderState::new();
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";

    assert_eq!(state.update(req), Err(ParseError::InvalidHeader));
}

#[test]
fn test_header_name_with_space_rejected() {
    let mut state = HeaderState::new();
    let req = b"GET / HTTP/1.1\r\nBad Name: x\r\n\r\n";

    assert_eq!(state.update(req), Err(ParseError::InvalidHeader));
}

#[test]
fn test_folded_header_is_joined() {
    let mut state = HeaderState::new();
    let req = b"GET / HTTP/1.1\r\nX-Long: first\r\n  second\r\n\tthird\r\n\r\n";

    assert_eq!(state.update(req).unwrap(), Progress::Complete);
    assert_eq!(state.get("X-Long"), Some("first second third"));
}

#[test]
fn test_fold_without_preceding_header_rejected() {
    let mut state = HeaderState::new();
    let req = b"GET / HTTP/1.1\r\n continuation\r\n\r\n";

    assert_eq!(state.update(req), Err(ParseError::InvalidHeader));
}

#[test]
fn test_non_utf8_head_rejected() {
    let mut state = HeaderState::new();
    let req = b"GET /\xff HTTP/1.1\r\n\r\n";

    assert_eq!(state.update(req), Err(ParseError::NotUtf8));
}

#[test]
fn test_finish_without_delimiter_uses_whole_buffer() {
    let mut state = HeaderState::new();
    let req = b"GET /index.html HTTP/1.1\r\nHost: x";

    assert_eq!(state.update(req).unwrap(), Progress::NeedMore);
    assert_eq!(state.finish(req), Ok(()));
    assert_eq!(state.request_line(), Some("GET /index.html HTTP/1.1"));
    assert_eq!(state.get("Host"), Some("x"));
}

#[test]
fn test_finish_with_short_body_is_truncated() {
    let mut state = HeaderState::new();
    let req = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";

    assert_eq!(state.update(req).unwrap(), Progress::NeedMore);
    assert_eq!(state.finish(req), Err(ParseError::Truncated));
}
