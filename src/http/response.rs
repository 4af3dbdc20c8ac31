use std::time::SystemTime;

use bytes::Bytes;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = concat!("staticd/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes the server produces.
///
/// - `Ok` (200): File served
/// - `BadRequest` (400): Malformed or timed-out request
/// - `Forbidden` (403): Permission denied, or path outside the document root
/// - `NotFound` (404): No such file
/// - `MethodNotAllowed` (405): Anything but GET or HEAD
/// - `InternalServerError` (500): Unexpected filesystem error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Message shown in the HTML error page for this status.
    fn error_message(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad request",
            StatusCode::Forbidden => "Access forbidden",
            StatusCode::NotFound => "File not found",
            StatusCode::MethodNotAllowed => "Method not allowed",
            StatusCode::InternalServerError => "Internal server error",
        }
    }
}

/// A complete HTTP response ready to be serialized.
///
/// Headers keep insertion order and are written in that order.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::with_server_headers(StatusCode::Ok)
///     .header("Content-Type", "text/html")
///     .body(page)
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl ResponseBuilder {
    /// Creates a builder with no headers at all.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a builder pre-populated with `Server`, `Date` and
    /// `Connection: keep-alive`.
    ///
    /// The connection is still closed after one response; the header is
    /// advertised but not honored.
    pub fn with_server_headers(status: StatusCode) -> Self {
        Self::new(status)
            .header("Server", SERVER_NAME)
            .header("Date", httpdate::fmt_http_date(SystemTime::now()))
            .header("Connection", "keep-alive")
    }

    /// Adds a header, replacing an existing one of the same name
    /// (compared case-insensitively) in place.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response.
    ///
    /// Adds `Content-Length` from the body size unless one was set
    /// explicitly (HEAD responses set it to the size GET would send).
    pub fn build(self) -> Response {
        let mut headers = self.headers;
        if !headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        {
            headers.push(("Content-Length".to_string(), self.body.len().to_string()));
        }

        Response {
            status: self.status,
            headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Error response with the fixed HTML error page as body.
    pub fn error_page(status: StatusCode) -> Self {
        let page = format!(
            "<html><body><center><h3>Error {}: {}</h3></center></body></html>",
            status.as_u16(),
            status.error_message()
        );

        ResponseBuilder::with_server_headers(status)
            .header("Content-Type", "text/html")
            .body(page)
            .build()
    }

    /// Response for malformed and timed-out requests.
    pub fn bad_request() -> Self {
        Self::error_page(StatusCode::BadRequest)
    }

    /// Drops the body but keeps every header, `Content-Length` included.
    pub fn into_head(mut self) -> Self {
        self.body = Bytes::new();
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
