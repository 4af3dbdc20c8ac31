use staticd::http::response::{Response, ResponseBuilder, SERVER_NAME, StatusCode};
use staticd::http::writer::{ResponseWriter, serialize_response};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.reason_phrase(),
        "Method Not Allowed"
    );
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();

    assert_eq!(response.header("Content-Length"), Some("16"));
    assert_eq!(&response.body[..], &body[..]);
}

#[test]
fn test_response_builder_preserves_explicit_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .build();

    assert_eq!(response.header("Content-Length"), Some("999"));
    assert!(response.body.is_empty());
}

#[test]
fn test_response_builder_keeps_header_order() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("B-Second", "2")
        .header("A-First", "1")
        .body("x")
        .build();

    let names: Vec<&str> = response.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["B-Second", "A-First", "Content-Length"]);
}

#[test]
fn test_response_builder_replaces_same_header_in_place() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Other", "1")
        .header("content-type", "text/html")
        .build();

    assert_eq!(response.headers[0], ("Content-Type".to_string(), "text/html".to_string()));
    assert_eq!(response.headers.len(), 3);
}

#[test]
fn test_server_headers_present() {
    let response = ResponseBuilder::with_server_headers(StatusCode::Ok).build();

    assert_eq!(response.header("Server"), Some(SERVER_NAME));
    assert_eq!(response.header("Connection"), Some("keep-alive"));
    let date = response.header("Date").unwrap();
    assert!(date.ends_with(" GMT"), "date {:?}", date);
}

#[test]
fn test_error_page_body_and_type() {
    let response = Response::error_page(StatusCode::NotFound);

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    assert_eq!(
        &response.body[..],
        b"<html><body><center><h3>Error 404: File not found</h3></center></body></html>"
    );
    assert_eq!(
        response.header("Content-Length"),
        Some(response.body.len().to_string().as_str())
    );
}

#[test]
fn test_into_head_keeps_content_length() {
    let full = Response::error_page(StatusCode::Forbidden);
    let length = full.body.len().to_string();
    let head = full.into_head();

    assert!(head.body.is_empty());
    assert_eq!(head.header("Content-Length"), Some(length.as_str()));
}

#[test]
fn test_serialize_is_byte_exact() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .body("hi")
        .build();

    assert_eq!(
        serialize_response(&response),
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nhi".to_vec()
    );
}

#[tokio::test]
async fn test_writer_writes_everything() {
    let response = Response::error_page(StatusCode::MethodNotAllowed);
    let mut writer = ResponseWriter::new(&response);
    let mut out: Vec<u8> = Vec::new();

    writer.write_to_stream(&mut out).await.unwrap();

    assert!(!writer.is_empty());
    assert_eq!(out.len(), writer.len());
    assert!(out.starts_with(b"HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(out.ends_with(&response.body));
}
