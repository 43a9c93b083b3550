use disclosure_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::new("Mozilla/5.0")
        .expect("client")
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn sends_user_agent_and_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/candidate.php"))
        .and(query_param("candidate_id", "5676"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html><body><h2 class=\"main-title\">X</h2></body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/candidate.php?candidate_id=5676", server.uri());
    let body = client()
        .get_bytes(&url, RequestOpts::default())
        .await
        .expect("fetch");

    assert!(body.status.is_success());
    assert_eq!(
        body.content_type.as_deref(),
        Some("text/html; charset=utf-8")
    );
    assert!(String::from_utf8_lossy(&body.bytes).contains("main-title"));
}

#[tokio::test]
async fn retries_transient_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let body = client()
        .with_retries(1)
        .get_bytes(&format!("{}/flaky", server.uri()), RequestOpts::default())
        .await
        .expect("second attempt succeeds");

    assert_eq!(&body.bytes[..], b"ok");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such page"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client()
        .with_retries(3)
        .get_bytes(&format!("{}/gone", server.uri()), RequestOpts::default())
        .await
        .unwrap_err();

    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 404);
            assert!(message.contains("no such page"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
        .mount(&server)
        .await;

    let err = client()
        .with_max_body_bytes(1024)
        .get_bytes(&format!("{}/big", server.uri()), RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::TooLarge { limit: 1024, .. }));
}

/// Serves a chunked body with no `Content-Length` that never ends.
async fn endless_chunked_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else { return };
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        if socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ntransfer-encoding: chunked\r\n\r\n")
            .await
            .is_err()
        {
            return;
        }
        let chunk = format!("400\r\n{}\r\n", "x".repeat(0x400));
        // Stops once the client hangs up.
        while socket.write_all(chunk.as_bytes()).await.is_ok() {}
    });
    format!("http://{addr}/stream")
}

#[tokio::test]
async fn undeclared_length_bodies_stop_at_the_cap() {
    let url = endless_chunked_server().await;

    let err = tokio::time::timeout(
        Duration::from_secs(10),
        client().with_retries(0).with_max_body_bytes(8 * 1024).get_bytes(&url, RequestOpts::default()),
    )
    .await
    .expect("reading stops at the cap instead of draining the stream")
    .unwrap_err();

    match err {
        HttpError::TooLarge { limit, actual } => {
            assert_eq!(limit, 8 * 1024);
            assert!(actual > limit, "actual={actual}");
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Port 9 (discard) on localhost is assumed closed in test environments.
    let err = client()
        .with_retries(0)
        .get_bytes("http://127.0.0.1:9/candidate.php", RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Network(_)));
}

#[tokio::test]
async fn relative_urls_are_rejected() {
    let err = client()
        .get_bytes("candidate.php?candidate_id=1", RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Url(_)));
}
