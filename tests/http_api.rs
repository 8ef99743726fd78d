//! HttpIndexApi against a one-shot TCP stub that replays canned responses.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use iasi_dash::api::{AoiUpload, Health, HttpIndexApi, IndexApi};
use iasi_dash::error::DashboardError;
use iasi_dash::model::EventDocument;

struct Stub {
    base: String,
    handle: JoinHandle<Vec<String>>,
}

impl Stub {
    /// Serves `responses` in order, one connection each, then returns the raw requests.
    fn serve(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (code, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&mut stream));
                let head = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    code,
                    reason(code),
                    body.len()
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(body.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            seen
        });
        Self { base, handle }
    }

    fn requests(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Internal Server Error",
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    stream.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut expected: Option<usize> = None;
    loop {
        if let Some(total) = expected {
            if buf.len() >= total {
                break;
            }
        }
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => break,
            Err(e) => panic!("stub read failed: {}", e),
        }
        if expected.is_none() {
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok());
                expected = length.map(|l| end + 4 + l);
                if expected.is_none() && head.starts_with("get") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn api(base: &str, token: Option<&str>) -> HttpIndexApi {
    HttpIndexApi::with_client(Client::new(), base, token.map(str::to_string)).unwrap()
}

fn closed_port_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_get_iasi_returns_data_with_bearer() {
    let body = json!({
        "ok": true,
        "data": {"meta": {"name": "maule 2010"}, "timeline": [{"date": "2010-02-27", "IASi": 0.8}], "metrics": {}}
    });
    let stub = Stub::serve(vec![(200, body.to_string())]);

    let data = api(&stub.base, Some("s3cret")).get_iasi("maule 2010").await.unwrap();
    let doc: EventDocument = serde_json::from_value(data).unwrap();
    assert_eq!(doc.meta.name, "maule 2010");
    assert_eq!(doc.latest().unwrap().score(), 0.8);

    let requests = stub.requests();
    assert!(requests[0].starts_with("GET /get_iasi/maule%202010 HTTP/1.1"));
    assert!(requests[0].to_lowercase().contains("authorization: bearer s3cret"));
}

#[tokio::test]
async fn test_missing_token_sends_no_auth_header() {
    let stub = Stub::serve(vec![(200, json!({"ok": true, "indices": ["a", "b"]}).to_string())]);

    let names = api(&stub.base, None).list_indices().await.unwrap();

    assert_eq!(names, vec!["a", "b"]);
    let requests = stub.requests();
    assert!(requests[0].starts_with("GET /list_indices "));
    assert!(!requests[0].to_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let stub = Stub::serve(vec![
        (404, json!({"ok": false, "error": "Not found"}).to_string()),
        (401, json!({"ok": false}).to_string()),
    ]);
    let client = api(&stub.base, Some("wrong"));

    match client.get_iasi("nowhere").await {
        Err(DashboardError::Api(msg)) => assert_eq!(msg, "Not found"),
        other => panic!("unexpected {:?}", other),
    }
    match client.list_indices().await {
        Err(DashboardError::Api(msg)) => assert_eq!(msg, "Unauthorized"),
        other => panic!("unexpected {:?}", other),
    }
    stub.requests();
}

#[tokio::test]
async fn test_non_json_failure_is_network_error() {
    let stub = Stub::serve(vec![(500, "<html>boom</html>".to_string())]);

    let err = api(&stub.base, None).get_iasi("maule").await.unwrap_err();

    assert!(matches!(err, DashboardError::Network(_)));
    assert!(err.to_string().contains("HTTP 500"));
    stub.requests();
}

#[tokio::test]
async fn test_ok_without_data_is_schema_error() {
    let stub = Stub::serve(vec![(200, json!({"ok": true}).to_string())]);

    let err = api(&stub.base, None).get_iasi("maule").await.unwrap_err();

    assert_eq!(err.kind(), "schema");
    stub.requests();
}

#[tokio::test]
async fn test_upload_iasi_posts_document() {
    let stub = Stub::serve(vec![(
        200,
        json!({"ok": true, "name": "maule", "path": "outputs/indices/maule/iasi.json"}).to_string(),
    )]);
    let doc: EventDocument = serde_json::from_value(json!({
        "meta": {"name": "maule", "lat": -35.9},
        "timeline": [{"date": "2010-02-27", "A": 0.5, "IASi": 0.7}],
        "metrics": {"7": {"f1": 0.5}}
    }))
    .unwrap();

    let receipt = api(&stub.base, Some("tok")).upload_iasi(&doc).await.unwrap();

    assert_eq!(receipt.name.as_deref(), Some("maule"));
    assert_eq!(receipt.path.as_deref(), Some("outputs/indices/maule/iasi.json"));
    let request = &stub.requests()[0];
    assert!(request.starts_with("POST /upload_iasi "));
    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let sent: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(sent["meta"]["name"], "maule");
    assert_eq!(sent["timeline"][0]["IASi"], 0.7);
}

#[tokio::test]
async fn test_upload_aoi_is_multipart() {
    let stub = Stub::serve(vec![(200, json!({"ok": true, "path": "config/aoi_maule.geojson"}).to_string())]);
    let upload = AoiUpload {
        file_name: "zone.geojson".to_string(),
        bytes: br#"{"type":"Point","coordinates":[1,2]}"#.to_vec(),
    };

    let receipt = api(&stub.base, None).upload_aoi(upload, "maule").await.unwrap();

    assert_eq!(receipt.path.as_deref(), Some("config/aoi_maule.geojson"));
    let request = &stub.requests()[0];
    assert!(request.starts_with("POST /upload_aoi "));
    assert!(request.to_lowercase().contains("multipart/form-data"));
    assert!(request.contains("name=\"aoi\"; filename=\"zone.geojson\""));
    assert!(request.contains("name=\"name\""));
    assert!(request.contains(r#"{"type":"Point","coordinates":[1,2]}"#));
}

#[tokio::test]
async fn test_status_tolerates_missing_counters() {
    let stub = Stub::serve(vec![(200, json!({"ok": true, "status": {"processed": 7, "queued": 2}}).to_string())]);

    let st = api(&stub.base, None).status().await.unwrap();

    assert_eq!((st.processed, st.invalid, st.queued), (7, 0, 2));
    stub.requests();
}

#[tokio::test]
async fn test_health_states() {
    let stub = Stub::serve(vec![(200, "{}".to_string()), (500, "{}".to_string())]);
    let client = api(&stub.base, Some("tok"));

    assert_eq!(client.health().await, Health::Reachable);
    assert_eq!(client.health().await, Health::Degraded);
    let requests = stub.requests();
    assert!(requests[0].starts_with("GET /health "));
    assert!(!requests[0].to_lowercase().contains("authorization:"));

    let offline = api(&closed_port_base(), None);
    assert_eq!(offline.health().await, Health::Unreachable);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = api(&closed_port_base(), None);

    let err = client.list_indices().await.unwrap_err();

    assert_eq!(err.kind(), "network");
}
