//! HTTP transport tests against a local one-shot server.
//!
//! The server accepts a single connection, captures the raw request and
//! answers with a canned status and body, so each test sees exactly what the
//! transport put on the wire.

use moviliax_site::logger::{Environment, SiteLogger};
use moviliax_site::newsletter::{
    FormView, HttpTransport, MessageKind, NewsletterForm, SubmitControl, SubmitError,
    SubscribeRequest, Transport, TransportError,
};
use std::io::{Read as _, Write as _};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

// ===========================================================================
// Minimal HTTP server
// ===========================================================================

struct CapturedRequest {
    head: String,
    body: String,
}

struct TestServer {
    port: u16,
    captured: mpsc::Receiver<CapturedRequest>,
}

impl TestServer {
    fn start(status: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                if let Some(request) = serve_request(stream, status, body) {
                    let _ = tx.send(request);
                }
            }
        });

        Self { port, captured: rx }
    }

    fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    fn request(&self) -> CapturedRequest {
        self.captured
            .recv_timeout(Duration::from_secs(5))
            .expect("server saw no request")
    }
}

fn serve_request(
    mut stream: TcpStream,
    status: &str,
    body: &str,
) -> Option<CapturedRequest> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

    // Read until the headers are complete and the declared body has arrived
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&raw);
        if let Some(split) = text.find("\r\n\r\n") {
            let head = &text[..split];
            let length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= split + 4 + length {
                break;
            }
        }
    }

    let text = String::from_utf8_lossy(&raw).into_owned();
    let (head, request_body) = text.split_once("\r\n\r\n").unwrap_or((text.as_str(), ""));
    let captured = CapturedRequest {
        head: head.to_string(),
        body: request_body.to_string(),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    Some(captured)
}

fn transport(server: &TestServer) -> HttpTransport {
    HttpTransport::new(&server.url(), Duration::from_secs(5)).unwrap()
}

#[derive(Default)]
struct QuietView {
    messages: Vec<(String, MessageKind)>,
    cleared: bool,
    controls: Vec<SubmitControl>,
}

impl FormView for QuietView {
    fn show_message(&mut self, text: &str, kind: MessageKind, _dismiss_after: Duration) {
        self.messages.push((text.to_string(), kind));
    }

    fn clear_input(&mut self) {
        self.cleared = true;
    }

    fn set_submit_control(&mut self, control: SubmitControl) {
        self.controls.push(control);
    }
}

// ===========================================================================
// Transport
// ===========================================================================

#[test]
fn posts_json_to_subscribe_endpoint() {
    let server = TestServer::start("200 OK", r#"{"status":"pending"}"#);
    let mut transport = transport(&server);

    let response = transport
        .subscribe(&SubscribeRequest::new("ana@moviliax.com"))
        .unwrap();
    assert_eq!(response["status"], "pending");

    let request = server.request();
    assert!(request.head.starts_with("POST /api/newsletter/subscribe HTTP/1.1"));
    assert!(
        request
            .head
            .to_ascii_lowercase()
            .contains("content-type: application/json")
    );
    let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        sent,
        serde_json::json!({ "email": "ana@moviliax.com", "source": "website" })
    );
}

#[test]
fn non_success_status_is_an_error() {
    let server = TestServer::start("500 Internal Server Error", r#"{"error":"boom"}"#);
    let mut transport = transport(&server);

    let result = transport.subscribe(&SubscribeRequest::new("ana@moviliax.com"));
    assert!(matches!(result, Err(TransportError::Status(500))));
}

#[test]
fn client_errors_are_not_special_cased() {
    let server = TestServer::start("409 Conflict", r#"{"error":"already subscribed"}"#);
    let mut transport = transport(&server);

    let result = transport.subscribe(&SubscribeRequest::new("ana@moviliax.com"));
    assert!(matches!(result, Err(TransportError::Status(409))));
}

#[test]
fn non_json_success_body_is_an_error() {
    let server = TestServer::start("200 OK", "thanks!");
    let mut transport = transport(&server);

    let result = transport.subscribe(&SubscribeRequest::new("ana@moviliax.com"));
    assert!(matches!(result, Err(TransportError::Decode(_))));
}

#[test]
fn unreachable_server_is_an_http_error() {
    // Bind then drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut transport =
        HttpTransport::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).unwrap();

    let result = transport.subscribe(&SubscribeRequest::new("ana@moviliax.com"));
    assert!(matches!(result, Err(TransportError::Http(_))));
}

// ===========================================================================
// Full flow over HTTP
// ===========================================================================

#[test]
fn form_subscribes_over_http() {
    let server = TestServer::start("201 Created", r#"{"ok":true}"#);
    let logger = SiteLogger::new(Environment::production());
    let mut form = NewsletterForm::new(transport(&server), logger);
    let mut view = QuietView::default();

    let subscription = form.submit(" ana@moviliax.com ", "", &mut view).unwrap();

    assert_eq!(subscription.email, "ana@moviliax.com");
    assert_eq!(subscription.response["ok"], true);
    assert_eq!(form.state().submission_count, 1);
    assert!(view.cleared);
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].1, MessageKind::Success);
    assert_eq!(view.controls, vec![SubmitControl::Busy, SubmitControl::Ready]);
    assert!(server.request().body.contains("ana@moviliax.com"));
}

#[test]
fn form_reports_server_failure() {
    let server = TestServer::start("503 Service Unavailable", "{}");
    let logger = SiteLogger::new(Environment::production());
    let mut form = NewsletterForm::new(transport(&server), logger);
    let mut view = QuietView::default();

    let result = form.submit("ana@moviliax.com", "", &mut view);

    assert!(matches!(result, Err(SubmitError::Submission(_))));
    assert_eq!(form.state().submission_count, 0);
    assert!(!view.cleared);
    assert_eq!(view.messages[0].1, MessageKind::Error);
    assert_eq!(view.controls, vec![SubmitControl::Busy, SubmitControl::Ready]);
}
