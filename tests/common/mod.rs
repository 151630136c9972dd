//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Parsed head of an inbound HTTP/1.1 request.
#[allow(dead_code)]
pub struct RequestHead {
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Read and parse the request head (request line + headers).
async fn read_head(socket: &mut TcpStream) -> Option<RequestHead> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];

    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut tmp).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(_) => return None,
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let target = request_line.split_whitespace().nth(1)?;
    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target.to_string(), String::new()),
    };

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    Some(RequestHead { path, query, headers })
}

async fn write_response(socket: &mut TcpStream, status_line: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start an upstream that echoes the received path, query and headers back
/// as JSON.
#[allow(dead_code)]
pub async fn start_echo_upstream(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let Some(head) = read_head(&mut socket).await else {
                            return;
                        };
                        let mut headers = serde_json::Map::new();
                        for (name, value) in &head.headers {
                            headers.insert(name.clone(), serde_json::Value::String(value.clone()));
                        }
                        let body = serde_json::json!({
                            "path": head.path,
                            "query": head.query,
                            "headers": headers,
                        })
                        .to_string();
                        write_response(&mut socket, "200 OK", &body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a mock session service.
///
/// Requests carrying a `Cookie` or `Authorization` header get a 200 with the
/// given whitelist; anonymous requests get a 403.
#[allow(dead_code)]
pub async fn start_session_service(addr: SocketAddr, whitelisted: &'static [&'static str]) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let Some(head) = read_head(&mut socket).await else {
                            return;
                        };
                        let authenticated =
                            head.header("cookie").is_some() || head.header("authorization").is_some();
                        if authenticated {
                            let body = serde_json::json!({ "whitelisted": whitelisted }).to_string();
                            write_response(&mut socket, "200 OK", &body).await;
                        } else {
                            write_response(&mut socket, "403 Forbidden", "{}").await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a session service that fails every lookup.
#[allow(dead_code)]
pub async fn start_failing_session_service(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_head(&mut socket).await;
                        write_response(&mut socket, "500 Internal Server Error", "{}").await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}
