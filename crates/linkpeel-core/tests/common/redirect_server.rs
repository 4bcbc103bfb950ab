//! Minimal HTTP/1.1 server that imitates a link shortener for integration tests.
//!
//! Routes:
//! - `/go`      302 to `/landing`
//! - `/landing` 200 plain page
//! - `/meta`    200 page with a meta refresh to `/landing?via=meta`
//! - `/script`  200 page with a `window.location` redirect to `/landing?via=script`
//! - `/plain`   200 page with no redirect at all
//! - `/slow`    sleeps before answering
//! - anything else 404

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// How long `/slow` stalls before responding.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

const META_PAGE: &str = r#"<html><head>
<meta charset="utf-8">
<meta content="0; URL='/landing?via=meta'" http-equiv="Refresh">
</head><body>Redirecting...</body></html>"#;

const SCRIPT_PAGE: &str = r#"<html><body>
<script>window.location.replace("/landing?via=script");</script>
</body></html>"#;

const PLAIN_PAGE: &str = "<html><body>Click to continue</body></html>";

/// Starts the server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || handle(stream));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (method, path) = parse_request_line(request);
    let is_head = method.eq_ignore_ascii_case("HEAD");

    let route = path.split('?').next().unwrap_or("/");
    let (status, location, body) = match route {
        "/go" => ("302 Found", Some("/landing"), ""),
        "/landing" => ("200 OK", None, "landed"),
        "/meta" => ("200 OK", None, META_PAGE),
        "/script" => ("200 OK", None, SCRIPT_PAGE),
        "/plain" => ("200 OK", None, PLAIN_PAGE),
        "/slow" => {
            thread::sleep(SLOW_DELAY);
            ("200 OK", None, PLAIN_PAGE)
        }
        _ => ("404 Not Found", None, "not found"),
    };

    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    if let Some(location) = location {
        response.push_str(&format!("Location: {}\r\n", location));
    }
    response.push_str("\r\n");
    if !is_head {
        response.push_str(body);
    }
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn parse_request_line(request: &str) -> (&str, &str) {
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("GET");
    let path = parts.next().unwrap_or("/");
    (method, path)
}
