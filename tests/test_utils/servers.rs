//! Minimal line-collecting TCP, TLS and HTTP servers.
//!
//! Each server runs on its own thread and reports what it received over an
//! `mpsc` channel, so tests can wait with a timeout instead of sleeping.

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    thread,
};

use native_tls::{Identity, TlsAcceptor};

use super::{SERVER_CERT, SERVER_KEY};

fn forward_lines(stream: impl Read, tx: &mpsc::Sender<String>) -> bool {
    for line in BufReader::new(stream).lines() {
        let Ok(line) = line else { return true };
        if tx.send(line).is_err() {
            return false;
        }
    }
    true
}

/// Accept plaintext connections one after another and forward every line.
pub fn spawn_line_server(listener: TcpListener) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            if !forward_lines(stream, &tx) {
                break;
            }
        }
    });
    rx
}

/// Like [`spawn_line_server`], but completes a TLS handshake first using
/// the `server` fixture identity.
pub fn spawn_tls_line_server(listener: TcpListener) -> mpsc::Receiver<String> {
    let identity = Identity::from_pkcs8(SERVER_CERT, SERVER_KEY).expect("load identity");
    let acceptor = TlsAcceptor::new(identity).expect("build acceptor");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let Ok(stream) = acceptor.accept(stream) else {
                continue;
            };
            if !forward_lines(stream, &tx) {
                break;
            }
        }
    });
    rx
}

#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

fn read_request(stream: &TcpStream) -> Option<HttpRequest> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_owned();
    let path = parts.next()?.to_owned();
    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().ok()?;
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(HttpRequest {
        method,
        path,
        body: String::from_utf8(body).ok()?,
    })
}

/// Answer one request per entry of `statuses`, in order, then stop.
pub fn spawn_http_server(listener: TcpListener, statuses: Vec<u16>) -> mpsc::Receiver<HttpRequest> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for status in statuses {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            let Some(request) = read_request(&stream) else {
                continue;
            };
            let _ = write!(
                stream,
                "HTTP/1.1 {status} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            );
            if tx.send(request).is_err() {
                break;
            }
        }
    });
    rx
}
