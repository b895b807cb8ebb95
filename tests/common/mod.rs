//! Fixtures shared by the integration test binaries.

#![allow(dead_code)]

use docrev::docx::OutputDocument;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const OK_STATUS: &str = "200 OK";

/// Body of a successful chat-completions response carrying `content`.
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// Serve exactly one HTTP request on a local port.
///
/// Returns the endpoint URL and a handle yielding the raw request text.
/// The response is written after `delay`.
pub fn serve_once(status: &'static str, body: String, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/chat/completions", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return String::new();
        };
        let mut reader = BufReader::new(stream);

        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            let end_of_headers = line == "\r\n";
            request.push_str(&line);
            if end_of_headers {
                break;
            }
        }

        let mut payload = vec![0u8; content_length];
        if reader.read_exact(&mut payload).is_ok() {
            request.push_str(&String::from_utf8_lossy(&payload));
        }

        thread::sleep(delay);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = reader.into_inner();
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
        request
    });

    (url, handle)
}

/// A `.docx` with one plain paragraph per entry.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let mut document = OutputDocument::new();
    for text in paragraphs {
        document.add_text(*text);
    }
    document.into_bytes().unwrap()
}
