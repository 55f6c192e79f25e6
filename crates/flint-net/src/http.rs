//! Minimal HTTP/1.1 request writing and response parsing.

use crate::transport;
use flint_core::EngineError;
use flint_core::EngineResult;
use std::io::Read;
use std::io::Write;
use url::Url;

const USER_AGENT: &str = "Flint/0.1";

/// Parsed HTTP response: status, raw headers, undecoded body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }
}

/// Performs one `GET` over a fresh connection (`Connection: close`).
pub(crate) fn fetch_once(url: &Url) -> EngineResult<HttpResponse> {
    let host = url
        .host_str()
        .ok_or_else(|| EngineError::new("net.url_no_host", format!("`{url}` has no host")))?;
    let port = url.port_or_known_default().unwrap_or(80);

    let mut target = url.path().to_owned();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let host_header = match url.port() {
        Some(explicit) => format!("{host}:{explicit}"),
        None => host.to_owned(),
    };

    let request = format!(
        "GET {target} HTTP/1.1\r\n\
         Host: {host_header}\r\n\
         User-Agent: {USER_AGENT}\r\n\
         Accept: text/html,text/plain;q=0.9,*/*;q=0.8\r\n\
         Accept-Encoding: gzip, deflate, br\r\n\
         Connection: close\r\n\r\n"
    );

    let mut stream = transport::connect(url.scheme(), host, port)?;
    stream.write_all(request.as_bytes()).map_err(|error| {
        EngineError::new("net.write_failed", format!("request to {host} failed: {error}"))
    })?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).map_err(|error| {
        EngineError::new("net.read_failed", format!("response from {host} failed: {error}"))
    })?;

    parse_response(&raw)
}

/// Parses a full HTTP/1.x response held in memory.
pub(crate) fn parse_response(raw: &[u8]) -> EngineResult<HttpResponse> {
    let header_end = find_header_end(raw).ok_or_else(|| {
        EngineError::new("net.response_malformed", "missing end of response headers")
    })?;

    let head = String::from_utf8_lossy(&raw[..header_end]);
    let mut lines = head.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| EngineError::new("net.response_malformed", "empty response head"))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            EngineError::new(
                "net.status_malformed",
                format!("unparseable status line `{status_line}`"),
            )
        })?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_owned(), value.trim().to_owned()));
        }
    }

    let mut body = raw[header_end + 4..].to_vec();
    let chunked = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("transfer-encoding"))
        .is_some_and(|(_, value)| value.to_ascii_lowercase().contains("chunked"));
    if chunked {
        body = dechunk(&body)?;
    }

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Reassembles a `Transfer-Encoding: chunked` body.
fn dechunk(body: &[u8]) -> EngineResult<Vec<u8>> {
    let mut decoded = Vec::new();
    let mut cursor = 0_usize;

    loop {
        let line_end = body[cursor..]
            .windows(2)
            .position(|window| window == b"\r\n")
            .map(|offset| cursor + offset)
            .ok_or_else(|| {
                EngineError::new("net.chunk_malformed", "missing chunk size terminator")
            })?;

        let size_text = String::from_utf8_lossy(&body[cursor..line_end]);
        let size_field = size_text.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_field, 16).map_err(|_| {
            EngineError::new(
                "net.chunk_malformed",
                format!("bad chunk size `{size_field}`"),
            )
        })?;

        cursor = line_end + 2;
        if size == 0 {
            return Ok(decoded);
        }

        let chunk = body.get(cursor..cursor + size).ok_or_else(|| {
            EngineError::new("net.chunk_malformed", "chunk shorter than declared size")
        })?;
        decoded.extend_from_slice(chunk);
        cursor += size;

        if body.get(cursor..cursor + 2) == Some(b"\r\n") {
            cursor += 2;
        }
    }
}
