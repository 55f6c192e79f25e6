//! Content-Encoding and charset decoding of response bodies.

use crate::http::HttpResponse;
use flint_core::EngineError;
use flint_core::EngineResult;
use std::io::Read;

/// Decompresses (if needed) and character-decodes a response body.
pub(crate) fn decode_body(response: &HttpResponse) -> EngineResult<String> {
    let encoding = response
        .header("content-encoding")
        .map(str::to_ascii_lowercase);

    let bytes = match encoding.as_deref() {
        None | Some("identity") | Some("") => response.body.clone(),
        Some("gzip") => gunzip(&response.body)?,
        Some("deflate") => inflate(&response.body)?,
        Some("br") => unbrotli(&response.body)?,
        Some(other) => {
            return Err(EngineError::new(
                "net.encoding_unsupported",
                format!("cannot decode content-encoding `{other}`"),
            ));
        }
    };

    let charset = response
        .header("content-type")
        .and_then(charset_from_content_type);
    let encoding = charset
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);

    let (text, _, _) = encoding.decode(&bytes);
    Ok(text.into_owned())
}

/// Extracts the charset parameter from a `Content-Type` header value.
pub(crate) fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|parameter| {
        let (name, value) = parameter.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Some(value.trim().trim_matches('"').to_owned())
    })
}

fn gunzip(bytes: &[u8]) -> EngineResult<Vec<u8>> {
    let mut decoded = Vec::new();
    flate2::read::GzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .map_err(|error| {
            EngineError::new("net.decode_failed", format!("gzip body unreadable: {error}"))
        })?;
    Ok(decoded)
}

fn inflate(bytes: &[u8]) -> EngineResult<Vec<u8>> {
    let mut decoded = Vec::new();
    flate2::read::ZlibDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .map_err(|error| {
            EngineError::new(
                "net.decode_failed",
                format!("deflate body unreadable: {error}"),
            )
        })?;
    Ok(decoded)
}

fn unbrotli(bytes: &[u8]) -> EngineResult<Vec<u8>> {
    let mut decoded = Vec::new();
    brotli::Decompressor::new(bytes, 4096)
        .read_to_end(&mut decoded)
        .map_err(|error| {
            EngineError::new("net.decode_failed", format!("br body unreadable: {error}"))
        })?;
    Ok(decoded)
}
