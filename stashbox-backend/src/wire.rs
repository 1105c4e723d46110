//! HTTP/1.x wire representation of cached responses.
//!
//! A cache record is the request URL on its own line followed by the response
//! exactly as it would travel over the wire:
//!
//! ```text
//! http://example.com/a?x=1
//! HTTP/1.1 200 OK
//! content-type: text/plain
//! content-length: 5
//!
//! hello
//! ```
//!
//! The URL line is percent-decoded for readability and never consulted when
//! reading a record back; lookups rely on the file name alone.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue, TRANSFER_ENCODING};
use http::{Method, Response, StatusCode, Version};
use percent_encoding::percent_decode_str;
use stashbox_core::RequestHead;
use thiserror::Error;

const INITIAL_HEADERS: usize = 64;

/// Failure to read a response back from its wire representation.
#[derive(Debug, Error)]
pub enum WireError {
    /// The record does not contain the leading URL line.
    #[error("record has no url line")]
    MissingUrlLine,

    /// Status line or headers are malformed.
    #[error("malformed response head: {0}")]
    Parse(#[from] httparse::Error),

    /// Input ended before the blank line terminating the headers.
    #[error("response head is incomplete")]
    IncompleteHead,

    /// Status code outside of 100..=999.
    #[error(transparent)]
    Status(#[from] http::status::InvalidStatusCode),

    /// Header name rejected by `http`.
    #[error(transparent)]
    HeaderName(#[from] http::header::InvalidHeaderName),

    /// Header value rejected by `http`.
    #[error(transparent)]
    HeaderValue(#[from] http::header::InvalidHeaderValue),

    /// `content-length` is not a non-negative integer.
    #[error("invalid content-length header")]
    ContentLength,

    /// Fewer body bytes than announced by `content-length`.
    #[error("body truncated: expected {expected} bytes, found {found}")]
    TruncatedBody {
        /// Announced length.
        expected: usize,
        /// Available bytes.
        found: usize,
    },

    /// Chunked transfer-encoding is malformed or cut short.
    #[error("malformed chunked body")]
    Chunk,
}

/// Serializes a buffered response as an HTTP/1.x message.
///
/// `transfer-encoding` is dropped and `content-length` describes the buffered
/// body, so the dump is self-delimiting.
pub fn encode_response(response: &Response<Bytes>) -> Vec<u8> {
    let body = response.body();
    let status = response.status();
    let mut out = Vec::with_capacity(body.len() + 256);

    let version = match response.version() {
        Version::HTTP_09 | Version::HTTP_10 => "HTTP/1.0",
        _ => "HTTP/1.1",
    };
    out.extend_from_slice(
        format!(
            "{version} {} {}\r\n",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
        .as_bytes(),
    );

    for (name, value) in response.headers() {
        if name == TRANSFER_ENCODING {
            continue;
        }
        // bodiless responses (HEAD, 304) keep the length the origin announced
        if name == CONTENT_LENGTH && !body.is_empty() {
            continue;
        }
        push_header(&mut out, name.as_str(), value.as_bytes());
    }
    if !body.is_empty() || !response.headers().contains_key(CONTENT_LENGTH) {
        push_header(&mut out, CONTENT_LENGTH.as_str(), body.len().to_string().as_bytes());
    }

    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

fn push_header(out: &mut Vec<u8>, name: &str, value: &[u8]) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value);
    out.extend_from_slice(b"\r\n");
}

/// Parses an HTTP/1.x response sent in reply to a `method` request.
///
/// Body framing follows the request: `HEAD` replies and 1xx/204/304 statuses
/// have no body, chunked bodies are decoded, otherwise `content-length` bytes
/// are taken, or everything that remains when the length is not announced.
pub fn decode_response(input: &[u8], method: &Method) -> Result<Response<Bytes>, WireError> {
    let (head_len, status, version, mut header_map) = parse_head(input)?;

    let rest = &input[head_len..];
    let body = if !has_body(method, status) {
        Bytes::new()
    } else if is_chunked(&header_map) {
        let body = decode_chunked(rest)?;
        header_map.remove(TRANSFER_ENCODING);
        header_map.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        body
    } else if let Some(expected) = content_length(&header_map)? {
        let found = rest.len();
        if found < expected {
            return Err(WireError::TruncatedBody { expected, found });
        }
        Bytes::copy_from_slice(&rest[..expected])
    } else {
        Bytes::copy_from_slice(rest)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.version_mut() = version;
    *response.headers_mut() = header_map;
    Ok(response)
}

/// Parses status line and headers, growing the header buffer until every
/// header fits.
fn parse_head(input: &[u8]) -> Result<(usize, StatusCode, Version, HeaderMap), WireError> {
    let mut capacity = INITIAL_HEADERS;
    loop {
        let mut headers = vec![httparse::EMPTY_HEADER; capacity];
        let mut parsed = httparse::Response::new(&mut headers);
        let head_len = match parsed.parse(input) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => return Err(WireError::IncompleteHead),
            // every header takes at least three bytes, so this terminates
            Err(httparse::Error::TooManyHeaders) if capacity < input.len() => {
                capacity *= 2;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let status = StatusCode::from_u16(parsed.code.ok_or(WireError::IncompleteHead)?)?;
        let version = match parsed.version {
            Some(0) => Version::HTTP_10,
            _ => Version::HTTP_11,
        };
        let mut header_map = HeaderMap::with_capacity(parsed.headers.len());
        for header in parsed.headers.iter() {
            header_map.append(
                HeaderName::from_bytes(header.name.as_bytes())?,
                HeaderValue::from_bytes(header.value)?,
            );
        }
        return Ok((head_len, status, version, header_map));
    }
}

fn has_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && !status.is_informational()
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(TRANSFER_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

fn content_length(headers: &HeaderMap) -> Result<Option<usize>, WireError> {
    headers
        .get(CONTENT_LENGTH)
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|value| value.trim().parse().ok())
                .ok_or(WireError::ContentLength)
        })
        .transpose()
}

fn decode_chunked(mut rest: &[u8]) -> Result<Bytes, WireError> {
    let mut body = Vec::new();
    loop {
        let (consumed, size) = match httparse::parse_chunk_size(rest) {
            Ok(httparse::Status::Complete(chunk)) => chunk,
            _ => return Err(WireError::Chunk),
        };
        rest = &rest[consumed..];
        if size == 0 {
            // trailers are not kept
            return Ok(Bytes::from(body));
        }
        let size = usize::try_from(size).map_err(|_| WireError::Chunk)?;
        if rest.len() < size {
            return Err(WireError::TruncatedBody {
                expected: size,
                found: rest.len(),
            });
        }
        body.extend_from_slice(&rest[..size]);
        rest = rest[size..].strip_prefix(b"\r\n").ok_or(WireError::Chunk)?;
    }
}

/// The readable URL line of a record.
///
/// Percent-escapes are decoded when the result is valid UTF-8 and stays on a
/// single line; otherwise the raw URL is used.
pub fn record_url(head: &RequestHead) -> String {
    let raw = head.uri().to_string();
    let decoded = match percent_decode_str(&raw).decode_utf8() {
        Ok(Cow::Owned(decoded)) if !decoded.contains(['\n', '\r']) => Some(decoded),
        _ => None,
    };
    decoded.unwrap_or(raw)
}

/// Builds a full cache record: URL line followed by the response dump.
pub fn encode_record(head: &RequestHead, response: &Response<Bytes>) -> Vec<u8> {
    let mut record = record_url(head).into_bytes();
    record.push(b'\n');
    record.extend_from_slice(&encode_response(response));
    record
}

/// Reads a cache record, skipping its URL line.
pub fn decode_record(input: &[u8], method: &Method) -> Result<Response<Bytes>, WireError> {
    let newline = input
        .iter()
        .position(|byte| *byte == b'\n')
        .ok_or(WireError::MissingUrlLine)?;
    decode_response(&input[newline + 1..], method)
}
