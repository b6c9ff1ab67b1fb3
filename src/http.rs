//! Minimal HTTP/1.0 client framing for the provider exchange.
//!
//! Requests go out as HTTP/1.0 with `Connection: close`, so the provider
//! answers with a plain body terminated by EOF (or `Content-Length`) and no
//! chunked encoding has to be understood.

use core::{cmp::min, fmt::Write as _};

use embedded_io_async::{Read, Write};
use heapless::String;

use crate::error::TransportFault;
use crate::transport::{HttpRequest, ResponseBuffer};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const HTTP_HEADER_MAX: usize = 1024;
const HTTP_REQUEST_HEAD_MAX: usize = 512;
const HTTP_READ_CHUNK: usize = 256;

pub type RequestHead = String<HTTP_REQUEST_HEAD_MAX>;

pub fn request_head(request: &HttpRequest<'_>) -> Result<RequestHead, TransportFault> {
    let mut head = RequestHead::new();
    write!(
        head,
        "POST {} HTTP/1.0\r\nHost: {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        request.endpoint.path_and_query,
        request.endpoint.host,
        request.content_type,
        request.body.len()
    )
    .map_err(|_| TransportFault::Malformed)?;
    Ok(head)
}

pub async fn write_request<W: Write>(
    writer: &mut W,
    request: &HttpRequest<'_>,
) -> Result<(), TransportFault> {
    let head = request_head(request)?;
    writer
        .write_all(head.as_bytes())
        .await
        .map_err(|_| TransportFault::Io)?;
    writer
        .write_all(request.body)
        .await
        .map_err(|_| TransportFault::Io)?;
    writer.flush().await.map_err(|_| TransportFault::Io)
}

/// Reads the status line and headers, then streams the body into `sink`
/// until EOF or `Content-Length` bytes. Bytes beyond the sink's capacity are
/// still consumed from the reader and dropped.
pub async fn read_response<R: Read>(
    reader: &mut R,
    sink: &mut ResponseBuffer,
) -> Result<u16, TransportFault> {
    let mut head_buf = [0u8; HTTP_HEADER_MAX];
    let mut filled = 0usize;
    let header_end = loop {
        if filled == head_buf.len() {
            return Err(TransportFault::Malformed);
        }
        let n = reader
            .read(&mut head_buf[filled..])
            .await
            .map_err(|_| TransportFault::Io)?;
        if n == 0 {
            return Err(TransportFault::Malformed);
        }
        filled += n;

        if let Some(end) = find_header_end(&head_buf[..filled]) {
            break end;
        }
    };

    let head = core::str::from_utf8(&head_buf[..header_end]).map_err(|_| TransportFault::Malformed)?;
    let status = parse_status_code(head)?;
    let content_length = parse_content_length(head)?;
    let expected = content_length.unwrap_or(usize::MAX);

    let body_start = header_end + 4;
    let initial = min(filled - body_start, expected);
    sink.append(&head_buf[body_start..body_start + initial]);
    let mut received = initial;

    let mut chunk = [0u8; HTTP_READ_CHUNK];
    while received < expected {
        let want = min(chunk.len(), expected - received);
        let n = reader
            .read(&mut chunk[..want])
            .await
            .map_err(|_| TransportFault::Io)?;
        if n == 0 {
            if content_length.is_some() {
                return Err(TransportFault::Io);
            }
            break;
        }
        sink.append(&chunk[..n]);
        received += n;
    }

    Ok(status)
}

pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

pub fn parse_status_code(head: &str) -> Result<u16, TransportFault> {
    let status_line = head.lines().next().ok_or(TransportFault::Malformed)?;
    let mut parts = status_line.split_ascii_whitespace();
    let version = parts.next().ok_or(TransportFault::Malformed)?;
    if !version.starts_with("HTTP/") {
        return Err(TransportFault::Malformed);
    }
    let code = parts.next().ok_or(TransportFault::Malformed)?;
    if code.len() != 3 {
        return Err(TransportFault::Malformed);
    }
    code.parse::<u16>().map_err(|_| TransportFault::Malformed)
}

pub fn parse_content_length(head: &str) -> Result<Option<usize>, TransportFault> {
    let mut content_length = None;

    for line in head.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if !name.eq_ignore_ascii_case("content-length") {
            continue;
        }

        let parsed = value
            .trim()
            .parse::<usize>()
            .map_err(|_| TransportFault::Malformed)?;

        if content_length.is_some() {
            return Err(TransportFault::Malformed);
        }

        content_length = Some(parsed);
    }

    Ok(content_length)
}
