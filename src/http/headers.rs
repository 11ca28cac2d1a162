//! Response header construction.
//!
//! Headers are always rendered as one block that goes out ahead of the body.
//! `Content-Length` and `Connection` are owned by this module: callers
//! declare a length (or `None` when the body is delimited by the connection
//! closing) and every response carries `Connection: close`.

use bytes::Bytes;
use tracing::error;

use crate::http::mime;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Ordered list of caller supplied headers.
///
/// A header with a `None` value is not sent. Naming `Content-Type` that way
/// still turns off content type inference.
///
/// # Example
///
/// ```
/// # use outflow::http::headers::Headers;
/// let headers = Headers::new()
///     .header("Cache-Control", "no-cache")
///     .optional("X-Frame-Options", None::<String>);
/// assert_eq!(headers.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, Option<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), Some(value.into())));
        self
    }

    /// Appends a header that is only sent when `value` is present.
    pub fn optional(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.entries.push((name.into(), value.map(Into::into)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}

/// Renders a complete header block.
///
/// `path` is the request path the response belongs to. When present and no
/// `Content-Type` was supplied, the content type is inferred from its suffix.
pub fn build_headers(
    status: u16,
    reason: &str,
    length: Option<u64>,
    headers: &Headers,
    path: Option<&str>,
) -> Bytes {
    let mut buf = String::with_capacity(256);

    // Status line
    buf.push_str(&format!("{} {} {}\r\n", HTTP_VERSION, status, sanitize_reason(reason)));

    let mut seen_content_type = false;
    for (name, value) in headers.iter() {
        seen_content_type |= append_header(&mut buf, name, value);
    }

    if !seen_content_type {
        if let Some(content_type) = path.and_then(mime::content_type_for) {
            buf.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
    }

    if let Some(length) = length {
        buf.push_str(&format!("Content-Length: {}\r\n", length));
    }
    buf.push_str("Connection: close\r\n");

    // Header/body separator
    buf.push_str("\r\n");

    Bytes::from(buf)
}

/// Appends one caller header. Returns true when it names `Content-Type`.
fn append_header(buf: &mut String, name: &str, value: Option<&str>) -> bool {
    if name.eq_ignore_ascii_case("Content-Length") || name.eq_ignore_ascii_case("Connection") {
        error!(header = name, "Don't set {} manually. This is a programmer error.", name);
        return false;
    }

    if has_line_break(name) || value.is_some_and(has_line_break) {
        error!(
            header = %name.escape_debug(),
            "Header contains a line break. This is a programmer error."
        );
        return false;
    }

    if let Some(value) = value {
        buf.push_str(name);
        buf.push_str(": ");
        buf.push_str(value);
        buf.push_str("\r\n");
    }

    name.eq_ignore_ascii_case("Content-Type")
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

fn sanitize_reason(reason: &str) -> String {
    reason.replace(['\r', '\n'], " ")
}
