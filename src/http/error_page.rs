//! Minimal HTML error pages.

use std::io;

use bytes::Bytes;
use tracing::debug;

use crate::error::Error;
use crate::http::headers::Headers;
use crate::http::response::Response;
use crate::http::status::{self, StatusCode};

/// Maps an error from a lower layer to the status code it is reported with.
pub fn status_for_error(err: &Error) -> u16 {
    let status = match err {
        Error::AuthenticationFailed => StatusCode::NotAuthorized,
        Error::InvalidData(_) => StatusCode::BadRequest,
        Error::NoSpace(_) => StatusCode::RequestEntityTooLarge,
        Error::Io(err) => match err.kind() {
            io::ErrorKind::InvalidData => StatusCode::BadRequest,
            io::ErrorKind::StorageFull => StatusCode::RequestEntityTooLarge,
            _ => StatusCode::InternalServerError,
        },
        Error::Internal(_) => StatusCode::InternalServerError,
    };
    status.as_u16()
}

/// Renders the page body for `code`.
pub fn error_body(code: u16, message: &str) -> String {
    let message = escape_html(message);
    format!(
        "<html><head><title>{} {}</title></head><body>{}</body></html>",
        code, message, message
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Response {
    /// Sends an error page and completes the response.
    ///
    /// Without a `message` the standard phrase for `code` is used. If the
    /// response already failed or was completed elsewhere, nothing more is
    /// queued.
    pub fn send_error(&self, code: u16, headers: &Headers, message: Option<&str>) {
        let message = match message {
            Some(message) => message.to_string(),
            None => status::default_message(code).into_owned(),
        };

        debug!(response = %self.name(), code, message = %message, "returning error");

        // The page is HTML whatever the request path suggests
        let mut headers = headers.clone();
        if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("Content-Type")) {
            headers = headers.header("Content-Type", "text/html");
        }

        let body = Bytes::from(error_body(code, &message));
        self.send_headers(code, &message, Some(body.len() as u64), &headers);
        if self.enqueue(body) {
            self.complete();
        }
    }

    /// Sends an error page for an error reported by a lower layer.
    pub fn send_error_from(&self, headers: &Headers, err: &Error) {
        let message = err.to_string();
        self.send_error(status_for_error(err), headers, Some(&message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_embeds_code_and_message() {
        assert_eq!(
            error_body(404, "Not Found"),
            "<html><head><title>404 Not Found</title></head><body>Not Found</body></html>"
        );
    }

    #[test]
    fn body_escapes_markup() {
        let body = error_body(400, "bad <script>");
        assert!(body.contains("bad &lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }
}
