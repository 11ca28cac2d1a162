use std::borrow::Cow;

/// HTTP status codes the server produces itself.
///
/// Arbitrary codes can still be sent as plain `u16`; this enum only names
/// the ones that carry a fixed message on error pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 401 Not Authorized
    NotAuthorized,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 413 Request Entity Too Large
    RequestEntityTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use outflow::http::status::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotAuthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::RequestEntityTooLarge => 413,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            400 => Some(StatusCode::BadRequest),
            401 => Some(StatusCode::NotAuthorized),
            403 => Some(StatusCode::Forbidden),
            404 => Some(StatusCode::NotFound),
            405 => Some(StatusCode::MethodNotAllowed),
            413 => Some(StatusCode::RequestEntityTooLarge),
            500 => Some(StatusCode::InternalServerError),
            _ => None,
        }
    }

    /// Returns the phrase used as both reason and page text for this code.
    ///
    /// # Example
    ///
    /// ```
    /// # use outflow::http::status::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad request");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad request",
            StatusCode::NotAuthorized => "Not Authorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestEntityTooLarge => "Request Entity Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Message for an error page when the caller supplied none.
///
/// Known codes use their fixed phrase, everything else falls back to a
/// generic phrase picked by status class.
pub fn default_message(code: u16) -> Cow<'static, str> {
    if let Some(status) = StatusCode::from_u16(code) {
        return Cow::Borrowed(status.reason_phrase());
    }

    let generic = match code {
        0..=99 => "Continue",
        100..=199 => "OK",
        200..=299 => "Moved",
        _ => "Failed",
    };
    Cow::Owned(format!("{} {}", code, generic))
}
