//! Content type inference from a request path suffix.

/// Suffix table, checked in order. The first match wins.
const CONTENT_TYPES: &[(&str, &str)] = &[
    (".css", "text/css"),
    (".gif", "image/gif"),
    (".eot", "application/vnd.ms-fontobject"),
    (".html", "text/html"),
    (".ico", "image/vnd.microsoft.icon"),
    (".jpg", "image/jpg"),
    (".js", "application/javascript"),
    (".otf", "font/opentype"),
    (".png", "image/png"),
    (".svg", "image/svg+xml"),
    // No registered type for TrueType
    (".ttf", "application/octet-stream"),
    (".woff", "application/font-woff"),
    (".xml", "text/xml"),
];

/// Returns the content type for `path`, ignoring any query string.
///
/// # Example
///
/// ```
/// # use outflow::http::mime::content_type_for;
/// assert_eq!(content_type_for("/app.js?v=2"), Some("application/javascript"));
/// assert_eq!(content_type_for("/data.json"), None);
/// ```
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);

    CONTENT_TYPES
        .iter()
        .find(|(suffix, _)| path.ends_with(suffix))
        .map(|(_, content_type)| *content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_suffixes() {
        assert_eq!(content_type_for("/index.html"), Some("text/html"));
        assert_eq!(content_type_for("/style.css"), Some("text/css"));
        assert_eq!(content_type_for("/logo.svg"), Some("image/svg+xml"));
        assert_eq!(content_type_for("/fonts/a.ttf"), Some("application/octet-stream"));
    }

    #[test]
    fn unknown_suffix_has_no_type() {
        assert_eq!(content_type_for("/archive.tar.gz"), None);
        assert_eq!(content_type_for("/noext"), None);
        assert_eq!(content_type_for("/"), None);
    }

    #[test]
    fn suffix_must_be_at_the_end() {
        assert_eq!(content_type_for("/app.js.map"), None);
        assert_eq!(content_type_for("/page.html.bak"), None);
    }
}
