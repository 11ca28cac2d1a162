use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::http::headers::Headers;
use crate::http::response::{Response, Transport};
use crate::http::status::StatusCode;

/// Largest request head read before answering 400.
const MAX_HEAD: usize = 8 * 1024;

/// Settings shared by every connection.
#[derive(Debug, Clone)]
pub struct Site {
    pub roots: Arc<Vec<PathBuf>>,
    pub cache_forever: bool,
}

/// What the request line asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Target {
    Get(String),
    Unsupported(String),
    Malformed,
}

/// One client connection. Answers exactly one request, then closes.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    site: Site,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, site: Site) -> Self {
        Self { stream, peer, site }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let (mut reader, writer) = self.stream.into_split();

        let target = read_request_target(&mut reader).await?;
        debug!(peer = %self.peer, target = ?target, "request");

        match target {
            Target::Get(path) => {
                let response = Response::open(Transport::pollable(writer), Some(&path));
                response
                    .serve_file(None, self.site.cache_forever, &self.site.roots)
                    .await;
                response.finished().await;
            }
            Target::Unsupported(path) => {
                let response = Response::open(Transport::pollable(writer), Some(&path));
                let headers = Headers::new().header("Allow", "GET");
                response.send_error(StatusCode::MethodNotAllowed.as_u16(), &headers, None);
                response.finished().await;
            }
            Target::Malformed => {
                let response = Response::open(Transport::pollable(writer), None);
                response.send_error(StatusCode::BadRequest.as_u16(), &Headers::new(), None);
                response.finished().await;
            }
        }

        Ok(())
    }
}

/// Reads the request head and pulls method and target from its first line.
///
/// Gives [`Target::Malformed`] when the client closes early, sends garbage,
/// or sends a head larger than [`MAX_HEAD`].
pub async fn read_request_target<R>(reader: &mut R) -> anyhow::Result<Target>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(1024);

    loop {
        if find_headers_end(&buffer).is_some() {
            return Ok(parse_request_line(&buffer));
        }

        if buffer.len() >= MAX_HEAD {
            return Ok(Target::Malformed);
        }

        let mut temp = [0u8; 1024];
        let n = reader.read(&mut temp).await?;

        if n == 0 {
            // Client closed connection
            return Ok(Target::Malformed);
        }

        buffer.extend_from_slice(&temp[..n]);
    }
}

fn parse_request_line(head: &[u8]) -> Target {
    let line_end = head
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(head.len());

    let Ok(line) = std::str::from_utf8(&head[..line_end]) else {
        return Target::Malformed;
    };

    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Target::Malformed;
    };

    if !version.starts_with("HTTP/") || !target.starts_with('/') {
        return Target::Malformed;
    }

    match method {
        "GET" => Target::Get(target.to_string()),
        _ => Target::Unsupported(target.to_string()),
    }
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_get() {
        assert_eq!(
            parse_request_line(b"GET /app.js?v=1 HTTP/1.1\r\nHost: x\r\n\r\n"),
            Target::Get("/app.js?v=1".to_string())
        );
    }

    #[test]
    fn other_methods_are_unsupported() {
        assert_eq!(
            parse_request_line(b"POST /login HTTP/1.1\r\n\r\n"),
            Target::Unsupported("/login".to_string())
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(parse_request_line(b"hello\r\n\r\n"), Target::Malformed);
        assert_eq!(parse_request_line(b"GET index.html HTTP/1.1\r\n\r\n"), Target::Malformed);
    }

    #[tokio::test]
    async fn reads_head_across_chunks() {
        let (mut client, mut server) = tokio::io::duplex(16);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            client.write_all(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").await.unwrap();
        });

        let target = read_request_target(&mut server).await.unwrap();
        assert_eq!(target, Target::Get("/index.html".to_string()));
    }

    #[tokio::test]
    async fn early_close_is_malformed() {
        let (client, mut server) = tokio::io::duplex(16);
        drop(client);
        assert_eq!(read_request_target(&mut server).await.unwrap(), Target::Malformed);
    }
}
