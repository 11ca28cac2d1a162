//! Streaming response writer.
//!
//! A [`Response`] owns an outbound queue of byte blocks for one connection.
//! Queuing only touches memory; the bytes go out later from a driver task
//! that runs whenever the transport reports it can take more data. Once the
//! caller calls [`Response::complete`], the driver flushes and closes the
//! transport and keeps the response alive until that has finished, even if
//! the caller has already dropped its handle.

use std::collections::VecDeque;
use std::fmt;
use std::future::poll_fn;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::AsyncWrite;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::http::headers::{self, Headers};

/// Output side of a connection.
pub enum Transport {
    /// A stream that can be polled for write readiness.
    Pollable(Pin<Box<dyn AsyncWrite + Send>>),
    /// A stream that only supports blocking writes. A response opened on one
    /// never transmits anything.
    Blocking(Box<dyn io::Write + Send>),
}

impl Transport {
    pub fn pollable<W>(output: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        Transport::Pollable(Box::pin(output))
    }

    pub fn blocking<W>(output: W) -> Self
    where
        W: io::Write + Send + 'static,
    {
        Transport::Blocking(Box::new(output))
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Pollable(_) => f.write_str("Transport::Pollable"),
            Transport::Blocking(_) => f.write_str("Transport::Blocking"),
        }
    }
}

/// Where a response is in its lifecycle.
///
/// ```text
///   Idle ──enqueue──▶ Writing ──queue empty──▶ Idle
///                        │
///                        │ queue empty, complete
///                        ▼
///                    Draining ──flushed──▶ Closing ──▶ Done
///
///   write error / flush error ──────────────────────▶ Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing to send and no listener registered.
    Idle,
    /// Waiting for the transport to accept the head of the queue.
    Writing,
    /// Everything is written, waiting for the flush.
    Draining,
    /// Flushed, waiting for the close.
    Closing,
    /// Terminal. The transport has been released.
    Done,
}

struct Inner {
    logname: String,
    io: Option<Transport>,

    // Output queue. `partial_offset` counts bytes of the head block
    // that are already on the wire.
    queue: VecDeque<Bytes>,
    partial_offset: usize,

    count: usize,
    complete: bool,
    failed: bool,
    done: bool,
    state: State,

    /// Driver task. Present while there is unsent data or a pending drain.
    listener: Option<JoinHandle<()>>,
    done_tx: watch::Sender<bool>,
}

/// A response sent back to an HTTP client over a single connection.
///
/// Use the one shot helpers ([`Response::send_content`],
/// [`Response::send_error`], [`Response::serve_file`]) or the low level
/// sequence: [`Response::send_headers`], then [`Response::enqueue`] for each
/// body block, then [`Response::complete`].
///
/// Operations that register a listener spawn onto the current Tokio runtime.
///
/// # Example
///
/// ```ignore
/// let response = Response::open(Transport::pollable(write_half), Some("/hello"));
/// response.send_headers(200, "OK", Some(5), &Headers::new());
/// response.enqueue(Bytes::from_static(b"hello"));
/// response.complete();
/// ```
pub struct Response {
    shared: Arc<Mutex<Inner>>,
    path: Option<String>,
}

fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Response {
    /// Creates a response that sends on `io`.
    ///
    /// `path` is the resource the response is for. It names the response in
    /// logs and drives content type inference for the headers.
    pub fn open(io: Transport, path: Option<&str>) -> Self {
        let logname = path.unwrap_or("response").to_string();

        let failed = match &io {
            Transport::Pollable(_) => false,
            Transport::Blocking(_) => {
                error!(
                    response = %logname,
                    "Cannot send web response over a non-pollable output stream"
                );
                true
            }
        };

        let (done_tx, _) = watch::channel(false);
        let mut inner = Inner {
            logname,
            io: Some(io),
            queue: VecDeque::new(),
            partial_offset: 0,
            count: 0,
            complete: false,
            failed,
            done: false,
            state: State::Idle,
            listener: None,
            done_tx,
        };

        // Nothing can ever be sent, so release the transport right away
        if failed {
            inner.finish();
        }

        Self {
            shared: Arc::new(Mutex::new(inner)),
            path: path.map(str::to_string),
        }
    }

    /// The resource path this response is for.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The name used for this response in logs.
    pub fn name(&self) -> &str {
        self.path.as_deref().unwrap_or("response")
    }

    pub fn state(&self) -> State {
        self.lock().state
    }

    pub fn is_complete(&self) -> bool {
        self.lock().complete
    }

    pub fn is_failed(&self) -> bool {
        self.lock().failed
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    /// Number of blocks accepted so far, headers included.
    pub fn count(&self) -> usize {
        self.lock().count
    }

    /// Queues one block of data. It is sent from the runtime once the
    /// transport is writable.
    ///
    /// Returns false when the response has failed or was already completed.
    /// The block is ignored in that case and queuing more makes no sense.
    pub fn enqueue(&self, block: Bytes) -> bool {
        let mut inner = self.lock();

        if inner.complete {
            warn!(
                response = %inner.logname,
                "Block queued after the response was completed. This is a programmer error."
            );
            return false;
        }

        if inner.failed {
            debug!(response = %inner.logname, "ignoring queued block after failure");
            return false;
        }

        inner.count += 1;
        debug!(response = %inner.logname, bytes = block.len(), "queued");
        inner.queue.push_back(block);

        if inner.listener.is_none() {
            inner.state = State::Writing;
            inner.listener = Some(spawn_driver(&self.shared));
        }

        true
    }

    /// Queues the header block. Must come before any other block.
    ///
    /// `length` is the combined size of the body blocks to follow, or `None`
    /// when unknown, in which case the body ends when the connection closes.
    /// Don't put `Content-Length` or `Connection` in `headers`.
    pub fn send_headers(&self, status: u16, reason: &str, length: Option<u64>, headers: &Headers) {
        {
            let inner = self.lock();
            if inner.count > 0 {
                error!(
                    response = %inner.logname,
                    "Headers should be sent first. This is a programmer error."
                );
                return;
            }
        }

        let block = headers::build_headers(status, reason, length, headers, self.path());
        self.enqueue(block);
    }

    /// Sends a 200 response made of `blocks` and completes it.
    pub fn send_content(&self, headers: &Headers, blocks: &[Bytes]) {
        let length = blocks.iter().map(|block| block.len() as u64).sum();
        self.send_headers(200, "OK", Some(length), headers);

        for block in blocks {
            if !self.enqueue(block.clone()) {
                return;
            }
        }
        self.complete();
    }

    /// Tells the response that all data has been queued.
    ///
    /// The response stays alive until the data is sent, flushed and the
    /// transport closed, so the handle can be dropped right after. Returns
    /// false if the response had already failed or been completed.
    pub fn complete(&self) -> bool {
        let mut inner = self.lock();

        if inner.complete {
            error!(
                response = %inner.logname,
                "Response completed twice. This is a programmer error."
            );
            return false;
        }

        if inner.failed {
            return false;
        }

        inner.complete = true;

        if inner.listener.is_some() {
            debug!(response = %inner.logname, "queueing complete");
        } else {
            debug!(response = %inner.logname, "complete closing io");
            inner.state = State::Draining;
            inner.listener = Some(spawn_driver(&self.shared));
        }

        true
    }

    /// Resolves once the response reached [`State::Done`].
    pub async fn finished(&self) {
        let mut done = self.lock().done_tx.subscribe();
        let _ = done.wait_for(|done| *done).await;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.shared)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Response")
            .field("name", &inner.logname)
            .field("state", &inner.state)
            .field("queued", &inner.queue.len())
            .field("complete", &inner.complete)
            .field("failed", &inner.failed)
            .finish()
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        let mut inner = self.lock();

        // A completed response is kept alive by its driver
        if inner.complete || inner.done {
            return;
        }

        if let Some(listener) = inner.listener.take() {
            listener.abort();
        }
        inner.finish();
    }
}

/// Spawns the task that carries the response through its states. The task
/// holds a strong handle until it reaches Idle or Done.
fn spawn_driver(shared: &Arc<Mutex<Inner>>) -> JoinHandle<()> {
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        poll_fn(|cx| lock(&shared).poll_progress(cx)).await;
    })
}

impl Inner {
    /// Runs transitions until the transport would block or the driver has
    /// nothing left to do.
    fn poll_progress(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        loop {
            let step = match self.state {
                State::Writing => self.poll_writing(cx),
                State::Draining => self.poll_draining(cx),
                State::Closing => self.poll_closing(cx),
                State::Idle | State::Done => return Poll::Ready(()),
            };

            if step.is_pending() {
                return Poll::Pending;
            }
        }
    }

    fn poll_writing(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(block) = self.queue.front().cloned() else {
            if self.complete {
                debug!(response = %self.logname, "complete flushing output");
                self.state = State::Draining;
            } else {
                // Re-registered by the next enqueue
                self.listener = None;
                self.state = State::Idle;
            }
            return Poll::Ready(());
        };

        let remaining = &block[self.partial_offset..];
        if remaining.is_empty() {
            self.pop_head();
            return Poll::Ready(());
        }

        let Some(Transport::Pollable(output)) = self.io.as_mut() else {
            self.fail(io::Error::new(io::ErrorKind::NotConnected, "no pollable output"));
            return Poll::Ready(());
        };

        match output.as_mut().poll_write(cx, remaining) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(0)) => {
                self.fail(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "transport accepted no bytes",
                ));
                Poll::Ready(())
            }
            Poll::Ready(Ok(n)) if n >= remaining.len() => {
                debug!(response = %self.logname, bytes = remaining.len(), "sent");
                self.pop_head();
                Poll::Ready(())
            }
            Poll::Ready(Ok(n)) => {
                debug!(response = %self.logname, bytes = n, "sent partial");
                self.partial_offset += n;
                Poll::Ready(())
            }
            Poll::Ready(Err(err)) => {
                self.fail(err);
                Poll::Ready(())
            }
        }
    }

    fn poll_draining(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(Transport::Pollable(output)) = self.io.as_mut() else {
            self.finish();
            return Poll::Ready(());
        };

        match output.as_mut().poll_flush(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(())) => {
                debug!(response = %self.logname, "flushed output");
                self.state = State::Closing;
                Poll::Ready(())
            }
            Poll::Ready(Err(err)) => {
                self.report_output_error("flush", &err);
                self.finish();
                Poll::Ready(())
            }
        }
    }

    fn poll_closing(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(Transport::Pollable(output)) = self.io.as_mut() else {
            self.finish();
            return Poll::Ready(());
        };

        match output.as_mut().poll_shutdown(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(())) => debug!(response = %self.logname, "closed output"),
            Poll::Ready(Err(err)) => self.report_output_error("close", &err),
        }

        self.finish();
        Poll::Ready(())
    }

    fn pop_head(&mut self) {
        self.queue.pop_front();
        self.partial_offset = 0;
    }

    fn fail(&mut self, err: io::Error) {
        self.report_output_error("write", &err);
        self.failed = true;
        self.finish();
    }

    /// Enters [`State::Done`]: abandons the queue, releases the transport and
    /// the listener.
    fn finish(&mut self) {
        if self.done {
            return;
        }

        self.done = true;
        self.state = State::Done;
        self.io = None;
        self.queue.clear();
        self.partial_offset = 0;
        self.listener = None;

        if !self.complete && !self.failed {
            error!(
                response = %self.logname,
                "A Response was freed without being completed properly. This is a programmer error."
            );
        }

        self.done_tx.send_replace(true);
    }

    fn report_output_error(&self, op: &'static str, err: &io::Error) {
        if is_peer_closed(err) {
            debug!(response = %self.logname, error = %err, "{} output error", op);
        } else {
            warn!(response = %self.logname, error = %err, "couldn't {} web output", op);
        }
    }
}

/// The client went away. Not worth a warning.
fn is_peer_closed(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
    )
}
