//! Scripted transport for driving a response by hand.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

/// What the transport does on one write attempt.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Accept up to this many bytes.
    Accept(usize),
    /// Not writable right now. Readiness fires again straight away.
    WouldBlock,
    Fail(io::ErrorKind),
}

#[derive(Debug, Default)]
struct Record {
    written: Vec<u8>,
    writes: usize,
    flushed: bool,
    closed: bool,
    released: bool,
}

/// Shared view of what happened to a [`ScriptedOutput`].
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Record>>);

impl Recorder {
    fn lock(&self) -> MutexGuard<'_, Record> {
        self.0.lock().unwrap()
    }

    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.lock().written).into_owned()
    }

    /// Number of successful write calls.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn flushed(&self) -> bool {
        self.lock().flushed
    }

    pub fn closed(&self) -> bool {
        self.lock().closed
    }

    /// The transport has been dropped.
    pub fn released(&self) -> bool {
        self.lock().released
    }
}

/// An `AsyncWrite` that follows a script, then accepts everything.
pub struct ScriptedOutput {
    steps: VecDeque<Step>,
    flush_error: Option<io::ErrorKind>,
    close_error: Option<io::ErrorKind>,
    record: Recorder,
}

impl ScriptedOutput {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            flush_error: None,
            close_error: None,
            record: Recorder::default(),
        }
    }

    /// Accepts every write in full.
    pub fn accepting() -> Self {
        Self::new(Vec::<Step>::new())
    }

    pub fn fail_flush(mut self, kind: io::ErrorKind) -> Self {
        self.flush_error = Some(kind);
        self
    }

    pub fn fail_close(mut self, kind: io::ErrorKind) -> Self {
        self.close_error = Some(kind);
        self
    }

    pub fn recorder(&self) -> Recorder {
        self.record.clone()
    }
}

impl AsyncWrite for ScriptedOutput {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match this.steps.pop_front().unwrap_or(Step::Accept(usize::MAX)) {
            Step::Accept(n) => {
                let n = n.min(buf.len());
                let mut record = this.record.lock();
                record.written.extend_from_slice(&buf[..n]);
                record.writes += 1;
                Poll::Ready(Ok(n))
            }
            Step::WouldBlock => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Step::Fail(kind) => Poll::Ready(Err(io::Error::from(kind))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.record.lock().flushed = true;
        match this.flush_error {
            Some(kind) => Poll::Ready(Err(io::Error::from(kind))),
            None => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.record.lock().closed = true;
        match this.close_error {
            Some(kind) => Poll::Ready(Err(io::Error::from(kind))),
            None => Poll::Ready(Ok(())),
        }
    }
}

impl Drop for ScriptedOutput {
    fn drop(&mut self) {
        self.record.lock().released = true;
    }
}

/// Splits a captured response into its header block and body.
pub fn split_response(text: &str) -> (&str, &str) {
    text.split_once("\r\n\r\n").expect("no header terminator")
}
