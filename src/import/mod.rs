//! Decoding of external still images, with last-request-wins completion.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use image::{ImageError, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported or malformed image data: {0}")]
    Decode(#[source] ImageError),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("import request {0} was cancelled")]
    Cancelled(u64),
    #[error("import worker exited without a result")]
    WorkerDisconnected,
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Where the bytes of an import come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl ImportSource {
    fn load(self) -> ImportResult<RgbaImage> {
        let bytes = match self {
            Self::Bytes(bytes) => bytes,
            Self::File(path) => read(&path)?,
        };
        decode(&bytes)
    }
}

/// Identifies one import request; later requests have larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportTicket(u64);

impl ImportTicket {
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Result of a finished decode, tagged with the request it answers.
#[derive(Debug)]
pub struct ImportCompletion {
    pub ticket: ImportTicket,
    pub result: ImportResult<RgbaImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Applied { width: u32, height: u32 },
    Stale,
}

#[derive(Debug, Default)]
pub struct ImportPipeline {
    next_id: u64,
    outstanding: Option<ImportTicket>,
}

impl ImportPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket that supersedes every earlier one.
    pub fn begin(&mut self) -> ImportTicket {
        self.next_id = self.next_id.saturating_add(1);
        let ticket = ImportTicket(self.next_id);
        if let Some(previous) = self.outstanding.replace(ticket) {
            tracing::debug!(
                superseded = previous.id(),
                current = ticket.id(),
                "import request superseded"
            );
        }
        ticket
    }

    pub fn outstanding(&self) -> Option<ImportTicket> {
        self.outstanding
    }

    pub fn is_current(&self, ticket: ImportTicket) -> bool {
        self.outstanding == Some(ticket)
    }

    /// Marks `ticket` as answered; returns whether it was still the latest request.
    pub fn settle(&mut self, ticket: ImportTicket) -> bool {
        if self.is_current(ticket) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    /// Withdraws `ticket` so its completion is treated as stale.
    pub fn cancel(&mut self, ticket: ImportTicket) -> bool {
        let withdrawn = self.settle(ticket);
        if withdrawn {
            tracing::info!(request = ticket.id(), "import request cancelled");
        }
        withdrawn
    }

    pub fn spawn(&mut self, source: ImportSource) -> ImportTask {
        let ticket = self.begin();
        ImportTask::spawn(ticket, source)
    }
}

/// A decode running on a worker thread.
#[derive(Debug)]
pub struct ImportTask {
    ticket: ImportTicket,
    receiver: mpsc::Receiver<ImportCompletion>,
    cancelled: Arc<AtomicBool>,
}

impl ImportTask {
    fn spawn(ticket: ImportTicket, source: ImportSource) -> Self {
        let (tx, rx) = mpsc::channel::<ImportCompletion>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);

        std::thread::spawn(move || {
            let result = if worker_cancelled.load(Ordering::Acquire) {
                Err(ImportError::Cancelled(ticket.id()))
            } else {
                source.load()
            };
            let _ = tx.send(ImportCompletion { ticket, result });
        });

        Self {
            ticket,
            receiver: rx,
            cancelled,
        }
    }

    pub fn ticket(&self) -> ImportTicket {
        self.ticket
    }

    /// Asks the worker to skip decoding if it has not started yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Non-blocking poll; `None` while the worker is still running.
    pub fn try_complete(&self) -> Option<ImportCompletion> {
        match self.receiver.try_recv() {
            Ok(completion) => Some(self.finalize(completion)),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(self.disconnected()),
        }
    }

    pub fn wait(self) -> ImportCompletion {
        match self.receiver.recv() {
            Ok(completion) => self.finalize(completion),
            Err(_) => self.disconnected(),
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<ImportCompletion> {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => Some(self.finalize(completion)),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(self.disconnected()),
        }
    }

    fn finalize(&self, completion: ImportCompletion) -> ImportCompletion {
        if self.is_cancelled() && completion.result.is_ok() {
            return ImportCompletion {
                ticket: completion.ticket,
                result: Err(ImportError::Cancelled(self.ticket.id())),
            };
        }
        completion
    }

    fn disconnected(&self) -> ImportCompletion {
        ImportCompletion {
            ticket: self.ticket,
            result: Err(ImportError::WorkerDisconnected),
        }
    }
}

pub fn read(path: &Path) -> ImportResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn decode(bytes: &[u8]) -> ImportResult<RgbaImage> {
    let image = image::load_from_memory(bytes)
        .map_err(ImportError::Decode)?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(ImportError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image)
}
