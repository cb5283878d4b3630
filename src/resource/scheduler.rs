//! Background release of native resources whose owners went away without disposing them.
//!
//! Every [`super::NativeResource`] registers one cleanup record here when it is created. The
//! record is removed from the pending map by whichever path gets to it first:
//!
//! - [`CleanupScheduler::release_now`] on explicit disposal, run on the caller's thread
//! - [`CleanupScheduler::release_later`] from `Drop`, run on the scheduler thread
//!
//! Removal from the [`DashMap`] is atomic, so a record can never run twice. The scheduler thread
//! is started on first use and lives for the rest of the process. Failures of individual release
//! actions are logged and do not affect other records.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc, Arc, OnceLock,
    },
    thread,
};

use dashmap::DashMap;

use crate::backend::codes;

/// Values that must outlive the native release of a resource, such as a callout closure.
pub type KeepAlive = Box<dyn Any + Send>;

/// The native release of one resource; returns the native result code.
pub type ReleaseAction = Box<dyn FnOnce() -> i32 + Send + Sync>;

/// Identifies one cleanup record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CleanupToken(u64);

struct CleanupRecord {
    kind: &'static str,
    action: ReleaseAction,
}

enum Job {
    Release {
        token: CleanupToken,
        keep_alive: Vec<KeepAlive>,
    },
    Flush(mpsc::Sender<()>),
}

/// Process-wide releaser for native resources.
pub struct CleanupScheduler {
    records: Arc<DashMap<u64, CleanupRecord>>,
    next: AtomicU64,
    sender: Option<mpsc::Sender<Job>>,
}

static GLOBAL: OnceLock<CleanupScheduler> = OnceLock::new();

impl CleanupScheduler {
    /// The process-wide scheduler, started on first use.
    pub fn global() -> &'static CleanupScheduler {
        GLOBAL.get_or_init(CleanupScheduler::new)
    }

    /// Creates a scheduler with its own background thread.
    ///
    /// The thread exits when the scheduler is dropped. If it cannot be spawned, deferred
    /// releases run inline on the dropping thread instead.
    pub fn new() -> Self {
        let records: Arc<DashMap<u64, CleanupRecord>> = Arc::new(DashMap::new());
        let (tx, rx) = mpsc::channel::<Job>();

        let worker_records = Arc::clone(&records);
        let sender = match thread::Builder::new()
            .name("nativeregex-cleanup".to_string())
            .spawn(move || worker_loop(&worker_records, &rx))
        {
            Ok(_) => Some(tx),
            Err(e) => {
                log::warn!("cleanup thread unavailable, releasing inline: {e}");
                None
            }
        };

        CleanupScheduler {
            records,
            next: AtomicU64::new(1),
            sender,
        }
    }

    /// Registers the release action of a freshly created resource.
    pub fn register(&self, kind: &'static str, action: ReleaseAction) -> CleanupToken {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.records.insert(id, CleanupRecord { kind, action });
        CleanupToken(id)
    }

    /// Runs the record on the calling thread.
    ///
    /// Returns the native result code, or `None` if the record had already been executed.
    pub fn release_now(&self, token: CleanupToken) -> Option<i32> {
        let (_, record) = self.records.remove(&token.0)?;
        Some(execute(token, record))
    }

    /// Hands the record to the background thread. `keep_alive` is dropped after the release
    /// action has run.
    pub fn release_later(&self, token: CleanupToken, keep_alive: Vec<KeepAlive>) {
        let job = Job::Release { token, keep_alive };
        let job = match &self.sender {
            Some(sender) => match sender.send(job) {
                Ok(()) => return,
                Err(mpsc::SendError(job)) => job,
            },
            None => job,
        };
        run(&self.records, job);
    }

    /// Returns `true` while the record has not been executed.
    pub fn is_pending(&self, token: CleanupToken) -> bool {
        self.records.contains_key(&token.0)
    }

    /// Number of records not yet executed, including those of live resources.
    pub fn pending(&self) -> usize {
        self.records.len()
    }

    /// Blocks until every release deferred before this call has run.
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };

        let (ack_tx, ack_rx) = mpsc::channel();
        if sender.send(Job::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Default for CleanupScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn worker_loop(records: &DashMap<u64, CleanupRecord>, rx: &mpsc::Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        run(records, job);
    }
}

fn run(records: &DashMap<u64, CleanupRecord>, job: Job) {
    match job {
        Job::Release { token, keep_alive } => {
            if let Some((_, record)) = records.remove(&token.0) {
                log::debug!("deferred release of {} #{}", record.kind, token.0);
                execute(token, record);
            }
            drop(keep_alive);
        }
        Job::Flush(ack) => {
            let _ = ack.send(());
        }
    }
}

fn execute(token: CleanupToken, record: CleanupRecord) -> i32 {
    let CleanupRecord { kind, action } = record;
    match panic::catch_unwind(AssertUnwindSafe(action)) {
        Ok(rc) => {
            if rc < 0 {
                log::warn!("release of {kind} #{} failed with code {rc}", token.0);
            }
            rc
        }
        Err(_) => {
            log::error!("release of {kind} #{} panicked", token.0);
            codes::ERROR_INTERNAL
        }
    }
}
