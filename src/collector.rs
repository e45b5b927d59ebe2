//! The collection coordinator: owns the store and the periodic discovery task.
//!
//! ```no_run
//! # async fn example() -> creo_stats::Result<()> {
//! use creo_stats::{Collector, Config, ErrorSink};
//!
//! let (sink, mut failed) = ErrorSink::channel();
//! let mut collector = Collector::new(Config::from_env());
//! collector.init(Some(sink))?;
//!
//! loop {
//!     tokio::select! {
//!         err = &mut failed => {
//!             if let Ok(err) = err {
//!                 eprintln!("discovery stopped: {err}");
//!             }
//!             break;
//!         }
//!         _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {
//!             for (container_id, entry) in collector.snapshot()? {
//!                 println!("{container_id}: rss={}", entry.memory.rss);
//!             }
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regex::Regex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::cgroup::{ContainerEntry, StatsStore};
use crate::config::Config;
use crate::container::ContainerID;
use crate::error::{Error, Result};

/// Lifecycle of a [`Collector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// [`Collector::init`] has not succeeded yet.
    Uninitialized,
    /// Discovery runs periodically.
    Running,
    /// A discovery pass failed; discovery never runs again. Snapshots still work.
    Failed,
    /// Discovery was stopped with [`Collector::shutdown`]. Snapshots still work.
    Stopped,
}

/// Whether the error handed to an [`ErrorSink`] reached a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The receiver was already gone; the error is lost.
    Dropped,
}

/// Single-use channel reporting the error that stopped discovery.
///
/// Sending never blocks and happens at most once. The sink is consumed either
/// way, so the receiver resolves with an error or observes a closed channel.
#[derive(Debug)]
pub struct ErrorSink(oneshot::Sender<Error>);

impl ErrorSink {
    /// Creates a sink together with its receiving end.
    pub fn channel() -> (Self, oneshot::Receiver<Error>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    pub fn deliver(self, err: Error) -> Delivery {
        match self.0.send(err) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Dropped,
        }
    }
}

impl From<oneshot::Sender<Error>> for ErrorSink {
    fn from(tx: oneshot::Sender<Error>) -> Self {
        Self(tx)
    }
}

#[derive(Debug)]
struct Running {
    store: Arc<StatsStore>,
    failed: Arc<AtomicBool>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

/// Discovers containers periodically and serves snapshots of their stats.
///
/// The discovery task is bound to the collector: it ends on [`Collector::shutdown`],
/// when the collector is dropped, or after the first failed pass.
#[derive(Debug)]
pub struct Collector {
    config: Config,
    running: Option<Running>,
}

impl Collector {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            running: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiles the id pattern, allocates the store and starts periodic discovery.
    ///
    /// The first discovery pass starts right away. Must be called from within a
    /// tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `sink` - Receives the error of a failed discovery pass. If `None`, the
    ///   failure is silent, but discovery stops all the same.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPattern`] / [`Error::CaptureGroups`] for a bad id pattern.
    /// - [`Error::AlreadyInitialized`] if called twice.
    /// - [`Error::NoRuntime`] outside a tokio runtime.
    pub fn init(&mut self, sink: Option<ErrorSink>) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let pattern = compile_pattern(&self.config.id_pattern)?;
        let runtime = tokio::runtime::Handle::try_current()?;

        let store = Arc::new(StatsStore::new(
            pattern,
            self.config.metric_files.clone(),
        ));
        let failed = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = runtime.spawn(discovery_task(
            Arc::clone(&store),
            self.config.cgroup_root.clone(),
            self.config.discovery_interval,
            sink,
            Arc::clone(&failed),
            shutdown_rx,
        ));

        log::debug!(
            "scanning {} every {:?}",
            self.config.cgroup_root.display(),
            self.config.discovery_interval
        );
        self.running = Some(Running {
            store,
            failed,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        });
        Ok(())
    }

    pub fn state(&self) -> State {
        match &self.running {
            None => State::Uninitialized,
            Some(running) if running.failed.load(Ordering::Acquire) => State::Failed,
            Some(running) if running.shutdown.is_none() => State::Stopped,
            Some(_) => State::Running,
        }
    }

    fn store(&self) -> Result<&StatsStore> {
        self.running
            .as_ref()
            .map(|running| running.store.as_ref())
            .ok_or(Error::NotInitialized)
    }

    /// Reads current stats of all known containers.
    ///
    /// Performs blocking file I/O while holding the store lock; call it through
    /// [`tokio::task::spawn_blocking`] from async code.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before [`Collector::init`].
    /// - [`Error::Read`] if a bound file exists but cannot be read.
    pub fn snapshot(&self) -> Result<BTreeMap<ContainerID, ContainerEntry>> {
        self.store()?.snapshot()
    }

    /// Runs one discovery pass on the calling thread, outside the periodic schedule.
    ///
    /// A failure here is returned to the caller and does not stop periodic discovery.
    pub fn discover_now(&self) -> Result<()> {
        self.store()?.apply_discovery(&self.config.cgroup_root)
    }

    /// Returns the last readings of one container, without refreshing them.
    pub fn container(&self, container_id: &str) -> Result<Option<ContainerEntry>> {
        Ok(self.store()?.get(container_id))
    }

    /// Number of tracked containers; zero before initialization.
    pub fn len(&self) -> usize {
        self.store().map(StatsStore::len).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops periodic discovery and waits for the task to finish.
    ///
    /// A pass already in progress is left to complete on the blocking pool. Stats
    /// remain readable afterwards.
    pub async fn shutdown(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if let Some(shutdown) = running.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = running.handle.take() {
            if let Err(err) = handle.await {
                log::debug!("discovery task ended abnormally: {err}");
            }
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        if let Some(handle) = self.running.as_mut().and_then(|r| r.handle.take()) {
            handle.abort();
        }
    }
}

/// Compiles `pattern` and checks it has exactly one capture group.
fn compile_pattern(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern)?;
    // group 0 is the whole match
    let found = regex.captures_len() - 1;
    if found != 1 {
        return Err(Error::CaptureGroups {
            pattern: pattern.to_owned(),
            found,
        });
    }
    Ok(regex)
}

async fn discovery_task(
    store: Arc<StatsStore>,
    root: PathBuf,
    interval: Duration,
    sink: Option<ErrorSink>,
    failed: Arc<AtomicBool>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        if !matches!(shutdown.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
            return;
        }

        let pass = {
            let store = Arc::clone(&store);
            let root = root.clone();
            tokio::task::spawn_blocking(move || store.apply_discovery(&root))
        };

        let result = tokio::select! {
            result = pass => result.expect("discovery pass panicked"),
            _ = &mut shutdown => return,
        };

        if let Err(err) = result {
            failed.store(true, Ordering::Release);
            log::debug!("discovery stopped: {err}");
            if let Some(sink) = sink {
                let delivery = sink.deliver(err);
                log::debug!("discovery error {delivery:?}");
            }
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => return,
        }
    }
}
