//! App configs for lifecycle tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::application::AppConfig;
use crate::port::{HookError, LifeCycles, MountResult};

/// Loader-returned app with no-op mount and unmount.
pub fn noop_app(name: &str) -> AppConfig {
    AppConfig::new(name).with_loader(|_| async {
        Ok(LifeCycles::new()
            .with_mount(|_| async { Ok(MountResult::default()) })
            .with_unmount(|_| async { Ok(()) }))
    })
}

/// App whose mount always fails.
pub fn failing_mount_app(name: &str) -> AppConfig {
    AppConfig::new(name).with_loader(|_| async {
        Ok(LifeCycles::new()
            .with_mount(|_| async { Err(HookError::msg("mount exploded")) })
            .with_unmount(|_| async { Ok(()) }))
    })
}

/// Shared call counters of a counted app.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    loads: Arc<AtomicUsize>,
    mounts: Arc<AtomicUsize>,
    unmounts: Arc<AtomicUsize>,
}

impl CallCounter {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn mounts(&self) -> usize {
        self.mounts.load(Ordering::SeqCst)
    }

    pub fn unmounts(&self) -> usize {
        self.unmounts.load(Ordering::SeqCst)
    }
}

/// App counting every lifecycle call; each call sleeps for `delay`.
pub fn counted_app(name: &str, delay: Duration) -> (AppConfig, CallCounter) {
    let counter = CallCounter::default();
    let calls = counter.clone();
    let config = AppConfig::new(name).with_loader(move |_| {
        let calls = calls.clone();
        async move {
            calls.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;

            let mounts = Arc::clone(&calls.mounts);
            let unmounts = Arc::clone(&calls.unmounts);
            Ok(LifeCycles::new()
                .with_mount(move |_| {
                    mounts.fetch_add(1, Ordering::SeqCst);
                    async move {
                        tokio::time::sleep(delay).await;
                        Ok(MountResult::default())
                    }
                })
                .with_unmount(move |_| {
                    unmounts.fetch_add(1, Ordering::SeqCst);
                    async move {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    }
                }))
        }
    });
    (config, counter)
}

/// A latch that gated lifecycle functions wait on.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Release every current and future waiter.
    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// App whose mount blocks until `gate` opens.
pub fn gated_mount_app(name: &str, gate: Gate) -> (AppConfig, CallCounter) {
    let counter = CallCounter::default();
    let calls = counter.clone();
    let config = AppConfig::new(name).with_loader(move |_| {
        let calls = calls.clone();
        let gate = gate.clone();
        async move {
            calls.loads.fetch_add(1, Ordering::SeqCst);
            let mounts = Arc::clone(&calls.mounts);
            let unmounts = Arc::clone(&calls.unmounts);
            Ok(LifeCycles::new()
                .with_mount(move |_| {
                    mounts.fetch_add(1, Ordering::SeqCst);
                    let gate = gate.clone();
                    async move {
                        gate.wait().await;
                        Ok(MountResult::default())
                    }
                })
                .with_unmount(move |_| {
                    unmounts.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                }))
        }
    });
    (config, counter)
}
