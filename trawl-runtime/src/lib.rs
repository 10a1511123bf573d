use anyhow::Result;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct TrawlHandle {
    inner: Handle,
    cancel: Arc<CancellationToken>,
}

/// Tokio runtime plus the cancellation token every long-running task of the
/// process listens to.
pub struct TrawlRuntime {
    runtime: Runtime,
    cancel: Arc<CancellationToken>,
}

impl TrawlRuntime {
    /// Build a multi-thread runtime.
    ///
    /// ```
    /// use trawl_runtime::TrawlRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = TrawlRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        let cancel = Arc::new(CancellationToken::new());
        Ok(Self { runtime, cancel })
    }

    /// ```
    /// use trawl_runtime::TrawlRuntime;
    ///
    /// let runtime = TrawlRuntime::build("handle-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> TrawlHandle {
        TrawlHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel outstanding work and give tasks `graceful` to wind down.
    pub fn shutdown(self, graceful: std::time::Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl TrawlHandle {
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// Shared token; cancelling it asks every cooperating task to stop.
    ///
    /// ```
    /// use trawl_runtime::TrawlRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = TrawlRuntime::build("cancel-example", Some(1)).unwrap();
    /// let cancel = runtime.handle().cancellation();
    /// cancel.cancel();
    /// assert!(cancel.is_cancelled());
    /// runtime.shutdown(Duration::from_millis(5));
    /// ```
    pub fn cancellation(&self) -> Arc<CancellationToken> {
        self.cancel.clone()
    }

    /// Cancel the shared token on Ctrl-C, or SIGTERM on Unix.
    ///
    /// The returned task ends on its own once the token is cancelled for any
    /// other reason.
    pub fn watch_signals(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        self.inner.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                signal = shutdown_signal() => {
                    tracing::info!(target: "trawl.runtime", signal, "shutdown requested");
                    cancel.cancel();
                }
            }
        })
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = term.recv() => "SIGTERM",
        },
        Err(err) => {
            tracing::warn!(target: "trawl.runtime", error = %err, "SIGTERM handler unavailable; watching Ctrl-C only");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(err) => {
            tracing::warn!(target: "trawl.runtime", error = %err, "Ctrl-C handler unavailable");
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn spawned_tasks_run_on_the_shared_runtime() {
        let runtime = TrawlRuntime::build("spawn-test", Some(1)).unwrap();
        let task = runtime.handle().spawn(async { 21 * 2 });
        let result = runtime.block_on(async move { task.await.unwrap() });
        assert_eq!(result, 42);
        runtime.shutdown(Duration::from_millis(10));
    }

    #[test]
    fn signal_watcher_exits_when_token_is_cancelled_elsewhere() {
        let runtime = TrawlRuntime::build("signal-test", Some(1)).unwrap();
        let handle = runtime.handle();
        let watcher = handle.watch_signals();
        handle.cancellation().cancel();
        runtime.block_on(async move {
            tokio::time::timeout(Duration::from_secs(5), watcher)
                .await
                .expect("watcher finishes")
                .unwrap();
        });
        runtime.shutdown(Duration::from_millis(10));
    }

    #[test]
    fn shutdown_cancels_the_token() {
        let runtime = TrawlRuntime::build("shutdown-test", Some(1)).unwrap();
        let cancel = runtime.handle().cancellation();
        runtime.shutdown(Duration::from_millis(5));
        assert!(cancel.is_cancelled());
    }
}
