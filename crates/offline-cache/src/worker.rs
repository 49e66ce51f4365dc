//! The offline worker: lifecycle, control messages and fetch dispatch.

use std::sync::{Arc, Mutex};

use filedock_protocol::{WorkerMessage, WorkerMessageError};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::expiration::prune;
use crate::namespace::{CacheEntry, CacheNamespace};
use crate::network::{Network, NetworkError};
use crate::request::Request;
use crate::router::{CachePolicy, CacheRouter, Route, RouterConfig};
use crate::store::{CacheError, CacheStore};
use crate::strategy::{self, FetchOutcome, PolicyContext};

/// Errors surfaced by the worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("app shell could not be precached (status {0})")]
    ShellUnavailable(u16),

    #[error(transparent)]
    Message(#[from] WorkerMessageError),
}

/// Worker version lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Precaching the app shell.
    Installing,
    /// Installed, waiting for the previous version to let go.
    Waiting,
    /// Intercepting requests.
    Active,
    /// Installation failed; this version never activates.
    Redundant,
}

#[derive(Debug)]
struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
}

/// Intercepts read requests and serves them through the cache policy table.
pub struct OfflineWorker {
    router: CacheRouter,
    ctx: PolicyContext,
    lifecycle: Mutex<Lifecycle>,
}

impl OfflineWorker {
    pub fn new(
        config: RouterConfig,
        store: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            router: CacheRouter::new(config),
            ctx: PolicyContext {
                store,
                network,
                clock,
            },
            lifecycle: Mutex::new(Lifecycle {
                state: WorkerState::Installing,
                skip_waiting: false,
            }),
        }
    }

    pub fn router(&self) -> &CacheRouter {
        &self.router
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle().state
    }

    fn lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Precaches the app shell and moves to `Waiting`, or straight to
    /// `Active` if `SKIP_WAITING` arrived during installation.
    pub async fn install(&self) -> Result<WorkerState, WorkerError> {
        let result = self.precache_shell().await;
        let mut lifecycle = self.lifecycle();
        match result {
            Ok(()) => {
                lifecycle.state = if lifecycle.skip_waiting {
                    WorkerState::Active
                } else {
                    WorkerState::Waiting
                };
                info!(state = ?lifecycle.state, "offline worker installed");
                Ok(lifecycle.state)
            }
            Err(e) => {
                lifecycle.state = WorkerState::Redundant;
                warn!(error = %e, "offline worker install failed");
                Err(e)
            }
        }
    }

    async fn precache_shell(&self) -> Result<(), WorkerError> {
        let key = self.router.shell_key();
        let response = self.ctx.network.fetch(Request::get(key.clone())).await?;
        if response.status != 200 {
            return Err(WorkerError::ShellUnavailable(response.status));
        }
        let now = self.ctx.clock.now();
        self.ctx
            .store
            .put(CacheNamespace::NavigationShell, CacheEntry::new(key, response, now))?;
        prune(self.ctx.store.as_ref(), CacheNamespace::NavigationShell, now)?;
        Ok(())
    }

    /// Activates a waiting worker once no previous version controls clients.
    pub fn activate(&self) -> WorkerState {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state == WorkerState::Waiting {
            lifecycle.state = WorkerState::Active;
            info!("offline worker activated");
        }
        lifecycle.state
    }

    /// Applies a control message from the application.
    pub fn handle_message(&self, message: WorkerMessage) -> WorkerState {
        match message {
            WorkerMessage::SkipWaiting => {
                let mut lifecycle = self.lifecycle();
                lifecycle.skip_waiting = true;
                if lifecycle.state == WorkerState::Waiting {
                    lifecycle.state = WorkerState::Active;
                    info!("offline worker activated by SKIP_WAITING");
                }
                lifecycle.state
            }
        }
    }

    /// Parses and applies a JSON control message.
    pub fn handle_raw_message(&self, raw: &str) -> Result<WorkerState, WorkerError> {
        let message = WorkerMessage::from_json(raw)?;
        Ok(self.handle_message(message))
    }

    /// Serves `request` according to its route.
    ///
    /// Until the worker is active every request goes to the network untouched.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome, WorkerError> {
        if self.state() != WorkerState::Active {
            return Ok(strategy::passthrough(&self.ctx, request).await?);
        }

        let outcome = match self.router.classify(&request) {
            Route::Passthrough => strategy::passthrough(&self.ctx, request).await?,
            Route::Cache {
                namespace,
                policy,
                key,
            } => {
                debug!(%namespace, ?policy, key, "routing request");
                match policy {
                    CachePolicy::AppShell => {
                        strategy::cache_first(&self.ctx, namespace, &key, request, false).await?
                    }
                    CachePolicy::NetworkFirst { timeout } => {
                        strategy::network_first(&self.ctx, namespace, &key, request, timeout)
                            .await?
                    }
                    CachePolicy::StaleWhileRevalidate => {
                        strategy::stale_while_revalidate(&self.ctx, namespace, &key, request)
                            .await?
                    }
                    CachePolicy::CacheFirst { accept_opaque } => {
                        strategy::cache_first(&self.ctx, namespace, &key, request, accept_opaque)
                            .await?
                    }
                }
            }
        };
        Ok(outcome)
    }
}
