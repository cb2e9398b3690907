//! Per-key load deduplication.
//!
//! Every key has at most one render job in flight. Callers arriving while a
//! job runs get a handle joined to it and see the same outcome as the caller
//! that started it.

use crate::error::{IconError, RenderError};
use crate::types::{CacheKey, IconSource, RenderedIcon};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinError};

/// Outcome shared by every caller joined to a job.
pub type LoadResult = Result<RenderedIcon, IconError>;

/// Identifies one job within one coordinator generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobTicket {
    id: u64,
    generation: u64,
}

/// A caller's handle on an in-flight render.
///
/// Dropping it does not stop the render; the job keeps running for the
/// other joined callers and for the cache.
#[derive(Clone)]
pub struct JoinedLoad {
    outcome: Shared<BoxFuture<'static, LoadResult>>,
    joined_existing: bool,
}

impl JoinedLoad {
    /// True if this handle attached to a job another caller started.
    pub fn joined_existing(&self) -> bool {
        self.joined_existing
    }
}

impl Future for JoinedLoad {
    type Output = LoadResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.outcome).poll(cx)
    }
}

struct InFlightJob {
    id: u64,
    outcome: Shared<BoxFuture<'static, LoadResult>>,
    abort: AbortHandle,
}

/// Book of in-flight render jobs keyed by application id.
///
/// Not synchronized by itself; the owner keeps it behind a lock and the
/// completion hook takes that same lock before calling [`finish`].
///
/// [`finish`]: LoadCoordinator::finish
pub struct LoadCoordinator {
    jobs: HashMap<CacheKey, InFlightJob>,
    runtime: Handle,
    next_id: u64,
    generation: u64,
}

impl LoadCoordinator {
    /// `runtime` is the background context renders are spawned on.
    pub fn new(runtime: Handle) -> Self {
        Self {
            jobs: HashMap::new(),
            runtime,
            next_id: 0,
            generation: 0,
        }
    }

    /// Join the in-flight job for `key`, or start one.
    ///
    /// A new job runs `render(source)` on the runtime's blocking pool. Once it
    /// returns, `on_complete` is called with the job's ticket and outcome
    /// before any joined caller is woken. The hook is expected to call
    /// [`finish`](Self::finish) and publish the result.
    pub fn obtain_or_join<R, C>(
        &mut self,
        key: &str,
        source: IconSource,
        render: R,
        on_complete: C,
    ) -> JoinedLoad
    where
        R: FnOnce(IconSource) -> Result<RenderedIcon, RenderError> + Send + 'static,
        C: FnOnce(JobTicket, &str, &LoadResult) + Send + 'static,
    {
        if let Some(job) = self.jobs.get(key) {
            debug!("Joining in-flight icon load for '{}'", key);
            return JoinedLoad {
                outcome: job.outcome.clone(),
                joined_existing: true,
            };
        }

        let ticket = JobTicket {
            id: self.next_id,
            generation: self.generation,
        };
        self.next_id += 1;

        let task_key = key.to_string();
        let task = self.runtime.spawn(async move {
            let result = match tokio::task::spawn_blocking(move || render(source)).await {
                Ok(rendered) => rendered.map_err(IconError::Render),
                Err(e) => Err(join_error(e)),
            };
            on_complete(ticket, &task_key, &result);
            result
        });

        let abort = task.abort_handle();
        let outcome = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(join_error(e)),
            }
        }
        .boxed()
        .shared();

        debug!("Started icon load for '{}' (job {})", key, ticket.id);
        self.jobs.insert(
            key.to_string(),
            InFlightJob {
                id: ticket.id,
                outcome: outcome.clone(),
                abort,
            },
        );

        JoinedLoad {
            outcome,
            joined_existing: false,
        }
    }

    /// Retire a finished job.
    ///
    /// Returns true if the ticket still owns the entry for `key`, meaning its
    /// result may be published. Jobs orphaned by [`clear`](Self::clear) or
    /// [`cancel_all`](Self::cancel_all) return false and leave any newer job
    /// for the same key untouched.
    pub fn finish(&mut self, key: &str, ticket: JobTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }

        match self.jobs.get(key) {
            Some(job) if job.id == ticket.id => {
                self.jobs.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Forget every job without stopping it. Their results will be refused
    /// by [`finish`](Self::finish).
    pub fn clear(&mut self) {
        self.generation += 1;
        self.jobs.clear();
    }

    /// Abort every job. Joined callers resolve to [`IconError::Cancelled`].
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        for (key, job) in self.jobs.drain() {
            debug!("Cancelling icon load for '{}'", key);
            job.abort.abort();
        }
    }

    pub fn in_flight(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.jobs.contains_key(key)
    }
}

fn join_error(err: JoinError) -> IconError {
    if err.is_cancelled() {
        IconError::Cancelled
    } else {
        IconError::Render(RenderError::Task(err.to_string()))
    }
}
