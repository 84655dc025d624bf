//! Generic provider fan-out
//!
//! Each provider job runs in its own tokio task behind a semaphore permit,
//! under a total time budget. Jobs report `(source, records)` over a channel
//! to a single collector that writes the report. A job that errors, times
//! out or panics is folded into an error record for its own source; its
//! siblings are never affected.

use crate::dispatch::ProviderError;
use crate::model::{AggregatedReport, NormalizedRecord};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// Output of one provider job
pub type ProviderOutput = Result<Vec<NormalizedRecord>, ProviderError>;

/// One provider's query flow
pub struct ProviderJob {
    pub source: String,
    future: BoxFuture<'static, ProviderOutput>,
}

impl ProviderJob {
    pub fn new<F>(source: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = ProviderOutput> + Send + 'static,
    {
        Self {
            source: source.into(),
            future: future.boxed(),
        }
    }
}

impl std::fmt::Debug for ProviderJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderJob")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// What to write for a job that succeeded with zero records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// An explicit "no results" record
    NoResultsRecord,

    /// The key with an empty list
    KeepEmpty,
}

/// Bounded, failure-isolating fan-out
#[derive(Debug, Clone)]
pub struct FanOut {
    max_concurrent: usize,
    job_timeout: Duration,
    empty: EmptyPolicy,
}

impl FanOut {
    pub fn new(max_concurrent: usize, job_timeout: Duration) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            job_timeout,
            empty: EmptyPolicy::NoResultsRecord,
        }
    }

    /// Replaces the per-job budget
    pub fn with_job_timeout(mut self, job_timeout: Duration) -> Self {
        self.job_timeout = job_timeout;
        self
    }

    pub fn with_empty_policy(mut self, empty: EmptyPolicy) -> Self {
        self.empty = empty;
        self
    }

    /// Runs every job and collects the results
    ///
    /// Sources appear in the report in completion order. Every job's source
    /// is present in the returned report.
    pub async fn run(&self, jobs: Vec<ProviderJob>) -> AggregatedReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let (tx, mut rx) = mpsc::channel::<(String, Vec<NormalizedRecord>)>(jobs.len().max(1));
        let sources: Vec<String> = jobs.iter().map(|job| job.source.clone()).collect();

        for job in jobs {
            let semaphore = semaphore.clone();
            let tx = tx.clone();
            let budget = self.job_timeout;

            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };

                let source = job.source;
                tracing::debug!("Dispatching provider {}", source);

                // Inner task isolates panics inside the provider flow
                let mut handle = tokio::spawn(job.future);
                let records = match tokio::time::timeout(budget, &mut handle).await {
                    Ok(Ok(Ok(records))) => records,
                    Ok(Ok(Err(e))) => {
                        tracing::warn!("Provider {} failed: {}", source, e);
                        vec![NormalizedRecord::failed(&source, e)]
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Provider {} task aborted: {}", source, e);
                        vec![NormalizedRecord::failed(
                            &source,
                            format!("provider task aborted: {}", e),
                        )]
                    }
                    Err(_) => {
                        handle.abort();
                        tracing::warn!("Provider {} exceeded its {:?} budget", source, budget);
                        vec![NormalizedRecord::failed(
                            &source,
                            ProviderError::Timeout(budget),
                        )]
                    }
                };

                let _ = tx.send((source, records)).await;
            });
        }
        drop(tx);

        let mut report = AggregatedReport::new();
        while let Some((source, records)) = rx.recv().await {
            let records = if records.is_empty() && self.empty == EmptyPolicy::NoResultsRecord {
                vec![NormalizedRecord::no_results(&source, "No results found")]
            } else {
                records
            };
            report.push(&source, records);
        }

        for source in sources {
            if report.get(&source).is_none() {
                report.push(
                    &source,
                    vec![NormalizedRecord::failed(&source, "provider did not report")],
                );
            }
        }

        report
    }

    /// Runs a single provider flow with the same isolation as `run`
    pub async fn isolate(&self, job: ProviderJob) -> Vec<NormalizedRecord> {
        let source = job.source.clone();
        let report = self.run(vec![job]).await;
        report.get(&source).map(<[_]>::to_vec).unwrap_or_default()
    }
}
