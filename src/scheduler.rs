use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{ReconError, Result};

/// Result of one domain's pipeline.
#[derive(Debug)]
pub struct DomainOutcome<T> {
    pub domain: String,
    pub result: Result<T>,
}

/// Bounded fan-out over a domain list: at most `limit` pipelines run at once.
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Scheduler {
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            completed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run `job` once per domain and wait for all of them. Per-domain errors
    /// are logged and returned in the outcomes, never propagated.
    pub async fn run<T, F, Fut>(&self, domains: Vec<String>, job: F) -> Vec<DomainOutcome<T>>
    where
        F: Fn(String) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let mut futures = FuturesUnordered::new();
        let mut outcomes = Vec::with_capacity(domains.len());

        for domain in domains {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    outcomes.push(DomainOutcome { domain, result: Err(ReconError::stage_io("scheduler", e)) });
                    continue;
                }
            };
            let job = job.clone();
            let running = self.running.clone();
            let peak = self.peak.clone();
            let task_domain = domain.clone();

            let handle = tokio::spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                let result = job(task_domain).await;
                running.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
                result
            });
            futures.push(async move { (domain, handle.await) });
        }

        while let Some((domain, joined)) = futures.next().await {
            let result = joined.unwrap_or_else(|e| Err(ReconError::stage_io("pipeline", e)));
            match &result {
                Ok(_) => {
                    self.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(domain = %domain, error = %e, "domain failed");
                    eprintln!("[!] {}: {}", domain, e);
                }
            }
            outcomes.push(DomainOutcome { domain, result });
        }
        outcomes
    }

    /// Highest number of pipelines observed running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// (completed, failed)
    pub fn stats(&self) -> (usize, usize) {
        (self.completed.load(Ordering::Relaxed), self.failed.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_limit_still_admits_one() {
        let scheduler = Scheduler::new(0);
        let out = scheduler.run(vec!["a.com".into()], |d: String| async move { Ok(d.len()) }).await;
        assert_eq!(out.len(), 1);
        assert_eq!(scheduler.stats(), (1, 0));
        assert_eq!(scheduler.peak(), 1);
    }
}
