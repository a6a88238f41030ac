use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sparky::error::ReconError;
use sparky::scheduler::Scheduler;

#[tokio::test]
async fn never_exceeds_the_limit_and_runs_each_domain_once() {
    let scheduler = Scheduler::new(2);
    let live = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let runs: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));

    let domains: Vec<String> = (0..6).map(|i| format!("d{}.com", i)).collect();
    let (l, m, r) = (live.clone(), max_seen.clone(), runs.clone());
    let outcomes = scheduler
        .run(domains.clone(), move |domain| {
            let (live, max_seen, runs) = (l.clone(), m.clone(), r.clone());
            async move {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                *runs.lock().entry(domain.clone()).or_insert(0) += 1;
                live.fetch_sub(1, Ordering::SeqCst);
                Ok(domain)
            }
        })
        .await;

    assert_eq!(outcomes.len(), 6);
    assert!(max_seen.load(Ordering::SeqCst) <= 2);
    assert!(scheduler.peak() <= 2);
    let runs = runs.lock();
    for d in &domains {
        assert_eq!(runs.get(d), Some(&1), "{} should run exactly once", d);
    }
    assert_eq!(scheduler.stats(), (6, 0));
}

#[tokio::test]
async fn one_failure_does_not_stop_the_others() {
    let scheduler = Scheduler::new(3);
    let domains = vec!["ok1.com".to_string(), "bad.com".to_string(), "ok2.com".to_string(), "ok3.com".to_string()];

    let outcomes = scheduler
        .run(domains, |domain: String| async move {
            if domain.starts_with("bad") {
                Err(ReconError::stage_io("crawl", "all crawlers failed"))
            } else {
                Ok(())
            }
        })
        .await;

    assert_eq!(outcomes.len(), 4);
    let failed: Vec<&str> = outcomes.iter().filter(|o| o.result.is_err()).map(|o| o.domain.as_str()).collect();
    assert_eq!(failed, vec!["bad.com"]);
    assert_eq!(scheduler.stats(), (3, 1));
}

#[tokio::test]
async fn panicking_pipeline_is_reported_as_failure() {
    let scheduler = Scheduler::new(1);
    let outcomes = scheduler
        .run(vec!["boom.com".to_string(), "fine.com".to_string()], |domain: String| async move {
            if domain == "boom.com" {
                panic!("pipeline bug");
            }
            Ok(domain)
        })
        .await;

    assert_eq!(outcomes.len(), 2);
    let boom = outcomes.iter().find(|o| o.domain == "boom.com").unwrap();
    assert!(matches!(boom.result, Err(ReconError::StageIo { stage: "pipeline", .. })));
    assert!(outcomes.iter().any(|o| o.domain == "fine.com" && o.result.is_ok()));
}
