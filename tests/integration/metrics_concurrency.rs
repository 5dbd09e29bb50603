//! Concurrent recording tests.
//!
//! Every family is hammered from several threads; the final counters must
//! equal the number of recorded events.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::thread;

use agent_orchestrator::metrics::MetricsAggregator;

const THREADS: usize = 8;
const EVENTS_PER_THREAD: usize = 1000;

fn hammer<F>(metrics: &Arc<MetricsAggregator>, record: F)
where
    F: Fn(&MetricsAggregator, usize, usize) + Send + Sync + Copy + 'static,
{
    let handles: Vec<_> = (0..THREADS)
        .map(|thread_id| {
            let metrics = Arc::clone(metrics);
            thread::spawn(move || {
                for i in 0..EVENTS_PER_THREAD {
                    record(metrics.as_ref(), thread_id, i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_no_lost_task_creations() {
    let metrics = Arc::new(MetricsAggregator::new());

    hammer(&metrics, |m, _, _| m.record_task_created());

    let tasks = metrics.tasks();
    assert_eq!(tasks.total_tasks, (THREADS * EVENTS_PER_THREAD) as u64);
    assert_eq!(tasks.pending_tasks, tasks.total_tasks);
}

#[test]
fn test_full_lifecycle_stays_balanced() {
    let metrics = Arc::new(MetricsAggregator::new());

    hammer(&metrics, |m, _, i| {
        m.record_task_created();
        m.record_task_started();
        match i % 3 {
            0 => m.record_task_completed(0.5),
            1 => m.record_task_failed(),
            _ => m.record_task_cancelled(),
        }
    });

    let tasks = metrics.tasks();
    let total = (THREADS * EVENTS_PER_THREAD) as u64;
    assert_eq!(tasks.total_tasks, total);
    assert_eq!(tasks.pending_tasks, 0);
    assert_eq!(tasks.in_progress_tasks, 0);
    assert_eq!(
        tasks.completed_tasks + tasks.failed_tasks + tasks.cancelled_tasks,
        total
    );
    assert!(tasks.is_consistent());
    assert!((tasks.average_duration - 0.5).abs() < 1e-9);
}

#[test]
fn test_per_agent_counts_under_contention() {
    let metrics = Arc::new(MetricsAggregator::new());

    hammer(&metrics, |m, thread_id, _| {
        let agent_id = format!("agent-{}", thread_id % 2);
        m.record_agent_task_completion(&agent_id, "coder", 1.0, true);
        m.record_agent_tokens(&agent_id, 10, 0.001);
    });

    let agents = metrics.agents();
    assert_eq!(agents.len(), 2);
    let per_agent = (THREADS / 2 * EVENTS_PER_THREAD) as u64;
    for agent in agents.values() {
        assert_eq!(agent.tasks_completed, per_agent);
        assert_eq!(agent.tokens_used, per_agent * 10);
        assert_eq!(agent.api_calls, per_agent);
        assert!((agent.average_execution_time - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_costs_and_series_under_contention() {
    let metrics = Arc::new(MetricsAggregator::new());

    hammer(&metrics, |m, thread_id, i| {
        m.record_cost(0.25, None, Some("model-a"), 1);
        m.record_metric("latency", (thread_id * EVENTS_PER_THREAD + i) as f64, None);
        m.record_library_usage("tool", "search");
    });

    let total = THREADS * EVENTS_PER_THREAD;
    let costs = metrics.costs();
    assert_eq!(costs.api_calls, total as u64);
    assert_eq!(costs.tokens_used, total as u64);
    assert!((costs.total_cost_usd - 0.25 * total as f64).abs() < 1e-6);
    assert!((costs.cost_by_model["model-a"] - costs.total_cost_usd).abs() < 1e-6);
    assert_eq!(metrics.metric("latency").len(), total);
    assert_eq!(metrics.library().tools_used, total as u64);
}

#[test]
fn test_summary_while_recording() {
    let metrics = Arc::new(MetricsAggregator::new());

    let reader = {
        let metrics = Arc::clone(&metrics);
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..200 {
                let total = metrics.summary().tasks.total_tasks;
                assert!(total >= last, "counter went backwards");
                last = total;
            }
        })
    };
    hammer(&metrics, |m, _, _| m.record_task_created());
    reader.join().unwrap();

    assert_eq!(
        metrics.tasks().total_tasks,
        (THREADS * EVENTS_PER_THREAD) as u64
    );
}

#[test]
fn test_reset_under_contention_leaves_valid_state() {
    let metrics = Arc::new(MetricsAggregator::new());

    let resetter = {
        let metrics = Arc::clone(&metrics);
        thread::spawn(move || {
            for _ in 0..50 {
                metrics.reset();
            }
        })
    };
    hammer(&metrics, |m, _, _| m.record_task_created());
    resetter.join().unwrap();

    let tasks = metrics.tasks();
    assert!(tasks.total_tasks <= (THREADS * EVENTS_PER_THREAD) as u64);
    assert_eq!(tasks.pending_tasks, tasks.total_tasks);
}
