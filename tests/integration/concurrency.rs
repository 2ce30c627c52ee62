// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Many producers against one consumer

use crate::common::{fields, read_lines, start, stop};
use fractal_notify::{MemorySink, Notifier, NotifierService, NOTIFIER};
use std::collections::HashMap;
use std::sync::Arc;

const PRODUCERS: usize = 8;
const PER_PRODUCER: usize = 100;

fn by_sender(lines: &[String]) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for line in lines {
        let f = fields(line);
        grouped.entry(f[3].clone()).or_default().push(f[7].clone());
    }
    grouped
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_producer_order_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("many.log");
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .log_all(true)
            .capacity(4)
            .endpoint(log.as_path())
            .build(),
    );
    let handle = start(&notifier).await;

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let send = notifier.sender(format!("producer-{}", p));
            tokio::spawn(async move {
                for i in 0..PER_PRODUCER {
                    send.message(format!("{}", i)).await;
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }
    stop(&notifier, handle).await;

    let lines = read_lines(&log);
    assert_eq!(lines.len(), PRODUCERS * PER_PRODUCER + 1);
    assert_eq!(fields(lines.last().unwrap())[3], NOTIFIER);

    let grouped = by_sender(&lines);
    for p in 0..PRODUCERS {
        let got = &grouped[&format!("producer-{}", p)];
        let expected: Vec<String> = (0..PER_PRODUCER).map(|i| i.to_string()).collect();
        assert_eq!(got, &expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_policy_delivers_everything() {
    let memory = MemorySink::new();
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .log_all(true)
            .async_send(true)
            .capacity(2)
            .endpoint(memory.clone())
            .build(),
    );
    let service = NotifierService::start(Arc::clone(&notifier)).await.unwrap();

    let send = service.sender("fire-and-forget");
    for i in 0..50 {
        send.message(format!("{}", i)).await;
    }
    // detached submissions may still be in flight; wait until they land
    for _ in 0..400 {
        if memory.lines().len() >= 50 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    service.shutdown().await.unwrap();

    let grouped = by_sender(&memory.lines());
    let mut got: Vec<usize> = grouped["fire-and-forget"]
        .iter()
        .map(|m| m.parse().unwrap())
        .collect();
    got.sort_unstable();
    assert_eq!(got, (0..50).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_nothing_written_after_stop_line() {
    let memory = MemorySink::new();
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .log_all(true)
            .capacity(8)
            .endpoint(memory.clone())
            .build(),
    );
    let handle = start(&notifier).await;

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let send = notifier.sender(format!("racer-{}", p));
            tokio::spawn(async move {
                for i in 0..200 {
                    send.message(format!("{}", i)).await;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    stop(&notifier, handle).await;
    for producer in producers {
        producer.await.unwrap();
    }

    let lines = memory.lines();
    let last = fields(lines.last().unwrap());
    assert_eq!(last[3], NOTIFIER);
    assert!(last[7].contains("stopping"));
    assert_eq!(
        lines.iter().filter(|l| fields(l)[3] == NOTIFIER).count(),
        1
    );
}
