// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Start, drain and stop a notifier writing to a real log file

use crate::common::{fields, read_lines, start, stop, wait_for_lines};
use fractal_notify::codes::{FAILED_ACTION, GENERAL_ERROR, SHOULD_NEVER_HAPPEN};
use fractal_notify::{
    fail, is_code, note, CodeEntry, MemorySink, Notifier, NotifierConfig, NotifyError, NOTIFIER,
};
use std::sync::Arc;

#[tokio::test]
async fn test_message_failure_then_stop_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("beacon.log");
    let notifier = Arc::new(
        Notifier::builder("beacon", "beacon_server_01")
            .log_all(true)
            .capacity(100)
            .endpoint(log.as_path())
            .build(),
    );
    let handle = start(&notifier).await;

    notifier.sender("main").message("hello").await;
    let err = notifier.failure("dispatcher").fail(FAILED_ACTION, "boom").await;
    assert!(is_code(FAILED_ACTION, &err));
    stop(&notifier, handle).await;

    let lines: Vec<Vec<String>> = read_lines(&log).iter().map(|l| fields(l)).collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0][1], "beacon");
    assert_eq!(lines[0][2], "beacon_server_01");
    assert_eq!(lines[0][3], "main");
    assert_eq!(lines[0][4], "MSG");
    assert_eq!(lines[0][5], "0");
    assert_eq!(lines[0][7], "hello");

    assert_eq!(lines[1][3], "dispatcher");
    assert_eq!(lines[1][4], "ERR");
    assert_eq!(lines[1][5], "3");
    assert_eq!(lines[1][6], "FailedAction");
    assert!(lines[1][7].starts_with("boom -> [lifecycle.rs: "));

    assert_eq!(lines[2][3], NOTIFIER);
    assert_eq!(lines[2][5], "0");
    assert!(lines[2][7].contains("stopping"));
}

#[tokio::test]
async fn test_backlog_before_run_is_written_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("backlog.log");
    let memory = MemorySink::new();
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .log_all(true)
            .endpoint(log.as_path())
            .endpoint(memory.clone())
            .build(),
    );

    let send = notifier.sender("early");
    for i in 0..50 {
        send.message(format!("record {}", i)).await;
    }
    assert!(read_lines(&log).is_empty());
    assert!(memory.lines().is_empty());

    let handle = start(&notifier).await;
    stop(&notifier, handle).await;

    let lines = read_lines(&log);
    assert_eq!(lines.len(), 51);
    for (i, line) in lines.iter().take(50).enumerate() {
        assert_eq!(fields(line)[7], format!("record {}", i));
    }
    assert!(fields(&lines[50])[7].contains("stopping"));

    // every endpoint sees the same records in the same order
    assert_eq!(memory.lines(), lines);
}

#[tokio::test]
async fn test_exit_without_run() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = Notifier::builder("svc", "inst")
        .endpoint(dir.path().join("idle.log"))
        .build();

    let err = notifier.exit().await.unwrap_err();
    assert!(matches!(err, NotifyError::NotRunning { .. }));
    assert!(err.to_string().starts_with("Notifier[svc][inst]"));
}

#[tokio::test]
async fn test_messages_skipped_unless_log_all() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("errors.log");
    let notifier = Arc::new(Notifier::builder("svc", "inst").endpoint(log.as_path()).build());
    let handle = start(&notifier).await;

    let send = notifier.sender("main");
    send.message("not written").await;
    let err = send.send(std::io::Error::other("written")).await.unwrap_err();
    assert!(is_code(GENERAL_ERROR, &err));
    stop(&notifier, handle).await;

    let lines = read_lines(&log);
    assert_eq!(lines.len(), 1);
    assert_eq!(fields(&lines[0])[5], "1");
    assert_eq!(fields(&lines[0])[7], "written");
}

#[tokio::test]
async fn test_unrecognized_value_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("odd.log");
    let notifier = Arc::new(Notifier::builder("svc", "inst").endpoint(log.as_path()).build());
    let handle = start(&notifier).await;

    #[derive(Debug)]
    struct Greeting {
        #[allow(dead_code)]
        greet: &'static str,
    }
    notifier
        .sender("main")
        .unrecognized(&Greeting { greet: "Hello" })
        .await;

    wait_for_lines(&log, 2).await;
    stop(&notifier, handle).await;

    let lines: Vec<Vec<String>> = read_lines(&log).iter().map(|l| fields(l)).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0][3], "main");
    assert_eq!(lines[0][5], SHOULD_NEVER_HAPPEN.to_string());
    assert_eq!(lines[0][7], "Unknown value used in send");

    let self_notes: Vec<&Vec<String>> = lines.iter().filter(|f| f[3] == NOTIFIER).collect();
    assert_eq!(self_notes.len(), 1);
    assert_eq!(self_notes[0][5], "999");
    assert!(self_notes[0][7].contains("Hello"));
}

#[tokio::test]
async fn test_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("json.log");
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .json(true)
            .endpoint(log.as_path())
            .build(),
    );
    let handle = start(&notifier).await;

    notifier.failure("worker").fail(404, "no such job").await;
    stop(&notifier, handle).await;

    let lines = read_lines(&log);
    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(value["Service"], "svc");
    assert_eq!(value["Instance"], "inst");
    assert_eq!(value["Sender"], "worker");
    assert_eq!(value["Level"], "ERR");
    assert_eq!(value["Code"], 404);
    assert_eq!(value["Status"], "HTTP-StatusNotFound");
    assert!(value["Message"]
        .as_str()
        .unwrap()
        .starts_with("no such job -> [lifecycle.rs: "));
}

#[tokio::test]
async fn test_custom_codes_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("custom.log");
    let config = NotifierConfig::parse(&format!(
        r#"{{
            service: "svc",
            instance: "inst",
            endpoints: ["{}"],
            codes: {{ "42": {{ severity: "WRN", label: "Answer" }} }},
        }}"#,
        log.display()
    ))
    .unwrap();
    let notifier = Arc::new(config.build(None).unwrap());

    // the replacement was spent at construction
    assert_eq!(
        notifier.set_codes([(43, CodeEntry::error("More"))]).await,
        Err(NotifyError::CodesAlreadyReplaced)
    );

    let handle = start(&notifier).await;
    notifier.failure("w").fail(42, "deep thought").await;
    wait_for_lines(&log, 2).await;
    stop(&notifier, handle).await;

    let lines: Vec<Vec<String>> = read_lines(&log).iter().map(|l| fields(l)).collect();
    let answer = lines.iter().find(|f| f[5] == "42").unwrap();
    assert_eq!(answer[4], "WRN");
    assert_eq!(answer[6], "Answer");
}

#[tokio::test]
async fn test_set_codes_after_start_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .endpoint(dir.path().join("locked.log"))
            .build(),
    );
    let handle = start(&notifier).await;

    assert_eq!(
        notifier.set_codes([(5, CodeEntry::error("Late"))]).await,
        Err(NotifyError::CodesLocked)
    );
    assert!(notifier.codes().lookup(5).is_none());
    stop(&notifier, handle).await;

    assert_eq!(
        notifier.set_codes([(5, CodeEntry::error("Later"))]).await,
        Err(NotifyError::CodesLocked)
    );
}

#[tokio::test]
async fn test_macros() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("macros.log");
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .log_all(true)
            .endpoint(log.as_path())
            .build(),
    );
    let handle = start(&notifier).await;

    let send = notifier.sender("main");
    let failure = notifier.failure("main");
    note!(send, "listening on port {}", 8080).await;
    let (pending, line) = (
        fail!(failure, FAILED_ACTION, "could not open {}", "jobs.db"),
        line!(),
    );
    let err = pending.await;
    let expected = format!("could not open jobs.db -> [lifecycle.rs: {}]", line);
    assert_eq!(err.message(), expected);
    stop(&notifier, handle).await;

    let lines = read_lines(&log);
    assert_eq!(fields(&lines[0])[7], "listening on port 8080");
    assert_eq!(fields(&lines[1])[7], expected);
}

#[tokio::test]
async fn test_failure_names_calling_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("origin.log");
    let notifier = Arc::new(Notifier::builder("svc", "inst").endpoint(log.as_path()).build());
    let handle = start(&notifier).await;

    let failure = notifier.failure("jobs");
    let (pending, line) = (failure.fail(FAILED_ACTION, "queue full"), line!());
    let err = pending.await;
    stop(&notifier, handle).await;

    let expected = format!("queue full -> [lifecycle.rs: {}]", line);
    assert_eq!(err.message(), expected);
    assert_eq!(err.to_string(), expected);
    let lines = read_lines(&log);
    assert_eq!(fields(&lines[0])[6], "FailedAction");
    assert_eq!(fields(&lines[0])[7], expected);
}

#[tokio::test]
async fn test_confirmed_send_is_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("barrier.log");
    let notifier = Arc::new(
        Notifier::builder("svc", "inst")
            .log_all(true)
            .endpoint(log.as_path())
            .build(),
    );
    let handle = start(&notifier).await;

    let send = notifier.sender("main");
    send.send_confirmed("written before returning").await.unwrap();
    let lines = read_lines(&log);
    assert_eq!(lines.len(), 1);
    assert_eq!(fields(&lines[0])[7], "written before returning");

    stop(&notifier, handle).await;
}
