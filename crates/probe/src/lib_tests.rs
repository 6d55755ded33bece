// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use zpm_core::config::ProbeKind;

fn probe(kind: ProbeKind) -> ProbeConfig {
    ProbeConfig {
        kind,
        interval_secs: 1,
        timeout_secs: 1,
        failure_threshold: 3,
    }
}

#[tokio::test]
async fn tcp_probe_succeeds_against_a_listening_port() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = listener.accept().await;
    });

    let cfg = probe(ProbeKind::Tcp {
        host: "127.0.0.1".to_string(),
        port,
    });
    assert!(check(&cfg).await);
}

#[tokio::test]
async fn tcp_probe_fails_against_a_closed_port() {
    let cfg = probe(ProbeKind::Tcp {
        host: "127.0.0.1".to_string(),
        port: 1, // reserved, nothing listens here in CI sandboxes
    });
    assert!(!check(&cfg).await);
}

#[tokio::test]
async fn exec_probe_reflects_exit_code() {
    let alive = probe(ProbeKind::Exec {
        command: "true".to_string(),
    });
    assert!(check(&alive).await);

    let dead = probe(ProbeKind::Exec {
        command: "false".to_string(),
    });
    assert!(!check(&dead).await);
}

#[tokio::test]
async fn exec_probe_times_out_on_a_slow_command() {
    let mut cfg = probe(ProbeKind::Exec {
        command: "sleep 5".to_string(),
    });
    cfg.timeout_secs = 0;
    assert!(!check(&cfg).await);
}
