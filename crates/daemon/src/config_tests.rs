// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serial_test::serial;

use super::*;

#[test]
fn rooted_at_derives_every_path_from_one_directory() {
    let cfg = Config::rooted_at("test-ns".to_string(), PathBuf::from("/tmp/zpm-test"));
    assert_eq!(cfg.socket_path, PathBuf::from("/tmp/zpm-test/test-ns.sock"));
    assert_eq!(cfg.pid_path, PathBuf::from("/tmp/zpm-test/test-ns.pid"));
    assert_eq!(
        cfg.snapshot_path,
        PathBuf::from("/tmp/zpm-test/snapshot.json")
    );
    assert_eq!(cfg.log_dir, PathBuf::from("/tmp/zpm-test/logs"));
}

#[test]
#[serial]
fn rooted_at_reads_dev_mode_from_node_env() {
    std::env::set_var("NODE_ENV", "production");
    let cfg = Config::rooted_at("test-ns".to_string(), PathBuf::from("/tmp/zpm-test"));
    assert!(!cfg.dev_mode);
    std::env::remove_var("NODE_ENV");

    let cfg = Config::rooted_at("test-ns".to_string(), PathBuf::from("/tmp/zpm-test"));
    assert!(cfg.dev_mode);
}
