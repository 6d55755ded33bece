// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio::io::BufReader;

use super::*;

#[tokio::test]
async fn reads_one_request_per_line() {
    let input = b"{\"cmd\":\"ping\"}\n{\"cmd\":\"list\"}\n".to_vec();
    let mut reader = BufReader::new(&input[..]);
    let first = read_request(&mut reader, Duration::from_secs(1)).await.unwrap();
    assert_eq!(first, Request::Ping);
    let second = read_request(&mut reader, Duration::from_secs(1)).await.unwrap();
    assert_eq!(second, Request::List);
}

#[tokio::test]
async fn empty_input_reports_connection_closed() {
    let input: Vec<u8> = Vec::new();
    let mut reader = BufReader::new(&input[..]);
    let err = read_request(&mut reader, Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn malformed_json_is_reported_without_consuming_the_next_line() {
    let input = b"not json\n{\"cmd\":\"ping\"}\n".to_vec();
    let mut reader = BufReader::new(&input[..]);
    let err = read_request(&mut reader, Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Json(_)));
    let next = read_request(&mut reader, Duration::from_secs(1)).await.unwrap();
    assert_eq!(next, Request::Ping);
}

#[tokio::test]
async fn write_response_appends_a_single_newline() {
    let mut buf: Vec<u8> = Vec::new();
    write_response(&mut buf, &Response::ok_empty(), Duration::from_secs(1)).await.unwrap();
    assert_eq!(buf, b"{\"ok\":true}\n");
}
