#![cfg(all(unix, feature = "tokio"))]

use std::sync::mpsc;
use std::time::Duration;

use lirc_events::{listen_async, Dispatcher, ListenerConfig, ListenerError};
use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;

#[tokio::test]
async fn dispatches_until_peer_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lircd");
    let daemon = UnixListener::bind(&path).unwrap();

    let (tx, rx) = mpsc::channel();
    let handler = Dispatcher::builder()
        .throttle(2)
        .on("KEY_UP", move |ev| {
            let _ = tx.send(ev.repeat_count.clone());
        })
        .build();

    let task = tokio::spawn(listen_async(ListenerConfig::new(&path), handler));

    let (mut client, _) = daemon.accept().await.unwrap();
    client
        .write_all(b"1 00 KEY_UP rc\n1 01 KEY_UP rc\n1 02 KEY_")
        .await
        .unwrap();
    client.write_all(b"UP rc\n").await.unwrap();
    drop(client);

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("listener finished")
        .unwrap();
    assert!(result.is_ok());

    let counts: Vec<String> = rx.try_iter().collect();
    assert_eq!(counts, vec!["00", "02"]);
}

#[tokio::test]
async fn missing_socket_is_a_connect_error() {
    let dir = tempfile::tempdir().unwrap();
    let handler = Dispatcher::builder().build();
    let err = listen_async(ListenerConfig::new(dir.path().join("absent")), handler)
        .await
        .unwrap_err();
    assert!(matches!(err, ListenerError::Connect { .. }));
}
