//! Integration tests for trigger sources
//!
//! These tests exercise the real timer, network and filesystem triggers:
//! - event delivery and ordering per producer
//! - cancellation closing the output channel
//! - capability enforcement

mod common;

use common::channel_helpers::{collect_events, drain_until_closed};
use common::test_timeout;
use edgeflow::host::{Capabilities, Host};
use edgeflow::trigger::{FsEventKind, FsWatcher, NetListener, NetProtocol, Timer, TriggerError};
use std::io::Write;
use std::net::{TcpStream, UdpSocket};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Replace `path` in one step so a poll never sees a half-written file.
fn replace_file(path: &Path, contents: &[u8]) {
    let staging = path.with_extension("staging");
    std::fs::write(&staging, contents).unwrap();
    std::fs::rename(&staging, path).unwrap();
}

#[test]
fn test_timer_events_are_monotonic() {
    let timer = Timer::start(&Host::default(), Duration::from_millis(10)).unwrap();
    let events = collect_events(timer.events(), 5, test_timeout());
    let rx = timer.events().clone();
    timer.stop();

    assert_eq!(events.len(), 5);
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(events.iter().all(|e| e.value == e.timestamp));
    assert!(drain_until_closed(&rx, test_timeout()).is_some());
}

#[test]
fn test_timer_cancel_from_other_thread() {
    let timer = Timer::start(&Host::default(), Duration::from_millis(5)).unwrap();
    let cancel = timer.canceller();
    let rx = timer.events().clone();

    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        cancel.cancel();
    });
    t.join().unwrap();

    assert!(drain_until_closed(&rx, test_timeout()).is_some());
    timer.stop();
}

#[test]
fn test_udp_multiple_datagrams_in_order() {
    let listener = NetListener::listen(&Host::default(), NetProtocol::Udp, "127.0.0.1", 0).unwrap();
    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    for msg in ["one", "two", "three"] {
        client.send_to(msg.as_bytes(), listener.local_addr()).unwrap();
    }

    let events = collect_events(listener.events(), 3, test_timeout());
    let payloads: Vec<_> = events.iter().map(|e| e.value.payload.clone()).collect();
    assert_eq!(payloads, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    assert!(events.iter().all(|e| e.value.remote_host == "127.0.0.1"));
    listener.close();
}

#[test]
fn test_tcp_close_joins_open_connections() {
    let listener = NetListener::listen(&Host::default(), NetProtocol::Tcp, "127.0.0.1", 0).unwrap();
    let addr = listener.local_addr();

    let mut a = TcpStream::connect(&addr).unwrap();
    let mut b = TcpStream::connect(&addr).unwrap();
    a.write_all(b"from-a").unwrap();
    b.write_all(b"from-b").unwrap();

    let mut payloads: Vec<_> = collect_events(listener.events(), 2, test_timeout())
        .into_iter()
        .map(|e| e.value.payload)
        .collect();
    payloads.sort();
    assert_eq!(payloads, vec![b"from-a".to_vec(), b"from-b".to_vec()]);
    assert!(common::wait_until(test_timeout(), || listener.open_connections() == 2));

    // Clients stay connected; close must still return.
    let rx = listener.events().clone();
    listener.close();
    assert_eq!(listener.open_connections(), 0);
    assert_eq!(drain_until_closed(&rx, test_timeout()), Some(0));
}

#[test]
fn test_net_denied_without_capability() {
    let host = Host::new(Capabilities::deny_all());
    for proto in [NetProtocol::Tcp, NetProtocol::Udp] {
        let err = NetListener::listen(&host, proto, "127.0.0.1", 0).err().unwrap();
        assert!(err.is_capability_denied(), "{proto}: {err}");
    }
    // ICMP is unsupported regardless of policy.
    let err = NetListener::listen(&host, NetProtocol::Icmp, "127.0.0.1", 0)
        .err()
        .unwrap();
    assert!(matches!(err, TriggerError::NotImplemented(_)), "{err}");
}

#[test]
fn test_timer_denied_without_device() {
    let host = Host::new(Capabilities {
        allow_device: false,
        ..Capabilities::allow_all()
    });
    assert!(Timer::start(&host, Duration::from_millis(5))
        .err()
        .unwrap()
        .is_capability_denied());
}

#[test]
fn test_watcher_create_modify_remove() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watched.txt");

    let watcher = FsWatcher::watch(&Host::default(), &path, Duration::from_millis(10)).unwrap();

    replace_file(&path, b"a");
    let created = collect_events(watcher.events(), 1, test_timeout());
    assert_eq!(created[0].value.kind, FsEventKind::Create);
    assert_eq!(created[0].value.size, Some(1));

    replace_file(&path, b"abcdef");
    let modified = collect_events(watcher.events(), 1, test_timeout());
    assert_eq!(modified[0].value.kind, FsEventKind::Modify);
    assert_eq!(modified[0].value.size, Some(6));

    std::fs::remove_file(&path).unwrap();
    let removed = collect_events(watcher.events(), 1, test_timeout());
    assert_eq!(removed[0].value.kind, FsEventKind::Remove);
    assert_eq!(removed[0].value.size, None);
    assert_eq!(removed[0].value.path, path);

    let rx = watcher.events().clone();
    watcher.stop();
    assert_eq!(drain_until_closed(&rx, test_timeout()), Some(0));
}

#[test]
fn test_watcher_existing_file_is_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("present.txt");
    std::fs::write(&path, b"x").unwrap();

    let watcher = FsWatcher::watch(&Host::default(), &path, Duration::from_millis(10)).unwrap();
    assert!(collect_events(watcher.events(), 1, Duration::from_millis(80)).is_empty());
    watcher.stop();
}

#[test]
fn test_watcher_denied_without_fs() {
    let host = Host::new(Capabilities {
        allow_fs: false,
        ..Capabilities::allow_all()
    });
    let dir = tempfile::tempdir().unwrap();
    assert!(FsWatcher::watch(&host, dir.path(), Duration::from_millis(10))
        .err()
        .unwrap()
        .is_capability_denied());
}
