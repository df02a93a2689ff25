//! Tests for the PcscTransport implementation
//!
//! These run against a real PC/SC service and skip when no reader or card
//! is attached.

mod common;

use std::thread;
use std::time::{Duration, Instant};
use tapwedge_apdu_core::{CardTransport, Command, Response, get_uid};
use tapwedge_apdu_transport_pcsc::event::card_event_channel;
use tapwedge_apdu_transport_pcsc::{PcscConfig, ShareMode};

#[test]
fn test_list_readers() {
    let Some(manager) = common::manager() else {
        println!("Skipping test, PC/SC not available");
        return;
    };

    match manager.list_readers() {
        Ok(readers) => {
            assert!(!readers.is_empty(), "Expected at least one reader");
            for reader in &readers {
                assert!(!reader.name().is_empty());
                if !reader.has_card() {
                    assert!(reader.atr().is_none());
                }
            }
        }
        Err(e) => println!("Could not list readers: {e:?}"),
    }
}

#[test]
fn test_open_reader_is_lazy() {
    let Some(manager) = common::manager() else {
        println!("Skipping test, PC/SC not available");
        return;
    };
    let Ok(reader) = manager.find_reader(common::READER_PATTERNS) else {
        println!("Skipping test, no ACR122U attached");
        return;
    };

    let config = PcscConfig::default().with_share_mode(ShareMode::Shared);
    let transport = manager
        .open_reader_with_config(reader.name(), config)
        .expect("open reader");
    assert_eq!(transport.reader_name(), reader.name());
    assert!(!transport.is_connected());
}

#[test]
fn test_get_uid_from_card() {
    let Some(mut transport) = common::get_test_transport() else {
        println!("Skipping test, no card available");
        return;
    };

    let raw = transport
        .transmit_raw(&Command::get_uid().to_bytes())
        .expect("transmit GET UID");
    let response = Response::try_from(raw).expect("parse response");
    println!("GET UID status: {}", response.status());

    if response.is_success() {
        let uid = get_uid(&mut transport).expect("read UID");
        assert!(!uid.is_empty());
        assert_eq!(uid.to_hex(), hex::encode_upper(uid.as_bytes()));
    }

    transport.disconnect();
    assert!(!transport.is_connected());
}

#[test]
fn test_unknown_reader_is_not_found() {
    let Some(manager) = common::manager() else {
        println!("Skipping test, PC/SC not available");
        return;
    };

    let result = manager.find_reader(&["no such reader 7f3a"]);
    assert!(result.is_err());
}

#[test]
fn test_running_monitor_does_not_stall_transmit() {
    let Some(manager) = common::manager() else {
        println!("Skipping test, PC/SC not available");
        return;
    };
    let Ok(reader) = manager.find_reader(common::READER_PATTERNS) else {
        println!("Skipping test, no ACR122U attached");
        return;
    };
    if !reader.has_card() {
        println!("Skipping test, no card available");
        return;
    }

    let monitor = manager.monitor().expect("create monitor");
    let (sender, _receiver) = card_event_channel();
    monitor.monitor_cards_channel(sender).expect("start monitor");
    // Give the monitor time to settle into a status wait
    thread::sleep(Duration::from_millis(300));

    let mut transport = manager.open_reader(reader.name()).expect("open reader");
    let started = Instant::now();
    let result = transport.transmit_raw(&Command::get_uid().to_bytes());
    let elapsed = started.elapsed();
    monitor.stop();

    assert!(result.is_ok(), "GET UID failed: {result:?}");
    assert!(
        elapsed < Duration::from_millis(500),
        "GET UID took {elapsed:?} while the monitor was waiting"
    );
}
