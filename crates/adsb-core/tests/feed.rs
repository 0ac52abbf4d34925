// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::Write;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use adsb_core::{compute_bearing, Aircraft, EarthPoint, FeedConfig, FeedError, Listener};
use chrono::Utc;

const POSITION: &str = "MSG,3,1,1,ABCDEF,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,1234,,,37.5,-122.3,,,0,0,0,0\r\n";
const IDENT: &str = "MSG,1,1,1,ABCDEF,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,UAL123,,,,,,,,,,,0\r\n";

/// Serve `chunks` to the first client, pausing between writes, then close.
fn serve(chunks: Vec<String>) -> (u16, thread::JoinHandle<()>) {
    let server = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = server.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = server.accept().unwrap();
        for chunk in chunks {
            stream.write_all(chunk.as_bytes()).unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
        }
    });
    (port, handle)
}

fn poll_until_closed(listener: &mut Listener) -> usize {
    let mut dispatched = 0;
    loop {
        match listener.poll() {
            Ok(stats) => dispatched += stats.dispatched,
            Err(FeedError::Closed) => return dispatched,
            Err(e) => panic!("unexpected feed error: {e}"),
        }
    }
}

#[test]
fn test_lines_split_across_writes_are_delivered_in_order() {
    let split = POSITION.len() / 2;
    let (port, server) = serve(vec![
        IDENT.to_string(),
        POSITION[..split].to_string(),
        POSITION[split..].to_string(),
        "garbage without a marker\n".to_string(),
    ]);

    let mut listener = Listener::connect("127.0.0.1", port).unwrap();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    listener.set_observer(move |aircraft: &Aircraft| {
        sink.lock()
            .unwrap()
            .push((aircraft.flight.clone(), aircraft.latitude));
    });

    assert_eq!(poll_until_closed(&mut listener), 2);
    server.join().unwrap();

    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0], (Some("UAL123".to_string()), 0.0));
    assert_eq!(updates[1].0.as_deref(), Some("UAL123"));
    assert!((updates[1].1 - 37.5).abs() < 1e-9);
}

#[test]
fn test_scenario_decode_bearing_and_expire() {
    let (port, server) = serve(vec![POSITION.to_string()]);
    let mut listener = Listener::connect("127.0.0.1", port).unwrap();
    poll_until_closed(&mut listener);
    server.join().unwrap();

    let aircraft = listener.tracker().get("ABCDEF").unwrap().clone();
    assert!((aircraft.latitude - 37.5).abs() < 1e-9);
    assert!((aircraft.longitude - (-122.3)).abs() < 1e-9);
    assert!((aircraft.altitude - 1234.0).abs() < 1e-9);

    let observer = EarthPoint::from_degrees(37.4, -122.3, 10.0);
    let bearing = compute_bearing(
        &observer,
        aircraft.latitude,
        aircraft.longitude,
        aircraft.altitude,
        1_700_000_000.0,
    )
    .unwrap();
    assert!(bearing.range_km > 11.0 && bearing.range_km < 11.3);
    assert!(bearing.elevation_deg() > 0.0);

    let now = Utc::now();
    assert!(listener.expire(now - chrono::Duration::seconds(1)).is_empty());
    assert_eq!(
        listener.expire(now + chrono::Duration::seconds(100_000)),
        vec!["ABCDEF".to_string()]
    );
    assert!(listener.tracker().is_empty());
}

#[test]
fn test_read_deadline_returns_without_lines() {
    let server = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = server.local_addr().unwrap().port();
    let config = FeedConfig {
        read_timeout: Some(Duration::from_millis(50)),
        ..FeedConfig::default()
    };

    let mut listener = Listener::connect_with("127.0.0.1", port, &config).unwrap();
    let (_stream, _) = server.accept().unwrap();

    let stats = listener.poll().unwrap();
    assert_eq!(stats.lines, 0);
}

#[test]
fn test_refused_connection_is_connect_error() {
    let port = {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        server.local_addr().unwrap().port()
    };

    let err = Listener::connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, FeedError::Connect { .. }), "{err}");
}
