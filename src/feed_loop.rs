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

//! Owning worker for the SBS feed.
//!
//! Runs on a blocking thread: connects, polls, sweeps stale aircraft on an
//! interval and reconnects after a delay when the feed drops. The aircraft
//! table and its observer survive reconnects.

use std::io::Read;
use std::time::{Duration, Instant};

use adsb_core::{AircraftObserver, AircraftTracker, Feed, FeedConfig, FeedError, Listener};
use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// How often stale aircraft are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Connection and timing settings for [`run`].
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub host: String,
    pub port: u16,
    pub feed: FeedConfig,
    pub reconnect_delay: Duration,
    pub aircraft_timeout: chrono::Duration,
    pub sweep_interval: Duration,
}

impl From<&AppConfig> for FeedSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            host: config.feed_host.clone(),
            port: config.feed_port,
            feed: config.feed_config(),
            reconnect_delay: config.reconnect_delay(),
            aircraft_timeout: chrono::Duration::from_std(config.aircraft_timeout())
                .unwrap_or(chrono::Duration::MAX),
            sweep_interval: SWEEP_INTERVAL,
        }
    }
}

enum ReconnectReason {
    ConnectionClosed,
    Cancelled,
}

/// Drive the feed until `cancel` fires.
///
/// `runtime` is only used to wait out the reconnect delay, so cancellation
/// cuts it short.
pub fn run(
    settings: &FeedSettings,
    observer: impl AircraftObserver + 'static,
    cancel: &CancellationToken,
    runtime: &Handle,
) {
    let mut tracker = AircraftTracker::new();
    tracker.set_observer(observer);

    loop {
        if cancel.is_cancelled() {
            info!("Feed loop cancelled");
            return;
        }

        match Feed::connect(&settings.host, settings.port, &settings.feed) {
            Ok(feed) => {
                let mut listener = Listener::with_tracker(feed, tracker);
                let result = process(&mut listener, settings, cancel);
                tracker = listener.into_tracker();

                match result {
                    Ok(ReconnectReason::ConnectionClosed) => {
                        info!("Connection closed by server");
                    }
                    Ok(ReconnectReason::Cancelled) => {
                        info!("Feed loop cancelled");
                        return;
                    }
                    Err(e) => error!("Connection error: {e}"),
                }
            }
            Err(e) => error!("{e}"),
        }

        warn!(
            "Reconnecting in {} seconds...",
            settings.reconnect_delay.as_secs()
        );
        let cancelled = runtime.block_on(async {
            tokio::select! {
                () = tokio::time::sleep(settings.reconnect_delay) => false,
                () = cancel.cancelled() => true,
            }
        });
        if cancelled {
            info!("Feed loop cancelled");
            return;
        }
    }
}

fn process<R: Read>(
    listener: &mut Listener<R>,
    settings: &FeedSettings,
    cancel: &CancellationToken,
) -> Result<ReconnectReason, FeedError> {
    let mut last_sweep = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Ok(ReconnectReason::Cancelled);
        }

        match listener.poll() {
            Ok(stats) => {
                if stats.dropped > 0 {
                    debug!("Dropped {} framing mismatches", stats.dropped);
                }
            }
            Err(FeedError::Closed) => return Ok(ReconnectReason::ConnectionClosed),
            Err(e) => return Err(e),
        }

        if last_sweep.elapsed() >= settings.sweep_interval {
            let removed = listener.expire(Utc::now() - settings.aircraft_timeout);
            if !removed.is_empty() {
                debug!("Removed stale aircraft: {}", removed.join(", "));
            }
            last_sweep = Instant::now();
        }
    }
}
