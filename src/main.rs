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

mod config;
mod feed_loop;
mod hud;

use clap::Parser;
use log::info;
use tokio_util::sync::CancellationToken;

use config::AppConfig;
use feed_loop::FeedSettings;
use hud::BearingReporter;

/// Print alt/az bearings to aircraft heard on an SBS/BaseStation feed.
#[derive(Parser, Debug)]
#[command(name = "adsb-hud", version, about)]
struct Args {
    /// Feed host
    #[arg(long)]
    host: Option<String>,

    /// Feed port
    #[arg(long)]
    port: Option<u16>,

    /// Observer latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Observer longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Observer altitude in metres
    #[arg(long, allow_negative_numbers = true)]
    alt: Option<f64>,

    /// Forget aircraft not heard from for this many seconds
    #[arg(long)]
    expire_secs: Option<u64>,

    /// Configuration name to load and save
    #[arg(long, default_value = "config")]
    config: String,

    /// Write the effective configuration back to disk
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.feed_host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.feed_port = port;
        }
        if let Some(lat) = self.lat {
            config.observer.latitude = lat;
        }
        if let Some(lon) = self.lon {
            config.observer.longitude = lon;
        }
        if let Some(alt) = self.alt {
            config.observer.altitude_m = alt;
        }
        if let Some(secs) = self.expire_secs {
            config.aircraft_timeout_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = AppConfig::load(&args.config)?;
    args.apply(&mut config);

    if args.save_config {
        config.save(&args.config)?;
        info!(
            "Saved configuration to {}",
            AppConfig::config_path(&args.config)?.display()
        );
    }

    let observer = config.observer.point();
    info!("Observer at {observer}");

    let settings = FeedSettings::from(&config);
    let reporter = BearingReporter::new(
        observer,
        config.report_interval(),
        config.aircraft_timeout(),
    );

    let cancel = CancellationToken::new();
    let worker = {
        let cancel = cancel.clone();
        let runtime = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || {
            feed_loop::run(&settings, reporter, &cancel, &runtime);
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    cancel.cancel();
    worker.await?;

    Ok(())
}
