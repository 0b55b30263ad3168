// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

use clap::Parser;
use log::{error, info};
use oxidestation::config::Config;
use oxidestation::core::bus::Bus;
use oxidestation::core::cdrom::disc::Disc;
use oxidestation::core::error::Result;
use oxidestation::core::loader::Executable;
use oxidestation::frontend::{spawn_emulation_thread, EmulationContext};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// PlayStation (PSX) emulator core runner
#[derive(Parser)]
#[command(name = "oxidestation")]
#[command(about = "PlayStation emulator", long_about = None)]
struct Args {
    /// Path to the PlayStation BIOS image (e.g. SCPH1001.BIN)
    bios: Option<PathBuf>,

    /// Game image: a raw .bin disc or a PS-X .exe
    #[arg(short, long)]
    game: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = "oxidestation.toml")]
    config: PathBuf,

    /// Number of frames to emulate before exiting
    #[arg(short = 'n', long, default_value = "600")]
    frames: u64,

    /// Disable frame pacing (run as fast as possible)
    #[arg(long)]
    no_pacing: bool,
}

/// Build the console from the resolved configuration
fn build_bus(bios: PathBuf, game: Option<PathBuf>) -> Result<Bus> {
    let mut bus = Bus::new();
    bus.reset();
    bus.load_bios(&bios)?;

    if let Some(game) = game {
        let extension = game
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "exe" => {
                let data = std::fs::read(&game)?;
                let executable = Executable::parse(&data)?;
                bus.load_executable(&executable)?;
            }
            _ => {
                let disc = Disc::from_bin(&game)?;
                bus.insert_disc(disc);
            }
        }
    }

    Ok(bus)
}

fn main() -> Result<()> {
    // Pick up RUST_LOG and friends from a local .env first
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("oxidestation v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = Config::load_or_default(&args.config);

    let bios = args.bios.unwrap_or(config.bios);
    let game = args.game.or(config.game);
    let frame_pacing = config.frame_pacing && !args.no_pacing;

    info!("BIOS: {}", bios.display());
    if let Some(game) = &game {
        info!("game: {}", game.display());
    }

    let context = Arc::new(EmulationContext::new(frame_pacing));
    let handle = spawn_emulation_thread(move || build_bus(bios, game), context.clone());

    // Headless presentation loop: drain frames until the budget is spent.
    // A windowed frontend would blit each frame and poll input here.
    let mut frames_seen = 0u64;
    while frames_seen < args.frames {
        match context.mailbox.wait_for_frame(Duration::from_millis(500)) {
            Some(frame) => {
                frames_seen = frame.number;
                if frames_seen % 60 == 0 {
                    info!(
                        "frame {} ({}x{} display)",
                        frame.number, frame.display.width, frame.display.height,
                    );
                }
            }
            None => {
                // Bounded wait: check whether the emulation thread died
                if handle.is_finished() {
                    break;
                }
            }
        }
    }

    context.stop();
    match handle.join() {
        Ok(Ok(())) => info!("emulation finished after {} frames", frames_seen),
        Ok(Err(e)) => {
            error!("emulation failed: {e}");
            return Err(e);
        }
        Err(_) => error!("emulation thread panicked"),
    }

    Ok(())
}
