// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clack::audio;
use clack::cancel::CancelHandle;
use clack::config::Settings;
use clack::listener::terminal;
use clack::session::{Controls, Session};
use clack::sprite;
use clack::store::ProfileStore;
use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Mechanical keyboard sounds from sprite-sheet sound profiles."
)]
struct Cli {
    /// Settings file (YAML). CLACK_ environment variables override it.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plays keyboard sounds for keys typed into this terminal until Ctrl+C.
    Start {
        /// Volume between 0.0 and 1.0.
        #[clap(long)]
        volume: Option<f32>,

        /// Logs every keystroke and its mapping.
        #[clap(long)]
        debug: bool,

        /// Selects this profile before starting.
        #[clap(long)]
        profile: Option<String>,
    },
    /// Lists the stored profiles.
    Profiles {},
    /// Adds a profile folder containing sound.ogg and config.json.
    Add {
        /// The name of the profile.
        name: String,
        /// The profile folder.
        folder: PathBuf,
    },
    /// Removes a stored profile.
    Remove {
        /// The name of the profile.
        name: String,
    },
    /// Selects the profile to use.
    Select {
        /// The name of the profile.
        name: String,
    },
    /// Loads a profile folder and prints what it contains.
    Verify {
        /// The profile folder.
        folder: PathBuf,
    },
    /// Lists the available audio output devices.
    Devices {},
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Start {
            volume,
            debug,
            profile,
        } => {
            let settings = settings.with_overrides(volume, debug)?;
            init_tracing(settings.debug());

            let store = ProfileStore::load(settings.state_file())?;
            let output = audio::Output::start(settings.audio())?;
            let quit = CancelHandle::new();
            let session = Session::new(
                store,
                output.scheduler(),
                Arc::new(terminal::Driver::new(quit.clone())),
                Arc::new(Controls::new(settings.volume(), settings.debug())),
                settings.event_queue(),
            );

            if let Some(profile) = profile {
                session.switch_profile(&profile).await?;
            }
            session.enable().await?;
            if let Some(snapshot) = session.current() {
                println!(
                    "Playing {} on {}. Press Ctrl+C to stop.\r",
                    snapshot.name(),
                    output.device()
                );
            }

            let waiter = quit.clone();
            tokio::task::spawn_blocking(move || waiter.wait()).await?;
            session.disable().await;
        }
        Commands::Profiles {} => {
            init_tracing(settings.debug());
            let store = ProfileStore::load(settings.state_file())?;
            let profiles = store.list();
            if profiles.is_empty() {
                println!("No profiles found.");
                return Ok(());
            }

            let selected = store.selected();
            println!("Profiles:");
            for (name, folder) in profiles {
                let marker = if Some(name) == selected { "*" } else { " " };
                match folder {
                    Some(folder) => println!("{} {} ({})", marker, name, folder.display()),
                    None => println!("{} {} (unrecognized entry)", marker, name),
                }
            }
        }
        Commands::Add { name, folder } => {
            init_tracing(settings.debug());
            let mut store = ProfileStore::load(settings.state_file())?;
            store.add(&name, &folder)?;
            println!("Added profile {} from {}.", name.trim(), folder.display());
        }
        Commands::Remove { name } => {
            init_tracing(settings.debug());
            let mut store = ProfileStore::load(settings.state_file())?;
            store.remove(&name)?;
            println!("Removed profile {}.", name);
        }
        Commands::Select { name } => {
            init_tracing(settings.debug());
            let mut store = ProfileStore::load(settings.state_file())?;
            store.select(&name)?;
            println!("Selected profile {}.", name);
        }
        Commands::Verify { folder } => {
            init_tracing(settings.debug());
            let snapshot = sprite::load_folder(&folder)?;
            let waveform = snapshot.waveform();

            println!("Profile: {}", snapshot.name());
            println!("Keys: {}", snapshot.index().len());
            println!(
                "Audio: {} channel(s), {} Hz, {} frames ({:.2}s)",
                waveform.channels(),
                waveform.sample_rate(),
                waveform.frames(),
                waveform.duration().as_secs_f64()
            );
            println!("Sample mappings:");
            for (key, entry) in snapshot.summary() {
                println!(
                    "- {}: start {}ms, duration {}ms",
                    key,
                    entry.start_ms(),
                    entry.duration_ms()
                );
            }
        }
        Commands::Devices {} => {
            init_tracing(settings.debug());
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    }

    Ok(())
}
