// Export modules for testing
pub mod about;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod luci10;
pub mod state;
pub mod ui;
pub mod util;
pub mod watcher;

// Re-export main types
pub use crate::config::ConfigData;
pub use crate::device::{DeviceEntry, DeviceList};
pub use crate::dispatch::{Action, Session};
pub use crate::driver::{DeviceIndex, DriverFault, DriverResult, LuciDriver, Pin};
pub use crate::error::DriverError;
pub use crate::luci10::Luci10Library;
pub use crate::state::State;
pub use crate::watcher::DeviceWatcher;

// Constants
pub const PROGRAM_TITLE: &str = "LUCI Control";
pub const INITIAL_WIDTH: f32 = 560.0;
pub const INITIAL_HEIGHT: f32 = 420.0;

// Args struct for command line parsing
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path of the LUCI-10 driver library, overrides the config file
    #[arg(short, long)]
    pub driver: Option<PathBuf>,

    /// Milliseconds between scans for attached interfaces, 0 disables
    #[arg(short, long)]
    pub poll_interval: Option<u64>,
}

// The main application struct
pub struct LuciControl<D> {
    pub state: State,
    pub session: Session<D>,
    pub watcher: DeviceWatcher,
}

impl<D: LuciDriver> LuciControl<D> {
    pub fn new(driver: D, poll_interval_ms: u64) -> Self {
        Self {
            state: State::Initialising,
            session: Session::new(driver),
            watcher: DeviceWatcher::new(poll_interval_ms),
        }
    }

    // Initialization logic called once at the start
    pub fn init(&mut self) {
        self.session.on_startup();
        self.state = State::Running;
        log::info!("Initialization complete. State set to Running.");
    }
}
