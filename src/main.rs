#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use clap::Parser;
use eframe::egui;
use fast_config::Config;
use std::process::exit;

use luci_control::config::{self, ConfigData};
use luci_control::{Args, Luci10Library, LuciControl, INITIAL_HEIGHT, INITIAL_WIDTH, PROGRAM_TITLE};

// Application Entry Point
fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    log::info!("Starting {}", PROGRAM_TITLE);

    let config_path = config::config_path();
    let config = match Config::new(&config_path, ConfigData::default()) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("Error reading config file at {}: {}", config_path, e);
            exit(1)
        }
    };

    let driver_path = config.data.driver_path(args.driver.as_deref());
    let poll_interval = config.data.poll_interval(args.poll_interval);

    // Without the vendor library there is nothing to control
    let driver = match Luci10Library::load(&driver_path) {
        Ok(driver) => driver,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            exit(1)
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([INITIAL_WIDTH, INITIAL_HEIGHT])
            .with_title(PROGRAM_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        PROGRAM_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(LuciControl::new(driver, poll_interval)))),
    )
}
