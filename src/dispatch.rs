use crate::device::DeviceList;
use crate::driver::{status_code, DeviceIndex, DriverResult, LuciDriver, Pin};
use crate::util::{format_hex, format_hex_byte, pack_output_byte, parse_hex_id, ERROR_TEXT};
use crate::watcher::DeviceWatcher;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::time::Instant;

// Operator actions, one driver call each
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    WriteOutputs, // An output toggle changed
    ReadId,
    WriteId,
    TestPin(Pin),
    FirmwareUpdate,
    LedOn,
    LedOff,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Action::WriteOutputs => write!(f, "Write outputs"),
            Action::ReadId => write!(f, "Read ID"),
            Action::WriteId => write!(f, "Write ID"),
            Action::TestPin(pin) => write!(f, "Test {}", pin),
            Action::FirmwareUpdate => write!(f, "Firmware update"),
            Action::LedOn => write!(f, "LED on"),
            Action::LedOff => write!(f, "LED off"),
        }
    }
}

/// Text of every display field in the window.
///
/// `id` doubles as the input of [`Action::WriteId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub id: String,
    pub port_low: String,
    pub port_high: String,
    pub pin5: String,
    pub pin6: String,
    pub pin7: String,
}

impl Fields {
    pub fn pin(&self, pin: Pin) -> &str {
        match pin {
            Pin::P5 => &self.pin5,
            Pin::P6 => &self.pin6,
            Pin::P7 => &self.pin7,
        }
    }

    fn pin_mut(&mut self, pin: Pin) -> &mut String {
        match pin {
            Pin::P5 => &mut self.pin5,
            Pin::P6 => &mut self.pin6,
            Pin::P7 => &mut self.pin7,
        }
    }
}

/// The sixteen output toggles, outputs 0-7 in `low` and 8-15 in `high`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct OutputBanks {
    pub low: [bool; 8],
    pub high: [bool; 8],
}

impl OutputBanks {
    /// The `(low, high)` bytes currently selected by the toggles.
    pub fn bytes(&self) -> (u8, u8) {
        (pack_output_byte(&self.low), pack_output_byte(&self.high))
    }
}

// Outcome of the most recent driver call, kept for the status bar only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastCall {
    pub action: Action,
    pub code: i32,
    pub at: DateTime<Local>,
}

/// Everything the control panel knows between two events.
///
/// Owns the driver, the device listing and the field texts. The shell reads
/// and edits inputs through the accessors and reports events through
/// [`handle`](Self::handle) and the lifecycle methods.
pub struct Session<D> {
    driver: D,
    devices: DeviceList,
    outputs: OutputBanks,
    fields: Fields,
    last_call: Option<LastCall>,
}

impl<D: LuciDriver> Session<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            devices: DeviceList::default(),
            outputs: OutputBanks::default(),
            fields: Fields::default(),
            last_call: None,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn devices(&self) -> &DeviceList {
        &self.devices
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The editable ID field.
    pub fn id_text_mut(&mut self) -> &mut String {
        &mut self.fields.id
    }

    pub fn outputs(&self) -> &OutputBanks {
        &self.outputs
    }

    /// Toggles bound to checkboxes. Dispatch [`Action::WriteOutputs`] after a change.
    pub fn outputs_mut(&mut self) -> &mut OutputBanks {
        &mut self.outputs
    }

    pub fn last_call(&self) -> Option<&LastCall> {
        self.last_call.as_ref()
    }

    // --- Lifecycle ---

    pub fn on_startup(&mut self) {
        info!("Session starting, scanning for interfaces.");
        self.devices.refresh(&self.driver);
    }

    pub fn on_device_list_position_changed(&mut self, position: usize) {
        self.devices.select_by_list_position(position);
    }

    /// An interface was attached or removed.
    pub fn on_device_change(&mut self) {
        info!("Device change signalled.");
        self.devices.refresh(&self.driver);
    }

    /// Rescans when `watcher` is due and the number of attached interfaces changed.
    /// Returns whether a refresh happened.
    ///
    /// Only the count is compared: a detach and an attach between two polls
    /// leave the listing as it was until the operator presses Refresh.
    pub fn poll_device_change(&mut self, watcher: &mut DeviceWatcher, now: Instant) -> bool {
        if !watcher.is_due(now) {
            return false;
        }
        let count = self.driver.enumerate();
        if count == self.devices.device_count() {
            return false;
        }
        info!(
            "Interface count changed from {} to {}.",
            self.devices.device_count(),
            count
        );
        self.on_device_change();
        true
    }

    // --- Actions ---

    /// Runs one operator action against the selected interface.
    pub fn handle(&mut self, action: Action) {
        let index = self.devices.selected_index();
        debug!("Handling {} for interface {}", action, index);
        let code = match action {
            Action::WriteOutputs => self.write_outputs(index),
            Action::ReadId => self.read_id(index),
            Action::WriteId => self.write_id(index),
            Action::TestPin(pin) => self.test_pin(index, pin),
            Action::FirmwareUpdate => Some(status_code(&self.driver.firmware_update(index))),
            Action::LedOn => Some(status_code(&self.driver.led_on(index))),
            Action::LedOff => Some(status_code(&self.driver.led_off(index))),
        };
        if let Some(code) = code {
            self.record(action, code);
        }
    }

    fn record(&mut self, action: Action, code: i32) {
        if code == crate::driver::LUCI_OK {
            debug!("{} succeeded", action);
        } else {
            warn!("{} failed with status {}", action, code);
        }
        self.last_call = Some(LastCall {
            action,
            code,
            at: Local::now(),
        });
    }

    fn write_outputs(&mut self, index: DeviceIndex) -> Option<i32> {
        let (low, high) = self.outputs.bytes();
        let result = self.driver.write_data(index, low, high);
        match result {
            Ok(()) => {
                self.fields.port_low = format_hex_byte(low);
                self.fields.port_high = format_hex_byte(high);
            }
            Err(_) => {
                self.fields.port_low = ERROR_TEXT.to_string();
                self.fields.port_high = ERROR_TEXT.to_string();
            }
        }
        Some(status_code(&result))
    }

    fn read_id(&mut self, index: DeviceIndex) -> Option<i32> {
        let result = self.driver.read_id(index);
        self.fields.id = show(&result, format_hex_byte);
        Some(status_code(&result))
    }

    fn write_id(&mut self, index: DeviceIndex) -> Option<i32> {
        let code = match parse_hex_id(&self.fields.id) {
            Some(id) => {
                let result = self.driver.write_id(index, id);
                self.fields.id = show(&result.map(|()| id), format_hex_byte);
                Some(status_code(&result))
            }
            None => {
                warn!("'{}' is not a hex adapter ID, nothing written.", self.fields.id);
                self.fields.id = ERROR_TEXT.to_string();
                None
            }
        };
        // The listing shows IDs, rebuild it whatever the outcome
        self.devices.refresh(&self.driver);
        code
    }

    fn test_pin(&mut self, index: DeviceIndex, pin: Pin) -> Option<i32> {
        let result = self.driver.status_pin(index, pin);
        *self.fields.pin_mut(pin) = show(&result, format_hex);
        Some(status_code(&result))
    }
}

// Field text for a driver result: the formatted value or "Error"
fn show(result: &DriverResult<u8>, format: fn(u8) -> String) -> String {
    match result {
        Ok(value) => format(*value),
        Err(_) => ERROR_TEXT.to_string(),
    }
}
