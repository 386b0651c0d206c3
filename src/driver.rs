use std::fmt;

/// Status code the vendor library returns for a successful call.
pub const LUCI_OK: i32 = 0;

/// 1-based position of an interface among the currently enumerated ones.
/// `0` means no interface is selected.
pub type DeviceIndex = u32;

/// Non-zero status code returned by a driver call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("driver returned status {0}")]
pub struct DriverFault(pub i32);

pub type DriverResult<T> = Result<T, DriverFault>;

impl DriverFault {
    /// Turns a raw status code into a result.
    pub fn check(code: i32) -> DriverResult<()> {
        if code == LUCI_OK {
            Ok(())
        } else {
            Err(DriverFault(code))
        }
    }
}

/// Raw status code of a finished driver call, `LUCI_OK` on success.
pub fn status_code<T>(result: &DriverResult<T>) -> i32 {
    match result {
        Ok(_) => LUCI_OK,
        Err(DriverFault(code)) => *code,
    }
}

// Input pins the interface can report on
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Pin {
    P5,
    P6,
    P7,
}

impl Pin {
    pub const ALL: [Pin; 3] = [Pin::P5, Pin::P6, Pin::P7];

    pub fn number(self) -> u8 {
        match self {
            Pin::P5 => 5,
            Pin::P6 => 6,
            Pin::P7 => 7,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pin {}", self.number())
    }
}

/// Synchronous access to attached LUCI-10 interfaces.
///
/// Every call blocks until the hardware answers. Devices are addressed by
/// their 1-based [`DeviceIndex`] from the most recent [`enumerate`](Self::enumerate).
#[cfg_attr(test, mock_it::mock_it)]
pub trait LuciDriver {
    /// Scans the bus and returns how many interfaces are attached.
    fn enumerate(&self) -> u32;

    fn read_id(&self, index: DeviceIndex) -> DriverResult<u8>;

    fn write_id(&self, index: DeviceIndex, id: u8) -> DriverResult<()>;

    fn led_on(&self, index: DeviceIndex) -> DriverResult<()>;

    fn led_off(&self, index: DeviceIndex) -> DriverResult<()>;

    /// Drives the sixteen output pins, `low` holding outputs 0-7 and `high` 8-15.
    fn write_data(&self, index: DeviceIndex, low: u8, high: u8) -> DriverResult<()>;

    /// Reads the level of one input pin.
    fn status_pin(&self, index: DeviceIndex, pin: Pin) -> DriverResult<u8>;

    /// Starts the firmware update of the interface.
    fn firmware_update(&self, index: DeviceIndex) -> DriverResult<()>;

    fn product_string(&self, index: DeviceIndex) -> DriverResult<String>;
}
