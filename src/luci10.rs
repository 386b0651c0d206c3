use crate::driver::{DeviceIndex, DriverFault, DriverResult, LuciDriver, Pin};
use crate::error::DriverError;
use libloading::{Library, Symbol};
use log::{debug, info, warn};
use std::ffi::{c_char, c_int, CStr};
use std::path::Path;

// Size of the buffer handed to GetProductString
const PRODUCT_STRING_LEN: usize = 100;

/// Status reported when the library answered OK with a value wider than a byte.
pub const VALUE_OUT_OF_RANGE: i32 = -1000;

type EnumerateFn = unsafe extern "C" fn() -> c_int;
type IndexFn = unsafe extern "C" fn(c_int) -> c_int;
type ReadValueFn = unsafe extern "C" fn(c_int, *mut c_int) -> c_int;
type WriteIdFn = unsafe extern "C" fn(c_int, c_int) -> c_int;
type WriteDataFn = unsafe extern "C" fn(c_int, c_int, c_int) -> c_int;
type ProductStringFn = unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_int;

/// The vendor `LUCI_10` library, loaded at runtime.
///
/// Function pointers are copied out of the library when it is loaded and stay
/// valid for as long as `_library` is alive, which is the lifetime of `self`.
pub struct Luci10Library {
    enumerate_usb_devices: EnumerateFn,
    read_adapter_id: ReadValueFn,
    write_adapter_id: WriteIdFn,
    led_on: IndexFn,
    led_off: IndexFn,
    write_data: WriteDataFn,
    get_status_pin5: ReadValueFn,
    get_status_pin6: ReadValueFn,
    get_status_pin7: ReadValueFn,
    firmware_update: IndexFn,
    get_product_string: ProductStringFn,
    _library: Library,
}

/// Copies an exported function pointer out of `library`.
///
/// # Safety
/// `T` must match the real signature of the export.
unsafe fn export<T: Copy>(library: &Library, name: &'static str) -> Result<T, DriverError> {
    let symbol: Symbol<'_, T> = library
        .get(name.as_bytes())
        .map_err(|source| DriverError::MissingSymbol { name, source })?;
    Ok(*symbol)
}

impl Luci10Library {
    /// Opens the library at `path` and resolves every export the control panel uses.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        info!("Loading LUCI-10 driver library from {}", path.display());
        let library = unsafe { Library::new(path) }.map_err(|source| DriverError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        // Safety: the signatures follow the vendor header for LUCI_10.
        let driver = unsafe {
            Self {
                enumerate_usb_devices: export(&library, "EnumerateUsbDevices")?,
                read_adapter_id: export(&library, "ReadAdapterID")?,
                write_adapter_id: export(&library, "WriteAdapterID")?,
                led_on: export(&library, "LedOn")?,
                led_off: export(&library, "LedOff")?,
                write_data: export(&library, "WriteData")?,
                get_status_pin5: export(&library, "GetStatusPin5")?,
                get_status_pin6: export(&library, "GetStatusPin6")?,
                get_status_pin7: export(&library, "GetStatusPin7")?,
                firmware_update: export(&library, "FirmwareUpdate")?,
                get_product_string: export(&library, "GetProductString")?,
                _library: library,
            }
        };
        info!("LUCI-10 driver library loaded.");
        Ok(driver)
    }

    fn read_value(&self, f: ReadValueFn, index: DeviceIndex) -> DriverResult<c_int> {
        let mut value: c_int = 0;
        let code = unsafe { f(index as c_int, &mut value) };
        DriverFault::check(code)?;
        Ok(value)
    }

    fn call(&self, f: IndexFn, index: DeviceIndex) -> DriverResult<()> {
        DriverFault::check(unsafe { f(index as c_int) })
    }
}

impl LuciDriver for Luci10Library {
    fn enumerate(&self) -> u32 {
        let count = unsafe { (self.enumerate_usb_devices)() };
        debug!("EnumerateUsbDevices returned {}", count);
        // A negative count is reported as "nothing attached"
        u32::try_from(count).unwrap_or(0)
    }

    fn read_id(&self, index: DeviceIndex) -> DriverResult<u8> {
        let id = self.read_value(self.read_adapter_id, index)?;
        byte_value("adapter ID", id)
    }

    fn write_id(&self, index: DeviceIndex, id: u8) -> DriverResult<()> {
        DriverFault::check(unsafe { (self.write_adapter_id)(index as c_int, c_int::from(id)) })
    }

    fn led_on(&self, index: DeviceIndex) -> DriverResult<()> {
        self.call(self.led_on, index)
    }

    fn led_off(&self, index: DeviceIndex) -> DriverResult<()> {
        self.call(self.led_off, index)
    }

    fn write_data(&self, index: DeviceIndex, low: u8, high: u8) -> DriverResult<()> {
        DriverFault::check(unsafe {
            (self.write_data)(index as c_int, c_int::from(low), c_int::from(high))
        })
    }

    fn status_pin(&self, index: DeviceIndex, pin: Pin) -> DriverResult<u8> {
        let f = match pin {
            Pin::P5 => self.get_status_pin5,
            Pin::P6 => self.get_status_pin6,
            Pin::P7 => self.get_status_pin7,
        };
        let level = self.read_value(f, index)?;
        byte_value("pin level", level)
    }

    fn firmware_update(&self, index: DeviceIndex) -> DriverResult<()> {
        self.call(self.firmware_update, index)
    }

    fn product_string(&self, index: DeviceIndex) -> DriverResult<String> {
        let mut buffer = [0u8; PRODUCT_STRING_LEN];
        let code = unsafe {
            (self.get_product_string)(
                index as c_int,
                buffer.as_mut_ptr() as *mut c_char,
                PRODUCT_STRING_LEN as c_int,
            )
        };
        DriverFault::check(code)?;
        Ok(product_from_buffer(&buffer))
    }
}

/// Narrows an out value of the library to a byte, reporting wider values as a fault.
fn byte_value(what: &str, raw: c_int) -> DriverResult<u8> {
    u8::try_from(raw).map_err(|_| {
        warn!("Driver returned {} {} which does not fit in a byte", what, raw);
        DriverFault(VALUE_OUT_OF_RANGE)
    })
}

/// Decodes the NUL terminated product string the library wrote into `buffer`.
fn product_from_buffer(buffer: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buffer) {
        Ok(text) => text.to_string_lossy().into_owned(),
        // Unterminated, take the whole buffer
        Err(_) => String::from_utf8_lossy(buffer).into_owned(),
    }
}
