use luci_control::device::{DeviceList, NO_DEVICES_ENTRY};
use luci_control::dispatch::{Action, Fields, OutputBanks, Session};
use luci_control::driver::{DeviceIndex, DriverFault, DriverResult, LuciDriver, Pin};
use luci_control::util::pack_output_byte;
use luci_control::watcher::DeviceWatcher;
use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Enumerate,
    ReadId(DeviceIndex),
    WriteId(DeviceIndex, u8),
    LedOn(DeviceIndex),
    LedOff(DeviceIndex),
    WriteData(DeviceIndex, u8, u8),
    StatusPin(DeviceIndex, Pin),
    FirmwareUpdate(DeviceIndex),
    ProductString(DeviceIndex),
}

struct FakeDevice {
    id: DriverResult<u8>,
    product: DriverResult<String>,
}

/// Scripted stand-in for the vendor library, recording every call.
#[derive(Default)]
struct FakeDriver {
    devices: RefCell<Vec<FakeDevice>>,
    status: Cell<Option<i32>>, // Failure code returned by every device call
    pin_level: u8,
    calls: RefCell<Vec<Call>>,
}

impl FakeDriver {
    fn with_devices(devices: &[(u8, &str)]) -> Self {
        let driver = FakeDriver::default();
        for (id, product) in devices {
            driver.attach(Ok(*id), Ok(product.to_string()));
        }
        driver
    }

    fn failing(self, code: i32) -> Self {
        self.fail_with(code);
        self
    }

    fn fail_with(&self, code: i32) {
        self.status.set(Some(code));
    }

    fn attach(&self, id: DriverResult<u8>, product: DriverResult<String>) {
        self.devices.borrow_mut().push(FakeDevice { id, product });
    }

    fn detach_all(&self) {
        self.devices.borrow_mut().clear();
    }

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn outcome(&self) -> DriverResult<()> {
        match self.status.get() {
            Some(code) => Err(DriverFault(code)),
            None => Ok(()),
        }
    }
}

// Vec slot of a 1-based index, out of range for index 0
fn slot(index: DeviceIndex) -> usize {
    (index as usize).wrapping_sub(1)
}

impl LuciDriver for FakeDriver {
    fn enumerate(&self) -> u32 {
        self.log(Call::Enumerate);
        self.devices.borrow().len() as u32
    }

    fn read_id(&self, index: DeviceIndex) -> DriverResult<u8> {
        self.log(Call::ReadId(index));
        self.outcome()?;
        match self.devices.borrow().get(slot(index)) {
            Some(device) => device.id,
            None => Err(DriverFault(-1)),
        }
    }

    fn write_id(&self, index: DeviceIndex, id: u8) -> DriverResult<()> {
        self.log(Call::WriteId(index, id));
        self.outcome()?;
        if let Some(device) = self.devices.borrow_mut().get_mut(slot(index)) {
            device.id = Ok(id);
        }
        Ok(())
    }

    fn led_on(&self, index: DeviceIndex) -> DriverResult<()> {
        self.log(Call::LedOn(index));
        self.outcome()
    }

    fn led_off(&self, index: DeviceIndex) -> DriverResult<()> {
        self.log(Call::LedOff(index));
        self.outcome()
    }

    fn write_data(&self, index: DeviceIndex, low: u8, high: u8) -> DriverResult<()> {
        self.log(Call::WriteData(index, low, high));
        self.outcome()
    }

    fn status_pin(&self, index: DeviceIndex, pin: Pin) -> DriverResult<u8> {
        self.log(Call::StatusPin(index, pin));
        self.outcome()?;
        Ok(self.pin_level)
    }

    fn firmware_update(&self, index: DeviceIndex) -> DriverResult<()> {
        self.log(Call::FirmwareUpdate(index));
        self.outcome()
    }

    fn product_string(&self, index: DeviceIndex) -> DriverResult<String> {
        self.log(Call::ProductString(index));
        match self.devices.borrow().get(slot(index)) {
            Some(device) => device.product.clone(),
            None => Err(DriverFault(-1)),
        }
    }
}

fn started(driver: FakeDriver) -> Session<FakeDriver> {
    let mut session = Session::new(driver);
    session.on_startup();
    session.driver().clear_calls();
    session
}

fn banks_from_mask(mask: u16) -> OutputBanks {
    let mut banks = OutputBanks::default();
    for bit in 0..8 {
        banks.low[bit] = mask & (1 << bit) != 0;
        banks.high[bit] = mask & (1 << (bit + 8)) != 0;
    }
    banks
}

// --- Output byte packing ---

#[test]
fn test_packing_every_toggle_combination() {
    for mask in 0..=u16::MAX {
        let banks = banks_from_mask(mask);

        let expected_low: u32 = (0..8).filter(|&i| banks.low[i]).map(|i| 1u32 << i).sum();
        let expected_high: u32 = (0..8).filter(|&i| banks.high[i]).map(|i| 1u32 << i).sum();

        assert_eq!(u32::from(pack_output_byte(&banks.low)), expected_low);
        assert_eq!(u32::from(pack_output_byte(&banks.high)), expected_high);
        assert_eq!(banks.bytes(), (mask as u8, (mask >> 8) as u8));
    }
}

#[test]
fn test_toggle_change_writes_packed_bytes() {
    let mut session = started(FakeDriver::with_devices(&[(0x01, "LUCI-10")]));
    session.outputs_mut().low[1] = true;
    session.outputs_mut().high[0] = true;
    session.outputs_mut().high[7] = true;

    session.handle(Action::WriteOutputs);

    assert_eq!(session.driver().calls(), vec![Call::WriteData(1, 0x02, 0x81)]);
    assert_eq!(session.fields().port_low, "02");
    assert_eq!(session.fields().port_high, "81");
}

// Fills every display field through successful calls
fn filled(driver: FakeDriver) -> Session<FakeDriver> {
    let mut session = started(driver);
    session.outputs_mut().low[2] = true;
    session.handle(Action::WriteOutputs);
    session.handle(Action::ReadId);
    for pin in Pin::ALL {
        session.handle(Action::TestPin(pin));
    }
    session.driver().clear_calls();
    session
}

#[test]
fn test_toggle_failure_shows_error_in_port_fields() {
    let mut driver = FakeDriver::with_devices(&[(0x01, "LUCI-10")]);
    driver.pin_level = 1;
    let mut session = filled(driver);
    let before = session.fields().clone();
    session.driver().fail_with(3);
    session.outputs_mut().low[0] = true;

    session.handle(Action::WriteOutputs);

    let expected = Fields {
        port_low: "Error".to_string(),
        port_high: "Error".to_string(),
        ..before
    };
    assert_eq!(expected.id, "01");
    assert_eq!(expected.pin7, "1");
    assert_eq!(session.fields(), &expected);
    assert_eq!(session.last_call().map(|c| c.code), Some(3));
}

// --- Device list ---

#[test]
fn test_refresh_without_devices() {
    let driver = FakeDriver::default();
    let mut list = DeviceList::default();

    list.refresh(&driver);

    assert_eq!(list.device_count(), 0);
    assert_eq!(list.selected_index(), 0);
    assert_eq!(list.lines(), vec![NO_DEVICES_ENTRY.to_string()]);
    assert_eq!(driver.calls(), vec![Call::Enumerate]);
}

#[test]
fn test_refresh_lists_every_device() {
    let driver = FakeDriver::with_devices(&[(0x05, "Alpha"), (0x1A, "Beta")]);
    let mut list = DeviceList::default();

    list.refresh(&driver);

    assert_eq!(list.device_count(), 2);
    assert_eq!(list.selected_index(), 1);
    assert_eq!(
        list.lines(),
        vec![
            "Interface No 1 has ID=05, Product=\"Alpha\"".to_string(),
            "Interface No 2 has ID=1A, Product=\"Beta\"".to_string(),
        ]
    );
    assert_eq!(list.entries()[1].id, Some(0x1A));
    assert_eq!(list.entries()[1].product.as_deref(), Some("Beta"));
}

#[test]
fn test_refresh_keeps_devices_with_partial_metadata() {
    let driver = FakeDriver::default();
    driver.attach(Err(DriverFault(2)), Ok("Gamma".to_string()));
    driver.attach(Ok(0x33), Err(DriverFault(2)));
    let mut list = DeviceList::default();

    list.refresh(&driver);

    assert_eq!(
        list.lines(),
        vec![
            "Interface No 1 has ID=??, Product=\"Gamma\"".to_string(),
            "Interface No 2 has ID=33, Product=\"\"".to_string(),
        ]
    );
    assert_eq!(list.selected_index(), 1);
}

#[test]
fn test_refresh_replaces_previous_listing() {
    let driver = FakeDriver::with_devices(&[(0x05, "Alpha"), (0x1A, "Beta")]);
    let mut list = DeviceList::default();
    list.refresh(&driver);
    list.select_by_list_position(1);

    driver.detach_all();
    list.refresh(&driver);

    assert_eq!(list.device_count(), 0);
    assert_eq!(list.selected_index(), 0);
    assert!(list.entries().is_empty());
}

#[test]
fn test_select_by_list_position() {
    let driver = FakeDriver::with_devices(&[(0x05, "Alpha"), (0x1A, "Beta"), (0x2B, "Gamma")]);
    let mut list = DeviceList::default();
    list.refresh(&driver);
    let lines_before = list.lines();

    list.select_by_list_position(2);

    assert_eq!(list.selected_index(), 3);
    assert_eq!(list.selected_position(), Some(2));
    assert_eq!(list.device_count(), 3);
    assert_eq!(list.lines(), lines_before);
}

// --- Command dispatch ---

#[test]
fn test_read_id_shows_hex() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha"), (0x1A, "Beta")]));
    session.on_device_list_position_changed(1);

    session.handle(Action::ReadId);

    assert_eq!(session.fields().id, "1A");
    assert_eq!(session.driver().calls(), vec![Call::ReadId(2)]);
}

#[test]
fn test_failed_read_id_only_touches_id_field() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha")]).failing(9));
    session.outputs_mut().low[3] = true;
    let outputs_before = *session.outputs();

    session.handle(Action::ReadId);

    let expected = Fields {
        id: "Error".to_string(),
        ..Fields::default()
    };
    assert_eq!(session.fields(), &expected);
    assert_eq!(session.outputs(), &outputs_before);
    assert_eq!(session.devices().selected_index(), 1);
}

#[test]
fn test_write_id_refreshes_listing_once() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha"), (0x1A, "Beta")]));
    session.on_device_list_position_changed(1);
    *session.id_text_mut() = "3F".to_string();

    session.handle(Action::WriteId);

    let calls = session.driver().calls();
    assert_eq!(calls[0], Call::WriteId(2, 0x3F));
    let enumerations = calls.iter().filter(|c| **c == Call::Enumerate).count();
    assert_eq!(enumerations, 1);
    assert_eq!(calls[1], Call::Enumerate);

    assert_eq!(session.fields().id, "3F");
    assert_eq!(
        session.devices().lines()[1],
        "Interface No 2 has ID=3F, Product=\"Beta\""
    );
    // Refresh selects the first interface again
    assert_eq!(session.devices().selected_index(), 1);
}

#[test]
fn test_write_id_is_permissive_about_input() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha")]));
    *session.id_text_mut() = " a7x".to_string();

    session.handle(Action::WriteId);

    assert_eq!(session.driver().calls()[0], Call::WriteId(1, 0xA7));
    assert_eq!(session.fields().id, "A7");
}

#[test]
fn test_failed_write_id_shows_error() {
    let mut driver = FakeDriver::with_devices(&[(0x05, "Alpha")]);
    driver.pin_level = 1;
    let mut session = filled(driver);
    let before = session.fields().clone();
    session.driver().fail_with(4);
    *session.id_text_mut() = "10".to_string();

    session.handle(Action::WriteId);

    let expected = Fields {
        id: "Error".to_string(),
        ..before
    };
    assert_eq!(expected.port_low, "04");
    assert_eq!(expected.pin5, "1");
    assert_eq!(session.fields(), &expected);
    assert_eq!(session.last_call().map(|c| c.code), Some(4));
}

#[test]
fn test_write_id_without_hex_digits_still_refreshes() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha"), (0x1A, "Beta")]));
    session.on_device_list_position_changed(1);
    *session.id_text_mut() = "zz".to_string();

    session.handle(Action::WriteId);

    let calls = session.driver().calls();
    assert!(!calls.iter().any(|c| matches!(c, Call::WriteId(..))));
    assert_eq!(calls.iter().filter(|c| **c == Call::Enumerate).count(), 1);
    assert_eq!(session.fields().id, "Error");
    assert_eq!(session.devices().selected_index(), 1);
    assert!(session.last_call().is_none());
}

#[test]
fn test_pin_tests_fill_their_fields() {
    let mut driver = FakeDriver::with_devices(&[(0x05, "Alpha")]);
    driver.pin_level = 1;
    let mut session = started(driver);

    session.handle(Action::TestPin(Pin::P5));
    session.handle(Action::TestPin(Pin::P7));

    assert_eq!(session.fields().pin(Pin::P5), "1");
    assert_eq!(session.fields().pin(Pin::P6), "");
    assert_eq!(session.fields().pin(Pin::P7), "1");
    assert_eq!(
        session.driver().calls(),
        vec![Call::StatusPin(1, Pin::P5), Call::StatusPin(1, Pin::P7)]
    );
}

#[test]
fn test_fire_and_forget_actions_leave_fields_alone() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha")]).failing(1));

    session.handle(Action::LedOn);
    session.handle(Action::LedOff);
    session.handle(Action::FirmwareUpdate);

    assert_eq!(session.fields(), &Fields::default());
    assert_eq!(
        session.driver().calls(),
        vec![Call::LedOn(1), Call::LedOff(1), Call::FirmwareUpdate(1)]
    );
    let last = session.last_call().expect("status recorded");
    assert_eq!(last.action, Action::FirmwareUpdate);
    assert_eq!(last.code, 1);
}

#[test]
fn test_actions_without_selection_use_index_zero() {
    let mut session = started(FakeDriver::default());

    session.handle(Action::LedOn);

    assert_eq!(session.devices().selected_index(), 0);
    assert_eq!(session.driver().calls(), vec![Call::LedOn(0)]);
}

// --- Device change ---

#[test]
fn test_device_change_triggers_refresh() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha")]));
    let mut watcher = DeviceWatcher::new(1000);
    let start = Instant::now();

    // First poll only arms the watcher
    assert!(!session.poll_device_change(&mut watcher, start));
    assert!(session.driver().calls().is_empty());

    // Same count: no refresh
    assert!(!session.poll_device_change(&mut watcher, start + Duration::from_secs(1)));
    assert_eq!(session.driver().calls(), vec![Call::Enumerate]);

    session.driver().attach(Ok(0x1A), Ok("Beta".to_string()));
    assert!(session.poll_device_change(&mut watcher, start + Duration::from_secs(2)));
    assert_eq!(session.devices().device_count(), 2);
    assert_eq!(session.devices().selected_index(), 1);
}

#[test]
fn test_detach_clears_selection() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha")]));

    session.driver().detach_all();
    session.on_device_change();

    assert_eq!(session.devices().device_count(), 0);
    assert_eq!(session.devices().selected_index(), 0);
    assert_eq!(session.devices().lines(), vec![NO_DEVICES_ENTRY.to_string()]);
}

#[test]
fn test_swap_within_interval_keeps_listing() {
    let mut session = started(FakeDriver::with_devices(&[(0x05, "Alpha")]));
    let mut watcher = DeviceWatcher::new(1000);
    let start = Instant::now();
    assert!(!session.poll_device_change(&mut watcher, start));

    // One interface replaced by another between two polls
    session.driver().detach_all();
    session.driver().attach(Ok(0x1A), Ok("Beta".to_string()));

    assert!(!session.poll_device_change(&mut watcher, start + Duration::from_secs(1)));
    assert_eq!(
        session.devices().lines(),
        vec!["Interface No 1 has ID=05, Product=\"Alpha\"".to_string()]
    );

    // A manual refresh picks it up
    session.on_device_change();
    assert_eq!(session.devices().entries()[0].id, Some(0x1A));
}
