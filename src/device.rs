use crate::driver::{DeviceIndex, LuciDriver};
use crate::util::format_hex_byte;
use log::{info, warn};

/// Listing entry shown when the bus scan found nothing.
pub const NO_DEVICES_ENTRY: &str = "No LUCI-10 Interfaces found!";

// One attached interface as seen during the last refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub index: DeviceIndex,
    pub id: Option<u8>,         // None if ReadAdapterID failed
    pub product: Option<String>, // None if GetProductString failed
}

// How the interface is displayed in the listing
impl std::fmt::Display for DeviceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let id = self.id.map(format_hex_byte).unwrap_or_else(|| "??".to_string());
        write!(
            f,
            "Interface No {} has ID={}, Product=\"{}\"",
            self.index,
            id,
            self.product.as_deref().unwrap_or("")
        )
    }
}

/// Attached interfaces and the operator's current selection.
///
/// Invariant: `selected == 0` exactly when `count == 0`, otherwise
/// `1 <= selected <= count`.
#[derive(Debug, Default)]
pub struct DeviceList {
    entries: Vec<DeviceEntry>,
    count: u32,
    selected: DeviceIndex,
}

impl DeviceList {
    /// Rescans the bus and rebuilds the listing.
    ///
    /// Metadata is fetched best-effort: a failed ID or product query is logged
    /// and the entry is kept with whatever could be read.
    pub fn refresh<D: LuciDriver + ?Sized>(&mut self, driver: &D) {
        info!("Refreshing device list...");
        self.entries.clear();

        let count = driver.enumerate();
        self.count = count;

        if count == 0 {
            self.selected = 0;
            info!("No LUCI-10 interfaces found.");
            return;
        }

        for index in 1..=count {
            let id = match driver.read_id(index) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Reading ID of interface {} failed: {}", index, e);
                    None
                }
            };
            let product = match driver.product_string(index) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!("Reading product string of interface {} failed: {}", index, e);
                    None
                }
            };
            let entry = DeviceEntry { index, id, product };
            info!("Found {}", entry);
            self.entries.push(entry);
        }

        // First interface becomes the current one
        self.selected = 1;
        info!("Device list refresh complete. Found {} interfaces.", count);
    }

    /// Selects the interface shown at 0-based `position` in the listing.
    pub fn select_by_list_position(&mut self, position: usize) {
        if position >= self.entries.len() {
            warn!(
                "Selecting list position {} outside of {} listed interfaces",
                position,
                self.entries.len()
            );
        }
        self.selected = position as DeviceIndex + 1;
        info!("Selected interface {}", self.selected);
    }

    pub fn selected_index(&self) -> DeviceIndex {
        self.selected
    }

    /// 0-based listing position of the selected interface, if any.
    pub fn selected_position(&self) -> Option<usize> {
        match self.selected {
            0 => None,
            index => Some(index as usize - 1),
        }
    }

    pub fn device_count(&self) -> u32 {
        self.count
    }

    pub fn entries(&self) -> &[DeviceEntry] {
        &self.entries
    }

    /// Listing lines as shown to the operator, the sentinel when nothing is attached.
    pub fn lines(&self) -> Vec<String> {
        if self.count == 0 {
            vec![NO_DEVICES_ENTRY.to_string()]
        } else {
            self.entries.iter().map(|e| e.to_string()).collect()
        }
    }
}
