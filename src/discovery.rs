//! Finding the FTDI bridge the FPGA hangs off, and naming it the way the rest of the tool does:
//! `ftdi://ftdi:<chip>/<interface>`.
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub const FTDI_VID: u16 = 0x0403;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdapterKind {
    /// Dual channel, on the GateMate evaluation board
    Ft2232h,
    /// Single channel, in the GateMate programmer
    Ft232h,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 2] = [AdapterKind::Ft2232h, AdapterKind::Ft232h];

    pub fn product_id(self) -> u16 {
        match self {
            AdapterKind::Ft2232h => 0x6010,
            AdapterKind::Ft232h => 0x6014,
        }
    }

    pub fn from_ids(vid: u16, pid: u16) -> Option<Self> {
        if vid != FTDI_VID {
            return None;
        }
        Self::ALL.into_iter().find(|k| k.product_id() == pid)
    }

    fn chip(self) -> &'static str {
        match self {
            AdapterKind::Ft2232h => "2232h",
            AdapterKind::Ft232h => "232h",
        }
    }

    fn interfaces(self) -> u8 {
        match self {
            AdapterKind::Ft2232h => 2,
            AdapterKind::Ft232h => 1,
        }
    }
}

/// Which adapter, and which of its interfaces, carries JTAG
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterIdentity {
    pub kind: AdapterKind,
    pub interface: u8,
}

impl AdapterIdentity {
    pub fn new(kind: AdapterKind) -> Self {
        Self { kind, interface: 1 }
    }
}

impl fmt::Display for AdapterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ftdi://ftdi:{}/{}", self.kind.chip(), self.interface)
    }
}

impl FromStr for AdapterIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidIdentity(s.to_string());

        let rest = s.strip_prefix("ftdi://ftdi:").ok_or_else(invalid)?;
        let (chip, interface) = rest.split_once('/').ok_or_else(invalid)?;
        let kind = AdapterKind::ALL
            .into_iter()
            .find(|k| k.chip() == chip)
            .ok_or_else(invalid)?;
        let interface: u8 = interface.parse().map_err(|_| invalid())?;
        if interface == 0 || interface > kind.interfaces() {
            return Err(invalid());
        }
        Ok(Self { kind, interface })
    }
}

/// Board roles selectable on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Board {
    /// First adapter found on the bus
    #[default]
    Auto,
    /// GateMate programmer (FT232H)
    Pgm,
    /// GateMate evaluation board (FT2232H)
    Evb,
}

/// One matching adapter seen on the USB bus
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterInfo {
    pub kind: AdapterKind,
    pub bus: u8,
    pub address: u8,
    pub serial: Option<String>,
}

impl AdapterInfo {
    pub fn identity(&self) -> AdapterIdentity {
        AdapterIdentity::new(self.kind)
    }
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bus {:03} address {:03}", self.identity(), self.bus, self.address)?;
        if let Some(serial) = &self.serial {
            write!(f, " serial {serial}")?;
        }
        Ok(())
    }
}

/// Pick the adapter for `board`.  Only `Board::Auto` looks at `adapters`.
pub fn select(board: Board, adapters: &[AdapterInfo]) -> Result<AdapterIdentity, Error> {
    match board {
        Board::Auto => adapters.first().map(AdapterInfo::identity).ok_or(Error::NoAdapterFound),
        Board::Pgm => Ok(AdapterIdentity::new(AdapterKind::Ft232h)),
        Board::Evb => Ok(AdapterIdentity::new(AdapterKind::Ft2232h)),
    }
}

/// Every FT2232H and FT232H on the USB bus, in enumeration order.
#[cfg(feature = "ftdi")]
pub fn list_adapters() -> Result<Vec<AdapterInfo>, crate::cable::CableError> {
    let mut found = Vec::new();
    for device in rusb::devices()?.iter() {
        let desc = device.device_descriptor()?;
        let Some(kind) = AdapterKind::from_ids(desc.vendor_id(), desc.product_id()) else {
            continue;
        };

        // Reading the serial needs the device opened, which fails without permissions
        let serial = device
            .open()
            .ok()
            .and_then(|handle| handle.read_serial_number_string_ascii(&desc).ok());

        let info = AdapterInfo {
            kind,
            bus: device.bus_number(),
            address: device.address(),
            serial,
        };
        tracing::debug!("found {info}");
        found.push(info);
    }
    Ok(found)
}

/// Resolve `board` to an adapter, enumerating the bus only when it has to.
#[cfg(feature = "ftdi")]
pub fn resolve(board: Board) -> Result<AdapterIdentity, Error> {
    let adapters = match board {
        Board::Auto => list_adapters()?,
        _ => Vec::new(),
    };
    select(board, &adapters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(kind: AdapterKind) -> AdapterInfo {
        AdapterInfo {
            kind,
            bus: 1,
            address: 4,
            serial: None,
        }
    }

    #[test]
    fn identity_round_trips_through_its_url() {
        for s in ["ftdi://ftdi:2232h/1", "ftdi://ftdi:2232h/2", "ftdi://ftdi:232h/1"] {
            assert_eq!(s.parse::<AdapterIdentity>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn identity_rejects_unknown_chips_and_interfaces() {
        for s in ["ftdi://ftdi:4232h/1", "ftdi://ftdi:232h/2", "ftdi://ftdi:2232h/0", "usb://x", ""] {
            assert!(matches!(s.parse::<AdapterIdentity>(), Err(Error::InvalidIdentity(_))), "{s}");
        }
    }

    #[test]
    fn known_ids_map_to_kinds() {
        assert_eq!(AdapterKind::from_ids(0x0403, 0x6010), Some(AdapterKind::Ft2232h));
        assert_eq!(AdapterKind::from_ids(0x0403, 0x6014), Some(AdapterKind::Ft232h));
        assert_eq!(AdapterKind::from_ids(0x0403, 0x6001), None);
        assert_eq!(AdapterKind::from_ids(0x1234, 0x6010), None);
    }

    #[test]
    fn board_roles_select_fixed_identities() {
        assert_eq!(select(Board::Pgm, &[]).unwrap().to_string(), "ftdi://ftdi:232h/1");
        assert_eq!(select(Board::Evb, &[]).unwrap().to_string(), "ftdi://ftdi:2232h/1");
    }

    #[test]
    fn auto_takes_the_first_adapter() {
        let found = [info(AdapterKind::Ft232h), info(AdapterKind::Ft2232h)];
        assert_eq!(select(Board::Auto, &found).unwrap().kind, AdapterKind::Ft232h);
        assert!(matches!(select(Board::Auto, &[]), Err(Error::NoAdapterFound)));
    }

    #[test]
    fn adapter_info_prints_identity_and_location() {
        let mut a = info(AdapterKind::Ft2232h);
        assert_eq!(a.to_string(), "ftdi://ftdi:2232h/1 bus 001 address 004");
        a.serial = Some("FT1234".into());
        assert_eq!(a.to_string(), "ftdi://ftdi:2232h/1 bus 001 address 004 serial FT1234");
    }
}
