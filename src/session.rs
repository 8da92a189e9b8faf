//! Reading the register file a range at a time, and putting wide values back together.
//!
//! Nothing read here is cached.  Several fields change when they are read, so every scan goes back
//! to the hardware.
use std::ops::{DerefMut, RangeInclusive};

use crate::cable::Cable;
use crate::error::Error;
use crate::protocol::SerdesJtag;
use crate::regfile::{self, Band, Classification, Field, FieldId};

/// The five registers holding the 80 bits of received data, lowest address first
pub const RX_DATA: [FieldId; 5] = [
    FieldId::RxData0,
    FieldId::RxData16,
    FieldId::RxData32,
    FieldId::RxData48,
    FieldId::RxData64,
];

/// One register as read from the hardware
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterWord {
    pub address: u8,
    pub word: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedField {
    pub field: &'static Field,
    pub value: u16,
    pub classification: Classification,
}

impl RegisterWord {
    /// Split the word into the catalog fields at its address
    pub fn decode(&self) -> Vec<DecodedField> {
        regfile::fields_at(self.address)
            .iter()
            .map(|field| {
                let value = regfile::field_value(self.word, field);
                DecodedField {
                    field,
                    value,
                    classification: regfile::interpret(field, value),
                }
            })
            .collect()
    }
}

/// Select-then-read over a range of addresses, skipping reserved space.  Each step is a fresh
/// pair of hardware cycles.  The first error ends the scan.
pub struct Scan<'a, T> {
    jtag: &'a mut SerdesJtag<T>,
    addresses: RangeInclusive<u8>,
    failed: bool,
}

impl<T, U> Iterator for Scan<'_, T>
where
    T: DerefMut<Target = U>,
    U: Cable + ?Sized,
{
    type Item = Result<RegisterWord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let address = self.addresses.find(|a| !regfile::is_reserved(*a))?;
        match self.jtag.read_address(address) {
            Ok(word) => Some(Ok(RegisterWord { address, word })),
            Err(e) => {
                self.failed = true;
                Some(Err(Error::at(address, e)))
            }
        }
    }
}

/// The 80-bit received-data value, and the eight symbols recovered from it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RxData {
    pub raw: u128,
    pub symbols: u64,
}

impl<T, U> SerdesJtag<T>
where
    T: DerefMut<Target = U>,
    U: Cable + ?Sized,
{
    pub fn scan(&mut self, low: u8, high: u8) -> Scan<'_, T> {
        Scan {
            jtag: self,
            addresses: low..=high,
            failed: false,
        }
    }

    pub fn scan_band(&mut self, band: Band) -> Scan<'_, T> {
        let addresses = band.addresses();
        self.scan(*addresses.start(), *addresses.end())
    }

    pub fn read_rx_data(&mut self) -> Result<RxData, Error> {
        let mut chunks = Vec::with_capacity(RX_DATA.len());
        for id in RX_DATA {
            let field = id.field();
            let word = self
                .read_address(field.address)
                .map_err(|e| Error::at(field.address, e))?;
            chunks.push(regfile::field_value(word, field));
        }
        let raw = assemble_wide(&chunks)?;
        Ok(RxData {
            raw,
            symbols: repack_symbols(raw),
        })
    }
}

/// Put chunk `i` at bit `16 * i`.  Chunks are in increasing address order.
pub fn assemble_wide(chunks: &[u16]) -> Result<u128, Error> {
    if chunks.len() * 16 > u128::BITS as usize {
        return Err(Error::BitLength {
            expected: u128::BITS as usize,
            actual: chunks.len() * 16,
        });
    }
    Ok(chunks
        .iter()
        .enumerate()
        .fold(0u128, |acc, (i, c)| acc | (u128::from(*c) << (16 * i))))
}

/// Take the low byte of each of the eight 10-bit groups of an 80-bit value and pack them into a
/// u64, group 0 in byte 0.  The top two bits of every group are dropped, so this is only a
/// debugging view of 8b/10b data and not a decode of it.
pub fn repack_symbols(raw: u128) -> u64 {
    (0..8).fold(0u64, |acc, i| {
        let byte = ((raw >> (10 * i)) & 0xFF) as u64;
        acc | (byte << (8 * i))
    })
}
