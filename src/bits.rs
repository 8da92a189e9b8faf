//! Length-tagged bit sequences.  `Bits` is what every layer of this crate hands to the one below
//! it: the register-file protocol builds commands out of them, `Taps` pads them with bypass bits,
//! and cables shift them through the scan chain.
//!
//! Index 0 is always the first bit shifted into TDI, and the first bit captured from TDO.  Since
//! JTAG data registers shift least significant bit first, integers convert with the LSB at index 0
//! unless a caller asks for `BitOrder::MsbFirst`.
use core::fmt;
use core::ops::{Add, AddAssign, Range};

use bitvec::prelude::*;

use crate::error::Error;

/// Order in which the bits of an integer (or of each byte) are laid out in a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitOrder {
    LsbFirst,
    MsbFirst,
}

/// Order in which the bytes of a buffer are laid out in a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// Keep the buffer's own byte order
    MsbyFirst,
    /// Reverse the buffer before laying it out
    LsbyFirst,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bits(BitVec<u8, Lsb0>);

impl Bits {
    pub fn new() -> Self {
        Self(BitVec::new())
    }

    pub fn zeros(len: usize) -> Self {
        Self(bitvec![u8, Lsb0; 0; len])
    }

    pub fn ones(len: usize) -> Self {
        Self(bitvec![u8, Lsb0; 1; len])
    }

    /// Lay out the low `len` bits of `value`.  Fails rather than truncating if `value` has bits
    /// set above `len`, or if `len` is wider than a `u128`.
    pub fn from_value(value: u128, len: usize, order: BitOrder) -> Result<Self, Error> {
        if len > u128::BITS as usize {
            return Err(Error::BitLength {
                expected: u128::BITS as usize,
                actual: len,
            });
        }
        if len < u128::BITS as usize && value >> len != 0 {
            return Err(Error::ValueTooWide { value, bits: len });
        }

        let bit = |i: usize| (value >> i) & 1 == 1;
        let seq = match order {
            BitOrder::LsbFirst => (0..len).map(bit).collect(),
            BitOrder::MsbFirst => (0..len).rev().map(bit).collect(),
        };
        Ok(Self(seq))
    }

    /// Lay out every bit of `bytes`.
    pub fn from_bytes(bytes: &[u8], bit_order: BitOrder, byte_order: ByteOrder) -> Self {
        let mut seq = BitVec::with_capacity(bytes.len() * 8);
        let mut push_byte = |byte: u8| match bit_order {
            BitOrder::LsbFirst => seq.extend((0..8).map(|i| (byte >> i) & 1 == 1)),
            BitOrder::MsbFirst => seq.extend((0..8).rev().map(|i| (byte >> i) & 1 == 1)),
        };
        match byte_order {
            ByteOrder::MsbyFirst => bytes.iter().copied().for_each(&mut push_byte),
            ByteOrder::LsbyFirst => bytes.iter().rev().copied().for_each(&mut push_byte),
        }
        Self(seq)
    }

    /// Convert the whole sequence to an integer.  An empty sequence is zero.
    pub fn to_value(&self, order: BitOrder) -> Result<u128, Error> {
        if self.len() > u128::BITS as usize {
            return Err(Error::BitLength {
                expected: u128::BITS as usize,
                actual: self.len(),
            });
        }

        let value = match order {
            BitOrder::LsbFirst => self
                .0
                .iter()
                .rev()
                .map(|b| *b)
                .fold(0u128, |acc, b| (acc << 1) | b as u128),
            BitOrder::MsbFirst => self
                .0
                .iter()
                .by_vals()
                .fold(0u128, |acc, b| (acc << 1) | b as u128),
        };
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).map(|b| *b)
    }

    pub fn push(&mut self, bit: bool) {
        self.0.push(bit);
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().by_vals()
    }

    /// Copy out `range`.  Fails if the range runs past the end of the sequence.
    pub fn slice(&self, range: Range<usize>) -> Result<Bits, Error> {
        if range.start > range.end || range.end > self.len() {
            return Err(Error::BitLength {
                expected: range.end,
                actual: self.len(),
            });
        }
        Ok(Self(self.0[range].to_bitvec()))
    }

    pub fn as_bitslice(&self) -> &BitSlice<u8, Lsb0> {
        &self.0
    }

    /// Pack into bytes, first bit in bit 0 of the first byte.  Unused bits of the last byte are
    /// zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.len().div_ceil(8)];
        for (i, bit) in self.iter().enumerate() {
            if bit {
                out[i / 8] |= 1 << (i % 8);
            }
        }
        out
    }
}

impl From<&BitSlice<u8, Lsb0>> for Bits {
    fn from(slice: &BitSlice<u8, Lsb0>) -> Self {
        Self(slice.to_bitvec())
    }
}

impl FromIterator<bool> for Bits {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Add for Bits {
    type Output = Bits;

    fn add(mut self, other: Bits) -> Bits {
        self += other;
        self
    }
}

impl Add<&Bits> for Bits {
    type Output = Bits;

    fn add(mut self, other: &Bits) -> Bits {
        self.0.extend_from_bitslice(&other.0);
        self
    }
}

impl AddAssign for Bits {
    fn add_assign(&mut self, mut other: Bits) {
        self.0.append(&mut other.0);
    }
}

/// Prints the sequence as a binary number: the last bit shifted comes first.
impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0.iter().rev().map(|b| *b) {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits[{}]({})", self.len(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_lsb_first_puts_lsb_at_index_zero() {
        let bits = Bits::from_value(0b100101, 6, BitOrder::LsbFirst).unwrap();
        let seq: Vec<bool> = bits.iter().collect();
        assert_eq!(seq, vec![true, false, true, false, false, true]);
        assert_eq!(bits.to_value(BitOrder::LsbFirst).unwrap(), 0b100101);
    }

    #[test]
    fn value_msb_first_reverses_layout() {
        let bits = Bits::from_value(0b100110, 6, BitOrder::MsbFirst).unwrap();
        assert_eq!(bits.get(0), Some(true));
        assert_eq!(bits.get(5), Some(false));
        assert_eq!(bits.to_value(BitOrder::MsbFirst).unwrap(), 0b100110);
        assert_eq!(bits.to_value(BitOrder::LsbFirst).unwrap(), 0b011001);
    }

    #[test]
    fn from_value_refuses_to_truncate() {
        assert!(matches!(
            Bits::from_value(0x1FF, 8, BitOrder::LsbFirst),
            Err(Error::ValueTooWide { value: 0x1FF, bits: 8 })
        ));
        assert!(matches!(
            Bits::from_value(0, 129, BitOrder::LsbFirst),
            Err(Error::BitLength { .. })
        ));
        let full = Bits::from_value(u128::MAX, 128, BitOrder::LsbFirst).unwrap();
        assert_eq!(full.to_value(BitOrder::LsbFirst).unwrap(), u128::MAX);
    }

    #[test]
    fn to_value_rejects_sequences_wider_than_u128() {
        assert!(Bits::zeros(129).to_value(BitOrder::LsbFirst).is_err());
        assert_eq!(Bits::new().to_value(BitOrder::LsbFirst).unwrap(), 0);
    }

    #[test]
    fn concatenation_keeps_lengths_and_slices_back() {
        let cases = [(0u128, 0usize, 0x5u128, 3usize), (0x3F, 6, 0, 1), (0x1234, 16, 0xABCDE, 20)];
        for (a, alen, b, blen) in cases {
            let a = Bits::from_value(a, alen, BitOrder::LsbFirst).unwrap();
            let b = Bits::from_value(b, blen, BitOrder::LsbFirst).unwrap();
            let joined = a.clone() + &b;
            assert_eq!(joined.len(), alen + blen);
            assert_eq!(joined.slice(0..alen).unwrap(), a);
            assert_eq!(joined.slice(alen..alen + blen).unwrap(), b);
        }
    }

    #[test]
    fn slice_past_the_end_fails() {
        let bits = Bits::ones(4);
        assert!(bits.slice(2..5).is_err());
        assert_eq!(bits.slice(4..4).unwrap().len(), 0);
    }

    #[test]
    fn bytes_lsb_first_keep_byte_order() {
        let bits = Bits::from_bytes(&[0x01, 0x80], BitOrder::LsbFirst, ByteOrder::MsbyFirst);
        assert_eq!(bits.len(), 16);
        assert_eq!(bits.get(0), Some(true));
        assert_eq!(bits.get(15), Some(true));
        assert_eq!(bits.iter().filter(|b| *b).count(), 2);
        assert_eq!(bits.to_bytes(), vec![0x01, 0x80]);
    }

    #[test]
    fn bytes_msb_first_and_reversed() {
        let bits = Bits::from_bytes(&[0x01, 0x80], BitOrder::MsbFirst, ByteOrder::LsbyFirst);
        // 0x80 goes first, MSB first: a single leading one
        assert_eq!(bits.get(0), Some(true));
        assert_eq!(bits.get(15), Some(true));
        assert_eq!(bits.get(7), Some(false));
    }

    #[test]
    fn to_bytes_zero_fills_the_last_byte() {
        let bits = Bits::ones(10);
        assert_eq!(bits.to_bytes(), vec![0xFF, 0x03]);
    }

    #[test]
    fn display_prints_binary_number() {
        let bits = Bits::from_value(0b100110, 6, BitOrder::LsbFirst).unwrap();
        assert_eq!(bits.to_string(), "100110");
        assert_eq!(format!("{bits:?}"), "Bits[6](100110)");
    }
}
