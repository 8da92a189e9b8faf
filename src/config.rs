//! Adapter settings that come in as strings from the command line or the environment.
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// TCK frequency in hertz.  Parses `500k`, `10M` or a plain number of hertz, up to 30 MHz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Frequency(u32);

impl Frequency {
    pub const MAX: Frequency = Frequency(30_000_000);

    pub fn new(hz: u32) -> Result<Self, Error> {
        if hz > Self::MAX.0 {
            return Err(Error::InvalidFrequency(hz.to_string()));
        }
        Ok(Self(hz))
    }

    pub fn hz(self) -> u32 {
        self.0
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency(10_000_000)
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidFrequency(s.to_string());

        let (digits, scale) = match s.trim().strip_suffix('k') {
            Some(d) => (d, 1_000u64),
            None => match s.trim().strip_suffix('M') {
                Some(d) => (d, 1_000_000),
                None => (s.trim(), 1),
            },
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hz = digits
            .parse::<u64>()
            .ok()
            .and_then(|d| d.checked_mul(scale))
            .filter(|hz| *hz <= u64::from(Self::MAX.0))
            .ok_or_else(invalid)?;
        Ok(Self(hz as u32))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            hz if hz >= 1_000_000 && hz % 1_000_000 == 0 => write!(f, "{}M", hz / 1_000_000),
            hz if hz >= 1_000 && hz % 1_000 == 0 => write!(f, "{}k", hz / 1_000),
            hz => write!(f, "{hz}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixes() {
        assert_eq!("10M".parse::<Frequency>().unwrap().hz(), 10_000_000);
        assert_eq!("500k".parse::<Frequency>().unwrap().hz(), 500_000);
        assert_eq!("30M".parse::<Frequency>().unwrap(), Frequency::MAX);
        assert_eq!("1200".parse::<Frequency>().unwrap().hz(), 1200);
        assert_eq!("0".parse::<Frequency>().unwrap().hz(), 0);
    }

    #[test]
    fn rejects_garbage_and_overclocking() {
        for s in ["", "k", "31M", "10G", "1.5M", "-1k", "99999999999999999999M"] {
            assert!(
                matches!(s.parse::<Frequency>(), Err(Error::InvalidFrequency(_))),
                "{s:?} should not parse"
            );
        }
        assert!(Frequency::new(30_000_001).is_err());
    }

    #[test]
    fn displays_with_the_largest_exact_suffix() {
        assert_eq!(Frequency::default().to_string(), "10M");
        assert_eq!(Frequency::new(1_500_000).unwrap().to_string(), "1500k");
        assert_eq!(Frequency::new(92).unwrap().to_string(), "92");
    }
}
