use crate::{constants::SPEED_OF_LIGHT_M_S, error::Error};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Carrier {
    /// L1 (GPS/QZSS) same frequency as E1
    #[default]
    L1,
    /// L2 (GPS/QZSS)
    L2,
    /// L5 (GPS/QZSS) same frequency as E5A and B2A
    L5,
    /// E1 (Galileo)
    E1,
    /// E5A (Galileo) same frequency as L5
    E5A,
    /// B1I (BDS)
    B1I,
    /// B2A (BDS) same frequency as L5 and E5A
    B2A,
    /// G1 (Glonass FDMA, center channel)
    G1,
    /// G2 (Glonass FDMA, center channel)
    G2,
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::L2 => write!(f, "L2"),
            Self::L5 => write!(f, "L5"),
            Self::E1 => write!(f, "E1"),
            Self::E5A => write!(f, "E5A"),
            Self::B1I => write!(f, "B1I"),
            Self::B2A => write!(f, "B2A"),
            Self::G1 => write!(f, "G1"),
            Self::G2 => write!(f, "G2"),
        }
    }
}

impl Carrier {
    /// Nominal carrier frequency, in Hertz
    pub fn frequency_hz(&self) -> f64 {
        match self {
            Self::L1 | Self::E1 => 1575.42E6_f64,
            Self::L2 => 1227.60E6_f64,
            Self::L5 | Self::E5A | Self::B2A => 1176.45E6_f64,
            Self::B1I => 1561.098E6_f64,
            Self::G1 => 1602.0E6_f64,
            Self::G2 => 1246.0E6_f64,
        }
    }

    /// Nominal wavelength, in meters
    pub fn wavelength_m(&self) -> f64 {
        SPEED_OF_LIGHT_M_S / self.frequency_hz()
    }

    /// True if this signal lies in the upper (L1-like) frequency range.
    /// The primary band drives single frequency navigation and the
    /// ionosphere free combination.
    pub(crate) fn is_primary_band(&self) -> bool {
        matches!(self, Self::L1 | Self::E1 | Self::B1I | Self::G1)
    }

    /// Classify sampled carrier frequency into one of the supported signals.
    /// Glonass FDMA channels (k in -7..=+6) spread ±4 MHz around the G1/G2
    /// centers, hence the wide windows there.
    pub fn from_frequency_hz(freq_hz: f64) -> Result<Self, Error> {
        const TOLERANCE_HZ: f64 = 1.0E6;
        for carrier in [Self::L1, Self::L2, Self::L5, Self::B1I] {
            if (freq_hz - carrier.frequency_hz()).abs() < TOLERANCE_HZ {
                return Ok(carrier);
            }
        }
        if (1598.0E6..=1610.0E6).contains(&freq_hz) {
            return Ok(Self::G1);
        }
        if (1242.0E6..=1250.0E6).contains(&freq_hz) {
            return Ok(Self::G2);
        }
        Err(Error::UnknownCarrierFrequency)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classification() {
        for (freq_hz, expected) in [
            (1575.42E6, Carrier::L1),
            (1227.60E6, Carrier::L2),
            (1176.45E6, Carrier::L5),
            (1561.098E6, Carrier::B1I),
            (1602.0E6, Carrier::G1),
            (1605.375E6, Carrier::G1),
            (1246.4375E6, Carrier::G2),
        ] {
            assert_eq!(Carrier::from_frequency_hz(freq_hz), Ok(expected));
        }
        assert!(Carrier::from_frequency_hz(433.0E6).is_err());
    }

    #[test]
    fn wavelength() {
        assert!((Carrier::L1.wavelength_m() - 0.19029367).abs() < 1.0E-6);
    }
}
