//! Bluetooth hardware addresses.

use core::fmt;
use core::str::FromStr;

use crate::error::AddressParseError;

/// A 48-bit Bluetooth hardware address.
///
/// The address is carried as a `u64` the way BLE stacks report it; only
/// the low 48 bits hold address information, and only those participate
/// in the MAC rendering. The full raw value is preserved so a value
/// obtained from a platform API round-trips unchanged.
///
/// # Examples
///
/// ```
/// use desklink_types::BtAddress;
///
/// let address = BtAddress::new(0xE7A1_F784_2F17);
/// assert_eq!(address.to_string(), "E7:A1:F7:84:2F:17");
/// assert_eq!("e7:a1:f7:84:2f:17".parse::<BtAddress>(), Ok(address));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BtAddress(u64);

/// Bits of a `u64` that carry address information.
const ADDRESS_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;

impl BtAddress {
    /// Creates an address from a raw `u64` as reported by the platform.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` value, including any bits above the low 48.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the six address octets, most significant first.
    ///
    /// # Examples
    ///
    /// ```
    /// use desklink_types::BtAddress;
    ///
    /// let address = BtAddress::new(0xE7A1_F784_2F17);
    /// assert_eq!(address.octets(), [0xE7, 0xA1, 0xF7, 0x84, 0x2F, 0x17]);
    /// ```
    #[must_use]
    pub const fn octets(self) -> [u8; 6] {
        let bits = self.0 & ADDRESS_MASK;
        [
            (bits >> 40) as u8,
            (bits >> 32) as u8,
            (bits >> 24) as u8,
            (bits >> 16) as u8,
            (bits >> 8) as u8,
            bits as u8,
        ]
    }

    /// Creates an address from six octets, most significant first.
    #[must_use]
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(
            ((octets[0] as u64) << 40)
                | ((octets[1] as u64) << 32)
                | ((octets[2] as u64) << 24)
                | ((octets[3] as u64) << 16)
                | ((octets[4] as u64) << 8)
                | (octets[5] as u64),
        )
    }
}

impl fmt::Display for BtAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.octets();
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl From<u64> for BtAddress {
    fn from(raw: u64) -> Self {
        Self::new(raw)
    }
}

impl From<[u8; 6]> for BtAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self::from_octets(octets)
    }
}

impl From<BtAddress> for u64 {
    fn from(address: BtAddress) -> Self {
        address.as_u64()
    }
}

impl FromStr for BtAddress {
    type Err = AddressParseError;

    /// Parses a MAC-style address, case-insensitive, with `:` or `-`
    /// octet separators or none at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use desklink_types::BtAddress;
    ///
    /// let expected = BtAddress::new(0xE7A1_F784_2F17);
    /// assert_eq!("E7:A1:F7:84:2F:17".parse(), Ok(expected));
    /// assert_eq!("E7-A1-F7-84-2F-17".parse(), Ok(expected));
    /// assert_eq!("e7a1f7842f17".parse(), Ok(expected));
    /// ```
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut value: u64 = 0;
        let mut digits = 0usize;

        for ch in text.chars() {
            if ch == ':' || ch == '-' {
                continue;
            }
            let digit = ch
                .to_digit(16)
                .ok_or(AddressParseError::InvalidCharacter(ch))?;
            digits += 1;
            if digits <= 12 {
                value = (value << 4) | u64::from(digit);
            }
        }

        if digits != 12 {
            return Err(AddressParseError::InvalidLength(digits));
        }
        Ok(Self(value))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BtAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BtAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
