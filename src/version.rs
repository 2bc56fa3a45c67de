//! Packed binary-coded-decimal device version numbers.
//!
//! HID devices report their firmware revision as a packed BCD integer
//! (e.g. `0x0102` for release 1.0.2). [`VersionCode`] decomposes that value
//! into major/minor/sub-minor parts by treating the hex rendering as the
//! digit string: the last two characters are the minor and sub-minor digits,
//! everything before them is the major version.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decomposed device version (`major.minor.sub_minor`).
///
/// `raw` keeps the lowercase hex rendering the split was derived from, which
/// is handy for diagnostics when a device packs something unusual.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCode {
    pub major: u32,
    pub minor: u8,
    pub sub_minor: u8,
    pub raw: String,
}

impl VersionCode {
    /// Parses a packed BCD version integer.
    ///
    /// Returns `None` when the hex rendering has fewer than three characters,
    /// when the minor/sub-minor characters are not decimal digits, or when
    /// the major prefix is not a decimal integer. Negative values never
    /// parse.
    pub fn parse(packed: i64) -> Option<VersionCode> {
        if packed < 0 {
            return None;
        }
        let hex = format!("{packed:x}");
        if hex.len() < 3 {
            return None;
        }

        let (major_str, tail) = hex.split_at(hex.len() - 2);
        let mut digits = tail.chars();
        let minor = digits.next()?.to_digit(10)? as u8;
        let sub_minor = digits.next()?.to_digit(10)? as u8;
        let major = major_str.parse::<u32>().ok()?;

        Some(VersionCode {
            major,
            minor,
            sub_minor,
            raw: hex,
        })
    }
}

impl fmt::Display for VersionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.sub_minor)
    }
}
