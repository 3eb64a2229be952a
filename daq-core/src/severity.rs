// SPDX-License-Identifier: Apache-2.0

//! The four-member alarm severity enumeration, in canonical ordinal
//! order.

use serde::{Deserialize, Serialize};

/// Alarm severity. Ordinals 0..=3 are the only inhabitants; order is
/// load-bearing (it is the order rows are written to the canonical
/// severity string array in alarm-log output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    NoAlarm = 0,
    Minor = 1,
    Major = 2,
    Invalid = 3,
}

const _: () = assert!(Severity::ALL.len() == 4);

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::NoAlarm,
        Severity::Minor,
        Severity::Major,
        Severity::Invalid,
    ];

    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::NoAlarm => "NO_ALARM",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Invalid => "INVALID",
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn from_str_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == label)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_stable_and_round_trip() {
        for (i, s) in Severity::ALL.iter().enumerate() {
            assert_eq!(s.ordinal() as usize, i);
            assert_eq!(Severity::from_ordinal(i as u8), Some(*s));
            assert_eq!(Severity::from_str_label(s.as_str()), Some(*s));
        }
    }

    #[test]
    fn unknown_ordinal_is_none() {
        assert_eq!(Severity::from_ordinal(4), None);
    }
}
