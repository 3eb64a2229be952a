// SPDX-License-Identifier: Apache-2.0

//! The twenty-two member alarm status enumeration, in canonical EPICS
//! ordinal order.

use serde::{Deserialize, Serialize};

/// Alarm status. Ordinals 0..=21 are the only inhabitants; order
/// matches the canonical EPICS status list and is load-bearing for
/// the status string array written to alarm-log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    NoAlarm = 0,
    Read = 1,
    Write = 2,
    HiHi = 3,
    High = 4,
    LoLo = 5,
    Low = 6,
    State = 7,
    Cos = 8,
    Comm = 9,
    Timeout = 10,
    HwLimit = 11,
    Calc = 12,
    Scan = 13,
    Link = 14,
    Soft = 15,
    BadSub = 16,
    Udf = 17,
    Disable = 18,
    Simm = 19,
    ReadAccess = 20,
    WriteAccess = 21,
}

const _: () = assert!(Status::ALL.len() == 22);

impl Status {
    pub const ALL: [Status; 22] = [
        Status::NoAlarm,
        Status::Read,
        Status::Write,
        Status::HiHi,
        Status::High,
        Status::LoLo,
        Status::Low,
        Status::State,
        Status::Cos,
        Status::Comm,
        Status::Timeout,
        Status::HwLimit,
        Status::Calc,
        Status::Scan,
        Status::Link,
        Status::Soft,
        Status::BadSub,
        Status::Udf,
        Status::Disable,
        Status::Simm,
        Status::ReadAccess,
        Status::WriteAccess,
    ];

    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Status::NoAlarm => "NO_ALARM",
            Status::Read => "READ",
            Status::Write => "WRITE",
            Status::HiHi => "HIHI",
            Status::High => "HIGH",
            Status::LoLo => "LOLO",
            Status::Low => "LOW",
            Status::State => "STATE",
            Status::Cos => "COS",
            Status::Comm => "COMM",
            Status::Timeout => "TIMEOUT",
            Status::HwLimit => "HWLIMIT",
            Status::Calc => "CALC",
            Status::Scan => "SCAN",
            Status::Link => "LINK",
            Status::Soft => "SOFT",
            Status::BadSub => "BAD_SUB",
            Status::Udf => "UDF",
            Status::Disable => "DISABLE",
            Status::Simm => "SIMM",
            Status::ReadAccess => "READ_ACCESS",
            Status::WriteAccess => "WRITE_ACCESS",
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn from_str_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == label)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_starts_as_specified() {
        let expected = [
            "NO_ALARM", "READ", "WRITE", "HIHI", "HIGH", "LOLO", "LOW", "STATE", "COS", "COMM",
            "TIMEOUT", "HWLIMIT", "CALC", "SCAN", "LINK", "SOFT", "BAD_SUB", "UDF", "DISABLE",
            "SIMM", "READ_ACCESS", "WRITE_ACCESS",
        ];
        for (s, label) in Status::ALL.iter().zip(expected.iter()) {
            assert_eq!(s.as_str(), *label);
        }
    }

    #[test]
    fn ordinals_round_trip() {
        for (i, s) in Status::ALL.iter().enumerate() {
            assert_eq!(s.ordinal() as usize, i);
            assert_eq!(Status::from_ordinal(i as u8), Some(*s));
        }
        assert_eq!(Status::from_ordinal(22), None);
    }
}
