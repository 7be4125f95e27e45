use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

const MJAI_PAI_STRINGS: [&str; 38] = [
    "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", // m
    "1p", "2p", "3p", "4p", "5p", "6p", "7p", "8p", "9p", // p
    "1s", "2s", "3s", "4s", "5s", "6s", "7s", "8s", "9s", // s
    "E", "S", "W", "N", "P", "F", "C", // z
    "5mr", "5pr", "5sr", // a
    "?", // unknown
];
const MJAI_PAI_STRINGS_LEN: usize = MJAI_PAI_STRINGS.len();

/// A tile id in `0..38`.
///
/// `0..34` are the 34 kinds, `34..37` are the red fives in the order of m, p
/// and s, and `37` is a hidden tile as it appears in opponents' haipai.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile(u8);

#[derive(Debug, Error)]
pub enum InvalidTile {
    #[error("tile id {0} is out of range")]
    Number(usize),
    #[error("invalid tile string {0:?}")]
    String(String),
}

impl Tile {
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn deaka(self) -> Self {
        match self.0 {
            34 => Self(4),
            35 => Self(4 + 9),
            36 => Self(4 + 9 + 9),
            _ => self,
        }
    }

    #[inline]
    #[must_use]
    pub const fn akaize(self) -> Self {
        match self.0 {
            4 => Self(34),
            13 => Self(35),
            22 => Self(36),
            _ => self,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_aka(self) -> bool {
        matches!(self.0, 34..=36)
    }

    #[inline]
    #[must_use]
    pub const fn is_jihai(self) -> bool {
        matches!(self.0, 27..=33)
    }

    #[inline]
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        self.0 >= 37
    }

    /// The dora indicated by `self` as an indicator, always deaka'd.
    #[must_use]
    pub const fn next(self) -> Self {
        let tile = self.deaka();
        let kind = tile.0 / 9;
        let num = tile.0 % 9;
        if kind < 3 {
            Self(kind * 9 + (num + 1) % 9)
        } else if num < 4 {
            Self(3 * 9 + (num + 1) % 4)
        } else {
            Self(3 * 9 + 4 + (num - 4 + 1) % 3)
        }
    }

    /// The indicator of `self` as a dora, always deaka'd.
    #[must_use]
    pub const fn prev(self) -> Self {
        let tile = self.deaka();
        let kind = tile.0 / 9;
        let num = tile.0 % 9;
        if kind < 3 {
            Self(kind * 9 + (num + 8) % 9)
        } else if num < 4 {
            Self(3 * 9 + (num + 3) % 4)
        } else {
            Self(3 * 9 + 4 + (num - 4 + 2) % 3)
        }
    }
}

impl TryFrom<u8> for Tile {
    type Error = InvalidTile;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::try_from(v as usize)
    }
}

impl TryFrom<usize> for Tile {
    type Error = InvalidTile;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        if v >= MJAI_PAI_STRINGS_LEN {
            Err(InvalidTile::Number(v))
        } else {
            Ok(Self(v as u8))
        }
    }
}

impl FromStr for Tile {
    type Err = InvalidTile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MJAI_PAI_STRINGS
            .iter()
            .position(|&pai| pai == s)
            .map(|id| Self(id as u8))
            .ok_or_else(|| InvalidTile::String(s.to_owned()))
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MJAI_PAI_STRINGS[self.as_usize()])
    }
}

impl Serialize for Tile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(MJAI_PAI_STRINGS[self.as_usize()])
    }
}

impl<'de> Deserialize<'de> for Tile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&s), &"a mjai tile"))
    }
}

#[macro_export]
macro_rules! tu8 {
    (1m) => { 0_u8 };
    (2m) => { 1_u8 };
    (3m) => { 2_u8 };
    (4m) => { 3_u8 };
    (5m) => { 4_u8 };
    (6m) => { 5_u8 };
    (7m) => { 6_u8 };
    (8m) => { 7_u8 };
    (9m) => { 8_u8 };
    (1p) => { 9_u8 };
    (2p) => { 10_u8 };
    (3p) => { 11_u8 };
    (4p) => { 12_u8 };
    (5p) => { 13_u8 };
    (6p) => { 14_u8 };
    (7p) => { 15_u8 };
    (8p) => { 16_u8 };
    (9p) => { 17_u8 };
    (1s) => { 18_u8 };
    (2s) => { 19_u8 };
    (3s) => { 20_u8 };
    (4s) => { 21_u8 };
    (5s) => { 22_u8 };
    (6s) => { 23_u8 };
    (7s) => { 24_u8 };
    (8s) => { 25_u8 };
    (9s) => { 26_u8 };
    (E) => { 27_u8 };
    (S) => { 28_u8 };
    (W) => { 29_u8 };
    (N) => { 30_u8 };
    (P) => { 31_u8 };
    (F) => { 32_u8 };
    (C) => { 33_u8 };
    (5mr) => { 34_u8 };
    (5pr) => { 35_u8 };
    (5sr) => { 36_u8 };
    (?) => { 37_u8 };
    ($first:tt, $($left:tt),*) => {
        [$crate::tu8!($first), $($crate::tu8!($left)),*]
    };
}

#[macro_export]
macro_rules! tuz {
    ($s:tt) => {
        $crate::tu8!($s) as usize
    };
    ($first:tt, $($left:tt),*) => {
        [$crate::tuz!($first), $($crate::tuz!($left)),*]
    };
}

#[macro_export]
macro_rules! must_tile {
    ($id:expr) => {
        $crate::tile::Tile::try_from($id).unwrap()
    };
}

#[macro_export]
macro_rules! t {
    ($s:tt) => {
        $crate::must_tile!($crate::tu8!($s))
    };
    ($first:tt, $($left:tt),*) => {
        [$crate::t!($first), $($crate::t!($left)),*]
    };
}

#[macro_export]
macro_rules! matches_tu8 {
    ($o:expr, $($s:tt)|*) => {
        matches!($o, $($crate::tu8!($s))|*)
    };
}
