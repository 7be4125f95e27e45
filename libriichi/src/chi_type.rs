use crate::tile::Tile;
use std::fmt;

use anyhow::{Result, bail};
use serde::Serialize;

/// Position of the called tile in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChiType {
    /// The called tile is the lowest, e.g. 3m called with 45m.
    Low,
    /// The called tile is in the middle, e.g. 4m called with 35m.
    Mid,
    /// The called tile is the highest, e.g. 5m called with 34m.
    High,
}

impl ChiType {
    /// Figures out the chi type from the two consumed tiles and the called
    /// tile. Returns an error if they do not form a run.
    pub fn new(consumed: [Tile; 2], tile: Tile) -> Result<Self> {
        let a = consumed[0].deaka().as_u8();
        let b = consumed[1].deaka().as_u8();
        let (min, max) = (a.min(b), a.max(b));
        let t = tile.deaka().as_u8();

        if tile.is_jihai() || consumed.iter().any(|c| c.is_jihai()) || min / 9 != t / 9 {
            bail!("{consumed:?} and {tile} are not of the same suit");
        }

        let ret = if max == min + 1 && t + 1 == min {
            Self::Low
        } else if max == min + 2 && t == min + 1 {
            Self::Mid
        } else if max == min + 1 && t == max + 1 {
            Self::High
        } else {
            bail!("{consumed:?} and {tile} do not form a run");
        };
        if min / 9 != max / 9 {
            bail!("{consumed:?} are not of the same suit");
        }
        Ok(ret)
    }
}

impl fmt::Display for ChiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::t;

    #[test]
    fn chi_types() {
        assert_eq!(ChiType::new(t![4m, 5mr], t!(3m)).unwrap(), ChiType::Low);
        assert_eq!(ChiType::new(t![6p, 4p], t!(5pr)).unwrap(), ChiType::Mid);
        assert_eq!(ChiType::new(t![7s, 8s], t!(9s)).unwrap(), ChiType::High);
        ChiType::new(t![8m, 9m], t!(1p)).unwrap_err();
        ChiType::new(t![8m, 9m], t!(1m)).unwrap_err();
        ChiType::new(t![E, S], t!(W)).unwrap_err();
        ChiType::new(t![9m, 1p], t!(2p)).unwrap_err();
    }
}
