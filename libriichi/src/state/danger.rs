//! Deal-in danger of each tile against each opponent, read from the kawas.
//!
//! Every possible wait shape gets a weight from the number of unseen tiles
//! that could form it, scaled by how common the shape is and by suji hints
//! in the discards. Waits on genbutsu get no weight at all.
use super::PlayerState;
use super::item::KawaItem;
use std::sync::LazyLock;

use derivative::Derivative;
use tinyvec::{ArrayVec, TinyVec};

/// Wall-based safety of a tile against ryanmen, derived from how many of
/// the tiles next to it are still unseen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WallDanger {
    #[default]
    None,
    /// Only tanki and shanpon remain possible.
    DoubleNoChance,
    /// Ryanmen is impossible.
    NoChance,
    /// Every tile that could form a ryanmen has one copy left.
    DoubleOneChance,
    /// One side has both forming tiles at one copy left.
    MixedOneChance,
    OneChance,
}

impl WallDanger {
    /// Channel in the one-hot wall plane, `None` has no channel.
    #[must_use]
    pub const fn channel(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::DoubleNoChance => Some(0),
            Self::NoChance => Some(1),
            Self::DoubleOneChance => Some(2),
            Self::MixedOneChance => Some(3),
            Self::OneChance => Some(4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKind {
    Ryanmen,
    Kanchan,
    Penchan,
    Tanki,
    Shanpon,
}

/// A wait shape independent of any board.
#[derive(Debug, Clone)]
pub struct WaitShape {
    /// Tiles held by the waiting player.
    pub tiles: ArrayVec<[u8; 2]>,
    /// Tiles completing the shape.
    pub waits: ArrayVec<[u8; 2]>,
    pub kind: WaitKind,
}

/// Danger of one opponent.
#[derive(Debug, Clone)]
pub struct PlayerDanger {
    pub safe: [bool; 34],
    pub tile_weights: [f32; 34],
    /// Weights split by wait kind, ryanmen / kanchan + penchan / tanki +
    /// shanpon.
    pub kind_weights: [[f32; 34]; 3],
    /// Some non-genbutsu wait on the tile involves a dora.
    pub dora_involved: [bool; 34],
}

pub static POSSIBLE_WAITS: LazyLock<Vec<WaitShape>> = LazyLock::new(|| {
    let shape = |tiles: &[u8], waits: &[u8], kind| WaitShape {
        tiles: tiles.iter().copied().collect(),
        waits: waits.iter().copied().collect(),
        kind,
    };

    let mut ret = vec![];
    for suit in 0..3 {
        let base = suit * 9;
        for n in 1..7 {
            ret.push(shape(
                &[base + n, base + n + 1],
                &[base + n - 1, base + n + 2],
                WaitKind::Ryanmen,
            ));
        }
        for n in 1..8 {
            ret.push(shape(&[base + n - 1, base + n + 1], &[base + n], WaitKind::Kanchan));
        }
        ret.push(shape(&[base, base + 1], &[base + 2], WaitKind::Penchan));
        ret.push(shape(&[base + 7, base + 8], &[base + 6], WaitKind::Penchan));
    }
    for t in 0..34 {
        ret.push(shape(&[t], &[t], WaitKind::Shanpon));
        ret.push(shape(&[t], &[t], WaitKind::Tanki));
    }
    ret
});

/// Reading of one opponent's kawa.
#[derive(Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct KawaReading {
    #[derivative(Default(value = "[false; 34]"))]
    pub safe: [bool; 34],
    /// Deaka'd ids of the discards before the riichi declaration.
    pub discards_before_riichi: Vec<u8>,
    pub riichi_tile: Option<u8>,
}

#[must_use]
pub fn calculate_player_danger(
    reading: &KawaReading,
    unseen: &[u8; 34],
    doras: &[u8],
) -> PlayerDanger {
    let mut ret = PlayerDanger {
        safe: reading.safe,
        tile_weights: [0.; 34],
        kind_weights: [[0.; 34]; 3],
        dora_involved: [false; 34],
    };

    for wait in POSSIBLE_WAITS.iter() {
        if wait.waits.iter().any(|&t| reading.safe[t as usize]) {
            continue;
        }

        let combinations = if wait.kind == WaitKind::Shanpon {
            let n = unseen[wait.tiles[0] as usize];
            n * n.saturating_sub(1) / 2
        } else {
            wait.tiles.iter().map(|&t| unseen[t as usize]).product()
        };
        if combinations == 0 {
            continue;
        }

        let mut ura_suji = false;
        let mut matagi_suji_early = false;
        let mut matagi_suji_riichi = false;
        if wait.kind == WaitKind::Ryanmen {
            ura_suji = reading.discards_before_riichi.iter().any(|d| {
                matches!(d % 9, 3..6)
                    && !wait.tiles.contains(d)
                    && wait.tiles.iter().any(|t| d.abs_diff(*t) == 2 && d / 9 == t / 9)
            });
            matagi_suji_early = reading
                .discards_before_riichi
                .iter()
                .any(|d| wait.tiles.contains(d));
            matagi_suji_riichi = reading
                .riichi_tile
                .is_some_and(|r| wait.tiles.contains(&r));
        }
        let riichi_suji_trap = wait.kind == WaitKind::Kanchan
            && reading.riichi_tile.is_some_and(|r| {
                matches!(r % 9, 3..6)
                    && wait.waits.iter().any(|w| r.abs_diff(*w) == 3 && r / 9 == w / 9)
            });
        let dora_involved = wait
            .tiles
            .iter()
            .chain(wait.waits.iter())
            .any(|t| doras.contains(t));

        let mut weight = combinations as f32
            * match wait.kind {
                WaitKind::Ryanmen => 3.5,
                WaitKind::Tanki | WaitKind::Shanpon if wait.tiles[0] >= 27 => 1.7,
                WaitKind::Tanki | WaitKind::Shanpon => 1.0,
                WaitKind::Kanchan if riichi_suji_trap => 2.6,
                WaitKind::Kanchan => 0.21,
                WaitKind::Penchan => 1.0,
            };
        if ura_suji {
            weight *= 1.3;
        }
        if matagi_suji_early {
            weight *= 0.6;
        }
        if matagi_suji_riichi {
            weight *= 1.2;
        }
        if dora_involved {
            weight *= 1.2;
        }

        let kind_idx = match wait.kind {
            WaitKind::Ryanmen => 0,
            WaitKind::Kanchan | WaitKind::Penchan => 1,
            WaitKind::Tanki | WaitKind::Shanpon => 2,
        };
        for &w in &wait.waits {
            let w = w as usize;
            ret.tile_weights[w] += weight;
            ret.kind_weights[kind_idx][w] += weight;
            ret.dora_involved[w] |= dora_involved;
        }
    }
    ret
}

/// No-chance and one-chance reading of the whole wall.
#[must_use]
pub fn calculate_wall_danger(unseen: &[u8; 34]) -> [WallDanger; 34] {
    let mut ret = [WallDanger::None; 34];

    for base in [0, 9, 18] {
        let u = |n: usize| unseen[base + n];

        for n in 0..3 {
            if u(n + 1) == 1 && u(n + 2) == 1 {
                ret[base + n] = WallDanger::DoubleOneChance;
            } else if u(n + 1) == 1 || u(n + 2) == 1 {
                ret[base + n] = WallDanger::OneChance;
            }
        }
        for n in 3..6 {
            let lower = u(n - 2) == 1 || u(n - 1) == 1;
            let upper = u(n + 1) == 1 || u(n + 2) == 1;
            if lower && upper {
                ret[base + n] = if u(n - 2) == 1 && u(n - 1) == 1 && u(n + 1) == 1 && u(n + 2) == 1 {
                    WallDanger::DoubleOneChance
                } else if u(n - 2) == 1 && u(n - 1) == 1 || u(n + 1) == 1 && u(n + 2) == 1 {
                    WallDanger::MixedOneChance
                } else {
                    WallDanger::OneChance
                };
            }
        }
        for n in 6..9 {
            if u(n - 2) == 1 && u(n - 1) == 1 {
                ret[base + n] = WallDanger::DoubleOneChance;
            } else if u(n - 2) == 1 || u(n - 1) == 1 {
                ret[base + n] = WallDanger::OneChance;
            }
        }

        for n in 0..3 {
            if u(n + 1) == 0 || u(n + 2) == 0 {
                ret[base + n] = WallDanger::NoChance;
            }
        }
        for n in 3..6 {
            if (u(n - 2) == 0 || u(n - 1) == 0) && (u(n + 1) == 0 || u(n + 2) == 0) {
                ret[base + n] = WallDanger::NoChance;
            }
        }
        for n in 6..9 {
            if u(n - 2) == 0 || u(n - 1) == 0 {
                ret[base + n] = WallDanger::NoChance;
            }
        }

        if u(1) == 0 || u(2) == 0 {
            ret[base] = WallDanger::DoubleNoChance;
        }
        if u(2) == 0 || u(0) == 0 && u(3) == 0 {
            ret[base + 1] = WallDanger::DoubleNoChance;
        }
        for n in 2..=6 {
            if u(n - 2) == 0 && u(n + 1) == 0
                || u(n - 1) == 0 && u(n + 1) == 0
                || u(n - 1) == 0 && u(n + 2) == 0
            {
                ret[base + n] = WallDanger::DoubleNoChance;
            }
        }
        if u(6) == 0 || u(5) == 0 && u(8) == 0 {
            ret[base + 7] = WallDanger::DoubleNoChance;
        }
        if u(6) == 0 || u(7) == 0 {
            ret[base + 8] = WallDanger::DoubleNoChance;
        }
    }
    ret
}

/// Genbutsu of the three opponents (relative seats 1, 2, 3), including
/// tiles passed by them since their last tedashi.
#[must_use]
pub fn determine_safe_tiles(kawa: &[TinyVec<[Option<KawaItem>; 24]>; 4]) -> [[bool; 34]; 3] {
    let mut safe = [[false; 34]; 3];
    let mut temporary = [[false; 34]; 3];

    let turns = kawa.iter().map(|k| k.len()).max().unwrap_or_default();
    for turn in 0..turns {
        for (actor, k) in kawa.iter().enumerate() {
            let Some(Some(item)) = k.get(turn) else {
                continue;
            };
            let tile = item.sutehai.tile.deaka().as_usize();
            for t in &mut temporary {
                t[tile] = true;
            }
            if actor != 0 {
                safe[actor - 1][tile] = true;
                if item.sutehai.is_tedashi {
                    temporary[actor - 1] = [false; 34];
                }
            }
        }
    }

    for (s, t) in safe.iter_mut().zip(&temporary) {
        for (s, &t) in s.iter_mut().zip(t) {
            *s |= t;
        }
    }
    safe
}

impl PlayerState {
    #[must_use]
    pub fn unseen_tiles(&self) -> [u8; 34] {
        self.tiles_seen.map(|s| 4 - s)
    }

    /// Danger of each of the three opponents, indexed by relative seat - 1.
    #[must_use]
    pub fn board_danger(&self) -> [PlayerDanger; 3] {
        let unseen = self.unseen_tiles();
        let doras: ArrayVec<[u8; 5]> = self
            .dora_indicators
            .iter()
            .map(|ind| ind.next().as_u8())
            .collect();
        let safe = determine_safe_tiles(&self.kawa);

        [1, 2, 3].map(|rel| {
            let sutehais = || self.kawa[rel].iter().flatten().map(|item| item.sutehai);
            let reading = KawaReading {
                safe: safe[rel - 1],
                discards_before_riichi: sutehais()
                    .take_while(|s| !s.is_riichi)
                    .map(|s| s.tile.deaka().as_u8())
                    .collect(),
                riichi_tile: sutehais()
                    .find(|s| s.is_riichi)
                    .map(|s| s.tile.deaka().as_u8()),
            };
            calculate_player_danger(&reading, &unseen, &doras)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hand::hand;
    use crate::tuz;

    #[test]
    fn wall() {
        let mut unseen = [4; 34];
        unseen[tuz!(2m)] = 0;
        unseen[tuz!(5p)] = 1;
        unseen[tuz!(6p)] = 1;
        let wall = calculate_wall_danger(&unseen);
        assert_eq!(wall[tuz!(1m)], WallDanger::DoubleNoChance);
        assert_eq!(wall[tuz!(3m)], WallDanger::None);
        assert_eq!(wall[tuz!(7p)], WallDanger::DoubleOneChance);
        assert_eq!(wall[tuz!(3p)], WallDanger::OneChance);
        assert_eq!(wall[tuz!(9s)], WallDanger::None);
        assert_eq!(wall[tuz!(E)], WallDanger::None);
    }

    #[test]
    fn genbutsu_has_no_weight() {
        let mut reading = KawaReading::default();
        reading.safe[tuz!(4m)] = true;
        let unseen = hand("1111222233334444m").unwrap().map(|c| 4 - c);
        let danger = calculate_player_danger(&reading, &unseen, &[]);
        assert_eq!(danger.tile_weights[tuz!(4m)], 0.);
        assert!(danger.tile_weights[tuz!(5p)] > 0.);
        // 1m only completes 23m, which has no copies left
        assert_eq!(danger.kind_weights[0][tuz!(1m)], 0.);
        assert!(danger.kind_weights[2][tuz!(E)] > 0.);
    }
}
