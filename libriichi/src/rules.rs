//! Rule predicates over 34-D tile counts, free of any game state.
//!
//! All `tehai` arguments are deaka'd counts of the concealed hand.
use crate::algo::{agari, shanten};
use crate::tile::Tile;
use crate::{must_tile, tuz};

use tinyvec::ArrayVec;

/// Chi options on a discarded tile, named after the position of the called
/// tile in the resulting run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChiCandidates {
    pub low: bool,
    pub mid: bool,
    pub high: bool,
}

impl ChiCandidates {
    #[inline]
    #[must_use]
    pub const fn any(self) -> bool {
        self.low || self.mid || self.high
    }
}

/// Chi is only allowed on a suited tile discarded by kamicha, and only if the
/// hand still has something to discard after kuikae is taken into account.
#[must_use]
pub fn can_chi(tehai: &[u8; 34], discarded: Tile, from_kamicha: bool) -> ChiCandidates {
    let mut ret = ChiCandidates::default();
    if !from_kamicha || discarded.is_jihai() {
        return ret;
    }

    let tid = discarded.deaka().as_usize();
    let num = tid % 9 + 1;
    if num <= 7 && tehai[tid + 1] > 0 && tehai[tid + 2] > 0 {
        let mut after = *tehai;
        after[tid] = 0;
        after[tid + 1] -= 1;
        after[tid + 2] -= 1;
        if num < 7 {
            // suji kuikae
            after[tid + 3] = 0;
        }
        ret.low = after.iter().any(|&c| c > 0);
    }
    if matches!(num, 2..=8) && tehai[tid - 1] > 0 && tehai[tid + 1] > 0 {
        let mut after = *tehai;
        after[tid] = 0;
        after[tid - 1] -= 1;
        after[tid + 1] -= 1;
        ret.mid = after.iter().any(|&c| c > 0);
    }
    if num >= 3 && tehai[tid - 2] > 0 && tehai[tid - 1] > 0 {
        let mut after = *tehai;
        after[tid] = 0;
        after[tid - 2] -= 1;
        after[tid - 1] -= 1;
        if num > 3 {
            after[tid - 3] = 0;
        }
        ret.high = after.iter().any(|&c| c > 0);
    }
    ret
}

#[inline]
#[must_use]
pub const fn can_pon(tehai: &[u8; 34], discarded: Tile) -> bool {
    tehai[discarded.deaka().as_usize()] >= 2
}

#[inline]
#[must_use]
pub const fn can_daiminkan(tehai: &[u8; 34], discarded: Tile, kans_on_board: u8) -> bool {
    kans_on_board < 4 && tehai[discarded.deaka().as_usize()] == 3
}

/// Deaka'd kinds with all four copies in hand.
#[must_use]
pub fn ankan_candidates(tehai: &[u8; 34], kans_on_board: u8) -> ArrayVec<[Tile; 3]> {
    let mut ret = ArrayVec::new();
    if kans_on_board >= 4 {
        return ret;
    }
    for (tid, _) in tehai.iter().enumerate().filter(|&(_, &c)| c == 4) {
        ret.push(must_tile!(tid));
    }
    ret
}

/// Deaka'd kinds that are the fourth tile of one of `pons`.
#[must_use]
pub fn kakan_candidates(tehai: &[u8; 34], pons: &[u8], kans_on_board: u8) -> ArrayVec<[Tile; 3]> {
    let mut ret = ArrayVec::new();
    if kans_on_board >= 4 {
        return ret;
    }
    for &p in pons {
        if tehai[p as usize] > 0 {
            ret.push(must_tile!(p));
        }
    }
    ret
}

/// `tehai` is the 3n+2 hand right after drawing `tsumo`. An ankan after
/// riichi must not change the waits.
#[inline]
#[must_use]
pub fn can_ankan_after_riichi(tehai: &[u8; 34], len_div3: u8, tsumo: Tile) -> bool {
    agari::check_ankan_after_riichi(tehai, len_div3, tsumo)
}

#[inline]
#[must_use]
pub const fn can_riichi(
    is_menzen: bool,
    tiles_left: u8,
    score: i32,
    shanten: i8,
    has_next_shanten_discard: bool,
) -> bool {
    is_menzen
        && tiles_left >= 4
        && score >= 1000
        && (shanten == 0 || shanten == 1 && has_next_shanten_discard)
}

/// Furiten by own discards, temporary and riichi furiten are tracked by
/// the state.
#[must_use]
pub fn is_furiten(waits: &[bool; 34], discarded_tiles: &[bool; 34]) -> bool {
    waits.iter().zip(discarded_tiles).any(|(&w, &d)| w && d)
}

/// Complete in any of the three shapes. `len_div3` accounts for the called
/// melds.
#[inline]
#[must_use]
pub fn is_winning_hand(tehai: &[u8; 34], len_div3: u8) -> bool {
    shanten::calc_all(tehai, len_div3) == -1
}

#[must_use]
pub fn yaokyuu_kind_count(tehai: &[u8; 34]) -> u8 {
    tuz![1m, 9m, 1p, 9p, 1s, 9s, E, S, W, N, P, F, C]
        .iter()
        .map(|&i| tehai[i].min(1))
        .sum()
}

/// Kyuushu kyuuhai, must only be offered on the first uninterrupted draw.
#[inline]
#[must_use]
pub fn can_kyuushu_kyuuhai(tehai: &[u8; 34]) -> bool {
    yaokyuu_kind_count(tehai) >= 9
}
