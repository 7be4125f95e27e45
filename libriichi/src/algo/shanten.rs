//! Shanten number calculation.
//!
//! Each suit is reduced to a 10-D distance vector, where `d[m]` is the
//! minimum number of tiles to draw to build exactly `m` mentsu out of that
//! suit and `d[5 + m]` the same but with an additional pair. The vectors of
//! the four suits are then merged, and the shanten number is the distance
//! of the whole hand minus one.
use ahash::AHashMap;
use std::cell::RefCell;

const INF: u8 = u8::MAX / 4;

type Distances = [u8; 10];

thread_local! {
    static SUHAI_CACHE: RefCell<AHashMap<u32, Distances>> = RefCell::new(AHashMap::new());
    static JIHAI_CACHE: RefCell<AHashMap<u32, Distances>> = RefCell::new(AHashMap::new());
}

fn cache_key(tiles: &[u8]) -> u32 {
    tiles.iter().fold(0, |acc, &c| acc * 5 + c as u32)
}

/// DP over the tile numbers of one suit. The state is the number of shuntsu
/// started at the previous two numbers, the mentsu count so far and whether
/// the pair has been placed.
fn calc_distances(tiles: &[u8], allow_shuntsu: bool) -> Distances {
    // [started at i-2][started at i-1][mentsu][has pair]
    let mut dp = [[[[INF; 2]; 5]; 5]; 5];
    dp[0][0][0][0] = 0;
    for (i, &have) in tiles.iter().enumerate() {
        let max_new_shuntsu = if allow_shuntsu && i + 2 < tiles.len() { 4 } else { 0 };
        let mut next = [[[[INF; 2]; 5]; 5]; 5];
        for a in 0..5 {
            for b in 0..5 - a {
                for m in 0..5 {
                    for p in 0..2 {
                        let cost = dp[a][b][m][p];
                        if cost >= INF {
                            continue;
                        }
                        for s in 0..=max_new_shuntsu {
                            for k in 0..2 {
                                for new_p in 0..2 - p {
                                    let need = a + b + s + 3 * k + 2 * new_p;
                                    let mentsu = m + s + k;
                                    if need > 4 || mentsu > 4 {
                                        continue;
                                    }
                                    let lack = (need as u8).saturating_sub(have);
                                    let slot = &mut next[b][s][mentsu][p + new_p];
                                    *slot = (*slot).min(cost + lack);
                                }
                            }
                        }
                    }
                }
            }
        }
        dp = next;
    }

    let mut ret = [INF; 10];
    for m in 0..5 {
        ret[m] = dp[0][0][m][0];
        ret[5 + m] = dp[0][0][m][1];
    }
    ret
}

fn suhai_distances(tiles: &[u8]) -> Distances {
    let key = cache_key(tiles);
    SUHAI_CACHE.with_borrow_mut(|cache| {
        *cache
            .entry(key)
            .or_insert_with(|| calc_distances(tiles, true))
    })
}

fn jihai_distances(tiles: &[u8]) -> Distances {
    let key = cache_key(tiles);
    JIHAI_CACHE.with_borrow_mut(|cache| {
        *cache
            .entry(key)
            .or_insert_with(|| calc_distances(tiles, false))
    })
}

fn merge(lhs: &Distances, rhs: &Distances) -> Distances {
    let mut ret = [INF; 10];
    for j in 0..5 {
        for k in 0..=j {
            ret[j] = ret[j].min(lhs[k] + rhs[j - k]);
            ret[5 + j] = ret[5 + j]
                .min(lhs[5 + k] + rhs[j - k])
                .min(lhs[k] + rhs[5 + j - k]);
        }
    }
    ret.iter_mut().for_each(|d| *d = (*d).min(INF));
    ret
}

/// `len_div3` must be within [0, 4].
#[must_use]
pub fn calc_normal(tiles: &[u8; 34], len_div3: u8) -> i8 {
    let len_div3 = len_div3 as usize;

    let mut ret = suhai_distances(&tiles[..9]);
    ret = merge(&ret, &suhai_distances(&tiles[9..2 * 9]));
    ret = merge(&ret, &suhai_distances(&tiles[2 * 9..3 * 9]));
    ret = merge(&ret, &jihai_distances(&tiles[3 * 9..]));

    ret[5 + len_div3] as i8 - 1
}

#[must_use]
pub fn calc_chitoi(tiles: &[u8; 34]) -> i8 {
    let mut pairs = 0;
    let mut kinds = 0;
    tiles.iter().filter(|&&c| c > 0).for_each(|&c| {
        kinds += 1;
        if c >= 2 {
            pairs += 1;
        }
    });

    let redunct = 7_u8.saturating_sub(kinds) as i8;
    7 - pairs + redunct - 1
}

#[must_use]
pub fn calc_kokushi(tiles: &[u8; 34]) -> i8 {
    let mut pairs = 0;
    let mut kinds = 0;

    crate::tuz![1m, 9m, 1p, 9p, 1s, 9s, E, S, W, N, P, F, C]
        .iter()
        .map(|&i| tiles[i])
        .filter(|&c| c > 0)
        .for_each(|c| {
            kinds += 1;
            if c >= 2 {
                pairs += 1;
            }
        });

    let redunct = (pairs > 0) as i8;
    14 - kinds - redunct - 1
}

/// Shanten number considering all of the three shapes, `-1` means a complete
/// hand. Chiitoitsu and kokushi are only considered when `len_div3` is 4.
#[must_use]
pub fn calc_all(tiles: &[u8; 34], len_div3: u8) -> i8 {
    let mut shanten = calc_normal(tiles, len_div3);
    if shanten <= 0 || len_div3 < 4 {
        return shanten;
    }

    shanten = shanten.min(calc_chitoi(tiles));
    if shanten > 0 {
        shanten.min(calc_kokushi(tiles))
    } else {
        shanten
    }
}
