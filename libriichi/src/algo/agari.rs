//! Winning hand decomposition and shape-based yaku detection.
//!
//! Situational yakus such as riichi, menzen tsumo, haitei, rinshan and
//! chankan are not handled here, they are the caller's business.
use super::shanten;
use crate::tile::Tile;
use crate::{matches_tu8, tu8};
use std::cmp::Ordering;
use std::iter;
use tinyvec::ArrayVec;

/// One way to split a 3n+2 concealed hand into mentsu and a pair, or into
/// seven pairs.
#[derive(Debug, Default, Clone)]
pub struct Div {
    pub pair_tile: u8,
    /// Lowest tile of each mentsu, all deaka'd.
    pub kotsu: ArrayVec<[u8; 4]>,
    pub shuntsu: ArrayVec<[u8; 4]>,
    pub chitoi_pairs: ArrayVec<[u8; 7]>,
    pub has_chitoi: bool,
    pub has_chuuren: bool,
    pub has_ittsuu: bool,
    pub has_ryanpeikou: bool,
    pub has_ipeikou: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agari {
    Normal { han: u8 },
    Yakuman(u8),
}

#[derive(Debug)]
pub struct AgariCalculator<'a> {
    /// Must include the winning tile (i.e. must be 3n+2)
    pub tehai: &'a [u8; 34],
    /// `self.chis.is_empty() && self.pons.is_empty() && self.minkans.is_empty()`
    pub is_menzen: bool,
    pub chis: &'a [u8],
    pub pons: &'a [u8],
    pub minkans: &'a [u8],
    pub ankans: &'a [u8],
    pub bakaze: u8,
    pub jikaze: u8,
    /// Must be deaka'd
    pub winning_tile: u8,
    /// Only used to decide whether a concealed triplet completed by the
    /// winning tile counts as an ankou.
    pub is_ron: bool,
}

struct DivWorker<'a> {
    sup: &'a AgariCalculator<'a>,
    div: &'a Div,
    winning_tile_makes_minkou: bool,
}

impl PartialOrd for Agari {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Agari {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Yakuman(l), Self::Yakuman(r)) => l.cmp(r),
            (Self::Yakuman(_), Self::Normal { .. }) => Ordering::Greater,
            (Self::Normal { .. }, Self::Yakuman(_)) => Ordering::Less,
            (Self::Normal { han: l }, Self::Normal { han: r }) => l.cmp(r),
        }
    }
}

/// All the divisions of a 3n+2 hand. Empty if the hand is not complete.
#[must_use]
pub fn divisions(tehai: &[u8; 34]) -> Vec<Div> {
    let total: u8 = tehai.iter().sum();
    let mut ret = vec![];
    if total % 3 != 2 {
        return ret;
    }

    let has_chuuren = total == 14
        && (0..3).any(|kind| {
            let suit = &tehai[kind * 9..kind * 9 + 9];
            suit.iter().map(|&c| c as u32).sum::<u32>() == 14
                && suit[0] >= 3
                && suit[8] >= 3
                && suit[1..8].iter().all(|&c| c >= 1)
        });

    if total == 14 && tehai.iter().all(|&c| c == 0 || c == 2) {
        ret.push(Div {
            chitoi_pairs: tehai
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c == 2)
                .map(|(t, _)| t as u8)
                .collect(),
            has_chitoi: true,
            ..Default::default()
        });
    }

    let mut counts = *tehai;
    for pair in 0..34 {
        if counts[pair] < 2 {
            continue;
        }
        counts[pair] -= 2;
        let mut kotsu = ArrayVec::new();
        let mut shuntsu = ArrayVec::new();
        split_mentsu(&mut counts, 0, &mut kotsu, &mut shuntsu, &mut |kotsu, shuntsu| {
            ret.push(make_div(pair as u8, kotsu, shuntsu, has_chuuren));
        });
        counts[pair] += 2;
    }

    ret
}

fn split_mentsu(
    counts: &mut [u8; 34],
    start: usize,
    kotsu: &mut ArrayVec<[u8; 4]>,
    shuntsu: &mut ArrayVec<[u8; 4]>,
    on_found: &mut impl FnMut(&ArrayVec<[u8; 4]>, &ArrayVec<[u8; 4]>),
) {
    let Some(i) = (start..34).find(|&i| counts[i] > 0) else {
        on_found(kotsu, shuntsu);
        return;
    };
    if kotsu.len() + shuntsu.len() >= 4 {
        return;
    }

    if counts[i] >= 3 {
        counts[i] -= 3;
        kotsu.push(i as u8);
        split_mentsu(counts, i, kotsu, shuntsu, on_found);
        kotsu.pop();
        counts[i] += 3;
    }
    if i < 3 * 9 && i % 9 < 7 && counts[i + 1] > 0 && counts[i + 2] > 0 {
        counts[i] -= 1;
        counts[i + 1] -= 1;
        counts[i + 2] -= 1;
        shuntsu.push(i as u8);
        split_mentsu(counts, i, kotsu, shuntsu, on_found);
        shuntsu.pop();
        counts[i] += 1;
        counts[i + 1] += 1;
        counts[i + 2] += 1;
    }
}

fn make_div(
    pair_tile: u8,
    kotsu: &ArrayVec<[u8; 4]>,
    shuntsu: &ArrayVec<[u8; 4]>,
    has_chuuren: bool,
) -> Div {
    let mut sorted = shuntsu.clone();
    sorted.sort_unstable();
    let has_ryanpeikou = sorted.len() == 4 && sorted[0] == sorted[1] && sorted[2] == sorted[3];
    let has_ipeikou = !has_ryanpeikou && sorted.windows(2).any(|w| w[0] == w[1]);
    let has_ittsuu = (0..3).any(|kind| {
        [0, 3, 6]
            .iter()
            .all(|&num| sorted.contains(&(kind * 9 + num)))
    });
    Div {
        pair_tile,
        kotsu: kotsu.clone(),
        shuntsu: shuntsu.clone(),
        has_chuuren,
        has_ittsuu,
        has_ryanpeikou,
        has_ipeikou,
        ..Default::default()
    }
}

#[inline]
const fn is_yaokyuu_id(t: u8) -> bool {
    t >= 3 * 9 || t % 9 == 0 || t % 9 == 8
}

impl AgariCalculator<'_> {
    #[inline]
    #[must_use]
    pub fn has_yaku(&self) -> bool {
        self.search_yakus().is_some()
    }

    /// The best shape-based result among all divisions, `None` if the hand is
    /// not complete or has no yaku.
    #[must_use]
    pub fn search_yakus(&self) -> Option<Agari> {
        debug_assert_eq!(
            self.is_menzen,
            self.chis.is_empty() && self.pons.is_empty() && self.minkans.is_empty(),
        );
        if self.is_menzen && shanten::calc_kokushi(self.tehai) == -1 {
            return Some(Agari::Yakuman(1));
        }
        divisions(self.tehai)
            .iter()
            .filter_map(|div| DivWorker::new(self, div).search_yakus())
            .max()
    }
}

impl<'a> DivWorker<'a> {
    fn new(sup: &'a AgariCalculator<'a>, div: &'a Div) -> Self {
        let mut ret = Self {
            sup,
            div,
            winning_tile_makes_minkou: false,
        };
        ret.winning_tile_makes_minkou = ret.winning_tile_makes_minkou();
        ret
    }

    /// On ron, a concealed triplet of the winning tile is a minkou unless the
    /// winning tile can be read as part of a shuntsu instead.
    fn winning_tile_makes_minkou(&self) -> bool {
        let winning_tile = self.sup.winning_tile;
        if !self.sup.is_ron || !self.div.kotsu.contains(&winning_tile) {
            return false;
        }
        if winning_tile >= 3 * 9 {
            return true;
        }
        let kind = winning_tile / 9;
        let num = winning_tile % 9;
        let low = kind * 9 + num.saturating_sub(2);
        let high = kind * 9 + num.min(6);
        !(low..=high).any(|t| self.div.shuntsu.contains(&t))
    }

    fn all_kotsu_and_kantsu(&self) -> impl Iterator<Item = u8> + '_ {
        self.div
            .kotsu
            .iter()
            .chain(self.sup.pons)
            .chain(self.sup.minkans)
            .chain(self.sup.ankans)
            .copied()
    }

    fn all_shuntsu(&self) -> impl Iterator<Item = u8> + '_ {
        self.div.shuntsu.iter().chain(self.sup.chis).copied()
    }

    /// Every tile group of the hand represented by one tile of it, used for
    /// suit and terminal checks. Shuntsu are represented by both ends.
    fn all_group_tiles(&self) -> Vec<u8> {
        if self.div.has_chitoi {
            return self.div.chitoi_pairs.to_vec();
        }
        self.all_kotsu_and_kantsu()
            .chain(self.all_shuntsu().flat_map(|s| [s, s + 2]))
            .chain(iter::once(self.div.pair_tile))
            .collect()
    }

    fn has_pinfu(&self) -> bool {
        let pair = self.div.pair_tile;
        self.sup.is_menzen
            && self.div.shuntsu.len() == 4
            && !matches_tu8!(pair, P | F | C)
            && pair != self.sup.bakaze
            && pair != self.sup.jikaze
            && self.div.shuntsu.iter().any(|&s| {
                let num = s % 9 + 1;
                num <= 6 && s == self.sup.winning_tile
                    || num >= 2 && s + 2 == self.sup.winning_tile
            })
    }

    fn search_yakus(&self) -> Option<Agari> {
        let mut han = 0;
        let mut yakuman = 0;
        let is_menzen = self.sup.is_menzen;
        let div = self.div;

        if self.has_pinfu() {
            han += 1;
        }
        if div.has_chitoi {
            han += 2;
        }
        if is_menzen && div.has_ryanpeikou {
            han += 3;
        } else if is_menzen && div.has_ipeikou {
            han += 1;
        }
        if is_menzen && div.has_chuuren {
            yakuman += 1;
        }

        let groups = self.all_group_tiles();
        let has_tanyao = groups.iter().all(|&t| !is_yaokyuu_id(t));
        if has_tanyao {
            han += 1;
        }

        let has_toitoi = !div.has_chitoi && self.all_shuntsu().next().is_none();
        if has_toitoi {
            han += 2;
        }

        let suits: ArrayVec<[u8; 4]> = {
            let mut suits = ArrayVec::<[u8; 4]>::new();
            for kind in groups.iter().map(|&t| t / 9) {
                if !suits.contains(&kind) {
                    suits.push(kind);
                }
            }
            suits
        };
        let has_jihai = suits.contains(&3);
        match (suits.len(), has_jihai) {
            (1, true) => yakuman += 1,
            (1, false) => han += 5 + is_menzen as u8,
            (2, true) => han += 2 + is_menzen as u8,
            _ => {}
        }

        if !div.has_chitoi {
            if div.has_ittsuu {
                han += 1 + is_menzen as u8;
            } else {
                let mut marks = [0_u8; 3];
                for s in self.all_shuntsu() {
                    match s % 9 {
                        0 => marks[s as usize / 9] |= 0b001,
                        3 => marks[s as usize / 9] |= 0b010,
                        6 => marks[s as usize / 9] |= 0b100,
                        _ => {}
                    }
                }
                if marks.contains(&0b111) {
                    han += 1;
                }
            }

            let mut s_counter = [0_u8; 9];
            for s in self.all_shuntsu() {
                s_counter[s as usize % 9] |= 0b1 << (s / 9);
            }
            if s_counter.contains(&0b111) {
                han += 1 + is_menzen as u8;
            }
            let mut k_counter = [0_u8; 9];
            for k in self.all_kotsu_and_kantsu().filter(|&k| k < 3 * 9) {
                k_counter[k as usize % 9] |= 0b1 << (k / 9);
            }
            if k_counter.contains(&0b111) {
                han += 2;
            }

            let ankous_count = self.sup.ankans.len() + div.kotsu.len()
                - self.winning_tile_makes_minkou as usize;
            match ankous_count {
                4 => yakuman += 1,
                3 => han += 2,
                _ => {}
            }
            match self.sup.ankans.len() + self.sup.minkans.len() {
                4 => yakuman += 1,
                3 => han += 2,
                _ => {}
            }

            let has_ryuisou = self
                .all_kotsu_and_kantsu()
                .chain(iter::once(div.pair_tile))
                .all(|k| matches_tu8!(k, 2s | 3s | 4s | 6s | 8s | F))
                && self.all_shuntsu().all(|s| s == tu8!(2s));
            if has_ryuisou {
                yakuman += 1;
            }

            let mut jihai_kotsu = [false; 7];
            for k in self.all_kotsu_and_kantsu().filter(|&k| k >= 3 * 9) {
                jihai_kotsu[k as usize - 3 * 9] = true;
            }
            if jihai_kotsu[self.sup.bakaze as usize - 3 * 9] {
                han += 1;
            }
            if jihai_kotsu[self.sup.jikaze as usize - 3 * 9] {
                han += 1;
            }
            let saneins = jihai_kotsu[4..].iter().filter(|&&b| b).count() as u8;
            han += saneins;
            if saneins == 3 {
                yakuman += 1;
            } else if saneins == 2 && matches_tu8!(div.pair_tile, P | F | C) {
                han += 2;
            }
            let winds = jihai_kotsu[..4].iter().filter(|&&b| b).count();
            if winds == 4 || (winds == 3 && matches_tu8!(div.pair_tile, E | S | W | N)) {
                yakuman += 1;
            }
        }

        let all_yaokyuu_sets = if div.has_chitoi {
            div.chitoi_pairs.iter().all(|&t| is_yaokyuu_id(t))
        } else {
            self.all_kotsu_and_kantsu()
                .chain(iter::once(div.pair_tile))
                .all(is_yaokyuu_id)
                && self.all_shuntsu().all(|s| matches!(s % 9, 0 | 6))
        };
        if all_yaokyuu_sets {
            let is_routou = div.has_chitoi || has_toitoi;
            match (is_routou, has_jihai) {
                (true, true) => han += 2,
                (true, false) => yakuman += 1,
                (false, true) => han += 1 + is_menzen as u8,
                (false, false) => han += 2 + is_menzen as u8,
            }
        }

        if yakuman > 0 {
            Some(Agari::Yakuman(yakuman))
        } else if han > 0 {
            Some(Agari::Normal { han })
        } else {
            None
        }
    }
}

/// `tehai` must already contain `tile`. `true` is returned if making an ankan
/// with the tile is legal under the riichi'd `tehai`, which is the case iff
/// the waits do not change. Whether the shape or yaku change is not checked.
///
/// The behavior is undefined if `tehai` is not tenpai.
#[must_use]
pub fn check_ankan_after_riichi(tehai: &[u8; 34], len_div3: u8, tile: Tile) -> bool {
    let tile_id = tile.deaka().as_usize();
    if tehai[tile_id] != 4 {
        return false;
    }
    if tile_id >= 3 * 9 {
        return true;
    }
    let mut tehai_before_tsumo = *tehai;
    tehai_before_tsumo[tile_id] -= 1;
    (0..34)
        .filter(|&t| {
            if tehai_before_tsumo[t] == 4 {
                return false;
            }
            let mut tmp = tehai_before_tsumo;
            tmp[t] += 1;
            shanten::calc_all(&tmp, len_div3) == -1
        })
        .all(|wait| {
            if wait == tile_id {
                return false;
            }
            let mut tehai_after = *tehai;
            tehai_after[tile_id] = 0;
            tehai_after[wait] += 1;
            shanten::calc_normal(&tehai_after, len_div3 - 1) == -1
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hand::hand;

    fn calc<'a>(tehai: &'a [u8; 34], winning_tile: u8, is_ron: bool) -> AgariCalculator<'a> {
        AgariCalculator {
            tehai,
            is_menzen: true,
            chis: &[],
            pons: &[],
            minkans: &[],
            ankans: &[],
            bakaze: tu8!(E),
            jikaze: tu8!(S),
            winning_tile,
            is_ron,
        }
    }

    #[test]
    fn ankan_after_riichi() {
        let test_one = |tehai_str, tile_str: &str, len_div3, expected| {
            let mut tehai = hand(tehai_str).unwrap();
            let tile: Tile = tile_str.parse().unwrap();
            tehai[tile.as_usize()] += 1;
            assert_eq!(
                check_ankan_after_riichi(&tehai, len_div3, tile),
                expected,
                "failed for {tehai_str} + {tile_str}, expected {expected}",
            );
        };
        test_one("12345m 567s 11222z", "S", 4, true);
        test_one("12345m 444567s 11z", "4s", 4, true);
        test_one("22m 11112356p 444s", "4s", 4, true);
        test_one("123456m 4445s 111z", "4s", 4, false);
        test_one("1113444p 222z", "1p", 3, true);
        test_one("1113444p 222z", "4p", 3, false);
        test_one("1113444p 222z", "S", 3, true);
        test_one("23m 999p 33345666s", "6s", 4, true);
        test_one("23m 999p 33345666s", "9p", 4, true);
        test_one("1113445678999m", "1m", 4, true);
        test_one("1113445678999m", "9m", 4, false);
    }

    #[test]
    fn divisions_of() {
        let divs = divisions(&hand("111222333m 456p 77z").unwrap());
        assert_eq!(divs.len(), 2);
        assert!(divs.iter().any(|d| d.kotsu.len() == 3));
        assert!(divs.iter().any(|d| d.shuntsu.len() == 4 && !d.has_ryanpeikou));

        let divs = divisions(&hand("11223344556677p").unwrap());
        assert!(divs.iter().any(|d| d.has_chitoi));
        assert!(divs.iter().any(|d| d.has_ryanpeikou));

        assert!(divisions(&hand("12345m 567s 11223z").unwrap()).is_empty());
        assert!(divisions(&hand("1112345678999m").unwrap()).is_empty());
    }

    #[test]
    fn yaku() {
        // pinfu tanyao
        let tehai = hand("234m 345p 456s 678s 55p").unwrap();
        assert_eq!(
            calc(&tehai, tu8!(6s), true).search_yakus(),
            Some(Agari::Normal { han: 2 }),
        );

        // kanchan ron without any yaku
        let tehai = hand("123m 456p 234s 789s 99m").unwrap();
        assert!(!calc(&tehai, tu8!(5p), true).has_yaku());

        // junchan
        let tehai = hand("123m 789p 123s 789s 99m").unwrap();
        assert_eq!(
            calc(&tehai, tu8!(8p), true).search_yakus(),
            Some(Agari::Normal { han: 3 }),
        );

        // yakuhai
        let tehai = hand("234m 789p 123s 99m 555z").unwrap();
        assert_eq!(
            calc(&tehai, tu8!(P), true).search_yakus(),
            Some(Agari::Normal { han: 1 }),
        );

        // chiitoitsu
        let tehai = hand("1133m 55p 77s 2244z 66z").unwrap();
        assert!(calc(&tehai, tu8!(F), true).has_yaku());

        // kokushi
        let tehai = hand("19m 19p 19s 12345677z").unwrap();
        assert_eq!(
            calc(&tehai, tu8!(C), true).search_yakus(),
            Some(Agari::Yakuman(1)),
        );

        // chuuren
        let tehai = hand("11123455678999m").unwrap();
        assert!(matches!(
            calc(&tehai, tu8!(5m), false).search_yakus(),
            Some(Agari::Yakuman(_)),
        ));
    }

    #[test]
    fn open_hand_yaku() {
        // open tanyao
        let tehai = hand("234m 456p 66s").unwrap();
        let chis = [tu8!(2s)];
        let pons = [tu8!(5m)];
        let calc = AgariCalculator {
            tehai: &tehai,
            is_menzen: false,
            chis: &chis,
            pons: &pons,
            minkans: &[],
            ankans: &[],
            bakaze: tu8!(E),
            jikaze: tu8!(S),
            winning_tile: tu8!(6s),
            is_ron: true,
        };
        assert!(calc.has_yaku());

        // open hand with a terminal and nothing else
        let tehai = hand("234m 456p 99s").unwrap();
        let calc = AgariCalculator {
            tehai: &tehai,
            ..calc
        };
        assert!(!calc.has_yaku());
    }

    #[test]
    fn ron_on_triplet_is_not_ankou() {
        // three concealed triplets, but the third is completed by ron
        let tehai = hand("111m 333p 555s 789s 22z").unwrap();
        let tsumo = calc(&tehai, tu8!(5s), false).search_yakus();
        let ron = calc(&tehai, tu8!(5s), true).search_yakus();
        assert!(tsumo > ron);
    }
}
