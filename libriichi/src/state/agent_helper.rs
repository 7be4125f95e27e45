use super::PlayerState;
use crate::algo::shanten;
use crate::tuz;

impl PlayerState {
    /// Discardable tiles by kind, red fives folded into their kind. Must be
    /// called at 3n+2.
    #[must_use]
    pub fn discard_candidates(&self) -> [bool; 34] {
        let full = self.discard_candidates_aka();
        let mut ret = [false; 34];
        ret.copy_from_slice(&full[..34]);
        ret[tuz!(5m)] |= full[tuz!(5mr)];
        ret[tuz!(5p)] |= full[tuz!(5pr)];
        ret[tuz!(5s)] |= full[tuz!(5sr)];
        ret
    }

    /// Aka dora covered version of `discard_candidates`.
    ///
    /// A plain five is only a candidate if a plain one is actually in hand,
    /// so a hand holding only the aka can discard nothing but the aka.
    #[must_use]
    pub fn discard_candidates_aka(&self) -> [bool; 37] {
        let mut ret = [false; 37];
        if !self.last_cans.can_discard {
            return ret;
        }

        if self.riichi_accepted[0] {
            // tsumogiri only
            if let Some(tile) = self.last_self_tsumo {
                ret[tile.as_usize()] = true;
            }
            return ret;
        }

        for (i, count) in self.tehai.iter().copied().enumerate() {
            if count == 0 {
                continue;
            }
            ret[i] = if self.riichi_declared[0] {
                if self.shanten == 1 {
                    self.next_shanten_discards[i]
                } else {
                    self.keep_shanten_discards[i]
                }
            } else {
                !self.forbidden_tiles[i]
            };
        }

        for (aka_id, kind) in tuz![5m, 5p, 5s].into_iter().enumerate() {
            if ret[kind] && self.akas_in_hand[aka_id] {
                ret[tuz!(5mr) + aka_id] = true;
                ret[kind] = self.tehai[kind] > 1;
            }
        }
        ret
    }

    /// Calculate the actual shanten at this point. Unlike `self.shanten`, this
    /// function properly calculates the shanten at 3n+2, which follows the
    /// definition of shanten most people acknowledge.
    #[must_use]
    pub fn real_time_shanten(&self) -> i8 {
        if !self.last_cans.can_discard {
            return self.shanten;
        }
        if self.shanten > 0 {
            return if self.has_next_shanten_discard {
                self.shanten - 1
            } else {
                self.shanten
            };
        }
        if let Some(tile) = self.last_self_tsumo {
            return if self.waits[tile.deaka().as_usize()] { -1 } else { 0 };
        }
        shanten::calc_all(&self.tehai, self.tehai_len_div3)
    }
}
