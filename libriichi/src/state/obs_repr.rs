//! Observation planes for the policy.
//!
//! Every version is its own function listing its planes in a frozen order,
//! and none of them is defined in terms of another. A plane is one row of 34
//! columns, either filled entirely for a scalar or marked at tile columns.
use super::PlayerState;
use super::danger::calculate_wall_danger;
use crate::algo::shanten;
use crate::consts::{OBS_WIDTH, obs_shape};
use crate::error::BotError;
use crate::tile::Tile;

use ndarray::prelude::*;

const KAWA_LEN: usize = 24;
const UKEIRE_THRESHOLDS: [u32; 7] = [1, 5, 10, 15, 20, 30, 40];

struct ObsEncoderContext<'a> {
    state: &'a PlayerState,
    arr: Array2<f32>,
    idx: usize,
}

impl<'a> ObsEncoderContext<'a> {
    fn new(state: &'a PlayerState, channels: usize) -> Self {
        Self {
            state,
            arr: Array2::zeros((channels, OBS_WIDTH)),
            idx: 0,
        }
    }

    fn finish(self) -> Array2<f32> {
        assert_eq!(self.idx, self.arr.nrows(), "channel count mismatch");
        self.arr
    }

    fn skip(&mut self, n: usize) {
        self.idx += n;
    }

    fn fill(&mut self, v: f32) {
        self.arr.row_mut(self.idx).fill(v);
        self.idx += 1;
    }

    fn flag(&mut self, b: bool) {
        self.fill(if b { 1. } else { 0. });
    }

    fn mark(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        for t in tiles {
            self.arr[[self.idx, t.deaka().as_usize()]] = 1.;
        }
        self.idx += 1;
    }

    fn mask(&mut self, cols: &[bool; 34]) {
        for (i, _) in cols.iter().enumerate().filter(|&(_, &b)| b) {
            self.arr[[self.idx, i]] = 1.;
        }
        self.idx += 1;
    }

    /// `n` planes, the `v`-th filled. Values past the end land on the last.
    fn one_hot(&mut self, v: usize, n: usize) {
        self.arr.row_mut(self.idx + v.min(n - 1)).fill(1.);
        self.idx += n;
    }

    /// `n` planes, plane `k` marks the columns whose count exceeds `k`.
    fn thresholds(&mut self, counts: &[u8; 34], n: u8) {
        for k in 0..n {
            for (i, &c) in counts.iter().enumerate() {
                if c > k {
                    self.arr[[self.idx, i]] = 1.;
                }
            }
            self.idx += 1;
        }
    }

    fn encode_tehai(&mut self) {
        let st = self.state;
        self.thresholds(&st.tehai, 4);
        for b in st.akas_in_hand {
            self.flag(b);
        }
    }

    fn encode_scores(&mut self, scales: &[f32]) {
        for &scale in scales {
            for score in self.state.scores {
                self.fill((score as f32 / scale).clamp(0., 1.));
            }
        }
    }

    fn encode_round(&mut self) {
        let st = self.state;
        self.one_hot(st.rank as usize, 4);
        self.one_hot(st.kyoku as usize, 4);
        self.one_hot(st.honba as usize, 5);
        self.one_hot(st.kyotaku as usize, 5);
        self.one_hot(wind_index(st.bakaze), 4);
        self.one_hot(wind_index(st.jikaze), 4);
    }

    fn encode_doras(&mut self) {
        let st = self.state;
        for i in 0..5 {
            self.mark(st.dora_indicators.get(i).copied());
        }
        self.thresholds(&st.dora_factor, 4);
        for b in st.akas_seen {
            self.flag(b);
        }
        self.thresholds(&st.tiles_seen, 4);
    }

    fn encode_riichi(&mut self) {
        let st = self.state;
        for b in st.riichi_declared {
            self.flag(b);
        }
        for b in st.riichi_accepted {
            self.flag(b);
        }
    }

    fn encode_kawa(&mut self) {
        let st = self.state;
        for kawa in &st.kawa {
            for slot in 0..KAWA_LEN {
                let Some(Some(item)) = kawa.get(slot) else {
                    self.skip(8);
                    continue;
                };
                let sutehai = item.sutehai;
                self.mark([sutehai.tile]);
                self.flag(sutehai.tile.is_aka());
                self.flag(sutehai.is_dora);
                self.flag(sutehai.is_tedashi);
                self.flag(sutehai.is_riichi);
                match &item.chi_pon {
                    Some(chi_pon) => {
                        self.mark(chi_pon.consumed);
                        self.mark([chi_pon.target_tile]);
                    }
                    None => self.skip(2),
                }
                self.mark(item.kan.iter().copied());
            }
        }
    }

    fn encode_last_sutehais(&mut self) {
        for s in self.state.last_tedashis {
            self.mark(s.map(|s| s.tile));
        }
        for s in self.state.riichi_sutehais {
            self.mark(s.map(|s| s.tile));
        }
    }

    fn encode_fuuro(&mut self) {
        let st = self.state;
        for (melds, ankans) in st.melds.iter().zip(&st.ankan_overview) {
            for slot in 0..4 {
                match melds.get(slot) {
                    Some(meld) => {
                        self.mark(meld.tiles.iter().copied());
                        self.flag(meld.is_kan());
                    }
                    None => self.skip(2),
                }
            }
            self.mark(ankans.iter().copied());
        }
    }

    fn encode_progress(&mut self) {
        let st = self.state;
        for n in st.doras_owned {
            self.fill(f32::from(n) / 12.);
        }
        self.one_hot(st.tiles_left as usize / 7, 10);
        self.one_hot(st.kans_on_board as usize, 5);
    }

    fn encode_self(&mut self) {
        let st = self.state;
        self.flag(st.is_menzen);
        self.flag(st.at_furiten);
        self.flag(st.at_ippatsu);
        self.flag(st.can_w_riichi);
        self.flag(st.at_rinshan);
        self.flag(st.is_w_riichi);
        self.one_hot(st.shanten.clamp(0, 6) as usize, 7);

        self.mask(&st.waits);
        self.mask(&st.keep_shanten_discards);
        self.mask(&st.next_shanten_discards);
        self.mask(&st.forbidden_tiles);
        self.mask(&st.discarded_tiles);
        self.mark(st.last_self_tsumo);
        self.mark(st.last_kawa_tile);
    }

    fn encode_cans(&mut self) {
        let st = self.state;
        let cans = st.last_cans;
        for b in [
            cans.can_discard,
            cans.can_chi_low,
            cans.can_chi_mid,
            cans.can_chi_high,
            cans.can_pon,
            cans.can_daiminkan,
            cans.can_kakan,
            cans.can_ankan,
            cans.can_riichi,
            cans.can_tsumo_agari,
            cans.can_ron_agari,
            cans.can_ryukyoku,
        ] {
            self.flag(b);
        }
        self.mark(st.ankan_candidates.iter().copied());
        self.mark(st.kakan_candidates.iter().copied());
    }

    fn encode_kawa_lens(&mut self) {
        let st = self.state;
        for kawa in &st.kawa_overview {
            for len in [6, 12, 18] {
                self.flag(kawa.len() >= len);
            }
        }
    }

    fn encode_danger(&mut self) {
        let st = self.state;
        for danger in st.board_danger() {
            self.mask(&danger.safe);

            let max = danger.tile_weights.iter().copied().fold(0., f32::max);
            if max > 0. {
                for (i, w) in danger.tile_weights.iter().enumerate() {
                    self.arr[[self.idx, i]] = w / max;
                }
            }
            self.idx += 1;

            for weights in danger.kind_weights {
                self.mask(&weights.map(|w| w > 0.));
            }
            self.mask(&danger.dora_involved);
        }

        let unseen = st.unseen_tiles();
        for (i, wall) in calculate_wall_danger(&unseen)
            .into_iter()
            .enumerate()
        {
            if let Some(ch) = wall.channel() {
                self.arr[[self.idx + ch, i]] = 1.;
            }
        }
        self.skip(5);
        self.thresholds(&unseen, 4);
    }

    fn encode_discard_outlook(&mut self) {
        let st = self.state;
        let unseen = st.unseen_tiles();
        let candidates = st.discard_candidates();

        let base = self.idx;
        let mut tehai = st.tehai;
        for (discard, _) in candidates.iter().enumerate().filter(|&(_, &b)| b) {
            tehai[discard] -= 1;
            let shanten_after = shanten::calc_all(&tehai, st.tehai_len_div3);
            let ukeire = ukeire(&mut tehai, st.tehai_len_div3, shanten_after, &unseen);
            tehai[discard] += 1;

            self.arr[[base + shanten_after.clamp(0, 6) as usize, discard]] = 1.;
            for (k, &threshold) in UKEIRE_THRESHOLDS.iter().enumerate() {
                if ukeire >= threshold {
                    self.arr[[base + 7 + k, discard]] = 1.;
                }
            }
        }
        self.skip(7 + UKEIRE_THRESHOLDS.len());
    }

    fn encode_score_gaps(&mut self) {
        let scores = self.state.scores;
        for opponent in &scores[1..] {
            let gap = scores[0] - opponent;
            self.one_hot(((gap + 20000).max(0) / 4000) as usize, 10);
        }
        self.one_hot(self.state.at_turn as usize / 3, 7);
    }
}

/// Tiles that lower the shanten of a 3n+1 hand, weighted by unseen copies.
fn ukeire(tehai: &mut [u8; 34], len_div3: u8, shanten: i8, unseen: &[u8; 34]) -> u32 {
    let mut ret = 0;
    for t in 0..34 {
        if tehai[t] == 4 || unseen[t] == 0 {
            continue;
        }
        tehai[t] += 1;
        if shanten::calc_all(tehai, len_div3) < shanten {
            ret += u32::from(unseen[t]);
        }
        tehai[t] -= 1;
    }
    ret
}

const fn wind_index(wind: Tile) -> usize {
    wind.as_usize().saturating_sub(27)
}

fn encode_v1(ctx: &mut ObsEncoderContext<'_>) {
    ctx.encode_tehai();
    ctx.encode_scores(&[100_000.]);
    ctx.encode_round();
    ctx.encode_doras();
    ctx.encode_riichi();
    ctx.encode_kawa();
    ctx.encode_last_sutehais();
    ctx.encode_fuuro();
    ctx.encode_progress();
    ctx.encode_self();
    ctx.encode_cans();
    ctx.encode_kawa_lens();
}

fn encode_v2(ctx: &mut ObsEncoderContext<'_>) {
    ctx.encode_tehai();
    ctx.encode_scores(&[100_000., 30_000.]);
    ctx.encode_round();
    ctx.encode_doras();
    ctx.encode_riichi();
    ctx.encode_kawa();
    ctx.encode_last_sutehais();
    ctx.encode_fuuro();
    ctx.encode_progress();
    ctx.encode_self();
    ctx.encode_cans();
    ctx.encode_kawa_lens();
}

fn encode_v3(ctx: &mut ObsEncoderContext<'_>) {
    ctx.encode_tehai();
    ctx.encode_scores(&[100_000., 30_000.]);
    ctx.encode_round();
    ctx.encode_doras();
    ctx.encode_riichi();
    ctx.encode_kawa();
    ctx.encode_fuuro();
    ctx.encode_progress();
    ctx.encode_self();
    ctx.encode_cans();
    ctx.encode_kawa_lens();
}

fn encode_v4(ctx: &mut ObsEncoderContext<'_>) {
    ctx.encode_tehai();
    ctx.encode_scores(&[100_000., 30_000.]);
    ctx.encode_round();
    ctx.encode_doras();
    ctx.encode_riichi();
    ctx.encode_kawa();
    ctx.encode_fuuro();
    ctx.encode_progress();
    ctx.encode_self();
    ctx.encode_cans();
    ctx.encode_kawa_lens();
    ctx.encode_danger();
    ctx.encode_discard_outlook();
    ctx.encode_score_gaps();
}

impl PlayerState {
    /// Encodes the observation of `version` with shape `obs_shape(version)`.
    pub fn encode_obs(&self, version: u32) -> Result<Array2<f32>, BotError> {
        let (channels, _) = obs_shape(version)?;
        let mut ctx = ObsEncoderContext::new(self, channels);
        match version {
            1 => encode_v1(&mut ctx),
            2 => encode_v2(&mut ctx),
            3 => encode_v3(&mut ctx),
            _ => encode_v4(&mut ctx),
        }
        Ok(ctx.finish())
    }

    /// Writes the observation into a row-major buffer of exactly
    /// `channels * 34` floats.
    pub fn encode_obs_into(&self, version: u32, out: &mut [f32]) -> Result<(), BotError> {
        let (channels, width) = obs_shape(version)?;
        let expected = channels * width;
        if out.len() != expected {
            return Err(BotError::BufferSize {
                expected,
                actual: out.len(),
            });
        }
        let arr = self.encode_obs(version)?;
        for (o, &v) in out.iter_mut().zip(arr.iter()) {
            *o = v;
        }
        Ok(())
    }
}
