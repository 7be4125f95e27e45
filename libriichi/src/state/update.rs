use super::PlayerState;
use super::action::ActionCandidate;
use super::item::{ChiPon, KawaItem, Meld, MeldKind, Sutehai};
use crate::algo::agari::AgariCalculator;
use crate::algo::shanten;
use crate::mjai::Event;
use crate::rankings::Rankings;
use crate::rules;
use crate::tile::Tile;
use crate::{matches_tu8, must_tile, tu8, tuz};
use std::cmp::Ordering;
use std::{iter, mem};

use anyhow::{Context, Result, bail, ensure};
use tinyvec::ArrayVec;

const TOTAL_TILES: u32 = 136;
/// Including the dora indicators.
const DEAD_WALL: u32 = 14;
const LIVE_WALL: u8 = 70;

#[derive(Clone, Copy)]
pub enum MoveType {
    Tsumo,
    Discard,
    FuuroConsume,
}

impl PlayerState {
    /// Applies `event` and returns the actions available right after it.
    ///
    /// The update is all or nothing: on error `self` is left as it was
    /// before the call.
    pub fn update(&mut self, event: &Event) -> Result<ActionCandidate> {
        if matches!(event, Event::None { .. }) {
            return Ok(ActionCandidate {
                target_actor: self.player_id,
                ..Default::default()
            });
        }

        let mut next = self.clone();
        let cans = next
            .update_inner(event)
            .with_context(|| format!("on event {event:?}"))?;
        *self = next;
        Ok(cans)
    }

    fn update_inner(&mut self, event: &Event) -> Result<ActionCandidate> {
        event.check_bounds()?;

        self.last_cans = ActionCandidate {
            target_actor: event.actor().unwrap_or(self.player_id),
            ..Default::default()
        };
        self.ankan_candidates.clear();
        self.kakan_candidates.clear();

        if self.to_mark_same_cycle_furiten.take().is_some() {
            self.at_furiten = true;
        }
        if self.chankan_chance.take().is_some() {
            self.at_ippatsu = false;
        }

        let in_round_only = !matches!(
            event,
            Event::StartGame { .. }
                | Event::StartKyoku { .. }
                | Event::Hora { .. }
                | Event::Ryukyoku { .. }
                | Event::EndKyoku
                | Event::EndGame
        );
        ensure!(
            !in_round_only || self.in_kyoku,
            "rule violation: in-round event outside of a kyoku",
        );

        match *event {
            Event::StartGame { .. } => {
                *self = Self::new(self.player_id);
                self.last_cans.target_actor = self.player_id;
            }
            Event::StartKyoku {
                bakaze,
                dora_marker,
                kyoku,
                honba,
                kyotaku,
                oya,
                scores,
                tehais,
            } => self.start_kyoku(
                bakaze,
                dora_marker,
                kyoku,
                honba,
                kyotaku,
                oya,
                scores,
                tehais,
            )?,
            Event::Tsumo { actor, pai } => self.tsumo(actor, pai)?,
            Event::Dahai {
                actor,
                pai,
                tsumogiri,
            } => self.dahai(actor, pai, tsumogiri)?,
            Event::Chi {
                actor,
                target,
                pai,
                consumed,
            } => self.chi(actor, target, pai, consumed)?,
            Event::Pon {
                actor,
                target,
                pai,
                consumed,
            } => self.pon(actor, target, pai, consumed)?,
            Event::Daiminkan {
                actor,
                target,
                pai,
                consumed,
            } => self.daiminkan(actor, target, pai, consumed)?,
            Event::Kakan { actor, pai, .. } => self.kakan(actor, pai)?,
            Event::Ankan { actor, consumed } => self.ankan(actor, consumed)?,
            Event::Dora { dora_marker } => self.add_dora_indicator(dora_marker)?,
            Event::Reach { actor } => self.reach(actor),
            Event::ReachAccepted { actor } => self.reach_accepted(actor),
            Event::Hora { .. } | Event::Ryukyoku { .. } | Event::EndKyoku | Event::EndGame => {
                self.in_kyoku = false;
            }
            Event::None { .. } => unreachable!(),
        };

        if self.in_kyoku {
            self.check_tile_conservation()?;
        }
        Ok(self.last_cans)
    }

    #[allow(clippy::too_many_arguments)]
    fn start_kyoku(
        &mut self,
        bakaze: Tile,
        dora_marker: Tile,
        kyoku: u8,
        honba: u8,
        kyotaku: u8,
        oya: u8,
        scores: [i32; 4],
        tehais: [[Tile; 13]; 4],
    ) -> Result<()> {
        *self = Self::new(self.player_id);
        self.last_cans.target_actor = self.player_id;

        self.in_kyoku = true;
        self.bakaze = bakaze;
        self.honba = honba;
        self.kyotaku = kyotaku;
        self.oya = self.rel(oya) as u8;
        self.jikaze = must_tile!(tu8!(E) + (4 - self.oya) % 4);
        self.kyoku = kyoku - 1;
        self.is_all_last = match self.bakaze.as_u8() {
            tu8!(E) => false,
            tu8!(S) => self.kyoku == 3,
            _ => true,
        };
        self.scores = scores;
        self.scores.rotate_left(self.player_id as usize);
        self.is_menzen = true;
        self.can_w_riichi = true;
        self.tehai_len_div3 = 4;
        self.tehai_lens = [13; 4];
        self.tiles_left = LIVE_WALL;
        self.update_rank();

        self.add_dora_indicator(dora_marker)?;
        for &t in &tehais[self.player_id as usize] {
            self.witness_tile(t)?;
            self.move_tile(t, MoveType::Tsumo)?;
        }

        self.update_shanten();
        self.update_waits_and_furiten();
        self.pad_kawa_at_start();
        Ok(())
    }

    fn tsumo(&mut self, actor: u8, pai: Tile) -> Result<()> {
        ensure!(
            self.tiles_left > 0,
            "rule violation: attempt to tsumo from exhausted yama",
        );
        self.tiles_left -= 1;
        let actor_rel = self.rel(actor);
        self.tehai_lens[actor_rel] += 1;
        if actor_rel != 0 {
            return Ok(());
        }

        self.at_turn += 1;
        self.last_cans.can_discard = true;
        self.last_self_tsumo = Some(pai);
        self.witness_tile(pai)?;
        self.move_tile(pai, MoveType::Tsumo)?;

        if self.can_w_riichi {
            self.last_cans.can_ryukyoku = rules::can_kyuushu_kyuuhai(&self.tehai);
        }
        if !self.riichi_accepted[0] {
            self.update_shanten_discards();
        }

        if self.waits[pai.deaka().as_usize()] {
            // menzen tsumo, riichi, haitei, rinshan and tenhou are all yaku
            if self.is_menzen
                || self.riichi_accepted[0]
                || self.tiles_left == 0
                || self.at_rinshan
                || self.can_w_riichi
            {
                self.last_cans.can_tsumo_agari = true;
            } else {
                self.last_cans.can_tsumo_agari =
                    self.agari_calculator(&self.tehai, pai, false).has_yaku();
            }
        }

        // no kan or riichi on haitei
        if self.tiles_left == 0 {
            return Ok(());
        }

        if self.riichi_accepted[0] {
            if self.kans_on_board < 4
                && rules::can_ankan_after_riichi(&self.tehai, self.tehai_len_div3, pai)
            {
                self.last_cans.can_ankan = true;
                self.ankan_candidates.push(pai.deaka());
            }
            return Ok(());
        }

        self.ankan_candidates = rules::ankan_candidates(&self.tehai, self.kans_on_board);
        self.kakan_candidates =
            rules::kakan_candidates(&self.tehai, &self.pons, self.kans_on_board);
        self.last_cans.can_ankan = !self.ankan_candidates.is_empty();
        self.last_cans.can_kakan = !self.kakan_candidates.is_empty();

        self.last_cans.can_riichi = rules::can_riichi(
            self.is_menzen,
            self.tiles_left,
            self.scores[0],
            self.shanten,
            self.has_next_shanten_discard,
        );
        Ok(())
    }

    fn dahai(&mut self, actor: u8, pai: Tile, tsumogiri: bool) -> Result<()> {
        let actor_rel = self.rel(actor);
        self.take_from_hand(actor_rel, 1)?;
        if actor_rel == 0 {
            self.move_tile(pai, MoveType::Discard)?;
        } else {
            self.witness_tile(pai)?;
        }

        let is_riichi = self.riichi_declared[actor_rel] && !self.riichi_accepted[actor_rel];
        let sutehai = Sutehai {
            tile: pai,
            is_dora: self.dora_factor[pai.deaka().as_usize()] > 0,
            is_tedashi: !tsumogiri,
            is_riichi,
        };
        let kawa_item = KawaItem {
            kan: mem::take(&mut self.intermediate_kan),
            chi_pon: self.intermediate_chi_pon.take(),
            sutehai,
            called: false,
        };
        self.kawa[actor_rel].push(Some(kawa_item));
        self.kawa_overview[actor_rel].push(pai);
        self.last_kawa_tile = Some(pai);

        if !tsumogiri {
            self.last_tedashis[actor_rel] = Some(sutehai);
        }
        if is_riichi {
            self.riichi_sutehais[actor_rel] = Some(sutehai);
        }

        if actor_rel == 0 {
            self.forbidden_tiles.fill(false);
            self.at_rinshan = false;
            self.at_ippatsu = false;
            self.can_w_riichi = false;
            self.discarded_tiles[pai.deaka().as_usize()] = true;

            if !self.riichi_accepted[0] {
                if self.next_shanten_discards[pai.deaka().as_usize()] {
                    self.shanten -= 1;
                } else if !self.keep_shanten_discards[pai.deaka().as_usize()] {
                    self.update_shanten();
                }
                self.update_waits_and_furiten();
            } else if !self.at_furiten && self.waits[pai.deaka().as_usize()] {
                // riichi furiten lasts until the end of the kyoku
                self.at_furiten = true;
            }
            return Ok(());
        }

        if !self.at_furiten && self.waits[pai.deaka().as_usize()] {
            // riichi and houtei are yaku
            if self.riichi_accepted[0] || self.tiles_left == 0 {
                self.last_cans.can_ron_agari = true;
            } else {
                let mut tehai_with_winning_tile = self.tehai;
                tehai_with_winning_tile[pai.deaka().as_usize()] += 1;
                self.last_cans.can_ron_agari = self
                    .agari_calculator(&tehai_with_winning_tile, pai, true)
                    .has_yaku();
            }

            if self.last_cans.can_ron_agari {
                // furiten applies from the next event on if the ron is passed
                self.to_mark_same_cycle_furiten = Some(());
            } else {
                self.at_furiten = true;
            }
        }

        if self.riichi_accepted[0] || self.tiles_left == 0 {
            return Ok(());
        }

        if self.tehai_len_div3 > 0 {
            self.set_can_chi_from_tile(pai, actor_rel == 3);
        }
        self.last_cans.can_pon = rules::can_pon(&self.tehai, pai);
        self.last_cans.can_daiminkan =
            rules::can_daiminkan(&self.tehai, pai, self.kans_on_board);
        Ok(())
    }

    fn chi(&mut self, actor: u8, target: u8, pai: Tile, consumed: [Tile; 2]) -> Result<()> {
        ensure!(
            (actor + 3) % 4 == target,
            "rule violation: chi from seat {target} which is not kamicha of {actor}",
        );
        crate::chi_type::ChiType::new(consumed, pai)?;

        let actor_rel = self.rel(actor);
        self.call_from_kawa(actor, target, pai)?;
        self.take_from_hand(actor_rel, 2)?;
        self.push_meld(actor_rel, MeldKind::Chi, &consumed, pai, target)?;
        self.intermediate_chi_pon = Some(ChiPon {
            consumed,
            target_tile: pai,
        });

        if actor_rel != 0 {
            self.witness_opponent_call(actor_rel, &consumed, pai)?;
            return Ok(());
        }

        self.own_call_common(pai)?;
        for t in consumed {
            self.move_tile(t, MoveType::FuuroConsume)?;
        }

        let a = consumed[0].deaka().as_usize();
        let b = consumed[1].deaka().as_usize();
        let min = a.min(b);
        let max = a.max(b);
        let deaka_tile_id = pai.deaka().as_usize();
        self.chis.push(min.min(deaka_tile_id) as u8);

        // kuikae, including suji kuikae
        if self.tehai[deaka_tile_id] > 0 {
            self.forbidden_tiles[deaka_tile_id] = true;
        }
        if deaka_tile_id < min {
            if max % 9 < 8 {
                let bigger = max + 1;
                if self.tehai[bigger] > 0 {
                    self.forbidden_tiles[bigger] = true;
                }
            }
        } else if deaka_tile_id > max && min % 9 > 0 {
            let smaller = min - 1;
            if self.tehai[smaller] > 0 {
                self.forbidden_tiles[smaller] = true;
            }
        }

        self.update_shanten();
        self.update_shanten_discards();
        Ok(())
    }

    fn pon(&mut self, actor: u8, target: u8, pai: Tile, consumed: [Tile; 2]) -> Result<()> {
        ensure!(
            consumed.iter().all(|c| c.deaka() == pai.deaka()),
            "rule violation: pon {pai} with {consumed:?}",
        );

        let actor_rel = self.rel(actor);
        self.call_from_kawa(actor, target, pai)?;
        self.take_from_hand(actor_rel, 2)?;
        self.push_meld(actor_rel, MeldKind::Pon, &consumed, pai, target)?;
        self.intermediate_chi_pon = Some(ChiPon {
            consumed,
            target_tile: pai,
        });
        self.pad_kawa_for_pon_or_daiminkan(actor, target);

        if actor_rel != 0 {
            self.witness_opponent_call(actor_rel, &consumed, pai)?;
            return Ok(());
        }

        self.own_call_common(pai)?;
        for t in consumed {
            self.move_tile(t, MoveType::FuuroConsume)?;
        }
        self.pons.push(pai.deaka().as_u8());

        if self.tehai[pai.deaka().as_usize()] > 0 {
            self.forbidden_tiles[pai.deaka().as_usize()] = true;
        }

        self.update_shanten();
        self.update_shanten_discards();
        Ok(())
    }

    fn daiminkan(&mut self, actor: u8, target: u8, pai: Tile, consumed: [Tile; 3]) -> Result<()> {
        ensure!(
            consumed.iter().all(|c| c.deaka() == pai.deaka()),
            "rule violation: daiminkan {pai} with {consumed:?}",
        );
        ensure!(self.kans_on_board < 4, "rule violation: fifth kan");

        let actor_rel = self.rel(actor);
        self.call_from_kawa(actor, target, pai)?;
        self.take_from_hand(actor_rel, 3)?;
        self.push_meld(actor_rel, MeldKind::Daiminkan, &consumed, pai, target)?;
        self.intermediate_kan.push(pai);
        self.pad_kawa_for_pon_or_daiminkan(actor, target);
        self.kans_on_board += 1;

        if actor_rel != 0 {
            self.witness_opponent_call(actor_rel, &consumed, pai)?;
            return Ok(());
        }

        self.at_rinshan = true;
        self.is_menzen = false;
        ensure!(self.tehai_len_div3 > 0, "rule violation: fifth meld");
        self.tehai_len_div3 -= 1;
        self.update_doras_owned(0, pai);
        for t in consumed {
            self.move_tile(t, MoveType::FuuroConsume)?;
        }
        self.minkans.push(pai.deaka().as_u8());

        self.update_shanten();
        self.update_waits_and_furiten();
        Ok(())
    }

    fn kakan(&mut self, actor: u8, pai: Tile) -> Result<()> {
        ensure!(self.kans_on_board < 4, "rule violation: fifth kan");

        let actor_rel = self.rel(actor);
        self.take_from_hand(actor_rel, 1)?;
        let meld = self.melds[actor_rel]
            .iter_mut()
            .find(|m| m.kind == MeldKind::Pon && m.head() == Some(pai.deaka()))
            .with_context(|| format!("rule violation: kakan {pai} without a pon"))?;
        meld.kind = MeldKind::Kakan;
        meld.tiles.push(pai);
        for fuuro in &mut self.fuuro_overview[actor_rel] {
            if fuuro[0].deaka() == pai.deaka() {
                fuuro.push(pai);
                break;
            }
        }
        self.intermediate_kan.push(pai);
        self.kans_on_board += 1;

        if actor_rel != 0 {
            self.witness_tile(pai)?;
            self.update_doras_owned(actor_rel, pai);

            // chankan
            self.last_kawa_tile = Some(pai);
            if !self.at_furiten && self.waits[pai.deaka().as_usize()] {
                self.last_cans.can_ron_agari = true;
                self.to_mark_same_cycle_furiten = Some(());
                self.chankan_chance = Some(());
            } else {
                self.at_ippatsu = false;
            }
            return Ok(());
        }

        self.at_rinshan = true;
        self.move_tile(pai, MoveType::FuuroConsume)?;
        self.pons.retain(|&t| t != pai.deaka().as_u8());
        self.minkans.push(pai.deaka().as_u8());

        if self.next_shanten_discards[pai.deaka().as_usize()] {
            self.shanten -= 1;
        } else if !self.keep_shanten_discards[pai.deaka().as_usize()] {
            self.update_shanten();
        }
        self.update_waits_and_furiten();
        Ok(())
    }

    fn ankan(&mut self, actor: u8, consumed: [Tile; 4]) -> Result<()> {
        let tile = consumed[0].deaka();
        ensure!(
            consumed.iter().all(|c| c.deaka() == tile),
            "rule violation: ankan with {consumed:?}",
        );
        ensure!(self.kans_on_board < 4, "rule violation: fifth kan");

        let actor_rel = self.rel(actor);
        self.take_from_hand(actor_rel, 4)?;
        ensure!(
            self.melds[actor_rel].len() < 4,
            "rule violation: fifth meld",
        );
        self.melds[actor_rel].push(Meld {
            kind: MeldKind::Ankan,
            tiles: consumed.into_iter().collect(),
            called: None,
            target: None,
        });
        self.ankan_overview[actor_rel].push(tile);
        self.intermediate_kan.push(tile);
        self.kans_on_board += 1;
        self.can_w_riichi = false;
        self.at_ippatsu = false;

        if actor_rel != 0 {
            for t in consumed {
                self.witness_tile(t)?;
                self.update_doras_owned(actor_rel, t);
            }
            return Ok(());
        }

        self.at_rinshan = true;
        ensure!(self.tehai_len_div3 > 0, "rule violation: fifth meld");
        self.tehai_len_div3 -= 1;
        for t in consumed {
            self.move_tile(t, MoveType::FuuroConsume)?;
        }
        self.ankans.push(tile.as_u8());

        // ankan after riichi never changes the waits
        if !self.riichi_accepted[0] {
            self.update_shanten();
            self.update_waits_and_furiten();
        }
        Ok(())
    }

    const fn reach(&mut self, actor: u8) {
        let actor_rel = self.rel(actor);
        self.riichi_declared[actor_rel] = true;
        if actor_rel == 0 {
            self.is_w_riichi = self.can_w_riichi;
            self.last_cans.can_discard = true;
        }
    }

    fn reach_accepted(&mut self, actor: u8) {
        let actor_rel = self.rel(actor);
        self.riichi_accepted[actor_rel] = true;
        self.scores[actor_rel] -= 1000;
        self.kyotaku = self.kyotaku.saturating_add(1);
        self.update_rank();
        if actor_rel == 0 {
            self.at_ippatsu = true;
        }
    }

    #[inline]
    #[must_use]
    pub const fn rel(&self, actor: u8) -> usize {
        ((actor + 4 - self.player_id) % 4) as usize
    }

    /// Hands + melds + uncalled kawa tiles + dead wall + live wall must
    /// account for all 136 tiles, and every hand must be 3n+1 or 3n+2
    /// where n is the number of missing melds.
    pub fn check_tile_conservation(&self) -> Result<()> {
        let in_hands: u32 = self.tehai_lens.iter().map(|&l| l as u32).sum();
        let in_melds: u32 = self
            .melds
            .iter()
            .flatten()
            .map(|m| m.tiles.len() as u32)
            .sum();
        let in_kawas = self
            .kawa
            .iter()
            .flatten()
            .flatten()
            .filter(|item| !item.called)
            .count() as u32;
        let total = in_hands + in_melds + in_kawas + DEAD_WALL + self.tiles_left as u32;
        ensure!(
            total == TOTAL_TILES,
            "tile conservation broken: {in_hands} in hands, {in_melds} in melds, \
            {in_kawas} in kawas, {} in the live wall",
            self.tiles_left,
        );

        let own_len: u8 = self.tehai.iter().sum();
        ensure!(
            own_len == self.tehai_lens[0],
            "own tehai has {own_len} tiles but {} are expected",
            self.tehai_lens[0],
        );
        for (rel, (&len, melds)) in self.tehai_lens.iter().zip(&self.melds).enumerate() {
            let len_div3 = 4 - melds.len() as u8;
            ensure!(
                len == len_div3 * 3 + 1 || len == len_div3 * 3 + 2,
                "seat {rel} (rel) has {len} tiles with {} melds",
                melds.len(),
            );
        }
        Ok(())
    }

    fn take_from_hand(&mut self, actor_rel: usize, count: u8) -> Result<()> {
        let len = self.tehai_lens[actor_rel];
        ensure!(
            len >= count,
            "rule violation: seat {actor_rel} (rel) has only {len} tiles, {count} needed",
        );
        self.tehai_lens[actor_rel] = len - count;
        Ok(())
    }

    /// Marks the last discard of `abs_target` as called by `abs_actor`.
    fn call_from_kawa(&mut self, abs_actor: u8, abs_target: u8, pai: Tile) -> Result<()> {
        ensure!(
            abs_actor != abs_target,
            "rule violation: seat {abs_actor} calls its own discard",
        );
        ensure!(
            self.last_kawa_tile == Some(pai),
            "rule violation: {pai} is not the last discarded tile",
        );
        let target_rel = self.rel(abs_target);
        let Some(item) = self.kawa[target_rel].iter_mut().rev().find_map(Option::as_mut) else {
            bail!("rule violation: seat {abs_target} has not discarded anything");
        };
        ensure!(
            !item.called && item.sutehai.tile == pai,
            "rule violation: {pai} is not the last discard of seat {abs_target}",
        );
        item.called = true;
        Ok(())
    }

    fn push_meld(
        &mut self,
        actor_rel: usize,
        kind: MeldKind,
        consumed: &[Tile],
        pai: Tile,
        abs_target: u8,
    ) -> Result<()> {
        ensure!(
            self.melds[actor_rel].len() < 4,
            "rule violation: fifth meld",
        );
        let tiles: ArrayVec<[Tile; 4]> =
            consumed.iter().copied().chain(iter::once(pai)).collect();
        self.fuuro_overview[actor_rel].push(tiles);
        let target = self.rel(abs_target) as u8;
        self.melds[actor_rel].push(Meld {
            kind,
            tiles,
            called: Some(pai),
            target: Some(target),
        });
        Ok(())
    }

    fn witness_opponent_call(&mut self, actor_rel: usize, consumed: &[Tile], pai: Tile) -> Result<()> {
        for &t in consumed {
            self.witness_tile(t)?;
        }
        for &t in consumed.iter().chain(iter::once(&pai)) {
            self.update_doras_owned(actor_rel, t);
        }
        self.can_w_riichi = false;
        self.at_ippatsu = false;
        Ok(())
    }

    /// Common bookkeeping of an own chi or pon.
    fn own_call_common(&mut self, pai: Tile) -> Result<()> {
        ensure!(self.tehai_len_div3 > 0, "rule violation: fifth meld");
        self.last_cans.can_discard = true;
        self.is_menzen = false;
        self.tehai_len_div3 -= 1;
        self.last_self_tsumo = None;
        self.update_doras_owned(0, pai);
        Ok(())
    }

    /// Updates `tiles_seen`, `doras_seen` and `akas_seen`.
    ///
    /// Returns an error if we have already witnessed 4 such tiles.
    pub fn witness_tile(&mut self, tile: Tile) -> Result<()> {
        ensure!(
            !tile.is_unknown(),
            "rule violation: attempt to witness an unknown tile",
        );
        let tile_id = tile.deaka().as_usize();
        let seen = &mut self.tiles_seen[tile_id];
        ensure!(*seen < 4, "rule violation: attempt to witness the fifth {tile}");
        *seen += 1;

        self.doras_seen += self.dora_factor[tile_id];
        if tile.is_aka() {
            let aka_id = tile.as_usize() - tuz!(5mr);
            ensure!(
                !self.akas_seen[aka_id],
                "rule violation: attempt to witness the second {tile}",
            );
            self.akas_seen[aka_id] = true;
            self.doras_seen += 1;
        }
        Ok(())
    }

    /// Updates `tehai`, `akas_in_hand` and `doras_owned`, but does not update
    /// `tiles_seen` or `doras_seen`.
    ///
    /// Returns an error when trying to discard or consume a tile that the
    /// player doesn't own.
    pub fn move_tile(&mut self, tile: Tile, move_type: MoveType) -> Result<()> {
        let tile_id = tile.deaka().as_usize();
        let aka_id = tile.is_aka().then(|| tile.as_usize() - tuz!(5mr));
        if let Some(aka_id) = aka_id
            && !matches!(move_type, MoveType::Tsumo)
        {
            ensure!(
                self.akas_in_hand[aka_id],
                "rule violation: attempt to move {tile} which is not in hand",
            );
        }

        let tehai_tile = &mut self.tehai[tile_id];
        match move_type {
            MoveType::Tsumo => {
                ensure!(*tehai_tile < 4, "rule violation: fifth {tile} in hand");
                *tehai_tile += 1;
                self.doras_owned[0] += self.dora_factor[tile_id];
            }
            MoveType::Discard => {
                ensure!(
                    *tehai_tile > 0,
                    "rule violation: attempt to discard {tile} from void",
                );
                *tehai_tile -= 1;
                self.doras_owned[0] -= self.dora_factor[tile_id];
            }
            MoveType::FuuroConsume => {
                ensure!(
                    *tehai_tile > 0,
                    "rule violation: attempt to consume {tile} from void",
                );
                *tehai_tile -= 1;
            }
        }

        if let Some(aka_id) = aka_id {
            match move_type {
                MoveType::Tsumo => {
                    self.akas_in_hand[aka_id] = true;
                    self.doras_owned[0] += 1;
                }
                MoveType::Discard => {
                    self.akas_in_hand[aka_id] = false;
                    self.doras_owned[0] -= 1;
                }
                MoveType::FuuroConsume => {
                    self.akas_in_hand[aka_id] = false;
                }
            }
        } else if matches_tu8!(tile.as_u8(), 5m | 5p | 5s)
            && !matches!(move_type, MoveType::Tsumo)
        {
            // the last five of a kind in hand cannot be a plain one if the
            // aka is in hand
            let aka_id = tile_id / 9;
            ensure!(
                !(self.akas_in_hand[aka_id] && self.tehai[tile_id] == 0),
                "rule violation: attempt to move {tile} while only the aka is left",
            );
        }
        Ok(())
    }

    /// Updates `dora_indicators`, witness the dora indicator itself and
    /// recounts doras (`doras_seen` and `doras_owned`) based on all the seen
    /// tiles.
    pub fn add_dora_indicator(&mut self, tile: Tile) -> Result<()> {
        ensure!(
            self.dora_indicators.len() < 5,
            "rule violation: sixth dora indicator",
        );
        self.dora_indicators.push(tile);
        self.witness_tile(tile)?;

        let next = tile.next();
        self.dora_factor[next.as_usize()] += 1;
        self.doras_owned[0] += self.tehai[next.as_usize()];
        for i in 0..4 {
            self.doras_owned[i] += self.fuuro_overview[i]
                .iter()
                .flatten()
                .filter(|t| t.deaka() == next)
                .count() as u8;
            if self.ankan_overview[i].contains(&next) {
                self.doras_owned[i] += 4;
            }
        }
        self.doras_seen += self.tiles_seen[next.as_usize()];
        Ok(())
    }

    fn pad_kawa_for_pon_or_daiminkan(&mut self, abs_actor: u8, abs_target: u8) {
        let mut i = (abs_target + 1) % 4;
        while i != abs_actor {
            let rel = self.rel(i);
            self.kawa[rel].push(None);
            i = (i + 1) % 4;
        }
    }

    fn pad_kawa_at_start(&mut self) {
        self.kawa
            .iter_mut()
            .take(self.oya as usize)
            .for_each(|kawa| kawa.push(None));
    }

    pub fn set_can_chi_from_tile(&mut self, tile: Tile, from_kamicha: bool) {
        let chi = rules::can_chi(&self.tehai, tile, from_kamicha);
        self.last_cans.can_chi_low = chi.low;
        self.last_cans.can_chi_mid = chi.mid;
        self.last_cans.can_chi_high = chi.high;
    }

    pub(super) fn agari_calculator<'a>(
        &'a self,
        tehai: &'a [u8; 34],
        winning_tile: Tile,
        is_ron: bool,
    ) -> AgariCalculator<'a> {
        AgariCalculator {
            tehai,
            is_menzen: self.is_menzen,
            chis: &self.chis,
            pons: &self.pons,
            minkans: &self.minkans,
            ankans: &self.ankans,
            bakaze: self.bakaze.as_u8(),
            jikaze: self.jikaze.as_u8(),
            winning_tile: winning_tile.deaka().as_u8(),
            is_ron,
        }
    }

    /// Can be called at either 3n+1 or 3n+2.
    ///
    /// For 3n+2, the return value of `shanten::calc_all` may be `-1`. We don't
    /// allow `-1` and it will be written as `0` in order for
    /// `_shanten_discards` to be calculated properly.
    pub fn update_shanten(&mut self) {
        self.shanten = shanten::calc_all(&self.tehai, self.tehai_len_div3).max(0);
        debug_assert!(matches!(self.shanten, 0..=6));
    }

    /// Must be called at 3n+2.
    pub fn update_shanten_discards(&mut self) {
        assert!(self.last_cans.can_discard, "tehai is not 3n+2");

        self.next_shanten_discards.fill(false);
        self.keep_shanten_discards.fill(false);
        self.has_next_shanten_discard = false;

        let mut tehai = self.tehai;
        for (tid, &count) in self.tehai.iter().enumerate() {
            if count == 0 {
                continue;
            }
            tehai[tid] -= 1;
            let shanten_after = shanten::calc_all(&tehai, self.tehai_len_div3);
            tehai[tid] += 1;

            match shanten_after.cmp(&self.shanten) {
                Ordering::Less => {
                    self.next_shanten_discards[tid] = true;
                    self.has_next_shanten_discard = true;
                }
                Ordering::Equal => self.keep_shanten_discards[tid] = true,
                Ordering::Greater => {}
            };
        }
    }

    /// Caller must assure current tehai is 3n+1, and `self.shanten` must be up
    /// to date and correct.
    pub fn update_waits_and_furiten(&mut self) {
        assert!(!self.last_cans.can_discard, "tehai is not 3n+1");

        self.waits.fill(false);
        self.at_furiten = false;
        if self.shanten > 0 {
            return;
        }

        let mut winning = [false; 34];
        for (t, is_winning) in winning.iter_mut().enumerate() {
            if self.tehai[t] == 4 {
                continue;
            }
            let mut tehai_after = self.tehai;
            tehai_after[t] += 1;
            *is_winning = rules::is_winning_hand(&tehai_after, self.tehai_len_div3);
        }
        // exhausted waits still count for furiten
        self.at_furiten = rules::is_furiten(&winning, &self.discarded_tiles);
        for (t, is_wait) in self.waits.iter_mut().enumerate() {
            *is_wait = winning[t] && self.tiles_seen[t] < 4;
        }
    }

    pub const fn update_doras_owned(&mut self, actor_rel: usize, tile: Tile) {
        self.doras_owned[actor_rel] += self.dora_factor[tile.deaka().as_usize()];
        if tile.is_aka() {
            self.doras_owned[actor_rel] += 1;
        }
    }

    pub fn update_rank(&mut self) {
        self.rank = self.get_rank(self.scores);
    }

    #[must_use]
    pub fn get_rank(&self, mut scores_rel: [i32; 4]) -> u8 {
        let scores_abs = {
            scores_rel.rotate_right(self.player_id as usize);
            scores_rel
        };
        Rankings::new(scores_abs).rank_by_player[self.player_id as usize]
    }
}
