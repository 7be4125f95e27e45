//! The fixed action space shared with the policy.
//!
//! | index      | action                                             |
//! |------------|----------------------------------------------------|
//! | 0..=33     | discard the non-aka tile of the kind               |
//! | 34..=36    | discard 5mr, 5pr, 5sr                              |
//! | 37         | riichi                                             |
//! | 38..=40    | chi with the called tile being low, mid, high      |
//! | 41         | pon                                                |
//! | 42         | kan, daiminkan first, then the lowest ankan/kakan  |
//! | 43         | hora, tsumo or ron                                 |
//! | 44         | ryukyoku (kyuushu kyuuhai)                         |
//! | 45         | pass                                               |
use super::PlayerState;
use crate::chi_type::ChiType;
use crate::consts::ACTION_SPACE;
use crate::error::BotError;
use crate::mjai::Event;
use crate::must_tile;
use crate::tile::Tile;

use anyhow::{Context, Result, bail, ensure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Tile id in `0..37`, which is also the action index.
    Discard(Tile),
    Riichi,
    Chi(ChiType),
    Pon,
    Kan,
    Hora,
    Ryukyoku,
    Pass,
}

impl Action {
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        let ret = match index {
            0..=36 => Self::Discard(must_tile!(index)),
            37 => Self::Riichi,
            38 => Self::Chi(ChiType::Low),
            39 => Self::Chi(ChiType::Mid),
            40 => Self::Chi(ChiType::High),
            41 => Self::Pon,
            42 => Self::Kan,
            43 => Self::Hora,
            44 => Self::Ryukyoku,
            45 => Self::Pass,
            _ => return None,
        };
        Some(ret)
    }

    #[must_use]
    pub const fn to_index(self) -> usize {
        match self {
            Self::Discard(tile) => tile.as_usize(),
            Self::Riichi => 37,
            Self::Chi(ChiType::Low) => 38,
            Self::Chi(ChiType::Mid) => 39,
            Self::Chi(ChiType::High) => 40,
            Self::Pon => 41,
            Self::Kan => 42,
            Self::Hora => 43,
            Self::Ryukyoku => 44,
            Self::Pass => 45,
        }
    }

    /// Maps an mjai reaction onto the action space. Returns an error for
    /// events that are never a reaction.
    pub fn from_event(event: &Event) -> Result<Self> {
        let ret = match *event {
            Event::Dahai { pai, .. } => {
                ensure!(!pai.is_unknown(), "cannot discard an unknown tile");
                Self::Discard(pai)
            }
            Event::Reach { .. } => Self::Riichi,
            Event::Chi { pai, consumed, .. } => Self::Chi(ChiType::new(consumed, pai)?),
            Event::Pon { .. } => Self::Pon,
            Event::Daiminkan { .. } | Event::Kakan { .. } | Event::Ankan { .. } => Self::Kan,
            Event::Hora { .. } => Self::Hora,
            Event::Ryukyoku { .. } => Self::Ryukyoku,
            Event::None { .. } => Self::Pass,
            _ => bail!("{event:?} is not a reaction"),
        };
        Ok(ret)
    }
}

impl PlayerState {
    /// Legality of every action index under the latest update.
    #[must_use]
    pub fn action_mask(&self) -> [bool; ACTION_SPACE] {
        let cans = &self.last_cans;
        let mut mask = [false; ACTION_SPACE];

        if cans.can_discard {
            mask[..37].copy_from_slice(&self.discard_candidates_aka());
        }
        mask[37] = cans.can_riichi;
        mask[38] = cans.can_chi_low;
        mask[39] = cans.can_chi_mid;
        mask[40] = cans.can_chi_high;
        mask[41] = cans.can_pon;
        mask[42] = cans.can_kan();
        mask[43] = cans.can_agari();
        mask[44] = cans.can_ryukyoku;
        mask[45] = cans.can_pass();
        mask
    }

    /// Turns a legal action index into the mjai event to send.
    pub fn decode_action(&self, index: usize) -> Result<Event, BotError> {
        let legal = index < ACTION_SPACE && self.action_mask()[index];
        let action = Action::from_index(index)
            .filter(|_| legal)
            .ok_or(BotError::IllegalActionRequested { index })?;
        self.build_event(action)
            .map_err(BotError::InconsistentState)
    }

    /// Every legal reaction right now, in index order.
    pub fn candidates(&self) -> Result<Vec<Event>, BotError> {
        self.action_mask()
            .iter()
            .enumerate()
            .filter(|&(_, &legal)| legal)
            .map(|(index, _)| self.decode_action(index))
            .collect()
    }

    /// Returns an error if `action` is not a legal reaction right now.
    pub fn validate_reaction(&self, action: &Event) -> Result<()> {
        if let Some(actor) = action.actor() {
            ensure!(
                actor == self.player_id,
                "reaction by {actor} for player {}",
                self.player_id,
            );
        }
        let index = Action::from_event(action)?.to_index();
        ensure!(
            self.action_mask()[index],
            "{action:?} is not legal at this point",
        );

        match *action {
            Event::Kakan { pai, .. } => ensure!(
                self.kakan_candidates.contains(&pai.deaka()),
                "cannot kakan {pai}",
            ),
            Event::Ankan { consumed, .. } => ensure!(
                self.ankan_candidates.contains(&consumed[0].deaka()),
                "cannot ankan {}",
                consumed[0],
            ),
            Event::Daiminkan { .. } => ensure!(self.last_cans.can_daiminkan, "cannot daiminkan"),
            _ => {}
        }
        Ok(())
    }

    fn build_event(&self, action: Action) -> Result<Event> {
        let actor = self.player_id;
        let cans = &self.last_cans;

        let ev = match action {
            Action::Discard(pai) => Event::Dahai {
                actor,
                pai,
                tsumogiri: self.last_self_tsumo == Some(pai),
            },
            Action::Riichi => Event::Reach { actor },
            Action::Chi(chi_type) => {
                let pai = self.called_tile()?;
                let consumed = match chi_type {
                    ChiType::Low => [pai.next(), pai.next().next()],
                    ChiType::Mid => [pai.prev(), pai.next()],
                    ChiType::High => [pai.prev().prev(), pai.prev()],
                };
                Event::Chi {
                    actor,
                    target: cans.target_actor,
                    pai,
                    consumed: self.prefer_aka(consumed),
                }
            }
            Action::Pon => {
                let pai = self.called_tile()?;
                Event::Pon {
                    actor,
                    target: cans.target_actor,
                    pai,
                    consumed: self.prefer_aka([pai.deaka(); 2]),
                }
            }
            Action::Kan if cans.can_daiminkan => {
                let pai = self.called_tile()?;
                Event::Daiminkan {
                    actor,
                    target: cans.target_actor,
                    pai,
                    consumed: self.prefer_aka([pai.deaka(); 3]),
                }
            }
            Action::Kan => self.closed_or_added_kan()?,
            Action::Hora if cans.can_tsumo_agari => Event::Hora {
                actor,
                target: actor,
                pai: self.last_self_tsumo,
                deltas: None,
                ura_markers: None,
            },
            Action::Hora => Event::Hora {
                actor,
                target: cans.target_actor,
                pai: self.last_kawa_tile,
                deltas: None,
                ura_markers: None,
            },
            Action::Ryukyoku => Event::Ryukyoku {
                actor: Some(actor),
                deltas: None,
            },
            Action::Pass => Event::None { actor: Some(actor) },
        };
        Ok(ev)
    }

    /// The lowest kind among ankan and kakan candidates.
    fn closed_or_added_kan(&self) -> Result<Event> {
        let actor = self.player_id;
        let ankan = self.ankan_candidates.iter().min().copied();
        let kakan = self.kakan_candidates.iter().min().copied();

        let ev = match (ankan, kakan) {
            (Some(a), Some(k)) if k < a => self.kakan_event(k)?,
            (Some(a), _) => Event::Ankan {
                actor,
                consumed: self.prefer_aka([a; 4]),
            },
            (None, Some(k)) => self.kakan_event(k)?,
            (None, None) => bail!("no kan candidate"),
        };
        Ok(ev)
    }

    fn kakan_event(&self, tile: Tile) -> Result<Event> {
        let pon = self.melds[0]
            .iter()
            .find(|m| m.head() == Some(tile))
            .with_context(|| format!("no pon of {tile} to kakan"))?;
        let consumed = [pon.tiles[0], pon.tiles[1], pon.tiles[2]];
        // the aka goes to the kan if it's the one left in hand
        let [pai] = self.prefer_aka([tile]);
        Ok(Event::Kakan {
            actor: self.player_id,
            pai,
            consumed,
        })
    }

    fn called_tile(&self) -> Result<Tile> {
        self.last_kawa_tile
            .context("nothing to call")
    }

    /// Swaps in the aka for one plain five if the aka is in hand.
    fn prefer_aka<const N: usize>(&self, mut tiles: [Tile; N]) -> [Tile; N] {
        let mut used = [false; 3];
        for t in &mut tiles {
            let aka = t.akaize();
            if aka.is_aka() && !t.is_aka() {
                let aka_id = aka.as_usize() - 34;
                if self.akas_in_hand[aka_id] && !used[aka_id] {
                    *t = aka;
                    used[aka_id] = true;
                }
            }
        }
        tiles
    }
}
