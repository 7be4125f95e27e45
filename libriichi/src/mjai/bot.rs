use super::Event;
use crate::config::BotConfig;
use crate::consts::{ACTION_SPACE, obs_shape};
use crate::error::{BotError, Result};
use crate::state::{ActionCandidate, PlayerState};

use serde_json as json;

/// A bot speaking mjai line by line for one seat.
///
/// Every call either fully succeeds or leaves the bot at its last good
/// state.
#[derive(Debug, Clone)]
pub struct Bot {
    state: PlayerState,
    config: BotConfig,
}

impl Bot {
    pub fn new(player_id: u8, version: u32) -> Result<Self> {
        Self::from_config(BotConfig::new(player_id, version))
    }

    pub fn from_config(config: BotConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: PlayerState::new(config.player_id),
            config,
        })
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Shape of the observations this bot produces.
    pub fn obs_shape(&self) -> Result<(usize, usize)> {
        obs_shape(self.config.version)
    }

    /// Applies one mjai line. Returns the pending decision if the seat has
    /// to act.
    pub fn react(&mut self, line: &str) -> Result<Option<ActionCandidate>> {
        let cans = self.apply(line)?;
        Ok(cans.can_act().then_some(cans))
    }

    /// Applies one mjai line and, if the seat has to act, writes the
    /// observation and the legality mask into the buffers and returns
    /// `true`. The buffers are left untouched otherwise.
    ///
    /// Buffer sizes are checked before the line is even parsed.
    pub fn react_into(&mut self, line: &str, obs_out: &mut [f32], mask_out: &mut [u8]) -> Result<bool> {
        let (channels, width) = self.obs_shape()?;
        check_len(channels * width, obs_out.len())?;
        check_len(ACTION_SPACE, mask_out.len())?;

        let cans = self.apply(line)?;
        if !cans.can_act() {
            return Ok(false);
        }

        self.state.encode_obs_into(self.config.version, obs_out)?;
        for (out, legal) in mask_out.iter_mut().zip(self.state.action_mask()) {
            *out = legal.into();
        }
        Ok(true)
    }

    /// Decodes an action index against the latest state into one mjai
    /// line.
    pub fn get_action(&self, index: usize) -> Result<String> {
        let event = self.state.decode_action(index)?;
        log::debug!("player {} decided {event:?}", self.config.player_id);
        Ok(json::to_string(&event)?)
    }

    /// Every legal reaction right now as a JSON array.
    pub fn candidates_json(&self) -> Result<String> {
        let candidates = self.state.candidates()?;
        Ok(json::to_string(&candidates)?)
    }

    fn apply(&mut self, line: &str) -> Result<ActionCandidate> {
        let event: Event = json::from_str(line).inspect_err(|err| {
            log::warn!("rejected malformed line {line:?}: {err}");
        })?;
        event.check_bounds().inspect_err(|err| {
            log::warn!("rejected out of bound event {event:?}: {err}");
        })?;

        let cans = self.state.update(&event).map_err(|err| {
            log::warn!(
                "player {} rejected inconsistent event: {err:#}",
                self.config.player_id,
            );
            BotError::InconsistentState(err)
        })?;
        if cans.can_act() {
            log::debug!("player {} has to act: {cans:?}", self.config.player_id);
        }
        Ok(cans)
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(BotError::BufferSize { expected, actual })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const START: &str = r#"{"type":"start_kyoku","bakaze":"E","dora_marker":"1p","kyoku":1,"honba":0,"kyotaku":0,"oya":0,"scores":[25000,25000,25000,25000],"tehais":[["1m","2m","3m","4p","5p","6p","7s","8s","9s","E","E","P","P"],["?","?","?","?","?","?","?","?","?","?","?","?","?"],["?","?","?","?","?","?","?","?","?","?","?","?","?"],["?","?","?","?","?","?","?","?","?","?","?","?","?"]]}"#;

    #[test]
    fn react_and_decode() {
        let mut bot = Bot::new(0, 1).unwrap();
        assert!(bot.react(r#"{"type":"start_game","names":["a","b","c","d"]}"#).unwrap().is_none());
        assert!(bot.react(START).unwrap().is_none());

        let cans = bot
            .react(r#"{"type":"tsumo","actor":0,"pai":"E"}"#)
            .unwrap()
            .unwrap();
        assert!(cans.can_discard);
        assert!(cans.can_tsumo_agari);

        let action = bot.get_action(43).unwrap();
        let event: Event = json::from_str(&action).unwrap();
        assert_eq!(
            event,
            Event::Hora {
                actor: 0,
                target: 0,
                pai: Some(crate::t!(E)),
                deltas: None,
                ura_markers: None,
            },
        );
        assert!(matches!(
            bot.get_action(45),
            Err(BotError::IllegalActionRequested { index: 45 }),
        ));
        assert!(bot.candidates_json().unwrap().contains(r#""type":"hora""#));
    }

    #[test]
    fn buffers_checked_first() {
        let mut bot = Bot::new(0, 2).unwrap();
        let mut obs = vec![0.; 10];
        let mut mask = [0; ACTION_SPACE];
        assert!(matches!(
            bot.react_into(START, &mut obs, &mut mask),
            Err(BotError::BufferSize { expected: 32028, actual: 10 }),
        ));
        assert!(!bot.state().in_kyoku);

        let mut obs = vec![0.; 942 * 34];
        assert!(!bot.react_into(START, &mut obs, &mut mask).unwrap());
        assert!(
            bot.react_into(r#"{"type":"tsumo","actor":0,"pai":"9p"}"#, &mut obs, &mut mask)
                .unwrap()
        );
        assert_eq!(mask[..34].iter().filter(|&&m| m == 1).count(), 12);
        assert_eq!(mask[45], 0);
    }

    #[test]
    fn rejects() {
        assert!(matches!(Bot::new(4, 1), Err(BotError::InvalidPlayerId(4))));
        assert!(matches!(Bot::new(0, 5), Err(BotError::UnsupportedVersion(5))));

        let mut bot = Bot::new(1, 4).unwrap();
        assert!(matches!(bot.react("{\"type\":"), Err(BotError::MalformedInput(_))));
        assert!(matches!(
            bot.react(r#"{"type":"dahai","actor":7,"pai":"1m","tsumogiri":false}"#),
            Err(BotError::OutOfBound(_)),
        ));
        assert!(matches!(
            bot.react(r#"{"type":"tsumo","actor":1,"pai":"1m"}"#),
            Err(BotError::InconsistentState(_)),
        ));
    }
}
