use crate::tile::Tile;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

/// An mjai event, one per line on the wire, tagged by `"type"`.
///
/// Unknown fields are ignored, missing ones are a parse error. `none` and
/// `ryukyoku` name the seat only when it is a reaction.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    None {
        actor: Option<u8>,
    },

    StartGame {
        #[serde(default)]
        names: [String; 4],
        seed: Option<(u64, u64)>,
    },
    StartKyoku {
        bakaze: Tile,
        dora_marker: Tile,
        /// Counts from 1.
        kyoku: u8,
        honba: u8,
        kyotaku: u8,
        oya: u8,
        scores: [i32; 4],
        tehais: [[Tile; 13]; 4],
    },

    Tsumo {
        actor: u8,
        pai: Tile,
    },
    Dahai {
        actor: u8,
        pai: Tile,
        tsumogiri: bool,
    },

    Chi {
        actor: u8,
        target: u8,
        pai: Tile,
        consumed: [Tile; 2],
    },
    Pon {
        actor: u8,
        target: u8,
        pai: Tile,
        consumed: [Tile; 2],
    },
    Daiminkan {
        actor: u8,
        target: u8,
        pai: Tile,
        consumed: [Tile; 3],
    },
    Kakan {
        actor: u8,
        pai: Tile,
        consumed: [Tile; 3],
    },
    Ankan {
        actor: u8,
        consumed: [Tile; 4],
    },
    Dora {
        dora_marker: Tile,
    },

    Reach {
        actor: u8,
    },
    ReachAccepted {
        actor: u8,
    },

    Hora {
        actor: u8,
        target: u8,
        pai: Option<Tile>,
        deltas: Option<[i32; 4]>,
        ura_markers: Option<Vec<Tile>>,
    },
    Ryukyoku {
        actor: Option<u8>,
        deltas: Option<[i32; 4]>,
    },

    EndKyoku,
    EndGame,
}

#[derive(Debug, Error)]
pub enum OutOfBoundError {
    #[error("seat {0} is not in range [0, 3]")]
    Seat(u8),
    #[error("kyoku {0} is not in range [1, 4]")]
    Kyoku(u8),
    #[error("bakaze {0} is not a wind")]
    Bakaze(Tile),
    #[error("unexpected hidden tile in {0}")]
    HiddenTile(&'static str),
}

impl Event {
    #[inline]
    #[must_use]
    pub const fn actor(&self) -> Option<u8> {
        match *self {
            Self::Tsumo { actor, .. }
            | Self::Dahai { actor, .. }
            | Self::Chi { actor, .. }
            | Self::Pon { actor, .. }
            | Self::Daiminkan { actor, .. }
            | Self::Kakan { actor, .. }
            | Self::Ankan { actor, .. }
            | Self::Reach { actor }
            | Self::ReachAccepted { actor }
            | Self::Hora { actor, .. } => Some(actor),
            Self::None { actor } | Self::Ryukyoku { actor, .. } => actor,
            _ => None,
        }
    }

    /// The tile an event puts on the table for others to react to.
    #[inline]
    #[must_use]
    pub const fn discarded_tile(&self) -> Option<Tile> {
        match *self {
            Self::Dahai { pai, .. } | Self::Kakan { pai, .. } => Some(pai),
            _ => None,
        }
    }

    /// Checks the numeric fields that serde cannot. Hidden tiles are only
    /// allowed in haipai and in other seats' draws.
    pub fn check_bounds(&self) -> Result<(), OutOfBoundError> {
        match self {
            Self::StartKyoku {
                bakaze,
                dora_marker,
                kyoku,
                oya,
                ..
            } => {
                seat(*oya)?;
                if !matches!(kyoku, 1..=4) {
                    return Err(OutOfBoundError::Kyoku(*kyoku));
                }
                if !matches!(bakaze.as_u8(), 27..=30) {
                    return Err(OutOfBoundError::Bakaze(*bakaze));
                }
                known(&[*dora_marker], "dora_marker")
            }
            Self::Tsumo { actor, .. } => seat(*actor),
            Self::Dahai { actor, pai, .. } => {
                seat(*actor)?;
                known(&[*pai], "dahai")
            }
            Self::Chi {
                actor,
                target,
                pai,
                consumed,
            }
            | Self::Pon {
                actor,
                target,
                pai,
                consumed,
            } => {
                seat(*actor)?;
                seat(*target)?;
                known(&[*pai], "pai")?;
                known(consumed, "consumed")
            }
            Self::Daiminkan {
                actor,
                target,
                pai,
                consumed,
            } => {
                seat(*actor)?;
                seat(*target)?;
                known(&[*pai], "pai")?;
                known(consumed, "consumed")
            }
            Self::Kakan {
                actor,
                pai,
                consumed,
            } => {
                seat(*actor)?;
                known(&[*pai], "pai")?;
                known(consumed, "consumed")
            }
            Self::Ankan { actor, consumed } => {
                seat(*actor)?;
                known(consumed, "consumed")
            }
            Self::Dora { dora_marker } => known(&[*dora_marker], "dora_marker"),
            Self::Reach { actor } | Self::ReachAccepted { actor } => seat(*actor),
            Self::Hora { actor, target, .. } => {
                seat(*actor)?;
                seat(*target)
            }
            Self::None { actor: Some(actor) } | Self::Ryukyoku { actor: Some(actor), .. } => {
                seat(*actor)
            }
            _ => Ok(()),
        }
    }
}

const fn seat(s: u8) -> Result<(), OutOfBoundError> {
    if s < 4 {
        Ok(())
    } else {
        Err(OutOfBoundError::Seat(s))
    }
}

fn known(tiles: &[Tile], name: &'static str) -> Result<(), OutOfBoundError> {
    if tiles.iter().any(|t| t.is_unknown()) {
        Err(OutOfBoundError::HiddenTile(name))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::t;

    #[test]
    fn serde() {
        let line = r#"{"type":"dahai","actor":1,"pai":"5mr","tsumogiri":false}"#;
        let ev: Event = serde_json::from_str(line).unwrap();
        assert_eq!(
            ev,
            Event::Dahai {
                actor: 1,
                pai: t!(5mr),
                tsumogiri: false,
            },
        );
        assert_eq!(serde_json::to_string(&ev).unwrap(), line);

        let ev = Event::Hora {
            actor: 2,
            target: 2,
            pai: Some(t!(3s)),
            deltas: None,
            ura_markers: None,
        };
        assert_eq!(
            serde_json::to_string(&ev).unwrap(),
            r#"{"type":"hora","actor":2,"target":2,"pai":"3s"}"#,
        );
        assert_eq!(
            serde_json::to_string(&Event::None { actor: None }).unwrap(),
            r#"{"type":"none"}"#,
        );
        let ev: Event = serde_json::from_str(r#"{"type":"ryukyoku","deltas":[0,0,0,0]}"#).unwrap();
        assert_eq!(
            ev,
            Event::Ryukyoku {
                actor: None,
                deltas: Some([0; 4]),
            },
        );
        let ev = Event::Ryukyoku {
            actor: Some(1),
            deltas: None,
        };
        assert_eq!(
            serde_json::to_string(&ev).unwrap(),
            r#"{"type":"ryukyoku","actor":1}"#,
        );

        let ev: Event = serde_json::from_str(r#"{"type":"start_game","id":0}"#).unwrap();
        assert!(matches!(ev, Event::StartGame { seed: None, .. }));
        serde_json::from_str::<Event>(r#"{"type":"tsumo","actor":1}"#).unwrap_err();
        serde_json::from_str::<Event>(r#"{"actor":1,"pai":"1m"}"#).unwrap_err();
        serde_json::from_str::<Event>(r#"{"type":"tsumo","actor":1,"pai":"0m"}"#).unwrap_err();
    }

    #[test]
    fn bounds() {
        let ev = Event::Tsumo {
            actor: 4,
            pai: t!(?),
        };
        assert!(matches!(ev.check_bounds(), Err(OutOfBoundError::Seat(4))));
        let ev = Event::Tsumo {
            actor: 3,
            pai: t!(?),
        };
        ev.check_bounds().unwrap();
        let ev = Event::Dahai {
            actor: 3,
            pai: t!(?),
            tsumogiri: true,
        };
        ev.check_bounds().unwrap_err();
        assert_eq!(ev.actor(), Some(3));
        assert_eq!(ev.discarded_tile(), Some(t!(?)));

        let ev = Event::None { actor: Some(5) };
        assert!(matches!(ev.check_bounds(), Err(OutOfBoundError::Seat(5))));
        assert_eq!(Event::None { actor: Some(2) }.actor(), Some(2));
        assert_eq!(Event::None { actor: None }.actor(), None);
    }
}
