//! `riichi` is the decision core of a Riichi mahjong bot speaking mjai.
//!
//! A [`PlayerState`](state::PlayerState) follows the game from one seat's
//! perspective, event by event, and whenever that seat has to act, it
//! produces a fixed-shape observation tensor and a legality mask over the
//! [46-slot action space](state::codec::Action). An action index picked by a
//! policy is then decoded back into an mjai event.
//!
//! [`mjai::Bot`] wraps all of this behind a line-in, line-out interface, and
//! [`registry::BotRegistry`] manages bot instances behind opaque handles.

pub mod algo;
pub mod chi_type;
pub mod config;
pub mod consts;
pub mod error;
pub mod hand;
pub mod mjai;
pub mod rankings;
pub mod registry;
pub mod rules;
pub mod state;
pub mod tile;

pub use error::BotError;
