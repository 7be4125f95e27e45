pub mod action;
pub mod agent_helper;
pub mod codec;
pub mod danger;
pub mod item;
pub mod obs_repr;
pub mod player_state;
pub mod update;

#[cfg(test)]
pub mod test;

pub use action::ActionCandidate;
pub use codec::Action;
pub use player_state::PlayerState;
