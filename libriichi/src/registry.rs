//! Owns bot instances behind opaque handles.
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::mjai::Bot;
use std::fmt;

use ahash::AHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BotHandle(u64);

impl BotHandle {
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handles are never reused, so a released handle stays invalid for the
/// lifetime of the registry.
#[derive(Debug, Default)]
pub struct BotRegistry {
    bots: AHashMap<u64, Bot>,
    next: u64,
}

impl BotRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, player_id: u8, version: u32) -> Result<BotHandle> {
        self.create_from_config(BotConfig::new(player_id, version))
    }

    pub fn create_from_config(&mut self, config: BotConfig) -> Result<BotHandle> {
        let bot = Bot::from_config(config)?;
        let handle = BotHandle(self.next);
        self.next += 1;
        self.bots.insert(handle.0, bot);
        log::debug!("created bot {handle} for player {}", config.player_id);
        Ok(handle)
    }

    pub fn release(&mut self, handle: BotHandle) -> Result<()> {
        self.bots
            .remove(&handle.0)
            .map(|_| log::debug!("released bot {handle}"))
            .ok_or(BotError::UnknownHandle(handle.0))
    }

    pub fn get(&self, handle: BotHandle) -> Result<&Bot> {
        self.bots
            .get(&handle.0)
            .ok_or(BotError::UnknownHandle(handle.0))
    }

    pub fn get_mut(&mut self, handle: BotHandle) -> Result<&mut Bot> {
        self.bots
            .get_mut(&handle.0)
            .ok_or(BotError::UnknownHandle(handle.0))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}
