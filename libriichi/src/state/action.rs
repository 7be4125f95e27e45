use serde::Serialize;

/// What the seat may do right after an event. Recomputed on every update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCandidate {
    pub can_discard: bool,
    pub can_chi_low: bool,
    pub can_chi_mid: bool,
    pub can_chi_high: bool,
    pub can_pon: bool,
    pub can_daiminkan: bool,
    pub can_kakan: bool,
    pub can_ankan: bool,
    pub can_riichi: bool,
    pub can_tsumo_agari: bool,
    pub can_ron_agari: bool,
    pub can_ryukyoku: bool,
    /// Absolute seat of the actor of the event, or our own seat for events
    /// without an actor.
    pub target_actor: u8,
}

impl ActionCandidate {
    #[inline]
    #[must_use]
    pub const fn can_chi(&self) -> bool {
        self.can_chi_low || self.can_chi_mid || self.can_chi_high
    }

    #[inline]
    #[must_use]
    pub const fn can_kan(&self) -> bool {
        self.can_daiminkan || self.can_kakan || self.can_ankan
    }

    #[inline]
    #[must_use]
    pub const fn can_agari(&self) -> bool {
        self.can_tsumo_agari || self.can_ron_agari
    }

    /// Passing is only an option when reacting to someone else's tile.
    #[inline]
    #[must_use]
    pub const fn can_pass(&self) -> bool {
        self.can_chi() || self.can_pon || self.can_daiminkan || self.can_ron_agari
    }

    #[inline]
    #[must_use]
    pub const fn can_act(&self) -> bool {
        self.can_discard
            || self.can_chi()
            || self.can_pon
            || self.can_kan()
            || self.can_riichi
            || self.can_agari()
            || self.can_ryukyoku
    }
}
