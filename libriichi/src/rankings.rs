/// Ranks of the four seats by score. Ties are broken by seat order, the
/// seat closer to the initial oya ranks higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rankings {
    /// `rank_by_player[seat]` is the rank of `seat`, counting from 0.
    pub rank_by_player: [u8; 4],
    /// `player_by_rank[rank]` is the seat at `rank`.
    pub player_by_rank: [u8; 4],
}

impl Rankings {
    #[must_use]
    pub fn new(scores: [i32; 4]) -> Self {
        let mut player_by_rank = [0, 1, 2, 3];
        // stable, so ties keep seat order
        player_by_rank.sort_by_key(|&p| -scores[p as usize]);

        let mut rank_by_player = [0; 4];
        for (rank, &player) in player_by_rank.iter().enumerate() {
            rank_by_player[player as usize] = rank as u8;
        }

        Self {
            rank_by_player,
            player_by_rank,
        }
    }
}
