//! Helpers for the compact hand notation, e.g. `"123m 406p 77z"`, where `0`
//! stands for a red five and `1z..7z` are `E S W N P F C`.
use crate::tile::Tile;
use crate::{must_tile, t};
use anyhow::{Result, bail, ensure};

/// Parses the compact notation into an ordered list of tiles.
pub fn parse_tiles(s: &str) -> Result<Vec<Tile>> {
    ensure!(s.is_ascii(), "hand {s} contains non-ascii content");

    let mut tiles = vec![];
    let mut stack = vec![];
    for b in s.bytes() {
        match b {
            b'0'..=b'9' => stack.push(b - b'0'),
            b'm' | b'p' | b's' | b'z' => {
                let kind = match b {
                    b'm' => 0,
                    b'p' => 1,
                    b's' => 2,
                    _ => 3,
                };
                for num in stack.drain(..) {
                    let tile = match (kind, num) {
                        (0, 0) => t!(5mr),
                        (1, 0) => t!(5pr),
                        (2, 0) => t!(5sr),
                        (3, 1..=7) | (0..=2, 1..=9) => must_tile!(kind * 9 + num - 1),
                        _ => bail!("invalid tile {num}{}", b as char),
                    };
                    tiles.push(tile);
                }
            }
            _ if b.is_ascii_whitespace() => (),
            _ => bail!("unexpected byte {b}"),
        }
    }
    ensure!(stack.is_empty(), "hand {s} has trailing digits without a suit");

    Ok(tiles)
}

/// Parses the compact notation into 34-D counts, red fives included as their
/// normal counterpart.
pub fn hand(s: &str) -> Result<[u8; 34]> {
    let (tehai, _) = hand_with_aka(s)?;
    Ok(tehai)
}

pub fn hand_with_aka(s: &str) -> Result<([u8; 34], [bool; 3])> {
    let mut tehai = [0; 34];
    let mut akas = [false; 3];
    for tile in parse_tiles(s)? {
        let tid = tile.deaka().as_usize();
        ensure!(tehai[tid] < 4, "hand {s} has more than 4 {tile}");
        tehai[tid] += 1;
        if tile.is_aka() {
            let aka_id = tile.as_usize() - 34;
            ensure!(!akas[aka_id], "hand {s} has duplicated {tile}");
            akas[aka_id] = true;
        }
    }
    Ok((tehai, akas))
}

/// The inverse of [`hand_with_aka`].
#[must_use]
pub fn tiles_to_string(tehai: &[u8; 34], akas_in_hand: [bool; 3]) -> String {
    let mut ret = String::new();
    for (kind, chunk) in tehai.chunks(9).enumerate() {
        let mut group = String::new();
        for (num, &count) in chunk.iter().enumerate() {
            let mut count = count;
            if kind < 3 && num == 4 && akas_in_hand[kind] && count > 0 {
                group.push('0');
                count -= 1;
            }
            for _ in 0..count {
                group.push(char::from(b'1' + num as u8));
            }
        }
        if !group.is_empty() {
            if !ret.is_empty() {
                ret.push(' ');
            }
            ret.push_str(&group);
            ret.push(['m', 'p', 's', 'z'][kind]);
        }
    }
    ret
}
