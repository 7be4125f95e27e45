use crate::tile::Tile;
use std::fmt;

use serde::Serialize;
use tinyvec::ArrayVec;

#[derive(Debug, Clone, Default, Serialize)]
pub struct KawaItem {
    /// The chi or pon made right before this discard.
    pub chi_pon: Option<ChiPon>,
    /// Kans made since the last discard of the same seat.
    pub kan: ArrayVec<[Tile; 4]>,
    pub sutehai: Sutehai,
    /// Taken by someone else's chi, pon or daiminkan.
    pub called: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Sutehai {
    pub tile: Tile,
    pub is_dora: bool,
    pub is_tedashi: bool,
    pub is_riichi: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChiPon {
    pub consumed: [Tile; 2],
    pub target_tile: Tile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeldKind {
    #[default]
    Chi,
    Pon,
    Daiminkan,
    Kakan,
    Ankan,
}

/// An exposed or closed set. Only a pon changes after being formed, it
/// becomes a kakan when the fourth tile is added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meld {
    pub kind: MeldKind,
    pub tiles: ArrayVec<[Tile; 4]>,
    /// `None` for ankan.
    pub called: Option<Tile>,
    /// Relative seat the tile is called from, `None` for ankan.
    pub target: Option<u8>,
}

impl Meld {
    #[inline]
    #[must_use]
    pub const fn is_kan(&self) -> bool {
        matches!(
            self.kind,
            MeldKind::Daiminkan | MeldKind::Kakan | MeldKind::Ankan
        )
    }

    /// Deaka'd kind of the first tile, which identifies pons and kans.
    #[inline]
    #[must_use]
    pub fn head(&self) -> Option<Tile> {
        self.tiles.first().map(|t| t.deaka())
    }
}

impl fmt::Display for Sutehai {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.tile,
            if self.is_dora { "!" } else { "" },
            if self.is_tedashi { "" } else { "^" },
            if self.is_riichi { "|" } else { "" },
        )
    }
}

impl fmt::Display for ChiPon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}{}+{})", self.consumed[0], self.consumed[1], self.target_tile)
    }
}

impl fmt::Display for KawaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.kan.is_empty() {
            f.write_str("{")?;
            for kan in self.kan {
                write!(f, "{kan}")?;
            }
            f.write_str("}")?;
        }
        if let Some(chi_pon) = &self.chi_pon {
            write!(f, "{chi_pon}")?;
        }
        write!(f, "{}", self.sutehai)?;
        if self.called {
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl fmt::Display for Meld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for t in self.tiles {
            write!(f, "{t}")?;
        }
        match self.kind {
            MeldKind::Ankan => f.write_str("]"),
            _ => write!(f, "]{}", self.target.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::t;

    #[test]
    fn display() {
        let item = KawaItem {
            chi_pon: Some(ChiPon {
                consumed: t![4m, 5mr],
                target_tile: t!(6m),
            }),
            kan: ArrayVec::new(),
            sutehai: Sutehai {
                tile: t!(E),
                is_dora: true,
                is_tedashi: false,
                is_riichi: true,
            },
            called: true,
        };
        assert_eq!(item.to_string(), "(4m5mr+6m)E!^|*");

        let meld = Meld {
            kind: MeldKind::Pon,
            tiles: t![P, P, P].into_iter().collect(),
            called: Some(t!(P)),
            target: Some(2),
        };
        assert_eq!(meld.to_string(), "[PPP]2");
        assert!(!meld.is_kan());
        assert_eq!(meld.head(), Some(t!(P)));
    }
}
