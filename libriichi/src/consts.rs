use crate::error::BotError;

/// 37 discards (34 kinds + 3 akas), riichi, 3 chis, pon, kan, hora,
/// ryukyoku and pass.
pub const ACTION_SPACE: usize = 37 + 1 + 3 + 1 + 1 + 1 + 1 + 1;

pub const MIN_VERSION: u32 = 1;
pub const MAX_VERSION: u32 = 4;

/// Width of every observation plane, one column per tile kind.
pub const OBS_WIDTH: usize = 34;

/// Shape of the observation of `version`, as `(channels, 34)`.
#[inline]
pub fn obs_shape(version: u32) -> Result<(usize, usize), BotError> {
    let channels = match version {
        1 => 938,
        2 => 942,
        3 => 934,
        4 => 1012,
        _ => return Err(BotError::UnsupportedVersion(version)),
    };
    Ok((channels, OBS_WIDTH))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(ACTION_SPACE, 46);
        assert_eq!(obs_shape(1).unwrap(), (938, 34));
        assert_eq!(obs_shape(4).unwrap(), (1012, 34));
        assert!(matches!(obs_shape(0), Err(BotError::UnsupportedVersion(0))));
        assert!(matches!(obs_shape(5), Err(BotError::UnsupportedVersion(5))));
    }
}
