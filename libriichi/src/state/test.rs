use super::item::MeldKind;
use super::{ActionCandidate, PlayerState};
use crate::algo::shanten;
use crate::chi_type::ChiType;
use crate::consts::{MAX_VERSION, obs_shape};
use crate::hand::{hand, parse_tiles};
use crate::mjai::Event;
use crate::tile::Tile;
use crate::{must_tile, t, tuz};

impl PlayerState {
    fn test_update(&mut self, event: &Event) -> ActionCandidate {
        let cans = self.update(event).unwrap();
        self.validate();
        cans
    }

    fn test_update_json(&mut self, mjai_json: &str) -> ActionCandidate {
        let cans = self.update_json(mjai_json).unwrap();
        self.validate();
        cans
    }

    fn from_log(player_id: u8, log: &str) -> Self {
        let mut ps = Self::new(player_id);
        for line in log.trim().lines() {
            ps.test_update_json(line.trim());
        }
        ps
    }

    fn num_doras_in_hand(&self) -> u8 {
        self.tehai
            .iter()
            .zip(self.dora_factor.iter())
            .map(|(&count, &f)| count * f)
            .chain(self.akas_in_hand.iter().map(|&b| b as u8))
            .chain(
                self.melds[0]
                    .iter()
                    .flat_map(|m| m.tiles.iter())
                    .map(|t| self.dora_factor[t.deaka().as_usize()] + t.is_aka() as u8),
            )
            .sum()
    }

    fn validate(&self) {
        assert_eq!(self.doras_owned[0], self.num_doras_in_hand());
        if self.in_kyoku {
            assert_eq!(
                self.real_time_shanten(),
                shanten::calc_all(&self.tehai, self.tehai_len_div3),
            );
            assert_eq!(
                self.is_menzen,
                self.melds[0].iter().all(|m| m.kind == MeldKind::Ankan),
            );
            self.check_tile_conservation().unwrap();
        }

        let mask = self.action_mask();
        if !self.last_cans.can_act() {
            assert!(mask.iter().all(|&b| !b));
            return;
        }
        for version in 1..=MAX_VERSION {
            let obs = self.encode_obs(version).unwrap();
            assert_eq!(obs.dim(), obs_shape(version).unwrap());
        }
        let candidates = self.candidates().unwrap();
        assert_eq!(candidates.len(), mask.iter().filter(|&&b| b).count());
        for ev in &candidates {
            self.validate_reaction(ev).unwrap();
        }
    }
}

/// Deals `tehai` to `player_id` and leaves the other hands hidden.
fn deal(player_id: u8, oya: u8, tehai: &str, dora_marker: Tile) -> PlayerState {
    let mut tehais = [[t!(?); 13]; 4];
    tehais[player_id as usize].copy_from_slice(&parse_tiles(tehai).unwrap());
    let mut ps = PlayerState::new(player_id);
    ps.test_update(&Event::StartKyoku {
        bakaze: t!(E),
        dora_marker,
        kyoku: oya + 1,
        honba: 0,
        kyotaku: 0,
        oya,
        scores: [25000; 4],
        tehais,
    });
    ps
}

fn tsumo_dahai(ps: &mut PlayerState, actor: u8, pai: Tile) -> ActionCandidate {
    ps.test_update(&Event::Tsumo {
        actor,
        pai: t!(?),
    });
    ps.test_update(&Event::Dahai {
        actor,
        pai,
        tsumogiri: false,
    })
}

#[test]
fn waits() {
    let mut ps = PlayerState {
        tehai: hand("456m 78999p 789s 77z").unwrap(),
        tehai_len_div3: 4,
        ..Default::default()
    };
    ps.update_waits_and_furiten();
    let expected = t![6p, 9p, C];
    for (idx, &b) in ps.waits.iter().enumerate() {
        assert_eq!(b, expected.contains(&must_tile!(idx)), "{}", must_tile!(idx));
    }

    let mut ps = PlayerState {
        tehai: hand("2344445666678s").unwrap(),
        tehai_len_div3: 4,
        ..Default::default()
    };
    ps.update_waits_and_furiten();
    let expected = t![1s, 2s, 3s, 5s, 7s, 8s, 9s];
    for (idx, &b) in ps.waits.iter().enumerate() {
        assert_eq!(b, expected.contains(&must_tile!(idx)), "{}", must_tile!(idx));
    }

    // the fourth 6p is already out there
    let mut ps = PlayerState {
        tehai: hand("456m 78999p 789s 77z").unwrap(),
        tehai_len_div3: 4,
        ..Default::default()
    };
    ps.tiles_seen[tuz!(6p)] = 4;
    ps.update_waits_and_furiten();
    assert!(!ps.waits[tuz!(6p)]);
    assert!(ps.waits[tuz!(9p)] && ps.waits[tuz!(C)]);
}

#[test]
fn can_chi() {
    let mut ps = PlayerState::new(0);
    ps.tehai = hand("1111234m").unwrap();
    ps.set_can_chi_from_tile(t!(1m), true);
    assert!(!ps.last_cans.can_chi());
    ps.set_can_chi_from_tile(t!(2m), true);
    assert!(matches!(
        ps.last_cans,
        ActionCandidate {
            can_chi_high: false,
            can_chi_mid: true,
            can_chi_low: true,
            ..
        },
    ));
    ps.set_can_chi_from_tile(t!(2m), false);
    assert!(!ps.last_cans.can_chi());

    ps.tehai = hand("4556s").unwrap();
    ps.set_can_chi_from_tile(t!(5s), true);
    assert!(!ps.last_cans.can_chi());
    ps.set_can_chi_from_tile(t!(7s), true);
    assert!(matches!(
        ps.last_cans,
        ActionCandidate {
            can_chi_high: true,
            can_chi_mid: false,
            can_chi_low: false,
            ..
        },
    ));
}

#[test]
fn furiten() {
    let mut ps = deal(0, 0, "23406m 456789p 58s", t!(3p));
    ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(8s),
    });
    assert_eq!(ps.shanten, 1);
    assert!(ps.waits.iter().all(|&b| !b));
    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(5s),
        tsumogiri: false,
    });
    assert_eq!(ps.shanten, 0);
    assert!(ps.waits[tuz!(1m)] && ps.waits[tuz!(4m)] && ps.waits[tuz!(7m)]);
    assert!(!ps.at_furiten);

    let cans = tsumo_dahai(&mut ps, 1, t!(1m));
    assert!(!ps.at_furiten);
    assert!(cans.can_ron_agari);
    assert!(ps.action_mask()[43] && ps.action_mask()[45]);

    // passed, same-cycle furiten from the next event on
    ps.test_update(&Event::Tsumo {
        actor: 2,
        pai: t!(?),
    });
    assert!(ps.at_furiten);
    ps.test_update(&Event::Dahai {
        actor: 2,
        pai: t!(1s),
        tsumogiri: true,
    });

    let cans = tsumo_dahai(&mut ps, 3, t!(1m));
    assert!(ps.at_furiten);
    assert!(!cans.can_ron_agari);
    assert!(!ps.action_mask()[43]);

    ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(3s),
    });
    assert!(ps.at_furiten);
    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(3s),
        tsumogiri: true,
    });
    assert!(!ps.at_furiten);

    tsumo_dahai(&mut ps, 1, t!(P));
    tsumo_dahai(&mut ps, 2, t!(C));
    let cans = tsumo_dahai(&mut ps, 3, t!(1m));
    assert!(!ps.at_furiten);
    assert!(cans.can_ron_agari);
    assert_eq!(
        ps.decode_action(43).unwrap(),
        Event::Hora {
            actor: 0,
            target: 3,
            pai: Some(t!(1m)),
            deltas: None,
            ura_markers: None,
        },
    );

    // riichi furiten
    let cans = ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(N),
    });
    assert!(cans.can_riichi);
    ps.test_update(&Event::Reach { actor: 0 });
    // only discards keeping tenpai
    let mask = ps.action_mask();
    assert!(mask[tuz!(N)]);
    assert!(!mask[tuz!(4p)]);
    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(N),
        tsumogiri: true,
    });
    ps.test_update(&Event::ReachAccepted { actor: 0 });
    assert_eq!(ps.scores[0], 24000);
    assert_eq!(ps.kyotaku, 1);

    for actor in 1..4 {
        ps.test_update(&Event::Tsumo {
            actor,
            pai: t!(?),
        });
        ps.test_update(&Event::Dahai {
            actor,
            pai: t!(9m),
            tsumogiri: true,
        });
    }

    // tsumo agari minogashi
    let cans = ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(1m),
    });
    assert!(!ps.at_furiten);
    assert!(cans.can_tsumo_agari);
    let mask = ps.action_mask();
    assert_eq!(mask.iter().filter(|&&b| b).count(), 2);
    assert!(mask[tuz!(1m)] && mask[43]);
    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(1m),
        tsumogiri: true,
    });
    assert!(ps.at_furiten);

    let cans = tsumo_dahai(&mut ps, 1, t!(4m));
    assert!(ps.at_furiten);
    assert!(!cans.can_ron_agari);
}

#[test]
fn calls() {
    let log = r#"
        {"type":"start_game","names":["0","1","2","3"]}
        {"type":"start_kyoku","bakaze":"E","dora_marker":"9s","kyoku":1,"honba":0,"kyotaku":0,"oya":0,"scores":[25000,25000,25000,25000],"tehais":[["3m","4m","5mr","6m","7m","2p","3p","4p","1s","1s","9s","9s","N"],["?","?","?","?","?","?","?","?","?","?","?","?","?"],["?","?","?","?","?","?","?","?","?","?","?","?","?"],["?","?","?","?","?","?","?","?","?","?","?","?","?"]]}
        {"type":"tsumo","actor":0,"pai":"W"}
        {"type":"dahai","actor":0,"pai":"N","tsumogiri":false}
        {"type":"tsumo","actor":1,"pai":"?"}
    "#;
    let mut ps = PlayerState::from_log(0, log);
    assert_eq!(ps.doras_owned[0], 3);

    let cans = ps.test_update_json(r#"{"type":"dahai","actor":1,"pai":"9s","tsumogiri":false}"#);
    assert!(cans.can_pon);
    assert!(!cans.can_chi() && !cans.can_daiminkan && !cans.can_ron_agari);
    let mask = ps.action_mask();
    assert_eq!(mask.iter().filter(|&&b| b).count(), 2);
    assert!(mask[41] && mask[45]);
    assert_eq!(
        ps.decode_action(41).unwrap(),
        Event::Pon {
            actor: 0,
            target: 1,
            pai: t!(9s),
            consumed: t![9s, 9s],
        },
    );
    assert_eq!(ps.decode_action(45).unwrap(), Event::None { actor: Some(0) });

    ps.test_update_json(r#"{"type":"tsumo","actor":2,"pai":"?"}"#);
    ps.test_update_json(r#"{"type":"dahai","actor":2,"pai":"E","tsumogiri":true}"#);
    ps.test_update_json(r#"{"type":"tsumo","actor":3,"pai":"?"}"#);
    let cans = ps.test_update_json(r#"{"type":"dahai","actor":3,"pai":"5m","tsumogiri":false}"#);
    assert!(cans.can_chi_low && cans.can_chi_mid && cans.can_chi_high);
    assert!(!cans.can_pon);
    for (index, consumed) in [(38, t![6m, 7m]), (39, t![4m, 6m]), (40, t![3m, 4m])] {
        assert_eq!(
            ps.decode_action(index).unwrap(),
            Event::Chi {
                actor: 0,
                target: 3,
                pai: t!(5m),
                consumed,
            },
        );
    }

    let cans = ps.test_update_json(
        r#"{"type":"chi","actor":0,"target":3,"pai":"5m","consumed":["4m","6m"]}"#,
    );
    assert!(cans.can_discard);
    assert!(!ps.is_menzen);
    assert_eq!(ps.tehai_lens[0], 11);
    assert_eq!(ps.tehai_len_div3, 3);
    let meld = &ps.melds[0][0];
    assert_eq!(meld.kind, MeldKind::Chi);
    assert_eq!(meld.called, Some(t!(5m)));
    assert_eq!(meld.target, Some(3));
    assert!(ps.kawa[3].last().unwrap().as_ref().unwrap().called);

    // kuikae
    assert!(ps.forbidden_tiles[tuz!(5m)]);
    let mask = ps.action_mask();
    assert!(!mask[tuz!(5m)] && !mask[tuz!(5mr)]);
    assert!(mask[tuz!(W)] && mask[tuz!(3m)]);
    assert!(ps.validate_reaction(&Event::Dahai {
        actor: 0,
        pai: t!(5mr),
        tsumogiri: false,
    })
    .is_err());

    ps.test_update_json(r#"{"type":"dahai","actor":0,"pai":"W","tsumogiri":false}"#);
    assert!(ps.forbidden_tiles.iter().all(|&b| !b));
    ps.test_update_json(r#"{"type":"tsumo","actor":1,"pai":"?"}"#);
    ps.test_update_json(r#"{"type":"dahai","actor":1,"pai":"C","tsumogiri":false}"#);
    let cans = ps.test_update_json(
        r#"{"type":"pon","actor":3,"target":1,"pai":"C","consumed":["C","C"]}"#,
    );
    assert!(!cans.can_act());
    assert_eq!(ps.tehai_lens[3], 11);
    assert_eq!(ps.melds[3][0].kind, MeldKind::Pon);
    assert_eq!(ps.melds[3][0].target, Some(1));
    // toimen skipped a turn
    assert!(ps.kawa[2].last().unwrap().is_none());
    assert_eq!(ps.tiles_seen[tuz!(C)], 3);

    let cans = ps.test_update_json(r#"{"type":"dahai","actor":3,"pai":"8p","tsumogiri":false}"#);
    assert!(!cans.can_act());
    assert_eq!(ps.kawa_overview[3].len(), 2);
    assert_eq!(ps.tiles_left, 65);
}

#[test]
fn aka_preference() {
    let mut ps = deal(0, 3, "05p 406m 789s 123p 11z", t!(1s));
    assert_eq!(ps.jikaze, t!(S));

    let cans = tsumo_dahai(&mut ps, 3, t!(5p));
    assert!(cans.can_pon && !cans.can_chi());
    let pon = ps.decode_action(41).unwrap();
    assert_eq!(
        pon,
        Event::Pon {
            actor: 0,
            target: 3,
            pai: t!(5p),
            consumed: t![5pr, 5p],
        },
    );
    ps.validate_reaction_json(r#"{"type":"pon","actor":0,"target":3,"pai":"5p","consumed":["5pr","5p"]}"#)
        .unwrap();
    ps.validate_reaction_json(r#"{"type":"none"}"#).unwrap();
    ps.validate_reaction_json(r#"{"type":"dahai","actor":0,"pai":"E","tsumogiri":false}"#)
        .unwrap_err();
    ps.test_update(&pon);
    assert!(!ps.akas_in_hand[1]);
    assert_eq!(ps.doras_owned[0], 2);

    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(E),
        tsumogiri: false,
    });
    assert_eq!(ps.shanten, 0);
    assert!(ps.waits[tuz!(E)]);

    tsumo_dahai(&mut ps, 1, t!(N));
    tsumo_dahai(&mut ps, 2, t!(N));
    let cans = tsumo_dahai(&mut ps, 3, t!(3m));
    assert!(cans.can_chi_low && !cans.can_chi_mid && !cans.can_chi_high);
    let chi = ps.decode_action(38).unwrap();
    assert_eq!(
        chi,
        Event::Chi {
            actor: 0,
            target: 3,
            pai: t!(3m),
            consumed: t![4m, 5mr],
        },
    );
    let Event::Chi { pai, consumed, .. } = chi else {
        unreachable!();
    };
    assert_eq!(ChiType::new(consumed, pai).unwrap(), ChiType::Low);
}

#[test]
fn kyuushu_kyuuhai() {
    let mut ps = deal(0, 0, "15569m 19p 19s 1234z", t!(1s));
    let cans = ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(P),
    });
    assert!(cans.can_ryukyoku);
    assert!(ps.action_mask()[44]);
    let ryukyoku = ps.decode_action(44).unwrap();
    assert_eq!(
        ryukyoku,
        Event::Ryukyoku {
            actor: Some(0),
            deltas: None,
        },
    );
    ps.validate_reaction(&ryukyoku).unwrap();
    // another seat cannot declare it for us
    ps.validate_reaction(&Event::Ryukyoku {
        actor: Some(2),
        deltas: None,
    })
    .unwrap_err();

    ps.test_update(&ryukyoku);
    assert!(!ps.in_kyoku);
    assert!(!ps.action_mask().iter().any(|&b| b));
}

#[test]
fn ankan_and_rinshan() {
    let mut ps = deal(0, 0, "5550m 123p 456s 78s 1z", t!(1s));
    let cans = ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(E),
    });
    assert!(cans.can_ankan && !cans.can_kakan);
    assert_eq!(ps.ankan_candidates.as_slice(), &[t!(5m)]);

    let ankan = ps.decode_action(42).unwrap();
    assert_eq!(
        ankan,
        Event::Ankan {
            actor: 0,
            consumed: t![5mr, 5m, 5m, 5m],
        },
    );
    ps.test_update(&ankan);
    assert!(ps.is_menzen);
    assert_eq!(ps.kans_on_board, 1);
    assert_eq!(ps.tehai_lens[0], 10);

    ps.test_update(&Event::Dora {
        dora_marker: t!(4m),
    });
    assert_eq!(ps.doras_owned[0], 5);

    let cans = ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(9s),
    });
    assert!(ps.at_rinshan);
    assert!(cans.can_tsumo_agari);
    assert_eq!(ps.tiles_left, 68);
}

#[test]
fn rejects_inconsistent_events() {
    let mut ps = PlayerState::new(2);
    assert!(
        ps.update(&Event::Tsumo {
            actor: 2,
            pai: t!(1m),
        })
        .is_err()
    );

    let mut ps = deal(2, 0, "1112345678999m", t!(E));
    let snapshot = format!("{ps:?}");

    // not held
    assert!(
        ps.update(&Event::Dahai {
            actor: 2,
            pai: t!(C),
            tsumogiri: false,
        })
        .is_err()
    );
    assert_eq!(format!("{ps:?}"), snapshot);

    // fifth 1m
    ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(?),
    });
    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(1m),
        tsumogiri: false,
    });
    ps.test_update(&Event::Chi {
        actor: 1,
        target: 0,
        pai: t!(1m),
        consumed: t![2m, 3m],
    });
    let before = format!("{ps:?}");
    assert!(
        ps.update(&Event::Dahai {
            actor: 1,
            pai: t!(1m),
            tsumogiri: false,
        })
        .is_err()
    );
    assert_eq!(format!("{ps:?}"), before);

    // double tsumo breaks the hand length
    let mut ps = deal(2, 0, "1112345678999m", t!(E));
    ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(?),
    });
    let before = format!("{ps:?}");
    let err = ps
        .update(&Event::Tsumo {
            actor: 0,
            pai: t!(?),
        })
        .unwrap_err();
    assert!(format!("{err:#}").contains("tiles"));
    assert_eq!(format!("{ps:?}"), before);
    assert_eq!(ps.tehai_lens[2], 14);
}

#[test]
fn start_game_resets() {
    let mut ps = deal(1, 0, "123456789m 1122z", t!(E));
    assert!(ps.in_kyoku);
    ps.update(&Event::StartGame {
        names: Default::default(),
        seed: None,
    })
    .unwrap();
    assert!(!ps.in_kyoku);
    assert_eq!(ps.tehai, [0; 34]);
    assert_eq!(ps.player_id, 1);
}

#[test]
fn aka_is_the_last_five() {
    let mut ps = deal(0, 0, "05m 123p 456s 789s 11z", t!(1s));
    ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(N),
    });
    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(5m),
        tsumogiri: false,
    });
    assert!(ps.akas_in_hand[0]);
    assert_eq!(ps.tehai[tuz!(5m)], 1);

    tsumo_dahai(&mut ps, 1, t!(S));
    tsumo_dahai(&mut ps, 2, t!(S));
    tsumo_dahai(&mut ps, 3, t!(W));
    ps.test_update(&Event::Tsumo {
        actor: 0,
        pai: t!(W),
    });
    let before = format!("{ps:?}");
    let err = ps
        .update(&Event::Dahai {
            actor: 0,
            pai: t!(5m),
            tsumogiri: false,
        })
        .unwrap_err();
    assert!(format!("{err:#}").contains("only the aka is left"));
    assert_eq!(format!("{ps:?}"), before);

    ps.test_update(&Event::Dahai {
        actor: 0,
        pai: t!(5mr),
        tsumogiri: false,
    });
    assert!(!ps.akas_in_hand[0]);
    assert_eq!(ps.tehai[tuz!(5m)], 0);
}

#[test]
fn all_last() {
    let ps = deal(0, 3, "123456789m 1122z", t!(E));
    assert!(!ps.is_all_last);

    let mut tehais = [[t!(?); 13]; 4];
    tehais[2].copy_from_slice(&parse_tiles("123456789m 1122z").unwrap());
    let mut ps = PlayerState::new(2);
    for (bakaze, kyoku, all_last) in [(t!(S), 3, false), (t!(S), 4, true), (t!(W), 1, true)] {
        ps.test_update(&Event::StartKyoku {
            bakaze,
            dora_marker: t!(E),
            kyoku,
            honba: 0,
            kyotaku: 0,
            oya: kyoku - 1,
            scores: [25000; 4],
            tehais,
        });
        assert_eq!(ps.is_all_last, all_last, "{bakaze}{kyoku}");
        assert!(ps.brief_info().contains(&format!("all last: {all_last}")));
    }
}
