//! Level-up upgrades.
//!
//! ```text
//! gain_xp ─► pending_level_ups > 0 ─► open_level_up_offer (Cleanup) ─► GameState::LevelUp
//!                                                                          │
//!                 ChooseUpgrade { index } ─► apply_chosen_upgrade ◄─────────┘
//!                                             │
//!                     more pending? ── yes ─► redraw offer
//!                                  └── no ──► GameState::Playing
//! ```

use bevy::prelude::*;
use rand::seq::SliceRandom;

use crate::common::events::{FeedbackCue, GameEvent, SoundCue};
use crate::common::rng::SimRng;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::abilities::{Ability, AbilityId};
use crate::plugins::core::SimSet;
use crate::plugins::drones::SpawnDrone;
use crate::plugins::projectiles::weapon::{Weapon, WeaponId};

use super::Player;

const OFFER_SIZE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeKind {
    RapidFire,
    SpeedBoots,
    TitanHealth,
    HeavyRounds,
    Scholar,
    Vampirism,
    SupportDrone,
    Weapon(WeaponId),
    Ability(AbilityId),
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 12] = [
        UpgradeKind::RapidFire,
        UpgradeKind::SpeedBoots,
        UpgradeKind::TitanHealth,
        UpgradeKind::HeavyRounds,
        UpgradeKind::Scholar,
        UpgradeKind::Vampirism,
        UpgradeKind::SupportDrone,
        UpgradeKind::Weapon(WeaponId::Shotgun),
        UpgradeKind::Weapon(WeaponId::Laser),
        UpgradeKind::Weapon(WeaponId::Ricochet),
        UpgradeKind::Ability(AbilityId::TimeSlow),
        UpgradeKind::Ability(AbilityId::NovaBlast),
    ];

    pub fn is_eligible(self, player: &Player, max_drones: usize) -> bool {
        match self {
            UpgradeKind::Vampirism => !player.stats.vampirism,
            UpgradeKind::SupportDrone => player.drones.len() < max_drones,
            UpgradeKind::Weapon(id) => player.weapon.id != id,
            UpgradeKind::Ability(id) => player.ability.map(|a| a.id) != Some(id),
            _ => true,
        }
    }
}

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct UpgradeOffer {
    pub choices: Vec<UpgradeKind>,
}

/// Pick entry `index` of the current [`UpgradeOffer`].
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChooseUpgrade {
    pub index: usize,
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<UpgradeOffer>()
        .add_message::<ChooseUpgrade>()
        .add_systems(
            FixedUpdate,
            open_level_up_offer.in_set(SimSet::Cleanup),
        )
        .add_systems(
            Update,
            (pick_from_keyboard, apply_chosen_upgrade)
                .chain()
                .run_if(in_state(GameState::LevelUp)),
        );
}

/// Digits 1-3 pick the matching offer entry.
fn pick_from_keyboard(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut out: MessageWriter<ChooseUpgrade>,
) {
    let Some(keys) = keys else {
        return;
    };
    for (index, key) in [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3]
        .into_iter()
        .enumerate()
    {
        if keys.just_pressed(key) {
            out.write(ChooseUpgrade { index });
        }
    }
}

pub fn draw_offer(player: &Player, max_drones: usize, rng: &mut SimRng) -> Vec<UpgradeKind> {
    let eligible: Vec<UpgradeKind> = UpgradeKind::ALL
        .into_iter()
        .filter(|u| u.is_eligible(player, max_drones))
        .collect();
    eligible
        .choose_multiple(&mut rng.0, OFFER_SIZE)
        .copied()
        .collect()
}

pub(crate) fn open_level_up_offer(
    tunables: Res<Tunables>,
    mut rng: ResMut<SimRng>,
    mut offer: ResMut<UpgradeOffer>,
    mut next: ResMut<NextState<GameState>>,
    mut cues: MessageWriter<FeedbackCue>,
    player: Single<&Player>,
) {
    if player.pending_level_ups == 0 || !player.is_alive() || !offer.choices.is_empty() {
        return;
    }
    offer.choices = draw_offer(&player, tunables.max_drones, &mut rng);
    debug!(choices = ?offer.choices, "upgrade offer");
    cues.write(FeedbackCue::Sound(SoundCue::LevelUp));
    next.set(GameState::LevelUp);
}

pub(crate) fn apply_chosen_upgrade(
    tunables: Res<Tunables>,
    mut rng: ResMut<SimRng>,
    mut offer: ResMut<UpgradeOffer>,
    mut picks: MessageReader<ChooseUpgrade>,
    mut next: ResMut<NextState<GameState>>,
    mut events: MessageWriter<GameEvent>,
    mut drones: MessageWriter<SpawnDrone>,
    player: Single<(Entity, &mut Player)>,
) {
    let (player_e, mut player) = player.into_inner();

    for pick in picks.read() {
        let Some(&upgrade) = offer.choices.get(pick.index) else {
            debug!(index = pick.index, "ignoring pick outside the offer");
            continue;
        };
        apply_upgrade(&mut player, upgrade, &mut events);
        if upgrade == UpgradeKind::SupportDrone {
            drones.write(SpawnDrone { owner: player_e });
        }
        info!(?upgrade, "upgrade chosen");

        player.pending_level_ups = player.pending_level_ups.saturating_sub(1);
        if player.pending_level_ups > 0 {
            offer.choices = draw_offer(&player, tunables.max_drones, &mut rng);
        } else {
            offer.choices.clear();
            next.set(GameState::Playing);
        }
    }
}

pub fn apply_upgrade(
    player: &mut Player,
    upgrade: UpgradeKind,
    events: &mut MessageWriter<GameEvent>,
) {
    match upgrade {
        UpgradeKind::RapidFire => player.stats.fire_rate_mult *= 0.85,
        UpgradeKind::SpeedBoots => player.stats.speed_mult *= 1.1,
        UpgradeKind::TitanHealth => {
            player.max_hp += 20.0;
            player.heal(20.0);
            events.write(player.hp_event());
        }
        UpgradeKind::HeavyRounds => player.stats.damage_mult *= 1.25,
        UpgradeKind::Scholar => player.stats.xp_gain_mult *= 1.2,
        UpgradeKind::Vampirism => player.stats.vampirism = true,
        // The drone entity itself is spawned by the drones plugin.
        UpgradeKind::SupportDrone => {}
        UpgradeKind::Weapon(id) => {
            player.weapon = Weapon::new(id);
            events.write(GameEvent::WeaponEquipped(id));
        }
        UpgradeKind::Ability(id) => player.ability = Some(Ability::new(id)),
    }
}
