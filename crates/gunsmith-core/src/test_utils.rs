//! Shared fixtures for unit tests, integration tests, and other crates'
//! tests (via the `test-utils` feature).

use std::sync::Arc;

use crate::gun::*;
use crate::id::Identifier;
use crate::snapshot::Snapshot;

/// Parse an identifier, panicking on invalid input.
pub fn id(s: &str) -> Identifier {
    Identifier::parse(s).unwrap()
}

/// A gun with every field set away from its default.
pub fn sample_gun() -> Gun {
    Gun {
        general: General {
            auto: true,
            rate: 4,
            grip_type: GripType::TwoHanded,
            max_ammo: 30,
            reload_amount: 2,
            recoil_angle: 2.5,
            recoil_kick: 0.33,
            recoil_duration_offset: 0.1,
            recoil_ads_reduction: 0.4,
            projectile_amount: 1,
            always_spread: true,
            spread: 3.0,
        },
        projectile: Projectile {
            item: Some(id("cgm:basic_bullet")),
            visible: true,
            damage: 6.5,
            size: 0.1,
            speed: 16.0,
            life: 20,
            gravity: true,
            damage_reduce_over_life: true,
            trail_color: 0x00FF_AA11,
            trail_length_multiplier: 1.5,
        },
        sounds: Sounds {
            fire: Some(id("cgm:item.rifle.fire")),
            reload: Some(id("cgm:item.rifle.reload")),
            cock: None,
            silenced_fire: Some(id("cgm:item.rifle.silenced_fire")),
            enchanted_fire: None,
        },
        display: Display {
            flash: Some(Flash {
                position: Positioned {
                    x_offset: 0.0,
                    y_offset: 1.25,
                    z_offset: -4.5,
                },
                size: 0.75,
            }),
        },
        modules: Modules {
            zoom: Some(Zoom {
                position: Positioned {
                    x_offset: 0.0,
                    y_offset: 4.5,
                    z_offset: 2.0,
                },
                fov_modifier: 0.6,
            }),
            attachments: Attachments {
                scope: Some(ScaledPositioned {
                    position: Positioned {
                        x_offset: 0.0,
                        y_offset: 5.0,
                        z_offset: 1.0,
                    },
                    scale: 1.0,
                }),
                barrel: None,
                stock: None,
                under_barrel: Some(ScaledPositioned {
                    position: Positioned {
                        x_offset: 0.0,
                        y_offset: 2.0,
                        z_offset: -3.0,
                    },
                    scale: 0.8,
                }),
            },
        },
    }
}

/// A snapshot mapping each identifier to its own copy of [`sample_gun`].
pub fn snapshot_of(ids: &[&str]) -> Snapshot {
    ids.iter()
        .map(|s| (id(s), Arc::new(sample_gun())))
        .collect()
}

/// A minimal valid gun definition as JSON.
pub fn gun_json(ammo: &str, damage: f32) -> String {
    format!(
        r#"{{
    "general": {{"auto": false, "rate": 8, "maxAmmo": 12}},
    "projectile": {{"item": "{ammo}", "damage": {damage:?}, "size": 0.05, "speed": 10.0, "life": 15}}
}}"#
    )
}
