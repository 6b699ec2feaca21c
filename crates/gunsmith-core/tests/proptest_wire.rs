//! Property-based tests for the gun replication codec.
//!
//! Generates arbitrary guns and snapshots, then checks that the wire frame
//! decodes to an equal snapshot and that damaged frames never decode.

use std::sync::Arc;

use gunsmith_core::gun::*;
use gunsmith_core::id::Identifier;
use gunsmith_core::snapshot::Snapshot;
use gunsmith_core::wire::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_identifier() -> impl Strategy<Value = Identifier> {
    ("[a-z][a-z0-9_]{0,7}", "[a-z][a-z0-9_./]{0,15}")
        .prop_map(|(ns, path)| Identifier::new(&ns, &path).unwrap())
}

fn arb_f32() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn arb_f64() -> impl Strategy<Value = f64> {
    -1.0e9f64..1.0e9f64
}

fn arb_positioned() -> impl Strategy<Value = Positioned> {
    (arb_f64(), arb_f64(), arb_f64()).prop_map(|(x_offset, y_offset, z_offset)| Positioned {
        x_offset,
        y_offset,
        z_offset,
    })
}

fn arb_scaled() -> impl Strategy<Value = ScaledPositioned> {
    (arb_positioned(), arb_f64()).prop_map(|(position, scale)| ScaledPositioned { position, scale })
}

fn arb_general() -> impl Strategy<Value = General> {
    (
        (any::<bool>(), any::<u32>(), any::<bool>(), any::<u32>(), any::<u32>()),
        (arb_f32(), arb_f32(), arb_f32(), arb_f32()),
        (any::<u32>(), any::<bool>(), arb_f32()),
    )
        .prop_map(|(a, b, c)| General {
            auto: a.0,
            rate: a.1,
            grip_type: if a.2 {
                GripType::TwoHanded
            } else {
                GripType::OneHanded
            },
            max_ammo: a.3,
            reload_amount: a.4,
            recoil_angle: b.0,
            recoil_kick: b.1,
            recoil_duration_offset: b.2,
            recoil_ads_reduction: b.3,
            projectile_amount: c.0,
            always_spread: c.1,
            spread: c.2,
        })
}

fn arb_projectile() -> impl Strategy<Value = Projectile> {
    (
        (proptest::option::of(arb_identifier()), any::<bool>(), arb_f32(), arb_f32()),
        (arb_f64(), any::<u32>(), any::<bool>(), any::<bool>()),
        (any::<u32>(), arb_f64()),
    )
        .prop_map(|(a, b, c)| Projectile {
            item: a.0,
            visible: a.1,
            damage: a.2,
            size: a.3,
            speed: b.0,
            life: b.1,
            gravity: b.2,
            damage_reduce_over_life: b.3,
            trail_color: c.0,
            trail_length_multiplier: c.1,
        })
}

fn arb_sounds() -> impl Strategy<Value = Sounds> {
    proptest::collection::vec(proptest::option::of(arb_identifier()), 5).prop_map(|mut v| {
        Sounds {
            enchanted_fire: v.pop().flatten(),
            silenced_fire: v.pop().flatten(),
            cock: v.pop().flatten(),
            reload: v.pop().flatten(),
            fire: v.pop().flatten(),
        }
    })
}

fn arb_gun() -> impl Strategy<Value = Gun> {
    let flash = proptest::option::of((arb_positioned(), arb_f64()))
        .prop_map(|f| f.map(|(position, size)| Flash { position, size }));
    let zoom = proptest::option::of((arb_positioned(), arb_f32()))
        .prop_map(|z| z.map(|(position, fov_modifier)| Zoom { position, fov_modifier }));
    let attachments = (
        proptest::option::of(arb_scaled()),
        proptest::option::of(arb_scaled()),
        proptest::option::of(arb_scaled()),
        proptest::option::of(arb_scaled()),
    )
        .prop_map(|(scope, barrel, stock, under_barrel)| Attachments {
            scope,
            barrel,
            stock,
            under_barrel,
        });
    (arb_general(), arb_projectile(), arb_sounds(), flash, zoom, attachments).prop_map(
        |(general, projectile, sounds, flash, zoom, attachments)| Gun {
            general,
            projectile,
            sounds,
            display: Display { flash },
            modules: Modules { zoom, attachments },
        },
    )
}

fn arb_snapshot(max: usize) -> impl Strategy<Value = Snapshot> {
    proptest::collection::btree_map(arb_identifier(), arb_gun(), 1..=max).prop_map(|guns| {
        guns.into_iter()
            .map(|(id, gun)| (id, Arc::new(gun)))
            .collect()
    })
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// decode(encode(s)) == s for any non-empty snapshot.
    #[test]
    fn snapshot_roundtrip(snapshot in arb_snapshot(6)) {
        let mut buf = Vec::new();
        write_registered_guns(&mut buf, &snapshot).unwrap();
        let mut slice = buf.as_slice();
        let decoded = read_registered_guns(&mut slice).unwrap();
        prop_assert_eq!(decoded, snapshot);
        prop_assert!(slice.is_empty());
    }

    /// Gun -> tag -> Gun is lossless.
    #[test]
    fn gun_tag_roundtrip(gun in arb_gun()) {
        let back = Gun::from_tag(&gun.to_tag()).unwrap();
        prop_assert_eq!(back, gun);
    }

    /// Any strict prefix of a valid frame fails to decode.
    #[test]
    fn truncated_frames_fail(snapshot in arb_snapshot(3), cut in any::<prop::sample::Index>()) {
        let mut buf = Vec::new();
        write_registered_guns(&mut buf, &snapshot).unwrap();
        let cut = cut.index(buf.len());
        prop_assert!(read_registered_guns(&mut &buf[..cut]).is_err());
    }

    #[test]
    fn var_int_roundtrip(value in any::<i32>()) {
        let mut buf = Vec::new();
        write_var_int(&mut buf, value);
        prop_assert!(buf.len() <= 5);
        prop_assert_eq!(read_var_int(&mut buf.as_slice()).unwrap(), value);
    }
}
