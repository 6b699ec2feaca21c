//! The gun configuration model.
//!
//! A [`Gun`] is the typed form of one `guns/<path>.json` definition. It is
//! deserialized from data files with serde (camelCase keys, missing keys
//! take the defaults below), checked by [`crate::validation::validate`]
//! through its [`Schema`] tables, and converted to and from a tag
//! [`Compound`] for replication. [`Gun::to_tag`] and [`Gun::from_tag`] are
//! the only binary representation of a gun.

use serde::{Deserialize, Serialize};

use crate::id::Identifier;
use crate::tag::{Compound, TagError};
use crate::validation::{Field, FieldValue, Schema};

/// Projectile item used by the fallback gun unless configured otherwise.
pub fn default_fallback_ammo() -> Identifier {
    Identifier::from_parts_unchecked("cgm", "basic_ammo")
}

// ===========================================================================
// Model
// ===========================================================================

/// Tunable parameters of one gun item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gun {
    pub general: General,
    pub projectile: Projectile,
    pub sounds: Sounds,
    pub display: Display,
    pub modules: Modules,
}

/// How the gun is held. Not validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GripType {
    #[default]
    OneHanded,
    TwoHanded,
}

impl GripType {
    fn as_str(self) -> &'static str {
        match self {
            GripType::OneHanded => "one_handed",
            GripType::TwoHanded => "two_handed",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "one_handed" => Some(GripType::OneHanded),
            "two_handed" => Some(GripType::TwoHanded),
            _ => None,
        }
    }
}

/// Firing behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct General {
    pub auto: bool,
    /// Ticks between shots.
    pub rate: u32,
    pub grip_type: GripType,
    pub max_ammo: u32,
    pub reload_amount: u32,
    pub recoil_angle: f32,
    pub recoil_kick: f32,
    pub recoil_duration_offset: f32,
    pub recoil_ads_reduction: f32,
    pub projectile_amount: u32,
    pub always_spread: bool,
    pub spread: f32,
}

impl Default for General {
    fn default() -> Self {
        Self {
            auto: false,
            rate: 0,
            grip_type: GripType::OneHanded,
            max_ammo: 0,
            reload_amount: 1,
            recoil_angle: 0.0,
            recoil_kick: 0.0,
            recoil_duration_offset: 0.0,
            recoil_ads_reduction: 0.2,
            projectile_amount: 1,
            always_spread: false,
            spread: 0.0,
        }
    }
}

/// What the gun fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Projectile {
    /// Ammo item consumed per shot. Required.
    pub item: Option<Identifier>,
    pub visible: bool,
    pub damage: f32,
    pub size: f32,
    pub speed: f64,
    /// Lifetime in ticks.
    pub life: u32,
    pub gravity: bool,
    pub damage_reduce_over_life: bool,
    pub trail_color: u32,
    pub trail_length_multiplier: f64,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            item: None,
            visible: false,
            damage: 0.0,
            size: 0.0,
            speed: 0.0,
            life: 0,
            gravity: false,
            damage_reduce_over_life: false,
            trail_color: 0xFF_D289,
            trail_length_multiplier: 1.0,
        }
    }
}

/// Sound events, each optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cock: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silenced_fire: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enchanted_fire: Option<Identifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Display {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
}

/// Offset of a rendered part relative to the gun model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Positioned {
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FlashDoc", into = "FlashDoc")]
pub struct Flash {
    pub position: Positioned,
    pub size: f64,
}

impl Default for Flash {
    fn default() -> Self {
        Self {
            position: Positioned::default(),
            size: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<Zoom>,
    pub attachments: Attachments,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ZoomDoc", into = "ZoomDoc")]
pub struct Zoom {
    pub position: Positioned,
    pub fov_modifier: f32,
}

/// Attachment mount points, each optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Attachments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScaledPositioned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barrel: Option<ScaledPositioned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<ScaledPositioned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub under_barrel: Option<ScaledPositioned>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScaledDoc", into = "ScaledDoc")]
pub struct ScaledPositioned {
    pub position: Positioned,
    pub scale: f64,
}

impl Default for ScaledPositioned {
    fn default() -> Self {
        Self {
            position: Positioned::default(),
            scale: 1.0,
        }
    }
}

// Document forms of the positioned parts: offsets sit at the same level as
// the part's own keys. Not `serde(flatten)`, which ron cannot read.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FlashDoc {
    x_offset: f64,
    y_offset: f64,
    z_offset: f64,
    size: f64,
}

impl Default for FlashDoc {
    fn default() -> Self {
        Flash::default().into()
    }
}

impl From<FlashDoc> for Flash {
    fn from(d: FlashDoc) -> Self {
        Self {
            position: Positioned::at(d.x_offset, d.y_offset, d.z_offset),
            size: d.size,
        }
    }
}

impl From<Flash> for FlashDoc {
    fn from(f: Flash) -> Self {
        let Positioned {
            x_offset,
            y_offset,
            z_offset,
        } = f.position;
        Self {
            x_offset,
            y_offset,
            z_offset,
            size: f.size,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ZoomDoc {
    x_offset: f64,
    y_offset: f64,
    z_offset: f64,
    fov_modifier: f32,
}

impl From<ZoomDoc> for Zoom {
    fn from(d: ZoomDoc) -> Self {
        Self {
            position: Positioned::at(d.x_offset, d.y_offset, d.z_offset),
            fov_modifier: d.fov_modifier,
        }
    }
}

impl From<Zoom> for ZoomDoc {
    fn from(z: Zoom) -> Self {
        let Positioned {
            x_offset,
            y_offset,
            z_offset,
        } = z.position;
        Self {
            x_offset,
            y_offset,
            z_offset,
            fov_modifier: z.fov_modifier,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScaledDoc {
    x_offset: f64,
    y_offset: f64,
    z_offset: f64,
    scale: f64,
}

impl Default for ScaledDoc {
    fn default() -> Self {
        ScaledPositioned::default().into()
    }
}

impl From<ScaledDoc> for ScaledPositioned {
    fn from(d: ScaledDoc) -> Self {
        Self {
            position: Positioned::at(d.x_offset, d.y_offset, d.z_offset),
            scale: d.scale,
        }
    }
}

impl From<ScaledPositioned> for ScaledDoc {
    fn from(s: ScaledPositioned) -> Self {
        let Positioned {
            x_offset,
            y_offset,
            z_offset,
        } = s.position;
        Self {
            x_offset,
            y_offset,
            z_offset,
            scale: s.scale,
        }
    }
}

impl Positioned {
    pub fn at(x_offset: f64, y_offset: f64, z_offset: f64) -> Self {
        Self {
            x_offset,
            y_offset,
            z_offset,
        }
    }
}

impl Gun {
    /// The gun bound to items whose definition failed to load.
    pub fn fallback(ammo: Identifier) -> Self {
        let mut gun = Gun::default();
        gun.projectile.item = Some(ammo);
        gun
    }
}

// ===========================================================================
// Schema tables
// ===========================================================================

impl Schema for Gun {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::required("general", FieldValue::Composite(&self.general)),
            Field::required("projectile", FieldValue::Composite(&self.projectile)),
            Field::required("sounds", FieldValue::Composite(&self.sounds)),
            Field::required("display", FieldValue::Composite(&self.display)),
            Field::required("modules", FieldValue::Composite(&self.modules)),
        ]
    }
}

impl Schema for General {
    fn fields(&self) -> Vec<Field<'_>> {
        use FieldValue::Leaf;
        vec![
            Field::required("auto", Leaf),
            Field::required("rate", Leaf),
            Field::ignored("gripType", Leaf),
            Field::required("maxAmmo", Leaf),
            Field::optional("reloadAmount", Leaf),
            Field::optional("recoilAngle", Leaf),
            Field::optional("recoilKick", Leaf),
            Field::optional("recoilDurationOffset", Leaf),
            Field::optional("recoilAdsReduction", Leaf),
            Field::optional("projectileAmount", Leaf),
            Field::optional("alwaysSpread", Leaf),
            Field::optional("spread", Leaf),
        ]
    }
}

impl Schema for Projectile {
    fn fields(&self) -> Vec<Field<'_>> {
        use FieldValue::Leaf;
        vec![
            Field::required("item", FieldValue::leaf_opt(&self.item)),
            Field::optional("visible", Leaf),
            Field::required("damage", Leaf),
            Field::required("size", Leaf),
            Field::required("speed", Leaf),
            Field::required("life", Leaf),
            Field::optional("gravity", Leaf),
            Field::optional("damageReduceOverLife", Leaf),
            Field::optional("trailColor", Leaf),
            Field::optional("trailLengthMultiplier", Leaf),
        ]
    }
}

impl Schema for Sounds {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::optional("fire", FieldValue::leaf_opt(&self.fire)),
            Field::optional("reload", FieldValue::leaf_opt(&self.reload)),
            Field::optional("cock", FieldValue::leaf_opt(&self.cock)),
            Field::optional("silencedFire", FieldValue::leaf_opt(&self.silenced_fire)),
            Field::optional("enchantedFire", FieldValue::leaf_opt(&self.enchanted_fire)),
        ]
    }
}

impl Schema for Display {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::optional(
            "flash",
            FieldValue::composite_opt(self.flash.as_ref()),
        )]
    }
}

impl Schema for Positioned {
    fn fields(&self) -> Vec<Field<'_>> {
        use FieldValue::Leaf;
        vec![
            Field::optional("xOffset", Leaf),
            Field::optional("yOffset", Leaf),
            Field::optional("zOffset", Leaf),
        ]
    }
}

impl Schema for Flash {
    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = self.position.fields();
        fields.push(Field::optional("size", FieldValue::Leaf));
        fields
    }
}

impl Schema for Modules {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::optional("zoom", FieldValue::composite_opt(self.zoom.as_ref())),
            Field::required("attachments", FieldValue::Composite(&self.attachments)),
        ]
    }
}

impl Schema for Zoom {
    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = self.position.fields();
        fields.push(Field::optional("fovModifier", FieldValue::Leaf));
        fields
    }
}

impl Schema for Attachments {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::optional("scope", FieldValue::composite_opt(self.scope.as_ref())),
            Field::optional("barrel", FieldValue::composite_opt(self.barrel.as_ref())),
            Field::optional("stock", FieldValue::composite_opt(self.stock.as_ref())),
            Field::optional(
                "underBarrel",
                FieldValue::composite_opt(self.under_barrel.as_ref()),
            ),
        ]
    }
}

impl Schema for ScaledPositioned {
    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = self.position.fields();
        fields.push(Field::optional("scale", FieldValue::Leaf));
        fields
    }
}

// ===========================================================================
// Tag conversion
// ===========================================================================

fn read_id(tag: &Compound, key: &str) -> Result<Option<Identifier>, TagError> {
    tag.get_str(key)
        .map(|s| {
            Identifier::parse(s).map_err(|source| TagError::InvalidIdentifier {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
}

fn put_id(tag: &mut Compound, key: &str, id: &Option<Identifier>) {
    if let Some(id) = id {
        tag.insert(key, id.to_string());
    }
}

fn read_u32(tag: &Compound, key: &str) -> Option<u32> {
    // Stored as the bit pattern of an i32.
    tag.get_int(key).map(|v| v as u32)
}

impl Gun {
    /// Serialize into a compound tag. Absent optional values are omitted.
    pub fn to_tag(&self) -> Compound {
        let mut root = Compound::new();
        root.insert("general", self.general.to_tag());
        root.insert("projectile", self.projectile.to_tag());
        root.insert("sounds", self.sounds.to_tag());
        root.insert("display", self.display.to_tag());
        root.insert("modules", self.modules.to_tag());
        root
    }

    /// Deserialize from a compound tag. Keys that are absent or hold the
    /// wrong kind of tag keep their default values.
    pub fn from_tag(tag: &Compound) -> Result<Self, TagError> {
        let mut gun = Gun::default();
        if let Some(t) = tag.get_compound("general") {
            gun.general = General::from_tag(t);
        }
        if let Some(t) = tag.get_compound("projectile") {
            gun.projectile = Projectile::from_tag(t)?;
        }
        if let Some(t) = tag.get_compound("sounds") {
            gun.sounds = Sounds::from_tag(t)?;
        }
        if let Some(t) = tag.get_compound("display") {
            gun.display = Display::from_tag(t);
        }
        if let Some(t) = tag.get_compound("modules") {
            gun.modules = Modules::from_tag(t);
        }
        Ok(gun)
    }
}

impl General {
    fn to_tag(&self) -> Compound {
        let mut tag = Compound::new();
        tag.insert("auto", self.auto);
        tag.insert("rate", self.rate as i32);
        tag.insert("gripType", self.grip_type.as_str());
        tag.insert("maxAmmo", self.max_ammo as i32);
        tag.insert("reloadAmount", self.reload_amount as i32);
        tag.insert("recoilAngle", self.recoil_angle);
        tag.insert("recoilKick", self.recoil_kick);
        tag.insert("recoilDurationOffset", self.recoil_duration_offset);
        tag.insert("recoilAdsReduction", self.recoil_ads_reduction);
        tag.insert("projectileAmount", self.projectile_amount as i32);
        tag.insert("alwaysSpread", self.always_spread);
        tag.insert("spread", self.spread);
        tag
    }

    fn from_tag(tag: &Compound) -> Self {
        let d = General::default();
        Self {
            auto: tag.get_bool("auto").unwrap_or(d.auto),
            rate: read_u32(tag, "rate").unwrap_or(d.rate),
            grip_type: tag
                .get_str("gripType")
                .and_then(GripType::from_name)
                .unwrap_or(d.grip_type),
            max_ammo: read_u32(tag, "maxAmmo").unwrap_or(d.max_ammo),
            reload_amount: read_u32(tag, "reloadAmount").unwrap_or(d.reload_amount),
            recoil_angle: tag.get_float("recoilAngle").unwrap_or(d.recoil_angle),
            recoil_kick: tag.get_float("recoilKick").unwrap_or(d.recoil_kick),
            recoil_duration_offset: tag
                .get_float("recoilDurationOffset")
                .unwrap_or(d.recoil_duration_offset),
            recoil_ads_reduction: tag
                .get_float("recoilAdsReduction")
                .unwrap_or(d.recoil_ads_reduction),
            projectile_amount: read_u32(tag, "projectileAmount").unwrap_or(d.projectile_amount),
            always_spread: tag.get_bool("alwaysSpread").unwrap_or(d.always_spread),
            spread: tag.get_float("spread").unwrap_or(d.spread),
        }
    }
}

impl Projectile {
    fn to_tag(&self) -> Compound {
        let mut tag = Compound::new();
        put_id(&mut tag, "item", &self.item);
        tag.insert("visible", self.visible);
        tag.insert("damage", self.damage);
        tag.insert("size", self.size);
        tag.insert("speed", self.speed);
        tag.insert("life", self.life as i32);
        tag.insert("gravity", self.gravity);
        tag.insert("damageReduceOverLife", self.damage_reduce_over_life);
        tag.insert("trailColor", self.trail_color as i32);
        tag.insert("trailLengthMultiplier", self.trail_length_multiplier);
        tag
    }

    fn from_tag(tag: &Compound) -> Result<Self, TagError> {
        let d = Projectile::default();
        Ok(Self {
            item: read_id(tag, "item")?,
            visible: tag.get_bool("visible").unwrap_or(d.visible),
            damage: tag.get_float("damage").unwrap_or(d.damage),
            size: tag.get_float("size").unwrap_or(d.size),
            speed: tag.get_double("speed").unwrap_or(d.speed),
            life: read_u32(tag, "life").unwrap_or(d.life),
            gravity: tag.get_bool("gravity").unwrap_or(d.gravity),
            damage_reduce_over_life: tag
                .get_bool("damageReduceOverLife")
                .unwrap_or(d.damage_reduce_over_life),
            trail_color: read_u32(tag, "trailColor").unwrap_or(d.trail_color),
            trail_length_multiplier: tag
                .get_double("trailLengthMultiplier")
                .unwrap_or(d.trail_length_multiplier),
        })
    }
}

impl Sounds {
    fn to_tag(&self) -> Compound {
        let mut tag = Compound::new();
        put_id(&mut tag, "fire", &self.fire);
        put_id(&mut tag, "reload", &self.reload);
        put_id(&mut tag, "cock", &self.cock);
        put_id(&mut tag, "silencedFire", &self.silenced_fire);
        put_id(&mut tag, "enchantedFire", &self.enchanted_fire);
        tag
    }

    fn from_tag(tag: &Compound) -> Result<Self, TagError> {
        Ok(Self {
            fire: read_id(tag, "fire")?,
            reload: read_id(tag, "reload")?,
            cock: read_id(tag, "cock")?,
            silenced_fire: read_id(tag, "silencedFire")?,
            enchanted_fire: read_id(tag, "enchantedFire")?,
        })
    }
}

impl Display {
    fn to_tag(&self) -> Compound {
        let mut tag = Compound::new();
        if let Some(flash) = &self.flash {
            let mut t = flash.position.to_tag();
            t.insert("size", flash.size);
            tag.insert("flash", t);
        }
        tag
    }

    fn from_tag(tag: &Compound) -> Self {
        let flash = tag.get_compound("flash").map(|t| {
            let d = Flash::default();
            Flash {
                position: Positioned::from_tag(t),
                size: t.get_double("size").unwrap_or(d.size),
            }
        });
        Self { flash }
    }
}

impl Positioned {
    fn to_tag(&self) -> Compound {
        let mut tag = Compound::new();
        tag.insert("xOffset", self.x_offset);
        tag.insert("yOffset", self.y_offset);
        tag.insert("zOffset", self.z_offset);
        tag
    }

    fn from_tag(tag: &Compound) -> Self {
        Self {
            x_offset: tag.get_double("xOffset").unwrap_or_default(),
            y_offset: tag.get_double("yOffset").unwrap_or_default(),
            z_offset: tag.get_double("zOffset").unwrap_or_default(),
        }
    }
}

impl ScaledPositioned {
    fn to_tag(&self) -> Compound {
        let mut tag = self.position.to_tag();
        tag.insert("scale", self.scale);
        tag
    }

    fn from_tag(tag: &Compound) -> Self {
        Self {
            position: Positioned::from_tag(tag),
            scale: tag.get_double("scale").unwrap_or(1.0),
        }
    }
}

impl Modules {
    fn to_tag(&self) -> Compound {
        let mut tag = Compound::new();
        if let Some(zoom) = &self.zoom {
            let mut t = zoom.position.to_tag();
            t.insert("fovModifier", zoom.fov_modifier);
            tag.insert("zoom", t);
        }
        let a = &self.attachments;
        let mut attachments = Compound::new();
        let slots = [
            ("scope", &a.scope),
            ("barrel", &a.barrel),
            ("stock", &a.stock),
            ("underBarrel", &a.under_barrel),
        ];
        for (key, slot) in slots {
            if let Some(s) = slot {
                attachments.insert(key, s.to_tag());
            }
        }
        tag.insert("attachments", attachments);
        tag
    }

    fn from_tag(tag: &Compound) -> Self {
        let zoom = tag.get_compound("zoom").map(|t| Zoom {
            position: Positioned::from_tag(t),
            fov_modifier: t.get_float("fovModifier").unwrap_or_default(),
        });
        let attachments = tag
            .get_compound("attachments")
            .map(|t| {
                let slot = |key: &str| t.get_compound(key).map(ScaledPositioned::from_tag);
                Attachments {
                    scope: slot("scope"),
                    barrel: slot("barrel"),
                    stock: slot("stock"),
                    under_barrel: slot("underBarrel"),
                }
            })
            .unwrap_or_default();
        Self { zoom, attachments }
    }
}
