//! Authoritative scene store.
//!
//! [`SceneModel`] owns puppets, objects, the sorted keyframe store and scene
//! settings. Every mutation validates first and returns an
//! [`InvariantViolation`] without touching state when it would break one of
//! the scene invariants:
//! - puppet and object names are unique;
//! - every attachment names an existing puppet and member;
//! - `start_frame <= end_frame`, `fps > 0`, scene size > 0;
//! - scales are finite and non-negative.
//!
//! Pose math lives in [`crate::engine`]; this module only decides what gets
//! written where.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::{Attachment, Keyframe, SceneObject};
use crate::engine;
use crate::error::InvariantViolation;
use crate::geometry::{Transform2, Vec2};
use crate::hierarchy::Puppet;
use crate::naming::unique_name;
use crate::outputs::{AttachmentChange, ResolvedPose};

/// Offset applied to duplicated objects, in scene units.
pub const DUPLICATE_OFFSET: Vec2 = Vec2::new(10.0, 10.0);

fn default_end_frame() -> u32 {
    100
}
fn default_fps() -> u32 {
    24
}
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}

/// Playback range, frame rate, canvas size and background.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSettings {
    #[serde(default)]
    pub start_frame: u32,
    #[serde(default = "default_end_frame")]
    pub end_frame: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_width")]
    pub scene_width: u32,
    #[serde(default = "default_height")]
    pub scene_height: u32,
    #[serde(default)]
    pub background_path: Option<String>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            start_frame: 0,
            end_frame: default_end_frame(),
            fps: default_fps(),
            scene_width: default_width(),
            scene_height: default_height(),
            background_path: None,
        }
    }
}

impl SceneSettings {
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.start_frame > self.end_frame {
            return Err(InvariantViolation::InvalidBounds {
                start: self.start_frame,
                end: self.end_frame,
            });
        }
        if self.fps == 0 {
            return Err(InvariantViolation::InvalidFps);
        }
        if self.scene_width == 0 || self.scene_height == 0 {
            return Err(InvariantViolation::InvalidSceneSize {
                width: self.scene_width,
                height: self.scene_height,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn frame_range(&self) -> RangeInclusive<u32> {
        self.start_frame..=self.end_frame
    }
}

fn one() -> f64 {
    1.0
}

/// Where and how a puppet sits in the scene.
///
/// `position` and `rotation` are the neutral root offset and root rotation,
/// used whenever no keyframe records them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuppetPlacement {
    #[serde(default)]
    pub path: String,
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub z_offset: i32,
}

impl Default for PuppetPlacement {
    fn default() -> Self {
        Self {
            path: String::new(),
            scale: 1.0,
            position: Vec2::ZERO,
            rotation: 0.0,
            z_offset: 0,
        }
    }
}

impl PuppetPlacement {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_z_offset(mut self, z_offset: i32) -> Self {
        self.z_offset = z_offset;
        self
    }
}

/// A puppet skeleton together with its placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PuppetEntry {
    pub puppet: Puppet,
    pub placement: PuppetPlacement,
}

#[derive(Clone, Debug, Default)]
pub struct SceneModel {
    pub(crate) settings: SceneSettings,
    pub(crate) puppets: IndexMap<String, PuppetEntry>,
    pub(crate) objects: IndexMap<String, SceneObject>,
    pub(crate) keyframes: BTreeMap<u32, Keyframe>,
    pub(crate) current_frame: u32,
}

fn check_scale(scale: f64) -> Result<(), InvariantViolation> {
    if scale.is_finite() && scale >= 0.0 {
        Ok(())
    } else {
        Err(InvariantViolation::InvalidScale { scale })
    }
}

fn check_finite(what: &str, value: f64) -> Result<(), InvariantViolation> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvariantViolation::NonFinite {
            what: what.to_string(),
        })
    }
}

fn check_position(what: &str, position: Vec2) -> Result<(), InvariantViolation> {
    check_finite(&format!("{what} x"), position.x)?;
    check_finite(&format!("{what} y"), position.y)
}

/// Position and rotation finite, scale finite and non-negative.
fn check_transform(what: &str, t: &Transform2) -> Result<(), InvariantViolation> {
    check_position(what, t.position)?;
    check_finite(&format!("{what} rotation"), t.rotation)?;
    check_scale(t.scale)
}

fn check_placement(p: &PuppetPlacement) -> Result<(), InvariantViolation> {
    check_position("placement", p.position)?;
    check_finite("placement rotation", p.rotation)?;
    check_scale(p.scale)
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SceneSettings) -> Result<Self, InvariantViolation> {
        settings.validate()?;
        Ok(Self {
            current_frame: settings.start_frame,
            settings,
            ..Default::default()
        })
    }

    // ---- queries ----

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn puppets(&self) -> &IndexMap<String, PuppetEntry> {
        &self.puppets
    }

    pub fn puppet(&self, name: &str) -> Option<&PuppetEntry> {
        self.puppets.get(name)
    }

    pub fn objects(&self) -> &IndexMap<String, SceneObject> {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    pub fn keyframes(&self) -> &BTreeMap<u32, Keyframe> {
        &self.keyframes
    }

    pub fn keyframe(&self, index: u32) -> Option<&Keyframe> {
        self.keyframes.get(&index)
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Pose at `frame`; see [`engine::resolve_pose`].
    pub fn resolve(&self, frame: u32) -> ResolvedPose {
        engine::resolve_pose(self, frame)
    }

    pub fn resolve_current(&self) -> ResolvedPose {
        engine::resolve_pose(self, self.current_frame)
    }

    // ---- validation helpers ----

    fn check_frame(&self, frame: u32) -> Result<(), InvariantViolation> {
        if self.settings.frame_range().contains(&frame) {
            Ok(())
        } else {
            Err(InvariantViolation::FrameOutOfRange {
                frame,
                start: self.settings.start_frame,
                end: self.settings.end_frame,
            })
        }
    }

    fn check_member(&self, puppet: &str, member: &str) -> Result<&PuppetEntry, InvariantViolation> {
        let entry = self
            .puppets
            .get(puppet)
            .ok_or_else(|| InvariantViolation::UnknownPuppet {
                name: puppet.to_string(),
            })?;
        if !entry.puppet.contains(member) {
            return Err(InvariantViolation::UnknownMember {
                puppet: puppet.to_string(),
                member: member.to_string(),
            });
        }
        Ok(entry)
    }

    pub(crate) fn check_attachment(&self, att: &Attachment) -> Result<(), InvariantViolation> {
        self.check_member(&att.puppet, &att.member).map(|_| ())
    }

    fn check_object(&self, name: &str) -> Result<&SceneObject, InvariantViolation> {
        self.objects
            .get(name)
            .ok_or_else(|| InvariantViolation::UnknownObject {
                name: name.to_string(),
            })
    }

    /// Validate a keyframe against the current puppets and playback range.
    pub fn validate_keyframe(&self, kf: &Keyframe) -> Result<(), InvariantViolation> {
        self.check_frame(kf.index)?;
        for (puppet, members) in &kf.puppets {
            for (member, state) in members {
                self.check_member(puppet, member)?;
                check_finite("member rotation", state.rotation)?;
                if let Some(position) = state.position {
                    check_position("member position", position)?;
                }
            }
        }
        for (name, state) in &kf.objects {
            self.check_object(name)?;
            check_transform("object", &state.transform())?;
            if let Some(att) = &state.attached_to {
                self.check_attachment(att)?;
            }
        }
        Ok(())
    }

    /// Keyframe at `frame`, captured from the resolved scene when absent.
    fn ensure_keyframe(&mut self, frame: u32) -> Result<&mut Keyframe, InvariantViolation> {
        self.check_frame(frame)?;
        let captured = (!self.keyframes.contains_key(&frame))
            .then(|| engine::capture(self, frame));
        Ok(match self.keyframes.entry(frame) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                debug!("captured keyframe {frame} for an edit");
                slot.insert(captured.unwrap_or_else(|| Keyframe::new(frame)))
            }
        })
    }

    // ---- settings ----

    pub fn set_playback_bounds(&mut self, start: u32, end: u32) -> Result<(), InvariantViolation> {
        if start > end {
            return Err(InvariantViolation::InvalidBounds { start, end });
        }
        self.settings.start_frame = start;
        self.settings.end_frame = end;
        self.current_frame = self.current_frame.clamp(start, end);
        Ok(())
    }

    pub fn set_fps(&mut self, fps: u32) -> Result<(), InvariantViolation> {
        if fps == 0 {
            return Err(InvariantViolation::InvalidFps);
        }
        self.settings.fps = fps;
        Ok(())
    }

    pub fn set_scene_size(&mut self, width: u32, height: u32) -> Result<(), InvariantViolation> {
        if width == 0 || height == 0 {
            return Err(InvariantViolation::InvalidSceneSize { width, height });
        }
        self.settings.scene_width = width;
        self.settings.scene_height = height;
        Ok(())
    }

    pub fn set_background(&mut self, path: Option<String>) {
        self.settings.background_path = path;
    }

    pub fn set_current_frame(&mut self, frame: u32) -> Result<(), InvariantViolation> {
        self.check_frame(frame)?;
        self.current_frame = frame;
        Ok(())
    }

    // ---- puppets ----

    pub fn add_puppet(
        &mut self,
        name: &str,
        puppet: Puppet,
        placement: PuppetPlacement,
    ) -> Result<(), InvariantViolation> {
        if self.puppets.contains_key(name) {
            return Err(InvariantViolation::DuplicatePuppet {
                name: name.to_string(),
            });
        }
        check_placement(&placement)?;
        debug!("adding puppet '{name}' with {} members", puppet.len());
        self.puppets
            .insert(name.to_string(), PuppetEntry { puppet, placement });
        Ok(())
    }

    /// Remove a puppet and its member states from every keyframe.
    ///
    /// Refused while any object, standalone or in a keyframe, is attached to it.
    pub fn remove_puppet(&mut self, name: &str) -> Result<PuppetEntry, InvariantViolation> {
        if !self.puppets.contains_key(name) {
            return Err(InvariantViolation::UnknownPuppet {
                name: name.to_string(),
            });
        }
        let mut users: BTreeSet<&str> = BTreeSet::new();
        for (obj_name, obj) in &self.objects {
            if obj.attached_to.as_ref().is_some_and(|a| a.puppet == name) {
                users.insert(obj_name);
            }
        }
        for kf in self.keyframes.values() {
            for (obj_name, att) in kf.attachments() {
                if att.puppet == name {
                    users.insert(obj_name);
                }
            }
        }
        if !users.is_empty() {
            return Err(InvariantViolation::PuppetInUse {
                puppet: name.to_string(),
                objects: users.into_iter().map(str::to_string).collect(),
            });
        }

        for kf in self.keyframes.values_mut() {
            kf.puppets.remove(name);
        }
        self.puppets
            .shift_remove(name)
            .ok_or_else(|| InvariantViolation::UnknownPuppet {
                name: name.to_string(),
            })
    }

    pub fn set_puppet_placement(
        &mut self,
        name: &str,
        placement: PuppetPlacement,
    ) -> Result<(), InvariantViolation> {
        check_placement(&placement)?;
        let entry = self
            .puppets
            .get_mut(name)
            .ok_or_else(|| InvariantViolation::UnknownPuppet {
                name: name.to_string(),
            })?;
        entry.placement = placement;
        Ok(())
    }

    pub fn unique_puppet_name(&self, base: &str) -> String {
        unique_name(base, self.puppets.keys().map(String::as_str))
    }

    /// Copy a puppet under a fresh `name_N`.
    ///
    /// The copy's neutral root sits where the source root currently is,
    /// shifted by [`DUPLICATE_OFFSET`], with the same root rotation, scale and
    /// z offset. Its state, including the source's active variants, is
    /// recorded in the keyframe at the current frame.
    pub fn duplicate_puppet(&mut self, name: &str) -> Result<String, InvariantViolation> {
        let src = self
            .puppets
            .get(name)
            .ok_or_else(|| InvariantViolation::UnknownPuppet {
                name: name.to_string(),
            })?;
        let frame = self.current_frame;
        self.check_frame(frame)?;

        let pose = self.resolve_current();
        let src_members = pose.members.get(name);
        let mut placement = src.placement.clone();
        if let Some(root) = src
            .puppet
            .root_members()
            .first()
            .and_then(|r| src_members.and_then(|ms| ms.get(&r.name)))
        {
            placement.position = root.local_offset;
            placement.rotation = root.local_rotation;
        }
        placement.position = placement.position.add(DUPLICATE_OFFSET);
        let variants: Vec<(String, String)> = src_members
            .map(|ms| {
                ms.iter()
                    .filter_map(|(m, mp)| mp.variant.clone().map(|v| (m.clone(), v)))
                    .collect()
            })
            .unwrap_or_default();
        let puppet = src.puppet.clone();

        let new_name = self.unique_puppet_name(name);
        self.add_puppet(&new_name, puppet, placement)?;
        let mut states = engine::capture(self, frame)
            .puppets
            .remove(&new_name)
            .unwrap_or_default();
        for (member, variant) in variants {
            states.entry(member).or_default().variant = Some(variant);
        }
        self.ensure_keyframe(frame)?
            .puppets
            .insert(new_name.clone(), states);
        debug!("duplicated puppet '{name}' as '{new_name}' at frame {frame}");
        Ok(new_name)
    }

    pub fn set_member_rotation(
        &mut self,
        puppet: &str,
        member: &str,
        frame: u32,
        degrees: f64,
    ) -> Result<(), InvariantViolation> {
        check_finite("member rotation", degrees)?;
        self.check_member(puppet, member)?;
        self.ensure_keyframe(frame)?
            .member_mut(puppet, member)
            .rotation = degrees;
        Ok(())
    }

    /// Move a puppet by its root member.
    pub fn set_root_position(
        &mut self,
        puppet: &str,
        member: &str,
        frame: u32,
        position: Vec2,
    ) -> Result<(), InvariantViolation> {
        check_position("root position", position)?;
        let entry = self.check_member(puppet, member)?;
        if entry.puppet.parent_of(member).is_some() {
            return Err(InvariantViolation::NotARoot {
                puppet: puppet.to_string(),
                member: member.to_string(),
            });
        }
        self.ensure_keyframe(frame)?
            .member_mut(puppet, member)
            .position = Some(position);
        Ok(())
    }

    pub fn set_member_variant(
        &mut self,
        puppet: &str,
        member: &str,
        frame: u32,
        variant: &str,
    ) -> Result<(), InvariantViolation> {
        let entry = self.check_member(puppet, member)?;
        let declared = entry
            .puppet
            .member(member)
            .map(|m| m.variants.as_slice())
            .unwrap_or_default();
        if !declared.is_empty() && !declared.iter().any(|v| v == variant) {
            return Err(InvariantViolation::UnknownVariant {
                puppet: puppet.to_string(),
                member: member.to_string(),
                variant: variant.to_string(),
            });
        }
        self.ensure_keyframe(frame)?
            .member_mut(puppet, member)
            .variant = Some(variant.to_string());
        Ok(())
    }

    // ---- objects ----

    pub fn add_object(&mut self, object: SceneObject) -> Result<(), InvariantViolation> {
        if self.objects.contains_key(&object.name) {
            return Err(InvariantViolation::DuplicateObject { name: object.name });
        }
        check_transform("object", &object.transform())?;
        if let Some(att) = &object.attached_to {
            self.check_attachment(att)?;
        }
        self.objects.insert(object.name.clone(), object);
        Ok(())
    }

    /// Remove an object and every keyframe entry that mentions it.
    pub fn remove_object(&mut self, name: &str) -> Result<SceneObject, InvariantViolation> {
        let obj = self
            .objects
            .shift_remove(name)
            .ok_or_else(|| InvariantViolation::UnknownObject {
                name: name.to_string(),
            })?;
        for kf in self.keyframes.values_mut() {
            kf.objects.remove(name);
        }
        Ok(obj)
    }

    pub fn unique_object_name(&self, base: &str) -> String {
        unique_name(base, self.objects.keys().map(String::as_str))
    }

    /// Copy an object under a fresh `name_N`, detached and shifted by
    /// [`DUPLICATE_OFFSET`] from where the source currently sits. The copy is
    /// recorded in the keyframe at the current frame.
    pub fn duplicate_object(&mut self, name: &str) -> Result<String, InvariantViolation> {
        let src = self.check_object(name)?;
        let pose = self.resolve_current();
        let (world, rank, _) = engine::current_world(src, &pose);

        let new_name = self.unique_object_name(name);
        let mut dup = SceneObject::new(&new_name, src.kind, &src.path).with_z(rank);
        dup.set_transform(&Transform2 {
            position: world.position.add(DUPLICATE_OFFSET),
            ..world
        });
        let state = dup.to_state();
        let frame = self.current_frame;

        self.check_frame(frame)?;
        self.add_object(dup)?;
        self.ensure_keyframe(frame)?
            .objects
            .insert(new_name.clone(), state);
        Ok(new_name)
    }

    /// Set an object's transform at `frame`, in the frame it is attached to.
    pub fn set_object_transform(
        &mut self,
        name: &str,
        frame: u32,
        transform: Transform2,
    ) -> Result<(), InvariantViolation> {
        check_transform("object", &transform)?;
        self.check_frame(frame)?;
        let obj = self.check_object(name)?;
        let (z, attached_to) = match engine::resolve_pose(self, frame).object(name) {
            Some(p) if p.visible => (p.z, p.attached_to.clone()),
            _ => (obj.z, obj.attached_to.clone()),
        };
        self.write_object_state(name, frame, &transform, z, attached_to)
    }

    /// Temporal deletion: the object disappears from `frame` onwards but keeps
    /// its earlier keyframes.
    pub fn delete_object_from_frame(
        &mut self,
        name: &str,
        frame: u32,
    ) -> Result<(), InvariantViolation> {
        self.check_object(name)?;
        self.ensure_keyframe(frame)?;
        let mut removed = 0usize;
        for (_, kf) in self.keyframes.range_mut(frame..) {
            if kf.objects.remove(name).is_some() {
                removed += 1;
            }
        }
        debug!("object '{name}' deleted from frame {frame} ({removed} keyframe entries)");
        Ok(())
    }

    /// Write frame-local state for one object into the keyframe at `frame`
    /// and mirror it into the object's standalone fields.
    fn write_object_state(
        &mut self,
        name: &str,
        frame: u32,
        local: &Transform2,
        z: i32,
        attached_to: Option<Attachment>,
    ) -> Result<(), InvariantViolation> {
        let fallback = self.check_object(name)?.to_state();
        let kf = self.ensure_keyframe(frame)?;
        let state = kf.objects.entry(name.to_string()).or_insert(fallback);
        state.set_transform(local);
        state.z = z;
        state.attached_to = attached_to.clone();

        if let Some(obj) = self.objects.get_mut(name) {
            obj.set_transform(local);
            obj.z = z;
            obj.attached_to = attached_to;
        }
        Ok(())
    }

    // ---- attachments ----

    /// Attach `object` to `puppet:member` at `frame` without moving it on
    /// screen: its world transform and rank are converted into the member's
    /// frame.
    pub fn attach(
        &mut self,
        object: &str,
        puppet: &str,
        member: &str,
        frame: u32,
    ) -> Result<AttachmentChange, InvariantViolation> {
        self.check_frame(frame)?;
        self.check_member(puppet, member)?;
        let obj = self.check_object(object)?;

        let pose = engine::resolve_pose(self, frame);
        let (world, rank, from) = engine::current_world(obj, &pose);
        let target = pose
            .member(puppet, member)
            .ok_or_else(|| InvariantViolation::UnknownMember {
                puppet: puppet.to_string(),
                member: member.to_string(),
            })?;
        let (local, z) = engine::to_member_frame(target, &world, rank);

        let to = Attachment::new(puppet, member);
        self.write_object_state(object, frame, &local, z, Some(to.clone()))?;
        debug!("attached '{object}' to '{puppet}:{member}' at frame {frame}");
        Ok(AttachmentChange {
            object: object.to_string(),
            from,
            to: Some(to),
            frame,
        })
    }

    /// Detach `object` at `frame`, keeping its world transform. The combined
    /// rank becomes the object's own `z`.
    pub fn detach(&mut self, object: &str, frame: u32) -> Result<AttachmentChange, InvariantViolation> {
        self.check_frame(frame)?;
        let obj = self.check_object(object)?;

        let pose = engine::resolve_pose(self, frame);
        let (world, rank, from) = engine::current_world(obj, &pose);
        let Some(from) = from else {
            return Err(InvariantViolation::NotAttached {
                name: object.to_string(),
            });
        };

        self.write_object_state(object, frame, &world, rank, None)?;
        debug!(
            "detached '{object}' from '{}:{}' at frame {frame}",
            from.puppet, from.member
        );
        Ok(AttachmentChange {
            object: object.to_string(),
            from: Some(from),
            to: None,
            frame,
        })
    }

    // ---- keyframes ----

    /// Capture the resolved scene at `index` into a keyframe, replacing any
    /// keyframe already there.
    pub fn add_keyframe(&mut self, index: u32) -> Result<&Keyframe, InvariantViolation> {
        self.check_frame(index)?;
        let kf = engine::capture(self, index);
        debug!(
            "keyframe {index}: {} puppet(s), {} object(s)",
            kf.puppets.len(),
            kf.objects.len()
        );
        Ok(match self.keyframes.entry(index) {
            Entry::Vacant(slot) => slot.insert(kf),
            Entry::Occupied(mut slot) => {
                slot.insert(kf);
                slot.into_mut()
            }
        })
    }

    pub fn remove_keyframe(&mut self, index: u32) -> Option<Keyframe> {
        self.keyframes.remove(&index)
    }

    /// Insert a complete keyframe after validating every reference in it.
    /// Replaces any keyframe at the same index.
    pub fn insert_keyframe(&mut self, kf: Keyframe) -> Result<(), InvariantViolation> {
        self.validate_keyframe(&kf)?;
        self.keyframes.insert(kf.index, kf);
        Ok(())
    }
}
