//! Scene data model: free objects, per-frame snapshots and keyframes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Transform2, Vec2};

/// Non-owning link from an object to a puppet member, by names.
/// Serialized as `["puppet", "member"]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Attachment {
    pub puppet: String,
    pub member: String,
}

impl Attachment {
    pub fn new(puppet: &str, member: &str) -> Self {
        Self {
            puppet: puppet.to_string(),
            member: member.to_string(),
        }
    }
}

impl From<(String, String)> for Attachment {
    fn from((puppet, member): (String, String)) -> Self {
        Self { puppet, member }
    }
}

impl From<Attachment> for (String, String) {
    fn from(a: Attachment) -> Self {
        (a.puppet, a.member)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    #[default]
    Image,
    Svg,
    Light,
    #[serde(other)]
    Unknown,
}

fn one() -> f64 {
    1.0
}

/// A free-standing scene element.
///
/// When attached, `x`/`y`/`rotation`/`scale` are expressed in the member's
/// frame; otherwise in scene coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "obj_type", default)]
    pub kind: ObjectKind,
    #[serde(rename = "file_path", default)]
    pub path: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub scale: f64,
    /// Own stacking offset; added to the member rank while attached.
    #[serde(default)]
    pub z: i32,
    #[serde(default)]
    pub attached_to: Option<Attachment>,
}

impl SceneObject {
    pub fn new(name: &str, kind: ObjectKind, path: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            path: path.to_string(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            z: 0,
            attached_to: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn attached(mut self, puppet: &str, member: &str) -> Self {
        self.attached_to = Some(Attachment::new(puppet, member));
        self
    }

    pub fn transform(&self) -> Transform2 {
        Transform2 {
            position: Vec2::new(self.x, self.y),
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    pub fn set_transform(&mut self, t: &Transform2) {
        self.x = t.position.x;
        self.y = t.position.y;
        self.rotation = t.rotation;
        self.scale = t.scale;
    }

    /// Snapshot of the standalone fields.
    pub fn to_state(&self) -> ObjectState {
        ObjectState {
            x: self.x,
            y: self.y,
            rotation: self.rotation,
            scale: self.scale,
            z: self.z,
            attached_to: self.attached_to.clone(),
            variant: None,
        }
    }
}

/// Object state recorded in a keyframe, in the frame named by `attached_to`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub z: i32,
    #[serde(default)]
    pub attached_to: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            z: 0,
            attached_to: None,
            variant: None,
        }
    }
}

impl ObjectState {
    pub fn transform(&self) -> Transform2 {
        Transform2 {
            position: Vec2::new(self.x, self.y),
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    pub fn set_transform(&mut self, t: &Transform2) {
        self.x = t.position.x;
        self.y = t.position.y;
        self.rotation = t.rotation;
        self.scale = t.scale;
    }
}

/// Member state recorded in a keyframe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberState {
    /// Local rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Offset of the whole puppet; recorded for root members only.
    #[serde(default, alias = "pos", skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl MemberState {
    pub fn rotated(rotation: f64) -> Self {
        Self {
            rotation,
            ..Default::default()
        }
    }
}

/// `member → state` for one puppet.
pub type PuppetState = BTreeMap<String, MemberState>;

/// Snapshot of every object and puppet member at one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub index: u32,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectState>,
    #[serde(default)]
    pub puppets: BTreeMap<String, PuppetState>,
}

impl Keyframe {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn member(&self, puppet: &str, member: &str) -> Option<&MemberState> {
        self.puppets.get(puppet).and_then(|p| p.get(member))
    }

    pub fn member_mut(&mut self, puppet: &str, member: &str) -> &mut MemberState {
        self.puppets
            .entry(puppet.to_string())
            .or_default()
            .entry(member.to_string())
            .or_default()
    }

    /// Attachments referenced by this keyframe, with the object that holds them.
    pub fn attachments(&self) -> impl Iterator<Item = (&str, &Attachment)> {
        self.objects
            .iter()
            .filter_map(|(name, st)| st.attached_to.as_ref().map(|a| (name.as_str(), a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_serializes_as_pair() {
        let obj = SceneObject::new("hat", ObjectKind::Svg, "hat.svg").attached("manu", "tete");
        let v = serde_json::to_value(&obj).unwrap();
        assert_eq!(v["attached_to"], serde_json::json!(["manu", "tete"]));
        assert_eq!(v["obj_type"], "svg");
        let back: SceneObject = serde_json::from_value(v).unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn member_state_reads_legacy_pos_key() {
        let st: MemberState = serde_json::from_str(r#"{"rotation": 12.5, "pos": [3, 4]}"#).unwrap();
        assert_eq!(st.position, Some(Vec2::new(3.0, 4.0)));
        let out = serde_json::to_value(&st).unwrap();
        assert_eq!(out, serde_json::json!({"rotation": 12.5, "position": [3.0, 4.0]}));
    }

    #[test]
    fn object_state_defaults_and_unknown_kind() {
        let st: ObjectState = serde_json::from_str(r#"{"x": 1, "obj_type": "image"}"#).unwrap();
        assert_eq!(st.scale, 1.0);
        assert_eq!(st.attached_to, None);
        let obj: SceneObject = serde_json::from_str(r#"{"obj_type": "hologram"}"#).unwrap();
        assert_eq!(obj.kind, ObjectKind::Unknown);
    }
}
