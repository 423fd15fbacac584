//! Output contracts from the pose engine.
//!
//! A [`ResolvedPose`] is everything a renderer needs to draw one frame. It is
//! recomputed from scratch on every call and never stored in the scene.
//! [`AttachmentChange`] is the separate signal a renderer needs to re-parent a
//! visual node when an object is attached or detached.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::Attachment;
use crate::geometry::{Transform2, Vec2};

/// Resolved state of one puppet member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberPose {
    /// Rotation relative to the parent member (or the scene for roots).
    pub local_rotation: f64,
    /// Root offset for roots, scaled rest offset for children.
    pub local_offset: Vec2,
    pub world_pivot: Vec2,
    pub world_rotation: f64,
    pub world_scale: f64,
    /// Static rank plus the puppet's z offset.
    pub rank: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl MemberPose {
    /// World frame of this member, usable as the parent of attached objects.
    pub fn frame(&self) -> Transform2 {
        Transform2 {
            position: self.world_pivot,
            rotation: self.world_rotation,
            scale: self.world_scale,
        }
    }
}

/// Resolved state of one scene object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectPose {
    pub visible: bool,
    pub attached_to: Option<Attachment>,
    /// Transform in the attachment frame (scene frame when free).
    pub local: Transform2,
    pub world: Transform2,
    pub rank: i32,
    /// Own stacking offset in the attachment frame.
    pub z: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl ObjectPose {
    pub(crate) fn hidden() -> Self {
        Self {
            visible: false,
            attached_to: None,
            local: Transform2::default(),
            world: Transform2::default(),
            rank: 0,
            z: 0,
            variant: None,
        }
    }
}

/// `puppet → member → pose` plus `object → pose`, in scene insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPose {
    pub frame: u32,
    pub members: IndexMap<String, IndexMap<String, MemberPose>>,
    pub objects: IndexMap<String, ObjectPose>,
}

impl ResolvedPose {
    pub fn member(&self, puppet: &str, member: &str) -> Option<&MemberPose> {
        self.members.get(puppet).and_then(|p| p.get(member))
    }

    pub fn object(&self, name: &str) -> Option<&ObjectPose> {
        self.objects.get(name)
    }

    /// Names of visible objects, in scene order.
    pub fn visible_objects(&self) -> impl Iterator<Item = &str> {
        self.objects
            .iter()
            .filter(|(_, o)| o.visible)
            .map(|(n, _)| n.as_str())
    }
}

/// Emitted by attach/detach so the renderer can re-parent the object's node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentChange {
    pub object: String,
    pub from: Option<Attachment>,
    pub to: Option<Attachment>,
    pub frame: u32,
}
