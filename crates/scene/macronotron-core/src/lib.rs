//! Macronotron animation core (renderer-agnostic).
//!
//! A scene of jointed 2D puppets and free objects, keyframed at integer
//! frames. The crate owns three layers:
//! - [`hierarchy`]: the static skeleton of each puppet, built from asset
//!   groups and a rig description;
//! - [`scene`]: the authoritative store (puppets, objects, keyframes,
//!   settings) with invariant-checked mutations and the JSON document;
//! - [`engine`]: pure pose resolution for any frame, plus the conversions
//!   that let objects change attachment without moving on screen.
//!
//! Hosts render [`ResolvedPose`] and re-parent visuals on [`AttachmentChange`].

pub mod asset;
pub mod clipboard;
pub mod config;
pub mod data;
pub mod document;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod ids;
pub mod interp;
pub mod naming;
pub mod outputs;
pub mod sampling;
pub mod scene;

// Re-exports for hosts
pub use asset::{AssetProvider, StaticAssets};
pub use clipboard::{copy_keyframe, paste_keyframe, KeyframeClipboard};
pub use config::{MemberSpec, RigConfig};
pub use data::{
    Attachment, Keyframe, MemberState, ObjectKind, ObjectState, PuppetState, SceneObject,
};
pub use document::{ImportReport, PuppetLoader, SceneDocument, DOCUMENT_VERSION};
pub use engine::resolve_pose;
pub use error::{
    BuildError, BuildIssue, DocumentIssue, InvariantViolation, MalformedDocument, SceneError,
};
pub use geometry::{Rect, Transform2, Vec2};
pub use hierarchy::{Puppet, PuppetMember};
pub use ids::MemberId;
pub use outputs::{AttachmentChange, MemberPose, ObjectPose, ResolvedPose};
pub use scene::{PuppetEntry, PuppetPlacement, SceneModel, SceneSettings};
