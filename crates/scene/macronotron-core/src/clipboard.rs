//! Keyframe copy/paste.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{Keyframe, ObjectState, PuppetState};
use crate::error::SceneError;
use crate::scene::SceneModel;

/// Detached copy of one keyframe's content, without its index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeClipboard {
    pub objects: BTreeMap<String, ObjectState>,
    pub puppets: BTreeMap<String, PuppetState>,
}

impl KeyframeClipboard {
    pub fn to_keyframe(&self, index: u32) -> Keyframe {
        Keyframe {
            index,
            objects: self.objects.clone(),
            puppets: self.puppets.clone(),
        }
    }
}

/// Copy the keyframe at `index`, `None` when there is none.
pub fn copy_keyframe(model: &SceneModel, index: u32) -> Option<KeyframeClipboard> {
    model.keyframe(index).map(|kf| KeyframeClipboard {
        objects: kf.objects.clone(),
        puppets: kf.puppets.clone(),
    })
}

/// Paste `clip` at `index`, overwriting any keyframe there.
///
/// The paste is refused as a whole when `index` is out of range or the
/// clipboard references puppets, members or objects the scene no longer has.
pub fn paste_keyframe(
    model: &mut SceneModel,
    clip: &KeyframeClipboard,
    index: u32,
) -> Result<(), SceneError> {
    model.insert_keyframe(clip.to_keyframe(index))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemberState;
    use crate::error::InvariantViolation;

    #[test]
    fn copy_missing_keyframe_is_none() {
        assert!(copy_keyframe(&SceneModel::new(), 3).is_none());
    }

    #[test]
    fn paste_rejects_unknown_puppet() {
        let mut model = SceneModel::new();
        let mut clip = KeyframeClipboard::default();
        clip.puppets
            .entry("ghost".into())
            .or_default()
            .insert("torse".into(), MemberState::rotated(5.0));
        let err = paste_keyframe(&mut model, &clip, 4).unwrap_err();
        assert_eq!(
            err,
            SceneError::Invariant(InvariantViolation::UnknownPuppet {
                name: "ghost".into()
            })
        );
        assert!(model.keyframes().is_empty());
    }
}
