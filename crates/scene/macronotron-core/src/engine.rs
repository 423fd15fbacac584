//! State application: turns the keyframe store into a [`ResolvedPose`].
//!
//! Per frame:
//! 1) Bracket the frame between `prev` and `next` keyframes.
//! 2) Interpolate member rotations (shortest arc) and root offsets (linear),
//!    step-hold variants, then walk each puppet root-to-leaf for world values.
//! 3) Apply the presence rule to objects, blend them only when both sides share
//!    an attachment, and place attached objects in their member's world frame.
//!
//! Everything here is a pure function of the scene. Mutating operations that
//! need pose math (capture, attach, detach) call into this module.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::warn;

use crate::data::{Attachment, Keyframe, MemberState, ObjectState, SceneObject};
use crate::geometry::{rotate, Transform2, Vec2};
use crate::hierarchy::PuppetMember;
use crate::interp::{lerp_angle, lerp_transform, lerp_vec2, step};
use crate::outputs::{MemberPose, ObjectPose, ResolvedPose};
use crate::sampling::{carried_back, find_bracket, Bracket};
use crate::scene::{PuppetEntry, SceneModel};

/// Resolve every member and object of `model` at `frame`.
///
/// Frames outside the playback range are resolved like any other.
pub fn resolve_pose(model: &SceneModel, frame: u32) -> ResolvedPose {
    let keyframes = model.keyframes();
    let bracket = find_bracket(keyframes, frame);

    let mut members = IndexMap::with_capacity(model.puppets().len());
    for (name, entry) in model.puppets() {
        members.insert(
            name.clone(),
            resolve_puppet(name, entry, keyframes, &bracket, frame),
        );
    }

    let mut pose = ResolvedPose {
        frame,
        members,
        objects: IndexMap::with_capacity(model.objects().len()),
    };
    for (name, _) in model.objects() {
        let obj = resolve_object(name, keyframes, &bracket, frame, &pose);
        pose.objects.insert(name.clone(), obj);
    }
    pose
}

fn resolve_puppet(
    puppet_name: &str,
    entry: &PuppetEntry,
    keyframes: &BTreeMap<u32, Keyframe>,
    bracket: &Bracket<'_>,
    frame: u32,
) -> IndexMap<String, MemberPose> {
    let puppet = &entry.puppet;
    let scale = entry.placement.scale;
    let z_offset = entry.placement.z_offset;

    let mut solved: Vec<Option<MemberPose>> = vec![None; puppet.len()];
    for &id in puppet.pre_order() {
        let Some(member) = puppet.get(id) else {
            continue;
        };
        let (local_rotation, root_offset) = member_channels(puppet_name, entry, member, bracket);
        let variant = member_variant(puppet_name, member, keyframes, bracket, frame);

        let parent = member
            .parent
            .and_then(|p| solved.get(p.index()).and_then(Option::as_ref));
        let (local_offset, world_pivot, world_rotation) = match parent {
            Some(parent) => {
                let offset = member.rest_offset.scale(scale);
                (
                    offset,
                    parent
                        .world_pivot
                        .add(rotate(offset, parent.world_rotation)),
                    parent.world_rotation + local_rotation,
                )
            }
            None => (
                root_offset,
                root_offset.add(member.pivot.scale(scale)),
                local_rotation,
            ),
        };

        solved[id.index()] = Some(MemberPose {
            local_rotation,
            local_offset,
            world_pivot,
            world_rotation,
            world_scale: scale,
            rank: member.rank + z_offset,
            variant,
        });
    }

    puppet
        .members()
        .zip(solved)
        .filter_map(|(m, pose)| pose.map(|p| (m.name.clone(), p)))
        .collect()
}

/// Local rotation and root offset of one member. Roots fall back to the
/// puppet placement, other members to rotation 0.
fn member_channels(
    puppet_name: &str,
    entry: &PuppetEntry,
    member: &PuppetMember,
    bracket: &Bracket<'_>,
) -> (f64, Vec2) {
    let (neutral_rot, neutral_pos) = if member.is_root() {
        (entry.placement.rotation, entry.placement.position)
    } else {
        (0.0, Vec2::ZERO)
    };
    let rot = |st: Option<&MemberState>| st.map_or(neutral_rot, |s| s.rotation);
    let pos = |st: Option<&MemberState>| st.and_then(|s| s.position).unwrap_or(neutral_pos);

    match *bracket {
        Bracket::Empty => (neutral_rot, neutral_pos),
        Bracket::Before { next: kf } | Bracket::Hold { prev: kf } => {
            let st = kf.member(puppet_name, &member.name);
            (rot(st), pos(st))
        }
        Bracket::Between { prev, next, t } => {
            let a = prev.member(puppet_name, &member.name);
            let b = next.member(puppet_name, &member.name);
            (
                lerp_angle(rot(a), rot(b), t),
                lerp_vec2(pos(a), pos(b), t),
            )
        }
    }
}

fn member_variant(
    puppet_name: &str,
    member: &PuppetMember,
    keyframes: &BTreeMap<u32, Keyframe>,
    bracket: &Bracket<'_>,
    frame: u32,
) -> Option<String> {
    let recorded = |kf: &Keyframe| {
        kf.member(puppet_name, &member.name)
            .and_then(|m| m.variant.clone())
    };
    carried_back(keyframes, frame, |kf| {
        kf.member(puppet_name, &member.name)
            .and_then(|m| m.variant.as_ref())
    })
    .cloned()
    .or_else(|| match *bracket {
        Bracket::Before { next } => recorded(next),
        _ => None,
    })
    .or_else(|| member.default_variant().map(str::to_string))
}

fn resolve_object(
    name: &str,
    keyframes: &BTreeMap<u32, Keyframe>,
    bracket: &Bracket<'_>,
    frame: u32,
    pose: &ResolvedPose,
) -> ObjectPose {
    let Some(state) = object_state(name, bracket) else {
        return ObjectPose::hidden();
    };

    let variant = carried_back(keyframes, frame, |kf| {
        kf.objects.get(name).and_then(|o| o.variant.as_ref())
    })
    .cloned()
    .or_else(|| state.variant.clone());

    let local = state.transform();
    let (world, rank) = place(name, &local, state.z, state.attached_to.as_ref(), pose);
    ObjectPose {
        visible: true,
        attached_to: state.attached_to,
        local,
        world,
        rank,
        z: state.z,
        variant,
    }
}

/// Frame-local state of a visible object, `None` when the presence rule hides it.
fn object_state(name: &str, bracket: &Bracket<'_>) -> Option<ObjectState> {
    match *bracket {
        Bracket::Empty => None,
        Bracket::Before { next: kf } | Bracket::Hold { prev: kf } => kf.objects.get(name).cloned(),
        Bracket::Between { prev, next, t } => {
            let a = prev.objects.get(name)?;
            match next.objects.get(name) {
                // z and variant are step channels and stay on `prev`.
                Some(b) if b.attached_to == a.attached_to => {
                    let mut out = step(a);
                    out.set_transform(&lerp_transform(&a.transform(), &b.transform(), t));
                    Some(out)
                }
                _ => Some(step(a)),
            }
        }
    }
}

/// World transform and rank of an object given in the frame named by `attached_to`.
///
/// A vanished puppet or member degrades to the scene frame.
fn place(
    name: &str,
    local: &Transform2,
    z: i32,
    attached_to: Option<&Attachment>,
    pose: &ResolvedPose,
) -> (Transform2, i32) {
    let Some(att) = attached_to else {
        return (*local, z);
    };
    match pose.member(&att.puppet, &att.member) {
        Some(member) => from_member_frame(member, local, z),
        None => {
            warn!(
                "object '{name}' is attached to missing member '{}:{}'; using scene frame",
                att.puppet, att.member
            );
            (*local, z)
        }
    }
}

/// World transform and rank an object would have if drawn from its standalone
/// fields against `pose`.
pub fn standalone_world(obj: &SceneObject, pose: &ResolvedPose) -> (Transform2, i32) {
    place(
        &obj.name,
        &obj.transform(),
        obj.z,
        obj.attached_to.as_ref(),
        pose,
    )
}

/// Where an object currently sits in the world at `pose.frame`: its resolved
/// pose when visible, its standalone fields otherwise.
pub fn current_world(obj: &SceneObject, pose: &ResolvedPose) -> (Transform2, i32, Option<Attachment>) {
    match pose.object(&obj.name) {
        Some(p) if p.visible => (p.world, p.rank, p.attached_to.clone()),
        _ => {
            let (world, rank) = standalone_world(obj, pose);
            (world, rank, obj.attached_to.clone())
        }
    }
}

/// Express a world transform and rank in a member's frame.
pub fn to_member_frame(member: &MemberPose, world: &Transform2, rank: i32) -> (Transform2, i32) {
    (
        Transform2::relative_to(&member.frame(), world),
        rank - member.rank,
    )
}

/// Express a member-local transform and z offset in the scene frame.
pub fn from_member_frame(member: &MemberPose, local: &Transform2, z: i32) -> (Transform2, i32) {
    (Transform2::compose(&member.frame(), local), member.rank + z)
}

/// Snapshot of the resolved scene at `frame`, as it would be stored in a keyframe.
///
/// Visible objects keep their frame-local state. Objects no keyframe has ever
/// mentioned are taken from their standalone fields. Objects hidden by a
/// temporal deletion stay out.
pub fn capture(model: &SceneModel, frame: u32) -> Keyframe {
    let pose = resolve_pose(model, frame);
    let mut kf = Keyframe::new(frame);

    for (puppet_name, entry) in model.puppets() {
        let Some(members) = pose.members.get(puppet_name) else {
            continue;
        };
        let states = kf.puppets.entry(puppet_name.clone()).or_default();
        for (member_name, mp) in members {
            let is_root = entry
                .puppet
                .member(member_name)
                .is_some_and(PuppetMember::is_root);
            states.insert(
                member_name.clone(),
                MemberState {
                    rotation: mp.local_rotation,
                    position: is_root.then_some(mp.local_offset),
                    variant: mp.variant.clone(),
                },
            );
        }
    }

    for (name, obj) in model.objects() {
        match pose.object(name) {
            Some(op) if op.visible => {
                let mut st = ObjectState {
                    z: op.z,
                    attached_to: op.attached_to.clone(),
                    variant: op.variant.clone(),
                    ..Default::default()
                };
                st.set_transform(&op.local);
                kf.objects.insert(name.clone(), st);
            }
            _ if !model.keyframes().values().any(|k| k.objects.contains_key(name)) => {
                kf.objects.insert(name.clone(), obj.to_state());
            }
            _ => {}
        }
    }
    kf
}
