mod common;

use common::{free_object, stick_scene};
use macronotron_core::{Keyframe, ObjectState, PuppetPlacement, SceneModel};

fn with_hat(index: u32) -> Keyframe {
    let mut kf = Keyframe::new(index);
    kf.objects.insert(
        "hat".into(),
        ObjectState {
            x: f64::from(index),
            ..Default::default()
        },
    );
    kf
}

fn scene_with_hat(keyframes: Vec<Keyframe>) -> SceneModel {
    let mut model = stick_scene(PuppetPlacement::default());
    model.add_object(free_object("hat", 0.0, 0.0)).unwrap();
    for kf in keyframes {
        model.insert_keyframe(kf).unwrap();
    }
    model
}

fn visible(model: &SceneModel, frame: u32) -> bool {
    model.resolve(frame).object("hat").unwrap().visible
}

#[test]
fn presence_follows_the_previous_keyframe() {
    let model = scene_with_hat(vec![with_hat(0), Keyframe::new(10), with_hat(20)]);
    assert!(visible(&model, 5));
    assert!(!visible(&model, 10));
    assert!(!visible(&model, 15));
    assert!(visible(&model, 20));
    assert!(visible(&model, 25));
}

#[test]
fn before_the_first_keyframe_the_next_one_decides() {
    let model = scene_with_hat(vec![with_hat(10)]);
    assert!(visible(&model, 3));

    let model = scene_with_hat(vec![Keyframe::new(10), with_hat(20)]);
    assert!(!visible(&model, 3));
}

#[test]
fn no_keyframes_means_hidden() {
    let model = scene_with_hat(Vec::new());
    assert!(!visible(&model, 0));
}

#[test]
fn temporal_deletion_keeps_the_past() {
    let mut model = scene_with_hat(vec![with_hat(0), with_hat(10), with_hat(20)]);
    model.delete_object_from_frame("hat", 10).unwrap();

    assert!(visible(&model, 5));
    assert!(!visible(&model, 10));
    assert!(!visible(&model, 25));
    assert!(model.keyframe(0).unwrap().objects.contains_key("hat"));
    assert!(!model.keyframe(20).unwrap().objects.contains_key("hat"));
    assert!(model.object("hat").is_some());
}

#[test]
fn temporal_deletion_between_keyframes_captures_first() {
    let mut model = scene_with_hat(vec![with_hat(0), with_hat(20)]);
    model.delete_object_from_frame("hat", 12).unwrap();
    assert!(model.keyframe(12).is_some());
    assert!(visible(&model, 11));
    assert!(!visible(&model, 12));
    assert!(!visible(&model, 20));
}

#[test]
fn capture_respects_deletion_and_picks_up_new_objects() {
    let mut model = scene_with_hat(vec![with_hat(0), Keyframe::new(10)]);
    model
        .add_object(free_object("canne", 5.0, 6.0).with_rotation(12.0))
        .unwrap();

    let kf = model.add_keyframe(30).unwrap();
    assert!(!kf.objects.contains_key("hat"));
    let canne = &kf.objects["canne"];
    assert_eq!((canne.x, canne.y, canne.rotation), (5.0, 6.0, 12.0));
    assert!(kf.puppets["p"].contains_key("torse"));
    assert!(kf.puppets["p"]["torse"].position.is_some());
    assert!(kf.puppets["p"]["bras"].position.is_none());
}

#[test]
fn capture_records_the_interpolated_state() {
    let mut model = scene_with_hat(vec![with_hat(0), with_hat(20)]);
    model.add_keyframe(5).unwrap();
    assert_eq!(model.keyframe(5).unwrap().objects["hat"].x, 5.0);
    // Re-adding at an existing index re-captures in place.
    model.add_keyframe(5).unwrap();
    assert_eq!(model.keyframes().len(), 3);
}
