// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo behavior of the scene history.

mod common;

use parking_lot::Mutex;
use replay_editor_curves::{Channel, Keyframe};
use replay_editor_scene::operators::{
    AddObjectOperator, CommitObjectOperator, InsertKeyframeOperator, RemoveKeyframesOperator, RemoveObjectOperator,
    RenameObjectOperator, SetParentOperator, ShiftKeyframesOperator,
};
use replay_editor_scene::{
    AnimationObject, ChannelRef, DummyObject, EntityObject, HasChannels, HasTransform, KeyframeRef, ObjectId, Operator,
    Scene, SceneConfig, SceneDocument, SceneError,
};
use std::sync::Arc;

fn document(scene: &Scene) -> SceneDocument {
    scene.write_serialized_objects().expect("snapshots serialize")
}

/// Apply, undo and redo `operator`, checking the committed state each time
fn assert_exact(scene: &mut Scene, operator: Box<dyn Operator>) {
    let before = document(scene);
    let description = operator.description().to_owned();
    assert!(scene.apply_operator(operator), "{description} did nothing");
    let after = document(scene);
    assert_ne!(before, after, "{description} left no trace");

    assert!(scene.undo());
    assert_eq!(document(scene), before, "undo of {description}");
    assert!(scene.redo());
    assert_eq!(document(scene), after, "redo of {description}");
}

#[test]
fn test_every_operator_restores_exactly() {
    common::init_tracing();
    let mut scene = common::sample_scene();

    let operators: Vec<Box<dyn Operator>> = vec![
        Box::new(InsertKeyframeOperator::new(ChannelRef::new("cam", "posX"), Keyframe::new(50, 3.0))),
        Box::new(InsertKeyframeOperator::new(ChannelRef::new("rig", "posY"), Keyframe::new(0, 1.0))),
        Box::new(RemoveKeyframesOperator::new([KeyframeRef::new("cam", "posX", 1)])),
        Box::new(ShiftKeyframesOperator::new([KeyframeRef::new("cam", "posX", 0)], 250)),
        Box::new(AddObjectOperator::new("extra", DummyObject::default().into())),
        Box::new(SetParentOperator::new("cam", None)),
        Box::new(RenameObjectOperator::new("rig", "base")),
        Box::new(RemoveObjectOperator::new("base")),
        Box::new(CommitObjectOperator::with_edit("extra", "Set weight", |object| {
            object.set_attribute("weight", 4.0).map_err(SceneError::from)
        })),
    ];
    for operator in operators {
        assert_exact(&mut scene, operator);
    }
    assert_eq!(scene.history().undo_depth(), 9);
}

#[test]
fn test_undo_all_then_redo_all() {
    let mut scene = common::sample_scene();
    let initial = document(&scene);

    assert!(scene.apply_operator(Box::new(AddObjectOperator::new("e", EntityObject::default().into()))));
    assert!(scene.apply_operator(Box::new(SetParentOperator::new("e", Some(ObjectId::new("rig"))))));
    assert!(scene.apply_operator(Box::new(RemoveObjectOperator::new("rig"))));
    let last = document(&scene);

    while scene.undo() {}
    assert_eq!(document(&scene), initial);
    assert!(!scene.can_undo());
    assert_eq!(scene.history().redo_depth(), 3);

    while scene.redo() {}
    assert_eq!(document(&scene), last);
    assert!(scene.object("cam").and_then(|cam| cam.parent()).is_none());
}

#[test]
fn test_new_operator_clears_redo() {
    let mut scene = common::sample_scene();
    assert!(scene.apply_operator(Box::new(RenameObjectOperator::new("rig", "a"))));
    assert!(scene.undo());
    assert!(scene.can_redo());

    assert!(scene.apply_operator(Box::new(RenameObjectOperator::new("rig", "b"))));
    assert!(!scene.can_redo());
    assert_eq!(scene.undo_description(), Some("Rename object"));
}

#[test]
fn test_history_depth_is_bounded() {
    let config = SceneConfig {
        max_history: 2,
        ..SceneConfig::default()
    };
    let mut scene = Scene::with_config(config);
    scene.add_object("d", DummyObject::default().into());
    for time in [0, 10, 20] {
        let op = InsertKeyframeOperator::new(ChannelRef::new("d", "x"), Keyframe::new(time, 0.0));
        assert!(scene.apply_operator(Box::new(op)));
    }
    assert_eq!(scene.history().undo_depth(), 2);
    assert!(scene.undo());
    assert!(scene.undo());
    assert!(!scene.undo());
    assert_eq!(ChannelRef::new("d", "x").resolve(&scene).map(Channel::len), Some(1));
}

#[derive(Debug)]
struct Failing {
    fail_execute: bool,
}

impl Operator for Failing {
    fn description(&self) -> &str {
        "Failing"
    }

    fn execute(&mut self, _scene: &mut Scene) -> Result<bool, SceneError> {
        if self.fail_execute {
            return Err(SceneError::Operator("execute failed".into()));
        }
        Ok(true)
    }

    fn undo(&mut self, _scene: &mut Scene) -> Result<(), SceneError> {
        Err(SceneError::Operator("undo failed".into()))
    }

    fn redo(&mut self, _scene: &mut Scene) -> Result<(), SceneError> {
        Ok(())
    }
}

fn recording_scene() -> (Scene, Arc<Mutex<Vec<String>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let scene = common::sample_scene().with_error_sink(Arc::new(move |error: &SceneError| {
        sink.lock().push(error.to_string());
    }));
    (scene, errors)
}

#[test]
fn test_failed_execute_clears_history() {
    common::init_tracing();
    let (mut scene, errors) = recording_scene();
    assert!(scene.apply_operator(Box::new(RenameObjectOperator::new("rig", "a"))));
    assert!(scene.apply_operator(Box::new(RenameObjectOperator::new("a", "b"))));
    assert!(scene.undo());
    assert!(scene.can_undo() && scene.can_redo());

    assert!(!scene.apply_operator(Box::new(Failing { fail_execute: true })));
    assert!(!scene.can_undo());
    assert!(!scene.can_redo());
    assert_eq!(errors.lock().len(), 1);
    assert!(errors.lock()[0].contains("execute failed"));
}

#[test]
fn test_failed_undo_clears_history() {
    let (mut scene, errors) = recording_scene();
    assert!(scene.apply_operator(Box::new(RenameObjectOperator::new("rig", "a"))));
    assert!(scene.apply_operator(Box::new(Failing { fail_execute: false })));

    assert!(!scene.undo());
    assert!(!scene.can_undo());
    assert!(!scene.can_redo());
    assert_eq!(errors.lock().as_slice(), ["Operator failed: undo failed"]);
    assert!(scene.contains("a"));
}

#[test]
fn test_flat_keys_sample_flat() {
    let mut scene = Scene::new();
    scene.add_object("d", DummyObject::default().into());
    let channel = ChannelRef::new("d", "x");
    for time in [0, 10] {
        let op = InsertKeyframeOperator::new(channel.clone(), Keyframe::new(time, 0.0));
        assert!(scene.apply_operator(Box::new(op)));
    }

    let curve = channel.resolve(&scene).expect("channel was created");
    assert!(curve.sample(5.0).abs() < 1e-9);
    assert!(curve.sample(-5.0).abs() < 1e-9);
    assert!(curve.sample(50.0).abs() < 1e-9);
}

#[test]
fn test_applied_zero_scale_stays_undoable() {
    let (mut scene, errors) = recording_scene();
    let mut entity = EntityObject::default();
    entity
        .channels_mut()
        .insert("scaleX".into(), Channel::from_keyframes(vec![Keyframe::new(0, 0.0)]));
    entity
        .channels_mut()
        .insert("posX".into(), Channel::from_keyframes(vec![Keyframe::new(0, 3.0)]));
    scene.add_object("e", entity.into());

    scene.apply(0.0);
    let object = scene.object("e").unwrap();
    let snapshot = object.save();
    let mut reparsed = object.clone();
    reparsed.parse(&snapshot).unwrap();
    assert_eq!(&reparsed, object);

    assert!(scene.apply_operator(Box::new(CommitObjectOperator::new("e"))));
    assert!(scene.undo());
    assert!(scene.redo());
    assert!(scene.can_undo());
    assert!(errors.lock().is_empty());
    let position = scene
        .object("e")
        .and_then(AnimationObject::as_transform)
        .map(|transform| transform.transform().position.x);
    assert_eq!(position, Some(3.0));
}
