// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared helpers for integration tests.

#![allow(dead_code)]

use replay_editor_curves::{Channel, Keyframe};
use replay_editor_scene::{CameraObject, EntityObject, HasChannels, Scene};

/// Route `tracing` output to the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("replay_editor_scene=debug")
        .with_test_writer()
        .try_init();
}

/// Scene with a keyed camera parented to an entity
pub fn sample_scene() -> Scene {
    let mut camera = CameraObject::default();
    camera.channels_mut().insert(
        "posX".into(),
        Channel::from_keyframes(vec![Keyframe::new(0, 0.0), Keyframe::new(100, 10.0), Keyframe::new(200, 0.0)]),
    );

    let mut scene = Scene::new();
    scene.add_object("rig", EntityObject::default().into());
    scene.add_object("cam", camera.into());
    scene
        .set_parent("cam", Some("rig"))
        .expect("rig is a valid parent");
    scene.save_object("cam").expect("cam exists");
    scene
}
