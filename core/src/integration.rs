//! End-to-end inspector session against the scripted in-memory host.

use crate::access::MemberKey;
use crate::config::Config;
use crate::fake_host::{FakeHost, InvokeBehavior};
use crate::host::{ComponentRef, FieldRef, Host, InstanceRef, LoadMode, MethodRef, RawPtr};
use crate::inspector::Inspector;
use crate::logbuf::Severity;
use crate::meta::{FieldDesc, MethodDesc};
use crate::value::Value;
use crate::{AccessError, FieldDisplay, InvokeError};

struct Scene {
    host: FakeHost,
    player: InstanceRef,
    camera: InstanceRef,
    mover: ComponentRef,
    speed: FieldRef,
    target: FieldRef,
    teleport: MethodRef,
}

/// A small scene: a root with two children, the player carrying a mover
/// component with an editable field, a reference field, and a method.
fn build_scene() -> Scene {
    let mut host = FakeHost::new();
    let world = host.add_instance("World");
    let player = host.add_instance("Player");
    let camera = host.add_instance("Camera");
    host.set_parent(player, world);
    host.set_parent(camera, world);

    let component_base = host.component_class();
    let mover_class = host.add_class_with_parent("Game", "Mover", component_base);
    let mover = host.add_component(player, mover_class);

    let float_ty = host.add_type(12, None);
    let object_ty = host.add_type(28, None);
    let void_ty = host.add_type(1, None);

    let speed = host.add_field(mover, "speed", float_ty, 0x18);
    host.set_field_value(mover, 0x18, Value::R4(4.0));

    let target = host.add_field(mover, "target", object_ty, 0x20);
    host.set_field_raw(mover, 0x20, camera.as_ptr());

    let teleport = host.add_method(
        mover,
        "Teleport",
        void_ty,
        &[(float_ty, Some("x")), (float_ty, Some("y"))],
        0,
    );

    Scene {
        host,
        player,
        camera,
        mover,
        speed,
        target,
        teleport,
    }
}

fn visible_inspector(host: FakeHost) -> Inspector<FakeHost> {
    let mut config = Config::default();
    config.overlay.start_visible = true;
    Inspector::new(host, config)
}

#[test]
fn full_session_walkthrough() {
    let scene = build_scene();
    let player = scene.player;
    let mover = scene.mover;
    let mut ins = visible_inspector(scene.host);

    // First tick scans; hierarchy shows one root with sorted children.
    ins.tick(0);
    assert_eq!(ins.cache().len(), 3);
    let roots = ins.cache().roots().to_vec();
    assert_eq!(roots.len(), 1);
    let world_node = ins.cache().entry(roots[0]).unwrap().node;
    let children: Vec<_> = ins
        .cache()
        .children_of(world_node)
        .iter()
        .map(|i| ins.cache().entry(*i).unwrap().name.clone())
        .collect();
    assert_eq!(children, ["Camera", "Player"]);

    // Select the player and inspect its mover component.
    ins.select(player);
    assert_eq!(ins.selected_component(), Some(mover));
    assert_eq!(ins.component_class_name(mover), "Game.Mover");

    let rows = ins.field_rows(mover);
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].display,
        FieldDisplay::Editable {
            current: "4.000000".to_string()
        }
    );

    // Edit the speed field through a draft.
    let speed_desc = FieldDesc::read(ins.host(), scene.speed).unwrap();
    assert!(ins.commit_field(mover, &speed_desc, "12.5"));
    assert_eq!(
        ins.host().field_value(mover, 0x18),
        Some(&Value::R4(12.5))
    );

    // The reference field previews the camera and jumps to it.
    let target_desc = FieldDesc::read(ins.host(), scene.target).unwrap();
    let rows = ins.field_rows(mover);
    let target_row = rows
        .iter()
        .find(|row| row.desc.field == target_desc.field)
        .unwrap();
    let FieldDisplay::Reference { ptr, preview } = &target_row.display else {
        panic!("expected a reference display");
    };
    assert_eq!(preview, "Engine.GameObject");
    assert_eq!(ins.jump_to_reference(*ptr), Some(scene.camera));

    // Back-navigation returns to the player.
    assert_eq!(ins.select_back(), Some(player));
}

#[test]
fn invoke_flow_with_drafts_and_results() {
    let scene = build_scene();
    let mover = scene.mover;
    let mut ins = visible_inspector(scene.host);
    ins.tick(0);
    ins.select(scene.player);

    let desc = MethodDesc::read(ins.host(), scene.teleport).unwrap();
    ins.access_mut()
        .drafts
        .insert(MemberKey::arg(mover, &desc, 0), "1.0".to_string());
    ins.access_mut()
        .drafts
        .insert(MemberKey::arg(mover, &desc, 1), "2.0".to_string());
    ins.invoke_method(mover, &desc);

    let (called, receiver, args) = ins.host().invocations.last().unwrap();
    assert_eq!(*called, scene.teleport);
    assert_eq!(*receiver, Some(mover));
    assert_eq!(args.len(), 2);

    let key = MemberKey::result(mover, &desc);
    assert_eq!(ins.access_mut().results.get(&key).unwrap(), "<void>");
    assert!(ins.log().iter().any(|l| l.severity == Severity::Good));
}

#[test]
fn faults_are_contained_not_fatal() {
    let scene = build_scene();
    let mover = scene.mover;
    let mut ins = visible_inspector(scene.host);
    ins.tick(0);
    ins.select(scene.player);

    // A method that faults mid-invoke only produces a log line.
    let desc = MethodDesc::read(ins.host(), scene.teleport).unwrap();
    ins.host_mut().script_invoke(scene.teleport, InvokeBehavior::Fault);
    ins.access_mut()
        .drafts
        .insert(MemberKey::arg(mover, &desc, 0), "1.0".to_string());
    ins.access_mut()
        .drafts
        .insert(MemberKey::arg(mover, &desc, 1), "2.0".to_string());
    ins.invoke_method(mover, &desc);

    let key = MemberKey::result(mover, &desc);
    assert_eq!(
        ins.access_mut().results.get(&key).unwrap(),
        &AccessError::Invoke(InvokeError::Fault).to_string()
    );
    assert!(ins.log().iter().any(|l| l.severity == Severity::Error));

    // A field whose descriptor faults disappears from the rows but the
    // rest of the component still renders.
    ins.host_mut().fault(scene.target.raw());
    let rows = ins.field_rows(mover);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].desc.field, scene.speed);
}

#[test]
fn runtime_churn_between_scans() {
    let scene = build_scene();
    let player = scene.player;
    let camera = scene.camera;
    let mut ins = visible_inspector(scene.host);
    ins.tick(0);
    ins.select(camera);
    ins.jump_to_reference(player.as_ptr());
    assert_eq!(ins.selected(), Some(player));

    // The player dies between scans; the next scan clears the selection
    // and back-navigation lands on the still-alive camera.
    ins.host_mut().remove_instance(player);
    ins.force_refresh(5000);
    assert_eq!(ins.selected(), None);
    assert_eq!(ins.select_back(), Some(camera));
}

#[test]
fn scene_surface_and_toggles() {
    let scene = build_scene();
    let player = scene.player;
    let mut ins = visible_inspector(scene.host);
    ins.tick(0);
    assert_eq!(ins.scenes(), [1]);

    ins.select(player);
    ins.set_selected_active(false);
    assert!(!ins.host().instance_active(player).unwrap());

    // Deactivated instances drop out of the default scan.
    ins.force_refresh(5000);
    assert_eq!(ins.selected(), None);

    ins.config_mut().scan.include_inactive = true;
    ins.force_refresh(10_000);
    assert!(ins.cache().contains(player));

    ins.load_scene("Arena", LoadMode::Single);
    assert_eq!(
        ins.host().loaded.as_slice(),
        &[("Arena".to_string(), LoadMode::Single)]
    );
}

#[test]
fn hierarchy_filter_drives_visibility() {
    let scene = build_scene();
    let mut ins = visible_inspector(scene.host);
    ins.tick(0);

    ins.set_filter("cam");
    let world = ins.cache().roots()[0];
    assert!(ins.cache_mut().is_visible(world));
    assert!(ins.cache_mut().is_visible(scene.camera));
    assert!(!ins.cache_mut().is_visible(scene.player));
}

#[test]
fn unresolved_reference_is_reported() {
    let scene = build_scene();
    let mut ins = visible_inspector(scene.host);
    ins.tick(0);
    assert_eq!(ins.jump_to_reference(RawPtr(0xbad0)), None);
    assert!(ins.log().iter().any(|l| l.severity == Severity::Warn));
}
