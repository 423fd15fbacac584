#![allow(dead_code)]

use macronotron_core::{
    BuildError, MemberSpec, ObjectKind, Puppet, PuppetPlacement, Rect, RigConfig, SceneModel,
    SceneObject, StaticAssets, Transform2,
};

pub fn biped_assets() -> StaticAssets {
    macronotron_test_fixtures::assets::load("biped").expect("biped assets fixture")
}

pub fn biped_rig() -> RigConfig {
    macronotron_test_fixtures::rigs::load("biped").expect("biped rig fixture")
}

pub fn biped() -> Puppet {
    Puppet::build(&biped_assets(), &biped_rig()).expect("biped builds")
}

/// Loader used when importing scene fixtures: every puppet is a biped whose
/// asset geometry lives at `path` under `fixtures/`.
pub fn fixture_loader(_name: &str, path: &str) -> Result<Puppet, BuildError> {
    let assets: StaticAssets = macronotron_test_fixtures::load_relative(path)
        .map_err(|_| BuildError::asset_unavailable(path))?;
    Puppet::build(&assets, &biped_rig())
}

pub fn load_scene(name: &str) -> SceneModel {
    let text = macronotron_test_fixtures::scenes::json(name).expect("scene fixture");
    let mut model = SceneModel::new();
    model
        .import_json(&text, &mut fixture_loader)
        .expect("scene fixture is JSON");
    model
}

/// Three-segment arm along +x: torse (0,0) -> bras (20,0) -> main (35,0).
pub fn stick() -> Puppet {
    let assets = StaticAssets::new()
        .with_group("torse", Rect::new(-10.0, -10.0, 10.0, 10.0))
        .with_group("bras", Rect::new(10.0, -2.0, 30.0, 2.0))
        .with_group("main", Rect::new(30.0, -2.0, 40.0, 2.0));
    let rig = RigConfig::new(vec![
        MemberSpec::new("torse", None),
        MemberSpec::new("bras", Some("torse")).with_rank(2),
        MemberSpec::new("main", Some("bras")).with_rank(3),
    ]);
    Puppet::build(&assets, &rig).expect("stick builds")
}

pub fn stick_scene(placement: PuppetPlacement) -> SceneModel {
    let mut model = SceneModel::new();
    model.add_puppet("p", stick(), placement).unwrap();
    model
}

pub fn free_object(name: &str, x: f64, y: f64) -> SceneObject {
    SceneObject::new(name, ObjectKind::Image, &format!("{name}.png")).at(x, y)
}

pub fn approx(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

pub fn same_transform(a: &Transform2, b: &Transform2) -> bool {
    approx(a.position.x, b.position.x, 1e-9)
        && approx(a.position.y, b.position.y, 1e-9)
        && approx(a.rotation, b.rotation, 1e-9)
        && approx(a.scale, b.scale, 1e-9)
}
