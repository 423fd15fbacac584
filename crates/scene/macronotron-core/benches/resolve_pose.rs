//! Pose resolution throughput on the walk fixture.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use macronotron_core::{
    resolve_pose, BuildError, Puppet, PuppetPlacement, RigConfig, SceneModel, StaticAssets,
};

fn rig() -> RigConfig {
    macronotron_test_fixtures::rigs::load("biped").expect("biped rig fixture")
}

fn loader(_name: &str, path: &str) -> Result<Puppet, BuildError> {
    let assets: StaticAssets = macronotron_test_fixtures::load_relative(path)
        .map_err(|_| BuildError::asset_unavailable(path))?;
    Puppet::build(&assets, &rig())
}

fn walk_scene() -> SceneModel {
    let text = macronotron_test_fixtures::scenes::json("walk").expect("walk fixture");
    let mut model = SceneModel::new();
    model
        .import_json(&text, &mut loader)
        .expect("walk fixture is JSON");
    model
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_pose");

    let base = walk_scene();
    for extra in [0usize, 4, 16] {
        let mut model = base.clone();
        let assets: StaticAssets = macronotron_test_fixtures::assets::load("biped").expect("assets");
        for i in 0..extra {
            let puppet = Puppet::build(&assets, &rig()).expect("biped builds");
            let placement = PuppetPlacement::default().at(100.0 * i as f64, 400.0);
            model
                .add_puppet(&format!("figurant_{i}"), puppet, placement)
                .expect("unique name");
            model
                .set_member_rotation(&format!("figurant_{i}"), "torse", 48, 90.0)
                .expect("member exists");
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} puppet(s)", extra + 1)),
            &model,
            |b, model| {
                b.iter(|| {
                    for frame in (0..=48).step_by(6) {
                        black_box(resolve_pose(model, black_box(frame)));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
