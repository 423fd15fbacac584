mod common;

use common::{biped, biped_assets};
use macronotron_core::{BuildIssue, MemberSpec, Puppet, Rect, RigConfig, StaticAssets, Vec2};

fn abc_assets() -> StaticAssets {
    StaticAssets::new()
        .with_group("a", Rect::new(0.0, 0.0, 2.0, 2.0))
        .with_group("b", Rect::new(2.0, 0.0, 4.0, 2.0))
        .with_group("c", Rect::new(4.0, 0.0, 6.0, 2.0))
}

#[test]
fn biped_fixture_builds_a_single_tree() {
    let p = biped();
    assert_eq!(p.len(), 27);
    let roots: Vec<&str> = p.root_members().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(roots, ["torse"]);
    assert!(!p.contains("calque_fond"));
    assert!(!p.contains("main_droite_poing"));

    // tete rotates around the neck.
    assert_eq!(p.member("tete").unwrap().pivot, p.member("cou").unwrap().pivot);
    assert_eq!(p.member("tete").unwrap().rest_offset, Vec2::ZERO);
    assert_eq!(p.member("avant_bras_droite").unwrap().rank, 3);

    let first = p.get(p.pre_order()[0]).unwrap();
    assert_eq!(first.name, "torse");
    for &id in p.pre_order() {
        if let Some(parent) = p.get(id).unwrap().parent {
            let pos_parent = p.pre_order().iter().position(|x| *x == parent).unwrap();
            let pos_child = p.pre_order().iter().position(|x| *x == id).unwrap();
            assert!(pos_parent < pos_child);
        }
    }
}

#[test]
fn first_child_pivot_follows_rig_order() {
    let p = biped();
    // tibia_gauche hangs off cuisse_gauche, so genou_gauche is a leaf.
    assert_eq!(p.first_child_pivot("genou_gauche"), None);
    assert_eq!(
        p.first_child_pivot("cuisse_gauche"),
        Some(p.member("genou_gauche").unwrap().pivot)
    );
    assert_eq!(p.first_child_pivot("nope"), None);
}

#[test]
fn variants_come_from_the_rig() {
    let p = biped();
    let main = p.member("main_droite").unwrap();
    assert_eq!(main.variants, ["main_droite_ouverte", "main_droite_poing"]);
    assert_eq!(main.default_variant(), Some("main_droite_ouverte"));
    assert_eq!(p.member("main_gauche").unwrap().default_variant(), None);
}

#[test]
fn two_cycle_names_both_members() {
    let rig = RigConfig::new(vec![
        MemberSpec::new("a", Some("b")),
        MemberSpec::new("b", Some("a")),
        MemberSpec::new("c", None),
    ]);
    let err = Puppet::build(&abc_assets(), &rig).unwrap_err();
    assert_eq!(
        err.issues,
        vec![BuildIssue::Cycle {
            members: vec!["a".into(), "b".into()]
        }]
    );
    assert_eq!(err.members(), ["a", "b"]);
}

#[test]
fn every_offending_member_is_reported() {
    let rig = RigConfig::new(vec![
        MemberSpec::new("a", None).with_pivot("missing_pivot"),
        MemberSpec::new("b", Some("ghost")),
        MemberSpec::new("c", Some("a")).with_variants(&["c", "c_alt"]),
    ]);
    let err = Puppet::build(&abc_assets(), &rig).unwrap_err();
    assert_eq!(
        err.issues,
        vec![
            BuildIssue::UnknownPivot {
                member: "a".into(),
                pivot: "missing_pivot".into()
            },
            BuildIssue::MissingParent {
                member: "b".into(),
                parent: "ghost".into()
            },
            BuildIssue::UnknownVariant {
                member: "c".into(),
                variant: "c_alt".into()
            },
        ]
    );
    assert_eq!(err.members(), ["a", "b", "c"]);
    assert!(err.to_string().contains("unknown parent 'ghost'"));
}

#[test]
fn parent_without_asset_group_is_missing() {
    // The rig knows "hidden" but the asset does not, so "b" has no parent to link to.
    let rig = RigConfig::new(vec![
        MemberSpec::new("hidden", None),
        MemberSpec::new("b", Some("hidden")),
    ]);
    let err = Puppet::build(&abc_assets(), &rig).unwrap_err();
    assert_eq!(err.members(), ["b"]);
}

#[test]
fn groups_and_rig_entries_without_counterpart_are_ignored() {
    let rig = RigConfig::from_maps(&[("c", None), ("a", Some("c")), ("zz", Some("c"))], &[], &[]);
    let p = Puppet::build(&abc_assets(), &rig).unwrap();
    assert_eq!(p.len(), 2);
    assert!(!p.contains("b"));
    // First-seen order is asset order, not rig order.
    let names: Vec<&str> = p.members().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["a", "c"]);
    assert_eq!(p.parent_of("a").unwrap().name, "c");
    assert_eq!(p.member("a").unwrap().rest_offset, Vec2::new(-4.0, 0.0));
}

#[test]
fn fixture_geometry_is_serde_loadable() {
    let assets = biped_assets();
    assert_eq!(
        assets.groups.get("tete").copied(),
        Some(Rect::new(88.0, 20.0, 112.0, 55.0))
    );
}
