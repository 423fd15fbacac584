//! Static puppet skeleton built from an asset description and a rig.
//!
//! Members live in an arena owned by [`Puppet`]. Children are forward links
//! (`Vec<MemberId>`), the parent is a plain index back into the same arena, so
//! ownership never cycles. The tree is immutable once built; per-frame state
//! lives in keyframes.

use hashbrown::{HashMap, HashSet};
use log::debug;

use crate::asset::AssetProvider;
use crate::config::RigConfig;
use crate::error::{BuildError, BuildIssue};
use crate::geometry::{Rect, Vec2};
use crate::ids::MemberId;

/// A named rigid part of a puppet.
#[derive(Clone, Debug, PartialEq)]
pub struct PuppetMember {
    pub name: String,
    pub parent: Option<MemberId>,
    pub children: Vec<MemberId>,
    /// Rotation centre in asset coordinates.
    pub pivot: Vec2,
    pub bbox: Rect,
    pub rank: i32,
    /// `pivot - parent.pivot`; zero for roots.
    pub rest_offset: Vec2,
    /// Alternate visual groups for the variant channel, default first.
    pub variants: Vec<String>,
}

impl PuppetMember {
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Variant shown when no keyframe selected one.
    pub fn default_variant(&self) -> Option<&str> {
        self.variants.first().map(String::as_str)
    }
}

/// Immutable skeleton of one puppet.
#[derive(Clone, Debug, PartialEq)]
pub struct Puppet {
    members: Vec<PuppetMember>,
    by_name: HashMap<String, MemberId>,
    roots: Vec<MemberId>,
    /// Roots in order, each followed by its subtree in child link order.
    pre_order: Vec<MemberId>,
    handles: HashMap<MemberId, MemberId>,
}

impl Puppet {
    /// Build a puppet from the groups `assets` exposes and the rig description.
    ///
    /// Only names present in both are materialized. Fails with every offending
    /// member listed when a parent is missing, a pivot or variant group is unknown,
    /// or the parent links cycle.
    pub fn build(assets: &dyn AssetProvider, rig: &RigConfig) -> Result<Puppet, BuildError> {
        let groups = assets.list_groups();
        let known: HashSet<&str> = groups.iter().map(String::as_str).collect();

        let mut members: Vec<PuppetMember> = Vec::new();
        let mut by_name: HashMap<String, MemberId> = HashMap::new();
        let mut issues: Vec<BuildIssue> = Vec::new();

        let mut listed: HashSet<&str> = HashSet::new();
        let mut reported: HashSet<&str> = HashSet::new();
        for spec in &rig.members {
            if !listed.insert(spec.name.as_str()) && reported.insert(spec.name.as_str()) {
                issues.push(BuildIssue::DuplicateMember {
                    member: spec.name.clone(),
                });
            }
        }

        for group in &groups {
            let Some(spec) = rig.get(group) else {
                debug!("asset group '{group}' has no rig entry; ignored");
                continue;
            };
            if by_name.contains_key(group.as_str()) {
                continue;
            }
            let pivot_ref = spec.pivot_ref();
            if !known.contains(pivot_ref) {
                issues.push(BuildIssue::UnknownPivot {
                    member: spec.name.clone(),
                    pivot: pivot_ref.to_string(),
                });
            }
            for v in &spec.variants {
                if !known.contains(v.as_str()) {
                    issues.push(BuildIssue::UnknownVariant {
                        member: spec.name.clone(),
                        variant: v.clone(),
                    });
                }
            }
            let id = MemberId::from_index(members.len());
            by_name.insert(spec.name.clone(), id);
            members.push(PuppetMember {
                name: spec.name.clone(),
                parent: None,
                children: Vec::new(),
                pivot: assets.pivot(pivot_ref),
                bbox: assets.bounding_box(group).unwrap_or_default(),
                rank: spec.rank,
                rest_offset: Vec2::ZERO,
                variants: spec.variants.clone(),
            });
        }

        for spec in &rig.members {
            if !by_name.contains_key(spec.name.as_str()) {
                debug!("rig member '{}' has no asset group; ignored", spec.name);
            }
        }

        // Resolve parent links in rig order so child order follows the rig.
        let mut parent_of: Vec<Option<MemberId>> = vec![None; members.len()];
        let mut link_order: Vec<MemberId> = Vec::new();
        let mut linked: HashSet<MemberId> = HashSet::new();
        for spec in &rig.members {
            let Some(&child) = by_name.get(spec.name.as_str()) else {
                continue;
            };
            // Only the first entry of a duplicated name counts.
            if !linked.insert(child) {
                continue;
            }
            let Some(parent_name) = spec.parent.as_deref() else {
                continue;
            };
            match by_name.get(parent_name) {
                Some(&parent) => {
                    parent_of[child.index()] = Some(parent);
                    link_order.push(child);
                }
                None => issues.push(BuildIssue::MissingParent {
                    member: spec.name.clone(),
                    parent: parent_name.to_string(),
                }),
            }
        }

        issues.extend(find_cycles(&parent_of, &members));

        if !issues.is_empty() {
            issues.sort_by_key(|i| first_member_rank(i, &by_name));
            return Err(BuildError { issues });
        }

        for child in link_order {
            if let Some(parent) = parent_of[child.index()] {
                let offset = members[child.index()]
                    .pivot
                    .sub(members[parent.index()].pivot);
                let m = &mut members[child.index()];
                m.parent = Some(parent);
                m.rest_offset = offset;
                members[parent.index()].children.push(child);
            }
        }

        let roots: Vec<MemberId> = (0..members.len())
            .map(MemberId::from_index)
            .filter(|id| members[id.index()].parent.is_none())
            .collect();

        let mut pre_order = Vec::with_capacity(members.len());
        let mut stack: Vec<MemberId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            pre_order.push(id);
            stack.extend(members[id.index()].children.iter().rev().copied());
        }

        let mut handles = HashMap::new();
        for (from, to) in &rig.handles {
            match (by_name.get(from.as_str()), by_name.get(to.as_str())) {
                (Some(&a), Some(&b)) => {
                    handles.insert(a, b);
                }
                _ => debug!("handle exception '{from}' -> '{to}' names an unknown member; ignored"),
            }
        }

        Ok(Puppet {
            members,
            by_name,
            roots,
            pre_order,
            handles,
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<MemberId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: MemberId) -> Option<&PuppetMember> {
        self.members.get(id.index())
    }

    pub fn member(&self, name: &str) -> Option<&PuppetMember> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Members in first-seen order.
    pub fn members(&self) -> impl Iterator<Item = &PuppetMember> {
        self.members.iter()
    }

    /// Members without a parent, in first-seen order.
    pub fn root_members(&self) -> Vec<&PuppetMember> {
        self.roots.iter().map(|id| &self.members[id.index()]).collect()
    }

    /// Root-to-leaf walk: parents always precede their children.
    pub fn pre_order(&self) -> &[MemberId] {
        &self.pre_order
    }

    pub fn parent_of(&self, name: &str) -> Option<&PuppetMember> {
        self.member(name)
            .and_then(|m| m.parent)
            .and_then(|p| self.get(p))
    }

    /// Pivot of the first linked child of `name`, `None` when childless or unknown.
    pub fn first_child_pivot(&self, name: &str) -> Option<Vec2> {
        let m = self.member(name)?;
        let first = *m.children.first()?;
        Some(self.members[first.index()].pivot)
    }

    /// Where the rotation handle for `name` points: a configured exception, else
    /// the first child's pivot.
    pub fn handle_target_pivot(&self, name: &str) -> Option<Vec2> {
        let id = self.id_of(name)?;
        if let Some(target) = self.handles.get(&id) {
            return Some(self.members[target.index()].pivot);
        }
        self.first_child_pivot(name)
    }

    /// Indented outline of the hierarchy, one member per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for &id in &self.pre_order {
            let mut depth = 0;
            let mut cur = self.members[id.index()].parent;
            while let Some(p) = cur {
                depth += 1;
                cur = self.members[p.index()].parent;
            }
            let m = &self.members[id.index()];
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format!(
                "- {} (pivot=({}, {}) rank={})\n",
                m.name, m.pivot.x, m.pivot.y, m.rank
            ));
        }
        out
    }
}

/// Members sitting on a parent cycle, grouped per cycle.
fn find_cycles(parent_of: &[Option<MemberId>], members: &[PuppetMember]) -> Vec<BuildIssue> {
    let n = parent_of.len();
    let mut on_cycle = vec![false; n];
    for start in 0..n {
        let mut cur = parent_of[start];
        let mut steps = 0;
        while let Some(p) = cur {
            if p.index() == start {
                on_cycle[start] = true;
                break;
            }
            steps += 1;
            if steps > n {
                break;
            }
            cur = parent_of[p.index()];
        }
    }

    let mut seen = vec![false; n];
    let mut out = Vec::new();
    for start in 0..n {
        if !on_cycle[start] || seen[start] {
            continue;
        }
        let mut cycle = vec![start];
        seen[start] = true;
        let mut cur = parent_of[start];
        while let Some(p) = cur {
            if p.index() == start {
                break;
            }
            seen[p.index()] = true;
            cycle.push(p.index());
            cur = parent_of[p.index()];
        }
        cycle.sort_unstable();
        out.push(BuildIssue::Cycle {
            members: cycle.into_iter().map(|i| members[i].name.clone()).collect(),
        });
    }
    out
}

fn first_member_rank(issue: &BuildIssue, by_name: &HashMap<String, MemberId>) -> usize {
    let name = match issue {
        BuildIssue::MissingParent { member, .. }
        | BuildIssue::UnknownPivot { member, .. }
        | BuildIssue::UnknownVariant { member, .. }
        | BuildIssue::DuplicateMember { member } => Some(member.as_str()),
        BuildIssue::Cycle { members } => members.first().map(String::as_str),
        BuildIssue::AssetUnavailable { .. } => None,
    };
    name.and_then(|n| by_name.get(n))
        .map(|id| id.index())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::StaticAssets;
    use crate::config::MemberSpec;

    fn chain_assets() -> StaticAssets {
        StaticAssets::new()
            .with_group("torse", Rect::new(0.0, 10.0, 20.0, 30.0))
            .with_group("cou", Rect::new(8.0, 4.0, 12.0, 10.0))
            .with_group("tete", Rect::new(5.0, -10.0, 15.0, 4.0))
            .with_group("chapeau", Rect::new(0.0, 0.0, 1.0, 1.0))
    }

    fn chain_rig() -> RigConfig {
        RigConfig::new(vec![
            MemberSpec::new("torse", None),
            MemberSpec::new("cou", Some("torse")),
            MemberSpec::new("tete", Some("cou")).with_pivot("cou").with_rank(1),
        ])
    }

    #[test]
    fn builds_chain_with_rest_offsets() {
        let p = Puppet::build(&chain_assets(), &chain_rig()).unwrap();
        assert_eq!(p.len(), 3);
        assert!(!p.contains("chapeau"));
        let cou = p.member("cou").unwrap();
        assert_eq!(cou.pivot, Vec2::new(10.0, 7.0));
        assert_eq!(cou.rest_offset, Vec2::new(0.0, -13.0));
        let tete = p.member("tete").unwrap();
        assert_eq!(tete.pivot, cou.pivot);
        assert_eq!(tete.rest_offset, Vec2::ZERO);
        assert_eq!(p.parent_of("tete").unwrap().name, "cou");
        let names: Vec<&str> = p
            .pre_order()
            .iter()
            .map(|id| p.get(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["torse", "cou", "tete"]);
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let rig = RigConfig::new(vec![
            MemberSpec::new("torse", Some("torse")),
            MemberSpec::new("cou", Some("torse")),
        ]);
        let err = Puppet::build(&chain_assets(), &rig).unwrap_err();
        assert_eq!(
            err.issues,
            vec![BuildIssue::Cycle {
                members: vec!["torse".into()]
            }]
        );
    }

    #[test]
    fn handle_exception_overrides_first_child() {
        let rig = chain_rig().with_handle("torse", "tete");
        let p = Puppet::build(&chain_assets(), &rig).unwrap();
        assert_eq!(p.first_child_pivot("torse"), Some(Vec2::new(10.0, 7.0)));
        assert_eq!(p.handle_target_pivot("torse"), p.member("tete").map(|m| m.pivot));
        assert_eq!(p.handle_target_pivot("tete"), None);
    }

    #[test]
    fn duplicate_rig_entry_is_reported_once() {
        let rig = RigConfig::new(vec![
            MemberSpec::new("torse", None),
            MemberSpec::new("cou", Some("torse")),
            MemberSpec::new("tete", Some("torse")),
            MemberSpec::new("tete", Some("cou")),
            MemberSpec::new("tete", None),
        ]);
        let err = Puppet::build(&chain_assets(), &rig).unwrap_err();
        assert_eq!(
            err.issues,
            vec![BuildIssue::DuplicateMember {
                member: "tete".into()
            }]
        );
        assert_eq!(err.members(), vec!["tete"]);
    }

    #[test]
    fn outline_indents_by_depth() {
        let p = Puppet::build(&chain_assets(), &chain_rig()).unwrap();
        let text = p.outline();
        assert!(text.starts_with("- torse"));
        assert!(text.contains("\n    - tete"));
    }
}
