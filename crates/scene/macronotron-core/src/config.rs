//! Rig configuration: the validated description a puppet hierarchy is built from.

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One skeletal member of a rig.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    /// Parent member name, `None` for roots.
    #[serde(default)]
    pub parent: Option<String>,
    /// Group whose box centre is this member's pivot. Defaults to the member itself.
    #[serde(default)]
    pub pivot: Option<String>,
    /// Stacking rank relative to the puppet.
    #[serde(default)]
    pub rank: i32,
    /// Alternate visual sub-elements selectable through the variant channel.
    /// The first entry is the default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl MemberSpec {
    pub fn new(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            pivot: None,
            rank: 0,
            variants: Vec::new(),
        }
    }

    pub fn with_pivot(mut self, pivot: &str) -> Self {
        self.pivot = Some(pivot.to_string());
        self
    }

    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_variants(mut self, variants: &[&str]) -> Self {
        self.variants = variants.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Name of the group the pivot is read from.
    pub fn pivot_ref(&self) -> &str {
        self.pivot.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered member list plus rotation-handle exceptions.
///
/// Member order is the child link order used when building the tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    pub members: Vec<MemberSpec>,
    /// `member → member` whose pivot is used as the rotation handle target
    /// instead of the first child.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub handles: IndexMap<String, String>,
}

impl RigConfig {
    pub fn new(members: Vec<MemberSpec>) -> Self {
        Self {
            members,
            handles: IndexMap::new(),
        }
    }

    /// Assemble a rig from the loose maps older puppet descriptions use:
    /// `parent_map` (ordered), `pivot_map` (defaults to self) and `rank_map` (defaults to 0).
    pub fn from_maps(
        parent_map: &[(&str, Option<&str>)],
        pivot_map: &[(&str, &str)],
        rank_map: &[(&str, i32)],
    ) -> Self {
        let pivots: HashMap<&str, &str> = pivot_map.iter().copied().collect();
        let ranks: HashMap<&str, i32> = rank_map.iter().copied().collect();
        let members = parent_map
            .iter()
            .map(|(name, parent)| MemberSpec {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                pivot: pivots.get(name).map(|p| p.to_string()),
                rank: ranks.get(name).copied().unwrap_or(0),
                variants: Vec::new(),
            })
            .collect();
        Self::new(members)
    }

    pub fn with_handle(mut self, member: &str, target: &str) -> Self {
        self.handles.insert(member.to_string(), target.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&MemberSpec> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
