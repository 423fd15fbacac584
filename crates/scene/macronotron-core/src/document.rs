//! Versioned JSON scene document.
//!
//! Export is a straight serde dump of [`SceneDocument`]. Import walks the JSON
//! section by section so that one bad entry never costs the rest of the file:
//! every valid piece is loaded and everything else is reported as a
//! [`DocumentIssue`] in the returned [`ImportReport`].
//!
//! Version 0 (no `version` key) is the older layout: root positions under
//! `pos` and variants under a per-puppet `_variants: {member: variant}` map.
//! Both are still read.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::data::{Keyframe, MemberState, ObjectState, PuppetState, SceneObject};
use crate::error::{BuildError, DocumentIssue, MalformedDocument};
use crate::hierarchy::Puppet;
use crate::scene::{PuppetPlacement, SceneModel, SceneSettings};

/// Version written by [`SceneModel::export_document`].
pub const DOCUMENT_VERSION: u32 = 1;

/// Key of the legacy per-puppet variant map inside keyframes.
const LEGACY_VARIANTS_KEY: &str = "_variants";

/// Serialized form of a [`SceneModel`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub settings: SceneSettings,
    #[serde(default)]
    pub puppets: Vec<String>,
    #[serde(default)]
    pub puppets_data: IndexMap<String, PuppetPlacement>,
    #[serde(default)]
    pub objects: IndexMap<String, SceneObject>,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

/// Rebuilds a puppet skeleton from its name and asset path during import.
pub trait PuppetLoader {
    fn load(&mut self, name: &str, path: &str) -> Result<Puppet, BuildError>;
}

impl<F> PuppetLoader for F
where
    F: FnMut(&str, &str) -> Result<Puppet, BuildError>,
{
    fn load(&mut self, name: &str, path: &str) -> Result<Puppet, BuildError> {
        self(name, path)
    }
}

/// Outcome of an import: what was loaded and what was dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
    /// Version the document declared (0 when absent).
    pub version: u32,
    pub puppets: usize,
    pub objects: usize,
    pub keyframes: usize,
    pub issues: Vec<DocumentIssue>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Err` carrying every issue when anything was dropped.
    pub fn into_result(self) -> Result<ImportReport, MalformedDocument> {
        if self.issues.is_empty() {
            Ok(self)
        } else {
            Err(MalformedDocument {
                issues: self.issues,
            })
        }
    }

    fn issue(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let issue = DocumentIssue::new(path, message);
        warn!("scene import: {issue}");
        self.issues.push(issue);
    }
}

impl SceneModel {
    /// Snapshot of the whole scene, keyframes in ascending order.
    pub fn export_document(&self) -> SceneDocument {
        SceneDocument {
            version: DOCUMENT_VERSION,
            settings: self.settings.clone(),
            puppets: self.puppets.keys().cloned().collect(),
            puppets_data: self
                .puppets
                .iter()
                .map(|(name, entry)| (name.clone(), entry.placement.clone()))
                .collect(),
            objects: self.objects.clone(),
            keyframes: self.keyframes.values().cloned().collect(),
        }
    }

    /// Pretty-printed JSON of [`SceneModel::export_document`].
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export_document())
    }

    /// Parse `text` and import it. Fails, leaving the scene untouched, only
    /// when `text` is not JSON at all.
    pub fn import_json(
        &mut self,
        text: &str,
        loader: &mut dyn PuppetLoader,
    ) -> Result<ImportReport, MalformedDocument> {
        let doc: JsonValue = serde_json::from_str(text).map_err(|e| MalformedDocument {
            issues: vec![DocumentIssue::new("", format!("invalid JSON: {e}"))],
        })?;
        Ok(self.import_document(&doc, loader))
    }

    /// Replace the scene with the content of `doc`, loading every valid piece.
    ///
    /// A document that is not a JSON object leaves the scene untouched.
    pub fn import_document(
        &mut self,
        doc: &JsonValue,
        loader: &mut dyn PuppetLoader,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        let Some(root) = doc.as_object() else {
            report.issue("", "expected a JSON object");
            return report;
        };

        let version = read_version(root, &mut report);
        report.version = version;
        let mut model = SceneModel::with_settings(read_settings(root, &mut report))
            .unwrap_or_default();

        import_puppets(&mut model, root, loader, &mut report);
        import_objects(&mut model, root, &mut report);
        import_keyframes(&mut model, root, &mut report);

        report.puppets = model.puppets.len();
        report.objects = model.objects.len();
        report.keyframes = model.keyframes.len();
        debug!(
            "imported scene v{}: {} puppet(s), {} object(s), {} keyframe(s), {} issue(s)",
            report.version,
            report.puppets,
            report.objects,
            report.keyframes,
            report.issues.len()
        );
        *self = model;
        report
    }
}

fn read_version(root: &Map<String, JsonValue>, report: &mut ImportReport) -> u32 {
    let version = match root.get("version") {
        None => 0,
        Some(v) => match v.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => n,
            None => {
                report.issue("version", format!("expected a non-negative integer, got {v}"));
                DOCUMENT_VERSION
            }
        },
    };
    if version > DOCUMENT_VERSION {
        report.issue(
            "version",
            format!("document version {version} is newer than {DOCUMENT_VERSION}; loaded best-effort"),
        );
    }
    version
}

fn read_settings(root: &Map<String, JsonValue>, report: &mut ImportReport) -> SceneSettings {
    let Some(raw) = root.get("settings") else {
        return SceneSettings::default();
    };
    let settings = match SceneSettings::deserialize(raw) {
        Ok(s) => s,
        Err(e) => {
            report.issue("settings", e.to_string());
            return SceneSettings::default();
        }
    };
    match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            report.issue("settings", e.to_string());
            SceneSettings::default()
        }
    }
}

fn import_puppets(
    model: &mut SceneModel,
    root: &Map<String, JsonValue>,
    loader: &mut dyn PuppetLoader,
    report: &mut ImportReport,
) {
    let empty = Map::new();
    let data = match root.get("puppets_data") {
        None => &empty,
        Some(JsonValue::Object(m)) => m,
        Some(_) => {
            report.issue("puppets_data", "expected an object");
            &empty
        }
    };

    let mut names: Vec<String> = Vec::new();
    match root.get("puppets") {
        None => {}
        Some(JsonValue::Array(list)) => {
            for (i, v) in list.iter().enumerate() {
                match v.as_str() {
                    Some(name) => names.push(name.to_string()),
                    None => report.issue(format!("puppets[{i}]"), "expected a puppet name"),
                }
            }
        }
        Some(_) => report.issue("puppets", "expected an array of names"),
    }
    for name in data.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    for name in names {
        let path = format!("puppets_data.{name}");
        let placement = match data.get(&name) {
            None => PuppetPlacement::default(),
            Some(raw) => match PuppetPlacement::deserialize(raw) {
                Ok(p) => p,
                Err(e) => {
                    report.issue(&path, e.to_string());
                    continue;
                }
            },
        };
        let puppet = match loader.load(&name, &placement.path) {
            Ok(p) => p,
            Err(e) => {
                report.issue(&path, format!("cannot rebuild puppet: {e}"));
                continue;
            }
        };
        if let Err(e) = model.add_puppet(&name, puppet, placement) {
            report.issue(&path, e.to_string());
        }
    }
}

fn import_objects(model: &mut SceneModel, root: &Map<String, JsonValue>, report: &mut ImportReport) {
    let objects = match root.get("objects") {
        None => return,
        Some(JsonValue::Object(m)) => m,
        Some(_) => {
            report.issue("objects", "expected an object");
            return;
        }
    };
    for (name, raw) in objects {
        let path = format!("objects.{name}");
        let mut obj = match SceneObject::deserialize(raw) {
            Ok(o) => o,
            Err(e) => {
                report.issue(&path, e.to_string());
                continue;
            }
        };
        obj.name = name.clone();
        if let Err(e) = model.add_object(obj) {
            report.issue(&path, e.to_string());
        }
    }
}

fn import_keyframes(model: &mut SceneModel, root: &Map<String, JsonValue>, report: &mut ImportReport) {
    let list = match root.get("keyframes") {
        None => return,
        Some(JsonValue::Array(list)) => list,
        Some(_) => {
            report.issue("keyframes", "expected an array");
            return;
        }
    };

    for (i, raw) in list.iter().enumerate() {
        let path = format!("keyframes[{i}]");
        let Some(entry) = raw.as_object() else {
            report.issue(&path, "expected an object");
            continue;
        };
        let Some(index) = entry
            .get("index")
            .and_then(JsonValue::as_u64)
            .and_then(|n| u32::try_from(n).ok())
        else {
            report.issue(format!("{path}.index"), "expected a non-negative frame index");
            continue;
        };
        if model.keyframes.contains_key(&index) {
            report.issue(format!("{path}.index"), format!("duplicate keyframe index {index}"));
            continue;
        }
        if !model.settings.frame_range().contains(&index) {
            debug!("keyframe {index} lies outside the playback range; kept");
        }

        let mut kf = Keyframe::new(index);
        read_keyframe_objects(model, entry, &path, &mut kf, report);
        read_keyframe_puppets(model, entry, &path, &mut kf, report);
        model.keyframes.insert(index, kf);
    }
}

fn read_keyframe_objects(
    model: &SceneModel,
    entry: &Map<String, JsonValue>,
    path: &str,
    kf: &mut Keyframe,
    report: &mut ImportReport,
) {
    let objects = match entry.get("objects") {
        None => return,
        Some(JsonValue::Object(m)) => m,
        Some(_) => {
            report.issue(format!("{path}.objects"), "expected an object");
            return;
        }
    };
    for (name, raw) in objects {
        let at = format!("{path}.objects.{name}");
        if !model.objects.contains_key(name) {
            report.issue(&at, "unknown object; dropped");
            continue;
        }
        let state = match ObjectState::deserialize(raw) {
            Ok(s) => s,
            Err(e) => {
                report.issue(&at, e.to_string());
                continue;
            }
        };
        if !(state.scale.is_finite() && state.scale >= 0.0) {
            report.issue(&at, format!("invalid scale {}; dropped", state.scale));
            continue;
        }
        if let Some(att) = &state.attached_to {
            if let Err(e) = model.check_attachment(att) {
                report.issue(&at, format!("{e}; dropped"));
                continue;
            }
        }
        kf.objects.insert(name.clone(), state);
    }
}

fn read_keyframe_puppets(
    model: &SceneModel,
    entry: &Map<String, JsonValue>,
    path: &str,
    kf: &mut Keyframe,
    report: &mut ImportReport,
) {
    let puppets = match entry.get("puppets") {
        None => return,
        Some(JsonValue::Object(m)) => m,
        Some(_) => {
            report.issue(format!("{path}.puppets"), "expected an object");
            return;
        }
    };
    for (puppet_name, raw) in puppets {
        let at = format!("{path}.puppets.{puppet_name}");
        let Some(puppet_entry) = model.puppets.get(puppet_name) else {
            report.issue(&at, "unknown puppet; dropped");
            continue;
        };
        let Some(members) = raw.as_object() else {
            report.issue(&at, "expected an object");
            continue;
        };

        let mut states = PuppetState::new();
        for (member_name, raw_state) in members {
            if member_name.starts_with('_') {
                continue;
            }
            let member_at = format!("{at}.{member_name}");
            if !puppet_entry.puppet.contains(member_name) {
                report.issue(&member_at, "unknown member; dropped");
                continue;
            }
            match MemberState::deserialize(raw_state) {
                Ok(st) => {
                    states.insert(member_name.clone(), st);
                }
                Err(e) => report.issue(&member_at, e.to_string()),
            }
        }

        if let Some(legacy) = members.get(LEGACY_VARIANTS_KEY).and_then(JsonValue::as_object) {
            for (member_name, variant) in legacy {
                let Some(variant) = variant.as_str() else {
                    report.issue(
                        format!("{at}.{LEGACY_VARIANTS_KEY}.{member_name}"),
                        "expected a variant name",
                    );
                    continue;
                };
                if !puppet_entry.puppet.contains(member_name) {
                    report.issue(
                        format!("{at}.{LEGACY_VARIANTS_KEY}.{member_name}"),
                        "unknown member; dropped",
                    );
                    continue;
                }
                let st = states.entry(member_name.clone()).or_default();
                if st.variant.is_none() {
                    st.variant = Some(variant.to_string());
                }
            }
        }

        if !states.is_empty() {
            kf.puppets.insert(puppet_name.clone(), states);
        }
    }
}
