/*!
 * Core IR types for JPE projects.
 *
 * These types are plain serde-serializable data. Invariants (non-empty ids,
 * unique names across kinds, soft references) are checked by the validator,
 * not enforced at construction, so a partially broken project can still be
 * represented and reported on in full.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::value::ParamValue;

/// Locale assigned to strings that do not declare one
pub const DEFAULT_LOCALE: &str = "en_US";

/// Identifier of a tuning resource.
///
/// `name` is the project-wide unique key; the remaining fields map to the
/// `m`, `c` and `s` attributes of the generated tuning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourceId {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u64>,
}

impl ResourceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the name is blank
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

impl From<&str> for ResourceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Project-level metadata, one per project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            project_id: String::new(),
            version: default_version(),
            author: None,
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A role taking part in an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionParticipant {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A social or object interaction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Interaction {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    #[serde(default)]
    pub participants: Vec<InteractionParticipant>,
    #[serde(default)]
    pub tests: Vec<TestSet>,
    #[serde(default)]
    pub loot_actions: Vec<LootAction>,
    #[serde(default)]
    pub autonomy_disabled: bool,
}

/// A timed or permanent buff
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Buff {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    /// Soft references to traits
    #[serde(default)]
    pub traits: Vec<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sim_minutes: Option<f64>,
}

/// A character trait
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trait {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    /// Soft references to buffs
    #[serde(default)]
    pub buffs: Vec<ResourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumOption {
    pub name: String,
    pub value: i64,
}

/// A tuning enum
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub id: ResourceId,
    #[serde(default)]
    pub options: Vec<EnumOption>,
}

impl EnumDefinition {
    /// Value the next implicitly numbered option receives; `None` when it would overflow
    pub fn next_value(&self) -> Option<i64> {
        let mut next: Option<i64> = None;
        for option in &self.options {
            let candidate = option.value.checked_add(1)?;
            next = Some(next.map_or(candidate, |n| n.max(candidate)));
        }
        Some(next.unwrap_or(0))
    }
}

/// How the conditions of a test set combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestLogic {
    /// Every condition must pass
    #[default]
    All,
    /// At least one condition must pass
    Any,
}

impl TestLogic {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "and" => Some(TestLogic::All),
            "any" | "or" => Some(TestLogic::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestLogic::All => "all",
            TestLogic::Any => "any",
        }
    }
}

/// A named argument of a test condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOperand {
    pub name: String,
    pub value: String,
}

/// One leaf test
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestCondition {
    pub test_type: String,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub operands: Vec<TestOperand>,
}

/// A group of conditions gating an interaction or loot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestSet {
    pub id: ResourceId,
    #[serde(default)]
    pub logic: TestLogic,
    #[serde(default)]
    pub conditions: Vec<TestCondition>,
}

/// An outcome applied when an interaction completes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LootAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedString {
    pub key: String,
    pub text: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl LocalizedString {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            locale: default_locale(),
        }
    }
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

/// The whole project as seen by every stage of a build
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectIR {
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub buffs: Vec<Buff>,
    #[serde(default)]
    pub traits: Vec<Trait>,
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,
    #[serde(default)]
    pub test_sets: Vec<TestSet>,
    #[serde(default)]
    pub loot_actions: Vec<LootAction>,
    #[serde(default)]
    pub strings: Vec<LocalizedString>,
}

impl ProjectIR {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every entity of `other`.
    ///
    /// Metadata is adopted only when this project has no id yet. No
    /// de-duplication happens here; duplicates surface in validation.
    pub fn merge(&mut self, other: ProjectIR) {
        if self.metadata.project_id.is_empty() && !other.metadata.project_id.is_empty() {
            self.metadata = other.metadata;
        }
        self.interactions.extend(other.interactions);
        self.buffs.extend(other.buffs);
        self.traits.extend(other.traits);
        self.enums.extend(other.enums);
        self.test_sets.extend(other.test_sets);
        self.loot_actions.extend(other.loot_actions);
        self.strings.extend(other.strings);
    }

    /// Number of entities across all lists
    pub fn entity_count(&self) -> usize {
        self.interactions.len()
            + self.buffs.len()
            + self.traits.len()
            + self.enums.len()
            + self.test_sets.len()
            + self.loot_actions.len()
            + self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }

    /// File-name-safe project id, `unnamed` when blank
    pub fn file_stem(&self) -> String {
        let id = self.metadata.project_id.trim();
        if id.is_empty() {
            return "unnamed".to_string();
        }
        id.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
            .collect()
    }

    pub fn find_test_set(&self, name: &str) -> Option<&TestSet> {
        self.test_sets.iter().find(|t| t.id.name == name)
    }

    pub fn find_loot_action(&self, name: &str) -> Option<&LootAction> {
        self.loot_actions
            .iter()
            .find(|l| l.id.as_ref().is_some_and(|id| id.name == name))
    }
}
