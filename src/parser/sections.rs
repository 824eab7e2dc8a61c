/*!
 * Builders turning raw JPE sections into IR entities.
 *
 * Every builder is tolerant: unknown keys and unparsable values become
 * diagnostics and the entity is still produced with whatever was valid.
 */

use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

use crate::diagnostics::{codes, Category, Diagnostic};
use crate::ir::{
    Buff, EnumDefinition, EnumOption, Interaction, InteractionParticipant, LocalizedString,
    LootAction, ParamValue, ProjectMetadata, ResourceId, TestCondition, TestLogic, TestOperand,
    TestSet, Trait, DEFAULT_LOCALE,
};

/// Kind tag of a section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Project,
    Interaction,
    Buff,
    Trait,
    Enum,
    TestSet,
    Strings,
    LootAction,
}

impl SectionKind {
    /// Resolve a bracketed tag, ignoring case, spaces and underscores
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "project" => Some(SectionKind::Project),
            "interactions" | "interaction" => Some(SectionKind::Interaction),
            "buffs" | "buff" => Some(SectionKind::Buff),
            "traits" | "trait" => Some(SectionKind::Trait),
            "enums" | "enum" => Some(SectionKind::Enum),
            "testset" | "testsets" => Some(SectionKind::TestSet),
            "strings" | "string" => Some(SectionKind::Strings),
            "lootaction" | "lootactions" => Some(SectionKind::LootAction),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SectionKind::Project => "Project",
            SectionKind::Interaction => "Interactions",
            SectionKind::Buff => "Buffs",
            SectionKind::Trait => "Traits",
            SectionKind::Enum => "Enums",
            SectionKind::TestSet => "TestSet",
            SectionKind::Strings => "Strings",
            SectionKind::LootAction => "LootAction",
        }
    }
}

/// One `key: value` line
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub key: String,
    pub value: String,
    pub line: usize,
}

impl RawEntry {
    fn normalized_key(&self) -> String {
        self.key.to_ascii_lowercase()
    }
}

/// A closed section with its lines, before interpretation
#[derive(Debug, Clone)]
pub struct RawSection {
    pub kind: SectionKind,
    pub line: usize,
    pub entries: Vec<RawEntry>,
}

/// Reference from an interaction to a top-level test set or loot action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    TestSet,
    LootAction,
}

#[derive(Debug, Clone)]
pub struct PendingLink {
    pub kind: LinkKind,
    pub name: String,
    pub line: usize,
}

/// Shared state for building one section
pub struct SectionContext<'a> {
    pub file: &'a Path,
    pub diagnostics: &'a mut Vec<Diagnostic>,
}

impl SectionContext<'_> {
    fn unknown_key(&mut self, kind: SectionKind, entry: &RawEntry) {
        self.diagnostics.push(
            Diagnostic::warning(
                Category::Parse,
                codes::UNKNOWN_KEY,
                format!("Unknown key '{}' in [{}]", entry.key, kind.tag()),
                format!(
                    "The key '{}' is not recognized inside a [{}] section and was ignored.",
                    entry.key,
                    kind.tag()
                ),
            )
            .with_fix("Check the key for typos or remove the line")
            .at(self.file, entry.line),
        );
    }

    fn invalid_value(&mut self, entry: &RawEntry, expected: &str) {
        self.diagnostics.push(
            Diagnostic::error(
                Category::Parse,
                codes::INVALID_VALUE,
                format!("Invalid value for '{}'", entry.key),
                format!(
                    "'{}' is not a valid {} for key '{}'; the field was left unset.",
                    entry.value, expected, entry.key
                ),
            )
            .with_fix(format!("Use a {} value", expected))
            .at(self.file, entry.line),
        );
    }
}

/// Split `a:1, b:2` into pairs.
///
/// A part without `:` following a keyed part is glued back onto the
/// previous value, so free text may contain commas. A leading part
/// without `:` is returned with an empty key.
pub fn split_pairs(value: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for part in value.split(',') {
        match part.split_once(':') {
            Some((key, val)) if !key.trim().is_empty() && !key.trim().contains(' ') => {
                pairs.push((key.trim().to_string(), val.trim().to_string()));
            }
            _ => {
                let text = part.trim();
                match pairs.last_mut() {
                    Some((key, previous)) if !key.is_empty() => {
                        previous.push_str(", ");
                        previous.push_str(text);
                    }
                    _ => {
                        if !text.is_empty() {
                            pairs.push((String::new(), text.to_string()));
                        }
                    }
                }
            }
        }
    }

    pairs
}

/// Parse a JPE boolean
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an instance id, decimal or `0x` hex
pub fn parse_instance_id(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse().ok(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Apply `module`/`class`/`instance_id` keys. Returns false for other keys.
fn apply_resource_key(ctx: &mut SectionContext<'_>, id: &mut ResourceId, key: &str, entry: &RawEntry) -> bool {
    match key {
        "module" => id.module = non_empty(&entry.value),
        "class" | "class_name" => id.class_name = non_empty(&entry.value),
        "instance_id" | "instance" => match parse_instance_id(&entry.value) {
            Some(instance) => id.instance_id = Some(instance),
            None => ctx.invalid_value(entry, "instance id"),
        },
        _ => return false,
    }
    true
}

/// Insert a parameter, treating dots in the name as nesting
fn insert_param(params: &mut BTreeMap<String, ParamValue>, name: &str, value: ParamValue) {
    match name.split_once('.') {
        Some((head, rest)) if !head.is_empty() && !rest.is_empty() => {
            let slot = params
                .entry(head.to_string())
                .or_insert_with(|| ParamValue::Map(BTreeMap::new()));
            if !matches!(slot, ParamValue::Map(_)) {
                *slot = ParamValue::Map(BTreeMap::new());
            }
            if let ParamValue::Map(inner) = slot {
                insert_param(inner, rest, value);
            }
        }
        _ => {
            params.insert(name.to_string(), value);
        }
    }
}

pub fn build_project(ctx: &mut SectionContext<'_>, section: &RawSection) -> ProjectMetadata {
    let mut metadata = ProjectMetadata::default();

    for entry in &section.entries {
        match entry.normalized_key().as_str() {
            "name" => metadata.name = entry.value.clone(),
            "project_id" | "id" => metadata.project_id = entry.value.clone(),
            "version" => {
                if let Some(version) = non_empty(&entry.value) {
                    metadata.version = version;
                }
            }
            "author" => metadata.author = non_empty(&entry.value),
            _ => ctx.unknown_key(section.kind, entry),
        }
    }

    metadata
}

fn parse_participant(value: &str) -> InteractionParticipant {
    let mut participant = InteractionParticipant {
        role: String::new(),
        description: None,
    };

    for (key, val) in split_pairs(value) {
        match key.to_ascii_lowercase().as_str() {
            "role" => participant.role = val,
            "description" | "desc" => participant.description = non_empty(&val),
            // A bare value is the role
            "" if participant.role.is_empty() => participant.role = val,
            _ => {}
        }
    }

    participant
}

fn parse_condition(ctx: &mut SectionContext<'_>, entry: &RawEntry) -> TestCondition {
    let mut condition = TestCondition::default();

    for (key, val) in split_pairs(&entry.value) {
        match key.to_ascii_lowercase().as_str() {
            "type" | "test_type" => condition.test_type = val,
            "negate" | "not" => match parse_bool(&val) {
                Some(flag) => condition.negate = flag,
                None => ctx.invalid_value(entry, "boolean"),
            },
            "" if condition.test_type.is_empty() => condition.test_type = val,
            "" => condition.operands.push(TestOperand { name: val, value: String::new() }),
            _ => condition.operands.push(TestOperand { name: key, value: val }),
        }
    }

    condition
}

fn parse_inline_loot(value: &str) -> LootAction {
    let mut loot = LootAction::default();

    for (key, val) in split_pairs(value) {
        match key.to_ascii_lowercase().as_str() {
            "id" => loot.id = non_empty(&val).map(ResourceId::new),
            "description" | "desc" => loot.description = val,
            "" if loot.description.is_empty() => loot.description = val,
            "" => insert_param(&mut loot.parameters, &val, ParamValue::Bool(true)),
            _ => insert_param(&mut loot.parameters, &key, ParamValue::infer(&val)),
        }
    }

    loot
}

/// Build an interaction plus the references it makes to shared test sets and loot
pub fn build_interaction(ctx: &mut SectionContext<'_>, section: &RawSection) -> (Interaction, Vec<PendingLink>) {
    let mut interaction = Interaction::default();
    let mut inline_tests = TestSet::default();
    let mut links = Vec::new();

    for entry in &section.entries {
        let key = entry.normalized_key();
        if apply_resource_key(ctx, &mut interaction.id, &key, entry) {
            continue;
        }
        match key.as_str() {
            "id" => interaction.id.name = entry.value.clone(),
            "display_name" | "display_name_key" => interaction.display_name_key = non_empty(&entry.value),
            "description" | "description_key" => interaction.description_key = non_empty(&entry.value),
            "participant" | "participants" => interaction.participants.push(parse_participant(&entry.value)),
            "autonomy_disabled" => match parse_bool(&entry.value) {
                Some(flag) => interaction.autonomy_disabled = flag,
                None => ctx.invalid_value(entry, "boolean"),
            },
            "test" | "condition" => inline_tests.conditions.push(parse_condition(ctx, entry)),
            "test_logic" => match TestLogic::parse(&entry.value) {
                Some(logic) => inline_tests.logic = logic,
                None => ctx.invalid_value(entry, "test logic (all/any)"),
            },
            "test_set" | "tests" => links.extend(split_list(&entry.value).map(|name| PendingLink {
                kind: LinkKind::TestSet,
                name: name.to_string(),
                line: entry.line,
            })),
            "loot" => interaction.loot_actions.push(parse_inline_loot(&entry.value)),
            "loot_action" | "loot_actions" => links.extend(split_list(&entry.value).map(|name| PendingLink {
                kind: LinkKind::LootAction,
                name: name.to_string(),
                line: entry.line,
            })),
            _ => ctx.unknown_key(section.kind, entry),
        }
    }

    if !inline_tests.conditions.is_empty() {
        inline_tests.id = ResourceId::new(format!("{}_tests", interaction.id.name));
        interaction.tests.insert(0, inline_tests);
    }

    debug!(
        "Parsed interaction '{}' ({} participants, {} references)",
        interaction.id,
        interaction.participants.len(),
        links.len()
    );

    (interaction, links)
}

pub fn build_buff(ctx: &mut SectionContext<'_>, section: &RawSection) -> Buff {
    let mut buff = Buff::default();

    for entry in &section.entries {
        let key = entry.normalized_key();
        if apply_resource_key(ctx, &mut buff.id, &key, entry) {
            continue;
        }
        match key.as_str() {
            "id" => buff.id.name = entry.value.clone(),
            "display_name" | "display_name_key" => buff.display_name_key = non_empty(&entry.value),
            "description" | "description_key" => buff.description_key = non_empty(&entry.value),
            "trait" | "traits" => buff.traits.extend(split_list(&entry.value).map(ResourceId::from)),
            "duration" | "duration_sim_minutes" => match entry.value.trim().parse::<f64>() {
                Ok(minutes) if minutes.is_finite() => buff.duration_sim_minutes = Some(minutes),
                _ => ctx.invalid_value(entry, "number of sim minutes"),
            },
            _ => ctx.unknown_key(section.kind, entry),
        }
    }

    buff
}

pub fn build_trait(ctx: &mut SectionContext<'_>, section: &RawSection) -> Trait {
    let mut tuning_trait = Trait::default();

    for entry in &section.entries {
        let key = entry.normalized_key();
        if apply_resource_key(ctx, &mut tuning_trait.id, &key, entry) {
            continue;
        }
        match key.as_str() {
            "id" => tuning_trait.id.name = entry.value.clone(),
            "display_name" | "display_name_key" => tuning_trait.display_name_key = non_empty(&entry.value),
            "description" | "description_key" => tuning_trait.description_key = non_empty(&entry.value),
            "buff" | "buffs" => tuning_trait.buffs.extend(split_list(&entry.value).map(ResourceId::from)),
            _ => ctx.unknown_key(section.kind, entry),
        }
    }

    tuning_trait
}

fn push_enum_option(ctx: &mut SectionContext<'_>, definition: &mut EnumDefinition, entry: &RawEntry, name: &str, value: Option<&str>) {
    let value = match value {
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(parsed) => parsed,
            Err(_) => {
                ctx.invalid_value(entry, "integer enum value");
                return;
            }
        },
        None => match definition.next_value() {
            Some(next) => next,
            None => {
                ctx.diagnostics.push(
                    Diagnostic::error(
                        Category::Parse,
                        codes::INVALID_VALUE,
                        format!("No value left for enum option '{}'", name.trim()),
                        format!(
                            "Option '{}' has no explicit value and the next one would exceed {}; the option was skipped.",
                            name.trim(),
                            i64::MAX
                        ),
                    )
                    .with_fix("Give the option an explicit value")
                    .at(ctx.file, entry.line),
                );
                return;
            }
        },
    };

    definition.options.push(EnumOption {
        name: name.trim().to_string(),
        value,
    });
}

pub fn build_enum(ctx: &mut SectionContext<'_>, section: &RawSection) -> EnumDefinition {
    let mut definition = EnumDefinition::default();

    for entry in &section.entries {
        let key = entry.normalized_key();
        if apply_resource_key(ctx, &mut definition.id, &key, entry) {
            continue;
        }
        match key.as_str() {
            "id" => definition.id.name = entry.value.clone(),
            "option" | "options" => {
                let pairs = split_pairs(&entry.value);
                if pairs.iter().any(|(k, _)| k.eq_ignore_ascii_case("name")) {
                    // name:X, value:Y
                    let name = pairs
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case("name"))
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    let value = pairs
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case("value"))
                        .map(|(_, v)| v.clone());
                    push_enum_option(ctx, &mut definition, entry, &name, value.as_deref());
                } else {
                    for part in split_list(&entry.value) {
                        match part.split_once('=') {
                            Some((name, value)) => push_enum_option(ctx, &mut definition, entry, name, Some(value)),
                            None => push_enum_option(ctx, &mut definition, entry, part, None),
                        }
                    }
                }
            }
            _ => ctx.unknown_key(section.kind, entry),
        }
    }

    definition
}

pub fn build_test_set(ctx: &mut SectionContext<'_>, section: &RawSection) -> TestSet {
    let mut test_set = TestSet::default();

    for entry in &section.entries {
        let key = entry.normalized_key();
        if apply_resource_key(ctx, &mut test_set.id, &key, entry) {
            continue;
        }
        match key.as_str() {
            "id" => test_set.id.name = entry.value.clone(),
            "logic" | "test_logic" => match TestLogic::parse(&entry.value) {
                Some(logic) => test_set.logic = logic,
                None => ctx.invalid_value(entry, "test logic (all/any)"),
            },
            "condition" | "test" => test_set.conditions.push(parse_condition(ctx, entry)),
            _ => ctx.unknown_key(section.kind, entry),
        }
    }

    test_set
}

pub fn build_loot_action(ctx: &mut SectionContext<'_>, section: &RawSection) -> LootAction {
    let mut loot = LootAction::default();

    for entry in &section.entries {
        match entry.normalized_key().as_str() {
            "id" => loot.id = Some(ResourceId::new(entry.value.clone())),
            "description" => loot.description = entry.value.clone(),
            "param" | "parameter" | "params" => {
                for (key, val) in split_pairs(&entry.value) {
                    if key.is_empty() {
                        ctx.invalid_value(entry, "name:value parameter");
                        continue;
                    }
                    insert_param(&mut loot.parameters, &key, ParamValue::infer(&val));
                }
            }
            // Any other key is a parameter in its own right
            _ => insert_param(&mut loot.parameters, &entry.key, ParamValue::infer(&entry.value)),
        }
    }

    loot
}

/// Build the strings of one `[Strings]` section.
///
/// With `key:` lines present each one starts a record filled by the
/// following `text:`/`locale:` lines; otherwise every line is `key: text`.
pub fn build_strings(section: &RawSection) -> Vec<LocalizedString> {
    let record_form = section.entries.iter().any(|e| e.normalized_key() == "key");
    let mut section_locale = DEFAULT_LOCALE.to_string();
    let mut strings: Vec<LocalizedString> = Vec::new();

    if record_form {
        for entry in &section.entries {
            match entry.normalized_key().as_str() {
                "key" => {
                    let mut string = LocalizedString::new(entry.value.clone(), String::new());
                    string.locale = section_locale.clone();
                    strings.push(string);
                }
                "text" => match strings.last_mut() {
                    Some(current) => current.text = entry.value.clone(),
                    // Text before any key: keep it so the missing key gets reported
                    None => strings.push(LocalizedString::new(String::new(), entry.value.clone())),
                },
                "locale" => match strings.last_mut() {
                    Some(current) => current.locale = entry.value.clone(),
                    None => section_locale = entry.value.clone(),
                },
                _ => {}
            }
        }
    } else {
        if let Some(locale) = section.entries.iter().find(|e| e.normalized_key() == "locale") {
            section_locale = locale.value.clone();
        }
        for entry in section.entries.iter().filter(|e| e.normalized_key() != "locale") {
            let mut string = LocalizedString::new(entry.key.clone(), entry.value.clone());
            string.locale = section_locale.clone();
            strings.push(string);
        }
    }

    strings
}
