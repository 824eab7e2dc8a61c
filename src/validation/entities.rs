/*!
 * Per-entity validation checks.
 *
 * Each check looks at one entity in isolation and appends diagnostics.
 * Nothing here looks across entities; see `references` for that.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::diagnostics::{codes, Category, Diagnostic};
use crate::ir::{Buff, EnumDefinition, Interaction, LocalizedString, ProjectMetadata, TestSet, Trait};

/// Locale shape like `en_US`
static LOCALE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2}_[A-Z]{2}$").expect("Invalid locale regex")
});

fn missing_id(code: &str, kind: &str, index: usize) -> Diagnostic {
    Diagnostic::error(
        Category::Validation,
        code,
        format!("{} without id", kind),
        format!("{} #{} has an empty id; every {} needs a unique name.", kind, index + 1, kind.to_lowercase()),
    )
    .with_fix(format!("Add an 'id:' line to the {} section", kind.to_lowercase()))
}

pub fn check_metadata(metadata: &ProjectMetadata, diagnostics: &mut Vec<Diagnostic>) {
    if metadata.name.trim().is_empty() {
        diagnostics.push(
            Diagnostic::error(
                Category::Validation,
                codes::INVALID_PROJECT_NAME,
                "Project name is empty",
                "The project has no name; set one in the [Project] section.",
            )
            .with_fix("Add 'name: <Project Name>' to [Project]"),
        );
    }

    if metadata.project_id.trim().is_empty() {
        diagnostics.push(
            Diagnostic::error(
                Category::Validation,
                codes::INVALID_PROJECT_ID,
                "Project id is empty",
                "The project has no project_id; output file names and resource namespaces depend on it.",
            )
            .with_fix("Add 'project_id: <id>' to [Project]"),
        );
    }
}

pub fn check_interaction(index: usize, interaction: &Interaction, diagnostics: &mut Vec<Diagnostic>) {
    if interaction.id.is_empty() {
        diagnostics.push(missing_id(codes::INVALID_INTERACTION_ID, "Interaction", index));
    }

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for participant in &interaction.participants {
        if !seen.insert(participant.role.as_str()) && !duplicates.contains(&participant.role.as_str()) {
            duplicates.push(participant.role.as_str());
        }
    }
    if !duplicates.is_empty() {
        diagnostics.push(
            Diagnostic::warning(
                Category::Validation,
                codes::DUPLICATE_PARTICIPANT_ROLES,
                "Duplicate participant roles",
                format!(
                    "Interaction '{}' lists the role(s) {} more than once.",
                    interaction.id,
                    duplicates.join(", ")
                ),
            )
            .with_fix("Give each participant a distinct role")
            .with_resource(interaction.id.name.clone()),
        );
    }

    for test_set in &interaction.tests {
        check_conditions(test_set, Some(&interaction.id.name), diagnostics);
    }
}

pub fn check_buff(index: usize, buff: &Buff, diagnostics: &mut Vec<Diagnostic>) {
    if buff.id.is_empty() {
        diagnostics.push(missing_id(codes::INVALID_BUFF_ID, "Buff", index));
    }

    if let Some(minutes) = buff.duration_sim_minutes {
        if minutes < 0.0 {
            diagnostics.push(
                Diagnostic::warning(
                    Category::Validation,
                    codes::INVALID_BUFF_DURATION,
                    "Negative buff duration",
                    format!("Buff '{}' has a negative duration of {} sim minutes.", buff.id, minutes),
                )
                .with_fix("Use a duration of zero or more, or remove it for a permanent buff")
                .with_resource(buff.id.name.clone()),
            );
        }
    }
}

pub fn check_trait(index: usize, tuning_trait: &Trait, diagnostics: &mut Vec<Diagnostic>) {
    if tuning_trait.id.is_empty() {
        diagnostics.push(missing_id(codes::INVALID_TRAIT_ID, "Trait", index));
    }
}

pub fn check_enum(index: usize, definition: &EnumDefinition, diagnostics: &mut Vec<Diagnostic>) {
    if definition.id.is_empty() {
        diagnostics.push(missing_id(codes::INVALID_ENUM_ID, "Enum", index));
    }

    if definition.options.is_empty() {
        diagnostics.push(
            Diagnostic::warning(
                Category::Validation,
                codes::EMPTY_ENUM_OPTIONS,
                "Enum has no options",
                format!("Enum '{}' declares no options and will generate an empty group.", definition.id),
            )
            .with_fix("Add at least one 'option:' line")
            .with_resource(definition.id.name.clone()),
        );
        return;
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for option in &definition.options {
        if !seen.insert(option.name.as_str()) && !duplicates.contains(&option.name.as_str()) {
            duplicates.push(option.name.as_str());
        }
    }
    if !duplicates.is_empty() {
        diagnostics.push(
            Diagnostic::error(
                Category::Validation,
                codes::DUPLICATE_ENUM_OPTIONS,
                "Duplicate enum options",
                format!(
                    "Enum '{}' declares the option(s) {} more than once.",
                    definition.id,
                    duplicates.join(", ")
                ),
            )
            .with_fix("Rename or remove the repeated options")
            .with_resource(definition.id.name.clone()),
        );
    }
}

pub fn check_test_set(index: usize, test_set: &TestSet, diagnostics: &mut Vec<Diagnostic>) {
    if test_set.id.is_empty() {
        diagnostics.push(missing_id(codes::INVALID_TEST_SET_ID, "TestSet", index));
    }
    check_conditions(test_set, None, diagnostics);
}

fn check_conditions(test_set: &TestSet, owner: Option<&str>, diagnostics: &mut Vec<Diagnostic>) {
    for (position, condition) in test_set.conditions.iter().enumerate() {
        if condition.test_type.trim().is_empty() {
            let resource = owner.unwrap_or(&test_set.id.name).to_string();
            diagnostics.push(
                Diagnostic::warning(
                    Category::Validation,
                    codes::INVALID_TEST_CONDITION,
                    "Test condition without type",
                    format!(
                        "Condition #{} of test set '{}' has no type and cannot be evaluated.",
                        position + 1,
                        test_set.id
                    ),
                )
                .with_fix("Start the condition with 'type:<test type>'")
                .with_resource(resource),
            );
        }
    }
}

/// Check every localized string, including duplicate keys per locale
pub fn check_strings(strings: &[LocalizedString], diagnostics: &mut Vec<Diagnostic>) {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();

    for (index, string) in strings.iter().enumerate() {
        if string.key.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error(
                    Category::Validation,
                    codes::INVALID_STRING_KEY,
                    "String without key",
                    format!("Localized string #{} ('{}') has an empty key.", index + 1, string.text),
                )
                .with_fix("Give the string a key"),
            );
        } else {
            let first = *seen.entry((string.key.as_str(), string.locale.as_str())).or_insert(index);
            if first != index {
                diagnostics.push(
                    Diagnostic::warning(
                        Category::Validation,
                        codes::DUPLICATE_STRING_KEY,
                        format!("Duplicate string key '{}'", string.key),
                        format!(
                            "String key '{}' appears again for locale {} (first at #{}); the last text wins in the string table.",
                            string.key,
                            string.locale,
                            first + 1
                        ),
                    )
                    .with_fix("Remove one of the definitions")
                    .with_resource(string.key.clone()),
                );
            }
        }

        if string.text.trim().is_empty() {
            diagnostics.push(
                Diagnostic::warning(
                    Category::Validation,
                    codes::EMPTY_STRING_TEXT,
                    "String text is empty",
                    format!("Localized string '{}' has no text.", string.key),
                )
                .with_fix("Provide the text to display")
                .with_resource(string.key.clone()),
            );
        }

        if !LOCALE_REGEX.is_match(&string.locale) {
            diagnostics.push(
                Diagnostic::warning(
                    Category::Validation,
                    codes::INVALID_LOCALE_FORMAT,
                    format!("Invalid locale '{}'", string.locale),
                    format!(
                        "Locale '{}' of string '{}' does not look like 'xx_YY' (for example en_US).",
                        string.locale, string.key
                    ),
                )
                .with_fix("Use a language_COUNTRY locale such as en_US")
                .with_resource(string.key.clone()),
            );
        }
    }
}
