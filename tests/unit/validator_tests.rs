/*!
 * Tests for project validation
 */

use jpe_translator::diagnostics::{codes, Severity};
use jpe_translator::ir::{EnumDefinition, EnumOption, Interaction, LocalizedString, ProjectIR, ResourceId, Trait};
use jpe_translator::parser::JpeParser;
use jpe_translator::validation::ProjectValidator;
use crate::common;

fn valid_ir() -> ProjectIR {
    let (ir, diagnostics) = JpeParser::new().parse_str("src/mod.jpe", common::VALID_PROJECT);
    assert!(diagnostics.is_empty());
    ir
}

fn codes_of(ir: &ProjectIR) -> Vec<String> {
    ProjectValidator::new().validate(ir).into_iter().map(|d| d.code).collect()
}

/// Test that a complete project passes
#[test]
fn test_validate_withValidProject_shouldPass() {
    let report = ProjectValidator::new().report(&valid_ir());

    assert!(report.passed(), "{:?}", report.diagnostics);
    assert_eq!(report.summary.failures(), 0);
}

/// Test that an interaction with an empty id fails
#[test]
fn test_validate_withEmptyInteractionId_shouldError() {
    let mut ir = valid_ir();
    ir.interactions.push(Interaction::default());

    let diagnostics = ProjectValidator::new().validate(&ir);

    let missing: Vec<_> = diagnostics.iter().filter(|d| d.code == codes::INVALID_INTERACTION_ID).collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].severity, Severity::Error);
}

/// Test that one name shared by three entities yields one error
#[test]
fn test_validate_withNameSharedAcrossKinds_shouldReportOnce() {
    let mut ir = valid_ir();
    ir.traits.push(Trait { id: ResourceId::new("cheerful"), ..Default::default() });
    ir.enums.push(EnumDefinition {
        id: ResourceId::new("cheerful"),
        options: vec![EnumOption { name: "A".to_string(), value: 0 }],
    });

    let duplicates = codes_of(&ir)
        .into_iter()
        .filter(|code| code == codes::DUPLICATE_RESOURCE_ID)
        .count();

    assert_eq!(duplicates, 1);
}

/// Test that dangling soft references only warn
#[test]
fn test_validate_withDanglingReferences_shouldOnlyWarn() {
    let mut ir = valid_ir();
    ir.buffs[0].traits.push(ResourceId::new("missing_trait"));
    ir.traits[0].buffs.push(ResourceId::new("missing_buff"));

    let report = ProjectValidator::new().report(&ir);

    assert!(report.passed());
    assert!(report.diagnostics.iter().any(|d| d.code == codes::UNDEFINED_TRAIT_REFERENCE));
    assert!(report.diagnostics.iter().any(|d| d.code == codes::UNDEFINED_BUFF_REFERENCE));
}

/// Test the string table rules
#[test]
fn test_validate_strings_shouldCheckKeysTextAndLocale() {
    let mut ir = valid_ir();
    ir.strings.push(LocalizedString::new("", "orphan text"));
    ir.strings.push(LocalizedString::new("chat_name", "Again"));
    let mut odd = LocalizedString::new("odd_locale", "");
    odd.locale = "english".to_string();
    ir.strings.push(odd);

    let found = codes_of(&ir);

    assert!(found.iter().any(|c| c == codes::INVALID_STRING_KEY));
    assert!(found.iter().any(|c| c == codes::DUPLICATE_STRING_KEY));
    assert!(found.iter().any(|c| c == codes::EMPTY_STRING_TEXT));
    assert!(found.iter().any(|c| c == codes::INVALID_LOCALE_FORMAT));
}

/// Test that missing project metadata is reported
#[test]
fn test_validate_withoutProjectSection_shouldReportMetadata() {
    let (ir, _) = JpeParser::new().parse_str("src/t.jpe", "[Traits]\nid: lonely\nend\n");

    let found = codes_of(&ir);

    assert!(found.iter().any(|c| c == codes::INVALID_PROJECT_NAME));
    assert!(found.iter().any(|c| c == codes::INVALID_PROJECT_ID));
}

/// Test that diagnostics keep a stable order between runs
#[test]
fn test_validate_shouldBeDeterministic() {
    let mut ir = valid_ir();
    ir.buffs[0].duration_sim_minutes = Some(-5.0);
    ir.interactions.push(Interaction::default());

    assert_eq!(codes_of(&ir), codes_of(&ir));
}
