/*!
 * Tests for the JPE parser through the public API
 */

use jpe_translator::diagnostics::{codes, Severity};
use jpe_translator::ir::{ParamValue, TestLogic};
use jpe_translator::parser::{JpeParser, SourceFile};
use crate::common;

/// Test that the shared valid sample parses without findings
#[test]
fn test_parse_withValidProject_shouldProduceNoDiagnostics() {
    let (ir, diagnostics) = JpeParser::new().parse_str("src/mod.jpe", common::VALID_PROJECT);

    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
    assert_eq!(ir.metadata.project_id, "sample_mod");
    assert_eq!(ir.metadata.version, "1.2.0");
    assert_eq!(ir.interactions.len(), 1);
    assert_eq!(ir.buffs[0].duration_sim_minutes, Some(120.0));
    assert_eq!(ir.enums[0].options.len(), 3);
    assert_eq!(ir.strings.len(), 2);
}

/// Test the decomposition of participants, inline tests and inline loot
#[test]
fn test_parse_interaction_subkeys_shouldDecompose() {
    let (ir, _) = JpeParser::new().parse_str("src/mod.jpe", common::VALID_PROJECT);
    let interaction = &ir.interactions[0];

    assert_eq!(interaction.participants[0].role, "actor");
    assert_eq!(interaction.participants[0].description.as_deref(), Some("The initiator"));
    assert_eq!(interaction.participants[1].role, "target");

    let inline = &interaction.tests[0];
    assert_eq!(inline.id.name, "friendly_chat_tests");
    assert_eq!(inline.conditions[0].test_type, "sim_info");
    assert_eq!(inline.conditions[0].operands[0].name, "age");
    assert_eq!(inline.conditions[0].operands[0].value, "adult");

    let loot = &interaction.loot_actions[0];
    assert_eq!(loot.parameters.get("stat"), Some(&ParamValue::Text("fun".to_string())));
    assert_eq!(loot.parameters.get("amount"), Some(&ParamValue::Number(10.0)));
}

/// Test resource attributes on an identifier
#[test]
fn test_parse_resourceKeys_shouldFillModuleClassAndInstance() {
    let source = "[Buffs]
id: focused
module: buffs.buff
class: Buff
instance_id: 0x1F
end
";
    let (ir, diagnostics) = JpeParser::new().parse_str("src/buffs.jpe", source);

    assert!(diagnostics.is_empty());
    let id = &ir.buffs[0].id;
    assert_eq!(id.module.as_deref(), Some("buffs.buff"));
    assert_eq!(id.class_name.as_deref(), Some("Buff"));
    assert_eq!(id.instance_id, Some(31));
}

/// Test that a bad instance id is reported and left unset
#[test]
fn test_parse_withBadInstanceId_shouldReportInvalidValue() {
    let source = "[Traits]\nid: odd\ninstance_id: twelve\nend\n";

    let (ir, diagnostics) = JpeParser::new().parse_str("src/traits.jpe", source);

    assert_eq!(ir.traits[0].id.instance_id, None);
    assert!(diagnostics.iter().any(|d| d.code == codes::INVALID_VALUE && d.severity == Severity::Error));
}

/// Test that loot parameters with dotted names nest into maps
#[test]
fn test_parse_lootAction_withDottedParams_shouldNest() {
    let source = "[LootAction]
id: reward
description: Grant a reward
param: amount:5, enabled:true
stat.name: fun
stat.delta: -2.5
end
";
    let (ir, diagnostics) = JpeParser::new().parse_str("src/loot.jpe", source);

    assert!(diagnostics.is_empty());
    let loot = &ir.loot_actions[0];
    assert_eq!(loot.description, "Grant a reward");
    assert_eq!(loot.parameters.get("amount"), Some(&ParamValue::Number(5.0)));
    assert_eq!(loot.parameters.get("enabled"), Some(&ParamValue::Bool(true)));
    match loot.parameters.get("stat") {
        Some(ParamValue::Map(inner)) => {
            assert_eq!(inner.get("name"), Some(&ParamValue::Text("fun".to_string())));
            assert_eq!(inner.get("delta"), Some(&ParamValue::Number(-2.5)));
        }
        other => panic!("expected nested map, got {:?}", other),
    }
}

/// Test that shared test sets resolve across files
#[test]
fn test_parse_sharedTestSet_inAnotherFile_shouldResolve() {
    let sources = vec![
        SourceFile::new("src/b_interactions.jpe", "[Interactions]\nid: hug\ntest_set: adults_only\nend\n"),
        SourceFile::new(
            "src/a_tests.jpe",
            "[TestSet]\nid: adults_only\nlogic: any\ncondition: type:age, min:18\nend\n",
        ),
    ];

    let (ir, diagnostics) = JpeParser::new().parse(&sources);

    assert!(diagnostics.is_empty());
    let linked = &ir.interactions[0].tests[0];
    assert_eq!(linked.id.name, "adults_only");
    assert_eq!(linked.logic, TestLogic::Any);
}

/// Test that unknown references warn without failing
#[test]
fn test_parse_withUnknownLinks_shouldWarn() {
    let source = "[Interactions]\nid: hug\ntest_set: nobody\nloot_action: nothing\nend\n";

    let (_, diagnostics) = JpeParser::new().parse_str("src/i.jpe", source);

    assert!(diagnostics.iter().any(|d| d.code == codes::UNDEFINED_TEST_SET_REFERENCE));
    assert!(diagnostics.iter().any(|d| d.code == codes::UNDEFINED_LOOT_ACTION_REFERENCE));
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
}

/// Test that diagnostics carry file and line
#[test]
fn test_parse_unknownKey_shouldPointAtLine() {
    let source = "# comment\n[Traits]\nid: t\ncolour: blue\nend\n";

    let (_, diagnostics) = JpeParser::new().parse_str("src/t.jpe", source);

    let unknown = diagnostics
        .iter()
        .find(|d| d.code == codes::UNKNOWN_KEY)
        .expect("unknown key diagnostic");
    let location = unknown.location.as_ref().expect("location");
    assert_eq!(location.line, 4);
    assert!(location.file.ends_with("t.jpe"));
}

/// Test that a line without a colon is reported and skipped
#[test]
fn test_parse_withMalformedLine_shouldWarnAndContinue() {
    let source = "[Traits]\nid: t\njust words\nend\n";

    let (ir, diagnostics) = JpeParser::new().parse_str("src/t.jpe", source);

    assert_eq!(ir.traits.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::MALFORMED_LINE);
}

/// Test that an implicit enum value past the largest integer is an error, not a crash
#[test]
fn test_parse_withImplicitEnumValueAfterMax_shouldReportInvalidValue() {
    let source = "[Enums]\nid: e\noption: A=9223372036854775807, B\nend\n";

    let (ir, diagnostics) = JpeParser::new().parse_str("src/a.jpe", source);

    assert_eq!(ir.enums[0].options.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::INVALID_VALUE);
    assert_eq!(diagnostics[0].severity, Severity::Error);
}
