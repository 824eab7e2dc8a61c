/*!
 * Renderers for the tuning XML documents.
 *
 * Each `render_*` function turns the IR into one complete document
 * string. Nothing here touches the file system.
 */

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::io::Cursor;

use crate::errors::GenerationError;
use crate::ir::value::format_number;
use crate::ir::{LootAction, ParamValue, ProjectIR, ResourceId, TestSet};

pub const BUFF_CLASS: &str = "buffs.buff.Buff";
pub const TRAIT_CLASS: &str = "traits.trait.Trait";
pub const ENUM_CLASS: &str = "sims4.tuning.serialization_enum.Enum";

type Result<T> = std::result::Result<T, GenerationError>;

/// Thin wrapper over the quick-xml writer with tuning helpers
struct TuningWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl TuningWriter {
    fn new(indent_size: usize) -> Result<Self> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', indent_size);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(Self { writer })
    }

    fn start(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(tag);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, tag: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    /// `<tag a="..">value</tag>`
    fn element(&mut self, tag: &str, attributes: &[(&str, &str)], value: &str) -> Result<()> {
        self.start(tag, attributes)?;
        self.writer.write_event(Event::Text(BytesText::new(value)))?;
        self.end(tag)
    }

    /// `<T n="name">value</T>`
    fn tunable(&mut self, name: &str, value: &str) -> Result<()> {
        self.element("T", &[("n", name)], value)
    }

    fn finish(self) -> Result<String> {
        let bytes = self.writer.into_inner().into_inner();
        let mut document = String::from_utf8(bytes)?;
        if !document.ends_with('\n') {
            document.push('\n');
        }
        Ok(document)
    }
}

fn bool_text(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

/// Attributes `m`, `c` and `s` of a resource, only those that are set
fn resource_attributes(id: &ResourceId) -> Vec<(&'static str, String)> {
    let mut attributes = Vec::new();
    if let Some(class_name) = &id.class_name {
        attributes.push(("c", class_name.clone()));
    }
    if let Some(module) = &id.module {
        attributes.push(("m", module.clone()));
    }
    if let Some(instance_id) = id.instance_id {
        attributes.push(("s", instance_id.to_string()));
    }
    attributes
}

fn as_refs<'a>(attributes: &'a [(&'static str, String)]) -> Vec<(&'a str, &'a str)> {
    attributes.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

pub fn render_project(ir: &ProjectIR, indent_size: usize) -> Result<String> {
    let mut out = TuningWriter::new(indent_size)?;
    let metadata = &ir.metadata;

    out.start("Project", &[])?;
    out.tunable("name", &metadata.name)?;
    out.tunable("project_id", &metadata.project_id)?;
    out.tunable("version", &metadata.version)?;
    if let Some(author) = &metadata.author {
        out.tunable("author", author)?;
    }
    out.tunable("entity_count", &ir.entity_count().to_string())?;
    out.end("Project")?;

    out.finish()
}

fn write_test_set(out: &mut TuningWriter, test_set: &TestSet) -> Result<()> {
    out.start("U", &[])?;
    out.tunable("id", &test_set.id.name)?;
    out.tunable("logic", test_set.logic.as_str())?;
    if !test_set.conditions.is_empty() {
        out.start("L", &[("n", "conditions")])?;
        for condition in &test_set.conditions {
            out.start("U", &[])?;
            out.tunable("type", &condition.test_type)?;
            out.tunable("negate", bool_text(condition.negate))?;
            for operand in &condition.operands {
                out.tunable(&operand.name, &operand.value)?;
            }
            out.end("U")?;
        }
        out.end("L")?;
    }
    out.end("U")
}

fn write_params(out: &mut TuningWriter, params: &BTreeMap<String, ParamValue>) -> Result<()> {
    for (name, value) in params {
        match value {
            ParamValue::Map(inner) => {
                out.start("U", &[("n", name.as_str())])?;
                write_params(out, inner)?;
                out.end("U")?;
            }
            other => out.element("T", &[("n", name.as_str()), ("t", other.type_name())], &other.to_string())?,
        }
    }
    Ok(())
}

fn write_loot(out: &mut TuningWriter, loot: &LootAction) -> Result<()> {
    out.start("U", &[])?;
    if let Some(id) = &loot.id {
        out.tunable("id", &id.name)?;
    }
    out.tunable("description", &loot.description)?;
    if !loot.parameters.is_empty() {
        out.start("U", &[("n", "parameters")])?;
        write_params(out, &loot.parameters)?;
        out.end("U")?;
    }
    out.end("U")
}

pub fn render_interactions(ir: &ProjectIR, indent_size: usize) -> Result<String> {
    let mut out = TuningWriter::new(indent_size)?;
    out.start("Tunings", &[])?;

    for interaction in &ir.interactions {
        let mut attributes = vec![("id", interaction.id.name.clone()), ("n", interaction.id.name.clone())];
        attributes.extend(resource_attributes(&interaction.id));
        out.start("I", &as_refs(&attributes))?;

        if let Some(key) = &interaction.display_name_key {
            out.tunable("display_name", key)?;
        }
        if let Some(key) = &interaction.description_key {
            out.tunable("description", key)?;
        }
        out.tunable("allow_autonomous", bool_text(!interaction.autonomy_disabled))?;

        if !interaction.participants.is_empty() {
            out.start("L", &[("n", "participants")])?;
            for participant in &interaction.participants {
                out.start("U", &[])?;
                out.tunable("role", &participant.role)?;
                if let Some(description) = &participant.description {
                    out.tunable("description", description)?;
                }
                out.end("U")?;
            }
            out.end("L")?;
        }

        if !interaction.tests.is_empty() {
            out.start("L", &[("n", "tests")])?;
            for test_set in &interaction.tests {
                write_test_set(&mut out, test_set)?;
            }
            out.end("L")?;
        }

        if !interaction.loot_actions.is_empty() {
            out.start("L", &[("n", "loot_actions")])?;
            for loot in &interaction.loot_actions {
                write_loot(&mut out, loot)?;
            }
            out.end("L")?;
        }

        out.end("I")?;
    }

    out.end("Tunings")?;
    out.finish()
}

/// Shared header of buff and trait instances: fixed class, optional module and instance
fn instance_attributes(id: &ResourceId, class_name: &'static str, instance_type: &'static str) -> Vec<(&'static str, String)> {
    let mut attributes = vec![
        ("c", class_name.to_string()),
        ("i", instance_type.to_string()),
        ("n", id.name.clone()),
    ];
    if let Some(module) = &id.module {
        attributes.push(("m", module.clone()));
    }
    if let Some(instance_id) = id.instance_id {
        attributes.push(("s", instance_id.to_string()));
    }
    attributes
}

fn write_references(out: &mut TuningWriter, list_name: &str, references: &[ResourceId]) -> Result<()> {
    if references.is_empty() {
        return Ok(());
    }
    out.start("L", &[("n", list_name)])?;
    for reference in references {
        out.element("T", &[], &reference.name)?;
    }
    out.end("L")
}

pub fn render_buffs(ir: &ProjectIR, indent_size: usize) -> Result<String> {
    let mut out = TuningWriter::new(indent_size)?;
    out.start("Tunings", &[])?;

    for buff in &ir.buffs {
        let attributes = instance_attributes(&buff.id, BUFF_CLASS, "buff");
        out.start("I", &as_refs(&attributes))?;
        if let Some(key) = &buff.display_name_key {
            out.tunable("display_name", key)?;
        }
        if let Some(key) = &buff.description_key {
            out.tunable("description", key)?;
        }
        if let Some(minutes) = buff.duration_sim_minutes {
            out.tunable("duration_sim_minutes", &format_number(minutes))?;
        }
        write_references(&mut out, "traits", &buff.traits)?;
        out.end("I")?;
    }

    out.end("Tunings")?;
    out.finish()
}

pub fn render_traits(ir: &ProjectIR, indent_size: usize) -> Result<String> {
    let mut out = TuningWriter::new(indent_size)?;
    out.start("Tunings", &[])?;

    for tuning_trait in &ir.traits {
        let attributes = instance_attributes(&tuning_trait.id, TRAIT_CLASS, "trait");
        out.start("I", &as_refs(&attributes))?;
        if let Some(key) = &tuning_trait.display_name_key {
            out.tunable("display_name", key)?;
        }
        if let Some(key) = &tuning_trait.description_key {
            out.tunable("description", key)?;
        }
        write_references(&mut out, "buffs", &tuning_trait.buffs)?;
        out.end("I")?;
    }

    out.end("Tunings")?;
    out.finish()
}

/// All enums of the project in a single instance
pub fn render_enums(ir: &ProjectIR, indent_size: usize) -> Result<String> {
    let mut out = TuningWriter::new(indent_size)?;
    let instance_name = format!("enums_{}", ir.file_stem());

    out.start("I", &[("c", ENUM_CLASS), ("i", "enum"), ("n", instance_name.as_str())])?;
    for definition in &ir.enums {
        out.start("E", &[("n", definition.id.name.as_str())])?;
        for option in &definition.options {
            out.tunable(&option.name, &option.value.to_string())?;
        }
        out.end("E")?;
    }
    out.end("I")?;

    out.finish()
}

pub fn render_strings(ir: &ProjectIR, indent_size: usize) -> Result<String> {
    let mut out = TuningWriter::new(indent_size)?;
    out.start("StringTable", &[])?;

    for string in &ir.strings {
        out.element("string", &[("id", string.key.as_str()), ("locale", string.locale.as_str())], &string.text)?;
    }

    out.end("StringTable")?;
    out.finish()
}
