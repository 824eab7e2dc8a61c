/*!
 * Cross-entity checks: resource name uniqueness and soft references.
 */

use std::collections::BTreeMap;

use crate::diagnostics::{codes, Category, Diagnostic};
use crate::ir::ProjectIR;

/// Project-wide name index: name to the kinds holding it, in IR order
pub struct ResourceIndex<'a> {
    entries: BTreeMap<&'a str, Vec<&'static str>>,
}

impl<'a> ResourceIndex<'a> {
    pub fn build(ir: &'a ProjectIR) -> Self {
        let mut entries: BTreeMap<&'a str, Vec<&'static str>> = BTreeMap::new();
        let mut add = |name: &'a str, kind: &'static str| {
            if !name.trim().is_empty() {
                entries.entry(name).or_default().push(kind);
            }
        };

        ir.interactions.iter().for_each(|i| add(&i.id.name, "interaction"));
        ir.buffs.iter().for_each(|b| add(&b.id.name, "buff"));
        ir.traits.iter().for_each(|t| add(&t.id.name, "trait"));
        ir.enums.iter().for_each(|e| add(&e.id.name, "enum"));
        ir.test_sets.iter().for_each(|t| add(&t.id.name, "test set"));
        ir.loot_actions
            .iter()
            .filter_map(|l| l.id.as_ref())
            .for_each(|id| add(&id.name, "loot action"));

        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names held by more than one entity, sorted
    pub fn duplicates(&self) -> impl Iterator<Item = (&'a str, &[&'static str])> + '_ {
        self.entries
            .iter()
            .filter(|(_, kinds)| kinds.len() > 1)
            .map(|(name, kinds)| (*name, kinds.as_slice()))
    }
}

pub fn check_references(ir: &ProjectIR, diagnostics: &mut Vec<Diagnostic>) {
    let index = ResourceIndex::build(ir);

    for (name, kinds) in index.duplicates() {
        diagnostics.push(
            Diagnostic::error(
                Category::Validation,
                codes::DUPLICATE_RESOURCE_ID,
                format!("Duplicate resource id '{}'", name),
                format!(
                    "The id '{}' is used by {} resources ({}); resource ids must be unique across the project.",
                    name,
                    kinds.len(),
                    kinds.join(", ")
                ),
            )
            .with_fix("Rename all but one of the resources")
            .with_resource(name),
        );
    }

    for tuning_trait in &ir.traits {
        for buff in tuning_trait.buffs.iter().filter(|b| !index.contains(&b.name)) {
            diagnostics.push(
                Diagnostic::warning(
                    Category::Validation,
                    codes::UNDEFINED_BUFF_REFERENCE,
                    format!("Unknown buff '{}'", buff.name),
                    format!(
                        "Trait '{}' references buff '{}', which is not defined in this project.",
                        tuning_trait.id, buff.name
                    ),
                )
                .with_fix("Define the buff or check it exists in the game or another mod")
                .with_resource(tuning_trait.id.name.clone()),
            );
        }
    }

    for buff in &ir.buffs {
        for tuning_trait in buff.traits.iter().filter(|t| !index.contains(&t.name)) {
            diagnostics.push(
                Diagnostic::warning(
                    Category::Validation,
                    codes::UNDEFINED_TRAIT_REFERENCE,
                    format!("Unknown trait '{}'", tuning_trait.name),
                    format!(
                        "Buff '{}' references trait '{}', which is not defined in this project.",
                        buff.id, tuning_trait.name
                    ),
                )
                .with_fix("Define the trait or check it exists in the game or another mod")
                .with_resource(buff.id.name.clone()),
            );
        }
    }
}
