/*!
 * JPE source parser.
 *
 * A JPE file is a sequence of `[Kind]` ... `end` sections holding
 * `key: value` lines. Parsing is recoverable: every problem becomes a
 * diagnostic and the parser moves on to the next section or file.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::diagnostics::{codes, Category, Diagnostic};
use crate::ir::ProjectIR;

use super::sections::{
    build_buff, build_enum, build_interaction, build_loot_action, build_project, build_strings,
    build_test_set, build_trait, LinkKind, PendingLink, RawEntry, RawSection, SectionContext,
    SectionKind,
};

// @const: Section header like `[Buffs]`
static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\s*([A-Za-z][A-Za-z_ ]*?)\s*\]$").expect("Invalid section header regex")
});

/// One source file handed to the parser
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Tokenizer state for one file
enum State {
    Outside,
    InSection(RawSection),
    Skipping { tag: String, line: usize },
}

/// Links waiting for every file to be parsed
struct InteractionLinks {
    interaction_index: usize,
    file: PathBuf,
    links: Vec<PendingLink>,
}

/// Parser from JPE text to `ProjectIR`
#[derive(Debug, Default, Clone)]
pub struct JpeParser;

impl JpeParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse every source into one project.
    ///
    /// Sources are processed in lexical path order regardless of the input
    /// order. Entities are appended as found; identical ids are kept.
    pub fn parse(&self, sources: &[SourceFile]) -> (ProjectIR, Vec<Diagnostic>) {
        let mut ordered: Vec<&SourceFile> = sources.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));

        let mut ir = ProjectIR::new();
        let mut diagnostics = Vec::new();
        let mut project_seen = false;
        let mut pending = Vec::new();

        for source in ordered {
            debug!("Parsing JPE source {:?}", source.path);
            let sections = Self::tokenize(&source.path, &source.text, &mut diagnostics);
            debug!("Found {} section(s) in {:?}", sections.len(), source.path);

            for section in sections {
                let mut ctx = SectionContext {
                    file: &source.path,
                    diagnostics: &mut diagnostics,
                };
                match section.kind {
                    SectionKind::Project => {
                        let metadata = build_project(&mut ctx, &section);
                        if project_seen {
                            ctx.diagnostics.push(
                                Diagnostic::warning(
                                    Category::Parse,
                                    codes::DUPLICATE_PROJECT_SECTION,
                                    "Duplicate [Project] section ignored",
                                    format!(
                                        "A [Project] section was already read; this one (project_id '{}') is ignored and the first one wins.",
                                        metadata.project_id
                                    ),
                                )
                                .with_fix("Keep a single [Project] section in the project")
                                .at(&source.path, section.line),
                            );
                        } else {
                            ir.metadata = metadata;
                            project_seen = true;
                        }
                    }
                    SectionKind::Interaction => {
                        let (interaction, links) = build_interaction(&mut ctx, &section);
                        if !links.is_empty() {
                            pending.push(InteractionLinks {
                                interaction_index: ir.interactions.len(),
                                file: source.path.clone(),
                                links,
                            });
                        }
                        ir.interactions.push(interaction);
                    }
                    SectionKind::Buff => ir.buffs.push(build_buff(&mut ctx, &section)),
                    SectionKind::Trait => ir.traits.push(build_trait(&mut ctx, &section)),
                    SectionKind::Enum => ir.enums.push(build_enum(&mut ctx, &section)),
                    SectionKind::TestSet => ir.test_sets.push(build_test_set(&mut ctx, &section)),
                    SectionKind::LootAction => ir.loot_actions.push(build_loot_action(&mut ctx, &section)),
                    SectionKind::Strings => ir.strings.extend(build_strings(&section)),
                }
            }
        }

        Self::resolve_links(&mut ir, pending, &mut diagnostics);

        debug!(
            "Parsed {} entities with {} diagnostic(s)",
            ir.entity_count(),
            diagnostics.len()
        );

        (ir, diagnostics)
    }

    /// Parse a single text, mainly for tests and live linting
    pub fn parse_str(&self, path: &str, text: &str) -> (ProjectIR, Vec<Diagnostic>) {
        self.parse(&[SourceFile::new(path, text)])
    }

    /// Split one file into closed sections
    fn tokenize(path: &Path, text: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<RawSection> {
        let mut sections = Vec::new();
        let mut state = State::Outside;

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw_line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }

            if trimmed.eq_ignore_ascii_case("end") {
                match std::mem::replace(&mut state, State::Outside) {
                    State::InSection(section) => sections.push(section),
                    State::Skipping { .. } => {}
                    State::Outside => diagnostics.push(
                        Diagnostic::warning(
                            Category::Parse,
                            codes::UNEXPECTED_CONTENT,
                            "Stray 'end' outside a section",
                            "An 'end' line was found while no section was open; it was ignored.",
                        )
                        .at(path, line_no),
                    ),
                }
                continue;
            }

            if let Some(caps) = SECTION_HEADER.captures(trimmed) {
                let tag = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                Self::close_unterminated(path, &state, Some(line_no), diagnostics);

                state = match SectionKind::from_tag(tag) {
                    Some(kind) => State::InSection(RawSection {
                        kind,
                        line: line_no,
                        entries: Vec::new(),
                    }),
                    None => {
                        diagnostics.push(
                            Diagnostic::error(
                                Category::Parse,
                                codes::UNKNOWN_SECTION,
                                format!("Unknown section [{}]", tag),
                                format!(
                                    "The section kind '{}' is not supported; its contents were skipped.",
                                    tag
                                ),
                            )
                            .with_fix("Use one of [Project], [Interactions], [Buffs], [Traits], [Enums], [TestSet], [Strings], [LootAction]")
                            .at(path, line_no),
                        );
                        State::Skipping {
                            tag: tag.to_string(),
                            line: line_no,
                        }
                    }
                };
                continue;
            }

            match &mut state {
                State::Outside => diagnostics.push(
                    Diagnostic::warning(
                        Category::Parse,
                        codes::UNEXPECTED_CONTENT,
                        "Content outside of a section",
                        format!("The line '{}' is not inside any section and was ignored.", trimmed),
                    )
                    .with_fix("Move the line into a section or remove it")
                    .at(path, line_no),
                ),
                State::Skipping { .. } => {}
                State::InSection(section) => match trimmed.split_once(':') {
                    Some((key, value)) => section.entries.push(RawEntry {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                        line: line_no,
                    }),
                    None => diagnostics.push(
                        Diagnostic::warning(
                            Category::Parse,
                            codes::MALFORMED_LINE,
                            "Line is not 'key: value'",
                            format!("The line '{}' has no ':' separator and was ignored.", trimmed),
                        )
                        .with_fix("Write the line as 'key: value'")
                        .at(path, line_no),
                    ),
                },
            }
        }

        Self::close_unterminated(path, &state, None, diagnostics);
        sections
    }

    /// Report a section left open, either by a new header or by end of file
    fn close_unterminated(path: &Path, state: &State, next_header: Option<usize>, diagnostics: &mut Vec<Diagnostic>) {
        let (tag, line) = match state {
            State::Outside => return,
            State::InSection(section) => (section.kind.tag().to_string(), section.line),
            State::Skipping { tag, line } => (tag.clone(), *line),
        };

        let long = match next_header {
            Some(next) => format!(
                "Section [{}] opened at line {} is not closed with 'end' before the next section at line {}; it was discarded.",
                tag, line, next
            ),
            None => format!(
                "Section [{}] opened at line {} reaches the end of the file without an 'end' line; it was discarded.",
                tag, line
            ),
        };
        warn!("Unterminated section [{}] in {:?}", tag, path);

        diagnostics.push(
            Diagnostic::error(
                Category::Parse,
                codes::PARSE_ERROR,
                format!("Unterminated [{}] section", tag),
                long,
            )
            .with_fix("Add a line containing only 'end' to close the section")
            .at(path, line),
        );
    }

    /// Attach shared test sets and loot actions to the interactions naming them
    fn resolve_links(ir: &mut ProjectIR, pending: Vec<InteractionLinks>, diagnostics: &mut Vec<Diagnostic>) {
        for group in pending {
            for link in group.links {
                let interaction_name = ir.interactions[group.interaction_index].id.name.clone();
                match link.kind {
                    LinkKind::TestSet => match ir.find_test_set(&link.name).cloned() {
                        Some(test_set) => ir.interactions[group.interaction_index].tests.push(test_set),
                        None => diagnostics.push(
                            Diagnostic::warning(
                                Category::Parse,
                                codes::UNDEFINED_TEST_SET_REFERENCE,
                                format!("Unknown test set '{}'", link.name),
                                format!(
                                    "Interaction '{}' references test set '{}', which is not defined in any source file.",
                                    interaction_name, link.name
                                ),
                            )
                            .with_fix("Define the test set in a [TestSet] section or fix the name")
                            .with_resource(interaction_name.clone())
                            .at(&group.file, link.line),
                        ),
                    },
                    LinkKind::LootAction => match ir.find_loot_action(&link.name).cloned() {
                        Some(loot) => ir.interactions[group.interaction_index].loot_actions.push(loot),
                        None => diagnostics.push(
                            Diagnostic::warning(
                                Category::Parse,
                                codes::UNDEFINED_LOOT_ACTION_REFERENCE,
                                format!("Unknown loot action '{}'", link.name),
                                format!(
                                    "Interaction '{}' references loot action '{}', which is not defined in any source file.",
                                    interaction_name, link.name
                                ),
                            )
                            .with_fix("Define the loot action in a [LootAction] section or fix the name")
                            .with_resource(interaction_name.clone())
                            .at(&group.file, link.line),
                        ),
                    },
                }
            }
        }
    }
}
