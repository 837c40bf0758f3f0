//! Line-oriented grammar validation of manifest text.
//!
//! Runs over the raw text before any YAML parsing. Checks that the header
//! declares a known `command_set`, that each document after a `---` separator
//! opens with a `command` allowed in that set, and that every further key in
//! a command document is on that command's attribute whitelist.
//!
//! A line whose trimmed form is shorter than three characters, or that starts
//! with `#`, marks the end of the meaningful content: nothing after it is
//! validated or parsed. Tabs are reported wherever they occur without ending
//! the scan.

use std::fmt;

use winnow::ascii::space0;
use winnow::token::{rest, take_while};
use winnow::{ModalResult, Parser};

use crate::catalog::{CommandSet, CommandSpec};

// ---------------------------------------------------------------------------
// Diagnostic types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule: &'static str,
    pub severity: Severity,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, when the problem has a precise position.
    pub column: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(col) => write!(f, "line {}, col {}: {}", self.line, col, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

/// Result of scanning one manifest.
#[derive(Debug, Clone)]
pub struct Validation {
    pub diagnostics: Vec<Diagnostic>,
    /// The declared command-set, when the header was valid.
    pub command_set: Option<CommandSet>,
    /// Byte length of the meaningful prefix of the source.
    pub meaningful_len: usize,
}

impl Validation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// The part of `source` that was validated and may be parsed.
    pub fn meaningful<'a>(&self, source: &'a str) -> &'a str {
        &source[..self.meaningful_len.min(source.len())]
    }
}

// ---------------------------------------------------------------------------
// Line parsers
// ---------------------------------------------------------------------------

fn key<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

/// `<indent> key <ws> ':' value`
fn declaration<'i>(input: &mut &'i str) -> ModalResult<(&'i str, &'i str)> {
    let _ = space0.parse_next(input)?;
    let name = key.parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let _ = ':'.parse_next(input)?;
    let value = rest.parse_next(input)?;
    Ok((name, value))
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("")
}

/// Split a line into `(key, value)`; inline `#` comments are dropped and the
/// value is unquoted.
fn parse_declaration(line: &str) -> Option<(&str, &str)> {
    let mut input = strip_comment(line);
    let (name, value) = declaration.parse_next(&mut input).ok()?;
    let value = value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    Some((name, value))
}

fn ends_meaningful_content(trimmed: &str) -> bool {
    trimmed.chars().count() < 3 || trimmed.starts_with('#')
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Expect {
    CommandSet,
    Separator(CommandSet),
    Command(CommandSet),
    Attribute(CommandSet, &'static CommandSpec),
}

fn error(rule: &'static str, line: usize, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        rule,
        severity: Severity::Error,
        line,
        column: None,
        message: message.into(),
    }
}

/// Scan `source` and collect diagnostics.
pub fn validate_text(source: &str) -> Validation {
    let mut diagnostics = Vec::new();
    let mut expect = Expect::CommandSet;
    let mut offset = 0;
    let mut meaningful_len = source.len();
    let mut last_line = 0;

    for (idx, raw) in source.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim();

        if ends_meaningful_content(trimmed) {
            meaningful_len = offset;
            let remainder = &source[offset + raw.len()..];
            let ignored = remainder
                .lines()
                .filter(|l| {
                    let t = l.trim();
                    !t.is_empty() && !t.starts_with('#')
                })
                .count();
            if ignored > 0 {
                diagnostics.push(Diagnostic {
                    rule: "trailing_content",
                    severity: Severity::Warning,
                    line: line_no,
                    column: None,
                    message: format!(
                        "{ignored} line(s) after the end-of-content marker are ignored"
                    ),
                });
            }
            break;
        }
        offset += raw.len();
        last_line = line_no;

        if let Some(pos) = line.find('\t') {
            diagnostics.push(Diagnostic {
                rule: "no_tabs",
                severity: Severity::Error,
                line: line_no,
                column: Some(pos + 1),
                message: "tab character found; indent with spaces".into(),
            });
        }

        if trimmed.starts_with("---") {
            if strip_comment(line).trim() != "---" {
                diagnostics.push(error(
                    "declaration",
                    line_no,
                    format!("a document separator must stand alone, found '{trimmed}'"),
                ));
                break;
            }
            expect = match expect {
                Expect::CommandSet => Expect::CommandSet,
                Expect::Separator(set) | Expect::Command(set) | Expect::Attribute(set, _) => {
                    Expect::Command(set)
                }
            };
            continue;
        }

        let Some((name, value)) = parse_declaration(line) else {
            diagnostics.push(error(
                "declaration",
                line_no,
                format!("expected a 'key: value' declaration, found '{trimmed}'"),
            ));
            break;
        };

        match expect {
            Expect::CommandSet => {
                if name != "command_set" {
                    diagnostics.push(error(
                        "command_set",
                        line_no,
                        format!("manifest must begin with 'command_set: <name>', found '{name}'"),
                    ));
                    break;
                }
                match CommandSet::lookup(value) {
                    Some(set) => expect = Expect::Separator(set),
                    None => {
                        diagnostics.push(error(
                            "command_set",
                            line_no,
                            format!("'{value}' is not a valid command_set"),
                        ));
                        break;
                    }
                }
            }
            Expect::Separator(set) => {
                diagnostics.push(error(
                    "separator",
                    line_no,
                    format!("expected '---' after 'command_set: {set}', found '{name}'"),
                ));
                break;
            }
            Expect::Command(set) => {
                if name != "command" {
                    diagnostics.push(error(
                        "command",
                        line_no,
                        format!("expected 'command: <name>', found '{name}'"),
                    ));
                    break;
                }
                match set.command(value) {
                    Some(spec) => expect = Expect::Attribute(set, spec),
                    None => {
                        diagnostics.push(error(
                            "command",
                            line_no,
                            format!(
                                "'{value}' is not a command of command_set '{set}' (allowed: {})",
                                set.command_names().join(", ")
                            ),
                        ));
                        break;
                    }
                }
            }
            Expect::Attribute(_, spec) => {
                if !spec.allows_attribute(name) {
                    diagnostics.push(error(
                        "attribute",
                        line_no,
                        format!("'{name}' is not valid in command '{}'", spec.name),
                    ));
                    break;
                }
            }
        }
    }

    let command_set = match expect {
        Expect::CommandSet => {
            if !diagnostics.iter().any(|d| d.rule == "command_set") {
                diagnostics.push(error(
                    "command_set",
                    last_line.max(1),
                    "manifest does not declare a command_set",
                ));
            }
            None
        }
        Expect::Separator(set) | Expect::Command(set) | Expect::Attribute(set, _) => Some(set),
    };

    Validation {
        diagnostics,
        command_set,
        meaningful_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP_MANIFEST: &str = "\
command_set: top
---
command: identity
person: don
send_log: true
---
command: process_single_folder
folder: Content
folder_type: site_content
";

    fn error_rules(v: &Validation) -> Vec<&'static str> {
        v.errors().map(|d| d.rule).collect()
    }

    #[test]
    fn well_formed_manifest_has_no_diagnostics() {
        let v = validate_text(TOP_MANIFEST);
        assert!(v.diagnostics.is_empty(), "{:?}", v.diagnostics);
        assert_eq!(v.command_set, Some(CommandSet::Top));
        assert_eq!(v.meaningful_len, TOP_MANIFEST.len());
    }

    #[test]
    fn command_set_and_command_names_are_case_folded() {
        let v = validate_text("command_set: Content\n---\ncommand: ALL\n");
        assert!(!v.has_errors(), "{:?}", v.diagnostics);
        assert_eq!(v.command_set, Some(CommandSet::Content));
    }

    #[test]
    fn indented_attributes_are_accepted() {
        let v = validate_text("command_set: story\n---\ncommand: identity\n  person: sam\n");
        assert!(!v.has_errors(), "{:?}", v.diagnostics);
    }

    #[test]
    fn missing_command_set_header_fails() {
        let v = validate_text("command: story\n");
        assert_eq!(error_rules(&v), vec!["command_set"]);
        assert_eq!(v.command_set, None);
    }

    #[test]
    fn unknown_command_set_fails() {
        let v = validate_text("command_set: pages\n---\ncommand: identity\n");
        assert!(v.has_errors());
        assert!(v.diagnostics[0].message.contains("'pages' is not a valid command_set"));
        assert_eq!(v.command_set, None);
    }

    #[test]
    fn empty_text_fails() {
        let v = validate_text("");
        assert_eq!(error_rules(&v), vec!["command_set"]);
    }

    #[test]
    fn command_outside_set_fails() {
        let v = validate_text("command_set: story\n---\ncommand: bogus\n");
        let errors: Vec<_> = v.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert!(errors[0].message.contains("allowed: identity, story"));
    }

    #[test]
    fn attribute_outside_whitelist_fails() {
        let v = validate_text("command_set: content\n---\ncommand: all\nfolder: x\n");
        assert_eq!(error_rules(&v), vec!["attribute"]);
        assert_eq!(v.errors().next().unwrap().line, 4);
    }

    #[test]
    fn document_must_open_with_command() {
        let v = validate_text("command_set: top\n---\nperson: don\ncommand: identity\n");
        assert_eq!(error_rules(&v), vec!["command"]);
    }

    #[test]
    fn header_must_be_followed_by_separator() {
        let v = validate_text("command_set: top\ncommand: identity\n");
        assert_eq!(error_rules(&v), vec!["separator"]);
    }

    #[test]
    fn non_declaration_line_fails() {
        let v = validate_text("command_set: top\n---\njust some words\n");
        assert_eq!(error_rules(&v), vec!["declaration"]);
    }

    #[test]
    fn tab_is_reported_with_position() {
        let v = validate_text("command_set: story\n---\ncommand: story\n\tperson: x\n");
        let tab = v.diagnostics.iter().find(|d| d.rule == "no_tabs").unwrap();
        assert_eq!(tab.line, 4);
        assert_eq!(tab.column, Some(1));
        assert!(v.has_errors());
    }

    #[test]
    fn tab_does_not_hide_later_errors() {
        let source = "command_set:\tstory\n---\ncommand: bogus\n";
        let v = validate_text(source);
        assert_eq!(error_rules(&v), vec!["no_tabs", "command"]);
    }

    #[test]
    fn multiple_tabs_are_all_reported() {
        let source = "command_set:\ttop\n---\ncommand:\tidentity\nperson:\tdon\n";
        let v = validate_text(source);
        assert_eq!(error_rules(&v), vec!["no_tabs", "no_tabs", "no_tabs"]);
    }

    #[test]
    fn short_line_ends_meaningful_content() {
        let source = "command_set: story\n---\ncommand: story\n\ncommand: bogus\n";
        let v = validate_text(source);
        assert!(!v.has_errors(), "{:?}", v.diagnostics);
        assert_eq!(
            v.meaningful(source),
            "command_set: story\n---\ncommand: story\n"
        );
        let warning = &v.diagnostics[0];
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.rule, "trailing_content");
    }

    #[test]
    fn comment_line_ends_meaningful_content() {
        let source = "command_set: content\n---\ncommand: all\n# notes below\n";
        let v = validate_text(source);
        assert!(v.diagnostics.is_empty(), "{:?}", v.diagnostics);
        assert_eq!(v.meaningful(source), "command_set: content\n---\ncommand: all\n");
    }

    #[test]
    fn inline_comments_and_quotes_are_stripped() {
        let v = validate_text("command_set: \"top\"  # header\n---\ncommand: 'identity' # me\n");
        assert!(!v.has_errors(), "{:?}", v.diagnostics);
        assert_eq!(v.command_set, Some(CommandSet::Top));
    }

    #[test]
    fn trailing_separator_is_allowed() {
        let v = validate_text("command_set: story\n---\ncommand: story\n---\n");
        assert!(!v.has_errors(), "{:?}", v.diagnostics);
    }

    #[test]
    fn separator_carrying_a_document_fails() {
        let v = validate_text(
            "command_set: transfer_files\n--- {command: move_files, target_directory: b, person: x}\n",
        );
        assert_eq!(error_rules(&v), vec!["declaration"]);
        assert_eq!(v.errors().next().unwrap().line, 2);
    }

    #[test]
    fn separator_with_comment_is_accepted() {
        let v = validate_text("command_set: story\n---   # next\ncommand: story\n");
        assert!(!v.has_errors(), "{:?}", v.diagnostics);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let v = validate_text("command_set: story\r\n---\r\ncommand: story\r\n");
        assert!(!v.has_errors(), "{:?}", v.diagnostics);
    }

    #[test]
    fn diagnostic_display_includes_position() {
        let v = validate_text("command_set:\ttop\n");
        assert_eq!(
            v.diagnostics[0].to_string(),
            "line 1, col 13: tab character found; indent with spaces"
        );
    }
}
