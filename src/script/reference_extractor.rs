//! Dot-source and module-import extraction for PowerShell scripts.
//!
//! Extraction is line-oriented and regex-driven. Comments are blanked out before
//! matching (`# ...` to end of line and `<# ... #>` blocks, which may span lines)
//! so that commented-out directives are ignored, while byte offsets within each
//! line stay intact for the rewriter.
//!
//! # Classification
//!
//! Each path expression is classified once, here, before any filesystem access:
//!
//! - a parenthesized or `$(...)` expression is [`ResolutionStatus::Variable`]
//! - text containing a `$` variable other than `$PSScriptRoot` / `${PSScriptRoot}`
//!   is [`ResolutionStatus::Variable`]
//! - everything else starts as [`ResolutionStatus::NotFound`] and is upgraded to
//!   [`ResolutionStatus::Resolved`] by the path resolver when a file is located
//!
//! # Usage
//!
//! ```rust,no_run
//! use pspack::script::{extract_references, ResolutionStatus};
//! use std::path::Path;
//!
//! let script = r#"
//! . $PSScriptRoot\lib\Config.ps1
//! . $SomeUnknownVar\file.ps1
//! "#;
//!
//! let refs = extract_references(script, Path::new("/project/Main.ps1"));
//! assert_eq!(refs.len(), 2);
//! assert_eq!(refs[0].raw_text, r"$PSScriptRoot\lib\Config.ps1");
//! assert_eq!(refs[1].status, ResolutionStatus::Variable);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// File extensions treated as PowerShell scripts.
pub const SCRIPT_EXTENSIONS: &[&str] = &["ps1", "psm1", "psd1"];

/// Byte order mark that Windows editors put in front of UTF-8 scripts.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

const BRACED_ANCHOR: &[u8] = b"${psscriptroot}";
const PLAIN_ANCHOR: &[u8] = b"$psscriptroot";

/// Import-Module parameters whose value is the module path.
const PATH_PARAMETERS: &[&str] = &["-name", "-path", "-literalpath", "-lp", "-pspath", "-fullyqualifiedname"];

/// Import-Module parameters that consume a value which is not a path.
const VALUE_PARAMETERS: &[&str] = &[
    "-prefix",
    "-minimumversion",
    "-maximumversion",
    "-requiredversion",
    "-version",
    "-argumentlist",
    "-args",
    "-function",
    "-cmdlet",
    "-variable",
    "-alias",
    "-scope",
    "-pssession",
    "-cimsession",
    "-cimresourceuri",
    "-cimnamespace",
    "-erroraction",
    "-ea",
    "-errorvariable",
    "-ev",
    "-warningaction",
    "-wa",
    "-warningvariable",
    "-wv",
    "-informationaction",
    "-infa",
    "-informationvariable",
    "-iv",
    "-outvariable",
    "-ov",
];

/// Syntactic form of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `. <path>`
    DotSource,
    /// `Import-Module <path>` or `using module <path>`
    ModuleImport,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DotSource => write!(f, "dot-source"),
            Self::ModuleImport => write!(f, "module import"),
        }
    }
}

/// Outcome of resolving a reference to a concrete file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// A concrete file was located; `resolved_path` is set.
    Resolved,
    /// Resolution was attempted against every candidate location and failed.
    NotFound,
    /// The path depends on a runtime variable and is never resolved.
    Variable,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::NotFound => write!(f, "not found"),
            Self::Variable => write!(f, "variable"),
        }
    }
}

/// One outbound reference found in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    /// Absolute path of the script containing the reference.
    pub origin_path: PathBuf,

    /// The path expression exactly as written, without surrounding quotes.
    pub raw_text: String,

    pub kind: ReferenceKind,

    /// 1-based line of the directive. Zero marks the synthetic reference produced
    /// for an unreadable file.
    pub line_number: usize,

    /// Byte offset within the line where `raw_text` starts.
    pub column_start: usize,

    /// Byte offset within the line just past the end of `raw_text`.
    pub column_end: usize,

    #[serde(rename = "resolution_status")]
    pub status: ResolutionStatus,

    /// Set only when `status` is [`ResolutionStatus::Resolved`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<PathBuf>,
}

impl SourceReference {
    /// The single reference reported for a file that could not be read.
    #[must_use]
    pub fn unreadable(origin_path: &Path) -> Self {
        Self {
            origin_path: origin_path.to_path_buf(),
            raw_text: String::new(),
            kind: ReferenceKind::DotSource,
            line_number: 0,
            column_start: 0,
            column_end: 0,
            status: ResolutionStatus::NotFound,
            resolved_path: None,
        }
    }

    /// Whether this is the synthetic reference standing in for a read failure.
    #[must_use]
    pub const fn is_read_failure(&self) -> bool {
        self.line_number == 0
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }
}

/// Extracts every dot-source and module-import reference from script text.
///
/// Never fails: text that does not parse as a directive is simply not reported.
/// References come back in file order, and in column order within a line.
#[must_use]
pub fn extract_references(contents: &str, file_path: &Path) -> Vec<SourceReference> {
    let patterns = match DirectivePatterns::new() {
        Ok(patterns) => patterns,
        Err(e) => {
            warn!("Directive patterns failed to compile: {e}");
            return Vec::new();
        }
    };

    let mut mask = CommentMask::default();
    let mut references = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let code = mask.apply(line);
        let mut found: Vec<(ReferenceKind, Token)> = Vec::new();

        for directive in patterns.dot_source.find_iter(&code) {
            if let Some(token) = next_token(&code, directive.end()) {
                found.push((ReferenceKind::DotSource, token));
            }
        }
        for directive in patterns.import_module.find_iter(&code) {
            if let Some(token) = import_argument(&code, directive.end()) {
                found.push((ReferenceKind::ModuleImport, token));
            }
        }
        if let Some(directive) = patterns.using_module.find(&code)
            && let Some(token) = next_token(&code, directive.end())
        {
            found.push((ReferenceKind::ModuleImport, token));
        }

        found.sort_by_key(|(_, token)| token.start);

        for (kind, token) in found {
            let text = &line[token.start..token.end];
            let Some(status) = classify(text, token.form) else {
                trace!("Ignoring {kind} target '{text}' at {}:{}", file_path.display(), index + 1);
                continue;
            };

            references.push(SourceReference {
                origin_path: file_path.to_path_buf(),
                raw_text: text.to_string(),
                kind,
                line_number: index + 1,
                column_start: token.start,
                column_end: token.end,
                status,
                resolved_path: None,
            });
        }
    }

    debug!("Extracted {} references from {}", references.len(), file_path.display());
    references
}

/// Reads a script from disk and extracts its references.
///
/// An unreadable file yields exactly one [`SourceReference::unreadable`] entry.
#[must_use]
pub fn extract_from_path(file_path: &Path) -> Vec<SourceReference> {
    match fs::read(file_path) {
        Ok(bytes) => extract_references(&decode_script(&bytes), file_path),
        Err(e) => {
            warn!("Cannot read {}: {e}", file_path.display());
            vec![SourceReference::unreadable(file_path)]
        }
    }
}

/// Decodes script bytes, honoring UTF-8 and UTF-16 byte order marks.
///
/// Invalid sequences are replaced rather than rejected.
#[must_use]
pub fn decode_script(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = rest.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// Whether a path has a PowerShell script extension.
#[must_use]
pub fn is_script_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Splits a leading script-root anchor off a path expression.
///
/// Returns the anchor as written and the remainder (which usually starts with a
/// separator), or `None` when the text does not start with the anchor.
#[must_use]
pub fn strip_leading_anchor(text: &str) -> Option<(&str, &str)> {
    let len = anchor_len(text.as_bytes(), 0)?;
    Some(text.split_at(len))
}

/// Replaces every script-root anchor in `text` with `script_dir`.
#[must_use]
pub fn expand_anchor(text: &str, script_dir: &Path) -> String {
    let bytes = text.as_bytes();
    let dir = script_dir.to_string_lossy();
    let mut out = String::with_capacity(text.len() + dir.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if let Some(len) = anchor_len(bytes, pos) {
            out.push_str(&text[copied..pos]);
            out.push_str(&dir);
            pos += len;
            copied = pos;
        } else {
            pos += 1;
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn anchor_len(bytes: &[u8], pos: usize) -> Option<usize> {
    let rest = &bytes[pos..];
    if rest.len() >= BRACED_ANCHOR.len() && rest[..BRACED_ANCHOR.len()].eq_ignore_ascii_case(BRACED_ANCHOR) {
        return Some(BRACED_ANCHOR.len());
    }
    if rest.len() >= PLAIN_ANCHOR.len() && rest[..PLAIN_ANCHOR.len()].eq_ignore_ascii_case(PLAIN_ANCHOR) {
        let boundary = rest
            .get(PLAIN_ANCHOR.len())
            .is_none_or(|next| !(next.is_ascii_alphanumeric() || *next == b'_'));
        if boundary {
            return Some(PLAIN_ANCHOR.len());
        }
    }
    None
}

fn has_unknown_variable(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'$' {
            match anchor_len(bytes, pos) {
                Some(len) => pos += len,
                None => return true,
            }
        } else {
            pos += 1;
        }
    }
    false
}

fn classify(text: &str, form: TokenForm) -> Option<ResolutionStatus> {
    if form == TokenForm::Expression {
        return Some(ResolutionStatus::Variable);
    }
    if text.trim().is_empty() {
        return None;
    }
    if has_unknown_variable(text) {
        return Some(ResolutionStatus::Variable);
    }
    if !names_a_file(text) {
        return None;
    }
    Some(ResolutionStatus::NotFound)
}

/// Registered module names and function names carry neither a separator nor an
/// extension.
fn names_a_file(text: &str) -> bool {
    text.contains(['/', '\\', '$'])
        || Path::new(text).extension().is_some_and(|ext| !ext.is_empty())
}

struct DirectivePatterns {
    dot_source: Regex,
    import_module: Regex,
    using_module: Regex,
}

impl DirectivePatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            dot_source: Regex::new(r"(?:^|[;{])[ \t]*\.[ \t]+")?,
            import_module: Regex::new(r"(?i)(?:^|[;{(|=])[ \t]*Import-Module[ \t]+")?,
            using_module: Regex::new(r"(?i)^[ \t]*using[ \t]+module[ \t]+")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenForm {
    Bare,
    Quoted,
    Expression,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    next: usize,
    form: TokenForm,
}

/// Reads one argument token starting at byte `from`.
///
/// Quoted tokens exclude their quotes. Returns `None` at the end of the statement.
fn next_token(line: &str, from: usize) -> Option<Token> {
    let bytes = line.as_bytes();
    let mut pos = from;
    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
        pos += 1;
    }

    match *bytes.get(pos)? {
        quote @ (b'\'' | b'"') => {
            let start = pos + 1;
            let close = start + bytes[start..].iter().position(|b| *b == quote)?;
            Some(Token {
                start,
                end: close,
                next: close + 1,
                form: TokenForm::Quoted,
            })
        }
        b'(' => {
            let end = balanced_end(bytes, pos);
            Some(Token {
                start: pos,
                end,
                next: end,
                form: TokenForm::Expression,
            })
        }
        b'$' if bytes.get(pos + 1) == Some(&b'(') => {
            let end = balanced_end(bytes, pos + 1);
            Some(Token {
                start: pos,
                end,
                next: end,
                form: TokenForm::Expression,
            })
        }
        b';' | b'|' | b'{' | b'}' | b')' => None,
        _ => {
            let end = bytes[pos..]
                .iter()
                .position(|b| b.is_ascii_whitespace() || matches!(b, b';' | b'|' | b')' | b'}'))
                .map_or(bytes.len(), |offset| pos + offset);
            Some(Token {
                start: pos,
                end,
                next: end,
                form: TokenForm::Bare,
            })
        }
    }
}

fn balanced_end(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    for (offset, byte) in bytes[open..].iter().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return open + offset + 1;
                }
            }
            _ => {}
        }
    }
    bytes.len()
}

/// Finds the module path argument of an `Import-Module` call.
///
/// A named path parameter wins over the first positional argument.
fn import_argument(line: &str, from: usize) -> Option<Token> {
    let mut pos = from;
    let mut positional = None;

    while let Some(token) = next_token(line, pos) {
        pos = token.next;
        let text = &line[token.start..token.end];

        if token.form == TokenForm::Bare && text.starts_with('-') {
            let (parameter, inline_value) = match text.split_once(':') {
                Some((parameter, _)) => (parameter, true),
                None => (text, false),
            };
            let lowered = parameter.to_ascii_lowercase();

            if PATH_PARAMETERS.contains(&lowered.as_str()) {
                return if inline_value {
                    next_token(line, token.start + parameter.len() + 1)
                } else {
                    next_token(line, pos)
                };
            }
            if !inline_value
                && VALUE_PARAMETERS.contains(&lowered.as_str())
                && let Some(value) = next_token(line, pos)
            {
                pos = value.next;
            }
            continue;
        }

        if positional.is_none() {
            positional = Some(token);
        }
    }

    positional
}

/// Blanks out comments while keeping byte offsets stable.
#[derive(Debug, Default)]
struct CommentMask {
    in_block: bool,
    /// Quote character of an open here-string (`@"` or `@'`).
    in_here: Option<char>,
}

impl CommentMask {
    fn apply(&mut self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut code = line;

        if let Some(open) = self.in_here {
            // The terminator must start the line.
            let mut head = line.chars();
            if head.next() == Some(open) && head.next() == Some('@') {
                out.push_str("  ");
                code = &line[2..];
                self.in_here = None;
            } else {
                line.chars().for_each(|ch| blank(&mut out, ch));
                return out;
            }
        }

        let mut chars = code.chars().peekable();
        let mut quote: Option<char> = None;
        let mut previous: Option<char> = None;

        while let Some(ch) = chars.next() {
            if self.in_block {
                if ch == '#' && chars.peek() == Some(&'>') {
                    chars.next();
                    out.push_str("  ");
                    self.in_block = false;
                } else {
                    blank(&mut out, ch);
                }
                previous = Some(' ');
                continue;
            }

            if let Some(open) = quote {
                if ch == open {
                    quote = None;
                }
                out.push(ch);
                previous = Some(ch);
                continue;
            }

            if ch == '@'
                && let Some(&open) = chars.peek()
                && (open == '"' || open == '\'')
                && chars.clone().skip(1).all(char::is_whitespace)
            {
                out.push(ch);
                out.push(open);
                chars.next();
                for rest in chars.by_ref() {
                    blank(&mut out, rest);
                }
                self.in_here = Some(open);
                break;
            }

            if ch == '<' && chars.peek() == Some(&'#') {
                chars.next();
                out.push_str("  ");
                self.in_block = true;
                previous = Some(' ');
                continue;
            }

            if ch == '#' && previous.is_none_or(|p| p.is_whitespace() || p == ';') {
                blank(&mut out, ch);
                for rest in chars.by_ref() {
                    blank(&mut out, rest);
                }
                break;
            }

            if ch == '\'' || ch == '"' {
                quote = Some(ch);
            }
            out.push(ch);
            previous = Some(ch);
        }

        out
    }
}

fn blank(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}
