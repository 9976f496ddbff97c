//! Symbol kind mapping.
//!
//! SCIP carries a numeric `SymbolInformation.Kind`. Most indexers fill it in;
//! some (notably older TypeScript indexers) leave it unspecified and only emit
//! hover documentation. [`resolve`] tries the numeric table first and falls
//! back to [`from_documentation`] when the table has nothing to say.

use crate::types::SymbolKind;

/// Map a raw SCIP kind number onto the coarse vocabulary.
///
/// Unrecognized and unspecified values map to [`SymbolKind::Unknown`].
#[must_use]
pub fn from_scip(raw: i32) -> SymbolKind {
    match raw {
        7 | 62 | 63 | 75 | 84 => SymbolKind::Class,
        17 | 40 | 73 => SymbolKind::Function,
        26 | 47 | 66 | 67 | 68 | 69 | 70 | 71 | 72 | 74 | 76 | 80 => SymbolKind::Method,
        21 | 42 | 46 => SymbolKind::Interface,
        3 | 10 | 54 | 56 | 57 => SymbolKind::Type,
        55 => SymbolKind::TypeAlias,
        11 => SymbolKind::Enum,
        12 => SymbolKind::EnumMember,
        15 | 77 | 79 => SymbolKind::Field,
        4 | 22 | 41 | 81 => SymbolKind::Property,
        60 | 61 | 82 => SymbolKind::Variable,
        8 => SymbolKind::Constant,
        27 | 37 | 38 | 44 | 52 => SymbolKind::Parameter,
        58 => SymbolKind::TypeParameter,
        16 | 29 => SymbolKind::Module,
        30 | 36 => SymbolKind::Namespace,
        35 | 64 => SymbolKind::Package,
        9 => SymbolKind::Constructor,
        18 => SymbolKind::Getter,
        45 => SymbolKind::Setter,
        28 | 49 => SymbolKind::Struct,
        53 | 85 | 86 => SymbolKind::Trait,
        25 => SymbolKind::Macro,
        59 => SymbolKind::Union,
        33 => SymbolKind::Object,
        13 | 78 => SymbolKind::Event,
        34 => SymbolKind::Operator,
        _ => SymbolKind::Unknown,
    }
}

/// How a documentation rule matches the signature line.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Line starts with a hover tag such as `(property)`
    Tag(&'static str),
    /// Line starts with a keyword after `export`/`declare` are stripped
    Keyword(&'static str),
    /// Like `Keyword`, but the line must also contain `=`
    KeywordWithAssignment(&'static str),
}

impl Matcher {
    fn matches(self, raw: &str, stripped: &str) -> bool {
        match self {
            Self::Tag(tag) => raw.starts_with(tag),
            Self::Keyword(keyword) => stripped.starts_with(keyword),
            Self::KeywordWithAssignment(keyword) => {
                stripped.starts_with(keyword) && stripped.contains('=')
            }
        }
    }
}

/// Ordered documentation rules; the first match wins.
const DOC_RULES: &[(Matcher, SymbolKind)] = &[
    (Matcher::Tag("(property)"), SymbolKind::Property),
    (Matcher::Tag("(method)"), SymbolKind::Method),
    (Matcher::Tag("(enum member)"), SymbolKind::EnumMember),
    (Matcher::Tag("(parameter)"), SymbolKind::Parameter),
    (Matcher::Tag("(constructor)"), SymbolKind::Constructor),
    (Matcher::Keyword("interface "), SymbolKind::Interface),
    (Matcher::Keyword("abstract class "), SymbolKind::Class),
    (Matcher::Keyword("class "), SymbolKind::Class),
    (Matcher::Keyword("async function "), SymbolKind::Function),
    (Matcher::Keyword("function "), SymbolKind::Function),
    (Matcher::KeywordWithAssignment("type "), SymbolKind::TypeAlias),
    (Matcher::Keyword("type "), SymbolKind::Type),
    (Matcher::Keyword("enum "), SymbolKind::Enum),
    (Matcher::Keyword("const "), SymbolKind::Variable),
    (Matcher::Keyword("let "), SymbolKind::Variable),
    (Matcher::Keyword("var "), SymbolKind::Variable),
    (Matcher::Keyword("new "), SymbolKind::Constructor),
    (Matcher::Keyword("constructor("), SymbolKind::Constructor),
    (Matcher::Keyword("namespace "), SymbolKind::Namespace),
    (Matcher::Keyword("module "), SymbolKind::Module),
];

/// Guess a kind from hover documentation.
///
/// Only the first line that is neither blank nor a code fence is inspected.
#[must_use]
pub fn from_documentation(docs: &[String]) -> SymbolKind {
    let Some(line) = docs
        .iter()
        .flat_map(|doc| doc.lines())
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("```"))
    else {
        return SymbolKind::Unknown;
    };

    let stripped = strip_modifiers(line);
    DOC_RULES
        .iter()
        .find(|(matcher, _)| matcher.matches(line, stripped))
        .map_or(SymbolKind::Unknown, |(_, kind)| *kind)
}

fn strip_modifiers(mut line: &str) -> &str {
    loop {
        let next = line
            .strip_prefix("export ")
            .or_else(|| line.strip_prefix("declare "))
            .map(str::trim_start);
        match next {
            Some(rest) => line = rest,
            None => return line,
        }
    }
}

/// Resolve a symbol's kind from its numeric kind, falling back to docs.
#[must_use]
pub fn resolve(raw: i32, docs: &[String]) -> SymbolKind {
    match from_scip(raw) {
        SymbolKind::Unknown => from_documentation(docs),
        kind => kind,
    }
}
