//! Helpers over raw SCIP symbol identifiers.
//!
//! A global identifier has the shape
//! `<scheme> <manager> <package-name> <version> <descriptors>`, where a space
//! inside a field is escaped by doubling it. Local identifiers are
//! `local <id>` and are only unique within their document.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Marker that identifies document-local symbols.
pub const LOCAL_MARKER: &str = "local ";

/// Whether a symbol is local to its document.
#[must_use]
pub fn is_local(symbol: &str) -> bool {
    symbol.starts_with(LOCAL_MARKER) || symbol.contains(" local ")
}

/// The fields of a global symbol identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolParts {
    /// Indexer scheme, e.g. `scip-typescript`
    pub scheme: String,
    /// Package manager, e.g. `npm`
    pub manager: String,
    /// Package name
    pub package: String,
    /// Package version
    pub version: String,
    /// Descriptor suffix
    pub descriptors: String,
}

/// Split a global identifier into its fields.
///
/// Returns `None` for local symbols and identifiers with fewer than five
/// fields.
#[must_use]
pub fn split(symbol: &str) -> Option<SymbolParts> {
    if is_local(symbol) {
        return None;
    }

    let mut fields: Vec<String> = Vec::with_capacity(4);
    let mut current = String::new();
    let mut chars = symbol.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != ' ' {
            current.push(ch);
            continue;
        }
        if chars.peek().is_some_and(|(_, next)| *next == ' ') {
            chars.next();
            current.push(' ');
            continue;
        }
        fields.push(std::mem::take(&mut current));
        if fields.len() == 4 {
            let descriptors = symbol[idx + 1..].to_string();
            let [scheme, manager, package, version]: [String; 4] = fields.try_into().ok()?;
            return Some(SymbolParts {
                scheme,
                manager,
                package,
                version,
                descriptors,
            });
        }
    }

    None
}

/// Derive a human-readable name from a symbol identifier.
///
/// Uses the last descriptor with suffix punctuation, method disambiguators
/// and backtick quoting removed. Parameter and type-parameter descriptors
/// yield their inner name.
#[must_use]
pub fn display_name(symbol: &str) -> String {
    if let Some(id) = symbol.strip_prefix(LOCAL_MARKER) {
        return id.trim().to_string();
    }

    let descriptors = split(symbol).map_or_else(|| symbol.to_string(), |parts| parts.descriptors);
    descriptor_names(&descriptors)
        .pop()
        .unwrap_or_else(|| descriptors.trim().to_string())
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '+' | '-' | '$')
}

/// Parse the names out of a descriptor chain.
fn descriptor_names(descriptors: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = descriptors.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '[' | '(' => {
                let close = if ch == '[' { ']' } else { ')' };
                chars.next();
                let name = read_name(&mut chars);
                skip_past(&mut chars, close);
                if !name.is_empty() {
                    names.push(name);
                }
            }
            _ => {
                let name = read_name(&mut chars);
                match chars.peek() {
                    Some('(') => {
                        // Method disambiguator: `name(+1).`
                        skip_past(&mut chars, ')');
                        if chars.peek() == Some(&'.') {
                            chars.next();
                        }
                    }
                    Some('/' | '#' | '.' | ':' | '!') => {
                        chars.next();
                    }
                    Some(_) if name.is_empty() => {
                        chars.next();
                    }
                    _ => {}
                }
                if !name.is_empty() {
                    names.push(name);
                }
            }
        }
    }

    names
}

fn read_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();

    if chars.peek() == Some(&'`') {
        chars.next();
        while let Some(ch) = chars.next() {
            if ch == '`' {
                // A doubled backtick is an escaped literal backtick.
                if chars.peek() == Some(&'`') {
                    chars.next();
                    name.push('`');
                    continue;
                }
                break;
            }
            name.push(ch);
        }
        return name;
    }

    while let Some(&ch) = chars.peek() {
        if !is_identifier_char(ch) {
            break;
        }
        name.push(ch);
        chars.next();
    }
    name
}

fn skip_past(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, close: char) {
    for ch in chars.by_ref() {
        if ch == close {
            break;
        }
    }
}

/// A package referenced by a symbol identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRef {
    /// Package manager, e.g. `npm`, `maven`, `gomod`
    pub manager: String,
    /// Normalized package name
    pub name: String,
    /// Version, when the identifier carries one
    pub version: Option<String>,
}

/// Package-name shapes the extractor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageShape {
    /// `group:artifact`
    Coordinate,
    /// `host/org/repo`
    ModulePath,
    /// `name` or `@scope/name`, only meaningful with a version
    Versioned,
}

static PACKAGE_MATCHERS: LazyLock<Vec<(Regex, PackageShape)>> = LazyLock::new(|| {
    [
        (r"^[\w.\-]+:[\w.\-]+$", PackageShape::Coordinate),
        (r"^[\w.\-]+(/[\w.\-~]+)+$", PackageShape::ModulePath),
        (r"^(@[\w.\-]+/)?[\w.\-]+$", PackageShape::Versioned),
    ]
    .into_iter()
    .map(|(pattern, shape)| {
        (
            Regex::new(pattern).expect("package matcher patterns are valid"),
            shape,
        )
    })
    .collect()
});

/// Extract the owning package from a symbol identifier.
///
/// Returns `None` for local symbols, `.` placeholders, and package names of
/// unrecognized shape.
#[must_use]
pub fn extract_package(symbol: &str) -> Option<PackageRef> {
    let parts = split(symbol)?;
    if parts.package.is_empty() || parts.package == "." {
        return None;
    }

    let version = Some(parts.version)
        .filter(|version| !version.is_empty() && version != ".");

    let shape = PACKAGE_MATCHERS
        .iter()
        .find(|(regex, _)| regex.is_match(&parts.package))
        .map(|(_, shape)| *shape)?;

    if shape == PackageShape::Versioned && version.is_none() {
        return None;
    }

    Some(PackageRef {
        manager: parts.manager,
        name: parts.package,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("local 12", true)]
    #[case("scip-typescript npm app 1.0.0 src/`a.ts`/Foo#", false)]
    #[case("", false)]
    fn locality(#[case] symbol: &str, #[case] expected: bool) {
        assert_eq!(is_local(symbol), expected);
    }

    #[test]
    fn split_handles_escaped_spaces() {
        let parts = split("scip-dotnet nuget My  Package 2.0 Ns/Type#").unwrap();
        assert_eq!(parts.scheme, "scip-dotnet");
        assert_eq!(parts.manager, "nuget");
        assert_eq!(parts.package, "My Package");
        assert_eq!(parts.version, "2.0");
        assert_eq!(parts.descriptors, "Ns/Type#");
    }

    #[test]
    fn split_rejects_short_and_local_identifiers() {
        assert!(split("local 4").is_none());
        assert!(split("scip-go gomod pkg").is_none());
    }

    #[rstest]
    #[case("scip-typescript npm app 1.0.0 src/`app.ts`/App#", "App")]
    #[case("scip-typescript npm app 1.0.0 src/`app.ts`/App#render().", "render")]
    #[case("scip-java maven com.acme:core 1.2 com/acme/Service#run(+1).", "run")]
    #[case("scip-typescript npm app 1.0.0 src/`util.ts`/LIMIT.", "LIMIT")]
    #[case("scip-typescript npm app 1.0.0 src/`app.ts`/App#render().(props)", "props")]
    #[case("scip-typescript npm app 1.0.0 src/`box.ts`/Box#[T]", "T")]
    #[case("rust-analyzer cargo core 1.0 fmt/macros/println!", "println")]
    #[case("scip-python python pkg 0.1 `pkg.mod`/", "pkg.mod")]
    #[case("scip-go gomod github.com/org/repo v1.0.0 `github.com/org/repo/x`/Meta:", "Meta")]
    #[case("local 7", "7")]
    fn display_name_uses_last_descriptor(#[case] symbol: &str, #[case] expected: &str) {
        assert_eq!(display_name(symbol), expected);
    }

    #[test]
    fn display_name_unescapes_doubled_backticks() {
        assert_eq!(display_name("s m p 1 `a``b`#"), "a`b");
    }

    #[rstest]
    #[case("scip-java maven com.acme:core 1.2 com/acme/Service#", "maven", "com.acme:core", Some("1.2"))]
    #[case("scip-go gomod github.com/org/repo v1.0.0 `x`/Y#", "gomod", "github.com/org/repo", Some("v1.0.0"))]
    #[case("scip-typescript npm @types/node 20.1.0 `fs.d.ts`/", "npm", "@types/node", Some("20.1.0"))]
    #[case("scip-typescript npm react 18.2.0 `index.d.ts`/useState().", "npm", "react", Some("18.2.0"))]
    fn extract_package_recognizes_shapes(
        #[case] symbol: &str,
        #[case] manager: &str,
        #[case] name: &str,
        #[case] version: Option<&str>,
    ) {
        let package = extract_package(symbol).expect("package should be recognized");
        assert_eq!(package.manager, manager);
        assert_eq!(package.name, name);
        assert_eq!(package.version.as_deref(), version);
    }

    #[rstest]
    #[case("local 3")]
    #[case("scip-python python . . `mod`/x.")]
    #[case("scip-typescript npm react . `index.d.ts`/x.")]
    #[case("scip-typescript npm we!rd 1.0 `a.ts`/x.")]
    fn extract_package_rejects_unusable_identifiers(#[case] symbol: &str) {
        assert_eq!(extract_package(symbol), None);
    }
}
