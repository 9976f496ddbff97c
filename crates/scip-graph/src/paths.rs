//! User-supplied path normalization and lookup.
//!
//! Query arguments arrive in many shapes (`./src/a.ts`, `src\a.ts`, an
//! absolute path under the project root, a directory). [`resolve`] turns one
//! into a stored relative path or tells the caller why it could not.

use std::path::Path;

/// Maximum suggestions offered for an unknown path.
pub const MAX_SUGGESTIONS: usize = 5;

/// Outcome of looking a path up among the stored files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLookup {
    /// Exact match on a stored file
    Found(String),
    /// The path is a directory; stored files below it, sorted
    IsDirectory(Vec<String>),
    /// No exact match; similar stored paths, best first
    Suggestions(Vec<String>),
    /// Nothing similar
    NotFound,
}

/// Normalize a user path into the stored relative form.
///
/// Backslashes become slashes, the project root prefix and any leading `./`
/// are stripped, and trailing slashes are dropped.
#[must_use]
pub fn normalize(input: &str, project_root: Option<&Path>) -> String {
    let mut path = input.trim().replace('\\', "/");

    if let Some(root) = project_root {
        let root = root.to_string_lossy().replace('\\', "/");
        let root = root.trim_end_matches('/');
        if !root.is_empty() {
            if let Some(rest) = path.strip_prefix(root) {
                if rest.is_empty() || rest.starts_with('/') {
                    path = rest.trim_start_matches('/').to_string();
                }
            }
        }
    }

    let mut rest = path.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    rest.trim_end_matches('/').to_string()
}

/// Look `input` up among `indexed` paths.
pub fn resolve<'a, I>(input: &str, project_root: Option<&Path>, indexed: I) -> PathLookup
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = normalize(input, project_root);
    let indexed: Vec<&str> = indexed.into_iter().collect();

    if wanted.is_empty() {
        return directory_or_nothing(indexed.iter().map(|path| (*path).to_string()).collect());
    }

    if indexed.contains(&wanted.as_str()) {
        return PathLookup::Found(wanted);
    }

    let prefix = format!("{wanted}/");
    let below: Vec<String> = indexed
        .iter()
        .filter(|path| path.starts_with(&prefix))
        .map(|path| (*path).to_string())
        .collect();
    if !below.is_empty() {
        return directory_or_nothing(below);
    }

    let suggestions = suggest(&wanted, &indexed);
    if suggestions.is_empty() {
        PathLookup::NotFound
    } else {
        PathLookup::Suggestions(suggestions)
    }
}

fn directory_or_nothing(mut candidates: Vec<String>) -> PathLookup {
    if candidates.is_empty() {
        return PathLookup::NotFound;
    }
    candidates.sort();
    PathLookup::IsDirectory(candidates)
}

/// Rank stored paths by similarity to `wanted`.
///
/// Suffix matches rank above same-file-name matches, which rank above
/// substring matches. Ties go to the shorter path, then alphabetical.
fn suggest(wanted: &str, indexed: &[&str]) -> Vec<String> {
    let wanted_name = file_name(wanted);
    let wanted_stem = file_stem(wanted_name);
    let suffix = format!("/{wanted}");

    let mut ranked: Vec<(u8, &str)> = indexed
        .iter()
        .filter_map(|path| {
            let name = file_name(path);
            let rank = if path.ends_with(&suffix) {
                0
            } else if name == wanted_name {
                1
            } else if !wanted_stem.is_empty() && file_stem(name) == wanted_stem {
                2
            } else if path.contains(wanted) {
                3
            } else {
                return None;
            };
            Some((rank, *path))
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.len().cmp(&b.1.len()))
            .then(a.1.cmp(b.1))
    });
    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, path)| path.to_string())
        .collect()
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const INDEXED: &[&str] = &[
        "src/app.ts",
        "src/util/format.ts",
        "src/util/parse.ts",
        "lib/format.js",
    ];

    fn lookup(input: &str) -> PathLookup {
        resolve(input, Some(Path::new("/work/project")), INDEXED.iter().copied())
    }

    #[rstest]
    #[case("src/app.ts", "src/app.ts")]
    #[case("./src/app.ts", "src/app.ts")]
    #[case("././src/app.ts", "src/app.ts")]
    #[case("src\\util\\parse.ts", "src/util/parse.ts")]
    #[case("/work/project/src/app.ts", "src/app.ts")]
    #[case("src/util/", "src/util")]
    #[case("/work/projectile/a.ts", "/work/projectile/a.ts")]
    fn normalize_produces_stored_form(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input, Some(Path::new("/work/project"))), expected);
    }

    #[test]
    fn exact_match_is_found() {
        assert_eq!(lookup("./src/app.ts"), PathLookup::Found("src/app.ts".into()));
    }

    #[test]
    fn directory_lists_files_below_it() {
        assert_eq!(
            lookup("src/util"),
            PathLookup::IsDirectory(vec![
                "src/util/format.ts".into(),
                "src/util/parse.ts".into()
            ])
        );
    }

    #[test]
    fn suffix_match_ranks_first() {
        let PathLookup::Suggestions(found) = lookup("util/parse.ts") else {
            panic!("expected suggestions");
        };
        assert_eq!(found[0], "src/util/parse.ts");
    }

    #[test]
    fn same_stem_in_other_language_is_suggested() {
        let PathLookup::Suggestions(found) = lookup("format.rs") else {
            panic!("expected suggestions");
        };
        assert_eq!(found, vec!["lib/format.js", "src/util/format.ts"]);
    }

    #[test]
    fn unrelated_path_is_not_found() {
        assert_eq!(lookup("docs/readme.md"), PathLookup::NotFound);
    }

    #[test]
    fn project_root_itself_is_a_directory_of_everything() {
        let PathLookup::IsDirectory(all) = lookup("/work/project") else {
            panic!("expected directory");
        };
        assert_eq!(all.len(), INDEXED.len());
    }
}
