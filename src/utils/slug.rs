//! URL slugification and name casing.
//!
//! Source names are written in PascalCase (`MyArticle.stencil`), URLs in
//! kebab case (`/my-article/`). Both directions go through [`words`], which
//! transliterates to ASCII and splits on separators, case changes and
//! letter/digit boundaries.

use std::path::{Component, Path};

// ============================================================================
// Word splitting
// ============================================================================

/// Split a name into its words.
///
/// | Input | Words |
/// |-------|-------|
/// | `MyArticle` | `My`, `Article` |
/// | `HTMLParser` | `HTML`, `Parser` |
/// | `post_2024` | `post`, `2024` |
/// | `Über uns` | `Uber`, `uns` |
pub fn words(input: &str) -> Vec<String> {
    let ascii = deunicode::deunicode(input);
    let mut words = Vec::new();

    for run in ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|run| !run.is_empty())
    {
        let chars: Vec<char> = run.chars().collect();
        let mut start = 0;

        for i in 1..chars.len() {
            let (prev, cur) = (chars[i - 1], chars[i]);
            let next = chars.get(i + 1).copied();

            let camel = prev.is_ascii_lowercase() && cur.is_ascii_uppercase();
            let acronym_end = prev.is_ascii_uppercase()
                && cur.is_ascii_uppercase()
                && next.is_some_and(|n| n.is_ascii_lowercase());
            let digits = prev.is_ascii_digit() != cur.is_ascii_digit();

            if camel || acronym_end || digits {
                words.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        words.push(chars[start..].iter().collect());
    }

    words
}

/// `MyArticle` → `my-article`
pub fn kebab(input: &str) -> String {
    words(input)
        .iter()
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// `my-article` → `MyArticle`
pub fn pascal(input: &str) -> String {
    words(input)
        .iter()
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

// ============================================================================
// Path slugs
// ============================================================================

/// Slugify every component of a relative path independently.
///
/// Components that slugify to nothing (e.g. `---`) are dropped, so the
/// result never contains empty URL segments.
pub fn slugify_segments(relative: &Path) -> Vec<String> {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(kebab(&name.to_string_lossy())),
            _ => None,
        })
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Build a URL path from slug segments: `[]` → `/`, `[a, b]` → `/a/b/`.
pub fn url_from_segments(segments: &[String]) -> String {
    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}/", segments.join("/"))
    }
}
