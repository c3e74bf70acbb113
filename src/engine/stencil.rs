//! Built-in engine for `.stencil` and markdown pages.
//!
//! # Syntax
//!
//! | Construct | Meaning |
//! |-----------|---------|
//! | `<Data> title: Home </Data>` | YAML attributes of a stencil page |
//! | `---` ... `---` at the top | YAML attributes of a markdown page |
//! | `{{ $page.title }}` | value lookup, see [`crate::site::context`] |
//! | `{{ $config.Site.name }}` | global config from `Config/Site.toml` |
//! | `<Card />` | body of the component named `Card` |
//!
//! # Pipeline
//!
//! ```text
//! raw ─► strip data ─► interpolate ─► markdown (md only) ─► expand components
//!                                                              │
//!                          component body ◄────────────────────┘ (recursive)
//! ```
//!
//! Expressions are evaluated on the source text, so error positions point at
//! the line the author wrote. In markdown pages the values are spliced in
//! after rendering, so they are never read as markdown, and expressions
//! inside code spans or code blocks are left as written.

use super::{CompilationError, CompileInput, SourceInfo, TemplateEngine};
use crate::{
    error::header,
    site::{
        Attributes, SourceType,
        context::{Lookup, walk_value},
        tree::Node,
    },
};
use async_trait::async_trait;
use pulldown_cmark::{Event, Options, Parser, Tag, html};
use regex::Regex;
use serde_json::Value;
use std::{ops::Range, path::Path, sync::LazyLock};

/// Components may include components up to this depth.
pub const MAX_COMPONENT_DEPTH: usize = 16;

const CONFIG_VARIABLE: &str = "$config";

static DATA_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Data>(.*?)</Data>[ \t]*(?:\r?\n)?").unwrap());

static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?msR)\A---[ \t]*\r?\n(.*?)^---[ \t]*(?:\r?\n|\z)").unwrap());

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^}]+?)\s*\}\}").unwrap());

static COMPONENT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Z][A-Za-z0-9]*)\s*/>").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct StencilEngine;

#[async_trait]
impl TemplateEngine for StencilEngine {
    async fn extract_data(
        &self,
        raw: &str,
        source: SourceInfo<'_>,
    ) -> Result<Attributes, CompilationError> {
        let (data, _) = split_data(raw, source.language);
        data.map_or_else(|| Ok(Attributes::new()), |data| parse_data(data, source.path))
    }

    async fn compile(
        &self,
        raw: &str,
        input: CompileInput<'_>,
        source: SourceInfo<'_>,
    ) -> Result<String, CompilationError> {
        let (_, body) = split_data(raw, source.language);
        let html = match source.language {
            SourceType::Stencil => interpolate(&body, input, source.path)?,
            SourceType::Markdown => render_markdown_page(&body, input, source.path)?,
        };

        expand_components(&html, input, source.path, 0)
    }
}

// ============================================================================
// Data blocks
// ============================================================================

/// Source text with its data block cut out.
///
/// Remembers where the block was, so positions in `text` map back to lines
/// of the original source.
struct Body {
    text: String,
    cut_at: usize,
    cut_lines: usize,
}

impl Body {
    fn line_of(&self, offset: usize) -> usize {
        let before = self.text[..offset].matches('\n').count();
        let shift = if offset >= self.cut_at { self.cut_lines } else { 0 };
        before + shift + 1
    }
}

fn split_data(raw: &str, language: SourceType) -> (Option<&str>, Body) {
    let pattern = match language {
        SourceType::Stencil => &*DATA_BLOCK,
        SourceType::Markdown => &*FRONT_MATTER,
    };

    let Some(caps) = pattern.captures(raw) else {
        let body = Body {
            text: raw.to_owned(),
            cut_at: usize::MAX,
            cut_lines: 0,
        };
        return (None, body);
    };

    let block = caps.get_match();
    let mut text = String::with_capacity(raw.len() - block.len());
    text.push_str(&raw[..block.start()]);
    text.push_str(&raw[block.end()..]);

    let body = Body {
        text,
        cut_at: block.start(),
        cut_lines: block.as_str().matches('\n').count(),
    };
    (caps.get(1).map(|m| m.as_str()), body)
}

fn parse_data(data: &str, path: &Path) -> Result<Attributes, CompilationError> {
    if data.trim().is_empty() {
        return Ok(Attributes::new());
    }

    let value: Value = serde_yaml::from_str(data).map_err(|err| {
        CompilationError::new(
            path.to_path_buf(),
            format!(
                "{}\n\nThe data of \"{}\" is not valid Yaml:\n\n     {err}",
                header("Invalid data"),
                path.display()
            ),
        )
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Attributes::new()),
        _ => Err(CompilationError::new(
            path.to_path_buf(),
            format!(
                "{}\n\nThe data of \"{}\" must be a list of \"key: value\" pairs.",
                header("Invalid data"),
                path.display()
            ),
        )),
    }
}

// ============================================================================
// Interpolation
// ============================================================================

fn interpolate(body: &Body, input: CompileInput<'_>, path: &Path) -> Result<String, CompilationError> {
    let values = evaluate_all(body, input, path, &[])?;
    Ok(splice(&body.text, values))
}

/// Every `{{ }}` expression outside `skip`, evaluated, with its span.
fn evaluate_all(
    body: &Body,
    input: CompileInput<'_>,
    path: &Path,
    skip: &[Range<usize>],
) -> Result<Vec<(Range<usize>, String)>, CompilationError> {
    let mut values = Vec::new();

    for caps in INTERPOLATION.captures_iter(&body.text) {
        let whole = caps.get_match();
        if skip.iter().any(|range| range.contains(&whole.start())) {
            continue;
        }
        let Some(expression) = caps.get(1) else {
            continue;
        };

        let value = evaluate(expression.as_str(), input)
            .map_err(|reason| caret_error(body, expression.range(), &reason, path))?;
        values.push((whole.range(), value));
    }

    Ok(values)
}

/// Replace ordered, non-overlapping spans of `text`.
fn splice(text: &str, replacements: impl IntoIterator<Item = (Range<usize>, String)>) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for (span, replacement) in replacements {
        output.push_str(&text[last..span.start]);
        output.push_str(&replacement);
        last = span.end;
    }

    output.push_str(&text[last..]);
    output
}

fn evaluate(expression: &str, input: CompileInput<'_>) -> Result<String, String> {
    let segments: Vec<&str> = expression.split('.').map(str::trim).collect();

    if segments.first() == Some(&CONFIG_VARIABLE) {
        let value = match &segments[1..] {
            [] => None,
            [file, rest @ ..] => input.config.get(*file).and_then(|v| walk_value(v, rest)),
        };
        return match value {
            Some(value) => render_value(expression, value),
            None => Err(format!("Unknown config value \"{expression}\"")),
        };
    }

    let environment = input.environment;
    match environment.lookup(expression) {
        None => Err(format!("Unknown name \"{expression}\"")),
        Some(Lookup::Value(value)) => render_value(expression, &value),
        Some(Lookup::Node(id)) => match environment.tree.node(id) {
            Node::Page(page) => Ok(page.path.clone()),
            Node::Directory(_) => Err(format!("\"{expression}\" is a folder of pages and cannot be printed")),
        },
        Some(Lookup::View(..)) => Err(format!("\"{expression}\" is a list of pages and cannot be printed")),
    }
}

fn render_value(expression: &str, value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(escape_html(s)),
        Value::Array(_) => Err(format!("\"{expression}\" is a list and cannot be printed")),
        Value::Object(_) => Err(format!("\"{expression}\" is a map and cannot be printed")),
    }
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Message pointing at `span` in its source line:
///
/// ```text
///      3 |   <h1>{{ $page.titel }}</h1>
///        |          ^^^^^^^^^^^
/// ```
fn caret_error(body: &Body, span: Range<usize>, reason: &str, path: &Path) -> CompilationError {
    let text = &body.text;
    let line_start = text[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[span.start..]
        .find('\n')
        .map_or(text.len(), |i| span.start + i);

    let line = text[line_start..line_end].trim_end_matches('\r');
    let column = text[line_start..span.start].chars().count();
    let width = text[span.start..span.end.min(line_end)].chars().count().max(1);

    let number = body.line_of(span.start).to_string();
    let gutter = " ".repeat(number.len());

    CompilationError::new(
        path.to_path_buf(),
        format!(
            "{}\n\n{reason} in \"{}\" on line {number}:\n\n     {number} |   {line}\n     {gutter} |   {}{}",
            header("Compilation failed"),
            path.display(),
            " ".repeat(column),
            "^".repeat(width),
        ),
    )
}

// ============================================================================
// Markdown and components
// ============================================================================

const MARKDOWN_OPTIONS: Options = Options::ENABLE_TABLES
    .union(Options::ENABLE_STRIKETHROUGH)
    .union(Options::ENABLE_TASKLISTS);

fn render_markdown(text: &str) -> String {
    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, Parser::new_ext(text, MARKDOWN_OPTIONS));
    output
}

/// Spans of inline code and code blocks.
fn code_ranges(text: &str) -> Vec<Range<usize>> {
    Parser::new_ext(text, MARKDOWN_OPTIONS)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

/// Alphanumeric, so markdown keeps it verbatim in text, attributes and URLs.
fn placeholder(index: usize) -> String {
    format!("paperinterpolation{index}x")
}

/// Render a markdown body, splicing evaluated values into the HTML.
fn render_markdown_page(
    body: &Body,
    input: CompileInput<'_>,
    path: &Path,
) -> Result<String, CompilationError> {
    let values = evaluate_all(body, input, path, &code_ranges(&body.text))?;

    let marked = splice(
        &body.text,
        values
            .iter()
            .enumerate()
            .map(|(index, (span, _))| (span.clone(), placeholder(index))),
    );

    let mut html = render_markdown(&marked);
    for (index, (_, value)) in values.iter().enumerate() {
        html = html.replace(&placeholder(index), value);
    }
    Ok(html)
}

/// Replace known `<Name />` tags with their compiled component bodies.
///
/// Unknown tags are left alone; they may be plain HTML.
fn expand_components(
    text: &str,
    input: CompileInput<'_>,
    path: &Path,
    depth: usize,
) -> Result<String, CompilationError> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in COMPONENT_TAG.captures_iter(text) {
        let tag = caps.get_match();
        let Some(component) = caps.get(1).and_then(|name| input.components.get(name.as_str())) else {
            continue;
        };

        if depth >= MAX_COMPONENT_DEPTH {
            return Err(CompilationError::new(
                path.to_path_buf(),
                format!(
                    "{}\n\n\"<{} />\" in \"{}\" is nested more than {MAX_COMPONENT_DEPTH} components deep.\n\n\
                     This usually means a component includes itself.",
                    header("Compilation failed"),
                    component.name,
                    path.display()
                ),
            ));
        }

        let component_path = Path::new(&component.display_path);
        let (_, body) = split_data(&component.contents, SourceType::Stencil);
        let compiled = interpolate(&body, input, component_path)?;

        output.push_str(&text[last..tag.start()]);
        output.push_str(&expand_components(&compiled, input, component_path, depth + 1)?);
        last = tag.end();
    }

    output.push_str(&text[last..]);
    Ok(output)
}
