//! Key templates embedded in collection paths.
//!
//! Two placeholder kinds exist:
//! - `{name}` route parameters, used in source patterns and bound by the
//!   hosting runtime when a document path matches the pattern.
//! - `$name` / `$source.name` dynamic tokens, used in target paths and
//!   resolved per invocation against the route parameters or the changed
//!   document's fields.
//!
//! A dynamic token runs from `$` up to the next `/` (or the end of the
//! template). A route parameter is the shortest `{...}` span; an unclosed
//! `{` is literal text.

use crate::error::{TemplateError, TemplateResult};
use integrify_types::{as_segment, Fields, Params};

/// Primary key assumed when a source pattern has no `{param}` segment.
pub const DEFAULT_PRIMARY_KEY: &str = "masterId";

const SOURCE_PREFIX: &str = "$source.";

/// Where a dynamic token is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Top-level fields: route parameters and any extra fields.
    Params,
    /// The nested `source` object: the changed document's own fields.
    Source,
}

/// One lexical piece of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    /// `{name}`; holds the name without braces.
    RouteParam(&'a str),
    /// `$name` or `$source.name`; `text` is the full token as written.
    Dynamic {
        text: &'a str,
        scope: Scope,
        name: &'a str,
    },
}

/// Splits a template into tokens.
///
/// Adjacent literal text is emitted as a single `Literal`. No empty token is
/// ever produced at the end of the input, so callers never need to discard a
/// trailing match.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                let Some(close) = template[i + 1..].find('}') else {
                    i += 1;
                    continue;
                };
                if literal_start < i {
                    tokens.push(Token::Literal(&template[literal_start..i]));
                }
                let end = i + 1 + close;
                tokens.push(Token::RouteParam(&template[i + 1..end]));
                i = end + 1;
                literal_start = i;
            }
            b'$' => {
                if literal_start < i {
                    tokens.push(Token::Literal(&template[literal_start..i]));
                }
                let end = template[i..].find('/').map_or(template.len(), |off| i + off);
                let text = &template[i..end];
                let (scope, name) = match text.strip_prefix(SOURCE_PREFIX) {
                    Some(name) => (Scope::Source, name),
                    None => (Scope::Params, &text[1..]),
                };
                tokens.push(Token::Dynamic { text, scope, name });
                i = end;
                literal_start = i;
            }
            _ => i += 1,
        }
    }

    if literal_start < template.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }
    tokens
}

/// Primary key derived from a source collection pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub has_primary_key: bool,
    pub primary_key: String,
}

/// Returns the last `{param}` of `pattern`, or `masterId` if there is none.
///
/// `a/{x}/b/{y}` yields `y`.
pub fn primary_key(pattern: &str) -> PrimaryKey {
    let last = tokenize(pattern).into_iter().rev().find_map(|t| match t {
        Token::RouteParam(name) => Some(name),
        _ => None,
    });
    match last {
        Some(name) => PrimaryKey {
            has_primary_key: true,
            primary_key: name.to_string(),
        },
        None => PrimaryKey {
            has_primary_key: false,
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
        },
    }
}

/// The document pattern a source collection is bound to.
///
/// A pattern without any `{param}` gets `/{masterId}` appended; patterns
/// that already name their key are returned unchanged.
pub fn normalize_source(pattern: &str) -> String {
    let key = primary_key(pattern);
    if key.has_primary_key {
        pattern.to_string()
    } else {
        format!("{}/{{{}}}", pattern.trim_end_matches('/'), key.primary_key)
    }
}

/// Outcome of resolving a target template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolution {
    /// Whether the template contained at least one dynamic token.
    pub has_fields: bool,
    pub target_collection: String,
}

/// Substitutes every dynamic token in `template`.
///
/// `$source.x` is looked up in `fields["source"]["x"]`, `$x` in `fields["x"]`.
/// A falsy or missing value fails with the token named verbatim. The
/// optional `format_key` transforms each resolved value before it is
/// substituted.
pub fn resolve_dynamic_tokens(
    fields: &Fields,
    template: &str,
    format_key: Option<&dyn Fn(&str) -> String>,
) -> TemplateResult<TargetResolution> {
    let mut has_fields = false;
    let mut resolved = String::with_capacity(template.len());

    for token in tokenize(template) {
        match token {
            Token::Literal(text) => resolved.push_str(text),
            Token::RouteParam(name) => {
                resolved.push('{');
                resolved.push_str(name);
                resolved.push('}');
            }
            Token::Dynamic { text, scope, name } => {
                has_fields = true;
                let value = match scope {
                    Scope::Source => fields.get("source").and_then(|source| source.get(name)),
                    Scope::Params => fields.get(name),
                };
                let segment = value
                    .and_then(as_segment)
                    .ok_or_else(|| TemplateError::MissingDynamicReference(text.to_string()))?;
                match format_key {
                    Some(fmt_key) => resolved.push_str(&fmt_key(&segment)),
                    None => resolved.push_str(&segment),
                }
            }
        }
    }

    Ok(TargetResolution {
        has_fields,
        target_collection: resolved,
    })
}

/// Binds a concrete path against a `{param}` pattern, segment by segment.
///
/// Returns the captured parameters, or `None` if the path does not match.
pub fn match_route(pattern: &str, path: &str) -> Option<Params> {
    let pattern_segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = Params::new();
    for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
        match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                params.insert(name.to_string(), (*actual).to_string());
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}
