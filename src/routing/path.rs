//! Route template compilation.
//!
//! # Responsibilities
//! - Normalize templates to a single leading `/` with no trailing `/`
//! - Split templates into literal text and `{name}` placeholders
//! - Produce an exact-match literal or an anchored pattern
//!
//! # Design Decisions
//! - Placeholders compile to unnamed `([^/]+)` groups; names are kept in a
//!   separate ordered list and zipped with captures positionally
//! - Literal text is escaped, so `.` or `+` in a template never act as regex syntax
//! - Malformed templates fail here, at registration, never at request time

use regex::Regex;

use crate::error::RouteError;

/// Pattern fragment substituted for every placeholder.
const SEGMENT: &str = "([^/]+)";

/// How a compiled route decides whether it matches a request path.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact string equality with the normalized template.
    Exact(String),
    /// Anchored pattern with one capture group per placeholder.
    Pattern(PathPattern),
}

impl Matcher {
    pub fn is_static(&self) -> bool {
        matches!(self, Matcher::Exact(_))
    }
}

/// A dynamic route pattern and its placeholder names in template order.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Placeholder names, left to right.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Captured values for `path`, in group order, or `None` when the pattern
    /// does not match.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let caps = self.regex.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

enum Piece<'t> {
    Literal(&'t str),
    Param(&'t str),
}

/// Trim surrounding slashes and spaces and prefix a single `/`.
///
/// ```
/// assert_eq!(pulp::routing::path::normalize(" /users/ "), "/users");
/// assert_eq!(pulp::routing::path::normalize(""), "/");
/// ```
pub fn normalize(template: &str) -> String {
    let trimmed = template.trim_matches(|c| c == '/' || c == ' ');
    let mut path = String::with_capacity(trimmed.len() + 1);
    path.push('/');
    path.push_str(trimmed);
    path
}

/// Compile a route template into a [`Matcher`].
pub fn compile(template: &str) -> Result<Matcher, RouteError> {
    let path = normalize(template);
    let pieces = split(&path)?;

    let names: Vec<String> = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Param(name) => Some((*name).to_string()),
            Piece::Literal(_) => None,
        })
        .collect();

    if names.is_empty() {
        return Ok(Matcher::Exact(path));
    }

    let mut source = String::with_capacity(path.len() * 2);
    source.push('^');
    for piece in &pieces {
        match piece {
            Piece::Literal(text) => source.push_str(&regex::escape(text)),
            Piece::Param(_) => source.push_str(SEGMENT),
        }
    }
    source.push('$');

    let regex = Regex::new(&source)?;
    let actual = regex.captures_len() - 1;
    if actual != names.len() {
        return Err(RouteError::CaptureMismatch {
            template: path,
            expected: names.len(),
            actual,
        });
    }

    Ok(Matcher::Pattern(PathPattern { regex, names }))
}

fn split(path: &str) -> Result<Vec<Piece<'_>>, RouteError> {
    let malformed = |offset| RouteError::MalformedPlaceholder {
        template: path.to_string(),
        offset,
    };

    let mut pieces = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut literal_start = 0;
    let mut rest = path.char_indices();

    while let Some((offset, c)) = rest.next() {
        match c {
            '{' => {
                let close = path[offset + 1..]
                    .find('}')
                    .map(|i| offset + 1 + i)
                    .ok_or_else(|| malformed(offset))?;
                let name = &path[offset + 1..close];
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(malformed(offset));
                }
                if seen.contains(&name) {
                    return Err(RouteError::DuplicateParam {
                        template: path.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name);

                if literal_start < offset {
                    pieces.push(Piece::Literal(&path[literal_start..offset]));
                }
                pieces.push(Piece::Param(name));
                literal_start = close + 1;

                // skip past the closing brace
                for (i, _) in rest.by_ref() {
                    if i == close {
                        break;
                    }
                }
            }
            '}' => return Err(malformed(offset)),
            _ => {}
        }
    }

    if literal_start < path.len() {
        pieces.push(Piece::Literal(&path[literal_start..]));
    }

    Ok(pieces)
}
