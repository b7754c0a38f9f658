//! Media query parsing and evaluation.
//!
//! Supports the subset of Media Queries Level 4 that depends on the viewport:
//!
//! - comma separated lists, matching when any entry matches
//! - `not` / `only` prefixes and the `all`, `screen` and `print` media types
//! - `and` chains of `width`, `height` (with `min-` / `max-` prefixes) and
//!   `orientation`
//! - lengths in `px`, `em` or `rem` (16px per em)
//!
//! ```ignore
//! let tablet = MediaQuery::parse("screen and (min-width: 768px)")?;
//! assert!(tablet.matches(Viewport::new(1024.0, 768.0)));
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pixels per `em` / `rem`.
const EM_PX: f64 = 16.0;

/// Errors from parsing a media query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaQueryError {
    #[error("empty entry in media query list")]
    EmptyEntry,
    #[error("unknown media type `{0}`")]
    UnknownMediaType(String),
    #[error("unknown media feature `{0}`")]
    UnknownFeature(String),
    #[error("invalid value `{value}` for media feature `{feature}`")]
    InvalidValue { feature: String, value: String },
    #[error("unclosed `(` in media query")]
    Unclosed,
    #[error("unexpected `{0}` in media query")]
    Unexpected(String),
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn orientation(&self) -> Orientation {
        if self.height >= self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaType {
    All,
    Screen,
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Dimension {
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Feature {
    Min(Dimension, f64),
    Max(Dimension, f64),
    Exact(Dimension, f64),
    Orientation(Orientation),
    /// Boolean form, e.g. `(width)`: true for any non-zero size
    Present(Dimension),
    /// `(orientation)`, which every viewport has
    Always,
}

impl Feature {
    fn matches(&self, viewport: Viewport) -> bool {
        let size = |dimension: &Dimension| match dimension {
            Dimension::Width => viewport.width,
            Dimension::Height => viewport.height,
        };
        match self {
            Feature::Min(dimension, px) => size(dimension) >= *px,
            Feature::Max(dimension, px) => size(dimension) <= *px,
            Feature::Exact(dimension, px) => size(dimension) == *px,
            Feature::Orientation(orientation) => viewport.orientation() == *orientation,
            Feature::Present(dimension) => size(dimension) > 0.0,
            Feature::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    negated: bool,
    media_type: MediaType,
    features: Vec<Feature>,
}

impl Clause {
    fn matches(&self, viewport: Viewport) -> bool {
        let type_matches = self.media_type != MediaType::Print;
        let matched = type_matches && self.features.iter().all(|f| f.matches(viewport));
        matched != self.negated
    }
}

/// A parsed media query list.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    source: String,
    clauses: Vec<Clause>,
}

impl MediaQuery {
    pub fn parse(source: &str) -> Result<Self, MediaQueryError> {
        let trimmed = source.trim();
        // An empty list matches everything
        let clauses = if trimmed.is_empty() {
            vec![Clause {
                negated: false,
                media_type: MediaType::All,
                features: Vec::new(),
            }]
        } else {
            trimmed
                .split(',')
                .map(parse_clause)
                .collect::<Result<_, _>>()?
        };

        Ok(Self {
            source: trimmed.to_owned(),
            clauses,
        })
    }

    /// Whether any entry of the list matches `viewport`.
    pub fn matches(&self, viewport: Viewport) -> bool {
        self.clauses.iter().any(|clause| clause.matches(viewport))
    }

    /// The query text as given (trimmed).
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for MediaQuery {
    type Err = MediaQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Group(&'a str),
}

fn tokenize(src: &str) -> Result<Vec<Token<'_>>, MediaQueryError> {
    let mut tokens = Vec::new();
    let mut rest = src.trim_start();

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('(') {
            let end = inner.find(')').ok_or(MediaQueryError::Unclosed)?;
            tokens.push(Token::Group(inner[..end].trim()));
            rest = &inner[end + 1..];
        } else if rest.starts_with(')') {
            return Err(MediaQueryError::Unexpected(")".into()));
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
                .unwrap_or(rest.len());
            tokens.push(Token::Word(&rest[..end]));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }

    Ok(tokens)
}

fn parse_clause(src: &str) -> Result<Clause, MediaQueryError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(MediaQueryError::EmptyEntry);
    }
    let mut tokens = tokens.into_iter().peekable();

    let mut clause = Clause {
        negated: false,
        media_type: MediaType::All,
        features: Vec::new(),
    };

    let prefix = match tokens.peek() {
        Some(Token::Word(word)) if word.eq_ignore_ascii_case("not") => Some(true),
        Some(Token::Word(word)) if word.eq_ignore_ascii_case("only") => Some(false),
        _ => None,
    };
    if let Some(negated) = prefix {
        clause.negated = negated;
        tokens.next();
    }

    // Either a media type, or a feature opening the chain
    let mut expect_feature = match tokens.next() {
        Some(Token::Word(word)) if !word.eq_ignore_ascii_case("and") => {
            clause.media_type = parse_media_type(word)?;
            false
        }
        Some(Token::Group(group)) => {
            clause.features.push(parse_feature(group)?);
            false
        }
        Some(Token::Word(word)) => return Err(MediaQueryError::Unexpected(word.to_owned())),
        None => return Err(MediaQueryError::EmptyEntry),
    };

    for token in tokens {
        match token {
            Token::Word(word) if !expect_feature && word.eq_ignore_ascii_case("and") => {
                expect_feature = true;
            }
            Token::Group(group) if expect_feature => {
                clause.features.push(parse_feature(group)?);
                expect_feature = false;
            }
            Token::Word(word) => return Err(MediaQueryError::Unexpected(word.to_owned())),
            Token::Group(group) => return Err(MediaQueryError::Unexpected(format!("({group})"))),
        }
    }

    if expect_feature {
        return Err(MediaQueryError::Unexpected("and".into()));
    }
    Ok(clause)
}

fn parse_media_type(word: &str) -> Result<MediaType, MediaQueryError> {
    match word.to_ascii_lowercase().as_str() {
        "all" => Ok(MediaType::All),
        "screen" => Ok(MediaType::Screen),
        "print" => Ok(MediaType::Print),
        _ => Err(MediaQueryError::UnknownMediaType(word.to_owned())),
    }
}

fn parse_feature(group: &str) -> Result<Feature, MediaQueryError> {
    let (name, value) = match group.split_once(':') {
        Some((name, value)) => (name.trim().to_ascii_lowercase(), Some(value.trim())),
        None => (group.trim().to_ascii_lowercase(), None),
    };

    let (prefix, base) = if let Some(base) = name.strip_prefix("min-") {
        ("min", base)
    } else if let Some(base) = name.strip_prefix("max-") {
        ("max", base)
    } else {
        ("", name.as_str())
    };

    let dimension = match base {
        "width" => Some(Dimension::Width),
        "height" => Some(Dimension::Height),
        "orientation" if prefix.is_empty() => None,
        _ => return Err(MediaQueryError::UnknownFeature(name.clone())),
    };

    let Some(value) = value else {
        return match dimension {
            Some(dimension) if prefix.is_empty() => Ok(Feature::Present(dimension)),
            None => Ok(Feature::Always),
            Some(_) => Err(MediaQueryError::InvalidValue {
                feature: name.clone(),
                value: String::new(),
            }),
        };
    };

    let invalid = || MediaQueryError::InvalidValue {
        feature: name.clone(),
        value: value.to_owned(),
    };

    match dimension {
        None => match value.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Feature::Orientation(Orientation::Portrait)),
            "landscape" => Ok(Feature::Orientation(Orientation::Landscape)),
            _ => Err(invalid()),
        },
        Some(dimension) => {
            let px = parse_length(value).ok_or_else(invalid)?;
            Ok(match prefix {
                "min" => Feature::Min(dimension, px),
                "max" => Feature::Max(dimension, px),
                _ => Feature::Exact(dimension, px),
            })
        }
    }
}

/// Parse a CSS length into pixels.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(n) = value.strip_suffix("rem") {
        (n, EM_PX)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, EM_PX)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else {
        // Unitless lengths are only valid for zero
        return match value.parse::<f64>() {
            Ok(n) if n == 0.0 => Some(0.0),
            _ => None,
        };
    };
    let number: f64 = number.trim().parse().ok()?;
    number.is_finite().then_some(number * scale)
}
