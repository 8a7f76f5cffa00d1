//! Structural paths that identify text nodes by their chain of ancestor elements.
//!
//! A path renders as `/tag[@id='value']/tag[@class='value']/tag`, root first.
//! Each element contributes its tag name,
//! qualified by its `id` if it has one, or else by its `class`.
//! Paths are not unique: siblings without an `id` or `class` share one.

use common::{add_slashes, strip_slashes};
use serde::{Serialize, Serializer};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Discriminator {
    Id(String),
    Class(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub tag: String,
    pub discriminator: Option<Discriminator>,
}

impl PathSegment {
    /// Builds the segment for an element. `id` takes precedence over `class`.
    #[must_use]
    pub fn new(tag: &str, id: Option<&str>, class: Option<&str>) -> Self {
        let discriminator = match (id, class) {
            (Some(id), _) => Some(Discriminator::Id(id.into())),
            (None, Some(class)) => Some(Discriminator::Class(class.into())),
            (None, None) => None,
        };

        Self {
            tag: tag.into(),
            discriminator,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Builds a path from segments ordered from the innermost element outwards.
    pub(crate) fn from_innermost(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        let mut segments: Vec<_> = segments.into_iter().collect();
        segments.reverse();
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.tag)?;
            match &segment.discriminator {
                Some(Discriminator::Id(value)) => write!(f, "[@id='{}']", add_slashes(value))?,
                Some(Discriminator::Class(value)) => {
                    write!(f, "[@class='{}']", add_slashes(value))?;
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathParseError {
    #[error("path segment must start with `/` (at \"{0}\")")]
    MissingSeparator(String),
    #[error("path segment has no tag name (at \"{0}\")")]
    EmptyTag(String),
    #[error("only `[@id='…']` and `[@class='…']` predicates are supported (at \"{0}\")")]
    UnsupportedPredicate(String),
    #[error("unterminated predicate (at \"{0}\")")]
    UnterminatedPredicate(String),
}

impl FromStr for NodePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut rest = s;

        while !rest.is_empty() {
            rest = rest
                .strip_prefix('/')
                .ok_or_else(|| PathParseError::MissingSeparator(rest.into()))?;

            let tag_end = rest.find(['/', '[']).unwrap_or(rest.len());
            let (tag, after_tag) = rest.split_at(tag_end);
            if tag.is_empty() {
                return Err(PathParseError::EmptyTag(rest.into()));
            }

            let (discriminator, after_segment) = match after_tag.strip_prefix('[') {
                Some(predicate) => parse_predicate(predicate)?,
                None => (None, after_tag),
            };

            segments.push(PathSegment {
                tag: tag.into(),
                discriminator,
            });
            rest = after_segment;
        }

        Ok(Self { segments })
    }
}

/// Parses `@id='…']` or `@class='…']`, returning the discriminator and the remaining input.
fn parse_predicate(input: &str) -> Result<(Option<Discriminator>, &str), PathParseError> {
    let (is_id, quoted) = if let Some(quoted) = input.strip_prefix("@id='") {
        (true, quoted)
    } else if let Some(quoted) = input.strip_prefix("@class='") {
        (false, quoted)
    } else {
        return Err(PathParseError::UnsupportedPredicate(input.into()));
    };

    // Find the closing quote, skipping backslash-escaped characters
    let mut escaped = false;
    let close = quoted
        .char_indices()
        .find(|&(_, c)| {
            let is_close = !escaped && c == '\'';
            escaped = !escaped && c == '\\';
            is_close
        })
        .map(|(idx, _)| idx)
        .ok_or_else(|| PathParseError::UnterminatedPredicate(input.into()))?;

    let rest = quoted[close + 1..]
        .strip_prefix(']')
        .ok_or_else(|| PathParseError::UnterminatedPredicate(input.into()))?;

    let value = strip_slashes(&quoted[..close]);
    let discriminator = if is_id {
        Discriminator::Id(value)
    } else {
        Discriminator::Class(value)
    };

    Ok((Some(discriminator), rest))
}

#[cfg(test)]
mod test {
    use super::{Discriminator, NodePath, PathParseError, PathSegment};

    #[test]
    fn render() {
        let path = NodePath::new(vec![
            PathSegment::new("div", Some("x"), Some("ignored")),
            PathSegment::new("ul", None, Some("nav items")),
            PathSegment::new("li", None, None),
        ]);

        assert_eq!(
            path.to_string(),
            "/div[@id='x']/ul[@class='nav items']/li"
        );
        assert_eq!(NodePath::default().to_string(), "");
    }

    #[test]
    fn render_escapes_quotes() {
        let path = NodePath::new(vec![PathSegment::new("p", Some("it's"), None)]);
        assert_eq!(path.to_string(), r"/p[@id='it\'s']");
    }

    #[test]
    fn parse() {
        let path: NodePath = "/div[@id='x']/p".parse().expect("parsing should succeed");
        assert_eq!(
            path.segments(),
            [
                PathSegment {
                    tag: "div".into(),
                    discriminator: Some(Discriminator::Id("x".into()))
                },
                PathSegment {
                    tag: "p".into(),
                    discriminator: None
                }
            ]
        );

        assert_eq!(
            "".parse::<NodePath>().expect("parsing should succeed"),
            NodePath::default()
        );
    }

    #[test]
    fn parse_rendered() {
        // Values may contain the characters used by the path syntax itself
        let path = NodePath::new(vec![
            PathSegment::new("section", None, Some("a/b [c]")),
            PathSegment::new("span", Some(r#"quote'double"back\"#), None),
        ]);

        assert_eq!(
            path.to_string()
                .parse::<NodePath>()
                .expect("parsing should succeed"),
            path
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "div/p".parse::<NodePath>(),
            Err(PathParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "/div//p".parse::<NodePath>(),
            Err(PathParseError::EmptyTag(_))
        ));
        assert!(matches!(
            "/div[@name='x']".parse::<NodePath>(),
            Err(PathParseError::UnsupportedPredicate(_))
        ));
        assert!(matches!(
            "/div[@id='x".parse::<NodePath>(),
            Err(PathParseError::UnterminatedPredicate(_))
        ));
        assert!(matches!(
            "/div[@id='x'".parse::<NodePath>(),
            Err(PathParseError::UnterminatedPredicate(_))
        ));
    }
}
