//! State labels written into diagram text
//!
//! A label is a line starting with the marker, `@` unless the participant's
//! own name starts with a longer `@token`. With the default marker both
//! `@Draft` and `@ Draft` name the state `Draft`; with a custom marker such
//! as `@article` the name must be separated by whitespace
//! (`@article Draft`), so labels meant for other machines (`@order Paid`)
//! are ignored. A marker alone on a line names the initial state.

use crate::error::{Error, Result};
use regex::Regex;

pub const DEFAULT_MARKER: &str = "@";

#[derive(Debug, Clone)]
pub struct LabelParser {
    marker: String,
    pattern: Regex,
}

/// The leading `@token` of a participant name, if any
pub fn participant_marker(name: &str) -> Option<&str> {
    let token = name.split_whitespace().next()?;
    token.starts_with('@').then_some(token)
}

impl LabelParser {
    pub fn new(marker: &str) -> Result<Self> {
        crate::ensure!(
            !marker.is_empty() && !marker.contains(char::is_whitespace),
            "invalid label marker {:?}",
            marker
        );
        let pattern = format!(
            r"^\s*{}(?:\s+(?P<spaced>\S.*?)|(?P<bare>[^\s@]\S*))?\s*$",
            regex::escape(marker)
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| Error::custom(format!("invalid label marker {:?}: {}", marker, e)))?;
        Ok(Self {
            marker: marker.to_string(),
            pattern,
        })
    }

    /// Parser for labels addressed to the participant with the given name
    pub fn for_participant(name: Option<&str>, default_marker: &str) -> Result<Self> {
        let marker = name.and_then(participant_marker).unwrap_or(default_marker);
        Self::new(marker)
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn parse_line(&self, line: &str) -> Option<String> {
        let captures = self.pattern.captures(line)?;
        let name = captures
            .name("spaced")
            .or_else(|| captures.name("bare"))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        Some(name)
    }

    /// Labels found on any line of `text`
    pub fn parse_text<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.lines().filter_map(|line| self.parse_line(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_marker() {
        let parser = LabelParser::new(DEFAULT_MARKER).unwrap();
        assert_eq!(parser.parse_line("@Foo"), Some("Foo".into()));
        assert_eq!(parser.parse_line("  @ Waiting for payment  "), Some("Waiting for payment".into()));
        assert_eq!(parser.parse_line("@"), Some("".into()));
        assert_eq!(parser.parse_line("@order Paid"), None);
        assert_eq!(parser.parse_line("mail me@example.com"), None);
        assert_eq!(parser.parse_line("@@Foo"), None);
    }

    #[test]
    fn test_custom_marker() {
        let parser = LabelParser::for_participant(Some("@article Article"), DEFAULT_MARKER).unwrap();
        assert_eq!(parser.marker(), "@article");
        assert_eq!(parser.parse_line("@article Draft"), Some("Draft".into()));
        assert_eq!(parser.parse_line("@articles Draft"), None);
        assert_eq!(parser.parse_line("@Draft"), None);
    }

    #[test]
    fn test_participant_without_marker_uses_default() {
        let parser = LabelParser::for_participant(Some("Article"), DEFAULT_MARKER).unwrap();
        assert_eq!(parser.marker(), "@");
        let parser = LabelParser::for_participant(None, "#").unwrap();
        assert_eq!(parser.parse_line("#Draft"), Some("Draft".into()));
    }

    #[test]
    fn test_blank_marker_rejected() {
        assert!(LabelParser::new("").is_err());
        assert!(LabelParser::new("@ a").is_err());
    }

    #[test]
    fn test_parse_text_lines() {
        let parser = LabelParser::new(DEFAULT_MARKER).unwrap();
        let labels: Vec<String> = parser
            .parse_text("Check the article\n@Reviewed\nsee @notes")
            .collect();
        assert_eq!(labels, ["Reviewed"]);
    }
}
