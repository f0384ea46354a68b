//! Regex filter and rewrite applied to query output.

use crate::error::Result;
use regex::Regex;
use std::borrow::Cow;

/// Drops lines that do not match `pattern`; optionally rewrites the ones that do.
#[derive(Debug, Clone)]
pub struct LineFilter {
    pattern: Regex,
    rewrite: Option<String>,
}

impl LineFilter {
    /// Compile `pattern`. The rewrite template takes `$1`/`${name}` back-references, and
    /// `\1`/`\g<name>` are accepted as equivalents.
    pub fn new(pattern: &str, rewrite: Option<&str>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            rewrite: rewrite.map(translate_template),
        })
    }

    /// `None` when the line does not match; otherwise the line, rewritten if a template was
    /// given. Every match in the line is substituted.
    pub fn apply<'a>(&self, line: &'a str) -> Option<Cow<'a, str>> {
        if !self.pattern.is_match(line) {
            return None;
        }
        match &self.rewrite {
            Some(template) => Some(self.pattern.replace_all(line, template.as_str())),
            None => Some(Cow::Borrowed(line)),
        }
    }
}

/// Convert backslash group references into the regex crate's `${...}` form.
///
/// `\N` becomes `${N}`, `\g<name>` becomes `${name}` and `\\` becomes a single backslash.
/// Other characters, including `$` references, pass through unchanged.
pub fn translate_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(d) if d.is_ascii_digit() => {
                out.push_str("${");
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    out.push(d);
                    chars.next();
                }
                out.push('}');
            }
            Some('g') => {
                let rest: String = chars.clone().collect();
                match rest
                    .strip_prefix("g<")
                    .and_then(|r| r.split_once('>'))
                    .filter(|(name, _)| !name.is_empty())
                {
                    Some((name, _)) => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                        // Skip `g<`, the name and `>`.
                        for _ in 0..name.chars().count() + 3 {
                            chars.next();
                        }
                    }
                    None => out.push('\\'),
                }
            }
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerialcupError;

    #[test]
    fn non_matching_lines_are_dropped() {
        let filter = LineFilter::new("temp=", None).unwrap();
        assert_eq!(filter.apply("1,temp=21").as_deref(), Some("1,temp=21"));
        assert_eq!(filter.apply("2,hum=40"), None);
    }

    #[test]
    fn rewrite_uses_back_references() {
        let filter = LineFilter::new(r"([0-9]+),.*", Some(r"timestamp:\1")).unwrap();
        assert_eq!(
            filter.apply("1700000000123,temp=21").as_deref(),
            Some("timestamp:1700000000123")
        );
    }

    #[test]
    fn native_and_named_references_work() {
        let filter = LineFilter::new(r"(?P<ts>\d+),(?P<body>.*)", Some("$body@${ts}")).unwrap();
        assert_eq!(filter.apply("42,hello").as_deref(), Some("hello@42"));

        let filter = LineFilter::new(r"(?P<ts>\d+),(?P<body>.*)", Some(r"\g<body>@\g<ts>")).unwrap();
        assert_eq!(filter.apply("42,hello").as_deref(), Some("hello@42"));
    }

    #[test]
    fn all_matches_are_substituted() {
        let filter = LineFilter::new("a", Some("b")).unwrap();
        assert_eq!(filter.apply("1,banana").as_deref(), Some("1,bbnbnb"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(matches!(
            LineFilter::new("(", None),
            Err(SerialcupError::Pattern { .. })
        ));
    }

    #[test]
    fn template_translation() {
        assert_eq!(translate_template(r"\1-\12"), "${1}-${12}");
        assert_eq!(translate_template(r"\g<name>"), "${name}");
        assert_eq!(translate_template(r"a\\b"), r"a\b");
        assert_eq!(translate_template(r"\g<>"), r"\g<>");
        assert_eq!(translate_template(r"\n$1"), r"\n$1");
        assert_eq!(translate_template("trailing\\"), "trailing\\");
    }
}
