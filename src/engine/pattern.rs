//! Pattern grammar and compilation.
//!
//! A pattern is a literal string, a parameterized template, a regular
//! expression, or match-all. Templates are space-separated tokens: a
//! literal word, `:name` (single-word capture), `:name(regex)` (capture
//! with an inline override), or `~name` (greedy rest-of-line capture).
//! Templates compile once, at unit build time, to an anchored regular
//! expression with named groups.

use std::collections::HashMap;
use std::fmt::Write as _;

use regex::Regex;

use crate::error::EngineError;

/// Default character class for untyped `:name` placeholders.
pub const DEFAULT_MATCH_GROUP: &str = "[A-Za-z0-9]+";

/// Named captures extracted by a pattern match.
pub type Captures = HashMap<String, String>;

/// A compiled pattern, ready to evaluate against a message's trailing.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches when the trailing equals the string exactly.
    Literal(String),
    /// A compiled parameterized template.
    Template(Template),
    /// A raw regular expression over the trailing.
    Regex {
        /// The compiled expression.
        re: Regex,
        /// Whether to extract named captures (otherwise a boolean test).
        extract: bool,
    },
    /// Unconditionally fires.
    Any,
}

impl Pattern {
    /// Compile a pattern string: a template when it contains placeholder
    /// tokens, a literal otherwise.
    pub fn compile(raw: &str, match_group: &str) -> Result<Pattern, EngineError> {
        if has_placeholders(raw) {
            Ok(Pattern::Template(Template::compile(raw, match_group)?))
        } else {
            Ok(Pattern::Literal(raw.to_string()))
        }
    }

    /// Evaluate against a trailing value; `Some` carries the captures on
    /// match (empty for capture-less patterns).
    pub fn eval(&self, trailing: &str) -> Option<Captures> {
        match self {
            Pattern::Literal(lit) => (trailing == lit).then(Captures::new),
            Pattern::Template(tpl) => tpl.captures(trailing),
            Pattern::Regex { re, extract: false } => re.is_match(trailing).then(Captures::new),
            Pattern::Regex { re, extract: true } => {
                named_captures(re, trailing)
            }
            Pattern::Any => Some(Captures::new()),
        }
    }
}

/// A parameterized template compiled to an anchored regex.
#[derive(Debug, Clone)]
pub struct Template {
    re: Regex,
}

impl Template {
    /// Compile a template pattern, substituting `match_group` for untyped
    /// `:name` placeholders.
    pub fn compile(raw: &str, match_group: &str) -> Result<Template, EngineError> {
        let mut src = String::from("^");
        for (i, token) in raw.split(' ').filter(|t| !t.is_empty()).enumerate() {
            if i > 0 {
                src.push(' ');
            }
            if let Some(spec) = token.strip_prefix(':') {
                match spec.split_once('(') {
                    Some((name, rest)) => {
                        let inner = rest.strip_suffix(')').ok_or_else(|| {
                            EngineError::UnterminatedPlaceholder(raw.to_string())
                        })?;
                        let _ = write!(src, "(?P<{name}>{inner})");
                    }
                    None => {
                        let _ = write!(src, "(?P<{spec}>{match_group})");
                    }
                }
            } else if let Some(name) = token.strip_prefix('~') {
                let _ = write!(src, "(?P<{name}>.+)");
            } else {
                src.push_str(&regex::escape(token));
            }
        }
        src.push('$');

        let re = Regex::new(&src).map_err(|source| EngineError::Pattern {
            pattern: raw.to_string(),
            source,
        })?;
        Ok(Template { re })
    }

    /// Match against a trailing value, extracting named captures.
    pub fn captures(&self, trailing: &str) -> Option<Captures> {
        named_captures(&self.re, trailing)
    }
}

fn named_captures(re: &Regex, input: &str) -> Option<Captures> {
    let caps = re.captures(input)?;
    let mut out = Captures::new();
    for name in re.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            out.insert(name.to_string(), m.as_str().to_string());
        }
    }
    Some(out)
}

/// Whether a pattern string contains placeholder tokens.
pub fn has_placeholders(raw: &str) -> bool {
    raw.split(' ')
        .any(|t| t.starts_with(':') || t.starts_with('~'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_captures_with_custom_class() {
        let p = Pattern::compile("!rand :low :high", "[0-9]+").unwrap();

        let caps = p.eval("!rand 3 17").unwrap();
        assert_eq!(caps["low"], "3");
        assert_eq!(caps["high"], "17");

        assert!(p.eval("!rand x 17").is_none());
    }

    #[test]
    fn default_class_rejects_punctuation() {
        let p = Pattern::compile("!greet :who", DEFAULT_MATCH_GROUP).unwrap();
        assert!(p.eval("!greet alice").is_some());
        assert!(p.eval("!greet al ice").is_none());
        assert!(p.eval("!greet a!ce").is_none());
    }

    #[test]
    fn inline_regex_override() {
        let p = Pattern::compile("!seen :who([a-z_]+)", DEFAULT_MATCH_GROUP).unwrap();
        let caps = p.eval("!seen some_user").unwrap();
        assert_eq!(caps["who"], "some_user");
    }

    #[test]
    fn greedy_rest_of_line() {
        let p = Pattern::compile("!say ~what", DEFAULT_MATCH_GROUP).unwrap();
        let caps = p.eval("!say hello there world").unwrap();
        assert_eq!(caps["what"], "hello there world");
        assert!(p.eval("!say").is_none());
    }

    #[test]
    fn literal_tokens_are_escaped() {
        let p = Pattern::compile("!calc 2+2 :x", "[0-9]+").unwrap();
        assert!(p.eval("!calc 2+2 4").is_some());
        assert!(p.eval("!calc 222 4").is_none());
    }

    #[test]
    fn plain_pattern_compiles_to_literal() {
        let p = Pattern::compile("!ping", DEFAULT_MATCH_GROUP).unwrap();
        assert!(matches!(p, Pattern::Literal(_)));
        assert!(p.eval("!ping").is_some());
        assert!(p.eval("!ping extra").is_none());
    }

    #[test]
    fn anchoring_is_exact() {
        let p = Pattern::compile("!kick :who", DEFAULT_MATCH_GROUP).unwrap();
        assert!(p.eval("say !kick alice").is_none());
        assert!(p.eval("!kick alice now").is_none());
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        let err = Pattern::compile("!x :who([a-z]+", DEFAULT_MATCH_GROUP).unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::UnterminatedPlaceholder(_)
        ));
    }

    #[test]
    fn match_all_fires_on_anything() {
        assert!(Pattern::Any.eval("anything at all").is_some());
        assert!(Pattern::Any.eval("").is_some());
    }

    #[test]
    fn regex_bool_vs_extract() {
        let re = Regex::new(r"(?P<n>[0-9]+) bottles").unwrap();
        let boolean = Pattern::Regex {
            re: re.clone(),
            extract: false,
        };
        assert!(boolean.eval("99 bottles").unwrap().is_empty());

        let extract = Pattern::Regex { re, extract: true };
        assert_eq!(extract.eval("99 bottles").unwrap()["n"], "99");
    }
}
