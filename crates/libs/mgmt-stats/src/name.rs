//! Management object names.
//!
//! A name is a domain followed by a list of `key=value` properties:
//! `domain:type=Cache,name="users(*)",component=Statistics`. Values may be
//! quoted to carry `,`, `:`, `=` and `"` (escaped). Domains and values may
//! contain the `*` and `?` wildcards, and a trailing `*` property admits
//! additional keys; such names are patterns and select other names via
//! [`ObjectName::matches`].

use std::fmt;
use std::str::FromStr;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::StatsError;

#[derive(Clone, Debug)]
pub struct ObjectName {
    domain: String,
    properties: Vec<(String, String)>,
    property_list_pattern: bool,
}

impl ObjectName {
    pub fn parse(text: &str) -> Result<Self, StatsError> {
        let (domain, list) = text
            .split_once(':')
            .ok_or_else(|| StatsError::invalid_name(text, "missing ':' after domain"))?;
        if domain.is_empty() {
            return Err(StatsError::invalid_name(text, "empty domain"));
        }

        let mut properties: Vec<(String, String)> = Vec::new();
        let mut property_list_pattern = false;
        for segment in split_properties(text, list)? {
            if segment == "*" {
                if property_list_pattern {
                    return Err(StatsError::invalid_name(text, "repeated '*' property"));
                }
                property_list_pattern = true;
                continue;
            }
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                StatsError::invalid_name(text, format!("property {segment:?} has no '='"))
            })?;
            if key.is_empty() {
                return Err(StatsError::invalid_name(text, "empty key"));
            }
            if value.is_empty() {
                return Err(StatsError::invalid_name(text, format!("empty value for key {key}")));
            }
            if properties.iter().any(|(existing, _)| existing == key) {
                return Err(StatsError::invalid_name(text, format!("duplicate key {key}")));
            }
            properties.push((key.to_owned(), value.to_owned()));
        }

        if properties.is_empty() && !property_list_pattern {
            return Err(StatsError::invalid_name(text, "empty property list"));
        }

        Ok(Self {
            domain: domain.to_owned(),
            properties,
            property_list_pattern,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Raw property value, quotes included for quoted values.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_pattern(&self) -> bool {
        self.property_list_pattern
            || has_wildcard(&self.domain)
            || self.properties.iter().any(|(_, value)| has_wildcard(value))
    }

    /// Returns `true` when `candidate` is one of the names this name selects.
    ///
    /// A non-pattern name matches only names with the same domain and the
    /// same property set, irrespective of property order.
    pub fn matches(&self, candidate: &ObjectName) -> bool {
        if !glob_match(&self.domain, &candidate.domain) {
            return false;
        }
        if !self.property_list_pattern && self.properties.len() != candidate.properties.len() {
            return false;
        }
        self.properties.iter().all(|(key, pattern)| {
            candidate
                .property(key)
                .is_some_and(|value| glob_match(pattern, value))
        })
    }

    /// Property list sorted by key, as used for equality and ordering.
    pub fn canonical_name(&self) -> String {
        let mut sorted: Vec<_> = self.properties.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let mut out = format!("{}:", self.domain);
        for (idx, (key, value)) in sorted.iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        if self.property_list_pattern {
            if !sorted.is_empty() {
                out.push(',');
            }
            out.push('*');
        }
        out
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (idx, (key, value)) in self.properties.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        if self.property_list_pattern {
            if !self.properties.is_empty() {
                f.write_str(",")?;
            }
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectName {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for ObjectName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_name() == other.canonical_name()
    }
}

impl Eq for ObjectName {}

impl PartialOrd for ObjectName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical_name().cmp(&other.canonical_name())
    }
}

/// Quotes `value` so it can be embedded as a property value verbatim.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

fn split_properties<'a>(name: &str, list: &'a str) -> Result<Vec<&'a str>, StatsError> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, ch) in list.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                segments.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(StatsError::invalid_name(name, "unterminated quoted value"));
    }
    if !list.is_empty() {
        segments.push(&list[start..]);
    }
    Ok(segments)
}

fn has_wildcard(text: &str) -> bool {
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '*' | '?' => return true,
            _ => {}
        }
    }
    false
}

fn glob_match(pattern: &str, text: &str) -> bool {
    match glob_matcher(pattern) {
        Ok(matcher) => matcher.is_match(text),
        Err(err) => {
            log::debug!("unusable name pattern {pattern:?}: {err}");
            false
        }
    }
}

/// Compiles a domain or property value into a glob matcher.
///
/// Only `*` and `?` are wildcards. `\*` and `\?` stand for themselves and any
/// other escape keeps its backslash; every remaining glob metacharacter is
/// matched literally.
fn glob_matcher(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    let mut glob = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    let mut after_star = false;
    while let Some(ch) = chars.next() {
        let star = ch == '*';
        match ch {
            // globset reserves `**` for whole path components.
            '*' if after_star => {}
            '*' | '?' => glob.push(ch),
            '\\' => match chars.next() {
                Some(next @ ('*' | '?')) => push_literal(&mut glob, next),
                Some(next) => {
                    push_literal(&mut glob, '\\');
                    push_literal(&mut glob, next);
                }
                None => push_literal(&mut glob, '\\'),
            },
            other => push_literal(&mut glob, other),
        }
        after_star = star;
    }
    GlobBuilder::new(&glob)
        .literal_separator(false)
        .backslash_escape(true)
        .build()
        .map(|glob| glob.compile_matcher())
}

fn push_literal(glob: &mut String, ch: char) {
    if matches!(ch, '*' | '?' | '[' | ']' | '{' | '}' | '\\') {
        glob.push('\\');
    }
    glob.push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> ObjectName {
        ObjectName::parse(text).expect("valid object name")
    }

    #[test]
    fn parses_quoted_values_with_separators() {
        let parsed = name(r#"dom:type=Cache,name="sessions(dist_sync)",manager="a,b:c""#);
        assert_eq!(parsed.domain(), "dom");
        assert_eq!(parsed.property("name"), Some(r#""sessions(dist_sync)""#));
        assert_eq!(parsed.property("manager"), Some(r#""a,b:c""#));
        assert!(!parsed.is_pattern());
    }

    #[test]
    fn rejects_malformed_names() {
        let malformed =
            ["no-colon", ":type=Cache", "dom:", "dom:type", "dom:=x", "dom:a=1,a=2", "dom:a=\"open"];
        for text in malformed {
            let err = ObjectName::parse(text).expect_err(text);
            assert!(matches!(err, StatsError::InvalidName { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn display_keeps_parsed_order() {
        let text = r#"dom:type=Cache,name="users(*)",component=Statistics"#;
        assert_eq!(name(text).to_string(), text);
        assert_eq!(name("dom:type=channel,*").to_string(), "dom:type=channel,*");
    }

    #[test]
    fn equality_ignores_property_order() {
        assert_eq!(name("dom:a=1,b=2"), name("dom:b=2,a=1"));
        assert_ne!(name("dom:a=1,b=2"), name("dom:a=1,b=3"));
    }

    #[test]
    fn value_wildcards_match_inside_quotes() {
        let pattern = name(r#"dom:type=Cache,name="users(*)",manager="*",component=Statistics"#);
        assert!(pattern.is_pattern());
        assert!(pattern.matches(&name(
            r#"dom:type=Cache,name="users(repl_sync)",manager="default",component=Statistics"#
        )));
        assert!(!pattern.matches(&name(
            r#"dom:type=Cache,name="sessions(repl_sync)",manager="default",component=Statistics"#
        )));
    }

    #[test]
    fn exact_key_set_required_without_list_wildcard() {
        let pattern = name("dom:type=channel,cluster=\"*\"");
        assert!(pattern.matches(&name("dom:cluster=\"ejb\",type=channel")));
        assert!(!pattern.matches(&name("dom:type=channel,cluster=\"ejb\",extra=1")));

        let open = name("dom:type=channel,*");
        assert!(open.matches(&name("dom:type=channel,cluster=\"ejb\",extra=1")));
        assert!(!open.matches(&name("other:type=channel")));
    }

    #[test]
    fn domain_and_single_char_wildcards() {
        assert!(name("jboss.*:type=?ache").matches(&name("jboss.datagrid:type=Cache")));
        assert!(!name("jboss.*:type=?ache").matches(&name("org.jboss:type=Cache")));
        assert!(glob_match(r"a\*b", "a*b"));
        assert!(!glob_match(r"a\*b", "axb"));
        assert!(glob_match("*x*y", "axbxcy"));
        assert!(glob_match("a**b", "ab"));
    }

    #[test]
    fn brackets_and_braces_match_literally() {
        let pattern = name(r#"dom:type=Cache,name="[users]{*}""#);
        assert!(pattern.matches(&name(r#"dom:type=Cache,name="[users]{repl}""#)));
        assert!(!pattern.matches(&name(r#"dom:type=Cache,name="u{repl}""#)));
        assert!(glob_match("a{b,c}", "a{b,c}"));
        assert!(!glob_match("a{b,c}", "ab"));
        assert!(glob_match("dom/*", "dom/a/b"));
    }

    #[test]
    fn escaped_quotes_keep_their_backslash() {
        let value = quote(r#"a"b"#);
        let pattern = name(&format!("dom:name={value},type=*"));
        assert!(pattern.matches(&name(&format!("dom:name={value},type=Cache"))));
        assert!(glob_match(r"a\x", r"a\x"));
        assert!(!glob_match(r"a\x", "ax"));
    }

    #[test]
    fn quote_escapes_embedded_quotes() {
        assert_eq!(quote(r#"a"b"#), r#""a\"b""#);
        let parsed = name(&format!("dom:name={}", quote(r#"a"b,c"#)));
        assert_eq!(parsed.property("name"), Some(r#""a\"b,c""#));
    }
}
