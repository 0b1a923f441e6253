use std::fmt;

use regex::Regex;

/// Anchored name pattern used by class, method and tag filters
///
/// Patterns are regular-expression fragments matched against the whole name
/// (`Acme::Blog::.*` matches every class in `Acme::Blog`). As a shorthand, a `*` that does not
/// follow anything it could repeat (start of the pattern, or directly after `:`, `(` or `|`)
/// stands for `.*`, so `*Controller` and `Acme::*` work as expected.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile a pattern
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error for patterns that are not valid regular
    /// expressions after wildcard expansion.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let expanded = expand_wildcards(source);
        let regex = Regex::new(&format!("^(?:{})$", expanded))?;
        Ok(NamePattern {
            source: source.to_string(),
            regex,
        })
    }

    #[inline]
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Whether any of the given names matches
    pub fn matches_any<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().any(|n| self.regex.is_match(n))
    }

    /// The pattern as written in the expression
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn expand_wildcards(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 4);
    let mut previous: Option<char> = None;
    let mut escaped = false;
    for c in source.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            previous = Some(c);
            continue;
        }
        if c == '\\' {
            escaped = true;
            out.push(c);
            continue;
        }
        if c == '*' && matches!(previous, None | Some(':') | Some('(') | Some('|')) {
            out.push_str(".*");
        } else {
            out.push(c);
        }
        previous = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let p = NamePattern::new("Acme::Blog::Post").unwrap();
        assert!(p.is_match("Acme::Blog::Post"));
        assert!(!p.is_match("Acme::Blog::PostRepository"));
        assert!(!p.is_match("My::Acme::Blog::Post"));
    }

    #[test]
    fn test_regex_fragments_are_accepted() {
        let p = NamePattern::new("Acme::Blog::.*Repository").unwrap();
        assert!(p.is_match("Acme::Blog::PostRepository"));
        assert!(!p.is_match("Acme::Shop::OrderRepository"));

        let alternation = NamePattern::new("get|set").unwrap();
        assert!(alternation.is_match("set"));
        assert!(!alternation.is_match("reset"));
    }

    #[test]
    fn test_bare_star_expands() {
        assert!(NamePattern::new("*").unwrap().is_match("anything"));
        assert!(NamePattern::new("Acme::*").unwrap().is_match("Acme::Blog::Post"));
        assert!(NamePattern::new("*Controller").unwrap().is_match("Acme::PostController"));
        // A star after a literal keeps its regex meaning.
        let p = NamePattern::new("fo*").unwrap();
        assert!(p.is_match("foooo"));
        assert!(!p.is_match("four"));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        assert!(NamePattern::new("Acme::(Blog").is_err());
    }
}
