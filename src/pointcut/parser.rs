use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::composite::{FilterComposite, Operator};
use super::filter::{CustomFilter, Filter, PointcutReference, SettingCondition};
use super::lexer::{tokenize, Token};
use super::pattern::NamePattern;
use crate::error::{AopError, Result};
use crate::reflection::Visibility;

static DESIGNATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)\(").expect("designator regex should be valid"));

static VISIBILITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(public|protected|private)\s+").expect("visibility regex should be valid")
});

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)*)->([A-Za-z_][A-Za-z0-9_]*)$")
        .expect("pointcut reference regex should be valid")
});

static SETTING_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]+(?:\s*[.:]\s*[A-Za-z0-9_\-]+)*$")
        .expect("setting path regex should be valid")
});

/// Parser for the pointcut expression language
///
/// ```text
/// expression  := operand (("&&" | "||") operand)*
/// operand     := "!"? (designator | reference)
/// designator  := "method(" visibility? classPattern "->" methodPattern "()" ")"
///              | "class(" pattern ")"        | "within(" pattern ")"
///              | "classTaggedWith(" pattern ")" | "methodTaggedWith(" pattern ")"
///              | "filter(" name ")"          | "setting(" path ("=" value)? ")"
/// reference   := AspectClass "->" pointcutName
/// ```
///
/// Every error names the offending expression and the source hint it was declared with.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointcutExpressionParser;

impl PointcutExpressionParser {
    pub fn new() -> Self {
        PointcutExpressionParser
    }

    /// Parse an expression into a filter composite
    ///
    /// # Errors
    ///
    /// [`AopError::InvalidExpression`] for any syntax error.
    pub fn parse(&self, expression: &str, source_hint: &str) -> Result<FilterComposite> {
        let mut composite = FilterComposite::new();
        for token in tokenize(expression, source_hint)? {
            self.parse_operand(&mut composite, &token, source_hint)?;
        }
        Ok(composite)
    }

    /// Parse an expression given as a manifest value
    ///
    /// # Errors
    ///
    /// [`AopError::InvalidExpression`] if the value is not a non-empty string or does not parse.
    pub fn parse_value(&self, value: &Value, source_hint: &str) -> Result<FilterComposite> {
        let expression = expression_text(value, source_hint)?;
        self.parse(expression, source_hint)
    }

    fn parse_operand(
        &self,
        composite: &mut FilterComposite,
        token: &Token<'_>,
        source_hint: &str,
    ) -> Result<()> {
        let text = token.text;
        if !text.contains('(') {
            let reference = parse_reference(text, source_hint)?;
            composite.add_filter(token.operator, Filter::PointcutReference(reference));
            return Ok(());
        }

        let Some(captures) = DESIGNATOR.captures(text) else {
            return Err(AopError::invalid_expression(
                text,
                "pointcut designator expected",
                source_hint,
            ));
        };
        let keyword = captures.get(1).map_or("", |m| m.as_str());
        let open = keyword.len();
        if matching_close(text, open) != Some(text.len() - 1) {
            return Err(AopError::invalid_expression(
                text,
                "unexpected text after designator",
                source_hint,
            ));
        }
        let inner = &text[open + 1..text.len() - 1];

        let filter = match keyword {
            "method" => {
                let method = parse_method(inner, text, source_hint)?;
                composite.add_composite(token.operator, method);
                return Ok(());
            }
            "class" => Filter::ClassName(pattern(inner, text, source_hint)?),
            "classTaggedWith" | "classAnnotatedWith" => {
                Filter::ClassTaggedWith(pattern(inner, text, source_hint)?)
            }
            "methodTaggedWith" | "methodAnnotatedWith" => {
                Filter::MethodTaggedWith(pattern(inner, text, source_hint)?)
            }
            "within" => Filter::Within(pattern(inner, text, source_hint)?),
            "filter" => {
                let name = inner.trim();
                if name.is_empty() {
                    return Err(AopError::invalid_expression(
                        text,
                        "filter name expected",
                        source_hint,
                    ));
                }
                Filter::Custom(CustomFilter::unresolved(name))
            }
            "setting" => Filter::Setting(parse_setting(inner, text, source_hint)?),
            "evaluate" => {
                return Err(AopError::invalid_expression(
                    text,
                    "runtime evaluations are not supported",
                    source_hint,
                ))
            }
            _ => {
                return Err(AopError::invalid_expression(
                    text,
                    format!("unknown pointcut designator \"{}\"", keyword),
                    source_hint,
                ))
            }
        };
        composite.add_filter(token.operator, filter);
        Ok(())
    }
}

/// Extract the expression string from a manifest value
pub(crate) fn expression_text<'v>(value: &'v Value, source_hint: &str) -> Result<&'v str> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.as_str()),
        Value::String(_) => Err(AopError::invalid_expression(
            "",
            "pointcut expression must not be empty",
            source_hint,
        )),
        other => Err(AopError::invalid_expression(
            other.to_string(),
            "pointcut expression must be a string",
            source_hint,
        )),
    }
}

fn pattern(raw: &str, token: &str, source_hint: &str) -> Result<NamePattern> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AopError::invalid_expression(
            token,
            "pattern expected",
            source_hint,
        ));
    }
    NamePattern::new(raw).map_err(|e| {
        AopError::invalid_expression(
            token,
            format!("invalid pattern \"{}\": {}", raw, e),
            source_hint,
        )
    })
}

fn parse_reference(text: &str, source_hint: &str) -> Result<PointcutReference> {
    if !text.contains("->") {
        return Err(AopError::invalid_expression(
            text,
            "\"->\" expected in pointcut reference",
            source_hint,
        ));
    }
    let captures = REFERENCE.captures(text).ok_or_else(|| {
        AopError::invalid_expression(text, "invalid pointcut reference", source_hint)
    })?;
    let aspect = captures.get(1).map_or("", |m| m.as_str());
    let name = captures.get(2).map_or("", |m| m.as_str());
    Ok(PointcutReference::new(aspect, name))
}

fn parse_method(signature: &str, token: &str, source_hint: &str) -> Result<FilterComposite> {
    let mut rest = signature.trim();
    let mut visibility = None;
    if let Some(m) = VISIBILITY.captures(rest).and_then(|c| c.get(1)) {
        visibility = Visibility::parse(m.as_str());
        rest = rest[m.end()..].trim_start();
        if VISIBILITY.is_match(rest) {
            return Err(AopError::invalid_expression(
                token,
                "only one visibility modifier is allowed",
                source_hint,
            ));
        }
    }

    let Some((class_part, method_part)) = rest.split_once("->") else {
        return Err(AopError::invalid_expression(
            token,
            "\"->\" expected",
            source_hint,
        ));
    };
    let method_part = method_part.trim();
    let Some(open) = trailing_group(method_part) else {
        return Err(AopError::invalid_expression(
            token,
            "\"(\" expected in method part",
            source_hint,
        ));
    };
    let arguments = &method_part[open + 1..method_part.len() - 1];
    if !arguments.trim().is_empty() {
        return Err(AopError::invalid_expression(
            token,
            "argument constraints are not supported",
            source_hint,
        ));
    }
    let class_pattern = pattern(class_part, token, source_hint)?;
    let method_name = method_part[..open].trim();
    let method_pattern = pattern(method_name, token, source_hint)?;

    let origin = match visibility {
        Some(v) => format!("method({} {}->{}())", v, class_pattern, method_pattern),
        None => format!("method({}->{}())", class_pattern, method_pattern),
    };
    let mut composite = FilterComposite::with_origin(origin);
    composite.add_filter(Operator::And, Filter::ClassName(class_pattern));
    composite.add_filter(
        Operator::And,
        Filter::MethodName {
            pattern: method_pattern,
            visibility,
        },
    );
    Ok(composite)
}

fn parse_setting(inner: &str, token: &str, source_hint: &str) -> Result<SettingCondition> {
    let (path, expected) = match inner.split_once('=') {
        None => (inner.trim(), None),
        Some((path, value)) => (path.trim(), Some(unquote(value.trim(), token, source_hint)?)),
    };
    if !SETTING_PATH.is_match(path) {
        return Err(AopError::invalid_expression(
            token,
            "setting path expected",
            source_hint,
        ));
    }
    Ok(SettingCondition::new(path, expected))
}

fn unquote(value: &str, token: &str, source_hint: &str) -> Result<String> {
    match value.chars().next() {
        Some(q @ ('\'' | '"')) => {
            if value.len() >= 2 && value.ends_with(q) {
                Ok(value[1..value.len() - 1].to_string())
            } else {
                Err(AopError::invalid_expression(
                    token,
                    "unterminated quoted value",
                    source_hint,
                ))
            }
        }
        Some(_) => Ok(value.to_string()),
        None => Err(AopError::invalid_expression(
            token,
            "setting value expected after \"=\"",
            source_hint,
        )),
    }
}

/// Index of the parenthesis closing the one at `open`
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' if depth > 0 => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the `(` opening the group that ends `text`
fn trailing_group(text: &str) -> Option<usize> {
    if !text.ends_with(')') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
