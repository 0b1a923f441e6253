use super::composite::Operator;
use crate::error::{AopError, Result};

/// One operand of a pointcut expression together with the operator that joins it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub operator: Operator,
    pub text: &'a str,
}

/// Split an expression at top-level `&&` / `||`
///
/// Operators inside parentheses or quotes are left alone. A leading `!` on an operand negates
/// its operator; the first operand is joined with an implicit `&&`.
pub(crate) fn tokenize<'a>(expression: &'a str, source_hint: &str) -> Result<Vec<Token<'a>>> {
    let bytes = expression.as_bytes();
    let mut tokens = Vec::new();
    let mut depth: usize = 0;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut operator = Operator::And;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' if depth > 0 => quote = Some(c),
            b'(' => depth += 1,
            b')' => {
                if depth == 0 {
                    return Err(AopError::invalid_expression(
                        expression,
                        "excess closing parenthesis",
                        source_hint,
                    ));
                }
                depth -= 1;
            }
            b'&' | b'|' if depth == 0 && bytes.get(i + 1) == Some(&c) => {
                tokens.push(operand(expression, &expression[start..i], operator, source_hint)?);
                operator = if c == b'&' { Operator::And } else { Operator::Or };
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    if quote.is_some() {
        return Err(AopError::invalid_expression(
            expression,
            "unterminated quoted value",
            source_hint,
        ));
    }
    if depth > 0 {
        return Err(AopError::invalid_expression(
            expression,
            "lacking closing parenthesis",
            source_hint,
        ));
    }
    tokens.push(operand(expression, &expression[start..], operator, source_hint)?);
    Ok(tokens)
}

fn operand<'a>(
    expression: &str,
    raw: &'a str,
    operator: Operator,
    source_hint: &str,
) -> Result<Token<'a>> {
    let mut text = raw.trim();
    let mut operator = operator;
    if let Some(rest) = text.strip_prefix('!') {
        operator = operator.negated();
        text = rest.trim_start();
    }
    if text.is_empty() {
        return Err(AopError::invalid_expression(
            expression,
            format!("pointcut designator expected after \"{}\"", operator),
            source_hint,
        ));
    }
    Ok(Token { operator, text })
}
