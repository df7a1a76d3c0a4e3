//! Pest-based parser for plan scripts

use super::ast::{Args, Expr, Script, Statement};
use super::ScriptError;
use chrono::NaiveDate;
use optic_ir::Value;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "script/optic.pest"]
struct ScriptParser;

impl From<pest::error::Error<Rule>> for ScriptError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        ScriptError::Syntax(err.to_string())
    }
}

/// Parse script source text into a syntax tree
pub fn parse(source: &str) -> Result<Script, ScriptError> {
    let script = ScriptParser::parse(Rule::script, source)?
        .next()
        .ok_or_else(|| ScriptError::Syntax("Empty input".to_string()))?;

    let mut statements = Vec::new();
    for pair in script.into_inner() {
        match pair.as_rule() {
            Rule::let_stmt => {
                let mut inner = pair.into_inner();
                next(&mut inner)?; // `let`
                let name = next(&mut inner)?.as_str().to_string();
                let expr = parse_expr(next(&mut inner)?)?;
                statements.push(Statement::Let { name, expr });
            }
            Rule::expr_stmt => {
                let expr = parse_expr(next(&mut pair.into_inner())?)?;
                statements.push(Statement::Expr(expr));
            }
            Rule::EOI => {}
            rule => return Err(unexpected(rule)),
        }
    }

    Ok(Script { statements })
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, ScriptError> {
    pairs
        .next()
        .ok_or_else(|| ScriptError::Syntax("Unexpected end of input".to_string()))
}

fn unexpected(rule: Rule) -> ScriptError {
    ScriptError::Syntax(format!("Unexpected {:?}", rule))
}

fn parse_expr(pair: Pair<Rule>) -> Result<Expr, ScriptError> {
    let mut inner = pair.into_inner();
    let mut expr = parse_primary(next(&mut inner)?)?;

    // method chain: `.name(args)` applied left to right
    for method in inner {
        let mut parts = method.into_inner();
        let name = next(&mut parts)?.as_str().to_string();
        let args = parse_args(next(&mut parts)?)?;
        expr = Expr::Call {
            target: Box::new(expr),
            method: name,
            args,
        };
    }

    Ok(expr)
}

fn parse_primary(pair: Pair<Rule>) -> Result<Expr, ScriptError> {
    let text = pair.as_str();
    let expr = match pair.as_rule() {
        Rule::null => Expr::Literal(Value::Null),
        Rule::boolean => Expr::Literal(Value::Bool(text == "true")),
        Rule::int => Expr::Literal(Value::Int(text.parse().map_err(|_| {
            ScriptError::Syntax(format!("Integer out of range: {}", text))
        })?)),
        Rule::float => Expr::Literal(Value::Float(text.parse().map_err(|_| {
            ScriptError::Syntax(format!("Invalid number: {}", text))
        })?)),
        Rule::date => Expr::Literal(Value::Date(parse_date(text)?)),
        Rule::string => Expr::Literal(Value::String(unescape(text))),
        Rule::ident => Expr::Ident(text.to_string()),
        Rule::array => Expr::Array(
            pair.into_inner()
                .map(parse_expr)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Rule::object => Expr::Object(
            pair.into_inner()
                .map(parse_entry)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Rule::expr => parse_expr(pair)?,
        rule => return Err(unexpected(rule)),
    };
    Ok(expr)
}

fn parse_args(pair: Pair<Rule>) -> Result<Args, ScriptError> {
    let Some(inner) = pair.into_inner().next() else {
        return Ok(Args::Positional(Vec::new()));
    };
    match inner.as_rule() {
        Rule::positional => Ok(Args::Positional(
            inner
                .into_inner()
                .map(parse_expr)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Rule::named_args => Ok(Args::Named(
            inner
                .into_inner()
                .map(parse_entry)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        rule => Err(unexpected(rule)),
    }
}

/// `key: value` in an object literal or a named argument list
fn parse_entry(pair: Pair<Rule>) -> Result<(String, Expr), ScriptError> {
    let mut parts = pair.into_inner();
    let key = next(&mut parts)?;
    let key = match key.as_rule() {
        Rule::string => unescape(key.as_str()),
        _ => key.as_str().to_string(),
    };
    let value = parse_expr(next(&mut parts)?)?;
    Ok((key, value))
}

fn parse_date(text: &str) -> Result<NaiveDate, ScriptError> {
    NaiveDate::parse_from_str(text.trim_start_matches('@'), "%Y-%m-%d")
        .map_err(|_| ScriptError::InvalidDate(text.to_string()))
}

/// Strip the quotes and resolve escapes of a string token
fn unescape(token: &str) -> String {
    let body = &token[1..token.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
