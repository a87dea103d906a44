//! Filter composition: per-column filter logic, the combined-expression
//! builder, and the predicate language the expressions are written in.
//!
//! The expression syntax mirrors the row source's native filter grammar:
//! `=`, `<>`, `<`, `<=`, `>`, `>=`, `LIKE` with `%`/`_` wildcards,
//! `IS [NOT] NULL`, `AND`/`OR` with parentheses, `'quoted'` strings with
//! `''` escapes and `[bracketed]` column names.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{cluster::ClusterCatalogue, value::Value};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown column '{0}'")]
    ColumnNotFound(String),
    #[error("Invalid filter expression: {0}")]
    Syntax(String),
}

/// Filter state for one displayed column. Entries are replaced wholesale
/// when rebuilt, never mutated field by field.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilterLogic {
    pub expression: String,
    pub active: bool,
    /// Pick-list catalogue the expression was built from, when it was.
    pub catalogue: Option<ClusterCatalogue>,
}

impl ColumnFilterLogic {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            active: true,
            catalogue: None,
        }
    }

    fn contributes(&self) -> bool {
        self.active && !self.expression.trim().is_empty()
    }
}

/// Anything a combined filter expression can be applied to.
pub trait FilterTarget {
    fn apply_filter(&mut self, expression: &str) -> Result<(), EngineError>;
}

/// Owns the per-column filter map and the currently applied combined
/// expression. Keyed by column name; join order follows the display order
/// given at construction so the combined string is deterministic.
#[derive(Debug, Default)]
pub struct FilterComposer {
    display_order: Vec<String>,
    logic: BTreeMap<String, ColumnFilterLogic>,
    applied: String,
}

impl FilterComposer {
    pub fn new(display_order: Vec<String>) -> Self {
        Self {
            display_order,
            logic: BTreeMap::new(),
            applied: String::new(),
        }
    }

    pub fn set_logic(&mut self, column: &str, logic: ColumnFilterLogic) {
        self.logic.insert(column.to_string(), logic);
    }

    pub fn remove_logic(&mut self, column: &str) -> Option<ColumnFilterLogic> {
        self.logic.remove(column)
    }

    pub fn logic(&self, column: &str) -> Option<&ColumnFilterLogic> {
        self.logic.get(column)
    }

    pub fn set_active(&mut self, column: &str, active: bool) {
        if let Some(logic) = self.logic.get_mut(column) {
            logic.active = active;
        }
    }

    pub fn applied_expression(&self) -> &str {
        &self.applied
    }

    /// Active filter entries in display order, for persistence.
    pub fn active_logic(&self) -> Vec<(&str, &ColumnFilterLogic)> {
        self.display_order
            .iter()
            .filter_map(|name| {
                self.logic
                    .get(name)
                    .filter(|logic| logic.contributes())
                    .map(|logic| (name.as_str(), logic))
            })
            .collect()
    }

    /// Joins every contributing column's expression with `AND`, each term
    /// parenthesized, in display order.
    pub fn combined_expression(&self) -> String {
        let mut terms: Vec<String> = Vec::new();
        let mut append = |logic: &ColumnFilterLogic| {
            if logic.contributes() {
                let trimmed = logic.expression.trim();
                if fully_parenthesized(trimmed) {
                    terms.push(trimmed.to_string());
                } else {
                    terms.push(format!("({trimmed})"));
                }
            }
        };
        for name in &self.display_order {
            if let Some(logic) = self.logic.get(name) {
                append(logic);
            }
        }
        // Columns outside the known display order still contribute, last.
        for (name, logic) in &self.logic {
            if !self.display_order.contains(name) {
                append(logic);
            }
        }
        terms.join(" AND ")
    }

    /// Rebuilds the combined expression and applies it to the target when it
    /// differs (ordinal comparison) from the one already applied.
    pub fn apply_filters(&mut self, target: &mut dyn FilterTarget) -> Result<bool, EngineError> {
        let combined = self.combined_expression();
        if combined == self.applied {
            debug!("combined filter unchanged, not reapplying");
            return Ok(false);
        }
        target.apply_filter(&combined)?;
        info!("applied filter: {combined:?}");
        self.applied = combined;
        Ok(true)
    }
}

/// Builds an "any of" OR-list expression from the checked entries of a
/// cluster catalogue. Returns `None` when nothing is checked.
pub fn any_of_expression(column: &str, catalogue: &ClusterCatalogue) -> Option<String> {
    let column = reference_column(column);
    let terms: Vec<String> = catalogue
        .clusters
        .iter()
        .filter(|cluster| cluster.active)
        .map(|cluster| {
            let literal = match &cluster.source_value {
                Some(Value::Integer(i)) => i.to_string(),
                Some(Value::Numeric(d)) => d.normalize().to_string(),
                Some(Value::Double(f)) => f.to_string(),
                Some(Value::Percentage(d)) => d.normalize().to_string(),
                Some(Value::Boolean(b)) => quote_literal(if *b { "true" } else { "false" }),
                // Grid display text follows the column format; the predicate
                // evaluator only parses ISO date literals, so emit those from
                // the typed value instead.
                Some(value @ Value::DateTime(_)) => quote_literal(&value.as_display()),
                _ => quote_literal(&cluster.display_text),
            };
            format!("{column} = {literal}")
        })
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(format!("({})", terms.join(" OR ")))
    }
}

pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// True only when the leading `(` matches the trailing `)`, so a term like
/// `(a = 1) OR (a = 2)` still gets wrapped before `AND`-joining. Quoted
/// string content is skipped during the balance scan.
fn fully_parenthesized(expression: &str) -> bool {
    if !expression.starts_with('(') || !expression.ends_with(')') {
        return false;
    }
    let last = expression.chars().count() - 1;
    let mut depth = 0usize;
    let mut in_string = false;
    for (position, ch) in expression.chars().enumerate() {
        match ch {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
                if depth == 0 && position != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !in_string
}

fn reference_column(name: &str) -> String {
    let plain = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain && !name.is_empty() {
        name.to_string()
    } else {
        format!("[{name}]")
    }
}

// ---------------------------------------------------------------------------
// Predicate language

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
enum Literal {
    Text(String),
    Number(Decimal),
    Bool(bool),
}

#[derive(Debug)]
enum Node {
    And(Vec<Node>),
    Or(Vec<Node>),
    Compare {
        column: String,
        op: CompareOp,
        literal: Literal,
    },
    Like {
        column: String,
        regex: Regex,
    },
    IsNull {
        column: String,
        negated: bool,
    },
}

/// A parsed, reusable filter predicate.
#[derive(Debug)]
pub struct FilterPredicate {
    source: String,
    node: Option<Node>,
}

impl FilterPredicate {
    /// Parses an expression. An empty expression is the match-all predicate.
    pub fn parse(expression: &str) -> Result<Self, EngineError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Ok(Self {
                source: String::new(),
                node: None,
            });
        }
        let tokens = tokenize(trimmed)?;
        let mut parser = Parser { tokens, pos: 0 };
        let node = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(EngineError::Syntax(format!(
                "unexpected trailing input in '{trimmed}'"
            )));
        }
        Ok(Self {
            source: trimmed.to_string(),
            node: Some(node),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the predicate against one row of typed cells.
    pub fn matches(
        &self,
        columns: &[String],
        cells: &[Option<Value>],
    ) -> Result<bool, EngineError> {
        match &self.node {
            None => Ok(true),
            Some(node) => eval(node, columns, cells),
        }
    }
}

fn eval(node: &Node, columns: &[String], cells: &[Option<Value>]) -> Result<bool, EngineError> {
    match node {
        Node::And(children) => {
            for child in children {
                if !eval(child, columns, cells)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Node::Or(children) => {
            for child in children {
                if eval(child, columns, cells)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Node::Compare {
            column,
            op,
            literal,
        } => {
            let cell = lookup(column, columns, cells)?;
            let Some(cell) = cell else {
                // SQL semantics: comparisons against a null cell never match.
                return Ok(false);
            };
            let Some(ordering) = compare(cell, literal) else {
                return Ok(false);
            };
            Ok(match op {
                CompareOp::Eq => ordering == Ordering::Equal,
                CompareOp::Ne => ordering != Ordering::Equal,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Ge => ordering != Ordering::Less,
            })
        }
        Node::Like { column, regex } => {
            let cell = lookup(column, columns, cells)?;
            Ok(match cell {
                Some(value) => regex.is_match(&value.as_display()),
                None => false,
            })
        }
        Node::IsNull { column, negated } => {
            let cell = lookup(column, columns, cells)?;
            Ok(cell.is_none() != *negated)
        }
    }
}

fn lookup<'a>(
    column: &str,
    columns: &[String],
    cells: &'a [Option<Value>],
) -> Result<Option<&'a Value>, EngineError> {
    let index = columns
        .iter()
        .position(|name| name.eq_ignore_ascii_case(column))
        .ok_or_else(|| EngineError::ColumnNotFound(column.to_string()))?;
    Ok(cells.get(index).and_then(Option::as_ref))
}

/// Typed comparison with coercion of the literal towards the cell's kind.
/// Falls back to ordinal comparison of display text; `None` means the pair
/// is not comparable at all.
fn compare(cell: &Value, literal: &Literal) -> Option<Ordering> {
    match (cell, literal) {
        (Value::Integer(i), Literal::Number(n)) => Some(Decimal::from(*i).cmp(n)),
        (Value::Numeric(d), Literal::Number(n)) => Some(d.cmp(n)),
        (Value::Percentage(d), Literal::Number(n)) => Some(d.cmp(n)),
        (Value::Double(f), Literal::Number(n)) => {
            let lhs = Decimal::from_f64_retain(*f)?;
            Some(lhs.cmp(n))
        }
        (Value::Boolean(b), Literal::Bool(l)) => Some(b.cmp(l)),
        (Value::Boolean(b), Literal::Text(t)) => {
            let parsed = match t.to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => return Some(cell.as_display().cmp(t)),
            };
            Some(b.cmp(&parsed))
        }
        (Value::DateTime(dt), Literal::Text(t)) => match parse_literal_date_time(t) {
            Some(rhs) => Some(dt.cmp(&rhs)),
            None => Some(cell.as_display().as_str().cmp(t.as_str())),
        },
        (_, Literal::Text(t)) => Some(cell.as_display().as_str().cmp(t.as_str())),
        _ => None,
    }
}

fn parse_literal_date_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Text(String),
    Number(Decimal),
    Op(CompareOp),
    LeftParen,
    RightParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EngineError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LeftParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Op(CompareOp::Eq));
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'>') {
                    tokens.push(Token::Op(CompareOp::Ne));
                    i += 2;
                } else if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(CompareOp::Le));
                    i += 2;
                } else {
                    tokens.push(Token::Op(CompareOp::Lt));
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(CompareOp::Ge));
                    i += 2;
                } else {
                    tokens.push(Token::Op(CompareOp::Gt));
                    i += 1;
                }
            }
            '\'' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            text.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(c) => {
                            text.push(*c);
                            i += 1;
                        }
                        None => {
                            return Err(EngineError::Syntax(
                                "unterminated string literal".to_string(),
                            ));
                        }
                    }
                }
                tokens.push(Token::Text(text));
            }
            '[' => {
                let mut name = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        Some(']') => {
                            i += 1;
                            break;
                        }
                        Some(c) => {
                            name.push(*c);
                            i += 1;
                        }
                        None => {
                            return Err(EngineError::Syntax(
                                "unterminated bracketed column name".to_string(),
                            ));
                        }
                    }
                }
                tokens.push(Token::Ident(name));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let slice: String = chars[start..i].iter().collect();
                let number = slice.parse::<Decimal>().map_err(|_| {
                    EngineError::Syntax(format!("invalid number literal '{slice}'"))
                })?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(EngineError::Syntax(format!(
                    "unexpected character '{other}'"
                )));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case(word))
    }

    fn take_keyword(&mut self, word: &str) -> bool {
        if self.keyword(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Node, EngineError> {
        let mut terms = vec![self.parse_and()?];
        while self.take_keyword("OR") {
            terms.push(self.parse_and()?);
        }
        if terms.len() == 1 {
            Ok(terms.pop().unwrap_or(Node::And(Vec::new())))
        } else {
            Ok(Node::Or(terms))
        }
    }

    fn parse_and(&mut self) -> Result<Node, EngineError> {
        let mut terms = vec![self.parse_primary()?];
        while self.take_keyword("AND") {
            terms.push(self.parse_primary()?);
        }
        if terms.len() == 1 {
            Ok(terms.pop().unwrap_or(Node::And(Vec::new())))
        } else {
            Ok(Node::And(terms))
        }
    }

    fn parse_primary(&mut self) -> Result<Node, EngineError> {
        if self.peek() == Some(&Token::LeftParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            if self.peek() != Some(&Token::RightParen) {
                return Err(EngineError::Syntax("missing closing parenthesis".to_string()));
            }
            self.pos += 1;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, EngineError> {
        let column = match self.peek() {
            Some(Token::Ident(name)) => name.clone(),
            other => {
                return Err(EngineError::Syntax(format!(
                    "expected column reference, found {other:?}"
                )));
            }
        };
        self.pos += 1;

        if self.take_keyword("IS") {
            let negated = self.take_keyword("NOT");
            if !self.take_keyword("NULL") {
                return Err(EngineError::Syntax("expected NULL after IS".to_string()));
            }
            return Ok(Node::IsNull { column, negated });
        }

        if self.take_keyword("LIKE") {
            let pattern = match self.peek() {
                Some(Token::Text(text)) => text.clone(),
                other => {
                    return Err(EngineError::Syntax(format!(
                        "LIKE expects a quoted pattern, found {other:?}"
                    )));
                }
            };
            self.pos += 1;
            let regex = like_to_regex(&pattern)?;
            return Ok(Node::Like { column, regex });
        }

        let op = match self.peek() {
            Some(Token::Op(op)) => *op,
            other => {
                return Err(EngineError::Syntax(format!(
                    "expected comparison operator, found {other:?}"
                )));
            }
        };
        self.pos += 1;

        let literal = match self.peek() {
            Some(Token::Text(text)) => Literal::Text(text.clone()),
            Some(Token::Number(number)) => Literal::Number(*number),
            Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case("true") => Literal::Bool(true),
            Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case("false") => {
                Literal::Bool(false)
            }
            other => {
                return Err(EngineError::Syntax(format!(
                    "expected literal, found {other:?}"
                )));
            }
        };
        self.pos += 1;
        Ok(Node::Compare {
            column,
            op,
            literal,
        })
    }
}

/// `%` matches any run, `_` a single character; everything else is literal.
/// Case-insensitive full-string match.
fn like_to_regex(pattern: &str) -> Result<Regex, EngineError> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push_str("(?i)^");
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
        .map_err(|err| EngineError::Syntax(format!("invalid LIKE pattern '{pattern}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterOutcome, ValueCluster};

    struct Recorder {
        applied: Vec<String>,
    }

    impl FilterTarget for Recorder {
        fn apply_filter(&mut self, expression: &str) -> Result<(), EngineError> {
            self.applied.push(expression.to_string());
            Ok(())
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn combined_expression_follows_display_order() {
        let mut composer =
            FilterComposer::new(vec!["city".to_string(), "amount".to_string()]);
        composer.set_logic("amount", ColumnFilterLogic::new("amount > 5"));
        composer.set_logic("city", ColumnFilterLogic::new("city = 'Oslo'"));
        assert_eq!(
            composer.combined_expression(),
            "(city = 'Oslo') AND (amount > 5)"
        );
    }

    #[test]
    fn apply_filters_reports_changed_only_on_difference() {
        let mut composer = FilterComposer::new(vec!["city".to_string()]);
        composer.set_logic("city", ColumnFilterLogic::new("city = 'Oslo'"));
        let mut target = Recorder { applied: Vec::new() };

        assert!(composer.apply_filters(&mut target).unwrap());
        assert!(!composer.apply_filters(&mut target).unwrap());
        assert_eq!(target.applied, vec!["(city = 'Oslo')".to_string()]);
    }

    #[test]
    fn deactivation_restores_remaining_filters_exactly() {
        let mut composer =
            FilterComposer::new(vec!["a".to_string(), "b".to_string()]);
        composer.set_logic("a", ColumnFilterLogic::new("a = 1"));
        let before = composer.combined_expression();

        composer.set_logic("b", ColumnFilterLogic::new("b = 2"));
        assert_eq!(composer.combined_expression(), "(a = 1) AND (b = 2)");

        composer.set_active("b", false);
        assert_eq!(composer.combined_expression(), before);
    }

    #[test]
    fn or_term_is_wrapped_before_joining() {
        let mut composer =
            FilterComposer::new(vec!["a".to_string(), "c".to_string()]);
        composer.set_logic("a", ColumnFilterLogic::new("(a = 1) OR (a = 2)"));
        composer.set_logic("c", ColumnFilterLogic::new("c = 3"));
        let combined = composer.combined_expression();
        assert_eq!(combined, "((a = 1) OR (a = 2)) AND (c = 3)");

        let predicate = FilterPredicate::parse(&combined).unwrap();
        let cols = columns(&["a", "c"]);
        let rows = [(1, 9), (2, 3), (5, 3)];
        let surviving: Vec<(i64, i64)> = rows
            .iter()
            .filter(|(a, c)| {
                predicate
                    .matches(&cols, &[Some(Value::Integer(*a)), Some(Value::Integer(*c))])
                    .unwrap()
            })
            .copied()
            .collect();
        assert_eq!(surviving, vec![(2, 3)]);
    }

    #[test]
    fn fully_wrapped_term_is_not_double_wrapped() {
        let mut composer = FilterComposer::new(vec!["a".to_string()]);
        composer.set_logic("a", ColumnFilterLogic::new("(a = 1 OR a = 2)"));
        assert_eq!(composer.combined_expression(), "(a = 1 OR a = 2)");
        assert!(fully_parenthesized("(a = '(' OR a = ')')"));
        assert!(!fully_parenthesized("(a = 1) OR (a = 2)"));
    }

    #[test]
    fn any_of_builds_or_list_with_escaped_literals() {
        let catalogue = ClusterCatalogue {
            outcome: ClusterOutcome::ListFilled,
            clusters: vec![
                ValueCluster {
                    display_text: "O'Brien".to_string(),
                    source_value: None,
                    count: 3,
                    active: true,
                },
                ValueCluster {
                    display_text: "Smith".to_string(),
                    source_value: None,
                    count: 1,
                    active: true,
                },
                ValueCluster {
                    display_text: "Jones".to_string(),
                    source_value: None,
                    count: 1,
                    active: false,
                },
            ],
        };
        assert_eq!(
            any_of_expression("last name", &catalogue).as_deref(),
            Some("([last name] = 'O''Brien' OR [last name] = 'Smith')")
        );
    }

    #[test]
    fn any_of_emits_iso_literals_for_date_clusters() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 5)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN);
        let catalogue = ClusterCatalogue {
            outcome: ClusterOutcome::ListFilled,
            clusters: vec![ValueCluster {
                // Day-first grid rendering; the literal must still be ISO.
                display_text: "05/01/2023".to_string(),
                source_value: Some(Value::DateTime(day)),
                count: 2,
                active: true,
            }],
        };
        let expression = any_of_expression("ordered", &catalogue).unwrap();
        assert_eq!(expression, "(ordered = '2023-01-05')");

        let predicate = FilterPredicate::parse(&expression).unwrap();
        let cols = columns(&["ordered"]);
        assert!(
            predicate
                .matches(&cols, &[Some(Value::DateTime(day))])
                .unwrap()
        );
    }

    #[test]
    fn predicate_evaluates_comparisons_and_boolean_logic() {
        let predicate =
            FilterPredicate::parse("(city = 'Oslo' OR city = 'Bergen') AND amount >= 10")
                .unwrap();
        let cols = columns(&["city", "amount"]);
        let hit = vec![
            Some(Value::String("Bergen".to_string())),
            Some(Value::Integer(12)),
        ];
        let miss = vec![
            Some(Value::String("Bergen".to_string())),
            Some(Value::Integer(9)),
        ];
        assert!(predicate.matches(&cols, &hit).unwrap());
        assert!(!predicate.matches(&cols, &miss).unwrap());
    }

    #[test]
    fn like_supports_percent_and_underscore_wildcards() {
        let predicate = FilterPredicate::parse("name LIKE 'Jo%'").unwrap();
        let cols = columns(&["name"]);
        assert!(
            predicate
                .matches(&cols, &[Some(Value::String("Jones".to_string()))])
                .unwrap()
        );
        assert!(
            !predicate
                .matches(&cols, &[Some(Value::String("Smith".to_string()))])
                .unwrap()
        );

        let single = FilterPredicate::parse("name LIKE 'J_n'").unwrap();
        assert!(
            single
                .matches(&cols, &[Some(Value::String("Jan".to_string()))])
                .unwrap()
        );
        assert!(
            !single
                .matches(&cols, &[Some(Value::String("Jean".to_string()))])
                .unwrap()
        );
    }

    #[test]
    fn null_checks_and_null_comparisons() {
        let cols = columns(&["amount"]);
        let null_row: Vec<Option<Value>> = vec![None];

        let is_null = FilterPredicate::parse("amount IS NULL").unwrap();
        assert!(is_null.matches(&cols, &null_row).unwrap());

        let is_not_null = FilterPredicate::parse("amount IS NOT NULL").unwrap();
        assert!(!is_not_null.matches(&cols, &null_row).unwrap());

        let compare = FilterPredicate::parse("amount > 0").unwrap();
        assert!(!compare.matches(&cols, &null_row).unwrap());
    }

    #[test]
    fn unknown_column_is_a_named_error() {
        let predicate = FilterPredicate::parse("ghost = 1").unwrap();
        let error = predicate
            .matches(&columns(&["real"]), &[Some(Value::Integer(1))])
            .unwrap_err();
        assert!(matches!(error, EngineError::ColumnNotFound(name) if name == "ghost"));
    }

    #[test]
    fn date_literals_compare_chronologically() {
        let cols = columns(&["ordered"]);
        let cell = vec![Some(Value::DateTime(
            NaiveDate::from_ymd_opt(2023, 6, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        ))];
        let after = FilterPredicate::parse("ordered > '2023-01-01'").unwrap();
        assert!(after.matches(&cols, &cell).unwrap());
        let before = FilterPredicate::parse("ordered < '2023-01-01'").unwrap();
        assert!(!before.matches(&cols, &cell).unwrap());
    }

    #[test]
    fn empty_expression_matches_everything() {
        let predicate = FilterPredicate::parse("   ").unwrap();
        assert!(predicate.matches(&columns(&["a"]), &[None]).unwrap());
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(
            FilterPredicate::parse("city = "),
            Err(EngineError::Syntax(_))
        ));
        assert!(matches!(
            FilterPredicate::parse("city = 'unterminated"),
            Err(EngineError::Syntax(_))
        ));
        assert!(matches!(
            FilterPredicate::parse("(city = 'x'"),
            Err(EngineError::Syntax(_))
        ));
    }
}
