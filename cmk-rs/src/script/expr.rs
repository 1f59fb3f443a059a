//! Condition evaluator for `if()` / `elseif()`.
//!
//! Conditions are evaluated strictly left to right with no operator
//! precedence: `A OR B AND C` is `(A OR B) AND C`.  Parenthesized groups
//! are evaluated recursively and contribute one term.
//!
//! Supported forms:
//!
//! | Form                 | Meaning                                      |
//! |----------------------|----------------------------------------------|
//! | `x`                  | truthiness of a variable or constant         |
//! | `NOT t`              | inversion (may repeat)                       |
//! | `a STREQUAL b`       | string equality                              |
//! | `a EQUAL b`          | string equality (`010` is not `10`)          |
//! | `a IN_LIST l`        | membership in the list held by variable `l`  |
//! | `DEFINED x`          | variable (or `ENV{x}`) existence             |
//! | `t AND t`, `t OR t`  | logic, folded left to right                  |

use crate::error::{Result, ScriptError};

use super::stmt::tokenize_arguments;
use super::value::{dequote, is_bool_constant, is_quoted, is_truthy, parse_int, Value};

/// Lookups the substitution engine and the condition evaluator need from
/// the interpreter.
pub trait EvalContext {
    /// Look up a variable (scope first, then cache).
    fn get_var(&self, name: &str) -> Option<Value>;

    /// Look up an entry of the environment snapshot.
    fn get_env(&self, name: &str) -> Option<String>;
}

// ── Tokens ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
    Strequal,
    Equal,
    InList,
    Defined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Op(Operator),
    /// Quoted text or an unquoted constant; evaluates to its own text.
    Literal(String),
    /// Anything else; names a variable.
    Identifier(String),
    /// `( ... )`, stored without the outer parens.
    Group(String),
}

/// Classify substituted condition arguments.
pub fn classify(args: &[String]) -> Vec<Token> {
    args.iter().map(|a| classify_one(a)).collect()
}

fn classify_one(arg: &str) -> Token {
    let op = match arg {
        "AND" => Some(Operator::And),
        "OR" => Some(Operator::Or),
        "NOT" => Some(Operator::Not),
        "STREQUAL" => Some(Operator::Strequal),
        "EQUAL" => Some(Operator::Equal),
        "IN_LIST" => Some(Operator::InList),
        "DEFINED" => Some(Operator::Defined),
        _ => None,
    };
    if let Some(op) = op {
        return Token::Op(op);
    }
    if is_quoted(arg) {
        return Token::Literal(dequote(arg));
    }
    if arg.len() >= 2 && arg.starts_with('(') && arg.ends_with(')') {
        return Token::Group(arg[1..arg.len() - 1].to_owned());
    }
    if parse_int(arg).is_some() || is_bool_constant(arg) {
        return Token::Literal(arg.to_owned());
    }
    Token::Identifier(arg.to_owned())
}

// ── Nodes ─────────────────────────────────────────────────────────────────────

/// Operand of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Identifier(String),
    Literal(String),
}

/// One element of a parsed condition.  A condition is a flat sequence of
/// terms separated by [`Node::And`] / [`Node::Or`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    And,
    Or,
    Not(Box<Node>),
    Group(Vec<Node>),
    Identifier(String),
    Literal(String),
    Strequal(Operand, Operand),
    Equal(Operand, Operand),
    InList(Operand, Operand),
    Defined(String),
}

/// Build the node sequence for a token list.
pub fn parse(tokens: &[Token]) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Op(Operator::And) => {
                nodes.push(Node::And);
                i += 1;
            }
            Token::Op(Operator::Or) => {
                nodes.push(Node::Or);
                i += 1;
            }
            _ => {
                let (term, next) = parse_term(tokens, i)?;
                nodes.push(term);
                i = next;
            }
        }
    }
    Ok(nodes)
}

fn parse_term(tokens: &[Token], mut i: usize) -> Result<(Node, usize)> {
    let mut invert = false;
    while let Some(Token::Op(Operator::Not)) = tokens.get(i) {
        invert = !invert;
        i += 1;
    }

    let (node, next) = match tokens.get(i) {
        Some(Token::Op(Operator::Defined)) => match tokens.get(i + 1) {
            Some(tok) => (Node::Defined(token_text(tok)), i + 2),
            None => return Err(bad_condition("DEFINED requires a variable name")),
        },
        Some(Token::Op(op)) => return Err(bad_condition(&format!("unexpected operator {op:?}"))),
        Some(tok) => match tokens.get(i + 1) {
            Some(Token::Op(op @ (Operator::Strequal | Operator::Equal | Operator::InList))) => {
                let Some(rhs) = tokens.get(i + 2) else {
                    return Err(bad_condition("comparison is missing its right-hand side"));
                };
                let (l, r) = (operand(tok), operand(rhs));
                let node = match op {
                    Operator::Strequal => Node::Strequal(l, r),
                    Operator::Equal => Node::Equal(l, r),
                    _ => Node::InList(l, r),
                };
                (node, i + 3)
            }
            _ => (single(tok)?, i + 1),
        },
        None => return Err(bad_condition("missing operand")),
    };

    let node = if invert { Node::Not(Box::new(node)) } else { node };
    Ok((node, next))
}

fn single(tok: &Token) -> Result<Node> {
    Ok(match tok {
        Token::Literal(s) => Node::Literal(s.clone()),
        Token::Identifier(s) => Node::Identifier(s.clone()),
        Token::Group(inner) => {
            let args = tokenize_arguments(inner);
            Node::Group(parse(&classify(&args))?)
        }
        Token::Op(op) => return Err(bad_condition(&format!("unexpected operator {op:?}"))),
    })
}

fn operand(tok: &Token) -> Operand {
    match tok {
        Token::Identifier(s) => Operand::Identifier(s.clone()),
        other => Operand::Literal(token_text(other)),
    }
}

fn token_text(tok: &Token) -> String {
    match tok {
        Token::Literal(s) | Token::Identifier(s) => s.clone(),
        Token::Group(s) => format!("({s})"),
        Token::Op(op) => format!("{op:?}").to_ascii_uppercase(),
    }
}

fn bad_condition(detail: &str) -> ScriptError {
    ScriptError::syntax(format!("if given arguments that are not a valid condition: {detail}"))
}

// ── Evaluation ────────────────────────────────────────────────────────────────

/// Evaluate substituted `if()` arguments.
pub fn eval_condition(args: &[String], ctx: &dyn EvalContext) -> Result<bool> {
    let nodes = parse(&classify(args))?;
    Ok(eval_nodes(&nodes, ctx))
}

/// Fold a node sequence left to right.  The accumulator starts false with a
/// pending `OR`, so the first term simply becomes the result.
pub fn eval_nodes(nodes: &[Node], ctx: &dyn EvalContext) -> bool {
    let mut result = false;
    let mut pending_and = false;
    for node in nodes {
        match node {
            Node::And => pending_and = true,
            Node::Or => pending_and = false,
            term => {
                let v = eval_term(term, ctx);
                result = if pending_and { result && v } else { result || v };
            }
        }
    }
    result
}

fn eval_term(node: &Node, ctx: &dyn EvalContext) -> bool {
    match node {
        Node::And | Node::Or => false,
        Node::Not(inner) => !eval_term(inner, ctx),
        Node::Group(nodes) => eval_nodes(nodes, ctx),
        Node::Literal(s) => is_truthy(s),
        Node::Identifier(name) => ctx.get_var(name).is_some_and(|v| v.is_truthy()),
        Node::Strequal(l, r) | Node::Equal(l, r) => resolve(l, ctx) == resolve(r, ctx),
        Node::InList(l, r) => {
            let needle = resolve(l, ctx);
            let list_name = match r {
                Operand::Identifier(s) | Operand::Literal(s) => s,
            };
            ctx.get_var(list_name)
                .is_some_and(|v| v.list().iter().any(|item| *item == needle))
        }
        Node::Defined(name) => match name.strip_prefix("ENV{").and_then(|n| n.strip_suffix('}')) {
            Some(env) => ctx.get_env(env).is_some(),
            None => ctx.get_var(name).is_some(),
        },
    }
}

/// Identifiers resolve to their value when defined, else to their own text.
fn resolve(op: &Operand, ctx: &dyn EvalContext) -> String {
    match op {
        Operand::Literal(s) => s.clone(),
        Operand::Identifier(name) => match ctx.get_var(name) {
            Some(v) => dequote(v.as_str()),
            None => name.clone(),
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
