//! Tagged statement grammar for source and IR lines
//!
//! Every recognized line shape is parsed exactly once into a [`Stmt`]
//! variant; the stages then match on the tag instead of re-probing the text.
//! Conditions are keyed structurally (left operand, comparator, right
//! operand) so lookups across stages never depend on whitespace.

use crate::lexer::{Token, Tokens};

/// Marker a branch body line becomes when it jumps out of the enclosing
/// loop or conditional early.
pub const BREAK_MARKER: &str = "break;";

/// Binary comparators recognized in branch conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Cmp {
    fn from_token(tok: &Token) -> Option<Cmp> {
        match tok {
            Token::Lt => Some(Cmp::Lt),
            Token::Le => Some(Cmp::Le),
            Token::Gt => Some(Cmp::Gt),
            Token::Ge => Some(Cmp::Ge),
            Token::EqEq => Some(Cmp::Eq),
            Token::Ne => Some(Cmp::Ne),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cmp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Cmp::Lt => "<",
            Cmp::Le => "<=",
            Cmp::Gt => ">",
            Cmp::Ge => ">=",
            Cmp::Eq => "==",
            Cmp::Ne => "!=",
        };
        write!(f, "{}", s)
    }
}

/// A parsed binary condition: `lhs cmp rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub lhs: String,
    pub cmp: Cmp,
    pub rhs: String,
}

impl Condition {
    /// Parse `i < iT`, `cur > curT`, `i <= 4`. The right side is kept as
    /// raw text: it may be a variable, a literal or a small expression.
    pub fn parse(text: &str) -> Option<Condition> {
        let toks = Tokens::lex(text);
        let lhs = match toks.get(0)? {
            Token::Ident(name) => name.clone(),
            Token::Temp(name) => name.clone(),
            Token::Int(v) => v.to_string(),
            _ => return None,
        };
        let cmp = Cmp::from_token(toks.get(1)?)?;
        if toks.len() < 3 {
            return None;
        }
        let rhs = toks.slice(2, toks.len() - 1).trim().to_string();
        if rhs.is_empty() {
            return None;
        }
        Some(Condition { lhs, cmp, rhs })
    }

    /// Structured lookup key; whitespace inside the right side is dropped.
    pub fn key(&self) -> CondKey {
        CondKey {
            lhs: self.lhs.clone(),
            cmp: self.cmp,
            rhs: self.rhs.split_whitespace().collect(),
        }
    }

    /// Key normalized the way the structural pass writes bounds: a
    /// non-strict integer upper bound `x <= n` becomes `x < n+1`.
    pub fn normalized_key(&self) -> CondKey {
        if self.cmp == Cmp::Le {
            if let Ok(bound) = self.rhs.trim().parse::<i64>() {
                return CondKey {
                    lhs: self.lhs.clone(),
                    cmp: Cmp::Lt,
                    rhs: (bound + 1).to_string(),
                };
            }
        }
        self.key()
    }

    /// First identifier of a condition text: the induction or compared
    /// variable.
    pub fn first_identifier(text: &str) -> Option<String> {
        let toks = Tokens::lex(text);
        for i in 0..toks.len() {
            match toks.get(i) {
                Some(Token::Ident(name)) => return Some(name.clone()),
                Some(Token::Temp(name)) => return Some(name.clone()),
                Some(Token::Int(v)) => return Some(v.to_string()),
                _ => continue,
            }
        }
        None
    }
}

/// Condition key used by the reconciler's loop/if indexes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CondKey {
    pub lhs: String,
    pub cmp: Cmp,
    pub rhs: String,
}

/// One classified statement line
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `int n;`
    Declaration { name: String },
    /// `long long int D.1915;`
    TemporaryDeclaration { name: String },
    /// `iT = 50;`
    LiteralAssignment { name: String, value: i64 },
    /// `cur = p0 + p1;` (left side may also be a temporary)
    ArithmeticAssignment { lhs: String, rhs: String },
    /// `if (i < iT) goto <D.1914>; else goto <D.1916>;`
    BranchCondition {
        condition: String,
        true_label: String,
        false_label: String,
    },
    /// `fibo ()`
    FunctionEntry { name: String },
    /// `<D.1916>:`
    Label { name: String },
    /// `goto <D.1916>;`
    Goto { target: String },
    /// Anything else
    Other,
}

impl Stmt {
    pub fn parse(line: &str) -> Stmt {
        let toks = Tokens::lex(line);
        if toks.is_empty() {
            return Stmt::Other;
        }

        // <D.1916>:
        if let (Some(Token::LabelRef(name)), Some(Token::Colon)) = (toks.get(0), toks.get(1)) {
            if toks.len() == 2 {
                return Stmt::Label { name: name.clone() };
            }
        }

        // if (COND) goto <D.N>; else goto <D.M>;
        if toks.get(0) == Some(&Token::If) && toks.get(1) == Some(&Token::LParen) {
            if let Some(stmt) = parse_branch(&toks) {
                return stmt;
            }
            return Stmt::Other;
        }

        // goto <D.1916>;
        if let (Some(Token::Goto), Some(Token::LabelRef(target))) = (toks.get(0), toks.get(1)) {
            return Stmt::Goto {
                target: target.clone(),
            };
        }

        // TYPE name; / TYPE D.N;
        if toks.get(0).is_some_and(Token::is_type_keyword) {
            if let Some(stmt) = parse_declaration(&toks) {
                return stmt;
            }
            return Stmt::Other;
        }

        // name () — function entry marker
        if let (Some(Token::Ident(name)), Some(Token::LParen), Some(Token::RParen)) =
            (toks.get(0), toks.get(1), toks.get(2))
        {
            if toks.len() == 3 {
                return Stmt::FunctionEntry { name: name.clone() };
            }
        }

        // name = ...;
        if let Some(stmt) = parse_any_assignment(&toks) {
            return stmt;
        }

        Stmt::Other
    }
}

fn parse_branch(toks: &Tokens<'_>) -> Option<Stmt> {
    let close = toks.matching_paren(1)?;
    let condition = if close > 2 {
        toks.slice(2, close - 1).trim().to_string()
    } else {
        String::new()
    };

    let mut i = close + 1;
    let true_label = expect_goto(toks, &mut i)?;
    if toks.get(i) != Some(&Token::Else) {
        return None;
    }
    i += 1;
    let false_label = expect_goto(toks, &mut i)?;

    Some(Stmt::BranchCondition {
        condition,
        true_label,
        false_label,
    })
}

fn expect_goto(toks: &Tokens<'_>, i: &mut usize) -> Option<String> {
    if toks.get(*i) != Some(&Token::Goto) {
        return None;
    }
    let label = match toks.get(*i + 1)? {
        Token::LabelRef(name) => name.clone(),
        _ => return None,
    };
    *i += 2;
    if toks.get(*i) == Some(&Token::Semicolon) {
        *i += 1;
    }
    Some(label)
}

fn parse_declaration(toks: &Tokens<'_>) -> Option<Stmt> {
    let mut i = 0;
    while toks.get(i).is_some_and(Token::is_type_keyword) {
        i += 1;
    }
    let stmt = match toks.get(i)? {
        Token::Temp(name) => Stmt::TemporaryDeclaration { name: name.clone() },
        Token::Ident(name) => Stmt::Declaration { name: name.clone() },
        _ => return None,
    };
    match toks.get(i + 1)? {
        Token::Semicolon => Some(stmt),
        _ => None,
    }
}

fn parse_any_assignment(toks: &Tokens<'_>) -> Option<Stmt> {
    let lhs = match toks.get(0)? {
        Token::Ident(name) => name.clone(),
        Token::Temp(name) => name.clone(),
        _ => return None,
    };
    if toks.get(1) != Some(&Token::Assign) {
        return None;
    }

    // iT = 50;  /  off = -3;
    match (toks.get(2), toks.get(3), toks.get(4)) {
        (Some(Token::Int(v)), Some(Token::Semicolon), _) => {
            return Some(Stmt::LiteralAssignment {
                name: lhs,
                value: *v,
            });
        }
        (Some(Token::Minus), Some(Token::Int(v)), Some(Token::Semicolon)) => {
            return Some(Stmt::LiteralAssignment {
                name: lhs,
                value: -v,
            });
        }
        _ => {}
    }

    let rhs = assignment_rhs(toks)?;
    Some(Stmt::ArithmeticAssignment { lhs, rhs })
}

fn assignment_rhs(toks: &Tokens<'_>) -> Option<String> {
    if toks.len() < 3 {
        return None;
    }
    let last = toks.len() - 1;
    let end = if toks.get(last) == Some(&Token::Semicolon) {
        last.checked_sub(1)?
    } else {
        last
    };
    if end < 2 {
        return None;
    }
    let rhs = toks.slice(2, end).trim().to_string();
    if rhs.is_empty() {
        None
    } else {
        Some(rhs)
    }
}

/// Split `a = b + c;` into `("a", "b + c")`. The left side must be a plain
/// identifier; compiler temporaries never take part in register binding.
pub fn parse_assignment(line: &str) -> Option<(String, String)> {
    let toks = Tokens::lex(line);
    let lhs = match toks.get(0)? {
        Token::Ident(name) => name.clone(),
        _ => return None,
    };
    if toks.get(1) != Some(&Token::Assign) {
        return None;
    }
    let rhs = assignment_rhs(&toks)?;
    Some((lhs, rhs))
}

/// Normalize an increment to canonical assignment form:
/// `i++` → `i = i + 1`, `i=i+1` → `i = i + 1`. Anything already in another
/// shape passes through trimmed.
pub fn normalize_increment(inc: &str) -> String {
    let toks = Tokens::lex(inc);

    if let Some(Token::Ident(name)) = toks.get(0) {
        match toks.get(1) {
            Some(Token::PlusPlus) => return format!("{} = {} + 1", name, name),
            Some(Token::MinusMinus) => return format!("{} = {} - 1", name, name),
            _ => {}
        }
    }

    if toks.get(1) == Some(&Token::Assign) && toks.len() >= 5 {
        let lhs = operand_text(&toks, 0);
        let a = operand_text(&toks, 2);
        let op = match toks.get(3) {
            Some(Token::Plus) => "+",
            Some(Token::Minus) => "-",
            Some(Token::Star) => "*",
            Some(Token::Slash) => "/",
            _ => return inc.trim().to_string(),
        };
        let b = operand_text(&toks, 4);
        if let (Some(lhs), Some(a), Some(b)) = (lhs, a, b) {
            return format!("{} = {} {} {}", lhs, a, op, b);
        }
    }

    inc.trim().to_string()
}

fn operand_text(toks: &Tokens<'_>, i: usize) -> Option<String> {
    match toks.get(i)? {
        Token::Ident(name) => Some(name.clone()),
        Token::Temp(name) => Some(name.clone()),
        Token::Int(v) => Some(v.to_string()),
        Token::Hex(v) => Some(v.to_string()),
        _ => None,
    }
}

/// Compiler-introduced temporary (`D.<number>`)
pub fn is_temporary(name: &str) -> bool {
    name.strip_prefix("D.")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Pseudo-constant name (`h<number>`), excluded from declaration-core
/// binding when the function owns loops
pub fn is_pseudo_constant(name: &str) -> bool {
    name.strip_prefix('h')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}
