//! Source structural extractor
//!
//! Stage one of the pipeline: shallow pattern extraction over restricted C
//! source text, producing the Structured Program Document. Only `void`
//! functions dispatched from `main` are extracted; the precise control-flow
//! facts are recovered later by the reconciler, so this pass stays
//! deliberately simple: declarations, literal initializations, `for`
//! headers, `if` headers and raw body lines.

use std::collections::HashSet;

use crate::error::{TranslateError, TranslateResult};
use crate::lexer::{Token, Tokens};
use crate::model::{
    CondRecord, FunctionRecord, GlobalInit, GlobalVariableTable, Literal, LoopRecord, OrderedMap,
    StructuredProgram,
};

/// Extract a structured program from C source text.
pub fn extract(source: &str) -> TranslateResult<StructuredProgram> {
    let lines: Vec<&str> = source.lines().map(str::trim).collect();

    let global_variable = parse_globals(&lines);
    let (definitions, main_body) = collect_functions(&lines);
    let main_body = main_body
        .ok_or_else(|| TranslateError::malformed_document("no main function in source"))?;
    let main_calls = call_targets(&main_body);

    let mut functions = Vec::new();
    let mut seen = HashSet::new();
    for (name, body) in definitions {
        if !main_calls.contains(&name) || !seen.insert(name.clone()) {
            continue;
        }
        functions.push(parse_function(&name, &body));
    }

    Ok(StructuredProgram {
        global_variable,
        functions,
    })
}

/// Scalar or array declaration shapes a single line can take
enum DeclLine {
    Init { name: String, value: Literal },
    Bare { name: String, float: bool },
    Array { key: String, values: Option<Vec<Literal>> },
    None,
}

fn classify_decl(line: &str) -> DeclLine {
    let toks = Tokens::lex(line);
    let mut i = 0;
    while toks.get(i).is_some_and(Token::is_type_keyword) {
        i += 1;
    }
    if i == 0 {
        return DeclLine::None;
    }
    let float = matches!(toks.get(0), Some(Token::TyFloat) | Some(Token::TyDouble));

    let name = match toks.get(i) {
        Some(Token::Ident(name)) => name.clone(),
        _ => return DeclLine::None,
    };

    match toks.get(i + 1) {
        Some(Token::Semicolon) => DeclLine::Bare { name, float },
        Some(Token::Assign) => match literal_at(&toks, i + 2, float) {
            Some(value) if toks.get(i + 3) == Some(&Token::Semicolon) => {
                DeclLine::Init { name, value }
            }
            _ => DeclLine::None,
        },
        Some(Token::LBracket) => classify_array(&toks, i + 2, &name),
        _ => DeclLine::None,
    }
}

fn classify_array(toks: &Tokens<'_>, i: usize, name: &str) -> DeclLine {
    let size = match toks.get(i) {
        Some(Token::Int(v)) => v.to_string(),
        Some(Token::Ident(s)) => s.clone(),
        _ => return DeclLine::None,
    };
    if toks.get(i + 1) != Some(&Token::RBracket) {
        return DeclLine::None;
    }
    let key = format!("{}[{}]", name, size);

    if toks.get(i + 2) != Some(&Token::Assign) || toks.get(i + 3) != Some(&Token::LBrace) {
        return DeclLine::Array { key, values: None };
    }

    // `= {0x8000, 0, };` — a trailing comma on a sized array zero-fills the
    // remaining elements
    let mut values = Vec::new();
    let mut j = i + 4;
    let mut trailing_comma = false;
    loop {
        match toks.get(j) {
            Some(Token::RBrace) | None => break,
            Some(Token::Comma) => {
                trailing_comma = toks.get(j + 1) == Some(&Token::RBrace);
                j += 1;
            }
            _ => {
                if let Some(v) = literal_at(toks, j, false) {
                    values.push(v);
                }
                trailing_comma = false;
                j += 1;
            }
        }
    }
    if trailing_comma {
        if let Ok(size) = size.parse::<usize>() {
            while values.len() < size {
                values.push(Literal::Int(0));
            }
        }
    }
    DeclLine::Array {
        key,
        values: Some(values),
    }
}

fn literal_at(toks: &Tokens<'_>, i: usize, float: bool) -> Option<Literal> {
    match toks.get(i)? {
        Token::Int(v) if float => Some(Literal::Float(*v as f64)),
        Token::Int(v) => Some(Literal::Int(*v)),
        Token::Hex(v) if float => Some(Literal::Float(*v as f64)),
        Token::Hex(v) => Some(Literal::Int(*v)),
        Token::Float(f) if float => Some(Literal::Float(*f)),
        // Integer contexts truncate float text
        Token::Float(f) => Some(Literal::Int(*f as i64)),
        _ => None,
    }
}

/// Globals run from the top of the file to the first function signature.
fn parse_globals(lines: &[&str]) -> GlobalVariableTable {
    let mut table = GlobalVariableTable::default();
    for line in lines {
        if signature_of(line).is_some_and(|sig| !sig.empty_parens) {
            break;
        }
        match classify_decl(line) {
            DeclLine::Init { name, value } => table.initialize(&name, GlobalInit::Scalar(value)),
            DeclLine::Bare { name, .. } => table.declare(&name),
            DeclLine::Array { key, values } => match values {
                Some(values) => table.initialize(&key, GlobalInit::Array(values)),
                None => table.declare(&key),
            },
            DeclLine::None => {}
        }
    }
    table
}

struct Signature {
    ret_void: bool,
    name: String,
    empty_parens: bool,
    opens_brace: bool,
    prototype: bool,
}

fn signature_of(line: &str) -> Option<Signature> {
    let toks = Tokens::lex(line);
    let ret_void = match toks.get(0)? {
        Token::TyVoid => true,
        Token::TyInt => false,
        _ => return None,
    };
    let name = match toks.get(1)? {
        Token::Ident(name) => name.clone(),
        _ => return None,
    };
    if toks.get(2) != Some(&Token::LParen) {
        return None;
    }
    let close = toks.matching_paren(2)?;
    Some(Signature {
        ret_void,
        name,
        empty_parens: close == 3,
        opens_brace: toks.get(close + 1) == Some(&Token::LBrace),
        prototype: toks.get(close + 1) == Some(&Token::Semicolon),
    })
}

/// All `void` function definitions in order, plus the body of `main`.
fn collect_functions(lines: &[&str]) -> (Vec<(String, Vec<String>)>, Option<Vec<String>>) {
    let mut functions = Vec::new();
    let mut main_body = None;

    let mut i = 0;
    while i < lines.len() {
        let Some(sig) = signature_of(lines[i]) else {
            i += 1;
            continue;
        };
        if sig.prototype {
            i += 1;
            continue;
        }

        // Opening brace on the signature line or alone on the next
        let mut j = i + 1;
        if !sig.opens_brace {
            while j < lines.len() && lines[j].is_empty() {
                j += 1;
            }
            if j >= lines.len() || !lines[j].starts_with('{') {
                i += 1;
                continue;
            }
            j += 1;
        }

        let mut depth = 1i32;
        let mut body = Vec::new();
        while j < lines.len() && depth > 0 {
            let line = lines[j];
            depth += line.matches('{').count() as i32;
            depth -= line.matches('}').count() as i32;
            if depth > 0 && !line.is_empty() {
                body.push(line.to_string());
            }
            j += 1;
        }

        if sig.ret_void {
            functions.push((sig.name, body));
        } else if sig.name == "main" && main_body.is_none() {
            main_body = Some(body);
        }
        i = j;
    }

    (functions, main_body)
}

/// Function names `main` dispatches to: `name(...);` call statements.
fn call_targets(main_body: &[String]) -> HashSet<String> {
    let mut calls = HashSet::new();
    for line in main_body {
        let toks = Tokens::lex(line);
        if let (Some(Token::Ident(name)), Some(Token::LParen)) = (toks.get(0), toks.get(1)) {
            if toks.matching_paren(1).is_some() {
                calls.insert(name.clone());
            }
        }
    }
    calls
}

fn parse_function(name: &str, raw_body: &[String]) -> FunctionRecord {
    let mut initializations: OrderedMap<Option<Literal>> = OrderedMap::new();
    // Bare declarations wait for a later `name = literal;` body line
    let mut declared: Vec<(String, bool, Option<Literal>)> = Vec::new();
    let mut body = Vec::new();

    let mut in_ifdef = false;
    for line in raw_body {
        if line.starts_with("#ifdef") {
            in_ifdef = true;
            continue;
        }
        if line.starts_with("#endif") {
            in_ifdef = false;
            continue;
        }
        if in_ifdef || line.starts_with('#') {
            continue;
        }

        match classify_decl(line) {
            DeclLine::Init { name, value } => initializations.insert(name, Some(value)),
            DeclLine::Bare { name, float } => declared.push((name, float, None)),
            // Local arrays are outside the dialect; leave the line in the body
            DeclLine::Array { .. } | DeclLine::None => {
                if !line.is_empty() {
                    body.push(line.clone());
                }
            }
        }
    }

    // Promote `i = 0;` style body lines into the declarations they fill;
    // the last assignment wins
    for line in &body {
        let toks = Tokens::lex(line);
        if let (Some(Token::Ident(var)), Some(Token::Assign)) = (toks.get(0), toks.get(1)) {
            if let Some(entry) = declared.iter_mut().find(|(name, _, _)| name == var) {
                if let Some(value) = literal_at(&toks, 2, entry.1) {
                    if toks.get(3) == Some(&Token::Semicolon) {
                        entry.2 = Some(value);
                    }
                }
            }
        }
    }
    for (name, _, value) in declared {
        initializations.insert_default(name, value);
    }

    FunctionRecord {
        function_name: name.to_string(),
        for_loops: parse_for_loops(&body),
        if_stmts: parse_ifs(&body),
        initializations,
        body,
    }
}

/// Split `for( i=0;i<iT; i=i+1) {` into its three clauses.
fn for_clauses(line: &str) -> Option<(String, String, String)> {
    let toks = Tokens::lex(line);
    if toks.get(0) != Some(&Token::For) || toks.get(1) != Some(&Token::LParen) {
        return None;
    }
    let close = toks.matching_paren(1)?;
    if toks.get(close + 1) != Some(&Token::LBrace) {
        return None;
    }
    let inner = toks.slice(2, close.checked_sub(1)?);
    let mut clauses = inner.splitn(3, ';').map(str::trim);
    Some((
        clauses.next()?.to_string(),
        clauses.next()?.to_string(),
        clauses.next()?.to_string(),
    ))
}

fn if_condition(line: &str) -> Option<String> {
    let toks = Tokens::lex(line);
    if toks.get(0) != Some(&Token::If) || toks.get(1) != Some(&Token::LParen) {
        return None;
    }
    let close = toks.matching_paren(1)?;
    if toks.get(close + 1) != Some(&Token::LBrace) {
        return None;
    }
    Some(toks.slice(2, close.checked_sub(1)?).trim().to_string())
}

/// Brace-counted body below a header line. Inner close braces stay in the
/// collected lines; the final close is consumed.
fn block_body(lines: &[String], start: usize) -> (Vec<String>, usize) {
    let mut body = Vec::new();
    let mut depth = 1i32;
    let mut i = start;
    while i < lines.len() && depth > 0 {
        let line = &lines[i];
        if line.contains('{') {
            depth += 1;
        }
        if line.contains('}') {
            depth -= 1;
        }
        if depth > 0 && !line.is_empty() {
            body.push(line.clone());
        }
        i += 1;
    }
    (body, i)
}

/// Top-level `for` headers only; nested control flow stays inside the
/// enclosing body lines.
fn parse_for_loops(body: &[String]) -> Vec<LoopRecord> {
    let mut loops = Vec::new();
    let mut i = 0;
    while i < body.len() {
        if let Some((variable, condition, increment)) = for_clauses(&body[i]) {
            let (block, next) = block_body(body, i + 1);
            loops.push(LoopRecord {
                variable,
                condition,
                increment,
                body: block,
            });
            i = next;
        } else {
            i += 1;
        }
    }
    loops
}

fn parse_ifs(body: &[String]) -> Vec<CondRecord> {
    let mut stmts = Vec::new();
    let mut i = 0;
    while i < body.len() {
        if let Some(condition) = if_condition(&body[i]) {
            let (block, next) = block_body(body, i + 1);
            stmts.push(CondRecord {
                condition,
                body: block,
            });
            i = next;
        } else {
            i += 1;
        }
    }
    stmts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIBO_SOURCE: &str = r#"
int depth = 8;
int taps[4] = {0x10, 0, };
double scale;

void fibo(void);

void fibo()
{
    int i    = 0;
    int iT   = 5;
    int cur  = 0;
    int curT = 10;
    int p0   = 1;
    int p1   = 0;

    for( i=0;i<iT; i=i+1) {
        cur = p0+p1;
        p1  = p0;
        p0  = cur;

        if(cur>curT) {
            break;
        }
    }
    return ;
}

void helper()
{
    int k = 0;
}

int main(void) {
    fibo();
    return 0 ;
}
"#;

    #[test]
    fn test_globals() {
        let doc = extract(FIBO_SOURCE).unwrap();
        let globals = &doc.global_variable;
        assert_eq!(globals.declarations, vec!["depth", "taps[4]", "scale"]);
        assert_eq!(
            globals.initializations.get("depth"),
            Some(&Some(GlobalInit::Scalar(Literal::Int(8))))
        );
        // Trailing comma zero-fills the sized array
        assert_eq!(
            globals.initializations.get("taps[4]"),
            Some(&Some(GlobalInit::Array(vec![
                Literal::Int(0x10),
                Literal::Int(0),
                Literal::Int(0),
                Literal::Int(0),
            ])))
        );
        assert_eq!(globals.initializations.get("scale"), Some(&None));
    }

    #[test]
    fn test_only_main_dispatched_functions() {
        let doc = extract(FIBO_SOURCE).unwrap();
        let names: Vec<_> = doc.functions.iter().map(|f| f.function_name.as_str()).collect();
        assert_eq!(names, vec!["fibo"]);
    }

    #[test]
    fn test_initialization_order() {
        let doc = extract(FIBO_SOURCE).unwrap();
        let fibo = doc.function("fibo").unwrap();
        let keys: Vec<_> = fibo.initializations.keys().collect();
        assert_eq!(keys, vec!["i", "iT", "cur", "curT", "p0", "p1"]);
        assert_eq!(fibo.initializations.get("curT"), Some(&Some(Literal::Int(10))));
    }

    #[test]
    fn test_for_and_if_records() {
        let doc = extract(FIBO_SOURCE).unwrap();
        let fibo = doc.function("fibo").unwrap();

        assert_eq!(fibo.for_loops.len(), 1);
        let lp = &fibo.for_loops[0];
        assert_eq!(lp.variable, "i=0");
        assert_eq!(lp.condition, "i<iT");
        assert_eq!(lp.increment, "i=i+1");
        assert!(lp.body.contains(&"cur = p0+p1;".to_string()));

        assert_eq!(fibo.if_stmts.len(), 1);
        assert_eq!(fibo.if_stmts[0].condition, "cur>curT");
        assert_eq!(fibo.if_stmts[0].body, vec!["break;"]);
    }

    #[test]
    fn test_bare_declaration_promotion() {
        let source = r#"
void roll()
{
    int i;
    int acc;
    i = 0;
    acc = 3;
    for( i=0;i<4; i=i+1) {
        acc = acc + i;
    }
}

int main(void) {
    roll();
    return 0;
}
"#;
        let doc = extract(source).unwrap();
        let roll = doc.function("roll").unwrap();
        assert_eq!(roll.initializations.get("i"), Some(&Some(Literal::Int(0))));
        assert_eq!(roll.initializations.get("acc"), Some(&Some(Literal::Int(3))));
    }

    #[test]
    fn test_missing_main_is_malformed() {
        let err = extract("int x = 1;\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::TranslateError::MalformedDocument { .. }
        ));
    }
}
