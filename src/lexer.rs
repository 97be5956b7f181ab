//! Lexer for the C/IR statement dialect using logos
//!
//! One token set covers both inputs the translator reads:
//! - restricted C source lines: `int iT = 50;`, `for( i=0;i<iT; i=i+1) {`
//! - low-level IR lines: `if (i < iT) goto <D.1914>; else goto <D.1916>;`

use logos::Logos;

/// Token types for source and IR statement lines
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
#[logos(skip r"/\*([^*]|\*[^/])*\*/")] // Skip block comments
pub enum Token {
    // Literals
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    Hex(i64),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    // Compiler temporaries (`D.1915`) and branch labels (`<D.1915>`)
    #[regex(r"D\.[0-9]+", |lex| lex.slice().to_string())]
    Temp(String),

    #[regex(r"<D\.[0-9]+>", |lex| lex.slice().to_string())]
    LabelRef(String),

    // Keywords
    #[token("int")]
    TyInt,

    #[token("long")]
    TyLong,

    #[token("float")]
    TyFloat,

    #[token("double")]
    TyDouble,

    #[token("void")]
    TyVoid,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("goto")]
    Goto,

    #[token("for")]
    For,

    #[token("break")]
    Break,

    #[token("return")]
    Return,

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Comparators
    #[token("<=")]
    Le,

    #[token(">=")]
    Ge,

    #[token("==")]
    EqEq,

    #[token("!=")]
    Ne,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    // Operators
    #[token("++")]
    PlusPlus,

    #[token("--")]
    MinusMinus,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("=")]
    Assign,

    // Punctuation
    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token("#")]
    Hash,
}

impl Token {
    /// Whether this token opens a scalar type name (`int`, `long long int`,
    /// `float`, `double`).
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            Token::TyInt | Token::TyLong | Token::TyFloat | Token::TyDouble
        )
    }
}

/// A tokenized line that keeps source spans, so original expression text can
/// be sliced back out of the line untouched.
pub struct Tokens<'source> {
    src: &'source str,
    toks: Vec<(Token, std::ops::Range<usize>)>,
}

impl<'source> Tokens<'source> {
    pub fn lex(src: &'source str) -> Self {
        let mut lexer = Token::lexer(src);
        let mut toks = Vec::new();
        while let Some(result) = lexer.next() {
            // Unknown bytes are skipped; line shapes are matched by prefix,
            // so trailing junk never poisons a recognized statement.
            if let Ok(tok) = result {
                toks.push((tok, lexer.span()));
            }
        }
        Self { src, toks }
    }

    pub fn len(&self) -> usize {
        self.toks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toks.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Token> {
        self.toks.get(i).map(|(tok, _)| tok)
    }

    /// Source text covered by tokens `i..=j`, inclusive.
    pub fn slice(&self, i: usize, j: usize) -> &'source str {
        match (self.toks.get(i), self.toks.get(j)) {
            (Some((_, a)), Some((_, b))) if a.start <= b.end => &self.src[a.start..b.end],
            _ => "",
        }
    }

    /// Index of the `RParen` matching the `LParen` at `open`, honoring
    /// nesting.
    pub fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, (tok, _)) in self.toks.iter().enumerate().skip(open) {
            match tok {
                Token::LParen => depth += 1,
                Token::RParen => {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(src: &str) -> Vec<Token> {
        Token::lexer(src).filter_map(Result::ok).collect()
    }

    #[test]
    fn test_branch_line() {
        let tokens = all("if (i < iT) goto <D.1914>; else goto <D.1916>;");
        assert_eq!(
            tokens,
            vec![
                Token::If,
                Token::LParen,
                Token::Ident("i".to_string()),
                Token::Lt,
                Token::Ident("iT".to_string()),
                Token::RParen,
                Token::Goto,
                Token::LabelRef("<D.1914>".to_string()),
                Token::Semicolon,
                Token::Else,
                Token::Goto,
                Token::LabelRef("<D.1916>".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_temp_declaration() {
        let tokens = all("long long int D.1915;");
        assert_eq!(
            tokens,
            vec![
                Token::TyLong,
                Token::TyLong,
                Token::TyInt,
                Token::Temp("D.1915".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_hex_and_trailing_comment() {
        let tokens = all("int h0 = 0x00010000; // fir tap");
        assert_eq!(
            tokens,
            vec![
                Token::TyInt,
                Token::Ident("h0".to_string()),
                Token::Assign,
                Token::Hex(0x00010000),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_compact_increment() {
        let tokens = all("i=i+1");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("i".to_string()),
                Token::Assign,
                Token::Ident("i".to_string()),
                Token::Plus,
                Token::Int(1),
            ]
        );
    }

    #[test]
    fn test_slice_recovers_condition_text() {
        let line = "if (cur > curT) goto <D.1917>; else goto <D.1918>;";
        let toks = Tokens::lex(line);
        let close = toks.matching_paren(1).unwrap();
        assert_eq!(toks.slice(2, close - 1), "cur > curT");
    }
}
