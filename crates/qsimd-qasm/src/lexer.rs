//! Lexer for `OpenQASM` 2 and 3.

use logos::Logos;

use crate::error::{ParseError, ParseResult};

/// Tokens for `OpenQASM`.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qubit")]
    Qubit,

    #[token("bit")]
    Bit,

    #[token("qreg")]
    QReg,

    #[token("creg")]
    CReg,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    /// Keywords of valid QASM the service refuses to run.
    #[token("gate", |_| "gate definitions")]
    #[token("opaque", |_| "opaque gates")]
    #[token("def", |_| "subroutines")]
    #[token("if", |_| "classical control flow")]
    #[token("else", |_| "classical control flow")]
    #[token("for", |_| "loops")]
    #[token("while", |_| "loops")]
    #[token("delay", |_| "delays")]
    #[token("input", |_| "input parameters")]
    #[token("output", |_| "output declarations")]
    #[token("const", |_| "classical variables")]
    #[token("let", |_| "aliases")]
    #[token("int", |_| "classical variables")]
    #[token("uint", |_| "classical variables")]
    #[token("float", |_| "classical variables")]
    #[token("angle", |_| "classical variables")]
    #[token("bool", |_| "classical variables")]
    #[token("ctrl", |_| "gate modifiers")]
    #[token("inv", |_| "gate modifiers")]
    #[token("pow", |_| "gate modifiers")]
    Unsupported(&'static str),

    // Constants
    #[token("pi")]
    #[token("π")]
    Pi,

    #[token("tau")]
    #[token("τ")]
    Tau,

    #[token("euler")]
    #[token("ℇ")]
    Euler,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    #[regex(r#""[^"\n]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    StringLiteral(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("**")]
    #[token("^")]
    Power,

    #[token("=")]
    Eq,

    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qubit => write!(f, "qubit"),
            Token::Bit => write!(f, "bit"),
            Token::QReg => write!(f, "qreg"),
            Token::CReg => write!(f, "creg"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::Unsupported(what) => write!(f, "{what}"),
            Token::Pi => write!(f, "pi"),
            Token::Tau => write!(f, "tau"),
            Token::Euler => write!(f, "euler"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Power => write!(f, "**"),
            Token::Eq => write!(f, "="),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with the source line it starts on.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

/// Tokenize a QASM source string, stopping at the first invalid token.
pub fn tokenize(source: &str) -> ParseResult<Vec<SpannedToken>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[scanned..span.start].matches('\n').count();
        scanned = span.start;

        match result {
            Ok(token) => tokens.push(SpannedToken { token, line }),
            Err(()) => {
                let fragment: String = source[span].chars().take(32).collect();
                return Err(ParseError::LexerError { line, fragment });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = kinds("OPENQASM 3.0;");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::OpenQasm);
        assert!(matches!(tokens[1], Token::FloatLiteral(v) if (v - 3.0).abs() < 0.001));
        assert_eq!(tokens[2], Token::Semicolon);
    }

    #[test]
    fn test_qasm2_declaration() {
        let tokens = kinds("qreg q[2];");
        assert_eq!(tokens[0], Token::QReg);
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "q"));
        assert_eq!(tokens[2], Token::LBracket);
        assert_eq!(tokens[3], Token::IntLiteral(2));
        assert_eq!(tokens[4], Token::RBracket);
        assert_eq!(tokens[5], Token::Semicolon);
    }

    #[test]
    fn test_parameterized_gate() {
        let tokens = kinds("rx(π/2) q[0];");
        assert!(matches!(tokens[0], Token::Identifier(ref s) if s == "rx"));
        assert_eq!(tokens[1], Token::LParen);
        assert_eq!(tokens[2], Token::Pi);
        assert_eq!(tokens[3], Token::Slash);
        assert_eq!(tokens[4], Token::IntLiteral(2));
        assert_eq!(tokens[5], Token::RParen);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = kinds("interval gates");
        assert!(matches!(tokens[0], Token::Identifier(ref s) if s == "interval"));
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "gates"));
    }

    #[test]
    fn test_unsupported_keyword() {
        let tokens = kinds("if");
        assert_eq!(tokens, vec![Token::Unsupported("classical control flow")]);
    }

    #[test]
    fn test_comments_and_lines() {
        let source = "// header\nqubit q;\n/* multi\n line */\nbit c;\n";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[3].line, 5);
    }

    #[test]
    fn test_invalid_token_reports_line() {
        let err = tokenize("qubit q;\nh q $ 1;").unwrap_err();
        assert_eq!(
            err,
            ParseError::LexerError {
                line: 2,
                fragment: "$".into()
            }
        );
    }
}
