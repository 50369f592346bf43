//! Character-level token helpers: every character is its own symbol,
//! the structural characters are classified, and backslash escapes the
//! character after it. Tokenization proper is a collaborator's concern;
//! these helpers exist so tests can write patterns and grammars as plain
//! strings.

use crate::grammar::{EbnfGrammar, GrammarToken};
use crate::regex::parse::Token;
use crate::regex::{Quantifier, RegularExpression};

pub fn regex_tokens(pattern: &str) -> Vec<Token<char>> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '|' => Token::Alternative,
            '*' => Token::Quantifier(Quantifier::ZeroOrMore),
            '+' => Token::Quantifier(Quantifier::OneOrMore),
            '?' => Token::Quantifier(Quantifier::Optional),
            'ɛ' => Token::Epsilon,
            '∅' => Token::Null,
            '\\' => Token::Symbol(chars.next().expect("escape is followed by a character")),
            s => Token::Symbol(s),
        });
    }
    tokens
}

pub fn regex(pattern: &str) -> RegularExpression<char> {
    RegularExpression::read_from(regex_tokens(pattern)).expect("test pattern parses")
}

/// A grammar from lines of the form `lhs = rhs` or `lhs → rhs`,
/// separated by newlines or semicolons.
pub fn grammar(text: &str) -> EbnfGrammar<char> {
    let mut tokens = Vec::new();
    for line in text.split(['\n', ';']) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut chars = line.chars();
        let lhs = chars.next().expect("rule starts with its left-hand symbol");
        tokens.push(GrammarToken::Lhs(lhs));
        let rest: String = chars.collect();
        let rest = rest
            .trim_start()
            .strip_prefix(['=', '→'])
            .expect("rule has a definition operator");
        tokens.push(GrammarToken::IsDefinedAs);
        tokens.push(GrammarToken::Rhs(regex_tokens(rest.trim())));
    }
    EbnfGrammar::read_from(tokens).expect("test grammar parses")
}

pub fn word(s: &str) -> Vec<char> {
    s.chars().collect()
}
