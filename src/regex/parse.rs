//! Token-stream regex builder.
//!
//! Consumes a stream of already-classified tokens with one token of
//! lookahead and produces a normalized [`RegularExpression`]. Tokenization
//! itself is a collaborator's job; this module only defines the token
//! vocabulary and the structural rules.

use std::fmt;
use std::iter::Peekable;

use super::{Quantifier, RegularExpression};
use crate::Symbol;

/// One classified token of regex input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<S> {
    LeftParen,
    RightParen,
    /// The alternation separator (`|`).
    Alternative,
    Quantifier(Quantifier),
    Symbol(S),
    /// The empty-string constant (`ɛ`).
    Epsilon,
    /// The empty-language constant (`∅`).
    Null,
}

/// Error from a structurally invalid regex token stream.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable description of the problem.
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "regex parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        ParseError { message: message.into() }
    }
}

impl<S: Symbol> RegularExpression<S> {
    /// Build a regex from a token stream.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on a quantifier with nothing preceding it, a
    /// missing closing parenthesis, an unmatched closing parenthesis, or
    /// any other structurally invalid sequence.
    pub fn read_from(tokens: impl IntoIterator<Item = Token<S>>) -> Result<Self, ParseError> {
        let mut input = tokens.into_iter().peekable();
        let result = Self::read_alternation(&mut input)?;
        match input.peek() {
            None => Ok(result),
            Some(t) => Err(ParseError::new(format!("unexpected token: {t:?}"))),
        }
    }

    fn read_alternation<I: Iterator<Item = Token<S>>>(
        input: &mut Peekable<I>,
    ) -> Result<Self, ParseError> {
        let mut result = Self::read_alternative(input)?;
        while matches!(input.peek(), Some(Token::Alternative)) {
            input.next();
            result = result.union(Self::read_alternative(input)?);
        }
        Ok(result)
    }

    fn read_alternative<I: Iterator<Item = Token<S>>>(
        input: &mut Peekable<I>,
    ) -> Result<Self, ParseError> {
        let mut elements: Vec<Self> = Vec::new();

        loop {
            let element = match input.peek() {
                None | Some(Token::Alternative) | Some(Token::RightParen) => break,
                Some(Token::LeftParen) => {
                    input.next();
                    let inner = Self::read_alternation(input)?;
                    match input.next() {
                        Some(Token::RightParen) => inner,
                        _ => return Err(ParseError::new("missing right parenthesis")),
                    }
                }
                Some(Token::Quantifier(q)) => {
                    return Err(ParseError::new(format!(
                        "unexpected quantifier: {q}"
                    )));
                }
                Some(Token::Symbol(_)) => {
                    let Some(Token::Symbol(s)) = input.next() else { unreachable!() };
                    Self::Atom(s)
                }
                Some(Token::Epsilon) => {
                    input.next();
                    Self::Epsilon
                }
                Some(Token::Null) => {
                    input.next();
                    Self::Null
                }
            };

            if let Some(Token::Quantifier(q)) = input.peek() {
                let q = *q;
                input.next();
                elements.push(element.quantified(q));
            } else {
                elements.push(element);
            }
        }

        Ok(Self::sequence(elements))
    }
}
