// Copyright (c) 2018-2023  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Boolean [`TagExpr`]essions selecting scenarios by their tags.

use std::{fmt, str::FromStr};

use derive_more::with_trait::{Display, Error};

/// Failure of parsing a [`TagExpr`].
///
/// This is a configuration error: an invalid expression aborts the whole
/// run before any scenario executes.
#[derive(Clone, Debug, Display, Error)]
#[display("invalid tag expression `{input}`: {reason}")]
pub struct InvalidTagExpression {
    /// The expression as supplied.
    pub input: String,

    /// Human-readable reason of the failure.
    pub reason: String,
}

/// Boolean expression over scenario tags.
///
/// Grammar: tag literals (`@name`), `and`, `or`, `not` and parentheses,
/// with `not` binding tighter than `and`, and `and` tighter than `or`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagExpr {
    /// Conjunction of two expressions.
    And(Box<TagExpr>, Box<TagExpr>),

    /// Disjunction of two expressions.
    Or(Box<TagExpr>, Box<TagExpr>),

    /// Negation of an expression.
    Not(Box<TagExpr>),

    /// Single tag literal, including its leading `@`.
    Tag(String),
}

impl TagExpr {
    /// Evaluates this [`TagExpr`] for the given `tags`.
    ///
    /// Tags are compared verbatim, so the given set is expected to carry
    /// the leading `@` on every tag.
    #[must_use]
    pub fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(e) => !e.eval(tags),
            Self::Tag(t) => tags.into_iter().any(|tag| tag.as_ref() == t),
        }
    }

    /// Binding strength of this node, used for parenthesizing [`Display`]
    /// output.
    fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => 0,
            Self::And(..) => 1,
            Self::Not(_) => 2,
            Self::Tag(_) => 3,
        }
    }

    fn fmt_child(&self, parent: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.precedence() < parent {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(l, r) => {
                l.fmt_child(1, f)?;
                f.write_str(" and ")?;
                r.fmt_child(1, f)
            }
            Self::Or(l, r) => {
                l.fmt_child(0, f)?;
                f.write_str(" or ")?;
                r.fmt_child(0, f)
            }
            Self::Not(e) => {
                f.write_str("not ")?;
                e.fmt_child(2, f)
            }
            Self::Tag(t) => f.write_str(t),
        }
    }
}

impl FromStr for TagExpr {
    type Err = InvalidTagExpression;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: String| InvalidTagExpression {
            input: s.to_owned(),
            reason,
        };

        let tokens = tokenize(s).map_err(&fail)?;
        let mut parser = Parser { tokens: &tokens, pos: 0 };
        let expr = parser.or_expr().map_err(&fail)?;
        if let Some(trailing) = parser.peek() {
            return Err(fail(format!("unexpected trailing `{trailing}`")));
        }
        Ok(expr)
    }
}

#[derive(Clone, Debug, Display, PartialEq)]
enum Token {
    #[display("(")]
    OpenParen,

    #[display(")")]
    CloseParen,

    #[display("and")]
    And,

    #[display("or")]
    Or,

    #[display("not")]
    Not,

    #[display("{_0}")]
    Tag(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return Ok(());
        }
        let token = match word.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "@" => return Err("empty tag name after `@`".to_owned()),
            t if t.starts_with('@') => Token::Tag(t.to_owned()),
            t => return Err(format!("unexpected token `{t}`")),
        };
        word.clear();
        tokens.push(token);
        Ok(())
    };

    for c in input.chars() {
        match c {
            '(' => {
                flush(&mut word, &mut tokens)?;
                tokens.push(Token::OpenParen);
            }
            ')' => {
                flush(&mut word, &mut tokens)?;
                tokens.push(Token::CloseParen);
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens)?,
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens)?;

    if tokens.is_empty() {
        return Err("empty expression".to_owned());
    }
    Ok(tokens)
}

/// Recursive descent over the tokenized expression.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<TagExpr, String> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            _ = self.advance();
            let right = self.and_expr()?;
            left = TagExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<TagExpr, String> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            _ = self.advance();
            let right = self.unary()?;
            left = TagExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<TagExpr, String> {
        if self.peek() == Some(&Token::Not) {
            _ = self.advance();
            return Ok(TagExpr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<TagExpr, String> {
        match self.advance() {
            Some(Token::Tag(t)) => Ok(TagExpr::Tag(t.clone())),
            Some(Token::OpenParen) => {
                let expr = self.or_expr()?;
                match self.advance() {
                    Some(Token::CloseParen) => Ok(expr),
                    Some(token) => Err(format!("expected `)`, found `{token}`")),
                    None => Err("expected `)`".to_owned()),
                }
            }
            Some(token) => Err(format!("unexpected `{token}`")),
            None => Err("unexpected end of expression".to_owned()),
        }
    }
}
