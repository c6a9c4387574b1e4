//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about grammar beyond recognising operators and
//! numeric literals. Two-character punctuators are matched before their
//! one-character prefixes so `<=` never lexes as `<` followed by `=`.

use std::fmt;

use tracing::{debug, trace};

use crate::error::{CompileError, CompileResult};

/// Punctuators that must be tried before the single-character set.
const TWO_CHAR_PUNCTUATORS: [&str; 4] = ["==", "!=", "<=", ">="];

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Punctuator,
  Num,
  Eof,
}

/// A single lexeme, addressed by byte offset and length into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<i64>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize, value: Option<i64>) -> Self {
    Self {
      kind,
      value,
      loc,
      len,
    }
  }

  /// Pair the token with its source so it can be printed.
  pub fn display<'a>(&'a self, source: &'a str) -> TokenDisplay<'a> {
    TokenDisplay {
      token: self,
      source,
    }
  }
}

/// `Display` adapter used by `--emit tokens`.
pub struct TokenDisplay<'a> {
  token: &'a Token,
  source: &'a str,
}

impl fmt::Display for TokenDisplay<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Token { kind, loc, len, .. } = *self.token;
    match kind {
      TokenKind::Num | TokenKind::Punctuator => {
        let tag = if kind == TokenKind::Num { "num" } else { "punct" };
        let text = token_text(self.token, self.source);
        write!(f, "{loc}..{} {tag} {text}", loc + len)
      }
      TokenKind::Eof => write!(f, "{loc}..{loc} eof"),
    }
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if let Some(op) = TWO_CHAR_PUNCTUATORS
      .into_iter()
      .find(|op| input[i..].starts_with(op))
    {
      trace!(loc = i, op, "punctuator");
      tokens.push(Token::new(TokenKind::Punctuator, i, op.len(), None));
      i += op.len();
      continue;
    }

    if matches!(c, b'+' | b'-' | b'*' | b'/' | b'(' | b')' | b'<' | b'>') {
      trace!(loc = i, op = %char::from(c), "punctuator");
      tokens.push(Token::new(TokenKind::Punctuator, i, 1, None));
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      let value = text
        .parse::<i64>()
        .map_err(|err| CompileError::lex_at(input, start, format!("invalid number: {err}")))?;
      trace!(loc = start, value, "number");
      tokens.push(Token::new(TokenKind::Num, start, i - start, Some(value)));
      continue;
    }

    return Err(CompileError::lex_at(input, i, "invalid token"));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, None));
  debug!(count = tokens.len(), "tokenized input");
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn eof_sits_at_end_of_input() {
    let tokens = tokenize("1 ").unwrap();
    assert_eq!(tokens.last(), Some(&Token::new(TokenKind::Eof, 2, 0, None)));
  }

  #[test]
  fn describes_eof() {
    let tokens = tokenize("").unwrap();
    assert_eq!(describe_token(tokens.first(), ""), "EOF");
    assert_eq!(describe_token(None, ""), "EOF");
  }

  #[test]
  fn displays_tokens_with_spans() {
    let src = "12<=3";
    let rendered: Vec<String> = tokenize(src)
      .unwrap()
      .iter()
      .map(|t| t.display(src).to_string())
      .collect();
    assert_eq!(
      rendered,
      ["0..2 num 12", "2..4 punct <=", "4..5 num 3", "5..5 eof"]
    );
  }
}
