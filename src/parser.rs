//! Recursive-descent parser producing an expression AST.
//!
//! One helper per precedence level, lowest first:
//!
//! ```text
//! expr       = equality
//! equality   = relational ("==" relational | "!=" relational)*
//! relational = add ("<" add | "<=" add | ">" add | ">=" add)*
//! add        = mul ("+" mul | "-" mul)*
//! mul        = unary ("*" unary | "/" unary)*
//! unary      = ("+" | "-")? primary
//! primary    = num | "(" expr ")"
//! ```
//!
//! Every binary level folds to the left, so `8-3-2` parses as `(8-3)-2`.

use tracing::debug;

use crate::ast::{AstNode, BinaryOp};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Parse a whole expression, rejecting anything left over after it.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<AstNode> {
  let mut stream = TokenStream::new(tokens, source);

  if stream.is_eof() {
    return Err(CompileError::syntax_at(source, 0, "expression is empty"));
  }

  let node = parse_expr(&mut stream)?;

  if !stream.is_eof() {
    let token = stream.peek().ok_or_else(|| {
      CompileError::syntax_at(source, source.len(), "unexpected end of token stream")
    })?;
    let got = describe_token(Some(token), source);
    return Err(CompileError::syntax_at(
      source,
      token.loc,
      format!("unexpected token \"{got}\""),
    ));
  }

  debug!(ast = %node, "parsed expression");
  Ok(node)
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_equality(stream)
}

fn parse_equality(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_relational(stream)?;

  loop {
    let op = match stream.peek_punctuator() {
      Some("==") => BinaryOp::Eq,
      Some("!=") => BinaryOp::Ne,
      _ => break,
    };

    stream.advance();
    let rhs = parse_relational(stream)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_relational(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_add(stream)?;

  loop {
    // `a > b` is `b < a`; only Lt/Le reach the AST.
    let (op, swap) = match stream.peek_punctuator() {
      Some("<") => (BinaryOp::Lt, false),
      Some("<=") => (BinaryOp::Le, false),
      Some(">") => (BinaryOp::Lt, true),
      Some(">=") => (BinaryOp::Le, true),
      _ => break,
    };

    stream.advance();
    let rhs = parse_add(stream)?;
    node = if swap {
      AstNode::binary(op, rhs, node)
    } else {
      AstNode::binary(op, node, rhs)
    };
  }

  Ok(node)
}

fn parse_add(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_mul(stream)?;

  loop {
    let op = match stream.peek_punctuator() {
      Some("+") => BinaryOp::Add,
      Some("-") => BinaryOp::Sub,
      _ => break,
    };

    stream.advance();
    let rhs = parse_mul(stream)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_unary(stream)?;

  loop {
    let op = match stream.peek_punctuator() {
      Some("*") => BinaryOp::Mul,
      Some("/") => BinaryOp::Div,
      _ => break,
    };

    stream.advance();
    let rhs = parse_unary(stream)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

/// A single optional sign; `- -5` is rejected at the second `-`.
fn parse_unary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  if stream.equal("+") {
    return parse_primary(stream);
  }

  if stream.equal("-") {
    let operand = parse_primary(stream)?;
    return Ok(AstNode::negate(operand));
  }

  parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  if stream.equal("(") {
    let node = parse_expr(stream)?;
    stream.skip(")")?;
    return Ok(node);
  }

  let value = stream.get_number()?;
  Ok(AstNode::number(value))
}

/// Lightweight cursor over the token vector. It only ever moves forward.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Spelling of the current token if it is a punctuator.
  fn peek_punctuator(&self) -> Option<&'a str> {
    self
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, self.source))
  }

  fn advance(&mut self) {
    if !self.is_eof() {
      self.pos += 1;
    }
  }

  /// Consume the current token if it matches the provided punctuator.
  fn equal(&mut self, op: &str) -> bool {
    if self.peek_punctuator() == Some(op) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      return Ok(());
    }
    let (loc, got) = match self.peek() {
      Some(token) => (token.loc, describe_token(Some(token), self.source)),
      None => (self.source.len(), "EOF".to_string()),
    };
    Err(CompileError::syntax_at(
      self.source,
      loc,
      format!("expected \"{s}\", but got \"{got}\""),
    ))
  }

  /// Consume the current token as an integer literal.
  fn get_number(&mut self) -> CompileResult<i64> {
    let Some(token) = self.peek() else {
      return Err(CompileError::syntax_at(
        self.source,
        self.source.len(),
        "expected a number, but reached end of input",
      ));
    };

    if token.kind == TokenKind::Num {
      let value = token.value.ok_or_else(|| {
        CompileError::syntax_at(
          self.source,
          token.loc,
          "internal error: numeric token missing value",
        )
      })?;
      self.pos += 1;
      return Ok(value);
    }

    let got = describe_token(Some(token), self.source);
    Err(CompileError::syntax_at(
      self.source,
      token.loc,
      format!("expected a number, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }
}
