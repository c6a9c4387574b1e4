//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics follow the chibicc layout: the offending source line, then a
//! caret under the bad character followed by the message. Every error is
//! fatal; the binary prints the first one it sees and exits.

use snafu::Snafu;

use crate::vm::RuntimeError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  /// The tokenizer met a character or literal it cannot turn into a token.
  #[snafu(display("{line}\n{marker} {message}"))]
  Lex {
    line: String,
    marker: String,
    position: usize,
    message: String,
  },
  /// The parser did not find the token the grammar requires.
  #[snafu(display("{line}\n{marker} {message}"))]
  Syntax {
    line: String,
    marker: String,
    position: usize,
    message: String,
  },
  /// Malformed invocation; not tied to any source offset.
  #[snafu(display("{message}"))]
  Usage { message: String },
}

impl CompileError {
  /// Lex error anchored at byte offset `loc` of `source`.
  pub fn lex_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (line, marker) = underline(source, loc);
    Self::Lex {
      line,
      marker,
      position: loc,
      message: message.into(),
    }
  }

  /// Syntax error anchored at byte offset `loc` of `source`.
  pub fn syntax_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (line, marker) = underline(source, loc);
    Self::Syntax {
      line,
      marker,
      position: loc,
      message: message.into(),
    }
  }

  pub fn usage(message: impl Into<String>) -> Self {
    Self::Usage {
      message: message.into(),
    }
  }

  /// Byte offset the error points at, if it has one.
  pub fn position(&self) -> Option<usize> {
    match self {
      Self::Lex { position, .. } | Self::Syntax { position, .. } => Some(*position),
      Self::Usage { .. } => None,
    }
  }

  /// The bare message, without the source excerpt.
  pub fn message(&self) -> &str {
    match self {
      Self::Lex { message, .. } | Self::Syntax { message, .. } | Self::Usage { message } => {
        message.as_str()
      }
    }
  }
}

/// Failure of a compile-and-run round trip through the stack machine.
#[derive(Debug, Snafu)]
pub enum EvalError {
  #[snafu(context(false), display("{source}"))]
  Compile { source: CompileError },
  #[snafu(context(false), display("runtime error: {source}"))]
  Runtime { source: RuntimeError },
}

/// Cut out the line holding `loc` and build a caret marker pointing at it.
///
/// The column is counted in characters, not bytes, so the caret stays aligned
/// when the line contains multi-byte input before the error.
fn underline(source: &str, loc: usize) -> (String, String) {
  let mut safe_loc = loc.min(source.len());
  while !source.is_char_boundary(safe_loc) {
    safe_loc -= 1;
  }
  let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
  let line_end = source[safe_loc..]
    .find('\n')
    .map_or(source.len(), |i| safe_loc + i);
  let column = source[line_start..safe_loc].chars().count();
  let marker = format!("{}^", " ".repeat(column));
  (source[line_start..line_end].to_string(), marker)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn caret_sits_under_offset() {
    let err = CompileError::lex_at("1+@", 2, "invalid token");
    assert_eq!(err.to_string(), "1+@\n  ^ invalid token");
    assert_eq!(err.position(), Some(2));
  }

  #[test]
  fn caret_counts_chars_not_bytes() {
    let err = CompileError::lex_at("é+x", 3, "invalid token");
    assert_eq!(err.to_string(), "é+x\n  ^ invalid token");
  }

  #[test]
  fn caret_past_end_points_after_last_char() {
    let err = CompileError::syntax_at("(1", 2, "expected \")\"");
    assert_eq!(err.to_string(), "(1\n  ^ expected \")\"");
  }

  #[test]
  fn usage_has_no_position() {
    let err = CompileError::usage("wrong number of arguments");
    assert_eq!(err.to_string(), "wrong number of arguments");
    assert_eq!(err.position(), None);
    assert_eq!(err.message(), "wrong number of arguments");
  }
}
