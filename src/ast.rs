//! Expression tree shared by the parser and the code generator.

use std::fmt;

/// Binary operators that survive parsing.
///
/// `>` and `>=` never appear here: the parser rewrites them to `Lt`/`Le` with
/// the operands swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

impl BinaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Eq => "==",
      BinaryOp::Ne => "!=",
      BinaryOp::Lt => "<",
      BinaryOp::Le => "<=",
    }
  }
}

/// Expression tree produced by the parser. Each node owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  /// `-x` is lowered to `0 - x`.
  pub fn negate(operand: AstNode) -> Self {
    Self::binary(BinaryOp::Sub, Self::number(0), operand)
  }
}

/// Renders the tree as an s-expression, e.g. `(+ 1 (* 2 3))`.
impl fmt::Display for AstNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AstNode::Num { value } => write!(f, "{value}"),
      AstNode::Binary { op, lhs, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
    }
  }
}
