//! Code generation: lower the parsed AST into x86-64 stack-machine code.
//!
//! Every node leaves exactly one value on the stack. A binary node evaluates
//! its left operand, then its right, pops them into `rdi` (right) and `rax`
//! (left), combines them in `rax` and pushes the result. Composition in
//! post-order keeps the stack balanced without any bookkeeping.

use std::fmt;

use tracing::debug;

use crate::ast::{AstNode, BinaryOp};

/// 64-bit registers used by the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
  Rax,
  Rdi,
}

/// Low byte registers written by the `set*` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteReg {
  Al,
}

/// Condition tested by `set*` after a `cmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
  Equal,
  NotEqual,
  Less,
  LessEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
  /// Push an immediate. The encoding only holds a sign-extended 32-bit value.
  Push(i64),
  /// Load a full 64-bit immediate into a register.
  MovImm(Reg, i64),
  Pop(Reg),
  Add(Reg, Reg),
  Sub(Reg, Reg),
  /// Signed multiply of `rax` by the operand.
  Imul(Reg),
  /// Sign-extend `rax` into `rdx:rax` ahead of `idiv`.
  Cqo,
  /// Signed divide of `rdx:rax` by the operand; quotient lands in `rax`.
  Idiv(Reg),
  Cmp(Reg, Reg),
  Set(Cond, ByteReg),
  /// Zero-extend a byte register into a full register.
  Movzb(Reg, ByteReg),
  PushReg(Reg),
}

impl fmt::Display for Reg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Reg::Rax => "rax",
      Reg::Rdi => "rdi",
    })
  }
}

impl fmt::Display for ByteReg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ByteReg::Al => "al",
    })
  }
}

impl Cond {
  fn mnemonic(self) -> &'static str {
    match self {
      Cond::Equal => "sete",
      Cond::NotEqual => "setne",
      Cond::Less => "setl",
      Cond::LessEqual => "setle",
    }
  }
}

/// Intel syntax, matching what `render_program` writes out.
impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Instruction::Push(value) => write!(f, "push {value}"),
      Instruction::MovImm(reg, value) => write!(f, "mov {reg}, {value}"),
      Instruction::Pop(reg) => write!(f, "pop {reg}"),
      Instruction::Add(dst, src) => write!(f, "add {dst}, {src}"),
      Instruction::Sub(dst, src) => write!(f, "sub {dst}, {src}"),
      Instruction::Imul(reg) => write!(f, "imul {reg}"),
      Instruction::Cqo => f.write_str("cqo"),
      Instruction::Idiv(reg) => write!(f, "idiv {reg}"),
      Instruction::Cmp(lhs, rhs) => write!(f, "cmp {lhs}, {rhs}"),
      Instruction::Set(cond, reg) => write!(f, "{} {reg}", cond.mnemonic()),
      Instruction::Movzb(dst, src) => write!(f, "movzb {dst}, {src}"),
      Instruction::PushReg(reg) => write!(f, "push {reg}"),
    }
  }
}

/// Lower an expression tree into a flat instruction sequence.
pub fn generate(node: &AstNode) -> Vec<Instruction> {
  let mut code = Vec::new();
  emit_expr(node, &mut code);
  debug!(count = code.len(), "generated instructions");
  code
}

/// Wrap an instruction sequence into a complete `main` in Intel syntax.
///
/// The final `pop rax` moves the expression's value into the return register.
pub fn render_program(code: &[Instruction]) -> String {
  let mut asm = String::new();
  asm.push_str(".intel_syntax noprefix\n");
  asm.push_str(".global main\n");
  asm.push_str("main:\n");
  for inst in code {
    asm.push_str(&format!("  {inst}\n"));
  }
  asm.push_str("  pop rax\n");
  asm.push_str("  ret\n");
  asm
}

fn emit_expr(node: &AstNode, code: &mut Vec<Instruction>) {
  match node {
    AstNode::Num { value } => emit_number(*value, code),
    AstNode::Binary { op, lhs, rhs } => {
      emit_expr(lhs, code);
      emit_expr(rhs, code);
      code.push(Instruction::Pop(Reg::Rdi));
      code.push(Instruction::Pop(Reg::Rax));
      match op {
        BinaryOp::Add => code.push(Instruction::Add(Reg::Rax, Reg::Rdi)),
        BinaryOp::Sub => code.push(Instruction::Sub(Reg::Rax, Reg::Rdi)),
        BinaryOp::Mul => code.push(Instruction::Imul(Reg::Rdi)),
        BinaryOp::Div => {
          code.push(Instruction::Cqo);
          code.push(Instruction::Idiv(Reg::Rdi));
        }
        BinaryOp::Eq => emit_compare(Cond::Equal, code),
        BinaryOp::Ne => emit_compare(Cond::NotEqual, code),
        BinaryOp::Lt => emit_compare(Cond::Less, code),
        BinaryOp::Le => emit_compare(Cond::LessEqual, code),
      }
      code.push(Instruction::PushReg(Reg::Rax));
    }
  }
}

/// `push imm32` is sign-extended; wider literals go through `rax`.
fn emit_number(value: i64, code: &mut Vec<Instruction>) {
  if i32::try_from(value).is_ok() {
    code.push(Instruction::Push(value));
  } else {
    code.push(Instruction::MovImm(Reg::Rax, value));
    code.push(Instruction::PushReg(Reg::Rax));
  }
}

/// `set*` only writes `al`; the upper bits must be cleared before the push.
fn emit_compare(cond: Cond, code: &mut Vec<Instruction>) {
  code.push(Instruction::Cmp(Reg::Rax, Reg::Rdi));
  code.push(Instruction::Set(cond, ByteReg::Al));
  code.push(Instruction::Movzb(Reg::Rax, ByteReg::Al));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn number_is_a_single_push() {
    assert_eq!(generate(&AstNode::number(42)), [Instruction::Push(42)]);
  }

  #[test]
  fn renders_intel_syntax() {
    let code = [
      Instruction::Set(Cond::LessEqual, ByteReg::Al),
      Instruction::Movzb(Reg::Rax, ByteReg::Al),
      Instruction::Push(-3),
      Instruction::MovImm(Reg::Rax, 5_000_000_000),
    ];
    let lines: Vec<String> = code.iter().map(ToString::to_string).collect();
    assert_eq!(
      lines,
      ["setle al", "movzb rax, al", "push -3", "mov rax, 5000000000"]
    );
  }
}
