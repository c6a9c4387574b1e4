//! In-process interpreter for the emitted instruction sequence.
//!
//! Models just enough of x86-64 to run what `codegen` produces: a value stack,
//! `rax`/`rdi`/`rdx` and the result of the last `cmp`. Arithmetic wraps the
//! way the hardware does; the cases where the hardware would trap (`idiv` by
//! zero or an unrepresentable quotient) become errors instead.

use std::cmp::Ordering;

use snafu::{OptionExt, Snafu, ensure};
use tracing::{debug, trace};

use crate::codegen::{ByteReg, Cond, Instruction, Reg};

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum RuntimeError {
  #[snafu(display("stack underflow at instruction {index}"))]
  StackUnderflow { index: usize },
  #[snafu(display("division by zero at instruction {index}"))]
  DivisionByZero { index: usize },
  #[snafu(display("quotient does not fit in 64 bits at instruction {index}"))]
  DivideOverflow { index: usize },
  #[snafu(display("flags read before any cmp at instruction {index}"))]
  FlagsUnset { index: usize },
  #[snafu(display("program left {depth} values on the stack, expected exactly one"))]
  UnbalancedStack { depth: usize },
}

/// Run `code` and return the single value it leaves on the stack.
pub fn execute(code: &[Instruction]) -> Result<i64, RuntimeError> {
  let mut machine = Machine::default();
  for (index, inst) in code.iter().enumerate() {
    trace!(index, %inst, "step");
    machine.step(index, *inst)?;
  }

  let depth = machine.stack.len();
  ensure!(depth == 1, UnbalancedStackSnafu { depth });
  let result = machine.stack[0];
  debug!(result, steps = code.len(), "program finished");
  Ok(result)
}

#[derive(Debug, Default)]
struct Machine {
  stack: Vec<i64>,
  rax: i64,
  rdi: i64,
  rdx: i64,
  flags: Option<Ordering>,
}

impl Machine {
  fn reg(&self, reg: Reg) -> i64 {
    match reg {
      Reg::Rax => self.rax,
      Reg::Rdi => self.rdi,
    }
  }

  fn reg_mut(&mut self, reg: Reg) -> &mut i64 {
    match reg {
      Reg::Rax => &mut self.rax,
      Reg::Rdi => &mut self.rdi,
    }
  }

  fn byte_reg(&self, reg: ByteReg) -> u8 {
    match reg {
      ByteReg::Al => (self.rax & 0xff) as u8,
    }
  }

  fn set_byte_reg(&mut self, reg: ByteReg, value: u8) {
    match reg {
      ByteReg::Al => self.rax = (self.rax & !0xff) | i64::from(value),
    }
  }

  fn step(&mut self, index: usize, inst: Instruction) -> Result<(), RuntimeError> {
    match inst {
      Instruction::Push(value) => self.stack.push(value),
      Instruction::PushReg(reg) => self.stack.push(self.reg(reg)),
      Instruction::MovImm(reg, value) => *self.reg_mut(reg) = value,
      Instruction::Pop(reg) => {
        let value = self.stack.pop().context(StackUnderflowSnafu { index })?;
        *self.reg_mut(reg) = value;
      }
      Instruction::Add(dst, src) => {
        let value = self.reg(dst).wrapping_add(self.reg(src));
        *self.reg_mut(dst) = value;
      }
      Instruction::Sub(dst, src) => {
        let value = self.reg(dst).wrapping_sub(self.reg(src));
        *self.reg_mut(dst) = value;
      }
      Instruction::Imul(reg) => {
        let product = i128::from(self.rax) * i128::from(self.reg(reg));
        self.rax = product as i64;
        self.rdx = (product >> 64) as i64;
      }
      Instruction::Cqo => self.rdx = if self.rax < 0 { -1 } else { 0 },
      Instruction::Idiv(reg) => {
        let divisor = i128::from(self.reg(reg));
        ensure!(divisor != 0, DivisionByZeroSnafu { index });
        let dividend = (i128::from(self.rdx) << 64) | i128::from(self.rax as u64);
        let quotient = i64::try_from(dividend / divisor)
          .ok()
          .context(DivideOverflowSnafu { index })?;
        self.rax = quotient;
        self.rdx = (dividend % divisor) as i64;
      }
      Instruction::Cmp(lhs, rhs) => self.flags = Some(self.reg(lhs).cmp(&self.reg(rhs))),
      Instruction::Set(cond, reg) => {
        let ordering = self.flags.context(FlagsUnsetSnafu { index })?;
        let hit = match cond {
          Cond::Equal => ordering == Ordering::Equal,
          Cond::NotEqual => ordering != Ordering::Equal,
          Cond::Less => ordering == Ordering::Less,
          Cond::LessEqual => ordering != Ordering::Greater,
        };
        self.set_byte_reg(reg, u8::from(hit));
      }
      Instruction::Movzb(dst, src) => {
        let value = i64::from(self.byte_reg(src));
        *self.reg_mut(dst) = value;
      }
    }
    Ok(())
  }
}
