//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns an expression tree.
//! - `ast` holds the tree shared by the parser and the code generator.
//! - `codegen` lowers the tree into stack-machine instructions.
//! - `vm` runs those instructions in process.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod parser;
pub mod tokenizer;
pub mod vm;

pub use codegen::Instruction;
pub use error::{CompileError, CompileResult, EvalError};

/// Compile a source string into its instruction sequence.
pub fn compile(expr: &str) -> CompileResult<Vec<Instruction>> {
  let tokens = tokenizer::tokenize(expr)?;
  let ast = parser::parse(tokens, expr)?;
  Ok(codegen::generate(&ast))
}

/// Compile a source string into a complete Intel-syntax assembly program.
pub fn generate_assembly(expr: &str) -> CompileResult<String> {
  let code = compile(expr)?;
  Ok(codegen::render_program(&code))
}

/// Compile and run on the built-in stack machine.
pub fn evaluate(expr: &str) -> Result<i64, EvalError> {
  let code = compile(expr)?;
  Ok(vm::execute(&code)?)
}
