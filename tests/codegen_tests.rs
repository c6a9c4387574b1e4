use exprcc::codegen::{ByteReg, Cond, Instruction, Reg};
use exprcc::{compile, generate_assembly};

/// Net stack effect: pushes minus pops.
fn stack_effect(code: &[Instruction]) -> i64 {
  code
    .iter()
    .map(|inst| match inst {
      Instruction::Push(_) | Instruction::PushReg(_) => 1,
      Instruction::Pop(_) => -1,
      _ => 0,
    })
    .sum()
}

#[test]
fn binary_node_is_post_order() {
  let code = compile("1+2").expect("compile should succeed");
  assert_eq!(
    code,
    [
      Instruction::Push(1),
      Instruction::Push(2),
      Instruction::Pop(Reg::Rdi),
      Instruction::Pop(Reg::Rax),
      Instruction::Add(Reg::Rax, Reg::Rdi),
      Instruction::PushReg(Reg::Rax),
    ]
  );
}

#[test]
fn division_sign_extends_first() {
  let code = compile("7/2").expect("compile should succeed");
  assert_eq!(
    &code[4..],
    [
      Instruction::Cqo,
      Instruction::Idiv(Reg::Rdi),
      Instruction::PushReg(Reg::Rax),
    ]
  );
}

#[test]
fn comparisons_zero_extend_their_flag() {
  let cases = [
    ("1==2", Cond::Equal),
    ("1!=2", Cond::NotEqual),
    ("1<2", Cond::Less),
    ("1<=2", Cond::LessEqual),
  ];
  for (src, cond) in cases {
    let code = compile(src).expect("compile should succeed");
    assert_eq!(
      &code[4..],
      [
        Instruction::Cmp(Reg::Rax, Reg::Rdi),
        Instruction::Set(cond, ByteReg::Al),
        Instruction::Movzb(Reg::Rax, ByteReg::Al),
        Instruction::PushReg(Reg::Rax),
      ],
      "source {src}"
    );
  }
}

#[test]
fn greater_than_matches_swapped_less_than() {
  assert_eq!(compile("3>2").unwrap(), compile("2<3").unwrap());
  assert_eq!(compile("3>=2").unwrap(), compile("2<=3").unwrap());
}

#[test]
fn every_expression_pushes_exactly_one_value() {
  for src in ["42", "1+2*3", "-(4/2)", "(1<2)==(3>=3)", "((((1))))-2-3-4"] {
    let code = compile(src).expect("compile should succeed");
    assert_eq!(stack_effect(&code), 1, "source {src}");
  }
}

#[test]
fn assembly_has_prologue_and_epilogue() {
  let asm = generate_assembly("5*2").expect("compile should succeed");
  let expected = "\
.intel_syntax noprefix
.global main
main:
  push 5
  push 2
  pop rdi
  pop rax
  imul rdi
  push rax
  pop rax
  ret
";
  assert_eq!(asm, expected);
}

#[test]
fn errors_surface_through_assembly_entry_point() {
  let err = generate_assembly("1+@").expect_err("lex error");
  assert_eq!(err.position(), Some(2));
}

#[test]
fn literals_within_imm32_are_pushed_directly() {
  assert_eq!(
    compile("2147483647").unwrap(),
    [Instruction::Push(2_147_483_647)]
  );
}

#[test]
fn wide_literals_are_loaded_through_rax() {
  assert_eq!(
    compile("2147483648").unwrap(),
    [
      Instruction::MovImm(Reg::Rax, 2_147_483_648),
      Instruction::PushReg(Reg::Rax),
    ]
  );
  assert_eq!(
    compile("9223372036854775807").unwrap(),
    [
      Instruction::MovImm(Reg::Rax, i64::MAX),
      Instruction::PushReg(Reg::Rax),
    ]
  );
}

#[test]
fn rendered_assembly_never_pushes_a_wide_immediate() {
  let asm =
    generate_assembly("5000000000+2147483648-2147483647").expect("compile should succeed");
  assert!(asm.contains("  mov rax, 5000000000\n  push rax\n"));
  assert!(asm.contains("  mov rax, 2147483648\n  push rax\n"));
  assert!(asm.contains("  push 2147483647\n"));
  let pushed: Vec<i64> = asm
    .lines()
    .filter_map(|line| line.trim().strip_prefix("push "))
    .filter_map(|imm| imm.parse().ok())
    .collect();
  assert_eq!(pushed, [2_147_483_647]);
}
