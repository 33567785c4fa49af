//! End-to-end properties of source extraction: label binding, problem
//! reporting and data sizing.

use mipsim_assembler::{assemble, Extraction};
use mipsim_core::{Instruction, LabelTarget, Operand, Problem, Register, VariableKind};
use proptest as _;
use rstest::rstest;
use tempfile as _;
use thiserror as _;
use tracing as _;

fn messages(extraction: &Extraction) -> Vec<&str> {
    extraction.problems.iter().map(Problem::message).collect()
}

#[test]
fn single_word_and_statement_program_is_clean() {
    let extraction = assemble(".data\nx: .word 5\n.text\nmain: add $t0, $t0, $t0");
    assert!(extraction.problems.is_empty(), "{:?}", messages(&extraction));

    let program = &extraction.program;
    assert_eq!(program.data().len(), 1);
    assert_eq!(program.data().label_index("x"), Some(0));
    let variable = &program.data().entries()[0];
    assert_eq!(variable.kind, VariableKind::Word);
    assert_eq!(variable.initial, Some(Operand::Integer(5)));

    assert_eq!(program.text().len(), 1);
    assert_eq!(program.text().label_index("main"), Some(0));
    let statement = &program.text().entries()[0];
    assert_eq!(statement.instruction, Instruction::Add);
    assert_eq!(statement.operands, vec![Operand::Register(Register::T0); 3]);
    assert_eq!(statement.line, Some(4));
}

#[test]
fn missing_main_is_the_only_problem() {
    let extraction = assemble(".text\nfoo: li $t0, 1");
    assert_eq!(messages(&extraction), ["The program has no 'main' label"]);
    assert!(extraction.problems.as_slice()[0].is_position_free());
    assert_eq!(extraction.program.text().label_index("foo"), Some(0));
    assert_eq!(extraction.program.text().entries()[0].instruction, Instruction::Li);
}

#[test]
fn duplicate_label_across_segments_keeps_first_binding() {
    let extraction = assemble(".data\nx: .word 1\n.text\nmain: nop\nx: nop");
    let found = messages(&extraction);
    assert_eq!(found.len(), 1);
    assert!(found[0].contains("\"x\""), "{found:?}");
    assert_eq!(extraction.program.resolve_label("x"), Some(LabelTarget::Data(0)));
    assert_eq!(extraction.program.text().len(), 2);
    assert!(!extraction.program.text().has_label("x"));
}

#[test]
fn duplicate_label_within_one_queue_is_reported() {
    let extraction = assemble(".text\nmain:\nmain: nop");
    assert_eq!(extraction.problems.len(), 1);
    assert_eq!(extraction.program.text().label_index("main"), Some(0));
}

#[rstest]
#[case("nop")]
#[case("syscall")]
#[case("add $t0, $t1, $t2")]
#[case("add $t0, $t1, 7")]
#[case("addi $sp, $sp, -8")]
#[case("lui $at, 0x1001")]
#[case("lw $t0, 4($sp)")]
#[case("sw $ra, ($sp)")]
#[case("la $a0, main")]
#[case("beq $t0, $zero, main")]
#[case("blt $t0, 10, main")]
#[case("bnez $t0, main")]
#[case("jal main")]
#[case("jr $ra")]
#[case("li $t0, 'a'")]
fn valid_statements_produce_no_problems(#[case] statement: &str) {
    let extraction = assemble(&format!(".text\nmain: {statement}"));
    assert!(extraction.problems.is_empty(), "{:?}", messages(&extraction));
    assert_eq!(extraction.program.text().len(), 1);
}

#[rstest]
#[case("", 1)]
#[case("hello", 6)]
#[case("tab\\there", 9)]
fn asciiz_size_counts_the_terminator(#[case] literal: &str, #[case] size: usize) {
    let extraction = assemble(&format!(".data\ns: .asciiz \"{literal}\"\n.text\nmain: nop"));
    assert!(extraction.problems.is_empty(), "{:?}", messages(&extraction));
    let variable = &extraction.program.data().entries()[0];
    assert_eq!(variable.kind, VariableKind::Asciiz);
    assert_eq!(variable.size, size);
}

#[test]
fn trailing_labels_are_reported_once_and_never_bound() {
    let extraction = assemble(".text\nmain: nop\nend:\nafter:\n");
    let found = messages(&extraction);
    assert_eq!(found.len(), 1);
    assert!(found[0].contains("\"end\", \"after\""), "{found:?}");
    assert!(extraction.problems.as_slice()[0].is_position_free());
    for name in ["end", "after"] {
        assert_eq!(extraction.program.resolve_label(name), None);
    }
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(8)]
fn consecutive_labels_share_one_entry(#[case] count: usize) {
    let labels: String = (0..count).map(|i| format!("l{i}:\n")).collect();
    let extraction = assemble(&format!(".text\nmain: nop\n{labels}nop\n"));
    assert!(extraction.problems.is_empty(), "{:?}", messages(&extraction));
    for i in 0..count {
        assert_eq!(extraction.program.text().label_index(&format!("l{i}")), Some(1));
    }
}

#[test]
fn labels_carry_across_segment_markers() {
    let extraction = assemble(".data\nfirst:\n.text\nmain: nop");
    assert_eq!(extraction.program.text().labels_at(0), vec!["first", "main"]);
}

#[test]
fn problems_carry_positions_and_keep_going() {
    let extraction = assemble(".text\nmain: add $t0\n  frob\nli $t0, 99999999999\nnop");
    let problems = extraction.problems.as_slice();
    assert_eq!(problems.len(), 4, "{:?}", messages(&extraction));
    assert_eq!(problems[0].line_num(), 2);
    assert_eq!(problems[1].line_num(), 3);
    assert_eq!(problems[1].range(), (22, 25));
    assert!(problems[2].message().contains("99999999999"));
    assert!(problems[2..].iter().all(|p| p.line_num() == 4));
    assert!(!extraction.is_runnable());
    assert_eq!(extraction.program.text().len(), 3);
}

#[test]
fn undefined_reference_is_reported_at_its_line() {
    let extraction = assemble(".text\nmain: nop\nj missing");
    let problems = extraction.problems.as_slice();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].line_num(), 3);
    assert!(problems[0].message().contains("\"missing\""));
}
