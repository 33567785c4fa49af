//! Engine integration coverage: clocked and manual sessions, memory
//! round trips, observability events and fault handling.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use mipsim_core::cpu::MainMemory;
use mipsim_core::{
    AddressOperand, Cpu, EngineConfig, HaltReason, Instruction, LabelTarget, Operand, Program,
    Register, RunState, RuntimeFault, Session, Statement, StepOutcome, UnitId, Variable,
    VariableKind, Word,
};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn reg(register: Register) -> Operand {
    Operand::Register(register)
}

fn int(value: i64) -> Operand {
    Operand::Integer(value)
}

fn text(name: &str, index: usize) -> Operand {
    let mut address = AddressOperand::label(name);
    address.target = Some(LabelTarget::Text(index));
    Operand::Address(address)
}

fn data(name: &str, index: usize) -> Operand {
    let mut address = AddressOperand::label(name);
    address.target = Some(LabelTarget::Data(index));
    Operand::Address(address)
}

struct Builder {
    program: Program,
}

impl Builder {
    fn new() -> Self {
        Self {
            program: Program::new(),
        }
    }

    fn var(mut self, label: &str, kind: VariableKind, size: usize, initial: Option<Operand>) -> Self {
        let line = Some(self.program.data().len() + 1);
        self.program
            .push_variable(Variable::new(kind, size, initial, line), [label]);
        self
    }

    fn op(mut self, labels: &[&str], instruction: Instruction, operands: Vec<Operand>) -> Self {
        let line = Some(100 + self.program.text().len());
        self.program
            .push_statement(Statement::new(instruction, operands, line), labels);
        self
    }

    fn build(self) -> Arc<Program> {
        Arc::new(self.program)
    }
}

fn spin_loop() -> Arc<Program> {
    Builder::new()
        .op(&["main"], Instruction::J, vec![text("main", 0)])
        .build()
}

#[rstest]
#[case(1)]
#[case(5)]
#[case(64)]
fn manual_ticks_yield_exactly_that_many_cycles(#[case] ticks: u64) {
    init_tracing();
    let session = Cpu::new(spin_loop(), EngineConfig::default())
        .expect("loads")
        .start_manual();
    for _ in 0..ticks {
        session.tick();
    }
    let report = session.stop();
    assert_eq!(report.cycles(), ticks);
    assert!(report.problems.is_empty());
}

fn await_parked(session: &Session, cycles: u64) {
    while !(session.is_awaiting_tick() && session.snapshot().cycles == cycles) {
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn parked_worker_runs_nothing_until_ticked() {
    init_tracing();
    let session = Cpu::new(spin_loop(), EngineConfig::default())
        .expect("loads")
        .start_manual();

    await_parked(&session, 0);
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(session.snapshot().cycles, 0);
    assert!(!session.is_finished());

    for expected in 1..=3 {
        session.tick();
        await_parked(&session, expected);
    }
    let report = session.stop();
    assert_eq!(report.cycles(), 3);
    assert_eq!(report.state(), &RunState::Halted(HaltReason::Stopped));
}

#[test]
fn clocked_session_makes_progress_and_stops_cleanly() {
    init_tracing();
    let config = EngineConfig::default().with_clock_interval(Duration::from_millis(1));
    let session = Cpu::new(spin_loop(), config).expect("loads").start();
    while session.snapshot().cycles < 3 {
        std::thread::sleep(Duration::from_millis(1));
    }
    let report = session.stop();
    assert!(report.cycles() >= 3);
    assert_eq!(report.state(), &RunState::Halted(HaltReason::Stopped));
}

#[test]
fn clocked_session_finishes_on_exit() {
    init_tracing();
    let program = Builder::new()
        .op(&["main"], Instruction::Li, vec![reg(Register::A0), int(-12)])
        .op(&[], Instruction::Li, vec![reg(Register::V0), int(1)])
        .op(&[], Instruction::Syscall, vec![])
        .op(&[], Instruction::Li, vec![reg(Register::V0), int(10)])
        .op(&[], Instruction::Syscall, vec![])
        .build();
    let config = EngineConfig::default().with_clock_interval(Duration::from_millis(1));
    let report = Cpu::new(program, config).expect("loads").start().wait();

    assert_eq!(report.state(), &RunState::Halted(HaltReason::Exit));
    assert_eq!(report.console, "-12");
    assert_eq!(report.cycles(), 5);
}

#[test]
fn data_segment_round_trips_through_loads_and_stores() {
    let program = Builder::new()
        .var("value", VariableKind::Word, 4, Some(int(-7)))
        .var("copy", VariableKind::Word, 4, Some(int(0)))
        .var("byte", VariableKind::Byte, 1, Some(int(0xF0)))
        .op(&["main"], Instruction::Lw, vec![reg(Register::T0), data("value", 0)])
        .op(&[], Instruction::Sw, vec![reg(Register::T0), data("copy", 1)])
        .op(&[], Instruction::Lb, vec![reg(Register::T1), data("byte", 2)])
        .op(&[], Instruction::Lbu, vec![reg(Register::T2), data("byte", 2)])
        .build();
    let mut cpu = Cpu::new(program, EngineConfig::default()).expect("loads");

    assert_eq!(cpu.run_for(10), StepOutcome::Halted(HaltReason::EndOfProgram));
    let copy = cpu.data_address("copy").expect("bound");
    assert_eq!(cpu.peek_memory(copy, 4), Ok(Word::new(-7)));

    let snapshot = cpu.snapshot();
    assert_eq!(snapshot.register(Register::T0), Word::new(-7));
    assert_eq!(snapshot.register(Register::T1), Word::new(-16));
    assert_eq!(snapshot.register(Register::T2), Word::new(0xF0));
}

#[test]
fn stack_pointer_addressing_works_from_initial_sp() {
    let program = Builder::new()
        .op(&["main"], Instruction::Addi, vec![reg(Register::Sp), reg(Register::Sp), int(-4)])
        .op(&[], Instruction::Li, vec![reg(Register::T0), int(99)])
        .op(
            &[],
            Instruction::Sw,
            vec![reg(Register::T0), Operand::Address(AddressOperand::based(Some(0), Register::Sp))],
        )
        .op(
            &[],
            Instruction::Lw,
            vec![reg(Register::T1), Operand::Address(AddressOperand::based(None, Register::Sp))],
        )
        .build();
    let mut cpu = Cpu::new(program, EngineConfig::default()).expect("loads");
    let _ = cpu.run_for(10);
    assert_eq!(cpu.snapshot().register(Register::T1), Word::new(99));
}

#[test]
fn print_string_and_char_syscalls_write_console() {
    let program = Builder::new()
        .var("msg", VariableKind::Asciiz, 4, Some(Operand::String("hey".into())))
        .op(&["main"], Instruction::La, vec![reg(Register::A0), data("msg", 0)])
        .op(&[], Instruction::Li, vec![reg(Register::V0), int(4)])
        .op(&[], Instruction::Syscall, vec![])
        .op(&[], Instruction::Li, vec![reg(Register::A0), int(i64::from(b'!'))])
        .op(&[], Instruction::Li, vec![reg(Register::V0), int(11)])
        .op(&[], Instruction::Syscall, vec![])
        .build();
    let mut cpu = Cpu::new(program, EngineConfig::default()).expect("loads");
    let _ = cpu.run_for(20);
    assert_eq!(cpu.console(), "hey!");
}

#[rstest]
#[case(
    Instruction::Lw,
    vec![reg(Register::T0), Operand::Address(AddressOperand::based(Some(0), Register::Zero))],
    RuntimeFault::MemoryOutOfRange { address: 0, length: 4 }
)]
#[case(
    Instruction::Syscall,
    vec![],
    RuntimeFault::UnsupportedSyscall { service: 0 }
)]
#[case(
    Instruction::Add,
    vec![reg(Register::T0), int(1)],
    RuntimeFault::MalformedStatement { mnemonic: "add".into() }
)]
fn runtime_faults_halt_the_run(
    #[case] instruction: Instruction,
    #[case] operands: Vec<Operand>,
    #[case] expected: RuntimeFault,
) {
    let program = Builder::new()
        .op(&["main"], instruction, operands)
        .op(&[], Instruction::Nop, vec![])
        .build();
    let mut cpu = Cpu::new(program, EngineConfig::default()).expect("loads");

    assert_eq!(cpu.step(), StepOutcome::Faulted(expected.clone()));
    assert_eq!(cpu.step(), StepOutcome::Faulted(expected.clone()));

    let report = cpu.report();
    assert_eq!(report.cycles(), 1);
    assert_eq!(report.problems.len(), 1);
    let problem = &report.problems.as_slice()[0];
    assert_eq!(problem.line_num(), 100);
    assert!(problem.is_critical());
    assert!(problem.message().contains(&expected.to_string()));
}

#[test]
fn jumping_outside_text_is_an_invalid_program_counter() {
    let program = Builder::new()
        .var("x", VariableKind::Word, 4, Some(int(1)))
        .op(&["main"], Instruction::J, vec![data("x", 0)])
        .build();
    let mut cpu = Cpu::new(program, EngineConfig::default()).expect("loads");
    assert_eq!(cpu.step(), StepOutcome::Retired);
    assert_eq!(
        cpu.step(),
        StepOutcome::Faulted(RuntimeFault::InvalidProgramCounter {
            pc: EngineConfig::default().data_base
        })
    );
}

#[test]
fn event_channel_reports_units_and_survives_hangup() {
    let (tx, rx) = mpsc::channel();
    let program = Builder::new()
        .var("slot", VariableKind::Word, 4, None)
        .op(&["main"], Instruction::Sw, vec![reg(Register::Zero), data("slot", 0)])
        .op(&[], Instruction::Nop, vec![])
        .build();
    let mut cpu = Cpu::new(program, EngineConfig::default())
        .expect("loads")
        .with_events(tx);

    assert_eq!(cpu.step(), StepOutcome::Retired);
    let units: Vec<UnitId> = rx.try_iter().map(|event| event.unit).collect();
    assert!(units.contains(&UnitId::MainMemory));
    assert!(units.contains(&UnitId::InstructionRegister));

    drop(rx);
    assert_eq!(cpu.step(), StepOutcome::Retired);
}

#[test]
fn oversized_data_segment_refuses_to_load() {
    let program = Builder::new()
        .var("big", VariableKind::Space, 128, None)
        .op(&["main"], Instruction::Nop, vec![])
        .build();
    let result = Cpu::new(program, EngineConfig::default().with_memory_size(64));
    assert!(matches!(
        result,
        Err(RuntimeFault::DataSegmentTooLarge { required: 128, capacity: 64 })
    ));
}

proptest! {
    #[test]
    fn memory_word_round_trip(value in any::<i32>(), slot in 0u32..15) {
        let mut memory = MainMemory::new(0x1000, 64);
        let address = 0x1000 + slot * 4;
        memory.write(address, &Word::new(value).to_bytes()).expect("in range");
        prop_assert_eq!(memory.read(address, 4), Ok(Word::new(value)));
    }

    #[test]
    fn wrapping_add_matches_reference(lhs in any::<i32>(), rhs in any::<i32>()) {
        let program = Builder::new()
            .op(&["main"], Instruction::Li, vec![reg(Register::T0), int(i64::from(lhs))])
            .op(&[], Instruction::Addu, vec![reg(Register::T1), reg(Register::T0), int(i64::from(rhs))])
            .build();
        let mut cpu = Cpu::new(program, EngineConfig::default()).expect("loads");
        let _ = cpu.run_for(4);
        prop_assert_eq!(
            cpu.snapshot().register(Register::T1),
            Word::new(lhs.wrapping_add(rhs))
        );
    }
}
