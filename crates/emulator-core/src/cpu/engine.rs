//! Engine lifecycle: single-stepping, clock-driven sessions and run reports.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::cpu::clock::{Clock, TickGate};
use crate::cpu::events::{EventChannel, UnitEvent, UnitId};
use crate::cpu::execute::{execute_statement, ExecuteOutcome};
use crate::cpu::layout::{MemoryLayout, TextSlot};
use crate::cpu::lsu::LoadStoreUnit;
use crate::cpu::memory::MainMemory;
use crate::cpu::registers::RegisterBlock;
use crate::cpu::units::{ControlUnit, InstructionRegister};
use crate::{
    EngineConfig, ProblemLog, Program, Register, RuntimeFault, Word, REGISTER_COUNT,
};

/// Why a run stopped without faulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HaltReason {
    /// Exit syscall.
    Exit,
    /// The program counter reached one past the last statement.
    EndOfProgram,
    /// The session was stopped from outside.
    Stopped,
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Accepting instruction cycles.
    Running,
    /// Finished normally.
    Halted(HaltReason),
    /// Stopped by a runtime fault.
    Faulted(RuntimeFault),
}

impl RunState {
    /// Returns true while further cycles will execute.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Result of one instruction cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A statement executed and the run continues.
    Retired,
    /// The run is halted.
    Halted(HaltReason),
    /// The run is stopped by a fault.
    Faulted(RuntimeFault),
}

/// Architectural state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuSnapshot {
    /// Program counter.
    pub pc: Word,
    /// Register values in hardware order.
    pub registers: [Word; REGISTER_COUNT],
    /// Instruction register contents.
    pub instruction: Word,
    /// Text-segment index the instruction register last decoded to.
    pub decoded: Option<usize>,
    /// Load/store unit transport slot.
    pub transport: Word,
    /// Completed instruction cycles.
    pub cycles: u64,
    /// Lifecycle state.
    pub state: RunState,
}

impl CpuSnapshot {
    /// Value of `register`.
    #[must_use]
    pub const fn register(&self, register: Register) -> Word {
        self.registers[register.index()]
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Final architectural state.
    pub snapshot: CpuSnapshot,
    /// Text written by print syscalls.
    pub console: String,
    /// Runtime faults, located at the faulting statement's line.
    pub problems: ProblemLog,
}

impl RunReport {
    /// Completed instruction cycles.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.snapshot.cycles
    }

    /// Final lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.snapshot.state
    }
}

/// All functional units plus the run bookkeeping shared with the worker.
#[derive(Debug)]
pub(crate) struct Datapath {
    program: Arc<Program>,
    config: EngineConfig,
    pub(crate) layout: MemoryLayout,
    pub(crate) lsu: LoadStoreUnit,
    pub(crate) ir: InstructionRegister,
    pub(crate) cu: ControlUnit,
    pub(crate) console: String,
    state: RunState,
    cycles: u64,
    problems: ProblemLog,
}

impl Datapath {
    fn new(
        program: Arc<Program>,
        config: EngineConfig,
        events: EventChannel,
    ) -> Result<Self, RuntimeFault> {
        program.validate()?;
        let layout = MemoryLayout::plan(&program, &config)?;
        let mut memory = MainMemory::new(config.data_base, config.memory_size);
        layout.load_data(&program, &mut memory)?;

        let mut registers = RegisterBlock::new();
        registers.set(Register::Sp, Word::from_u32(config.memory_end() & !3));
        registers.set(Register::Gp, Word::from_u32(config.data_base));

        let entry = program.text().label_index("main").unwrap_or(0);
        let pc = Word::from_u32(layout.text_address(entry));
        tracing::debug!(
            statements = program.text().len(),
            variables = program.data().len(),
            data_bytes = layout.data_size(),
            entry = %format_args!("0x{pc:08x}"),
            "datapath initialised"
        );

        Ok(Self {
            program,
            config,
            layout,
            lsu: LoadStoreUnit::new(registers, memory, events),
            ir: InstructionRegister::default(),
            cu: ControlUnit::new(pc),
            console: String::new(),
            state: RunState::Running,
            cycles: 0,
            problems: ProblemLog::new(),
        })
    }

    pub(crate) fn publish(&self, unit: UnitId) {
        self.lsu.events().emit(unit, self.cycles);
    }

    fn halt(&mut self, reason: HaltReason) -> StepOutcome {
        tracing::debug!(?reason, cycles = self.cycles, "run halted");
        self.state = RunState::Halted(reason);
        StepOutcome::Halted(reason)
    }

    fn fail(&mut self, fault: RuntimeFault, line: Option<usize>) -> StepOutcome {
        tracing::warn!(%fault, ?line, cycles = self.cycles, "run faulted");
        self.problems.log(fault.to_problem(line));
        self.state = RunState::Faulted(fault.clone());
        StepOutcome::Faulted(fault)
    }

    /// Fetch, decode and execute one statement.
    fn step(&mut self) -> StepOutcome {
        match &self.state {
            RunState::Running => {}
            RunState::Halted(reason) => return StepOutcome::Halted(*reason),
            RunState::Faulted(fault) => return StepOutcome::Faulted(fault.clone()),
        }

        let pc = self.cu.pc();
        self.lsu.set_cycle(self.cycles + 1);
        self.cu.stage_pc();
        self.publish(UnitId::ControlUnit);
        self.lsu.receive_control_unit(&self.cu);
        self.lsu.send_instruction_register(&mut self.ir);

        let index = match self.layout.text_slot(self.ir.data().as_u32()) {
            Some(TextSlot::Statement(index)) => index,
            Some(TextSlot::End) => return self.halt(HaltReason::EndOfProgram),
            None => {
                return self.fail(RuntimeFault::InvalidProgramCounter { pc: pc.as_u32() }, None);
            }
        };
        self.cycles += 1;
        self.ir.set_decoded(Some(index));
        self.publish(UnitId::InstructionRegister);

        let program = Arc::clone(&self.program);
        let Some(statement) = program.text().get(index) else {
            return self.fail(RuntimeFault::InvalidProgramCounter { pc: pc.as_u32() }, None);
        };
        tracing::trace!(
            cycle = self.cycles,
            pc = %format_args!("0x{pc:08x}"),
            line = statement.line,
            instruction = %statement.instruction,
            "execute"
        );

        match execute_statement(self, statement) {
            Ok(ExecuteOutcome::Advance) => {
                self.cu.advance();
                self.publish(UnitId::ControlUnit);
                StepOutcome::Retired
            }
            Ok(ExecuteOutcome::Jumped) => StepOutcome::Retired,
            Ok(ExecuteOutcome::Exit) => self.halt(HaltReason::Exit),
            Err(fault) => self.fail(fault, statement.line),
        }
    }

    fn stop(&mut self) {
        if self.state.is_running() {
            self.state = RunState::Halted(HaltReason::Stopped);
        }
    }

    fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.cu.pc(),
            registers: self.lsu.registers().values(),
            instruction: self.ir.data(),
            decoded: self.ir.decoded(),
            transport: self.lsu.data(),
            cycles: self.cycles,
            state: self.state.clone(),
        }
    }

    fn report(&self) -> RunReport {
        RunReport {
            snapshot: self.snapshot(),
            console: self.console.clone(),
            problems: self.problems.clone(),
        }
    }
}

/// A loaded program ready to execute, driven synchronously by the caller.
///
/// Use [`Cpu::step`] for manual stepping, or hand the CPU to a [`Session`]
/// with [`Cpu::start`] to run it under the periodic clock.
#[derive(Debug)]
pub struct Cpu {
    datapath: Datapath,
}

impl Cpu {
    /// Lays out `program` in memory and points the program counter at `main`
    /// (or the first statement when there is no `main`).
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::DataSegmentTooLarge`] when the data segment
    /// does not fit in the configured memory.
    pub fn new(program: Arc<Program>, config: EngineConfig) -> Result<Self, RuntimeFault> {
        Datapath::new(program, config, EventChannel::disconnected()).map(|datapath| Self {
            datapath,
        })
    }

    /// Publishes unit change notifications to `sender`.
    #[must_use]
    pub fn with_events(mut self, sender: Sender<UnitEvent>) -> Self {
        self.datapath.lsu.set_events(EventChannel::new(sender));
        self
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.datapath.config
    }

    /// Runs one instruction cycle.
    pub fn step(&mut self) -> StepOutcome {
        self.datapath.step()
    }

    /// Steps until the run stops or `max_cycles` statements have executed.
    pub fn run_for(&mut self, max_cycles: u64) -> StepOutcome {
        let mut outcome = StepOutcome::Retired;
        for _ in 0..max_cycles {
            outcome = self.step();
            if outcome != StepOutcome::Retired {
                break;
            }
        }
        outcome
    }

    /// Restores the freshly loaded state, keeping the event channel.
    ///
    /// # Errors
    ///
    /// Propagates layout faults, which cannot occur for a program that
    /// loaded successfully once.
    pub fn reset(&mut self) -> Result<(), RuntimeFault> {
        let events = self.datapath.lsu.events().clone();
        self.datapath = Datapath::new(
            Arc::clone(&self.datapath.program),
            self.datapath.config.clone(),
            events,
        )?;
        Ok(())
    }

    /// Current architectural state.
    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        self.datapath.snapshot()
    }

    /// Reads `length` bytes of main memory without going through the bus.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] for addresses outside
    /// memory.
    pub fn peek_memory(&self, address: u32, length: usize) -> Result<Word, RuntimeFault> {
        self.datapath.lsu.memory().read(address, length)
    }

    /// Address of the data variable bound to `label`.
    #[must_use]
    pub fn data_address(&self, label: &str) -> Option<u32> {
        self.datapath
            .program
            .data()
            .label_index(label)
            .and_then(|index| self.datapath.layout.data_address(index))
    }

    /// Text written by print syscalls so far.
    #[must_use]
    pub fn console(&self) -> &str {
        &self.datapath.console
    }

    /// Report of the run so far.
    #[must_use]
    pub fn report(&self) -> RunReport {
        self.datapath.report()
    }

    /// Runs the program on a worker thread, one cycle per clock interval.
    #[must_use]
    pub fn start(self) -> Session {
        let interval = self.datapath.config.clock_interval;
        Session::spawn(self.datapath, Some(interval))
    }

    /// Runs the program on a worker thread, one cycle per [`Session::tick`].
    #[must_use]
    pub fn start_manual(self) -> Session {
        Session::spawn(self.datapath, None)
    }
}

fn lock(datapath: &Mutex<Datapath>) -> MutexGuard<'_, Datapath> {
    datapath.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_worker(datapath: &Mutex<Datapath>, gate: &TickGate) {
    while gate.wait() {
        if lock(datapath).step() != StepOutcome::Retired {
            break;
        }
    }
    gate.close();
    tracing::debug!("engine worker exiting");
}

/// A program executing on a background worker thread.
///
/// The worker runs exactly one instruction cycle per tick, whether ticks come
/// from the clock or from [`Session::tick`]. Dropping a session stops it.
#[derive(Debug)]
pub struct Session {
    datapath: Arc<Mutex<Datapath>>,
    gate: Arc<TickGate>,
    clock: Option<Clock>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    fn spawn(datapath: Datapath, interval: Option<std::time::Duration>) -> Self {
        let datapath = Arc::new(Mutex::new(datapath));
        let gate = Arc::new(TickGate::new());
        let worker = {
            let datapath = Arc::clone(&datapath);
            let gate = Arc::clone(&gate);
            thread::spawn(move || run_worker(&datapath, &gate))
        };
        let clock = interval.map(|interval| Clock::start(interval, Arc::clone(&gate)));
        Self {
            datapath,
            gate,
            clock,
            worker: Some(worker),
        }
    }

    /// Grants the worker one instruction cycle.
    pub fn tick(&self) {
        self.gate.signal();
    }

    /// Current architectural state.
    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        lock(&self.datapath).snapshot()
    }

    /// Returns true while the worker is parked waiting for its next tick.
    #[must_use]
    pub fn is_awaiting_tick(&self) -> bool {
        self.gate.has_waiter()
    }

    /// Returns true once the program has halted or faulted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Blocks until the program halts or faults on its own.
    ///
    /// A manual session only finishes if enough ticks are delivered.
    #[must_use]
    pub fn wait(mut self) -> RunReport {
        self.join_worker();
        self.shutdown();
        self.current_report()
    }

    /// Stops the clock, lets the worker consume ticks already granted, and
    /// returns the final report.
    #[must_use]
    pub fn stop(mut self) -> RunReport {
        self.shutdown();
        let mut datapath = lock(&self.datapath);
        datapath.stop();
        let report = datapath.report();
        drop(datapath);
        report
    }

    fn current_report(&self) -> RunReport {
        lock(&self.datapath).report()
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("engine worker panicked");
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut clock) = self.clock.take() {
            clock.stop();
        }
        self.gate.close();
        self.join_worker();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Arc;

    use super::{Cpu, HaltReason, RunState, StepOutcome};
    use crate::cpu::events::UnitId;
    use crate::{
        AddressOperand, EngineConfig, Instruction, LabelTarget, Operand, Program, Register,
        RuntimeFault, Statement, Word,
    };

    fn reg(register: Register) -> Operand {
        Operand::Register(register)
    }

    fn text_label(name: &str, index: usize) -> Operand {
        let mut address = AddressOperand::label(name);
        address.target = Some(LabelTarget::Text(index));
        Operand::Address(address)
    }

    fn program(statements: Vec<(Instruction, Vec<Operand>)>) -> Arc<Program> {
        let mut program = Program::new();
        for (index, (instruction, operands)) in statements.into_iter().enumerate() {
            let labels: &[&str] = if index == 0 { &["main"] } else { &[] };
            program.push_statement(Statement::new(instruction, operands, Some(index + 1)), labels);
        }
        Arc::new(program)
    }

    #[test]
    fn falls_off_the_end_after_last_statement() {
        let mut cpu = Cpu::new(
            program(vec![
                (Instruction::Li, vec![reg(Register::T0), Operand::Integer(7)]),
                (
                    Instruction::Addi,
                    vec![reg(Register::T1), reg(Register::T0), Operand::Integer(-2)],
                ),
            ]),
            EngineConfig::default(),
        )
        .expect("loads");

        assert_eq!(cpu.step(), StepOutcome::Retired);
        assert_eq!(cpu.step(), StepOutcome::Retired);
        assert_eq!(cpu.step(), StepOutcome::Halted(HaltReason::EndOfProgram));
        assert_eq!(cpu.step(), StepOutcome::Halted(HaltReason::EndOfProgram));

        let snapshot = cpu.snapshot();
        assert_eq!(snapshot.register(Register::T1), Word::new(5));
        assert_eq!(snapshot.cycles, 2);
    }

    #[test]
    fn overflow_faults_and_is_reported_at_its_line() {
        let mut cpu = Cpu::new(
            program(vec![
                (Instruction::Li, vec![reg(Register::T0), Operand::Integer(i64::from(i32::MAX))]),
                (
                    Instruction::Addi,
                    vec![reg(Register::T0), reg(Register::T0), Operand::Integer(1)],
                ),
            ]),
            EngineConfig::default(),
        )
        .expect("loads");

        let outcome = cpu.run_for(10);
        assert_eq!(outcome, StepOutcome::Faulted(RuntimeFault::ArithmeticOverflow));
        let report = cpu.report();
        assert_eq!(report.state(), &RunState::Faulted(RuntimeFault::ArithmeticOverflow));
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems.as_slice()[0].line_num(), 2);
        assert_eq!(report.snapshot.register(Register::T0), Word::new(i32::MAX));
    }

    #[test]
    fn jal_links_and_jr_returns() {
        let mut cpu = Cpu::new(
            program(vec![
                (Instruction::Jal, vec![text_label("f", 3)]),
                (Instruction::Li, vec![reg(Register::V0), Operand::Integer(10)]),
                (Instruction::Syscall, vec![]),
                (Instruction::Li, vec![reg(Register::S0), Operand::Integer(42)]),
                (Instruction::Jr, vec![reg(Register::Ra)]),
            ]),
            EngineConfig::default(),
        )
        .expect("loads");

        assert_eq!(cpu.run_for(100), StepOutcome::Halted(HaltReason::Exit));
        let snapshot = cpu.snapshot();
        assert_eq!(snapshot.register(Register::S0), Word::new(42));
        assert_eq!(
            snapshot.register(Register::Ra).as_u32(),
            EngineConfig::default().text_base + 4
        );
        assert_eq!(snapshot.cycles, 5);
    }

    #[test]
    fn unresolved_label_faults_when_reached() {
        let mut cpu = Cpu::new(
            program(vec![(
                Instruction::J,
                vec![Operand::Address(AddressOperand::label("nowhere"))],
            )]),
            EngineConfig::default(),
        )
        .expect("loads");

        assert_eq!(
            cpu.step(),
            StepOutcome::Faulted(RuntimeFault::UnresolvedLabel {
                label: "nowhere".into()
            })
        );
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut cpu = Cpu::new(
            program(vec![(Instruction::Li, vec![reg(Register::T0), Operand::Integer(3)])]),
            EngineConfig::default(),
        )
        .expect("loads");
        let initial = cpu.snapshot();
        let _ = cpu.run_for(5);
        assert_ne!(cpu.snapshot(), initial);

        cpu.reset().expect("reloads");
        assert_eq!(cpu.snapshot(), initial);
    }

    #[test]
    fn events_carry_the_cycle_number() {
        let (tx, rx) = mpsc::channel();
        let mut cpu = Cpu::new(
            program(vec![
                (Instruction::Li, vec![reg(Register::T0), Operand::Integer(1)]),
                (Instruction::Nop, vec![]),
            ]),
            EngineConfig::default(),
        )
        .expect("loads")
        .with_events(tx);

        let _ = cpu.step();
        let _ = cpu.step();
        let events: Vec<_> = rx.try_iter().collect();
        assert!(events
            .iter()
            .any(|event| event.unit == UnitId::RegisterBlock && event.cycle == 1));
        assert!(events.iter().all(|event| event.cycle <= 2));
        assert_eq!(events.last().map(|event| event.unit), Some(UnitId::ControlUnit));
    }

    #[test]
    fn each_step_opens_with_the_control_unit() {
        let (tx, rx) = mpsc::channel();
        let mut cpu = Cpu::new(
            program(vec![(Instruction::Nop, vec![]), (Instruction::Nop, vec![])]),
            EngineConfig::default(),
        )
        .expect("loads")
        .with_events(tx);

        assert_eq!(cpu.snapshot().decoded, None);
        let _ = cpu.step();
        let units: Vec<_> = rx.try_iter().map(|event| event.unit).collect();
        assert_eq!(units.first(), Some(&UnitId::ControlUnit));
        assert_eq!(units.last(), Some(&UnitId::ControlUnit));
        assert_eq!(cpu.snapshot().decoded, Some(0));

        let _ = cpu.step();
        assert_eq!(cpu.snapshot().decoded, Some(1));
    }

    #[test]
    fn manual_session_runs_one_cycle_per_tick() {
        let cpu = Cpu::new(
            program(vec![(Instruction::J, vec![text_label("main", 0)])]),
            EngineConfig::default(),
        )
        .expect("loads");
        let session = cpu.start_manual();
        for _ in 0..7 {
            session.tick();
        }
        let report = session.stop();
        assert_eq!(report.cycles(), 7);
        assert_eq!(report.state(), &RunState::Halted(HaltReason::Stopped));
    }
}
