//! Instruction semantics.
//!
//! Operands are read through the load/store unit, results are written back
//! through it, and control transfers land in the control unit. A faulting
//! statement leaves the program counter where it was.

use crate::cpu::engine::Datapath;
use crate::cpu::events::UnitId;
use crate::{AddressOperand, Instruction, Operand, Register, RuntimeFault, Statement, Word};

/// What the engine does with the program counter after a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecuteOutcome {
    /// Fall through to the next statement.
    Advance,
    /// The statement already moved the program counter.
    Jumped,
    /// Exit syscall.
    Exit,
}

/// Operand list of a statement with typed accessors.
struct Operands<'a> {
    instruction: Instruction,
    list: &'a [Operand],
}

impl<'a> Operands<'a> {
    fn malformed(&self) -> RuntimeFault {
        RuntimeFault::MalformedStatement {
            mnemonic: self.instruction.mnemonic().to_string(),
        }
    }

    fn register(&self, index: usize) -> Result<Register, RuntimeFault> {
        self.list
            .get(index)
            .and_then(Operand::as_register)
            .ok_or_else(|| self.malformed())
    }

    fn address(&self, index: usize) -> Result<&'a AddressOperand, RuntimeFault> {
        self.list
            .get(index)
            .and_then(Operand::as_address)
            .ok_or_else(|| self.malformed())
    }

    fn immediate(&self, index: usize) -> Result<Word, RuntimeFault> {
        self.list
            .get(index)
            .and_then(Operand::as_integer)
            .map(Word::truncate)
            .ok_or_else(|| self.malformed())
    }

    /// Register contents or an immediate, whichever the operand is.
    fn value(&self, datapath: &mut Datapath, index: usize) -> Result<Word, RuntimeFault> {
        match self.list.get(index) {
            Some(Operand::Register(register)) => Ok(datapath.lsu.read_register(*register)),
            Some(Operand::Integer(value)) => Ok(Word::truncate(*value)),
            _ => Err(self.malformed()),
        }
    }
}

fn bits(op: impl FnOnce(i32, i32) -> i32) -> impl FnOnce(Word, Word) -> Result<Word, RuntimeFault> {
    move |lhs, rhs| Ok(Word::new(op(lhs.as_i32(), rhs.as_i32())))
}

const fn flag(condition: bool) -> Word {
    if condition {
        Word::new(1)
    } else {
        Word::ZERO
    }
}

/// `rd = op(rs, rt|imm)`.
fn binary(
    datapath: &mut Datapath,
    operands: &Operands<'_>,
    op: impl FnOnce(Word, Word) -> Result<Word, RuntimeFault>,
) -> Result<ExecuteOutcome, RuntimeFault> {
    let dest = operands.register(0)?;
    let lhs = datapath.lsu.read_register(operands.register(1)?);
    let rhs = operands.value(datapath, 2)?;
    let result = op(lhs, rhs)?;
    datapath.lsu.write_register(dest, result);
    Ok(ExecuteOutcome::Advance)
}

fn effective_address(
    datapath: &mut Datapath,
    address: &AddressOperand,
) -> Result<u32, RuntimeFault> {
    let mut sum: i64 = 0;
    if let Some(label) = &address.label {
        let target = address
            .target
            .and_then(|target| datapath.layout.target_address(target))
            .ok_or_else(|| RuntimeFault::UnresolvedLabel {
                label: label.clone(),
            })?;
        sum = i64::from(target);
    }
    if let Some(offset) = address.offset {
        sum = sum.wrapping_add(offset);
    }
    if let Some(base) = address.base {
        sum = sum.wrapping_add(datapath.lsu.read_register(base).as_i64());
    }
    Ok(Word::truncate(sum).as_u32())
}

fn jump(datapath: &mut Datapath, target: u32) -> ExecuteOutcome {
    datapath.cu.set_data(Word::from_u32(target));
    datapath.cu.jump_to_data();
    datapath.publish(UnitId::ControlUnit);
    ExecuteOutcome::Jumped
}

fn branch(
    datapath: &mut Datapath,
    operands: &Operands<'_>,
    compare: impl FnOnce(i32, i32) -> bool,
) -> Result<ExecuteOutcome, RuntimeFault> {
    let lhs = datapath.lsu.read_register(operands.register(0)?);
    let (rhs, label) = if operands.list.len() == 2 {
        (Word::ZERO, operands.address(1)?)
    } else {
        (operands.value(datapath, 1)?, operands.address(2)?)
    };
    if compare(lhs.as_i32(), rhs.as_i32()) {
        let target = effective_address(datapath, label)?;
        Ok(jump(datapath, target))
    } else {
        Ok(ExecuteOutcome::Advance)
    }
}

fn load(
    datapath: &mut Datapath,
    operands: &Operands<'_>,
    length: usize,
    signed: bool,
) -> Result<ExecuteOutcome, RuntimeFault> {
    let dest = operands.register(0)?;
    let address = effective_address(datapath, operands.address(1)?)?;
    let value = datapath.lsu.read_memory(address, length, signed)?;
    datapath.lsu.write_register(dest, value);
    Ok(ExecuteOutcome::Advance)
}

fn store(
    datapath: &mut Datapath,
    operands: &Operands<'_>,
    length: usize,
) -> Result<ExecuteOutcome, RuntimeFault> {
    let value = datapath.lsu.read_register(operands.register(0)?);
    let address = effective_address(datapath, operands.address(1)?)?;
    datapath.lsu.write_memory(address, value, length)?;
    Ok(ExecuteOutcome::Advance)
}

/// Services 1 (print int), 4 (print string), 10 (exit) and 11 (print char).
fn syscall(datapath: &mut Datapath) -> Result<ExecuteOutcome, RuntimeFault> {
    let service = datapath.lsu.read_register(Register::V0).as_i32();
    match service {
        1 => {
            let value = datapath.lsu.read_register(Register::A0);
            datapath.console.push_str(&value.to_string());
        }
        4 => {
            let mut address = datapath.lsu.read_register(Register::A0).as_u32();
            loop {
                let byte = datapath.lsu.read_memory(address, 1, false)?.to_bytes()[3];
                if byte == 0 {
                    break;
                }
                datapath.console.push(char::from(byte));
                address = address.wrapping_add(1);
            }
        }
        10 => return Ok(ExecuteOutcome::Exit),
        11 => {
            let byte = datapath.lsu.read_register(Register::A0).to_bytes()[3];
            datapath.console.push(char::from(byte));
        }
        _ => return Err(RuntimeFault::UnsupportedSyscall { service }),
    }
    Ok(ExecuteOutcome::Advance)
}

/// Executes one statement against the datapath.
pub(crate) fn execute_statement(
    datapath: &mut Datapath,
    statement: &Statement,
) -> Result<ExecuteOutcome, RuntimeFault> {
    use Instruction as I;

    let operands = Operands {
        instruction: statement.instruction,
        list: &statement.operands,
    };
    let overflow = |value: Option<Word>| value.ok_or(RuntimeFault::ArithmeticOverflow);

    match statement.instruction {
        I::Nop => Ok(ExecuteOutcome::Advance),
        I::Syscall => syscall(datapath),
        I::Add | I::Addi => binary(datapath, &operands, |a, b| overflow(a.checked_add(b))),
        I::Sub => binary(datapath, &operands, |a, b| overflow(a.checked_sub(b))),
        I::Addu | I::Addiu => binary(datapath, &operands, |a, b| Ok(a.wrapping_add(b))),
        I::Subu => binary(datapath, &operands, |a, b| Ok(a.wrapping_sub(b))),
        I::Mul => binary(datapath, &operands, |a, b| Ok(a.wrapping_mul(b))),
        I::And | I::Andi => binary(datapath, &operands, bits(|a, b| a & b)),
        I::Or | I::Ori => binary(datapath, &operands, bits(|a, b| a | b)),
        I::Xor | I::Xori => binary(datapath, &operands, bits(|a, b| a ^ b)),
        I::Nor => binary(datapath, &operands, bits(|a, b| !(a | b))),
        I::Slt | I::Slti => binary(datapath, &operands, |a, b| Ok(flag(a < b))),
        I::Sltu => binary(datapath, &operands, |a, b| Ok(flag(a.as_u32() < b.as_u32()))),
        I::Sll => binary(datapath, &operands, |a, b| {
            Ok(Word::from_u32(a.as_u32() << (b.as_u32() & 31)))
        }),
        I::Srl => binary(datapath, &operands, |a, b| {
            Ok(Word::from_u32(a.as_u32() >> (b.as_u32() & 31)))
        }),
        I::Sra => binary(datapath, &operands, |a, b| {
            Ok(Word::new(a.as_i32() >> (b.as_u32() & 31)))
        }),
        I::Li => {
            let value = operands.immediate(1)?;
            datapath.lsu.write_register(operands.register(0)?, value);
            Ok(ExecuteOutcome::Advance)
        }
        I::Lui => {
            let value = Word::from_u32(operands.immediate(1)?.as_u32() << 16);
            datapath.lsu.write_register(operands.register(0)?, value);
            Ok(ExecuteOutcome::Advance)
        }
        I::La => {
            let address = effective_address(datapath, operands.address(1)?)?;
            datapath
                .lsu
                .write_register(operands.register(0)?, Word::from_u32(address));
            Ok(ExecuteOutcome::Advance)
        }
        I::Move => {
            let value = datapath.lsu.read_register(operands.register(1)?);
            datapath.lsu.write_register(operands.register(0)?, value);
            Ok(ExecuteOutcome::Advance)
        }
        I::Lw => load(datapath, &operands, 4, true),
        I::Lh => load(datapath, &operands, 2, true),
        I::Lb => load(datapath, &operands, 1, true),
        I::Lbu => load(datapath, &operands, 1, false),
        I::Sw => store(datapath, &operands, 4),
        I::Sh => store(datapath, &operands, 2),
        I::Sb => store(datapath, &operands, 1),
        I::Beq | I::Beqz => branch(datapath, &operands, |a, b| a == b),
        I::Bne | I::Bnez => branch(datapath, &operands, |a, b| a != b),
        I::Blt => branch(datapath, &operands, |a, b| a < b),
        I::Bgt => branch(datapath, &operands, |a, b| a > b),
        I::Ble => branch(datapath, &operands, |a, b| a <= b),
        I::Bge => branch(datapath, &operands, |a, b| a >= b),
        I::J | I::B => {
            let target = effective_address(datapath, operands.address(0)?)?;
            Ok(jump(datapath, target))
        }
        I::Jal => {
            let target = effective_address(datapath, operands.address(0)?)?;
            let link = datapath.cu.pc().wrapping_add(Word::new(4));
            datapath.lsu.write_register(Register::Ra, link);
            Ok(jump(datapath, target))
        }
        I::Jr => {
            let _ = datapath.lsu.read_register(operands.register(0)?);
            datapath.lsu.send_control_unit(&mut datapath.cu);
            datapath.cu.jump_to_data();
            Ok(ExecuteOutcome::Jumped)
        }
    }
}
