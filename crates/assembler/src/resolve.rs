//! Label resolution, run once after extraction.

use std::collections::HashMap;

use mipsim_core::{LabelTarget, Operand, Problem, ProblemLog, Program};

/// Points every label reference in the text segment at its entry.
///
/// References to names bound in neither segment are logged against the
/// statement's line and left unresolved. Returns how many were left.
pub fn resolve_labels(program: &mut Program, problems: &mut ProblemLog) -> usize {
    let targets: HashMap<String, LabelTarget> = program
        .text()
        .labels()
        .iter()
        .map(|(name, index)| (name.clone(), LabelTarget::Text(*index)))
        .chain(
            program
                .data()
                .labels()
                .iter()
                .map(|(name, index)| (name.clone(), LabelTarget::Data(*index))),
        )
        .collect();

    let mut unresolved = 0;
    for statement in program.statements_mut() {
        for operand in &mut statement.operands {
            let Operand::Address(address) = operand else {
                continue;
            };
            let Some(label) = &address.label else {
                continue;
            };
            match targets.get(label) {
                Some(target) => address.target = Some(*target),
                None => {
                    unresolved += 1;
                    problems.log(Problem::maybe_at_line(
                        format!("the label \"{label}\" is not defined"),
                        statement.line,
                    ));
                }
            }
        }
    }
    tracing::debug!(references = targets.len(), unresolved, "labels resolved");
    unresolved
}
