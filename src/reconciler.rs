//! Low-level IR reconciler
//!
//! Stage two of the pipeline. The structural pass has better static typing;
//! the low-level IR (a GCC GIMPLE dump produced alongside the same source)
//! has better constant-propagation accuracy and explicit control flow. This
//! stage walks the IR as an ordered sequence of statement lines and trusts
//! only the intersection of the two views: initializations are promoted when
//! both sides agree, and every two-way branch is classified as a for-loop or
//! an if-statement through the structural condition index.

use std::collections::HashMap;

use crate::error::{TranslateError, TranslateResult};
use crate::model::{
    GlobalInit, Literal, RefinedBlock, RefinedFunction, RefinedProgram, StructuredProgram,
};
use crate::stmt::{normalize_increment, CondKey, Condition, Stmt, BREAK_MARKER};

/// Refined program plus the recoverable diagnostics collected on the way
#[derive(Debug)]
pub struct Reconciliation {
    pub program: RefinedProgram,
    pub diagnostics: Vec<TranslateError>,
}

/// Loop-condition index: (function, structured condition key) → raw
/// structural increment text. If-statements carry no increment, so branch
/// classification reduces to a hit or miss in this one index.
type LoopIndex = HashMap<(String, CondKey), String>;

fn build_loop_index(structured: &StructuredProgram) -> LoopIndex {
    let mut index = LoopIndex::new();
    for func in &structured.functions {
        for lp in &func.for_loops {
            if let Some(cond) = Condition::parse(&lp.condition) {
                index.insert(
                    (func.function_name.clone(), cond.key()),
                    lp.increment.clone(),
                );
            }
        }
    }
    index
}

/// Reconcile the structured document against the low-level IR text.
///
/// Fails with `MalformedIr` when the text contains no function-entry
/// marker. Functions present in the IR but absent from the structured
/// document, and branches whose labels do not resolve, are skipped with an
/// `UnresolvedReference` diagnostic.
pub fn reconcile(
    structured: &StructuredProgram,
    ir_text: &str,
) -> TranslateResult<Reconciliation> {
    let lines: Vec<String> = ir_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    let stmts: Vec<Stmt> = lines.iter().map(|line| Stmt::parse(line)).collect();
    let loop_index = build_loop_index(structured);

    let mut globals = structured.global_variable.clone();
    let mut functions: Vec<RefinedFunction> = Vec::new();
    let mut diagnostics: Vec<TranslateError> = Vec::new();
    let mut current: Option<RefinedFunction> = None;
    let mut structural_of_current = None;

    for (i, stmt) in stmts.iter().enumerate() {
        if let Stmt::FunctionEntry { name } = stmt {
            if let Some(done) = current.take() {
                functions.push(done);
            }
            structural_of_current = structured.function(name);
            if structural_of_current.is_none() {
                diagnostics.push(TranslateError::unresolved(
                    name,
                    "function missing from structured document",
                ));
            }
            current = Some(RefinedFunction::new(name.clone()));
            continue;
        }

        let Some(func) = current.as_mut() else {
            // Outside any function: the IR may restate or extend globals.
            match stmt {
                Stmt::Declaration { name } => globals.declare(name),
                Stmt::LiteralAssignment { name, value } => {
                    globals.initialize(name, GlobalInit::Scalar(Literal::Int(*value)))
                }
                _ => {}
            }
            continue;
        };

        let line_idx = func.all_lines.len();
        func.all_lines.push((line_idx, lines[i].clone()));

        match stmt {
            Stmt::LiteralAssignment { name, value } => {
                // Promote only when the structural pass declares the same
                // variable with a non-null literal.
                let confirmed = structural_of_current
                    .and_then(|s| s.initializations.get(name))
                    .is_some_and(Option::is_some);
                if confirmed {
                    func.initializations.insert(name.clone(), *value);
                }
            }
            Stmt::BranchCondition {
                condition,
                true_label,
                false_label,
            } => {
                match resolve_branch(
                    &func.function_name,
                    condition,
                    true_label,
                    false_label,
                    &lines,
                    &stmts,
                    &loop_index,
                ) {
                    Ok((BlockKind::Loop, block)) => func.for_loops.push(block),
                    Ok((BlockKind::If, block)) => func.if_stmts.push(block),
                    Err(diag) => diagnostics.push(diag),
                }
            }
            _ => {}
        }
    }

    if let Some(done) = current.take() {
        functions.push(done);
    }
    if functions.is_empty() {
        return Err(TranslateError::malformed_ir(
            "no function entry marker found",
        ));
    }

    Ok(Reconciliation {
        program: RefinedProgram {
            global_variables: globals,
            functions,
        },
        diagnostics,
    })
}

enum BlockKind {
    Loop,
    If,
}

fn resolve_branch(
    function: &str,
    condition: &str,
    true_label: &str,
    false_label: &str,
    lines: &[String],
    stmts: &[Stmt],
    loop_index: &LoopIndex,
) -> Result<(BlockKind, RefinedBlock), TranslateError> {
    let true_idx = label_position(stmts, true_label).ok_or_else(|| {
        TranslateError::unresolved(function, format!("branch label {} not found", true_label))
    })?;
    if label_position(stmts, false_label).is_none() {
        return Err(TranslateError::unresolved(
            function,
            format!("branch label {} not found", false_label),
        ));
    }

    let increment = Condition::parse(condition)
        .map(|cond| cond.normalized_key())
        .and_then(|key| loop_index.get(&(function.to_string(), key)));

    let variable =
        Condition::first_identifier(condition).unwrap_or_else(|| "unknown".to_string());
    let body = branch_body(lines, stmts, true_idx, false_label);

    let block = RefinedBlock {
        variable,
        condition: condition.to_string(),
        increment: increment.map(|inc| normalize_increment(inc)),
        body,
    };
    let kind = if block.increment.is_some() {
        BlockKind::Loop
    } else {
        BlockKind::If
    };
    Ok((kind, block))
}

fn label_position(stmts: &[Stmt], label: &str) -> Option<usize> {
    stmts
        .iter()
        .position(|s| matches!(s, Stmt::Label { name } if name == label))
}

/// Body = lines strictly after the true label, up to the false label or the
/// next branch. Temporary re-declarations are dropped; an unconditional jump
/// anywhere but the false label means the block is being exited early and
/// becomes the break marker.
fn branch_body(
    lines: &[String],
    stmts: &[Stmt],
    true_idx: usize,
    false_label: &str,
) -> Vec<String> {
    let mut body = Vec::new();
    for k in (true_idx + 1)..lines.len() {
        match &stmts[k] {
            Stmt::Label { name } if name == false_label => break,
            Stmt::BranchCondition { .. } => break,
            Stmt::TemporaryDeclaration { .. } => {}
            Stmt::Goto { target } if target != false_label => {
                body.push(BREAK_MARKER.to_string());
            }
            _ => body.push(lines[k].clone()),
        }
    }
    body
}
