//! Register allocator and opcode synthesis
//!
//! Stage three of the pipeline. For the i-th structural function the
//! declaration core `2i` is populated first (initial values and literal
//! constants, loaded once), then the action core `2i+1` (per-iteration
//! updates and branch tests) is built against the finished declaration bank,
//! which it receives as an explicit input together with its lookup table.
//!
//! Values that appear only on the right side of a condition are carried
//! sign-flipped, so the fabric can test loop exits as sums against zero:
//! slot 7 holds the active loop condition as a greater-or-equal-to-zero
//! test, slot 8 the active if condition as a greater-than-zero test.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::TranslateError;
use crate::lexer::{Token, Tokens};
use crate::model::{RefinedBlock, RefinedFunction, RefinedProgram, StructuredProgram};
use crate::regbank::{
    reg_name, RegisterBank, RegisterSlot, SlotTable, ABSENT_REG, BANK_SLOTS, IF_COND_SLOT,
    LOOP_COND_SLOT,
};
use crate::stmt::{is_pseudo_constant, is_temporary, parse_assignment, Condition};

/// Allocated banks plus the recoverable diagnostics collected on the way
#[derive(Debug)]
pub struct Allocation {
    pub banks: Vec<RegisterBank>,
    pub diagnostics: Vec<TranslateError>,
}

/// Allocate both cores for every structural function, in document order.
pub fn allocate(structured: &StructuredProgram, refined: &RefinedProgram) -> Allocation {
    let mut banks = Vec::new();
    let mut diagnostics = Vec::new();

    for (i, func) in structured.functions.iter().enumerate() {
        let Some(rf) = refined.function(&func.function_name) else {
            diagnostics.push(TranslateError::unresolved(
                &func.function_name,
                "function missing from refined document; core pair left reserved",
            ));
            continue;
        };

        let decl_core = 2 * i;
        let mut decl_table = SlotTable::default();
        let decl = build_decl_core(rf, decl_core, &mut decl_table, &mut diagnostics);

        let mut action_table = SlotTable::default();
        let action = build_action_core(
            rf,
            decl_core + 1,
            &decl,
            &decl_table,
            &mut action_table,
            &mut diagnostics,
        );

        banks.push(decl);
        banks.push(action);
    }

    Allocation { banks, diagnostics }
}

// ------------------------------------------------------------------------
// Opcode encodings for the target fabric
// ------------------------------------------------------------------------

fn load_opcode(value: i64) -> String {
    format!("LXY(01f, {:08x})", value as u32)
}

fn const_opcode(value: i64) -> String {
    format!("LXY(01f,{:08x})", value as u32)
}

const OUTLOOP_OPCODE: &str = "LXY(01f,00000004)";
const LOOP_TEST_OPCODE: &str = "GEZ(01f, 00000004)";
const IF_TEST_OPCODE: &str = "GTZ(01f, 00000004)";

fn add_opcode(rhs: &str) -> String {
    let parts: Vec<&str> = split_sum(rhs);
    if parts.len() == 1 {
        if let Ok(v) = parts[0].parse::<i64>() {
            return format!("ADD(000,{:08x})", v as u32);
        }
    }
    "ADD(000, 00080000)".to_string()
}

// ------------------------------------------------------------------------
// Expression helpers
// ------------------------------------------------------------------------

fn split_sum(expr: &str) -> Vec<&str> {
    expr.split('+')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Identifiers appearing as the right operand of a condition; their carried
/// values are sign-flipped for consistency with the comparison direction.
fn rhs_negated(func: &RefinedFunction) -> HashSet<String> {
    let mut set = HashSet::new();
    for blk in func.blocks() {
        if let Some(cond) = Condition::parse(&blk.condition) {
            let toks = Tokens::lex(&cond.rhs);
            if toks.len() == 1 {
                if let Some(Token::Ident(name)) = toks.get(0) {
                    set.insert(name.clone());
                }
            }
        }
    }
    set
}

/// Distinct literals of the `var = var + <int>` pattern across every loop/if
/// body and increment, in ascending order.
fn additive_constants(func: &RefinedFunction) -> BTreeSet<i64> {
    let mut consts = BTreeSet::new();
    {
        let mut scan = |line: &str| {
            let Some((_, rhs)) = parse_assignment(line) else {
                return;
            };
            let toks = Tokens::lex(&rhs);
            if toks.len() == 3 && toks.get(1) == Some(&Token::Plus) {
                if let (Some(Token::Ident(_) | Token::Int(_)), Some(Token::Int(v))) =
                    (toks.get(0), toks.get(2))
                {
                    consts.insert(*v);
                }
            }
        };
        for blk in func.blocks() {
            if let Some(inc) = &blk.increment {
                scan(inc);
            }
            for line in &blk.body {
                scan(line);
            }
        }
    }
    consts
}

/// One-level substitution map: assignment and increment left sides whose
/// right side carries arithmetic, `lhs → rhs` text.
fn build_substitutions(func: &RefinedFunction) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for blk in &func.for_loops {
        for line in &blk.body {
            record_substitution(line, &mut map);
        }
    }
    for blk in func.blocks() {
        if let Some(inc) = &blk.increment {
            record_substitution(inc, &mut map);
        }
    }
    map
}

fn record_substitution(line: &str, map: &mut HashMap<String, String>) {
    if let Some((lhs, rhs)) = parse_assignment(line) {
        if rhs.contains('+') || rhs.contains('-') {
            map.insert(lhs, rhs.trim().to_string());
        }
    }
}

fn substitute(expr: &str, map: &HashMap<String, String>) -> String {
    map.get(expr.trim())
        .cloned()
        .unwrap_or_else(|| expr.trim().to_string())
}

fn signed_value(name: &str, vals: &HashMap<String, i64>, neg: &HashSet<String>) -> i64 {
    let v = vals.get(name).copied().unwrap_or(0);
    if neg.contains(name) {
        -v
    } else {
        v
    }
}

/// Evaluate a (substituted) right side against live values: a literal, a
/// variable, or a two-term sum. Literal terms inside a sum carry no live
/// value and evaluate to zero; the bound itself arrives through the
/// sign-flipped operand.
fn evaluate_rhs(rhs: &str, vals: &HashMap<String, i64>, neg: &HashSet<String>) -> i64 {
    let toks = Tokens::lex(rhs);
    match toks.len() {
        1 => match toks.get(0) {
            Some(Token::Int(v)) => *v,
            Some(Token::Ident(name)) => signed_value(name, vals, neg),
            _ => 0,
        },
        2 => match (toks.get(0), toks.get(1)) {
            (Some(Token::Minus), Some(Token::Int(v))) => -v,
            _ => 0,
        },
        3 if toks.get(1) == Some(&Token::Plus) => {
            let term = |tok: Option<&Token>| match tok {
                Some(Token::Ident(name)) => signed_value(name, vals, neg),
                _ => 0,
            };
            term(toks.get(0)) + term(toks.get(2))
        }
        _ => 0,
    }
}

/// Sum an expression's `+`-separated parts over live values; literal parts
/// count numerically here.
fn sum_parts(expr: &str, vals: &HashMap<String, i64>, neg: &HashSet<String>) -> i64 {
    split_sum(expr)
        .into_iter()
        .map(|part| {
            if let Ok(v) = part.parse::<i64>() {
                v
            } else {
                signed_value(part, vals, neg)
            }
        })
        .sum()
}

/// Register-combination text for an expression: each operand resolves in
/// this core's table, then the declaration core's, else the absent
/// placeholder.
fn combination_for(expr: &str, table: &SlotTable, decl_table: &SlotTable) -> String {
    let parts = split_sum(expr);
    if parts.is_empty() {
        return ABSENT_REG.to_string();
    }
    parts
        .into_iter()
        .map(|p| resolve_operand(p, table, decl_table))
        .collect::<Vec<_>>()
        .join("+")
}

fn resolve_operand(part: &str, table: &SlotTable, decl_table: &SlotTable) -> String {
    if let Ok(v) = part.parse::<i64>() {
        return table
            .constant(v)
            .or_else(|| decl_table.constant(v))
            .map(reg_name)
            .unwrap_or_else(|| ABSENT_REG.to_string());
    }
    table
        .var(part)
        .or_else(|| decl_table.var(part))
        .map(reg_name)
        .unwrap_or_else(|| ABSENT_REG.to_string())
}

fn cap(
    capped: &mut bool,
    diagnostics: &mut Vec<TranslateError>,
    function: &str,
    core: usize,
) {
    if !*capped {
        diagnostics.push(TranslateError::capacity(function, core));
        *capped = true;
    }
}

// ------------------------------------------------------------------------
// Declaration core
// ------------------------------------------------------------------------

fn build_decl_core(
    func: &RefinedFunction,
    core: usize,
    table: &mut SlotTable,
    diagnostics: &mut Vec<TranslateError>,
) -> RegisterBank {
    let has_loops = !func.for_loops.is_empty();
    let neg = rhs_negated(func);
    let mut bank = RegisterBank::new(core, &func.function_name);
    let mut capped = false;
    let mut idx = 0usize;

    // 1) initial variable values
    for (var, value) in func.initializations.iter() {
        if is_temporary(var) || (has_loops && is_pseudo_constant(var)) {
            continue;
        }
        if idx >= BANK_SLOTS {
            cap(&mut capped, diagnostics, &func.function_name, core);
            break;
        }
        let signed = if neg.contains(var) { -value } else { *value };
        table.bind_var(var, idx);
        bank.bind(RegisterSlot {
            index: idx,
            symbol: var.to_string(),
            description: format!("{} = {}", var, signed),
            value: signed,
            opcode: load_opcode(signed),
            combination: reg_name(idx),
            ternary: String::new(),
        });
        idx += 1;
    }

    // 2) additive constants, ascending
    for c in additive_constants(func) {
        if idx >= BANK_SLOTS {
            cap(&mut capped, diagnostics, &func.function_name, core);
            break;
        }
        if table.constant(c).is_some() {
            continue;
        }
        table.bind_constant(c, idx);
        bank.bind(RegisterSlot {
            index: idx,
            symbol: c.to_string(),
            description: c.to_string(),
            value: c,
            opcode: const_opcode(c),
            combination: reg_name(idx),
            ternary: String::new(),
        });
        idx += 1;
    }

    // 3) one outer-loop constant row per condition occurrence
    for blk in func.blocks() {
        if blk.condition.is_empty() {
            continue;
        }
        if idx >= BANK_SLOTS {
            cap(&mut capped, diagnostics, &func.function_name, core);
            break;
        }
        bank.bind(RegisterSlot {
            index: idx,
            symbol: "4 (outloop)".to_string(),
            description: "4 (outloop)".to_string(),
            value: 4,
            opcode: OUTLOOP_OPCODE.to_string(),
            combination: reg_name(idx),
            ternary: String::new(),
        });
        idx += 1;
    }

    // 4) zero-fill the rest
    for i in idx..BANK_SLOTS {
        bank.bind(RegisterSlot::zero(i));
    }
    bank
}

// ------------------------------------------------------------------------
// Action core
// ------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn build_action_core(
    func: &RefinedFunction,
    core: usize,
    decl_bank: &RegisterBank,
    decl_table: &SlotTable,
    table: &mut SlotTable,
    diagnostics: &mut Vec<TranslateError>,
) -> RegisterBank {
    let subst = build_substitutions(func);
    let neg = rhs_negated(func);
    let mut vals: HashMap<String, i64> = HashMap::new();
    let mut bank = RegisterBank::new(core, &func.function_name);
    let mut capped = false;
    let mut next_idx = 0usize;

    // 1) carry initialized variables forward at their declaration indices
    for (var, value) in func.initializations.iter() {
        if is_temporary(var) || is_pseudo_constant(var) {
            continue;
        }
        let signed = if neg.contains(var) { -value } else { *value };
        vals.insert(var.to_string(), signed);
        if let Some(idx) = decl_table.var(var) {
            table.bind_var(var, idx);
            if let Some(src) = decl_bank.slot(idx) {
                bank.bind(RegisterSlot {
                    index: idx,
                    symbol: var.to_string(),
                    description: format!("{} = {}", var, src.value),
                    value: src.value,
                    opcode: src.opcode.clone(),
                    combination: src.combination.clone(),
                    ternary: String::new(),
                });
            }
        }
        next_idx += 1;
    }

    // 2) increments, loops then ifs
    for blk in func.blocks() {
        let Some(inc) = &blk.increment else { continue };
        let Some((lhs, rhs)) = parse_assignment(inc) else {
            continue;
        };
        let rhs_exp = substitute(&rhs, &subst);
        let value = evaluate_rhs(&rhs_exp, &vals, &neg);
        vals.insert(lhs.clone(), value);

        let idx = match table.var(&lhs) {
            Some(idx) => idx,
            None => {
                if next_idx >= BANK_SLOTS {
                    cap(&mut capped, diagnostics, &func.function_name, core);
                    continue;
                }
                table.bind_var(&lhs, next_idx);
                next_idx += 1;
                next_idx - 1
            }
        };
        bank.bind(RegisterSlot {
            index: idx,
            symbol: lhs.clone(),
            description: format!("{} = {}", lhs, rhs_exp),
            value,
            opcode: add_opcode(&rhs_exp),
            combination: combination_for(&rhs_exp, table, decl_table),
            ternary: String::new(),
        });
    }

    // 3) loop-body assignments; a first-seen variable starts live at zero
    for blk in &func.for_loops {
        for line in &blk.body {
            let Some((lhs, rhs)) = parse_assignment(line) else {
                continue;
            };
            if !vals.contains_key(&lhs) {
                vals.insert(lhs.clone(), 0);
                if next_idx >= BANK_SLOTS {
                    cap(&mut capped, diagnostics, &func.function_name, core);
                } else {
                    table.bind_var(&lhs, next_idx);
                    next_idx += 1;
                }
            }
            let rhs_exp = substitute(&rhs, &subst);
            let value = evaluate_rhs(&rhs_exp, &vals, &neg);
            vals.insert(lhs.clone(), value);

            let Some(idx) = table.var(&lhs) else { continue };
            bank.bind(RegisterSlot {
                index: idx,
                symbol: lhs.clone(),
                description: format!("{} = {}", lhs, rhs_exp),
                value,
                opcode: add_opcode(&rhs_exp),
                combination: combination_for(&rhs_exp, table, decl_table),
                ternary: String::new(),
            });
        }
    }

    // 4) branch tests at the reserved slots
    for blk in &func.for_loops {
        bind_condition(blk, true, &subst, &vals, table, decl_table, &mut bank);
    }
    for blk in &func.if_stmts {
        bind_condition(blk, false, &subst, &vals, table, decl_table, &mut bank);
    }

    // 5) constant top-up for literals not yet bound in this core
    for c in additive_constants(func) {
        if next_idx >= BANK_SLOTS {
            cap(&mut capped, diagnostics, &func.function_name, core);
            break;
        }
        if table.constant(c).is_some() {
            continue;
        }
        table.bind_constant(c, next_idx);
        bank.bind(RegisterSlot {
            index: next_idx,
            symbol: c.to_string(),
            description: c.to_string(),
            value: c,
            opcode: const_opcode(c),
            combination: reg_name(next_idx),
            ternary: String::new(),
        });
        next_idx += 1;
    }

    // 6) zero-fill; slots 7 and 8 stay reserved even without conditions
    for i in 0..BANK_SLOTS {
        if i == LOOP_COND_SLOT || i == IF_COND_SLOT {
            continue;
        }
        if bank.slot(i).is_none() {
            bank.bind(RegisterSlot::zero(i));
        }
    }
    bank
}

fn bind_condition(
    blk: &RefinedBlock,
    is_loop: bool,
    subst: &HashMap<String, String>,
    vals: &HashMap<String, i64>,
    table: &SlotTable,
    decl_table: &SlotTable,
    bank: &mut RegisterBank,
) {
    let Some(cond) = Condition::parse(&blk.condition) else {
        return;
    };
    let lhs_exp = substitute(&cond.lhs, subst);
    let rhs_exp = substitute(&cond.rhs, subst);
    let regs = combination_for(&format!("{}+{}", lhs_exp, rhs_exp), table, decl_table);

    // The test value sums both sides over live values, with no sign flip on
    // this particular sum.
    let no_neg = HashSet::new();
    let value = sum_parts(&lhs_exp, vals, &no_neg) + sum_parts(&rhs_exp, vals, &no_neg);

    let (slot, sign, opcode) = if is_loop {
        (LOOP_COND_SLOT, ">=", LOOP_TEST_OPCODE)
    } else {
        (IF_COND_SLOT, ">", IF_TEST_OPCODE)
    };
    let label = format!("{}+{} {} 0", lhs_exp, rhs_exp, sign);
    bank.bind(RegisterSlot {
        index: slot,
        symbol: label.clone(),
        description: label,
        value,
        opcode: opcode.to_string(),
        combination: format!("({}) {} 0 ? outL:inL", regs, sign),
        ternary: "? outL:inL".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FunctionRecord, OrderedMap};

    fn structural_stub(name: &str) -> StructuredProgram {
        StructuredProgram {
            global_variable: Default::default(),
            functions: vec![FunctionRecord {
                function_name: name.to_string(),
                initializations: OrderedMap::new(),
                body: vec![],
                for_loops: vec![],
                if_stmts: vec![],
            }],
        }
    }

    fn refined(name: &str, func: RefinedFunction) -> RefinedProgram {
        let mut func = func;
        func.function_name = name.to_string();
        RefinedProgram {
            global_variables: Default::default(),
            functions: vec![func],
        }
    }

    fn accumulate_function() -> RefinedFunction {
        let mut func = RefinedFunction::new("accumulate");
        func.initializations.insert("i", 0);
        func.initializations.insert("n", 10);
        func.for_loops.push(RefinedBlock {
            variable: "i".to_string(),
            condition: "i < n".to_string(),
            increment: Some("i = i + 1".to_string()),
            body: vec!["sum = sum + i;".to_string()],
        });
        func
    }

    #[test]
    fn test_declaration_core_layout() {
        let structured = structural_stub("accumulate");
        let refined = refined("accumulate", accumulate_function());
        let allocation = allocate(&structured, &refined);
        assert!(allocation.diagnostics.is_empty());

        let decl = &allocation.banks[0];
        assert_eq!(decl.core, 0);
        assert_eq!(decl.slot(0).unwrap().symbol, "i");
        assert_eq!(decl.slot(0).unwrap().value, 0);
        // n sits right of the comparison, so its value is carried negated
        assert_eq!(decl.slot(1).unwrap().symbol, "n");
        assert_eq!(decl.slot(1).unwrap().value, -10);
        assert_eq!(decl.slot(1).unwrap().opcode, "LXY(01f, fffffff6)");
        // increment literal 1, then the outer-loop constant
        assert_eq!(decl.slot(2).unwrap().value, 1);
        assert_eq!(decl.slot(3).unwrap().symbol, "4 (outloop)");
        // everything else is a zero row
        assert_eq!(decl.slot(4).unwrap().value, 0);
        assert_eq!(decl.slot(4).unwrap().opcode, "");
        assert_eq!(decl.occupied(), BANK_SLOTS);
    }

    #[test]
    fn test_action_core_carries_same_indices() {
        let structured = structural_stub("accumulate");
        let refined = refined("accumulate", accumulate_function());
        let allocation = allocate(&structured, &refined);

        let decl = &allocation.banks[0];
        let action = &allocation.banks[1];
        assert_eq!(action.core, 1);
        for var in ["i", "n"] {
            let d = decl
                .slots()
                .flatten()
                .find(|s| s.symbol == var)
                .unwrap()
                .index;
            let a = action
                .slots()
                .flatten()
                .find(|s| s.symbol == var)
                .unwrap()
                .index;
            assert_eq!(d, a, "{} must keep its register across cores", var);
        }
        // sum is first assigned in the loop body and lands after the carries
        let sum = action.slots().flatten().find(|s| s.symbol == "sum").unwrap();
        assert_eq!(sum.index, 2);
        assert_eq!(sum.combination, "r2+r0");
    }

    #[test]
    fn test_loop_condition_slot() {
        let structured = structural_stub("accumulate");
        let refined = refined("accumulate", accumulate_function());
        let allocation = allocate(&structured, &refined);

        let action = &allocation.banks[1];
        let cond = action.slot(LOOP_COND_SLOT).unwrap();
        assert_eq!(cond.opcode, "GEZ(01f, 00000004)");
        assert_eq!(cond.ternary, "? outL:inL");
        // lhs expands one level through the increment: i → i + 1
        assert_eq!(cond.description, "i + 1+n >= 0");
        // i and n live in both cores; the literal 1 resolves to the
        // declaration core's constant register
        assert_eq!(cond.combination, "(r0+r2+r1) >= 0 ? outL:inL");
        // i(0) + 1 + n(-10)
        assert_eq!(cond.value, -9);
        // no if statement: slot 8 stays reserved and unbound
        assert!(action.slot(IF_COND_SLOT).is_none());
    }

    #[test]
    fn test_new_additive_constant_gets_register() {
        let mut func = RefinedFunction::new("step");
        func.initializations.insert("x", 0);
        func.for_loops.push(RefinedBlock {
            variable: "x".to_string(),
            condition: "x < 20".to_string(),
            increment: Some("x = x + 4".to_string()),
            body: vec![],
        });
        let structured = structural_stub("step");
        let refined = refined("step", func);
        let allocation = allocate(&structured, &refined);

        let decl = &allocation.banks[0];
        let four = decl.slots().flatten().find(|s| s.symbol == "4").unwrap();
        assert_eq!(four.value, 4);
        assert_eq!(four.opcode, "LXY(01f,00000004)");

        // and the action core tops the same literal up for itself
        let action = &allocation.banks[1];
        let topped = action.slots().flatten().find(|s| s.symbol == "4").unwrap();
        assert_eq!(topped.value, 4);
    }

    #[test]
    fn test_capacity_overflow_drops_excess_constants() {
        let mut func = RefinedFunction::new("huge");
        let body: Vec<String> = (1..=130).map(|k| format!("x = x + {};", k)).collect();
        func.for_loops.push(RefinedBlock {
            variable: "x".to_string(),
            condition: String::new(),
            increment: None,
            body,
        });
        let structured = structural_stub("huge");
        let refined = refined("huge", func);
        let allocation = allocate(&structured, &refined);

        let decl = &allocation.banks[0];
        assert_eq!(decl.occupied(), BANK_SLOTS);
        // constants 1..=128 bound ascending; 129 and 130 dropped
        assert_eq!(decl.slot(127).unwrap().value, 128);
        assert!(allocation
            .diagnostics
            .iter()
            .any(|d| matches!(d, TranslateError::RegisterCapacityExceeded { function, core }
                if function == "huge" && *core == 0)));

        // a reference to a dropped constant resolves to the absent register
        let action = &allocation.banks[1];
        let x = action.slots().flatten().find(|s| s.symbol == "x").unwrap();
        assert_eq!(x.description, "x = x + 130");
        assert_eq!(x.combination, "r0+r0");
    }

    #[test]
    fn test_no_control_flow_boundary() {
        let mut func = RefinedFunction::new("plain");
        func.initializations.insert("a", 1);
        func.initializations.insert("h3", 7);
        func.initializations.insert("b", 2);
        let structured = structural_stub("plain");
        let refined = refined("plain", func);
        let allocation = allocate(&structured, &refined);

        // without loops, pseudo-constants keep their declaration slot
        let decl = &allocation.banks[0];
        assert_eq!(decl.slot(0).unwrap().symbol, "a");
        assert_eq!(decl.slot(1).unwrap().symbol, "h3");
        assert_eq!(decl.slot(2).unwrap().symbol, "b");
        for i in 3..BANK_SLOTS {
            let slot = decl.slot(i).unwrap();
            assert_eq!((slot.value, slot.opcode.as_str()), (0, ""));
        }

        // the action core skips them but keeps the carried indices
        let action = &allocation.banks[1];
        assert_eq!(action.slot(0).unwrap().symbol, "a");
        assert_eq!(action.slot(2).unwrap().symbol, "b");
        assert!(action.slot(LOOP_COND_SLOT).is_none());
        assert!(action.slot(IF_COND_SLOT).is_none());
        assert_eq!(action.occupied(), BANK_SLOTS - 2);
    }

    #[test]
    fn test_variable_slots_are_injective() {
        let structured = structural_stub("accumulate");
        let refined = refined("accumulate", accumulate_function());
        let allocation = allocate(&structured, &refined);

        for bank in &allocation.banks {
            let mut seen = HashMap::new();
            for slot in bank.slots().flatten() {
                if slot.symbol.is_empty() || slot.symbol.parse::<i64>().is_ok() {
                    continue;
                }
                if let Some(prev) = seen.insert(slot.symbol.clone(), slot.index) {
                    assert_eq!(
                        prev, slot.index,
                        "{} bound to two slots in core {}",
                        slot.symbol, bank.core
                    );
                }
            }
        }
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let structured = structural_stub("accumulate");
        let refined = refined("accumulate", accumulate_function());
        let first = allocate(&structured, &refined);
        let second = allocate(&structured, &refined);
        assert_eq!(first.banks, second.banks);
    }
}
