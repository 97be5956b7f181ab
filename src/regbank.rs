//! Register banks for the paired-GPC target
//!
//! Each source function programs two 128-register cores: the even-indexed
//! declaration core (constants and initial state, loaded once) and the
//! odd-indexed action core (per-iteration updates and branch tests). Name
//! and constant lookups are explicit per-core tables owned by the
//! allocator; there is no shared register state between cores beyond what
//! the action-core builder is handed explicitly.

use std::collections::HashMap;

/// Registers per core, fixed by the target fabric
pub const BANK_SLOTS: usize = 128;

/// Action-core slot reserved for the most recent loop condition
pub const LOOP_COND_SLOT: usize = 7;

/// Action-core slot reserved for the most recent if condition
pub const IF_COND_SLOT: usize = 8;

/// Register name an expression falls back to when its operand never
/// received a slot (capacity exhaustion or an unbound value)
pub const ABSENT_REG: &str = "r0";

/// Conventional register name for a slot index
pub fn reg_name(index: usize) -> String {
    format!("r{}", index)
}

/// One populated register
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSlot {
    pub index: usize,
    /// Bound variable or constant label; empty for zero-fill rows
    pub symbol: String,
    pub description: String,
    pub value: i64,
    /// Opcode text; empty means zero, unused
    pub opcode: String,
    /// How the value was composed from other registers
    pub combination: String,
    /// Branch ternary annotation on condition slots
    pub ternary: String,
}

impl RegisterSlot {
    /// Zero-fill row: value 0, no opcode, combination names the register
    /// itself.
    pub fn zero(index: usize) -> Self {
        RegisterSlot {
            index,
            symbol: String::new(),
            description: String::new(),
            value: 0,
            opcode: String::new(),
            combination: reg_name(index),
            ternary: String::new(),
        }
    }
}

/// A fixed 128-slot register bank belonging to one core
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterBank {
    pub core: usize,
    /// Owning source function
    pub function: String,
    slots: Vec<Option<RegisterSlot>>,
}

impl RegisterBank {
    pub fn new(core: usize, function: impl Into<String>) -> Self {
        RegisterBank {
            core,
            function: function.into(),
            slots: vec![None; BANK_SLOTS],
        }
    }

    /// Bind a slot, replacing any earlier occupant of the same index. The
    /// reserved condition slots rely on this overwrite behavior.
    pub fn bind(&mut self, slot: RegisterSlot) {
        let index = slot.index;
        debug_assert!(index < BANK_SLOTS);
        self.slots[index] = Some(slot);
    }

    pub fn slot(&self, index: usize) -> Option<&RegisterSlot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> impl Iterator<Item = Option<&RegisterSlot>> {
        self.slots.iter().map(Option::as_ref)
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Per-core lookup tables: variable → slot and constant → slot. The first
/// bind wins, which keeps both mappings injective within a bank.
#[derive(Debug, Default)]
pub struct SlotTable {
    vars: HashMap<String, usize>,
    consts: HashMap<i64, usize>,
}

impl SlotTable {
    pub fn var(&self, name: &str) -> Option<usize> {
        self.vars.get(name).copied()
    }

    pub fn bind_var(&mut self, name: &str, index: usize) {
        self.vars.entry(name.to_string()).or_insert(index);
    }

    pub fn constant(&self, value: i64) -> Option<usize> {
        self.consts.get(&value).copied()
    }

    pub fn bind_constant(&mut self, value: i64, index: usize) {
        self.consts.entry(value).or_insert(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_overwrites_index() {
        let mut bank = RegisterBank::new(1, "fibo");
        bank.bind(RegisterSlot {
            index: 7,
            symbol: "first".to_string(),
            description: String::new(),
            value: 1,
            opcode: String::new(),
            combination: String::new(),
            ternary: String::new(),
        });
        bank.bind(RegisterSlot {
            index: 7,
            symbol: "second".to_string(),
            description: String::new(),
            value: 2,
            opcode: String::new(),
            combination: String::new(),
            ternary: String::new(),
        });
        assert_eq!(bank.slot(7).unwrap().symbol, "second");
        assert_eq!(bank.occupied(), 1);
    }

    #[test]
    fn test_slot_table_first_bind_wins() {
        let mut table = SlotTable::default();
        table.bind_var("i", 0);
        table.bind_var("i", 5);
        assert_eq!(table.var("i"), Some(0));

        table.bind_constant(4, 9);
        table.bind_constant(4, 12);
        assert_eq!(table.constant(4), Some(9));
    }
}
