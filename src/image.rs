//! Memory-initialization image assembly
//!
//! Lays every register bank out at sequential addresses
//! (`core * 128 + slot`) and renders the `.mif` artifact the fabric tooling
//! consumes: fixed header fields, one annotated data line per register slot,
//! `END;` footer. Every data line carries the dialect's `--` prefix; the
//! consuming tooling reads the annotations, so the prefix and field widths
//! are preserved exactly.

use std::collections::BTreeMap;

use crate::regbank::{reg_name, RegisterBank, RegisterSlot, BANK_SLOTS};

/// The assembled image: rendered lines plus the raw words behind them
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryImage {
    lines: Vec<String>,
    words: Vec<(usize, u32)>,
}

impl MemoryImage {
    /// Assemble an image covering core 0 up to the highest allocated core.
    /// Cores without a bank stay reserved: 128 zero words each.
    pub fn assemble(banks: &[RegisterBank]) -> MemoryImage {
        let by_core: BTreeMap<usize, &RegisterBank> =
            banks.iter().map(|bank| (bank.core, bank)).collect();
        let max_core = by_core.keys().next_back().copied();

        let mut lines = Vec::new();
        let mut words = Vec::new();
        let Some(max_core) = max_core else {
            return MemoryImage { lines, words };
        };

        for core in 0..=max_core {
            let bank = by_core.get(&core).copied();
            lines.extend(header_block(core, bank));
            for slot in 0..BANK_SLOTS {
                let addr = core * BANK_SLOTS + slot;
                match bank.and_then(|b| b.slot(slot)) {
                    Some(slot) => {
                        words.push((addr, slot.value as u32));
                        lines.push(data_line(addr, core, slot));
                    }
                    None => {
                        words.push((addr, 0));
                        lines.push(reserved_line(addr, slot));
                    }
                }
            }
        }

        MemoryImage { lines, words }
    }

    /// All body lines (headers and data) in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// One `(address, word)` pair per register slot, in address order.
    pub fn words(&self) -> &[(usize, u32)] {
        &self.words
    }

    pub fn data_line_count(&self) -> usize {
        self.words.len()
    }

    /// Render the complete `.mif` text.
    pub fn render(&self) -> String {
        let mut out = String::from(
            "DEPTH = 8192;\nWIDTH = 32;\nADDRESS_RADIX = DEC;\nDATA_RADIX = HEX;\nCONTENT\nBEGIN\n",
        );
        out.push_str(&self.lines.join("\n"));
        out.push_str("\nEND;\n");
        out
    }
}

fn data_line(addr: usize, core: usize, slot: &RegisterSlot) -> String {
    format!(
        "--{:<5}:{:<10}; -- {:<4} {:<30} {:<20} {:<22} {:<6} GPC={}",
        addr,
        format!("{:08x}", slot.value as u32),
        reg_name(slot.index),
        slot.description,
        slot.combination,
        slot.opcode,
        slot.value,
        core,
    )
}

fn reserved_line(addr: usize, slot: usize) -> String {
    format!("--{:<5}:00000000; -- r{:<4}", addr, slot)
}

/// Architecture documentation emitted ahead of each core's slots, keyed by
/// core parity: even cores load constants (LXY), odd cores run the
/// per-iteration adds and branch tests.
fn header_block(core: usize, bank: Option<&RegisterBank>) -> Vec<String> {
    let role = if core % 2 == 0 { "init" } else { "action" };
    let title = match bank {
        Some(bank) => format!("-- GPC {} -- {} -- {}", core, bank.function, role),
        None => format!("-- GPC {} -- {}", core, role),
    };

    let mut block = vec![title];
    if core % 2 == 0 {
        block.push("-- LXY(z[k], y[k]), y[127]=32'h00000000, y[126]=32'h00000000,".to_string());
        block.push(
            "-- z[k]=12'b{HI, LP_YXA, C_TYPE} = 12'b{10 ,00_000, 1_1111} = 12'h{01f}".to_string(),
        );
    } else {
        block.push("-- ADD(z[k], y[k]),  y[127]= 32'h80000000, y[126]= 32'h00000000,".to_string());
        block.push(
            "-- z(k)= 12'b{HI, LP_YXA, C_TYPE} = 12'b{10 ,00_000, 0_0010} = 12'h{802}, ADD-> GTZ"
                .to_string(),
        );
    }
    block.push(
        "-- Each character in {HI, LP_YXA, C_TYPE} except '_' represents control-bits".to_string(),
    );
    block.push("-- y[127][31] means branch-indicator if (loopen_1d==1)".to_string());
    block.push("-- y[127][30] means branch-indicator if (loopen_2d==1)".to_string());
    block.push(
        "-- y[127][15:0] means loopin_offset_1d/loopin_offset_2d if triggered by loopen_1d/loopen_2d"
            .to_string(),
    );
    block.push("-- y[126][31:0] means return address when return initiated".to_string());
    block
}
