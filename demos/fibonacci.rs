//! Example: Fibonacci loop to a paired-GPC image
//!
//! Demonstrates the full pipeline on a bounded Fibonacci loop with an early
//! exit: structural extraction, IR reconciliation, register allocation and
//! image assembly.
//!
//! Run with: cargo run --example fibonacci

use c_to_eflow::{translate_source, BANK_SLOTS};

const SOURCE: &str = r#"
void fibo()
{
    int i    = 0;
    int iT   = 5;
    int cur  = 0;
    int curT = 10;
    int p0   = 1;
    int p1   = 0;

    for( i=0;i<iT; i=i+1) {
        cur = p0+p1;
        p1  = p0;
        p0  = cur;

        if(cur>curT) {
            break;
        }
    }
    return ;
}

int main(void) {
    fibo();
    return 0 ;
}
"#;

// The IR dump GCC emits for the same source (-fdump-tree-gimple)
const IR_DUMP: &str = r#"
fibo ()
{
  int i;
  int iT;
  int cur;
  int curT;
  int p0;
  int p1;

  i = 0;
  iT = 5;
  cur = 0;
  curT = 10;
  p0 = 1;
  p1 = 0;
  goto <D.1920>;
  <D.1919>:
  cur = p0 + p1;
  p1 = p0;
  p0 = cur;
  if (cur > curT) goto <D.1922>; else goto <D.1923>;
  <D.1922>:
  goto <D.1921>;
  <D.1923>:
  i = i + 1;
  <D.1920>:
  if (i < iT) goto <D.1919>; else goto <D.1921>;
  <D.1921>:
  return;
}
"#;

fn main() {
    println!("=== Fibonacci to paired-GPC image ===\n");

    let translation = translate_source(SOURCE, IR_DUMP).unwrap();

    println!("Functions: {}", translation.structured.functions.len());
    println!("Cores: {}", translation.banks.len());
    println!("Image words: {}\n", translation.image.data_line_count());

    // The loop bound iT and the if bound curT appear on the right of their
    // comparisons, so the declaration core carries them negated: the fabric
    // tests loop exits as sums against zero.
    let decl = &translation.banks[0];
    println!("Declaration core (GPC 0), bound registers:");
    for slot in decl.slots().flatten().take(9) {
        println!(
            "  r{:<3} {:<14} value {:<6} {}",
            slot.index, slot.description, slot.value, slot.opcode
        );
    }
    println!();

    let action = &translation.banks[1];
    println!("Action core (GPC 1), reserved branch-test slots:");
    for index in [7usize, 8] {
        if let Some(slot) = action.slot(index) {
            println!(
                "  r{:<3} {:<20} {:<36} {}",
                slot.index, slot.description, slot.combination, slot.opcode
            );
        }
    }
    println!();

    println!("Image excerpt (first declaration-core words):");
    for line in translation.image.lines().iter().skip(9).take(9) {
        println!("  {}", line);
    }
    println!("  ... {} words total", 2 * BANK_SLOTS);
}
