//! C to eFlow Translator
//!
//! This library compiles a restricted C dialect into a memory-initialization
//! image for a spatial execution fabric that runs each source function on a
//! pair of 128-register general-purpose cores: the even core holds constants
//! and initial state, the odd core the per-iteration actions and branch
//! tests.
//!
//! The pipeline has three stages: structural extraction over the C text,
//! reconciliation against the low-level IR dump the optimizing toolchain
//! produced for the same source, and register allocation with opcode
//! synthesis. Only facts both views agree on reach the image.
//!
//! # Example
//!
//! ```rust
//! use c_to_eflow::translate_source;
//!
//! let source = r#"
//! void count()
//! {
//!     int i  = 0;
//!     int iT = 3;
//!     for( i=0;i<iT; i=i+1) {
//!     }
//! }
//!
//! int main(void) {
//!     count();
//!     return 0 ;
//! }
//! "#;
//!
//! let ir = r#"
//! count ()
//! {
//!   i = 0;
//!   iT = 3;
//!   goto <D.2>;
//!   <D.1>:
//!   i = i + 1;
//!   <D.2>:
//!   if (i < iT) goto <D.1>; else goto <D.3>;
//!   <D.3>:
//!   return;
//! }
//! "#;
//!
//! let translation = translate_source(source, ir).unwrap();
//! assert_eq!(translation.image.data_line_count(), 256);
//! ```

pub mod allocator;
pub mod error;
pub mod extractor;
pub mod image;
pub mod lexer;
pub mod model;
pub mod reconciler;
pub mod regbank;
pub mod stmt;

pub use allocator::{allocate, Allocation};
pub use error::{TranslateError, TranslateResult};
pub use extractor::extract;
pub use image::MemoryImage;
pub use model::{RefinedProgram, StructuredProgram};
pub use reconciler::{reconcile, Reconciliation};
pub use regbank::{RegisterBank, RegisterSlot, BANK_SLOTS};

/// Everything one run produces: both documents, the allocated banks, the
/// rendered image and the recoverable diagnostics collected along the way.
#[derive(Debug)]
pub struct Translation {
    pub structured: StructuredProgram,
    pub refined: RefinedProgram,
    pub banks: Vec<RegisterBank>,
    pub image: MemoryImage,
    pub diagnostics: Vec<TranslateError>,
}

/// Run reconciliation and allocation over an already-extracted structured
/// document (e.g. loaded from JSON) plus the low-level IR text.
pub fn translate_documents(
    structured: StructuredProgram,
    ir_text: &str,
) -> TranslateResult<Translation> {
    let reconciled = reconciler::reconcile(&structured, ir_text)?;
    let allocation = allocator::allocate(&structured, &reconciled.program);
    let image = MemoryImage::assemble(&allocation.banks);

    let mut diagnostics = reconciled.diagnostics;
    diagnostics.extend(allocation.diagnostics);

    Ok(Translation {
        structured,
        refined: reconciled.program,
        banks: allocation.banks,
        image,
        diagnostics,
    })
}

/// Full pipeline: C source text plus the matching IR dump.
pub fn translate_source(source: &str, ir_text: &str) -> TranslateResult<Translation> {
    let structured = extractor::extract(source)?;
    translate_documents(structured, ir_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIBO_SOURCE: &str = r#"
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

    const FIBO_IR: &str = r#"
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

    #[test]
    fn test_end_to_end_fibonacci() {
        let translation = translate_source(FIBO_SOURCE, FIBO_IR).unwrap();
        assert!(translation.diagnostics.is_empty());
        assert_eq!(translation.banks.len(), 2);
        assert_eq!(translation.image.data_line_count(), 2 * BANK_SLOTS);

        // Declaration core: six initialized variables, the increment
        // literal, two outer-loop rows
        let decl = &translation.banks[0];
        let symbols: Vec<_> = (0..6)
            .map(|i| decl.slot(i).unwrap().symbol.clone())
            .collect();
        assert_eq!(symbols, vec!["i", "iT", "cur", "curT", "p0", "p1"]);
        // iT and curT sit right of comparisons and carry negated values
        assert_eq!(decl.slot(1).unwrap().value, -5);
        assert_eq!(decl.slot(3).unwrap().value, -10);
        assert_eq!(decl.slot(6).unwrap().value, 1);
        assert_eq!(decl.slot(7).unwrap().symbol, "4 (outloop)");
        assert_eq!(decl.slot(8).unwrap().symbol, "4 (outloop)");

        // Action core: both branch tests live in their reserved slots
        let action = &translation.banks[1];
        let loop_test = action.slot(7).unwrap();
        assert_eq!(loop_test.opcode, "GEZ(01f, 00000004)");
        let if_test = action.slot(8).unwrap();
        assert_eq!(if_test.opcode, "GTZ(01f, 00000004)");
        assert_eq!(if_test.description, "p0 + p1+curT > 0");
    }

    #[test]
    fn test_addresses_cover_every_slot_without_gaps() {
        let translation = translate_source(FIBO_SOURCE, FIBO_IR).unwrap();
        let words = translation.image.words();
        assert_eq!(words.len(), 2 * BANK_SLOTS);
        for (i, (addr, _)) in words.iter().enumerate() {
            assert_eq!(*addr, i);
        }
    }

    #[test]
    fn test_image_words_round_trip_values() {
        let translation = translate_source(FIBO_SOURCE, FIBO_IR).unwrap();
        for bank in &translation.banks {
            for slot in bank.slots().flatten() {
                let (_, word) = translation.image.words()[bank.core * BANK_SLOTS + slot.index];
                assert_eq!(word, slot.value as u32);
            }
        }
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let first = translate_source(FIBO_SOURCE, FIBO_IR).unwrap();
        let second = translate_source(FIBO_SOURCE, FIBO_IR).unwrap();
        assert_eq!(first.image.render(), second.image.render());
        assert_eq!(first.banks, second.banks);
    }

    #[test]
    fn test_structured_document_json_feeds_pipeline() {
        let structured = extract(FIBO_SOURCE).unwrap();
        let json = structured.to_json().unwrap();
        let reloaded = StructuredProgram::from_json(&json).unwrap();

        let from_source = translate_source(FIBO_SOURCE, FIBO_IR).unwrap();
        let from_json = translate_documents(reloaded, FIBO_IR).unwrap();
        assert_eq!(from_source.image.render(), from_json.image.render());
    }
}
