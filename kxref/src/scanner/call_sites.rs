//! Direct call-site discovery in x86-64 machine code
//!
//! Decodes a function body instruction by instruction and keeps every
//! `call rel32`, identified by its decoded relative operand rather than by
//! raw bytes. Indirect calls have no static target and are skipped;
//! retpoline builds route them through `__x86_indirect_thunk_*`, which
//! shows up as a direct call anyway.

use yaxpeax_arch::{DecodeError as _, Decoder, Reader, U8Reader};
use yaxpeax_x86::amd64::{InstDecoder, Opcode, Operand};

/// One direct call: the instruction at `calling_offset` targets
/// `callee_offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub calling_offset: u64,
    pub callee_offset: u64,
}

/// Decode `code` (loaded at `base`) and return its direct call sites in
/// address order
///
/// Undecodable bytes are skipped one at a time, which resynchronizes on
/// padding and jump tables embedded in the text.
#[must_use]
pub fn find_call_sites(code: &[u8], base: u64) -> Vec<CallSite> {
    let decoder = InstDecoder::default();
    let mut sites = Vec::new();
    let mut pos = 0usize;

    while pos < code.len() {
        let mut reader = U8Reader::new(&code[pos..]);
        let len = match decoder.decode(&mut reader) {
            Ok(inst) => {
                let consumed = Reader::<u64, u8>::total_offset(&mut reader);
                let len = usize::try_from(consumed).unwrap_or(1).max(1);
                if inst.opcode() == Opcode::CALL {
                    // Memory and register forms carry no immediate
                    if let Operand::ImmediateI32 { imm } = inst.operand(0) {
                        let address = base + pos as u64;
                        let next = address + len as u64;
                        sites.push(CallSite {
                            calling_offset: address,
                            callee_offset: next.wrapping_add_signed(i64::from(imm)),
                        });
                    }
                }
                len
            }
            Err(e) if e.data_exhausted() => break,
            Err(_) => 1,
        };
        pos += len;
    }

    sites
}
