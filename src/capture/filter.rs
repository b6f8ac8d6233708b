//! Classic BPF filter program accepting a single EtherType.

/// One classic BPF instruction (`struct bpf_insn`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BpfInsn {
    pub code: u16,
    pub jt: u8,
    pub jf: u8,
    pub k: u32,
}

// Opcode classes and modes from <net/bpf.h>
const BPF_LD: u16 = 0x00;
const BPF_JMP: u16 = 0x05;
const BPF_RET: u16 = 0x06;
const BPF_H: u16 = 0x08;
const BPF_ABS: u16 = 0x20;
const BPF_JEQ: u16 = 0x10;
const BPF_K: u16 = 0x00;

/// Offset of the EtherType field in an Ethernet header.
const ETHERTYPE_OFFSET: u32 = 12;

const fn stmt(code: u16, k: u32) -> BpfInsn {
    BpfInsn {
        code,
        jt: 0,
        jf: 0,
        k,
    }
}

const fn jump(code: u16, k: u32, jt: u8, jf: u8) -> BpfInsn {
    BpfInsn { code, jt, jf, k }
}

/// Program that keeps whole frames of `ethertype` and drops everything else.
///
/// ```text
/// ldh [12]
/// jeq #ethertype, accept, drop
/// drop:   ret #0
/// accept: ret #-1
/// ```
pub const fn ethertype_filter(ethertype: u16) -> [BpfInsn; 4] {
    [
        stmt(BPF_LD | BPF_H | BPF_ABS, ETHERTYPE_OFFSET),
        jump(BPF_JMP | BPF_JEQ | BPF_K, ethertype as u32, 1, 0),
        stmt(BPF_RET | BPF_K, 0),
        stmt(BPF_RET | BPF_K, u32::MAX),
    ]
}
