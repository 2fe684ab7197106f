use ansi_term::Colour::{Fixed, Green, Red};

use crate::framework::{Control, Memory, MEM_SIZE};
use crate::isa::inst_code;

// little endian
pub fn get_u64(binary: &[u8]) -> u64 {
    let mut res = 0;
    for (i, byte) in binary.iter().enumerate().take(8) {
        res += (*byte as u64) << (i * 8);
    }
    res
}
pub fn put_u64(binary: &mut [u8], val: u64) {
    for (i, byte) in binary.iter_mut().enumerate().take(8) {
        *byte = (val >> (i * 8)) as u8;
    }
}

/// Quad words that differ between two memories.
///
/// (address, left, right)
pub fn mem_diff(left: &Memory, right: &Memory) -> Vec<(u64, u64, u64)> {
    let (l, r) = (left.as_bytes(), right.as_bytes());
    (0..MEM_SIZE >> 3)
        .map(|i| i << 3)
        .filter_map(|addr| {
            let (a, b) = (get_u64(&l[addr..]), get_u64(&r[addr..]));
            (a != b).then_some((addr as u64, a, b))
        })
        .collect()
}

pub fn print_mem_diff(left: &Memory, right: &Memory) {
    for (addr, a, b) in mem_diff(left, right) {
        println!("{:#06x}: {:#018x} -> {:#018x}", addr, a, b);
    }
}

pub fn format_flag(v: bool) -> String {
    if v {
        Green.bold().paint("true").to_string()
    } else {
        Fixed(8).paint("false").to_string()
    }
}

pub fn format_icode(icode: u8) -> String {
    let name = format!("{:<6}", inst_code::name_of(icode));
    if icode == inst_code::NOP {
        Fixed(8).paint(name).to_string()
    } else {
        name
    }
}

pub fn format_ctrl(ctrl: Control) -> String {
    let s = format!("{ctrl:6}");
    match ctrl {
        Control::Normal => Fixed(8).paint(s).to_string(),
        Control::Stall => Red.paint(s).to_string(),
        Control::Bubble => Red.bold().paint(s).to_string(),
    }
}

pub fn format_reg_val(val: u64) -> String {
    if val == 0 {
        Fixed(8).paint(format!("{val:#018x}")).to_string()
    } else {
        format!("{val:#018x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_diff() {
        let left = Memory::default();
        let mut right = left.clone();
        right.put_byte(0x11, 0xff).unwrap();
        assert_eq!(mem_diff(&left, &right), vec![(0x10, 0, 0xff00)]);
    }
}
