//! Acceptance check over the leading bytes of a candidate ELF object.
//!
//! The probe window is the 32-bit header size: every field inspected here
//! lives in the identification prefix or immediately after it, where the
//! 32- and 64-bit layouts agree.

/// Number of bytes inspected; files shorter than this are never ELF.
pub const PROBE_LEN: usize = 52;

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_VERSION: usize = 6;
const EI_OSABI: usize = 7;

const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;
const EV_CURRENT: u8 = 1;
const ELFOSABI_SYSV: u8 = 0;
const ELFOSABI_GNU: u8 = 3;

const ET_REL: u16 = 1;
const ET_EXEC: u16 = 2;
const ET_DYN: u16 = 3;

const EM_386: u16 = 3;
const EM_PPC64: u16 = 21;
const EM_S390: u16 = 22;
const EM_X86_64: u16 = 62;
const EM_AARCH64: u16 = 183;

// e_type, e_machine and e_version sit right after the 16-byte identification.
const OFF_TYPE: usize = 16;
const OFF_MACHINE: usize = 18;
const OFF_VERSION: usize = 20;

/// Whether the header describes an object we accept: a current-version ELF
/// for the SysV or GNU ABI, relocatable/executable/shared, on one of the
/// supported machines. Multi-byte fields are decoded in the byte order the
/// header itself declares.
pub fn is_acceptable(header: &[u8; PROBE_LEN]) -> bool {
    if header[..4] != ELF_MAGIC {
        return false;
    }
    if !matches!(header[EI_CLASS], ELFCLASS32 | ELFCLASS64) {
        return false;
    }
    let byte_order = header[EI_DATA];
    if !matches!(byte_order, ELFDATA2LSB | ELFDATA2MSB) {
        return false;
    }
    if header[EI_VERSION] != EV_CURRENT {
        return false;
    }
    if !matches!(header[EI_OSABI], ELFOSABI_SYSV | ELFOSABI_GNU) {
        return false;
    }

    if !matches!(read_u16(header, OFF_TYPE, byte_order), ET_REL | ET_EXEC | ET_DYN) {
        return false;
    }
    if !matches!(
        read_u16(header, OFF_MACHINE, byte_order),
        EM_386 | EM_PPC64 | EM_S390 | EM_X86_64 | EM_AARCH64
    ) {
        return false;
    }
    read_u32(header, OFF_VERSION, byte_order) == u32::from(EV_CURRENT)
}

fn read_u16(header: &[u8; PROBE_LEN], offset: usize, byte_order: u8) -> u16 {
    let raw = [header[offset], header[offset + 1]];
    if byte_order == ELFDATA2LSB {
        u16::from_le_bytes(raw)
    } else {
        u16::from_be_bytes(raw)
    }
}

fn read_u32(header: &[u8; PROBE_LEN], offset: usize, byte_order: u8) -> u32 {
    let raw = [
        header[offset],
        header[offset + 1],
        header[offset + 2],
        header[offset + 3],
    ];
    if byte_order == ELFDATA2LSB {
        u32::from_le_bytes(raw)
    } else {
        u32::from_be_bytes(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_header(e_type: u16, e_machine: u16) -> [u8; PROBE_LEN] {
        let mut h = [0u8; PROBE_LEN];
        h[..4].copy_from_slice(&ELF_MAGIC);
        h[EI_CLASS] = ELFCLASS64;
        h[EI_DATA] = ELFDATA2LSB;
        h[EI_VERSION] = EV_CURRENT;
        h[EI_OSABI] = ELFOSABI_SYSV;
        h[OFF_TYPE..OFF_TYPE + 2].copy_from_slice(&e_type.to_le_bytes());
        h[OFF_MACHINE..OFF_MACHINE + 2].copy_from_slice(&e_machine.to_le_bytes());
        h[OFF_VERSION..OFF_VERSION + 4].copy_from_slice(&u32::from(EV_CURRENT).to_le_bytes());
        h
    }

    fn be_header(e_type: u16, e_machine: u16) -> [u8; PROBE_LEN] {
        let mut h = le_header(0, 0);
        h[EI_DATA] = ELFDATA2MSB;
        h[OFF_TYPE..OFF_TYPE + 2].copy_from_slice(&e_type.to_be_bytes());
        h[OFF_MACHINE..OFF_MACHINE + 2].copy_from_slice(&e_machine.to_be_bytes());
        h[OFF_VERSION..OFF_VERSION + 4].copy_from_slice(&u32::from(EV_CURRENT).to_be_bytes());
        h
    }

    #[test]
    fn accepts_little_endian_x86_64_shared_object() {
        assert!(is_acceptable(&le_header(ET_DYN, EM_X86_64)));
    }

    #[test]
    fn accepts_big_endian_s390_executable() {
        assert!(is_acceptable(&be_header(ET_EXEC, EM_S390)));
    }

    #[test]
    fn accepts_relocatable_objects() {
        assert!(is_acceptable(&le_header(ET_REL, EM_AARCH64)));
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut h = le_header(ET_DYN, EM_X86_64);
        h[0] = b'M';
        assert!(!is_acceptable(&h));
    }

    #[test]
    fn rejects_unknown_class_and_byte_order() {
        let mut h = le_header(ET_DYN, EM_X86_64);
        h[EI_CLASS] = 9;
        assert!(!is_acceptable(&h));

        let mut h = le_header(ET_DYN, EM_X86_64);
        h[EI_DATA] = 0;
        assert!(!is_acceptable(&h));
    }

    #[test]
    fn rejects_foreign_abi() {
        let mut h = le_header(ET_DYN, EM_X86_64);
        h[EI_OSABI] = 9; // FreeBSD
        assert!(!is_acceptable(&h));
    }

    #[test]
    fn rejects_core_dumps_and_unknown_types() {
        assert!(!is_acceptable(&le_header(4, EM_X86_64))); // ET_CORE
        assert!(!is_acceptable(&le_header(0, EM_X86_64)));
    }

    #[test]
    fn rejects_unsupported_machines() {
        assert!(!is_acceptable(&le_header(ET_EXEC, 8))); // MIPS
    }

    #[test]
    fn rejects_mismatched_field_byte_order() {
        // A little-endian header whose e_type was written big-endian decodes
        // to 0x0300, which is not an accepted object type.
        let mut h = le_header(ET_DYN, EM_X86_64);
        h[OFF_TYPE..OFF_TYPE + 2].copy_from_slice(&ET_DYN.to_be_bytes());
        assert!(!is_acceptable(&h));
    }

    #[test]
    fn rejects_stale_e_version() {
        let mut h = le_header(ET_DYN, EM_X86_64);
        h[OFF_VERSION..OFF_VERSION + 4].copy_from_slice(&2u32.to_le_bytes());
        assert!(!is_acceptable(&h));
    }
}
