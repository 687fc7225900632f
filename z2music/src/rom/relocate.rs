//! Patching the loader code that addresses a section's tables
//!
//! When a section's tables move, every instruction that loads the old base address
//! as an immediate operand must be rewritten. This is a minimal scanner over the
//! loader's machine code, not a disassembler: it recognizes exactly one opcode and
//! one terminator, and stops scanning at the terminator so unrelated code is never
//! touched.

use crate::rom::image::Image;
use tracing::debug;

/// The opcode whose 2-byte little-endian operand holds a table address
pub(crate) const LDA_ABSOLUTE_Y: u8 = 0xb9;

/// The unconditional jump that ends every loader routine
const JMP_ABSOLUTE: u8 = 0x4c;

/// A load preceding the main loader routine uses the same table
const SCAN_REWIND: usize = 11;

/// The music reset code; no loader extends past it
const SCAN_BOUNDARY: usize = 0x019c74;

/// Rewrite every table-address operand between the loader's lead-in and its
/// terminating jump, preserving each operand's offset into the table
pub(crate) fn relocate_loader(image: &mut Image, loader: usize, new_base: u16) {
    let old_base = image.get_word(loader + 1);
    let mut address = loader - SCAN_REWIND;

    loop {
        match image.get(address) {
            LDA_ABSOLUTE_Y => {
                let operand = image.get_word(address + 1);
                let patched = new_base.wrapping_add(operand.wrapping_sub(old_base));
                debug!("found LDA at {address:#x}, replacing {operand:#06x} with {patched:#06x}");
                image.put_word(address + 1, patched);
                address += 3;
            }
            JMP_ABSOLUTE => {
                debug!("found JMP at {address:#x}, done relocating");
                break;
            }
            _ if address >= SCAN_BOUNDARY => {
                debug!("reached the music reset code, done relocating");
                break;
            }
            _ => address += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patches_loads_up_to_the_jump() {
        let mut image = Image::new();
        let loader = 0x019b90;

        // A lead-in load, two filler bytes, the loader itself, one more load,
        // the terminating jump, and a load past it that must stay untouched
        image.write(loader - SCAN_REWIND, &[LDA_ABSOLUTE_Y, 0x02, 0xa0]);
        image.write(loader, &[LDA_ABSOLUTE_Y, 0x00, 0xa0]);
        image.write(loader + 3, &[LDA_ABSOLUTE_Y, 0x34, 0xa0]);
        image.write(loader + 6, &[JMP_ABSOLUTE, 0x00, 0x80]);
        image.write(loader + 9, &[LDA_ABSOLUTE_Y, 0x50, 0xa0]);

        relocate_loader(&mut image, loader, 0xa800);

        assert_eq!(image.get_word(loader - SCAN_REWIND + 1), 0xa802);
        assert_eq!(image.get_word(loader + 1), 0xa800);
        assert_eq!(image.get_word(loader + 4), 0xa834);
        assert_eq!(image.get_word(loader + 10), 0xa050);
    }

    #[test]
    fn stops_at_the_boundary_without_a_jump() {
        let mut image = Image::new();
        let loader = 0x019c4b;

        image.write(loader, &[LDA_ABSOLUTE_Y, 0x00, 0xa9]);
        image.write(0x019c60, &[LDA_ABSOLUTE_Y, 0x10, 0xa9]);
        image.write(SCAN_BOUNDARY + 0x10, &[LDA_ABSOLUTE_Y, 0x20, 0xa9]);

        relocate_loader(&mut image, loader, 0xb000);

        assert_eq!(image.get_word(loader + 1), 0xb000);
        assert_eq!(image.get_word(0x019c61), 0xb010);

        // Nothing past the reset-code boundary is touched
        assert_eq!(image.get_word(SCAN_BOUNDARY + 0x11), 0xa920);
    }
}
