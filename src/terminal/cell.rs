use bitflags::bitflags;

use super::color::{Color, Rgb};

/// Sentinel codepoint stored in the right half of a double-width glyph.
/// Such a cell carries no content of its own.
pub const UCSWIDE: char = '\u{FFFF}';

/// Sentinel codepoint for cells covered by a placed image; the owning
/// image is referenced through `Attr::imgi`.
pub const SIXELCH: char = '\u{FFFC}';

bitflags! {
    /// Packed cell attribute flags. Colors, underline style, hyperlink and
    /// image references live in the sibling `Attr` fields; everything else
    /// that SGR, DECSCA, or the renderer needs is a bit here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct AttrFlags: u64 {
        const BOLD        = 1 << 0;
        const DIM         = 1 << 1;
        const SHADOW      = 1 << 2;
        const ITALIC      = 1 << 3;
        const BLINK       = 1 << 4;
        const BLINK2      = 1 << 5;
        const REVERSE     = 1 << 6;
        const INVISIBLE   = 1 << 7;
        const OVERSTRIKE  = 1 << 8;
        const STRIKEOUT   = 1 << 9;
        const SUPERSCRIPT = 1 << 10;
        const SUBSCRIPT   = 1 << 11;
        const FRAMED      = 1 << 12;
        const OVERLINED   = 1 << 13;
        /// DECSCA guard; selective erase skips cells carrying this.
        const PROTECTED   = 1 << 14;
        /// Render a narrow glyph stretched over two cells.
        const EXPAND      = 1 << 15;
        /// Render a wide glyph squeezed into one cell.
        const NARROW      = 1 << 16;
        /// Wide glyph forced into a single cell (single-cell CJK policy).
        const SINGLE      = 1 << 17;
        /// Cell produced by an erase operation and never written since.
        const CLEAR       = 1 << 18;
    }
}

/// Underline style selected by SGR 4 and its colon sub-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    Curly,
    Broken,
    BrokenDouble,
}

/// Full cell attributes: packed flags plus the fields that do not fit a
/// bit. Compared by equality to drive combining-character attachment and
/// render batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attr {
    pub flags: AttrFlags,
    pub underline: Underline,
    pub fg: Color,
    pub bg: Color,
    /// SGR 58 underline color; None means "follow foreground".
    pub ulcolr: Option<Rgb>,
    /// OSC 8 hyperlink id.
    pub link: Option<u32>,
    /// Image placement id for SIXELCH cells.
    pub imgi: Option<u32>,
    /// Font family selected by SGR 10..20 (0 = primary).
    pub font: u8,
    /// Graphics substitution code for self-drawn glyphs (line drawing,
    /// block elements); 0 means none.
    pub graph: u8,
}

impl Default for Attr {
    fn default() -> Self {
        Self {
            flags: AttrFlags::empty(),
            underline: Underline::None,
            fg: Color::Default,
            bg: Color::Default,
            ulcolr: None,
            link: None,
            imgi: None,
            font: 0,
            graph: 0,
        }
    }
}

impl Attr {
    /// The attribute an erased cell receives: current background, cleared
    /// everything else, CLEAR flag set.
    pub fn erase_with(bg: Color) -> Self {
        Self {
            bg,
            flags: AttrFlags::CLEAR,
            ..Default::default()
        }
    }

    /// DECRQCRA attribute weights, added to the checksum per cell.
    pub fn checksum_weight(&self) -> u32 {
        if self.underline != Underline::None {
            0x10
        } else if self.flags.contains(AttrFlags::REVERSE) {
            0x20
        } else if self.flags.contains(AttrFlags::BLINK) {
            0x40
        } else if self.flags.contains(AttrFlags::BOLD) {
            0x80
        } else {
            0
        }
    }
}

/// A single terminal cell: a base codepoint, an offset to the first cell
/// of its combining-character chain (0 if none), and its attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    /// Forward offset (in cells within the same row storage) to the next
    /// combining cell; 0 terminates the chain.
    pub cc_next: u16,
    pub attr: Attr,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            cc_next: 0,
            attr: Attr::default(),
        }
    }
}

impl Cell {
    pub fn new(ch: char, attr: Attr) -> Self {
        Self {
            ch,
            cc_next: 0,
            attr,
        }
    }

    /// An erased cell using the given background color (per ECMA-48,
    /// erase fills with the current background).
    pub fn erased(bg: Color) -> Self {
        Self {
            ch: ' ',
            cc_next: 0,
            attr: Attr::erase_with(bg),
        }
    }

    pub fn is_wide_half(&self) -> bool {
        self.ch == UCSWIDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erased_cell_keeps_background() {
        let cell = Cell::erased(Color::Indexed(4));
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.attr.bg, Color::Indexed(4));
        assert!(cell.attr.flags.contains(AttrFlags::CLEAR));
        assert_eq!(cell.attr.fg, Color::Default);
    }

    #[test]
    fn checksum_weights_prefer_underline() {
        let mut attr = Attr::default();
        attr.underline = Underline::Single;
        attr.flags |= AttrFlags::BOLD;
        assert_eq!(attr.checksum_weight(), 0x10);
        attr.underline = Underline::None;
        assert_eq!(attr.checksum_weight(), 0x80);
    }
}
