use super::cell::Attr;
use super::charset::Charset;
use super::grid::RowFlags;

/// Cursor shape selected by DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    Bar,
}

/// Full cursor state: position, pending-wrap flag, the current write
/// attributes, and the character-set state that travels with DECSC/DECRC.
#[derive(Debug, Clone)]
pub struct CursorState {
    pub row: u16,
    pub col: u16,
    /// Set when the cursor sits past the right margin; the next printable
    /// character wraps first.
    pub wrapnext: bool,
    /// DECOM origin mode.
    pub origin: bool,
    /// UTF-8 mode selected by ESC % G / ESC % @.
    pub utf: bool,
    pub attr: Attr,
    /// G0..G3 designations.
    pub csets: [Charset; 4],
    /// Which slot GL and GR invoke.
    pub gl: usize,
    pub gr: usize,
    /// One-shot single-shift charset (SS2/SS3), consumed by the next
    /// printable byte.
    pub cset_single: Charset,
    /// User-preferred supplemental set selected by DECAUPSS.
    pub decsupp: Charset,
    /// OEM/VGA charset override from SGR 11/12 (0 = off).
    pub oem_acs: u8,
    /// Explicit width attribute from PEC: 0 none, 1 narrow, 2 expanded,
    /// 11 single-cell zoomed.
    pub width_attr: u8,
    /// Bidi mode bits propagated onto rows as characters are written.
    pub bidimode: RowFlags,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            wrapnext: false,
            origin: false,
            utf: true,
            attr: Attr::default(),
            csets: [Charset::Ascii; 4],
            gl: 0,
            gr: 0,
            cset_single: Charset::Ascii,
            decsupp: Charset::DecSupp,
            oem_acs: 0,
            width_attr: 0,
            bidimode: RowFlags::empty(),
        }
    }
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cursor_is_home_ascii() {
        let c = CursorState::new();
        assert_eq!((c.row, c.col), (0, 0));
        assert!(!c.wrapnext);
        assert_eq!(c.csets, [Charset::Ascii; 4]);
        assert_eq!(c.gl, 0);
    }
}
