use serde::{Deserialize, Serialize};

/// Terminal color representation supporting 16-color, 256-color, and truecolor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

/// A concrete RGB value as stored in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Dynamic color slots settable via OSC 10..19 and queried back with "?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynColor {
    Foreground,
    Background,
    Cursor,
    BoldFg,
    BlinkFg,
    Selection,
    SelectionText,
    TekForeground,
    TekBackground,
    TekCursor,
}

pub const DYN_COLOR_COUNT: usize = 10;

impl DynColor {
    fn slot(self) -> usize {
        match self {
            DynColor::Foreground => 0,
            DynColor::Background => 1,
            DynColor::Cursor => 2,
            DynColor::BoldFg => 3,
            DynColor::BlinkFg => 4,
            DynColor::Selection => 5,
            DynColor::SelectionText => 6,
            DynColor::TekForeground => 7,
            DynColor::TekBackground => 8,
            DynColor::TekCursor => 9,
        }
    }

    /// Map a dynamic-color OSC number (10..19) to its slot, if implemented.
    pub fn from_osc(num: u32) -> Option<Self> {
        match num {
            10 => Some(DynColor::Foreground),
            11 => Some(DynColor::Background),
            12 => Some(DynColor::Cursor),
            15 => Some(DynColor::TekForeground),
            16 => Some(DynColor::TekBackground),
            17 => Some(DynColor::Selection),
            18 => Some(DynColor::TekCursor),
            19 => Some(DynColor::SelectionText),
            _ => None,
        }
    }
}

/// Convert a 256-color index to its default RGB value.
/// The first 16 are the standard ANSI colors (theme defaults),
/// 16-231 are a 6x6x6 color cube, 232-255 are a grayscale ramp.
pub fn indexed_to_rgb(index: u8) -> Rgb {
    match index {
        0 => Rgb::new(0x15, 0x16, 0x1e),  // black
        1 => Rgb::new(0xf7, 0x76, 0x8e),  // red
        2 => Rgb::new(0x9e, 0xce, 0x6a),  // green
        3 => Rgb::new(0xe0, 0xaf, 0x68),  // yellow
        4 => Rgb::new(0x7a, 0xa2, 0xf7),  // blue
        5 => Rgb::new(0xbb, 0x9a, 0xf7),  // magenta
        6 => Rgb::new(0x7d, 0xcf, 0xff),  // cyan
        7 => Rgb::new(0xa9, 0xb1, 0xd6),  // white
        8 => Rgb::new(0x41, 0x48, 0x68),  // bright black
        9 => Rgb::new(0xff, 0x9e, 0x9e),  // bright red
        10 => Rgb::new(0xb9, 0xf2, 0x7c), // bright green
        11 => Rgb::new(0xff, 0x9e, 0x64), // bright yellow
        12 => Rgb::new(0x82, 0xaa, 0xff), // bright blue
        13 => Rgb::new(0xd4, 0xb0, 0xff), // bright magenta
        14 => Rgb::new(0xa9, 0xe1, 0xff), // bright cyan
        15 => Rgb::new(0xc0, 0xca, 0xf5), // bright white
        16..=231 => {
            let idx = index - 16;
            let r = idx / 36;
            let g = (idx % 36) / 6;
            let b = idx % 6;
            let to_val = |v: u8| if v == 0 { 0 } else { 55 + 40 * v };
            Rgb::new(to_val(r), to_val(g), to_val(b))
        }
        232..=255 => {
            let v = 8 + 10 * (index - 232);
            Rgb::new(v, v, v)
        }
    }
}

fn default_dyn(slot: usize) -> Option<Rgb> {
    match slot {
        0 => Some(Rgb::new(0xd4, 0xd4, 0xd4)), // foreground
        1 => Some(Rgb::new(0x0e, 0x0e, 0x0e)), // background
        2 => Some(Rgb::new(0xd4, 0xd4, 0xd4)), // cursor
        // the rest fall back to fg/bg at lookup time
        _ => None,
    }
}

/// Capacity of the XTPUSHCOLORS stack.
pub const COLOR_STACK_MAX: usize = 10;

/// The active palette: 256 indexed entries plus the dynamic color slots,
/// with a bounded save stack for XTPUSHCOLORS / XTPOPCOLORS.
#[derive(Debug, Clone)]
pub struct Palette {
    indexed: [Rgb; 256],
    dynamic: [Option<Rgb>; DYN_COLOR_COUNT],
    stack: Vec<([Rgb; 256], [Option<Rgb>; DYN_COLOR_COUNT])>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    pub fn new() -> Self {
        let mut indexed = [Rgb::new(0, 0, 0); 256];
        for (i, entry) in indexed.iter_mut().enumerate() {
            *entry = indexed_to_rgb(i as u8);
        }
        let mut dynamic = [None; DYN_COLOR_COUNT];
        for (i, entry) in dynamic.iter_mut().enumerate() {
            *entry = default_dyn(i);
        }
        Self {
            indexed,
            dynamic,
            stack: Vec::new(),
        }
    }

    pub fn indexed(&self, index: u8) -> Rgb {
        self.indexed[index as usize]
    }

    pub fn set_indexed(&mut self, index: u8, rgb: Rgb) {
        self.indexed[index as usize] = rgb;
    }

    pub fn reset_indexed(&mut self, index: u8) {
        self.indexed[index as usize] = indexed_to_rgb(index);
    }

    /// Resolve a dynamic slot. Unset slots fall back to foreground or
    /// background so Tek and selection colors follow the theme.
    pub fn dynamic(&self, which: DynColor) -> Rgb {
        if let Some(rgb) = self.dynamic[which.slot()] {
            return rgb;
        }
        match which {
            DynColor::TekBackground => self.dynamic[DynColor::Background.slot()]
                .unwrap_or_else(|| default_dyn(1).unwrap()),
            _ => self.dynamic[DynColor::Foreground.slot()]
                .unwrap_or_else(|| default_dyn(0).unwrap()),
        }
    }

    pub fn set_dynamic(&mut self, which: DynColor, rgb: Rgb) {
        self.dynamic[which.slot()] = Some(rgb);
    }

    pub fn reset_dynamic(&mut self, which: DynColor) {
        self.dynamic[which.slot()] = default_dyn(which.slot());
    }

    pub fn reset_all(&mut self) {
        let fresh = Palette::new();
        self.indexed = fresh.indexed;
        self.dynamic = fresh.dynamic;
    }

    /// XTPUSHCOLORS: save the current palette. The stack is bounded; the
    /// oldest entry is discarded when full.
    pub fn push(&mut self) {
        if self.stack.len() == COLOR_STACK_MAX {
            self.stack.remove(0);
        }
        self.stack.push((self.indexed, self.dynamic));
    }

    /// XTPOPCOLORS: restore the most recently pushed palette.
    /// Returns false when the stack is empty.
    pub fn pop(&mut self) -> bool {
        match self.stack.pop() {
            Some((indexed, dynamic)) => {
                self.indexed = indexed;
                self.dynamic = dynamic;
                true
            }
            None => false,
        }
    }

    /// XTREPORTCOLORS: (current entry, stack depth).
    pub fn stack_report(&self) -> (usize, usize) {
        (self.stack.len(), self.stack.len())
    }

    /// Resolve a cell color to RGB.
    pub fn resolve(&self, color: Color, foreground: bool) -> Rgb {
        match color {
            Color::Default => self.dynamic(if foreground {
                DynColor::Foreground
            } else {
                DynColor::Background
            }),
            Color::Indexed(i) => self.indexed(i),
            Color::Rgb(r, g, b) => Rgb::new(r, g, b),
        }
    }
}

/// Parse an X-style color specification: `rgb:RR/GG/BB` (1-4 hex digits
/// per component), `#RGB`/`#RRGGBB`/`#RRRRGGGGBBBB`, or a decimal
/// `r,g,b` triplet.
pub fn parse_color(s: &str) -> Option<Rgb> {
    let s = s.trim();
    if let Some(spec) = s.strip_prefix("rgb:") {
        let mut parts = spec.split('/');
        let r = scale_hex(parts.next()?)?;
        let g = scale_hex(parts.next()?)?;
        let b = scale_hex(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        return Some(Rgb::new(r, g, b));
    }
    if let Some(hex) = s.strip_prefix('#') {
        let n = hex.len();
        if n % 3 != 0 || n == 0 || n > 12 {
            return None;
        }
        let w = n / 3;
        let r = scale_hex(&hex[..w])?;
        let g = scale_hex(&hex[w..2 * w])?;
        let b = scale_hex(&hex[2 * w..])?;
        return Some(Rgb::new(r, g, b));
    }
    let mut parts = s.split(',');
    let r = parts.next()?.trim().parse::<u16>().ok()?;
    let g = parts.next()?.trim().parse::<u16>().ok()?;
    let b = parts.next()?.trim().parse::<u16>().ok()?;
    if parts.next().is_some() || r > 255 || g > 255 || b > 255 {
        return None;
    }
    Some(Rgb::new(r as u8, g as u8, b as u8))
}

// Scale a 1-4 digit hex component to 8 bits; the field is the high-order
// part of a 16-bit value per the X11 rgb: convention.
fn scale_hex(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 4 {
        return None;
    }
    let v = u16::from_str_radix(s, 16).ok()?;
    let bits = s.len() as u32 * 4;
    let scaled = (v as u32) << (16 - bits);
    Some((scaled >> 8) as u8)
}

/// Format a color for an OSC "?" query reply.
pub fn format_query(rgb: Rgb) -> String {
    format!(
        "rgb:{:04x}/{:04x}/{:04x}",
        rgb.r as u16 * 0x101,
        rgb.g as u16 * 0x101,
        rgb.b as u16 * 0x101
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rgb_forms() {
        assert_eq!(parse_color("rgb:ff/00/80"), Some(Rgb::new(255, 0, 128)));
        assert_eq!(
            parse_color("rgb:ffff/0000/8080"),
            Some(Rgb::new(255, 0, 128))
        );
        assert_eq!(parse_color("#ff0080"), Some(Rgb::new(255, 0, 128)));
        assert_eq!(parse_color("#f08"), Some(Rgb::new(0xf0, 0x00, 0x80)));
        assert_eq!(parse_color("255,0,128"), Some(Rgb::new(255, 0, 128)));
        assert_eq!(parse_color("rgb:ff/00"), None);
        assert_eq!(parse_color("256,0,0"), None);
    }

    #[test]
    fn cube_and_ramp() {
        assert_eq!(indexed_to_rgb(16), Rgb::new(0, 0, 0));
        assert_eq!(indexed_to_rgb(231), Rgb::new(255, 255, 255));
        assert_eq!(indexed_to_rgb(232), Rgb::new(8, 8, 8));
        assert_eq!(indexed_to_rgb(255), Rgb::new(238, 238, 238));
    }

    #[test]
    fn palette_stack_round_trip() {
        let mut pal = Palette::new();
        let before = pal.indexed(1);
        pal.push();
        pal.set_indexed(1, Rgb::new(1, 2, 3));
        assert_ne!(pal.indexed(1), before);
        assert!(pal.pop());
        assert_eq!(pal.indexed(1), before);
        assert!(!pal.pop());
    }

    #[test]
    fn palette_stack_drops_oldest_when_full() {
        let mut pal = Palette::new();
        for i in 0..COLOR_STACK_MAX + 2 {
            pal.set_indexed(0, Rgb::new(i as u8, 0, 0));
            pal.push();
        }
        let mut depth = 0;
        while pal.pop() {
            depth += 1;
        }
        assert_eq!(depth, COLOR_STACK_MAX);
        // The two oldest pushes were discarded.
        assert_eq!(pal.indexed(0), Rgb::new(2, 0, 0));
    }

    #[test]
    fn query_format() {
        assert_eq!(format_query(Rgb::new(0xd4, 0, 0xff)), "rgb:d4d4/0000/ffff");
    }
}
