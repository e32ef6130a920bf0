//! Tektronix 4014 submode. Entered via DECSET 38 (DECTEK); runs its own
//! state machine on the same byte stream while active.
//!
//! The display model is an append-only command buffer: text, moves,
//! vectors, and plotted points, each stamped with the beam state in
//! effect. The host renders the buffer; a stale-watermark keeps repaints
//! incremental. Coordinates span 0..4095 horizontally and 0..3119
//! vertically, y growing upwards (3119 is the top).

/// Tek submode, also used to tag buffered commands with the mode that
/// produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TekMode {
    #[default]
    Off,
    /// Text output.
    Alpha,
    /// Graph mode before the first address (moves, no draw).
    Graph0,
    /// Graph mode, drawing vectors.
    Graph,
    PointPlot,
    /// Point plot with a leading intensity byte per point.
    SpecialPlot,
    /// Single-byte direction steps.
    IncrementalPlot,
    /// Graphic input: crosshair cursor, report on keypress.
    Gin,
}

/// Font metrics for the four Tek character sizes (rows x cols on the
/// 4096 x 3120 raster, glyph cell height and width).
#[derive(Debug, Clone, Copy)]
pub struct TekFont {
    pub rows: u16,
    pub cols: u16,
    pub height: u16,
    pub width: u16,
}

pub const TEK_FONTS: [TekFont; 4] = [
    TekFont { rows: 35, cols: 74, height: 88, width: 55 },
    TekFont { rows: 38, cols: 81, height: 81, width: 50 },
    TekFont { rows: 58, cols: 121, height: 53, width: 32 },
    TekFont { rows: 64, cols: 133, height: 48, width: 30 },
];

/// Intensity translation for special point plot (0..63 to percent).
pub const INTENSIFY: [u8; 64] = [
    0, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, //
    4, 4, 4, 5, 5, 5, 6, 6, 7, 8, 9, 10, 11, 12, 12, 13, //
    14, 16, 17, 19, 20, 22, 23, 25, 28, 31, 34, 38, 41, 44, 47, 50, //
    56, 62, 69, 75, 81, 88, 94, 100, 56, 63, 69, 75, 81, 88, 96, 100,
];

// APL overlay for the alternate character set (locking shift one).
const APL: &str = " ¨)<≤=>]∨∧≠÷,+./0123456789([;×:\\¯⍺⊥∩⌊∊_∇∆⍳∘'⎕∣⊤○⋆?⍴⌈∼↓∪ω⊃↑⊂←⊢→≥-⋄ABCDEFGHIJKLMNOPQRSTUVWXYZ{⊣}$ ";

/// One buffered display command.
#[derive(Debug, Clone, PartialEq)]
pub struct TekChar {
    pub kind: TekKind,
    /// Glow countdown: freshly drawn items render bright for this many
    /// repaints.
    pub recent: u8,
    pub defocused: bool,
    pub writethru: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TekKind {
    /// Text in alpha mode. Control characters are carried with width -2
    /// and interpreted at paint time (BS/HT/VT/LF/CR cursor motion).
    Text { ch: char, width: i8, font: u8 },
    /// Beam move without drawing.
    Move { y: i16, x: i16 },
    /// Vector draw to the given position with a line style 0..4.
    Vector { y: i16, x: i16, style: u8, intensity: u8 },
    /// Plotted point.
    Point { y: i16, x: i16, intensity: u8 },
}

/// Line styles for vectors: solid, dotted, dot-dashed, short dash,
/// long dash.
pub const VECTOR_STYLES: u8 = 5;

#[derive(Debug)]
pub struct TekState {
    pub mode: TekMode,
    mode_pre_gin: TekMode,
    /// Bypass condition: alpha output is discarded until cancelled.
    pub bypass: bool,
    intensity: u8,
    style: u8,
    font: u8,
    margin: i16,
    defocused: bool,
    writethru: bool,
    plotpen: bool,
    apl_mode: bool,
    y: i16,
    x: i16,
    pub gin_y: i16,
    pub gin_x: i16,
    buf: Vec<TekChar>,
    /// First buffer index the host has not painted yet.
    stale_from: usize,
    beam_glow: u8,
    thru_glow: u8,
    /// Whole-screen flash pending (page erase).
    pub flash: bool,
    /// Strap option: 0 none, 1 CR, 2 CR + ETX after GIN reports.
    pub strap: u8,
}

impl Default for TekState {
    fn default() -> Self {
        Self {
            mode: TekMode::Off,
            mode_pre_gin: TekMode::Alpha,
            bypass: false,
            intensity: 0x7F,
            style: 0,
            font: 0,
            margin: 0,
            defocused: false,
            writethru: false,
            plotpen: false,
            apl_mode: false,
            y: 0,
            x: 0,
            gin_y: 1560,
            gin_x: -1,
            buf: Vec::new(),
            stale_from: 0,
            beam_glow: 1,
            thru_glow: 5,
            flash: false,
            strap: 0,
        }
    }
}

impl TekState {
    pub fn new(glow: u8, strap: u8) -> Self {
        Self {
            beam_glow: glow.max(1),
            strap,
            ..Default::default()
        }
    }

    pub fn active(&self) -> bool {
        self.mode != TekMode::Off
    }

    pub fn buffer(&self) -> &[TekChar] {
        &self.buf
    }

    /// Commands appended since the last paint; painting consumes the
    /// watermark.
    pub fn take_stale(&mut self) -> &[TekChar] {
        let from = self.stale_from;
        self.stale_from = self.buf.len();
        &self.buf[from..]
    }

    fn append(&mut self, kind: TekKind) {
        self.buf.push(TekChar {
            kind,
            recent: if self.writethru {
                self.thru_glow
            } else {
                self.beam_glow
            },
            defocused: self.defocused,
            writethru: self.writethru,
        });
    }

    fn home(&mut self) {
        self.x = 0;
        self.y = 3120 - TEK_FONTS[self.font as usize].height as i16;
        self.margin = 0;
    }

    /// Erase the display and home the beam.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.stale_from = 0;
        self.flash = true;
        self.home();
    }

    /// PAGE: erase, return to alpha mode, margin 1, cancel bypass.
    pub fn page(&mut self) {
        self.clear();
        self.mode = TekMode::Alpha;
        self.margin = 0;
        self.bypass = false;
    }

    /// Full reset (xterm RESET semantics): PAGE plus line-type and font
    /// defaults.
    pub fn reset(&mut self) {
        self.style = 0;
        self.defocused = false;
        self.writethru = false;
        self.font = 0;
        self.apl_mode = false;
        self.page();
        self.intensity = 0x7F;
        self.plotpen = false;
    }

    /// Enter the submode via DECSET 38.
    pub fn enter(&mut self) {
        self.mode = TekMode::Alpha;
        self.reset();
    }

    pub fn leave(&mut self) {
        self.mode = TekMode::Off;
    }

    pub fn set_font(&mut self, f: u8) {
        self.font = f & 3;
    }

    pub fn set_apl(&mut self, on: bool) {
        self.apl_mode = on;
    }

    /// Select beam emphasis and vector style from the ESC ` .. w range.
    pub fn beam(&mut self, defocused: bool, write_through: bool, vector_style: u8) {
        self.defocused = defocused;
        self.writethru = write_through;
        self.style = if vector_style > 4 { 0 } else { vector_style };
    }

    pub fn set_intensity(&mut self, defocused: bool, intensity: u8) {
        self.defocused = defocused;
        self.intensity = intensity;
    }

    /// Append a text character in alpha mode, advancing the beam.
    pub fn write(&mut self, ch: char, width: i8) {
        if self.bypass {
            return;
        }
        let (ch, width) = if self.apl_mode && ch >= ' ' && (ch as u32) < 0x80 {
            let idx = ch as usize - 0x20;
            (APL.chars().nth(idx).unwrap_or(ch), 1)
        } else {
            (ch, width)
        };
        let font = self.font;
        self.append(TekKind::Text { ch, width, font });
        if width > 0 {
            self.x += width as i16 * TEK_FONTS[font as usize].width as i16;
        }
    }

    /// Decode an address byte group (tagged 12-bit / 10-bit / short
    /// forms) and append the move/draw for the current mode.
    pub fn address(&mut self, code: &[u8]) {
        // accumulate the tag bits, keep the low five data bits
        let mut tag: u16 = 0;
        let mut data = [0u8; 8];
        for (i, &b) in code.iter().take(8).enumerate() {
            tag = (tag << 2) | ((b >> 5) & 3) as u16;
            data[i] = b & 0x1F;
        }
        let d = |i: usize| data[i] as i16;

        match tag {
            0x1F6 => {
                // 12-bit address: High Y, Extra, Low Y, High X, Low X
                self.y = d(0) << 7 | d(2) << 2 | d(1) >> 2;
                self.x = d(3) << 7 | d(4) << 2 | (d(1) & 3);
            }
            0x76 => {
                // 10-bit address
                self.y = d(0) << 7 | d(1) << 2;
                self.x = d(2) << 7 | d(3) << 2;
            }
            0x06 => {
                // High Y, Low X
                self.y = (self.y & 0x7F) | d(0) << 7;
                self.x = (self.x & !0x7C) | d(1) << 2;
            }
            0x0E => {
                // Low Y, Low X
                self.y = (self.y & !0x7C) | d(0) << 2;
                self.x = (self.x & !0x7C) | d(1) << 2;
            }
            0x36 => {
                // Low Y, High X, Low X
                self.y = (self.y & !0x7C) | d(0) << 2;
                self.x = (self.x & 0x3) | d(1) << 7 | d(2) << 2;
            }
            0x02 => {
                // Low X only
                self.x = (self.x & !0x7C) | d(0) << 2;
            }
            0x3E => {
                // Extra, Low Y, Low X
                self.y = (self.y & !0x7F) | d(1) << 2 | d(0) >> 2;
                self.x = (self.x & !0x7F) | d(2) << 2 | (d(0) & 3);
            }
            0x1E => {
                // High Y, Low Y, Low X
                self.y = (self.y & 0x3) | d(0) << 7 | d(1) << 2;
                self.x = (self.x & !0x7C) | d(2) << 2;
            }
            0xF6 => {
                // Extra, Low Y, High X, Low X
                self.y = (self.y & !0x7F) | d(1) << 2 | d(0) >> 2;
                self.x = d(2) << 7 | d(3) << 2 | (d(0) & 3);
            }
            0x7E => {
                // High Y, Extra, Low Y, Low X
                self.y = d(0) << 7 | d(2) << 2 | d(1) >> 2;
                self.x = (self.x & !0x7F) | d(3) << 2 | (d(1) & 3);
            }
            0x16 => {
                // High Y, High X, Low X
                self.y = (self.y & 0x7F) | d(0) << 7;
                self.x = (self.x & 0x3) | d(1) << 7 | d(2) << 2;
            }
            _ => return, // malformed group
        }

        let kind = match self.mode {
            TekMode::Graph0 => TekKind::Move {
                y: self.y,
                x: self.x,
            },
            TekMode::Graph => TekKind::Vector {
                y: self.y,
                x: self.x,
                style: self.style,
                intensity: self.intensity,
            },
            TekMode::PointPlot | TekMode::SpecialPlot => TekKind::Point {
                y: self.y,
                x: self.x,
                intensity: self.intensity,
            },
            _ => TekKind::Move {
                y: self.y,
                x: self.x,
            },
        };
        self.append(kind);
        self.margin = 0;
    }

    /// Incremental plot step: one byte selects a direction combination
    /// (bit 3 down, bit 2 up, bit 1 left, bit 0 right).
    pub fn step(&mut self, c: u8) {
        if c & 8 != 0 {
            self.y -= 1;
        }
        if c & 4 != 0 {
            self.y += 1;
        }
        if c & 2 != 0 {
            self.x -= 1;
        }
        if c & 1 != 0 {
            self.x += 1;
        }
        if self.plotpen {
            let (y, x, intensity) = (self.y, self.x, self.intensity);
            self.append(TekKind::Point { y, x, intensity });
        } else {
            let (y, x) = (self.y, self.x);
            self.append(TekKind::Move { y, x });
        }
    }

    /// Incremental plot pen up/down; pen down plots the current spot.
    pub fn pen(&mut self, down: bool) {
        self.plotpen = down;
        if down {
            self.step(0);
        }
    }

    /// Enter GIN mode, remembering where to return.
    pub fn gin(&mut self) {
        self.mode_pre_gin = self.mode;
        self.mode = TekMode::Gin;
        if self.gin_x < 0 {
            self.gin_y = 1560;
            self.gin_x = 2048;
        }
    }

    /// Leave GIN mode back to alpha (BEL, LF and SI finish GIN).
    pub fn gin_fin(&mut self) {
        if self.mode == TekMode::Gin {
            self.mode = TekMode::Alpha;
        }
    }

    /// Move the GIN crosshair by a delta, clamping to the raster.
    pub fn move_crosshair_by(&mut self, dy: i16, dx: i16) {
        self.gin_y = (self.gin_y + dy).clamp(0, 3119);
        self.gin_x = (self.gin_x + dx).clamp(0, 4095);
    }

    /// Position the GIN crosshair absolutely (pointer tracking).
    pub fn set_crosshair(&mut self, y: i16, x: i16) {
        self.gin_y = y.clamp(0, 3119);
        self.gin_x = x.clamp(0, 4095);
    }

    fn address_report(&self) -> [u8; 4] {
        let (y, x) = if self.mode == TekMode::Gin {
            (self.gin_y as u16, self.gin_x as u16)
        } else {
            (self.y.max(0) as u16, self.x.max(0) as u16)
        };
        [
            0x20 | (x >> 7) as u8,
            0x60 | ((x >> 2) & 0x1F) as u8,
            0x20 | (y >> 7) as u8,
            0x40 | ((y >> 2) & 0x1F) as u8,
        ]
    }

    fn strap_suffix(&self, out: &mut Vec<u8>) {
        match self.strap {
            0 => {}
            1 => out.push(b'\r'),
            _ => out.extend_from_slice(b"\r\x03"),
        }
    }

    /// GIN keypress report: pressed char + address + strap suffix. The
    /// submode returns to whatever was active before GIN.
    pub fn gin_report(&mut self, ch: u8) -> Vec<u8> {
        let mut out = vec![ch];
        out.extend_from_slice(&self.address_report());
        self.strap_suffix(&mut out);
        self.mode = self.mode_pre_gin;
        self.margin = 0;
        out
    }

    /// ENQ: in GIN mode the bare address; otherwise a status byte plus
    /// the address.
    pub fn enq(&mut self) -> Vec<u8> {
        if self.mode == TekMode::Gin {
            return self.address_report().to_vec();
        }
        let mut status = 0x30u8;
        if self.strap != 0 {
            status |= 0x80;
        }
        if self.mode == TekMode::Alpha {
            status |= 0x04;
        } else {
            status |= 0x08;
        }
        if self.margin != 0 {
            status |= 0x02;
        }
        let mut out = vec![status];
        out.extend_from_slice(&self.address_report());
        self.strap_suffix(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tek() -> TekState {
        let mut t = TekState::new(1, 0);
        t.enter();
        t
    }

    #[test]
    fn ten_bit_address_decodes_corners() {
        let mut t = tek();
        t.mode = TekMode::Graph0;
        // y 0, x 0: 0x20 0x60 0x20 0x40 (" ` @")
        t.address(&[0x20, 0x60, 0x20, 0x40]);
        assert_eq!((t.y, t.x), (0, 0));
        // y 779, x 1023: "8k?_" = 0x38 0x6B 0x3F 0x5F
        t.address(&[0x38, 0x6B, 0x3F, 0x5F]);
        assert_eq!((t.y, t.x), (779 << 2, 1023 << 2));
    }

    #[test]
    fn short_address_low_x_only() {
        let mut t = tek();
        t.mode = TekMode::Graph0;
        t.address(&[0x20, 0x60, 0x20, 0x40]);
        let before_y = t.y;
        // single Low X byte: tag 10
        t.address(&[0x40 | 0x05]);
        assert_eq!(t.y, before_y);
        assert_eq!(t.x, 5 << 2);
    }

    #[test]
    fn graph_mode_appends_vectors() {
        let mut t = tek();
        t.mode = TekMode::Graph0;
        t.address(&[0x20, 0x60, 0x20, 0x40]);
        t.mode = TekMode::Graph;
        t.beam(false, false, 2);
        t.address(&[0x38, 0x6B, 0x3F, 0x5F]);
        let last = t.buffer().last().unwrap();
        assert!(matches!(
            last.kind,
            TekKind::Vector { style: 2, .. }
        ));
    }

    #[test]
    fn incremental_steps_move_the_beam() {
        let mut t = tek();
        t.mode = TekMode::IncrementalPlot;
        t.x = 100;
        t.y = 100;
        t.pen(true);
        t.step(b'A' & 0x0F); // 0001: right
        assert_eq!((t.y, t.x), (100, 101));
        assert!(matches!(
            t.buffer().last().unwrap().kind,
            TekKind::Point { .. }
        ));
        t.pen(false);
        t.step(4); // up
        assert_eq!(t.y, 101);
        assert!(matches!(
            t.buffer().last().unwrap().kind,
            TekKind::Move { .. }
        ));
    }

    #[test]
    fn gin_report_restores_previous_mode() {
        let mut t = tek();
        t.mode = TekMode::Graph;
        t.gin();
        assert_eq!(t.mode, TekMode::Gin);
        t.set_crosshair(1000, 2000);
        let report = t.gin_report(b'a');
        assert_eq!(report[0], b'a');
        assert_eq!(report.len(), 5);
        assert_eq!(t.mode, TekMode::Graph);
        // address encodes x then y in the tagged form
        assert_eq!(report[1], 0x20 | (2000u16 >> 7) as u8);
        assert_eq!(report[3], 0x20 | (1000u16 >> 7) as u8);
    }

    #[test]
    fn enq_status_reflects_mode() {
        let mut t = tek();
        let alpha = t.enq();
        assert_eq!(alpha[0] & 0x0C, 0x04);
        t.mode = TekMode::Graph;
        let graph = t.enq();
        assert_eq!(graph[0] & 0x0C, 0x08);
    }

    #[test]
    fn stale_watermark_is_incremental() {
        let mut t = tek();
        t.write('A', 1);
        t.write('B', 1);
        assert_eq!(t.take_stale().len(), 2);
        t.write('C', 1);
        let fresh = t.take_stale();
        assert_eq!(fresh.len(), 1);
        assert!(matches!(fresh[0].kind, TekKind::Text { ch: 'C', .. }));
    }

    #[test]
    fn apl_mode_substitutes_glyphs() {
        let mut t = tek();
        t.set_apl(true);
        t.write('A', 1);
        match t.buffer().last().unwrap().kind {
            TekKind::Text { ch, .. } => assert_eq!(ch, '⍺'),
            ref k => panic!("unexpected {k:?}"),
        }
    }

    #[test]
    fn page_clears_and_cancels_bypass() {
        let mut t = tek();
        t.write('Z', 1);
        t.bypass = true;
        t.page();
        assert!(t.buffer().is_empty());
        assert!(!t.bypass);
        assert_eq!(t.mode, TekMode::Alpha);
        assert!(t.flash);
    }
}
