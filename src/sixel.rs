//! DECSIXEL decoder. Invoked from the DCS `q` passthrough; consumes the
//! payload bytes and produces an RGBA buffer for placement on the grid.

use crate::terminal::color::Rgb;

/// Palette register count.
pub const PALETTE_MAX: usize = 1024;
/// Hard bounds on the decoded bitmap.
pub const WIDTH_MAX: usize = 4096;
pub const HEIGHT_MAX: usize = 4096;

const PARAMS_MAX: usize = 16;
const PARAM_VALUE_MAX: u32 = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PState {
    /// Sixel body bytes.
    Body,
    /// Raster attributes after `"`.
    Gra,
    /// Repeat introducer after `!`.
    Gri,
    /// Color introducer after `#`.
    Gci,
}

/// The fixed VT340-compatible palette for registers 1..16, components
/// given in 0..100 and scaled to 0..255.
const DEFAULT_TABLE: [(u8, u8, u8); 16] = [
    (0, 0, 0),    // Black
    (20, 20, 80), // Blue
    (80, 13, 13), // Red
    (20, 80, 20), // Green
    (80, 20, 80), // Magenta
    (20, 80, 80), // Cyan
    (80, 80, 20), // Yellow
    (53, 53, 53), // Gray 50%
    (26, 26, 26), // Gray 25%
    (33, 33, 60), // Blue*
    (60, 26, 26), // Red*
    (33, 60, 33), // Green*
    (60, 33, 60), // Magenta*
    (33, 60, 60), // Cyan*
    (60, 60, 33), // Yellow*
    (80, 80, 80), // Gray 75%
];

fn pct(n: u32) -> u8 {
    ((n * 255 + 50) / 100) as u8
}

fn xrgb(r: u32, g: u32, b: u32) -> Rgb {
    Rgb::new(pct(r), pct(g), pct(b))
}

/// DEC HLS to RGB. Hue 0 is blue on DEC terminals, so the angle is
/// rotated by 240 degrees before the standard HSL conversion. L and S
/// are percentages.
pub fn hls_to_rgb(h: u32, l: u32, s: u32) -> Rgb {
    let h = ((h + 240) % 360) as f64;
    let l = l.min(100) as f64 / 100.0;
    let s = s.min(100) as f64 / 100.0;
    if s == 0.0 {
        let v = (l * 255.0 + 0.5) as u8;
        return Rgb::new(v, v, v);
    }
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to8 = |v: f64| ((v + m).clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    Rgb::new(to8(r1), to8(g1), to8(b1))
}

/// The decoded image ready for placement.
#[derive(Debug)]
pub struct SixelFrame {
    /// Row-major RGBA bytes (alpha left opaque).
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Rightmost / bottommost pixel actually touched.
    pub max_x: usize,
    pub max_y: usize,
}

/// DECSIXEL sub-parser state. One instance lives for the duration of a
/// DCS q passthrough.
pub struct SixelParser {
    state: PState,
    pos_x: usize,
    pos_y: usize,
    max_x: usize,
    max_y: usize,
    attributed_pan: u32,
    attributed_pad: u32,
    attributed_ph: usize,
    attributed_pv: usize,
    repeat_count: usize,
    color_index: usize,
    grid_width: usize,
    grid_height: usize,
    params: [u32; PARAMS_MAX],
    nparams: usize,
    param: u32,
    width: usize,
    height: usize,
    /// Indexed pixels; 0 is the background register.
    data: Vec<u16>,
    palette: Box<[Rgb; PALETTE_MAX]>,
    ncolors: usize,
    use_private_register: bool,
    palette_modified: bool,
}

impl SixelParser {
    /// `grid_width`/`grid_height` are the host cell metrics used to round
    /// the final bitmap up to whole cells.
    pub fn new(
        fg: Rgb,
        bg: Rgb,
        use_private_register: bool,
        grid_width: usize,
        grid_height: usize,
    ) -> Self {
        let mut palette = Box::new([Rgb::new(255, 255, 255); PALETTE_MAX]);
        palette[0] = bg;
        if use_private_register {
            palette[1] = fg;
        }
        let mut p = Self {
            state: PState::Body,
            pos_x: 0,
            pos_y: 0,
            max_x: 0,
            max_y: 0,
            attributed_pan: 2,
            attributed_pad: 1,
            attributed_ph: 0,
            attributed_pv: 0,
            repeat_count: 1,
            color_index: 16,
            grid_width: grid_width.max(1),
            grid_height: grid_height.max(1),
            params: [0; PARAMS_MAX],
            nparams: 0,
            param: 0,
            width: 1,
            height: 1,
            data: vec![0; 1],
            palette,
            ncolors: 2,
            use_private_register,
            palette_modified: false,
        };
        if !use_private_register {
            p.set_default_palette();
        }
        p
    }

    fn set_default_palette(&mut self) {
        let mut n = 1;
        for &(r, g, b) in &DEFAULT_TABLE {
            self.palette[n] = xrgb(r as u32, g as u32, b as u32);
            n += 1;
        }
        // 17..232: 6x6x6 cube with step 51 per channel
        for r in 0..6u8 {
            for g in 0..6u8 {
                for b in 0..6u8 {
                    self.palette[n] = Rgb::new(r * 51, g * 51, b * 51);
                    n += 1;
                }
            }
        }
        // 233..256: 24-step grayscale ramp
        for i in 0..24u8 {
            self.palette[n] = Rgb::new(i * 11, i * 11, i * 11);
            n += 1;
        }
        for entry in self.palette.iter_mut().skip(n) {
            *entry = Rgb::new(255, 255, 255);
        }
    }

    /// Grow the bitmap, doubling until the target fits, clamped to the
    /// maximum. Returns false when the target cannot fit at all.
    fn resize_to(&mut self, want_w: usize, want_h: usize) -> bool {
        let mut sx = self.width * 2;
        let mut sy = self.height * 2;
        while sx < want_w || sy < want_h {
            sx *= 2;
            sy *= 2;
        }
        let sx = sx.min(WIDTH_MAX);
        let sy = sy.min(HEIGHT_MAX);
        self.rebuild(sx, sy)
    }

    fn rebuild(&mut self, new_w: usize, new_h: usize) -> bool {
        if new_w == self.width && new_h == self.height {
            return true;
        }
        let mut next = vec![0u16; new_w * new_h];
        let copy_h = self.height.min(new_h);
        let copy_w = self.width.min(new_w);
        for y in 0..copy_h {
            let src = &self.data[y * self.width..y * self.width + copy_w];
            next[y * new_w..y * new_w + copy_w].copy_from_slice(src);
        }
        self.data = next;
        self.width = new_w;
        self.height = new_h;
        true
    }

    /// Consume payload bytes. The caller feeds whatever arrived in the
    /// DCS passthrough; state is kept across calls.
    pub fn parse(&mut self, bytes: &[u8]) {
        for &c in bytes {
            match self.state {
                PState::Body => self.body_byte(c),
                PState::Gra => self.gra_byte(c),
                PState::Gri => self.gri_byte(c),
                PState::Gci => self.gci_byte(c),
            }
        }
    }

    fn begin_params(&mut self, next: PState) {
        self.param = 0;
        self.nparams = 0;
        self.state = next;
    }

    fn push_param(&mut self) {
        if self.nparams < PARAMS_MAX {
            self.params[self.nparams] = self.param;
            self.nparams += 1;
        }
        self.param = 0;
    }

    fn accumulate(&mut self, c: u8) {
        self.param = (self.param * 10 + (c - b'0') as u32).min(PARAM_VALUE_MAX);
    }

    fn body_byte(&mut self, c: u8) {
        match c {
            b'"' => self.begin_params(PState::Gra),
            b'!' => self.begin_params(PState::Gri),
            b'#' => self.begin_params(PState::Gci),
            b'$' => {
                // DECGCR: graphics carriage return
                self.pos_x = 0;
            }
            b'-' => {
                // DECGNL: next sixel band
                self.pos_x = 0;
                if self.pos_y < HEIGHT_MAX - 5 - 6 {
                    self.pos_y += 6;
                } else {
                    self.pos_y = HEIGHT_MAX + 1;
                }
            }
            b'?'..=b'~' => self.sixel_byte(c),
            _ => {}
        }
    }

    fn sixel_byte(&mut self, c: u8) {
        if (self.width < self.pos_x + self.repeat_count || self.height < self.pos_y + 6)
            && self.width < WIDTH_MAX
            && self.height < HEIGHT_MAX
        {
            self.resize_to(self.pos_x + self.repeat_count, self.pos_y + 6);
        }

        if self.color_index > self.ncolors {
            self.ncolors = self.color_index;
        }

        if self.pos_x + self.repeat_count > self.width {
            self.repeat_count = self.width.saturating_sub(self.pos_x);
        }

        if self.repeat_count > 0 && self.pos_y + 5 < self.height + 10 {
            let bits = c - b'?';
            if bits != 0 {
                for i in 0..6usize {
                    if bits & (1 << i) != 0 {
                        let y = self.pos_y + i;
                        if y >= self.height {
                            continue;
                        }
                        let x1 = (self.pos_x + self.repeat_count).min(self.width);
                        for x in self.pos_x..x1 {
                            self.data[y * self.width + x] = self.color_index as u16;
                        }
                        if x1 > 0 && self.max_x < x1 - 1 {
                            self.max_x = x1 - 1;
                        }
                        if self.max_y < y {
                            self.max_y = y;
                        }
                    }
                }
            }
        }
        if self.repeat_count > 0 {
            self.pos_x += self.repeat_count;
        }
        self.repeat_count = 1;
    }

    fn gra_byte(&mut self, c: u8) {
        match c {
            b'0'..=b'9' => self.accumulate(c),
            b';' => self.push_param(),
            _ => {
                self.push_param();
                // " Pad ; Pan ; Ph ; Pv  (aspect numerator/denominator)
                if self.nparams > 0 {
                    self.attributed_pad = self.params[0];
                }
                if self.nparams > 1 {
                    self.attributed_pan = self.params[1];
                }
                if self.nparams > 2 && self.params[2] > 0 {
                    self.attributed_ph = (self.params[2] as usize).min(WIDTH_MAX);
                }
                if self.nparams > 3 && self.params[3] > 0 {
                    self.attributed_pv = (self.params[3] as usize).min(HEIGHT_MAX);
                }
                if self.attributed_pan == 0 {
                    self.attributed_pan = 1;
                }
                if self.attributed_pad == 0 {
                    self.attributed_pad = 1;
                }
                if self.width < self.attributed_ph || self.height < self.attributed_pv {
                    let sx = self.attributed_ph.max(self.width);
                    let sy = self.attributed_pv.max(self.height);
                    let sx = round_up(sx, self.grid_width).min(WIDTH_MAX);
                    let sy = round_up(sy, self.grid_height).min(HEIGHT_MAX);
                    self.rebuild(sx, sy);
                }
                self.state = PState::Body;
                self.param = 0;
                self.nparams = 0;
                // reprocess the terminating byte in the body state
                self.body_byte(c);
            }
        }
    }

    fn gri_byte(&mut self, c: u8) {
        match c {
            b'0'..=b'9' => self.accumulate(c),
            _ => {
                self.repeat_count = (self.param as usize).max(1);
                self.state = PState::Body;
                self.param = 0;
                self.nparams = 0;
                self.body_byte(c);
            }
        }
    }

    fn gci_byte(&mut self, c: u8) {
        match c {
            b'0'..=b'9' => self.accumulate(c),
            b';' => self.push_param(),
            _ => {
                self.state = PState::Body;
                self.push_param();
                if self.nparams > 0 {
                    // register 0 is the background; client registers are
                    // offset by one
                    self.color_index = (1 + self.params[0] as usize).min(PALETTE_MAX - 1);
                }
                if self.nparams > 4 {
                    self.palette_modified = true;
                    let px = self.params[2].min(360);
                    let py = self.params[3].min(100);
                    let pz = self.params[4].min(100);
                    match self.params[1] {
                        1 => {
                            self.palette[self.color_index] = hls_to_rgb(px, py, pz);
                        }
                        2 => {
                            self.palette[self.color_index] =
                                xrgb(px.min(100), py, pz);
                        }
                        _ => {}
                    }
                }
                self.body_byte(c);
            }
        }
    }

    /// Finish decoding: round the bitmap up to whole cells, pad with the
    /// background register, and expand to RGBA.
    pub fn finalize(mut self) -> Option<SixelFrame> {
        self.max_x += 1;
        if self.max_x < self.attributed_ph {
            self.max_x = self.attributed_ph;
        }
        self.max_y += 1;
        if self.max_y < self.attributed_pv {
            self.max_y = self.attributed_pv;
        }

        let sx = round_up(self.max_x, self.grid_width).min(WIDTH_MAX);
        let sy = round_up(self.max_y, self.grid_height).min(HEIGHT_MAX);
        self.rebuild(sx, sy);

        if self.use_private_register && self.ncolors > 2 && !self.palette_modified {
            self.set_default_palette();
        }

        let mut pixels = Vec::with_capacity(self.width * self.height * 4);
        for &idx in &self.data {
            let color = self.palette[(idx as usize).min(PALETTE_MAX - 1)];
            pixels.push(color.r);
            pixels.push(color.g);
            pixels.push(color.b);
            pixels.push(0xFF);
        }

        Some(SixelFrame {
            pixels,
            width: self.width,
            height: self.height,
            max_x: self.max_x,
            max_y: self.max_y,
        })
    }
}

fn round_up(v: usize, unit: usize) -> usize {
    let unit = unit.max(1);
    v.div_ceil(unit) * unit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SixelParser {
        SixelParser::new(Rgb::new(255, 255, 255), Rgb::new(0, 0, 0), true, 8, 16)
    }

    #[test]
    fn minimal_red_column() {
        // palette 0 = red via RGB percentages, then a full-height column
        // twice: "#0;2;100;0;0#0~~"
        let mut p = parser();
        p.parse(b"#0;2;100;0;0#0~~");
        let frame = p.finalize().unwrap();
        assert!(frame.max_x >= 2 && frame.max_y >= 6);
        // pixel rows 0..6 of column 0 are red
        for y in 0..6 {
            let off = (y * frame.width) * 4;
            assert_eq!(
                &frame.pixels[off..off + 3],
                &[255, 0, 0],
                "row {y} should be red"
            );
        }
    }

    #[test]
    fn repeat_introducer_spans_columns() {
        let mut p = parser();
        p.parse(b"#0;2;0;100;0#0!10F");
        // 'F' = 0b000111: bottom three rows of the band stay clear,
        // top three rows set? bits 0..2 set -> rows 0..2.
        let frame = p.finalize().unwrap();
        assert!(frame.max_x >= 10);
        let off = 0;
        assert_eq!(&frame.pixels[off..off + 3], &[0, 255, 0]);
        let row3 = (3 * frame.width) * 4;
        assert_eq!(&frame.pixels[row3..row3 + 3], &[0, 0, 0]);
    }

    #[test]
    fn band_advance_moves_down_six() {
        let mut p = parser();
        p.parse(b"#0;2;0;0;100#0~-~");
        let frame = p.finalize().unwrap();
        // second band starts at y=6
        let off = (6 * frame.width) * 4;
        assert_eq!(&frame.pixels[off..off + 3], &[0, 0, 255]);
        assert!(frame.max_y >= 12);
    }

    #[test]
    fn raster_attributes_set_size() {
        let mut p = parser();
        p.parse(b"\"1;1;20;30#0~");
        let frame = p.finalize().unwrap();
        assert!(frame.width >= 20);
        assert!(frame.height >= 30);
    }

    #[test]
    fn default_palette_cube_and_ramp() {
        let p = SixelParser::new(Rgb::new(255, 255, 255), Rgb::new(0, 0, 0), false, 8, 16);
        // register 1 is VT340 black, register 2 blue-ish
        assert_eq!(p.palette[1], Rgb::new(0, 0, 0));
        assert_eq!(p.palette[2], xrgb(20, 20, 80));
        // cube starts at 17: first entry is pure black
        assert_eq!(p.palette[17], Rgb::new(0, 0, 0));
        assert_eq!(p.palette[17 + 215], Rgb::new(255, 255, 255));
        // gray ramp at 233
        assert_eq!(p.palette[233], Rgb::new(0, 0, 0));
        assert_eq!(p.palette[256], Rgb::new(253, 253, 253));
        // remainder white
        assert_eq!(p.palette[600], Rgb::new(255, 255, 255));
    }

    #[test]
    fn hls_blue_at_zero() {
        // DEC HLS hue 0 is blue
        let c = hls_to_rgb(0, 50, 100);
        assert!(c.b > 200 && c.r < 60 && c.g < 60, "{c:?}");
        let c = hls_to_rgb(120, 50, 100);
        assert!(c.r > 200 && c.g < 60 && c.b < 60, "{c:?}");
        let c = hls_to_rgb(240, 50, 100);
        assert!(c.g > 200, "{c:?}");
        // zero saturation is gray
        assert_eq!(hls_to_rgb(77, 50, 0), Rgb::new(128, 128, 128));
    }

    #[test]
    fn growth_clamps_at_maximum() {
        let mut p = parser();
        let mut data = Vec::new();
        data.extend_from_slice(b"#1");
        // push far beyond the width cap
        for _ in 0..100 {
            data.extend_from_slice(b"!65535~");
        }
        p.parse(&data);
        let frame = p.finalize().unwrap();
        assert!(frame.width <= WIDTH_MAX);
        assert!(frame.height <= HEIGHT_MAX);
    }
}
