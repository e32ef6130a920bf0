//! DCS dispatch: DECRQSS status requests, DECAUPSS, the DECSIXEL
//! passthrough, and the synchronized-update markers.

use crate::image::{Image, ImageFormat};
use crate::sixel::SixelParser;

use super::cell::{AttrFlags, Underline, SIXELCH};
use super::charset;
use super::color::{Color, DynColor};
use super::cursor::CursorShape;
use super::event::TermEvent;
use super::state::{State, TerminalState};

const fn cpair(a: u8, b: u8) -> u32 {
    ((a as u32) << 8) | b as u32
}

impl TerminalState {
    /// Invoked three ways: at the DCS final byte (initialization), from
    /// the passthrough state when the payload buffer fills (chunk), and
    /// at ST (completion).
    pub(crate) fn do_dcs(&mut self) {
        match self.dcs_cmd {
            c if c == cpair(b'!', b'u') => {
                // DECAUPSS: assign user-preferred supplemental set
                if self.state == State::DcsEscape {
                    let code = match self.cmd_buf.len() {
                        1 => self.cmd_buf[0] as u16,
                        2 => ((self.cmd_buf[0] as u16) << 8) | self.cmd_buf[1] as u16,
                        _ => return,
                    };
                    if let Some(cs) = charset::lookup_cset(code, false, false) {
                        self.cursor.decsupp = cs;
                    }
                }
            }
            c if c == b'q' as u32 => self.dcs_sixel(),
            c if c == cpair(b'$', b'q') => {
                if self.state == State::DcsEscape {
                    self.decrqss();
                }
            }
            c if c == cpair(b'=', b's') => {
                // synchronized update begin/end
                match self.arg(0) {
                    1 => {
                        let requested = if self.csi_argc > 1 && self.arg(1) != 0 {
                            Some(self.arg(1) as u64)
                        } else {
                            None
                        };
                        self.begin_synchronized_update(requested);
                    }
                    2 => self.set_suspend_update(0),
                    _ => {}
                }
            }
            _ => {
                // unknown DCS: swallow the payload
                if self.state != State::DcsEscape {
                    self.state = State::DcsIgnore;
                }
            }
        }
    }

    // ---- DECSIXEL -----------------------------------------------------------

    fn dcs_sixel(&mut self) {
        match self.state {
            State::DcsPassthrough => {
                // payload chunk (buffer spill)
                let data = std::mem::take(&mut self.cmd_buf);
                if let Some(parser) = self.sixel.as_mut() {
                    parser.parse(&data);
                }
            }
            State::DcsEscape => {
                let data = std::mem::take(&mut self.cmd_buf);
                let Some(mut parser) = self.sixel.take() else {
                    return;
                };
                parser.parse(&data);
                let Some(frame) = parser.finalize() else {
                    return;
                };
                if frame.pixels.is_empty() {
                    return;
                }

                let (cell_w, cell_h) = (self.cell_width as usize, self.cell_height as usize);
                let width = (frame.width - 1) / cell_w + 1;
                let height = (frame.height - 1) / cell_h + 1;
                let left = self.cursor.col;
                let top = self.virtuallines
                    + if self.modes.sixel_display {
                        0
                    } else {
                        self.cursor.row as i64
                    };
                let blink = self
                    .cursor
                    .attr
                    .flags
                    .intersects(AttrFlags::BLINK | AttrFlags::BLINK2);

                let imgi = self.images.next_id();
                let img = Image {
                    imgi,
                    pixels: Some(frame.pixels),
                    strage: None,
                    format: ImageFormat::Rgba,
                    left,
                    top,
                    width: width.min(u16::MAX as usize) as u16,
                    height: height.min(u16::MAX as usize) as u16,
                    pixelwidth: frame.width as u32,
                    pixelheight: frame.height as u32,
                    blink,
                };
                self.place_image(img);
            }
            _ => {
                // initialization at the final byte
                let fg = self.palette.dynamic(DynColor::Foreground);
                let bg = self.palette.dynamic(DynColor::Background);
                self.sixel = Some(SixelParser::new(
                    fg,
                    bg,
                    true,
                    self.cell_width as usize,
                    self.cell_height as usize,
                ));
            }
        }
    }

    /// Fill the covered cells with the image sentinel and advance the
    /// cursor according to the sixel scrolling modes, then register the
    /// image.
    pub(crate) fn place_image(&mut self, img: Image) {
        let imgi = img.imgi;
        let (width, height) = (img.width, img.height);
        let saved_imgi = self.cursor.attr.imgi;
        self.cursor.attr.imgi = Some(imgi);

        let x0 = self.cursor.col;
        if self.modes.sixel_display {
            // display mode: image renders at the home position, cursor
            // stays put
            let y0 = self.cursor.row;
            for y in 0..height.min(self.rows) {
                self.cursor.row = y;
                self.cursor.col = 0;
                for _ in x0..(x0 + width).min(self.cols) {
                    self.write_char(SIXELCH, 1);
                }
            }
            self.cursor.row = y0;
            self.cursor.col = x0;
        } else {
            for i in 0..height {
                self.cursor.col = x0;
                for _ in x0..(x0 + width).min(self.cols) {
                    self.write_char(SIXELCH, 1);
                }
                if i == height - 1 {
                    // last line: cursor position per scrolling modes
                    if !self.modes.sixel_scrolls_right {
                        self.write_linefeed();
                        self.cursor.col = if self.modes.sixel_scrolls_left { 0 } else { x0 };
                    }
                } else {
                    self.write_linefeed();
                }
            }
        }

        self.cursor.attr.imgi = saved_imgi;
        self.images.place(img);
        self.event(TermEvent::ImagePlaced { imgi });
    }

    // ---- DECRQSS ------------------------------------------------------------

    /// Request Status String: the current value is reported encoded as
    /// its own setter sequence, or rejected with a 0 response.
    fn decrqss(&mut self) {
        let query = String::from_utf8_lossy(&self.cmd_buf).to_string();
        let reply = match query.as_str() {
            "m" => Some(self.sgr_status()),
            "r" => Some(format!("{};{}r", self.marg_top + 1, self.marg_bot + 1)),
            "s" => Some(format!("{};{}s", self.marg_left + 1, self.marg_right + 1)),
            "\"p" => Some("65;1\"p".to_string()),
            "\"q" => Some(format!(
                "{}\"q",
                u8::from(self.cursor.attr.flags.contains(AttrFlags::PROTECTED))
            )),
            " q" => {
                let style = match self.cursor_shape {
                    None => 0,
                    Some(CursorShape::Block) => 0,
                    Some(CursorShape::Underline) => 2,
                    Some(CursorShape::Bar) => 4,
                };
                let blink_off = !self.cursor_blinks.unwrap_or(true);
                Some(format!("{} q", style + 1 + u8::from(blink_off)))
            }
            "t" if self.rows >= 24 => Some(format!("{}t", self.rows)),
            "$|" => Some(format!("{}$|", self.cols)),
            "*|" => Some(format!("{}*|", self.rows)),
            _ => None,
        };
        match reply {
            Some(pt) => self.respond_str(format!("\x1bP1$r{}\x1b\\", pt)),
            None => self.respond_str(format!("\x1bP0$r{}\x1b\\", query)),
        }
    }

    /// Encode the current SGR state as the parameters of an SGR setter.
    fn sgr_status(&self) -> String {
        let attr = &self.cursor.attr;
        let f = attr.flags;
        let mut out = String::from("0");

        if f.contains(AttrFlags::BOLD) {
            out.push_str(";1");
        }
        if f.contains(AttrFlags::DIM) {
            out.push_str(";2");
        }
        if f.contains(AttrFlags::SHADOW) {
            out.push_str(";1:2");
        }
        if f.contains(AttrFlags::ITALIC) {
            out.push_str(";3");
        }
        match attr.underline {
            Underline::None => {}
            Underline::Single => out.push_str(";4"),
            Underline::Curly => out.push_str(";4:3"),
            Underline::Broken => out.push_str(";4:4"),
            Underline::BrokenDouble => out.push_str(";4:5"),
            Underline::Double => {} // reported as 21 below
        }
        if f.contains(AttrFlags::BLINK) {
            out.push_str(";5");
        }
        if f.contains(AttrFlags::BLINK2) {
            out.push_str(";6");
        }
        if f.contains(AttrFlags::REVERSE) {
            out.push_str(";7");
        }
        if f.contains(AttrFlags::INVISIBLE) {
            out.push_str(";8");
        }
        if f.contains(AttrFlags::OVERSTRIKE) {
            out.push_str(";8:7");
        }
        if f.contains(AttrFlags::STRIKEOUT) {
            out.push_str(";9");
        }
        if attr.underline == Underline::Double {
            out.push_str(";21");
        }
        if f.contains(AttrFlags::FRAMED) {
            out.push_str(";51;52");
        }
        if f.contains(AttrFlags::OVERLINED) {
            out.push_str(";53");
        }
        if f.contains(AttrFlags::SUPERSCRIPT) {
            out.push_str(";73");
        }
        if f.contains(AttrFlags::SUBSCRIPT) {
            out.push_str(";74");
        }

        if self.cursor.oem_acs != 0 {
            out.push_str(&format!(";{}", 10 + self.cursor.oem_acs));
        } else if attr.font != 0 {
            out.push_str(&format!(";{}", 10 + attr.font));
        }

        match attr.fg {
            Color::Default => {}
            Color::Indexed(n) if n < 8 => out.push_str(&format!(";{}", 30 + n)),
            Color::Indexed(n) if n < 16 => out.push_str(&format!(";{}", 90 + n - 8)),
            Color::Indexed(n) => out.push_str(&format!(";38:5:{}", n)),
            Color::Rgb(r, g, b) => out.push_str(&format!(";38:2::{}:{}:{}", r, g, b)),
        }
        match attr.bg {
            Color::Default => {}
            Color::Indexed(n) if n < 8 => out.push_str(&format!(";{}", 40 + n)),
            Color::Indexed(n) if n < 16 => out.push_str(&format!(";{}", 100 + n - 8)),
            Color::Indexed(n) => out.push_str(&format!(";48:5:{}", n)),
            Color::Rgb(r, g, b) => out.push_str(&format!(";48:2::{}:{}:{}", r, g, b)),
        }
        if let Some(ul) = attr.ulcolr {
            out.push_str(&format!(";58:2::{}:{}:{}", ul.r, ul.g, ul.b));
        }

        out.push('m');
        out
    }
}
