//! OSC dispatch. The command number and string arrive via the
//! OSC_NUM / CMD_STRING states; BEL or ST lands here.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use crate::config::contains;
use crate::image::{Image, ImageFormat};

use super::color::{self, DynColor};
use super::event::TermEvent;
use super::state::{State, TerminalState};

impl TerminalState {
    fn osc_fini(&self) -> &'static str {
        if self.state == State::CmdEscape {
            "\x1b\\"
        } else {
            "\x07"
        }
    }

    pub(crate) fn do_cmd(&mut self) {
        let num = self.cmd_num;
        if !self.cfg.suppress_osc.is_empty() && contains(&self.cfg.suppress_osc, num as i64) {
            return;
        }
        let buf = String::from_utf8_lossy(&self.cmd_buf).to_string();

        match num {
            0 | 2 => {
                self.title = buf.clone();
                self.event(TermEvent::TitleChanged { title: buf });
            }
            1 => {} // icon label: parsed, not used
            4 => self.do_colour_osc(true, 4, false),
            5 => self.do_colour_osc(true, 5, false),
            104 => self.do_colour_osc(true, 4, true),
            105 => self.do_colour_osc(true, 5, true),
            6 | 106 => {
                let mut it = buf.split(';');
                if let (Some(col), Some(on)) = (it.next(), it.next()) {
                    let on = on == "1";
                    match col {
                        "0" => self.enable_bold_colour = on,
                        "2" => self.enable_blink_colour = on,
                        _ => {}
                    }
                }
            }
            10..=19 => self.do_colour_osc(false, num as u32, false),
            110..=119 => self.do_colour_osc(false, num as u32 - 100, true),
            7 => {
                // working directory, file://host/path scheme
                let mut s = buf.as_str();
                if let Some(rest) = s.strip_prefix("file:") {
                    s = rest;
                }
                if let Some(rest) = s.strip_prefix("//localhost/") {
                    self.event(TermEvent::CwdChanged {
                        path: format!("/{rest}"),
                    });
                    return;
                }
                if let Some(rest) = s.strip_prefix("///") {
                    self.event(TermEvent::CwdChanged {
                        path: format!("/{rest}"),
                    });
                    return;
                }
                if s.is_empty() || s.starts_with('/') {
                    self.event(TermEvent::CwdChanged {
                        path: s.to_string(),
                    });
                }
            }
            8 => {
                // hyperlink: params ; URI
                match buf.split_once(';') {
                    Some((_params, uri)) if !uri.is_empty() => {
                        self.cursor.attr.link = Some(self.putlink(uri));
                    }
                    _ => self.cursor.attr.link = None,
                }
            }
            9 => self.osc_progress(&buf),
            22 => self.event(TermEvent::PointerShape { name: buf }),
            50 => self.osc_font(&buf),
            52 => self.do_clipboard(&buf),
            701 => {
                if buf == "?" {
                    let reply = format!("\x1b]701;{}{}", self.cfg.locale, self.osc_fini());
                    self.respond_str(reply);
                } else {
                    self.cfg.locale = buf;
                }
            }
            1337 => self.osc_iterm_image(&buf),
            7721 => {
                let title = self.title.clone();
                self.event(TermEvent::CopyText { text: title });
            }
            7773 => {
                // change icon, optional ",index" suffix
                let (path, index) = match buf.rsplit_once(',') {
                    Some((p, ix)) => match ix.trim().parse::<u32>() {
                        Ok(n) => (p.to_string(), n),
                        Err(_) => (buf.clone(), 0),
                    },
                    None => (buf.clone(), 0),
                };
                self.event(TermEvent::IconChanged { path, index });
            }
            7770 | 7777 => {
                let with_window = num == 7777;
                if buf == "?" {
                    let reply = format!(
                        "\x1b]{};{}{}",
                        num,
                        self.cfg.font.size as u32,
                        self.osc_fini()
                    );
                    self.respond_str(reply);
                } else if let Ok(n) = buf.parse::<i32>() {
                    let relative = buf.starts_with('+') || buf.starts_with('-');
                    self.event(TermEvent::FontSize {
                        delta: n,
                        relative,
                        with_window,
                    });
                }
            }
            7771 => {
                // glyph coverage query: reply echoes unsupported entries;
                // coverage is the host's business, so report all present
                let Some(rest) = buf.strip_prefix('?') else {
                    return;
                };
                let count = rest.split(';').skip(1).count();
                let body = ";".repeat(count);
                let reply = format!("\x1b]7771;!{}{}", body, self.osc_fini());
                self.respond_str(reply);
            }
            77119 => {
                let what = buf.trim().parse::<u32>().unwrap_or(0);
                self.wide_indic = what & 1 != 0;
                self.wide_extra = what & 2 != 0;
            }
            _ => {}
        }
    }

    // ---- colors -------------------------------------------------------------

    /// OSC 4/5/104/105 (indexed and special colors, `has_index_arg`) and
    /// the OSC 10..19 dynamic colors. Multiple ';'-separated values are
    /// processed in sequence; dynamic colors auto-increment the target
    /// unless an explicit "N;" retargets it.
    fn do_colour_osc(&mut self, has_index_arg: bool, osc: u32, reset: bool) {
        let buf = String::from_utf8_lossy(&self.cmd_buf).to_string();

        if has_index_arg && reset && buf.is_empty() {
            // bare OSC 104 / 105: reset everything it governs
            if osc == 4 {
                self.palette.reset_all();
            } else {
                self.palette.reset_dynamic(DynColor::BoldFg);
                self.palette.reset_dynamic(DynColor::BlinkFg);
            }
            self.event(TermEvent::PaletteChanged);
            return;
        }

        let mut changed = false;
        let mut tokens = buf.split(';').peekable();
        let mut osc_num = osc;

        while tokens.peek().is_some() {
            if has_index_arg {
                let Some(index) = tokens.next().and_then(|t| t.trim().parse::<u32>().ok())
                else {
                    break;
                };
                let target = if osc % 100 == 5 {
                    match index {
                        0 => Some(DynColor::BoldFg),
                        2 => Some(DynColor::BlinkFg),
                        _ => None,
                    }
                } else if index < 256 {
                    None // handled below as indexed
                } else {
                    break;
                };
                if reset {
                    match target {
                        Some(dc) => self.palette.reset_dynamic(dc),
                        None if osc % 100 == 4 => self.palette.reset_indexed(index as u8),
                        None => {}
                    }
                    changed = true;
                    continue;
                }
                let Some(value) = tokens.next() else { break };
                if value == "?" {
                    let rgb = match target {
                        Some(dc) => self.palette.dynamic(dc),
                        None => self.palette.indexed(index as u8),
                    };
                    let reply = format!(
                        "\x1b]{};{};{}{}",
                        osc,
                        index,
                        color::format_query(rgb),
                        self.osc_fini()
                    );
                    self.respond_str(reply);
                } else if let Some(rgb) = color::parse_color(value) {
                    match target {
                        Some(dc) => self.palette.set_dynamic(dc, rgb),
                        None if osc % 100 == 4 => self.palette.set_indexed(index as u8, rgb),
                        None => {}
                    }
                    changed = true;
                }
            } else {
                // dynamic colors
                let which = DynColor::from_osc(osc_num);
                if reset {
                    if let Some(dc) = which {
                        self.palette.reset_dynamic(dc);
                        changed = true;
                    }
                    break; // reset forms carry no value list
                }
                let Some(value) = tokens.next() else { break };
                if value == "?" {
                    if let Some(dc) = which {
                        let rgb = self.palette.dynamic(dc);
                        let reply = format!(
                            "\x1b]{};{}{}",
                            osc_num,
                            color::format_query(rgb),
                            self.osc_fini()
                        );
                        self.respond_str(reply);
                    }
                } else if let Some(rgb) = color::parse_color(value) {
                    if let Some(dc) = which {
                        self.palette.set_dynamic(dc, rgb);
                        changed = true;
                    }
                }
                // auto-increment, unless the next token retargets: a bare
                // number followed by more values means "OSC 10;blue;12;red"
                if let Some(next) = tokens.peek() {
                    if let Ok(n) = next.trim().parse::<u32>() {
                        tokens.next();
                        osc_num = n;
                    } else {
                        osc_num += 1;
                    }
                }
            }
        }

        if changed {
            self.event(TermEvent::PaletteChanged);
        }
    }

    // ---- clipboard ----------------------------------------------------------

    /// OSC 52: set the clipboard from a base64 payload. Reading back is
    /// not supported; writing requires the configuration to allow it.
    fn do_clipboard(&mut self, buf: &str) {
        if !self.cfg.allow_set_selection {
            return;
        }
        let Some((_, payload)) = buf.split_once(';') else {
            return;
        };
        if payload.starts_with('?') {
            // clipboard reads are refused
            return;
        }
        if let Ok(decoded) = BASE64_STANDARD.decode(payload.as_bytes()) {
            let text = String::from_utf8_lossy(&decoded).to_string();
            self.event(TermEvent::CopyText { text });
        }
    }

    // ---- font ---------------------------------------------------------------

    fn osc_font(&mut self, buf: &str) {
        if self.tek.active() {
            self.event(TermEvent::FontChanged {
                family: 0,
                name: buf.to_string(),
            });
            return;
        }
        let family = self.cursor.attr.font;
        if buf == "?" {
            let reply = format!("\x1b]50;{}{}", self.cfg.font.name, self.osc_fini());
            self.respond_str(reply);
        } else {
            self.event(TermEvent::FontChanged {
                family,
                name: buf.to_string(),
            });
        }
    }

    // ---- progress -----------------------------------------------------------

    /// OSC 9;4: progress indication with named or numeric states.
    fn osc_progress(&mut self, buf: &str) {
        let mut parts = buf.split(';');
        let cmd = parts.next().unwrap_or("");
        if cmd != "4" && !cmd.eq_ignore_ascii_case("progress") {
            return;
        }
        let state = match parts.next() {
            Some(s) => match s.to_ascii_lowercase().as_str() {
                "off" | "0" => 0,
                "default" | "" => 10,
                "green" | "1" => 1,
                "yellow" | "4" => 2,
                "red" | "2" => 3,
                "busy" | "3" => 8,
                _ => return,
            },
            None => return,
        };
        let percent = parts
            .next()
            .and_then(|p| p.parse::<i8>().ok())
            .unwrap_or(-1);
        self.event(TermEvent::Progress { state, percent });
    }

    // ---- iTerm2 inline images ----------------------------------------------

    /// OSC 1337 File=... : inline image upload. The payload stays in its
    /// original encoding; the host rasterizes at paint time.
    fn osc_iterm_image(&mut self, buf: &str) {
        let Some(rest) = buf.strip_prefix("File=") else {
            return;
        };
        let Some((params, payload)) = rest.split_once(':') else {
            return;
        };

        let (cell_w, cell_h) = (self.cell_width as u32, self.cell_height as u32);
        let mut width_cells = 0u32;
        let mut height_cells = 0u32;
        let mut pixelwidth = 0u32;
        let mut pixelheight = 0u32;
        let mut preserve_ar = true;
        let mut crop = [0i32; 4];

        for part in params.split(';') {
            let Some((key, val)) = part.split_once('=') else {
                continue;
            };
            let digits: String = val.chars().take_while(|c| c.is_ascii_digit()).collect();
            let n: u32 = digits.parse().unwrap_or(0);
            let suffix = &val[digits.len()..];
            let px = suffix == "px";
            let percent = suffix == "%";
            match key {
                "name" => {}
                "width" => {
                    if px {
                        pixelwidth = n;
                        width_cells = n.saturating_sub(1) / cell_w + 1;
                    } else if percent {
                        width_cells = self.cols as u32 * n / 100;
                        pixelwidth = width_cells * cell_w;
                    } else {
                        width_cells = n;
                        pixelwidth = n * cell_w;
                    }
                }
                "height" => {
                    if px {
                        pixelheight = n;
                        height_cells = n.saturating_sub(1) / cell_h + 1;
                    } else if percent {
                        height_cells = self.rows as u32 * n / 100;
                        pixelheight = height_cells * cell_h;
                    } else {
                        height_cells = n;
                        pixelheight = n * cell_h;
                    }
                }
                "preserveAspectRatio" => preserve_ar = n != 0,
                "cropX" | "cropLeft" => {
                    if px {
                        crop[0] = n as i32;
                    }
                }
                "cropY" | "cropTop" => {
                    if px {
                        crop[1] = n as i32;
                    }
                }
                "cropWidth" => {
                    if px {
                        crop[2] = n as i32;
                    }
                }
                "cropHeight" => {
                    if px {
                        crop[3] = n as i32;
                    }
                }
                "cropRight" => {
                    if px {
                        crop[2] = -(n as i32);
                    }
                }
                "cropBottom" => {
                    if px {
                        crop[3] = -(n as i32);
                    }
                }
                _ => {}
            }
        }
        let _ = (preserve_ar, crop);

        let Ok(data) = BASE64_STANDARD.decode(payload.as_bytes()) else {
            tracing::info!("dropping inline image with undecodable payload");
            return;
        };
        if data.is_empty() {
            return;
        }

        if width_cells == 0 {
            width_cells = 1;
            pixelwidth = cell_w;
        }
        if height_cells == 0 {
            height_cells = 1;
            pixelheight = cell_h;
        }

        let imgi = self.images.next_id();
        let left = self.cursor.col;
        let top = self.virtuallines + self.cursor.row as i64;
        let img = Image {
            imgi,
            pixels: Some(data),
            strage: None,
            format: ImageFormat::Encoded,
            left,
            top,
            width: width_cells.min(u16::MAX as u32) as u16,
            height: height_cells.min(u16::MAX as u32) as u16,
            pixelwidth,
            pixelheight,
            blink: false,
        };
        self.place_image(img);
    }
}
