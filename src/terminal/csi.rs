//! CSI dispatch: sequences are keyed by the pair of the collected
//! intermediate/private byte(s) and the final byte.

use crate::config::contains;

use super::cell::{Attr, AttrFlags, Underline};
use super::charset::Charset;
use super::color::{Color, Rgb};
use super::cursor::CursorShape;
use super::event::{TermEvent, WindowOp};
use super::grid::RowFlags;
use super::modes::{MouseEnc, MouseMode};
use super::reply;
use super::state::{AttrMask, TerminalState, SUB_PARS};

const fn cpair(mods: u8, c: u8) -> u16 {
    ((mods as u16) << 8) | c as u16
}

/// XTPUSHSGR stack capacity.
const ATTR_STACK_MAX: usize = 10;

impl TerminalState {
    pub(crate) fn arg(&self, i: usize) -> u32 {
        self.csi_argv.get(i).map_or(0, |v| v & !SUB_PARS)
    }

    fn arg_def1(&self, i: usize) -> u32 {
        match self.arg(i) {
            0 => 1,
            v => v,
        }
    }

    fn arg_or(&self, i: usize, default: u32) -> u32 {
        match self.arg(i) {
            0 => default,
            v => v,
        }
    }

    pub(crate) fn do_csi(&mut self, c: u8) {
        let arg0 = self.arg(0);
        let arg1 = self.arg(1);
        // repeat counts saturate at the documented parameter maximum
        let arg0_def1 = self.arg_def1(0).min(65535);
        let urows = self.rows as u32;
        let ucols = self.cols as u32;

        // DECRQM arrives as ESC [ ? Pm $ p: fold the private marker away
        // and let the '$'+'p' pair carry it.
        if self.esc_mod == 0xFF && self.esc_mod0 == b'?' && self.esc_mod1 == b'$' && c == b'p' {
            self.esc_mod = b'$';
        }

        let key = cpair(self.esc_mod, c);
        match key {
            k if k == cpair(b'!', b'p') => {
                // DECSTR: soft reset
                self.reset(false);
            }
            k if k == cpair(0, b'b') => {
                // REP: repeat preceding graphic character
                if let Some(ch) = self.last_char {
                    let count = arg0_def1.min(self.cols as u32 * self.rows as u32);
                    let attr = std::mem::replace(&mut self.cursor.attr, self.last_attr);
                    let width = self.last_width;
                    for _ in 0..count {
                        self.write_char(ch, width);
                    }
                    self.cursor.attr = attr;
                }
                return; // REP keeps the repeat memory
            }
            k if k == cpair(0, b'A') => {
                // CUU
                let (x, y) = (self.cursor.col as i32, self.cursor.row as i32);
                self.move_to(x, y - arg0_def1 as i32, 1);
            }
            k if k == cpair(0, b'B') || k == cpair(0, b'e') => {
                // CUD / VPR
                let (x, y) = (self.cursor.col as i32, self.cursor.row as i32);
                self.move_to(x, y + arg0_def1 as i32, 1);
            }
            k if k == cpair(0, b'C') || k == cpair(0, b'a') => {
                // CUF / HPR
                let (x, y) = (self.cursor.col as i32, self.cursor.row as i32);
                self.move_to(x + arg0_def1 as i32, y, 1);
            }
            k if k == cpair(0, b'D') => {
                // CUB, with reverse wrapping through the backspace path
                let mut n = arg0_def1 as i32;
                if n > self.cursor.col as i32 {
                    n -= self.cursor.col as i32 + 1;
                    let y = self.cursor.row as i32;
                    self.move_to(0, y, 1);
                    self.write_backspace();
                    let (x, y) = (self.cursor.col as i32, self.cursor.row as i32);
                    self.move_to(x - n, y, 1);
                } else {
                    let (x, y) = (self.cursor.col as i32, self.cursor.row as i32);
                    self.move_to(x - n, y, 1);
                }
            }
            k if k == cpair(0, b'E') => {
                // CNL
                let y = self.cursor.row as i32;
                self.move_to(0, y + arg0_def1 as i32, 1);
            }
            k if k == cpair(0, b'F') => {
                // CPL
                let y = self.cursor.row as i32;
                self.move_to(0, y - arg0_def1 as i32, 1);
            }
            k if k == cpair(0, b'G') || k == cpair(0, b'`') => {
                // CHA / HPA
                let origin = self.cursor.origin;
                let x = if origin { self.marg_left as i32 } else { 0 } + arg0_def1 as i32 - 1;
                let y = self.cursor.row as i32;
                self.move_to(x, y, if origin { 2 } else { 0 });
            }
            k if k == cpair(0, b'd') => {
                // VPA
                let origin = self.cursor.origin;
                let y = if origin { self.marg_top as i32 } else { 0 } + arg0_def1 as i32 - 1;
                let x = self.cursor.col as i32;
                self.move_to(x, y, if origin { 2 } else { 0 });
            }
            k if k == cpair(0, b'H') || k == cpair(0, b'f') => {
                // CUP / HVP
                let origin = self.cursor.origin;
                let x = if origin { self.marg_left as i32 } else { 0 }
                    + self.arg_or(1, 1) as i32
                    - 1;
                let y = if origin { self.marg_top as i32 } else { 0 } + arg0_def1 as i32 - 1;
                self.move_to(x, y, if origin { 2 } else { 0 });
            }
            k if k == cpair(0, b'I') => {
                // CHT
                for _ in 0..arg0_def1 {
                    self.write_tab();
                }
            }
            k if k == cpair(0, b'Z') => {
                // CBT
                for _ in 0..arg0_def1 {
                    if self.cursor.col == 0 {
                        break;
                    }
                    loop {
                        self.cursor.col -= 1;
                        if self.cursor.col == 0 || self.tabs[self.cursor.col as usize] {
                            break;
                        }
                    }
                }
            }
            k if k == cpair(0, b'J') || k == cpair(b'?', b'J') => {
                // ED / DECSED
                let selective = self.esc_mod == b'?' || self.iso_guarded_area;
                if arg0 == 3 {
                    self.clear_scrollback();
                } else if arg0 <= 2 {
                    let above = arg0 == 1 || arg0 == 2;
                    let below = arg0 == 0 || arg0 == 2;
                    self.erase(selective, false, above, below);
                }
            }
            k if k == cpair(0, b'K') || k == cpair(b'?', b'K') => {
                // EL / DECSEL
                let selective = self.esc_mod == b'?' || self.iso_guarded_area;
                if arg0 <= 2 {
                    let right = arg0 == 0 || arg0 == 2;
                    let left = arg0 == 1 || arg0 == 2;
                    self.erase(selective, true, left, right);
                }
            }
            k if k == cpair(0, b'X') => {
                // ECH: blank cells without moving the cursor
                let (x, y) = (self.cursor.col, self.cursor.row);
                let n = arg0_def1.min((self.cols - x) as u32) as u16;
                if n > 0 {
                    self.check_boundary(x, y);
                    self.check_boundary(x + n, y);
                    let erase = self.erase_cell();
                    let guarded = self.iso_guarded_area;
                    let grid = self.agrid_mut();
                    let row = grid.row_mut(y);
                    for i in x as usize..(x + n) as usize {
                        if guarded && row.cells[i].attr.flags.contains(AttrFlags::PROTECTED) {
                            continue;
                        }
                        row.clear_cc(i);
                        row.cells[i] = erase;
                    }
                }
            }
            k if k == cpair(0, b'L') => {
                // IL
                if self.cursor_in_margins() {
                    let (y, bot) = (self.cursor.row, self.marg_bot);
                    self.do_scroll(y, bot, -(arg0_def1 as i32), false);
                    self.cursor.col = self.marg_left;
                }
            }
            k if k == cpair(0, b'M') => {
                // DL
                if self.cursor_in_margins() {
                    let (y, bot) = (self.cursor.row, self.marg_bot);
                    self.do_scroll(y, bot, arg0_def1 as i32, true);
                    self.cursor.col = self.marg_left;
                }
            }
            k if k == cpair(0, b'@') => self.insert_char(arg0_def1 as i32),
            k if k == cpair(0, b'P') => self.insert_char(-(arg0_def1 as i32)),
            k if k == cpair(0, b'S') => {
                // SU
                let (top, bot) = (self.marg_top, self.marg_bot);
                self.do_scroll(top, bot, arg0_def1 as i32, true);
                self.cursor.wrapnext = false;
            }
            k if k == cpair(0, b'T') => {
                // SD (avoid clash with hilight-tracking form)
                if self.csi_argc <= 1 {
                    let (top, bot) = (self.marg_top, self.marg_bot);
                    self.do_scroll(top, bot, -(arg0_def1 as i32), true);
                    self.cursor.wrapnext = false;
                }
            }
            k if k == cpair(0, b'h') || k == cpair(b'?', b'h') => self.set_modes(true),
            k if k == cpair(0, b'l') || k == cpair(b'?', b'l') => self.set_modes(false),
            k if k == cpair(b'?', b's') => {
                // XTSAVE
                let arg = arg0 as i32;
                let val = self.get_mode(true, arg0);
                if val != 0 {
                    self.mode_stack.push(arg, val as i32);
                }
            }
            k if k == cpair(b'?', b'r') => {
                // XTRESTORE
                if let Some(val) = self.mode_stack.pop(arg0 as i32) {
                    self.csi_argc = 1;
                    self.set_modes(val & 1 == 1);
                }
            }
            k if k == cpair(b'#', b'{') || k == cpair(b'#', b'p') => self.push_attrs(),
            k if k == cpair(b'#', b'}') || k == cpair(b'#', b'q') => self.pop_attrs(),
            k if k == cpair(b'#', b'P') => {
                // XTPUSHCOLORS
                self.palette.push();
            }
            k if k == cpair(b'#', b'Q') => {
                // XTPOPCOLORS
                if self.palette.pop() {
                    self.event(TermEvent::PaletteChanged);
                    self.event(TermEvent::InvalidateAll);
                }
            }
            k if k == cpair(b'#', b'R') => {
                // XTREPORTCOLORS
                let (cur, num) = self.palette.stack_report();
                self.respond_str(format!("\x1b[?{};{}#Q", cur, num));
            }
            k if k == cpair(b'$', b'p') => {
                // DECRQM
                let private = self.esc_mod0 == b'?';
                let value = self.get_mode(private, arg0);
                self.respond_str(reply::decrpm(private, arg0, value));
            }
            k if k == cpair(0, b'i') || k == cpair(b'?', b'i') => self.media_copy(arg0),
            k if k == cpair(0, b'g') => {
                // TBC
                if arg0 == 0 {
                    self.tabs[self.cursor.col as usize] = false;
                } else if arg0 == 3 {
                    self.tabs.iter_mut().for_each(|t| *t = false);
                }
            }
            k if k == cpair(0, b'r') => {
                // DECSTBM
                let top = arg0_def1 - 1;
                let bot = self.arg_or(1, urows).min(urows) - 1;
                if bot > top {
                    self.marg_top = top as u16;
                    self.marg_bot = bot as u16;
                    let origin = self.cursor.origin;
                    let x = if origin { self.marg_left as i32 } else { 0 };
                    let y = if origin { self.marg_top as i32 } else { 0 };
                    self.move_to(x, y, 0);
                }
            }
            k if k == cpair(0, b's') => {
                if self.modes.lrmargmode {
                    // DECSLRM
                    let left = arg0_def1 - 1;
                    let right = self.arg_or(1, ucols).min(ucols) - 1;
                    if right > left {
                        self.marg_left = left as u16;
                        self.marg_right = right as u16;
                        let origin = self.cursor.origin;
                        let x = if origin { self.marg_left as i32 } else { 0 };
                        let y = if origin { self.marg_top as i32 } else { 0 };
                        self.move_to(x, y, 0);
                    }
                } else {
                    // SCOSC
                    self.save_cursor();
                }
            }
            k if k == cpair(0, b'u') => self.restore_cursor(),
            k if k == cpair(0, b'm') => self.do_sgr(),
            k if k == cpair(b'>', b'm') => {
                // xterm modifier key settings; only modifyOtherKeys
                if arg0 == 0 {
                    self.modes.modify_other_keys = 0;
                } else if arg0 == 4 {
                    self.modes.modify_other_keys = arg1.min(2) as u8;
                }
            }
            k if k == cpair(b'>', b'n') => {
                if arg0 == 4 {
                    self.modes.modify_other_keys = 0;
                }
            }
            k if k == cpair(b'>', b'p') => {
                // xterm pointerMode
                if arg0 == 0 {
                    self.modes.hide_mouse = false;
                } else if arg0 == 2 {
                    self.modes.hide_mouse = true;
                }
            }
            k if k == cpair(b'>', b'c') => {
                // Secondary DA
                if arg0 == 0 {
                    self.respond(reply::SECONDARY_DA.as_bytes().to_vec());
                }
            }
            k if k == cpair(b'=', b'c') => {
                // Tertiary DA
                if arg0 == 0 {
                    self.respond(reply::TERTIARY_DA.as_bytes().to_vec());
                }
            }
            k if k == cpair(b'>', b'q') => {
                // XTVERSION
                if arg0 == 0 {
                    self.respond_str(reply::version_report());
                }
            }
            k if k == cpair(0, b'c') => {
                // Primary DA
                if arg0 == 0 {
                    self.write_primary_da();
                }
            }
            k if k == cpair(0, b't') => {
                // DECSLPP for 24 and up, dtterm window ops below
                if arg0 >= 24 {
                    if !contains(&self.cfg.suppress_win, 24) {
                        let cols = self.cols;
                        self.event(TermEvent::Window(WindowOp::SetCharSize {
                            rows: arg0.min(u16::MAX as u32) as u16,
                            cols,
                        }));
                        self.sel.selected = false;
                    }
                } else {
                    self.do_winop();
                }
            }
            k if k == cpair(b'$', b'|') => {
                // DECSCPP
                let rows = self.rows;
                let cols = self.arg_or(0, self.cfg.cols as u32).min(u16::MAX as u32) as u16;
                self.event(TermEvent::Window(WindowOp::SetCharSize { rows, cols }));
                self.sel.selected = false;
            }
            k if k == cpair(b'*', b'|') => {
                // DECSNLS
                let rows = self.arg_or(0, self.cfg.rows as u32).min(u16::MAX as u32) as u16;
                let cols = self.cols;
                self.event(TermEvent::Window(WindowOp::SetCharSize { rows, cols }));
                self.sel.selected = false;
            }
            k if k == cpair(0, b'x') => {
                // DECREQTPARM
                if arg0 <= 1 {
                    self.respond_str(format!("\x1b[{};1;1;120;120;1;0x", arg0 + 2));
                }
            }
            k if k == cpair(b'$', b'w') => {
                // DECTABSR
                if arg0 == 2 {
                    let mut out = String::from("\x1bP2$");
                    let mut sep = 'u';
                    for (i, &t) in self.tabs.iter().enumerate() {
                        if t {
                            out.push(sep);
                            out.push_str(&(i + 1).to_string());
                            sep = '/';
                        }
                    }
                    out.push_str("\x1b\\");
                    self.respond_str(out);
                }
            }
            k if k == cpair(b' ', b'q') => {
                // DECSCUSR
                self.cursor_shape = match arg0 {
                    0 => None,
                    1 | 2 => Some(CursorShape::Block),
                    3 | 4 => Some(CursorShape::Underline),
                    _ => Some(CursorShape::Bar),
                };
                self.cursor_blinks = if arg0 == 0 {
                    None
                } else {
                    Some(arg0 % 2 == 1)
                };
                if arg0 % 2 == 1 {
                    self.cursor_blink_interval = arg1;
                }
            }
            k if k == cpair(b'?', b'c') => {
                // Linux console cursor size
                self.cursor_size = arg0;
            }
            k if k == cpair(b'"', b'q') => {
                // DECSCA
                match arg0 {
                    0 | 2 => {
                        self.cursor.attr.flags -= AttrFlags::PROTECTED;
                        self.iso_guarded_area = false;
                    }
                    1 => {
                        self.cursor.attr.flags |= AttrFlags::PROTECTED;
                        self.iso_guarded_area = false;
                    }
                    _ => {}
                }
            }
            k if k == cpair(b'"', b'p') => {
                // DECSCL: conformance level selection is accepted and
                // reported back via DECRQSS; no behavior switch here.
            }
            k if k == cpair(0, b'n') => match arg0 {
                5 => self.respond(b"\x1b[0n".to_vec()),
                6 => {
                    let row = self.cursor.row + 1
                        - if self.cursor.origin { self.marg_top } else { 0 };
                    let col = self.cursor.col + 1
                        - if self.cursor.origin { self.marg_left } else { 0 };
                    self.respond_str(reply::cpr(false, row, col));
                }
                _ => {}
            },
            k if k == cpair(b'?', b'n') => match arg0 {
                6 => {
                    // DECXCPR
                    let row = self.cursor.row + 1
                        - if self.cursor.origin { self.marg_top } else { 0 };
                    let col = self.cursor.col + 1
                        - if self.cursor.origin { self.marg_left } else { 0 };
                    self.respond_str(reply::cpr(true, row, col));
                }
                15 => self.respond(b"\x1b[?10n".to_vec()),
                26 => self.respond(b"\x1b[?27;0;0n".to_vec()),
                53 | 55 => self.respond(b"\x1b[?53n".to_vec()),
                56 => self.respond(b"\x1b[?57;1n".to_vec()),
                _ => {}
            },
            k if k == cpair(b'\'', b'z') => self.declr_enable(arg0, arg1),
            k if k == cpair(b'\'', b'{') => {
                // DECSLE
                for i in 0..self.csi_argc {
                    match self.arg(i) {
                        0 => {
                            self.sel.locator_report_up = false;
                            self.sel.locator_report_dn = false;
                        }
                        1 => self.sel.locator_report_dn = true,
                        2 => self.sel.locator_report_dn = false,
                        3 => self.sel.locator_report_up = true,
                        4 => self.sel.locator_report_up = false,
                        _ => {}
                    }
                }
            }
            k if k == cpair(b'\'', b'|') => self.decrqlp(),
            k if k == cpair(b'\'', b'w') => {
                // DECEFR: arm the filter rectangle around the pointer
                let (py, px) = self.sel.locator_pos();
                self.sel.locator_top = if arg0 != 0 { arg0 as i32 } else { py };
                self.sel.locator_left = if arg1 != 0 { arg1 as i32 } else { px };
                self.sel.locator_bottom = if self.arg(2) != 0 {
                    self.arg(2) as i32
                } else {
                    py
                };
                self.sel.locator_right = if self.arg(3) != 0 {
                    self.arg(3) as i32
                } else {
                    px
                };
                self.sel.locator_rectangle = true;
            }
            k if k == cpair(0, b'q') => {
                // DECLL
                if arg0 > 20 {
                    self.event(TermEvent::Led {
                        led: (arg0 - 20) as u8,
                        on: false,
                    });
                } else {
                    self.event(TermEvent::Led {
                        led: arg0 as u8,
                        on: arg0 != 0,
                    });
                }
            }
            k if k == cpair(b' ', b'k') => {
                // SCP: character path
                if arg0 <= 2 {
                    if arg0 == 2 {
                        self.cursor.bidimode |= RowFlags::BIDIRTL;
                    } else if arg0 == 1 {
                        self.cursor.bidimode -= RowFlags::BIDIRTL;
                    } else {
                        self.cursor.bidimode -= RowFlags::BIDISEL | RowFlags::BIDIRTL;
                    }
                }
            }
            k if k == cpair(b' ', b'S') => {
                // SPD: presentation direction
                if arg0 == 0 {
                    self.cursor.bidimode -= RowFlags::PRESRTL;
                } else if arg0 == 3 {
                    self.cursor.bidimode |= RowFlags::PRESRTL;
                }
            }
            k if k == cpair(b'$', b'v') => {
                // DECCRA (source page and destination page args skipped)
                let (y1, x1) = (self.arg_or(2, urows), self.arg_or(3, ucols));
                let (y2, x2) = (self.arg_or(5, urows), self.arg_or(6, ucols));
                self.copy_rect(arg0_def1, self.arg_or(1, 1), y1, x1, y2, x2);
            }
            k if k == cpair(b'$', b'x') => {
                // DECFRA
                let ch = char::from_u32(self.arg_or(0, ' ' as u32)).unwrap_or(' ');
                let attr = self.cursor.attr;
                let (y1, x1) = (self.arg_or(3, urows), self.arg_or(4, ucols));
                self.fill_rect(ch, attr, false, self.arg_or(1, 1), self.arg_or(2, 1), y1, x1);
            }
            k if k == cpair(b'$', b'z') => {
                // DECERA
                let attr = self.erase_attr;
                let (y1, x1) = (self.arg_or(2, urows), self.arg_or(3, ucols));
                self.fill_rect(' ', attr, false, arg0_def1, self.arg_or(1, 1), y1, x1);
            }
            k if k == cpair(b'$', b'{') => {
                // DECSERA
                let attr = self.erase_attr;
                let (y1, x1) = (self.arg_or(2, urows), self.arg_or(3, ucols));
                self.fill_rect(' ', attr, true, arg0_def1, self.arg_or(1, 1), y1, x1);
            }
            k if k == cpair(b'*', b'x') => {
                // DECSACE
                match arg0 {
                    2 => self.attr_rect_mode = true,
                    0 | 1 => self.attr_rect_mode = false,
                    _ => {}
                }
            }
            k if k == cpair(b'$', b'r') || k == cpair(b'$', b't') => {
                // DECCARA / DECRARA
                let mut add = AttrFlags::empty();
                let mut sub = AttrFlags::empty();
                let mut under_on: Option<bool> = None;
                let mut under_toggle = false;
                for i in 4..self.csi_argc {
                    match self.arg(i) {
                        0 => {
                            sub |= AttrFlags::BOLD | AttrFlags::BLINK | AttrFlags::REVERSE;
                            under_on = Some(false);
                        }
                        1 => add |= AttrFlags::BOLD,
                        4 => under_on = Some(true),
                        5 => add |= AttrFlags::BLINK,
                        7 => add |= AttrFlags::REVERSE,
                        22 => sub |= AttrFlags::BOLD,
                        24 => under_on = Some(false),
                        25 => sub |= AttrFlags::BLINK,
                        27 => sub |= AttrFlags::REVERSE,
                        _ => {}
                    }
                }
                add -= sub;
                let (y1, x1) = (self.arg_or(2, urows), self.arg_or(3, ucols));
                if c == b'r' {
                    self.attr_rect_op(
                        add,
                        sub,
                        AttrFlags::empty(),
                        under_on,
                        arg0_def1,
                        self.arg_or(1, 1),
                        y1,
                        x1,
                    );
                } else {
                    // reverse: toggle the named attributes
                    if under_on == Some(true) {
                        under_toggle = true;
                    }
                    self.attr_rect_op(
                        AttrFlags::empty(),
                        AttrFlags::empty(),
                        add,
                        None,
                        arg0_def1,
                        self.arg_or(1, 1),
                        y1,
                        x1,
                    );
                    if under_toggle {
                        self.reverse_underline_rect(arg0_def1, self.arg_or(1, 1), y1, x1);
                    }
                }
            }
            k if k == cpair(b'*', b'y') => {
                // DECRQCRA: reply carries the two's complement low 16 bits
                let (y1, x1) = (self.arg_or(4, urows), self.arg_or(5, ucols));
                let sum = self.sum_rect(self.arg_or(2, 1), self.arg_or(3, 1), y1, x1);
                let checksum = (sum as i32).wrapping_neg() as u32 & 0xFFFF;
                self.respond_str(format!("\x1bP{}!~{:04X}\x1b\\", arg0, checksum));
            }
            k if k == cpair(b'\'', b'}') => {
                // DECIC
                if self.cursor_in_margins() {
                    let x = self.cursor.col;
                    self.insdel_column(x, false, arg0_def1);
                }
            }
            k if k == cpair(b'\'', b'~') => {
                // DECDC
                if self.cursor_in_margins() {
                    let x = self.cursor.col;
                    self.insdel_column(x, true, arg0_def1);
                }
            }
            k if k == cpair(b' ', b'A') => {
                // SR: shift columns right
                if self.cursor_in_margins() {
                    let left = self.marg_left;
                    self.insdel_column(left, false, arg0_def1);
                }
            }
            k if k == cpair(b' ', b'@') => {
                // SL: shift columns left
                if self.cursor_in_margins() {
                    let left = self.marg_left;
                    self.insdel_column(left, true, arg0_def1);
                }
            }
            k if k == cpair(b' ', b't') => {
                // DECSWBV
                if arg0 <= 8 {
                    self.bell_vol = arg0 as u8;
                }
            }
            k if k == cpair(b' ', b'u') => {
                // DECSMBV
                if arg0 == 0 {
                    self.margin_bell_vol = 8;
                } else if arg0 <= 8 {
                    self.margin_bell_vol = arg0 as u8;
                }
            }
            k if k == cpair(b' ', b'Z') => {
                // PEC: presentation expand or contract
                self.cursor.width_attr = match (arg0, arg1) {
                    (0, _) => 0,
                    (1, _) => 2,
                    (2, 2) => 11,
                    (2, _) => 1,
                    (22, _) => 11,
                    _ => self.cursor.width_attr,
                };
            }
            k if k == cpair(b'-', b'p') => {
                // DECARR
                if arg0 <= 30 {
                    self.modes.repeat_rate = arg0 as u8;
                }
            }
            k if k == cpair(b'%', b'q') => {
                // taskbar progress
                let percent = if self.csi_argc > 1 { arg1 as i8 } else { -1 };
                self.event(TermEvent::Progress {
                    state: arg0 as u8,
                    percent,
                });
            }
            k if k == cpair(0, b'y') => {
                // DECTST: screen alignment color fill
                if arg0 == 4 {
                    let bg = match arg1 {
                        10 => Some(Rgb::new(0, 0, 255)),
                        11 => Some(Rgb::new(255, 0, 0)),
                        12 => Some(Rgb::new(0, 255, 0)),
                        13 => Some(Rgb::new(255, 255, 255)),
                        _ => None,
                    };
                    if let Some(rgb) = bg {
                        let attr = Attr {
                            bg: Color::Rgb(rgb.r, rgb.g, rgb.b),
                            ..Attr::default()
                        };
                        let rows = self.rows;
                        let grid = self.agrid_mut();
                        for y in 0..rows {
                            let row = grid.row_mut(y);
                            row.clear();
                            for cell in row.cells.iter_mut() {
                                *cell = super::cell::Cell::new(' ', attr);
                            }
                        }
                        self.disptop = 0;
                    }
                }
            }
            _ => {}
        }
        self.last_char = None; // cancel preceding char for REP
    }

    fn cursor_in_margins(&self) -> bool {
        self.cursor.row >= self.marg_top
            && self.cursor.row <= self.marg_bot
            && self.cursor.col >= self.marg_left
            && self.cursor.col <= self.marg_right
    }

    pub(crate) fn write_primary_da(&mut self) {
        let s = reply::primary_da(self.cfg.vt_level());
        self.respond(s.as_bytes().to_vec());
    }

    // ---- SGR ----------------------------------------------------------------

    pub(crate) fn do_sgr(&mut self) {
        let argc = self.csi_argc;
        let mut attr = self.cursor.attr;
        let prot = attr.flags & AttrFlags::PROTECTED;
        let mut i = 0;
        while i < argc {
            // count colon-separated sub-parameters following this slot
            let mut sub_pars = 0;
            if self.csi_argv[i] & SUB_PARS != 0 {
                for j in i + 1..argc {
                    sub_pars += 1;
                    if self.csi_argv[j] & SUB_PARS == 0 {
                        break;
                    }
                }
            }
            let code = self.arg(i);

            if !self.cfg.suppress_sgr.is_empty() && contains(&self.cfg.suppress_sgr, code as i64)
            {
                // fully parsed, then dropped; 38/48 semicolon forms still
                // consume their value arguments
                if sub_pars == 0 && (code == 38 || code == 48) {
                    if i + 2 < argc && self.arg(i + 1) == 5 {
                        sub_pars = 2;
                    } else if i + 4 < argc && self.arg(i + 1) == 2 {
                        sub_pars = 4;
                    }
                }
            } else {
                let has_sub = self.csi_argv[i] & SUB_PARS != 0;
                match code {
                    0 => {
                        attr = Attr::default();
                        attr.flags |= prot;
                    }
                    1 if has_sub => {
                        if i + 1 < argc && self.arg(i + 1) == 2 {
                            attr.flags |= AttrFlags::SHADOW;
                        }
                    }
                    1 => attr.flags |= AttrFlags::BOLD,
                    2 => attr.flags |= AttrFlags::DIM,
                    3 => attr.flags |= AttrFlags::ITALIC,
                    4 if has_sub => {
                        if i + 1 < argc {
                            attr.underline = match self.arg(i + 1) {
                                0 => Underline::None,
                                1 => Underline::Single,
                                2 => Underline::Double,
                                3 => Underline::Curly,
                                4 => Underline::Broken,
                                5 => Underline::BrokenDouble,
                                _ => attr.underline,
                            };
                        }
                    }
                    4 => attr.underline = Underline::Single,
                    5 => attr.flags |= AttrFlags::BLINK,
                    6 => attr.flags |= AttrFlags::BLINK2,
                    7 => attr.flags |= AttrFlags::REVERSE,
                    8 if has_sub => {
                        if i + 1 < argc && self.arg(i + 1) == 7 {
                            attr.flags |= AttrFlags::OVERSTRIKE;
                        }
                    }
                    8 => attr.flags |= AttrFlags::INVISIBLE,
                    9 => attr.flags |= AttrFlags::STRIKEOUT,
                    10 | 11 | 12 => {
                        // 10: primary charset/font; 11/12: VGA charset
                        let arg_10 = (code - 10) as u8;
                        if arg_10 == 0 {
                            attr.font = 0;
                        }
                        self.cursor.oem_acs = arg_10;
                    }
                    13..=20 => attr.font = (code - 10) as u8,
                    21 => attr.underline = Underline::Double,
                    22 => attr.flags -= AttrFlags::BOLD | AttrFlags::DIM | AttrFlags::SHADOW,
                    23 => {
                        attr.flags -= AttrFlags::ITALIC;
                        if attr.font == 10 {
                            attr.font = 0;
                        }
                    }
                    24 => attr.underline = Underline::None,
                    25 => attr.flags -= AttrFlags::BLINK | AttrFlags::BLINK2,
                    27 => attr.flags -= AttrFlags::REVERSE,
                    28 => attr.flags -= AttrFlags::INVISIBLE | AttrFlags::OVERSTRIKE,
                    29 => attr.flags -= AttrFlags::STRIKEOUT,
                    30..=37 => attr.fg = Color::Indexed(code as u8 - 30),
                    38 => {
                        if let Some((color, used)) = self.parse_color_args(i, sub_pars) {
                            attr.fg = color;
                            if sub_pars == 0 {
                                i += used;
                            }
                        }
                    }
                    39 => attr.fg = Color::Default,
                    40..=47 => attr.bg = Color::Indexed(code as u8 - 40),
                    48 => {
                        if let Some((color, used)) = self.parse_color_args(i, sub_pars) {
                            attr.bg = color;
                            if sub_pars == 0 {
                                i += used;
                            }
                        }
                    }
                    49 => attr.bg = Color::Default,
                    51 | 52 => attr.flags |= AttrFlags::FRAMED,
                    53 => attr.flags |= AttrFlags::OVERLINED,
                    54 => attr.flags -= AttrFlags::FRAMED,
                    55 => attr.flags -= AttrFlags::OVERLINED,
                    58 if has_sub => {
                        if let Some((color, _)) = self.parse_color_args(i, sub_pars) {
                            attr.ulcolr = Some(match color {
                                Color::Indexed(n) => self.palette.indexed(n),
                                Color::Rgb(r, g, b) => Rgb::new(r, g, b),
                                Color::Default => self.palette.indexed(7),
                            });
                        }
                    }
                    59 => attr.ulcolr = None,
                    73 => attr.flags |= AttrFlags::SUPERSCRIPT,
                    74 => attr.flags |= AttrFlags::SUBSCRIPT,
                    75 => attr.flags -= AttrFlags::SUPERSCRIPT | AttrFlags::SUBSCRIPT,
                    90..=97 => attr.fg = Color::Indexed(code as u8 - 90 + 8),
                    100..=107 => attr.bg = Color::Indexed(code as u8 - 100 + 8),
                    _ => {}
                }
            }
            i += sub_pars + 1;
        }
        self.cursor.attr = attr;
        self.update_erase_attr();
    }

    /// Parse the value arguments of SGR 38/48/58. For the semicolon form
    /// (`sub_pars == 0`) returns how many extra slots were consumed; the
    /// colon form consumes nothing extra (the caller skips sub_pars).
    fn parse_color_args(&self, i: usize, sub_pars: usize) -> Option<(Color, usize)> {
        let argc = self.csi_argc;
        if sub_pars > 0 {
            let kind = self.arg(i + 1);
            match kind {
                5 if sub_pars >= 2 => Some((Color::Indexed(self.arg(i + 2) as u8), 0)),
                2 if sub_pars >= 4 => {
                    // an optional color-space id shifts the components
                    let pi = usize::from(sub_pars >= 5);
                    Some((
                        Color::Rgb(
                            self.arg(i + pi + 2) as u8,
                            self.arg(i + pi + 3) as u8,
                            self.arg(i + pi + 4) as u8,
                        ),
                        0,
                    ))
                }
                3 | 4 => {
                    // CMY / CMYK with a leading scale value
                    let needs = if kind == 4 { 6 } else { 5 };
                    if sub_pars < needs {
                        return None;
                    }
                    let f = self.arg(i + 2) as u64;
                    let c = self.arg(i + 3) as u64;
                    let m = self.arg(i + 4) as u64;
                    let y = self.arg(i + 5) as u64;
                    let k = if kind == 4 { self.arg(i + 6) as u64 } else { 0 };
                    if f == 0 || c > f || m > f || y > f || k > f {
                        return None;
                    }
                    let r = ((f - c) * (f - k) / f * 255 / f) as u8;
                    let g = ((f - m) * (f - k) / f * 255 / f) as u8;
                    let b = ((f - y) * (f - k) / f * 255 / f) as u8;
                    Some((Color::Rgb(r, g, b), 0))
                }
                _ => None,
            }
        } else {
            match self.arg(i + 1) {
                5 if i + 2 < argc => Some((Color::Indexed(self.arg(i + 2) as u8), 2)),
                2 if i + 4 < argc => Some((
                    Color::Rgb(
                        self.arg(i + 2) as u8,
                        self.arg(i + 3) as u8,
                        self.arg(i + 4) as u8,
                    ),
                    4,
                )),
                _ => None,
            }
        }
    }

    // ---- XTPUSHSGR / XTPOPSGR ----------------------------------------------

    fn push_attrs(&mut self) {
        let mut mask = AttrMask::default();
        fn set_push(attr: u32, mask: &mut AttrMask) {
            match attr {
            1 => mask.flags |= AttrFlags::BOLD | AttrFlags::SHADOW,
            2 => mask.flags |= AttrFlags::DIM,
            3 => mask.flags |= AttrFlags::ITALIC,
            4 | 21 => mask.underline = true,
            5 | 6 => mask.flags |= AttrFlags::BLINK | AttrFlags::BLINK2,
            7 => mask.flags |= AttrFlags::REVERSE,
            8 => mask.flags |= AttrFlags::INVISIBLE | AttrFlags::OVERSTRIKE,
            9 => mask.flags |= AttrFlags::STRIKEOUT,
            20 => mask.font = true,
            53 => mask.flags |= AttrFlags::OVERLINED,
            58 => mask.ulcolr = true,
            30 | 10 => mask.fg = true,
            31 | 11 => mask.bg = true,
                73 => mask.flags |= AttrFlags::SUPERSCRIPT,
                74 => mask.flags |= AttrFlags::SUBSCRIPT,
                _ => {}
            }
        }
        if !self.csi_defined[0] {
            for a in 1..90 {
                set_push(a, &mut mask);
            }
        } else {
            for i in 0..self.csi_argc {
                set_push(self.arg(i), &mut mask);
            }
        }
        if self.attr_stack.len() == ATTR_STACK_MAX {
            self.attr_stack.remove(0);
        }
        self.attr_stack.push((self.cursor.attr, mask));
    }

    fn pop_attrs(&mut self) {
        let Some((saved, mask)) = self.attr_stack.pop() else {
            return;
        };
        let attr = &mut self.cursor.attr;
        attr.flags = (attr.flags - mask.flags) | (saved.flags & mask.flags);
        if mask.underline {
            attr.underline = saved.underline;
        }
        if mask.fg {
            attr.fg = saved.fg;
        }
        if mask.bg {
            attr.bg = saved.bg;
        }
        if mask.ulcolr {
            attr.ulcolr = saved.ulcolr;
        }
        if mask.font {
            attr.font = saved.font;
        }
        self.update_erase_attr();
    }

    // ---- modes --------------------------------------------------------------

    pub(crate) fn set_modes(&mut self, state: bool) {
        for i in 0..self.csi_argc {
            let arg = self.arg(i);
            if self.esc_mod != 0 {
                // DECSET / DECRST
                if !self.cfg.suppress_dec.is_empty()
                    && contains(&self.cfg.suppress_dec, arg as i64)
                {
                    continue;
                }
                self.set_dec_mode(arg, state);
            } else {
                match arg {
                    4 => self.modes.insert = state,
                    8 => {
                        // BDSM
                        if state {
                            self.cursor.bidimode -= RowFlags::NOBIDI;
                        } else {
                            self.cursor.bidimode |= RowFlags::NOBIDI;
                        }
                    }
                    12 => self.modes.echoing = !state,
                    20 => self.modes.newline_mode = state,
                    _ => {}
                }
            }
        }
    }

    fn set_dec_mode(&mut self, arg: u32, state: bool) {
        match arg {
            1 => self.modes.app_cursor_keys = state,
            2 => {
                // DECANM
                if state {
                    self.cursor.csets = [Charset::Ascii; 4];
                    self.cursor.cset_single = Charset::Ascii;
                } else {
                    self.vt52_mode = 1;
                }
            }
            3 => {
                // DECCOLM
                if self.modes.deccolm_allowed {
                    self.sel.selected = false;
                    let rows = self.rows;
                    self.event(TermEvent::Window(WindowOp::SetCharSize {
                        rows,
                        cols: if state { 132 } else { 80 },
                    }));
                    self.modes.reset_132 = state;
                    self.marg_top = 0;
                    self.marg_bot = self.rows - 1;
                    self.marg_left = 0;
                    self.marg_right = self.cols - 1;
                    self.move_to(0, 0, 0);
                    if !self.modes.deccolm_noclear {
                        self.erase(false, false, true, true);
                    }
                }
            }
            5 => {
                if state != self.modes.rvideo {
                    self.modes.rvideo = state;
                    self.event(TermEvent::InvalidateAll);
                }
            }
            6 => {
                self.cursor.origin = state;
                if state {
                    let (x, y) = (self.marg_left as i32, self.marg_top as i32);
                    self.move_to(x, y, 0);
                } else {
                    self.move_to(0, 0, 0);
                }
            }
            7 => {
                self.modes.autowrap = state;
                self.cursor.wrapnext = false;
            }
            45 => {
                self.modes.rev_wrap = state;
                self.cursor.wrapnext = false;
            }
            8 => self.modes.auto_repeat = state,
            9 => {
                self.modes.mouse_mode = if state { Some(MouseMode::X10) } else { None };
                self.event(TermEvent::MouseModeChanged);
            }
            12 => self.modes.cursor_blink = state,
            25 => self.modes.cursor_on = state,
            30 => {
                if state != self.modes.show_scrollbar {
                    self.modes.show_scrollbar = state;
                }
            }
            38 => {
                // DECTEK: enter Tektronix submode
                if state {
                    self.tek.enter();
                    self.event(TermEvent::TekModeChanged { active: true });
                }
            }
            40 => self.modes.deccolm_allowed = state,
            95 => self.modes.deccolm_noclear = state,
            42 => self.modes.decnrc_enabled = state,
            44 => self.modes.margin_bell = state,
            66 => self.modes.app_keypad = state,
            67 => self.modes.backspace_sends_bs = state,
            69 => {
                self.modes.lrmargmode = state;
                if state {
                    let rows = self.rows;
                    let grid = self.agrid_mut();
                    for y in 0..rows {
                        grid.row_mut(y).flags -= RowFlags::SIZE_MASK;
                    }
                } else {
                    self.marg_left = 0;
                    self.marg_right = self.cols - 1;
                }
            }
            80 => self.modes.sixel_display = !state,
            1000 => {
                self.modes.mouse_mode = if state { Some(MouseMode::Vt200) } else { None };
                self.event(TermEvent::MouseModeChanged);
            }
            1002 => {
                self.modes.mouse_mode = if state {
                    Some(MouseMode::BtnEvent)
                } else {
                    None
                };
                self.event(TermEvent::MouseModeChanged);
            }
            1003 => {
                self.modes.mouse_mode = if state {
                    Some(MouseMode::AnyEvent)
                } else {
                    None
                };
                self.event(TermEvent::MouseModeChanged);
            }
            1004 => self.modes.report_focus = state,
            1005 => {
                self.modes.mouse_enc = if state { MouseEnc::Utf8 } else { MouseEnc::Legacy };
            }
            1006 => {
                self.modes.mouse_enc = if state {
                    MouseEnc::XtermCsi
                } else {
                    MouseEnc::Legacy
                };
            }
            1016 => {
                self.modes.mouse_enc = if state {
                    MouseEnc::PixelCsi
                } else {
                    MouseEnc::Legacy
                };
            }
            1015 => {
                self.modes.mouse_enc = if state {
                    MouseEnc::UrxvtCsi
                } else {
                    MouseEnc::Legacy
                };
            }
            1037 => self.modes.delete_sends_del = state,
            1042 => self.modes.bell_taskbar = state,
            1043 => self.modes.bell_popup = state,
            47 => {
                if !self.modes.disable_alternate_screen {
                    self.sel.selected = false;
                    self.switch_screen(state, false);
                    self.disptop = 0;
                }
            }
            1047 => {
                if !self.modes.disable_alternate_screen {
                    self.sel.selected = false;
                    self.switch_screen(state, true);
                    self.disptop = 0;
                }
            }
            1046 => {
                if self.on_alt_screen && !state {
                    self.switch_screen(false, false);
                }
                self.modes.disable_alternate_screen = !state;
            }
            1048 => {
                if !self.modes.disable_alternate_screen {
                    if state {
                        self.save_cursor();
                    } else {
                        self.restore_cursor();
                    }
                }
            }
            1049 => {
                if !self.modes.disable_alternate_screen {
                    if state {
                        self.save_cursor();
                    }
                    self.sel.selected = false;
                    self.switch_screen(state, true);
                    if !state {
                        self.restore_cursor();
                    }
                    self.disptop = 0;
                }
            }
            1061 => self.modes.vt220_keys = state,
            2004 => self.modes.bracketed_paste = state,
            1007 => self.modes.wheel_reporting_xterm = state,
            2026 => {
                if state {
                    self.begin_synchronized_update(None);
                } else {
                    self.set_suspend_update(0);
                }
            }
            // private modes
            7700 => self.modes.report_ambig_width = state,
            7711 => {
                let y = self.cursor.row;
                let row = self.agrid_mut().row_mut(y);
                if state {
                    row.flags |= RowFlags::MARKED;
                } else {
                    row.flags |= RowFlags::UNMARKED;
                }
            }
            7727 => self.modes.app_escape_key = state,
            7728 => self.modes.escape_sends_fs = state,
            7730 => self.modes.sixel_scrolls_left = state,
            7766 => {
                if self.cfg.scrollbar != 0 && state != self.modes.show_scrollbar {
                    self.modes.show_scrollbar = state;
                }
            }
            7767 => self.modes.report_font_changed = state,
            7783 => self.modes.shortcut_override = state,
            7786 => self.modes.wheel_reporting = state,
            7787 => self.modes.app_wheel = state,
            7796 => {
                let y = self.cursor.row;
                let row = self.agrid_mut().row_mut(y);
                if state {
                    row.flags |= RowFlags::NOBIDI;
                } else {
                    row.flags -= RowFlags::NOBIDI;
                }
            }
            77096 => self.modes.disable_bidi = state,
            8452 => self.modes.sixel_scrolls_right = state,
            77000..=77031 => {
                let ctrl = arg - 77000;
                let bit = 1u32 << ctrl;
                self.modes.app_control =
                    (self.modes.app_control & !bit) | (u32::from(state) << ctrl);
            }
            2500 => {
                if state {
                    self.cursor.bidimode |= RowFlags::BOXMIRROR;
                } else {
                    self.cursor.bidimode -= RowFlags::BOXMIRROR;
                }
            }
            2501 => {
                if state {
                    self.cursor.bidimode -= RowFlags::BIDISEL;
                } else {
                    self.cursor.bidimode |= RowFlags::BIDISEL;
                }
            }
            _ => {}
        }
    }

    /// DECRQM state lookup: 0 unrecognized, 1 set, 2 reset,
    /// 3 permanently set, 4 permanently reset.
    pub(crate) fn get_mode(&self, private: bool, arg: u32) -> u8 {
        fn from(b: bool) -> u8 {
            if b {
                1
            } else {
                2
            }
        }
        if private {
            match arg {
                1 => from(self.modes.app_cursor_keys),
                2 => from(self.cursor.csets.iter().all(|&cs| cs == Charset::Ascii)),
                3 => from(self.modes.reset_132),
                5 => from(self.modes.rvideo),
                6 => from(self.cursor.origin),
                7 => from(self.modes.autowrap),
                8 => from(self.modes.auto_repeat),
                9 => from(self.modes.mouse_mode == Some(MouseMode::X10)),
                12 => from(self.modes.cursor_blink),
                25 => from(self.modes.cursor_on),
                30 => from(self.modes.show_scrollbar),
                40 => from(self.modes.deccolm_allowed),
                42 => from(self.modes.decnrc_enabled),
                44 => from(self.modes.margin_bell),
                45 => from(self.modes.rev_wrap),
                66 => from(self.modes.app_keypad),
                67 => from(self.modes.backspace_sends_bs),
                69 => from(self.modes.lrmargmode),
                80 => from(!self.modes.sixel_display),
                95 => from(self.modes.deccolm_noclear),
                1000 => from(self.modes.mouse_mode == Some(MouseMode::Vt200)),
                1002 => from(self.modes.mouse_mode == Some(MouseMode::BtnEvent)),
                1003 => from(self.modes.mouse_mode == Some(MouseMode::AnyEvent)),
                1004 => from(self.modes.report_focus),
                1005 => from(self.modes.mouse_enc == MouseEnc::Utf8),
                1006 => from(self.modes.mouse_enc == MouseEnc::XtermCsi),
                1015 => from(self.modes.mouse_enc == MouseEnc::UrxvtCsi),
                1016 => from(self.modes.mouse_enc == MouseEnc::PixelCsi),
                1007 => from(self.modes.wheel_reporting_xterm),
                1037 => from(self.modes.delete_sends_del),
                1042 => from(self.modes.bell_taskbar),
                1043 => from(self.modes.bell_popup),
                47 | 1047 | 1049 => from(self.on_alt_screen),
                1048 => 4,
                1061 => from(self.modes.vt220_keys),
                2004 => from(self.modes.bracketed_paste),
                2026 => from(self.suspend_update_until().is_some()),
                7700 => from(self.modes.report_ambig_width),
                7711 => {
                    let y = self.cursor.row;
                    from(self.agrid().row(y).flags.contains(RowFlags::MARKED))
                }
                7727 => from(self.modes.app_escape_key),
                7728 => from(self.modes.escape_sends_fs),
                7730 => from(self.modes.sixel_scrolls_left),
                7766 => from(self.modes.show_scrollbar),
                7767 => from(self.modes.report_font_changed),
                7783 => from(self.modes.shortcut_override),
                7786 => from(self.modes.wheel_reporting),
                7787 => from(self.modes.app_wheel),
                7796 => {
                    let y = self.cursor.row;
                    from(self.agrid().row(y).flags.contains(RowFlags::NOBIDI))
                }
                77096 => from(self.modes.disable_bidi),
                8452 => from(self.modes.sixel_scrolls_right),
                77000..=77031 => from(self.modes.app_control & (1 << (arg - 77000)) != 0),
                2500 => from(self.cursor.bidimode.contains(RowFlags::BOXMIRROR)),
                2501 => from(!self.cursor.bidimode.contains(RowFlags::BIDISEL)),
                _ => 0,
            }
        } else {
            match arg {
                4 => from(self.modes.insert),
                8 => from(!self.cursor.bidimode.contains(RowFlags::NOBIDI)),
                12 => from(!self.modes.echoing),
                20 => from(self.modes.newline_mode),
                _ => 0,
            }
        }
    }

    // ---- media copy and window ops -----------------------------------------

    fn media_copy(&mut self, arg0: u32) {
        match arg0 {
            5 => {
                self.printing = true;
                self.only_printing = self.esc_mod == 0;
                self.printbuf.clear();
            }
            4 => {
                if self.printing {
                    // drop the terminating sequence from the buffer
                    while let Some(&b) = self.printbuf.last() {
                        self.printbuf.pop();
                        if b == 0x1B {
                            break;
                        }
                    }
                    self.print_finish();
                }
            }
            0 if self.esc_mod == 0 => {
                // print screen: ship the visible text
                let mut data = Vec::new();
                let grid = self.agrid();
                for row in &grid.lines {
                    data.extend_from_slice(row.text().trim_end().as_bytes());
                    data.push(b'\n');
                }
                self.event(TermEvent::Print { data });
            }
            _ => {}
        }
    }

    fn do_winop(&mut self) {
        let arg0 = self.arg(0);
        if !self.cfg.suppress_win.is_empty() && contains(&self.cfg.suppress_win, arg0 as i64) {
            return;
        }
        let arg1 = self.arg(1);
        let arg2 = self.arg(2);
        match arg0 {
            1 => self.event(TermEvent::Window(WindowOp::Restore)),
            2 => self.event(TermEvent::Window(WindowOp::Minimize)),
            3 => self.event(TermEvent::Window(WindowOp::SetPosition {
                x: arg1 as i16,
                y: arg2 as i16,
            })),
            4 => self.event(TermEvent::Window(WindowOp::SetPixelSize {
                height: arg1.min(u16::MAX as u32) as u16,
                width: arg2.min(u16::MAX as u32) as u16,
            })),
            5 => self.event(TermEvent::Window(WindowOp::Raise)),
            6 => self.event(TermEvent::Window(WindowOp::Lower)),
            7 => self.event(TermEvent::Window(WindowOp::Refresh)),
            8 => {
                let rows = if arg1 != 0 { arg1 as u16 } else { self.rows };
                let cols = if arg2 != 0 { arg2 as u16 } else { self.cols };
                self.event(TermEvent::Window(WindowOp::SetCharSize { rows, cols }));
            }
            9 => match arg1 {
                0 => self.event(TermEvent::Window(WindowOp::Unmaximize)),
                1 => self.event(TermEvent::Window(WindowOp::Maximize {
                    horizontally: true,
                    vertically: true,
                })),
                2 => self.event(TermEvent::Window(WindowOp::Maximize {
                    horizontally: false,
                    vertically: true,
                })),
                3 => self.event(TermEvent::Window(WindowOp::Maximize {
                    horizontally: true,
                    vertically: false,
                })),
                _ => {}
            },
            10 => match arg1 {
                0 => self.event(TermEvent::Window(WindowOp::Fullscreen { on: false })),
                1 => self.event(TermEvent::Window(WindowOp::Fullscreen { on: true })),
                _ => {}
            },
            11 => self.respond(b"\x1b[1t".to_vec()),
            13 => self.respond(b"\x1b[3;0;0t".to_vec()),
            14 => {
                let (h, w) = (self.rows as u32 * 16, self.cols as u32 * 8);
                self.respond_str(format!("\x1b[4;{};{}t", h, w));
            }
            16 => self.respond(b"\x1b[6;16;8t".to_vec()),
            18 => {
                let (r, c) = (self.rows, self.cols);
                self.respond_str(format!("\x1b[8;{};{}t", r, c));
            }
            19 => {
                let (r, c) = (self.rows, self.cols);
                self.respond_str(format!("\x1b[9;{};{}t", r, c));
            }
            20 => {
                let title = self.title.clone();
                self.respond_str(format!("\x1b]L{}\x1b\\", title));
            }
            21 => {
                let title = self.title.clone();
                self.respond_str(format!("\x1b]l{}\x1b\\", title));
            }
            22 => {
                // push title
                self.title_stack.push(self.title.clone());
                if self.title_stack.len() > 10 {
                    self.title_stack.remove(0);
                }
            }
            23 => {
                if let Some(title) = self.title_stack.pop() {
                    self.title = title.clone();
                    self.event(TermEvent::TitleChanged { title });
                }
            }
            _ => {}
        }
    }

    // ---- DEC locator --------------------------------------------------------

    fn declr_enable(&mut self, arg0: u32, arg1: u32) {
        match arg0 {
            0 => {
                if self.modes.mouse_mode == Some(MouseMode::Locator) {
                    self.modes.mouse_mode = None;
                    self.event(TermEvent::MouseModeChanged);
                }
                self.sel.locator_1_enabled = false;
            }
            1 => {
                self.modes.mouse_mode = Some(MouseMode::Locator);
                self.event(TermEvent::MouseModeChanged);
            }
            2 => {
                self.sel.locator_1_enabled = true;
                self.event(TermEvent::MouseModeChanged);
            }
            _ => {}
        }
        match arg1 {
            0 | 2 => self.sel.locator_by_pixels = false,
            1 => self.sel.locator_by_pixels = true,
            _ => {}
        }
        self.sel.locator_rectangle = false;
    }

    fn decrqlp(&mut self) {
        if self.modes.mouse_mode == Some(MouseMode::Locator) || self.sel.locator_1_enabled {
            let (y, x) = self.sel.locator_pos();
            let buttons = self.sel.locator_buttons;
            self.respond_str(format!("\x1b[1;{};{};{};0&w", buttons, y, x));
            self.sel.locator_1_enabled = false;
        }
    }
}
