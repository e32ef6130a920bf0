//! Selection and mouse translation: pointer positions to logical grid
//! positions, word/line spreading, and mouse-protocol reports.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::config::contains;

use super::cell::UCSWIDE;
use super::event::TermEvent;
use super::grid::{Row, RowFlags};
use super::modes::{MouseEnc, MouseMode};
use super::state::TerminalState;

/// A logical grid position. `y` is relative to the top of the visible
/// screen and goes negative into the scrollback; `r` marks a hit on the
/// right half of the cell; `pix`/`piy` carry the raw pixel position for
/// the pixel-coordinate encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
    pub r: bool,
    pub pix: i32,
    pub piy: i32,
}

impl Pos {
    pub fn new(y: i32, x: i32) -> Self {
        Self {
            y,
            x,
            ..Self::default()
        }
    }
}

fn poslt(a: Pos, b: Pos) -> bool {
    (a.y, a.x) < (b.y, b.x)
}

fn posdiff(a: Pos, b: Pos, cols: i32) -> i32 {
    (a.y - b.y) * cols + (a.x - b.x)
}

bitflags! {
    /// Modifier keys accompanying a mouse event, in xterm report order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModKeys: u8 {
        const SHIFT = 1;
        const ALT   = 2;
        const CTRL  = 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left = 1,
    Middle = 2,
    Right = 3,
    Four = 4,
    Five = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MouseAction {
    Click = 0,
    Move = 1,
    Wheel = 2,
    Release = 3,
}

/// Selection spreading unit, driven by the click count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelMode {
    #[default]
    Idle,
    SelChar,
    SelWord,
    SelLine,
    /// Word spreading for click-to-open (URL detection).
    Opening,
    /// Button held and reported to the application instead.
    Reporting,
}

/// Selection and locator state carried by the terminal.
#[derive(Debug, Default)]
pub struct MouseSelection {
    pub selected: bool,
    pub rect: bool,
    pub anchor: Pos,
    pub start: Pos,
    pub end: Pos,
    pub hover_start: Pos,
    pub hover_end: Pos,
    pub mouse_state: SelMode,
    held_button: Option<MouseButton>,
    /// Bracket nesting level carried from backward to forward spreading.
    level: i32,
    /// Wheel accumulation, 120 units per notch.
    wheel_accum: i32,

    /// Bidi inverse maps per visible row, supplied by the renderer after
    /// its bidi pass (visual column to logical column).
    bidi_backward: HashMap<u16, Vec<u16>>,

    // DEC locator
    pub locator_1_enabled: bool,
    pub locator_by_pixels: bool,
    pub locator_report_up: bool,
    pub locator_report_dn: bool,
    pub locator_rectangle: bool,
    pub locator_top: i32,
    pub locator_left: i32,
    pub locator_bottom: i32,
    pub locator_right: i32,
    pub(crate) locator_pos_y: i32,
    pub(crate) locator_pos_x: i32,
    pub locator_buttons: u32,
}

impl MouseSelection {
    /// Current pointer position in the locator's coordinate system.
    pub fn locator_pos(&self) -> (i32, i32) {
        (self.locator_pos_y.max(1), self.locator_pos_x.max(1))
    }

    /// Install the renderer's bidi inverse map for a row; rows without a
    /// map are assumed visually left-to-right.
    pub fn set_bidi_map(&mut self, row: u16, backward: Vec<u16>) {
        self.bidi_backward.insert(row, backward);
    }

    pub fn clear_bidi_maps(&mut self) {
        self.bidi_backward.clear();
    }
}

/// What a wheel event turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAction {
    /// Reported to the application (or swallowed).
    Handled,
    /// The host should scroll the view by this many lines.
    ScrollView(i32),
}

impl TerminalState {
    /// Fetch a line for selection purposes; negative `y` reads from the
    /// scrollback.
    pub(crate) fn line_at(&self, y: i32) -> Row {
        if y < 0 {
            let sb = self.scrollback.len() as i32;
            let idx = sb + y;
            if idx >= 0 {
                if let Some(packed) = self.scrollback.get(idx as usize) {
                    return packed.unpack(self.cols);
                }
            }
            Row::new(self.cols)
        } else {
            self.agrid().lines[(y as usize).min(self.rows as usize - 1)].clone()
        }
    }

    fn sb_lines(&self) -> i32 {
        self.scrollback.len() as i32
    }

    fn get_char_at(&self, line: &Row, x: i32) -> char {
        let x = x.clamp(0, self.cols as i32 - 1) as usize;
        let mut c = line.cells[x].ch;
        if c == UCSWIDE && x > 0 {
            c = line.cells[x - 1].ch;
        }
        c
    }

    // ---- pointer translation ------------------------------------------------

    /// Translate a pixel position into a logical grid position. Applies
    /// presentation-RTL mirroring, double-width halving, and the cached
    /// bidi inverse map.
    pub fn translate_pos(&self, pix_y: i32, pix_x: i32) -> Pos {
        let ch = self.cell_height.max(1) as i32;
        let cw = self.cell_width.max(1) as i32;
        let y = (pix_y / ch).clamp(0, self.rows as i32 - 1);
        let mut x = pix_x / cw;
        let r = pix_x % cw >= cw / 2;
        x = x.clamp(0, self.cols as i32 - 1);
        let mut p = Pos {
            y,
            x,
            r,
            pix: pix_x,
            piy: pix_y,
        };

        let line = &self.agrid().lines[y as usize];
        if line.flags.contains(RowFlags::PRESRTL) {
            p.x = self.cols as i32 - 1 - p.x;
            p.r = !p.r;
        }
        if line.flags.is_double_width() {
            p.x /= 2;
        }
        if let Some(map) = self.sel.bidi_backward.get(&(y as u16)) {
            if let Some(&logical) = map.get(p.x as usize) {
                p.x = logical as i32;
            }
        }
        // land on the base cell of a wide pair
        if line.cells[p.x as usize].ch == UCSWIDE && p.x > 0 {
            p.x -= 1;
        }
        p
    }

    fn box_pos(&self, mut p: Pos) -> Pos {
        p.y = p.y.clamp(0, self.rows as i32 - 1);
        p.x = p.x.clamp(0, self.cols as i32 - 1);
        p
    }

    /// Apply the display offset: selection coordinates live in the
    /// logical space where 0 is the top visible line.
    fn selpoint(&self, p: Pos) -> Pos {
        Pos {
            y: p.y + self.disptop,
            ..p
        }
    }

    // ---- selection spreading ------------------------------------------------

    fn incpos(&self, mut p: Pos) -> Pos {
        p.x += 1;
        if p.x >= self.cols as i32 {
            p.x = 0;
            p.y += 1;
        }
        p
    }

    fn decpos(&self, mut p: Pos) -> Pos {
        p.x -= 1;
        if p.x < 0 {
            p.x = self.cols as i32 - 1;
            p.y -= 1;
        }
        p
    }

    /// Word-wise spreading with URL-scheme awareness: spreading left
    /// through `scheme://` keeps going, and bracket nesting is honored
    /// when spreading right.
    fn sel_spread_word(&mut self, p: Pos, forward: bool) -> Pos {
        let mut p = p;
        let mut ret_p = p;
        let mut line = self.line_at(p.y);
        // scheme detection state: 's' in scheme letters, ':' after
        // colon, '/' after slashes
        let mut scheme: u8 = 0;
        if !forward {
            self.sel.level = 0;
        }
        let opening = self.sel.mouse_state == SelMode::Opening;

        loop {
            let c = self.get_char_at(&line, p.x);

            if !forward {
                if c.is_alphanumeric() {
                    if scheme == b':' {
                        scheme = b's';
                    } else if scheme != b's' {
                        scheme = 0;
                    }
                } else if c == ':' {
                    scheme = if scheme == b'/' { b':' } else { 0 };
                } else if c == '/' {
                    scheme = b'/';
                } else if scheme == b's' {
                    break;
                } else {
                    scheme = 0;
                }
            }

            if !opening
                && !self.cfg.word_chars_excl.is_empty()
                && self.cfg.word_chars_excl.contains(c)
            {
                break;
            }

            if c.is_alphanumeric() {
                ret_p = p;
            } else if !opening && !self.cfg.word_chars.is_empty() {
                if !self.cfg.word_chars.contains(c) {
                    break;
                }
                ret_p = p;
            } else if "_#%~+-".contains(c) {
                ret_p = p;
            } else if ".$@/\\".contains(c) {
                if !forward {
                    ret_p = p;
                }
            } else if "([{".contains(c) {
                self.sel.level += 1;
                if forward {
                    ret_p = p;
                }
            } else if ")]}".contains(c) {
                self.sel.level -= 1;
                if forward && self.sel.level < 0 {
                    break;
                }
                if forward {
                    ret_p = p;
                }
            } else if c == ' ' && p.x > 0 && self.get_char_at(&line, p.x - 1) == '\\' {
                ret_p = p;
            } else if !("&,;?!:".contains(c) || c == if forward { '=' } else { ':' }) {
                break;
            }

            if forward {
                p.x += 1;
                let limit =
                    self.cols as i32 - i32::from(line.flags.contains(RowFlags::WRAPPED2));
                if p.x >= limit {
                    if !line.flags.contains(RowFlags::WRAPPED) {
                        break;
                    }
                    p.x = 0;
                    p.y += 1;
                    line = self.line_at(p.y);
                }
            } else {
                if p.x <= 0 {
                    if p.y <= -self.sb_lines() {
                        break;
                    }
                    p.y -= 1;
                    line = self.line_at(p.y);
                    if !line.flags.contains(RowFlags::WRAPPED) {
                        break;
                    }
                    p.x = self.cols as i32
                        - i32::from(line.flags.contains(RowFlags::WRAPPED2));
                }
                p.x -= 1;
            }
        }
        ret_p
    }

    fn sel_spread_half(&mut self, p: Pos, forward: bool) -> Pos {
        let mut p = p;
        match self.sel.mouse_state {
            SelMode::SelChar => {
                // each character is a unit, except trailing space runs on
                // non-wrapped lines
                let line = self.line_at(p.y);
                if !line.flags.contains(RowFlags::WRAPPED) {
                    let mut q = self.cols as usize;
                    while q > 0 && line.cells[q - 1].ch == ' ' && line.cells[q - 1].cc_next == 0
                    {
                        q -= 1;
                    }
                    if q == self.cols as usize {
                        q -= 1;
                    }
                    if p.x >= q as i32 {
                        p.x = if forward { self.cols as i32 - 1 } else { q as i32 };
                    }
                }
                p
            }
            SelMode::SelWord | SelMode::Opening => self.sel_spread_word(p, forward),
            SelMode::SelLine => {
                if forward {
                    let mut line = self.line_at(p.y);
                    while line.flags.contains(RowFlags::WRAPPED) {
                        p.y += 1;
                        p.x = 0;
                        line = self.line_at(p.y);
                    }
                    let mut last = p.x;
                    p.x = self.cols as i32 - 1;
                    for x in last..self.cols as i32 {
                        if self.get_char_at(&line, x) != ' ' {
                            last = x;
                            p.x = last;
                        }
                    }
                    p
                } else {
                    p.x = 0;
                    while p.y > -self.sb_lines() {
                        let above = self.line_at(p.y - 1);
                        if !above.flags.contains(RowFlags::WRAPPED) {
                            break;
                        }
                        p.y -= 1;
                    }
                    p
                }
            }
            _ => p,
        }
    }

    fn sel_spread(&mut self) {
        let start = self.sel.start;
        let end = self.sel.end;
        self.sel.start = self.sel_spread_half(start, false);
        let spread_end = self.sel_spread_half(end, true);
        self.sel.end = self.incpos(spread_end);
    }

    fn sel_drag(&mut self, selpoint: Pos) {
        self.sel.selected = true;
        if !self.sel.rect {
            if poslt(selpoint, self.sel.anchor) {
                self.sel.start = selpoint;
                self.sel.end = self.sel.anchor;
                if self.cfg.elastic_mouse && self.modes.mouse_mode.is_none() {
                    if selpoint.r {
                        self.sel.start = self.incpos(self.sel.start);
                    }
                    if !self.sel.anchor.r {
                        self.sel.end = self.decpos(self.sel.end);
                    }
                }
            } else {
                self.sel.start = self.sel.anchor;
                self.sel.end = selpoint;
                if self.cfg.elastic_mouse && self.modes.mouse_mode.is_none() {
                    if self.sel.anchor.r {
                        self.sel.start = self.incpos(self.sel.start);
                    }
                    if !selpoint.r {
                        self.sel.end = self.decpos(self.sel.end);
                    }
                }
            }
            self.sel_spread();
        } else {
            self.sel.start = Pos::new(
                self.sel.anchor.y.min(selpoint.y),
                self.sel.anchor.x.min(selpoint.x),
            );
            self.sel.end = Pos::new(
                self.sel.anchor.y.max(selpoint.y),
                self.sel.anchor.x.max(selpoint.x) + 1,
            );
        }
        self.agrid_mut().mark_all_dirty();
    }

    fn sel_extend(&mut self, selpoint: Pos) {
        if self.sel.selected {
            if !self.sel.rect {
                let cols = self.cols as i32;
                if posdiff(selpoint, self.sel.start, cols)
                    < posdiff(self.sel.end, self.sel.start, cols) / 2
                {
                    self.sel.anchor = self.decpos(self.sel.end);
                } else {
                    self.sel.anchor = self.sel.start;
                }
            } else {
                self.sel.anchor = Pos::new(
                    if selpoint.y * 2 < self.sel.start.y + self.sel.end.y {
                        self.sel.end.y
                    } else {
                        self.sel.start.y
                    },
                    if selpoint.x * 2 < self.sel.start.x + self.sel.end.x {
                        self.sel.end.x - 1
                    } else {
                        self.sel.start.x
                    },
                );
            }
        } else {
            self.sel.anchor = selpoint;
        }
        self.sel_drag(selpoint);
    }

    /// The selected text, honoring rectangular mode, wrap joining, and
    /// the wide-char filler column.
    pub fn selection_text(&self) -> String {
        if !self.sel.selected {
            return String::new();
        }
        let mut out = String::new();
        let (start, end) = (self.sel.start, self.sel.end);
        for y in start.y..=end.y {
            let line = self.line_at(y);
            let (x0, x1) = if self.sel.rect {
                (start.x, end.x)
            } else {
                (
                    if y == start.y { start.x } else { 0 },
                    if y == end.y { end.x } else { self.cols as i32 },
                )
            };
            let wrapped = line.flags.contains(RowFlags::WRAPPED);
            let limit = self.cols as i32 - i32::from(line.flags.contains(RowFlags::WRAPPED2));
            let mut segment = String::new();
            for x in x0..x1.min(limit) {
                let cell = &line.cells[x as usize];
                if cell.ch == UCSWIDE {
                    continue;
                }
                segment.push(cell.ch);
                for (cc, _) in line.combining(x as usize) {
                    segment.push(cc);
                }
            }
            if !wrapped || self.sel.rect {
                out.push_str(segment.trim_end());
                if y < end.y {
                    out.push('\n');
                }
            } else {
                out.push_str(&segment);
            }
        }
        out
    }

    // ---- mouse entry points -------------------------------------------------

    /// Should clicks go to the application rather than select?
    fn clicks_target_app(&self, mods: ModKeys) -> bool {
        let override_mod =
            ModKeys::from_bits_truncate(self.cfg.click_target_mod);
        let overridden = !override_mod.is_empty() && mods.contains(override_mod);
        self.modes.mouse_mode.is_some() && (self.cfg.clicks_target_app != overridden)
    }

    /// Button press. `count` is the click multiplicity (1 single,
    /// 2 double, 3 triple). Returns true when the event went to the
    /// application.
    pub fn mouse_click(
        &mut self,
        b: MouseButton,
        mods: ModKeys,
        p: Pos,
        count: u8,
    ) -> bool {
        self.sel.locator_pos_y = p.y + 1;
        self.sel.locator_pos_x = p.x + 1;
        self.sel.locator_buttons |= 1 << (b as u32 - 1);

        if self.clicks_target_app(mods) && !mods.contains(ModKeys::SHIFT) {
            if self.modes.mouse_mode == Some(MouseMode::X10) && b as u8 > 3 {
                return false;
            }
            let bp = self.box_pos(p);
            self.send_mouse_event(MouseAction::Click, Some(b), mods, bp);
            self.sel.mouse_state = SelMode::Reporting;
            self.sel.held_button = Some(b);
            return true;
        }

        if b == MouseButton::Left {
            let selpoint = self.selpoint(self.box_pos(p));
            self.sel.mouse_state = match count {
                1 => SelMode::SelChar,
                2 => SelMode::SelWord,
                _ => SelMode::SelLine,
            };
            self.sel.held_button = Some(b);
            if mods.contains(ModKeys::SHIFT) {
                self.sel_extend(selpoint);
            } else {
                self.sel.rect = mods.contains(ModKeys::ALT);
                self.sel.selected = count > 1;
                self.sel.anchor = selpoint;
                if count > 1 {
                    self.sel.start = selpoint;
                    self.sel.end = selpoint;
                    self.sel_spread();
                }
            }
        }
        false
    }

    /// Button release: finish a drag selection or report the release.
    pub fn mouse_release(&mut self, b: MouseButton, mods: ModKeys, p: Pos) {
        self.sel.locator_buttons &= !(1 << (b as u32 - 1));
        match self.sel.mouse_state {
            SelMode::Reporting => {
                if self.modes.mouse_mode != Some(MouseMode::X10) {
                    let bp = self.box_pos(p);
                    self.send_mouse_event(MouseAction::Release, Some(b), mods, bp);
                }
            }
            SelMode::Idle => {}
            _ => {
                if self.sel.selected && self.cfg.copy_on_select {
                    let text = self.selection_text();
                    if !text.is_empty() {
                        self.event(TermEvent::CopyText { text });
                    }
                }
            }
        }
        self.sel.mouse_state = SelMode::Idle;
        self.sel.held_button = None;
    }

    /// Pointer motion with or without held buttons.
    pub fn mouse_move(&mut self, mods: ModKeys, p: Pos) {
        self.sel.locator_pos_y = p.y + 1;
        self.sel.locator_pos_x = p.x + 1;

        // DECEFR: report once when the pointer leaves the rectangle
        if self.modes.mouse_mode == Some(MouseMode::Locator) && self.sel.locator_rectangle {
            let (y, x) = self.sel.locator_pos();
            if x < self.sel.locator_left
                || x > self.sel.locator_right
                || y < self.sel.locator_top
                || y > self.sel.locator_bottom
            {
                let buttons = self.sel.locator_buttons;
                self.respond_str(format!("\x1b[10;{};{};{};0&w", buttons, y, x));
                self.sel.locator_rectangle = false;
            }
            return;
        }

        match self.sel.mouse_state {
            SelMode::Reporting => {
                if matches!(
                    self.modes.mouse_mode,
                    Some(MouseMode::BtnEvent) | Some(MouseMode::AnyEvent)
                ) {
                    let bp = self.box_pos(p);
                    let b = self.sel.held_button;
                    self.send_mouse_event(MouseAction::Move, b, mods, bp);
                }
            }
            SelMode::Idle => {
                if self.modes.mouse_mode == Some(MouseMode::AnyEvent) {
                    let bp = self.box_pos(p);
                    self.send_mouse_event(MouseAction::Move, None, mods, bp);
                }
            }
            _ => {
                let selpoint = self.selpoint(self.box_pos(p));
                self.sel_drag(selpoint);
            }
        }
    }

    /// Wheel input. `delta` accumulates in 120-per-notch units.
    pub fn mouse_wheel(
        &mut self,
        horizontal: bool,
        delta: i32,
        lines_per_notch: i32,
        mods: ModKeys,
        p: Pos,
    ) -> WheelAction {
        if !self.cfg.suppress_wheel.is_empty() && contains(&self.cfg.suppress_wheel, 1) {
            return WheelAction::Handled;
        }
        self.sel.wheel_accum += delta;
        let mut notches = self.sel.wheel_accum / 120;
        if notches == 0 {
            return WheelAction::Handled;
        }
        self.sel.wheel_accum -= notches * 120;

        let reporting = self.modes.mouse_mode.is_some() && self.modes.wheel_reporting;
        if reporting && !mods.contains(ModKeys::SHIFT) {
            let bp = self.box_pos(p);
            while notches != 0 {
                let down = notches < 0;
                let base = if horizontal { 66 } else { 64 };
                self.send_wheel_event(base + u32::from(down), mods, bp);
                notches += if down { 1 } else { -1 };
            }
            return WheelAction::Handled;
        }

        if self.on_alt_screen && self.modes.wheel_reporting_xterm {
            // alternate scroll: wheel sends cursor keys
            let seq: &[u8] = if notches > 0 {
                if self.modes.app_cursor_keys {
                    b"\x1bOA"
                } else {
                    b"\x1b[A"
                }
            } else if self.modes.app_cursor_keys {
                b"\x1bOB"
            } else {
                b"\x1b[B"
            };
            for _ in 0..notches.unsigned_abs() * lines_per_notch.unsigned_abs() as u32 {
                self.respond(seq.to_vec());
            }
            return WheelAction::Handled;
        }

        WheelAction::ScrollView(-notches * lines_per_notch)
    }

    // ---- report encodings ---------------------------------------------------

    fn send_wheel_event(&mut self, code: u32, mods: ModKeys, p: Pos) {
        self.encode_mouse(code, mods, p, false);
    }

    fn send_mouse_event(
        &mut self,
        a: MouseAction,
        b: Option<MouseButton>,
        mods: ModKeys,
        p: Pos,
    ) {
        if self.modes.mouse_mode == Some(MouseMode::Locator) {
            self.send_locator_event(a, b);
            return;
        }

        let release = a == MouseAction::Release;
        let mut code = match b {
            // buttons 4/5 report as 128/129 series
            Some(MouseButton::Four) => 128,
            Some(MouseButton::Five) => 129,
            Some(btn) => btn as u32 - 1,
            None => 3,
        };
        if !release {
            code += a as u32 * 0x20;
        } else if self.modes.mouse_enc != MouseEnc::XtermCsi
            && self.modes.mouse_enc != MouseEnc::PixelCsi
        {
            code = 3;
        }
        self.encode_mouse(code, mods, p, release);
    }

    fn encode_mouse(&mut self, code: u32, mods: ModKeys, p: Pos, release: bool) {
        let mods = if self.modes.mouse_mode == Some(MouseMode::X10) {
            ModKeys::empty()
        } else {
            mods
        };
        let code = code + (mods.bits() as u32) * 4;
        let (x, y) = ((p.x + 1) as u32, (p.y + 1) as u32);
        match self.modes.mouse_enc {
            MouseEnc::XtermCsi => {
                let fin = if release { 'm' } else { 'M' };
                self.respond_str(format!("\x1b[<{};{};{}{}", code, x, y, fin));
            }
            MouseEnc::PixelCsi => {
                let fin = if release { 'm' } else { 'M' };
                self.respond_str(format!(
                    "\x1b[<{};{};{}{}",
                    code,
                    p.pix + 1,
                    p.piy + 1,
                    fin
                ));
            }
            MouseEnc::UrxvtCsi => {
                self.respond_str(format!("\x1b[{};{};{}M", code + 0x20, x, y));
            }
            enc => {
                // the traditional 0x20-offset encoding, with UTF-8
                // coordinate extension in 1005 mode
                let mut buf = vec![0x1B, b'[', b'M'];
                buf.push((code + 0x20).min(0xFF) as u8);
                let mut coord = |c: u32, buf: &mut Vec<u8>| {
                    let c = c + 0x20;
                    if enc != MouseEnc::Utf8 {
                        buf.push(if c < 0x100 { c as u8 } else { 0 });
                    } else if c < 0x80 {
                        buf.push(c as u8);
                    } else if c < 0x800 {
                        buf.push(0xC0 | (c >> 6) as u8);
                        buf.push(0x80 | (c & 0x3F) as u8);
                    } else {
                        buf.push(0);
                    }
                };
                coord(x, &mut buf);
                coord(y, &mut buf);
                self.respond(buf);
            }
        }
    }

    fn send_locator_event(&mut self, a: MouseAction, b: Option<MouseButton>) {
        let report = match a {
            MouseAction::Click if self.sel.locator_report_up => true,
            MouseAction::Release if self.sel.locator_report_dn => true,
            _ => false,
        };
        if !report {
            return;
        }
        let pe = match (b, a) {
            (Some(MouseButton::Left), MouseAction::Click) => 2,
            (Some(MouseButton::Left), MouseAction::Release) => 3,
            (Some(MouseButton::Middle), MouseAction::Click) => 4,
            (Some(MouseButton::Middle), MouseAction::Release) => 5,
            (Some(MouseButton::Right), MouseAction::Click) => 6,
            (Some(MouseButton::Right), MouseAction::Release) => 7,
            (Some(MouseButton::Four), MouseAction::Click) => 8,
            (Some(MouseButton::Four), MouseAction::Release) => 9,
            _ => return,
        };
        let (y, x) = self.sel.locator_pos();
        let buttons = self.sel.locator_buttons;
        self.respond_str(format!("\x1b[{};{};{};{};0&w", pe, buttons, y, x));
        self.sel.locator_rectangle = false;
    }
}
