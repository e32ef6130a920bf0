use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthChar;

use crate::config::Config;
use crate::image::{ImageList, TempFilePool};
use crate::sixel::SixelParser;
use crate::tek::{TekMode, TekState};

use super::cell::{Attr, AttrFlags, Cell, UCSWIDE};
use super::charset::{self, Charset};
use super::color::{Color, Palette};
use super::cursor::{CursorShape, CursorState};
use super::event::TermEvent;
use super::grid::{Grid, RowFlags, Scrollback};
use super::modes::{ModeStack, TerminalModes};
use super::mouse::MouseSelection;

/// Parser states of the control-sequence interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Normal,
    Escape,
    CsiArgs,
    OscStart,
    OscNum,
    OscPalette,
    CmdString,
    CmdEscape,
    DcsStart,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    DcsIgnore,
    DcsEscape,
    IgnoreString,
    Vt52Y,
    Vt52X,
    Vt52Fg,
    Vt52Bg,
    TekEscape,
    TekAddress0,
    TekAddress,
    TekIncremental,
}

/// CSI / DCS parameter slots.
pub const CSI_ARGS_MAX: usize = 32;
/// Marks "this slot is followed by colon-separated sub-parameters".
pub const SUB_PARS: u32 = 1 << 31;
/// Saturation cap for a numeric parameter.
const ARG_CAP: u32 = 0x7FFF_FFFF;

const CMD_BUF_MAX: usize = 1024 * 1024;

/// Synchronized-update timeout bounds (ms).
const SUSPEND_DEFAULT_MS: u64 = 150;
const SUSPEND_MAX_MS: u64 = 420;

/// Collected render damage: which visible rows changed since the last
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Damage {
    pub rows: Vec<u16>,
    pub full: bool,
}

/// Full terminal state: the screen pair, the interpreter state machine,
/// and the queues feeding replies and events back to the host.
pub struct TerminalState {
    pub cfg: Config,
    pub rows: u16,
    pub cols: u16,

    pub grid: Grid,
    pub alt_grid: Grid,
    pub on_alt_screen: bool,
    pub scrollback: Scrollback,
    /// Display offset into the scrollback: 0 shows the live screen,
    /// negative values scroll back.
    pub disptop: i32,
    /// Total lines ever scrolled off the primary top; anchors image
    /// placements.
    pub virtuallines: i64,

    pub cursor: CursorState,
    pub(crate) saved_cursors: [CursorState; 2],
    pub modes: TerminalModes,
    pub marg_top: u16,
    pub marg_bot: u16,
    pub marg_left: u16,
    pub marg_right: u16,
    pub tabs: Vec<bool>,
    pub(crate) erase_attr: Attr,

    // Interpreter state
    pub(crate) state: State,
    pub(crate) esc_mod: u8,
    pub(crate) esc_mod0: u8,
    pub(crate) esc_mod1: u8,
    pub(crate) csi_argv: [u32; CSI_ARGS_MAX],
    pub(crate) csi_argc: usize,
    pub(crate) csi_defined: [bool; CSI_ARGS_MAX],
    pub(crate) cmd_num: i32,
    pub(crate) cmd_buf: Vec<u8>,
    pub(crate) dcs_cmd: u32,
    utf8_acc: u32,
    utf8_need: u8,
    pub vt52_mode: u8,

    // REP memory
    pub(crate) last_char: Option<char>,
    pub(crate) last_width: i8,
    pub(crate) last_attr: Attr,

    pub tek: TekState,
    tek_prev_state: Option<State>,
    pub(crate) sixel: Option<SixelParser>,
    pub images: ImageList,
    pub palette: Palette,

    pub(crate) attr_stack: Vec<(Attr, AttrMask)>,
    pub(crate) mode_stack: ModeStack,
    /// DECSACE: attribute changes apply to the exact rectangle rather
    /// than the stream between the corners.
    pub attr_rect_mode: bool,
    /// SPA/EPA in effect: ECH and friends honor PROTECTED.
    pub iso_guarded_area: bool,

    suspend_until: Option<Instant>,

    pub cursor_shape: Option<CursorShape>,
    pub cursor_blinks: Option<bool>,
    pub cursor_blink_interval: u32,
    pub cursor_size: u32,

    pub title: String,
    pub(crate) title_stack: Vec<String>,
    pub bell_vol: u8,
    pub margin_bell_vol: u8,
    pub(crate) ring_enabled: bool,

    pub(crate) pending_responses: Vec<Vec<u8>>,
    pub(crate) pending_events: Vec<TermEvent>,
    pub(crate) links: Vec<String>,

    pub(crate) printing: bool,
    pub(crate) only_printing: bool,
    print_state: u8,
    pub(crate) printbuf: Vec<u8>,

    pub wide_indic: bool,
    pub wide_extra: bool,
    pub enable_bold_colour: bool,
    pub enable_blink_colour: bool,

    /// Cell metrics reported by the host; images are sized in these.
    pub cell_width: u16,
    pub cell_height: u16,

    pub sel: MouseSelection,
}

/// Field mask for XTPUSHSGR: which attribute groups a pop restores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttrMask {
    pub flags: AttrFlags,
    pub underline: bool,
    pub fg: bool,
    pub bg: bool,
    pub ulcolr: bool,
    pub font: bool,
}

impl TerminalState {
    pub fn new(cfg: Config) -> Self {
        let rows = cfg.rows.max(1);
        let cols = cfg.cols.max(2);
        let mut tabs = vec![false; cols as usize];
        for i in (0..cols as usize).step_by(8) {
            tabs[i] = true;
        }
        let tek = TekState::new(cfg.tek_glow, cfg.tek_strap);
        Self {
            rows,
            cols,
            grid: Grid::new(rows, cols),
            alt_grid: Grid::new(rows, cols),
            on_alt_screen: false,
            scrollback: Scrollback::new(cfg.scrollback_lines),
            disptop: 0,
            virtuallines: 0,
            cursor: CursorState::new(),
            saved_cursors: [CursorState::new(), CursorState::new()],
            modes: TerminalModes::default(),
            marg_top: 0,
            marg_bot: rows - 1,
            marg_left: 0,
            marg_right: cols - 1,
            tabs,
            erase_attr: Attr::erase_with(Color::Default),
            state: State::Normal,
            esc_mod: 0,
            esc_mod0: 0,
            esc_mod1: 0,
            csi_argv: [0; CSI_ARGS_MAX],
            csi_argc: 0,
            csi_defined: [false; CSI_ARGS_MAX],
            cmd_num: -1,
            cmd_buf: Vec::new(),
            dcs_cmd: 0,
            utf8_acc: 0,
            utf8_need: 0,
            vt52_mode: 0,
            last_char: None,
            last_width: 1,
            last_attr: Attr::default(),
            tek,
            tek_prev_state: None,
            sixel: None,
            images: ImageList::new(TempFilePool::new()),
            palette: Palette::new(),
            attr_stack: Vec::new(),
            mode_stack: ModeStack::default(),
            attr_rect_mode: false,
            iso_guarded_area: false,
            suspend_until: None,
            cursor_shape: None,
            cursor_blinks: None,
            cursor_blink_interval: 0,
            cursor_size: 0,
            title: String::new(),
            title_stack: Vec::new(),
            bell_vol: 8,
            margin_bell_vol: 8,
            ring_enabled: true,
            pending_responses: Vec::new(),
            pending_events: Vec::new(),
            links: Vec::new(),
            printing: false,
            only_printing: false,
            print_state: 0,
            printbuf: Vec::new(),
            wide_indic: false,
            wide_extra: false,
            enable_bold_colour: true,
            enable_blink_colour: true,
            cell_width: 8,
            cell_height: 16,
            sel: MouseSelection::default(),
            cfg,
        }
    }

    /// The host reports its font cell metrics here; sixel rounding and
    /// image placement use them.
    pub fn set_cell_metrics(&mut self, width: u16, height: u16) {
        self.cell_width = width.max(1);
        self.cell_height = height.max(1);
    }

    // ---- host-facing queues -------------------------------------------------

    /// Drain reply bytes queued for the child (DSR, DA, DECRQSS, mouse
    /// reports, ...).
    pub fn take_pending_responses(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.pending_responses)
    }

    pub fn take_events(&mut self) -> Vec<TermEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub(crate) fn respond(&mut self, bytes: Vec<u8>) {
        self.pending_responses.push(bytes);
    }

    pub(crate) fn respond_str(&mut self, s: String) {
        self.pending_responses.push(s.into_bytes());
    }

    pub(crate) fn event(&mut self, ev: TermEvent) {
        self.pending_events.push(ev);
    }

    /// Deadline of an active synchronized-update window, if any. The
    /// host polls this before painting.
    pub fn suspend_update_until(&self) -> Option<Instant> {
        self.suspend_until
    }

    fn update_suspended(&mut self) -> bool {
        match self.suspend_until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                // window expired: force a flush
                self.suspend_until = None;
                false
            }
            None => false,
        }
    }

    pub(crate) fn set_suspend_update(&mut self, ms: u64) {
        if ms == 0 {
            self.suspend_until = None;
        } else {
            self.suspend_until = Some(Instant::now() + Duration::from_millis(ms));
        }
    }

    pub(crate) fn begin_synchronized_update(&mut self, requested_ms: Option<u64>) {
        let ms = match requested_ms {
            Some(req) if req > 0 => req.min(SUSPEND_MAX_MS),
            _ => SUSPEND_DEFAULT_MS,
        };
        self.set_suspend_update(ms);
    }

    /// Collect dirty visible rows, clearing their dirty bits. Returns
    /// None while a synchronized-update window is open or nothing
    /// changed.
    pub fn take_damage(&mut self) -> Option<Damage> {
        if self.update_suspended() {
            return None;
        }
        let grid = if self.on_alt_screen {
            &mut self.alt_grid
        } else {
            &mut self.grid
        };
        let mut rows = Vec::new();
        for (i, row) in grid.lines.iter_mut().enumerate() {
            if row.dirty {
                rows.push(i as u16);
                row.dirty = false;
            }
        }
        if rows.is_empty() {
            None
        } else {
            let full = rows.len() == grid.rows as usize;
            Some(Damage { rows, full })
        }
    }

    // ---- small helpers ------------------------------------------------------

    pub(crate) fn agrid(&self) -> &Grid {
        if self.on_alt_screen {
            &self.alt_grid
        } else {
            &self.grid
        }
    }

    pub(crate) fn agrid_mut(&mut self) -> &mut Grid {
        if self.on_alt_screen {
            &mut self.alt_grid
        } else {
            &mut self.grid
        }
    }

    pub(crate) fn erase_cell(&self) -> Cell {
        Cell {
            ch: ' ',
            cc_next: 0,
            attr: self.erase_attr,
        }
    }

    pub(crate) fn update_erase_attr(&mut self) {
        self.erase_attr = Attr {
            fg: self.cursor.attr.fg,
            bg: self.cursor.attr.bg,
            flags: AttrFlags::CLEAR,
            ..Attr::default()
        };
    }

    /// Register a hyperlink target, reusing an existing id for the same
    /// URI.
    pub(crate) fn putlink(&mut self, link: &str) -> u32 {
        if let Some(idx) = self.links.iter().position(|l| l == link) {
            return idx as u32;
        }
        self.links.push(link.to_string());
        (self.links.len() - 1) as u32
    }

    pub fn link_target(&self, id: u32) -> Option<&str> {
        self.links.get(id as usize).map(|s| s.as_str())
    }

    pub(crate) fn push_cmd(&mut self, c: u8) -> bool {
        if self.cmd_buf.len() >= CMD_BUF_MAX {
            return false;
        }
        self.cmd_buf.push(c);
        true
    }

    // ---- reset --------------------------------------------------------------

    /// Terminal reset. `full` corresponds to RIS; soft reset (DECSTR)
    /// keeps display contents.
    pub fn reset(&mut self, full: bool) {
        self.state = State::Normal;
        self.esc_mod = 0;
        self.cursor.wrapnext = false;
        self.cursor.origin = false;
        self.cursor.attr = Attr::default();
        self.cursor.csets = [Charset::Ascii; 4];
        self.cursor.cset_single = Charset::Ascii;
        self.cursor.gl = 0;
        self.cursor.gr = 0;
        self.cursor.oem_acs = 0;
        self.cursor.width_attr = 0;
        self.cursor.bidimode = RowFlags::empty();
        self.saved_cursors = [CursorState::new(), CursorState::new()];
        self.marg_top = 0;
        self.marg_bot = self.rows - 1;
        self.marg_left = 0;
        self.marg_right = self.cols - 1;
        self.modes.insert = false;
        self.modes.app_cursor_keys = false;
        self.modes.app_keypad = false;
        self.modes.autowrap = true;
        self.modes.rev_wrap = false;
        self.modes.lrmargmode = false;
        self.iso_guarded_area = false;
        self.attr_rect_mode = false;
        self.update_erase_attr();
        self.suspend_until = None;

        if full {
            self.modes = TerminalModes::default();
            self.vt52_mode = 0;
            self.tek.leave();
            self.sixel = None;
            self.cursor = CursorState::new();
            self.tabs = vec![false; self.cols as usize];
            for i in (0..self.cols as usize).step_by(8) {
                self.tabs[i] = true;
            }
            self.grid = Grid::new(self.rows, self.cols);
            self.alt_grid = Grid::new(self.rows, self.cols);
            self.on_alt_screen = false;
            self.scrollback.clear();
            self.disptop = 0;
            self.images.clear();
            self.palette.reset_all();
            self.attr_stack.clear();
            self.links.clear();
            self.last_char = None;
            self.cursor_shape = None;
            self.cursor_blinks = None;
            self.update_erase_attr();
            self.event(TermEvent::InvalidateAll);
        }
    }

    // ---- the byte interpreter ----------------------------------------------

    /// Feed a chunk of child output through the interpreter. Replies and
    /// events are queued; the host drains them afterwards.
    pub fn write(&mut self, buf: &[u8]) {
        let mut pos = 0usize;
        while pos < buf.len() {
            let c = buf[pos];
            pos += 1;

            // Printer controller: buffer everything, watch for CSI 4 i.
            if self.printing {
                self.printbuf.push(c);
                if self.only_printing {
                    self.print_state = match (self.print_state, c) {
                        (_, 0x1B) => 1,
                        (1, b'[') => 2,
                        (2, b'4') => 3,
                        (3, b'i') => {
                            self.printbuf.truncate(self.printbuf.len() - 4);
                            self.print_finish();
                            0
                        }
                        _ => 0,
                    };
                    continue;
                }
            }

            // CAN and SUB abort any open string or sequence state
            if (c == 0x18 || c == 0x1A)
                && !matches!(
                    self.state,
                    State::Normal
                        | State::TekEscape
                        | State::TekAddress0
                        | State::TekAddress
                        | State::TekIncremental
                )
            {
                self.state = State::Normal;
                self.sixel = None;
                self.esc_mod = 0;
                continue;
            }

            match self.state {
                State::Normal => {
                    if !self.normal_byte(c) {
                        pos -= 1;
                    }
                }
                State::Vt52Y => {
                    self.cmd_buf.clear();
                    self.cmd_buf.push(c);
                    self.state = State::Vt52X;
                }
                State::Vt52X => {
                    self.cmd_buf.push(c);
                    self.do_vt52_move();
                }
                State::Vt52Fg => self.do_vt52_colour(true, c),
                State::Vt52Bg => self.do_vt52_colour(false, c),
                State::TekEscape => self.tek_esc(c),
                State::TekAddress0 | State::TekAddress => self.tek_address_byte(c),
                State::TekIncremental => {
                    if c < b' ' {
                        self.tek_ctrl(c);
                    } else if c == b' ' || c == b'P' {
                        self.tek.pen(c == b'P');
                        self.event(TermEvent::TekUpdated);
                    } else if b"DEAIHJBF".contains(&c) {
                        self.tek.step(c & 0x0F);
                        self.event(TermEvent::TekUpdated);
                    }
                }
                State::Escape | State::CmdEscape => {
                    if self.vt52_mode != 0 {
                        self.do_vt52(c);
                    } else if c < 0x20 {
                        self.do_ctrl(c);
                    } else if c < 0x30 {
                        self.push_esc_mod(c);
                    } else if c == b'\\' && self.state == State::CmdEscape {
                        // ST terminates the OSC string
                        self.do_cmd();
                        self.state = State::Normal;
                    } else {
                        self.do_esc(c);
                    }
                }
                State::CsiArgs => match c {
                    0x00..=0x1F => {
                        self.do_ctrl(c);
                    }
                    b';' => {
                        if self.csi_argc < CSI_ARGS_MAX {
                            self.csi_argc += 1;
                        }
                    }
                    b':' => {
                        // ISO 8613-6 colon-separated sub-parameters
                        let i = self.csi_argc - 1;
                        self.csi_argv[i] |= SUB_PARS;
                        if self.csi_argc < CSI_ARGS_MAX {
                            self.csi_argc += 1;
                        }
                    }
                    b'0'..=b'9' => {
                        let i = self.csi_argc - 1;
                        if i < CSI_ARGS_MAX {
                            let v = (self.csi_argv[i] & !SUB_PARS) as u64 * 10
                                + (c - b'0') as u64;
                            self.csi_argv[i] = (self.csi_argv[i] & SUB_PARS)
                                | (v.min(ARG_CAP as u64) as u32);
                            self.csi_defined[i] = true;
                        }
                    }
                    0x20..=0x3F => self.push_esc_mod(c),
                    _ => {
                        self.do_csi(c);
                        self.state = State::Normal;
                    }
                },
                State::OscStart => {
                    self.cmd_buf.clear();
                    self.cmd_num = 0;
                    match c {
                        b'P' => self.state = State::OscPalette,
                        b'R' => {
                            // Linux palette reset
                            self.palette.reset_all();
                            self.event(TermEvent::PaletteChanged);
                            self.state = State::Normal;
                        }
                        b'I' => {
                            self.cmd_num = 7773;
                            self.state = State::OscNum;
                        }
                        b'L' => {
                            self.cmd_num = 1;
                            self.state = State::OscNum;
                        }
                        b'l' => {
                            self.cmd_num = 2;
                            self.state = State::OscNum;
                        }
                        b'0'..=b'9' => {
                            self.cmd_num = (c - b'0') as i32;
                            self.state = State::OscNum;
                        }
                        b';' => {
                            self.cmd_num = 0;
                            self.state = State::CmdString;
                        }
                        0x07 => self.state = State::Normal,
                        0x1B => self.state = State::Escape,
                        _ => self.state = State::IgnoreString,
                    }
                }
                State::OscNum => match c {
                    b'0'..=b'9' => {
                        self.cmd_num = self
                            .cmd_num
                            .saturating_mul(10)
                            .saturating_add((c - b'0') as i32);
                        if self.cmd_num < 0 {
                            self.cmd_num = -99;
                        }
                    }
                    b';' => self.state = State::CmdString,
                    0x07 => {
                        self.do_cmd();
                        self.state = State::Normal;
                    }
                    0x1B => self.state = State::CmdEscape,
                    _ => self.state = State::IgnoreString,
                },
                State::OscPalette => {
                    if c.is_ascii_hexdigit() {
                        self.push_cmd(c);
                        if self.cmd_buf.len() == 7 {
                            self.linux_palette();
                            self.state = State::Normal;
                        }
                    } else {
                        self.state = State::Normal;
                        if c != 0x07 {
                            pos -= 1;
                        }
                    }
                }
                State::CmdString => match c {
                    0x07 => {
                        self.do_cmd();
                        self.state = State::Normal;
                    }
                    0x1B => self.state = State::CmdEscape,
                    b'\n' | b'\r' => {
                        // keep new lines except in base64 image payloads
                        if self.cmd_num != 1337 {
                            self.push_cmd(c);
                        }
                    }
                    _ => {
                        self.push_cmd(c);
                    }
                },
                State::IgnoreString => match c {
                    0x07 => self.state = State::Normal,
                    0x1B => self.state = State::Escape,
                    _ => {}
                },
                State::DcsStart => {
                    self.cmd_num = -1;
                    self.cmd_buf.clear();
                    self.dcs_cmd = 0;
                    self.csi_argc = 0;
                    self.csi_argv = [0; CSI_ARGS_MAX];
                    self.csi_defined = [false; CSI_ARGS_MAX];
                    match c {
                        b'@'..=b'~' => {
                            self.dcs_cmd = c as u32;
                            self.do_dcs();
                            if self.state != State::DcsIgnore {
                                self.state = State::DcsPassthrough;
                            }
                        }
                        0x1B => self.state = State::DcsEscape,
                        b'0'..=b'9' | b';' => self.state = State::DcsParam,
                        b':' => self.state = State::DcsIgnore,
                        b'<'..=b'?' => {
                            self.dcs_cmd = c as u32;
                            self.state = State::DcsParam;
                        }
                        b' '..=b'/' => {
                            self.dcs_cmd = c as u32;
                            self.state = State::DcsIntermediate;
                        }
                        _ => self.state = State::DcsIgnore,
                    }
                }
                State::DcsParam => match c {
                    b'@'..=b'~' => {
                        self.dcs_cmd = self.dcs_cmd << 8 | c as u32;
                        if self.csi_argv[self.csi_argc] != 0 {
                            self.csi_argc += 1;
                        }
                        self.do_dcs();
                        if self.state != State::DcsIgnore {
                            self.state = State::DcsPassthrough;
                        }
                    }
                    0x1B => {
                        self.state = State::DcsEscape;
                        self.esc_mod = 0;
                    }
                    b'0'..=b'9' => {
                        if self.csi_argc < CSI_ARGS_MAX {
                            let i = self.csi_argc;
                            self.csi_argv[i] = (self.csi_argv[i] as u64 * 10
                                + (c - b'0') as u64)
                                .min(ARG_CAP as u64)
                                as u32;
                        }
                    }
                    b';' | b':' => {
                        if self.csi_argc + 1 < CSI_ARGS_MAX {
                            self.csi_argc += 1;
                        }
                    }
                    b'<'..=b'?' => {
                        self.dcs_cmd = self.dcs_cmd << 8 | c as u32;
                    }
                    b' '..=b'/' => {
                        self.dcs_cmd = self.dcs_cmd << 8 | c as u32;
                        self.state = State::DcsIntermediate;
                    }
                    _ => self.state = State::DcsIgnore,
                },
                State::DcsIntermediate => match c {
                    b'@'..=b'~' => {
                        self.dcs_cmd = self.dcs_cmd << 8 | c as u32;
                        self.do_dcs();
                        if self.state != State::DcsIgnore {
                            self.state = State::DcsPassthrough;
                        }
                    }
                    0x1B => {
                        self.state = State::DcsEscape;
                        self.esc_mod = 0;
                    }
                    b'0'..=b'?' => self.state = State::DcsIgnore,
                    b' '..=b'/' => {
                        self.dcs_cmd = self.dcs_cmd << 8 | c as u32;
                    }
                    _ => self.state = State::DcsIgnore,
                },
                State::DcsPassthrough => match c {
                    0x1B => {
                        self.state = State::DcsEscape;
                        self.esc_mod = 0;
                    }
                    _ => {
                        if !self.push_cmd(c) {
                            self.do_dcs();
                            self.cmd_buf.clear();
                            self.cmd_buf.push(c);
                        }
                    }
                },
                State::DcsIgnore => {
                    if c == 0x1B {
                        self.state = State::Escape;
                        self.esc_mod = 0;
                    }
                }
                State::DcsEscape => {
                    if c < 0x20 {
                        self.do_ctrl(c);
                        self.state = State::Normal;
                    } else if c < 0x30 {
                        self.esc_mod = if self.esc_mod != 0 { 0xFF } else { c };
                        self.state = State::Escape;
                    } else if c == b'\\' {
                        // ST terminates the DCS
                        self.do_dcs();
                        self.state = State::Normal;
                    } else {
                        self.state = State::Escape;
                        self.sixel = None;
                        self.do_esc(c);
                    }
                }
            }
        }

        // input interpretation is never deferred; schedule a paint unless
        // a synchronized-update window is open
        self.ring_enabled = true;
    }

    fn push_esc_mod(&mut self, c: u8) {
        if self.esc_mod != 0 {
            self.esc_mod0 = self.esc_mod;
            self.esc_mod1 = c;
            self.esc_mod = 0xFF;
        } else {
            self.esc_mod0 = 0;
            self.esc_mod1 = 0;
            self.esc_mod = c;
        }
    }

    // ---- NORMAL state: charset decode and printing --------------------------

    /// Handle one byte in NORMAL state; returns false to re-process the
    /// byte (decoder resynchronization after malformed UTF-8).
    fn normal_byte(&mut self, c: u8) -> bool {
        // OEM ACS pass-through: bytes render through CP437 directly
        if self.cursor.oem_acs != 0 && !b"\x1b\n\r\x08".contains(&c) {
            let b = if self.cursor.oem_acs == 2 { c | 0x80 } else { c };
            self.write_ucschar(charset::cp437_char(b), 1);
            return true;
        }

        let mut cset = self.cursor.csets[self.cursor.gl];
        if self.cursor.cset_single != Charset::Ascii && c > 0x20 && c < 0xFF {
            cset = self.cursor.cset_single;
            self.cursor.cset_single = Charset::Ascii;
        } else if self.cursor.gr != 0
            && self.cursor.csets[self.cursor.gr] != Charset::Ascii
            && !self.cursor.utf
            && (0x80..0xFF).contains(&c)
        {
            // mimic xterm: C1 range stays control
            if c < 0xA0 {
                return true;
            }
            return self.print_mapped(self.cursor.csets[self.cursor.gr], c & 0x7F);
        }

        if self.vt52_mode != 0 {
            cset = if self.vt52_mode > 1 {
                Charset::Vt52Draw
            } else {
                Charset::Ascii
            };
        } else if cset == Charset::DecSupp {
            cset = self.cursor.decsupp;
        }

        // decode the byte to a codepoint
        let wc: char = if self.cursor.utf {
            match self.utf8_byte(c) {
                Utf8Step::Incomplete => return true,
                Utf8Step::Char(ch) => ch,
                Utf8Step::Error => {
                    self.write_error();
                    return true;
                }
                Utf8Step::ErrorRetry => {
                    self.write_error();
                    return false;
                }
            }
        } else {
            // single-byte mode: Latin-1 interpretation
            c as char
        };

        // control characters
        if (wc as u32) < 0x20 || wc == '\u{7F}' {
            self.do_ctrl(wc as u8);
            return true;
        }

        // ASCII fast path
        if (' '..='\u{7E}').contains(&wc) && cset == Charset::Ascii {
            self.write_ucschar(wc, 1);
            return true;
        }

        // noncharacters
        if wc == '\u{FFFE}' || wc == '\u{FFFF}' {
            self.write_error();
            return true;
        }

        if (wc as u32) < 0x80 && cset != Charset::Ascii {
            return self.print_mapped(cset, wc as u8);
        }

        let width = self.char_width(wc);
        self.write_ucschar(wc, width);
        true
    }

    fn print_mapped(&mut self, cset: Charset, c: u8) -> bool {
        let mapped = charset::map_char(cset, c);
        let saved = (self.cursor.attr.graph, self.cursor.attr.font);
        if mapped.graph != 0 {
            self.cursor.attr.graph = mapped.graph;
            if mapped.font != 0 {
                self.cursor.attr.font = mapped.font;
            }
        }
        let width = self.char_width(mapped.ch).max(1);
        self.write_ucschar(mapped.ch, width);
        self.cursor.attr.graph = saved.0;
        self.cursor.attr.font = saved.1;
        true
    }

    /// Width policy: combining 0, normal 1, wide 2; East-Asian ambiguous
    /// follows the configured policy.
    pub(crate) fn char_width(&self, ch: char) -> i8 {
        if self.wide_indic && ('\u{0900}'..='\u{0DFF}').contains(&ch) {
            return 2;
        }
        if self.wide_extra && ('\u{2100}'..='\u{2BFF}').contains(&ch) {
            return 2;
        }
        let ambig_wide = self.cfg.charwidth % 10 == 2;
        let w = if ambig_wide {
            UnicodeWidthChar::width_cjk(ch)
        } else {
            UnicodeWidthChar::width(ch)
        };
        match w {
            Some(w) => w as i8,
            None => 0,
        }
    }

    fn utf8_byte(&mut self, c: u8) -> Utf8Step {
        if self.utf8_need > 0 {
            if c & 0xC0 == 0x80 {
                self.utf8_acc = (self.utf8_acc << 6) | (c & 0x3F) as u32;
                self.utf8_need -= 1;
                if self.utf8_need == 0 {
                    return match char::from_u32(self.utf8_acc) {
                        Some(ch) => Utf8Step::Char(ch),
                        None => Utf8Step::Error,
                    };
                }
                return Utf8Step::Incomplete;
            }
            // truncated sequence: emit the error and retry this byte
            self.utf8_need = 0;
            return Utf8Step::ErrorRetry;
        }
        match c {
            0x00..=0x7F => Utf8Step::Char(c as char),
            0xC2..=0xDF => {
                self.utf8_acc = (c & 0x1F) as u32;
                self.utf8_need = 1;
                Utf8Step::Incomplete
            }
            0xE0..=0xEF => {
                self.utf8_acc = (c & 0x0F) as u32;
                self.utf8_need = 2;
                Utf8Step::Incomplete
            }
            0xF0..=0xF4 => {
                self.utf8_acc = (c & 0x07) as u32;
                self.utf8_need = 3;
                Utf8Step::Incomplete
            }
            _ => Utf8Step::Error,
        }
    }

    /// Write REPLACEMENT CHARACTER (the classic fallback for malformed
    /// input); the host substitutes U+2592 when the glyph is missing.
    pub(crate) fn write_error(&mut self) {
        self.write_char('\u{FFFD}', 1);
    }

    pub(crate) fn write_ucschar(&mut self, ch: char, width: i8) {
        // block elements render through the self-drawn glyph path
        if ('\u{2580}'..='\u{259F}').contains(&ch) {
            let saved = (self.cursor.attr.graph, self.cursor.attr.font);
            self.cursor.attr.graph = (ch as u32 & 0xF) as u8;
            self.cursor.attr.font = 14 + ((ch as u32 >> 4) & 1) as u8;
            self.write_char(ch, width);
            self.cursor.attr.graph = saved.0;
            self.cursor.attr.font = saved.1;
        } else {
            self.write_char(ch, width);
        }
    }

    /// Print one codepoint at the cursor. This is the single write path:
    /// wrapping, wide-char placement, combining attachment, insert mode,
    /// and REP memory all live here.
    pub(crate) fn write_char(&mut self, c: char, width: i8) {
        if self.tek.active() {
            self.tek.write(c, width);
            self.event(TermEvent::TekUpdated);
            return;
        }
        if c == '\0' {
            return;
        }

        self.last_char = Some(c);
        self.last_width = width;
        self.last_attr = self.cursor.attr;

        let mut width = width;

        // pending wrap happens before anything is placed
        if self.cursor.wrapnext && self.modes.autowrap && width > 0 {
            let y = self.cursor.row;
            let wrappos = self.cursor.col;
            let bidimode = self.cursor.bidimode;
            {
                let row = self.agrid_mut().row_mut(y);
                row.flags |= RowFlags::WRAPPED;
                row.wrappos = wrappos;
            }
            if self.cursor.row == self.marg_bot {
                self.do_scroll(self.marg_top, self.marg_bot, 1, true);
            } else if self.cursor.row < self.rows - 1 {
                self.cursor.row += 1;
            }
            self.cursor.col = self.marg_left;
            self.cursor.wrapnext = false;
            let y = self.cursor.row;
            let row = self.agrid_mut().row_mut(y);
            row.flags = (row.flags - RowFlags::BIDI_MASK) | bidimode | RowFlags::WRAPCONTD;
        }

        let mut overstrike = false;
        if self.cursor.attr.flags.contains(AttrFlags::OVERSTRIKE) {
            width = 0;
            overstrike = true;
            self.cursor.wrapnext = false;
        }

        let mut single_width = false;

        // explicit PEC width attribute overrides
        if self.cursor.width_attr != 0 && width > 0 {
            match self.cursor.width_attr {
                1 => {
                    if width >= 2 {
                        self.cursor.attr.flags |= AttrFlags::CLEAR | AttrFlags::NARROW;
                    }
                    width = 1;
                }
                11 => {
                    if width > 1 {
                        single_width = true;
                        width = 1;
                    }
                }
                2 => {
                    if width < 2 {
                        self.cursor.attr.flags |= AttrFlags::EXPAND;
                        width = 2;
                    }
                }
                _ => {}
            }
        }

        // configured single-cell CJK
        if self.cfg.charwidth >= 10 && width > 1 {
            single_width = true;
            width = 1;
        }

        if self.modes.insert && width > 0 {
            self.insert_char(width as i32);
        }

        match width {
            1 => {
                let (x, y) = (self.cursor.col, self.cursor.row);
                self.check_boundary(x, y);
                self.check_boundary(x + 1, y);
                self.put_char(c);
                if single_width {
                    let (x, y) = (self.cursor.col, self.cursor.row);
                    self.agrid_mut().row_mut(y).cells[x as usize]
                        .attr
                        .flags |= AttrFlags::SINGLE;
                }
            }
            2 | 3 => {
                let (x, y) = (self.cursor.col, self.cursor.row);
                self.check_boundary(x, y);
                self.check_boundary(x + width as u16, y);
                // a wide char that would start in the last column prints a
                // filler there and wraps first
                if self.cursor.col == self.marg_right || self.cursor.col == self.cols - 1 {
                    let erase = self.erase_cell();
                    let y = self.cursor.row;
                    let wrappos = self.cursor.col;
                    let bidimode = self.cursor.bidimode;
                    {
                        let col = self.cursor.col as usize;
                        let row = self.agrid_mut().row_mut(y);
                        row.clear_cc(col);
                        row.cells[col] = erase;
                        row.flags |= RowFlags::WRAPPED | RowFlags::WRAPPED2;
                        row.wrappos = wrappos;
                    }
                    if self.cursor.row == self.marg_bot {
                        self.do_scroll(self.marg_top, self.marg_bot, 1, true);
                    } else if self.cursor.row < self.rows - 1 {
                        self.cursor.row += 1;
                    }
                    self.cursor.col = self.marg_left;
                    let y = self.cursor.row;
                    {
                        let row = self.agrid_mut().row_mut(y);
                        row.flags =
                            (row.flags - RowFlags::BIDI_MASK) | bidimode | RowFlags::WRAPCONTD;
                    }
                    let (x, y) = (self.cursor.col, self.cursor.row);
                    self.check_boundary(x, y);
                    self.check_boundary(x + width as u16, y);
                }
                self.put_char(c);
                self.cursor.col += 1;
                self.put_char(UCSWIDE);
            }
            0 | -1 => {
                // combining character (or second half of a surrogate pair
                // repeated via REP)
                let y = self.cursor.row;
                if self.cursor.col > 0 || overstrike {
                    let mut x = if overstrike {
                        self.cursor.col
                    } else {
                        self.cursor.col - if self.cursor.wrapnext { 0 } else { 1 }
                    } as usize;
                    let attr = self.cursor.attr;
                    let row = self.agrid_mut().row_mut(y);
                    if x >= row.cells.len() {
                        return;
                    }
                    if row.cells[x].ch == UCSWIDE && x > 0 {
                        x -= 1;
                    }
                    row.add_cc(x, c, attr);
                } else {
                    // initial combining mark on the first column
                    let attr = self.cursor.attr;
                    self.agrid_mut().row_mut(y).add_cc(0, c, attr);
                }
                if !overstrike {
                    return;
                }
            }
            _ => return,
        }

        self.cursor.col += 1;
        if self.cursor.col == self.marg_right + 1 || self.cursor.col == self.cols {
            self.cursor.col -= 1;
            if self.modes.autowrap || self.cfg.old_wrapmodes {
                self.cursor.wrapnext = true;
            }
        }
    }

    fn put_char(&mut self, c: char) {
        let (x, y) = (self.cursor.col as usize, self.cursor.row);
        let attr = self.cursor.attr;
        let bidimode = self.cursor.bidimode;
        let margin_bell =
            self.modes.margin_bell && self.ring_enabled && x + 8 == self.marg_right as usize + 1;
        let row = self.agrid_mut().row_mut(y);
        if x >= row.cells.len() {
            return;
        }
        row.clear_cc(x);
        row.cells[x] = Cell::new(c, attr);
        if !row.flags.contains(RowFlags::WRAPCONTD) {
            row.flags = (row.flags - RowFlags::BIDI_MASK) | bidimode;
        }
        if margin_bell {
            self.ring_enabled = false;
            self.event(TermEvent::MarginBell);
        }
    }

    // ---- control characters -------------------------------------------------

    /// Process a C0 control, returning whether it was recognised.
    pub(crate) fn do_ctrl(&mut self, c: u8) -> bool {
        if self.tek.active() {
            self.tek_ctrl(c);
            return true;
        }
        match c {
            0x1B => {
                self.state = State::Escape;
                self.esc_mod = 0;
                return true; // keep preceding char for REP
            }
            0x07 => self.event(TermEvent::Bell),
            0x08 => self.write_backspace(),
            0x09 => self.write_tab(),
            0x0B | 0x0C | 0x0A => {
                self.write_linefeed();
                if self.modes.newline_mode {
                    self.write_return();
                }
            }
            0x0D => self.write_return(),
            0x05 => {
                // ENQ: answerback
                if self.vt52_mode == 0 && !self.cfg.answerback.is_empty() {
                    let ab = self.cfg.answerback.clone().into_bytes();
                    self.respond(ab);
                }
            }
            0x0E => {
                // LS1
                if self.vt52_mode == 0 {
                    self.cursor.gl = 1;
                }
            }
            0x0F => {
                // LS0
                if self.vt52_mode == 0 {
                    self.cursor.gl = 0;
                }
            }
            _ => return false,
        }
        self.last_char = None;
        true
    }

    // ---- ESC dispatch -------------------------------------------------------

    fn do_esc(&mut self, c: u8) {
        self.state = State::Normal;

        // charset designation: 94-char sets via ( ) * +, 96-char via - . /
        let designator = if self.esc_mod == 0xFF {
            self.esc_mod0
        } else {
            self.esc_mod
        };
        if designator != 0 {
            let (slot94, slot96) = (
                b"()*+".iter().position(|&d| d == designator),
                b"-./".iter().position(|&d| d == designator),
            );
            if let Some(gi) = slot94.or(slot96.map(|i| i + 1)) {
                let want_96 = slot96.is_some();
                let nrc_code = ((self.esc_mod1 as u16) << 8) | c as u16;
                if let Some(cs) =
                    charset::lookup_cset(nrc_code, want_96, self.modes.decnrc_enabled)
                {
                    self.cursor.csets[gi] = cs;
                    self.last_char = None;
                    return;
                }
            }
        }

        let key = ((self.esc_mod as u16) << 8) | c as u16;
        match key {
            k if k == b'[' as u16 => {
                self.state = State::CsiArgs;
                self.csi_argc = 1;
                self.csi_argv = [0; CSI_ARGS_MAX];
                self.csi_defined = [false; CSI_ARGS_MAX];
                self.esc_mod = 0;
                return; // keep preceding char for REP
            }
            k if k == b']' as u16 => self.state = State::OscStart,
            k if k == b'P' as u16 => self.state = State::DcsStart,
            k if k == b'^' as u16 || k == b'_' as u16 || k == b'X' as u16 => {
                self.state = State::IgnoreString;
            }
            k if k == b'7' as u16 => self.save_cursor(),
            k if k == b'8' as u16 => self.restore_cursor(),
            k if k == b'=' as u16 => self.modes.app_keypad = true,
            k if k == b'>' as u16 => self.modes.app_keypad = false,
            k if k == b'D' as u16 => self.write_linefeed(),
            k if k == b'E' as u16 => {
                if self.cursor.col >= self.marg_left && self.cursor.col <= self.marg_right {
                    self.write_return();
                    self.write_linefeed();
                }
            }
            k if k == b'M' as u16 => {
                // RI: reverse index
                if self.cursor.row == self.marg_top {
                    self.do_scroll(self.marg_top, self.marg_bot, -1, true);
                } else if self.cursor.row > 0 {
                    self.cursor.row -= 1;
                }
                self.cursor.wrapnext = false;
            }
            k if k == b'Z' as u16 => self.write_primary_da(),
            k if k == b'c' as u16 => {
                // RIS
                let reset_132 = self.modes.reset_132;
                self.reset(true);
                if reset_132 {
                    self.event(TermEvent::Window(
                        super::event::WindowOp::SetCharSize {
                            rows: self.rows,
                            cols: 80,
                        },
                    ));
                }
            }
            k if k == b'H' as u16 => {
                self.tabs[self.cursor.col as usize] = true;
            }
            k if k == b'l' as u16 => {
                // HP Memory Lock
                if self.cursor.row < self.marg_bot {
                    self.marg_top = self.cursor.row;
                }
            }
            k if k == b'm' as u16 => self.marg_top = 0,
            k if k == b'n' as u16 => self.cursor.gl = 2,
            k if k == b'o' as u16 => self.cursor.gl = 3,
            k if k == b'~' as u16 => self.cursor.gr = 1,
            k if k == b'}' as u16 => self.cursor.gr = 2,
            k if k == b'|' as u16 => self.cursor.gr = 3,
            k if k == b'N' as u16 => self.cursor.cset_single = self.cursor.csets[2],
            k if k == b'O' as u16 => self.cursor.cset_single = self.cursor.csets[3],
            k if k == b'6' as u16 => {
                // DECBI
                if self.cursor.col == self.marg_left {
                    self.insdel_column(self.marg_left, false, 1);
                } else {
                    let (x, y) = (self.cursor.col as i32 - 1, self.cursor.row as i32);
                    self.move_to(x, y, 1);
                }
            }
            k if k == b'9' as u16 => {
                // DECFI
                if self.cursor.col == self.marg_right {
                    self.insdel_column(self.marg_left, true, 1);
                } else {
                    let (x, y) = (self.cursor.col as i32 + 1, self.cursor.row as i32);
                    self.move_to(x, y, 1);
                }
            }
            k if k == b'V' as u16 => {
                // SPA
                self.cursor.attr.flags |= AttrFlags::PROTECTED;
                self.iso_guarded_area = true;
            }
            k if k == b'W' as u16 => {
                // EPA
                self.cursor.attr.flags -= AttrFlags::PROTECTED;
                self.iso_guarded_area = true;
            }
            k if k == pair16(b'#', b'8') => self.decaln(),
            k if k == pair16(b'#', b'3') => self.set_line_size(RowFlags::TOP),
            k if k == pair16(b'#', b'4') => self.set_line_size(RowFlags::BOTTOM),
            k if k == pair16(b'#', b'5') => self.set_line_size(RowFlags::empty()),
            k if k == pair16(b'#', b'6') => self.set_line_size(RowFlags::WIDE),
            k if k == pair16(b'%', b'8') || k == pair16(b'%', b'G') => {
                self.cursor.utf = true;
            }
            k if k == pair16(b'%', b'@') => self.cursor.utf = false,
            _ => {}
        }
        self.last_char = None;
    }

    fn set_line_size(&mut self, size: RowFlags) {
        if self.modes.lrmargmode && size != RowFlags::empty() {
            return;
        }
        let y = self.cursor.row;
        let row = self.agrid_mut().row_mut(y);
        row.flags -= RowFlags::SIZE_MASK;
        row.flags |= size;
    }

    fn decaln(&mut self) {
        self.cursor.origin = false;
        self.cursor.wrapnext = false;
        self.marg_top = 0;
        self.marg_bot = self.rows - 1;
        self.marg_left = 0;
        self.marg_right = self.cols - 1;
        self.move_to(0, 0, 0);
        let rows = self.rows;
        let grid = self.agrid_mut();
        for y in 0..rows {
            let row = grid.row_mut(y);
            row.clear();
            for cell in row.cells.iter_mut() {
                *cell = Cell::new('E', Attr::default());
            }
        }
        self.disptop = 0;
    }

    // ---- VT52 ---------------------------------------------------------------

    fn do_vt52(&mut self, c: u8) {
        self.state = State::Normal;
        self.modes.autowrap = false;
        self.modes.rev_wrap = false;
        self.esc_mod = 0;
        match c {
            0x1B => self.state = State::Escape,
            b'<' => self.vt52_mode = 0,
            b'=' => self.modes.app_keypad = true,
            b'>' => self.modes.app_keypad = false,
            b'A' => {
                let (x, y) = (self.cursor.col as i32, self.cursor.row as i32 - 1);
                self.move_to(x, y, 0);
            }
            b'B' => {
                let (x, y) = (self.cursor.col as i32, self.cursor.row as i32 + 1);
                self.move_to(x, y, 0);
            }
            b'C' => {
                let (x, y) = (self.cursor.col as i32 + 1, self.cursor.row as i32);
                self.move_to(x, y, 0);
            }
            b'D' => {
                let (x, y) = (self.cursor.col as i32 - 1, self.cursor.row as i32);
                self.move_to(x, y, 0);
            }
            b'F' => self.vt52_mode = 2,
            b'G' => self.vt52_mode = 1,
            b'H' => self.move_to(0, 0, 0),
            b'I' => {
                // reverse line feed
                if self.cursor.row == self.marg_top {
                    self.do_scroll(self.marg_top, self.marg_bot, -1, true);
                } else if self.cursor.row > 0 {
                    self.cursor.row -= 1;
                }
                self.cursor.wrapnext = false;
            }
            b'J' => self.erase(false, false, false, true),
            b'K' => self.erase(false, true, false, true),
            b'Y' => self.state = State::Vt52Y,
            b'Z' => self.respond(b"\x1b/Z".to_vec()),
            // Atari ST extensions
            b'E' => {
                self.move_to(0, 0, 0);
                self.erase(false, false, false, true);
            }
            b'b' => self.state = State::Vt52Fg,
            b'c' => self.state = State::Vt52Bg,
            b'd' => self.erase(false, false, true, false),
            b'e' => self.modes.cursor_on = true,
            b'f' => self.modes.cursor_on = false,
            b'j' => self.save_cursor(),
            b'k' => self.restore_cursor(),
            b'l' => {
                self.erase(false, true, true, true);
                self.write_return();
            }
            b'o' => self.erase(false, true, true, false),
            b'p' => self.cursor.attr.flags |= AttrFlags::REVERSE,
            b'q' => self.cursor.attr.flags -= AttrFlags::REVERSE,
            b'v' => {
                self.modes.autowrap = true;
                self.cursor.wrapnext = false;
            }
            b'w' => {
                self.modes.autowrap = false;
                self.cursor.wrapnext = false;
            }
            _ => {}
        }
    }

    fn do_vt52_move(&mut self) {
        self.state = State::Normal;
        let y = self.cmd_buf.first().copied().unwrap_or(0);
        let x = self.cmd_buf.get(1).copied().unwrap_or(0);
        if y < b' ' || x < b' ' {
            return;
        }
        self.move_to((x - b' ') as i32, (y - b' ') as i32, 0);
    }

    fn do_vt52_colour(&mut self, fg: bool, c: u8) {
        self.state = State::Normal;
        let idx = Color::Indexed(c & 0xF);
        if fg {
            self.cursor.attr.fg = idx;
        } else {
            self.cursor.attr.bg = idx;
        }
    }

    // ---- Tek submode glue ---------------------------------------------------

    fn tek_address_byte(&mut self, c: u8) {
        if c == 0x07 && self.tek.mode == TekMode::Graph0 && self.state == State::TekAddress0 {
            self.tek.mode = TekMode::Graph;
        } else if c < b' ' {
            self.tek_ctrl(c);
        } else if self.tek.mode == TekMode::SpecialPlot && self.state == State::TekAddress0 {
            self.state = State::TekAddress;
            self.cmd_buf.clear();
            self.tek.set_intensity(c & 0x40 != 0, c & 0x37);
        } else {
            if self.state == State::TekAddress0 {
                self.state = State::TekAddress;
                self.cmd_buf.clear();
            }
            self.cmd_buf.push(c);
            if c & 0x60 == 0x40 {
                let code = std::mem::take(&mut self.cmd_buf);
                self.tek.address(&code);
                self.event(TermEvent::TekUpdated);
                self.state = State::TekAddress0;
                if self.tek.mode == TekMode::Graph0 {
                    self.tek.mode = TekMode::Graph;
                }
            }
        }
    }

    /// Tek-mode control character handling (runs in place of do_ctrl
    /// while the submode is active).
    fn tek_ctrl(&mut self, c: u8) {
        if self.state == State::TekAddress0 || self.state == State::TekAddress {
            self.tek_prev_state = Some(self.state);
        }
        match c {
            0x1B => {
                self.tek_prev_state = Some(self.state);
                self.state = State::TekEscape;
            }
            0x07 => {
                self.event(TermEvent::Bell);
                self.tek.bypass = false;
                self.tek.gin_fin();
            }
            0x08 | 0x09 | 0x0B => {
                if self.tek.mode == TekMode::Alpha {
                    self.tek.write(c as char, -2);
                    self.event(TermEvent::TekUpdated);
                }
            }
            0x0A => {
                self.tek.bypass = false;
                self.tek.write('\n', -2);
                self.tek.gin_fin();
                self.event(TermEvent::TekUpdated);
            }
            0x0D => {
                self.tek.mode = TekMode::Alpha;
                self.state = State::Normal;
                self.tek.bypass = false;
                self.tek.write('\r', -2);
                self.event(TermEvent::TekUpdated);
            }
            0x0F => self.tek.gin_fin(),
            0x1C => {
                self.tek.mode = TekMode::PointPlot;
                self.state = State::TekAddress0;
            }
            0x1D => {
                self.tek.mode = TekMode::Graph0;
                self.state = State::TekAddress0;
            }
            0x1E => {
                self.tek.mode = TekMode::IncrementalPlot;
                self.state = State::TekIncremental;
            }
            0x1F => {
                self.tek.mode = TekMode::Alpha;
                self.state = State::Normal;
                self.tek.bypass = false;
            }
            _ => {}
        }
    }

    /// Tek-mode ESC dispatch.
    fn tek_esc(&mut self, c: u8) {
        self.state = self.tek_prev_state.take().unwrap_or(State::Normal);
        match c {
            0x1B | 0x0A | 0x00 | 0x0D => self.state = State::TekEscape,
            0x07 => self.event(TermEvent::Bell),
            0x08 | 0x09 | 0x0B => {
                self.tek.write(c as char, -2);
                self.event(TermEvent::TekUpdated);
            }
            0x0C => {
                // FF: alpha mode, clear screen
                self.tek.mode = TekMode::Alpha;
                self.state = State::Normal;
                self.tek.bypass = false;
                self.tek.clear();
                self.event(TermEvent::TekUpdated);
            }
            0x05 => {
                // ENQ: status and address
                self.tek.bypass = true;
                let reply = self.tek.enq();
                self.respond(reply);
            }
            0x0E => self.tek.set_apl(true),
            0x0F => self.tek.set_apl(false),
            0x17 => {
                // ETB: copy screen
                self.event(TermEvent::TekCopy);
                self.tek.bypass = false;
                self.tek.gin_fin();
            }
            0x18 => self.tek.bypass = true,
            0x1A => {
                // SUB: GIN mode
                self.tek.gin();
                self.state = State::Normal;
                self.tek.bypass = true;
                self.event(TermEvent::TekUpdated);
            }
            0x1C => {
                self.tek.mode = TekMode::SpecialPlot;
                self.state = State::TekAddress0;
            }
            0x1D => {
                self.tek.mode = TekMode::Graph0;
                self.state = State::TekAddress0;
            }
            0x1E => {
                self.tek.mode = TekMode::IncrementalPlot;
                self.state = State::TekIncremental;
            }
            0x1F => {
                self.tek.mode = TekMode::Alpha;
                self.state = State::Normal;
            }
            b'`'..=b'g' => self.tek.beam(false, false, c & 7),
            b'h'..=b'o' => self.tek.beam(true, false, c & 7),
            b'p'..=b'w' => self.tek.beam(false, true, c & 7),
            b'8'..=b';' => self.tek.set_font(c - b'8'),
            0x03 => {
                // ETX: leave Tek mode
                self.tek.leave();
                self.state = State::Normal;
                self.event(TermEvent::TekModeChanged { active: false });
                self.event(TermEvent::InvalidateAll);
            }
            b']' => self.state = State::OscStart,
            _ => {}
        }
    }

    // ---- printer ------------------------------------------------------------

    pub(crate) fn print_finish(&mut self) {
        if self.printing {
            let data = std::mem::take(&mut self.printbuf);
            self.event(TermEvent::Print { data });
            self.printing = false;
            self.only_printing = false;
        }
    }

    fn linux_palette(&mut self) {
        // OSC P nrrggbb: the dodgy Linux palette sequence
        let s = String::from_utf8_lossy(&self.cmd_buf).to_string();
        if s.len() == 7 {
            let n = u8::from_str_radix(&s[0..1], 16).unwrap_or(0);
            let r = u8::from_str_radix(&s[1..3], 16).unwrap_or(0);
            let g = u8::from_str_radix(&s[3..5], 16).unwrap_or(0);
            let b = u8::from_str_radix(&s[5..7], 16).unwrap_or(0);
            self.palette
                .set_indexed(n, super::color::Rgb::new(r, g, b));
            self.event(TermEvent::PaletteChanged);
        }
        self.cmd_buf.clear();
    }

    /// Consistency checks over the screen model; used by tests after
    /// each scenario.
    pub fn check_invariants(&self) {
        assert!(self.cursor.row < self.rows);
        assert!(self.cursor.col <= self.cols);
        if self.cursor.col == self.cols {
            assert!(self.cursor.wrapnext, "x == cols requires wrapnext");
        }
        assert!(self.marg_top <= self.marg_bot && self.marg_bot < self.rows);
        assert!(self.marg_left <= self.marg_right && self.marg_right < self.cols);
        assert!(self.scrollback.len() <= self.cfg.scrollback_lines);
        let grid = self.agrid();
        for (y, row) in grid.lines.iter().enumerate() {
            for x in 0..grid.cols as usize {
                if row.cells[x].ch == UCSWIDE {
                    assert!(x > 0, "UCSWIDE in column 0 at row {y}");
                    assert_ne!(
                        row.cells[x - 1].ch,
                        UCSWIDE,
                        "two UCSWIDE halves in a row at {y}:{x}"
                    );
                }
            }
            if row.flags.contains(RowFlags::WRAPPED) && y + 1 < grid.lines.len() {
                assert!(
                    grid.lines[y + 1].flags.contains(RowFlags::WRAPCONTD),
                    "WRAPPED row {y} not followed by WRAPCONTD"
                );
            }
        }
    }
}

enum Utf8Step {
    Incomplete,
    Char(char),
    Error,
    /// Malformed sequence: report the error, then re-process the byte.
    ErrorRetry,
}

const fn pair16(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) | b as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::cell::Underline;
    use crate::terminal::mouse::{ModKeys, MouseButton, Pos};

    fn term() -> TerminalState {
        TerminalState::new(Config::default())
    }

    fn term_sized(rows: u16, cols: u16) -> TerminalState {
        let cfg = Config {
            rows,
            cols,
            ..Config::default()
        };
        TerminalState::new(cfg)
    }

    fn feed(state: &mut TerminalState, bytes: &[u8]) {
        state.write(bytes);
    }

    fn row_text(state: &TerminalState, y: u16) -> String {
        state.agrid().row(y).text()
    }

    fn responses(state: &mut TerminalState) -> Vec<Vec<u8>> {
        state.take_pending_responses()
    }

    #[test]
    fn backspace_and_overwrite() {
        // "AB\b\bCD" on an empty screen leaves row 1 = "CD", cursor (1,3)
        let mut t = term();
        feed(&mut t, b"AB\x08\x08CD");
        assert!(row_text(&t, 0).starts_with("CD"));
        assert_eq!((t.cursor.row, t.cursor.col), (0, 2));
        t.check_invariants();
    }

    #[test]
    fn autowrap_off_pins_last_column() {
        let mut t = term();
        feed(&mut t, b"\x1b[?7l");
        feed(&mut t, &vec![b'X'; 82]);
        let text = row_text(&t, 0);
        assert_eq!(text.trim_end().len(), 80);
        assert!(text.chars().all(|c| c == 'X'));
        // cursor parked on the last column, no wrap flag
        assert_eq!((t.cursor.row, t.cursor.col), (0, 79));
        assert!(!t.cursor.wrapnext);
        assert!(!t.agrid().row(0).flags.contains(RowFlags::WRAPPED));
        t.check_invariants();
    }

    #[test]
    fn ech_blanks_without_motion() {
        let mut t = term();
        feed(&mut t, b"\x1b[2;1Habcdefgh");
        feed(&mut t, b"\x1b[2;3H\x1b[4X");
        assert!(row_text(&t, 1).starts_with("ab    gh"));
        assert_eq!((t.cursor.row, t.cursor.col), (1, 2));
        t.check_invariants();
    }

    #[test]
    fn synchronized_update_defers_damage() {
        let mut t = term();
        let _ = t.take_damage(); // drop the initial full-dirty state
        feed(&mut t, b"\x1b[?2026h");
        feed(&mut t, b"lots of output\r\nmore output");
        assert!(t.take_damage().is_none(), "no paints inside the window");
        feed(&mut t, b"\x1b[?2026l");
        let damage = t.take_damage().expect("flush after end marker");
        assert!(damage.rows.contains(&0));
        assert!(damage.rows.contains(&1));
    }

    #[test]
    fn synchronized_update_via_dcs_markers() {
        let mut t = term();
        let _ = t.take_damage();
        feed(&mut t, b"\x1bP=1s\x1b\\hidden");
        assert!(t.suspend_update_until().is_some());
        assert!(t.take_damage().is_none());
        feed(&mut t, b"\x1bP=2s\x1b\\");
        assert!(t.suspend_update_until().is_none());
        assert!(t.take_damage().is_some());
    }

    #[test]
    fn decrqcra_checksum_reply() {
        let mut t = term();
        feed(&mut t, b"AB");
        feed(&mut t, b"\x1b[1;1;1;1;1;2*y");
        let rsp = responses(&mut t);
        assert_eq!(rsp.len(), 1);
        // 0x41 + 0x42 = 0x83; two's complement low 16 bits = 0xFF7D
        assert_eq!(rsp[0], b"\x1bP1!~FF7D\x1b\\".to_vec());
    }

    #[test]
    fn minimal_sixel_places_red_image() {
        let mut t = term();
        feed(&mut t, b"\x1bPq#0;2;100;0;0#0~~\x1b\\");
        assert_eq!(t.images.len(), 1);
        let img = t.images.get(1).expect("image placed");
        assert!(img.pixelwidth >= 1 && img.pixelheight >= 6);
        let pixels = img.pixels.as_ref().unwrap();
        for y in 0..6 {
            let off = (y * img.pixelwidth as usize) * 4;
            assert_eq!(&pixels[off..off + 3], &[255, 0, 0], "pixel row {y}");
        }
        // sixel scrolling advanced the cursor below the image
        assert_eq!(t.cursor.row, 1);
        // covered cells carry the sentinel and the image reference
        let cell = &t.grid.row(0).cells[0];
        assert_eq!(cell.ch, SIXEL_SENTINEL);
        assert_eq!(cell.attr.imgi, Some(1));
        t.check_invariants();
    }

    const SIXEL_SENTINEL: char = super::super::cell::SIXELCH;

    #[test]
    fn wide_char_at_margin_wraps_with_filler() {
        let mut t = term();
        feed(&mut t, b"\x1b[1;80H");
        feed(&mut t, "宽".as_bytes());
        let row0 = t.grid.row(0);
        assert!(row0
            .flags
            .contains(RowFlags::WRAPPED | RowFlags::WRAPPED2));
        assert_eq!(row0.cells[79].ch, ' ');
        let row1 = t.grid.row(1);
        assert_eq!(row1.cells[0].ch, '宽');
        assert_eq!(row1.cells[1].ch, UCSWIDE);
        assert!(row1.flags.contains(RowFlags::WRAPCONTD));
        t.check_invariants();
    }

    #[test]
    fn reverse_wrap_backspace_wraps_to_bottom_margin() {
        let mut t = term();
        feed(&mut t, b"\x1b[5;20r\x1b[?45h");
        feed(&mut t, b"\x1b[5;1H");
        assert_eq!((t.cursor.row, t.cursor.col), (4, 0));
        feed(&mut t, b"\x08");
        assert_eq!((t.cursor.row, t.cursor.col), (19, 79));
        // without reverse wrap the cursor stays put
        feed(&mut t, b"\x1b[?45l\x1b[5;1H\x08");
        assert_eq!((t.cursor.row, t.cursor.col), (4, 0));
        t.check_invariants();
    }

    #[test]
    fn decsc_decrc_pair_is_noop() {
        let mut t = term();
        feed(&mut t, b"\x1b[5;10H\x1b[1;31m");
        let before = (t.cursor.clone(), t.marg_top, t.marg_bot);
        feed(&mut t, b"\x1b7\x1b8");
        assert_eq!(t.cursor.row, before.0.row);
        assert_eq!(t.cursor.col, before.0.col);
        assert_eq!(t.cursor.attr, before.0.attr);
        assert_eq!(t.cursor.wrapnext, before.0.wrapnext);
    }

    #[test]
    fn color_stack_push_pop_is_noop() {
        let mut t = term();
        let before = t.palette.indexed(3);
        feed(&mut t, b"\x1b[#P\x1b[#Q");
        assert_eq!(t.palette.indexed(3), before);
    }

    #[test]
    fn decfra_fills_whole_region() {
        let mut t = term_sized(6, 10);
        feed(&mut t, b"\x1b[65;1;1;6;10$x");
        for y in 0..6 {
            assert_eq!(row_text(&t, y), "AAAAAAAAAA");
        }
        t.check_invariants();
    }

    #[test]
    fn cursor_save_restore_through_1049() {
        let mut t = term();
        feed(&mut t, b"MainText");
        feed(&mut t, b"\x1b[?1049h");
        assert!(t.on_alt_screen);
        feed(&mut t, b"AltStuff");
        feed(&mut t, b"\x1b[?1049l");
        assert!(!t.on_alt_screen);
        assert!(row_text(&t, 0).starts_with("MainText"));
        assert_eq!(t.cursor.col, 8);
    }

    #[test]
    fn origin_mode_offsets_cup() {
        let mut t = term();
        feed(&mut t, b"\x1b[6;21r");
        assert_eq!((t.marg_top, t.marg_bot), (5, 20));
        feed(&mut t, b"\x1b[?6h");
        assert!(t.cursor.origin);
        assert_eq!(t.cursor.row, 5);
        feed(&mut t, b"\x1b[3;1H");
        assert_eq!(t.cursor.row, 7);
        feed(&mut t, b"\x1b[?6l\x1b[3;1H");
        assert_eq!(t.cursor.row, 2);
    }

    #[test]
    fn scroll_region_contains_linefeed() {
        let mut t = term_sized(10, 20);
        for i in 0..10u8 {
            feed(
                &mut t,
                format!("\x1b[{};1H{}", i + 1, (b'A' + i) as char).as_bytes(),
            );
        }
        feed(&mut t, b"\x1b[3;6r\x1b[6;1H\n");
        assert_eq!(row_text(&t, 0).chars().next(), Some('A'));
        assert_eq!(row_text(&t, 6).chars().next(), Some('G'));
        // first row of the region scrolled away
        assert_eq!(row_text(&t, 2).chars().next(), Some('D'));
        t.check_invariants();
    }

    #[test]
    fn rep_repeats_last_char_with_its_attributes() {
        let mut t = term();
        feed(&mut t, b"\x1b[31mA\x1b[3b");
        assert!(row_text(&t, 0).starts_with("AAAA"));
        // the repeats carry the attribute A was printed with
        assert_eq!(t.grid.row(0).cells[3].attr.fg, Color::Indexed(1));
        // any other CSI cancels the REP memory
        feed(&mut t, b"\x1b[1;1H\x1b[3b");
        assert!(row_text(&t, 0).starts_with("AAAA"));
        assert_eq!(t.cursor.col, 0);
    }

    #[test]
    fn rep_handles_wide_chars() {
        let mut t = term();
        feed(&mut t, "宽".as_bytes());
        feed(&mut t, b"\x1b[2b");
        let row = t.grid.row(0);
        assert_eq!(row.cells[0].ch, '宽');
        assert_eq!(row.cells[2].ch, '宽');
        assert_eq!(row.cells[4].ch, '宽');
        assert_eq!(row.cells[5].ch, UCSWIDE);
        t.check_invariants();
    }

    #[test]
    fn decrqm_reports_mode_states() {
        let mut t = term();
        feed(&mut t, b"\x1b[?1004h\x1b[?1004$p");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1b[?1004;1$y".to_vec())
        );
        feed(&mut t, b"\x1b[?9999$p");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1b[?9999;0$y".to_vec())
        );
        feed(&mut t, b"\x1b[4$p");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1b[4;2$y".to_vec()));
        feed(&mut t, b"\x1b[?1048$p");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1b[?1048;4$y".to_vec())
        );
    }

    #[test]
    fn device_attribute_reports() {
        let mut t = term();
        feed(&mut t, b"\x1b[c");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1b[?64;1;2;4;6;9;15;21;22;28;29c".to_vec())
        );
        feed(&mut t, b"\x1b[>c");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1b[>0;10;0c".to_vec()));
        feed(&mut t, b"\x1b[=c");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1bP!|00000000\x1b\\".to_vec())
        );
        // vt level selects the primary DA variant
        let mut t = TerminalState::new(Config {
            term: "vt100".into(),
            ..Config::default()
        });
        feed(&mut t, b"\x1b[c");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1b[?1;2c".to_vec()));
    }

    #[test]
    fn cursor_position_report_honors_origin() {
        let mut t = term();
        feed(&mut t, b"\x1b[6;21r\x1b[?6h\x1b[3;4H\x1b[6n");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1b[3;4R".to_vec()));
        feed(&mut t, b"\x1b[?6n");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1b[?3;4R".to_vec()));
    }

    #[test]
    fn dec_line_drawing_charset() {
        let mut t = term();
        feed(&mut t, b"\x1b(0qx\x1b(Bq");
        let row = t.grid.row(0);
        assert_eq!(row.cells[0].ch, '─');
        assert_eq!(row.cells[1].ch, '│');
        assert_eq!(row.cells[2].ch, 'q');
        // the self-drawn glyph code rides along
        assert_ne!(row.cells[0].attr.graph, 0);
    }

    #[test]
    fn nrcs_german_needs_enabling() {
        let mut t = term();
        feed(&mut t, b"\x1b(K[");
        assert_eq!(t.grid.row(0).cells[0].ch, '[');
        feed(&mut t, b"\x1b[?42h\x1b(K[");
        assert_eq!(t.grid.row(0).cells[1].ch, 'Ä');
    }

    #[test]
    fn single_shift_applies_once() {
        let mut t = term();
        // designate line drawing into G2, single-shift it for one char
        feed(&mut t, b"\x1b*0\x1bNqq");
        let row = t.grid.row(0);
        assert_eq!(row.cells[0].ch, '─');
        assert_eq!(row.cells[1].ch, 'q');
    }

    #[test]
    fn utf8_decode_and_replacement() {
        let mut t = term();
        feed(&mut t, "héllo".as_bytes());
        assert!(row_text(&t, 0).starts_with("héllo"));
        // truncated lead byte: replacement char, then resync on 'A'
        let mut t = term();
        feed(&mut t, &[0xC3, 0x41]);
        let text = row_text(&t, 0);
        assert!(text.starts_with("\u{FFFD}A"), "{text:?}");
    }

    #[test]
    fn combining_chars_chain_to_base_cell() {
        let mut t = term();
        feed(&mut t, "e\u{0301}\u{0308}".as_bytes());
        let row = t.grid.row(0);
        assert_eq!(row.cells[0].ch, 'e');
        let chain = row.combining(0);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].0, '\u{0301}');
        assert_eq!(t.cursor.col, 1);
        t.check_invariants();
    }

    #[test]
    fn wide_chars_pair_with_spacer() {
        let mut t = term();
        feed(&mut t, "宽W".as_bytes());
        let row = t.grid.row(0);
        assert_eq!(row.cells[0].ch, '宽');
        assert_eq!(row.cells[1].ch, UCSWIDE);
        assert_eq!(row.cells[2].ch, 'W');
        // overwriting one half splits the pair
        feed(&mut t, b"\x1b[1;2HX");
        let row = t.grid.row(0);
        assert_eq!(row.cells[0].ch, ' ');
        assert_eq!(row.cells[1].ch, 'X');
        t.check_invariants();
    }

    #[test]
    fn scrollback_accumulates_and_clears() {
        let mut t = term_sized(5, 20);
        for i in 0..8 {
            feed(&mut t, format!("line{i}\r\n").as_bytes());
        }
        assert!(t.scrollback.len() >= 3);
        let first = t.scrollback.get(0).unwrap().unpack(20);
        assert!(first.text().starts_with("line0"));
        feed(&mut t, b"\x1b[3J");
        assert_eq!(t.scrollback.len(), 0);
        t.check_invariants();
    }

    #[test]
    fn alt_screen_has_no_scrollback() {
        let mut t = term_sized(5, 20);
        feed(&mut t, b"\x1b[?1049h");
        for i in 0..8 {
            feed(&mut t, format!("alt{i}\r\n").as_bytes());
        }
        assert_eq!(t.scrollback.len(), 0);
        feed(&mut t, b"\x1b[?1049l");
        t.check_invariants();
    }

    #[test]
    fn insert_delete_chars_and_lines() {
        let mut t = term_sized(5, 10);
        feed(&mut t, b"abcdef\x1b[1;1H\x1b[2@");
        assert!(row_text(&t, 0).starts_with("  abcdef"));
        feed(&mut t, b"\x1b[2P");
        assert!(row_text(&t, 0).starts_with("abcdef"));
        feed(&mut t, b"\x1b[2;1Hsecond\x1b[1;1H\x1b[1L");
        assert!(row_text(&t, 0).trim_end().is_empty());
        assert!(row_text(&t, 1).starts_with("abcdef"));
        feed(&mut t, b"\x1b[1M");
        assert!(row_text(&t, 0).starts_with("abcdef"));
        t.check_invariants();
    }

    #[test]
    fn insert_mode_shifts_existing_text() {
        let mut t = term();
        feed(&mut t, b"world\x1b[1;1H\x1b[4h");
        feed(&mut t, b"hello ");
        assert!(row_text(&t, 0).starts_with("hello world"));
        feed(&mut t, b"\x1b[4l");
    }

    #[test]
    fn decic_decdc_columns() {
        let mut t = term_sized(3, 10);
        feed(&mut t, b"abcde\r\nfghij\x1b[1;2H");
        feed(&mut t, b"\x1b['}");
        assert!(row_text(&t, 0).starts_with("a bcde"));
        assert!(row_text(&t, 1).starts_with("f ghij"));
        feed(&mut t, b"\x1b['~");
        assert!(row_text(&t, 0).starts_with("abcde"));
        assert!(row_text(&t, 1).starts_with("fghij"));
        t.check_invariants();
    }

    #[test]
    fn deccra_copies_rectangles() {
        let mut t = term_sized(5, 10);
        feed(&mut t, b"AB\r\nCD");
        // copy rows 1-2, cols 1-2 to row 1, col 5
        feed(&mut t, b"\x1b[1;1;2;2;1;1;5$v");
        assert!(row_text(&t, 0).starts_with("AB  AB"));
        assert!(row_text(&t, 1).starts_with("CD  CD"));
        t.check_invariants();
    }

    #[test]
    fn deccara_sets_attributes_in_rect() {
        let mut t = term_sized(3, 10);
        feed(&mut t, b"abc\r\ndef");
        feed(&mut t, b"\x1b[2*x"); // DECSACE rectangle extent
        feed(&mut t, b"\x1b[1;1;2;2;1$r");
        assert!(t.grid.row(0).cells[0]
            .attr
            .flags
            .contains(AttrFlags::BOLD));
        assert!(t.grid.row(1).cells[1]
            .attr
            .flags
            .contains(AttrFlags::BOLD));
        assert!(!t.grid.row(0).cells[2]
            .attr
            .flags
            .contains(AttrFlags::BOLD));
        // DECRARA reverses it away again
        feed(&mut t, b"\x1b[1;1;2;2;1$t");
        assert!(!t.grid.row(0).cells[0]
            .attr
            .flags
            .contains(AttrFlags::BOLD));
    }

    #[test]
    fn selective_erase_preserves_protected_cells() {
        let mut t = term();
        feed(&mut t, b"AB\x1b[1\"qCD\x1b[0\"qEF");
        // DECSED erases unprotected cells only
        feed(&mut t, b"\x1b[1;1H\x1b[?2J");
        let text = row_text(&t, 0);
        assert!(text.starts_with("  CD  "), "{text:?}");
        t.check_invariants();
    }

    #[test]
    fn decsera_respects_protection() {
        let mut t = term_sized(3, 10);
        feed(&mut t, b"ab\x1b[1\"qXY\x1b[0\"qcd");
        feed(&mut t, b"\x1b[1;1;3;10${");
        let text = row_text(&t, 0);
        assert!(text.starts_with("  XY  "), "{text:?}");
    }

    #[test]
    fn sgr_attributes_round_trip_through_decrqss() {
        let mut t = term();
        feed(&mut t, b"\x1b[1;4:3;38;5;196;48;2;10;20;30m");
        feed(&mut t, b"\x1bP$qm\x1b\\");
        let rsp = responses(&mut t);
        let reply = String::from_utf8(rsp.last().unwrap().clone()).unwrap();
        let pt = reply
            .strip_prefix("\x1bP1$r")
            .and_then(|r| r.strip_suffix("\x1b\\"))
            .unwrap();
        // feed the reported SGR back into a fresh terminal
        let mut t2 = term();
        feed(&mut t2, format!("\x1b[{pt}").as_bytes());
        assert_eq!(t2.cursor.attr, t.cursor.attr);
        assert_eq!(t2.cursor.attr.underline, Underline::Curly);
        assert_eq!(t2.cursor.attr.fg, Color::Indexed(196));
        assert_eq!(t2.cursor.attr.bg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn decrqss_reports_margins_and_rejects_unknown() {
        let mut t = term();
        feed(&mut t, b"\x1b[5;20r");
        feed(&mut t, b"\x1bP$qr\x1b\\");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1bP1$r5;20r\x1b\\".to_vec())
        );
        feed(&mut t, b"\x1bP$qz\x1b\\");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1bP0$rz\x1b\\".to_vec())
        );
    }

    #[test]
    fn sgr_cmyk_colors_convert() {
        let mut t = term();
        // CMY with scale 100: pure cyan-ish foreground
        feed(&mut t, b"\x1b[38:3:100:100:0:0m");
        assert_eq!(t.cursor.attr.fg, Color::Rgb(0, 255, 255));
    }

    #[test]
    fn sgr_underline_color() {
        let mut t = term();
        feed(&mut t, b"\x1b[58:2::17:34:51m");
        assert_eq!(
            t.cursor.attr.ulcolr,
            Some(super::super::color::Rgb::new(17, 34, 51))
        );
        feed(&mut t, b"\x1b[59m");
        assert_eq!(t.cursor.attr.ulcolr, None);
    }

    #[test]
    fn xtpushsgr_restores_masked_attributes() {
        let mut t = term();
        feed(&mut t, b"\x1b[1;31m");
        feed(&mut t, b"\x1b[#{"); // push all
        feed(&mut t, b"\x1b[0;32m");
        feed(&mut t, b"\x1b[#}"); // pop
        assert!(t.cursor.attr.flags.contains(AttrFlags::BOLD));
        assert_eq!(t.cursor.attr.fg, Color::Indexed(1));
    }

    #[test]
    fn osc_title_and_stack_ops() {
        let mut t = term();
        feed(&mut t, b"\x1b]2;first\x07");
        assert_eq!(t.title, "first");
        feed(&mut t, b"\x1b[22t\x1b]2;second\x07\x1b[23t");
        assert_eq!(t.title, "first");
    }

    #[test]
    fn osc_palette_set_query_reset() {
        let mut t = term();
        feed(&mut t, b"\x1b]4;1;#102030\x07");
        assert_eq!(
            t.palette.indexed(1),
            super::super::color::Rgb::new(0x10, 0x20, 0x30)
        );
        feed(&mut t, b"\x1b]4;1;?\x07");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1b]4;1;rgb:1010/2020/3030\x07".to_vec())
        );
        feed(&mut t, b"\x1b]104;1\x07");
        assert_eq!(
            t.palette.indexed(1),
            super::super::color::indexed_to_rgb(1)
        );
    }

    #[test]
    fn osc_dynamic_colors_auto_increment() {
        let mut t = term();
        feed(&mut t, b"\x1b]10;#ff0000;#00ff00\x07");
        assert_eq!(
            t.palette.dynamic(super::super::color::DynColor::Foreground),
            super::super::color::Rgb::new(255, 0, 0)
        );
        assert_eq!(
            t.palette.dynamic(super::super::color::DynColor::Background),
            super::super::color::Rgb::new(0, 255, 0)
        );
        // explicit retarget: 10;red;12;blue sets fg and cursor
        feed(&mut t, b"\x1b]10;#111111;12;#0000ff\x07");
        assert_eq!(
            t.palette.dynamic(super::super::color::DynColor::Cursor),
            super::super::color::Rgb::new(0, 0, 255)
        );
    }

    #[test]
    fn osc_hyperlinks_attach_to_cells() {
        let mut t = term();
        feed(&mut t, b"\x1b]8;;https://example.net\x1b\\link\x1b]8;;\x1b\\x");
        let row = t.grid.row(0);
        let link = row.cells[0].attr.link.expect("link id");
        assert_eq!(t.link_target(link), Some("https://example.net"));
        assert_eq!(row.cells[4].attr.link, None);
    }

    #[test]
    fn osc_52_copies_clipboard_when_allowed() {
        let mut t = term();
        feed(&mut t, b"\x1b]52;c;aGVsbG8=\x07");
        assert!(t.take_events().iter().all(|e| !matches!(
            e,
            TermEvent::CopyText { .. }
        )));
        t.cfg.allow_set_selection = true;
        feed(&mut t, b"\x1b]52;c;aGVsbG8=\x07");
        assert!(t
            .take_events()
            .iter()
            .any(|e| matches!(e, TermEvent::CopyText { text } if text == "hello")));
    }

    #[test]
    fn osc_1337_inline_image() {
        let mut t = term();
        feed(
            &mut t,
            b"\x1b]1337;File=name=eA==;width=2;height=1;inline=1:QUJD\x07",
        );
        assert_eq!(t.images.len(), 1);
        let img = t.images.get(1).unwrap();
        assert_eq!(img.width, 2);
        assert_eq!(img.height, 1);
        assert_eq!(img.pixels.as_deref(), Some(&b"ABC"[..]));
    }

    #[test]
    fn vt52_submode_moves_and_exits() {
        let mut t = term();
        feed(&mut t, b"\x1b[?2l");
        assert_eq!(t.vt52_mode, 1);
        // ESC Y row+32 col+32: move to row 3, col 5 (0-based 2,4)
        feed(&mut t, b"\x1bY\x22\x24");
        assert_eq!((t.cursor.row, t.cursor.col), (2, 4));
        feed(&mut t, b"\x1bZ");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1b/Z".to_vec()));
        feed(&mut t, b"\x1b<");
        assert_eq!(t.vt52_mode, 0);
    }

    #[test]
    fn tek_submode_collects_vectors() {
        let mut t = term();
        feed(&mut t, b"\x1b[?38h");
        assert!(t.tek.active());
        assert!(t
            .take_events()
            .iter()
            .any(|e| matches!(e, TermEvent::TekModeChanged { active: true })));
        // GS, then two 10-bit addresses: move + draw
        feed(&mut t, &[0x1D]);
        feed(&mut t, &[0x20, 0x60, 0x20, 0x40]);
        feed(&mut t, &[0x38, 0x6B, 0x3F, 0x5F]);
        let kinds: Vec<_> = t.tek.buffer().iter().map(|c| &c.kind).collect();
        assert!(matches!(kinds[0], crate::tek::TekKind::Move { .. }));
        assert!(matches!(kinds[1], crate::tek::TekKind::Vector { .. }));
        // alpha text goes into the buffer, not the grid
        feed(&mut t, &[0x1F]);
        feed(&mut t, b"HI");
        assert!(t
            .tek
            .buffer()
            .iter()
            .any(|c| matches!(c.kind, crate::tek::TekKind::Text { ch: 'H', .. })));
        assert_eq!(row_text(&t, 0).trim_end(), "");
        // ESC ETX leaves the submode
        feed(&mut t, &[0x1B, 0x03]);
        assert!(!t.tek.active());
    }

    #[test]
    fn tek_enq_reports_status() {
        let mut t = term();
        feed(&mut t, b"\x1b[?38h");
        feed(&mut t, &[0x1B, 0x05]);
        let rsp = responses(&mut t);
        let status = rsp.last().unwrap();
        assert_eq!(status[0] & 0x0C, 0x04, "alpha mode status bit");
        assert_eq!(status.len(), 5);
    }

    #[test]
    fn mouse_reporting_sgr_encoding() {
        let mut t = term();
        feed(&mut t, b"\x1b[?1000h\x1b[?1006h");
        let consumed = t.mouse_click(MouseButton::Left, ModKeys::empty(), Pos::new(4, 9), 1);
        assert!(consumed);
        t.mouse_release(MouseButton::Left, ModKeys::empty(), Pos::new(4, 9));
        let rsp = responses(&mut t);
        assert_eq!(rsp[0], b"\x1b[<0;10;5M".to_vec());
        assert_eq!(rsp[1], b"\x1b[<0;10;5m".to_vec());
    }

    #[test]
    fn mouse_legacy_encoding_offsets() {
        let mut t = term();
        feed(&mut t, b"\x1b[?1000h");
        t.mouse_click(MouseButton::Left, ModKeys::empty(), Pos::new(0, 0), 1);
        let rsp = responses(&mut t);
        assert_eq!(rsp[0], vec![0x1B, b'[', b'M', 0x20, 0x21, 0x21]);
    }

    #[test]
    fn shift_overrides_mouse_reporting_for_selection() {
        let mut t = term();
        feed(&mut t, b"hello world");
        feed(&mut t, b"\x1b[?1000h");
        let consumed = t.mouse_click(MouseButton::Left, ModKeys::SHIFT, Pos::new(0, 7), 2);
        assert!(!consumed);
        assert!(t.sel.selected);
    }

    #[test]
    fn word_selection_spreads_and_copies() {
        let mut t = term();
        feed(&mut t, b"hello world today");
        t.mouse_click(MouseButton::Left, ModKeys::empty(), Pos::new(0, 7), 2);
        assert!(t.sel.selected);
        assert_eq!(t.selection_text(), "world");
        t.mouse_release(MouseButton::Left, ModKeys::empty(), Pos::new(0, 7));
        assert!(t
            .take_events()
            .iter()
            .any(|e| matches!(e, TermEvent::CopyText { text } if text == "world")));
    }

    #[test]
    fn url_selection_spreads_through_scheme() {
        let mut t = term();
        feed(&mut t, b"see https://example.net/path?q=1 end");
        // double-click inside the host part
        t.mouse_click(MouseButton::Left, ModKeys::empty(), Pos::new(0, 14), 2);
        let text = t.selection_text();
        assert!(
            text.contains("https://example.net/path"),
            "selected {text:?}"
        );
    }

    #[test]
    fn line_selection_joins_wrapped_lines() {
        let mut t = term_sized(4, 10);
        feed(&mut t, b"0123456789abc");
        t.mouse_click(MouseButton::Left, ModKeys::empty(), Pos::new(0, 3), 3);
        let text = t.selection_text();
        assert_eq!(text, "0123456789abc");
    }

    #[test]
    fn locator_reports_on_request() {
        let mut t = term();
        feed(&mut t, b"\x1b['z"); // DECELR 0: disabled
        feed(&mut t, b"\x1b[1'z"); // enable
        t.mouse_move(ModKeys::empty(), Pos::new(3, 7));
        feed(&mut t, b"\x1b['|"); // DECRQLP
        let rsp = responses(&mut t);
        assert_eq!(rsp.last(), Some(&b"\x1b[1;0;4;8;0&w".to_vec()));
    }

    #[test]
    fn locator_filter_rectangle_fires_once() {
        let mut t = term();
        feed(&mut t, b"\x1b[1'z");
        t.mouse_move(ModKeys::empty(), Pos::new(2, 2));
        feed(&mut t, b"\x1b[2;2;4;4'w"); // arm rectangle rows 2-4 cols 2-4
        t.mouse_move(ModKeys::empty(), Pos::new(2, 2));
        assert!(responses(&mut t).is_empty(), "inside: no report");
        t.mouse_move(ModKeys::empty(), Pos::new(9, 9));
        let rsp = responses(&mut t);
        assert_eq!(rsp.len(), 1);
        assert!(rsp[0].starts_with(b"\x1b[10;"));
        assert!(!t.sel.locator_rectangle);
    }

    #[test]
    fn wheel_reports_or_scrolls() {
        let mut t = term();
        feed(&mut t, b"\x1b[?1000h\x1b[?1006h");
        let act = t.mouse_wheel(false, 120, 3, ModKeys::empty(), Pos::new(0, 0));
        assert_eq!(act, super::super::mouse::WheelAction::Handled);
        assert_eq!(responses(&mut t)[0], b"\x1b[<64;1;1M".to_vec());
        feed(&mut t, b"\x1b[?1000l");
        let act = t.mouse_wheel(false, -240, 3, ModKeys::empty(), Pos::new(0, 0));
        assert_eq!(act, super::super::mouse::WheelAction::ScrollView(6));
    }

    #[test]
    fn alternate_scroll_sends_cursor_keys() {
        let mut t = term();
        feed(&mut t, b"\x1b[?1049h\x1b[?1007h");
        let act = t.mouse_wheel(false, 120, 1, ModKeys::empty(), Pos::new(0, 0));
        assert_eq!(act, super::super::mouse::WheelAction::Handled);
        assert_eq!(responses(&mut t)[0], b"\x1b[A".to_vec());
    }

    #[test]
    fn resize_reflows_into_scrollback() {
        let mut t = term_sized(10, 40);
        feed(&mut t, b"Hello");
        t.resize(5, 40);
        assert_eq!(t.rows, 5);
        // the evicted top rows (with the text) sit in the scrollback
        let saved: Vec<String> = (0..t.scrollback.len())
            .map(|i| t.scrollback.get(i).unwrap().unpack(40).text())
            .collect();
        assert!(saved.iter().any(|l| l.starts_with("Hello")));
        // growing back pulls them in again
        t.resize(10, 40);
        assert!(row_text(&t, 0).starts_with("Hello"));
        t.resize(10, 20);
        assert_eq!(t.cols, 20);
        assert!(row_text(&t, 0).starts_with("Hello"));
        t.check_invariants();
    }

    #[test]
    fn full_reset_restores_power_on_state() {
        let mut t = term();
        feed(&mut t, b"text\x1b[5;10r\x1b[?6h\x1b[?1049h\x1b[31m");
        feed(&mut t, b"\x1bc");
        assert!(!t.on_alt_screen);
        assert_eq!((t.marg_top, t.marg_bot), (0, t.rows - 1));
        assert!(!t.cursor.origin);
        assert_eq!(t.cursor.attr, Attr::default());
        assert_eq!(row_text(&t, 0).trim_end(), "");
        t.check_invariants();
    }

    #[test]
    fn soft_reset_keeps_display() {
        let mut t = term();
        feed(&mut t, b"keepme\x1b[5;10r\x1b[?6h");
        feed(&mut t, b"\x1b[!p");
        assert!(row_text(&t, 0).starts_with("keepme"));
        assert_eq!((t.marg_top, t.marg_bot), (0, t.rows - 1));
        assert!(!t.cursor.origin);
    }

    #[test]
    fn window_ops_report_and_request() {
        let mut t = term();
        feed(&mut t, b"\x1b[18t");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1b[8;24;80t".to_vec()));
        feed(&mut t, b"\x1b[8;30;100t");
        assert!(t.take_events().iter().any(|e| matches!(
            e,
            TermEvent::Window(super::super::event::WindowOp::SetCharSize {
                rows: 30,
                cols: 100
            })
        )));
        // suppression drops the op
        t.cfg.suppress_win = "8".into();
        feed(&mut t, b"\x1b[8;30;100t");
        assert!(t.take_events().iter().all(|e| !matches!(
            e,
            TermEvent::Window(super::super::event::WindowOp::SetCharSize { .. })
        )));
    }

    #[test]
    fn suppressed_sgr_codes_are_parsed_but_dropped() {
        let mut t = term();
        t.cfg.suppress_sgr = "31".into();
        feed(&mut t, b"\x1b[31;1m");
        assert_eq!(t.cursor.attr.fg, Color::Default);
        assert!(t.cursor.attr.flags.contains(AttrFlags::BOLD));
    }

    #[test]
    fn unknown_csi_and_osc_are_ignored() {
        let mut t = term();
        feed(&mut t, b"\x1b[?77777h\x1b[99;99(Zok");
        // parser survives and continues interpreting
        assert!(row_text(&t, 0).contains("ok"));
        feed(&mut t, b"\x1b]7777777;payload\x07still");
        assert!(row_text(&t, 0).contains("still"));
        t.check_invariants();
    }

    #[test]
    fn can_and_sub_abort_string_states() {
        let mut t = term();
        feed(&mut t, b"\x1b]2;half");
        assert_eq!(t.state, State::CmdString);
        feed(&mut t, &[0x18]); // CAN
        feed(&mut t, b"after");
        assert!(row_text(&t, 0).contains("after"));
    }

    #[test]
    fn tab_stops_set_clear_and_report() {
        let mut t = term();
        feed(&mut t, b"\x1b[5;1H\x1b[10G\x1bH\x1b[1G\t");
        assert_eq!(t.cursor.col, 8); // default stop first
        feed(&mut t, b"\t");
        assert_eq!(t.cursor.col, 9); // the custom stop at column 10
        feed(&mut t, b"\x1b[3g\x1b[1G\t");
        assert_eq!(t.cursor.col, 79, "no stops: tab runs to the last column");
        // DECTABSR reports the (now empty) stop list
        feed(&mut t, b"\x1b[2$w");
        assert_eq!(responses(&mut t).last(), Some(&b"\x1bP2$\x1b\\".to_vec()));
    }

    #[test]
    fn decaln_fills_with_e() {
        let mut t = term_sized(3, 5);
        feed(&mut t, b"\x1b#8");
        for y in 0..3 {
            assert_eq!(row_text(&t, y), "EEEEE");
        }
        assert_eq!((t.cursor.row, t.cursor.col), (0, 0));
    }

    #[test]
    fn double_width_line_attributes() {
        let mut t = term();
        feed(&mut t, b"wide\x1b#6");
        assert!(t.grid.row(0).flags.contains(RowFlags::WIDE));
        feed(&mut t, b"\x1b#5");
        assert!(!t.grid.row(0).flags.contains(RowFlags::WIDE));
    }

    #[test]
    fn deccolm_requires_enabling_mode() {
        let mut t = term();
        feed(&mut t, b"\x1b[?3h");
        assert!(t.take_events().iter().all(|e| !matches!(
            e,
            TermEvent::Window(super::super::event::WindowOp::SetCharSize { cols: 132, .. })
        )));
        feed(&mut t, b"\x1b[?40h\x1b[?3h");
        assert!(t.take_events().iter().any(|e| matches!(
            e,
            TermEvent::Window(super::super::event::WindowOp::SetCharSize { cols: 132, .. })
        )));
        assert!(t.modes.reset_132);
    }

    #[test]
    fn mode_save_restore_stack() {
        let mut t = term();
        feed(&mut t, b"\x1b[?7l\x1b[?7s\x1b[?7h");
        assert!(t.modes.autowrap);
        feed(&mut t, b"\x1b[?7r");
        assert!(!t.modes.autowrap);
    }

    #[test]
    fn media_copy_routes_print_events() {
        let mut t = term();
        feed(&mut t, b"\x1b[5iprinted text\x1b[4i");
        let events = t.take_events();
        let printed = events
            .iter()
            .find_map(|e| match e {
                TermEvent::Print { data } => Some(data.clone()),
                _ => None,
            })
            .expect("print event");
        assert_eq!(printed, b"printed text".to_vec());
        // interpretation resumes afterwards
        feed(&mut t, b"visible");
        assert!(row_text(&t, 0).contains("visible"));
    }

    #[test]
    fn progress_sequences_surface_as_events() {
        let mut t = term();
        feed(&mut t, b"\x1b]9;4;1;50\x07");
        assert!(t
            .take_events()
            .iter()
            .any(|e| matches!(e, TermEvent::Progress { state: 1, percent: 50 })));
        feed(&mut t, b"\x1b[2;70%q");
        assert!(t
            .take_events()
            .iter()
            .any(|e| matches!(e, TermEvent::Progress { state: 2, percent: 70 })));
    }

    #[test]
    fn decscusr_and_decrqss_cursor_style() {
        let mut t = term();
        feed(&mut t, b"\x1b[4 q");
        assert_eq!(t.cursor_shape, Some(CursorShape::Underline));
        assert_eq!(t.cursor_blinks, Some(false));
        feed(&mut t, b"\x1bP$q q\x1b\\");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1bP1$r4 q\x1b\\".to_vec())
        );
    }

    #[test]
    fn dectabsr_reports_default_stops() {
        let mut t = term_sized(24, 24);
        feed(&mut t, b"\x1b[2$w");
        assert_eq!(
            responses(&mut t).last(),
            Some(&b"\x1bP2$u1/9/17\x1b\\".to_vec())
        );
    }

    #[test]
    fn decaupss_selects_supplemental_set() {
        let mut t = term();
        // designate DEC Supplemental slot and point it at the technical set
        feed(&mut t, b"\x1bP!u>\x1b\\");
        assert_eq!(t.cursor.decsupp, Charset::Tech);
    }

    #[test]
    fn image_hibernation_when_scrolled_out() {
        let mut t = term_sized(5, 20);
        feed(&mut t, b"\x1bPq#0;2;0;0;100#0~~\x1b\\");
        assert_eq!(t.images.len(), 1);
        // push the image far into the scrollback
        for _ in 0..12 {
            feed(&mut t, b"\r\n");
        }
        let first_visible = t.virtuallines;
        let last_visible = t.virtuallines + t.rows as i64;
        t.images.hibernate_outside(first_visible, last_visible);
        let img = t.images.get(1).unwrap();
        assert!(img.pixels.is_none());
        assert!(img.strage.is_some());
        t.images.thaw(1).unwrap();
        assert!(t.images.get(1).unwrap().pixels.is_some());
    }

    #[test]
    fn images_expire_past_scrollback() {
        let cfg = Config {
            rows: 5,
            cols: 20,
            scrollback_lines: 4,
            ..Config::default()
        };
        let mut t = TerminalState::new(cfg);
        feed(&mut t, b"\x1bPq#0~\x1b\\");
        assert_eq!(t.images.len(), 1);
        for _ in 0..20 {
            feed(&mut t, b"\r\n");
        }
        assert_eq!(t.images.len(), 0, "image scrolled beyond the ring");
    }

    #[test]
    fn bell_and_margin_bell() {
        let mut t = term();
        feed(&mut t, b"\x07");
        assert!(t
            .take_events()
            .iter()
            .any(|e| matches!(e, TermEvent::Bell)));
        feed(&mut t, b"\x1b[?44h\x1b[1;70H");
        feed(&mut t, b"abcdefgh");
        assert!(t
            .take_events()
            .iter()
            .any(|e| matches!(e, TermEvent::MarginBell)));
    }

    #[test]
    fn answerback_on_enq() {
        let mut t = TerminalState::new(Config {
            answerback: "here".into(),
            ..Config::default()
        });
        feed(&mut t, &[0x05]);
        assert_eq!(responses(&mut t).last(), Some(&b"here".to_vec()));
    }

    #[test]
    fn sl_sr_shift_columns() {
        let mut t = term_sized(3, 10);
        feed(&mut t, b"abcde\x1b[1;1H");
        feed(&mut t, b"\x1b[2 @"); // shift left 2
        assert!(row_text(&t, 0).starts_with("cde"));
        feed(&mut t, b"\x1b[1 A"); // shift right 1
        assert!(row_text(&t, 0).starts_with(" cde"));
        t.check_invariants();
    }

    #[test]
    fn modify_other_keys_setting() {
        let mut t = term();
        feed(&mut t, b"\x1b[>4;2m");
        assert_eq!(t.modes.modify_other_keys, 2);
        feed(&mut t, b"\x1b[>4;0m\x1b[>4;1m");
        assert_eq!(t.modes.modify_other_keys, 1);
        feed(&mut t, b"\x1b[>m");
        assert_eq!(t.modes.modify_other_keys, 0);
    }

    #[test]
    fn scroll_view_clamps_to_scrollback() {
        let mut t = term_sized(5, 20);
        for i in 0..10 {
            feed(&mut t, format!("l{i}\r\n").as_bytes());
        }
        let depth = t.scrollback.len() as i32;
        t.scroll_view(-100);
        assert_eq!(t.disptop, -depth);
        t.scroll_view(0);
        assert_eq!(t.disptop, 0);
    }

    #[test]
    fn lr_margins_confine_scrolling() {
        let mut t = term_sized(5, 20);
        feed(&mut t, b"0123456789\x1b[?69h\x1b[3;8s");
        assert_eq!((t.marg_left, t.marg_right), (2, 7));
        feed(&mut t, b"\x1b[1;3H");
        // IL within vertical margins only touches the margin columns
        feed(&mut t, b"\x1b[1L");
        let text = row_text(&t, 0);
        assert!(text.starts_with("01"), "{text:?}");
        assert!(text[8..].starts_with("89"), "{text:?}");
        feed(&mut t, b"\x1b[?69l");
        assert_eq!((t.marg_left, t.marg_right), (0, 19));
        t.check_invariants();
    }
}
