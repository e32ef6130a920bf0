/// Mouse tracking mode selected by the DECSET mouse modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseMode {
    /// X10 compatibility: button press only.
    X10,
    /// VT200: press and release.
    Vt200,
    /// Press, release, and motion while a button is held.
    BtnEvent,
    /// All motion.
    AnyEvent,
    /// DEC locator reporting (DECELR).
    Locator,
}

/// Encoding used for mouse reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseEnc {
    /// Legacy 0x20-offset byte encoding.
    #[default]
    Legacy,
    /// xterm 1005: UTF-8 coordinates.
    Utf8,
    /// xterm 1006: CSI < ... M/m.
    XtermCsi,
    /// urxvt 1015: CSI ... M.
    UrxvtCsi,
    /// xterm 1016: CSI < with pixel coordinates.
    PixelCsi,
}

/// Terminal mode flags tracking the DEC private and ANSI modes the
/// interpreter can set, reset, and report (DECRQM).
#[derive(Debug, Clone)]
pub struct TerminalModes {
    /// DECCKM: application cursor keys.
    pub app_cursor_keys: bool,
    /// DECKPAM/DECNKM: application keypad.
    pub app_keypad: bool,
    /// DECAWM: auto-wrap.
    pub autowrap: bool,
    /// xterm reverse wraparound (mode 45).
    pub rev_wrap: bool,
    /// DECSCNM: reverse video.
    pub rvideo: bool,
    /// DECARM: auto key repeat.
    pub auto_repeat: bool,
    /// DECTCEM: cursor visible.
    pub cursor_on: bool,
    /// AT&T 610 blinking cursor (mode 12).
    pub cursor_blink: bool,
    /// IRM: insert mode.
    pub insert: bool,
    /// SRM: local echo disabled when set.
    pub echoing: bool,
    /// LNM: LF implies CR.
    pub newline_mode: bool,
    /// DECCOLM allowed (mode 40).
    pub deccolm_allowed: bool,
    /// DECNCSM: DECCOLM does not clear the screen (mode 95).
    pub deccolm_noclear: bool,
    /// Set when DECCOLM switched to 132 columns; RIS restores 80.
    pub reset_132: bool,
    /// DECNRCM: NRC set designation enabled.
    pub decnrc_enabled: bool,
    /// Margin bell (mode 44).
    pub margin_bell: bool,
    /// DECBKM: backarrow sends BS.
    pub backspace_sends_bs: bool,
    /// Mode 1037: keypad Delete sends DEL.
    pub delete_sends_del: bool,
    /// DECLRMM: left/right margin mode.
    pub lrmargmode: bool,
    /// DECSDM: sixel display mode (images at the home position).
    pub sixel_display: bool,
    /// Private mode 7730: sixel scrolling homes the cursor to column 0.
    pub sixel_scrolls_left: bool,
    /// Private mode 8452: sixel scrolling leaves the cursor right of the
    /// image.
    pub sixel_scrolls_right: bool,
    pub mouse_mode: Option<MouseMode>,
    pub mouse_enc: MouseEnc,
    /// Mode 1004: focus in/out reports.
    pub report_focus: bool,
    /// Mode 1007: alternate scroll (wheel sends cursor keys on the alt
    /// screen).
    pub wheel_reporting_xterm: bool,
    /// Private mode 7786: mousewheel reporting.
    pub wheel_reporting: bool,
    /// Private mode 7787: application mousewheel mode.
    pub app_wheel: bool,
    /// Mode 1042 / 1043: bell highlights the taskbar / pops the window up.
    pub bell_taskbar: bool,
    pub bell_popup: bool,
    /// Mode 2004: bracketed paste.
    pub bracketed_paste: bool,
    /// Mode 1061: VT220 keyboard emulation.
    pub vt220_keys: bool,
    /// Mode 1046 inverted: alternate screen switching disabled.
    pub disable_alternate_screen: bool,
    /// Scrollbar visible (modes 30 / 7766).
    pub show_scrollbar: bool,
    /// Private mode 7700: report CJK ambiguous width setting.
    pub report_ambig_width: bool,
    /// Private mode 7767: report font changes.
    pub report_font_changed: bool,
    /// Private mode 7783: shortcut override.
    pub shortcut_override: bool,
    /// Private mode 7727: application escape key.
    pub app_escape_key: bool,
    /// Private mode 7728: escape sends FS.
    pub escape_sends_fs: bool,
    /// Mode 77096: bidi disabled globally.
    pub disable_bidi: bool,
    /// Modes 77000..77031: application control keys, one bit per ^@..^_.
    pub app_control: u32,
    /// xterm modifyOtherKeys level (CSI > 4 ; n m).
    pub modify_other_keys: u8,
    /// xterm pointerMode: hide the pointer while typing.
    pub hide_mouse: bool,
    /// DECARR auto-repeat rate (0 = default).
    pub repeat_rate: u8,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            app_cursor_keys: false,
            app_keypad: false,
            autowrap: true,
            rev_wrap: false,
            rvideo: false,
            auto_repeat: true,
            cursor_on: true,
            cursor_blink: false,
            insert: false,
            echoing: true,
            newline_mode: false,
            deccolm_allowed: false,
            deccolm_noclear: false,
            reset_132: false,
            decnrc_enabled: false,
            margin_bell: false,
            backspace_sends_bs: true,
            delete_sends_del: false,
            lrmargmode: false,
            sixel_display: false,
            sixel_scrolls_left: false,
            sixel_scrolls_right: false,
            mouse_mode: None,
            mouse_enc: MouseEnc::Legacy,
            report_focus: false,
            wheel_reporting_xterm: false,
            wheel_reporting: true,
            app_wheel: false,
            bell_taskbar: false,
            bell_popup: false,
            bracketed_paste: false,
            vt220_keys: false,
            disable_alternate_screen: false,
            show_scrollbar: true,
            report_ambig_width: false,
            report_font_changed: false,
            shortcut_override: false,
            app_escape_key: false,
            escape_sends_fs: false,
            disable_bidi: false,
            app_control: 0,
            modify_other_keys: 0,
            hide_mouse: false,
            repeat_rate: 0,
        }
    }
}

/// Save stack for `CSI ? Pm s` / `CSI ? Pm r` (XTSAVE / XTRESTORE).
#[derive(Debug, Default)]
pub struct ModeStack {
    entries: Vec<(i32, i32)>,
}

impl ModeStack {
    /// Remember `val` for `mode`, replacing an earlier save of the same
    /// mode.
    pub fn push(&mut self, mode: i32, val: i32) {
        self.entries.retain(|&(m, _)| m != mode);
        self.entries.push((mode, val));
    }

    pub fn pop(&mut self, mode: i32) -> Option<i32> {
        let idx = self.entries.iter().rposition(|&(m, _)| m == mode)?;
        Some(self.entries.remove(idx).1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_stack_replaces_same_mode() {
        let mut stack = ModeStack::default();
        stack.push(1049, 1);
        stack.push(1049, 2);
        assert_eq!(stack.pop(1049), Some(2));
        assert_eq!(stack.pop(1049), None);
    }

    #[test]
    fn defaults_match_power_on() {
        let m = TerminalModes::default();
        assert!(m.autowrap);
        assert!(m.cursor_on);
        assert!(!m.insert);
        assert!(m.backspace_sends_bs);
        assert_eq!(m.mouse_enc, MouseEnc::Legacy);
    }
}
