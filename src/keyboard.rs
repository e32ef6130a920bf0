//! Keyboard dispatcher: translates layout-resolved key events into the
//! byte sequences the child expects, honoring application cursor/keypad
//! modes, VT52, modifyOtherKeys, user-defined key bindings, compose
//! sequences, and Alt+numpad character codes.

use crate::terminal::mouse::ModKeys;
use crate::terminal::state::TerminalState;

/// A layout-resolved key. The host performs keyboard layout translation
/// and delivers either the resulting character or a named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    F(u8),
    Kp(u8),
    KpDecimal,
    KpEnter,
    KpAdd,
    KpSubtract,
    KpMultiply,
    KpDivide,
    /// The Alt key was released (finishes an Alt+numpad code).
    AltRelease,
    /// The configured compose key.
    Compose,
}

/// A key-down event as delivered by the host.
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: Key,
    pub mods: ModKeys,
    pub repeat: bool,
    /// Extended scancode (distinguishes cursor keys from the numpad).
    pub extended: bool,
}

/// Outcome of dispatching a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult {
    /// Bytes to write to the child.
    Bytes(Vec<u8>),
    /// A named user function for the host to run.
    Function(String),
    /// A shell command for the host to spawn.
    ShellCommand(String),
    /// Swallowed (compose pending, alt-code accumulation, unmapped).
    Nothing,
}

/// Parsed user key binding.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyBinding {
    mods: ModKeys,
    keypad: bool,
    name: String,
    action: BindAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BindAction {
    Literal(String),
    Control(u8),
    ShellCommand(String),
    TildeCode(u8),
    Function(String),
}

/// Built-in dead-key compose sequences (accent + base). The table is a
/// prefix tree over char sequences; user additions merge in.
const COMPOSE_TABLE: &[(&str, &str)] = &[
    ("'a", "á"),
    ("'e", "é"),
    ("'i", "í"),
    ("'o", "ó"),
    ("'u", "ú"),
    ("'y", "ý"),
    ("'A", "Á"),
    ("'E", "É"),
    ("'I", "Í"),
    ("'O", "Ó"),
    ("'U", "Ú"),
    ("`a", "à"),
    ("`e", "è"),
    ("`i", "ì"),
    ("`o", "ò"),
    ("`u", "ù"),
    ("^a", "â"),
    ("^e", "ê"),
    ("^i", "î"),
    ("^o", "ô"),
    ("^u", "û"),
    ("\"a", "ä"),
    ("\"e", "ë"),
    ("\"i", "ï"),
    ("\"o", "ö"),
    ("\"u", "ü"),
    ("\"y", "ÿ"),
    ("~a", "ã"),
    ("~n", "ñ"),
    ("~o", "õ"),
    ("/o", "ø"),
    ("/O", "Ø"),
    (",c", "ç"),
    (",C", "Ç"),
    ("ss", "ß"),
    ("ae", "æ"),
    ("AE", "Æ"),
    ("oe", "œ"),
    ("oc", "©"),
    ("or", "®"),
    ("+-", "±"),
    ("--", "–"),
    ("<<", "«"),
    (">>", "»"),
    ("..", "…"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposeState {
    None,
    /// Compose key pressed, accumulating.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AltCodeBase {
    None,
    Dec,
    Oct,
    Hex,
}

/// Keyboard dispatcher state (compose buffer, alt-code accumulator,
/// parsed bindings).
pub struct Keyboard {
    bindings: Vec<KeyBinding>,
    compose: ComposeState,
    compose_buf: String,
    alt_code: u32,
    alt_base: AltCodeBase,
}

impl Keyboard {
    pub fn new(key_commands: &str) -> Self {
        Self {
            bindings: parse_bindings(key_commands),
            compose: ComposeState::None,
            compose_buf: String::new(),
            alt_code: 0,
            alt_base: AltCodeBase::None,
        }
    }

    /// Dispatch one key-down event against the current terminal modes.
    pub fn key_down(&mut self, ev: KeyEvent, term: &TerminalState) -> KeyResult {
        // Alt+numpad character codes
        if ev.mods.contains(ModKeys::ALT) && !ev.extended {
            if let Some(digit) = keypad_digit(ev.key) {
                return self.alt_code_digit(digit);
            }
            if self.alt_base == AltCodeBase::Hex {
                if let Key::Char(c @ ('a'..='f' | 'A'..='F')) = ev.key {
                    return self.alt_code_digit(c.to_ascii_lowercase() as u32 - 'a' as u32 + 10);
                }
            }
            if self.alt_base == AltCodeBase::None {
                if let Key::Char('x' | 'X') = ev.key {
                    // hex entry announced by a leading x
                    self.alt_base = AltCodeBase::Hex;
                    self.alt_code = 0;
                    return KeyResult::Nothing;
                }
            }
        }
        if ev.key == Key::AltRelease {
            return self.alt_code_finish();
        }

        if ev.key == Key::Compose {
            self.compose = ComposeState::Active;
            self.compose_buf.clear();
            return KeyResult::Nothing;
        }

        // user-defined bindings take precedence
        if let Some(result) = self.match_binding(&ev, term) {
            return result;
        }

        // compose sequences accumulate plain characters
        if self.compose == ComposeState::Active {
            if let Key::Char(c) = ev.key {
                return self.compose_char(c);
            }
            self.compose = ComposeState::None;
            self.compose_buf.clear();
        }

        self.encode(ev, term)
    }

    // ---- alt codes ----------------------------------------------------------

    fn alt_code_digit(&mut self, digit: u32) -> KeyResult {
        match self.alt_base {
            AltCodeBase::None => {
                self.alt_base = if digit == 0 {
                    AltCodeBase::Oct
                } else {
                    AltCodeBase::Dec
                };
                self.alt_code = digit;
            }
            AltCodeBase::Dec => self.alt_code = self.alt_code.saturating_mul(10) + digit,
            AltCodeBase::Oct => self.alt_code = self.alt_code.saturating_mul(8) + digit,
            AltCodeBase::Hex => self.alt_code = self.alt_code.saturating_mul(16) + digit,
        }
        if self.alt_code > 0x10FFFF {
            self.alt_base = AltCodeBase::None;
            self.alt_code = 0;
        }
        KeyResult::Nothing
    }

    fn alt_code_finish(&mut self) -> KeyResult {
        if self.alt_base == AltCodeBase::None {
            return KeyResult::Nothing;
        }
        let code = self.alt_code;
        self.alt_base = AltCodeBase::None;
        self.alt_code = 0;
        match char::from_u32(code) {
            Some(c) if code != 0 => {
                let mut buf = [0u8; 4];
                KeyResult::Bytes(c.encode_utf8(&mut buf).as_bytes().to_vec())
            }
            _ => KeyResult::Nothing,
        }
    }

    // ---- compose ------------------------------------------------------------

    fn compose_char(&mut self, c: char) -> KeyResult {
        self.compose_buf.push(c);
        let mut prefix = false;
        for (seq, out) in COMPOSE_TABLE {
            if *seq == self.compose_buf {
                self.compose = ComposeState::None;
                let result = out.as_bytes().to_vec();
                self.compose_buf.clear();
                return KeyResult::Bytes(result);
            }
            if seq.starts_with(self.compose_buf.as_str()) {
                prefix = true;
            }
        }
        if prefix {
            return KeyResult::Nothing;
        }
        // no match: flush the accumulated characters literally
        self.compose = ComposeState::None;
        let flushed = std::mem::take(&mut self.compose_buf);
        KeyResult::Bytes(flushed.into_bytes())
    }

    // ---- user bindings ------------------------------------------------------

    fn match_binding(&self, ev: &KeyEvent, term: &TerminalState) -> Option<KeyResult> {
        let name = key_name(ev.key)?;
        let keypad = matches!(
            ev.key,
            Key::Kp(_)
                | Key::KpDecimal
                | Key::KpEnter
                | Key::KpAdd
                | Key::KpSubtract
                | Key::KpMultiply
                | Key::KpDivide
        );
        for binding in &self.bindings {
            if binding.mods == ev.mods && binding.keypad == keypad && binding.name == name {
                return Some(match &binding.action {
                    BindAction::Literal(s) => KeyResult::Bytes(s.clone().into_bytes()),
                    BindAction::Control(c) => KeyResult::Bytes(vec![*c]),
                    BindAction::ShellCommand(cmd) => KeyResult::ShellCommand(cmd.clone()),
                    BindAction::TildeCode(n) => {
                        KeyResult::Bytes(tilde_code(*n, ev.mods, term).into_bytes())
                    }
                    BindAction::Function(f) => KeyResult::Function(f.clone()),
                });
            }
        }
        None
    }

    // ---- the standard encodings ---------------------------------------------

    fn encode(&mut self, ev: KeyEvent, term: &TerminalState) -> KeyResult {
        let mods = ev.mods;
        let vt52 = term.vt52_mode != 0;
        let app_cursor = term.modes.app_cursor_keys;
        let app_keypad = term.modes.app_keypad;
        let other_level = term.modes.modify_other_keys;

        let bytes: Vec<u8> = match ev.key {
            Key::Char(c) => return self.encode_char(c, mods, term),
            Key::Enter => {
                if other_level >= 2 && !mods.is_empty() {
                    other_code('\r', mods, term).into_bytes()
                } else if mods.contains(ModKeys::ALT) {
                    let mut v = vec![0x1B];
                    v.extend(enter_bytes(term));
                    v
                } else {
                    enter_bytes(term)
                }
            }
            Key::Tab => {
                if mods.contains(ModKeys::SHIFT) && !mods.contains(ModKeys::CTRL) {
                    b"\x1b[Z".to_vec()
                } else if other_level >= 2 && !mods.is_empty() {
                    other_code('\t', mods, term).into_bytes()
                } else if mods.contains(ModKeys::CTRL) {
                    // distinguishable form for Ctrl+Tab
                    format!("\x1b[1;{}I", mods.bits() + 1).into_bytes()
                } else {
                    vec![b'\t']
                }
            }
            Key::Backspace => {
                let base: u8 = if term.modes.backspace_sends_bs ^ mods.contains(ModKeys::CTRL) {
                    0x08
                } else {
                    0x7F
                };
                if mods.contains(ModKeys::ALT) {
                    vec![0x1B, base]
                } else {
                    vec![base]
                }
            }
            Key::Escape => {
                if term.modes.app_escape_key {
                    b"\x1bO[".to_vec()
                } else if term.modes.escape_sends_fs {
                    vec![0x1C]
                } else if mods.contains(ModKeys::ALT) {
                    vec![0x1B, 0x1B]
                } else {
                    vec![0x1B]
                }
            }
            Key::Up => cursor_key(b'A', mods, vt52, app_cursor),
            Key::Down => cursor_key(b'B', mods, vt52, app_cursor),
            Key::Right => cursor_key(b'C', mods, vt52, app_cursor),
            Key::Left => cursor_key(b'D', mods, vt52, app_cursor),
            Key::Home => {
                if term.modes.vt220_keys {
                    tilde_code(1, mods, term).into_bytes()
                } else {
                    cursor_key(b'H', mods, vt52, app_cursor)
                }
            }
            Key::End => {
                if term.modes.vt220_keys {
                    tilde_code(4, mods, term).into_bytes()
                } else {
                    cursor_key(b'F', mods, vt52, app_cursor)
                }
            }
            Key::Insert => tilde_code(2, mods, term).into_bytes(),
            Key::Delete => {
                if mods.is_empty() && term.modes.delete_sends_del {
                    vec![0x7F]
                } else {
                    tilde_code(3, mods, term).into_bytes()
                }
            }
            Key::PageUp => tilde_code(5, mods, term).into_bytes(),
            Key::PageDown => tilde_code(6, mods, term).into_bytes(),
            Key::F(n) => fkey(n, mods, term),
            Key::Kp(n) if app_keypad && !ev.extended => ss3_keypad(b'p' + n, mods),
            Key::Kp(n) => vec![b'0' + n],
            Key::KpDecimal if app_keypad && !ev.extended => ss3_keypad(b'n', mods),
            Key::KpDecimal => vec![b'.'],
            Key::KpEnter if app_keypad => ss3_keypad(b'M', mods),
            Key::KpEnter => enter_bytes(term),
            Key::KpAdd if app_keypad => ss3_keypad(b'k', mods),
            Key::KpAdd => vec![b'+'],
            Key::KpSubtract if app_keypad => ss3_keypad(b'm', mods),
            Key::KpSubtract => vec![b'-'],
            Key::KpMultiply if app_keypad => ss3_keypad(b'j', mods),
            Key::KpMultiply => vec![b'*'],
            Key::KpDivide if app_keypad => ss3_keypad(b'o', mods),
            Key::KpDivide => vec![b'/'],
            Key::AltRelease | Key::Compose => return KeyResult::Nothing,
        };
        KeyResult::Bytes(bytes)
    }

    fn encode_char(&mut self, c: char, mods: ModKeys, term: &TerminalState) -> KeyResult {
        let other_level = term.modes.modify_other_keys;
        let ctrl = mods.contains(ModKeys::CTRL);
        let alt = mods.contains(ModKeys::ALT);

        // modifyOtherKeys level 2 reports every modified key
        if other_level >= 2 && (ctrl || alt || mods.contains(ModKeys::SHIFT)) {
            return KeyResult::Bytes(other_code(c, mods, term).into_bytes());
        }

        if ctrl {
            if let Some(folded) = control_fold(c) {
                // application control mode replaces the raw control char
                let bit = folded as u32;
                if bit < 32 && term.modes.app_control & (1 << bit) != 0 {
                    return KeyResult::Bytes(other_code(c, mods, term).into_bytes());
                }
                let mut v = Vec::new();
                if alt {
                    v.push(0x1B);
                }
                v.push(folded);
                return KeyResult::Bytes(v);
            }
            // Ctrl chords without a control-char mapping
            if other_level >= 1 {
                return KeyResult::Bytes(other_code(c, mods, term).into_bytes());
            }
            return KeyResult::Nothing;
        }

        let mut v = Vec::new();
        if alt {
            v.push(0x1B);
        }
        let mut buf = [0u8; 4];
        v.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        KeyResult::Bytes(v)
    }
}

// ---- helpers ----------------------------------------------------------------

fn enter_bytes(term: &TerminalState) -> Vec<u8> {
    if term.modes.newline_mode {
        b"\r\n".to_vec()
    } else {
        vec![b'\r']
    }
}

fn cursor_key(code: u8, mods: ModKeys, vt52: bool, app_cursor: bool) -> Vec<u8> {
    if vt52 {
        vec![0x1B, code]
    } else if !mods.is_empty() {
        format!("\x1b[1;{}{}", mods.bits() + 1, code as char).into_bytes()
    } else if app_cursor {
        vec![0x1B, b'O', code]
    } else {
        vec![0x1B, b'[', code]
    }
}

fn ss3_keypad(code: u8, mods: ModKeys) -> Vec<u8> {
    if mods.is_empty() {
        vec![0x1B, b'O', code]
    } else {
        format!("\x1bO{}{}", mods.bits() + 1, code as char).into_bytes()
    }
}

fn tilde_code(code: u8, mods: ModKeys, _term: &TerminalState) -> String {
    if mods.is_empty() {
        format!("\x1b[{}~", code)
    } else {
        format!("\x1b[{};{}~", code, mods.bits() + 1)
    }
}

/// xterm modifyOtherKeys encoding, selected by formatOtherKeys.
fn other_code(c: char, mods: ModKeys, term: &TerminalState) -> String {
    let m = mods.bits() + 1;
    if term.cfg.format_other_keys {
        format!("\x1b[{};{}u", c as u32, m)
    } else {
        format!("\x1b[27;{};{}~", m, c as u32)
    }
}

fn fkey(n: u8, mods: ModKeys, term: &TerminalState) -> Vec<u8> {
    match n {
        1..=4 => {
            let code = b'P' + n - 1;
            if term.vt52_mode != 0 {
                vec![0x1B, code]
            } else if mods.is_empty() {
                vec![0x1B, b'O', code]
            } else {
                format!("\x1b[1;{}{}", mods.bits() + 1, code as char).into_bytes()
            }
        }
        5 => tilde_code(15, mods, term).into_bytes(),
        6..=10 => tilde_code(17 + n - 6, mods, term).into_bytes(),
        11 | 12 => tilde_code(23 + n - 11, mods, term).into_bytes(),
        13..=20 => tilde_code(25 + n - 13, mods, term).into_bytes(),
        _ => Vec::new(),
    }
}

fn control_fold(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 & 0x1F),
        'A'..='Z' => Some(c as u8 & 0x1F),
        '@' | ' ' => Some(0),
        '[' | '3' => Some(0x1B),
        '\\' | '4' => Some(0x1C),
        ']' | '5' => Some(0x1D),
        '^' | '6' => Some(0x1E),
        '_' | '7' | '/' => Some(0x1F),
        '?' | '8' => Some(0x7F),
        _ => None,
    }
}

fn keypad_digit(key: Key) -> Option<u32> {
    match key {
        Key::Kp(n) => Some(n as u32),
        _ => None,
    }
}

fn key_name(key: Key) -> Option<String> {
    Some(match key {
        Key::Char(c) => c.to_string(),
        Key::Enter => "Enter".into(),
        Key::Tab => "Tab".into(),
        Key::Backspace => "Backspace".into(),
        Key::Escape => "Escape".into(),
        Key::Up => "Up".into(),
        Key::Down => "Down".into(),
        Key::Left => "Left".into(),
        Key::Right => "Right".into(),
        Key::Home => "Home".into(),
        Key::End => "End".into(),
        Key::Insert => "Insert".into(),
        Key::Delete => "Delete".into(),
        Key::PageUp => "PageUp".into(),
        Key::PageDown => "PageDown".into(),
        Key::F(n) => format!("F{n}"),
        Key::Kp(n) => n.to_string(),
        Key::KpDecimal => ".".into(),
        Key::KpEnter => "Enter".into(),
        Key::KpAdd => "+".into(),
        Key::KpSubtract => "-".into(),
        Key::KpMultiply => "*".into(),
        Key::KpDivide => "/".into(),
        Key::AltRelease | Key::Compose => return None,
    })
}

/// Parse the ';'-separated key binding list:
/// `[mod+][KP_]<keyname>:<action>` where the action is a quoted string,
/// a control letter `^X`, a backtick shell command, a bare CSI-tilde
/// number, or a named function.
fn parse_bindings(spec: &str) -> Vec<KeyBinding> {
    let mut out = Vec::new();
    for item in spec.split(';') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let Some((key_part, action_part)) = item.split_once(':') else {
            continue;
        };

        let mut mods = ModKeys::empty();
        let mut name = key_part.trim();
        loop {
            if let Some(rest) = name.strip_prefix("Ctrl+") {
                mods |= ModKeys::CTRL;
                name = rest;
            } else if let Some(rest) = name.strip_prefix("Shift+") {
                mods |= ModKeys::SHIFT;
                name = rest;
            } else if let Some(rest) = name.strip_prefix("Alt+") {
                mods |= ModKeys::ALT;
                name = rest;
            } else {
                break;
            }
        }
        let keypad = name.starts_with("KP_");
        let name = name.strip_prefix("KP_").unwrap_or(name).to_string();

        let action = action_part.trim();
        let action = if let Some(quoted) = action
            .strip_prefix('"')
            .and_then(|a| a.strip_suffix('"'))
        {
            BindAction::Literal(unescape(quoted))
        } else if let Some(cmd) = action
            .strip_prefix('`')
            .and_then(|a| a.strip_suffix('`'))
        {
            BindAction::ShellCommand(cmd.to_string())
        } else if let Some(ctrl) = action.strip_prefix('^') {
            match ctrl.bytes().next() {
                Some(c @ b'@'..=b'_') => BindAction::Control(c & 0x1F),
                Some(c @ b'a'..=b'z') => BindAction::Control(c & 0x1F),
                Some(b'?') => BindAction::Control(0x7F),
                _ => continue,
            }
        } else if let Ok(n) = action.parse::<u8>() {
            BindAction::TildeCode(n)
        } else {
            BindAction::Function(action.to_string())
        };

        out.push(KeyBinding {
            mods,
            keypad,
            name,
            action,
        });
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('e') => out.push('\x1b'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => break,
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn term() -> TerminalState {
        TerminalState::new(Config::default())
    }

    fn down(key: Key, mods: ModKeys) -> KeyEvent {
        KeyEvent {
            key,
            mods,
            repeat: false,
            extended: false,
        }
    }

    #[test]
    fn cursor_keys_follow_application_mode() {
        let mut kb = Keyboard::new("");
        let mut t = term();
        assert_eq!(
            kb.key_down(down(Key::Up, ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1b[A".to_vec())
        );
        t.modes.app_cursor_keys = true;
        assert_eq!(
            kb.key_down(down(Key::Up, ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1bOA".to_vec())
        );
        // modifiers force the CSI form
        assert_eq!(
            kb.key_down(down(Key::Up, ModKeys::SHIFT), &t),
            KeyResult::Bytes(b"\x1b[1;2A".to_vec())
        );
    }

    #[test]
    fn vt52_cursor_keys() {
        let mut kb = Keyboard::new("");
        let mut t = term();
        t.vt52_mode = 1;
        assert_eq!(
            kb.key_down(down(Key::Left, ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1bD".to_vec())
        );
    }

    #[test]
    fn ctrl_letter_folds() {
        let mut kb = Keyboard::new("");
        let t = term();
        assert_eq!(
            kb.key_down(down(Key::Char('c'), ModKeys::CTRL), &t),
            KeyResult::Bytes(vec![0x03])
        );
        assert_eq!(
            kb.key_down(down(Key::Char('c'), ModKeys::CTRL | ModKeys::ALT), &t),
            KeyResult::Bytes(vec![0x1B, 0x03])
        );
    }

    #[test]
    fn modify_other_keys_level2() {
        let mut kb = Keyboard::new("");
        let mut t = term();
        t.modes.modify_other_keys = 2;
        assert_eq!(
            kb.key_down(down(Key::Char('c'), ModKeys::CTRL), &t),
            KeyResult::Bytes(b"\x1b[27;5;99~".to_vec())
        );
        t.cfg.format_other_keys = true;
        assert_eq!(
            kb.key_down(down(Key::Char('c'), ModKeys::CTRL), &t),
            KeyResult::Bytes(b"\x1b[99;5u".to_vec())
        );
    }

    #[test]
    fn application_keypad() {
        let mut kb = Keyboard::new("");
        let mut t = term();
        assert_eq!(
            kb.key_down(down(Key::Kp(5), ModKeys::empty()), &t),
            KeyResult::Bytes(b"5".to_vec())
        );
        t.modes.app_keypad = true;
        assert_eq!(
            kb.key_down(down(Key::Kp(5), ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1bOu".to_vec())
        );
        assert_eq!(
            kb.key_down(down(Key::KpEnter, ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1bOM".to_vec())
        );
    }

    #[test]
    fn backspace_configuration() {
        let mut kb = Keyboard::new("");
        let mut t = term();
        assert_eq!(
            kb.key_down(down(Key::Backspace, ModKeys::empty()), &t),
            KeyResult::Bytes(vec![0x08])
        );
        t.modes.backspace_sends_bs = false;
        assert_eq!(
            kb.key_down(down(Key::Backspace, ModKeys::empty()), &t),
            KeyResult::Bytes(vec![0x7F])
        );
        // Ctrl swaps the configured byte
        assert_eq!(
            kb.key_down(down(Key::Backspace, ModKeys::CTRL), &t),
            KeyResult::Bytes(vec![0x08])
        );
    }

    #[test]
    fn function_keys() {
        let mut kb = Keyboard::new("");
        let t = term();
        assert_eq!(
            kb.key_down(down(Key::F(1), ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1bOP".to_vec())
        );
        assert_eq!(
            kb.key_down(down(Key::F(5), ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1b[15~".to_vec())
        );
        assert_eq!(
            kb.key_down(down(Key::F(12), ModKeys::SHIFT), &t),
            KeyResult::Bytes(b"\x1b[24;2~".to_vec())
        );
    }

    #[test]
    fn user_bindings() {
        let mut kb = Keyboard::new(
            "Ctrl+F1:\"hello\";F2:^X;Shift+F3:`ls -l`;F4:17;Alt+F5:toggle-fullscreen",
        );
        let t = term();
        assert_eq!(
            kb.key_down(down(Key::F(1), ModKeys::CTRL), &t),
            KeyResult::Bytes(b"hello".to_vec())
        );
        assert_eq!(
            kb.key_down(down(Key::F(2), ModKeys::empty()), &t),
            KeyResult::Bytes(vec![0x18])
        );
        assert_eq!(
            kb.key_down(down(Key::F(3), ModKeys::SHIFT), &t),
            KeyResult::ShellCommand("ls -l".into())
        );
        assert_eq!(
            kb.key_down(down(Key::F(4), ModKeys::empty()), &t),
            KeyResult::Bytes(b"\x1b[17~".to_vec())
        );
        assert_eq!(
            kb.key_down(down(Key::F(5), ModKeys::ALT), &t),
            KeyResult::Function("toggle-fullscreen".into())
        );
    }

    #[test]
    fn compose_sequences() {
        let mut kb = Keyboard::new("");
        let t = term();
        assert_eq!(
            kb.key_down(down(Key::Compose, ModKeys::empty()), &t),
            KeyResult::Nothing
        );
        assert_eq!(
            kb.key_down(down(Key::Char('\''), ModKeys::empty()), &t),
            KeyResult::Nothing
        );
        assert_eq!(
            kb.key_down(down(Key::Char('e'), ModKeys::empty()), &t),
            KeyResult::Bytes("é".as_bytes().to_vec())
        );
        // unmatched sequences flush literally
        kb.key_down(down(Key::Compose, ModKeys::empty()), &t);
        assert_eq!(
            kb.key_down(down(Key::Char('q'), ModKeys::empty()), &t),
            KeyResult::Bytes(b"q".to_vec())
        );
    }

    #[test]
    fn alt_numpad_codes() {
        let mut kb = Keyboard::new("");
        let t = term();
        // decimal: Alt+1 6 9 -> © (U+00A9 = 169)
        assert_eq!(
            kb.key_down(down(Key::Kp(1), ModKeys::ALT), &t),
            KeyResult::Nothing
        );
        kb.key_down(down(Key::Kp(6), ModKeys::ALT), &t);
        kb.key_down(down(Key::Kp(9), ModKeys::ALT), &t);
        assert_eq!(
            kb.key_down(down(Key::AltRelease, ModKeys::empty()), &t),
            KeyResult::Bytes("©".as_bytes().to_vec())
        );
        // hex: Alt+x 2 6 4 2 -> U+2642
        kb.key_down(down(Key::Char('x'), ModKeys::ALT), &t);
        kb.key_down(down(Key::Kp(2), ModKeys::ALT), &t);
        kb.key_down(down(Key::Kp(6), ModKeys::ALT), &t);
        kb.key_down(down(Key::Kp(4), ModKeys::ALT), &t);
        kb.key_down(down(Key::Kp(2), ModKeys::ALT), &t);
        assert_eq!(
            kb.key_down(down(Key::AltRelease, ModKeys::empty()), &t),
            KeyResult::Bytes("\u{2642}".as_bytes().to_vec())
        );
    }

    #[test]
    fn newline_mode_enter() {
        let mut kb = Keyboard::new("");
        let mut t = term();
        assert_eq!(
            kb.key_down(down(Key::Enter, ModKeys::empty()), &t),
            KeyResult::Bytes(b"\r".to_vec())
        );
        t.modes.newline_mode = true;
        assert_eq!(
            kb.key_down(down(Key::Enter, ModKeys::empty()), &t),
            KeyResult::Bytes(b"\r\n".to_vec())
        );
    }
}
