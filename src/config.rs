use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Font selection handed to the host rasterizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    pub name: String,
    pub size: f32,
    pub weight: u16,
    pub isbold: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            name: "monospace".to_string(),
            size: 12.0,
            weight: 400,
            isbold: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Terminal core configuration. The host validates ranges before handing
/// the struct over; the core assumes every value is within its
/// documented range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rows: u16,
    pub cols: u16,
    pub scrollback_lines: usize,
    /// Terminal name reported via TERM and used to pick the DA level
    /// (e.g. "xterm-256color", "vt340").
    pub term: String,
    /// ENQ answerback string.
    pub answerback: String,
    pub font: FontConfig,
    pub bold_as_colour: bool,
    pub bold_as_font: bool,
    pub font_smoothing: u8,
    /// Width policy: 0 locale, 1 unicode, 2 ambiguous-wide,
    /// 10 + n single-cell CJK variants.
    pub charwidth: u8,
    pub locale: String,
    pub charset: String,
    /// Extra word characters for double-click selection.
    pub word_chars: String,
    /// Characters excluded from word selection.
    pub word_chars_excl: String,
    pub click_target_mod: u8,
    pub opening_mod: u8,
    pub opening_clicks: u8,
    pub middle_click_action: String,
    pub right_click_action: String,
    pub copy_on_select: bool,
    pub elastic_mouse: bool,
    pub clicks_target_app: bool,
    pub clicks_place_cursor: bool,
    pub zoom_shortcuts: bool,
    pub zoom_font_with_window: bool,
    pub window_shortcuts: bool,
    pub switch_shortcuts: bool,
    pub clip_shortcuts: bool,
    pub ctrl_shift_shortcuts: bool,
    pub alt_fn_shortcuts: bool,
    pub ctrl_exchange_shift: bool,
    pub enable_remap_ctrls: bool,
    /// xterm formatOtherKeys: false = CSI 27;m;c~, true = CSI c;m u.
    pub format_other_keys: bool,
    #[serde(default = "default_true")]
    pub backspace_sends_bs: bool,
    pub delete_sends_del: bool,
    pub escape_sends_fs: bool,
    pub app_escape_key: bool,
    /// ';'-separated user key bindings (see keyboard module).
    pub key_commands: String,
    pub user_commands: String,
    /// Suppression lists: sequences parsed but dropped before dispatch.
    pub suppress_sgr: String,
    pub suppress_dec: String,
    pub suppress_osc: String,
    pub suppress_win: String,
    pub suppress_wheel: String,
    pub ligatures_support: u8,
    /// 0 off, 1 on, 2 on with directionality autodetection.
    pub bidi: u8,
    pub transparency: u8,
    pub opaque_when_focused: bool,
    /// -1 left, 0 off, 1 right.
    pub scrollbar: i8,
    pub bell_type: u8,
    pub bell_freq: u32,
    pub bell_len: u32,
    pub bell_interval: u32,
    pub bell_file: Vec<String>,
    pub bell_flash_style: u8,
    /// Output throttle in bits per second (0 = unthrottled).
    pub baud: u32,
    pub display_speedup: u8,
    pub tek_glow: u8,
    /// GIN strap option: 0 none, 1 CR, 2 CR+ETX.
    pub tek_strap: u8,
    pub progress_bar: u8,
    pub handle_dpichanged: bool,
    pub conpty_support: bool,
    pub allow_set_selection: bool,
    pub old_wrapmodes: bool,
    pub old_modify_keys: u8,
    pub old_keyfuncs_keypad: bool,
    pub old_xbuttons: bool,
    pub old_altgr_detection: bool,
    pub old_locale: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            scrollback_lines: 10_000,
            term: "xterm-256color".to_string(),
            answerback: String::new(),
            font: FontConfig::default(),
            bold_as_colour: true,
            bold_as_font: true,
            font_smoothing: 0,
            charwidth: 0,
            locale: String::new(),
            charset: String::new(),
            word_chars: String::new(),
            word_chars_excl: String::new(),
            click_target_mod: 0,
            opening_mod: 2,
            opening_clicks: 1,
            middle_click_action: "paste".to_string(),
            right_click_action: "menu".to_string(),
            copy_on_select: true,
            elastic_mouse: false,
            clicks_target_app: true,
            clicks_place_cursor: false,
            zoom_shortcuts: true,
            zoom_font_with_window: true,
            window_shortcuts: true,
            switch_shortcuts: true,
            clip_shortcuts: true,
            ctrl_shift_shortcuts: false,
            alt_fn_shortcuts: true,
            ctrl_exchange_shift: false,
            enable_remap_ctrls: false,
            format_other_keys: false,
            backspace_sends_bs: true,
            delete_sends_del: false,
            escape_sends_fs: false,
            app_escape_key: false,
            key_commands: String::new(),
            user_commands: String::new(),
            suppress_sgr: String::new(),
            suppress_dec: String::new(),
            suppress_osc: String::new(),
            suppress_win: String::new(),
            suppress_wheel: String::new(),
            ligatures_support: 0,
            bidi: 2,
            transparency: 0,
            opaque_when_focused: false,
            scrollbar: 1,
            bell_type: 1,
            bell_freq: 0,
            bell_len: 400,
            bell_interval: 100,
            bell_file: Vec::new(),
            bell_flash_style: 0,
            baud: 0,
            display_speedup: 6,
            tek_glow: 1,
            tek_strap: 0,
            progress_bar: 0,
            handle_dpichanged: true,
            conpty_support: false,
            allow_set_selection: false,
            old_wrapmodes: false,
            old_modify_keys: 0,
            old_keyfuncs_keypad: false,
            old_xbuttons: false,
            old_altgr_detection: false,
            old_locale: false,
        }
    }
}

impl Config {
    /// Load config from the standard config path, falling back to
    /// defaults on any error.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard config path.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The DA level derived from the terminal name: a "vtNNN" name picks
    /// the matching conformance level, anything else reports VT400.
    pub fn vt_level(&self) -> u16 {
        if let Some(idx) = self.term.find("vt") {
            if let Ok(ver) = self.term[idx + 2..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
                .parse::<u16>()
            {
                return match ver {
                    0..=199 => 100,
                    200..=299 => 200,
                    300..=399 => 300,
                    400..=499 => 400,
                    _ => 500,
                };
            }
        }
        400
    }
}

/// Membership test for the comma-separated suppression lists.
pub fn contains(list: &str, value: i64) -> bool {
    list.split(|c| c == ',' || c == ' ')
        .filter(|s| !s.is_empty())
        .any(|s| s.parse::<i64>() == Ok(value))
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("squall")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppression_list_membership() {
        assert!(contains("4, 38,48", 38));
        assert!(contains("4, 38,48", 4));
        assert!(!contains("4, 38,48", 3));
        assert!(!contains("", 0));
    }

    #[test]
    fn vt_level_from_term_name() {
        let mut cfg = Config::default();
        assert_eq!(cfg.vt_level(), 400);
        cfg.term = "vt100".into();
        assert_eq!(cfg.vt_level(), 100);
        cfg.term = "vt220".into();
        assert_eq!(cfg.vt_level(), 200);
        cfg.term = "vt340".into();
        assert_eq!(cfg.vt_level(), 300);
        cfg.term = "vt525".into();
        assert_eq!(cfg.vt_level(), 500);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rows, cfg.rows);
        assert_eq!(back.term, cfg.term);
    }
}
