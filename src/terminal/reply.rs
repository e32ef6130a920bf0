//! Output encoder: canned reply sequences and their level selection.
//! Replies built here are queued through `TerminalState::respond`.

/// Primary DA replies per emulated conformance level. The feature list
/// covers: 132 columns, printer, sixels, selective erase, NRCS,
/// technical set, horizontal scrolling (VT400+), color text,
/// rectangular editing (VT400+), text locator.
pub fn primary_da(vt_level: u16) -> &'static str {
    match vt_level {
        100 => "\x1b[?1;2c",
        200 => "\x1b[?62;1;2;4;6;9;15;22;29c",
        300 => "\x1b[?63;1;2;4;6;9;15;22;29c",
        500 => "\x1b[?65;1;2;4;6;9;15;21;22;28;29c",
        _ => "\x1b[?64;1;2;4;6;9;15;21;22;28;29c",
    }
}

/// Secondary DA: vendor id, firmware version, keyboard option.
pub const SECONDARY_DA: &str = "\x1b[>0;10;0c";

/// Tertiary DA (DECRPTUI): all-zero unit id.
pub const TERTIARY_DA: &str = "\x1bP!|00000000\x1b\\";

/// XTVERSION reply body.
pub fn version_report() -> String {
    format!(
        "\x1bP>|{} {}\x1b\\",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

/// DECRPM reply for a mode request.
pub fn decrpm(private: bool, mode: u32, value: u8) -> String {
    format!(
        "\x1b[{}{};{}$y",
        if private { "?" } else { "" },
        mode,
        value
    )
}

/// Cursor position report, 1-based, already origin-adjusted by the
/// caller.
pub fn cpr(extended: bool, row: u16, col: u16) -> String {
    if extended {
        format!("\x1b[?{};{}R", row, col)
    } else {
        format!("\x1b[{};{}R", row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn da_levels() {
        assert_eq!(primary_da(100), "\x1b[?1;2c");
        assert!(primary_da(400).starts_with("\x1b[?64"));
        assert!(primary_da(500).starts_with("\x1b[?65"));
    }

    #[test]
    fn decrpm_forms() {
        assert_eq!(decrpm(true, 2026, 1), "\x1b[?2026;1$y");
        assert_eq!(decrpm(false, 4, 2), "\x1b[4;2$y");
    }
}
