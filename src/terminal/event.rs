use serde::Serialize;

/// Window operations requested by dtterm `CSI t` and the DEC page-size
/// controls. The host decides whether and how to honor them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op")]
pub enum WindowOp {
    Minimize,
    Restore,
    Raise,
    Lower,
    Refresh,
    Maximize { horizontally: bool, vertically: bool },
    Unmaximize,
    Fullscreen { on: bool },
    SetPixelSize { width: u16, height: u16 },
    SetCharSize { rows: u16, cols: u16 },
    SetPosition { x: i16, y: i16 },
}

/// Events queued for the host alongside render damage. Mirrors the reply
/// queue: the host drains these after each `write()` batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum TermEvent {
    /// BEL received.
    Bell,
    /// Margin bell fired (mode 44).
    MarginBell,
    /// Terminal title changed (OSC 0/2).
    TitleChanged { title: String },
    /// Icon changed (OSC 7773 / OSC I).
    IconChanged { path: String, index: u32 },
    /// OSC 52: text copied to the clipboard.
    CopyText { text: String },
    /// OSC 7: working directory reported by the shell.
    CwdChanged { path: String },
    /// Palette or dynamic colors changed; repaint everything.
    PaletteChanged,
    /// Full-screen repaint required (reverse video toggle, reset, ...).
    InvalidateAll,
    /// Entered the alternate screen.
    AltScreenEntered,
    /// Left the alternate screen.
    AltScreenExited,
    /// Scrollback was erased (CSI 3 J).
    ScrollbackCleared,
    /// Mouse tracking or encoding changed; the host updates capture.
    MouseModeChanged,
    /// OSC 9;4 / CSI %q progress indication.
    Progress { state: u8, percent: i8 },
    /// dtterm window op.
    Window(WindowOp),
    /// OSC 50 or SGR-driven font change request.
    FontChanged { family: u8, name: String },
    /// OSC 7770/7777 font size change. `delta` is relative when
    /// `relative` is set, absolute otherwise.
    FontSize {
        delta: i32,
        relative: bool,
        with_window: bool,
    },
    /// OSC 22: mouse pointer shape.
    PointerShape { name: String },
    /// DECLL keyboard LED.
    Led { led: u8, on: bool },
    /// Media copy output (CSI 5 i .. CSI 4 i) or screen print request.
    Print { data: Vec<u8> },
    /// An image finished decoding and was placed on the grid.
    ImagePlaced { imgi: u32 },
    /// Tek submode entered or left; the host switches paint paths.
    TekModeChanged { active: bool },
    /// Tek display wants a repaint (vector buffer grew or GIN moved).
    TekUpdated,
    /// Tek make-copy request (ETB): the host exports the rendered
    /// vector display to a file.
    TekCopy,
}
