//! Terminal emulator core: a byte-at-a-time VT/xterm control sequence
//! interpreter, the screen model it drives (grid, scrollback, alternate
//! screen, selection), a DECSIXEL image decoder, and a Tektronix 4014
//! graphics submode.
//!
//! The core is host-agnostic: bytes come in through
//! [`TerminalState::write`], replies queue up for the child, and render
//! damage plus terminal events queue up for the window layer (see
//! [`host::Host`] and [`host::pump`]).

pub mod config;
pub mod host;
pub mod image;
pub mod keyboard;
pub mod sixel;
pub mod tek;
pub mod terminal;

pub use config::Config;
pub use host::{Host, RecordingHost};
pub use keyboard::{Key, KeyEvent, KeyResult, Keyboard};
pub use terminal::TerminalState;
