//! The host boundary. The core owns the screen model and interpreter;
//! everything with a window handle, a pty, or a clipboard lives behind
//! this trait. `pump` drains the core's queued replies and events into
//! host calls after each `write` batch.

use crate::terminal::color::Rgb;
use crate::terminal::event::{TermEvent, WindowOp};
use crate::terminal::state::TerminalState;

/// Host callbacks. Only `child_write` is mandatory; rendering hosts
/// implement the rest as fits their surface.
pub trait Host {
    /// Write reply bytes to the child's input.
    fn child_write(&mut self, data: &[u8]);

    /// Mark a cell rectangle for repaint.
    fn invalidate(&mut self, _y0: u16, _x0: u16, _y1: u16, _x1: u16) {}

    /// Coalesce a paint.
    fn schedule_update(&mut self) {}

    fn set_title(&mut self, _title: &str) {}
    fn set_icon(&mut self, _path: &str, _index: u32) {}
    fn copy_text(&mut self, _text: &str) {}
    fn bell(&mut self) {}

    /// Palette changed; repaint with fresh colors.
    fn colours_changed(&mut self) {}

    fn window_op(&mut self, _op: &WindowOp) {}

    /// Measure a glyph: 0 combining, 1 narrow, 2 wide. Hosts with font
    /// metrics can refine the width tables.
    fn char_width(&self, _ch: char) -> Option<u8> {
        None
    }

    /// Which of the given codepoints have real glyphs.
    fn check_glyphs(&self, chars: &[char]) -> Vec<bool> {
        vec![true; chars.len()]
    }

    fn get_sys_colour(&self, _id: u32) -> Option<Rgb> {
        None
    }

    /// Catch-all for events the host has no dedicated hook for.
    fn event(&mut self, _ev: &TermEvent) {}
}

/// Route queued replies and events to the host. Call after `write`.
pub fn pump<H: Host>(term: &mut TerminalState, host: &mut H) {
    for reply in term.take_pending_responses() {
        host.child_write(&reply);
    }
    for ev in term.take_events() {
        match &ev {
            TermEvent::Bell | TermEvent::MarginBell => host.bell(),
            TermEvent::TitleChanged { title } => host.set_title(title),
            TermEvent::IconChanged { path, index } => host.set_icon(path, *index),
            TermEvent::CopyText { text } => host.copy_text(text),
            TermEvent::PaletteChanged => host.colours_changed(),
            TermEvent::InvalidateAll => {
                let (rows, cols) = (term.rows, term.cols);
                host.invalidate(0, 0, rows - 1, cols - 1);
            }
            TermEvent::Window(op) => host.window_op(op),
            _ => {}
        }
        host.event(&ev);
    }
    if let Some(damage) = term.take_damage() {
        for &y in &damage.rows {
            let cols = term.cols;
            host.invalidate(y, 0, y, cols - 1);
        }
        host.schedule_update();
    }
}

/// A host that records everything; used by tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub written: Vec<u8>,
    pub titles: Vec<String>,
    pub copied: Vec<String>,
    pub bells: usize,
    pub window_ops: Vec<WindowOp>,
    pub events: Vec<TermEvent>,
    pub invalidated: Vec<(u16, u16, u16, u16)>,
    pub updates: usize,
}

impl Host for RecordingHost {
    fn child_write(&mut self, data: &[u8]) {
        self.written.extend_from_slice(data);
    }

    fn invalidate(&mut self, y0: u16, x0: u16, y1: u16, x1: u16) {
        self.invalidated.push((y0, x0, y1, x1));
    }

    fn schedule_update(&mut self) {
        self.updates += 1;
    }

    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn copy_text(&mut self, text: &str) {
        self.copied.push(text.to_string());
    }

    fn bell(&mut self) {
        self.bells += 1;
    }

    fn window_op(&mut self, op: &WindowOp) {
        self.window_ops.push(op.clone());
    }

    fn event(&mut self, ev: &TermEvent) {
        self.events.push(ev.clone());
    }
}
