use std::collections::VecDeque;

use bitflags::bitflags;

use super::cell::{Attr, Cell, UCSWIDE};
use super::color::Color;

bitflags! {
    /// Per-row attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct RowFlags: u32 {
        /// Line wrapped onto the next one.
        const WRAPPED   = 1 << 0;
        /// Line continues the previous (wrapped) one.
        const WRAPCONTD = 1 << 1;
        /// Wrap skipped the last column because a wide char did not fit.
        const WRAPPED2  = 1 << 2;
        /// DECDWL double-width line.
        const WIDE      = 1 << 3;
        /// DECDHL double-height, top half.
        const TOP       = 1 << 4;
        /// DECDHL double-height, bottom half.
        const BOTTOM    = 1 << 5;
        /// Scroll marker (private mode 7711).
        const MARKED    = 1 << 6;
        const UNMARKED  = 1 << 7;
        /// Progress detection enabled on this row.
        const PROGRESS  = 1 << 8;
        /// Bidi disabled on this row.
        const NOBIDI    = 1 << 9;
        /// Bidi direction explicitly selected (no autodetection).
        const BIDISEL   = 1 << 10;
        /// RTL paragraph direction.
        const BIDIRTL   = 1 << 11;
        /// Mirror box-drawing graphics in RTL context.
        const BOXMIRROR = 1 << 12;
        /// RTL presentation direction (SPD).
        const PRESRTL   = 1 << 13;
    }
}

impl RowFlags {
    /// Line size mode bits (normal when none of these are set).
    pub const SIZE_MASK: RowFlags = RowFlags::WIDE.union(RowFlags::TOP).union(RowFlags::BOTTOM);
    /// Bits carried by the cursor's bidi mode and propagated to rows.
    pub const BIDI_MASK: RowFlags = RowFlags::NOBIDI
        .union(RowFlags::BIDISEL)
        .union(RowFlags::BIDIRTL)
        .union(RowFlags::BOXMIRROR)
        .union(RowFlags::PRESRTL);

    pub fn is_double_width(self) -> bool {
        self.intersects(RowFlags::SIZE_MASK)
    }
}

/// Upper bound on combining cells chained from one base cell.
const CC_CHAIN_MAX: usize = 32;

/// A single row: `cols` base cells, then an overflow region holding
/// combining-character cells linked from their base via `cc_next`.
#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub flags: RowFlags,
    /// Column where the wrap happened, for rewrap and selection.
    pub wrappos: u16,
    pub dirty: bool,
    cols: u16,
}

/// A base cell together with its detached combining chain, used when
/// cells are moved between positions (the chain offsets are only valid
/// in their original storage).
#[derive(Debug, Clone)]
pub struct CellGroup {
    pub base: Cell,
    pub combining: Vec<(char, Attr)>,
}

impl Row {
    pub fn new(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
            flags: RowFlags::empty(),
            wrappos: 0,
            dirty: true,
            cols,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Reset to blank cells, dropping the overflow region.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.cells.resize(self.cols as usize, Cell::default());
        self.flags = RowFlags::empty();
        self.dirty = true;
    }

    /// Erase all base cells using the given background (per ECMA-48).
    pub fn erase_with_bg(&mut self, bg: Color) {
        self.cells.clear();
        self.cells.resize(self.cols as usize, Cell::erased(bg));
        self.dirty = true;
    }

    pub fn resize(&mut self, cols: u16) {
        if cols == self.cols {
            return;
        }
        // Rebuild base cells with their chains re-attached so overflow
        // offsets stay consistent.
        let keep = cols.min(self.cols) as usize;
        let groups: Vec<CellGroup> = (0..keep).map(|x| self.take_group(x)).collect();
        self.cells.clear();
        self.cells.resize(cols as usize, Cell::default());
        self.cols = cols;
        for (x, group) in groups.into_iter().enumerate() {
            self.put_group(x, group);
        }
        self.dirty = true;
    }

    /// Append a combining character to the chain of the base cell at `x`.
    pub fn add_cc(&mut self, x: usize, ch: char, attr: Attr) {
        let mut idx = x;
        let mut hops = 0;
        while self.cells[idx].cc_next != 0 {
            idx += self.cells[idx].cc_next as usize;
            hops += 1;
            if hops >= CC_CHAIN_MAX {
                return;
            }
        }
        let slot = self.cells.len();
        if slot - idx > u16::MAX as usize {
            return;
        }
        self.cells.push(Cell::new(ch, attr));
        self.cells[idx].cc_next = (slot - idx) as u16;
        self.dirty = true;
    }

    /// Detach the combining chain of the base cell at `x`. The overflow
    /// cells become unreachable; they are reclaimed when the row is
    /// cleared or resized.
    pub fn clear_cc(&mut self, x: usize) {
        self.cells[x].cc_next = 0;
    }

    /// Collect the combining characters chained from the base cell at `x`.
    pub fn combining(&self, x: usize) -> Vec<(char, Attr)> {
        let mut out = Vec::new();
        let mut idx = x;
        while self.cells[idx].cc_next != 0 {
            idx += self.cells[idx].cc_next as usize;
            if idx >= self.cells.len() || out.len() >= CC_CHAIN_MAX {
                break;
            }
            out.push((self.cells[idx].ch, self.cells[idx].attr));
        }
        out
    }

    /// Detach the cell at `x` together with its combining chain.
    pub fn take_group(&mut self, x: usize) -> CellGroup {
        let combining = self.combining(x);
        let mut base = self.cells[x];
        base.cc_next = 0;
        self.cells[x].cc_next = 0;
        CellGroup { base, combining }
    }

    /// Install a detached cell group at `x`.
    pub fn put_group(&mut self, x: usize, group: CellGroup) {
        self.clear_cc(x);
        self.cells[x] = group.base;
        for (ch, attr) in group.combining {
            self.add_cc(x, ch, attr);
        }
        self.dirty = true;
    }

    /// The visible text of the row (base chars, skipping wide spacers).
    pub fn text(&self) -> String {
        self.cells[..self.cols as usize]
            .iter()
            .filter(|c| c.ch != UCSWIDE)
            .map(|c| c.ch)
            .collect()
    }
}

/// Compressed form of a row evicted to the scrollback ring. Trailing
/// blank cells are trimmed unless the row carries combining chains.
/// Entries are never mutated after insertion.
#[derive(Debug, Clone)]
pub struct PackedRow {
    cells: Box<[Cell]>,
    flags: RowFlags,
    wrappos: u16,
    cols: u16,
}

impl PackedRow {
    pub fn pack(row: &Row) -> Self {
        let has_chain = row.cells.iter().any(|c| c.cc_next != 0);
        let keep = if has_chain {
            row.cells.len()
        } else {
            let blank = Cell::default();
            let mut keep = row.cells.len().min(row.cols as usize);
            while keep > 0 {
                let c = &row.cells[keep - 1];
                if c.ch == ' ' && (c.attr == blank.attr || c.attr == Attr::erase_with(Color::Default)) {
                    keep -= 1;
                } else {
                    break;
                }
            }
            keep
        };
        Self {
            cells: row.cells[..keep].to_vec().into_boxed_slice(),
            flags: row.flags,
            wrappos: row.wrappos,
            cols: row.cols,
        }
    }

    pub fn unpack(&self, cols: u16) -> Row {
        let mut cells = self.cells.to_vec();
        if cells.len() < self.cols as usize {
            cells.resize(self.cols as usize, Cell::default());
        }
        let mut row = Row {
            cells,
            flags: self.flags,
            wrappos: self.wrappos,
            dirty: true,
            cols: self.cols,
        };
        if cols != self.cols {
            row.resize(cols);
        }
        row
    }

    pub fn flags(&self) -> RowFlags {
        self.flags
    }
}

/// Bounded FIFO of evicted top lines from the primary screen.
#[derive(Debug, Default)]
pub struct Scrollback {
    ring: VecDeque<PackedRow>,
    limit: usize,
}

impl Scrollback {
    pub fn new(limit: usize) -> Self {
        Self {
            ring: VecDeque::new(),
            limit,
        }
    }

    /// Push an evicted row; the oldest entry is dropped when full.
    pub fn push(&mut self, row: &Row) {
        if self.limit == 0 {
            return;
        }
        if self.ring.len() >= self.limit {
            self.ring.pop_front();
        }
        self.ring.push_back(PackedRow::pack(row));
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// Fetch entry `i` counted from the oldest line.
    pub fn get(&self, i: usize) -> Option<&PackedRow> {
        self.ring.get(i)
    }

    /// Pop the newest entry (used when resize grows the visible area).
    pub fn pop_newest(&mut self) -> Option<PackedRow> {
        self.ring.pop_back()
    }
}

/// The visible line buffer of one screen (primary or alternate).
#[derive(Debug)]
pub struct Grid {
    pub lines: Vec<Row>,
    pub cols: u16,
    pub rows: u16,
}

impl Grid {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            lines: (0..rows).map(|_| Row::new(cols)).collect(),
            cols,
            rows,
        }
    }

    pub fn row(&self, y: u16) -> &Row {
        &self.lines[y as usize]
    }

    pub fn row_mut(&mut self, y: u16) -> &mut Row {
        let row = &mut self.lines[y as usize];
        row.dirty = true;
        row
    }

    pub fn mark_all_dirty(&mut self) {
        for row in &mut self.lines {
            row.dirty = true;
        }
    }

    /// Resize without any scrollback interaction: rows are dropped from
    /// the top or added blank at the bottom. The alternate screen is
    /// disposable, full-screen programs repaint after a size change.
    pub fn resize_no_scrollback(&mut self, new_rows: u16, new_cols: u16) {
        for row in &mut self.lines {
            row.resize(new_cols);
        }
        while self.lines.len() > new_rows as usize {
            self.lines.remove(0);
        }
        while self.lines.len() < new_rows as usize {
            self.lines.push(Row::new(new_cols));
        }
        self.rows = new_rows;
        self.cols = new_cols;
        self.mark_all_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combining_chain_round_trip() {
        let mut row = Row::new(10);
        row.cells[3] = Cell::new('a', Attr::default());
        row.add_cc(3, '\u{0301}', Attr::default());
        row.add_cc(3, '\u{0308}', Attr::default());
        let chain = row.combining(3);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].0, '\u{0301}');
        assert_eq!(chain[1].0, '\u{0308}');
        // Chains terminate with cc_next = 0.
        let mut idx = 3;
        let mut hops = 0;
        while row.cells[idx].cc_next != 0 {
            idx += row.cells[idx].cc_next as usize;
            hops += 1;
        }
        assert_eq!(hops, 2);
    }

    #[test]
    fn take_put_group_moves_chain() {
        let mut row = Row::new(10);
        row.cells[0] = Cell::new('e', Attr::default());
        row.add_cc(0, '\u{0301}', Attr::default());
        let group = row.take_group(0);
        assert_eq!(row.combining(0).len(), 0);
        row.put_group(5, group);
        assert_eq!(row.cells[5].ch, 'e');
        assert_eq!(row.combining(5).len(), 1);
    }

    #[test]
    fn resize_preserves_chains() {
        let mut row = Row::new(8);
        row.cells[2] = Cell::new('o', Attr::default());
        row.add_cc(2, '\u{0302}', Attr::default());
        row.resize(20);
        assert_eq!(row.cells[2].ch, 'o');
        assert_eq!(row.combining(2).len(), 1);
        row.resize(3);
        assert_eq!(row.combining(2).len(), 1);
    }

    #[test]
    fn scrollback_ring_bounded() {
        let mut sb = Scrollback::new(3);
        for i in 0..5u16 {
            let mut row = Row::new(4);
            row.cells[0] = Cell::new((b'a' + i as u8) as char, Attr::default());
            sb.push(&row);
        }
        assert_eq!(sb.len(), 3);
        assert_eq!(sb.get(0).unwrap().unpack(4).cells[0].ch, 'c');
        assert_eq!(sb.get(2).unwrap().unpack(4).cells[0].ch, 'e');
    }

    #[test]
    fn packed_row_trims_blanks() {
        let mut row = Row::new(80);
        row.cells[0] = Cell::new('x', Attr::default());
        let packed = PackedRow::pack(&row);
        assert_eq!(packed.cells.len(), 1);
        let back = packed.unpack(80);
        assert_eq!(back.cells.len(), 80);
        assert_eq!(back.cells[0].ch, 'x');
    }

    #[test]
    fn grid_resize_drops_top_rows() {
        let mut grid = Grid::new(4, 10);
        grid.row_mut(0).cells[0] = Cell::new('A', Attr::default());
        grid.row_mut(3).cells[0] = Cell::new('Z', Attr::default());
        grid.resize_no_scrollback(2, 10);
        assert_eq!(grid.rows, 2);
        assert!(grid.row(1).text().starts_with('Z'));
        grid.resize_no_scrollback(4, 6);
        assert_eq!(grid.rows, 4);
        assert_eq!(grid.cols, 6);
    }
}
