//! Screen operations: cursor motion with margin clipping, erase and
//! scroll primitives, screen switching, resize, and the VT420
//! rectangular operations.

use super::cell::{Attr, AttrFlags, Cell, UCSWIDE};
use super::event::TermEvent;
use super::grid::{Grid, Row, RowFlags};
use super::state::TerminalState;

impl TerminalState {
    /// Move the cursor, clipping at boundaries. `marg_clip` is 0 not to
    /// clip at the scroll margins, 1 to disallow passing them, and 2 to
    /// disallow even being outside them.
    pub(crate) fn move_to(&mut self, x: i32, y: i32, marg_clip: u8) {
        let mut x = x;
        let mut y = y;
        if marg_clip != 0 {
            if (self.cursor.row >= self.marg_top || marg_clip == 2) && y < self.marg_top as i32 {
                y = self.marg_top as i32;
            }
            if (self.cursor.row <= self.marg_bot || marg_clip == 2) && y > self.marg_bot as i32 {
                y = self.marg_bot as i32;
            }
            if (self.cursor.col >= self.marg_left || marg_clip == 2) && x < self.marg_left as i32 {
                x = self.marg_left as i32;
            }
            if (self.cursor.col <= self.marg_right || marg_clip == 2) && x > self.marg_right as i32
            {
                x = self.marg_right as i32;
            }
        }
        self.cursor.col = x.clamp(0, self.cols as i32 - 1) as u16;
        self.cursor.row = y.clamp(0, self.rows as i32 - 1) as u16;
        self.cursor.wrapnext = false;
    }

    /// DECSC: capture the cursor and its charset/attribute state.
    pub(crate) fn save_cursor(&mut self) {
        self.saved_cursors[self.on_alt_screen as usize] = self.cursor.clone();
    }

    /// DECRC: restore the saved cursor, clamped to the current grid.
    pub(crate) fn restore_cursor(&mut self) {
        self.cursor = self.saved_cursors[self.on_alt_screen as usize].clone();
        self.update_erase_attr();

        if self.cursor.col >= self.cols {
            self.cursor.col = self.cols - 1;
        }
        if self.cursor.row >= self.rows {
            self.cursor.row = self.rows - 1;
        }
        // in origin mode the position must lie within the margins
        if self.cursor.origin {
            self.cursor.col = self.cursor.col.clamp(self.marg_left, self.marg_right);
            self.cursor.row = self.cursor.row.clamp(self.marg_top, self.marg_bot);
        }
        // wrapnext only survives at the right edge
        if self.cursor.wrapnext
            && self.cursor.col < self.cols - 1
            && self.cursor.col != self.marg_right
        {
            self.cursor.wrapnext = false;
        }
    }

    pub(crate) fn write_return(&mut self) {
        self.cursor.wrapnext = false;
        if self.cursor.col < self.marg_left {
            self.cursor.col = 0;
        } else {
            self.cursor.col = self.marg_left;
        }
    }

    pub(crate) fn write_linefeed(&mut self) {
        if self.cursor.col < self.marg_left || self.cursor.col > self.marg_right {
            return;
        }
        // the cursor leaving this row ends any wrapped paragraph below it
        if self.cursor.row == self.marg_bot {
            self.do_scroll(self.marg_top, self.marg_bot, 1, true);
        } else if self.cursor.row < self.rows - 1 {
            self.cursor.row += 1;
        }
        self.cursor.wrapnext = false;
    }

    pub(crate) fn write_backspace(&mut self) {
        let curs = &self.cursor;
        if curs.col == self.marg_left
            && curs.row == self.marg_top
            && self.modes.rev_wrap
            && !self.cfg.old_wrapmodes
        {
            // reverse-wrap around the top margin
            self.cursor.row = self.marg_bot;
            self.cursor.col = self.marg_right;
        } else if curs.col == 0
            && (curs.row == self.marg_top
                || !self.modes.autowrap
                || (!self.cfg.old_wrapmodes && !self.modes.rev_wrap))
        {
            // stuck
        } else if curs.col == self.marg_left && curs.row > self.marg_top {
            self.cursor.row -= 1;
            self.cursor.col = self.marg_right;
        } else if curs.wrapnext {
            self.cursor.wrapnext = false;
            if !self.modes.rev_wrap && !self.cfg.old_wrapmodes {
                self.cursor.col -= 1;
            }
        } else if curs.col > 0 && curs.col != self.marg_left {
            self.cursor.col -= 1;
        }
    }

    pub(crate) fn write_tab(&mut self) {
        loop {
            if self.cursor.col == self.marg_right {
                break;
            }
            self.cursor.col += 1;
            if self.cursor.col as usize >= self.cols as usize - 1 {
                break;
            }
            if self.tabs.get(self.cursor.col as usize) == Some(&true) {
                break;
            }
        }
        let y = self.cursor.row;
        let double = self.agrid().row(y).flags.is_double_width();
        let limit = if double { self.cols / 2 } else { self.cols };
        if self.cursor.col >= limit {
            self.cursor.col = limit - 1;
        }
    }

    // ---- erase and scroll ---------------------------------------------------

    pub(crate) fn blank_row(&self) -> Row {
        let mut row = Row::new(self.cols);
        let bg = self.erase_attr.bg;
        row.erase_with_bg(bg);
        row
    }

    /// Split a wide character crossing column `x` (both halves become
    /// blanks keeping the left half's attributes).
    pub(crate) fn check_boundary(&mut self, x: u16, y: u16) {
        let x = x as usize;
        let row = self.agrid_mut().row_mut(y);
        if x == 0 || x >= row.cells.len() {
            return;
        }
        if row.cells[x].ch == UCSWIDE {
            row.clear_cc(x - 1);
            row.clear_cc(x);
            row.cells[x - 1].ch = ' ';
            row.cells[x] = row.cells[x - 1];
        }
    }

    /// ED/EL core. `line_only` restricts to the cursor line; `from_begin`
    /// and `to_end` select the region relative to the cursor; selective
    /// erase skips PROTECTED cells.
    pub(crate) fn erase(
        &mut self,
        selective: bool,
        line_only: bool,
        from_begin: bool,
        to_end: bool,
    ) {
        let (crow, ccol) = (self.cursor.row, self.cursor.col.min(self.cols - 1));
        let (rows, cols) = (self.rows, self.cols);
        let erase = self.erase_cell();

        let (start, end) = if line_only {
            (
                if from_begin { (crow, 0) } else { (crow, ccol) },
                if to_end { (crow, cols) } else { (crow, ccol + 1) },
            )
        } else {
            (
                if from_begin { (0, 0) } else { (crow, ccol) },
                if to_end { (rows - 1, cols) } else { (crow, ccol + 1) },
            )
        };

        if !from_begin {
            self.check_boundary(start.1, start.0);
        }
        if !to_end {
            self.check_boundary(end.1, end.0);
        }

        let grid = self.agrid_mut();
        for y in start.0..=end.0 {
            let x0 = if y == start.0 { start.1 } else { 0 };
            let x1 = if y == end.0 { end.1 } else { cols };
            let row = grid.row_mut(y);
            if x0 == 0 && x1 == cols && !selective {
                // full row: drop size flags too
                row.flags -= RowFlags::SIZE_MASK;
            }
            for x in x0..x1 {
                let xi = x as usize;
                if selective && row.cells[xi].attr.flags.contains(AttrFlags::PROTECTED) {
                    continue;
                }
                row.clear_cc(xi);
                row.cells[xi] = erase;
            }
        }
    }

    /// Scroll the region `top..=bot` by `lines` (positive scrolls up,
    /// negative down). With `save` set, lines leaving a top-of-screen
    /// region on the primary screen enter the scrollback.
    pub(crate) fn do_scroll(&mut self, top: u16, bot: u16, lines: i32, save: bool) {
        if lines == 0 || top > bot {
            return;
        }
        if self.marg_left > 0 || self.marg_right < self.cols - 1 {
            self.scroll_rect(top, bot, lines);
            return;
        }
        let count = lines.unsigned_abs().min((bot - top + 1) as u32) as usize;
        let up = lines > 0;
        let keep = save && !self.on_alt_screen && top == 0;

        for _ in 0..count {
            if up {
                let row = self.agrid_mut().lines.remove(top as usize);
                if keep {
                    self.scrollback.push(&row);
                    self.virtuallines += 1;
                }
                let blank = self.blank_row();
                self.agrid_mut().lines.insert(bot as usize, blank);
            } else {
                self.agrid_mut().lines.remove(bot as usize);
                let blank = self.blank_row();
                self.agrid_mut().lines.insert(top as usize, blank);
            }
        }
        // the row above a removed top no longer continues a paragraph
        if up {
            let grid = self.agrid_mut();
            grid.row_mut(top).flags -= RowFlags::WRAPCONTD;
        }
        let grid = self.agrid_mut();
        for y in top..=bot {
            grid.row_mut(y).dirty = true;
        }
        if keep {
            let min_line = self.virtuallines - self.scrollback.len() as i64;
            self.images.expire_above(min_line);
        }
    }

    /// Region scroll honoring left/right margins: segment moves within
    /// each affected row.
    fn scroll_rect(&mut self, top: u16, bot: u16, lines: i32) {
        let (left, right) = (self.marg_left as usize, self.marg_right as usize);
        let count = lines.unsigned_abs().min((bot - top + 1) as u32) as u16;
        let erase = self.erase_cell();
        let up = lines > 0;
        let grid = self.agrid_mut();

        let copy_row = |grid: &mut Grid, from: u16, to: u16| {
            for x in left..=right {
                let group = grid.row_mut(from).take_group(x);
                grid.row_mut(to).put_group(x, group);
            }
        };

        if up {
            for y in top..=bot {
                let src = y + count;
                if src <= bot {
                    copy_row(grid, src, y);
                } else {
                    let row = grid.row_mut(y);
                    for x in left..=right {
                        row.clear_cc(x);
                        row.cells[x] = erase;
                    }
                }
            }
        } else {
            for y in (top..=bot).rev() {
                if y >= top + count {
                    let src = y - count;
                    copy_row(grid, src, y);
                } else {
                    let row = grid.row_mut(y);
                    for x in left..=right {
                        row.clear_cc(x);
                        row.cells[x] = erase;
                    }
                }
            }
        }
    }

    /// Insert (n > 0) or delete (n < 0) characters at the cursor within
    /// the horizontal margins.
    pub(crate) fn insert_char(&mut self, n: i32) {
        if self.cursor.col < self.marg_left || self.cursor.col > self.marg_right {
            return;
        }
        let del = n < 0;
        let mut n = n.unsigned_abs() as usize;
        let x = self.cursor.col as usize;
        let y = self.cursor.row;
        let cols = (self.marg_right + 1) as usize;
        if n > cols - x {
            n = cols - x;
        }
        let m = cols - x - n;
        let erase = self.erase_cell();

        self.check_boundary(self.cursor.col, y);
        self.check_boundary((x + m) as u16, y);

        let grid = self.agrid_mut();
        let row = grid.row_mut(y);
        if del {
            for j in 0..m {
                let group = row.take_group(x + j + n);
                row.put_group(x + j, group);
            }
            for j in 0..n {
                row.clear_cc(x + m + j);
                row.cells[x + m + j] = erase;
            }
        } else {
            for j in (0..m).rev() {
                let group = row.take_group(x + j);
                row.put_group(x + j + n, group);
            }
            for j in 0..n {
                row.clear_cc(x + j);
                row.cells[x + j] = erase;
            }
        }
    }

    /// DECIC/DECDC and SL/SR: insert or delete columns within the
    /// margins.
    pub(crate) fn insdel_column(&mut self, col: u16, del: bool, n: u32) {
        let left = col as usize;
        let right = self.marg_right as usize;
        if left > right {
            return;
        }
        let n = (n as usize).min(right - left + 1);
        if n == 0 {
            return;
        }
        let erase = self.erase_cell();
        let (top, bot) = (self.marg_top, self.marg_bot);
        let grid = self.agrid_mut();
        for y in top..=bot {
            let row = grid.row_mut(y);
            if del {
                for x in left..(right + 1 - n) {
                    let group = row.take_group(x + n);
                    row.put_group(x, group);
                }
                for x in (right + 1 - n)..=right {
                    row.clear_cc(x);
                    row.cells[x] = erase;
                }
            } else {
                for x in (left..(right + 1 - n)).rev() {
                    let group = row.take_group(x);
                    row.put_group(x + n, group);
                }
                for x in left..left + n {
                    row.clear_cc(x);
                    row.cells[x] = erase;
                }
            }
        }
    }

    // ---- screen switching and resize ---------------------------------------

    /// Switch between primary and alternate screen. With `clear`, the
    /// alternate screen is blanked on entry.
    pub(crate) fn switch_screen(&mut self, alt: bool, clear: bool) {
        if alt == self.on_alt_screen {
            return;
        }
        self.on_alt_screen = alt;
        if alt {
            if clear {
                self.alt_grid = Grid::new(self.rows, self.cols);
            }
            self.event(TermEvent::AltScreenEntered);
        } else {
            self.event(TermEvent::AltScreenExited);
        }
        self.agrid_mut().mark_all_dirty();
    }

    /// Resize both screens in place. On the primary screen, rows pushed
    /// out at the top enter the scrollback and rows gained at the top
    /// are pulled back from it.
    pub fn resize(&mut self, rows: u16, cols: u16) {
        let rows = rows.max(1);
        let cols = cols.max(2);
        if rows == self.rows && cols == self.cols {
            return;
        }

        // primary screen: evict shrink overflow into the scrollback and
        // pull rows back out when growing
        for row in &mut self.grid.lines {
            row.resize(cols);
        }
        while self.grid.lines.len() > rows as usize {
            let row = self.grid.lines.remove(0);
            self.scrollback.push(&row);
            self.virtuallines += 1;
        }
        while self.grid.lines.len() < rows as usize {
            match self.scrollback.pop_newest() {
                Some(packed) => {
                    let mut row = packed.unpack(cols);
                    row.resize(cols);
                    self.grid.lines.insert(0, row);
                    self.virtuallines -= 1;
                }
                None => self.grid.lines.push(Row::new(cols)),
            }
        }
        self.grid.rows = rows;
        self.grid.cols = cols;
        self.grid.mark_all_dirty();

        self.alt_grid.resize_no_scrollback(rows, cols);

        self.rows = rows;
        self.cols = cols;
        self.marg_top = 0;
        self.marg_bot = rows - 1;
        self.marg_left = 0;
        self.marg_right = cols - 1;
        self.disptop = 0;

        let mut tabs = vec![false; cols as usize];
        for i in (0..cols as usize).step_by(8) {
            tabs[i] = true;
        }
        self.tabs = tabs;

        self.cursor.row = self.cursor.row.min(rows - 1);
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.cursor.wrapnext = false;
        for saved in &mut self.saved_cursors {
            saved.row = saved.row.min(rows - 1);
            saved.col = saved.col.min(cols - 1);
        }
        self.sel.selected = false;
    }

    pub(crate) fn clear_scrollback(&mut self) {
        self.scrollback.clear();
        self.disptop = 0;
        let min_line = self.virtuallines;
        self.images.expire_above(min_line);
        self.event(TermEvent::ScrollbackCleared);
    }

    /// Adjust the scroll view. `delta` in lines, negative towards the
    /// scrollback; 0 snaps back to the live screen.
    pub fn scroll_view(&mut self, delta: i32) {
        if delta == 0 {
            self.disptop = 0;
        } else {
            let min = -(self.scrollback.len() as i32);
            self.disptop = (self.disptop + delta).clamp(min, 0);
        }
        self.agrid_mut().mark_all_dirty();
    }

    // ---- rectangular operations --------------------------------------------

    /// Normalize 1-based protocol rectangle coordinates: apply defaults
    /// and origin mode, clamp to the screen, 0-based result.
    pub(crate) fn rect_coords(
        &self,
        y0: u32,
        x0: u32,
        y1: u32,
        x1: u32,
    ) -> Option<(u16, u16, u16, u16)> {
        let mut y0 = y0.min(65535) as i32 - 1;
        let mut x0 = x0.min(65535) as i32 - 1;
        let mut y1 = y1.min(65535) as i32 - 1;
        let mut x1 = x1.min(65535) as i32 - 1;
        if self.cursor.origin {
            y0 += self.marg_top as i32;
            x0 += self.marg_left as i32;
            y1 += self.marg_top as i32;
            x1 += self.marg_left as i32;
        }
        let y0 = y0.clamp(0, self.rows as i32 - 1) as u16;
        let x0 = x0.clamp(0, self.cols as i32 - 1) as u16;
        let y1 = y1.clamp(0, self.rows as i32 - 1) as u16;
        let x1 = x1.clamp(0, self.cols as i32 - 1) as u16;
        if y0 > y1 || x0 > x1 {
            return None;
        }
        Some((y0, x0, y1, x1))
    }

    /// DECFRA/DECERA/DECSERA: fill a rectangle with `chr` in `attr`.
    pub(crate) fn fill_rect(
        &mut self,
        chr: char,
        attr: Attr,
        selective: bool,
        y0: u32,
        x0: u32,
        y1: u32,
        x1: u32,
    ) {
        let Some((y0, x0, y1, x1)) = self.rect_coords(y0, x0, y1, x1) else {
            return;
        };
        let width = self.char_width(chr);
        if chr == UCSWIDE || width < 1 {
            return;
        }
        let mut attr = attr;
        if width > 1 {
            // squeeze a wide fill char into single cells
            attr.flags |= AttrFlags::CLEAR | AttrFlags::NARROW;
        }
        for y in y0..=y1 {
            self.check_boundary(x0, y);
            self.check_boundary(x1 + 1, y);
            let grid = self.agrid_mut();
            let row = grid.row_mut(y);
            for x in x0 as usize..=x1 as usize {
                if selective && row.cells[x].attr.flags.contains(AttrFlags::PROTECTED) {
                    continue;
                }
                row.clear_cc(x);
                row.cells[x] = Cell::new(chr, attr);
            }
        }
    }

    /// DECCRA: copy a rectangle; overlapping areas copy correctly.
    pub(crate) fn copy_rect(&mut self, y0: u32, x0: u32, y1: u32, x1: u32, y2: u32, x2: u32) {
        let Some((y0, x0, mut y1, mut x1)) = self.rect_coords(y0, x0, y1, x1) else {
            return;
        };
        let mut y2 = y2.min(65535) as i32 - 1;
        let mut x2 = x2.min(65535) as i32 - 1;
        if self.cursor.origin {
            y2 += self.marg_top as i32;
            x2 += self.marg_left as i32;
        }
        let y2 = y2.clamp(0, self.rows as i32 - 1) as u16;
        let x2 = x2.clamp(0, self.cols as i32 - 1) as u16;
        if y2 as u32 + (y1 - y0) as u32 >= self.rows as u32 {
            y1 = y0 + (self.rows - 1 - y2);
        }
        if x2 as u32 + (x1 - x0) as u32 >= self.cols as u32 {
            x1 = x0 + (self.cols - 1 - x2);
        }

        let down = y2 > y0;
        let right = x2 > x0;
        let ys: Vec<u16> = if down {
            (y0..=y1).rev().collect()
        } else {
            (y0..=y1).collect()
        };
        for y in ys {
            let dy = y + y2 - y0;
            self.check_boundary(x2, dy);
            self.check_boundary(x2 + (x1 - x0) + 1, dy);
            let xs: Vec<u16> = if right {
                (x0..=x1).rev().collect()
            } else {
                (x0..=x1).collect()
            };
            for x in xs {
                let dx = x + x2 - x0;
                let copy = {
                    let grid = self.agrid_mut();
                    let group = grid.row_mut(y).take_group(x as usize);
                    let copy = super::grid::CellGroup {
                        base: group.base,
                        combining: group.combining.clone(),
                    };
                    grid.row_mut(y).put_group(x as usize, group);
                    copy
                };
                // wide chars cut at the copy borders degrade to blanks
                let cut = (x == x0 && copy.base.ch == UCSWIDE)
                    || (x == x1 && self.char_width(copy.base.ch) > 1);
                let grid = self.agrid_mut();
                if cut {
                    let mut blank = copy.base;
                    blank.ch = ' ';
                    grid.row_mut(dy).put_group(
                        dx as usize,
                        super::grid::CellGroup {
                            base: blank,
                            combining: Vec::new(),
                        },
                    );
                } else {
                    grid.row_mut(dy).put_group(dx as usize, copy);
                }
            }
        }
    }

    /// DECCARA/DECRARA: change or toggle attributes in an area. With
    /// DECSACE off, rows between the corners span the full margins
    /// ("stream" extent).
    pub(crate) fn attr_rect_op(
        &mut self,
        add: AttrFlags,
        sub: AttrFlags,
        xor: AttrFlags,
        under_on: Option<bool>,
        y0: u32,
        x0: u32,
        y1: u32,
        x1: u32,
    ) {
        let Some((y0, x0, y1, x1)) = self.rect_coords(y0, x0, y1, x1) else {
            return;
        };
        let rect = self.attr_rect_mode;
        let (ml, mr) = (self.marg_left, self.marg_right);
        for y in y0..=y1 {
            let mut xl = x0;
            let mut xr = x1;
            if !rect {
                if y != y0 {
                    xl = ml;
                }
                if y != y1 {
                    xr = mr;
                }
            }
            self.check_boundary(xl, y);
            self.check_boundary(xr + 1, y);
            let grid = self.agrid_mut();
            let row = grid.row_mut(y);
            for x in xl as usize..=xr as usize {
                let cell = &mut row.cells[x];
                cell.attr.flags ^= xor;
                cell.attr.flags -= sub;
                cell.attr.flags |= add;
                match under_on {
                    Some(true) => cell.attr.underline = super::cell::Underline::Single,
                    Some(false) => cell.attr.underline = super::cell::Underline::None,
                    None => {}
                }
            }
        }
    }

    /// DECRARA underline reversal needs the underline enum toggled per
    /// cell.
    pub(crate) fn reverse_underline_rect(&mut self, y0: u32, x0: u32, y1: u32, x1: u32) {
        let Some((y0, x0, y1, x1)) = self.rect_coords(y0, x0, y1, x1) else {
            return;
        };
        let rect = self.attr_rect_mode;
        let (ml, mr) = (self.marg_left, self.marg_right);
        for y in y0..=y1 {
            let mut xl = x0;
            let mut xr = x1;
            if !rect {
                if y != y0 {
                    xl = ml;
                }
                if y != y1 {
                    xr = mr;
                }
            }
            let grid = self.agrid_mut();
            let row = grid.row_mut(y);
            for x in xl as usize..=xr as usize {
                let under = &mut row.cells[x].attr.underline;
                *under = if *under == super::cell::Underline::None {
                    super::cell::Underline::Single
                } else {
                    super::cell::Underline::None
                };
            }
        }
    }

    /// DECRQCRA: 16-bit additive checksum over a rectangle. Sums base
    /// codepoints and combining chains (combiners masked to 8 bits) plus
    /// the attribute weights.
    pub(crate) fn sum_rect(&self, y0: u32, x0: u32, y1: u32, x1: u32) -> u32 {
        let Some((y0, x0, y1, x1)) = self.rect_coords(y0, x0, y1, x1) else {
            return 0;
        };
        let grid = self.agrid();
        let mut sum: u32 = 0;
        for y in y0..=y1 {
            let row = grid.row(y);
            for x in x0 as usize..=x1 as usize {
                let cell = &row.cells[x];
                if cell.ch == UCSWIDE {
                    continue;
                }
                sum = sum.wrapping_add(cell.ch as u32);
                sum = sum.wrapping_add(cell.attr.checksum_weight());
                for (cc, _) in row.combining(x) {
                    sum = sum.wrapping_add(cc as u32 & 0xFF);
                }
            }
        }
        sum
    }
}
