use std::collections::HashMap;

use log::debug;

use crate::{render::Renderer, types::Drawable};

/// Sparse world grid where each cell holds a stack of occupants.
///
/// Only cells that have something in them are stored. The last occupant
/// pushed onto a cell is the one drawn and the first one popped.
/// Coordinates must lie inside `[0, columns) x [0, lines)`; the grid does
/// not check them.
#[derive(Debug)]
pub struct StackGrid<T> {
    columns: u16,
    lines: u16,
    cells: HashMap<(u16, u16), Vec<T>>,
}

impl<T> StackGrid<T> {
    pub fn new(columns: u16, lines: u16) -> Self {
        Self {
            columns,
            lines,
            cells: HashMap::new(),
        }
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn lines(&self) -> u16 {
        self.lines
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.len()
    }

    pub fn push(&mut self, x: u16, y: u16, occupant: T) {
        self.cells.entry((x, y)).or_default().push(occupant);
    }

    pub fn pop(&mut self, x: u16, y: u16) -> Option<T> {
        let stack = self.cells.get_mut(&(x, y))?;
        let top = stack.pop();
        if stack.is_empty() {
            self.cells.remove(&(x, y));
        }
        top
    }

    pub fn peek(&self, x: u16, y: u16) -> Option<&T> {
        self.cells.get(&(x, y)).and_then(|stack| stack.last())
    }

    pub fn for_each_occupied<F>(&self, mut visit: F)
    where
        F: FnMut(u16, u16, &[T]),
    {
        for (&(x, y), stack) in &self.cells {
            visit(x, y, stack);
        }
    }

    /// Changes the extent, dropping every stack that falls outside it.
    pub fn resize(&mut self, columns: u16, lines: u16) {
        self.columns = columns;
        self.lines = lines;
        self.cells.retain(|&(x, y), _| x < columns && y < lines);
    }
}

impl<T: Drawable> StackGrid<T> {
    /// Redraws the whole extent, blanking cells with no occupant.
    pub fn draw_full<R: Renderer>(&self, renderer: &mut R) {
        for y in 0..self.lines {
            for x in 0..self.columns {
                let result = match self.peek(x, y) {
                    Some(top) => renderer.plot_colored(x as i32, y as i32, top.glyph(), top.color()),
                    None => renderer.erase(x as i32, y as i32),
                };
                if let Err(err) = result {
                    debug!("grid cell ({x}, {y}) not drawn: {err}");
                }
            }
        }
    }

    /// Draws the top occupant of every occupied cell.
    pub fn draw_occupied<R: Renderer>(&self, renderer: &mut R) {
        self.for_each_occupied(|x, y, stack| {
            let Some(top) = stack.last() else {
                return;
            };
            if let Err(err) = renderer.plot_colored(x as i32, y as i32, top.glyph(), top.color()) {
                debug!("grid cell ({x}, {y}) not drawn: {err}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::{
        render::FrameBuffer,
        types::{ColorId, Item},
    };

    fn item(glyph: char) -> Item {
        Item::new(glyph, ColorId::Green)
    }

    mod stack_grid_push_pop {
        use super::*;

        #[test]
        fn last_pushed_is_on_top() {
            let mut grid = StackGrid::new(10, 10);
            grid.push(2, 3, item('A'));
            grid.push(2, 3, item('B'));
            assert_eq!(grid.peek(2, 3), Some(&item('B')));
            assert_eq!(grid.pop(2, 3), Some(item('B')));
            assert_eq!(grid.peek(2, 3), Some(&item('A')));
            assert_eq!(grid.pop(2, 3), Some(item('A')));
            assert_eq!(grid.peek(2, 3), None);
        }

        #[test]
        fn pop_on_missing_cell_is_none() {
            let mut grid: StackGrid<Item> = StackGrid::new(4, 4);
            assert_eq!(grid.pop(1, 1), None);
            assert_eq!(grid.peek(1, 1), None);
        }

        #[test]
        fn exhausted_cell_is_removed() {
            let mut grid = StackGrid::new(4, 4);
            grid.push(0, 0, item('A'));
            grid.pop(0, 0);
            assert_eq!(grid.occupied(), 0);
            assert_eq!(grid.pop(0, 0), None);
        }

        #[test]
        fn stacks_have_no_depth_limit() {
            let mut grid = StackGrid::new(2, 2);
            for _ in 0..1_000 {
                grid.push(1, 1, item('x'));
            }
            let mut depth = 0;
            grid.for_each_occupied(|_, _, stack| depth = stack.len());
            assert_eq!(depth, 1_000);
            assert_eq!(grid.occupied(), 1);
        }

        #[test]
        fn peek_does_not_mutate() {
            let mut grid = StackGrid::new(4, 4);
            grid.push(3, 3, item('A'));
            let _ = grid.peek(3, 3);
            let _ = grid.peek(3, 3);
            assert_eq!(grid.pop(3, 3), Some(item('A')));
            assert_eq!(grid.pop(3, 3), None);
        }
    }

    mod stack_grid_for_each_occupied {
        use super::*;

        fn visited(grid: &StackGrid<Item>) -> HashSet<(u16, u16)> {
            let mut out = HashSet::new();
            grid.for_each_occupied(|x, y, stack| {
                assert!(!stack.is_empty());
                out.insert((x, y));
            });
            out
        }

        #[test]
        fn visits_only_occupied_cells() {
            let mut grid = StackGrid::new(10, 10);
            grid.push(1, 1, item('A'));
            grid.push(4, 7, item('B'));
            grid.push(4, 7, item('C'));
            let cells = visited(&grid);
            assert_eq!(cells, HashSet::from([(1, 1), (4, 7)]));
        }

        proptest! {
            #[test]
            fn repeated_traversal_is_stable(cells in prop::collection::vec((0u16..16, 0u16..16), 0..64)) {
                let mut grid = StackGrid::new(16, 16);
                for (x, y) in cells {
                    grid.push(x, y, item('o'));
                }
                prop_assert_eq!(visited(&grid), visited(&grid));
            }
        }
    }

    mod stack_grid_resize {
        use super::*;

        #[test]
        fn drops_cells_outside_new_extent() {
            let mut grid = StackGrid::new(10, 10);
            grid.push(9, 9, item('A'));
            grid.push(1, 1, item('B'));
            grid.resize(5, 5);
            assert_eq!(grid.peek(9, 9), None);
            assert_eq!(grid.peek(1, 1), Some(&item('B')));
        }
    }

    mod stack_grid_draw {
        use super::*;

        #[test]
        fn full_draw_renders_single_occupant() {
            let mut grid = StackGrid::new(10, 10);
            grid.push(5, 5, item('*'));
            let mut frame = FrameBuffer::new(10, 10);
            frame.plot(0, 0, '#').expect("in bounds");
            grid.draw_full(&mut frame);

            let mut drawn = 0;
            for y in 0..10 {
                for x in 0..10 {
                    if frame.get(x, y).ch != ' ' {
                        drawn += 1;
                    }
                }
            }
            assert_eq!(drawn, 1);
            assert_eq!(frame.get(5, 5).ch, '*');
        }

        #[test]
        fn occupied_draw_shows_top_of_stack() {
            let mut grid = StackGrid::new(4, 4);
            grid.push(2, 2, item('a'));
            grid.push(2, 2, Item::new('b', ColorId::Magenta));
            let mut frame = FrameBuffer::new(4, 4);
            grid.draw_occupied(&mut frame);
            assert_eq!(frame.get(2, 2).ch, 'b');
            assert_eq!(frame.get(2, 2).color, Some(ColorId::Magenta));
        }

        #[test]
        fn out_of_bounds_cells_do_not_stop_the_pass() {
            let mut grid = StackGrid::new(8, 8);
            grid.push(7, 7, item('z'));
            grid.push(0, 0, item('a'));
            let mut frame = FrameBuffer::new(4, 4);
            grid.draw_occupied(&mut frame);
            assert_eq!(frame.get(0, 0).ch, 'a');
        }
    }
}
