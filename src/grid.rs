use mcstructure_common::{Coordinate, Size};
use std::fmt;

/// Total cell count of `size`, or `None` if it does not fit in a `usize`.
pub fn volume(size: Size) -> Option<usize> {
    size.0.checked_mul(size.1)?.checked_mul(size.2)
}

/// A dense 3-D array stored flat with X outermost and Z varying fastest,
/// which is the order structure files list their cells in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    size: Size,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(size: Size, value: T) -> Self {
        let (x, y, z) = size;
        Grid {
            size,
            cells: vec![value; x * y * z],
        }
    }
}

impl<T: Clone> Grid<T> {
    /// Sets every cell of the inclusive box `min..=max` to `value`.
    pub fn fill_box(&mut self, min: (usize, usize, usize), max: (usize, usize, usize), value: T) {
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                let start = self.linear_index((x, y, min.2));
                let end = self.linear_index((x, y, max.2));
                self.cells[start..=end].fill(value.clone());
            }
        }
    }

    /// Copies the `extent` box at the origin of `source` into `self`, with
    /// its origin placed at `offset`. The box must fit both grids.
    pub fn blit(&mut self, source: &Grid<T>, extent: Size, offset: (usize, usize, usize)) {
        let (ex, ey, ez) = extent;
        if ex == 0 || ey == 0 || ez == 0 {
            return;
        }
        for x in 0..ex {
            for y in 0..ey {
                let src = source.linear_index((x, y, 0));
                let dst = self.linear_index((offset.0 + x, offset.1 + y, offset.2));
                self.cells[dst..dst + ez].clone_from_slice(&source.cells[src..src + ez]);
            }
        }
    }
}

impl<T> Grid<T> {
    /// Builds a grid by evaluating `f` at every position in storage order.
    pub fn from_fn<F: FnMut((usize, usize, usize)) -> T>(size: Size, mut f: F) -> Self {
        let (sx, sy, sz) = size;
        let mut cells = Vec::with_capacity(sx * sy * sz);
        for x in 0..sx {
            for y in 0..sy {
                for z in 0..sz {
                    cells.push(f((x, y, z)));
                }
            }
        }
        Grid { size, cells }
    }

    /// Wraps an already linearized cell list. Hands the cells back if their
    /// count does not match `size`.
    pub fn from_vec(size: Size, cells: Vec<T>) -> Result<Self, Vec<T>> {
        if volume(size) == Some(cells.len()) {
            Ok(Grid { size, cells })
        } else {
            Err(cells)
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn linear_index(&self, (x, y, z): (usize, usize, usize)) -> usize {
        (x * self.size.1 + y) * self.size.2 + z
    }

    /// Flat index of `coordinate`, or `None` when it falls outside the grid.
    pub fn index_of(&self, (x, y, z): Coordinate) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|&x| x < self.size.0)?;
        let y = usize::try_from(y).ok().filter(|&y| y < self.size.1)?;
        let z = usize::try_from(z).ok().filter(|&z| z < self.size.2)?;
        Some(self.linear_index((x, y, z)))
    }

    pub fn get(&self, coordinate: Coordinate) -> Option<&T> {
        self.index_of(coordinate).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, coordinate: Coordinate) -> Option<&mut T> {
        self.index_of(coordinate).map(move |i| &mut self.cells[i])
    }

    pub fn at(&self, position: (usize, usize, usize)) -> &T {
        &self.cells[self.linear_index(position)]
    }

    pub fn at_mut(&mut self, position: (usize, usize, usize)) -> &mut T {
        let index = self.linear_index(position);
        &mut self.cells[index]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.cells.iter_mut()
    }

    /// Every in-bounds position in storage order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize, usize)> {
        let (sx, sy, sz) = self.size;
        (0..sx).flat_map(move |x| (0..sy).flat_map(move |y| (0..sz).map(move |z| (x, y, z))))
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            size: self.size,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    /// The YZ slice at `x`, rows indexed by Y.
    pub fn slice_x(&self, x: usize) -> Vec<&[T]> {
        let (_, sy, sz) = self.size;
        (0..sy)
            .map(|y| {
                let start = self.linear_index((x, y, 0));
                &self.cells[start..start + sz]
            })
            .collect()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }
}

impl<T: fmt::Display> fmt::Display for Grid<T> {
    /// Nested brackets, X outermost: `[[[a, b], [c, d]]]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for x in 0..self.size.0 {
            if x > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (y, row) in self.slice_x(x).into_iter().enumerate() {
                if y > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "[")?;
                for (z, cell) in row.iter().enumerate() {
                    if z > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", cell)?;
                }
                write!(f, "]")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
