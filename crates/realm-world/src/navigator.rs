//! The navigation seam between the simulation core and walkability data.
//!
//! Pathfinding itself is an external collaborator: the core only asks for a
//! path between two grid positions and forwards the walkability grid to
//! clients. [`GridNavigator`] is a small breadth-first implementation over a
//! boolean grid used by tests and the engine binary.

use std::collections::{BTreeMap, VecDeque};

use realm_types::Vec2;

/// Pathfinding and walkability queries over an area's static geometry.
///
/// Implementations must be pure: the same inputs always give the same path,
/// and no query blocks or performs I/O.
pub trait Navigator: Send + Sync + core::fmt::Debug {
    /// Find a walkable path from `from` to `to`.
    ///
    /// The returned waypoints exclude `from` and end at `to`; an empty path
    /// means the two positions share a cell. Returns `None` when `to` cannot
    /// be reached.
    fn find_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>>;

    /// Whether a position lies on a walkable cell.
    fn is_walkable(&self, pos: Vec2) -> bool;

    /// Row-major walkability grid forwarded to clients as-is.
    fn walkability_data(&self) -> Vec<Vec<bool>>;
}

/// Cell coordinate on the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cell {
    x: i64,
    y: i64,
}

impl Cell {
    #[allow(clippy::cast_possible_truncation)]
    fn from_position(pos: Vec2) -> Option<Self> {
        let rounded = pos.rounded();
        if !rounded.is_finite() {
            return None;
        }
        Some(Self {
            x: rounded.x as i64,
            y: rounded.y as i64,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    const fn to_position(self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }

    fn neighbors(self) -> [Self; 4] {
        [
            Self { x: self.x.saturating_add(1), y: self.y },
            Self { x: self.x.saturating_sub(1), y: self.y },
            Self { x: self.x, y: self.y.saturating_add(1) },
            Self { x: self.x, y: self.y.saturating_sub(1) },
        ]
    }
}

/// Four-neighbour shortest-path navigator over a walkability grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridNavigator {
    rows: Vec<Vec<bool>>,
}

impl GridNavigator {
    /// Create a navigator from row-major walkability data.
    pub const fn new(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }

    /// Create a fully walkable `width` x `height` grid.
    pub fn open(width: usize, height: usize) -> Self {
        Self::new(vec![vec![true; width]; height])
    }

    /// Mark a cell blocked. Out-of-range cells are ignored.
    pub fn block(&mut self, x: usize, y: usize) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = false;
        }
    }

    fn cell_walkable(&self, cell: Cell) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(cell.x), usize::try_from(cell.y)) else {
            return false;
        };
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }
}

impl Navigator for GridNavigator {
    fn find_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        let start = Cell::from_position(from)?;
        let goal = Cell::from_position(to)?;
        if !self.cell_walkable(goal) {
            return None;
        }
        if start == goal {
            return Some(Vec::new());
        }

        // Predecessor map doubles as the visited set.
        let mut prev: BTreeMap<Cell, Cell> = BTreeMap::new();
        let mut frontier = VecDeque::from([start]);

        while let Some(current) = frontier.pop_front() {
            if current == goal {
                break;
            }
            for neighbor in current.neighbors() {
                if neighbor == start || prev.contains_key(&neighbor) || !self.cell_walkable(neighbor) {
                    continue;
                }
                prev.insert(neighbor, current);
                frontier.push_back(neighbor);
            }
        }

        if !prev.contains_key(&goal) {
            return None;
        }

        let mut path = vec![goal.to_position()];
        let mut cursor = goal;
        while let Some(&before) = prev.get(&cursor) {
            if before == start {
                break;
            }
            path.push(before.to_position());
            cursor = before;
        }
        path.reverse();
        Some(path)
    }

    fn is_walkable(&self, pos: Vec2) -> bool {
        Cell::from_position(pos).is_some_and(|cell| self.cell_walkable(cell))
    }

    fn walkability_data(&self) -> Vec<Vec<bool>> {
        self.rows.clone()
    }
}
