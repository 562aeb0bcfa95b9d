#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use std::error::Error;
use std::fmt::{self, Display};
use std::ops::Add;

use log::{debug, trace};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pos(pub i32, pub i32);

impl Add for Pos {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0, self.1 + other.1)
    }
}

static COMPASS: [Pos; 8] = [
    Pos(-1, -1),
    Pos(0, -1),
    Pos(1, -1),
    Pos(-1, 0),
    Pos(1, 0),
    Pos(-1, 1),
    Pos(0, 1),
    Pos(1, 1),
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CavernError {
    /// Construction was attempted with a zero or negative dimension.
    InvalidDimensions { width: i32, height: i32 },
    /// No wall square carries positive weight, so there is nothing left to dig.
    Exhausted,
}

impl Display for CavernError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid cavern dimensions {width}x{height}")
            }
            Self::Exhausted => write!(f, "no diggable squares remain"),
        }
    }
}

impl Error for CavernError {}

/// Selection mass for a wall square by how many of its eight neighbours are
/// still walls. Squares about half enclosed dominate the draw, which keeps the
/// cavity growing in rounded lobes instead of thin spikes. Counts outside the
/// table leave the square's weight as it stands.
const fn tier(wall_neighbours: usize) -> Option<u32> {
    match wall_neighbours {
        2 | 7 => Some(10),
        3 | 6 => Some(100),
        4 | 5 => Some(1000),
        _ => None,
    }
}

#[derive(Debug)]
pub struct Cavern<R> {
    width: i32,
    height: i32,
    /// `true` once a square has been dug out. Dug squares never revert.
    dug: Vec<bool>,
    /// Unnormalised selection mass per square. Positive only on wall squares;
    /// dug squares always sit at zero.
    weight: Vec<u32>,
    rng: R,
}

impl<R: Rng> Cavern<R> {
    pub fn new(width: i32, height: i32, rng: R) -> Result<Self, CavernError> {
        if width <= 0 || height <= 0 {
            return Err(CavernError::InvalidDimensions { width, height });
        }
        let mut cavern = Self {
            width,
            height,
            dug: vec![false; (width * height) as usize],
            weight: vec![0; (width * height) as usize],
            rng,
        };
        // The seed cavity goes through the ordinary dig path so the
        // dug/weight bookkeeping is consistent before the first draw.
        cavern.dig(Pos(width / 2, height / 2));
        debug!(
            "seeded {width}x{height} cavern at ({}, {})",
            width / 2,
            height / 2
        );
        Ok(cavern)
    }

    /// Draws one wall square at random, proportionally to its weight, digs it
    /// out and re-scores the walls around it. Fails with
    /// [`CavernError::Exhausted`] once no candidate remains.
    pub fn dig_next_square(&mut self) -> Result<(), CavernError> {
        let draw = WeightedIndex::new(self.weight.iter().copied())
            .map_err(|_| CavernError::Exhausted)?;
        let drawn = draw.sample(&mut self.rng);
        let chosen = self.unflatten(drawn);
        assert!(
            !self.is_dug(chosen),
            "drew an already-dug square at {chosen:?}"
        );
        self.dig(chosen);
        trace!("dug ({}, {})", chosen.0, chosen.1);
        Ok(())
    }
}

impl<R> Cavern<R> {
    fn dig(&mut self, pos: Pos) {
        let idx = self.index(pos);
        self.dug[idx] = true;
        self.update_weights(pos);
    }

    fn update_weights(&mut self, pos: Pos) {
        let idx = self.index(pos);
        self.weight[idx] = 0;

        // Walls touching the fresh hole become candidates if they weren't
        // already, then each of them is re-scored. Walls further out are left
        // alone until a dig lands next to them.
        let walls = self.neighbouring_walls(pos);
        for &wall in &walls {
            let idx = self.index(wall);
            if self.weight[idx] == 0 {
                self.weight[idx] = 1;
            }
        }
        for &wall in &walls {
            if let Some(mass) = tier(self.neighbouring_walls(wall).len()) {
                let idx = self.index(wall);
                self.weight[idx] = mass;
            }
        }
    }

    /// In-bounds 8-connected neighbours of `pos` that are still walls.
    pub fn neighbouring_walls(&self, pos: Pos) -> Vec<Pos> {
        COMPASS
            .iter()
            .map(|&step| pos + step)
            .filter(|&n| self.contains(n) && !self.is_dug(n))
            .collect()
    }

    pub const fn width(&self) -> i32 {
        self.width
    }

    pub const fn height(&self) -> i32 {
        self.height
    }

    pub const fn contains(&self, pos: Pos) -> bool {
        pos.0 >= 0 && pos.0 < self.width && pos.1 >= 0 && pos.1 < self.height
    }

    pub fn is_dug(&self, pos: Pos) -> bool {
        self.dug[self.index(pos)]
    }

    pub fn dug_squares(&self) -> usize {
        self.dug.iter().filter(|&&dug| dug).count()
    }

    pub fn render_map(&self) -> String {
        self.render(|dug, _| if dug { '.' } else { '#' })
    }

    /// One glyph per weight tier. `'?'` never shows up unless the scoring
    /// rule has gone wrong.
    pub fn render_weights(&self) -> String {
        self.render(|_, weight| match weight {
            0 => ' ',
            1 => 'I',
            10 => 'X',
            100 => 'D',
            1000 => 'M',
            _ => '?',
        })
    }

    fn render(&self, glyph: impl Fn(bool, u32) -> char) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(Pos(x, y));
                out.push(glyph(self.dug[idx], self.weight[idx]));
            }
            out.push('\n');
        }
        out
    }

    fn index(&self, pos: Pos) -> usize {
        // A wrong coordinate can still land inside the flat vec on another
        // row, so this cannot be left to the slice bounds check.
        assert!(self.contains(pos), "position {pos:?} out of bounds");
        (pos.1 * self.width + pos.0) as usize
    }

    fn unflatten(&self, idx: usize) -> Pos {
        Pos(idx as i32 % self.width, idx as i32 / self.width)
    }
}

impl<R> Display for Cavern<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_map())
    }
}
