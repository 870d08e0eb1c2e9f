//! Cross-section templates.
//!
//! A template is a stack of slices along the extrusion axis. Each slice is
//! a `width × height` grid of optional block-states, indexed by column
//! (lateral, left to right) and row (vertical, bottom to top). Two offsets
//! map signed axis-relative coordinates onto grid indices so that lateral
//! `0` is the path centre line and vertical `0` the path height.

use pathforge_core::{BlockState, ExtrusionError};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// One grid of the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    width: usize,
    height: usize,
    cells: Vec<Option<BlockState>>,
}

impl Slice {
    /// An empty slice.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// A slice with every cell set to the same state.
    pub fn filled(width: usize, height: usize, state: BlockState) -> Self {
        Self {
            width,
            height,
            cells: vec![Some(state); width * height],
        }
    }

    /// Build a slice from rows, bottom row first.
    pub fn from_rows(rows: Vec<Vec<Option<BlockState>>>) -> Result<Self, ExtrusionError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut cells = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(ExtrusionError::DimensionMismatch {
                    width,
                    height,
                    got_width: row.len(),
                    got_height: height,
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Grid width in columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at a column and row, `None` when absent or out of bounds.
    pub fn get(&self, column: usize, row: usize) -> Option<&BlockState> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + column)?.as_ref()
    }

    /// Set a cell. Returns `false` when out of bounds.
    pub fn set(&mut self, column: usize, row: usize, state: Option<BlockState>) -> bool {
        if column >= self.width || row >= self.height {
            return false;
        }
        match self.cells.get_mut(row * self.width + column) {
            Some(cell) => {
                *cell = state;
                true
            }
            None => false,
        }
    }

    /// Number of present cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// A named cross-section swept along a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    name: String,
    width: usize,
    height: usize,
    lateral_offset: i32,
    vertical_offset: i32,
    slices: Vec<Slice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    period: Option<usize>,
}

impl Template {
    /// Creates an empty template, centred laterally and resting on the path.
    pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            lateral_offset: (width / 2) as i32,
            vertical_offset: 0,
            slices: Vec::new(),
            period: None,
        }
    }

    /// Set the grid indices of lateral `0` and vertical `0`.
    pub fn with_offsets(mut self, lateral_offset: i32, vertical_offset: i32) -> Self {
        self.lateral_offset = lateral_offset;
        self.vertical_offset = vertical_offset;
        self
    }

    /// Repeat the first `period` slices along the path.
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    /// Append a slice, keeping all slices the same size.
    pub fn push_slice(&mut self, slice: Slice) -> Result<(), ExtrusionError> {
        if slice.width != self.width || slice.height != self.height {
            return Err(ExtrusionError::DimensionMismatch {
                width: self.width,
                height: self.height,
                got_width: slice.width,
                got_height: slice.height,
            });
        }
        self.slices.push(slice);
        Ok(())
    }

    /// Check that every slice matches the template grid and holds one
    /// cell per column and row. Needed for templates read from storage.
    pub fn validate(&self) -> Result<(), ExtrusionError> {
        for slice in &self.slices {
            let cells = slice.width * slice.height;
            if slice.width != self.width
                || slice.height != self.height
                || slice.cells.len() != cells
            {
                return Err(ExtrusionError::DimensionMismatch {
                    width: self.width,
                    height: self.height,
                    got_width: slice.width,
                    got_height: if slice.width == 0 {
                        slice.height
                    } else {
                        slice.cells.len() / slice.width
                    },
                });
            }
        }
        Ok(())
    }

    /// Builder form of [`Template::push_slice`].
    pub fn with_slice(mut self, slice: Slice) -> Result<Self, ExtrusionError> {
        self.push_slice(slice)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Whether the template has no slices.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Effective repetition period, never larger than the slice count.
    pub fn period(&self) -> usize {
        let count = self.slices.len().max(1);
        self.period.unwrap_or(count).clamp(1, count)
    }

    /// Slice used at a given path sample index.
    pub fn slice_for_step(&self, step: usize) -> usize {
        step % self.period()
    }

    /// Cell at axis-relative coordinates. Anything out of bounds is `None`.
    pub fn block_at(&self, slice: usize, lateral: i32, vertical: i32) -> Option<&BlockState> {
        let slice = self.slices.get(slice)?;
        let column = usize::try_from(lateral + self.lateral_offset).ok()?;
        let row = usize::try_from(vertical + self.vertical_offset).ok()?;
        slice.get(column, row)
    }

    /// Lateral coordinates covered by the grid, left to right.
    pub fn lateral_range(&self) -> RangeInclusive<i32> {
        -self.lateral_offset..=(self.width as i32 - 1 - self.lateral_offset)
    }

    /// Vertical coordinates covered by the grid, bottom to top.
    pub fn vertical_range(&self) -> RangeInclusive<i32> {
        -self.vertical_offset..=(self.height as i32 - 1 - self.vertical_offset)
    }
}
