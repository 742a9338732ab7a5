use log::debug;

/// Half-open pixel rectangle: rows `[row_start, row_stop)`, cols `[col_start, col_stop)`.
///
/// Coordinates are signed because color-grid windows may be padded past the
/// raster edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub row_start: isize,
    pub row_stop: isize,
    pub col_start: isize,
    pub col_stop: isize,
}

impl Window {
    pub fn new(row_start: isize, row_stop: isize, col_start: isize, col_stop: isize) -> Self {
        Self {
            row_start,
            row_stop,
            col_start,
            col_stop,
        }
    }

    pub fn height(&self) -> usize {
        (self.row_stop - self.row_start).max(0) as usize
    }

    pub fn width(&self) -> usize {
        (self.col_stop - self.col_start).max(0) as usize
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    pub fn pad(&self, pad: isize) -> Window {
        Window::new(
            self.row_start - pad,
            self.row_stop + pad,
            self.col_start - pad,
            self.col_stop + pad,
        )
    }

    /// Window on a grid of half the resolution covering this one: starts
    /// floor-divided by two, stops rounded up so an odd stop keeps its last
    /// pixel.
    pub fn halve(&self) -> Window {
        Window::new(
            self.row_start.div_euclid(2),
            (self.row_stop + 1).div_euclid(2),
            self.col_start.div_euclid(2),
            (self.col_stop + 1).div_euclid(2),
        )
    }

    /// Overlap with another window, `None` when they do not intersect.
    pub fn intersection(&self, other: &Window) -> Option<Window> {
        let window = Window::new(
            self.row_start.max(other.row_start),
            self.row_stop.min(other.row_stop),
            self.col_start.max(other.col_start),
            self.col_stop.min(other.col_stop),
        );
        if window.is_empty() {
            None
        } else {
            Some(window)
        }
    }
}

/// One unit of work: a pan-grid window and its (row, col) block index.
///
/// The index is only a diagnostic tag; the write offset comes from the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileJob {
    pub window: Window,
    pub block: (usize, usize),
}

/// Grow the block size by one when it would leave a 1-pixel strip at the edge.
pub fn adjust_block_size(width: usize, height: usize, block_size: usize) -> usize {
    if width % block_size == 1 || height % block_size == 1 {
        block_size + 1
    } else {
        block_size
    }
}

/// Square custom-size tiling of the pan raster.
pub struct TileGrid {
    raster_width: usize,
    raster_height: usize,
    block_size: usize,
    pub num_tiles_x: usize,
    pub num_tiles_y: usize,
    pub total_tiles: usize,
}

impl TileGrid {
    /// `requested_block` is adjusted with [`adjust_block_size`] before use.
    pub fn new(raster_width: usize, raster_height: usize, requested_block: usize) -> Self {
        let block_size = adjust_block_size(raster_width, raster_height, requested_block);

        let num_tiles_x = raster_width.div_ceil(block_size);
        let num_tiles_y = raster_height.div_ceil(block_size);
        let total_tiles = num_tiles_x * num_tiles_y;

        debug!(
            "TileGrid: {}x{} raster, block_size={} (requested {}) → {}x{} tiles ({} total)",
            raster_width,
            raster_height,
            block_size,
            requested_block,
            num_tiles_x,
            num_tiles_y,
            total_tiles
        );

        Self {
            raster_width,
            raster_height,
            block_size,
            num_tiles_x,
            num_tiles_y,
            total_tiles,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn iter(&self) -> TileIterator<'_> {
        TileIterator::new(self)
    }

    /// Tiles are numbered column-major: all rows of the first column, then the next.
    pub fn get_tile(&self, tile_idx: usize) -> TileJob {
        let tile_x = tile_idx / self.num_tiles_y;
        let tile_y = tile_idx % self.num_tiles_y;

        let col_start = tile_x * self.block_size;
        let row_start = tile_y * self.block_size;
        let col_stop = (col_start + self.block_size).min(self.raster_width);
        let row_stop = (row_start + self.block_size).min(self.raster_height);

        TileJob {
            window: Window::new(
                row_start as isize,
                row_stop as isize,
                col_start as isize,
                col_stop as isize,
            ),
            block: (tile_y, tile_x),
        }
    }
}

pub struct TileIterator<'a> {
    grid: &'a TileGrid,
    current_idx: usize,
}

impl<'a> TileIterator<'a> {
    fn new(grid: &'a TileGrid) -> Self {
        Self {
            grid,
            current_idx: 0,
        }
    }
}

impl<'a> Iterator for TileIterator<'a> {
    type Item = TileJob;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_idx < self.grid.total_tiles {
            let job = self.grid.get_tile(self.current_idx);
            self.current_idx += 1;
            Some(job)
        } else {
            None
        }
    }
}

/// The raster's own storage blocks, row-major.
pub fn natural_block_windows(
    raster_width: usize,
    raster_height: usize,
    block_size: (usize, usize),
) -> Vec<TileJob> {
    let (block_x, block_y) = (block_size.0.max(1), block_size.1.max(1));
    let blocks_x = raster_width.div_ceil(block_x);
    let blocks_y = raster_height.div_ceil(block_y);

    let mut jobs = Vec::with_capacity(blocks_x * blocks_y);
    for j in 0..blocks_y {
        for i in 0..blocks_x {
            let row_start = j * block_y;
            let col_start = i * block_x;
            jobs.push(TileJob {
                window: Window::new(
                    row_start as isize,
                    (row_start + block_y).min(raster_height) as isize,
                    col_start as isize,
                    (col_start + block_x).min(raster_width) as isize,
                ),
                block: (j, i),
            });
        }
    }
    jobs
}
