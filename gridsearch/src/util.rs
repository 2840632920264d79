use image::{DynamicImage, GenericImageView};

use crate::grid::{Cell, GridMap};

/// Builds a grid from an image, one cell per pixel. Dark pixels become obstacles.
pub fn parse_img(img: &DynamicImage) -> Result<GridMap, anyhow::Error> {
    let width = img.width() as usize;
    let height = img.height() as usize;

    if width == 0 || height == 0 {
        anyhow::bail!("image has no pixels ({}x{})", width, height);
    }

    let mut cells = vec![vec![Cell::Free; width]; height];

    for (row, row_cells) in cells.iter_mut().enumerate() {
        for (col, cell) in row_cells.iter_mut().enumerate() {
            let p = img.get_pixel(col as u32, row as u32);

            *cell = if p.0[0] < 128 {
                Cell::Obstacle
            } else {
                Cell::Free
            }
        }
    }

    Ok(GridMap {
        rows: height,
        columns: width,
        cells,
    })
}
