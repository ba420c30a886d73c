//! Visual LSB plane extraction.
//!
//! Renders one channel's LSB layer as a black and white image (`lsb * 255`).
//! Sequential embedding shows up as a noisy band at the top of the plane;
//! keyed embedding as noise sprinkled over the whole image.

use crate::processing::grid::{Channel, PixelGrid, Plane};

/// LSB plane of `channel`, scaled to 0 / 255.
pub fn lsb_plane(grid: &PixelGrid, channel: Channel) -> Plane {
    grid.channel_plane(channel, |v| (v & 1) * 255)
}

/// LSB planes of R, G and B.
pub fn lsb_planes(grid: &PixelGrid) -> Vec<(Channel, Plane)> {
    Channel::ALL
        .iter()
        .map(|&channel| (channel, lsb_plane(grid, channel)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_is_binary_and_keeps_geometry() {
        let grid = PixelGrid::new(2, 2, 4, vec![
            1, 2, 3, 0, //
            4, 5, 6, 0, //
            7, 8, 9, 0, //
            10, 11, 12, 0,
        ])
        .unwrap();

        let red = lsb_plane(&grid, Channel::Red);
        assert_eq!((red.width(), red.height()), (2, 2));
        assert_eq!(red.as_raw(), &[255, 0, 255, 0]);

        let green = lsb_plane(&grid, Channel::Green);
        assert_eq!(green.as_raw(), &[0, 255, 0, 255]);
    }

    #[test]
    fn one_plane_per_colour_channel() {
        let grid = PixelGrid::new(1, 1, 3, vec![1, 0, 1]).unwrap();
        let planes = lsb_planes(&grid);
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[2].0, Channel::Blue);
        assert_eq!(planes[2].1.as_raw(), &[255]);
    }
}
