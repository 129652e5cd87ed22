use std::str::FromStr;

use crate::error::{CodecError, CodecResult};

pub const WIDTH: usize = 32;
pub const HEIGHT: usize = 32;
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// A single RGB color. Equality is exact per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 24-bit key `R<<16 | G<<8 | B`, used for palette deduplication
    pub const fn key(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parse `RRGGBB` or `#RRGGBB`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected a color like #ff8800, got {:?}", s));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("invalid color {:?}: {}", s, e))
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// The 32x32 pixel buffer shown on the display.
///
/// Cells are stored row-major, `index = y * WIDTH + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pixels: [Rgb; PIXEL_COUNT],
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelGrid {
    /// Create a grid with every pixel black
    pub fn new() -> Self {
        Self::filled(Rgb::BLACK)
    }

    pub fn filled(color: Rgb) -> Self {
        Self {
            pixels: [color; PIXEL_COUNT],
        }
    }

    fn index_of(x: i32, y: i32) -> CodecResult<usize> {
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= HEIGHT {
            return Err(CodecError::OutOfBounds {
                x,
                y,
                width: WIDTH,
                height: HEIGHT,
            });
        }
        Ok(y as usize * WIDTH + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> CodecResult<Rgb> {
        let index = Self::index_of(x, y)?;
        Ok(self.pixels[index])
    }

    /// Set a pixel, returning the color it replaced
    pub fn set(&mut self, x: i32, y: i32, color: Rgb) -> CodecResult<Rgb> {
        let index = Self::index_of(x, y)?;
        Ok(std::mem::replace(&mut self.pixels[index], color))
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels = [color; PIXEL_COUNT];
    }

    /// Visit every pixel row by row as `(x, y, color, index)`
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(usize, usize, Rgb, usize),
    {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let index = y * WIDTH + x;
                visit(x, y, self.pixels[index], index);
            }
        }
    }

    /// Replace every pixel with the mapper's result, row by row.
    ///
    /// The mapper receives the current color of the cell it is replacing.
    pub fn transform<F>(&mut self, mut map: F)
    where
        F: FnMut(usize, usize, Rgb, usize) -> Rgb,
    {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let index = y * WIDTH + x;
                self.pixels[index] = map(x, y, self.pixels[index], index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn test_new_grid_is_black() {
        let grid = PixelGrid::new();
        grid.traverse(|_, _, color, _| assert_eq!(color, Rgb::BLACK));
    }

    #[test]
    fn test_set_returns_previous() {
        let mut grid = PixelGrid::new();
        assert_eq!(grid.set(3, 4, RED).unwrap(), Rgb::BLACK);
        assert_eq!(grid.set(3, 4, Rgb::BLACK).unwrap(), RED);
        assert_eq!(grid.get(3, 4).unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_fill() {
        let mut grid = PixelGrid::new();
        grid.set(0, 0, Rgb::new(1, 2, 3)).unwrap();
        grid.fill(RED);
        assert_eq!(grid, PixelGrid::filled(RED));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = PixelGrid::new();
        assert!(matches!(
            grid.set(32, 0, RED),
            Err(CodecError::OutOfBounds { x: 32, y: 0, .. })
        ));
        assert!(matches!(
            grid.get(-1, 5),
            Err(CodecError::OutOfBounds { x: -1, y: 5, .. })
        ));
        assert!(grid.get(0, 32).is_err());
        assert!(grid.get(31, 31).is_ok());
    }

    #[test]
    fn test_traverse_is_row_major() {
        let mut seen = Vec::new();
        PixelGrid::new().traverse(|x, y, _, index| {
            assert_eq!(index, y * WIDTH + x);
            seen.push(index);
        });
        assert_eq!(seen, (0..PIXEL_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_transform_sees_pre_transform_color() {
        let mut grid = PixelGrid::new();
        grid.set(1, 0, RED).unwrap();

        // Shift each cell's red channel into green; the mapper must see the
        // original value of its own cell, not a neighbor's new one.
        grid.transform(|_, _, color, _| Rgb::new(0, color.r, 0));

        assert_eq!(grid.get(0, 0).unwrap(), Rgb::BLACK);
        assert_eq!(grid.get(1, 0).unwrap(), Rgb::new(0, 255, 0));
        assert_eq!(grid.get(2, 0).unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("00FF10".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 16));
        assert!("#fff".parse::<Rgb>().is_err());
        assert!("zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_color_key() {
        assert_eq!(Rgb::new(0x12, 0x34, 0x56).key(), 0x123456);
    }
}
