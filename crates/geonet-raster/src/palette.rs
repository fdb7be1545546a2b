//! ESA WorldCover class colours.

/// `(class, rgb)` for every WorldCover class code.
pub const WORLDCOVER_PALETTE: [(u8, [u8; 3]); 11] = [
    (10, [0, 100, 0]),      // tree cover
    (20, [255, 187, 34]),   // shrubland
    (30, [255, 255, 76]),   // grassland
    (40, [240, 150, 255]),  // cropland
    (50, [250, 0, 0]),      // built-up
    (60, [180, 180, 180]),  // bare
    (70, [240, 240, 240]),  // snow and ice
    (80, [0, 100, 200]),    // water
    (90, [0, 150, 160]),    // herbaceous wetland
    (95, [0, 207, 117]),    // mangroves
    (100, [250, 230, 160]), // moss and lichen
];

/// Colour of a class code; unknown codes are black.
#[must_use]
pub fn class_color(class: u8) -> [u8; 3] {
    WORLDCOVER_PALETTE
        .iter()
        .find(|(code, _)| *code == class)
        .map_or([0, 0, 0], |(_, rgb)| *rgb)
}
