//! Availability keys for downstream tile assembly
//!
//! Once a granule is ingested, the tile it covers is recorded as
//! `product,cycle,pass,tile` (for example `PIXC,1,2,3R`). The components
//! come from the granule id, which follows the SWOT naming convention
//! `SWOT_L2_HR_<product>_<ccc>_<ppp>_<ttt><L|R>_...`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const TILE_PATTERN: &str =
    r"_(?P<product>[A-Za-z]+)_(?P<cycle>\d{3})_(?P<pass>\d{3})_(?P<tile>\d{3})(?P<direction>[LR])(?:_|$)";

#[allow(clippy::expect_used)]
fn tile_regex() -> &'static Regex {
    static TILE_REGEX: OnceLock<Regex> = OnceLock::new();
    TILE_REGEX.get_or_init(|| Regex::new(TILE_PATTERN).expect("tile pattern is a valid regex"))
}

/// Tile coverage of a successfully ingested granule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvailabilityKey {
    pub product: String,
    pub cycle: u16,
    pub pass: u16,
    pub tile: u16,
    /// `L` or `R` swath side
    pub direction: char,
}

impl AvailabilityKey {
    /// Extract the key from a granule id.
    ///
    /// Returns `None` when the id does not follow the tile naming pattern;
    /// that is a data quality problem for the caller to report, not an error.
    pub fn from_granule_id(granule_id: &str) -> Option<Self> {
        let caps = tile_regex().captures(granule_id)?;

        Some(Self {
            product: caps.name("product")?.as_str().to_string(),
            cycle: caps.name("cycle")?.as_str().parse().ok()?,
            pass: caps.name("pass")?.as_str().parse().ok()?,
            tile: caps.name("tile")?.as_str().parse().ok()?,
            direction: caps.name("direction")?.as_str().chars().next()?,
        })
    }

    /// Tile label as written in the key, e.g. `3R`
    pub fn tile_label(&self) -> String {
        format!("{}{}", self.tile, self.direction)
    }

    /// Composite string stored in the availability table
    pub fn key(&self) -> String {
        format!("{},{},{},{}", self.product, self.cycle, self.pass, self.tile_label())
    }
}

impl std::fmt::Display for AvailabilityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}
