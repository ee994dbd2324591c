use std::fmt;

/// Statistics from a completed pyramid build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyramidStats {
    /// Present planes written at full resolution
    pub planes_written: usize,
    /// Planes the source reported as absent
    pub planes_absent: usize,
    /// Planes loaded from the plane cache
    pub cache_hits: usize,
    /// Planes pulled from the source (absent markers included)
    pub planes_fetched: usize,
    /// Level arrays created
    pub levels_created: usize,
}

impl fmt::Display for PyramidStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} planes into {} levels ({} absent, {} fetched, {} from cache)",
            self.planes_written,
            self.levels_created,
            self.planes_absent,
            self.planes_fetched,
            self.cache_hits
        )
    }
}
