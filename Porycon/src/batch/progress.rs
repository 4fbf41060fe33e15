//! Batch progress reporting

/// Progress callback type for batch conversion
pub type BatchProgressCallback<'a> = &'a (dyn Fn(&BatchProgress) + Sync + Send);

/// Progress information during a batch conversion
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Current batch phase
    pub phase: BatchPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items in this phase
    pub total: usize,
    /// Map or tileset being processed
    pub current_item: Option<String>,
}

impl BatchProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: BatchPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_item: None,
        }
    }

    /// Create a progress update naming the item being processed
    #[must_use]
    pub fn with_item(phase: BatchPhase, current: usize, total: usize, item: impl Into<String>) -> Self {
        Self {
            phase,
            current,
            total,
            current_item: Some(item.into()),
        }
    }

    /// Completion of the current phase, 0.0 to 1.0
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Phase of a batch conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Loading referenced tilesets
    LoadingTilesets,
    /// Reading layouts and registering tile usage
    Scanning,
    /// Assigning identifiers and rendering atlases
    BuildingAtlases,
    /// Producing per-map output
    Emitting,
    /// Placing maps in the world
    Assembling,
}

impl BatchPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadingTilesets => "Loading tilesets",
            Self::Scanning => "Scanning maps",
            Self::BuildingAtlases => "Building atlases",
            Self::Emitting => "Emitting maps",
            Self::Assembling => "Assembling world",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert!((BatchProgress::new(BatchPhase::Scanning, 1, 4).percentage() - 0.25).abs() < f32::EPSILON);
        assert!((BatchProgress::new(BatchPhase::Emitting, 0, 0).percentage() - 1.0).abs() < f32::EPSILON);
        let p = BatchProgress::with_item(BatchPhase::Scanning, 1, 2, "MAP_A");
        assert_eq!(p.current_item.as_deref(), Some("MAP_A"));
    }
}
