use crate::types::Section;

use super::{DetectorConfig, ScanWindow, ScannedCell};

/// Repeating-row tables (worker lists, risk matrices).
///
/// Extension point: no table layout is recognized yet, so this emits nothing.
pub(super) fn detect(
    _window: &ScanWindow<'_>,
    _cells: &[ScannedCell],
    _config: &DetectorConfig,
) -> Vec<Section> {
    Vec::new()
}
