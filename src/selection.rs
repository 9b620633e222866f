//! Candidate selection: picks the one face to follow among a frame's detections.
//!
//! The selector favours temporal continuity. Among the faces detected in a
//! frame it keeps following the one closest to the previously tracked face,
//! unless some face is dramatically larger than the tracked one, in which case
//! that larger (presumably closer) face takes over.

use crate::{
    constants::DEFAULT_CONTINUITY_AREA_RATIO,
    detection::Detection,
    geometry::{BoundingBox, Point2D},
};
use log::debug;
use serde::{Deserialize, Serialize};

/// The single face currently being tracked
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackedTarget {
    /// Horizontal center of the face in pixels
    pub center_x: f64,
    /// Vertical center of the face in pixels
    pub center_y: f64,
    /// Face area in px²
    pub area: f64,
    /// Face bounding box
    pub bbox: BoundingBox,
}

impl TrackedTarget {
    /// Build a target from a selected bounding box
    #[must_use]
    pub fn from_bbox(bbox: BoundingBox) -> Self {
        let center = bbox.center();
        Self {
            center_x: center.x,
            center_y: center.y,
            area: bbox.area(),
            bbox,
        }
    }

    #[must_use]
    pub fn center(&self) -> Point2D {
        Point2D::new(self.center_x, self.center_y)
    }
}

/// Which rule picked the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Closest to the previous target
    Continuity,
    /// Largest face overrides continuity
    Salience,
}

/// Outcome of a selection over a non-empty candidate set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Position of the chosen candidate in the input
    pub index: usize,
    /// Chosen bounding box
    pub bbox: BoundingBox,
    /// Area of the chosen bounding box
    pub area: f64,
    /// Rule that picked it
    pub mode: SelectionMode,
}

impl Selection {
    /// Convert into the target the detection loop publishes
    #[must_use]
    pub fn to_target(&self) -> TrackedTarget {
        TrackedTarget::from_bbox(self.bbox)
    }
}

/// Temporal-continuity candidate selector
#[derive(Debug, Clone, Copy)]
pub struct CandidateSelector {
    area_ratio: f64,
}

impl CandidateSelector {
    /// Create a selector; a candidate at least `area_ratio` times the previous
    /// target's area switches selection to the largest face.
    ///
    /// # Panics
    ///
    /// Panics if `area_ratio` is not strictly positive
    #[must_use]
    pub fn new(area_ratio: f64) -> Self {
        assert!(area_ratio > 0.0, "Area ratio must be positive");
        Self { area_ratio }
    }

    #[must_use]
    pub const fn area_ratio(&self) -> f64 {
        self.area_ratio
    }

    /// Select one candidate, or `None` when there are no candidates.
    ///
    /// Ties on distance or area go to the earliest candidate.
    #[must_use]
    pub fn select(&self, previous: &TrackedTarget, candidates: &[Detection]) -> Option<Selection> {
        if candidates.is_empty() {
            return None;
        }

        let previous_center = previous.center();
        let mut nearest = 0;
        let mut nearest_distance = f64::INFINITY;
        let mut largest = 0;
        let mut max_area = f64::NEG_INFINITY;

        for (index, candidate) in candidates.iter().enumerate() {
            let distance = candidate.bbox.squared_distance_to(&previous_center);
            let area = candidate.bbox.area();
            if distance < nearest_distance {
                nearest = index;
                nearest_distance = distance;
            }
            if area > max_area {
                largest = index;
                max_area = area;
            }
        }

        let (index, mode) = if max_area < self.area_ratio * previous.area {
            (nearest, SelectionMode::Continuity)
        } else {
            (largest, SelectionMode::Salience)
        };

        let bbox = candidates[index].bbox;
        debug!(
            "Selected candidate {} of {} ({:?}, area {:.1})",
            index,
            candidates.len(),
            mode,
            bbox.area()
        );

        Some(Selection {
            index,
            bbox,
            area: bbox.area(),
            mode,
        })
    }
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CONTINUITY_AREA_RATIO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Detection {
        Detection::new(BoundingBox::new(x_min, y_min, x_max, y_max), 0.9)
    }

    fn previous(center_x: f64, center_y: f64, area: f64) -> TrackedTarget {
        TrackedTarget {
            center_x,
            center_y,
            area,
            bbox: BoundingBox::default(),
        }
    }

    #[test]
    fn test_empty_candidates() {
        let selector = CandidateSelector::default();
        assert!(selector.select(&TrackedTarget::default(), &[]).is_none());
    }

    #[test]
    fn test_much_larger_face_takes_over() {
        let selector = CandidateSelector::default();
        let candidates = [candidate(0.0, 0.0, 10.0, 10.0), candidate(100.0, 100.0, 150.0, 150.0)];

        let selection = selector.select(&previous(5.0, 5.0, 25.0), &candidates).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.area, 2500.0);
        assert_eq!(selection.mode, SelectionMode::Salience);
    }

    #[test]
    fn test_continuity_keeps_nearest_face() {
        let selector = CandidateSelector::default();
        // Previous face area 900; the larger candidate (1600) is below 2.5x
        let candidates = [candidate(200.0, 200.0, 240.0, 240.0), candidate(10.0, 10.0, 40.0, 40.0)];

        let selection = selector.select(&previous(25.0, 25.0, 900.0), &candidates).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.mode, SelectionMode::Continuity);
    }

    #[test]
    fn test_ties_resolve_to_first_candidate() {
        let selector = CandidateSelector::default();
        let candidates = [
            candidate(0.0, 0.0, 10.0, 10.0),
            candidate(20.0, 0.0, 30.0, 10.0),
            candidate(0.0, 0.0, 10.0, 10.0),
        ];

        // Equidistant from (15, 5), equal areas, continuity branch
        let selection = selector.select(&previous(15.0, 5.0, 100.0), &candidates).unwrap();
        assert_eq!(selection.index, 0);

        // Salience branch with equal areas
        let selection = selector.select(&previous(15.0, 5.0, 0.0), &candidates).unwrap();
        assert_eq!(selection.index, 0);
    }

    #[test]
    fn test_ratio_boundary_switches_to_salience() {
        let selector = CandidateSelector::default();
        // max area 250 == 2.5 * 100 is not strictly below the ratio
        let candidates = [candidate(0.0, 0.0, 10.0, 10.0), candidate(50.0, 50.0, 60.0, 75.0)];
        let selection = selector.select(&previous(5.0, 5.0, 100.0), &candidates).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.mode, SelectionMode::Salience);
    }

    #[test]
    #[should_panic(expected = "Area ratio must be positive")]
    fn test_zero_ratio_rejected() {
        let _ = CandidateSelector::new(0.0);
    }

    proptest! {
        #[test]
        fn prop_single_candidate_always_selected(
            x in -500.0f64..500.0, y in -500.0f64..500.0,
            w in 0.0f64..300.0, h in 0.0f64..300.0,
            px in -500.0f64..500.0, py in -500.0f64..500.0,
            area in 0.0f64..1e6,
        ) {
            let selector = CandidateSelector::default();
            let selection = selector.select(&previous(px, py, area), &[candidate(x, y, x + w, y + h)]);
            prop_assert_eq!(selection.map(|s| s.index), Some(0));
        }
    }
}
