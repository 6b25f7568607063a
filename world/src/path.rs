//! Ordered record of the positions the player has visited.

use geocache_core::{Memento, Point};
use tracing::warn;

/// Ordered trail of serialized points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathRecorder {
    points: Vec<String>,
}

impl PathRecorder {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `point` to the end of the trail.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point.to_memento());
    }

    /// Restores every recorded point in the order it was added.
    ///
    /// Entries that no longer decode are skipped.
    #[must_use]
    pub fn to_coordinates(&self) -> Vec<Point> {
        self.points
            .iter()
            .filter_map(|memento| match Point::from_memento(memento) {
                Ok(point) => Some(point),
                Err(error) => {
                    warn!(%error, "skipping unreadable trail entry");
                    None
                }
            })
            .collect()
    }

    /// Most recently recorded point, if any.
    #[must_use]
    pub fn last(&self) -> Option<Point> {
        self.points
            .last()
            .and_then(|memento| Point::from_memento(memento).ok())
    }

    /// Serialized trail entries.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.points
    }

    /// Replaces the trail with previously serialized entries.
    pub fn replace(&mut self, points: Vec<String>) {
        self.points = points;
    }

    /// Forgets every recorded point.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Number of recorded points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether the trail is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
