//! Spatial indexing for fast site lookups
//!
//! This module is only available with the `spatial-index` feature.

#[cfg(feature = "spatial-index")]
use glam::DVec2;
#[cfg(feature = "spatial-index")]
use kiddo::immutable::float::kdtree::ImmutableKdTree;
#[cfg(feature = "spatial-index")]
use kiddo::SquaredEuclidean;

#[cfg(feature = "spatial-index")]
use crate::site::Site;

/// Wrapper around a KD-tree over site positions
///
/// Answers two queries: the site nearest to a position (which by the Voronoi
/// property is the owner of the unclipped cell containing it), and all sites
/// within a radius of a point, used to prune ownership candidates per cell.
#[cfg(feature = "spatial-index")]
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
}

#[cfg(feature = "spatial-index")]
impl SpatialIndex {
    /// Build the index from the site snapshot
    ///
    /// Site indices into the input slice are the tree's items, so lookups
    /// stay valid for exactly as long as the snapshot does.
    pub fn new(sites: &[Site]) -> Self {
        let points: Vec<[f64; 2]> = sites
            .iter()
            .map(|site| [site.position.x, site.position.y])
            .collect();

        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
        }
    }

    /// Index of the site nearest to a position
    pub fn nearest(&self, position: DVec2) -> usize {
        let query = [position.x, position.y];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        result.item
    }

    /// Indices of all sites within `radius` of `center`
    ///
    /// The result is a superset guarantee, not an ordering: callers filter
    /// the candidates themselves.
    pub fn within_radius(&self, center: DVec2, radius: f64) -> Vec<usize> {
        let query = [center.x, center.y];
        self.tree
            .within_unsorted::<SquaredEuclidean>(&query, radius * radius)
            .into_iter()
            .map(|neighbour| neighbour.item)
            .collect()
    }
}
