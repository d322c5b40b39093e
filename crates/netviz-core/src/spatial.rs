use crate::architecture::{NetworkGraph, NeuronKey};
use crate::geometry::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A laid-out neuron centre, as stored in the hit-test index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeuronLocation {
    pub key: NeuronKey,
    pub position: [f64; 2],
}

impl RTreeObject for NeuronLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for NeuronLocation {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Build an R*-tree over neuron centres via bulk_load.
pub fn build_index(graph: &NetworkGraph) -> RTree<NeuronLocation> {
    let locations = graph
        .neurons()
        .map(|n| NeuronLocation {
            key: n.key,
            position: [n.position.x, n.position.y],
        })
        .collect();
    RTree::bulk_load(locations)
}

/// The neuron whose disc of `radius` contains `at`; the nearest centre wins
/// when discs overlap.
pub fn neuron_at(tree: &RTree<NeuronLocation>, at: Point, radius: f64) -> Option<NeuronKey> {
    let query = [at.x, at.y];
    tree.nearest_neighbor(&query)
        .filter(|loc| loc.distance_2(&query) <= radius * radius)
        .map(|loc| loc.key)
}
