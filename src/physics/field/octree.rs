//! Spatial octree for approximating space charge fields using the Barnes-Hut algorithm.

use super::FieldEvaluator;
use crate::error::{SimulationError, SimulationResult};
use crate::physics::aabb3d::Aabb3d;
use crate::physics::math::{Scalar, Vector, coulomb_field};
use crate::physics::particle::{Particle, ParticleId};
use bevy::log::warn;

const PADDING_FACTOR: Scalar = 0.1;
const MAX_DEPTH: usize = 64;
pub const DEFAULT_THETA: Scalar = 0.5;
pub const DEFAULT_LEAF_CAPACITY: usize = 4;
pub const DEFAULT_MIN_REGION_SIZE: Scalar = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeBody {
    pub id: ParticleId,
    pub position: Vector,
    pub charge: Scalar,
}

/// Running sums describing all charges below a node.
///
/// The sums are exact, so the centroid is always the true charge-weighted
/// average of the subtree regardless of insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChargeAggregate {
    pub count: usize,
    pub total_charge: Scalar,
    weighted_position_sum: Vector,
    position_sum: Vector,
}

impl ChargeAggregate {
    #[inline]
    fn add(&mut self, body: &OctreeBody) {
        self.count += 1;
        self.total_charge += body.charge;
        self.weighted_position_sum += body.position * body.charge;
        self.position_sum += body.position;
    }

    /// Charge-weighted centroid.
    ///
    /// Falls back to the unit-weight centroid for a neutral subtree and to
    /// `empty_center` when there are no charges at all.
    pub fn centroid(&self, empty_center: Vector) -> Vector {
        if self.count == 0 {
            empty_center
        } else if self.total_charge != 0.0 {
            self.weighted_position_sum / self.total_charge
        } else {
            self.position_sum / self.count as Scalar
        }
    }
}

#[derive(Debug, Clone)]
pub struct OctreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
    pub body_count: usize,
    pub total_charge: Scalar,
    pub center_of_charge: Vector,
}

#[derive(Debug)]
pub enum OctreeNode {
    Internal {
        bounds: Aabb3d,
        aggregate: ChargeAggregate,
        children: Box<[OctreeNode; 8]>,
    },
    External {
        bounds: Aabb3d,
        aggregate: ChargeAggregate,
        bodies: Vec<OctreeBody>,
    },
}

impl OctreeNode {
    fn empty_leaf(bounds: Aabb3d) -> Self {
        OctreeNode::External {
            bounds,
            aggregate: ChargeAggregate::default(),
            bodies: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Aabb3d {
        match self {
            OctreeNode::Internal { bounds, .. } => *bounds,
            OctreeNode::External { bounds, .. } => *bounds,
        }
    }

    pub fn aggregate(&self) -> &ChargeAggregate {
        match self {
            OctreeNode::Internal { aggregate, .. } => aggregate,
            OctreeNode::External { aggregate, .. } => aggregate,
        }
    }

    fn insert(&mut self, body: OctreeBody, leaf_capacity: usize, depth: usize) {
        let overflowing = match self {
            OctreeNode::Internal {
                bounds,
                aggregate,
                children,
            } => {
                aggregate.add(&body);
                let octant_index = bounds.octant_index(body.position);
                children[octant_index].insert(body, leaf_capacity, depth + 1);
                return;
            }
            OctreeNode::External {
                aggregate, bodies, ..
            } => {
                aggregate.add(&body);
                bodies.push(body);
                bodies.len() > leaf_capacity && depth < MAX_DEPTH
            }
        };

        if overflowing {
            self.subdivide(leaf_capacity, depth);
        }
    }

    /// Turn an overflowing leaf into an internal node with eight children
    fn subdivide(&mut self, leaf_capacity: usize, depth: usize) {
        let OctreeNode::External {
            bounds,
            aggregate,
            bodies,
        } = self
        else {
            return;
        };

        let bounds = *bounds;
        let aggregate = *aggregate;
        let bodies = std::mem::take(bodies);

        let mut children = Box::new(bounds.octants().map(OctreeNode::empty_leaf));
        for body in bodies {
            let octant_index = bounds.octant_index(body.position);
            children[octant_index].insert(body, leaf_capacity, depth + 1);
        }

        *self = OctreeNode::Internal {
            bounds,
            aggregate,
            children,
        };
    }
}

/// Barnes-Hut space charge solver.
///
/// The index is rebuilt from scratch every step. Leaves hold up to
/// `leaf_capacity` particles; a leaf that overflows is split into eight
/// octants and its particles pushed down, unless it already sits at the
/// maximum depth (coincident particles).
#[derive(Debug)]
pub struct SpatialChargeIndex {
    pub root: Option<OctreeNode>,
    theta: Scalar,
    leaf_capacity: usize,
    min_region_size: Scalar,
}

impl SpatialChargeIndex {
    pub fn new(theta: Scalar, leaf_capacity: usize) -> SimulationResult<Self> {
        if !theta.is_finite() || theta < 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "opening angle theta must be finite and non-negative, got {theta}"
            )));
        }
        if leaf_capacity == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "octree leaf capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            root: None,
            theta,
            leaf_capacity,
            min_region_size: DEFAULT_MIN_REGION_SIZE,
        })
    }

    /// Lower bound for the root region edge, keeps coincident particles from
    /// producing a zero-sized root
    pub fn with_min_region_size(mut self, min_region_size: Scalar) -> SimulationResult<Self> {
        if !min_region_size.is_finite() || min_region_size <= 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "minimum octree region size must be finite and positive, got {min_region_size}"
            )));
        }
        self.min_region_size = min_region_size;
        Ok(self)
    }

    pub fn theta(&self) -> Scalar {
        self.theta
    }

    pub fn leaf_capacity(&self) -> usize {
        self.leaf_capacity
    }

    /// Aggregate of the whole tree, `None` before the first non-empty build
    pub fn root_aggregate(&self) -> Option<&ChargeAggregate> {
        self.root.as_ref().map(OctreeNode::aggregate)
    }

    pub fn total_charge(&self) -> Scalar {
        self.root_aggregate().map_or(0.0, |aggregate| aggregate.total_charge)
    }

    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            node_count: 0,
            leaf_count: 0,
            max_depth: 0,
            body_count: 0,
            total_charge: 0.0,
            center_of_charge: Vector::ZERO,
        };

        if let Some(root) = &self.root {
            stats.total_charge = root.aggregate().total_charge;
            stats.center_of_charge = root.aggregate().centroid(root.bounds().center());
            Self::collect_stats(root, 0, &mut stats);
        }

        stats
    }

    fn collect_stats(node: &OctreeNode, depth: usize, stats: &mut OctreeStats) {
        stats.node_count += 1;
        stats.max_depth = stats.max_depth.max(depth);

        match node {
            OctreeNode::Internal { children, .. } => {
                for child in children.iter() {
                    Self::collect_stats(child, depth + 1, stats);
                }
            }
            OctreeNode::External { bodies, .. } => {
                stats.leaf_count += 1;
                stats.body_count += bodies.len();
            }
        }
    }

    /// Region bounds of every node down to `max_depth` (all levels for `None`)
    pub fn get_bounds(&self, max_depth: Option<usize>) -> Vec<Aabb3d> {
        let mut bounds = Vec::new();
        if let Some(root) = &self.root {
            Self::collect_bounds(root, &mut bounds, 0, max_depth);
        }
        bounds
    }

    fn collect_bounds(
        node: &OctreeNode,
        bounds: &mut Vec<Aabb3d>,
        current_depth: usize,
        max_depth: Option<usize>,
    ) {
        if max_depth.is_some_and(|max_depth| current_depth > max_depth) {
            return;
        }

        bounds.push(node.bounds());

        if let OctreeNode::Internal { children, .. } = node {
            for child in children.iter() {
                Self::collect_bounds(child, bounds, current_depth + 1, max_depth);
            }
        }
    }

    fn root_bounds(&self, bodies: &[OctreeBody]) -> Option<Aabb3d> {
        let enclosing = Aabb3d::enclosing(bodies.iter().map(|body| body.position))?;
        let edge = (enclosing.edge() * (1.0 + 2.0 * PADDING_FACTOR)).max(self.min_region_size);
        Some(Aabb3d::cube(enclosing.center(), edge))
    }

    fn accumulate_field(
        &self,
        node: &OctreeNode,
        point: Vector,
        exclude: Option<ParticleId>,
        field: &mut Vector,
    ) {
        match node {
            OctreeNode::External { bodies, .. } => {
                for body in bodies {
                    if Some(body.id) != exclude {
                        *field += coulomb_field(point, body.position, body.charge);
                    }
                }
            }
            OctreeNode::Internal {
                bounds,
                aggregate,
                children,
            } => {
                if aggregate.count == 0 {
                    return;
                }

                let centroid = aggregate.centroid(bounds.center());
                let distance = (point - centroid).length();

                // Barnes-Hut criterion: if s/d < theta, treat as a single pseudo-particle.
                // A node holding the evaluation point is always opened.
                if distance > 0.0
                    && !bounds.contains(point)
                    && bounds.edge() / distance < self.theta
                {
                    *field += coulomb_field(point, centroid, aggregate.total_charge);
                } else {
                    for child in children.iter() {
                        self.accumulate_field(child, point, exclude, field);
                    }
                }
            }
        }
    }
}

impl Default for SpatialChargeIndex {
    fn default() -> Self {
        Self {
            root: None,
            theta: DEFAULT_THETA,
            leaf_capacity: DEFAULT_LEAF_CAPACITY,
            min_region_size: DEFAULT_MIN_REGION_SIZE,
        }
    }
}

impl FieldEvaluator for SpatialChargeIndex {
    fn build(&mut self, particles: &[Particle]) {
        let mut skipped = 0usize;
        let bodies: Vec<OctreeBody> = particles
            .iter()
            .filter(|particle| particle.is_active())
            .filter(|particle| {
                let finite = particle.position.is_finite();
                skipped += usize::from(!finite);
                finite
            })
            .map(|particle| OctreeBody {
                id: particle.id,
                position: particle.position,
                charge: particle.charge,
            })
            .collect();

        if skipped > 0 {
            warn!(
                "Skipped {skipped} particles with non-finite positions while building the octree"
            );
        }

        self.root = self.root_bounds(&bodies).map(|bounds| {
            let mut root = OctreeNode::empty_leaf(bounds);
            for body in bodies {
                root.insert(body, self.leaf_capacity, 0);
            }
            root
        });
    }

    fn field_at(&self, point: Vector, exclude: Option<ParticleId>) -> Vector {
        let mut field = Vector::ZERO;
        if let Some(root) = &self.root {
            self.accumulate_field(root, point, exclude, &mut field);
        }
        field
    }

    fn source_count(&self) -> usize {
        self.root_aggregate().map_or(0, |aggregate| aggregate.count)
    }

    fn name(&self) -> &str {
        "octree"
    }
}
