// Copyright @yucwang 2026

use crate::core::error::Error;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, EPSILON};

const SAH_BUCKETS: usize = 12;
const MAX_LEAF_SIZE: usize = 4;

pub const MAX_PRIMITIVES: usize = 1 << 24;
// 2 * log2(MAX_PRIMITIVES) + 8, rounded up to the stack size below.
pub const MAX_BVH_DEPTH: usize = 56;
const STACK_SIZE: usize = 64;

// Flat binned-SAH BVH. Interior nodes keep their left child adjacent
// and store the right child index; leaves store a primitive range.
#[derive(Clone)]
struct BvhNode {
    bounds: AABB,
    // Right child for interior nodes, first primitive for leaves.
    offset: u32,
    // Zero marks an interior node.
    count: u32,
    axis: u8,
}

pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
}

impl Bvh {
    pub fn build(prim_bounds: &[AABB], prim_centroids: &[Vector3f]) -> Result<Self, Error> {
        if prim_bounds.len() > MAX_PRIMITIVES {
            return Err(Error::too_large(format!(
                "{} primitives exceed the 2^24 cap", prim_bounds.len())));
        }

        let mut bvh = Self {
            nodes: Vec::new(),
            indices: (0..prim_bounds.len() as u32).collect(),
        };
        if !bvh.indices.is_empty() {
            bvh.nodes.reserve(2 * prim_bounds.len());
            let depth = bvh.build_node(prim_bounds, prim_centroids, 0, prim_bounds.len(), 1)?;
            if depth > MAX_BVH_DEPTH {
                return Err(Error::too_large(format!(
                    "BVH depth {} exceeds the {} bound", depth, MAX_BVH_DEPTH)));
            }
        }
        Ok(bvh)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // Closest-hit traversal. The callback intersects one primitive
    // against [min_t, t_max] and returns its payload and distance;
    // t_max shrinks monotonically as hits are found.
    pub fn intersect<T, F>(&self, origin: &Vector3f, dir: &Vector3f,
                           min_t: Float, max_t: Float, mut prim_fn: F) -> Option<(u32, T)>
    where
        F: FnMut(u32, Float) -> Option<(T, Float)>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let inv_dir = Vector3f::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let dir_neg = [dir.x < 0.0, dir.y < 0.0, dir.z < 0.0];

        let mut closest: Option<(u32, T)> = None;
        let mut closest_t = max_t;
        let mut stack = [0u32; STACK_SIZE];
        let mut stack_size = 1usize;

        while stack_size > 0 {
            stack_size -= 1;
            let node_idx = stack[stack_size];
            let node = &self.nodes[node_idx as usize];
            if !node.bounds.ray_intersect_fast(origin, &inv_dir, &dir_neg, min_t, closest_t) {
                continue;
            }

            if node.count > 0 {
                for i in 0..node.count as usize {
                    let prim = self.indices[node.offset as usize + i];
                    if let Some((payload, t)) = prim_fn(prim, closest_t) {
                        if t >= min_t && t < closest_t {
                            closest_t = t;
                            closest = Some((prim, payload));
                        }
                    }
                }
            } else {
                // Descend the near child first, ordered by the ray
                // direction along the split axis.
                let left = node_idx + 1;
                let right = node.offset;
                let (near, far) = if dir_neg[node.axis as usize] {
                    (right, left)
                } else {
                    (left, right)
                };
                stack[stack_size] = far;
                stack[stack_size + 1] = near;
                stack_size += 2;
            }
        }

        closest
    }

    // Early-out traversal for shadow rays.
    pub fn intersect_any<F>(&self, origin: &Vector3f, dir: &Vector3f,
                            min_t: Float, max_t: Float, mut prim_fn: F) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }

        let inv_dir = Vector3f::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let dir_neg = [dir.x < 0.0, dir.y < 0.0, dir.z < 0.0];

        let mut stack = [0u32; STACK_SIZE];
        let mut stack_size = 1usize;

        while stack_size > 0 {
            stack_size -= 1;
            let node_idx = stack[stack_size];
            let node = &self.nodes[node_idx as usize];
            if !node.bounds.ray_intersect_fast(origin, &inv_dir, &dir_neg, min_t, max_t) {
                continue;
            }

            if node.count > 0 {
                for i in 0..node.count as usize {
                    if prim_fn(self.indices[node.offset as usize + i]) {
                        return true;
                    }
                }
            } else {
                stack[stack_size] = node_idx + 1;
                stack[stack_size + 1] = node.offset;
                stack_size += 2;
            }
        }

        false
    }

    fn build_node(&mut self, prim_bounds: &[AABB], prim_centroids: &[Vector3f],
                  start: usize, end: usize, depth: usize) -> Result<usize, Error> {
        let count = end - start;
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for i in start..end {
            let idx = self.indices[i] as usize;
            bounds.expand_by_aabb(&prim_bounds[idx]);
            centroid_bounds.expand_by_point(&prim_centroids[idx]);
        }
        bounds.expand_degenerate(EPSILON);

        if count <= MAX_LEAF_SIZE {
            self.push_leaf(bounds, start, count);
            return Ok(depth);
        }
        if depth >= MAX_BVH_DEPTH {
            return Err(Error::too_large(format!(
                "BVH depth exceeds the {} bound", MAX_BVH_DEPTH)));
        }

        // Binned SAH over all three axes.
        let diag = centroid_bounds.diagnal();
        let mut best_cost = Float::MAX;
        let mut best_axis = usize::MAX;
        let mut best_split = 0usize;
        for axis in 0..3 {
            let extent = diag[axis];
            if extent <= 1e-6 {
                continue;
            }
            let axis_min = centroid_bounds.p_min[axis];

            let mut buckets = [(0usize, AABB::default()); SAH_BUCKETS];
            for i in start..end {
                let idx = self.indices[i] as usize;
                let b = bucket_of(prim_centroids[idx][axis], axis_min, extent);
                buckets[b].0 += 1;
                buckets[b].1.expand_by_aabb(&prim_bounds[idx]);
            }

            let area = bounds.surface_area().max(1e-6);
            for split in 0..(SAH_BUCKETS - 1) {
                let mut left = AABB::default();
                let mut right = AABB::default();
                let mut n_left = 0usize;
                let mut n_right = 0usize;
                for b in 0..=split {
                    n_left += buckets[b].0;
                    left.expand_by_aabb(&buckets[b].1);
                }
                for b in (split + 1)..SAH_BUCKETS {
                    n_right += buckets[b].0;
                    right.expand_by_aabb(&buckets[b].1);
                }
                if n_left == 0 || n_right == 0 {
                    continue;
                }
                let cost = 1.0
                    + (left.surface_area() * n_left as Float
                        + right.surface_area() * n_right as Float) / area;
                if cost < best_cost {
                    best_cost = cost;
                    best_axis = axis;
                    best_split = split;
                }
            }
        }

        // If no split beats intersecting everything, make a leaf.
        if best_axis == usize::MAX || best_cost >= count as Float {
            self.push_leaf(bounds, start, count);
            return Ok(depth);
        }

        let axis_min = centroid_bounds.p_min[best_axis];
        let extent = diag[best_axis];
        let mut mid = start;
        for i in start..end {
            let idx = self.indices[i] as usize;
            if bucket_of(prim_centroids[idx][best_axis], axis_min, extent) <= best_split {
                self.indices.swap(i, mid);
                mid += 1;
            }
        }
        if mid == start || mid == end {
            self.push_leaf(bounds, start, count);
            return Ok(depth);
        }

        let node_idx = self.nodes.len();
        self.nodes.push(BvhNode {
            bounds,
            offset: 0,
            count: 0,
            axis: best_axis as u8,
        });
        let left_depth = self.build_node(prim_bounds, prim_centroids, start, mid, depth + 1)?;
        self.nodes[node_idx].offset = self.nodes.len() as u32;
        let right_depth = self.build_node(prim_bounds, prim_centroids, mid, end, depth + 1)?;
        Ok(left_depth.max(right_depth))
    }

    fn push_leaf(&mut self, bounds: AABB, start: usize, count: usize) {
        self.nodes.push(BvhNode {
            bounds,
            offset: start as u32,
            count: count as u32,
            axis: 0,
        });
    }
}

fn bucket_of(centroid: Float, axis_min: Float, extent: Float) -> usize {
    let mut b = ((centroid - axis_min) / extent * SAH_BUCKETS as Float) as usize;
    if b >= SAH_BUCKETS {
        b = SAH_BUCKETS - 1;
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Sampler;

    fn boxes(n: usize) -> (Vec<AABB>, Vec<Vector3f>) {
        let mut sampler = Sampler::new(99, 0);
        let mut bounds = Vec::with_capacity(n);
        let mut centroids = Vec::with_capacity(n);
        for _ in 0..n {
            let c = Vector3f::new(
                sampler.next_f32() * 20.0 - 10.0,
                sampler.next_f32() * 20.0 - 10.0,
                sampler.next_f32() * 20.0 - 10.0,
            );
            let half = 0.1 + 0.4 * sampler.next_f32();
            let h = Vector3f::new(half, half, half);
            bounds.push(AABB::new(c - h, c + h));
            centroids.push(c);
        }
        (bounds, centroids)
    }

    // Ray-box distance used as the primitive intersector.
    fn box_hit(aabb: &AABB, origin: &Vector3f, dir: &Vector3f, max_t: Float) -> Option<Float> {
        let mut t0 = 0.0f32;
        let mut t1 = max_t;
        for idx in 0..3 {
            let inv = 1.0 / dir[idx];
            let mut near = (aabb.p_min[idx] - origin[idx]) * inv;
            let mut far = (aabb.p_max[idx] - origin[idx]) * inv;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = t0.max(near);
            t1 = t1.min(far);
            if t0 > t1 {
                return None;
            }
        }
        Some(t0)
    }

    #[test]
    fn test_matches_brute_force() {
        let (bounds, centroids) = boxes(300);
        let bvh = Bvh::build(&bounds, &centroids).unwrap();
        let mut sampler = Sampler::new(7, 1);

        for _ in 0..1000 {
            let origin = Vector3f::new(
                sampler.next_f32() * 30.0 - 15.0,
                sampler.next_f32() * 30.0 - 15.0,
                -30.0,
            );
            let dir = Vector3f::new(
                sampler.next_f32() - 0.5,
                sampler.next_f32() - 0.5,
                1.0,
            ).normalize();

            let got = bvh.intersect(&origin, &dir, 0.0, Float::MAX, |prim, max_t| {
                box_hit(&bounds[prim as usize], &origin, &dir, max_t).map(|t| (t, t))
            });

            let mut want: Option<(u32, Float)> = None;
            for (idx, aabb) in bounds.iter().enumerate() {
                if let Some(t) = box_hit(aabb, &origin, &dir, Float::MAX) {
                    if want.map_or(true, |(_, best)| t < best) {
                        want = Some((idx as u32, t));
                    }
                }
            }

            match (got, want) {
                (None, None) => {}
                (Some((gi, gt)), Some((wi, wt))) => {
                    assert_eq!(gi, wi);
                    assert!((gt - wt).abs() < 1e-4);
                }
                (got, want) => panic!("mismatch: {:?} vs {:?}",
                                      got.map(|g| g.0), want.map(|w| w.0)),
            }
        }
    }

    #[test]
    fn test_intersect_any_finds_occluder() {
        let (bounds, centroids) = boxes(64);
        let bvh = Bvh::build(&bounds, &centroids).unwrap();
        let target = bounds[0].center();
        let origin = Vector3f::new(target.x, target.y, -40.0);
        let dir = Vector3f::new(0.0, 0.0, 1.0);
        let any = bvh.intersect_any(&origin, &dir, 0.0, Float::MAX, |prim| {
            box_hit(&bounds[prim as usize], &origin, &dir, Float::MAX).is_some()
        });
        assert!(any);

        let miss = bvh.intersect_any(&origin, &dir, 0.0, 1e-3, |prim| {
            box_hit(&bounds[prim as usize], &origin, &dir, 1e-3).is_some()
        });
        assert!(!miss);
    }

    #[test]
    fn test_single_primitive() {
        let bounds = vec![AABB::new(Vector3f::zeros(), Vector3f::new(1.0, 1.0, 1.0))];
        let centroids = vec![Vector3f::new(0.5, 0.5, 0.5)];
        let bvh = Bvh::build(&bounds, &centroids).unwrap();
        assert_eq!(bvh.node_count(), 1);
    }

    #[test]
    fn test_identical_centroids_make_leaves() {
        // All centroids coincide: no split axis works, so the builder
        // must fall back to leaves instead of recursing forever.
        let aabb = AABB::new(Vector3f::zeros(), Vector3f::new(1.0, 1.0, 1.0));
        let bounds = vec![aabb; 16];
        let centroids = vec![Vector3f::new(0.5, 0.5, 0.5); 16];
        let bvh = Bvh::build(&bounds, &centroids).unwrap();
        assert!(bvh.node_count() >= 1);
    }
}
