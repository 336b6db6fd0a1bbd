// Copyright @yucwang 2026

use crate::core::bvh::Bvh;
use crate::core::config::MeshConfig;
use crate::core::error::Error;
use crate::core::shape::{LocalHit, SurfaceSample};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;

pub struct TriangleMesh {
    positions: Vec<Vector3f>,
    indices: Vec<[u32; 3]>,
    normals: Option<Vec<Vector3f>>,
    texcoords: Option<Vec<Vector2f>>,
    tangents: Option<Vec<Vector3f>>,
    blas: Bvh,
    bounds: AABB,
    // Prefix sums of triangle areas, for area-uniform sampling.
    area_cdf: Vec<Float>,
    total_area: Float,
}

struct TriangleHit {
    t: Float,
    u: Float,
    v: Float,
}

impl TriangleMesh {
    pub fn build(config: &MeshConfig) -> Result<Self, Error> {
        let positions = config.positions.clone();
        let n_vertices = positions.len() as u32;

        // Degenerate triangles are dropped silently.
        let mut indices = Vec::with_capacity(config.indices.len());
        for tri in &config.indices {
            if tri.iter().any(|&i| i >= n_vertices) {
                return Err(Error::config(format!(
                    "triangle index {:?} out of range", tri)));
            }
            let e1 = positions[tri[1] as usize] - positions[tri[0] as usize];
            let e2 = positions[tri[2] as usize] - positions[tri[0] as usize];
            if e1.cross(&e2).norm_squared() > 0.0 {
                indices.push(*tri);
            }
        }
        if indices.is_empty() {
            return Err(Error::config("mesh with no non-degenerate triangles"));
        }

        let check_len = |len: usize, what: &str| -> Result<(), Error> {
            if len != positions.len() {
                Err(Error::config(format!("mesh {} buffer length mismatch", what)))
            } else {
                Ok(())
            }
        };
        if let Some(normals) = &config.normals {
            check_len(normals.len(), "normal")?;
        }
        if let Some(texcoords) = &config.texcoords {
            check_len(texcoords.len(), "texcoord")?;
        }
        if let Some(tangents) = &config.tangents {
            check_len(tangents.len(), "tangent")?;
        }

        let mut bounds = AABB::default();
        let mut prim_bounds = Vec::with_capacity(indices.len());
        let mut prim_centroids = Vec::with_capacity(indices.len());
        let mut area_cdf = Vec::with_capacity(indices.len());
        let mut total_area = 0.0;
        for tri in &indices {
            let p0 = positions[tri[0] as usize];
            let p1 = positions[tri[1] as usize];
            let p2 = positions[tri[2] as usize];
            let mut aabb = AABB::default();
            aabb.expand_by_point(&p0);
            aabb.expand_by_point(&p1);
            aabb.expand_by_point(&p2);
            bounds.expand_by_aabb(&aabb);
            prim_centroids.push(aabb.center());
            prim_bounds.push(aabb);
            total_area += 0.5 * (p1 - p0).cross(&(p2 - p0)).norm();
            area_cdf.push(total_area);
        }

        let blas = Bvh::build(&prim_bounds, &prim_centroids)?;

        Ok(Self {
            positions,
            indices,
            normals: config.normals.clone(),
            texcoords: config.texcoords.clone(),
            tangents: config.tangents.clone(),
            blas,
            bounds,
            area_cdf,
            total_area,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle(&self, index: usize) -> (Vector3f, Vector3f, Vector3f) {
        let tri = self.indices[index];
        (
            self.positions[tri[0] as usize],
            self.positions[tri[1] as usize],
            self.positions[tri[2] as usize],
        )
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<LocalHit> {
        let origin = ray.origin();
        let dir = ray.dir();
        let hit = self.blas.intersect(&origin, &dir, ray.min_t, ray.max_t, |prim, _| {
            self.intersect_triangle(prim as usize, ray)
                .map(|tri_hit| { let t = tri_hit.t; (tri_hit, t) })
        });
        hit.map(|(prim, tri_hit)| self.fill_hit(prim as usize, &tri_hit, ray))
    }

    pub fn intersect_any(&self, ray: &Ray3f) -> bool {
        let origin = ray.origin();
        let dir = ray.dir();
        self.blas.intersect_any(&origin, &dir, ray.min_t, ray.max_t, |prim| {
            self.intersect_triangle(prim as usize, ray).is_some()
        })
    }

    // Moeller-Trumbore.
    fn intersect_triangle(&self, index: usize, ray: &Ray3f) -> Option<TriangleHit> {
        let (p0, p1, p2) = self.triangle(index);
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let d = ray.dir();

        let pvec = d.cross(&e2);
        let det = e1.dot(&pvec);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = ray.origin() - p0;
        let u = tvec.dot(&pvec) * inv_det;
        if u < -1e-7 || u > 1.0 + 1e-7 {
            return None;
        }
        let qvec = tvec.cross(&e1);
        let v = d.dot(&qvec) * inv_det;
        if v < -1e-7 || u + v > 1.0 + 1e-7 {
            return None;
        }
        let t = e2.dot(&qvec) * inv_det;
        if !ray.test_segment(t) {
            return None;
        }
        Some(TriangleHit { t, u: u.max(0.0), v: v.max(0.0) })
    }

    fn fill_hit(&self, index: usize, tri_hit: &TriangleHit, ray: &Ray3f) -> LocalHit {
        let tri = self.indices[index];
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (p0, p1, p2) = self.triangle(index);
        let w = 1.0 - tri_hit.u - tri_hit.v;

        let normal_geom = (p1 - p0).cross(&(p2 - p0)).normalize();
        let normal_shade = match &self.normals {
            Some(normals) => {
                let n = normals[i0] * w + normals[i1] * tri_hit.u + normals[i2] * tri_hit.v;
                if n.norm_squared() > 0.0 { n.normalize() } else { normal_geom }
            }
            None => normal_geom,
        };

        let uv = match &self.texcoords {
            Some(texcoords) => {
                texcoords[i0] * w + texcoords[i1] * tri_hit.u + texcoords[i2] * tri_hit.v
            }
            None => Vector2f::new(tri_hit.u, tri_hit.v),
        };

        let tangent = match &self.tangents {
            Some(tangents) => {
                let t = tangents[i0] * w + tangents[i1] * tri_hit.u + tangents[i2] * tri_hit.v;
                if t.norm_squared() > 0.0 { t.normalize() } else { self.uv_tangent(index, normal_shade) }
            }
            None => self.uv_tangent(index, normal_shade),
        };

        LocalHit {
            t: tri_hit.t,
            p: ray.at(tri_hit.t),
            normal_geom,
            normal_shade,
            uv,
            tangent,
        }
    }

    // Tangent from the uv gradient when vertex tangents are missing,
    // else an arbitrary frame axis.
    fn uv_tangent(&self, index: usize, normal: Vector3f) -> Vector3f {
        if let Some(texcoords) = &self.texcoords {
            let tri = self.indices[index];
            let (p0, p1, p2) = self.triangle(index);
            let uv0 = texcoords[tri[0] as usize];
            let uv1 = texcoords[tri[1] as usize];
            let uv2 = texcoords[tri[2] as usize];
            let duv1 = uv1 - uv0;
            let duv2 = uv2 - uv0;
            let det = duv1.x * duv2.y - duv1.y * duv2.x;
            if det.abs() > 1e-10 {
                let inv_det = 1.0 / det;
                let dpdu = ((p1 - p0) * duv2.y - (p2 - p0) * duv1.y) * inv_det;
                // Project onto the tangent plane.
                let t = dpdu - normal * normal.dot(&dpdu);
                if t.norm_squared() > 1e-12 {
                    return t.normalize();
                }
            }
        }
        Frame::from_normal(normal).t
    }

    pub fn bounding_box(&self) -> AABB {
        self.bounds
    }

    pub fn sample_surface(&self, u: &Vector2f) -> SurfaceSample {
        // Pick a triangle proportionally to area, then reuse the
        // stretched remainder for the barycentric warp.
        let target = u.x * self.total_area;
        let index = match self.area_cdf.binary_search_by(|probe| {
            probe.partial_cmp(&target).unwrap_or(std::cmp::Ordering::Less)
        }) {
            Ok(idx) => idx,
            Err(idx) => idx.min(self.area_cdf.len() - 1),
        };

        let low = if index == 0 { 0.0 } else { self.area_cdf[index - 1] };
        let span = (self.area_cdf[index] - low).max(1e-12);
        let u1 = ((target - low) / span).clamp(0.0, 1.0 - 1e-6);

        self.sample_triangle(index, &Vector2f::new(u1, u.y))
    }

    // Uniform point on one triangle via the square-root warp.
    pub fn sample_triangle(&self, index: usize, u: &Vector2f) -> SurfaceSample {
        let sqrt_u1 = u.x.sqrt();
        let b0 = 1.0 - sqrt_u1;
        let b1 = u.y * sqrt_u1;
        let b2 = 1.0 - b0 - b1;

        let tri = self.indices[index];
        let (p0, p1, p2) = self.triangle(index);
        let p = p0 * b0 + p1 * b1 + p2 * b2;
        let normal_geom = (p1 - p0).cross(&(p2 - p0)).normalize();
        let normal = match &self.normals {
            Some(normals) => {
                let n = normals[tri[0] as usize] * b0
                    + normals[tri[1] as usize] * b1
                    + normals[tri[2] as usize] * b2;
                if n.norm_squared() > 0.0 { n.normalize() } else { normal_geom }
            }
            None => normal_geom,
        };
        let uv = match &self.texcoords {
            Some(texcoords) => {
                texcoords[tri[0] as usize] * b0
                    + texcoords[tri[1] as usize] * b1
                    + texcoords[tri[2] as usize] * b2
            }
            None => Vector2f::new(b1, b2),
        };

        SurfaceSample { p, normal, uv }
    }

    pub fn surface_area(&self) -> Float {
        self.total_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Sampler;

    fn quad() -> MeshConfig {
        MeshConfig {
            positions: vec![
                Vector3f::new(-1.0, -1.0, 0.0),
                Vector3f::new(1.0, -1.0, 0.0),
                Vector3f::new(1.0, 1.0, 0.0),
                Vector3f::new(-1.0, 1.0, 0.0),
            ],
            indices: vec![[0, 1, 2], [0, 2, 3]],
            normals: None,
            texcoords: Some(vec![
                Vector2f::new(0.0, 0.0),
                Vector2f::new(1.0, 0.0),
                Vector2f::new(1.0, 1.0),
                Vector2f::new(0.0, 1.0),
            ]),
            tangents: None,
            bitangents: None,
        }
    }

    #[test]
    fn test_hit_interpolates_uv() {
        let mesh = TriangleMesh::build(&quad()).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.5, -0.5, 2.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit = mesh.intersect(&ray).expect("ray must hit");
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.uv - Vector2f::new(0.75, 0.25)).norm() < 1e-4);
        assert!(hit.tangent.dot(&hit.normal_geom).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_triangles_dropped() {
        let mut config = quad();
        config.indices.push([0, 0, 1]);
        let mesh = TriangleMesh::build(&config).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_area_and_sampling() {
        let mesh = TriangleMesh::build(&quad()).unwrap();
        assert!((mesh.surface_area() - 4.0).abs() < 1e-5);

        let mut sampler = Sampler::new(3, 3);
        for _ in 0..256 {
            let s = mesh.sample_surface(&sampler.next_2d());
            assert!(s.p.x.abs() <= 1.0 + 1e-5);
            assert!(s.p.y.abs() <= 1.0 + 1e-5);
            assert!(s.p.z.abs() < 1e-6);
        }
    }

    #[test]
    fn test_intersect_any_respects_range() {
        let mesh = TriangleMesh::build(&quad()).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 2.0),
                             Vector3f::new(0.0, 0.0, -1.0), Some(0.0), Some(1.0));
        assert!(!mesh.intersect_any(&ray));
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 2.0),
                             Vector3f::new(0.0, 0.0, -1.0), Some(0.0), Some(3.0));
        assert!(mesh.intersect_any(&ray));
    }
}
