// Copyright @yucwang 2026

use crate::core::config::GeometryConfig;
use crate::core::error::Error;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::shapes::cube::Cube;
use crate::shapes::cylinder::Cylinder;
use crate::shapes::disk::Disk;
use crate::shapes::rectangle::Rectangle;
use crate::shapes::sphere::Sphere;
use crate::shapes::triangle_mesh::TriangleMesh;

// Intersection data in the shape's local space.
pub struct LocalHit {
    pub t: Float,
    pub p: Vector3f,
    pub normal_geom: Vector3f,
    pub normal_shade: Vector3f,
    pub uv: Vector2f,
    pub tangent: Vector3f,
}

// Point drawn uniformly (by area) from the surface, local space.
pub struct SurfaceSample {
    pub p: Vector3f,
    pub normal: Vector3f,
    pub uv: Vector2f,
}

pub enum Shape {
    Sphere(Sphere),
    Cube(Cube),
    Rectangle(Rectangle),
    Disk(Disk),
    Cylinder(Cylinder),
    Mesh(TriangleMesh),
}

impl Shape {
    pub fn from_config(config: &GeometryConfig) -> Result<Self, Error> {
        match config {
            GeometryConfig::Sphere { center, radius } => {
                if *radius <= 0.0 {
                    return Err(Error::config("sphere with non-positive radius"));
                }
                Ok(Self::Sphere(Sphere::new(*center, *radius)))
            }
            GeometryConfig::Cube => Ok(Self::Cube(Cube::new())),
            GeometryConfig::Rectangle => Ok(Self::Rectangle(Rectangle::new())),
            GeometryConfig::Disk => Ok(Self::Disk(Disk::new())),
            GeometryConfig::Cylinder { p0, p1, radius } => {
                if *radius <= 0.0 || (p1 - p0).norm() <= 0.0 {
                    return Err(Error::config("degenerate cylinder"));
                }
                Ok(Self::Cylinder(Cylinder::new(*p0, *p1, *radius)))
            }
            GeometryConfig::Mesh(mesh) => Ok(Self::Mesh(TriangleMesh::build(mesh)?)),
        }
    }

    // The ray is in local space and its direction may be unnormalized;
    // `t` is measured against that direction so it transfers directly
    // back to world space.
    pub fn intersect(&self, ray: &Ray3f) -> Option<LocalHit> {
        match self {
            Self::Sphere(shape) => shape.intersect(ray),
            Self::Cube(shape) => shape.intersect(ray),
            Self::Rectangle(shape) => shape.intersect(ray),
            Self::Disk(shape) => shape.intersect(ray),
            Self::Cylinder(shape) => shape.intersect(ray),
            Self::Mesh(shape) => shape.intersect(ray),
        }
    }

    pub fn intersect_any(&self, ray: &Ray3f) -> bool {
        match self {
            Self::Mesh(shape) => shape.intersect_any(ray),
            _ => self.intersect(ray).is_some(),
        }
    }

    pub fn bounding_box(&self) -> AABB {
        match self {
            Self::Sphere(shape) => shape.bounding_box(),
            Self::Cube(shape) => shape.bounding_box(),
            Self::Rectangle(shape) => shape.bounding_box(),
            Self::Disk(shape) => shape.bounding_box(),
            Self::Cylinder(shape) => shape.bounding_box(),
            Self::Mesh(shape) => shape.bounding_box(),
        }
    }

    pub fn sample_surface(&self, u: &Vector2f) -> SurfaceSample {
        match self {
            Self::Sphere(shape) => shape.sample_surface(u),
            Self::Cube(shape) => shape.sample_surface(u),
            Self::Rectangle(shape) => shape.sample_surface(u),
            Self::Disk(shape) => shape.sample_surface(u),
            Self::Cylinder(shape) => shape.sample_surface(u),
            Self::Mesh(shape) => shape.sample_surface(u),
        }
    }

    pub fn surface_area(&self) -> Float {
        match self {
            Self::Sphere(shape) => shape.surface_area(),
            Self::Cube(shape) => shape.surface_area(),
            Self::Rectangle(shape) => shape.surface_area(),
            Self::Disk(shape) => shape.surface_area(),
            Self::Cylinder(shape) => shape.surface_area(),
            Self::Mesh(shape) => shape.surface_area(),
        }
    }
}
