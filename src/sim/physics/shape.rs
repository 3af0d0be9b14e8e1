//! Collider shapes and axis-aligned bounds
//!
//! `Shape` is the engine-independent description handed to the physics
//! world and read back from it. Polygons are stored in body-local space with
//! the centroid at the origin, so a body's position is its center of mass.

use glam::Vec2;
use rapier2d::prelude::{Point, Real, SharedShape};
use serde::{Deserialize, Serialize};

use crate::rotate;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Inclusive containment
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Exclusive containment (point strictly inside)
    #[inline]
    pub fn contains_strict(&self, p: Vec2) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }

    /// Box shrunk inward by `pad.x` on the left/right and `pad.y` on the top/bottom
    pub fn shrink(&self, pad: Vec2) -> Aabb {
        Aabb {
            min: self.min + pad,
            max: self.max - pad,
        }
    }
}

/// Collider geometry in body-local space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Rectangle centered on the origin
    Rect { half: Vec2 },
    /// Convex polygon, vertices relative to the centroid
    Polygon { vertices: Vec<Vec2> },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Rect {
            half: Vec2::new(width, height) / 2.0,
        }
    }

    /// Convex polygon from arbitrary vertices; recentered on the centroid.
    /// Returns the shape and the centroid that was subtracted.
    pub fn convex(vertices: &[Vec2]) -> (Self, Vec2) {
        let c = centroid(vertices);
        let local = vertices.iter().map(|v| *v - c).collect();
        (Shape::Polygon { vertices: local }, c)
    }

    /// Local-space outline; empty for circles
    pub fn vertices(&self) -> Vec<Vec2> {
        match self {
            Shape::Circle { .. } => Vec::new(),
            Shape::Rect { half } => vec![
                Vec2::new(-half.x, -half.y),
                Vec2::new(half.x, -half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(-half.x, half.y),
            ],
            Shape::Polygon { vertices } => vertices.clone(),
        }
    }

    /// Vertices in world space
    pub fn world_vertices(&self, position: Vec2, angle: f32) -> Vec<Vec2> {
        self.vertices()
            .into_iter()
            .map(|v| position + rotate(v, angle))
            .collect()
    }

    /// Scale relative to the current size, in body-local axes.
    /// Circles scale by `sx` (uniform).
    pub fn scale(&mut self, sx: f32, sy: f32) {
        match self {
            Shape::Circle { radius } => *radius *= sx,
            Shape::Rect { half } => *half *= Vec2::new(sx, sy),
            Shape::Polygon { vertices } => {
                for v in vertices.iter_mut() {
                    v.x *= sx;
                    v.y *= sy;
                }
            }
        }
    }

    /// Circle radius, if this is a circle
    pub fn radius(&self) -> Option<f32> {
        match self {
            Shape::Circle { radius } => Some(*radius),
            _ => None,
        }
    }

    /// Engine collider shape. Degenerate polygons fall back to their
    /// bounding rectangle.
    pub(crate) fn to_shared(&self) -> SharedShape {
        match self {
            Shape::Circle { radius } => SharedShape::ball(radius.max(f32::EPSILON)),
            Shape::Rect { half } => SharedShape::cuboid(half.x.max(f32::EPSILON), half.y.max(f32::EPSILON)),
            Shape::Polygon { vertices } => {
                let points: Vec<Point<Real>> = vertices.iter().map(|v| Point::new(v.x, v.y)).collect();
                SharedShape::convex_hull(&points).unwrap_or_else(|| {
                    log::warn!("Degenerate polygon with {} vertices, using its bounds", vertices.len());
                    let half = vertices
                        .iter()
                        .fold(Vec2::splat(f32::EPSILON), |acc, v| acc.max(v.abs()));
                    SharedShape::cuboid(half.x, half.y)
                })
            }
        }
    }

    /// Read back an engine collider shape
    pub(crate) fn from_shared(shape: &SharedShape) -> Self {
        if let Some(ball) = shape.as_ball() {
            Shape::Circle { radius: ball.radius }
        } else if let Some(cuboid) = shape.as_cuboid() {
            Shape::Rect {
                half: Vec2::new(cuboid.half_extents.x, cuboid.half_extents.y),
            }
        } else if let Some(polygon) = shape.as_convex_polygon() {
            Shape::Polygon {
                vertices: polygon.points().iter().map(|p| Vec2::new(p.x, p.y)).collect(),
            }
        } else {
            Shape::Polygon { vertices: Vec::new() }
        }
    }
}

/// Shoelace signed area (positive for counter-clockwise in y-up axes)
pub fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Area centroid of a simple polygon (falls back to the vertex mean when degenerate)
pub fn centroid(vertices: &[Vec2]) -> Vec2 {
    if vertices.is_empty() {
        return Vec2::ZERO;
    }
    let area = signed_area(vertices);
    if area.abs() < 1e-6 {
        return vertices.iter().copied().sum::<Vec2>() / vertices.len() as f32;
    }
    let n = vertices.len();
    let mut c = Vec2::ZERO;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        c += (a + b) * cross;
    }
    c / (6.0 * area)
}
