//! Procedural geometry used by the built-in scenes.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use super::{Mesh, MeshVertex, PointCloud, StarPoint};

/// Star color temperatures, blue-white to orange.
const STAR_TINTS: [[f32; 3]; 5] = [
    [0.70, 0.80, 1.00],
    [0.90, 0.93, 1.00],
    [1.00, 1.00, 1.00],
    [1.00, 0.93, 0.80],
    [1.00, 0.80, 0.60],
];

/// Uniformly distributed direction on the unit sphere.
pub fn random_direction(rng: &mut impl Rng) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let theta: f32 = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// A random star color and brightness.
pub fn random_star_color(rng: &mut impl Rng) -> [f32; 4] {
    let tint = STAR_TINTS[rng.random_range(0..STAR_TINTS.len())];
    let brightness: f32 = rng.random_range(0.35..=1.0);
    [
        tint[0] * brightness,
        tint[1] * brightness,
        tint[2] * brightness,
        1.0,
    ]
}

/// `count` stars scattered through a spherical shell between `inner` and
/// `outer` radius.
pub fn star_shell(
    rng: &mut impl Rng,
    count: usize,
    inner: f32,
    outer: f32,
    size: f32,
) -> PointCloud {
    let points = (0..count)
        .map(|_| {
            let radius = rng.random_range(inner..=outer.max(inner));
            let position = random_direction(rng) * radius;
            let scale: f32 = rng.random_range(0.5..=1.5);
            StarPoint {
                position: position.to_array(),
                size: size * scale * radius / outer.max(f32::EPSILON),
                color: random_star_color(rng),
            }
        })
        .collect();
    PointCloud { points }
}

/// Latitude/longitude sphere. `color` maps a unit normal to a vertex color.
pub fn uv_sphere(
    radius: f32,
    rings: u32,
    segments: u32,
    color: impl Fn(Vec3) -> [f32; 4],
) -> Mesh {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        for segment in 0..=segments {
            let theta = TAU * segment as f32 / segments as f32;
            let normal = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(MeshVertex {
                position: (normal * radius).to_array(),
                normal: normal.to_array(),
                color: color(normal),
            });
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }

    Mesh {
        vertices,
        indices,
        lit: true,
    }
}

/// Open cone with its apex at the origin, opening along +Y to `length`.
pub fn cone(radius: f32, length: f32, segments: u32, color: [f32; 4]) -> Mesh {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 2) as usize);
    for segment in 0..segments {
        let theta = TAU * segment as f32 / segments as f32;
        let rim = Vec3::new(radius * theta.cos(), length, radius * theta.sin());
        let normal = Vec3::new(theta.cos(), -radius / length.max(f32::EPSILON), theta.sin())
            .normalize_or_zero();
        vertices.push(MeshVertex {
            position: [0.0; 3],
            normal: normal.to_array(),
            color,
        });
        vertices.push(MeshVertex {
            position: rim.to_array(),
            normal: normal.to_array(),
            // Beams fade toward the rim.
            color: [color[0], color[1], color[2], 0.0],
        });
    }

    let mut indices = Vec::with_capacity((segments * 3) as usize);
    for segment in 0..segments {
        let apex = segment * 2;
        let rim = apex + 1;
        let next_rim = ((segment + 1) % segments) * 2 + 1;
        indices.extend_from_slice(&[apex, next_rim, rim]);
    }

    Mesh {
        vertices,
        indices,
        lit: false,
    }
}

/// Axis-aligned cube centered on the origin with flat-shaded faces.
pub fn cube(size: f32, color: [f32; 4]) -> Mesh {
    let h = size * 0.5;
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::NEG_Z, Vec3::X),
        (Vec3::Z, Vec3::Y, Vec3::NEG_X),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, up, side) in faces {
        let base = vertices.len() as u32;
        for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = (normal + side * u + up * v) * h;
            vertices.push(MeshVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                color,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh {
        vertices,
        indices,
        lit: true,
    }
}
