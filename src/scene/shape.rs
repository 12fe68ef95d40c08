use glam::Vec3;

/// Primitive geometry a floating shape is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Torus,
    Box,
    Sphere,
    Cone,
    Tetrahedron,
    Octahedron,
    Dodecahedron,
    Icosahedron,
}

/// Local-space volume used for ray picking, before the entity transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickVolume {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        Self::Torus,
        Self::Box,
        Self::Sphere,
        Self::Cone,
        Self::Tetrahedron,
        Self::Octahedron,
        Self::Dodecahedron,
        Self::Icosahedron,
    ];

    // Torus: radius 0.4, tube 0.15. Box: 0.6 edge. Sphere: 0.4.
    // Cone: radius 0.4, height 0.8, centred. Polyhedra: circumradius 0.45.
    pub fn pick_volume(self) -> PickVolume {
        match self {
            Self::Torus => PickVolume::Box {
                half_extents: Vec3::new(0.55, 0.55, 0.15),
            },
            Self::Box => PickVolume::Box {
                half_extents: Vec3::splat(0.3),
            },
            Self::Sphere => PickVolume::Sphere { radius: 0.4 },
            Self::Cone => PickVolume::Box {
                half_extents: Vec3::splat(0.4),
            },
            Self::Tetrahedron | Self::Octahedron | Self::Dodecahedron | Self::Icosahedron => {
                PickVolume::Sphere { radius: 0.45 }
            }
        }
    }
}
