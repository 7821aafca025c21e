//! Renderable objects and their grid placement

use crate::foundation::math::Vec3;

/// Number of cells along each side of the instance grid
pub const GRID_SIZE: u32 = 7;

/// Distance between neighbouring grid cells
pub const GRID_SPACING: f32 = 2.5;

/// Objects the demo can display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// UV sphere
    Sphere,
    /// Utah teapot
    Teapot,
    /// Torus knot
    Torusknot,
    /// Venus bust
    Venus,
    /// Square plane
    Plane,
    /// Circular plane
    PlaneCircle,
}

impl ObjectKind {
    /// All objects in selection order
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Sphere,
        ObjectKind::Teapot,
        ObjectKind::Torusknot,
        ObjectKind::Venus,
        ObjectKind::Plane,
        ObjectKind::PlaneCircle,
    ];

    /// Object at a selection index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Selection index of this object
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Sphere => "Sphere",
            ObjectKind::Teapot => "Teapot",
            ObjectKind::Torusknot => "Torusknot",
            ObjectKind::Venus => "Venus",
            ObjectKind::Plane => "plane",
            ObjectKind::PlaneCircle => "plane_circle",
        }
    }

    /// glTF file under the models directory
    pub fn file_name(self) -> &'static str {
        match self {
            ObjectKind::Sphere => "sphere.gltf",
            ObjectKind::Teapot => "teapot.gltf",
            ObjectKind::Torusknot => "torusknot.gltf",
            ObjectKind::Venus => "venus.gltf",
            ObjectKind::Plane => "plane.gltf",
            ObjectKind::PlaneCircle => "plane_circle.gltf",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// World position of grid cell (`x`, `y`)
///
/// Cell (x, y) sits at `((x - 3.5) * 2.5, 0, (y - 3.5) * 2.5)`, so the lattice
/// spans -8.75..=6.25 on both axes.
pub fn grid_position(x: u32, y: u32) -> Vec3 {
    let center = GRID_SIZE as f32 / 2.0;
    Vec3::new(
        (x as f32 - center) * GRID_SPACING,
        0.0,
        (y as f32 - center) * GRID_SPACING,
    )
}

/// Every grid position in draw order: rows of `y`, then columns of `x`
pub fn grid_positions() -> impl Iterator<Item = Vec3> {
    (0..GRID_SIZE).flat_map(|y| (0..GRID_SIZE).map(move |x| grid_position(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_catalog_names_and_files() {
        let names: Vec<_> = ObjectKind::ALL.iter().map(|o| o.name()).collect();
        assert_eq!(names, ["Sphere", "Teapot", "Torusknot", "Venus", "plane", "plane_circle"]);
        assert_eq!(ObjectKind::PlaneCircle.file_name(), "plane_circle.gltf");
        assert!(names.iter().all(|n| !n.is_empty()));
    }

    #[test]
    fn test_index_round_trip() {
        for (index, object) in ObjectKind::ALL.iter().enumerate() {
            assert_eq!(object.index(), index);
            assert_eq!(ObjectKind::from_index(index), Some(*object));
        }
        assert_eq!(ObjectKind::from_index(6), None);
    }

    #[test]
    fn test_grid_positions() {
        assert_relative_eq!(grid_position(0, 0), Vec3::new(-8.75, 0.0, -8.75));
        assert_relative_eq!(grid_position(6, 6), Vec3::new(6.25, 0.0, 6.25));
        assert_relative_eq!(grid_position(3, 3), Vec3::new(-1.25, 0.0, -1.25));
        assert_relative_eq!(grid_position(4, 1), Vec3::new(1.25, 0.0, -6.25));
    }

    #[test]
    fn test_grid_iteration_order() {
        let positions: Vec<_> = grid_positions().collect();

        assert_eq!(positions.len(), 49);
        // x varies fastest
        assert_relative_eq!(positions[1], grid_position(1, 0));
        assert_relative_eq!(positions[7], grid_position(0, 1));
    }
}
