pub type Result<T> = std::result::Result<T, crate::error::StructureError>;

/// Grid extents along X, Y and Z.
pub type Size = (usize, usize, usize);

/// A cell position relative to the structure origin. Signed so that
/// negative input can be reported instead of wrapping.
pub type Coordinate = (i32, i32, i32);

/// Horizontal axis a structure can be mirrored along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Z,
}

/// Clockwise rotation about the vertical axis, seen from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Maps a degree value of 90, 180 or 270 (negative values count
    /// counter-clockwise) onto a rotation.
    pub fn from_degrees(degrees: i32) -> Option<Rotation> {
        match degrees.rem_euclid(360) {
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Clockwise180),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    pub fn swaps_horizontal_axes(self) -> bool {
        !matches!(self, Rotation::Clockwise180)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Clockwise270));
        assert_eq!(Rotation::from_degrees(540), Some(Rotation::Clockwise180));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::from_degrees(0), None);
    }
}
