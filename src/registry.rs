//! Stable integer ids of shapes, materials and acceleration structures.
//!
//! The ids tag payload entries so that a reader can rebuild the in-memory
//! types. They serialise as plain integers.

use serde::{Deserialize, Serialize};

use crate::detector::AccelKind;
use crate::frames::FrameId;
use crate::mask::Shape;
use crate::material::MaterialKind;


/// Shape ids of masks.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ShapeId {
    Annulus2 = 0,
    Cuboid3 = 1,
    Cylinder2 = 2,
    Cylinder3 = 3,
    PortalCylinder2 = 4,
    Rectangle2 = 5,
    Ring2 = 6,
    Trapezoid2 = 7,
    CellWire = 8,
    StrawWire = 9,
    Single1 = 10,
    Single2 = 11,
    Single3 = 12,
    Unknown = 13,
}

impl ShapeId {
    const KNOWN: [ShapeId; 13] = [
        ShapeId::Annulus2,
        ShapeId::Cuboid3,
        ShapeId::Cylinder2,
        ShapeId::Cylinder3,
        ShapeId::PortalCylinder2,
        ShapeId::Rectangle2,
        ShapeId::Ring2,
        ShapeId::Trapezoid2,
        ShapeId::CellWire,
        ShapeId::StrawWire,
        ShapeId::Single1,
        ShapeId::Single2,
        ShapeId::Single3,
    ];

    pub fn shape(&self) -> Option<Shape> {
        Shape::ALL
            .iter()
            .copied()
            .find(|shape| ShapeId::from(*shape) == *self)
    }
}

impl From<Shape> for ShapeId {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Annulus2 => ShapeId::Annulus2,
            Shape::Cuboid3 => ShapeId::Cuboid3,
            Shape::Cylinder2 => ShapeId::Cylinder2,
            Shape::Cylinder3 => ShapeId::Cylinder3,
            Shape::ConcentricCylinder2 => ShapeId::PortalCylinder2,
            Shape::Rectangle2 => ShapeId::Rectangle2,
            Shape::Ring2 => ShapeId::Ring2,
            Shape::Trapezoid2 => ShapeId::Trapezoid2,
            Shape::WireCell => ShapeId::CellWire,
            Shape::StrawTube => ShapeId::StrawWire,
            Shape::Single1 => ShapeId::Single1,
            Shape::Single2 => ShapeId::Single2,
            Shape::Single3 => ShapeId::Single3,
        }
    }
}

/// Material ids. Maps are tagged by the shape their frame belongs to.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MaterialId {
    Ring2Map = 0,
    Rectangle2Map = 1,
    Cuboid3Map = 2,
    ConcentricCylinder2Map = 3,
    Cylinder2Map = 4,
    Cylinder3Map = 5,
    Slab = 6,
    Rod = 7,
    RawMaterial = 8,
    Unknown = 9,
}

impl MaterialId {
    const KNOWN: [MaterialId; 9] = [
        MaterialId::Ring2Map,
        MaterialId::Rectangle2Map,
        MaterialId::Cuboid3Map,
        MaterialId::ConcentricCylinder2Map,
        MaterialId::Cylinder2Map,
        MaterialId::Cylinder3Map,
        MaterialId::Slab,
        MaterialId::Rod,
        MaterialId::RawMaterial,
    ];

    pub fn kind(&self) -> Option<MaterialKind> {
        let kind = match self {
            MaterialId::Ring2Map => MaterialKind::Map(FrameId::Polar2),
            MaterialId::Rectangle2Map => MaterialKind::Map(FrameId::Cartesian2),
            MaterialId::Cuboid3Map => MaterialKind::Map(FrameId::Cartesian3),
            MaterialId::ConcentricCylinder2Map => {
                MaterialKind::Map(FrameId::ConcentricCylindrical2)
            }
            MaterialId::Cylinder2Map => MaterialKind::Map(FrameId::Cylindrical2),
            MaterialId::Cylinder3Map => MaterialKind::Map(FrameId::Cylindrical3),
            MaterialId::Slab => MaterialKind::Slab,
            MaterialId::Rod => MaterialKind::Rod,
            MaterialId::RawMaterial => MaterialKind::Raw,
            MaterialId::Unknown => return None,
        };
        Some(kind)
    }
}

impl From<MaterialKind> for MaterialId {
    fn from(kind: MaterialKind) -> Self {
        match kind {
            MaterialKind::None => MaterialId::Unknown,
            MaterialKind::Slab => MaterialId::Slab,
            MaterialKind::Rod => MaterialId::Rod,
            MaterialKind::Raw => MaterialId::RawMaterial,
            MaterialKind::Map(frame) => match frame {
                FrameId::Polar2 => MaterialId::Ring2Map,
                FrameId::Cartesian2 => MaterialId::Rectangle2Map,
                FrameId::Cartesian3 => MaterialId::Cuboid3Map,
                FrameId::ConcentricCylindrical2 => MaterialId::ConcentricCylinder2Map,
                FrameId::Cylindrical2 => MaterialId::Cylinder2Map,
                FrameId::Cylindrical3 => MaterialId::Cylinder3Map,
            },
        }
    }
}

/// Acceleration structure ids. Grids are tagged by their frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AccelId {
    BruteForce = 0,
    Cartesian2Grid = 1,
    Cuboid3Grid = 2,
    Polar2Grid = 3,
    ConcentricCylinder2Grid = 4,
    Cylinder2Grid = 5,
    Cylinder3Grid = 6,
    Unknown = 7,
}

impl AccelId {
    const KNOWN: [AccelId; 7] = [
        AccelId::BruteForce,
        AccelId::Cartesian2Grid,
        AccelId::Cuboid3Grid,
        AccelId::Polar2Grid,
        AccelId::ConcentricCylinder2Grid,
        AccelId::Cylinder2Grid,
        AccelId::Cylinder3Grid,
    ];

    pub fn kind(&self) -> Option<AccelKind> {
        let frame = match self {
            AccelId::BruteForce => return Some(AccelKind::BruteForce),
            AccelId::Cartesian2Grid => FrameId::Cartesian2,
            AccelId::Cuboid3Grid => FrameId::Cartesian3,
            AccelId::Polar2Grid => FrameId::Polar2,
            AccelId::ConcentricCylinder2Grid => FrameId::ConcentricCylindrical2,
            AccelId::Cylinder2Grid => FrameId::Cylindrical2,
            AccelId::Cylinder3Grid => FrameId::Cylindrical3,
            AccelId::Unknown => return None,
        };
        Some(AccelKind::Grid(frame))
    }
}

impl From<AccelKind> for AccelId {
    fn from(kind: AccelKind) -> Self {
        match kind {
            AccelKind::BruteForce => AccelId::BruteForce,
            AccelKind::Grid(FrameId::Cartesian2) => AccelId::Cartesian2Grid,
            AccelKind::Grid(FrameId::Cartesian3) => AccelId::Cuboid3Grid,
            AccelKind::Grid(FrameId::Polar2) => AccelId::Polar2Grid,
            AccelKind::Grid(FrameId::ConcentricCylindrical2) => AccelId::ConcentricCylinder2Grid,
            AccelKind::Grid(FrameId::Cylindrical2) => AccelId::Cylinder2Grid,
            AccelKind::Grid(FrameId::Cylindrical3) => AccelId::Cylinder3Grid,
        }
    }
}

/// Integer conversions used by serde.
macro_rules! integer_id {
    ($id:ident) => {
        impl From<$id> for u8 {
            fn from(id: $id) -> u8 {
                id as u8
            }
        }

        impl TryFrom<u8> for $id {
            type Error = String;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                if value == $id::Unknown as u8 {
                    return Ok($id::Unknown);
                }
                $id::KNOWN
                    .get(value as usize)
                    .copied()
                    .ok_or_else(|| format!("{} is not a valid {}", value, stringify!($id)))
            }
        }
    };
}

integer_id!(ShapeId);
integer_id!(MaterialId);
integer_id!(AccelId);
