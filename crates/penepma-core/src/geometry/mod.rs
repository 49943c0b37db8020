pub mod export;
pub mod module;
pub mod surface;

pub use export::{GeometryInfo, MaterialFile, build_geometry, export_geometry};
pub use module::{GeometryBody, Module, ModuleId, PenelopeGeometry, SurfaceId};
pub use surface::{Rotation, Scale, Shift, Surface, to_exponent};
