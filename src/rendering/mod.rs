//! Rendering: fragment layout, paint/SVG serialization and raster encoding

pub mod layout;
pub mod paint;
pub mod raster;

pub use raster::{
    decode_snapshot, DecodedImage, DrawingSurface, EncodeOutcome, PixmapSurface, PixmapSurfaces,
    RasterEncoder, RasterResult, SurfaceProvider,
};
