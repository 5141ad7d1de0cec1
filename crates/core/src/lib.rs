//! # covmap core
//!
//! Core types, traits and I/O for the covmap coverage-mapping workspace.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System tag carried by rasters
//! - Survey data model: `SampleLocation`, `AreaType`, `IndicatorDescriptor`
//! - Zone data model for settlements and administrative units
//! - I/O for GeoTIFF rasters, survey CSV tables and GeoJSON boundaries

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod survey;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use survey::{AreaType, IndicatorDescriptor, SampleLocation, SurveyTable};
pub use vector::{Boundary, Zone};

/// Nodata sentinel written into every indicator raster.
pub const INDICATOR_NODATA: f64 = -9999.0;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::survey::{AreaType, IndicatorDescriptor, SampleLocation, SurveyTable};
    pub use crate::vector::{Boundary, Zone};
    pub use crate::Algorithm;
    pub use crate::INDICATOR_NODATA;
}

/// Core trait for the estimation and validation steps.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
