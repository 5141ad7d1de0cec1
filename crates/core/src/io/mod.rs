//! I/O for rasters, survey tables and vector boundaries
//!
//! Everything here opens a file, reads or writes it and closes it before
//! returning; no handle outlives a call.

mod geotiff;
mod tables;
mod vector;

pub use geotiff::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer, GeoTiffOptions,
};
pub use tables::{read_indicator_list, read_survey_csv, write_csv};
pub use vector::{read_boundary, read_zones, read_zones_from_str};
