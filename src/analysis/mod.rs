/// Data analysis for the rainfall telemetry service.
///
/// Submodules:
/// - `outliers` — point-threshold outlier detection and the ordered
///   correction strategies applied to each station's series.

pub mod outliers;
