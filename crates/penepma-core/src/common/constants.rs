//! PENEPMA structural limits and fixed defaults.

/// Maximum number of photon detectors (`PDANGL` blocks).
pub const MAX_PHOTON_DETECTORS: usize = 25;
/// Maximum number of `XRLINE` entries; each transition takes two.
pub const MAX_SPATIAL_DISTRIBUTION: usize = 10;
pub const MAX_PHOTON_DETECTOR_CHANNEL: usize = 1000;
pub const MAX_DEPTH_CHANNELS: usize = 100;
pub const MAX_STEP_LENGTH_M: f64 = 1.0e20;
pub const DEFAULT_DUMP_PERIOD_S: f64 = 60.0;
pub const DEFAULT_ABSORPTION_ENERGY_EV: f64 = 50.0;
pub const DEFAULT_CUTOFF_ENERGY_EV: f64 = 50.0;
/// Value written for `NSIMSH` and `TIME` when no limit applies.
pub const UNLIMITED: f64 = 1.0e38;
/// Smallest depth range of the spatial distribution box, in meters.
pub const MIN_DEPTH_RANGE_M: f64 = 1.0e-8;
pub const MAX_LINE_LENGTH: usize = 80;
pub const DUMP_FILENAME: &str = "dump.dat";
