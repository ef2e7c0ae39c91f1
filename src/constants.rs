//! Road network constants and default tuning values
//!
//! This module centralizes the magic numbers used by the pipeline. Every value
//! here is the default of a field in [`crate::settings::RoadNetworkSettings`].

// ============================================================================
// WORLD GRID
// ============================================================================

/// Side of a chunk in blocks
pub const CHUNK_SIZE: i32 = 16;

/// Side of a build cell in blocks (segments are queued per cell)
pub const BUILD_CELL_SIZE: i32 = 16;

/// Water surface height used by the bundled terrain generator
pub const DEFAULT_SEA_LEVEL: i32 = 63;

// ============================================================================
// SPATIAL SEARCH
// ============================================================================

/// Default search radius around the origin (in chunks)
pub const DEFAULT_SCAN_RADIUS: i32 = 64;

/// Default half-size of a coarse planning cell (in chunks)
pub const DEFAULT_CELL_RADIUS: i32 = 8;

/// Namespace given to selectors written without one
pub const DEFAULT_NAMESPACE: &str = "minecraft";

// ============================================================================
// GRAPH
// ============================================================================

/// Maximum reach of a node; two nodes connect up to twice this distance apart
pub const DEFAULT_CONNECTION_RADIUS: i32 = 384;

// ============================================================================
// PATH SEARCH
// ============================================================================

/// Maximum number of expanded nodes before a search gives up
pub const DEFAULT_STEP_BUDGET: usize = 200_000;

/// Largest height difference a single step may climb or descend
pub const DEFAULT_MAX_CLIMB: i32 = 3;

/// Extra cost per block of height difference
pub const DEFAULT_CLIMB_COST: f32 = 2.0;

/// Extra cost for stepping onto a water cell
pub const DEFAULT_WATER_COST: f32 = 4.0;

// ============================================================================
// MERGING
// ============================================================================

/// Manhattan radius around each endpoint that is trimmed off a path
pub const DEFAULT_TRIM_RADIUS: i32 = 6;

/// Paths whose overall directions differ by this many degrees never pair
pub const DEFAULT_PARALLEL_ANGLE_DEG: f32 = 30.0;

/// Paths that never come closer than this (in blocks) never pair
pub const DEFAULT_PARALLEL_TOLERANCE: f32 = 12.0;

/// Tails must point within this many degrees of each other to converge
pub const DEFAULT_TAIL_ANGLE_DEG: f32 = 15.0;

/// Tails may be at most `factor * tolerance` apart on average to converge
pub const DEFAULT_TAIL_DISTANCE_FACTOR: f32 = 1.5;

/// Absolute cap on the convergence score
pub const DEFAULT_CONVERGENCE_SCORE_CAP: f32 = 20.0;

/// Maximum number of merges chained into one trunk per invocation
pub const DEFAULT_MAX_MERGE_ITERATIONS: usize = 8;

/// Number of corresponding samples taken along two tails
pub const TAIL_SAMPLES: usize = 8;

// ============================================================================
// HEIGHT NORMALIZATION
// ============================================================================

/// Number of median/clamp/despike passes
pub const DEFAULT_SMOOTHING_PASSES: usize = 2;

/// Median filter window (odd)
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;

/// Largest height change between consecutive points after clamping
pub const DEFAULT_MAX_GRADIENT: i32 = 1;

/// A point this much above both neighbours is a spike
pub const DEFAULT_SPIKE_DELTA: i32 = 2;

// ============================================================================
// WATER
// ============================================================================

/// Arc length between buoys on submerged runs
pub const DEFAULT_BUOY_INTERVAL: f32 = 24.0;
