/// Data layer: spectrum, anchors, continuum fitting and file I/O.
///
/// Architecture:
/// ```text
///  .txt / .dat / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse two columns → Spectrum
///   └──────────┘
///        │            AnchorSet (+ smoothing: median flux near a click)
///        ▼                 │
///   ┌───────────┐          │
///   │ continuum  │ ◄────────┘  spline / linear → ContinuumFit
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  flux / continuum → NormalizedSpectrum
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  NormalizedSpectrum → .nspec
///   └──────────┘
/// ```

pub mod continuum;
pub mod export;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod smoothing;
