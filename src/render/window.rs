//! Window/level intensity mapping.
//!
//! Maps raw samples to 8-bit display values:
//!
//! ```text
//! min = center - width/2
//! max = center + width/2
//!
//!   v <= min         -> 0
//!   v >  max         -> 255
//!   otherwise        -> round((v - min) * 255 / width)
//! ```
//!
//! Before windowing, samples stored with padding bits are shifted down
//! (signed ones are then sign-extended from Bits Stored), and MONOCHROME1
//! images are inverted against the scanned maximum.

use serde::{Deserialize, Serialize};

use super::decoder::{PixelGeometry, PixelSamples};
use super::metadata::DEFAULT_WINDOW;

/// Upper bound of an automatically derived window width.
pub const AUTO_MAX_WIDTH: f64 = 4096.0;

/// Range an automatically derived window center is clamped to.
pub const AUTO_CENTER_RANGE: (f64, f64) = (-1024.0, 1024.0);

// =============================================================================
// Window Types
// =============================================================================

/// A resolved display window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowLevel {
    pub width: f64,
    pub center: f64,
}

impl WindowLevel {
    pub fn new(width: f64, center: f64) -> Self {
        Self { width, center }
    }

    /// Whether the window can be applied as is.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.center.is_finite() && self.width > 0.0
    }

    /// Replace an unusable window with the default one.
    ///
    /// Both fields are replaced together; a valid center is never paired
    /// with the default width.
    pub fn sanitized(self) -> Self {
        if self.is_valid() {
            self
        } else {
            DEFAULT_WINDOW
        }
    }

    /// Derive a window that spans the scanned pixel range.
    pub fn from_range(range: PixelRange) -> Self {
        let span = (range.max - range.min) as f64;
        Self {
            width: span.clamp(1.0, AUTO_MAX_WIDTH),
            center: (range.min as f64 + span / 2.0).clamp(AUTO_CENTER_RANGE.0, AUTO_CENTER_RANGE.1),
        }
    }

    /// Lower edge, `center - width/2`.
    pub fn lower(&self) -> f64 {
        self.center - self.width / 2.0
    }

    /// Upper edge, `center + width/2`.
    pub fn upper(&self) -> f64 {
        self.center + self.width / 2.0
    }
}

/// Caller's window preferences for one render.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowRequest {
    pub width: Option<f64>,
    pub center: Option<f64>,
    /// Derive missing fields from the pixel range instead of the dataset
    pub auto: bool,
}

impl WindowRequest {
    pub fn new(width: Option<f64>, center: Option<f64>) -> Self {
        Self {
            width,
            center,
            auto: false,
        }
    }

    pub fn auto() -> Self {
        Self {
            auto: true,
            ..Self::default()
        }
    }
}

/// Pick the window for one render.
///
/// Each field comes from, in order: the request, the auto window (when
/// requested), the dataset. The result is then sanitized.
pub fn resolve_window(request: &WindowRequest, stored: WindowLevel, range: PixelRange) -> WindowLevel {
    let fallback = if request.auto {
        WindowLevel::from_range(range)
    } else {
        stored
    };

    WindowLevel {
        width: request.width.unwrap_or(fallback.width),
        center: request.center.unwrap_or(fallback.center),
    }
    .sanitized()
}

// =============================================================================
// Pixel Range
// =============================================================================

/// Minimum and maximum raw sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRange {
    pub min: i32,
    pub max: i32,
}

impl PixelRange {
    /// One linear pass over all samples. An empty buffer yields `0..=0`.
    pub fn scan(samples: &PixelSamples) -> Self {
        let mut iter = samples.iter();
        let first = match iter.next() {
            Some(v) => v,
            None => return Self { min: 0, max: 0 },
        };

        iter.fold(Self { min: first, max: first }, |range, v| Self {
            min: range.min.min(v),
            max: range.max.max(v),
        })
    }
}

// =============================================================================
// Normalizer
// =============================================================================

/// Applies bit adjustment, inversion and the window to single samples.
#[derive(Debug, Clone)]
pub struct Normalizer {
    window: WindowLevel,
    range: PixelRange,
    /// Right shift applied when padding bits are present
    shift: Option<u32>,
    bits_stored: u32,
    signed: bool,
    inverted: bool,
}

impl Normalizer {
    /// Scan `samples` and build a normalizer for `window`.
    pub fn new(samples: &PixelSamples, geometry: &PixelGeometry, window: WindowLevel) -> Self {
        Self::with_range(PixelRange::scan(samples), geometry, window)
    }

    /// Build a normalizer from an already scanned range.
    pub fn with_range(range: PixelRange, geometry: &PixelGeometry, window: WindowLevel) -> Self {
        let shift = if geometry.bits_stored < geometry.bits_allocated {
            Some((geometry.high_bit + 1).saturating_sub(geometry.bits_stored) as u32)
        } else {
            None
        };

        Self {
            window: window.sanitized(),
            range,
            shift,
            bits_stored: geometry.bits_stored as u32,
            signed: geometry.is_signed(),
            inverted: geometry.is_inverted(),
        }
    }

    pub fn window(&self) -> WindowLevel {
        self.window
    }

    pub fn global_min(&self) -> i32 {
        self.range.min
    }

    pub fn global_max(&self) -> i32 {
        self.range.max
    }

    pub fn range(&self) -> PixelRange {
        self.range
    }

    /// Map one raw sample to a display value.
    #[inline]
    pub fn display_value(&self, raw: i32) -> u8 {
        let mut value = raw;

        if let Some(shift) = self.shift {
            value >>= shift;
            if self.signed {
                value = sign_extend(value, self.bits_stored);
            }
        }

        if self.inverted {
            value = self.range.max - value;
        }

        apply_window(value as f64, self.window)
    }
}

#[inline]
fn sign_extend(value: i32, bits: u32) -> i32 {
    if bits == 0 || bits >= 32 {
        return value;
    }
    let unused = 32 - bits;
    (value << unused) >> unused
}

/// Window a value already in the sample domain.
#[inline]
pub fn apply_window(value: f64, window: WindowLevel) -> u8 {
    let lower = window.lower();
    if value <= lower {
        return 0;
    }
    if value > window.upper() {
        return 255;
    }
    ((value - lower) * 255.0 / window.width)
        .round()
        .clamp(0.0, 255.0) as u8
}

// =============================================================================
// Tests
// =============================================================================
