//! Tunable parameters and per-family filter configuration.
//!
//! [`ParameterSet`] is the flat store a UI binds its controls to. Every value
//! has a declared range and step ([`ParamSpec`]) and is clamped on write.
//! Engines never see the store: the dispatcher reads a snapshot and builds
//! the validated configuration structs below.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use log::warn;

use crate::error::{FilterError, FilterResult};

// ============================================================================
// Keys and Ranges
// ============================================================================

/// Name of a single tunable parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParamKey {
    SobelKernel,
    CannyKernel,
    CannySigma,
    CannyLow,
    CannyHigh,
    IlpfRadius,
    GlpfRadius,
    BlpfRadius,
    BlpfOrder,
    IhpfRadius,
    GhpfRadius,
    BhpfRadius,
    BhpfOrder,
    ArithKernel,
    GeoKernel,
    HarmKernel,
    ContraKernel,
    ContraQ,
    MedianKernel,
    MinKernel,
    MaxKernel,
    MidpointKernel,
}

/// Declared range, step and default of one parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub key: ParamKey,
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    /// Whole-number parameter (everything except the contraharmonic order).
    pub integer: bool,
    pub hint: &'static str,
}

const fn kernel(key: ParamKey, name: &'static str, hint: &'static str) -> ParamSpec {
    ParamSpec {
        key,
        name,
        label: "Kernel Size",
        min: 1.0,
        max: 31.0,
        step: 2.0,
        default: 3.0,
        integer: true,
        hint,
    }
}

const fn radius(key: ParamKey, name: &'static str, hint: &'static str) -> ParamSpec {
    ParamSpec {
        key,
        name,
        label: "Cutoff Radius",
        min: 1.0,
        max: 200.0,
        step: 5.0,
        default: 30.0,
        integer: true,
        hint,
    }
}

const fn order(key: ParamKey, name: &'static str) -> ParamSpec {
    ParamSpec {
        key,
        name,
        label: "Order (n)",
        min: 1.0,
        max: 10.0,
        step: 1.0,
        default: 2.0,
        integer: true,
        hint: "2-4 typical",
    }
}

const fn threshold(
    key: ParamKey,
    name: &'static str,
    label: &'static str,
    default: f64,
    hint: &'static str,
) -> ParamSpec {
    ParamSpec {
        key,
        name,
        label,
        min: 0.0,
        max: 255.0,
        step: 5.0,
        default,
        integer: true,
        hint,
    }
}

/// Range table, in [`ParamKey`] declaration order.
pub const PARAM_SPECS: [ParamSpec; ParamKey::COUNT] = [
    kernel(ParamKey::SobelKernel, "sobel_kernel", "3-7 optimal"),
    kernel(ParamKey::CannyKernel, "canny_kernel", "3-7 optimal"),
    ParamSpec {
        key: ParamKey::CannySigma,
        name: "canny_sigma",
        label: "Gaussian Sigma",
        min: 0.0,
        max: 10.0,
        step: 1.0,
        default: 0.0,
        integer: true,
        hint: "0=auto, 1-3 typical",
    },
    threshold(
        ParamKey::CannyLow,
        "canny_low",
        "Low Threshold",
        30.0,
        "30-100 typical",
    ),
    threshold(
        ParamKey::CannyHigh,
        "canny_high",
        "High Threshold",
        60.0,
        "60-200 typical",
    ),
    radius(ParamKey::IlpfRadius, "ilpf_radius", "10-50 typical"),
    radius(ParamKey::GlpfRadius, "glpf_radius", "20-80 optimal"),
    radius(ParamKey::BlpfRadius, "blpf_radius", "20-80 optimal"),
    order(ParamKey::BlpfOrder, "blpf_order"),
    radius(ParamKey::IhpfRadius, "ihpf_radius", "10-50 typical"),
    radius(ParamKey::GhpfRadius, "ghpf_radius", "20-80 optimal"),
    radius(ParamKey::BhpfRadius, "bhpf_radius", "20-80 optimal"),
    order(ParamKey::BhpfOrder, "bhpf_order"),
    kernel(ParamKey::ArithKernel, "arith_kernel", "3-9 optimal"),
    kernel(ParamKey::GeoKernel, "geo_kernel", "3-7 for Gaussian noise"),
    kernel(ParamKey::HarmKernel, "harm_kernel", "3-7 for salt noise"),
    kernel(ParamKey::ContraKernel, "contra_kernel", "3-7 optimal"),
    ParamSpec {
        key: ParamKey::ContraQ,
        name: "contra_q",
        label: "Q Order",
        min: -5.0,
        max: 5.0,
        step: 0.2,
        default: 1.5,
        integer: false,
        hint: "Q>0: pepper | Q<0: salt",
    },
    kernel(
        ParamKey::MedianKernel,
        "median_kernel",
        "3-9 for salt & pepper",
    ),
    kernel(ParamKey::MinKernel, "min_kernel", "3-7 removes white"),
    kernel(ParamKey::MaxKernel, "max_kernel", "3-7 removes black"),
    kernel(ParamKey::MidpointKernel, "midpoint_kernel", "3-7 optimal"),
];

impl ParamKey {
    pub const COUNT: usize = 22;

    pub const ALL: [ParamKey; ParamKey::COUNT] = [
        ParamKey::SobelKernel,
        ParamKey::CannyKernel,
        ParamKey::CannySigma,
        ParamKey::CannyLow,
        ParamKey::CannyHigh,
        ParamKey::IlpfRadius,
        ParamKey::GlpfRadius,
        ParamKey::BlpfRadius,
        ParamKey::BlpfOrder,
        ParamKey::IhpfRadius,
        ParamKey::GhpfRadius,
        ParamKey::BhpfRadius,
        ParamKey::BhpfOrder,
        ParamKey::ArithKernel,
        ParamKey::GeoKernel,
        ParamKey::HarmKernel,
        ParamKey::ContraKernel,
        ParamKey::ContraQ,
        ParamKey::MedianKernel,
        ParamKey::MinKernel,
        ParamKey::MaxKernel,
        ParamKey::MidpointKernel,
    ];

    /// Declared range of this parameter.
    pub fn spec(self) -> &'static ParamSpec {
        &PARAM_SPECS[self as usize]
    }

    /// Stable snake-case name.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Kernel sizes must stay odd.
    pub fn is_kernel(self) -> bool {
        matches!(
            self,
            ParamKey::SobelKernel
                | ParamKey::CannyKernel
                | ParamKey::ArithKernel
                | ParamKey::GeoKernel
                | ParamKey::HarmKernel
                | ParamKey::ContraKernel
                | ParamKey::MedianKernel
                | ParamKey::MinKernel
                | ParamKey::MaxKernel
                | ParamKey::MidpointKernel
        )
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamKey {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match ParamKey::ALL.into_iter().find(|key| key.name() == s) {
            Some(key) => Ok(key),
            None => Err(FilterError::InvalidInput(format!("unknown parameter {s}"))),
        }
    }
}

impl ParamSpec {
    /// Bring a value into range: whole numbers are truncated, kernel sizes
    /// are rounded up to odd, then everything is clamped to `[min, max]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let mut v = if self.integer { value.trunc() } else { value };
        if self.key.is_kernel() && (v as i64) % 2 == 0 {
            v += 1.0;
        }
        v.clamp(self.min, self.max)
    }
}

// ============================================================================
// Parameter Store
// ============================================================================

/// Raw values of a [`ParameterSet`], indexed by [`ParamKey`].
type Values = [f64; ParamKey::COUNT];

/// Every tunable parameter of the workbench, each within its declared range.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Values", into = "Values"))]
pub struct ParameterSet {
    values: [f64; ParamKey::COUNT],
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut values = [0.0; ParamKey::COUNT];
        for spec in PARAM_SPECS.iter() {
            values[spec.key as usize] = spec.default;
        }
        Self { values }
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: ParamKey) -> f64 {
        self.values[key as usize]
    }

    /// Value of a kernel-size (or other whole-number) parameter.
    #[inline]
    pub fn get_usize(&self, key: ParamKey) -> usize {
        self.get(key).max(0.0) as usize
    }

    /// Store a value, correcting it into range.
    ///
    /// # Returns
    /// The value actually stored
    ///
    /// # Errors
    /// `InvalidParameter` for NaN or infinite input; the old value is kept.
    pub fn set(&mut self, key: ParamKey, value: f64) -> FilterResult<f64> {
        if !value.is_finite() {
            return Err(FilterError::InvalidParameter {
                name: key.name(),
                value,
                reason: "value must be finite",
            });
        }

        let stored = key.spec().normalize(value);
        if stored != value {
            warn!("parameter {} = {} corrected to {}", key, value, stored);
        }
        self.values[key as usize] = stored;
        Ok(stored)
    }

    /// Move a parameter by `steps` declared steps.
    ///
    /// A kernel size that lands on an even number keeps moving one more in
    /// the same direction. The result is clamped to the declared range.
    pub fn adjust(&mut self, key: ParamKey, steps: i32) -> f64 {
        let spec = key.spec();
        let mut next = self.get(key) + steps as f64 * spec.step;

        if key.is_kernel() && (next as i64) % 2 == 0 {
            next += if steps > 0 { 1.0 } else { -1.0 };
        }

        let next = next.clamp(spec.min, spec.max);
        self.values[key as usize] = next;
        next
    }

    /// All `(key, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, f64)> + '_ {
        ParamKey::ALL.iter().map(move |&key| (key, self.get(key)))
    }
}

impl FromStr for ParameterSet {
    type Err = FilterError;

    /// Parse `name=value` pairs separated by commas or whitespace, starting
    /// from the defaults. Values are range-corrected like [`ParameterSet::set`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut params = ParameterSet::default();
        for pair in s.split(|c: char| c == ',' || c.is_whitespace()) {
            if pair.is_empty() {
                continue;
            }
            let Some((name, value)) = pair.split_once('=') else {
                let message = format!("expected name=value, got {pair}");
                return Err(FilterError::InvalidInput(message));
            };
            let key: ParamKey = name.parse()?;
            let Ok(value) = value.trim().parse::<f64>() else {
                let message = format!("{value} is not a number");
                return Err(FilterError::InvalidInput(message));
            };
            params.set(key, value)?;
        }
        Ok(params)
    }
}

impl TryFrom<Values> for ParameterSet {
    type Error = FilterError;

    /// Build a set from raw values, range-correcting each like
    /// [`ParameterSet::set`].
    fn try_from(values: Values) -> FilterResult<Self> {
        let mut params = ParameterSet::default();
        for key in ParamKey::ALL {
            params.set(key, values[key as usize])?;
        }
        Ok(params)
    }
}

impl From<ParameterSet> for Values {
    fn from(params: ParameterSet) -> Self {
        params.values
    }
}

/// Parameter store shared between a UI thread and a capture thread.
///
/// Writers lock per update; the capture thread takes a full [`snapshot`]
/// before each engine call so one frame never sees a half-updated set.
///
/// [`snapshot`]: SharedParameters::snapshot
#[derive(Clone, Debug, Default)]
pub struct SharedParameters {
    inner: Arc<RwLock<ParameterSet>>,
}

impl SharedParameters {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    /// Copy of the whole set, taken under one read lock.
    pub fn snapshot(&self) -> ParameterSet {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, key: ParamKey, value: f64) -> FilterResult<f64> {
        match self.inner.write() {
            Ok(mut guard) => guard.set(key, value),
            Err(poisoned) => poisoned.into_inner().set(key, value),
        }
    }

    pub fn adjust(&self, key: ParamKey, steps: i32) -> f64 {
        match self.inner.write() {
            Ok(mut guard) => guard.adjust(key, steps),
            Err(poisoned) => poisoned.into_inner().adjust(key, steps),
        }
    }
}

// ============================================================================
// Validated Configuration
// ============================================================================

fn check_range(key: ParamKey, value: f64) -> FilterResult<f64> {
    let spec = key.spec();
    if !value.is_finite() {
        return Err(FilterError::InvalidParameter {
            name: spec.name,
            value,
            reason: "value must be finite",
        });
    }
    if value < spec.min || value > spec.max {
        return Err(FilterError::InvalidParameter {
            name: spec.name,
            value,
            reason: "value outside declared range",
        });
    }
    Ok(value)
}

/// Stored value forced into the declared range of `key`. Non-finite input
/// falls back to the default.
fn saturate(key: ParamKey, value: f64) -> f64 {
    let spec = key.spec();
    if value.is_finite() {
        spec.normalize(value)
    } else {
        spec.default
    }
}

/// Odd neighborhood size in `1..=31`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct KernelSize(usize);

impl KernelSize {
    pub const MIN: usize = 1;
    pub const MAX: usize = 31;

    /// Validate a kernel size. Even sizes are rounded up to the next odd one.
    pub fn new(size: usize) -> FilterResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&size) {
            return Err(FilterError::InvalidParameter {
                name: "kernel_size",
                value: size as f64,
                reason: "kernel size must be between 1 and 31",
            });
        }
        if size % 2 == 0 {
            warn!("even kernel size {} rounded up to {}", size, size + 1);
            return Self::new(size + 1);
        }
        Ok(Self(size))
    }

    /// Kernel size from a stored parameter, forced into range.
    pub fn saturating(value: f64) -> Self {
        Self(saturate(ParamKey::SobelKernel, value) as usize)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for KernelSize {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<usize> for KernelSize {
    type Error = FilterError;

    fn try_from(size: usize) -> FilterResult<Self> {
        Self::new(size)
    }
}

impl From<KernelSize> for usize {
    fn from(kernel: KernelSize) -> Self {
        kernel.0
    }
}

/// Canny edge detector settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCanny"))]
pub struct CannyParams {
    kernel: KernelSize,
    sigma: f64,
    low: f64,
    high: f64,
}

impl CannyParams {
    pub fn new(kernel: usize, sigma: f64, low: f64, high: f64) -> FilterResult<Self> {
        Ok(Self {
            kernel: KernelSize::new(kernel)?,
            sigma: check_range(ParamKey::CannySigma, sigma)?,
            low: check_range(ParamKey::CannyLow, low)?,
            high: check_range(ParamKey::CannyHigh, high)?,
        })
    }

    /// Settings from stored values, each forced into its declared range.
    pub fn saturating(kernel: f64, sigma: f64, low: f64, high: f64) -> Self {
        Self {
            kernel: KernelSize::saturating(kernel),
            sigma: saturate(ParamKey::CannySigma, sigma),
            low: saturate(ParamKey::CannyLow, low),
            high: saturate(ParamKey::CannyHigh, high),
        }
    }

    #[inline]
    pub fn kernel(self) -> KernelSize {
        self.kernel
    }

    /// Blur sigma, `0` derives it from the kernel size.
    #[inline]
    pub fn sigma(self) -> f64 {
        self.sigma
    }

    #[inline]
    pub fn low(self) -> f64 {
        self.low
    }

    #[inline]
    pub fn high(self) -> f64 {
        self.high
    }
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            kernel: KernelSize::default(),
            sigma: 0.0,
            low: 30.0,
            high: 60.0,
        }
    }
}

/// Cutoff radius and Butterworth order of a frequency filter.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawFrequency"))]
pub struct FrequencyParams {
    radius: f64,
    order: u32,
}

impl FrequencyParams {
    pub fn new(radius: f64, order: u32) -> FilterResult<Self> {
        let radius = check_range(ParamKey::IlpfRadius, radius)?;
        let order = check_range(ParamKey::BlpfOrder, order as f64)? as u32;
        Ok(Self { radius, order })
    }

    /// Settings from stored values, each forced into its declared range.
    pub fn saturating(radius: f64, order: f64) -> Self {
        Self {
            radius: saturate(ParamKey::IlpfRadius, radius),
            order: saturate(ParamKey::BlpfOrder, order) as u32,
        }
    }

    #[inline]
    pub fn radius(self) -> f64 {
        self.radius
    }

    /// Butterworth order; the other masks ignore it.
    #[inline]
    pub fn order(self) -> u32 {
        self.order
    }
}

impl Default for FrequencyParams {
    fn default() -> Self {
        Self {
            radius: 30.0,
            order: 2,
        }
    }
}

/// Contraharmonic mean settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawContraharmonic"))]
pub struct ContraharmonicParams {
    kernel: KernelSize,
    q: f64,
}

impl ContraharmonicParams {
    pub fn new(kernel: usize, q: f64) -> FilterResult<Self> {
        Ok(Self {
            kernel: KernelSize::new(kernel)?,
            q: check_range(ParamKey::ContraQ, q)?,
        })
    }

    /// Settings from stored values, each forced into its declared range.
    pub fn saturating(kernel: f64, q: f64) -> Self {
        Self {
            kernel: KernelSize::saturating(kernel),
            q: saturate(ParamKey::ContraQ, q),
        }
    }

    #[inline]
    pub fn kernel(self) -> KernelSize {
        self.kernel
    }

    #[inline]
    pub fn q(self) -> f64 {
        self.q
    }
}

impl Default for ContraharmonicParams {
    fn default() -> Self {
        Self {
            kernel: KernelSize::default(),
            q: 1.5,
        }
    }
}

// Deserialized settings go through the validating constructors.

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawCanny {
    kernel: usize,
    sigma: f64,
    low: f64,
    high: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCanny> for CannyParams {
    type Error = FilterError;

    fn try_from(raw: RawCanny) -> FilterResult<Self> {
        Self::new(raw.kernel, raw.sigma, raw.low, raw.high)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawFrequency {
    radius: f64,
    order: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFrequency> for FrequencyParams {
    type Error = FilterError;

    fn try_from(raw: RawFrequency) -> FilterResult<Self> {
        Self::new(raw.radius, raw.order)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawContraharmonic {
    kernel: usize,
    q: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawContraharmonic> for ContraharmonicParams {
    type Error = FilterError;

    fn try_from(raw: RawContraharmonic) -> FilterResult<Self> {
        Self::new(raw.kernel, raw.q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    #[test]
    fn test_spec_table_order_matches_keys() {
        for (i, key) in ParamKey::ALL.iter().enumerate() {
            assert_eq!(PARAM_SPECS[i].key, *key);
            assert_eq!(*key as usize, i);
        }
    }

    #[test]
    fn test_defaults() {
        let p = ParameterSet::new();
        assert_eq!(p.get(ParamKey::SobelKernel), 3.0);
        assert_eq!(p.get(ParamKey::CannySigma), 0.0);
        assert_eq!(p.get(ParamKey::CannyLow), 30.0);
        assert_eq!(p.get(ParamKey::CannyHigh), 60.0);
        assert_eq!(p.get(ParamKey::GhpfRadius), 30.0);
        assert_eq!(p.get(ParamKey::BhpfOrder), 2.0);
        assert_eq!(p.get(ParamKey::ContraQ), 1.5);
    }

    #[test]
    fn test_name_roundtrip() {
        for key in ParamKey::ALL {
            assert_eq!(key.name().parse::<ParamKey>().unwrap(), key);
        }
        assert!("bogus".parse::<ParamKey>().is_err());
    }

    #[test]
    fn test_set_clamps_and_forces_odd() {
        let mut p = ParameterSet::new();
        assert_eq!(p.set(ParamKey::MedianKernel, 4.0).unwrap(), 5.0);
        assert_eq!(p.set(ParamKey::MedianKernel, 6.7).unwrap(), 7.0);
        assert_eq!(p.set(ParamKey::MedianKernel, 100.0).unwrap(), 31.0);
        assert_eq!(p.set(ParamKey::MedianKernel, 0.0).unwrap(), 1.0);
        assert_eq!(p.set(ParamKey::IlpfRadius, 0.0).unwrap(), 1.0);
        assert_eq!(p.set(ParamKey::CannyHigh, 300.0).unwrap(), 255.0);
        assert_eq!(p.set(ParamKey::ContraQ, -2.35).unwrap(), -2.35);
        assert_eq!(p.set(ParamKey::ContraQ, -9.0).unwrap(), -5.0);
    }

    #[test]
    fn test_set_rejects_nan() {
        let mut p = ParameterSet::new();
        assert!(p.set(ParamKey::GlpfRadius, f64::NAN).is_err());
        assert_eq!(p.get(ParamKey::GlpfRadius), 30.0);
    }

    #[test]
    fn test_adjust_steps_and_clamps() {
        let mut p = ParameterSet::new();
        assert_eq!(p.adjust(ParamKey::ArithKernel, 1), 5.0);
        assert_eq!(p.adjust(ParamKey::ArithKernel, -2), 1.0);
        assert_eq!(p.adjust(ParamKey::ArithKernel, -1), 1.0);
        assert_eq!(p.adjust(ParamKey::BlpfRadius, 1), 35.0);
        assert_eq!(p.adjust(ParamKey::BlpfOrder, 20), 10.0);
        assert_relative_eq!(p.adjust(ParamKey::ContraQ, 1), 1.7, epsilon = 1e-12);
    }

    #[test]
    fn test_adjust_skips_even_kernel() {
        let mut p = ParameterSet::new();
        p.values[ParamKey::MinKernel as usize] = 4.0;
        assert_eq!(p.adjust(ParamKey::MinKernel, 1), 7.0);
        p.values[ParamKey::MinKernel as usize] = 4.0;
        assert_eq!(p.adjust(ParamKey::MinKernel, -1), 1.0);
    }

    #[test]
    fn test_parse_pairs() {
        let p: ParameterSet = "canny_low=40, canny_high=90 contra_q=-1.5".parse().unwrap();
        assert_eq!(p.get(ParamKey::CannyLow), 40.0);
        assert_eq!(p.get(ParamKey::CannyHigh), 90.0);
        assert_eq!(p.get(ParamKey::ContraQ), -1.5);
        assert_eq!(p.get(ParamKey::SobelKernel), 3.0);

        let p: ParameterSet = "".parse().unwrap();
        assert_eq!(p, ParameterSet::default());

        assert!("canny_low".parse::<ParameterSet>().is_err());
        assert!("canny_low=abc".parse::<ParameterSet>().is_err());
        assert!("nope=1".parse::<ParameterSet>().is_err());
    }

    #[test]
    fn test_shared_snapshot_across_threads() {
        let shared = SharedParameters::default();
        let writer = shared.clone();
        thread::spawn(move || {
            writer.set(ParamKey::CannyLow, 45.0).unwrap();
            writer.adjust(ParamKey::CannyHigh, 2);
        })
        .join()
        .unwrap();

        let snap = shared.snapshot();
        assert_eq!(snap.get(ParamKey::CannyLow), 45.0);
        assert_eq!(snap.get(ParamKey::CannyHigh), 70.0);

        shared.set(ParamKey::CannyLow, 50.0).unwrap();
        assert_eq!(snap.get(ParamKey::CannyLow), 45.0);
    }

    #[test]
    fn test_kernel_size_validation() {
        assert_eq!(KernelSize::new(5).unwrap().get(), 5);
        assert_eq!(KernelSize::new(4).unwrap().get(), 5);
        assert!(KernelSize::new(0).is_err());
        assert!(KernelSize::new(32).is_err());
        assert_eq!(KernelSize::saturating(8.0).get(), 9);
        assert_eq!(KernelSize::saturating(40.0).get(), 31);
        assert_eq!(KernelSize::saturating(-3.0).get(), 1);
        assert_eq!(KernelSize::saturating(f64::NAN).get(), 3);
    }

    #[test]
    fn test_family_configs() {
        assert!(CannyParams::new(3, 0.0, 30.0, 60.0).is_ok());
        let err = CannyParams::new(3, 0.0, 30.0, 256.0).unwrap_err();
        assert!(err.to_string().contains("canny_high"));
        assert!(FrequencyParams::new(0.5, 2).is_err());
        assert!(FrequencyParams::new(30.0, 11).is_err());
        assert_eq!(FrequencyParams::new(200.0, 10).unwrap().order(), 10);
        assert!(ContraharmonicParams::new(3, 5.5).is_err());
        assert!(ContraharmonicParams::new(3, f64::INFINITY).is_err());
        assert_eq!(ContraharmonicParams::default().q(), 1.5);
    }

    #[test]
    fn test_out_of_range_configs_rejected() {
        assert!(FrequencyParams::new(-5.0, 0).is_err());
        assert!(FrequencyParams::new(30.0, 0).is_err());
        assert!(ContraharmonicParams::new(3, 400.0).is_err());
        assert!(CannyParams::new(3, -1.0, 30.0, 60.0).is_err());
        assert!(CannyParams::new(3, 0.0, f64::NAN, 60.0).is_err());
    }

    #[test]
    fn test_saturating_configs_stay_in_range() {
        let freq = FrequencyParams::saturating(-5.0, 0.0);
        assert_eq!(freq.radius(), 1.0);
        assert_eq!(freq.order(), 1);

        let freq = FrequencyParams::saturating(f64::NAN, 99.0);
        assert_eq!(freq.radius(), 30.0);
        assert_eq!(freq.order(), 10);

        let contra = ContraharmonicParams::saturating(4.0, 400.0);
        assert_eq!(contra.kernel().get(), 5);
        assert_eq!(contra.q(), 5.0);

        let canny = CannyParams::saturating(2.0, 12.0, -10.0, 900.0);
        assert_eq!(canny.kernel().get(), 3);
        assert_eq!(canny.sigma(), 10.0);
        assert_eq!(canny.low(), 0.0);
        assert_eq!(canny.high(), 255.0);
    }

    #[test]
    fn test_raw_values_are_range_corrected() {
        let p = ParameterSet::try_from([500.0; ParamKey::COUNT]).unwrap();
        assert_eq!(p.get(ParamKey::MedianKernel), 31.0);
        assert_eq!(p.get(ParamKey::CannyHigh), 255.0);
        assert_eq!(p.get(ParamKey::BlpfOrder), 10.0);
        assert_eq!(p.get(ParamKey::ContraQ), 5.0);

        let mut raw = [3.0; ParamKey::COUNT];
        raw[ParamKey::GlpfRadius as usize] = f64::NAN;
        assert!(ParameterSet::try_from(raw).is_err());

        let values: [f64; ParamKey::COUNT] = ParameterSet::default().into();
        assert_eq!(values[ParamKey::ContraQ as usize], 1.5);
    }

    #[test]
    fn test_threshold_hints() {
        assert_eq!(ParamKey::CannyLow.spec().hint, "30-100 typical");
        assert_eq!(ParamKey::CannyHigh.spec().hint, "60-200 typical");
    }
}
