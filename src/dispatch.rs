//! Filter selection and dispatch.
//!
//! [`FilterId`] names one of the workbench filters, [`Filter`] carries the
//! validated settings it needs, and [`apply`] runs it on a frame. Every
//! engine receives an intensity grid and every result comes back as a
//! 3-channel display frame.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use log::{debug, error};
use ndarray::{Array3, ArrayView3};

use crate::error::{FilterError, FilterResult};
use crate::filters::edge::{self, GradientAxis};
use crate::filters::frequency::{self, FrequencyKind};
use crate::filters::grayscale::{self, GrayscaleWeights};
use crate::filters::{morphology, noise};
use crate::params::{
    CannyParams, ContraharmonicParams, FrequencyParams, KernelSize, ParamKey, ParameterSet,
};

// ============================================================================
// Filter Identifiers
// ============================================================================

/// One selectable filter, or pass-through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FilterId {
    None,
    SobelX,
    SobelY,
    Gradient,
    Canny,
    Ilpf,
    Glpf,
    Blpf,
    Ihpf,
    Ghpf,
    Bhpf,
    ArithMean,
    GeoMean,
    HarmMean,
    ContraMean,
    Median,
    Min,
    Max,
    Midpoint,
}

impl FilterId {
    pub const ALL: [FilterId; 19] = [
        FilterId::None,
        FilterId::SobelX,
        FilterId::SobelY,
        FilterId::Gradient,
        FilterId::Canny,
        FilterId::Ilpf,
        FilterId::Glpf,
        FilterId::Blpf,
        FilterId::Ihpf,
        FilterId::Ghpf,
        FilterId::Bhpf,
        FilterId::ArithMean,
        FilterId::GeoMean,
        FilterId::HarmMean,
        FilterId::ContraMean,
        FilterId::Median,
        FilterId::Min,
        FilterId::Max,
        FilterId::Midpoint,
    ];

    /// Stable snake-case name.
    pub fn name(self) -> &'static str {
        match self {
            FilterId::None => "none",
            FilterId::SobelX => "sobel_x",
            FilterId::SobelY => "sobel_y",
            FilterId::Gradient => "gradient",
            FilterId::Canny => "canny",
            FilterId::Ilpf => "ilpf",
            FilterId::Glpf => "glpf",
            FilterId::Blpf => "blpf",
            FilterId::Ihpf => "ihpf",
            FilterId::Ghpf => "ghpf",
            FilterId::Bhpf => "bhpf",
            FilterId::ArithMean => "arith_mean",
            FilterId::GeoMean => "geo_mean",
            FilterId::HarmMean => "harm_mean",
            FilterId::ContraMean => "contra_mean",
            FilterId::Median => "median",
            FilterId::Min => "min",
            FilterId::Max => "max",
            FilterId::Midpoint => "midpoint",
        }
    }

    /// Human-readable title.
    pub fn label(self) -> &'static str {
        match self {
            FilterId::None => "None",
            FilterId::SobelX => "Sobel X",
            FilterId::SobelY => "Sobel Y",
            FilterId::Gradient => "Gradient Magnitude",
            FilterId::Canny => "Canny Edge",
            FilterId::Ilpf => "Ideal LPF",
            FilterId::Glpf => "Gaussian LPF",
            FilterId::Blpf => "Butterworth LPF",
            FilterId::Ihpf => "Ideal HPF",
            FilterId::Ghpf => "Gaussian HPF",
            FilterId::Bhpf => "Butterworth HPF",
            FilterId::ArithMean => "Arithmetic Mean",
            FilterId::GeoMean => "Geometric Mean",
            FilterId::HarmMean => "Harmonic Mean",
            FilterId::ContraMean => "Contraharmonic Mean",
            FilterId::Median => "Median Filter",
            FilterId::Min => "Min Filter (Erosion)",
            FilterId::Max => "Max Filter (Dilation)",
            FilterId::Midpoint => "Midpoint Filter",
        }
    }

    /// Keyboard shortcut.
    pub fn key(self) -> char {
        match self {
            FilterId::None => 'n',
            FilterId::SobelX => 'x',
            FilterId::SobelY => 'y',
            FilterId::Gradient => 's',
            FilterId::Canny => 'c',
            FilterId::Ilpf => '1',
            FilterId::Glpf => '2',
            FilterId::Blpf => '3',
            FilterId::Ihpf => '4',
            FilterId::Ghpf => '5',
            FilterId::Bhpf => '6',
            FilterId::ArithMean => 'a',
            FilterId::GeoMean => 'g',
            FilterId::HarmMean => 'h',
            FilterId::ContraMean => 'm',
            FilterId::Median => 'd',
            FilterId::Min => 'i',
            FilterId::Max => 'o',
            FilterId::Midpoint => 'p',
        }
    }

    /// Filter bound to a keyboard shortcut (case-insensitive).
    pub fn from_key(key: char) -> Option<FilterId> {
        let key = key.to_ascii_lowercase();
        FilterId::ALL.iter().copied().find(|id| id.key() == key)
    }

    /// Parameters this filter reads from a [`ParameterSet`].
    pub fn params(self) -> &'static [ParamKey] {
        match self {
            FilterId::None => &[],
            FilterId::SobelX | FilterId::SobelY | FilterId::Gradient => &[ParamKey::SobelKernel],
            FilterId::Canny => &[
                ParamKey::CannyKernel,
                ParamKey::CannySigma,
                ParamKey::CannyLow,
                ParamKey::CannyHigh,
            ],
            FilterId::Ilpf => &[ParamKey::IlpfRadius],
            FilterId::Glpf => &[ParamKey::GlpfRadius],
            FilterId::Blpf => &[ParamKey::BlpfRadius, ParamKey::BlpfOrder],
            FilterId::Ihpf => &[ParamKey::IhpfRadius],
            FilterId::Ghpf => &[ParamKey::GhpfRadius],
            FilterId::Bhpf => &[ParamKey::BhpfRadius, ParamKey::BhpfOrder],
            FilterId::ArithMean => &[ParamKey::ArithKernel],
            FilterId::GeoMean => &[ParamKey::GeoKernel],
            FilterId::HarmMean => &[ParamKey::HarmKernel],
            FilterId::ContraMean => &[ParamKey::ContraKernel, ParamKey::ContraQ],
            FilterId::Median => &[ParamKey::MedianKernel],
            FilterId::Min => &[ParamKey::MinKernel],
            FilterId::Max => &[ParamKey::MaxKernel],
            FilterId::Midpoint => &[ParamKey::MidpointKernel],
        }
    }

    /// Frequency-domain transfer function, for the six frequency filters.
    pub fn frequency_kind(self) -> Option<FrequencyKind> {
        match self {
            FilterId::Ilpf => Some(FrequencyKind::IdealLowPass),
            FilterId::Glpf => Some(FrequencyKind::GaussianLowPass),
            FilterId::Blpf => Some(FrequencyKind::ButterworthLowPass),
            FilterId::Ihpf => Some(FrequencyKind::IdealHighPass),
            FilterId::Ghpf => Some(FrequencyKind::GaussianHighPass),
            FilterId::Bhpf => Some(FrequencyKind::ButterworthHighPass),
            _ => None,
        }
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterId {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let id = match s.as_str() {
            "sobelx" => Some(FilterId::SobelX),
            "sobely" => Some(FilterId::SobelY),
            "" => Some(FilterId::None),
            other => FilterId::ALL.iter().copied().find(|id| id.name() == other),
        };
        match id {
            Some(id) => Ok(id),
            None => Err(FilterError::InvalidInput(format!("unknown filter {s}"))),
        }
    }
}

// ============================================================================
// Filter Settings
// ============================================================================

/// A filter together with the settings it runs with.
///
/// Every setting type validates on construction, so a `Filter` can only
/// carry in-range values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    #[default]
    None,
    SobelX(KernelSize),
    SobelY(KernelSize),
    Gradient(KernelSize),
    Canny(CannyParams),
    Frequency {
        kind: FrequencyKind,
        params: FrequencyParams,
    },
    ArithmeticMean(KernelSize),
    GeometricMean(KernelSize),
    HarmonicMean(KernelSize),
    Contraharmonic(ContraharmonicParams),
    Median(KernelSize),
    Min(KernelSize),
    Max(KernelSize),
    Midpoint(KernelSize),
}

impl Filter {
    pub fn id(&self) -> FilterId {
        match self {
            Filter::None => FilterId::None,
            Filter::SobelX(_) => FilterId::SobelX,
            Filter::SobelY(_) => FilterId::SobelY,
            Filter::Gradient(_) => FilterId::Gradient,
            Filter::Canny(_) => FilterId::Canny,
            Filter::Frequency { kind, .. } => match kind {
                FrequencyKind::IdealLowPass => FilterId::Ilpf,
                FrequencyKind::GaussianLowPass => FilterId::Glpf,
                FrequencyKind::ButterworthLowPass => FilterId::Blpf,
                FrequencyKind::IdealHighPass => FilterId::Ihpf,
                FrequencyKind::GaussianHighPass => FilterId::Ghpf,
                FrequencyKind::ButterworthHighPass => FilterId::Bhpf,
            },
            Filter::ArithmeticMean(_) => FilterId::ArithMean,
            Filter::GeometricMean(_) => FilterId::GeoMean,
            Filter::HarmonicMean(_) => FilterId::HarmMean,
            Filter::Contraharmonic(_) => FilterId::ContraMean,
            Filter::Median(_) => FilterId::Median,
            Filter::Min(_) => FilterId::Min,
            Filter::Max(_) => FilterId::Max,
            Filter::Midpoint(_) => FilterId::Midpoint,
        }
    }

    /// Build the settings for `id` from a parameter snapshot.
    ///
    /// Every value is forced into its declared range again, so this never
    /// fails.
    pub fn from_params(id: FilterId, params: &ParameterSet) -> Filter {
        let kernel = |key: ParamKey| KernelSize::saturating(params.get(key));

        if let Some(kind) = id.frequency_kind() {
            let keys = id.params();
            let radius = params.get(keys[0]);
            let order = match keys.get(1) {
                Some(&key) => params.get(key),
                None => FrequencyParams::default().order() as f64,
            };
            let params = FrequencyParams::saturating(radius, order);
            return Filter::Frequency { kind, params };
        }

        match id {
            FilterId::SobelX => Filter::SobelX(kernel(ParamKey::SobelKernel)),
            FilterId::SobelY => Filter::SobelY(kernel(ParamKey::SobelKernel)),
            FilterId::Gradient => Filter::Gradient(kernel(ParamKey::SobelKernel)),
            FilterId::Canny => Filter::Canny(CannyParams::saturating(
                params.get(ParamKey::CannyKernel),
                params.get(ParamKey::CannySigma),
                params.get(ParamKey::CannyLow),
                params.get(ParamKey::CannyHigh),
            )),
            FilterId::ArithMean => Filter::ArithmeticMean(kernel(ParamKey::ArithKernel)),
            FilterId::GeoMean => Filter::GeometricMean(kernel(ParamKey::GeoKernel)),
            FilterId::HarmMean => Filter::HarmonicMean(kernel(ParamKey::HarmKernel)),
            FilterId::ContraMean => {
                let kernel = params.get(ParamKey::ContraKernel);
                let q = params.get(ParamKey::ContraQ);
                Filter::Contraharmonic(ContraharmonicParams::saturating(kernel, q))
            }
            FilterId::Median => Filter::Median(kernel(ParamKey::MedianKernel)),
            FilterId::Min => Filter::Min(kernel(ParamKey::MinKernel)),
            FilterId::Max => Filter::Max(kernel(ParamKey::MaxKernel)),
            FilterId::Midpoint => Filter::Midpoint(kernel(ParamKey::MidpointKernel)),
            _ => Filter::None,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run a filter, propagating any engine failure.
///
/// # Arguments
/// * `frame` - Input frame (height, width, channels), 1, 3 or 4 channels
/// * `filter` - Filter and settings
///
/// # Returns
/// 3-channel display frame of the same size, or the input unchanged for
/// [`Filter::None`]
pub fn try_apply(frame: ArrayView3<u8>, filter: &Filter) -> FilterResult<Array3<u8>> {
    let (height, width, channels) = grayscale::validate_frame(&frame)?;
    let id = filter.id();
    debug!("applying {id} to {width}x{height}x{channels} frame");

    let result = match *filter {
        Filter::None => return Ok(frame.to_owned()),
        Filter::SobelX(kernel) => {
            let gray = grayscale::to_intensity_f64(frame, GrayscaleWeights::SKIMAGE)?;
            edge::sobel_display(gray.view(), kernel.get(), GradientAxis::X)
        }
        Filter::SobelY(kernel) => {
            let gray = grayscale::to_intensity_f64(frame, GrayscaleWeights::SKIMAGE)?;
            edge::sobel_display(gray.view(), kernel.get(), GradientAxis::Y)
        }
        Filter::Gradient(kernel) => {
            let gray = grayscale::to_intensity_f64(frame, GrayscaleWeights::SKIMAGE)?;
            let gx = edge::sobel(gray.view(), kernel.get(), GradientAxis::X);
            let gy = edge::sobel(gray.view(), kernel.get(), GradientAxis::Y);
            edge::gradient_magnitude(gx.view(), gy.view())
        }
        Filter::Canny(p) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            let kernel = p.kernel().get();
            edge::canny(gray.view(), kernel, p.sigma(), p.low(), p.high())
        }
        Filter::Frequency { kind, params } => {
            let gray = grayscale::to_intensity_u8(frame)?;
            let (radius, order) = (params.radius(), params.order());
            frequency::apply_frequency_filter(gray.view(), kind, radius, order)?.image
        }
        Filter::ArithmeticMean(kernel) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            noise::arithmetic_mean(gray.view(), kernel.get())
        }
        Filter::GeometricMean(kernel) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            noise::geometric_mean(gray.view(), kernel.get())
        }
        Filter::HarmonicMean(kernel) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            noise::harmonic_mean(gray.view(), kernel.get())
        }
        Filter::Contraharmonic(p) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            noise::contraharmonic_mean(gray.view(), p.kernel().get(), p.q())
        }
        Filter::Median(kernel) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            noise::median(gray.view(), kernel.get())
        }
        Filter::Min(kernel) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            morphology::erode(gray.view(), kernel.get())
        }
        Filter::Max(kernel) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            morphology::dilate(gray.view(), kernel.get())
        }
        Filter::Midpoint(kernel) => {
            let gray = grayscale::to_intensity_u8(frame)?;
            morphology::midpoint(gray.view(), kernel.get())
        }
    };

    Ok(grayscale::to_display(result.view()))
}

/// Run a filter without ever failing.
///
/// Engine errors and panics are logged and the input frame is returned
/// unmodified.
pub fn apply(frame: ArrayView3<u8>, filter: &Filter) -> Array3<u8> {
    match panic::catch_unwind(AssertUnwindSafe(|| try_apply(frame, filter))) {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            error!("filter {} failed: {}", filter.id(), err);
            frame.to_owned()
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("filter {} panicked: {}", filter.id(), message);
            frame.to_owned()
        }
    }
}

/// Take a parameter snapshot and run the selected filter on it.
pub fn apply_with_params(frame: ArrayView3<u8>, id: FilterId, params: &ParameterSet) -> Array3<u8> {
    apply(frame, &Filter::from_params(id, params))
}

/// Log-magnitude spectrum of a frame's intensity, as a display frame.
pub fn magnitude_spectrum(frame: ArrayView3<u8>) -> FilterResult<Array3<u8>> {
    let gray = grayscale::to_intensity_u8(frame)?;
    let spectrum = frequency::magnitude_spectrum(gray.view())?;
    Ok(grayscale::to_display(spectrum.view()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_frame(height: usize, width: usize) -> Array3<u8> {
        Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
            ((y * 40 + x * 25 + c * 60) % 256) as u8
        })
    }

    #[test]
    fn test_names_and_keys_roundtrip() {
        for id in FilterId::ALL {
            assert_eq!(id.name().parse::<FilterId>().unwrap(), id);
            assert_eq!(FilterId::from_key(id.key()), Some(id));
        }
        assert_eq!("sobelx".parse::<FilterId>().unwrap(), FilterId::SobelX);
        assert_eq!(FilterId::from_key('C'), Some(FilterId::Canny));
        assert_eq!(FilterId::from_key('q'), None);
        assert!("laplacian".parse::<FilterId>().is_err());
    }

    #[test]
    fn test_from_params_roundtrips_id() {
        let params = ParameterSet::new();
        for id in FilterId::ALL {
            assert_eq!(Filter::from_params(id, &params).id(), id);
        }
    }

    #[test]
    fn test_from_params_reads_own_keys() {
        let mut params = ParameterSet::new();
        params.set(ParamKey::BhpfRadius, 55.0).unwrap();
        params.set(ParamKey::BhpfOrder, 4.0).unwrap();
        params.set(ParamKey::MedianKernel, 7.0).unwrap();

        match Filter::from_params(FilterId::Bhpf, &params) {
            Filter::Frequency { kind, params } => {
                assert_eq!(kind, FrequencyKind::ButterworthHighPass);
                assert_eq!(params.radius(), 55.0);
                assert_eq!(params.order(), 4);
            }
            other => panic!("unexpected {:?}", other),
        }
        let median = Filter::Median(KernelSize::new(7).unwrap());
        assert_eq!(Filter::from_params(FilterId::Median, &params), median);
    }

    #[test]
    fn test_from_params_clamps_extreme_snapshot() {
        let params = ParameterSet::try_from([1e6; ParamKey::COUNT]).unwrap();

        let expected = ContraharmonicParams::new(31, 5.0).unwrap();
        let filter = Filter::from_params(FilterId::ContraMean, &params);
        assert_eq!(filter, Filter::Contraharmonic(expected));

        match Filter::from_params(FilterId::Blpf, &params) {
            Filter::Frequency { params, .. } => {
                assert_eq!(params.radius(), 200.0);
                assert_eq!(params.order(), 10);
            }
            other => panic!("unexpected {:?}", other),
        }

        let frame = Array3::<u8>::from_elem((6, 6, 1), 200);
        let out = try_apply(frame.view(), &filter).unwrap();
        assert!(out.iter().all(|&v| v >= 199), "{:?}", out);
    }

    #[test]
    fn test_none_returns_input_unchanged() {
        let frame = Array3::from_shape_fn((3, 4, 4), |(y, x, c)| (y + x + c) as u8);
        assert_eq!(apply(frame.view(), &Filter::None), frame);
    }

    #[test]
    fn test_every_filter_returns_display_frame() {
        let frame = color_frame(9, 12);
        let params = ParameterSet::new();
        for id in FilterId::ALL {
            if id == FilterId::None {
                continue;
            }
            let out = try_apply(frame.view(), &Filter::from_params(id, &params)).unwrap();
            assert_eq!(out.dim(), (9, 12, 3), "{}", id);
            for y in 0..9 {
                for x in 0..12 {
                    assert_eq!(out[[y, x, 0]], out[[y, x, 1]]);
                    assert_eq!(out[[y, x, 1]], out[[y, x, 2]]);
                }
            }
        }
    }

    #[test]
    fn test_single_channel_input() {
        let frame = Array3::from_shape_fn((6, 6, 1), |(y, x, _)| (y * 6 + x) as u8 * 7);
        let filter = Filter::Max(KernelSize::default());
        let out = try_apply(frame.view(), &filter).unwrap();
        assert_eq!(out.dim(), (6, 6, 3));
        assert_eq!(out[[0, 0, 0]], 49);
    }

    #[test]
    fn test_empty_frame_is_invalid_input() {
        let frame = Array3::<u8>::zeros((0, 0, 3));
        for id in FilterId::ALL {
            let filter = Filter::from_params(id, &ParameterSet::new());
            assert!(matches!(
                try_apply(frame.view(), &filter),
                Err(FilterError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_apply_returns_input_on_failure() {
        let frame = Array3::<u8>::from_elem((4, 4, 2), 9);
        let out = apply(frame.view(), &Filter::Median(KernelSize::default()));
        assert_eq!(out, frame);
    }

    #[test]
    fn test_magnitude_spectrum_frame() {
        let frame = color_frame(8, 6);
        let spectrum = magnitude_spectrum(frame.view()).unwrap();
        assert_eq!(spectrum.dim(), (8, 6, 3));
        assert!(spectrum[[4, 3, 0]] >= 254);
    }
}
