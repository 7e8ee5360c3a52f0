//! Physical-to-visual color mapping: emission wavelength and blackbody
//! temperature to RGB, plus the HSV helpers used to remap brightness.
//!
//! Two color spaces are kept apart by type. [`NormalizedRgb`] holds channels in
//! `[0, 1]` and is what the color math works on; [`DeviceRgb`] holds channels in
//! `[0, 255]` and is what lands in GPU buffers.

/// Lower edge of the visible band in nanometres.
pub const VISIBLE_MIN_NM: f32 = 380.0;
/// Upper edge of the visible band in nanometres.
pub const VISIBLE_MAX_NM: f32 = 780.0;

/// Wien's displacement constant in nm·K.
pub const WIEN_B_NM_K: f32 = 2_897_771.9;

/// Coolest temperature the blackbody fit is evaluated at.
pub const MIN_TEMPERATURE_K: f32 = 1_000.0;
/// Hottest temperature the blackbody fit is evaluated at.
pub const MAX_TEMPERATURE_K: f32 = 40_000.0;

const SPECTRUM_GAMMA: f32 = 0.8;

/// RGB with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct NormalizedRgb(pub [f32; 3]);

/// RGB with channels in `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DeviceRgb(pub [f32; 3]);

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl NormalizedRgb {
    pub const BLACK: Self = Self([0.0; 3]);
    pub const WHITE: Self = Self([1.0; 3]);

    /// Scale into device range, clamping out-of-range channels first.
    pub fn to_device(self) -> DeviceRgb {
        DeviceRgb(self.0.map(|c| c.clamp(0.0, 1.0) * 255.0))
    }
}

impl DeviceRgb {
    pub const WHITE: Self = Self([255.0; 3]);

    pub fn to_normalized(self) -> NormalizedRgb {
        NormalizedRgb(self.0.map(|c| c.clamp(0.0, 255.0) / 255.0))
    }
}

/// Map an emission wavelength to an approximate perceived color.
///
/// Piecewise linear over the visible band with an intensity roll-off toward
/// both ends of the spectrum. Anything outside `[380, 780]` nm (including NaN)
/// is black.
pub fn wavelength_to_rgb(nm: f32) -> NormalizedRgb {
    if !(VISIBLE_MIN_NM..=VISIBLE_MAX_NM).contains(&nm) {
        return NormalizedRgb::BLACK;
    }

    let (r, g, b) = if nm < 440.0 {
        (-(nm - 440.0) / (440.0 - 380.0), 0.0, 1.0)
    } else if nm < 490.0 {
        (0.0, (nm - 440.0) / (490.0 - 440.0), 1.0)
    } else if nm < 510.0 {
        (0.0, 1.0, -(nm - 510.0) / (510.0 - 490.0))
    } else if nm < 580.0 {
        ((nm - 510.0) / (580.0 - 510.0), 1.0, 0.0)
    } else if nm < 645.0 {
        (1.0, -(nm - 645.0) / (645.0 - 580.0), 0.0)
    } else {
        (1.0, 0.0, 0.0)
    };

    // Eye sensitivity falls off near the edges of the band.
    let factor = if nm < 420.0 {
        0.3 + 0.7 * (nm - 380.0) / (420.0 - 380.0)
    } else if nm <= 700.0 {
        1.0
    } else {
        0.3 + 0.7 * (780.0 - nm) / (780.0 - 700.0)
    };

    let adjust = |c: f32| {
        if c <= 0.0 {
            0.0
        } else {
            (c * factor).powf(SPECTRUM_GAMMA).min(1.0)
        }
    };

    NormalizedRgb([adjust(r), adjust(g), adjust(b)])
}

/// Approximate color of a blackbody at `kelvin` (Tanner Helland fit).
///
/// Inputs outside `[1000, 40000]` K saturate at the nearest end; NaN is treated
/// as the cool end. Channels come back rounded to whole device units.
pub fn temperature_to_rgb(kelvin: f32) -> DeviceRgb {
    let kelvin = if kelvin.is_nan() {
        MIN_TEMPERATURE_K
    } else {
        kelvin.clamp(MIN_TEMPERATURE_K, MAX_TEMPERATURE_K)
    };
    let t = kelvin / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_73 * (t - 60.0).powf(-0.133_204_76)
    };
    let g = if t <= 66.0 {
        99.470_8 * t.ln() - 161.119_57
    } else {
        288.122_17 * (t - 60.0).powf(-0.075_514_85)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_73 * (t - 10.0).ln() - 305.044_8
    };

    DeviceRgb([r, g, b].map(|c| c.clamp(0.0, 255.0).round()))
}

/// Peak emission wavelength of a blackbody, in nanometres.
pub fn peak_wavelength_nm(kelvin: f32) -> f32 {
    WIEN_B_NM_K / kelvin
}

pub fn rgb_to_hsv(rgb: NormalizedRgb) -> Hsv {
    let [r, g, b] = rgb.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let sector = if chroma == 0.0 {
        0.0
    } else if max == r {
        (g - b) / chroma
    } else if max == g {
        2.0 + (b - r) / chroma
    } else {
        4.0 + (r - g) / chroma
    };
    let h = (sector * 60.0).rem_euclid(360.0);
    let s = if max == 0.0 { 0.0 } else { chroma / max };

    Hsv { h, s, v: max }
}

pub fn hsv_to_rgb(hsv: Hsv) -> NormalizedRgb {
    let Hsv { h, s, v } = hsv;
    let channel = |n: f32| {
        let k = (n + h / 60.0).rem_euclid(6.0);
        v - v * s * k.min(4.0 - k).clamp(0.0, 1.0)
    };
    NormalizedRgb([channel(5.0), channel(3.0), channel(1.0)])
}

/// Replace the HSV value channel of `rgb`, keeping hue and saturation.
///
/// `value` is clamped to `[0, 1]`.
pub fn with_value(rgb: NormalizedRgb, value: f32) -> NormalizedRgb {
    let hsv = rgb_to_hsv(rgb);
    hsv_to_rgb(Hsv {
        v: value.clamp(0.0, 1.0),
        ..hsv
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: NormalizedRgb, b: NormalizedRgb, eps: f32) -> bool {
        a.0.iter().zip(b.0.iter()).all(|(x, y)| (x - y).abs() < eps)
    }

    #[test]
    fn test_wavelength_outside_visible_band_is_black() {
        for nm in [0.0, 379.9, 780.1, 1200.0, -5.0, f32::NAN, f32::INFINITY] {
            assert_eq!(
                wavelength_to_rgb(nm),
                NormalizedRgb::BLACK,
                "{nm} nm should map to black"
            );
        }
    }

    #[test]
    fn test_wavelength_channels_stay_normalized() {
        let mut nm = VISIBLE_MIN_NM;
        while nm <= VISIBLE_MAX_NM {
            let rgb = wavelength_to_rgb(nm);
            for (ch, &c) in rgb.0.iter().enumerate() {
                assert!(
                    (0.0..=1.0).contains(&c),
                    "{nm} nm channel {ch} = {c} is outside [0, 1]"
                );
            }
            nm += 0.5;
        }
    }

    #[test]
    fn test_wavelength_hues_follow_the_spectrum() {
        let blue = wavelength_to_rgb(450.0);
        let green = wavelength_to_rgb(550.0);
        let red = wavelength_to_rgb(650.0);

        assert!(blue.0[2] > blue.0[0], "450 nm should be blue: {blue:?}");
        assert!(green.0[1] >= green.0[2], "550 nm should be green: {green:?}");
        assert_eq!(red.0, [1.0, 0.0, 0.0], "650 nm should be pure red");
        assert_ne!(blue, green);
        assert_ne!(green, red);
    }

    #[test]
    fn test_wavelength_edges_are_dimmed() {
        let violet = wavelength_to_rgb(380.0);
        let deep_red = wavelength_to_rgb(780.0);
        let expected = 0.3_f32.powf(SPECTRUM_GAMMA);
        assert!((violet.0[2] - expected).abs() < 1e-5, "{violet:?}");
        assert!((deep_red.0[0] - expected).abs() < 1e-5, "{deep_red:?}");
        assert_eq!(deep_red.0[1], 0.0, "zero channels stay zero after gamma");
    }

    #[test]
    fn test_temperature_channels_are_whole_device_units() {
        for kelvin in [500.0, 1000.0, 1850.0, 3000.0, 5778.0, 6600.0, 10_000.0, 40_000.0, 90_000.0]
        {
            let rgb = temperature_to_rgb(kelvin);
            for &c in &rgb.0 {
                assert!((0.0..=255.0).contains(&c), "{kelvin} K gave {rgb:?}");
                assert_eq!(c, c.round(), "{kelvin} K channel {c} is not an integer");
            }
        }
    }

    #[test]
    fn test_temperature_cool_is_red_hot_is_blue() {
        let cool = temperature_to_rgb(2500.0);
        let hot = temperature_to_rgb(25_000.0);
        assert!(cool.0[0] > cool.0[2], "2500 K should be reddish: {cool:?}");
        assert!(hot.0[2] > hot.0[0], "25000 K should be bluish: {hot:?}");
    }

    #[test]
    fn test_temperature_saturates_out_of_range() {
        assert_eq!(temperature_to_rgb(10.0), temperature_to_rgb(MIN_TEMPERATURE_K));
        assert_eq!(temperature_to_rgb(1e9), temperature_to_rgb(MAX_TEMPERATURE_K));
        assert_eq!(temperature_to_rgb(f32::NAN), temperature_to_rgb(MIN_TEMPERATURE_K));
    }

    #[test]
    fn test_peak_wavelength_of_the_sun_is_visible() {
        let peak = peak_wavelength_nm(5778.0);
        assert!((peak - 501.5).abs() < 1.0, "solar peak should be ~501.5 nm, got {peak}");
    }

    #[test]
    fn test_hsv_round_trip_is_identity() {
        let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for &r in &steps {
            for &g in &steps {
                for &b in &steps {
                    let rgb = NormalizedRgb([r, g, b]);
                    let back = hsv_to_rgb(rgb_to_hsv(rgb));
                    assert!(approx_eq(rgb, back, 1e-5), "{rgb:?} came back as {back:?}");
                }
            }
        }
    }

    #[test]
    fn test_hsv_primary_hues() {
        assert_eq!(rgb_to_hsv(NormalizedRgb([1.0, 0.0, 0.0])).h, 0.0);
        assert!((rgb_to_hsv(NormalizedRgb([0.0, 1.0, 0.0])).h - 120.0).abs() < 1e-4);
        assert!((rgb_to_hsv(NormalizedRgb([0.0, 0.0, 1.0])).h - 240.0).abs() < 1e-4);
        let magenta = rgb_to_hsv(NormalizedRgb([1.0, 0.0, 0.5]));
        assert!((0.0..360.0).contains(&magenta.h), "hue {} out of range", magenta.h);
    }

    #[test]
    fn test_with_value_keeps_hue_and_saturation() {
        let orange = NormalizedRgb([1.0, 0.5, 0.0]);
        let dim = with_value(orange, 0.4);
        let before = rgb_to_hsv(orange);
        let after = rgb_to_hsv(dim);
        assert!((before.h - after.h).abs() < 1e-3);
        assert!((before.s - after.s).abs() < 1e-4);
        assert!((after.v - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_with_value_on_black_stays_gray() {
        let lifted = with_value(NormalizedRgb::BLACK, 0.5);
        assert!(approx_eq(lifted, NormalizedRgb([0.5; 3]), 1e-6), "{lifted:?}");
    }

    #[test]
    fn test_device_conversion_is_inverse() {
        let rgb = NormalizedRgb([0.2, 0.4, 1.0]);
        let back = rgb.to_device().to_normalized();
        assert!(approx_eq(rgb, back, 1e-6));
        assert_eq!(NormalizedRgb::WHITE.to_device(), DeviceRgb::WHITE);
    }
}
