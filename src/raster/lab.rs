//! sRGB <-> CIE Lab (D65) conversion of whole rasters.
//!
//! RGB samples are on the 8-bit scale (`0..=255`). Lab samples have L in
//! `0..=100` and a, b roughly in `-128..=127`, matching [`LAB_RANGES`].
//!
//! [`LAB_RANGES`]: super::LAB_RANGES

use ndarray::{aview1, Axis};

use super::Raster;

const D65_X: f64 = 0.95047;
const D65_Y: f64 = 1.00000;
const D65_Z: f64 = 1.08883;

const SRGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

const XYZ_TO_SRGB: [[f64; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

const DELTA: f64 = 6.0 / 29.0;

fn lab_f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(v: f64) -> f64 {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn mul(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Convert one 8-bit-scale sRGB pixel to Lab.
pub fn pixel_to_lab(rgb: [f64; 3]) -> [f64; 3] {
    let linear = rgb.map(|v| srgb_to_linear((v / 255.0).clamp(0.0, 1.0)));
    let [x, y, z] = mul(&SRGB_TO_XYZ, linear);

    let fx = lab_f(x / D65_X);
    let fy = lab_f(y / D65_Y);
    let fz = lab_f(z / D65_Z);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Convert one Lab pixel back to 8-bit-scale sRGB.
///
/// Out-of-gamut colors are clipped to `0..=255`.
pub fn pixel_from_lab(lab: [f64; 3]) -> [f64; 3] {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = fy + lab[1] / 500.0;
    let fz = fy - lab[2] / 200.0;

    let xyz = [
        lab_f_inv(fx) * D65_X,
        lab_f_inv(fy) * D65_Y,
        lab_f_inv(fz) * D65_Z,
    ];
    mul(&XYZ_TO_SRGB, xyz).map(|v| linear_to_srgb(v.clamp(0.0, 1.0)) * 255.0)
}

fn map_pixels(raster: &Raster, convert: fn([f64; 3]) -> [f64; 3]) -> Raster {
    let mut out = raster.clone();
    for mut px in out.lanes_mut(Axis(2)) {
        let converted = convert([px[0], px[1], px[2]]);
        px.assign(&aview1(&converted));
    }
    out
}

/// Convert a three-channel sRGB raster to Lab.
///
/// Returns `None` unless the raster has exactly three channels.
pub fn rgb_to_lab(raster: &Raster) -> Option<Raster> {
    (raster.dim().2 == 3).then(|| map_pixels(raster, pixel_to_lab))
}

/// Convert a three-channel Lab raster to sRGB.
///
/// Returns `None` unless the raster has exactly three channels.
pub fn lab_to_rgb(raster: &Raster) -> Option<Raster> {
    (raster.dim().2 == 3).then(|| map_pixels(raster, pixel_from_lab))
}
