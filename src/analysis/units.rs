//! Conversions between delay-line displacement, optical delay and
//! instrument readings.

/// Speed of light in vacuum, mm/ps (~0.3 mm/ps).
pub const C_MM_PER_PS: f64 = 299_792_458e3 / 1e12;

/// Full-scale analog output of the lock-in, volts.
pub const RAW_FULL_SCALE_V: f64 = 10.0;

/// Optical delay to mechanical displacement. The caller accounts for the
/// beam double-passing the stage (displacement of `2 * dx` per `dx` of
/// stage travel).
pub fn ps_to_mm(t_ps: f64) -> f64 {
    t_ps * C_MM_PER_PS
}

/// Mechanical displacement to optical delay.
pub fn mm_to_ps(d_mm: f64) -> f64 {
    d_mm / C_MM_PER_PS
}

/// Rescale a raw analog reading (volts) into physical signal units given
/// the instrument's full-scale sensitivity.
pub fn raw_to_signal(raw: f64, sensitivity: f64) -> f64 {
    raw * sensitivity / RAW_FULL_SCALE_V
}

pub fn signal_to_raw(signal: f64, sensitivity: f64) -> f64 {
    signal * RAW_FULL_SCALE_V / sensitivity
}

pub fn amps_to_nanoamps(a: f64) -> f64 {
    a * 1e9
}
