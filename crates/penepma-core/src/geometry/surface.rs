//! Reduced quadric surfaces and the fixed-width line forms of PENGEOM files.

use crate::common::units::{m_to_cm, rad_to_deg};
use crate::domain::{PenelopeError, PenelopeResult};
use std::f64::consts::FRAC_PI_2;

pub(super) const LINE_SIZE: usize = 64;
const KEYWORD_SIZE: usize = 8;

const ANGLE_TERMINATION: &str = " DEG          (DEFAULT=0.0)";
const SHIFT_TERMINATION: &str = "              (DEFAULT=0.0)";
const SCALE_TERMINATION: &str = "              (DEFAULT=1.0)";

/// Formats `number` in the PENELOPE `E22.15` form, e.g.
/// `+1.800000000000000E+02`.
pub fn to_exponent(number: f64) -> String {
    let exponent = if number == 0.0 {
        0.0
    } else {
        number.abs().log10()
    };
    let exponent = exponent.trunc();
    let exponent_sign = if exponent >= 0.0 { '+' } else { '-' };
    let coefficient = number.abs() / 10f64.powi(exponent as i32);
    let sign = if number >= 0.0 { '+' } else { '-' };

    format!(
        "{sign}{coefficient:17.15}E{exponent_sign}{:02}",
        exponent.abs() as i64
    )
}

fn checked_line(line: String) -> PenelopeResult<String> {
    if line.len() > LINE_SIZE {
        return Err(PenelopeError::internal(
            "FORMAT.LINE_LENGTH",
            format!(
                "geometry line exceeds {LINE_SIZE} columns ({}): {line}",
                line.len()
            ),
        ));
    }
    Ok(line)
}

/// `   NAME(+x.xxxE+yy,   0)termination`, name right-aligned to 8 columns.
pub fn expline(name: &str, value: f64, termination: &str) -> PenelopeResult<String> {
    checked_line(format!(
        "{name:>width$}({},{:4}){termination}",
        to_exponent(value),
        0,
        width = KEYWORD_SIZE
    ))
}

/// `NAME    (text)termination`, name left-aligned to 8 columns.
pub fn create_line(name: &str, text: &str, termination: &str) -> PenelopeResult<String> {
    checked_line(format!(
        "{name:<width$}({text}){termination}",
        width = KEYWORD_SIZE
    ))
}

/// Euler angles (ZYZ convention), each within `[0, 2pi]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub omega_rad: f64,
    pub theta_rad: f64,
    pub phi_rad: f64,
}

impl Rotation {
    pub fn to_geo(&self) -> PenelopeResult<Vec<String>> {
        Ok(vec![
            expline("OMEGA=", rad_to_deg(self.omega_rad), ANGLE_TERMINATION)?,
            expline("THETA=", rad_to_deg(self.theta_rad), ANGLE_TERMINATION)?,
            expline("PHI=", rad_to_deg(self.phi_rad), ANGLE_TERMINATION)?,
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shift {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

impl Shift {
    pub fn to_geo(&self) -> PenelopeResult<Vec<String>> {
        Ok(vec![
            expline("X-SHIFT=", m_to_cm(self.x_m), SHIFT_TERMINATION)?,
            expline("Y-SHIFT=", m_to_cm(self.y_m), SHIFT_TERMINATION)?,
            expline("Z-SHIFT=", m_to_cm(self.z_m), SHIFT_TERMINATION)?,
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

impl Scale {
    pub fn to_geo(&self) -> PenelopeResult<Vec<String>> {
        Ok(vec![
            expline("X-SCALE=", self.x, SCALE_TERMINATION)?,
            expline("Y-SCALE=", self.y, SCALE_TERMINATION)?,
            expline("Z-SCALE=", self.z, SCALE_TERMINATION)?,
        ])
    }
}

/// Reduced quadric `I1 x^2 + I2 y^2 + I3 z^2 + I4 z + I5 = 0` with its
/// scale, rotation and shift.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub description: String,
    pub indices: [i8; 5],
    pub scale: Scale,
    pub rotation: Rotation,
    pub shift: Shift,
}

impl Surface {
    fn reduced(indices: [i8; 5], description: String) -> Self {
        Self {
            description,
            indices,
            scale: Scale::default(),
            rotation: Rotation::default(),
            shift: Shift::default(),
        }
    }

    pub fn zplane(z_m: f64) -> Self {
        let mut surface = Self::reduced([0, 0, 0, 1, 0], format!("Plane Z={z_m:4.2} m"));
        surface.shift.z_m = z_m;
        surface
    }

    pub fn xplane(x_m: f64) -> Self {
        let mut surface = Self::reduced([0, 0, 0, 1, 0], format!("Plane X={x_m:4.2} m"));
        surface.shift.x_m = x_m;
        surface.rotation.theta_rad = FRAC_PI_2;
        surface
    }

    pub fn yplane(y_m: f64) -> Self {
        let mut surface = Self::reduced([0, 0, 0, 1, 0], format!("Plane Y={y_m:4.2} m"));
        surface.shift.y_m = y_m;
        surface.rotation.theta_rad = FRAC_PI_2;
        surface.rotation.phi_rad = FRAC_PI_2;
        surface
    }

    /// Cylinder along the z-axis.
    pub fn cylinder(radius_m: f64) -> Self {
        let mut surface = Self::reduced(
            [1, 1, 0, 0, -1],
            format!("Cylinder of radius {radius_m:4.2} m along z-axis"),
        );
        surface.scale.x = m_to_cm(radius_m);
        surface.scale.y = m_to_cm(radius_m);
        surface
    }

    pub fn sphere(radius_m: f64) -> Self {
        let mut surface =
            Self::reduced([1, 1, 1, 0, -1], format!("Sphere of radius {radius_m:4.2} m"));
        surface.scale.x = m_to_cm(radius_m);
        surface.scale.y = m_to_cm(radius_m);
        surface.scale.z = m_to_cm(radius_m);
        surface
    }

    /// Lines of this surface given its zero-based file index.
    pub fn to_geo(&self, index: usize) -> PenelopeResult<Vec<String>> {
        let [i1, i2, i3, i4, i5] = self.indices;
        let mut lines = vec![
            create_line(
                "SURFACE",
                &format!("{:4}", index + 1),
                &format!(" {}", self.description),
            )?,
            create_line(
                "INDICES=",
                &format!("{i1:2},{i2:2},{i3:2},{i4:2},{i5:2}"),
                "",
            )?,
        ];
        lines.extend(self.scale.to_geo()?);
        lines.extend(self.rotation.to_geo()?);
        lines.extend(self.shift.to_geo()?);
        Ok(lines)
    }
}
