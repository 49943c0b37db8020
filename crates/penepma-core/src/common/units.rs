//! SI to PENELOPE unit conversions.

pub fn m_to_cm(value: f64) -> f64 {
    value * 100.0
}

pub fn cm_to_m(value: f64) -> f64 {
    value / 100.0
}

pub fn rad_to_deg(value: f64) -> f64 {
    value.to_degrees()
}

pub fn deg_to_rad(value: f64) -> f64 {
    value.to_radians()
}

pub fn kg_m3_to_g_cm3(value: f64) -> f64 {
    value / 1000.0
}

pub fn ev_to_kev(value: f64) -> f64 {
    value / 1000.0
}

#[cfg(test)]
mod tests {
    use super::{cm_to_m, deg_to_rad, ev_to_kev, kg_m3_to_g_cm3, m_to_cm, rad_to_deg};

    #[test]
    fn conversions_are_inverse_within_tolerance() {
        for value in [0.0, 1.0e-9, 0.25, 3.7, 1.0e6] {
            assert!((cm_to_m(m_to_cm(value)) - value).abs() <= 1.0e-12 * value.max(1.0));
            assert!((deg_to_rad(rad_to_deg(value)) - value).abs() <= 1.0e-12 * value.max(1.0));
        }
    }

    #[test]
    fn conversions_use_penelope_units() {
        assert_eq!(m_to_cm(0.01), 1.0);
        assert!((rad_to_deg(std::f64::consts::PI) - 180.0).abs() <= 1.0e-12);
        assert_eq!(kg_m3_to_g_cm3(8960.0), 8.96);
        assert_eq!(ev_to_kev(15_000.0), 15.0);
    }
}
