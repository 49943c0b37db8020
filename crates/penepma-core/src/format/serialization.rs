use std::fs;
use std::path::Path;

/// Line separator of the host platform, used for PENELOPE input files.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Shortest round-trip rendering of `value`, always carrying a decimal point
/// or an exponent (`1.0`, `0.0001`, `1e-05`, `1e+20`).
pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = split_exponent(&scientific);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exponent) {
        let body = if exponent >= 0 {
            let integer_len = exponent as usize + 1;
            if digits.len() <= integer_len {
                format!("{digits}{}.0", "0".repeat(integer_len - digits.len()))
            } else {
                format!("{}.{}", &digits[..integer_len], &digits[integer_len..])
            }
        } else {
            format!("0.{}{digits}", "0".repeat((-exponent - 1) as usize))
        };
        format!("{sign}{body}")
    } else {
        format!("{sign}{mantissa}{}", exponent_suffix(exponent))
    }
}

/// C `%e` rendering: six fraction digits and a two-digit signed exponent.
pub fn format_exponent_c(value: f64) -> String {
    if !value.is_finite() {
        return format_real(value);
    }
    let rendered = format!("{value:.6e}");
    let (mantissa, exponent) = split_exponent(&rendered);
    format!("{mantissa}{}", exponent_suffix(exponent))
}

fn split_exponent(rendered: &str) -> (&str, i32) {
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or(0)),
        None => (rendered, 0),
    }
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("e{sign}{:02}", exponent.abs())
}

pub fn join_lines<S: AsRef<str>>(lines: &[S], separator: &str) -> String {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push_str(separator);
    }
    content
}

pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S], separator: &str) -> std::io::Result<()> {
    fs::write(path, join_lines(lines, separator))
}
