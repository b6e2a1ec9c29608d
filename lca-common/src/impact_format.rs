//! Impact value and percentage formatting
//!
//! Keeps numeric display consistent across every table and chart:
//! - Values outside `[0.1, 10000]` in magnitude use scientific notation
//!   with 3 significant figures (`1.23e-2`, `4.57e+5`)
//! - Values inside use 3 significant figures in plain decimal form with
//!   trailing zeros dropped (`1230`, `0.5`)
//! - Percentages always carry exactly two decimals

/// Magnitudes below this use scientific notation
const SCIENTIFIC_LOWER: f64 = 0.1;
/// Magnitudes above this use scientific notation
const SCIENTIFIC_UPPER: f64 = 10_000.0;
/// Significant figures for every impact value
const SIGNIFICANT_FIGURES: usize = 3;
/// Decimals shown on every percentage
const PERCENT_DECIMALS: usize = 2;
/// Enough fraction digits to print any f64 without rounding
const EXACT_DIGITS: usize = 767;

const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';

/// Format an impact value for display.
///
/// # Examples
///
/// ```
/// use lca_common::impact_format::format_impact_value;
///
/// assert_eq!(format_impact_value(0.05), "5.00e-2");
/// assert_eq!(format_impact_value(123456.0), "1.23e+5");
/// assert_eq!(format_impact_value(1234.5), "1230");
/// assert_eq!(format_impact_value(0.5), "0.5");
/// assert_eq!(format_impact_value(0.0), "0.00e+0");
/// ```
pub fn format_impact_value(value: f64) -> String {
    if let Some(text) = non_finite(value) {
        return text.to_string();
    }

    // -0.0 displays as 0
    let value = if value == 0.0 { 0.0 } else { value };
    let magnitude = value.abs();

    if magnitude < SCIENTIFIC_LOWER || magnitude > SCIENTIFIC_UPPER {
        to_exponential(value, SIGNIFICANT_FIGURES - 1)
    } else {
        to_significant(value, SIGNIFICANT_FIGURES)
    }
}

/// Format a percentage with exactly two decimals.
///
/// # Examples
///
/// ```
/// use lca_common::impact_format::format_percentage;
///
/// assert_eq!(format_percentage(0.0), "0.00%");
/// assert_eq!(format_percentage(100.0), "100.00%");
/// assert_eq!(format_percentage(12.3456), "12.35%");
/// ```
pub fn format_percentage(percent: f64) -> String {
    if let Some(text) = non_finite(percent) {
        return format!("{}%", text);
    }
    if percent == 0.0 {
        return "0.00%".to_string();
    }
    if percent == 100.0 {
        return "100.00%".to_string();
    }
    format!("{}%", to_fixed(percent, PERCENT_DECIMALS))
}

/// Share of `value` in `total` as a percentage of magnitudes, in `[0, 100]`.
///
/// A zero or non-finite total yields 0.
pub fn share_of(value: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() || !value.is_finite() {
        return 0.0;
    }
    (value.abs() / total.abs() * 100.0).clamp(0.0, 100.0)
}

/// Proportional text bar for a percentage share.
///
/// # Examples
///
/// ```
/// use lca_common::impact_format::render_bar;
///
/// assert_eq!(render_bar(50.0, 10), "█████░░░░░");
/// assert_eq!(render_bar(0.0, 4), "░░░░");
/// ```
pub fn render_bar(share_percent: f64, width: usize) -> String {
    let fraction = if share_percent.is_finite() {
        (share_percent / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((fraction * width as f64).round() as usize).min(width);

    let mut bar = String::with_capacity(width * BAR_FILLED.len_utf8());
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(width - filled));
    bar
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value.is_infinite() {
        Some(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        None
    }
}

/// Exact decimal expansion of a finite value: `d0.d1d2... x 10^exponent`
struct Digits {
    negative: bool,
    digits: Vec<u8>,
    exponent: i32,
}

impl Digits {
    fn exact(value: f64) -> Self {
        let formatted = format!("{:.*e}", EXACT_DIGITS, value.abs());
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        Self {
            negative: value.is_sign_negative() && value != 0.0,
            digits: mantissa
                .bytes()
                .filter(u8::is_ascii_digit)
                .map(|b| b - b'0')
                .collect(),
            exponent: exponent.parse().unwrap_or(0),
        }
    }

    /// Keep `keep` leading digits, rounding half away from zero
    fn round_to(mut self, keep: i32) -> Self {
        if keep < 0 {
            self.digits = vec![0];
            return self;
        }
        let keep = keep as usize;
        let round_up = self.digits.get(keep).is_some_and(|d| *d >= 5);
        self.digits.resize(keep, 0);

        if round_up {
            let mut carried = true;
            for digit in self.digits.iter_mut().rev() {
                if *digit == 9 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    carried = false;
                    break;
                }
            }
            if carried {
                // 9.99 -> 10.0, or a lone half digit rounding into the next place
                self.digits.insert(0, 1);
                self.digits.truncate(keep.max(1));
                self.exponent += 1;
            }
        }
        self
    }

    /// Digit at the `10^power` place
    fn at(&self, power: i32) -> u8 {
        let index = self.exponent - power;
        if index < 0 {
            return 0;
        }
        self.digits.get(index as usize).copied().unwrap_or(0)
    }

    fn sign(&self) -> &'static str {
        if self.negative {
            "-"
        } else {
            ""
        }
    }

    /// Plain decimal form with exactly `decimals` fraction digits
    fn fixed(&self, decimals: usize) -> String {
        let mut out = self.sign().to_string();
        for power in (0..=self.exponent.max(0)).rev() {
            out.push(char::from(b'0' + self.at(power)));
        }
        if decimals > 0 {
            out.push('.');
            for power in 1..=decimals as i32 {
                out.push(char::from(b'0' + self.at(-power)));
            }
        }
        out
    }
}

/// Same digits as `Number.prototype.toFixed`
fn to_fixed(value: f64, decimals: usize) -> String {
    let exact = Digits::exact(value);
    let keep = exact.exponent + 1 + decimals as i32;
    exact.round_to(keep).fixed(decimals)
}

/// Exponential form with an explicit exponent sign (`1.23e+5`, `1.23e-2`)
fn to_exponential(value: f64, fraction_digits: usize) -> String {
    let rounded = Digits::exact(value).round_to(fraction_digits as i32 + 1);

    let mut mantissa = rounded.sign().to_string();
    mantissa.push(char::from(b'0' + rounded.at(rounded.exponent)));
    if fraction_digits > 0 {
        mantissa.push('.');
        for offset in 1..=fraction_digits as i32 {
            mantissa.push(char::from(b'0' + rounded.at(rounded.exponent - offset)));
        }
    }

    let exponent = if value == 0.0 { 0 } else { rounded.exponent };
    if exponent < 0 {
        format!("{}e{}", mantissa, exponent)
    } else {
        format!("{}e+{}", mantissa, exponent)
    }
}

/// Round to `digits` significant figures and print in shortest decimal form
fn to_significant(value: f64, digits: usize) -> String {
    let rounded = Digits::exact(value).round_to(digits as i32);
    let decimals = (digits as i32 - 1 - rounded.exponent).max(0) as usize;
    let fixed = rounded.fixed(decimals);
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}
