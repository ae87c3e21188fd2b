use crate::core::{MAX_PROJECTION_YEARS, TrackerReport};

/// Whole-dollar amount with thousands separators, e.g. `-$1,234,568`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("${value}");
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn included(flag: bool) -> &'static str {
    if flag { "included" } else { "excluded" }
}

pub fn render_text_report(report: &TrackerReport) -> String {
    let mut out = String::new();
    let years = if report.reached {
        report.years_to_fi.to_string()
    } else {
        format!("not reached within {MAX_PROJECTION_YEARS} years")
    };

    let rows = [
        ("FIRE goal", format_currency(report.fire_goal)),
        (
            "Adjusted annual expenses",
            format!(
                "{} (net real estate cashflow {}, {})",
                format_currency(report.adjusted_expenses),
                format_currency(report.net_real_estate_cashflow),
                included(report.real_estate_included)
            ),
        ),
        ("Liquid investable assets", format_currency(report.liquid_assets)),
        (
            "Illiquid assets",
            format!(
                "{} ({})",
                format_currency(report.illiquid_assets),
                included(report.illiquid_included)
            ),
        ),
        ("Total net worth", format_currency(report.total_net_worth)),
        ("Estimated years to FI", years),
        ("Projected net worth at FI", format_currency(report.final_net_worth)),
        (
            "Progress toward FIRE",
            format!(
                "{:.1}% ({})",
                report.progress * 100.0,
                report.progress_tier.as_str()
            ),
        ),
        (
            "Property value at FI",
            format!(
                "{} (gain {} over {} years)",
                format_currency(report.appreciation.future_value),
                format_currency(report.appreciation.gain),
                report.appreciation.years
            ),
        ),
    ];
    for (label, value) in rows {
        out.push_str(&format!("{:<28}{value}\n", format!("{label}:")));
    }

    out.push('\n');
    out.push_str(&format!("{:>4}  Net worth\n", "Year"));
    for (year, balance) in report.trajectory.iter().enumerate() {
        out.push_str(&format!("{year:>4}  {}\n", format_currency(*balance)));
    }
    out
}
