//! CSV Output
//!
//! One section per result table, separated by blank lines, each with a `#`
//! title row and a header row. Spreadsheet tools import the sections as-is;
//! the Excel-specific formatting lives with the external exporter.

use std::fmt::Write;

use crate::report::Report;

/// Generate the CSV report.
pub fn generate_csv_report(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# sfpo report v{}", report.meta.version);
    let _ = writeln!(
        out,
        "# generated {} (seed {})",
        report.meta.timestamp.to_rfc3339(),
        report.meta.seed
    );
    out.push('\n');

    if !report.specimens.is_empty() {
        let _ = writeln!(out, "# specimens");
        let mut header = String::from(
            "series,specimen,max_force,embedding_length,fiber_diameter,ifss,ifss_valid,work,\
             force_modulus,force_modulus_valid,work_before_fmax,work_after_fmax,\
             area_normalized_work,area_normalized_work_valid",
        );
        for i in 1..=10 {
            let _ = write!(header, ",interval_{i}");
        }
        for i in 1..=10 {
            let _ = write!(header, ",normed_{i}");
        }
        let _ = writeln!(out, "{header}");

        for s in &report.specimens {
            let _ = write!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                s.series,
                s.specimen,
                s.max_force,
                s.embedding_length,
                s.fiber_diameter,
                s.ifss,
                s.ifss_valid,
                s.work,
                s.force_modulus,
                s.force_modulus_valid,
                s.work_before_fmax,
                s.work_after_fmax,
                s.area_normalized_work,
                s.area_normalized_work_valid,
            );
            for v in &s.work_intervals {
                let _ = write!(out, ",{v}");
            }
            match &s.normed_intervals {
                Some(normed) => {
                    for v in normed {
                        let _ = write!(out, ",{v}");
                    }
                }
                // Zero-work specimen: normed columns stay empty.
                None => out.push_str(&",".repeat(10)),
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !report.series_features.is_empty() {
        let _ = writeln!(out, "# series_features");
        let _ = writeln!(out, "series,feature,count,mean,std_dev");
        for r in &report.series_features {
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                r.series, r.feature, r.count, r.mean, r.std_dev
            );
        }
        out.push('\n');
    }

    if !report.intervals.is_empty() {
        let _ = writeln!(out, "# intervals");
        let _ = writeln!(
            out,
            "series,position,mean,std_dev,relative_std_dev,cumulative_mean,cumulative_std_dev"
        );
        for r in &report.intervals {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{}",
                r.series,
                r.position,
                r.mean,
                r.std_dev,
                r.relative_std_dev,
                r.cumulative_mean,
                r.cumulative_std_dev
            );
        }
        out.push('\n');
    }

    if !report.bootstrap.is_empty() {
        let _ = writeln!(out, "# bootstrap");
        let _ = writeln!(
            out,
            "feature,group,iterations,original_mean,original_median,original_std,\
             ci95_lower,ci95_upper,ci90_lower,ci90_upper"
        );
        for r in &report.bootstrap {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{}",
                r.feature,
                r.group,
                r.iterations,
                r.original_mean,
                r.original_median,
                r.original_std,
                r.ci95_lower,
                r.ci95_upper,
                r.ci90_lower,
                r.ci90_upper
            );
        }
        out.push('\n');
    }

    if !report.anova.is_empty() {
        let _ = writeln!(out, "# anova");
        let _ = writeln!(
            out,
            "feature,f_statistic,p_value,significant,eta_squared,shapiro_statistic,shapiro_p,\
             levene_statistic,levene_p,expanded_group_size"
        );
        for r in &report.anova {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{}",
                r.feature,
                r.f_statistic,
                r.p_value,
                r.significant,
                r.eta_squared,
                r.shapiro_statistic,
                r.shapiro_p,
                r.levene_statistic,
                r.levene_p,
                r.expanded_group_size
                    .map(|n| n.to_string())
                    .unwrap_or_default()
            );
        }
        out.push('\n');
    }

    if !report.posthoc.is_empty() {
        let _ = writeln!(out, "# posthoc");
        let _ = writeln!(
            out,
            "feature,group_a,group_b,mean_difference,adjusted_p,significant"
        );
        for r in &report.posthoc {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{}",
                r.feature, r.group_a, r.group_b, r.mean_difference, r.adjusted_p, r.significant
            );
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{PosthocRecord, Report, ReportMeta, SeriesFeatureRecord};

    #[test]
    fn test_sections_present() {
        let mut report = Report::new(ReportMeta::new(7));
        report.series_features.push(SeriesFeatureRecord {
            series: "a".into(),
            feature: "max_force".into(),
            count: 3,
            mean: 0.2,
            std_dev: 0.01,
        });
        report.posthoc.push(PosthocRecord {
            feature: "work".into(),
            group_a: "a".into(),
            group_b: "b".into(),
            mean_difference: 1.5,
            adjusted_p: 0.01,
            significant: true,
        });

        let csv = generate_csv_report(&report);
        assert!(csv.contains("# series_features"));
        assert!(csv.contains("a,max_force,3,0.2,0.01"));
        assert!(csv.contains("# posthoc"));
        assert!(csv.contains("work,a,b,1.5,0.01,true"));
        // Empty tables are omitted entirely.
        assert!(!csv.contains("# specimens"));
    }
}
