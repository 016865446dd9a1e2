use std::fmt::Write;

use chrono::NaiveDate;
use csv::{Terminator, WriterBuilder};

use crate::attainment::{weight_label, WeightageMap, MAX_WEIGHT};
use crate::models::{
    AttainmentResult, Course, CourseOutcome, CourseRow, OverviewRow, ProgramOutcome, Report,
};

pub const OVERVIEW_LIMIT: usize = 8;

pub fn attainment_csv(results: &[AttainmentResult]) -> anyhow::Result<String> {
    write_csv(
        "PO",
        results
            .iter()
            .map(|r| [r.po_code.clone(), r.percentage.to_string()]),
    )
}

pub fn overview_csv(rows: &[OverviewRow]) -> anyhow::Result<String> {
    write_csv(
        "PO",
        rows.iter()
            .map(|r| [r.po_code.clone(), format!("{:.1}", r.percentage)]),
    )
}

pub fn course_overview_csv(rows: &[CourseRow]) -> anyhow::Result<String> {
    write_csv(
        "Course",
        rows.iter()
            .map(|r| [r.course_code.clone(), format!("{:.1}", r.percentage)]),
    )
}

fn write_csv(label: &str, rows: impl Iterator<Item = [String; 2]>) -> anyhow::Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record([label, "Attainment (%)"])?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv writer: {}", err.error()))?;
    let body = String::from_utf8(bytes)?;
    Ok(body.trim_end_matches('\n').to_string())
}

pub fn export_file_name(course: &Course) -> String {
    format!("PO_Attainment_{}.csv", course.id)
}

/// Average historical score per PO across all reports, for the first
/// `limit` program outcomes.
pub fn overview(reports: &[Report], program_outcomes: &[ProgramOutcome], limit: usize) -> Vec<OverviewRow> {
    if reports.is_empty() {
        return Vec::new();
    }

    program_outcomes
        .iter()
        .take(limit)
        .map(|po| {
            let total: f64 = reports
                .iter()
                .map(|r| r.po_attainment.get(&po.code).copied().unwrap_or(0.0))
                .sum();
            let avg = total / reports.len() as f64;
            OverviewRow {
                po_code: po.code.clone(),
                attainment: (avg * 100.0).round() / 100.0,
                percentage: avg / f64::from(MAX_WEIGHT) * 100.0,
            }
        })
        .collect()
}

/// Mean of each course's first non-empty report, 0 for courses without one.
pub fn course_overview(courses: &[Course], reports: &[Report]) -> Vec<CourseRow> {
    courses
        .iter()
        .filter(|c| !c.code.is_empty() && !c.name.is_empty())
        .map(|course| {
            let avg = reports
                .iter()
                .find(|r| r.course_id == course.id && !r.po_attainment.is_empty())
                .map(|r| r.po_attainment.values().sum::<f64>() / r.po_attainment.len() as f64)
                .unwrap_or(0.0);
            CourseRow {
                course_code: course.code.clone(),
                attainment: (avg * 100.0).round() / 100.0,
                percentage: avg / f64::from(MAX_WEIGHT) * 100.0,
            }
        })
        .collect()
}

pub fn build_report(
    course: &Course,
    course_outcomes: &[CourseOutcome],
    program_outcomes: &[ProgramOutcome],
    mappings: &WeightageMap,
    results: &[AttainmentResult],
    generated_on: NaiveDate,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# PO Attainment Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        course.code, course.name, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attainment");

    if course_outcomes.is_empty() {
        let _ = writeln!(output, "No course outcomes recorded for this course.");
        return output;
    }

    let _ = writeln!(output, "| PO | Name | Attainment |");
    let _ = writeln!(output, "| --- | --- | --- |");
    for result in results {
        let name = program_outcomes
            .iter()
            .find(|po| po.code == result.po_code)
            .map(|po| po.name.as_str())
            .unwrap_or("");
        let _ = writeln!(output, "| {} | {} | {}% |", result.po_code, name, result.percentage);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## CO → PO Mapping");

    let header: Vec<&str> = program_outcomes.iter().map(|po| po.code.as_str()).collect();
    let _ = writeln!(output, "| CO | {} |", header.join(" | "));
    let _ = writeln!(output, "| --- |{}", " --- |".repeat(header.len()));
    for co in course_outcomes {
        let cells: Vec<String> = program_outcomes
            .iter()
            .map(|po| mappings.get(&co.id, &po.code).to_string())
            .collect();
        let _ = writeln!(output, "| {} | {} |", co.code, cells.join(" | "));
    }
    let totals: Vec<String> = program_outcomes
        .iter()
        .map(|po| mappings.po_total(course_outcomes, &po.code).to_string())
        .collect();
    let _ = writeln!(output, "| Total | {} |", totals.join(" | "));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Outcome Preview");
    for co in course_outcomes {
        let mapped: Vec<String> = program_outcomes
            .iter()
            .filter_map(|po| {
                let weight = mappings.get(&co.id, &po.code);
                (weight > 0).then(|| format!("{}: {}", po.code, weight_label(weight)))
            })
            .collect();
        let summary = if mapped.is_empty() {
            "No mappings yet".to_string()
        } else {
            mapped.join(", ")
        };
        let _ = writeln!(
            output,
            "- {} {}: {} (total strength {})",
            co.code,
            co.description,
            summary,
            mappings.co_strength(&co.id, program_outcomes)
        );
    }

    output
}
