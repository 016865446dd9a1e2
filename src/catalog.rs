use std::collections::BTreeMap;

use anyhow::bail;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Course, CourseOutcome, ProgramOutcome, Report};

pub const DEFAULT_DEPARTMENT: &str = "Computer Engg";

pub const ASSESSMENT_TOOLS: [&str; 4] = ["Exam", "Quiz", "Project", "Lab"];

pub fn courses() -> Vec<Course> {
    [
        ("c1", "CS101", "Data Structures", 3),
        ("c2", "CS102", "Algorithms", 3),
        ("c3", "CS201", "DBMS", 4),
        ("c4", "CS202", "Operating Systems", 4),
        ("c5", "CS301", "Computer Networks", 5),
        ("c6", "CS302", "Software Engineering", 5),
    ]
    .into_iter()
    .map(|(id, code, name, semester)| Course {
        id: id.to_string(),
        code: code.to_string(),
        name: name.to_string(),
        department: DEFAULT_DEPARTMENT.to_string(),
        semester,
    })
    .collect()
}

pub fn course_outcomes() -> Vec<CourseOutcome> {
    [
        ("co1", "c1", "CO1", "Understand arrays", "Understanding"),
        ("co2", "c1", "CO2", "Implement linked lists", "Applying"),
        ("co3", "c1", "CO3", "Analyze time complexity", "Analyzing"),
        ("co4", "c2", "CO1", "Analyze sorting algorithms", "Analyzing"),
        ("co5", "c2", "CO2", "Design divide-and-conquer solutions", "Creating"),
        ("co6", "c3", "CO1", "Design ER models", "Creating"),
    ]
    .into_iter()
    .map(|(id, course_id, code, description, blooms_level)| CourseOutcome {
        id: id.to_string(),
        course_id: course_id.to_string(),
        code: code.to_string(),
        description: description.to_string(),
        blooms_level: blooms_level.to_string(),
    })
    .collect()
}

pub fn program_outcomes() -> Vec<ProgramOutcome> {
    [
        ("PO1", "Problem Solving"),
        ("PO2", "Engineering Knowledge"),
        ("PO3", "Design Skills"),
        ("PO4", "Teamwork"),
        ("PO5", "Communication"),
        ("PO6", "Lifelong Learning"),
    ]
    .into_iter()
    .map(|(code, name)| ProgramOutcome {
        code: code.to_string(),
        name: name.to_string(),
    })
    .collect()
}

pub fn reports() -> Vec<Report> {
    let history = [
        ("r1", "c1", [2.8, 2.5, 2.7, 2.3, 2.6, 2.4], (2023, 12, 15)),
        ("r2", "c2", [2.9, 2.8, 2.6, 2.4, 2.7, 2.3], (2023, 12, 16)),
    ];

    history
        .into_iter()
        .filter_map(|(id, course_id, scores, (y, m, d))| {
            let po_attainment: BTreeMap<String, f64> = scores
                .iter()
                .enumerate()
                .map(|(idx, score)| (format!("PO{}", idx + 1), *score))
                .collect();
            Some(Report {
                id: id.to_string(),
                course_id: course_id.to_string(),
                semester: "Fall 2023".to_string(),
                year: y,
                po_attainment,
                generated_at: NaiveDate::from_ymd_opt(y, m, d)?,
            })
        })
        .collect()
}

/// Resolves a course by id or by code (case-insensitive).
pub fn find_course<'a>(courses: &'a [Course], needle: &str) -> Option<&'a Course> {
    courses
        .iter()
        .find(|c| c.id == needle || c.code.eq_ignore_ascii_case(needle))
}

pub fn new_course_outcome(
    existing: &[CourseOutcome],
    course_id: &str,
    code: &str,
    description: &str,
    blooms_level: &str,
) -> anyhow::Result<CourseOutcome> {
    let code = code.trim();
    let description = description.trim();
    if code.is_empty() || description.is_empty() {
        bail!("course outcome code and description are required");
    }
    if existing
        .iter()
        .any(|co| co.course_id == course_id && co.code.eq_ignore_ascii_case(code))
    {
        bail!("{code} already exists for course {course_id}");
    }

    Ok(CourseOutcome {
        id: format!("co-{}", Uuid::new_v4()),
        course_id: course_id.to_string(),
        code: code.to_string(),
        description: description.to_string(),
        blooms_level: blooms_level.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_codes_are_unique_per_course() {
        let outcomes = course_outcomes();
        for co in &outcomes {
            let dupes = outcomes
                .iter()
                .filter(|other| other.course_id == co.course_id && other.code == co.code)
                .count();
            assert_eq!(dupes, 1, "{} duplicated in {}", co.code, co.course_id);
        }
    }

    #[test]
    fn finds_course_by_id_or_code() {
        let courses = courses();
        assert_eq!(find_course(&courses, "c2").map(|c| c.code.as_str()), Some("CS102"));
        assert_eq!(find_course(&courses, "cs201").map(|c| c.id.as_str()), Some("c3"));
        assert!(find_course(&courses, "CS999").is_none());
    }

    #[test]
    fn new_outcome_rejects_duplicate_code() {
        let outcomes = course_outcomes();
        assert!(new_course_outcome(&outcomes, "c1", "co2", "Again", "").is_err());

        let added = new_course_outcome(&outcomes, "c3", "CO2", "Normalise schemas", "Applying")
            .unwrap();
        assert_eq!(added.course_id, "c3");
        assert_eq!(added.code, "CO2");
        assert!(added.id.starts_with("co-"));
    }

    #[test]
    fn new_outcome_requires_text() {
        assert!(new_course_outcome(&[], "c1", " ", "Something", "").is_err());
        assert!(new_course_outcome(&[], "c1", "CO1", "", "").is_err());
    }

    #[test]
    fn seeded_reports_cover_every_program_outcome() {
        let pos = program_outcomes();
        for report in reports() {
            for po in &pos {
                assert!(report.po_attainment.contains_key(&po.code));
            }
        }
    }
}
