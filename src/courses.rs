use anyhow::{bail, Context};
use uuid::Uuid;

use crate::catalog::{self, DEFAULT_DEPARTMENT};
use crate::models::Course;
use crate::store::{self, KeyValueStore, COURSES_KEY};

#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub code: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub semester: Option<u8>,
}

/// Stored course list, or the built-in catalog before anything was saved.
pub fn load_courses(store: &dyn KeyValueStore) -> anyhow::Result<Vec<Course>> {
    let stored: Option<Vec<Course>> = store::load_json(store, COURSES_KEY)?;
    Ok(stored.unwrap_or_else(catalog::courses))
}

pub fn save_courses(store: &mut dyn KeyValueStore, courses: &[Course]) -> anyhow::Result<()> {
    store::save_json(store, COURSES_KEY, courses)
}

pub fn add_course(courses: &mut Vec<Course>, draft: CourseDraft) -> anyhow::Result<Course> {
    let course = Course {
        id: format!("c-{}", Uuid::new_v4()),
        code: draft.code.unwrap_or_default().trim().to_string(),
        name: draft.name.unwrap_or_default().trim().to_string(),
        department: draft
            .department
            .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
        semester: draft.semester.unwrap_or(3),
    };
    validate(courses, &course)?;

    courses.push(course.clone());
    Ok(course)
}

/// Applies the fields set in `draft` to the course matching `needle`.
pub fn edit_course(courses: &mut [Course], needle: &str, draft: CourseDraft) -> anyhow::Result<Course> {
    let idx = position(courses, needle)?;

    let mut updated = courses[idx].clone();
    if let Some(code) = draft.code {
        updated.code = code.trim().to_string();
    }
    if let Some(name) = draft.name {
        updated.name = name.trim().to_string();
    }
    if let Some(department) = draft.department {
        updated.department = department;
    }
    if let Some(semester) = draft.semester {
        updated.semester = semester;
    }
    validate(courses, &updated)?;

    courses[idx] = updated.clone();
    Ok(updated)
}

pub fn delete_course(courses: &mut Vec<Course>, needle: &str) -> anyhow::Result<Course> {
    let idx = position(courses, needle)?;
    Ok(courses.remove(idx))
}

/// Case-insensitive substring match on name or code.
pub fn search_courses<'a>(courses: &'a [Course], query: &str) -> Vec<&'a Course> {
    let query = query.to_lowercase();
    courses
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&query) || c.code.to_lowercase().contains(&query))
        .collect()
}

fn position(courses: &[Course], needle: &str) -> anyhow::Result<usize> {
    catalog::find_course(courses, needle)
        .and_then(|found| courses.iter().position(|c| c.id == found.id))
        .with_context(|| format!("unknown course {needle}"))
}

fn validate(courses: &[Course], course: &Course) -> anyhow::Result<()> {
    if course.code.is_empty() || course.name.is_empty() {
        bail!("course code and name are required");
    }
    if courses
        .iter()
        .any(|c| c.id != course.id && c.code.eq_ignore_ascii_case(&course.code))
    {
        bail!("course code {} is already in use", course.code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn draft(code: &str, name: &str) -> CourseDraft {
        CourseDraft {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
            ..CourseDraft::default()
        }
    }

    #[test]
    fn unsaved_store_yields_catalog() {
        let store = MemoryStore::new();
        assert_eq!(load_courses(&store).unwrap(), catalog::courses());
    }

    #[test]
    fn add_requires_code_and_name() {
        let mut courses = catalog::courses();
        assert!(add_course(&mut courses, draft("", "Compilers")).is_err());
        assert!(add_course(&mut courses, draft("CS401", " ")).is_err());
        assert!(add_course(&mut courses, draft("cs101", "Dup")).is_err());

        let added = add_course(&mut courses, draft("CS401", "Compilers")).unwrap();
        assert_eq!(added.department, DEFAULT_DEPARTMENT);
        assert_eq!(added.semester, 3);
        assert_eq!(courses.last(), Some(&added));
    }

    #[test]
    fn edit_changes_only_given_fields() {
        let mut courses = catalog::courses();
        let edited = edit_course(
            &mut courses,
            "CS102",
            CourseDraft {
                name: Some("Advanced Algorithms".to_string()),
                semester: Some(6),
                ..CourseDraft::default()
            },
        )
        .unwrap();

        assert_eq!(edited.id, "c2");
        assert_eq!(edited.code, "CS102");
        assert_eq!(edited.semester, 6);
        assert_eq!(courses[1].name, "Advanced Algorithms");
    }

    #[test]
    fn edit_rejects_code_clash_and_blank_name() {
        let mut courses = catalog::courses();
        assert!(edit_course(&mut courses, "c2", draft("CS101", "Algorithms")).is_err());
        assert!(edit_course(&mut courses, "c2", draft("CS102", "")).is_err());
        assert!(edit_course(&mut courses, "c2", draft("cs102", "Algorithms II")).is_ok());
        assert!(edit_course(&mut courses, "c99", CourseDraft::default()).is_err());
    }

    #[test]
    fn delete_removes_course() {
        let mut courses = catalog::courses();
        let removed = delete_course(&mut courses, "cs201").unwrap();
        assert_eq!(removed.id, "c3");
        assert!(catalog::find_course(&courses, "c3").is_none());
        assert!(delete_course(&mut courses, "c3").is_err());
    }

    #[test]
    fn search_matches_name_or_code_ignoring_case() {
        let courses = catalog::courses();
        let codes: Vec<&str> = search_courses(&courses, "ALGO")
            .into_iter()
            .map(|c| c.code.as_str())
            .collect();
        assert_eq!(codes, vec!["CS102"]);

        assert_eq!(search_courses(&courses, "cs30").len(), 2);
        assert_eq!(search_courses(&courses, "").len(), courses.len());
        assert!(search_courses(&courses, "biology").is_empty());
    }

    #[test]
    fn saved_courses_replace_catalog() {
        let mut store = MemoryStore::new();
        let mut courses = catalog::courses();
        delete_course(&mut courses, "c6").unwrap();
        save_courses(&mut store, &courses).unwrap();

        assert_eq!(load_courses(&store).unwrap().len(), 5);
    }
}
