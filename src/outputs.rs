use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ProgramOutput;

#[derive(Debug, Clone, Default)]
pub struct OutputDraft {
    pub course_id: String,
    pub co_id: String,
    pub title: String,
    pub content: String,
}

impl OutputDraft {
    fn validate(&self) -> anyhow::Result<()> {
        let fields = [&self.course_id, &self.co_id, &self.title, &self.content];
        if fields.iter().any(|f| f.trim().is_empty()) {
            bail!("course, course outcome, title and content are all required");
        }
        Ok(())
    }
}

/// Program outputs recorded against a course outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputBook {
    outputs: Vec<ProgramOutput>,
}

impl OutputBook {
    pub fn add(&mut self, draft: OutputDraft) -> anyhow::Result<ProgramOutput> {
        draft.validate()?;
        let output = ProgramOutput {
            id: Uuid::new_v4().simple().to_string()[..7].to_string(),
            course_id: draft.course_id,
            co_id: draft.co_id,
            title: draft.title,
            content: draft.content,
        };
        self.outputs.push(output.clone());
        Ok(output)
    }

    pub fn edit(&mut self, id: &str, draft: OutputDraft) -> anyhow::Result<ProgramOutput> {
        draft.validate()?;
        let output = self
            .outputs
            .iter_mut()
            .find(|o| o.id == id)
            .with_context(|| format!("unknown program output {id}"))?;

        output.course_id = draft.course_id;
        output.co_id = draft.co_id;
        output.title = draft.title;
        output.content = draft.content;
        Ok(output.clone())
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<ProgramOutput> {
        let idx = self
            .outputs
            .iter()
            .position(|o| o.id == id)
            .with_context(|| format!("unknown program output {id}"))?;
        Ok(self.outputs.remove(idx))
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&ProgramOutput> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// `None` means no filter on that field.
    pub fn filter(&self, course_id: Option<&str>, co_id: Option<&str>) -> Vec<&ProgramOutput> {
        self.outputs
            .iter()
            .filter(|o| course_id.map_or(true, |id| o.course_id == id))
            .filter(|o| co_id.map_or(true, |id| o.co_id == id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(course_id: &str, co_id: &str, title: &str) -> OutputDraft {
        OutputDraft {
            course_id: course_id.to_string(),
            co_id: co_id.to_string(),
            title: title.to_string(),
            content: format!("{title} write-up"),
        }
    }

    #[test]
    fn add_requires_every_field() {
        let mut book = OutputBook::default();
        assert!(book.add(draft("", "co1", "Lab 1")).is_err());
        assert!(book.add(draft("c1", "", "Lab 1")).is_err());
        assert!(book.add(draft("c1", "co1", " ")).is_err());
        assert!(book
            .add(OutputDraft {
                content: String::new(),
                ..draft("c1", "co1", "Lab 1")
            })
            .is_err());

        let added = book.add(draft("c1", "co1", "Lab 1")).unwrap();
        assert_eq!(added.id.len(), 7);
        assert_eq!(book.get(&added.id), Some(&added));
    }

    #[test]
    fn edit_replaces_fields_in_place() {
        let mut book = OutputBook::default();
        let added = book.add(draft("c1", "co1", "Lab 1")).unwrap();

        let edited = book.edit(&added.id, draft("c1", "co2", "Lab 2")).unwrap();
        assert_eq!(edited.id, added.id);
        assert_eq!(edited.co_id, "co2");
        assert_eq!(book.filter(None, None).len(), 1);

        assert!(book.edit("missing", draft("c1", "co1", "x")).is_err());
        assert!(book.edit(&added.id, draft("c1", "co1", "")).is_err());
    }

    #[test]
    fn delete_removes_output() {
        let mut book = OutputBook::default();
        let added = book.add(draft("c1", "co1", "Lab 1")).unwrap();
        book.delete(&added.id).unwrap();
        assert!(book.get(&added.id).is_none());
        assert!(book.delete(&added.id).is_err());
    }

    #[test]
    fn filters_by_course_and_outcome() {
        let mut book = OutputBook::default();
        book.add(draft("c1", "co1", "Arrays lab")).unwrap();
        book.add(draft("c1", "co2", "Lists lab")).unwrap();
        book.add(draft("c2", "co4", "Sorting essay")).unwrap();

        assert_eq!(book.filter(None, None).len(), 3);
        assert_eq!(book.filter(Some("c1"), None).len(), 2);
        let titles: Vec<&str> = book
            .filter(Some("c1"), Some("co2"))
            .into_iter()
            .map(|o| o.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Lists lab"]);
        assert!(book.filter(Some("c2"), Some("co1")).is_empty());
    }
}
