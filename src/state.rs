use crate::catalog;
use crate::models::{Course, CourseOutcome, DashboardCounts, ProgramOutcome, Report, Role, User};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub user: Option<User>,
    pub courses: Vec<Course>,
    pub course_outcomes: Vec<CourseOutcome>,
    pub program_outcomes: Vec<ProgramOutcome>,
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone)]
pub enum Action {
    Login(User),
    Logout,
    AddCourseOutcome(CourseOutcome),
}

impl AppState {
    pub fn seeded() -> Self {
        Self {
            user: None,
            courses: catalog::courses(),
            course_outcomes: catalog::course_outcomes(),
            program_outcomes: catalog::program_outcomes(),
            reports: catalog::reports(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Dashboard tallies, ignoring incomplete records.
    pub fn counts(&self) -> DashboardCounts {
        DashboardCounts {
            courses: self
                .courses
                .iter()
                .filter(|c| !c.name.is_empty() && !c.code.is_empty())
                .count(),
            course_outcomes: self
                .course_outcomes
                .iter()
                .filter(|co| !co.description.is_empty() && !co.course_id.is_empty())
                .count(),
            program_outcomes: self
                .program_outcomes
                .iter()
                .filter(|po| !po.code.is_empty())
                .count(),
            reports: self
                .reports
                .iter()
                .filter(|r| !r.course_id.is_empty() && !r.po_attainment.is_empty())
                .count(),
        }
    }

    pub fn course_outcomes_for(&self, course_id: &str) -> Vec<CourseOutcome> {
        self.course_outcomes
            .iter()
            .filter(|co| co.course_id == course_id)
            .cloned()
            .collect()
    }
}

pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        Action::Login(user) => AppState {
            user: Some(user),
            ..state
        },
        Action::Logout => AppState { user: None, ..state },
        Action::AddCourseOutcome(co) => {
            let mut course_outcomes = state.course_outcomes;
            course_outcomes.push(co);
            AppState {
                course_outcomes,
                ..state
            }
        }
    }
}

/// Stub sign-in: any non-empty email/password pair is accepted.
pub fn login(email: &str, password: &str, role: Role) -> Option<User> {
    if email.is_empty() || password.is_empty() {
        return None;
    }

    let name = email.split('@').next().unwrap_or(email).to_string();
    Some(User {
        id: "1".to_string(),
        email: email.to_string(),
        name,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, course_id: &str) -> CourseOutcome {
        CourseOutcome {
            id: id.to_string(),
            course_id: course_id.to_string(),
            code: "CO9".to_string(),
            description: "Tune indexes".to_string(),
            blooms_level: "Applying".to_string(),
        }
    }

    #[test]
    fn login_replaces_user_and_logout_clears_it() {
        let state = AppState::seeded();
        assert!(!state.is_authenticated());

        let user = login("dana@college.edu", "secret", Role::Faculty).unwrap();
        assert_eq!(user.name, "dana");

        let state = reduce(state, Action::Login(user.clone()));
        assert_eq!(state.user.as_ref(), Some(&user));

        let admin = login("root@college.edu", "pw", Role::Admin).unwrap();
        let state = reduce(state, Action::Login(admin.clone()));
        assert_eq!(state.user, Some(admin));

        let state = reduce(state, Action::Logout);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn login_requires_credentials() {
        assert!(login("", "secret", Role::Admin).is_none());
        assert!(login("a@b.c", "", Role::Admin).is_none());
    }

    #[test]
    fn add_course_outcome_appends() {
        let state = AppState::seeded();
        let before = state.course_outcomes.len();

        let state = reduce(state, Action::AddCourseOutcome(outcome("co-new", "c3")));
        assert_eq!(state.course_outcomes.len(), before + 1);
        assert_eq!(state.course_outcomes.last().map(|co| co.id.as_str()), Some("co-new"));
        assert_eq!(state.courses, catalog::courses());
    }

    #[test]
    fn counts_skip_incomplete_records() {
        let mut state = AppState::seeded();
        assert_eq!(
            state.counts(),
            DashboardCounts {
                courses: 6,
                course_outcomes: 6,
                program_outcomes: 6,
                reports: 2,
            }
        );

        state.courses[0].name.clear();
        state.reports[1].po_attainment.clear();
        let mut blank = outcome("co-blank", "c1");
        blank.description.clear();
        let state = reduce(state, Action::AddCourseOutcome(blank));

        let counts = state.counts();
        assert_eq!(counts.courses, 5);
        assert_eq!(counts.course_outcomes, 6);
        assert_eq!(counts.reports, 1);
    }

    #[test]
    fn filters_outcomes_by_course() {
        let state = AppState::seeded();
        let ids: Vec<String> = state
            .course_outcomes_for("c1")
            .into_iter()
            .map(|co| co.id)
            .collect();
        assert_eq!(ids, vec!["co1", "co2", "co3"]);
        assert!(state.course_outcomes_for("c9").is_empty());
    }
}
