use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod assessment;
mod attainment;
mod catalog;
mod courses;
mod db;
mod models;
mod outputs;
mod report;
mod state;
mod store;

use crate::assessment::AssessmentMap;
use crate::attainment::{compute_attainment, weight_label, MAX_WEIGHT};
use crate::courses::CourseDraft;
use crate::models::{Course, CourseOutcome, Role, User};
use crate::outputs::{OutputBook, OutputDraft};
use crate::state::{reduce, Action, AppState};
use crate::store::{JsonFileStore, KeyValueStore, MemoryStore};

#[derive(Parser)]
#[command(name = "outcome-tracker")]
#[command(about = "Course outcome to program outcome attainment tracker", long_about = None)]
struct Cli {
    /// Postgres connection string; when unset the JSON file store is used
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
    /// JSON file holding mappings, courses and the saved session
    #[arg(long, env = "OUTCOME_STORE", default_value = "outcomes.json", global = true)]
    store: PathBuf,
    /// Sign in for this invocation (or persist it with `login`)
    #[arg(long, env = "OUTCOME_EMAIL")]
    email: Option<String>,
    #[arg(long, env = "OUTCOME_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long, value_enum, default_value_t = Role::Faculty)]
    role: Role,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    #[command(flatten)]
    Store(StoreCommand),
}

#[derive(Subcommand)]
enum StoreCommand {
    /// Save the --email/--password sign-in as the session
    Login,
    /// Clear the saved session
    Logout,
    /// Manage courses
    #[command(subcommand)]
    Course(CourseCommand),
    /// List the course outcomes of a course
    Outcomes {
        #[arg(long)]
        course: String,
    },
    /// Add a course outcome to a course
    AddCo {
        #[arg(long)]
        course: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "")]
        blooms_level: String,
    },
    /// Set the weightage (0-3) of a CO towards a PO
    Map {
        #[arg(long)]
        co: String,
        #[arg(long)]
        po: String,
        #[arg(long, allow_negative_numbers = true)]
        weight: i64,
    },
    /// Clear every mapping owned by a course's outcomes
    ResetCourse {
        #[arg(long)]
        course: String,
    },
    /// Print the CO x PO weightage matrix of a course
    Matrix {
        #[arg(long)]
        course: String,
    },
    /// Import mappings from a CSV file (co_id,po_code,weight)
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute PO attainment for a course
    Attainment {
        #[arg(long)]
        course: String,
    },
    /// Export PO attainment for a course as CSV
    Export {
        #[arg(long)]
        course: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown attainment report
    Report {
        #[arg(long)]
        course: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Dashboard: counts plus average historical attainment
    Overview {
        /// Average per course instead of per PO
        #[arg(long)]
        by_course: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Toggle an assessment tool for a course outcome
    Assess {
        #[arg(long)]
        co: String,
        #[arg(long)]
        tool: String,
    },
    /// Manage program outputs recorded against course outcomes
    #[command(subcommand)]
    Outputs(OutputCommand),
}

#[derive(Subcommand)]
enum CourseCommand {
    /// List courses and their outcome counts
    List,
    /// Find courses whose name or code contains the query
    Search { query: String },
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        semester: Option<u8>,
    },
    Edit {
        #[arg(long)]
        course: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        semester: Option<u8>,
    },
    Delete {
        #[arg(long)]
        course: String,
    },
}

#[derive(Subcommand)]
enum OutputCommand {
    List {
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        co: Option<String>,
    },
    Add {
        #[arg(long)]
        course: String,
        #[arg(long)]
        co: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        co: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

enum Backend {
    File(JsonFileStore),
    Postgres { pool: PgPool, snapshot: MemoryStore },
}

impl Backend {
    async fn open(database_url: Option<&str>, path: &Path) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => {
                let pool = connect(url).await?;
                let snapshot = db::fetch_store(&pool).await?;
                Ok(Backend::Postgres { pool, snapshot })
            }
            None => {
                let store = JsonFileStore::open(path)?;
                debug!(path = %store.path().display(), "using file store");
                Ok(Backend::File(store))
            }
        }
    }

    fn store(&self) -> &dyn KeyValueStore {
        match self {
            Backend::File(store) => store,
            Backend::Postgres { snapshot, .. } => snapshot,
        }
    }

    fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        match self {
            Backend::File(store) => store,
            Backend::Postgres { snapshot, .. } => snapshot,
        }
    }

    async fn commit(&self) -> anyhow::Result<()> {
        if let Backend::Postgres { pool, snapshot } = self {
            let written = db::flush_store(pool, snapshot).await?;
            debug!(written, "flushed entries to Postgres");
        }
        Ok(())
    }
}

async fn connect(url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let url = cli
                .database_url
                .as_deref()
                .context("init-db requires DATABASE_URL")?;
            let pool = connect(url).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Store(command) => {
            let mut backend = Backend::open(cli.database_url.as_deref(), &cli.store).await?;
            let mut app = load_state(backend.store())?;
            if let Some(user) = sign_in(cli.email.as_deref(), cli.password.as_deref(), cli.role)? {
                app = reduce(app, Action::Login(user));
            }
            run(command, &mut backend, app).await?;
        }
    }

    Ok(())
}

async fn run(command: StoreCommand, backend: &mut Backend, mut app: AppState) -> anyhow::Result<()> {
    match command {
        StoreCommand::Login => {
            let user = require_user(&app)?.clone();
            store::save_json(backend.store_mut(), store::SESSION_KEY, &Some(&user))?;
            backend.commit().await?;
            println!("Signed in as {} ({:?}).", user.name, user.role);
        }
        StoreCommand::Logout => {
            app = reduce(app, Action::Logout);
            store::save_json(backend.store_mut(), store::SESSION_KEY, &app.user)?;
            backend.commit().await?;
            println!("Signed out.");
        }
        StoreCommand::Course(command) => run_course(command, backend, &mut app).await?,
        StoreCommand::Outcomes { course } => {
            let course = resolve_course(&app, &course)?;
            let outcomes = app.course_outcomes_for(&course.id);
            let assessments: AssessmentMap =
                store::load_json(backend.store(), store::ASSESSMENTS_KEY)?;

            if outcomes.is_empty() {
                println!("No COs found for {}.", course.code);
                return Ok(());
            }
            for co in &outcomes {
                println!(
                    "- {} {} [{}] {} (assessed by: {})",
                    co.id,
                    co.code,
                    co.blooms_level,
                    co.description,
                    assessments.summary(&co.id)
                );
            }
        }
        StoreCommand::AddCo {
            course,
            code,
            description,
            blooms_level,
        } => {
            require_user(&app)?;
            let course = resolve_course(&app, &course)?;
            let co = catalog::new_course_outcome(
                &app.course_outcomes,
                &course.id,
                &code,
                &description,
                &blooms_level,
            )?;

            let mut added: Vec<CourseOutcome> =
                store::load_json(backend.store(), store::COURSE_OUTCOMES_KEY)?;
            added.push(co.clone());
            store::save_json(backend.store_mut(), store::COURSE_OUTCOMES_KEY, &added)?;
            backend.commit().await?;

            info!(co = %co.id, course = %course.id, "course outcome added");
            println!("Added {} ({}) to {}.", co.code, co.id, course.code);
            app = reduce(app, Action::AddCourseOutcome(co));
            debug!(outcomes = app.course_outcomes.len(), "state updated");
        }
        StoreCommand::Map { co, po, weight } => {
            require_user(&app)?;
            let Some(outcome) = app.course_outcomes.iter().find(|c| c.id == co) else {
                bail!("unknown course outcome {co}");
            };
            if !app.program_outcomes.iter().any(|p| p.code == po) {
                bail!("unknown program outcome {po}");
            }

            let mut mappings = store::load_mappings(backend.store())?;
            mappings.set(&outcome.id, &po, weight);
            store::save_mappings(backend.store_mut(), &mappings)?;
            backend.commit().await?;

            let stored = mappings.get(&outcome.id, &po);
            println!("{} -> {}: {}", outcome.code, po, weight_label(stored));
        }
        StoreCommand::ResetCourse { course } => {
            require_user(&app)?;
            let course = resolve_course(&app, &course)?;
            let outcomes = app.course_outcomes_for(&course.id);
            let co_ids: Vec<&str> = outcomes.iter().map(|co| co.id.as_str()).collect();

            let mut mappings = store::load_mappings(backend.store())?;
            let removed = mappings.reset_course(&co_ids);
            store::save_mappings(backend.store_mut(), &mappings)?;
            backend.commit().await?;

            info!(course = %course.id, removed, "course mappings reset");
            println!("Reset mappings for {}.", course.code);
        }
        StoreCommand::Matrix { course } => {
            let course = resolve_course(&app, &course)?;
            let outcomes = app.course_outcomes_for(&course.id);
            if outcomes.is_empty() {
                println!("No COs found for {}.", course.code);
                return Ok(());
            }

            let mappings = store::load_mappings(backend.store())?;
            let pos = &app.program_outcomes;
            print!("{:<6}", "CO");
            for po in pos {
                print!("{:>7}", po.code);
            }
            println!("{:>10}", "Strength");
            for co in &outcomes {
                print!("{:<6}", co.code);
                for po in pos {
                    print!("{:>7}", weight_label(mappings.get(&co.id, &po.code)));
                }
                println!("{:>10}", mappings.co_strength(&co.id, pos));
            }
            print!("{:<6}", "Total");
            for po in pos {
                print!("{:>7}", mappings.po_total(&outcomes, &po.code));
            }
            println!();
        }
        StoreCommand::Import { csv } => {
            require_user(&app)?;
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let mut mappings = store::load_mappings(backend.store())?;
            let applied = store::import_csv(file, &mut mappings)?;
            store::save_mappings(backend.store_mut(), &mappings)?;
            backend.commit().await?;
            println!("Imported {applied} mappings from {}.", csv.display());
        }
        StoreCommand::Attainment { course } => {
            let course = resolve_course(&app, &course)?;
            let outcomes = app.course_outcomes_for(&course.id);
            let mappings = store::load_mappings(backend.store())?;
            let results = compute_attainment(&outcomes, &mappings, &app.program_outcomes, MAX_WEIGHT);

            if outcomes.is_empty() {
                println!("No COs found for {}; every PO reports 0%.", course.code);
            } else if mappings.is_empty() {
                println!("No CO -> PO mappings saved yet.");
            }
            println!("PO attainment for {} ({}):", course.code, course.name);
            for result in &results {
                println!("- {} {}%", result.po_code, result.percentage);
            }
        }
        StoreCommand::Export { course, out } => {
            let course = resolve_course(&app, &course)?;
            let outcomes = app.course_outcomes_for(&course.id);
            let mappings = store::load_mappings(backend.store())?;
            let results = compute_attainment(&outcomes, &mappings, &app.program_outcomes, MAX_WEIGHT);

            let out = out.unwrap_or_else(|| PathBuf::from(report::export_file_name(&course)));
            std::fs::write(&out, report::attainment_csv(&results)?)?;
            println!("Attainment written to {}.", out.display());
        }
        StoreCommand::Report { course, out } => {
            let course = resolve_course(&app, &course)?;
            let outcomes = app.course_outcomes_for(&course.id);
            let mappings = store::load_mappings(backend.store())?;
            let results = compute_attainment(&outcomes, &mappings, &app.program_outcomes, MAX_WEIGHT);

            let body = report::build_report(
                &course,
                &outcomes,
                &app.program_outcomes,
                &mappings,
                &results,
                chrono::Local::now().date_naive(),
            );
            std::fs::write(&out, body)?;
            println!("Report written to {}.", out.display());
        }
        StoreCommand::Overview { by_course, out } => {
            let (csv, lines) = if by_course {
                let rows = report::course_overview(&app.courses, &app.reports);
                let lines: Vec<String> = rows
                    .iter()
                    .map(|r| format!("- {} {:.2} ({:.1}%)", r.course_code, r.attainment, r.percentage))
                    .collect();
                (report::course_overview_csv(&rows)?, lines)
            } else {
                let rows =
                    report::overview(&app.reports, &app.program_outcomes, report::OVERVIEW_LIMIT);
                let lines: Vec<String> = rows
                    .iter()
                    .map(|r| format!("- {} {:.2} ({:.1}%)", r.po_code, r.attainment, r.percentage))
                    .collect();
                (report::overview_csv(&rows)?, lines)
            };

            if lines.is_empty() {
                println!("No reports recorded.");
                return Ok(());
            }

            match out {
                Some(path) => {
                    std::fs::write(&path, csv)?;
                    println!("Overview written to {}.", path.display());
                }
                None => {
                    let counts = app.counts();
                    println!(
                        "{} courses, {} course outcomes, {} program outcomes, {} reports",
                        counts.courses, counts.course_outcomes, counts.program_outcomes, counts.reports
                    );
                    for line in &lines {
                        println!("{line}");
                    }
                }
            }
        }
        StoreCommand::Assess { co, tool } => {
            require_user(&app)?;
            let Some(outcome) = app.course_outcomes.iter().find(|c| c.id == co) else {
                bail!("unknown course outcome {co}");
            };
            let Some(tool) = catalog::ASSESSMENT_TOOLS
                .iter()
                .find(|t| t.eq_ignore_ascii_case(&tool))
            else {
                bail!(
                    "unknown assessment tool {tool}; expected one of {}",
                    catalog::ASSESSMENT_TOOLS.join(", ")
                );
            };

            let mut assessments: AssessmentMap =
                store::load_json(backend.store(), store::ASSESSMENTS_KEY)?;
            assessments.toggle(&outcome.id, tool);
            store::save_json(backend.store_mut(), store::ASSESSMENTS_KEY, &assessments)?;
            backend.commit().await?;

            println!("{} assessed by: {}", outcome.code, assessments.summary(&outcome.id));
        }
        StoreCommand::Outputs(command) => run_outputs(command, backend, &app).await?,
    }

    Ok(())
}

async fn run_course(command: CourseCommand, backend: &mut Backend, app: &mut AppState) -> anyhow::Result<()> {
    let changed = match command {
        CourseCommand::List => {
            for course in &app.courses {
                print_course(app, course);
            }
            None
        }
        CourseCommand::Search { query } => {
            let found = courses::search_courses(&app.courses, &query);
            if found.is_empty() {
                println!("No courses match {query:?}.");
            }
            for course in found {
                print_course(app, course);
            }
            None
        }
        CourseCommand::Add {
            code,
            name,
            department,
            semester,
        } => {
            require_user(app)?;
            let draft = CourseDraft {
                code: Some(code),
                name: Some(name),
                department,
                semester,
            };
            let course = courses::add_course(&mut app.courses, draft)?;
            Some(format!("Added course {} ({}).", course.code, course.id))
        }
        CourseCommand::Edit {
            course,
            code,
            name,
            department,
            semester,
        } => {
            require_user(app)?;
            let draft = CourseDraft {
                code,
                name,
                department,
                semester,
            };
            let course = courses::edit_course(&mut app.courses, &course, draft)?;
            Some(format!("Updated course {} ({}).", course.code, course.id))
        }
        CourseCommand::Delete { course } => {
            require_user(app)?;
            let course = courses::delete_course(&mut app.courses, &course)?;
            Some(format!("Deleted course {}.", course.code))
        }
    };

    if let Some(message) = changed {
        courses::save_courses(backend.store_mut(), &app.courses)?;
        backend.commit().await?;
        println!("{message}");
    }
    Ok(())
}

async fn run_outputs(command: OutputCommand, backend: &mut Backend, app: &AppState) -> anyhow::Result<()> {
    let mut book: OutputBook = store::load_json(backend.store(), store::OUTPUTS_KEY)?;

    let message = match command {
        OutputCommand::List { course, co } => {
            let course_id = match course.as_deref() {
                Some(needle) => Some(resolve_course(app, needle)?.id),
                None => None,
            };
            let listed = book.filter(course_id.as_deref(), co.as_deref());
            if listed.is_empty() {
                println!("No program outputs recorded.");
            }
            for output in listed {
                println!("- {} [{} / {}] {}: {}", output.id, output.course_id, output.co_id, output.title, output.content);
            }
            return Ok(());
        }
        OutputCommand::Add {
            course,
            co,
            title,
            content,
        } => {
            require_user(app)?;
            let draft = output_draft(app, &course, co, title, content)?;
            let output = book.add(draft)?;
            format!("Added program output {}.", output.id)
        }
        OutputCommand::Edit {
            id,
            course,
            co,
            title,
            content,
        } => {
            require_user(app)?;
            let draft = output_draft(app, &course, co, title, content)?;
            let output = book.edit(&id, draft)?;
            format!("Updated program output {}.", output.id)
        }
        OutputCommand::Delete { id } => {
            require_user(app)?;
            let output = book.delete(&id)?;
            format!("Deleted program output {}.", output.id)
        }
    };

    store::save_json(backend.store_mut(), store::OUTPUTS_KEY, &book)?;
    backend.commit().await?;
    println!("{message}");
    Ok(())
}

fn output_draft(
    app: &AppState,
    course: &str,
    co: String,
    title: String,
    content: String,
) -> anyhow::Result<OutputDraft> {
    let course = resolve_course(app, course)?;
    if !app
        .course_outcomes
        .iter()
        .any(|c| c.id == co && c.course_id == course.id)
    {
        bail!("{co} is not an outcome of {}", course.code);
    }
    Ok(OutputDraft {
        course_id: course.id,
        co_id: co,
        title,
        content,
    })
}

fn print_course(app: &AppState, course: &Course) {
    println!(
        "- {} {} ({}, {}, semester {}) with {} outcomes",
        course.id,
        course.code,
        course.name,
        course.department,
        course.semester,
        app.course_outcomes_for(&course.id).len()
    );
}

/// Stored courses and added outcomes on top of the catalog, plus the saved session.
fn load_state(store: &dyn KeyValueStore) -> anyhow::Result<AppState> {
    let mut app = AppState::seeded();
    app.courses = courses::load_courses(store)?;

    let added: Vec<CourseOutcome> = store::load_json(store, store::COURSE_OUTCOMES_KEY)?;
    let app = added
        .into_iter()
        .fold(app, |app, co| reduce(app, Action::AddCourseOutcome(co)));

    let session: Option<User> = store::load_json(store, store::SESSION_KEY)?;
    Ok(match session {
        Some(user) => reduce(app, Action::Login(user)),
        None => app,
    })
}

fn sign_in(email: Option<&str>, password: Option<&str>, role: Role) -> anyhow::Result<Option<User>> {
    match (email, password) {
        (None, None) => Ok(None),
        (Some(email), Some(password)) => state::login(email, password, role)
            .map(Some)
            .context("email and password must not be empty"),
        _ => bail!("--email and --password must be given together"),
    }
}

fn require_user(app: &AppState) -> anyhow::Result<&User> {
    if !app.is_authenticated() {
        bail!("sign in first: pass --email and --password, or run `login` with them");
    }
    app.user.as_ref().context("no signed-in user")
}

fn resolve_course(app: &AppState, needle: &str) -> anyhow::Result<Course> {
    catalog::find_course(&app.courses, needle)
        .cloned()
        .with_context(|| format!("unknown course {needle}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_outcomes_extend_the_catalog() {
        let mut store = MemoryStore::new();
        let app = load_state(&store).unwrap();
        let seeded = app.course_outcomes.len();

        let co = catalog::new_course_outcome(&app.course_outcomes, "c3", "CO2", "Write joins", "")
            .unwrap();
        store::save_json(&mut store, store::COURSE_OUTCOMES_KEY, &vec![co.clone()]).unwrap();

        let app = load_state(&store).unwrap();
        assert_eq!(app.course_outcomes.len(), seeded + 1);
        assert_eq!(app.course_outcomes_for("c3").last(), Some(&co));
    }

    #[test]
    fn stored_courses_replace_the_catalog() {
        let mut store = MemoryStore::new();
        let mut list = catalog::courses();
        courses::add_course(
            &mut list,
            CourseDraft {
                code: Some("CS401".to_string()),
                name: Some("Compilers".to_string()),
                ..CourseDraft::default()
            },
        )
        .unwrap();
        courses::save_courses(&mut store, &list).unwrap();

        let app = load_state(&store).unwrap();
        assert_eq!(resolve_course(&app, "cs401").unwrap().name, "Compilers");
    }

    #[test]
    fn init_db_parses_apart_from_store_commands() {
        let cli = Cli::try_parse_from(["outcome-tracker", "init-db"]).unwrap();
        assert!(matches!(cli.command, Commands::InitDb));

        let cli = Cli::try_parse_from([
            "outcome-tracker",
            "--email",
            "lee@college.edu",
            "--password",
            "pw",
            "course",
            "search",
            "algo",
        ])
        .unwrap();
        assert_eq!(cli.role, Role::Faculty);
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::Course(CourseCommand::Search { ref query })) if query == "algo"
        ));

        let cli = Cli::try_parse_from(["outcome-tracker", "overview", "--by-course"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::Overview { by_course: true, out: None })
        ));
    }

    #[test]
    fn resolves_courses_by_code() {
        let app = AppState::seeded();
        assert_eq!(resolve_course(&app, "CS102").unwrap().id, "c2");
        assert!(resolve_course(&app, "nope").is_err());
    }

    #[test]
    fn saved_session_signs_the_user_in() {
        let mut store = MemoryStore::new();
        assert!(!load_state(&store).unwrap().is_authenticated());

        let user = state::login("dana@college.edu", "pw", Role::Admin).unwrap();
        store::save_json(&mut store, store::SESSION_KEY, &Some(&user)).unwrap();
        let app = load_state(&store).unwrap();
        assert_eq!(require_user(&app).unwrap(), &user);

        let app = reduce(app, Action::Logout);
        store::save_json(&mut store, store::SESSION_KEY, &app.user).unwrap();
        assert!(!load_state(&store).unwrap().is_authenticated());
    }

    #[test]
    fn mutations_require_a_user() {
        let app = AppState::seeded();
        assert!(require_user(&app).is_err());

        let user = sign_in(Some("lee@college.edu"), Some("pw"), Role::Faculty)
            .unwrap()
            .unwrap();
        assert_eq!(user.name, "lee");
        let app = reduce(app, Action::Login(user));
        assert!(require_user(&app).is_ok());
    }

    #[test]
    fn sign_in_needs_both_credentials() {
        assert!(sign_in(None, None, Role::Faculty).unwrap().is_none());
        assert!(sign_in(Some("a@b.c"), None, Role::Faculty).is_err());
        assert!(sign_in(Some(""), Some("pw"), Role::Faculty).is_err());
    }

    #[test]
    fn output_drafts_must_name_an_outcome_of_the_course() {
        let app = AppState::seeded();
        let draft = output_draft(&app, "CS101", "co2".to_string(), "Lab".to_string(), "Lists".to_string())
            .unwrap();
        assert_eq!(draft.course_id, "c1");
        assert!(output_draft(&app, "CS101", "co4".to_string(), "Lab".to_string(), "x".to_string()).is_err());
    }

    #[test]
    fn stored_mappings_drive_attainment() {
        let mut store = MemoryStore::new();
        store
            .set(store::MAPPINGS_KEY, r#"{"co4": {"PO1": 2}, "co5": {"PO1": "3"}}"#.to_string())
            .unwrap();

        let app = load_state(&store).unwrap();
        let mappings = store::load_mappings(&store).unwrap();
        let results = compute_attainment(
            &app.course_outcomes_for("c2"),
            &mappings,
            &app.program_outcomes,
            MAX_WEIGHT,
        );
        assert_eq!(results[0].percentage, 83);
        assert!(results[1..].iter().all(|r| r.percentage == 0));
    }
}
