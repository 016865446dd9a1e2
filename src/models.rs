use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Faculty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub semester: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOutcome {
    pub id: String,
    pub course_id: String,
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub blooms_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOutcome {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttainmentResult {
    pub po_code: String,
    pub percentage: u8,
}

/// Historical per-course attainment, scored on the 0-3 weightage scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub course_id: String,
    pub semester: String,
    pub year: i32,
    pub po_attainment: BTreeMap<String, f64>,
    pub generated_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOutput {
    pub id: String,
    pub course_id: String,
    pub co_id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseRow {
    pub course_code: String,
    pub attainment: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCounts {
    pub courses: usize,
    pub course_outcomes: usize,
    pub program_outcomes: usize,
    pub reports: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewRow {
    pub po_code: String,
    pub attainment: f64,
    pub percentage: f64,
}
