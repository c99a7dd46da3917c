//! Resume builder form data.
//!
//! Every field defaults to empty so partially filled forms deserialize cleanly.
//! Field names follow the builder client's camelCase JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub mobile: String,
    pub linkedin: String,
    pub twitter: String,
    pub github: String,
    pub address: String,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        [
            &self.email,
            &self.mobile,
            &self.linkedin,
            &self.twitter,
            &self.github,
            &self.address,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}

/// A single resume line item: a job, a degree or a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Entry {
    pub title: String,
    pub organization: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResumeForm {
    pub contact_info: ContactInfo,
    pub summary: String,
    pub skills: String,
    pub experience: Vec<Entry>,
    pub education: Vec<Entry>,
    pub projects: Vec<Entry>,
}

/// A non-blocking problem found in the form, addressed by its JSON field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: &'static str,
}

impl FieldIssue {
    fn new(field: impl Into<String>, message: &'static str) -> Self {
        Self {
            field: field.into(),
            message,
        }
    }
}

impl ResumeForm {
    /// Advisory checks surfaced next to the form. Nothing here blocks preview or save.
    pub fn issues(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        let email = self.contact_info.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            issues.push(FieldIssue::new("contactInfo.email", "Invalid email address"));
        }

        for (list, entries) in [
            ("experience", &self.experience),
            ("education", &self.education),
            ("projects", &self.projects),
        ] {
            for (idx, entry) in entries.iter().enumerate() {
                entry_issues(&format!("{list}[{idx}]"), entry, &mut issues);
            }
        }

        issues
    }
}

fn entry_issues(path: &str, entry: &Entry, issues: &mut Vec<FieldIssue>) {
    let required = [
        ("title", &entry.title, "Title is required"),
        ("organization", &entry.organization, "Organization is required"),
        ("startDate", &entry.start_date, "Start date is required"),
        ("description", &entry.description, "Description is required"),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            issues.push(FieldIssue::new(format!("{path}.{field}"), message));
        }
    }
    if !entry.current && entry.end_date.trim().is_empty() {
        issues.push(FieldIssue::new(
            format!("{path}.endDate"),
            "End date is required unless this is your current position",
        ));
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !value.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
