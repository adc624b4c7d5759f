use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A project roster entry. `skills` are free-form skill names tagged on the
/// member for this project, on top of their own profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub user_id: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub members: Vec<ProjectMember>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn has_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == member_id)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
}

impl CreateProjectRequest {
    pub fn into_project(self, created_by: String) -> Result<Project, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Project name is required".into()));
        }
        if let (Some(start), Some(deadline)) = (self.start_date, self.deadline) {
            if deadline < start {
                return Err(AppError::Validation(
                    "Project deadline cannot be before its start date".into(),
                ));
            }
        }
        Ok(Project {
            id: super::new_id(),
            name,
            description: self.description,
            category: self.category,
            start_date: self.start_date,
            deadline: self.deadline,
            members: Vec::new(),
            created_by,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProjectMemberRequest {
    pub user_id: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn deadline_before_start_is_rejected() {
        let now = Utc::now();
        let req = CreateProjectRequest {
            name: "Apollo".into(),
            description: None,
            category: None,
            start_date: Some(now),
            deadline: Some(now - Duration::days(1)),
        };
        assert!(matches!(
            req.into_project("lead".into()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn new_project_starts_without_members() {
        let project = CreateProjectRequest {
            name: "  Apollo ".into(),
            description: Some("moon".into()),
            category: None,
            start_date: None,
            deadline: None,
        }
        .into_project("lead".into())
        .unwrap();
        assert_eq!(project.name, "Apollo");
        assert!(project.members.is_empty());
        assert!(!project.has_member("anyone"));
    }
}
