use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A named competence, e.g. "React" in category "development".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    pub category: String,
}

impl CreateSkillRequest {
    pub fn into_skill(self) -> Result<Skill, AppError> {
        let name = self.name.trim().to_string();
        let category = self.category.trim().to_lowercase();
        if name.is_empty() {
            return Err(AppError::Validation("Skill name is required".into()));
        }
        if category.is_empty() {
            return Err(AppError::Validation("Skill category is required".into()));
        }
        Ok(Skill {
            id: super::new_id(),
            name,
            category,
            created_at: Utc::now(),
        })
    }
}
