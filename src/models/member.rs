use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MIN_PROFICIENCY: u8 = 1;
pub const MAX_PROFICIENCY: u8 = 5;

/// Hours (workload and estimates) are kept to hundredths of an hour. With
/// every delta a whole number of hundredths, rounding each sum keeps the
/// stored workload equal to the exact total.
pub fn round_hours(hours: f64) -> f64 {
    // `+ 0.0` turns a rounded `-0.0` into `0.0`.
    (hours * 100.0).round() / 100.0 + 0.0
}

/// One entry of a member's skill profile.
///
/// `name` and `category` are copied from the referenced [`Skill`](super::skill::Skill)
/// when the entry is added, so scoring never needs a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSkill {
    pub skill_id: String,
    pub name: String,
    pub category: String,
    pub proficiency_level: u8,
    #[serde(default)]
    pub years_of_experience: f64,
}

/// The subset of a user the assignment logic cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Estimated hours of open (not completed) tasks assigned to this member.
    #[serde(default)]
    pub workload: f64,
    #[serde(default)]
    pub skills: Vec<MemberSkill>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Mean proficiency across the whole profile, 0.0 for an empty profile.
    pub fn mean_proficiency(&self) -> f64 {
        if self.skills.is_empty() {
            return 0.0;
        }
        let total: u32 = self.skills.iter().map(|s| s.proficiency_level as u32).sum();
        total as f64 / self.skills.len() as f64
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub email: String,
}

impl CreateMemberRequest {
    pub fn into_member(self) -> Result<Member, AppError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();
        if name.is_empty() {
            return Err(AppError::Validation("Member name is required".into()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation(format!("Invalid email: {:?}", self.email)));
        }
        Ok(Member {
            id: super::new_id(),
            name,
            email,
            workload: 0.0,
            skills: Vec::new(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberSkillRequest {
    pub skill_id: String,
    pub proficiency_level: u8,
    #[serde(default)]
    pub years_of_experience: f64,
}

impl AddMemberSkillRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(MIN_PROFICIENCY..=MAX_PROFICIENCY).contains(&self.proficiency_level) {
            return Err(AppError::Validation(format!(
                "proficiencyLevel must be between {} and {}",
                MIN_PROFICIENCY, MAX_PROFICIENCY
            )));
        }
        if !self.years_of_experience.is_finite() || self.years_of_experience < 0.0 {
            return Err(AppError::Validation(
                "yearsOfExperience must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_hours_snaps_to_hundredths() {
        assert_eq!(round_hours(0.1 + 0.2), 0.3);
        assert_eq!(round_hours(2.7755575615628914e-17), 0.0);
        assert!(round_hours(-2.7755575615628914e-17).is_sign_positive());
        assert_eq!(round_hours(7.456), 7.46);
    }

    fn skill(level: u8) -> MemberSkill {
        MemberSkill {
            skill_id: crate::models::new_id(),
            name: "JS".into(),
            category: "development".into(),
            proficiency_level: level,
            years_of_experience: 1.0,
        }
    }

    #[test]
    fn mean_proficiency_of_empty_profile_is_zero() {
        let member = CreateMemberRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
        }
        .into_member()
        .unwrap();
        assert_eq!(member.mean_proficiency(), 0.0);
    }

    #[test]
    fn mean_proficiency_averages_levels() {
        let mut member = CreateMemberRequest {
            name: "Ana".into(),
            email: "ANA@example.com".into(),
        }
        .into_member()
        .unwrap();
        assert_eq!(member.email, "ana@example.com");
        member.skills = vec![skill(4), skill(2)];
        assert_eq!(member.mean_proficiency(), 3.0);
    }

    #[test]
    fn skill_request_rejects_out_of_range_level() {
        let req = AddMemberSkillRequest {
            skill_id: crate::models::new_id(),
            proficiency_level: 6,
            years_of_experience: 0.0,
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }
}
