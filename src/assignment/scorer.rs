//! Fitness scoring for auto-assignment.
//!
//! A member's score is a weighted sum of three components, each in `[0, 1]`:
//!
//! * **skill** – mean proficiency of the member's skills that match the task's
//!   requirements, scaled by how many explicit requirements they cover;
//! * **workload** – `1 / (1 + workload / capacity_hours)`, so idle members
//!   score higher;
//! * **complexity** – `1 - max(0, complexity/10 - mean_proficiency/5)`, which
//!   penalises under-qualified members on hard tasks.
//!
//! Ranking is a pure function of its inputs. Ties fall back to lower workload,
//! then to the lexicographically smaller member ID.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::models::member::{Member, MemberSkill, MAX_PROFICIENCY};
use crate::models::project::Project;
use crate::models::task::{Task, MAX_COMPLEXITY};

/// Proficiency assumed for a project-level skill tag the member's own profile
/// does not list.
pub const TAGGED_SKILL_PROFICIENCY: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub skill: f64,
    pub workload: f64,
    pub complexity: f64,
    /// Workload at which the workload component drops to one half.
    pub capacity_hours: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 0.5,
            workload: 0.3,
            complexity: 0.2,
            capacity_hours: 40.0,
        }
    }
}

/// The skill names a task asks for.
#[derive(Debug, Clone)]
pub struct Requirements {
    names: HashSet<String>,
    category: &'static str,
    /// Explicit requirements reward covering all of them; implied ones are a
    /// menu where any match counts fully.
    explicit: bool,
}

impl Requirements {
    pub fn for_task(task: &Task) -> Self {
        let explicit = !task.required_skills.is_empty();
        let names = if explicit {
            task.required_skills.iter().map(|s| s.to_lowercase()).collect()
        } else {
            task.task_type
                .implied_skills()
                .iter()
                .map(|s| s.to_string())
                .collect()
        };
        Self {
            names,
            category: task.task_type.as_str(),
            explicit,
        }
    }

    fn matches(&self, skill: &MemberSkill) -> bool {
        self.names.contains(&skill.name.to_lowercase())
            || (!self.explicit && skill.category.eq_ignore_ascii_case(self.category))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub skill: f64,
    pub workload: f64,
    pub complexity: f64,
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub member: Member,
    pub score: ScoreBreakdown,
}

/// Folds the project's per-member skill tags into the member's profile.
/// Tags already present in the profile are ignored.
pub fn effective_profile(member: &Member, project: &Project) -> Member {
    let mut profile = member.clone();
    let tags = project
        .members
        .iter()
        .find(|pm| pm.user_id == member.id)
        .map(|pm| pm.skills.as_slice())
        .unwrap_or_default();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || profile.skills.iter().any(|s| s.name.eq_ignore_ascii_case(tag)) {
            continue;
        }
        profile.skills.push(MemberSkill {
            skill_id: String::new(),
            name: tag.to_string(),
            category: String::new(),
            proficiency_level: TAGGED_SKILL_PROFICIENCY,
            years_of_experience: 0.0,
        });
    }
    profile
}

pub fn score_member(
    member: &Member,
    task: &Task,
    requirements: &Requirements,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let max_level = MAX_PROFICIENCY as f64;

    let matched: Vec<&MemberSkill> = member
        .skills
        .iter()
        .filter(|s| requirements.matches(s))
        .collect();
    let skill = if matched.is_empty() {
        0.0
    } else {
        let mean = matched.iter().map(|s| s.proficiency_level as f64).sum::<f64>()
            / matched.len() as f64;
        let coverage = if requirements.explicit {
            let covered: HashSet<String> = matched.iter().map(|s| s.name.to_lowercase()).collect();
            covered.len() as f64 / requirements.names.len() as f64
        } else {
            1.0
        };
        (mean / max_level) * coverage.min(1.0)
    };

    let workload = 1.0 / (1.0 + member.workload.max(0.0) / weights.capacity_hours);

    let demand = task.complexity as f64 / MAX_COMPLEXITY as f64;
    let ability = member.mean_proficiency() / max_level;
    let complexity = 1.0 - (demand - ability).max(0.0);

    let total = weights.skill * skill + weights.workload * workload + weights.complexity * complexity;
    ScoreBreakdown {
        skill,
        workload,
        complexity,
        total,
    }
}

fn rank_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then_with(|| a.member.workload.total_cmp(&b.member.workload))
        .then_with(|| a.member.id.cmp(&b.member.id))
}

/// Scores every member and returns them best first.
pub fn rank_candidates(
    members: &[Member],
    project: &Project,
    task: &Task,
    weights: &ScoringWeights,
) -> Vec<RankedCandidate> {
    let requirements = Requirements::for_task(task);
    let mut ranked: Vec<RankedCandidate> = members
        .iter()
        .map(|member| {
            let profile = effective_profile(member, project);
            RankedCandidate {
                score: score_member(&profile, task, &requirements, weights),
                member: member.clone(),
            }
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectMember;
    use crate::models::task::{CreateTaskRequest, TaskType};
    use chrono::Utc;

    fn member(id: &str, skills: &[(&str, &str, u8)], workload: f64) -> Member {
        Member {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{}@example.com", id),
            workload,
            skills: skills
                .iter()
                .map(|(name, category, level)| MemberSkill {
                    skill_id: format!("skill-{}", name),
                    name: name.to_string(),
                    category: category.to_string(),
                    proficiency_level: *level,
                    years_of_experience: 1.0,
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    fn project(members: &[&Member]) -> Project {
        Project {
            id: "p1".into(),
            name: "Apollo".into(),
            description: None,
            category: None,
            start_date: None,
            deadline: None,
            members: members
                .iter()
                .map(|m| ProjectMember {
                    user_id: m.id.clone(),
                    skills: Vec::new(),
                })
                .collect(),
            created_by: "lead".into(),
            created_at: Utc::now(),
        }
    }

    fn task(task_type: TaskType, complexity: u8) -> Task {
        let mut req: CreateTaskRequest =
            serde_json::from_value(serde_json::json!({ "title": "t" })).unwrap();
        req.task_type = Some(task_type);
        req.complexity = Some(complexity);
        req.into_task("p1".into(), "lead".into()).unwrap()
    }

    #[test]
    fn higher_proficiency_wins() {
        let m1 = member("m1", &[("JS", "", 4)], 0.0);
        let m2 = member("m2", &[("JS", "", 2)], 0.0);
        let ranked = rank_candidates(
            &[m2.clone(), m1.clone()],
            &project(&[&m1, &m2]),
            &task(TaskType::Development, 5),
            &ScoringWeights::default(),
        );
        assert_eq!(ranked[0].member.id, "m1");
        assert!(ranked[0].score.total > ranked[1].score.total);
    }

    #[test]
    fn idle_member_preferred_over_busy_one() {
        let a = member("a", &[("React", "development", 3)], 0.0);
        let b = member("b", &[("React", "development", 3)], 40.0);
        let ranked = rank_candidates(
            &[b.clone(), a.clone()],
            &project(&[&a, &b]),
            &task(TaskType::Development, 5),
            &ScoringWeights::default(),
        );
        assert_eq!(ranked[0].member.id, "a");
        assert_eq!(ranked[0].score.skill, ranked[1].score.skill);
        assert_eq!(ranked[1].score.workload, 0.5);
    }

    #[test]
    fn novices_penalised_on_complex_tasks() {
        let novice = member("novice", &[("Rust", "development", 1)], 0.0);
        let expert = member("expert", &[("Rust", "development", 5)], 0.0);
        let reqs = Requirements::for_task(&task(TaskType::Development, 10));
        let weights = ScoringWeights::default();
        let hard = task(TaskType::Development, 10);
        let n = score_member(&novice, &hard, &reqs, &weights);
        let e = score_member(&expert, &hard, &reqs, &weights);
        assert!(n.complexity < e.complexity);
        assert_eq!(e.complexity, 1.0);
        assert!((n.complexity - 0.2).abs() < 1e-9);
    }

    #[test]
    fn ties_break_on_member_id() {
        let a = member("a", &[], 0.0);
        let b = member("b", &[], 0.0);
        let ranked = rank_candidates(
            &[b.clone(), a.clone()],
            &project(&[&a, &b]),
            &task(TaskType::Other, 5),
            &ScoringWeights::default(),
        );
        assert_eq!(ranked[0].member.id, "a");
        assert_eq!(ranked[0].score.total, ranked[1].score.total);
    }

    #[test]
    fn ranking_is_deterministic() {
        let members: Vec<Member> = (0..6)
            .map(|i| member(&format!("m{}", i), &[("JS", "", (i % 5 + 1) as u8)], (i * 7) as f64))
            .collect();
        let refs: Vec<&Member> = members.iter().collect();
        let p = project(&refs);
        let t = task(TaskType::Development, 7);
        let w = ScoringWeights::default();
        let first: Vec<String> = rank_candidates(&members, &p, &t, &w)
            .into_iter()
            .map(|c| c.member.id)
            .collect();
        let mut reversed = members.clone();
        reversed.reverse();
        let second: Vec<String> = rank_candidates(&reversed, &p, &t, &w)
            .into_iter()
            .map(|c| c.member.id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn explicit_requirements_reward_coverage() {
        let partial = member("partial", &[("React", "", 4)], 0.0);
        let full = member("full", &[("React", "", 4), ("CSS", "", 4)], 0.0);
        let mut t = task(TaskType::Development, 5);
        t.required_skills = vec!["css".into(), "react".into()];
        let reqs = Requirements::for_task(&t);
        let w = ScoringWeights::default();
        assert!(score_member(&full, &t, &reqs, &w).skill > score_member(&partial, &t, &reqs, &w).skill);
        assert_eq!(score_member(&partial, &t, &reqs, &w).skill, 0.4);
    }

    #[test]
    fn category_match_counts_for_implied_requirements() {
        let designer = member("d", &[("Photoshop", "design", 5)], 0.0);
        let t = task(TaskType::Design, 5);
        let reqs = Requirements::for_task(&t);
        assert_eq!(score_member(&designer, &t, &reqs, &ScoringWeights::default()).skill, 1.0);
    }

    #[test]
    fn project_tags_extend_the_profile() {
        let m = member("m", &[], 0.0);
        let mut p = project(&[&m]);
        p.members[0].skills = vec!["Docker".into(), " ".into()];
        let profile = effective_profile(&m, &p);
        assert_eq!(profile.skills.len(), 1);
        assert_eq!(profile.skills[0].proficiency_level, TAGGED_SKILL_PROFICIENCY);
        let t = task(TaskType::Devops, 5);
        let reqs = Requirements::for_task(&t);
        assert!(score_member(&profile, &t, &reqs, &ScoringWeights::default()).skill > 0.0);
    }
}
