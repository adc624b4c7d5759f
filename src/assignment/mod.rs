//! Automatic task assignment.
//!
//! [`auto_assign_task`] picks the best-fit project member for a stored,
//! unassigned task and records the assignment. The member's workload is
//! bumped with an atomic increment first; the task is only marked assigned
//! once that succeeded, and the increment is reverted if the task write fails.

pub mod scorer;
pub mod workload;

use log::{debug, error, info};

use crate::error::AppError;
use crate::models::member::Member;
use crate::models::task::Task;
use crate::store::Store;
use scorer::{rank_candidates, ScoringWeights};

#[derive(Debug, Clone)]
pub struct Assignment {
    pub task: Task,
    pub member: Member,
    pub score: f64,
}

pub async fn auto_assign_task<S: Store>(
    store: &S,
    weights: &ScoringWeights,
    task: &Task,
) -> Result<Assignment, AppError> {
    task.validate()?;
    if task.assigned_to.is_some() {
        return Err(AppError::Validation(format!("Task {} is already assigned", task.id)));
    }
    if !task.status.is_open() {
        return Err(AppError::Validation(
            "Completed tasks cannot be auto-assigned".into(),
        ));
    }

    let project = store
        .get_project(&task.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", task.project_id)))?;
    if project.members.is_empty() {
        return Err(AppError::NoEligibleMembers(project.id));
    }

    let members = store.get_members(&project.member_ids()).await?;
    let ranked = rank_candidates(&members, &project, task, weights);
    for candidate in &ranked {
        debug!(
            "Candidate {} for task {}: {:?}",
            candidate.member.id, task.id, candidate.score
        );
    }
    let best = ranked
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NoEligibleMembers(project.id.clone()))?;
    let member_id = best.member.id.clone();

    let member = match store.increment_workload(&member_id, task.estimated_hours).await {
        Ok(Some(member)) => member,
        Ok(None) => {
            return Err(AppError::Persistence(format!(
                "Member {} disappeared before the assignment was recorded",
                member_id
            )))
        }
        Err(e) => {
            error!("Workload update failed for member {}: {}", member_id, e);
            return Err(AppError::Persistence(format!(
                "Failed to update workload of member {}: {}",
                member_id, e
            )));
        }
    };

    let assigned = match store.set_assigned_member(&task.id, Some(&member_id), true).await {
        Ok(Some(assigned)) => assigned,
        outcome => {
            let reason = match outcome {
                Err(e) => e.to_string(),
                _ => format!("task {} no longer exists", task.id),
            };
            error!("Assigning task {} to {} failed: {}", task.id, member_id, reason);
            workload::revert(store, &member_id, task.estimated_hours).await;
            return Err(AppError::Persistence(format!(
                "Failed to record assignment of task {}: {}",
                task.id, reason
            )));
        }
    };

    info!(
        "Task {} auto-assigned to member {} (score {:.3}, workload now {})",
        assigned.id, member.id, best.score.total, member.workload
    );
    Ok(Assignment {
        task: assigned,
        member,
        score: best.score.total,
    })
}
