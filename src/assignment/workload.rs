//! Workload bookkeeping outside of auto-assignment.
//!
//! A member's workload is the sum of `estimatedHours` over their open
//! (not completed) tasks. Every task write that changes that sum goes through
//! here: workload increments are applied first, the task write second, and the
//! increments are reverted if the task write does not land.

use log::{error, info, warn};

use crate::error::AppError;
use crate::models::member::round_hours;
use crate::models::parse_id;
use crate::models::task::{
    normalise_skills, validate_complexity, validate_hours, Task, UpdateTaskRequest,
};
use crate::store::Store;

/// Best-effort undo of a workload increment. Failures are logged; the caller
/// is already on an error path.
pub async fn revert<S: Store>(store: &S, member_id: &str, hours: f64) {
    match store.increment_workload(member_id, -hours).await {
        Ok(_) => warn!("Reverted {} hours on member {}", hours, member_id),
        Err(e) => error!(
            "Could not revert {} hours on member {}; workload is now inconsistent: {}",
            hours, member_id, e
        ),
    }
}

/// Workload changes implied by replacing `before` with `after`.
pub fn workload_deltas(before: &Task, after: &Task) -> Vec<(String, f64)> {
    let mut deltas: Vec<(String, f64)> = Vec::new();
    if let Some(old) = &before.assigned_to {
        let hours = before.open_hours();
        if hours != 0.0 {
            deltas.push((old.clone(), -hours));
        }
    }
    if let Some(new) = &after.assigned_to {
        let hours = after.open_hours();
        match deltas.iter_mut().find(|(id, _)| id == new) {
            Some((_, delta)) => *delta += hours,
            None if hours != 0.0 => deltas.push((new.clone(), hours)),
            None => {}
        }
    }
    deltas.retain(|(_, delta)| *delta != 0.0);
    deltas
}

async fn apply_deltas<S: Store>(store: &S, deltas: &[(String, f64)]) -> Result<(), AppError> {
    for (applied, (member_id, delta)) in deltas.iter().enumerate() {
        let outcome = store.increment_workload(member_id, *delta).await;
        let failure = match outcome {
            Ok(Some(_)) => continue,
            // A member that no longer exists has no workload to keep in sync.
            Ok(None) if *delta < 0.0 => continue,
            Ok(None) => AppError::NotFound(format!("Member {} not found", member_id)),
            Err(e) => AppError::Persistence(format!(
                "Failed to update workload of member {}: {}",
                member_id, e
            )),
        };
        revert_all(store, &deltas[..applied]).await;
        return Err(failure);
    }
    Ok(())
}

async fn revert_all<S: Store>(store: &S, deltas: &[(String, f64)]) {
    for (member_id, delta) in deltas {
        revert(store, member_id, *delta).await;
    }
}

/// Applies a partial update to `current`, keeping assignee workloads in step
/// with status, hours and assignee changes.
pub async fn update_task<S: Store>(
    store: &S,
    current: &Task,
    req: UpdateTaskRequest,
) -> Result<Task, AppError> {
    if req.is_empty() {
        return Err(AppError::Validation("No fields to update".into()));
    }

    let mut next = current.clone();
    if let Some(title) = req.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Task title cannot be empty".into()));
        }
        next.title = title;
    }
    if let Some(description) = req.description {
        next.description = description;
    }
    if let Some(status) = req.status {
        next.status = status;
    }
    if let Some(task_type) = req.task_type {
        next.task_type = task_type;
    }
    if let Some(priority) = req.priority {
        next.priority = priority;
    }
    if let Some(hours) = req.estimated_hours {
        let hours = round_hours(hours);
        validate_hours(hours)?;
        next.estimated_hours = hours;
    }
    if let Some(complexity) = req.complexity {
        validate_complexity(complexity)?;
        next.complexity = complexity;
    }
    if let Some(skills) = req.required_skills {
        next.required_skills = normalise_skills(skills);
    }
    if let Some(due) = req.due_date {
        next.due_date = Some(due);
    }
    if let Some(assignee) = req.assigned_to {
        let assignee = parse_id(&assignee, "member")?;
        if current.assigned_to.as_deref() != Some(assignee.as_str()) {
            let project = store.get_project(&current.project_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Project {} not found", current.project_id))
            })?;
            if !project.has_member(&assignee) {
                return Err(AppError::Validation(format!(
                    "Member {} is not part of project {}",
                    assignee, project.id
                )));
            }
            if store.get_member(&assignee).await?.is_none() {
                return Err(AppError::NotFound(format!("Member {} not found", assignee)));
            }
            next.assigned_to = Some(assignee);
            next.auto_assigned = false;
        }
    }
    next.updated_at = chrono::Utc::now();
    next.version = current.version + 1;

    let deltas = workload_deltas(current, &next);
    apply_deltas(store, &deltas).await?;

    match store.replace_task(&next, current.version).await {
        Ok(true) => {}
        Ok(false) => {
            revert_all(store, &deltas).await;
            return Err(AppError::Conflict(format!(
                "Task {} was modified concurrently; reload and retry",
                current.id
            )));
        }
        Err(e) => {
            revert_all(store, &deltas).await;
            return Err(e.into());
        }
    }

    if !deltas.is_empty() {
        info!("Task {} updated; workload changes {:?}", next.id, deltas);
    }
    Ok(next)
}

/// Deletes a task, releasing its open hours from the assignee.
pub async fn delete_task<S: Store>(store: &S, task: &Task) -> Result<(), AppError> {
    let mut released = task.clone();
    released.assigned_to = None;
    let deltas = workload_deltas(task, &released);
    apply_deltas(store, &deltas).await?;

    match store.delete_task(&task.id).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            revert_all(store, &deltas).await;
            Err(AppError::NotFound(format!("Task {} not found", task.id)))
        }
        Err(e) => {
            revert_all(store, &deltas).await;
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::auto_assign_task;
    use crate::assignment::scorer::ScoringWeights;
    use crate::assignment::tests::{member, new_task, seed};
    use crate::models::task::TaskStatus;
    use crate::store::{MemberStore, MemoryStore, TaskStore};

    async fn workload_of(store: &MemoryStore, id: &str) -> f64 {
        store.get_member(id).await.unwrap().unwrap().workload
    }

    async fn assigned_task(store: &MemoryStore, hours: f64) -> Task {
        let project = seed(
            store,
            &[member("m1", &[("JS", 4)], 0.0), member("m2", &[("JS", 1)], 0.0)],
        )
        .await;
        let task = new_task(store, &project.id, hours).await;
        auto_assign_task(store, &ScoringWeights::default(), &task)
            .await
            .unwrap()
            .task
    }

    fn status(status: TaskStatus) -> UpdateTaskRequest {
        UpdateTaskRequest {
            status: Some(status),
            ..Default::default()
        }
    }

    #[test]
    fn deltas_for_reassignment_move_hours() {
        let mut before: Task = serde_json::from_value(serde_json::json!({
            "_id": "t", "projectId": "p", "title": "t", "assignedTo": "a",
            "estimatedHours": 5.0, "createdBy": "lead",
            "createdAt": "2026-01-01T00:00:00Z", "updatedAt": "2026-01-01T00:00:00Z",
        }))
        .unwrap();
        let mut after = before.clone();
        after.assigned_to = Some("b".into());
        assert_eq!(
            workload_deltas(&before, &after),
            vec![("a".to_string(), -5.0), ("b".to_string(), 5.0)]
        );
        before.status = TaskStatus::Completed;
        after.status = TaskStatus::Completed;
        assert!(workload_deltas(&before, &after).is_empty());
    }

    #[actix_web::test]
    async fn completing_releases_and_reopening_restores() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        assert_eq!(workload_of(&store, "m1").await, 8.0);

        let done = update_task(&store, &task, status(TaskStatus::Completed)).await.unwrap();
        assert_eq!(workload_of(&store, "m1").await, 0.0);

        let reopened = update_task(&store, &done, status(TaskStatus::InProgress)).await.unwrap();
        assert_eq!(workload_of(&store, "m1").await, 8.0);
        assert_eq!(reopened.version, task.version + 2);
    }

    #[actix_web::test]
    async fn fractional_hours_leave_no_residue() {
        let store = MemoryStore::new();
        let project = seed(
            &store,
            &[member("m1", &[("JS", 4)], 0.0), member("m2", &[("JS", 1)], 0.0)],
        )
        .await;
        let weights = ScoringWeights::default();
        let mut assigned = Vec::new();
        for hours in [0.1, 0.2] {
            let task = new_task(&store, &project.id, hours).await;
            let assignment = auto_assign_task(&store, &weights, &task).await.unwrap();
            assert_eq!(assignment.member.id, "m1");
            assigned.push(assignment.task);
        }
        assert_eq!(workload_of(&store, "m1").await, 0.3);

        for task in &assigned {
            update_task(&store, task, status(TaskStatus::Completed)).await.unwrap();
        }
        let workload = workload_of(&store, "m1").await;
        assert_eq!(workload, 0.0);
        assert!(workload.is_sign_positive());
    }

    #[actix_web::test]
    async fn estimates_are_kept_to_hundredths() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 1.0).await;
        let req = UpdateTaskRequest {
            estimated_hours: Some(2.004),
            ..Default::default()
        };
        let updated = update_task(&store, &task, req).await.unwrap();
        assert_eq!(updated.estimated_hours, 2.0);
        assert_eq!(workload_of(&store, "m1").await, 2.0);

        let req = UpdateTaskRequest {
            estimated_hours: Some(0.004),
            ..Default::default()
        };
        assert!(matches!(
            update_task(&store, &updated, req).await,
            Err(AppError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn status_change_between_open_states_keeps_workload() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        update_task(&store, &task, status(TaskStatus::InProgress)).await.unwrap();
        assert_eq!(workload_of(&store, "m1").await, 8.0);
    }

    #[actix_web::test]
    async fn hours_change_adjusts_workload() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        let req = UpdateTaskRequest {
            estimated_hours: Some(3.0),
            ..Default::default()
        };
        update_task(&store, &task, req).await.unwrap();
        assert_eq!(workload_of(&store, "m1").await, 3.0);
    }

    #[actix_web::test]
    async fn manual_reassignment_moves_hours() {
        let store = MemoryStore::new();
        let a = crate::models::new_id();
        let b = crate::models::new_id();
        let project = seed(
            &store,
            &[member(&a, &[("JS", 4)], 0.0), member(&b, &[("JS", 1)], 0.0)],
        )
        .await;
        let task = new_task(&store, &project.id, 8.0).await;
        let task = auto_assign_task(&store, &ScoringWeights::default(), &task)
            .await
            .unwrap()
            .task;
        assert_eq!(task.assigned_to.as_deref(), Some(a.as_str()));

        let req = UpdateTaskRequest {
            assigned_to: Some(b.clone()),
            ..Default::default()
        };
        let moved = update_task(&store, &task, req).await.unwrap();

        assert_eq!(moved.assigned_to.as_deref(), Some(b.as_str()));
        assert!(!moved.auto_assigned);
        assert_eq!(workload_of(&store, &a).await, 0.0);
        assert_eq!(workload_of(&store, &b).await, 8.0);
    }

    #[actix_web::test]
    async fn reassignment_outside_the_project_is_rejected() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        let req = UpdateTaskRequest {
            assigned_to: Some(crate::models::new_id()),
            ..Default::default()
        };
        assert!(matches!(
            update_task(&store, &task, req).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(workload_of(&store, "m1").await, 8.0);
    }

    #[actix_web::test]
    async fn stale_version_is_a_conflict_and_rolls_back() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        update_task(&store, &task, status(TaskStatus::InProgress)).await.unwrap();

        let err = update_task(&store, &task, status(TaskStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(workload_of(&store, "m1").await, 8.0);
    }

    #[actix_web::test]
    async fn failing_workload_write_aborts_the_update() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        store.faults.fail_workload_writes(true);
        let err = update_task(&store, &task, status(TaskStatus::Completed))
            .await
            .unwrap_err();
        store.faults.fail_workload_writes(false);
        assert!(matches!(err, AppError::Persistence(_)));
        let stored = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
        assert_eq!(workload_of(&store, "m1").await, 8.0);
    }

    #[actix_web::test]
    async fn deleting_an_open_task_releases_hours() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        delete_task(&store, &task).await.unwrap();
        assert_eq!(workload_of(&store, "m1").await, 0.0);
        assert!(store.get_task(&task.id).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn deleting_a_completed_task_leaves_workload_alone() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        let done = update_task(&store, &task, status(TaskStatus::Completed)).await.unwrap();
        store.increment_workload("m1", 2.0).await.unwrap();
        delete_task(&store, &done).await.unwrap();
        assert_eq!(workload_of(&store, "m1").await, 2.0);
    }

    #[actix_web::test]
    async fn empty_update_is_rejected() {
        let store = MemoryStore::new();
        let task = assigned_task(&store, 8.0).await;
        assert!(matches!(
            update_task(&store, &task, UpdateTaskRequest::default()).await,
            Err(AppError::Validation(_))
        ));
    }
}
