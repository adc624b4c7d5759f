// src/task.rs

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info};
use serde::Serialize;

use crate::app_state::AppState;
use crate::assignment::{auto_assign_task, workload};
use crate::auth::current_user;
use crate::error::AppError;
use crate::models::member::Member;
use crate::models::parse_id;
use crate::models::task::{CreateTaskRequest, Task, UpdateTaskRequest};
use crate::notifications::Notification;
use crate::store::Store;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResponse {
    pub task: Task,
    pub assigned_member: Option<Member>,
    pub score: Option<f64>,
}

async fn load_task<S: Store>(store: &S, raw_id: &str) -> Result<Task, AppError> {
    let task_id = parse_id(raw_id, "task")?;
    store
        .get_task(&task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))
}

/// POST /projects/{project_id}/tasks
/// Creates a task and, with `autoAssign: true`, assigns it to the best-fit
/// project member. A failed assignment removes the task again.
pub async fn create_task<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    project_id: web::Path<String>,
    payload: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, AppError> {
    let current_user = current_user(&req)?;
    let project_id = parse_id(&project_id, "project")?;
    debug!("create_task for project {}: {:?}", project_id, payload);

    let payload = payload.into_inner();
    let auto_assign = payload.auto_assign;
    let task = payload.into_task(project_id.clone(), current_user)?;

    // 1) Project must exist
    if data.store.get_project(&project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project {} not found", project_id)));
    }

    // 2) Dependencies must be tasks of the same project
    for dep in &task.dependencies {
        match data.store.get_task(dep).await? {
            Some(d) if d.project_id == project_id => {}
            _ => {
                return Err(AppError::Validation(format!(
                    "Dependency {} is not a task of this project",
                    dep
                )))
            }
        }
    }

    // 3) Insert
    data.store.insert_task(&task).await?;
    info!("Task created: {} in project {}", task.id, project_id);

    if !auto_assign {
        return Ok(HttpResponse::Created().json(CreateTaskResponse {
            task,
            assigned_member: None,
            score: None,
        }));
    }

    // 4) Auto-assign
    match auto_assign_task(data.store.as_ref(), &data.config.scoring, &task).await {
        Ok(assignment) => {
            data.notifier.publish(Notification::TaskAssigned {
                task_id: assignment.task.id.clone(),
                project_id: assignment.task.project_id.clone(),
                member_id: assignment.member.id.clone(),
                score: Some(assignment.score),
                auto: true,
            });
            Ok(HttpResponse::Created().json(CreateTaskResponse {
                task: assignment.task,
                assigned_member: Some(assignment.member),
                score: Some(assignment.score),
            }))
        }
        Err(e) => {
            if let Err(del) = data.store.delete_task(&task.id).await {
                error!("Could not remove unassigned task {}: {}", task.id, del);
            }
            Err(e)
        }
    }
}

/// GET /projects/{project_id}/tasks
pub async fn list_tasks<S: Store + 'static>(
    data: web::Data<AppState<S>>,
    project_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let project_id = parse_id(&project_id, "project")?;
    if data.store.get_project(&project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project {} not found", project_id)));
    }
    let tasks = data.store.list_tasks(&project_id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /tasks/{task_id}
pub async fn get_task<S: Store + 'static>(
    data: web::Data<AppState<S>>,
    task_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let task = load_task(data.store.as_ref(), &task_id).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// PUT /tasks/{task_id}
pub async fn update_task<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    task_id: web::Path<String>,
    payload: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, AppError> {
    current_user(&req)?;
    let current = load_task(data.store.as_ref(), &task_id).await?;
    debug!("update_task {}: {:?}", current.id, payload);

    let updated = workload::update_task(data.store.as_ref(), &current, payload.into_inner()).await?;

    if let Some(member_id) = &updated.assigned_to {
        if updated.assigned_to != current.assigned_to {
            data.notifier.publish(Notification::TaskAssigned {
                task_id: updated.id.clone(),
                project_id: updated.project_id.clone(),
                member_id: member_id.clone(),
                score: None,
                auto: false,
            });
        } else if updated.status != current.status {
            data.notifier.publish(Notification::TaskStatusChanged {
                task_id: updated.id.clone(),
                member_id: member_id.clone(),
                status: updated.status,
            });
        }
    }
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /tasks/{task_id}
pub async fn delete_task<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    task_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    current_user(&req)?;
    let task = load_task(data.store.as_ref(), &task_id).await?;
    workload::delete_task(data.store.as_ref(), &task).await?;
    info!("Task deleted: {}", task.id);
    Ok(HttpResponse::Ok().body("Task deleted"))
}
