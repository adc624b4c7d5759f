// src/project.rs

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info};

use crate::app_state::AppState;
use crate::assignment::workload;
use crate::auth::current_user;
use crate::error::AppError;
use crate::models::parse_id;
use crate::models::project::{
    AddProjectMemberRequest, CreateProjectRequest, Project, ProjectMember,
};
use crate::models::task::normalise_skills;
use crate::store::Store;

async fn load_project<S: Store>(store: &S, raw_id: &str) -> Result<Project, AppError> {
    let project_id = parse_id(raw_id, "project")?;
    store
        .get_project(&project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))
}

fn require_owner(project: &Project, user_id: &str, action: &str) -> Result<(), AppError> {
    if project.created_by != user_id {
        return Err(AppError::Forbidden(format!(
            "Only the project owner can {}",
            action
        )));
    }
    Ok(())
}

/// POST /projects
pub async fn create_project<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    payload: web::Json<CreateProjectRequest>,
) -> Result<HttpResponse, AppError> {
    let current_user = current_user(&req)?;
    debug!("create_project by {}: {:?}", current_user, payload);

    let project = payload.into_inner().into_project(current_user)?;
    data.store.insert_project(&project).await?;
    info!("Project created: {}", project.id);
    Ok(HttpResponse::Created().json(project))
}

/// GET /projects
pub async fn list_projects<S: Store + 'static>(
    data: web::Data<AppState<S>>,
) -> Result<HttpResponse, AppError> {
    let projects = data.store.list_projects().await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// GET /projects/{project_id}
pub async fn get_project<S: Store + 'static>(
    data: web::Data<AppState<S>>,
    project_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let project = load_project(data.store.as_ref(), &project_id).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// POST /projects/{project_id}/members
/// Adds an existing member to the roster, optionally tagged with
/// project-level skills.
pub async fn add_project_member<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    project_id: web::Path<String>,
    payload: web::Json<AddProjectMemberRequest>,
) -> Result<HttpResponse, AppError> {
    let current_user = current_user(&req)?;
    let project = load_project(data.store.as_ref(), &project_id).await?;

    // 1) Only the owner may add
    require_owner(&project, &current_user, "add members")?;

    // 2) Target must be a known member
    let payload = payload.into_inner();
    let user_id = parse_id(&payload.user_id, "member")?;
    if data.store.get_member(&user_id).await?.is_none() {
        return Err(AppError::Validation(format!("Member {} does not exist", user_id)));
    }

    // 3) Prevent duplicates
    if project.has_member(&user_id) {
        return Err(AppError::Validation(format!(
            "Member {} is already in project {}",
            user_id, project.id
        )));
    }

    // 4) Persist; a concurrent add of the same member lands here as None
    let entry = ProjectMember {
        user_id: user_id.clone(),
        skills: normalise_skills(payload.skills),
    };
    match data.store.add_project_member(&project.id, &entry).await? {
        Some(updated) => {
            info!("Member {} added to project {}", user_id, updated.id);
            Ok(HttpResponse::Ok().json(updated))
        }
        None => Err(AppError::Validation(format!(
            "Member {} is already in project {}",
            user_id, project.id
        ))),
    }
}

/// DELETE /projects/{project_id}
/// Deletes the project with its tasks, releasing their open hours first.
pub async fn delete_project<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    project_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let current_user = current_user(&req)?;
    let project = load_project(data.store.as_ref(), &project_id).await?;
    require_owner(&project, &current_user, "delete the project")?;

    // The project is removed only after every task is released; a failed
    // delete leaves it in place for a retry.
    let tasks = data.store.list_tasks(&project.id).await?;
    let total = tasks.len();
    for (released, task) in tasks.iter().enumerate() {
        if let Err(e) = workload::delete_task(data.store.as_ref(), task).await {
            error!(
                "Deleting project {} stopped at task {} after releasing {} of {} tasks: {}",
                project.id, task.id, released, total, e
            );
            return Err(e);
        }
        debug!("Released task {} of project {}", task.id, project.id);
    }
    if !data.store.delete_project(&project.id).await? {
        return Err(AppError::NotFound(format!("Project {} not found", project.id)));
    }
    info!("Project deleted: {}", project.id);
    Ok(HttpResponse::Ok().body("Project deleted"))
}
