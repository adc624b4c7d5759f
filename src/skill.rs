use actix_web::{web, HttpRequest, HttpResponse};
use log::info;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::error::AppError;
use crate::models::skill::CreateSkillRequest;
use crate::store::Store;

/// POST /skills
pub async fn create_skill<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    payload: web::Json<CreateSkillRequest>,
) -> Result<HttpResponse, AppError> {
    current_user(&req)?;
    let skill = payload.into_inner().into_skill()?;

    if data
        .store
        .list_skills()
        .await?
        .iter()
        .any(|s| s.name.eq_ignore_ascii_case(&skill.name))
    {
        return Err(AppError::Conflict(format!("Skill {} already exists", skill.name)));
    }

    data.store.insert_skill(&skill).await?;
    info!("Skill created: {} ({})", skill.name, skill.category);
    Ok(HttpResponse::Created().json(skill))
}

/// GET /skills
pub async fn list_skills<S: Store + 'static>(
    data: web::Data<AppState<S>>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(data.store.list_skills().await?))
}
