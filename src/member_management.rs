use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info};

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::error::AppError;
use crate::models::member::{AddMemberSkillRequest, CreateMemberRequest, MemberSkill};
use crate::models::parse_id;
use crate::store::Store;

/// POST /members
pub async fn create_member<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    payload: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse, AppError> {
    current_user(&req)?;
    let member = payload.into_inner().into_member()?;

    if data
        .store
        .list_members()
        .await?
        .iter()
        .any(|m| m.email == member.email)
    {
        return Err(AppError::Conflict(format!(
            "A member with email {} already exists",
            member.email
        )));
    }

    data.store.insert_member(&member).await?;
    info!("Member created: {} <{}>", member.id, member.email);
    Ok(HttpResponse::Created().json(member))
}

/// GET /members
pub async fn list_members<S: Store + 'static>(
    data: web::Data<AppState<S>>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(data.store.list_members().await?))
}

/// GET /members/{member_id}
pub async fn get_member<S: Store + 'static>(
    data: web::Data<AppState<S>>,
    member_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let member_id = parse_id(&member_id, "member")?;
    match data.store.get_member(&member_id).await? {
        Some(member) => Ok(HttpResponse::Ok().json(member)),
        None => Err(AppError::NotFound(format!("Member {} not found", member_id))),
    }
}

/// POST /members/{member_id}/skills
/// Adds a skill to the member's profile, replacing an existing entry for the
/// same skill.
pub async fn add_member_skill<S: Store + 'static>(
    req: HttpRequest,
    data: web::Data<AppState<S>>,
    member_id: web::Path<String>,
    payload: web::Json<AddMemberSkillRequest>,
) -> Result<HttpResponse, AppError> {
    current_user(&req)?;
    let member_id = parse_id(&member_id, "member")?;
    debug!("add_member_skill for {}: {:?}", member_id, payload);
    payload.validate()?;

    let skill_id = parse_id(&payload.skill_id, "skill")?;
    let skill = data
        .store
        .get_skill(&skill_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill {} not found", skill_id)))?;

    let entry = MemberSkill {
        skill_id: skill.id,
        name: skill.name,
        category: skill.category,
        proficiency_level: payload.proficiency_level,
        years_of_experience: payload.years_of_experience,
    };
    match data.store.upsert_member_skill(&member_id, &entry).await? {
        Some(member) => {
            info!("Member {} now has {} at level {}", member.id, entry.name, entry.proficiency_level);
            Ok(HttpResponse::Ok().json(member))
        }
        None => Err(AppError::NotFound(format!("Member {} not found", member_id))),
    }
}
