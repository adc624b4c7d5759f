//! Persistence seams.
//!
//! Handlers and the assignment service only talk to these traits. Production
//! runs on [`MongoStore`]; [`MemoryStore`] backs local development and tests.
//!
//! Workload changes always go through [`MemberStore::increment_workload`], an
//! atomic increment at the data layer. Nothing reads a workload into memory
//! and writes it back.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::error::StoreError;
use crate::models::member::{Member, MemberSkill};
use crate::models::project::{Project, ProjectMember};
use crate::models::skill::Skill;
use crate::models::task::Task;

pub type StoreResult<T> = Result<T, StoreError>;

#[allow(async_fn_in_trait)]
pub trait SkillStore {
    async fn insert_skill(&self, skill: &Skill) -> StoreResult<()>;
    async fn get_skill(&self, id: &str) -> StoreResult<Option<Skill>>;
    async fn list_skills(&self) -> StoreResult<Vec<Skill>>;
}

#[allow(async_fn_in_trait)]
pub trait MemberStore {
    async fn insert_member(&self, member: &Member) -> StoreResult<()>;
    async fn get_member(&self, id: &str) -> StoreResult<Option<Member>>;
    /// Members for the given IDs; unknown IDs are skipped.
    async fn get_members(&self, ids: &[String]) -> StoreResult<Vec<Member>>;
    async fn list_members(&self) -> StoreResult<Vec<Member>>;
    /// Adds or replaces the entry for `skill.skill_id`.
    async fn upsert_member_skill(
        &self,
        member_id: &str,
        skill: &MemberSkill,
    ) -> StoreResult<Option<Member>>;
    /// Atomically adds `delta` hours (may be negative) and returns the updated
    /// member, or `None` if it does not exist.
    async fn increment_workload(&self, member_id: &str, delta: f64) -> StoreResult<Option<Member>>;
}

#[allow(async_fn_in_trait)]
pub trait ProjectStore {
    async fn insert_project(&self, project: &Project) -> StoreResult<()>;
    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>>;
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;
    /// Appends to the roster unless the user is already on it. Returns the
    /// updated project, or `None` if it is missing or already has the user.
    async fn add_project_member(
        &self,
        project_id: &str,
        member: &ProjectMember,
    ) -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: &str) -> StoreResult<bool>;
}

#[allow(async_fn_in_trait)]
pub trait TaskStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()>;
    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>>;
    async fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>>;
    /// Sets `assignedTo`/`autoAssigned` and bumps the version.
    async fn set_assigned_member(
        &self,
        task_id: &str,
        member_id: Option<&str>,
        auto_assigned: bool,
    ) -> StoreResult<Option<Task>>;
    /// Replaces the stored task if its version still equals `expected_version`.
    /// The stored copy gets `task.version`; callers bump it themselves.
    async fn replace_task(&self, task: &Task, expected_version: i64) -> StoreResult<bool>;
    async fn delete_task(&self, id: &str) -> StoreResult<bool>;
}

/// Everything the service needs from a backend.
pub trait Store: SkillStore + MemberStore + ProjectStore + TaskStore {}

impl<T: SkillStore + MemberStore + ProjectStore + TaskStore> Store for T {}
