use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{MemberStore, ProjectStore, SkillStore, StoreResult, TaskStore};
use crate::error::StoreError;
use crate::models::member::{round_hours, Member, MemberSkill};
use crate::models::project::{Project, ProjectMember};
use crate::models::skill::Skill;
use crate::models::task::Task;

#[derive(Default)]
struct Collections {
    skills: HashMap<String, Skill>,
    members: HashMap<String, Member>,
    projects: HashMap<String, Project>,
    tasks: HashMap<String, Task>,
}

/// Switches that make individual writes fail.
#[derive(Default)]
pub struct Faults {
    workload_writes: AtomicBool,
    task_assignment: AtomicBool,
    yield_after_reads: AtomicBool,
}

impl Faults {
    #[cfg(test)]
    pub fn fail_workload_writes(&self, on: bool) {
        self.workload_writes.store(on, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn fail_task_assignment(&self, on: bool) {
        self.task_assignment.store(on, Ordering::SeqCst);
    }

    /// Makes `get_members` yield after taking its snapshot, so concurrent
    /// callers interleave between their reads and writes.
    #[cfg(test)]
    pub fn yield_after_reads(&self, on: bool) {
        self.yield_after_reads.store(on, Ordering::SeqCst);
    }
}

/// Process-local store. Every operation runs under one lock, which makes
/// `increment_workload` atomic the same way a single-document update is in MongoDB.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Collections>,
    pub faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sorted<T: Clone, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut out: Vec<T> = items.collect();
    out.sort_by_key(|item| key(item));
    out
}

impl SkillStore for MemoryStore {
    async fn insert_skill(&self, skill: &Skill) -> StoreResult<()> {
        self.lock().skills.insert(skill.id.clone(), skill.clone());
        Ok(())
    }

    async fn get_skill(&self, id: &str) -> StoreResult<Option<Skill>> {
        Ok(self.lock().skills.get(id).cloned())
    }

    async fn list_skills(&self) -> StoreResult<Vec<Skill>> {
        let data = self.lock();
        Ok(sorted(data.skills.values().cloned(), |s| (s.name.clone(), s.id.clone())))
    }
}

impl MemberStore for MemoryStore {
    async fn insert_member(&self, member: &Member) -> StoreResult<()> {
        self.lock().members.insert(member.id.clone(), member.clone());
        Ok(())
    }

    async fn get_member(&self, id: &str) -> StoreResult<Option<Member>> {
        Ok(self.lock().members.get(id).cloned())
    }

    async fn get_members(&self, ids: &[String]) -> StoreResult<Vec<Member>> {
        let members = {
            let data = self.lock();
            sorted(
                ids.iter().filter_map(|id| data.members.get(id).cloned()),
                |m| m.id.clone(),
            )
        };
        if self.faults.yield_after_reads.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(members)
    }

    async fn list_members(&self) -> StoreResult<Vec<Member>> {
        let data = self.lock();
        Ok(sorted(data.members.values().cloned(), |m| (m.name.clone(), m.id.clone())))
    }

    async fn upsert_member_skill(
        &self,
        member_id: &str,
        skill: &MemberSkill,
    ) -> StoreResult<Option<Member>> {
        let mut data = self.lock();
        Ok(data.members.get_mut(member_id).map(|member| {
            member.skills.retain(|s| s.skill_id != skill.skill_id);
            member.skills.push(skill.clone());
            member.clone()
        }))
    }

    async fn increment_workload(&self, member_id: &str, delta: f64) -> StoreResult<Option<Member>> {
        if self.faults.workload_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("workload write"));
        }
        let mut data = self.lock();
        Ok(data.members.get_mut(member_id).map(|member| {
            member.workload = round_hours(member.workload + delta);
            member.clone()
        }))
    }
}

impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        self.lock().projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.lock().projects.get(id).cloned())
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let data = self.lock();
        let mut projects = sorted(data.projects.values().cloned(), |p| (p.created_at, p.id.clone()));
        projects.reverse();
        Ok(projects)
    }

    async fn add_project_member(
        &self,
        project_id: &str,
        member: &ProjectMember,
    ) -> StoreResult<Option<Project>> {
        let mut data = self.lock();
        Ok(match data.projects.get_mut(project_id) {
            Some(project) if !project.has_member(&member.user_id) => {
                project.members.push(member.clone());
                Some(project.clone())
            }
            _ => None,
        })
    }

    async fn delete_project(&self, id: &str) -> StoreResult<bool> {
        Ok(self.lock().projects.remove(id).is_some())
    }
}

impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.lock().tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.lock().tasks.get(id).cloned())
    }

    async fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        let data = self.lock();
        Ok(sorted(
            data.tasks.values().filter(|t| t.project_id == project_id).cloned(),
            |t| (t.created_at, t.id.clone()),
        ))
    }

    async fn set_assigned_member(
        &self,
        task_id: &str,
        member_id: Option<&str>,
        auto_assigned: bool,
    ) -> StoreResult<Option<Task>> {
        if self.faults.task_assignment.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("task assignment write"));
        }
        let mut data = self.lock();
        Ok(data.tasks.get_mut(task_id).map(|task| {
            task.assigned_to = member_id.map(str::to_string);
            task.auto_assigned = auto_assigned;
            task.updated_at = chrono::Utc::now();
            task.version += 1;
            task.clone()
        }))
    }

    async fn replace_task(&self, task: &Task, expected_version: i64) -> StoreResult<bool> {
        let mut data = self.lock();
        match data.tasks.get_mut(&task.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = task.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_task(&self, id: &str) -> StoreResult<bool> {
        Ok(self.lock().tasks.remove(id).is_some())
    }
}
