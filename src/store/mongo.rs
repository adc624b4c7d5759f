use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, to_bson};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

use super::{MemberStore, ProjectStore, SkillStore, StoreResult, TaskStore};
use crate::models::member::{round_hours, Member, MemberSkill};
use crate::models::project::{Project, ProjectMember};
use crate::models::skill::Skill;
use crate::models::task::Task;

const SKILLS: &str = "skills";
const MEMBERS: &str = "members";
const PROJECTS: &str = "projects";
const TASKS: &str = "tasks";

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn init(uri: &str, db_name: &str) -> StoreResult<Self> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);
        let store = MongoStore { db };
        store.ensure_indexes().await?;
        info!("Connected to MongoDB database {}", db_name);
        Ok(store)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        self.tasks()
            .create_index(IndexModel::builder().keys(doc! { "projectId": 1 }).build())
            .await?;
        let unique = IndexOptions::builder().unique(true).build();
        self.members()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;
        Ok(())
    }

    fn skills(&self) -> Collection<Skill> {
        self.db.collection(SKILLS)
    }

    fn members(&self) -> Collection<Member> {
        self.db.collection(MEMBERS)
    }

    fn projects(&self) -> Collection<Project> {
        self.db.collection(PROJECTS)
    }

    fn tasks(&self) -> Collection<Task> {
        self.db.collection(TASKS)
    }
}

impl SkillStore for MongoStore {
    async fn insert_skill(&self, skill: &Skill) -> StoreResult<()> {
        self.skills().insert_one(skill).await?;
        Ok(())
    }

    async fn get_skill(&self, id: &str) -> StoreResult<Option<Skill>> {
        Ok(self.skills().find_one(doc! { "_id": id }).await?)
    }

    async fn list_skills(&self) -> StoreResult<Vec<Skill>> {
        let cursor = self.skills().find(doc! {}).sort(doc! { "name": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }
}

impl MemberStore for MongoStore {
    async fn insert_member(&self, member: &Member) -> StoreResult<()> {
        self.members().insert_one(member).await?;
        Ok(())
    }

    async fn get_member(&self, id: &str) -> StoreResult<Option<Member>> {
        Ok(self.members().find_one(doc! { "_id": id }).await?)
    }

    async fn get_members(&self, ids: &[String]) -> StoreResult<Vec<Member>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .members()
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_members(&self) -> StoreResult<Vec<Member>> {
        let cursor = self.members().find(doc! {}).sort(doc! { "name": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn upsert_member_skill(
        &self,
        member_id: &str,
        skill: &MemberSkill,
    ) -> StoreResult<Option<Member>> {
        // $pull + $push on the skills array only, so a concurrent increment of
        // workload is never overwritten.
        self.members()
            .update_one(
                doc! { "_id": member_id },
                doc! { "$pull": { "skills": { "skillId": &skill.skill_id } } },
            )
            .await?;
        Ok(self
            .members()
            .find_one_and_update(
                doc! { "_id": member_id },
                doc! { "$push": { "skills": to_bson(skill)? } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn increment_workload(&self, member_id: &str, delta: f64) -> StoreResult<Option<Member>> {
        Ok(self
            .members()
            .find_one_and_update(
                doc! { "_id": member_id },
                // Pipeline update: add and round in one atomic document write.
                vec![doc! {
                    "$set": {
                        "workload": {
                            "$round": [
                                { "$add": [{ "$ifNull": ["$workload", 0.0] }, round_hours(delta)] },
                                2,
                            ]
                        }
                    }
                }],
            )
            .return_document(ReturnDocument::After)
            .await?)
    }
}

impl ProjectStore for MongoStore {
    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        self.projects().insert_one(project).await?;
        Ok(())
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.projects().find_one(doc! { "_id": id }).await?)
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let cursor = self
            .projects()
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn add_project_member(
        &self,
        project_id: &str,
        member: &ProjectMember,
    ) -> StoreResult<Option<Project>> {
        Ok(self
            .projects()
            .find_one_and_update(
                doc! { "_id": project_id, "members.userId": { "$ne": &member.user_id } },
                doc! { "$push": { "members": to_bson(member)? } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_project(&self, id: &str) -> StoreResult<bool> {
        let res = self.projects().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }
}

impl TaskStore for MongoStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.tasks().insert_one(task).await?;
        Ok(())
    }

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.tasks().find_one(doc! { "_id": id }).await?)
    }

    async fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        let cursor = self
            .tasks()
            .find(doc! { "projectId": project_id })
            .sort(doc! { "createdAt": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_assigned_member(
        &self,
        task_id: &str,
        member_id: Option<&str>,
        auto_assigned: bool,
    ) -> StoreResult<Option<Task>> {
        let now = to_bson(&chrono::Utc::now())?;
        Ok(self
            .tasks()
            .find_one_and_update(
                doc! { "_id": task_id },
                doc! {
                    "$set": {
                        "assignedTo": member_id,
                        "autoAssigned": auto_assigned,
                        "updatedAt": now,
                    },
                    "$inc": { "version": 1_i64 },
                },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn replace_task(&self, task: &Task, expected_version: i64) -> StoreResult<bool> {
        let res = self
            .tasks()
            .replace_one(doc! { "_id": &task.id, "version": expected_version }, task)
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn delete_task(&self, id: &str) -> StoreResult<bool> {
        let res = self.tasks().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }
}
