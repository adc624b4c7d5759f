use serde::Serialize;

use crate::models::task::TaskStatus;

/// Events pushed to a member's live sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    TaskAssigned {
        task_id: String,
        project_id: String,
        member_id: String,
        score: Option<f64>,
        auto: bool,
    },
    #[serde(rename_all = "camelCase")]
    TaskStatusChanged {
        task_id: String,
        member_id: String,
        status: TaskStatus,
    },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::TaskAssigned { member_id, .. }
            | Notification::TaskStatusChanged { member_id, .. } => member_id,
        }
    }
}

/// Publishes notifications to interested members. Handlers receive it through
/// `AppState`; publishing never fails the request that triggered it.
pub trait Notifier: Send + Sync {
    fn publish(&self, notification: Notification);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_serialize_with_a_type_tag() {
        let n = Notification::TaskAssigned {
            task_id: "t1".into(),
            project_id: "p1".into(),
            member_id: "m1".into(),
            score: Some(0.8),
            auto: true,
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "taskAssigned");
        assert_eq!(json["taskId"], "t1");
        assert_eq!(n.recipient(), "m1");
    }
}
