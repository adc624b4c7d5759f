use std::collections::HashMap;

use actix::prelude::*;
use log::{debug, info};

use crate::notifications::{Notification, Notifier};

/// A serialized notification delivered to one WebSocket session.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Push(pub String);

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub member_id: String,
    pub addr: Recipient<Push>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub member_id: String,
    pub addr: Recipient<Push>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Publish(pub Notification);

/// Routes notifications to every open session of their recipient.
#[derive(Default)]
pub struct NotificationServer {
    sessions: HashMap<String, Vec<Recipient<Push>>>,
}

impl Actor for NotificationServer {
    type Context = Context<Self>;
}

impl Handler<Connect> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        info!("Member {} connected for notifications", msg.member_id);
        self.sessions.entry(msg.member_id).or_default().push(msg.addr);
    }
}

impl Handler<Disconnect> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        if let Some(list) = self.sessions.get_mut(&msg.member_id) {
            list.retain(|r| r != &msg.addr);
            if list.is_empty() {
                self.sessions.remove(&msg.member_id);
            }
        }
        info!("Member {} disconnected", msg.member_id);
    }
}

impl Handler<Publish> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: Publish, _: &mut Context<Self>) {
        let Some(recipients) = self.sessions.get(msg.0.recipient()) else {
            debug!("No live session for {}; dropping {:?}", msg.0.recipient(), msg.0);
            return;
        };
        let payload = serde_json::to_string(&msg.0).unwrap_or_default();
        for recipient in recipients {
            recipient.do_send(Push(payload.clone()));
        }
    }
}

impl Notifier for Addr<NotificationServer> {
    fn publish(&self, notification: Notification) {
        self.do_send(Publish(notification));
    }
}
