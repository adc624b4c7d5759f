use std::sync::Arc;

use actix::Addr;

use crate::config::Config;
use crate::notification_server::NotificationServer;
use crate::notifications::Notifier;

pub struct AppState<S> {
    pub store: Arc<S>,
    pub config: Config,
    pub notifier: Arc<dyn Notifier>,
    pub notification_server: Addr<NotificationServer>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            notifier: self.notifier.clone(),
            notification_server: self.notification_server.clone(),
        }
    }
}
