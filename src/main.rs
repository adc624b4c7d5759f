// src/main.rs

#[cfg(test)]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(crate::auth::Authentication::new(crate::auth::testing::SECRET))
                .app_data(actix_web::web::Data::new($state))
                .configure(crate::configure::<crate::store::MemoryStore>),
        )
        .await
    };
}

mod app_state;
mod assignment;
mod auth;
mod config;
mod error;
mod member_management;
mod models;
mod notification_server;
mod notifications;
mod project;
mod skill;
mod store;
mod task;
mod web_socket_server;

use std::io;
use std::sync::Arc;

use actix::{Actor, Addr};
use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::info;

use crate::app_state::AppState;
use crate::auth::Authentication;
use crate::config::{Config, StoreBackend};
use crate::member_management::{add_member_skill, create_member, get_member, list_members};
use crate::notification_server::NotificationServer;
use crate::project::{
    add_project_member, create_project, delete_project, get_project, list_projects,
};
use crate::skill::{create_skill, list_skills};
use crate::store::{MemoryStore, MongoStore, Store};
use crate::task::{create_task, delete_task, get_task, list_tasks, update_task};
use crate::web_socket_server::ws_index;

/// Registers every route against the store type `S`.
pub fn configure<S: Store + 'static>(cfg: &mut web::ServiceConfig) {
    cfg
        // SKILLS
        .service(
            web::scope("/skills")
                .route("", web::post().to(create_skill::<S>))
                .route("", web::get().to(list_skills::<S>)),
        )
        // MEMBERS
        .service(
            web::scope("/members")
                .route("", web::post().to(create_member::<S>))
                .route("", web::get().to(list_members::<S>))
                .route("/{member_id}", web::get().to(get_member::<S>))
                .route("/{member_id}/skills", web::post().to(add_member_skill::<S>)),
        )
        // PROJECTS
        .service(
            web::scope("/projects")
                .route("", web::post().to(create_project::<S>))
                .route("", web::get().to(list_projects::<S>))
                .route("/{project_id}", web::get().to(get_project::<S>))
                .route("/{project_id}", web::delete().to(delete_project::<S>))
                .route("/{project_id}/members", web::post().to(add_project_member::<S>))
                // Tasks nested under "projects"
                .route("/{project_id}/tasks", web::post().to(create_task::<S>))
                .route("/{project_id}/tasks", web::get().to(list_tasks::<S>)),
        )
        // TASKS
        .service(
            web::scope("/tasks")
                .route("/{task_id}", web::get().to(get_task::<S>))
                .route("/{task_id}", web::put().to(update_task::<S>))
                .route("/{task_id}", web::delete().to(delete_task::<S>)),
        )
        // WEBSOCKET route for notifications
        .service(web::resource("/ws/{member_id}").route(web::get().to(ws_index::<S>)));
}

async fn run<S: Store + Send + Sync + 'static>(
    store: S,
    config: Config,
    notification_server: Addr<NotificationServer>,
) -> io::Result<()> {
    let state = AppState {
        store: Arc::new(store),
        notifier: Arc::new(notification_server.clone()),
        notification_server,
        config: config.clone(),
    };

    info!("Server running at http://{}", config.bind_addr);
    info!("Allowed CORS Origin: {}", config.frontend_origin);

    let frontend_origin = config.frontend_origin.clone();
    let jwt_secret = config.jwt_secret.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication::new(&jwt_secret))
            .app_data(web::Data::new(state.clone()))
            .configure(configure::<S>)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let notification_server = NotificationServer::default().start();

    match config.store_backend {
        StoreBackend::Mongo => {
            let uri = config.mongo_uri.clone().unwrap_or_default();
            let store = MongoStore::init(&uri, &config.database_name)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            info!("Using MongoDB database {}", config.database_name);
            run(store, config, notification_server).await
        }
        StoreBackend::Memory => {
            info!("Using the in-memory store; data is lost on exit");
            run(MemoryStore::new(), config, notification_server).await
        }
    }
}
