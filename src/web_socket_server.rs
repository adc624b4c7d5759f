use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::{current_user, verify_token};
use crate::error::AppError;
use crate::models::parse_id;
use crate::notification_server::{Connect, Disconnect, NotificationServer, Push};
use crate::store::Store;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// One member's notification stream. Outbound only; inbound text is ignored.
pub struct NotificationSession {
    pub member_id: String,
    pub hb: Instant,
    pub server: Addr<NotificationServer>,
}

impl NotificationSession {
    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                warn!("Heartbeat timed out for member {}, disconnecting", act.member_id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for NotificationSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);
        self.server.do_send(Connect {
            member_id: self.member_id.clone(),
            addr: ctx.address().recipient(),
        });
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        self.server.do_send(Disconnect {
            member_id: self.member_id.clone(),
            addr: ctx.address().recipient(),
        });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for NotificationSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!("WebSocket error for member {}: {}", self.member_id, e);
                ctx.stop();
            }
            _ => {}
        }
    }
}

impl Handler<Push> for NotificationSession {
    type Result = ();

    fn handle(&mut self, msg: Push, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Bearer token for clients that cannot set headers on the upgrade request.
    pub token: Option<String>,
}

/// The authenticated subscriber: the bearer subject from the middleware, or
/// the `token` query parameter.
fn subscriber(req: &HttpRequest, query: &WsQuery, secret: &str) -> Result<String, AppError> {
    if let Ok(user_id) = current_user(req) {
        return Ok(user_id);
    }
    let token = query.token.as_deref().ok_or(AppError::Unauthorized)?;
    verify_token(token, secret).map_err(|e| {
        warn!("Rejected notification stream token: {}", e);
        AppError::Unauthorized
    })
}

/// GET /ws/{member_id}
/// Members may only subscribe to their own stream.
pub async fn ws_index<S: Store + 'static>(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState<S>>,
    member_id: web::Path<String>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, Error> {
    let member_id = parse_id(&member_id, "member")?;
    let subject = subscriber(&req, &query, &data.config.jwt_secret)?;
    if parse_id(&subject, "member").ok().as_deref() != Some(member_id.as_str()) {
        warn!("{} tried to subscribe to member {}'s notifications", subject, member_id);
        return Err(AppError::Forbidden(
            "Members can only subscribe to their own notifications".into(),
        )
        .into());
    }
    if data.store.get_member(&member_id).await.map_err(AppError::from)?.is_none() {
        return Ok(HttpResponse::NotFound().body("Member not found"));
    }
    info!("Opening notification stream for member {}", member_id);
    ws::start(
        NotificationSession {
            member_id,
            hb: Instant::now(),
            server: data.notification_server.clone(),
        },
        &req,
        stream,
    )
}
