use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Extension, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use dashmap::DashMap;
use montyhall::*;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 三门问题游戏服务
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// 监听地址
    #[arg(long, default_value = "0.0.0.0:7654")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(Extension(Server::default()))
        .layer(TraceLayer::new_for_http());

    tracing::info!(addr = %args.addr, "listening");
    axum::Server::bind(&args.addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(server): Extension<Server>,
) -> impl IntoResponse {
    ws.on_upgrade(|s| async move {
        if let Err(e) = handle_ws(s, server).await {
            tracing::error!("Websocket error: {e}");
        }
    })
}

#[derive(Debug, Clone, Default)]
struct Server {
    sessions: Arc<DashMap<Uuid, Session>>,
}

#[derive(Debug)]
struct User {
    id: Uuid,
    role: Role,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Guest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Guest,
    /// 创建了会话，断开时会话随之关闭
    Owner { session: Uuid },
    /// 进入了别人的会话
    Visitor { session: Uuid },
}

impl Role {
    fn session(&self) -> Option<Uuid> {
        match self {
            Role::Guest => None,
            Role::Owner { session } | Role::Visitor { session } => Some(*session),
        }
    }
}

async fn handle_ws(mut socket: WebSocket, server: Server) -> anyhow::Result<()> {
    let mut user = User::default();
    tracing::info!(user = %user.id, "connected");

    while let Some(result) = socket.recv().await {
        match result? {
            Message::Text(request) => {
                let response = match serde_json::from_str::<GameRequest>(&request) {
                    // 自动模式是同步的 CPU 计算，不要占住异步工作线程
                    Ok(request) => {
                        tokio::task::block_in_place(|| dispatch(&server, &mut user, request))
                    }
                    Err(e) => {
                        tracing::warn!(user = %user.id, "bad request: {e}");
                        GameResponse::ServerError {
                            cause: ServerError::BadRequest {
                                reason: e.to_string(),
                            },
                        }
                    }
                };
                socket
                    .send(Message::Text(serde_json::to_string(&response)?))
                    .await?;
            }
            Message::Close(c) => {
                match c {
                    Some(c) => tracing::info!(
                        user = %user.id,
                        "Connection closed: code = {}, reason = {}",
                        c.code,
                        c.reason
                    ),
                    None => tracing::info!(user = %user.id, "Connection closed without close frame"),
                }
                break;
            }
            _ => {}
        }
    }

    if let Role::Owner { session } = user.role {
        server.sessions.remove(&session);
        tracing::info!(%session, "session closed on disconnect");
    }

    Ok(())
}

fn dispatch(server: &Server, user: &mut User, request: GameRequest) -> GameResponse {
    match request {
        GameRequest::CreateSession => match user.role {
            Role::Guest => {
                let id = Uuid::new_v4();
                server.sessions.insert(id, Session::new());
                user.role = Role::Owner { session: id };
                tracing::info!(user = %user.id, session = %id, "session created");
                GameResponse::SessionCreated { id }
            }
            _ => GameResponse::GameError {
                cause: Error::InvalidOperation,
            },
        },
        GameRequest::EnterSession { id } => match user.role {
            Role::Guest => match server.sessions.get(&id) {
                None => GameResponse::ServerError {
                    cause: ServerError::SessionNotFound { id },
                },
                Some(session) => {
                    user.role = Role::Visitor { session: id };
                    GameResponse::SessionEntered {
                        id,
                        summary: session.summary(),
                    }
                }
            },
            _ => GameResponse::GameError {
                cause: Error::InvalidOperation,
            },
        },
        GameRequest::CloseSession => match user.role {
            Role::Guest => GameResponse::GameError {
                cause: Error::InvalidOperation,
            },
            Role::Owner { session } => {
                server.sessions.remove(&session);
                user.role = Role::Guest;
                tracing::info!(user = %user.id, %session, "session closed");
                GameResponse::SessionClosed
            }
            Role::Visitor { .. } => {
                user.role = Role::Guest;
                GameResponse::SessionClosed
            }
        },
        request => with_session(server, user, |session| match request {
            GameRequest::Play {
                mode: Mode::Automatic,
                amount,
            } => {
                let report = session.play_automatic(amount.as_deref().unwrap_or(""))?;
                Ok(GameResponse::Automatic {
                    message: report.to_string(),
                    report,
                    summary: session.summary(),
                })
            }
            GameRequest::Play {
                mode: Mode::Mechanical,
                ..
            } => {
                let game = session.play_mechanical()?;
                Ok(GameResponse::Mechanical {
                    message: game.category.message(),
                    game,
                    summary: session.summary(),
                })
            }
            GameRequest::Play {
                mode: Mode::Player,
                ..
            } => {
                session.start_player()?;
                Ok(GameResponse::PlayerStarted)
            }
            GameRequest::Choose { door } => {
                let revealed = session.choose(door)?;
                let open = session.open_doors().ok_or(Error::InvalidOperation)?;
                Ok(GameResponse::Revealed {
                    chosen: door,
                    revealed,
                    open,
                })
            }
            GameRequest::Decide { door } => {
                let outcome = session.decide(door)?;
                Ok(GameResponse::Decided {
                    labels: outcome.trial.labels().map(|label| label.text()),
                    message: outcome.category.message(),
                    outcome,
                    summary: session.summary(),
                })
            }
            GameRequest::Statistics => {
                let summary = session.summary();
                Ok(GameResponse::Statistics {
                    text: summary.to_string(),
                    slices: summary.slices(),
                    summary,
                })
            }
            GameRequest::Log => Ok(GameResponse::Log {
                text: session.log(),
            }),
            GameRequest::Reset => {
                session.reset();
                Ok(GameResponse::Reset)
            }
            GameRequest::CreateSession
            | GameRequest::EnterSession { .. }
            | GameRequest::CloseSession => Err(Error::InvalidOperation),
        }),
    }
}

fn with_session<F>(server: &Server, user: &User, f: F) -> GameResponse
where
    F: FnOnce(&mut Session) -> Result<GameResponse>,
{
    let id = match user.role.session() {
        Some(id) => id,
        None => {
            return GameResponse::ServerError {
                cause: ServerError::NoSession,
            }
        }
    };
    match server.sessions.get_mut(&id) {
        None => GameResponse::ServerError {
            cause: ServerError::SessionNotFound { id },
        },
        Some(mut session) => {
            f(session.value_mut()).unwrap_or_else(|cause| GameResponse::GameError { cause })
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action")]
enum GameRequest {
    CreateSession,
    EnterSession { id: Uuid },
    CloseSession,
    Play { mode: Mode, amount: Option<String> },
    Choose { door: u32 },
    Decide { door: u32 },
    Statistics,
    Log,
    Reset,
}

#[derive(thiserror::Error, Debug, Serialize, Deserialize)]
enum ServerError {
    #[error("Session not found: {}", .id)]
    SessionNotFound { id: Uuid },
    #[error("No session entered")]
    NoSession,
    #[error("Bad request: {}", .reason)]
    BadRequest { reason: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "resp")]
enum GameResponse {
    SessionCreated {
        id: Uuid,
    },
    SessionEntered {
        id: Uuid,
        summary: OutcomeTally,
    },
    SessionClosed,
    Automatic {
        report: AutomaticReport,
        message: String,
        summary: OutcomeTally,
    },
    Mechanical {
        game: MechanicalGame,
        message: &'static str,
        summary: OutcomeTally,
    },
    PlayerStarted,
    Revealed {
        chosen: u32,
        revealed: u32,
        open: [u32; 2],
    },
    Decided {
        outcome: PlayerOutcome,
        labels: [&'static str; DOORS as usize],
        message: &'static str,
        summary: OutcomeTally,
    },
    Statistics {
        summary: OutcomeTally,
        text: String,
        slices: Vec<Slice>,
    },
    Log {
        text: String,
    },
    Reset,
    GameError {
        cause: Error,
    },
    ServerError {
        cause: ServerError,
    },
}
