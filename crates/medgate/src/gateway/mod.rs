//! HTTP gateway: axum server, chat handlers, and upstream model client

mod chat;
mod server;
mod sse;
mod upstream;

pub use chat::{ChatReply, ChatRequest, chat_handler, create_chat_handler, quick_title};
pub use server::{AppState, GatewayServer, build_state, create_router};
pub use sse::{DONE_FRAME, SseEvent, SseFrameBuffer, data_frame, delta_content, parse_sse_events};
pub use upstream::UpstreamClient;
