//! HTTP API endpoint handlers.
//!
//! Handlers only translate between DTOs and commands/queries; every decision
//! is made behind the mediator.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::ListFilters,
    infrastructure::dto::http::{
        AddTelegramListenerRequest, ChatDto, CreateChatRequest, CreateMessageRequest, HealthDto, ListenerDto,
        MessageDto, PageDto, PaginationQuery,
    },
    ui::{error::ApiError, state::AppState},
    usecase::{
        AddTelegramListenerCommand, ApplicationError, CreateChatCommand, CreateMessageCommand, DeleteChatCommand,
        GetAllChatsListenersQuery, GetAllChatsQuery, GetChatDetailQuery, GetMessagesQuery,
        mediator::Command,
    },
};

type ApiResult<T> = Result<T, ApiError>;

/// Dispatch a command that has exactly one handler and return its output.
async fn execute<C: Command>(state: &AppState, command: C) -> ApiResult<C::Output> {
    state
        .mediator
        .dispatch_command(command)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ApiError(ApplicationError::HandlerNotRegistered {
                name: std::any::type_name::<C>(),
            })
        })
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateChatRequest>,
) -> ApiResult<(StatusCode, Json<ChatDto>)> {
    let chat = execute(&state, CreateChatCommand { title: request.title }).await?;
    Ok((StatusCode::CREATED, Json(ChatDto::from(&chat))))
}

pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Json<PageDto<ChatDto>>> {
    let filters = ListFilters::from(pagination);
    let (chats, count) = state.mediator.dispatch_query(GetAllChatsQuery { filters }).await?;
    Ok(Json(PageDto::new(
        chats.iter().map(ChatDto::from).collect(),
        count,
        filters,
    )))
}

pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_oid): Path<String>,
) -> ApiResult<Json<ChatDto>> {
    let chat = state.mediator.dispatch_query(GetChatDetailQuery { chat_oid }).await?;
    Ok(Json(ChatDto::from(&chat)))
}

pub async fn delete_chat(State(state): State<Arc<AppState>>, Path(chat_oid): Path<String>) -> ApiResult<StatusCode> {
    execute(&state, DeleteChatCommand { chat_oid }).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Path(chat_oid): Path<String>,
    Json(request): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageDto>)> {
    let source = request.source();
    let message = execute(
        &state,
        CreateMessageCommand {
            chat_oid,
            text: request.text,
            source,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(chat_oid): Path<String>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Json<PageDto<MessageDto>>> {
    let filters = ListFilters::from(pagination);
    let (messages, count) = state
        .mediator
        .dispatch_query(GetMessagesQuery { chat_oid, filters })
        .await?;
    Ok(Json(PageDto::new(
        messages.iter().map(MessageDto::from).collect(),
        count,
        filters,
    )))
}

pub async fn add_listener(
    State(state): State<Arc<AppState>>,
    Path(chat_oid): Path<String>,
    Json(request): Json<AddTelegramListenerRequest>,
) -> ApiResult<(StatusCode, Json<ListenerDto>)> {
    let listener = execute(
        &state,
        AddTelegramListenerCommand {
            chat_oid,
            telegram_chat_id: request.telegram_chat_id,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ListenerDto::from(&listener))))
}

pub async fn list_listeners(
    State(state): State<Arc<AppState>>,
    Path(chat_oid): Path<String>,
) -> ApiResult<Json<Vec<ListenerDto>>> {
    let listeners = state
        .mediator
        .dispatch_query(GetAllChatsListenersQuery { chat_oid })
        .await?;
    Ok(Json(listeners.iter().map(ListenerDto::from).collect()))
}
