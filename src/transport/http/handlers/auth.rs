use crate::app::RegistrationRequest;
use crate::transport::http::types::{
    form_422, AppState, LoginForm, LoginResponseBody, RegisterForm,
    RegisterResponseBody,
};
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Form, Json};

#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "User registered (or already present)", body = RegisterResponseBody),
        (status = 400, description = "Unrecognized role or invalid username", body = crate::transport::http::types::ErrorResponse),
        (status = 403, description = "Bad registrar credentials or caller is not a registrar", body = crate::transport::http::types::ErrorResponse),
        (status = 500, description = "Registrar enrollment or user registration failed", body = crate::transport::http::types::ErrorResponse)
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> impl IntoResponse {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => {
            return form_422(e, "registrarUser, registrarPassword, username, password, role")
        }
    };

    let req = RegistrationRequest {
        registrar_user: form.registrar_user,
        registrar_password: form.registrar_password,
        username: form.username,
        password: form.password,
        role: form.role,
    };
    match state.service.register(req).await {
        Ok(reg) => (
            StatusCode::OK,
            Json(RegisterResponseBody {
                username: reg.username,
                roles: reg.roles,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Bearer token", body = LoginResponseBody),
        (status = 403, description = "Bad credentials or no ledger identity", body = crate::transport::http::types::ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> impl IntoResponse {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => return form_422(e, "username, password"),
    };

    match state.service.login(&form.username, &form.password).await {
        Ok(t) => (StatusCode::OK, Json(LoginResponseBody { token: t.token })).into_response(),
        Err(e) => e.into_response(),
    }
}
