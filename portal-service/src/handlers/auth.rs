use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::error::AppError;

use crate::{
    dtos::auth::{SigninRequest, SigninResponse, SignupRequest},
    models::{NewUser, SanitizedUser},
    policy::Role,
    services::SESSION_COOKIE,
    utils::{hash_password, verify_dummy_password, verify_password, Password, ValidatedJson},
    AppState,
};

/// Interns sign up active. Company staff sign up against an existing
/// company and stay inactive until an admin enables the account.
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<SanitizedUser>), AppError> {
    let role = req.role.unwrap_or(Role::Intern);

    let (company_id, is_active) = match role {
        Role::Admin => {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Admin accounts cannot be created by signup"
            )));
        }
        Role::Intern => {
            if req.company_id.is_some() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Interns join a company through an accepted application"
                )));
            }
            (None, true)
        }
        _ => {
            let company_id = req.company_id.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("company_id is required for {}", role))
            })?;
            if state.store.get_company(company_id).await?.is_none() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Company {} does not exist",
                    company_id
                )));
            }
            (Some(company_id), false)
        }
    };

    let password_hash = hash_password(&Password::new(req.password))?;

    let user = state
        .store
        .create_user(NewUser {
            email: req.email.trim().to_lowercase(),
            name: req.name.trim().to_string(),
            password_hash,
            role,
            company_id,
            is_active,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %role, is_active, "User signed up");

    Ok((StatusCode::CREATED, Json(user.sanitized())))
}

#[tracing::instrument(skip_all)]
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<SigninRequest>,
) -> Result<(CookieJar, Json<SigninResponse>), AppError> {
    let invalid = || AppError::Unauthorized(anyhow::anyhow!("Invalid email or password"));

    let password = Password::new(req.password);
    let Some(user) = state.store.get_user_by_email(req.email.trim()).await? else {
        verify_dummy_password(&password);
        tracing::warn!("Sign-in failed: unknown email");
        return Err(invalid());
    };

    if !verify_password(&password, &user.password_hash())? {
        tracing::warn!(user_id = %user.id, "Sign-in failed: wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Sign-in refused: account inactive");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Account is inactive")));
    }

    let token = state.tokens.issue(user.id)?;
    let ttl_seconds = state.tokens.ttl().num_seconds();

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_seconds))
        .build();

    tracing::info!(user_id = %user.id, role = %user.role(), "User signed in");

    Ok((
        jar.add(cookie),
        Json(SigninResponse {
            token,
            expires_in: ttl_seconds,
            user: user.sanitized(),
        }),
    ))
}

pub async fn signout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}
