use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_auth::{Role, create_access_token, create_refresh_token, verify_refresh_token};
use campusdesk_config::{JwtConfig, RegistrationConfig};
use campusdesk_core::{AppError, hash_password, verify_password};
use campusdesk_models::users::{User, UserCredentials, role_from_email};

use crate::metrics::{
    track_jwt_issued, track_user_created, track_user_login_failure, track_user_login_success,
};
use crate::modules::is_unique_violation;
use crate::modules::users::service::{USER_COLUMNS, UserService};

use super::model::{LoginRequest, LoginResponse, RegisterRequest};

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn register_user(
        db: &PgPool,
        config: &RegistrationConfig,
        dto: RegisterRequest,
    ) -> Result<User, AppError> {
        if !config.enabled {
            return Err(AppError::forbidden("Self-registration is disabled"));
        }

        let role = role_from_email(&dto.email).ok_or_else(|| {
            AppError::unprocessable(anyhow::anyhow!(
                "Email must carry a role tag, e.g. name.staff@… or name.student@…"
            ))
        })?;

        if role == Role::Administrator && !config.allow_admin_self_registration {
            return Err(AppError::forbidden(
                "Administrator accounts cannot self-register",
            ));
        }

        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (first_name, last_name, email, password, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(role)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::conflict(anyhow::anyhow!("Email already exists"));
            }
            AppError::from(e)
        })?;

        track_user_created(role.as_str());
        tracing::info!(user_id = %user.id, role = %role, "User registered");

        Ok(user)
    }

    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, role, password FROM users WHERE email = $1",
        )
        .bind(dto.email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;

        let Some(credentials) = credentials else {
            track_user_login_failure("unknown_email");
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if !verify_password(&dto.password, &credentials.password)? {
            track_user_login_failure("wrong_password");
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        let user = UserService::get_user(db, credentials.id.into_inner()).await?;
        track_user_login_success(user.role.as_str());

        Self::issue_tokens(user, jwt_config)
    }

    /// Exchanges a refresh token for a fresh token pair. The account must still exist.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

        Self::issue_tokens(user, jwt_config)
    }

    fn issue_tokens(user: User, jwt_config: &JwtConfig) -> Result<LoginResponse, AppError> {
        let id = user.id.into_inner();
        let access_token = create_access_token(id, user.email.as_str(), user.role, jwt_config)?;
        let refresh_token = create_refresh_token(id, user.email.as_str(), jwt_config)?;
        track_jwt_issued();

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            landing: user.role.landing().to_string(),
            user,
        })
    }
}
