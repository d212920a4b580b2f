use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    claims::TokenKind,
    dto::{AuthResponse, ConfirmResetRequest, SignupRequest},
    jwt::JwtKeys,
    oauth::GoogleProfile,
    password::{check_new_password, hash_password, verify_password},
    repo::{Provider, User, UserRecord},
};
use crate::{
    error::{AppError, AppResult},
    mailer::Mailer,
    store::DocumentStore,
};

pub const RESET_SENT: &str = "Password reset email sent! Check your inbox.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Local checks run before anything touches the store.
pub fn validate_signup(req: &SignupRequest) -> AppResult<()> {
    if req.display_name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.password.is_empty()
        || req.confirm_password.is_empty()
    {
        return Err(AppError::validation("Please fill in all required fields."));
    }
    check_new_password(&req.password, &req.confirm_password)?;
    if !is_valid_email(&normalize_email(&req.email)) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(())
}

pub async fn sign_up(store: &dyn DocumentStore, req: SignupRequest) -> AppResult<User> {
    validate_signup(&req)?;
    let email = normalize_email(&req.email);

    if User::find_by_email(store, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&req.password)?;
    let user = User::create(
        store,
        UserRecord {
            email,
            display_name: Some(req.display_name.trim().to_string()),
            password_hash: Some(hash),
            provider: Provider::Password,
            ..Default::default()
        },
    )
    .await?;
    info!(user_id = %user.id, email = %user.record.email, "user registered");
    Ok(user)
}

pub async fn sign_in(store: &dyn DocumentStore, email: &str, password: &str) -> AppResult<User> {
    let email = normalize_email(email);
    if !is_valid_email(&email) || password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let Some(user) = User::find_by_email(store, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };
    let Some(hash) = user.record.password_hash.as_deref() else {
        warn!(user_id = %user.id, "login with password on oauth-only account");
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(password, hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, %email, "user logged in");
    Ok(user)
}

pub fn issue_tokens(keys: &JwtKeys, user: &User) -> AppResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id, user.record.session_epoch)?,
        refresh_token: keys.sign_refresh(user.id, user.record.session_epoch)?,
        user: user.session_user(),
    })
}

/// Mail a reset link to password accounts. Unknown and OAuth-only addresses
/// are skipped silently so the answer never reveals who is registered.
pub async fn request_password_reset(
    store: &dyn DocumentStore,
    keys: &JwtKeys,
    mailer: &dyn Mailer,
    base_url: &str,
    email: &str,
) -> AppResult<()> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::validation(
            "Failed to send reset email. Please check your email.",
        ));
    }

    match User::find_by_email(store, &email).await? {
        Some(user) if user.record.password_hash.is_some() => {
            let token = keys.sign(user.id, TokenKind::Reset)?;
            let link = format!(
                "{}/reset-password?token={}",
                base_url.trim_end_matches('/'),
                token
            );
            mailer.send_password_reset(&email, &link).await?;
            info!(user_id = %user.id, "password reset requested");
        }
        _ => warn!(%email, "password reset for unknown or oauth-only account"),
    }
    Ok(())
}

pub async fn confirm_password_reset(
    store: &dyn DocumentStore,
    keys: &JwtKeys,
    req: ConfirmResetRequest,
) -> AppResult<User> {
    check_new_password(&req.password, &req.confirm_password)?;
    let claims = keys
        .verify_kind(&req.token, TokenKind::Reset)
        .map_err(|_| AppError::validation("Reset link is invalid or has expired."))?;

    let mut user = User::find_by_id(store, claims.sub)
        .await?
        .ok_or_else(|| AppError::validation("Reset link is invalid or has expired."))?;
    user.record.password_hash = Some(hash_password(&req.password)?);
    user.end_sessions();
    let user = user.save(store).await?;
    info!(user_id = %user.id, "password reset");
    Ok(user)
}

/// Find the account behind a Google profile, linking by email when the
/// address is verified, or create one.
pub async fn upsert_google_user(store: &dyn DocumentStore, profile: &GoogleProfile) -> AppResult<User> {
    if let Some(mut user) = User::find_by_subject(store, Provider::Google, &profile.sub).await? {
        user.record.display_name = profile.name.clone().or(user.record.display_name);
        user.record.photo_url = profile.picture.clone().or(user.record.photo_url);
        return Ok(user.save(store).await?);
    }

    let email = normalize_email(&profile.email);
    if profile.email_verified {
        if let Some(mut user) = User::find_by_email(store, &email).await? {
            user.record.provider = Provider::Google;
            user.record.provider_subject = Some(profile.sub.clone());
            if user.record.photo_url.is_none() {
                user.record.photo_url = profile.picture.clone();
            }
            info!(user_id = %user.id, "google account linked");
            return Ok(user.save(store).await?);
        }
    } else if User::find_by_email(store, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let user = User::create(
        store,
        UserRecord {
            email,
            display_name: profile.name.clone(),
            photo_url: profile.picture.clone(),
            password_hash: None,
            provider: Provider::Google,
            provider_subject: Some(profile.sub.clone()),
            session_epoch: 0,
        },
    )
    .await?;
    info!(user_id = %user.id, "user registered with google");
    Ok(user)
}
