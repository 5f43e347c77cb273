//! Auth capability and the header/anonymous implementations
//!
//! Credential verification proper happens upstream (reverse proxy or SSO);
//! this capability only turns request headers into a [`User`]. Anonymous
//! mode serves single-user installs: every request is the same admin user.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::http::HeaderMap;
use pivot_core::{Role, User};

/// Header carrying a comma-separated role list in header mode
pub const ROLES_HEADER: &str = "x-pivot-roles";

/// Resolves the requesting user from request headers
#[async_trait]
pub trait Auth: Send + Sync {
    /// Establish the user for this request, or reject it
    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, ApiError>;
}

/// Header-based auth, or anonymous when no header is configured
pub struct HeaderAuth {
    user_header: Option<String>,
}

impl HeaderAuth {
    /// `user_header` is the configured trusted header name; `None` selects
    /// anonymous mode
    pub fn new(user_header: Option<String>) -> Self {
        HeaderAuth { user_header }
    }
}

#[async_trait]
impl Auth for HeaderAuth {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let Some(header_name) = &self.user_header else {
            return Ok(User::new("anonymous", [Role::admin()]));
        };

        let user_id = headers
            .get(header_name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("missing {header_name} header"))
            })?;

        let roles: Vec<Role> = headers
            .get(ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|csv| {
                csv.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(Role::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(User::new(user_id, roles))
    }
}
