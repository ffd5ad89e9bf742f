use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use backup_core::auth::Principal;
use std::convert::Infallible;

/// Header set by the authenticating proxy in front of the admin panel.
pub const ADMIN_EMAIL_HEADER: &str = "x-admin-email";

/// Whoever the upstream gate says is calling, if anyone.
pub struct Caller(pub Option<Principal>);

impl Caller {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .headers
            .get(ADMIN_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Principal::new);
        Ok(Caller(principal))
    }
}
