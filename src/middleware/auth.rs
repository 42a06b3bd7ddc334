use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::str::FromStr;

use crate::core::AppError;

pub const TENANT_HEADER: &str = "X-Tenant-ID";
pub const ROLE_HEADER: &str = "X-Caller-Role";

/// Permission tier resolved by the upstream authentication layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    User,
    Admin,
    Superadmin,
}

impl CallerRole {
    /// Admins may edit settled invoices
    pub fn is_elevated(&self) -> bool {
        matches!(self, CallerRole::Admin | CallerRole::Superadmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallerRole::User => "user",
            CallerRole::Admin => "admin",
            CallerRole::Superadmin => "superadmin",
        }
    }
}

impl std::fmt::Display for CallerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallerRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "employee" => Ok(CallerRole::User),
            "admin" => Ok(CallerRole::Admin),
            "superadmin" => Ok(CallerRole::Superadmin),
            _ => Err(format!("Invalid caller role: {}", s)),
        }
    }
}

/// Who is calling and on behalf of which company.
///
/// Passed explicitly into every service call instead of being looked up
/// from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub tenant_id: String,
    pub role: CallerRole,
}

impl CallerContext {
    pub fn new(tenant_id: impl Into<String>, role: CallerRole) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            role,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Read the context headers set by the authentication gateway
    pub fn from_headers(headers: &HeaderMap) -> crate::core::Result<Self> {
        let tenant_id = headers
            .get(TENANT_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::unauthorized("Missing X-Tenant-ID header"))?;

        let role = match headers.get(ROLE_HEADER).and_then(|h| h.to_str().ok()) {
            Some(raw) => raw.parse().map_err(AppError::unauthorized)?,
            None => CallerRole::User,
        };

        Ok(Self::new(tenant_id, role))
    }
}

impl FromRequest for CallerContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req.headers()))
    }
}
