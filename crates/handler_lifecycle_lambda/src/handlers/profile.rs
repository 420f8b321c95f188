use std::sync::Arc;

use async_trait::async_trait;
use handler_lifecycle_core::contract::{HttpRequest, HttpResponse, ResponseInput};
use handler_lifecycle_core::error::{HandlerError, RejectedError};
use handler_lifecycle_core::mediators::{Schema, TypedSchema};
use handler_lifecycle_core::{HttpHandler, HttpLogic, Lifecycle};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

pub const PROFILE_ROLES: &[&str] = &["admin", "member"];
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub display_name: String,
    #[serde(default)]
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: Option<String>,
}

/// `PUT /profiles/{user_id}`. Members may update only their own profile;
/// admins may update any.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateProfile;

#[async_trait]
impl HttpLogic for UpdateProfile {
    fn schema(&self) -> Arc<dyn Schema> {
        Arc::new(TypedSchema::<ProfileUpdate>::new("profile_update").path_parameter("user_id"))
    }

    async fn handle(&self, http: &HttpHandler<Self>) -> Result<HttpResponse, HandlerError> {
        http.check_access(PROFILE_ROLES).await?;
        let update: ProfileUpdate = http.parse_schema().await?;

        let user_id = http
            .event()
            .path_parameter("user_id")
            .ok_or_else(|| RejectedError::not_found("profile not found"))?;
        let is_admin = http.check_access(&[ADMIN_ROLE]).await.is_ok();
        if !is_admin && caller_subject(http.event()) != Some(user_id) {
            return Err(RejectedError::new(
                403,
                "forbidden",
                "members may only update their own profile",
            )
            .into());
        }

        Ok(http.format_response(ResponseInput::new(
            200,
            json!({
                "user_id": user_id,
                "display_name": update.display_name,
                "email": update.email,
                "updated_at": http.context().invocation().received_at.to_rfc3339(),
            }),
        )))
    }
}

fn caller_subject(event: &HttpRequest) -> Option<&str> {
    let authorizer = event.request_context.get("authorizer")?;
    authorizer
        .get("claims")
        .or_else(|| authorizer.get("jwt").and_then(|jwt| jwt.get("claims")))?
        .get("sub")?
        .as_str()
}
