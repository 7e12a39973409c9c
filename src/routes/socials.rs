/**
 * Socials Routes
 * Public list of social links with their resolved icons
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Social, SocialIcon};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSocial {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    /// Key as entered in the admin.
    pub icon_key: String,
    pub icon: SocialIcon,
    pub order: i32,
}

impl From<Social> for PublicSocial {
    fn from(social: Social) -> Self {
        Self {
            icon: SocialIcon::resolve(&social.icon),
            id: social.id,
            name: social.name,
            url: social.url,
            icon_key: social.icon,
            order: social.order,
        }
    }
}

/// GET /api/socials
pub async fn list_socials(State(state): State<AppState>) -> ApiResult<Json<Vec<PublicSocial>>> {
    let socials = state
        .store()
        .socials()
        .list()
        .await
        .map_err(|e| ApiError::from_store(e, "Social"))?;

    Ok(Json(socials.into_iter().map(PublicSocial::from).collect()))
}

#[cfg(test)]
mod tests {
    use crate::db::models::SocialInput;
    use crate::test_support::{send, test_state};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_socials_carry_resolved_icons_in_order() {
        let (state, _) = test_state();
        for (name, icon, order) in [("GitHub", "github", 2), ("Telegram", "Telegram", 1)] {
            state
                .store()
                .socials()
                .create(SocialInput {
                    name: name.to_string(),
                    url: format!("https://example.com/{icon}"),
                    icon: icon.to_string(),
                    order,
                })
                .await
                .unwrap();
        }
        let app = crate::create_app(state);

        let (status, body) = send(&app, Method::GET, "/api/socials", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let socials = body.as_array().unwrap();
        assert_eq!(socials[0]["name"], "Telegram");
        assert_eq!(socials[0]["icon"], json!({ "kind": "telegram" }));
        assert_eq!(socials[1]["icon"], json!({ "kind": "letter", "letter": "G" }));
        assert_eq!(socials[1]["iconKey"], "github");
    }
}
