//! Profile and preference HTTP handlers for the signed-in user.
//!
//! ```text
//! GET  /api/v1/users/me
//! PUT  /api/v1/users/me
//! GET  /api/v1/users/me/preferences
//! PUT  /api/v1/users/me/preferences
//! POST   /api/v1/organizers/{id}/follow
//! DELETE /api/v1/organizers/{id}/follow
//! ```

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::ParticipantProfileUpdate;
use crate::domain::{Error, Preferences, User, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_user_id};
use crate::inbound::http::ApiResult;

/// The signed-in user's profile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    pub interests: Vec<String>,
    pub followed_organizers: Vec<String>,
    pub created_at: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        let participant = user.participant;
        let organizer = user.organizer;
        Self {
            id: user.id.to_string(),
            email: user.email.to_string(),
            role: user.role.as_str().to_owned(),
            first_name: participant.as_ref().map(|p| p.first_name.clone()),
            last_name: participant.as_ref().map(|p| p.last_name.clone()),
            participant_type: participant.as_ref().map(|p| {
                match p.participant_type {
                    crate::domain::ParticipantType::Iiit => "IIIT".to_owned(),
                    crate::domain::ParticipantType::NonIiit => "Non-IIIT".to_owned(),
                }
            }),
            college: participant.as_ref().and_then(|p| p.college.clone()),
            organizer_name: organizer.as_ref().map(|o| o.organizer_name.clone()),
            contact_number: participant
                .as_ref()
                .and_then(|p| p.contact_number.clone())
                .or_else(|| organizer.as_ref().and_then(|o| o.contact_number.clone())),
            interests: user.preferences.interests,
            followed_organizers: user
                .preferences
                .followed_organizers
                .iter()
                .map(UserId::to_string)
                .collect(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Request payload for a participant profile edit.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub college: Option<String>,
    pub interests: Option<Vec<String>>,
}

/// Request payload for replacing preference data.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRequest {
    pub interests: Option<Vec<String>>,
    pub followed_organizers: Option<Vec<String>>,
}

/// Preference data for the signed-in user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub interests: Vec<String>,
    pub followed_organizers: Vec<String>,
}

impl From<Preferences> for PreferencesResponse {
    fn from(preferences: Preferences) -> Self {
        Self {
            interests: preferences.interests,
            followed_organizers: preferences
                .followed_organizers
                .iter()
                .map(UserId::to_string)
                .collect(),
        }
    }
}

fn parse_preferences_request(
    payload: PreferencesRequest,
) -> Result<(Vec<String>, Vec<UserId>), Error> {
    let interests = payload
        .interests
        .ok_or_else(|| missing_field_error("interests"))?;
    let followed = payload
        .followed_organizers
        .ok_or_else(|| missing_field_error("followedOrganizers"))?;
    let followed = followed
        .iter()
        .map(|raw| parse_user_id("followedOrganizers", raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((interests, followed))
}

/// Fetch the signed-in user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["users"],
    operation_id = "getProfile"
)]
#[get("/users/me")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let user = state.identity_query.profile(&actor.id).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user)))
}

/// Edit the signed-in participant's profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not a participant", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let payload = payload.into_inner();
    let user = state
        .identity
        .update_participant_profile(
            &actor.id,
            ParticipantProfileUpdate {
                first_name: payload.first_name,
                last_name: payload.last_name,
                contact_number: payload.contact_number,
                college: payload.college,
                interests: payload.interests,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user)))
}

/// Fetch the signed-in user's preferences.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/preferences",
    responses(
        (status = 200, description = "Preference data", body = PreferencesResponse),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["users"],
    operation_id = "getPreferences"
)]
#[get("/users/me/preferences")]
pub async fn get_preferences(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let preferences = state.identity_query.preferences(&actor.id).await?;
    Ok(HttpResponse::Ok().json(PreferencesResponse::from(preferences)))
}

/// Replace the signed-in user's preference data wholesale.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/preferences",
    request_body = PreferencesRequest,
    responses(
        (status = 200, description = "Updated preference data", body = PreferencesResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["users"],
    operation_id = "updatePreferences"
)]
#[put("/users/me/preferences")]
pub async fn update_preferences(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PreferencesRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let (interests, followed) = parse_preferences_request(payload.into_inner())?;
    let preferences = state
        .identity
        .set_preferences(&actor.id, interests, followed)
        .await?;
    Ok(HttpResponse::Ok().json(PreferencesResponse::from(preferences)))
}

/// Follow an organizer.
#[utoipa::path(
    post,
    path = "/api/v1/organizers/{id}/follow",
    params(("id" = String, Path, description = "Organizer identifier")),
    responses(
        (status = 204, description = "Following"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "No such organizer", body = Error)
    ),
    tags = ["organizers"],
    operation_id = "followOrganizer"
)]
#[post("/organizers/{id}/follow")]
pub async fn follow_organizer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let organizer = parse_user_id("id", &path.into_inner())?;
    state.identity.follow(&actor.id, &organizer).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Unfollow an organizer.
#[utoipa::path(
    delete,
    path = "/api/v1/organizers/{id}/follow",
    params(("id" = String, Path, description = "Organizer identifier")),
    responses(
        (status = 204, description = "No longer following"),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["organizers"],
    operation_id = "unfollowOrganizer"
)]
#[delete("/organizers/{id}/follow")]
pub async fn unfollow_organizer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let organizer = parse_user_id("id", &path.into_inner())?;
    state.identity.unfollow(&actor.id, &organizer).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EmailAddress, ParticipantProfile, ParticipantType, PasswordHash,
    };
    use rstest::rstest;

    #[rstest]
    fn preferences_payload_requires_both_arrays() {
        let err = parse_preferences_request(PreferencesRequest {
            interests: Some(vec![]),
            followed_organizers: None,
        })
        .expect_err("missing followedOrganizers");
        assert_eq!(
            err.details().expect("details")["field"],
            "followedOrganizers"
        );
    }

    #[rstest]
    fn preferences_payload_rejects_malformed_ids() {
        let err = parse_preferences_request(PreferencesRequest {
            interests: Some(vec![]),
            followed_organizers: Some(vec!["not-a-uuid".into()]),
        })
        .expect_err("bad id");
        assert_eq!(err.details().expect("details")["code"], "invalid_uuid");
    }

    #[rstest]
    fn profile_response_carries_participant_fields() {
        let user = User::participant(
            EmailAddress::new("ada@iiit.ac.in").expect("email"),
            PasswordHash::derive("pw"),
            ParticipantProfile {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                participant_type: ParticipantType::Iiit,
                college: Some("IIIT".into()),
                contact_number: None,
            },
        )
        .expect("user");

        let response = ProfileResponse::from(user);
        assert_eq!(response.role, "participant");
        assert_eq!(response.participant_type.as_deref(), Some("IIIT"));
        assert_eq!(response.organizer_name, None);
    }
}
