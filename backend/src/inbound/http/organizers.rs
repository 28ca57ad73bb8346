//! Organizer directory and organizer self-service HTTP handlers.
//!
//! ```text
//! GET /api/v1/organizers
//! GET /api/v1/organizers/me
//! PUT /api/v1/organizers/me
//! ```

use actix_web::{get, put, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{OrganizerListing, OrganizerProfileUpdate};
use crate::domain::{Error, Role, User};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// One row of the public organizer directory.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerResponse {
    pub id: String,
    pub organizer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_contact_email: Option<String>,
    /// Present only when the directory was fetched while signed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_followed: Option<bool>,
}

impl From<OrganizerListing> for OrganizerResponse {
    fn from(listing: OrganizerListing) -> Self {
        Self {
            id: listing.id.to_string(),
            organizer_name: listing.organizer_name,
            organizer_category: listing.organizer_category,
            organizer_description: listing.organizer_description,
            organizer_contact_email: listing.organizer_contact_email,
            is_followed: listing.is_followed,
        }
    }
}

/// The signed-in organizer's own profile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerProfileResponse {
    pub id: String,
    pub email: String,
    pub organizer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

impl TryFrom<User> for OrganizerProfileResponse {
    type Error = Error;

    fn try_from(user: User) -> Result<Self, Error> {
        let Some(profile) = user.organizer else {
            return Err(Error::forbidden("this account is not an organizer"));
        };
        Ok(Self {
            id: user.id.to_string(),
            email: user.email.to_string(),
            organizer_name: profile.organizer_name,
            organizer_category: profile.organizer_category,
            organizer_description: profile.organizer_description,
            organizer_contact_email: profile.organizer_contact_email,
            contact_number: profile.contact_number,
        })
    }
}

/// Request payload for an organizer profile edit.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizerRequest {
    pub organizer_name: Option<String>,
    pub organizer_category: Option<String>,
    pub organizer_description: Option<String>,
    pub organizer_contact_email: Option<String>,
    pub contact_number: Option<String>,
}

/// The public organizer directory. Signed-in viewers also see whether they
/// follow each organizer.
#[utoipa::path(
    get,
    path = "/api/v1/organizers",
    responses(
        (status = 200, description = "Organizer directory", body = [OrganizerResponse])
    ),
    tags = ["organizers"],
    security([]),
    operation_id = "listOrganizers"
)]
#[get("/organizers")]
pub async fn list_organizers(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let viewer = session.identity()?.map(|actor| actor.id);
    let listings = state
        .identity_query
        .organizer_directory(viewer.as_ref())
        .await?;
    let body: Vec<OrganizerResponse> = listings.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Fetch the signed-in organizer's profile.
#[utoipa::path(
    get,
    path = "/api/v1/organizers/me",
    responses(
        (status = 200, description = "Organizer profile", body = OrganizerProfileResponse),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not an organizer", body = Error)
    ),
    tags = ["organizers"],
    operation_id = "getOrganizerProfile"
)]
#[get("/organizers/me")]
pub async fn get_organizer_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let actor = session.require_role(Role::Organizer)?;
    let user = state.identity_query.profile(&actor.id).await?;
    Ok(HttpResponse::Ok().json(OrganizerProfileResponse::try_from(user)?))
}

/// Edit the signed-in organizer's profile.
#[utoipa::path(
    put,
    path = "/api/v1/organizers/me",
    request_body = UpdateOrganizerRequest,
    responses(
        (status = 200, description = "Updated organizer profile", body = OrganizerProfileResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not an organizer", body = Error)
    ),
    tags = ["organizers"],
    operation_id = "updateOrganizerProfile"
)]
#[put("/organizers/me")]
pub async fn update_organizer_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateOrganizerRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_role(Role::Organizer)?;
    let payload = payload.into_inner();
    let user = state
        .identity
        .update_organizer_profile(
            &actor.id,
            OrganizerProfileUpdate {
                organizer_name: payload.organizer_name,
                organizer_category: payload.organizer_category,
                organizer_description: payload.organizer_description,
                organizer_contact_email: payload.organizer_contact_email,
                contact_number: payload.contact_number,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(OrganizerProfileResponse::try_from(user)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailAddress, OrganizerProfile, PasswordHash, UserId};
    use rstest::rstest;

    #[rstest]
    fn listing_serialises_follow_flag_only_when_present() {
        let anonymous = OrganizerResponse::from(OrganizerListing {
            id: UserId::random(),
            organizer_name: "Robotics Club".into(),
            organizer_category: None,
            organizer_description: None,
            organizer_contact_email: None,
            is_followed: None,
        });
        let json = serde_json::to_value(&anonymous).expect("json");
        assert!(json.get("isFollowed").is_none());

        let signed_in = OrganizerResponse {
            is_followed: Some(true),
            ..anonymous
        };
        let json = serde_json::to_value(&signed_in).expect("json");
        assert_eq!(json["isFollowed"], true);
    }

    #[rstest]
    fn profile_response_rejects_non_organizers() {
        let user = User::organizer(
            EmailAddress::new("club@example.com").expect("email"),
            PasswordHash::derive("pw"),
            OrganizerProfile {
                organizer_name: "Robotics Club".into(),
                organizer_category: None,
                organizer_description: None,
                organizer_contact_email: None,
                contact_number: None,
            },
        )
        .expect("organizer");
        let response = OrganizerProfileResponse::try_from(user).expect("organizer profile");
        assert_eq!(response.organizer_name, "Robotics Club");
    }
}
