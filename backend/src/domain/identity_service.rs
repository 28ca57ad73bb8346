//! Identity domain services: authentication, signup, profile and preference
//! edits, the organizer directory, and admin organizer provisioning.
//!
//! All of these operate on the one user keyspace, so a single service over
//! the user repository implements the four driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{
    AdminCommand, AuthenticatedIdentity, CreateOrganizerRequest, IdentityCommand, IdentityQuery,
    LoginService, OrganizerListing, OrganizerProfileUpdate, ParticipantProfileUpdate,
    RegisterParticipantRequest, UserPersistenceError, UserRepository,
};
use crate::domain::{
    EmailAddress, Error, LoginCredentials, OrganizerProfile, ParticipantProfile, PasswordHash,
    Preferences, Role, User, UserId, UserValidationError,
};

/// Identity service implementing the login, identity, and admin ports.
#[derive(Clone)]
pub struct IdentityService<U> {
    users: Arc<U>,
}

impl<U> IdentityService<U> {
    /// Create a new service over the user repository.
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

impl<U> IdentityService<U>
where
    U: UserRepository,
{
    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateEmail { email } => {
                Error::conflict(format!("email already registered: {email}")).with_details(json!({
                    "field": "email",
                    "code": "duplicate_email",
                }))
            }
        }
    }

    fn map_validation_error(error: UserValidationError) -> Error {
        let field = match &error {
            UserValidationError::MalformedEmail { .. }
            | UserValidationError::NonInstitutionalEmail => "email",
            UserValidationError::EmptyField { field } => field,
            UserValidationError::UnknownRole { .. } => "role",
            UserValidationError::UnknownParticipantType { .. } => "participantType",
        };
        Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
    }

    fn require_password(password: &str) -> Result<(), Error> {
        if password.is_empty() {
            return Err(
                Error::invalid_request("password must not be empty").with_details(json!({
                    "field": "password",
                })),
            );
        }
        Ok(())
    }

    async fn fetch(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn fetch_organizer(&self, id: &UserId) -> Result<User, Error> {
        let user = self.fetch(id).await?;
        if user.role != Role::Organizer {
            return Err(Error::not_found("organizer not found"));
        }
        Ok(user)
    }
}

#[async_trait]
impl<U> LoginService for IdentityService<U>
where
    U: UserRepository,
{
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedIdentity, Error> {
        // One failure message for every miss so responses never reveal
        // whether the email exists.
        let rejected = || Error::unauthorized("invalid email or password");

        let email = EmailAddress::new(credentials.email()).map_err(|_| rejected())?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(rejected)?;

        if !user.password.verify(credentials.password()) {
            return Err(rejected());
        }

        Ok(AuthenticatedIdentity {
            id: user.id,
            role: user.role,
        })
    }
}

#[async_trait]
impl<U> IdentityCommand for IdentityService<U>
where
    U: UserRepository,
{
    async fn register_participant(
        &self,
        request: RegisterParticipantRequest,
    ) -> Result<UserId, Error> {
        Self::require_password(&request.password)?;

        let profile = ParticipantProfile {
            first_name: request.first_name,
            last_name: request.last_name,
            participant_type: request.participant_type,
            college: request.college,
            contact_number: request.contact_number,
        };
        let mut user = User::participant(
            request.email,
            PasswordHash::derive(&request.password),
            profile,
        )
        .map_err(Self::map_validation_error)?;
        user.preferences.interests = request.interests;

        self.users
            .insert(&user)
            .await
            .map_err(Self::map_user_error)?;
        Ok(user.id)
    }

    async fn change_password(
        &self,
        user: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        Self::require_password(new_password)?;

        let mut record = self.fetch(user).await?;
        if !record.password.verify(current_password) {
            return Err(Error::unauthorized("current password is incorrect"));
        }

        record.password = PasswordHash::derive(new_password);
        self.users
            .update(&record)
            .await
            .map_err(Self::map_user_error)
    }

    async fn update_participant_profile(
        &self,
        user: &UserId,
        update: ParticipantProfileUpdate,
    ) -> Result<User, Error> {
        let mut record = self.fetch(user).await?;
        let Some(profile) = record.participant.as_mut() else {
            return Err(Error::forbidden("only participants may edit this profile"));
        };

        if let Some(first_name) = update.first_name {
            if first_name.trim().is_empty() {
                return Err(Self::map_validation_error(UserValidationError::EmptyField {
                    field: "firstName",
                }));
            }
            profile.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            if last_name.trim().is_empty() {
                return Err(Self::map_validation_error(UserValidationError::EmptyField {
                    field: "lastName",
                }));
            }
            profile.last_name = last_name;
        }
        if let Some(contact_number) = update.contact_number {
            profile.contact_number = Some(contact_number);
        }
        if let Some(college) = update.college {
            profile.college = Some(college);
        }
        if let Some(interests) = update.interests {
            record.preferences.interests = interests;
        }

        self.users
            .update(&record)
            .await
            .map_err(Self::map_user_error)?;
        Ok(record)
    }

    async fn update_organizer_profile(
        &self,
        user: &UserId,
        update: OrganizerProfileUpdate,
    ) -> Result<User, Error> {
        let mut record = self.fetch(user).await?;
        let Some(profile) = record.organizer.as_mut() else {
            return Err(Error::forbidden("only organizers may edit this profile"));
        };

        if let Some(organizer_name) = update.organizer_name {
            if organizer_name.trim().is_empty() {
                return Err(Self::map_validation_error(UserValidationError::EmptyField {
                    field: "organizerName",
                }));
            }
            profile.organizer_name = organizer_name;
        }
        if let Some(category) = update.organizer_category {
            profile.organizer_category = Some(category);
        }
        if let Some(description) = update.organizer_description {
            profile.organizer_description = Some(description);
        }
        if let Some(contact_email) = update.organizer_contact_email {
            profile.organizer_contact_email = Some(contact_email);
        }
        if let Some(contact_number) = update.contact_number {
            profile.contact_number = Some(contact_number);
        }

        self.users
            .update(&record)
            .await
            .map_err(Self::map_user_error)?;
        Ok(record)
    }

    async fn follow(&self, user: &UserId, organizer: &UserId) -> Result<(), Error> {
        self.fetch_organizer(organizer).await?;
        let mut record = self.fetch(user).await?;
        record.follow(organizer.clone());
        self.users
            .update(&record)
            .await
            .map_err(Self::map_user_error)
    }

    async fn unfollow(&self, user: &UserId, organizer: &UserId) -> Result<(), Error> {
        let mut record = self.fetch(user).await?;
        record.unfollow(organizer);
        self.users
            .update(&record)
            .await
            .map_err(Self::map_user_error)
    }

    async fn set_preferences(
        &self,
        user: &UserId,
        interests: Vec<String>,
        followed_organizers: Vec<UserId>,
    ) -> Result<Preferences, Error> {
        // Partially invalid follow lists are rejected as a unit before any
        // state changes.
        let mut validated = std::collections::BTreeSet::new();
        for organizer in followed_organizers {
            match self.fetch_organizer(&organizer).await {
                Ok(_) => {
                    validated.insert(organizer);
                }
                Err(err) if err.code() == crate::domain::ErrorCode::NotFound => {
                    return Err(Error::invalid_request("followedOrganizers contains an unknown organizer")
                        .with_details(json!({
                            "field": "followedOrganizers",
                            "organizerId": organizer.to_string(),
                        })));
                }
                Err(err) => return Err(err),
            }
        }

        let mut record = self.fetch(user).await?;
        record.preferences = Preferences {
            interests,
            followed_organizers: validated,
        };
        self.users
            .update(&record)
            .await
            .map_err(Self::map_user_error)?;
        Ok(record.preferences)
    }
}

#[async_trait]
impl<U> IdentityQuery for IdentityService<U>
where
    U: UserRepository,
{
    async fn profile(&self, user: &UserId) -> Result<User, Error> {
        self.fetch(user).await
    }

    async fn preferences(&self, user: &UserId) -> Result<Preferences, Error> {
        Ok(self.fetch(user).await?.preferences)
    }

    async fn organizer_directory(
        &self,
        viewer: Option<&UserId>,
    ) -> Result<Vec<OrganizerListing>, Error> {
        let follows = match viewer {
            Some(id) => Some(self.fetch(id).await?.preferences.followed_organizers),
            None => None,
        };

        let mut listings: Vec<OrganizerListing> = self
            .users
            .list_by_role(Role::Organizer)
            .await
            .map_err(Self::map_user_error)?
            .into_iter()
            .filter_map(|user| {
                let profile = user.organizer?;
                Some(OrganizerListing {
                    is_followed: follows.as_ref().map(|set| set.contains(&user.id)),
                    id: user.id,
                    organizer_name: profile.organizer_name,
                    organizer_category: profile.organizer_category,
                    organizer_description: profile.organizer_description,
                    organizer_contact_email: profile.organizer_contact_email,
                })
            })
            .collect();
        listings.sort_by(|a, b| a.organizer_name.cmp(&b.organizer_name));
        Ok(listings)
    }
}

#[async_trait]
impl<U> AdminCommand for IdentityService<U>
where
    U: UserRepository,
{
    async fn create_organizer(&self, request: CreateOrganizerRequest) -> Result<UserId, Error> {
        Self::require_password(&request.password)?;

        let profile = OrganizerProfile {
            organizer_name: request.organizer_name,
            organizer_category: request.organizer_category,
            organizer_description: request.organizer_description,
            organizer_contact_email: request.organizer_contact_email,
            contact_number: None,
        };
        let user = User::organizer(
            request.login_email,
            PasswordHash::derive(&request.password),
            profile,
        )
        .map_err(Self::map_validation_error)?;

        self.users
            .insert(&user)
            .await
            .map_err(Self::map_user_error)?;
        Ok(user.id)
    }

    async fn remove_organizer(&self, organizer: &UserId) -> Result<(), Error> {
        self.fetch_organizer(organizer).await?;
        let deleted = self
            .users
            .delete(organizer)
            .await
            .map_err(Self::map_user_error)?;
        if !deleted {
            return Err(Error::not_found("organizer not found"));
        }
        Ok(())
    }

    async fn reset_organizer_password(
        &self,
        organizer: &UserId,
        new_password: &str,
    ) -> Result<(), Error> {
        Self::require_password(new_password)?;

        let mut record = self.fetch_organizer(organizer).await?;
        record.password = PasswordHash::derive(new_password);
        self.users
            .update(&record)
            .await
            .map_err(Self::map_user_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockUserRepository;
    use crate::domain::{ErrorCode, ParticipantType};
    use mockall::predicate::eq;
    use rstest::rstest;

    fn participant(email: &str, password: &str) -> User {
        User::participant(
            EmailAddress::new(email).expect("email"),
            PasswordHash::derive(password),
            ParticipantProfile {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                participant_type: ParticipantType::NonIiit,
                college: None,
                contact_number: None,
            },
        )
        .expect("participant")
    }

    fn organizer(email: &str) -> User {
        User::organizer(
            EmailAddress::new(email).expect("email"),
            PasswordHash::derive("pw"),
            OrganizerProfile {
                organizer_name: "Robotics Club".into(),
                organizer_category: Some("technical".into()),
                organizer_description: None,
                organizer_contact_email: None,
                contact_number: None,
            },
        )
        .expect("organizer")
    }

    #[rstest]
    #[actix_rt::test]
    async fn authenticate_accepts_valid_credentials() {
        let user = participant("ada@example.com", "hunter2");
        let expected = user.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .with(eq(expected.email.clone()))
            .returning(move |_| Ok(Some(user.clone())));

        let service = IdentityService::new(Arc::new(repo));
        let credentials = LoginCredentials::try_from_parts("Ada@Example.com", "hunter2")
            .expect("credentials");
        let identity = service.authenticate(&credentials).await.expect("identity");
        assert_eq!(identity.id, expected.id);
        assert_eq!(identity.role, Role::Participant);
    }

    #[rstest]
    #[actix_rt::test]
    async fn authenticate_rejects_wrong_password_and_unknown_email_alike() {
        let user = participant("ada@example.com", "hunter2");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |email| match email.as_str() {
                "ada@example.com" => Ok(Some(user.clone())),
                _ => Ok(None),
            });

        let service = IdentityService::new(Arc::new(repo));

        let wrong_password = LoginCredentials::try_from_parts("ada@example.com", "nope")
            .expect("credentials");
        let err = service
            .authenticate(&wrong_password)
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        let wrong_message = err.message().to_owned();

        let unknown = LoginCredentials::try_from_parts("ghost@example.com", "nope")
            .expect("credentials");
        let err = service.authenticate(&unknown).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), wrong_message);
    }

    #[rstest]
    #[actix_rt::test]
    async fn register_maps_duplicate_email_to_conflict() {
        let mut repo = MockUserRepository::new();
        repo.expect_insert()
            .returning(|_| Err(UserPersistenceError::duplicate_email("ada@example.com")));

        let service = IdentityService::new(Arc::new(repo));
        let err = service
            .register_participant(RegisterParticipantRequest {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: EmailAddress::new("ada@example.com").expect("email"),
                password: "hunter2".into(),
                participant_type: ParticipantType::NonIiit,
                college: None,
                contact_number: None,
                interests: vec!["robotics".into()],
            })
            .await
            .expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[actix_rt::test]
    async fn follow_requires_an_organizer_target() {
        let target = participant("peer@example.com", "pw");
        let target_id = target.id.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(target_id.clone()))
            .returning(move |_| Ok(Some(target.clone())));

        let service = IdentityService::new(Arc::new(repo));
        let err = service
            .follow(&UserId::random(), &target_id)
            .await
            .expect_err("participants cannot be followed");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[actix_rt::test]
    async fn directory_flags_follows_for_signed_in_viewers() {
        let org_a = organizer("a@clubs.example.com");
        let org_b = organizer("b@clubs.example.com");
        let mut viewer = participant("ada@example.com", "pw");
        viewer.follow(org_a.id.clone());
        let viewer_id = viewer.id.clone();
        let followed = org_a.id.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(viewer_id.clone()))
            .returning(move |_| Ok(Some(viewer.clone())));
        repo.expect_list_by_role()
            .with(eq(Role::Organizer))
            .returning(move |_| Ok(vec![org_a.clone(), org_b.clone()]));

        let service = IdentityService::new(Arc::new(repo));
        let listings = service
            .organizer_directory(Some(&viewer_id))
            .await
            .expect("directory");
        assert_eq!(listings.len(), 2);
        for listing in &listings {
            assert_eq!(listing.is_followed, Some(listing.id == followed));
        }
    }

    #[rstest]
    #[actix_rt::test]
    async fn directory_omits_flags_for_anonymous_viewers() {
        let org = organizer("a@clubs.example.com");
        let mut repo = MockUserRepository::new();
        repo.expect_list_by_role()
            .returning(move |_| Ok(vec![org.clone()]));

        let service = IdentityService::new(Arc::new(repo));
        let listings = service.organizer_directory(None).await.expect("directory");
        assert_eq!(listings[0].is_followed, None);
    }

    #[rstest]
    #[actix_rt::test]
    async fn set_preferences_rejects_unknown_organizers_as_a_unit() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_update().never();

        let service = IdentityService::new(Arc::new(repo));
        let err = service
            .set_preferences(&UserId::random(), vec![], vec![UserId::random()])
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[actix_rt::test]
    async fn change_password_verifies_the_current_one() {
        let user = participant("ada@example.com", "old-pw");
        let user_id = user.id.clone();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_update().never();

        let service = IdentityService::new(Arc::new(repo));
        let err = service
            .change_password(&user_id, "wrong", "new-pw")
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
