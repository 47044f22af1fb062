//! Account service: signup, login, profiles and document uploads.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{NaiveDate, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;
use volunteer_common::{
    AppError, AppResult, Config, IdGenerator, StorageBackend, UploadKind, UploadedFile,
    generate_storage_key,
};
use volunteer_db::{
    entities::{
        admin, json_list,
        organiser::{self, VerificationStatus},
        user::{self, UserRole, UserStatus},
        volunteer,
    },
    repositories::{AdminRepository, OrganiserRepository, UserRepository, VolunteerRepository},
};

/// Roles that may sign up themselves. Admins are provisioned out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupRole {
    Volunteer,
    Organiser,
}

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    pub role: SignupRole,

    /// Volunteer display name
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub organisation_name: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    pub dob: Option<NaiveDate>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub preferred_causes: Vec<String>,

    #[validate(length(max = 4096))]
    pub description: Option<String>,
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Input for editing the caller's profile. Omitted fields are unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub skills: Option<Vec<String>>,
    pub preferred_causes: Option<Vec<String>>,
    #[validate(length(min = 1, max = 256))]
    pub organisation_name: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
}

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// The role-specific profile of an account.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", content = "profile", rename_all = "snake_case")]
pub enum Profile {
    Volunteer(volunteer::Model),
    Organiser(organiser::Model),
    Admin(admin::Model),
    /// Account without a profile row
    Missing,
}

/// Account plus profile.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub user: user::Model,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Result of signup or login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(flatten)]
    pub account: AccountView,
}

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Sign a token for a user.
    pub fn issue(&self, user: &user::Model) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl_hours * 3600,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    volunteer_repo: VolunteerRepository,
    organiser_repo: OrganiserRepository,
    admin_repo: AdminRepository,
    storage: Arc<dyn StorageBackend>,
    tokens: TokenIssuer,
    id_gen: IdGenerator,
    max_upload_bytes: usize,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> Self {
        Self {
            user_repo: UserRepository::new(Arc::clone(&db)),
            volunteer_repo: VolunteerRepository::new(Arc::clone(&db)),
            organiser_repo: OrganiserRepository::new(Arc::clone(&db)),
            admin_repo: AdminRepository::new(Arc::clone(&db)),
            db,
            storage,
            tokens: TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_hours),
            id_gen: IdGenerator::new(),
            max_upload_bytes: config.storage.max_upload_bytes,
        }
    }

    /// Create a user and its profile in one transaction.
    pub async fn signup(&self, input: SignupInput) -> AppResult<AuthSession> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let now = Utc::now();
        let user_id = self.id_gen.generate();
        let role = match input.role {
            SignupRole::Volunteer => UserRole::Volunteer,
            SignupRole::Organiser => UserRole::Organiser,
        };

        let txn = volunteer_db::begin(&self.db).await?;

        let user = UserRepository::create_in(
            &txn,
            user::ActiveModel {
                id: Set(user_id.clone()),
                email: Set(email),
                password_hash: Set(hash_password(&input.password)?),
                role: Set(role),
                status: Set(UserStatus::Active),
                profile_picture: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(None),
            },
        )
        .await?;

        let profile = match input.role {
            SignupRole::Volunteer => {
                let name = required(input.name, "name")?;
                let model = volunteer::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.clone()),
                    name: Set(name),
                    phone: Set(input.phone),
                    dob: Set(input.dob),
                    skills: Set(json_list(clean_list(input.skills))),
                    preferred_causes: Set(json_list(clean_list(input.preferred_causes))),
                    nric_image: Set(None),
                    nric_verified: Set(false),
                    nric_rejection_reason: Set(None),
                    nric_requires_reupload: Set(false),
                    nric_uploaded_at: Set(None),
                    created_at: Set(now.into()),
                    updated_at: Set(None),
                };
                Profile::Volunteer(VolunteerRepository::create_in(&txn, model).await?)
            }
            SignupRole::Organiser => {
                let organisation_name = required(input.organisation_name, "organisation_name")?;
                let model = organiser::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.clone()),
                    organisation_name: Set(organisation_name),
                    phone: Set(input.phone),
                    description: Set(input.description),
                    verification_status: Set(VerificationStatus::Pending),
                    verification_rejection_reason: Set(None),
                    certification_document: Set(None),
                    certification_verified: Set(false),
                    created_at: Set(now.into()),
                    updated_at: Set(None),
                };
                Profile::Organiser(OrganiserRepository::create_in(&txn, model).await?)
            }
        };

        volunteer_db::commit(txn).await?;

        info!(user_id = %user.id, role = ?user.role, "Account created");

        let token = self.tokens.issue(&user)?;
        Ok(AuthSession {
            token,
            account: AccountView { user, profile },
        })
    }

    /// Check credentials and issue a token.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthSession> {
        input.validate()?;

        let invalid = || AppError::BadRequest("Invalid email or password".to_string());

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(invalid());
        }

        ensure_active(&user)?;

        let token = self.tokens.issue(&user)?;
        let profile = self.profile_of(&user).await?;
        Ok(AuthSession {
            token,
            account: AccountView { user, profile },
        })
    }

    /// Resolve a bearer token to its user.
    ///
    /// Status is not checked here; suspended users still resolve so the API
    /// can answer 403 instead of 401.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let claims = self.tokens.verify(token)?;
        self.user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// The caller's account and profile.
    pub async fn me(&self, user: &user::Model) -> AppResult<AccountView> {
        Ok(AccountView {
            user: user.clone(),
            profile: self.profile_of(user).await?,
        })
    }

    /// Load the role-specific profile of a user.
    pub async fn profile_of(&self, user: &user::Model) -> AppResult<Profile> {
        let profile = match user.role {
            UserRole::Volunteer => self
                .volunteer_repo
                .find_by_user_id(&user.id)
                .await?
                .map(Profile::Volunteer),
            UserRole::Organiser => self
                .organiser_repo
                .find_by_user_id(&user.id)
                .await?
                .map(Profile::Organiser),
            UserRole::Admin => self
                .admin_repo
                .find_by_user_id(&user.id)
                .await?
                .map(Profile::Admin),
        };
        Ok(profile.unwrap_or(Profile::Missing))
    }

    /// Edit the caller's volunteer or organiser profile.
    pub async fn update_profile(
        &self,
        user: &user::Model,
        input: UpdateProfileInput,
    ) -> AppResult<Profile> {
        input.validate()?;
        let now = Utc::now();

        match self.profile_of(user).await? {
            Profile::Volunteer(current) => {
                let mut model: volunteer::ActiveModel = current.into();
                if let Some(name) = input.name {
                    model.name = Set(name);
                }
                if let Some(phone) = input.phone {
                    model.phone = Set(Some(phone));
                }
                if let Some(dob) = input.dob {
                    model.dob = Set(Some(dob));
                }
                if let Some(skills) = input.skills {
                    model.skills = Set(json_list(clean_list(skills)));
                }
                if let Some(causes) = input.preferred_causes {
                    model.preferred_causes = Set(json_list(clean_list(causes)));
                }
                model.updated_at = Set(Some(now.into()));
                Ok(Profile::Volunteer(self.volunteer_repo.update(model).await?))
            }
            Profile::Organiser(current) => {
                let mut model: organiser::ActiveModel = current.into();
                if let Some(name) = input.organisation_name {
                    model.organisation_name = Set(name);
                }
                if let Some(phone) = input.phone {
                    model.phone = Set(Some(phone));
                }
                if let Some(description) = input.description {
                    model.description = Set(Some(description));
                }
                model.updated_at = Set(Some(now.into()));
                Ok(Profile::Organiser(self.organiser_repo.update(model).await?))
            }
            Profile::Admin(_) => Err(AppError::Forbidden(
                "Admin profiles cannot be edited here".to_string(),
            )),
            Profile::Missing => Err(AppError::NotFound("Profile not found".to_string())),
        }
    }

    /// Store an identity document or avatar for the caller.
    ///
    /// A new NRIC image or certification document resets its verification.
    pub async fn upload(
        &self,
        user: &user::Model,
        kind: UploadKind,
        file: FileUpload,
    ) -> AppResult<UploadedFile> {
        let now = Utc::now();

        match kind {
            UploadKind::NricImage => {
                let current = self
                    .volunteer_repo
                    .find_by_user_id(&user.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Forbidden("Only volunteers can upload an NRIC image".to_string())
                    })?;
                let previous = current.nric_image.clone();
                let stored = self.store(kind, &user.id, &file).await?;

                let mut model: volunteer::ActiveModel = current.into();
                model.nric_image = Set(Some(stored.key.clone()));
                model.nric_verified = Set(false);
                model.nric_rejection_reason = Set(None);
                model.nric_requires_reupload = Set(false);
                model.nric_uploaded_at = Set(Some(now.into()));
                model.updated_at = Set(Some(now.into()));
                self.volunteer_repo.update(model).await?;

                self.discard(previous).await;
                Ok(stored)
            }
            UploadKind::CertificationDocument => {
                let current = self
                    .organiser_repo
                    .find_by_user_id(&user.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Forbidden(
                            "Only organisers can upload a certification document".to_string(),
                        )
                    })?;
                let previous = current.certification_document.clone();
                let stored = self.store(kind, &user.id, &file).await?;

                let mut model: organiser::ActiveModel = current.into();
                model.certification_document = Set(Some(stored.key.clone()));
                model.certification_verified = Set(false);
                model.verification_status = Set(VerificationStatus::Pending);
                model.verification_rejection_reason = Set(None);
                model.updated_at = Set(Some(now.into()));
                self.organiser_repo.update(model).await?;

                self.discard(previous).await;
                Ok(stored)
            }
            UploadKind::ProfilePicture => {
                let previous = user.profile_picture.clone();
                let stored = self.store(kind, &user.id, &file).await?;

                let mut model: user::ActiveModel = user.clone().into();
                model.profile_picture = Set(Some(stored.key.clone()));
                model.updated_at = Set(Some(now.into()));
                self.user_repo.update(model).await?;

                self.discard(previous).await;
                Ok(stored)
            }
            UploadKind::EventImage => Err(AppError::BadRequest(
                "Event images are uploaded through the event".to_string(),
            )),
        }
    }

    async fn store(
        &self,
        kind: UploadKind,
        owner_id: &str,
        file: &FileUpload,
    ) -> AppResult<UploadedFile> {
        store_upload(
            self.storage.as_ref(),
            self.max_upload_bytes,
            kind,
            owner_id,
            file,
        )
        .await
    }

    async fn discard(&self, key: Option<String>) {
        if let Some(key) = key {
            if let Err(e) = self.storage.delete(&key).await {
                warn!(key = %key, error = %e, "Failed to delete replaced upload");
            }
        }
    }
}

/// Check size and type, then write an upload to storage.
pub async fn store_upload(
    storage: &dyn StorageBackend,
    max_bytes: usize,
    kind: UploadKind,
    owner_id: &str,
    file: &FileUpload,
) -> AppResult<UploadedFile> {
    if file.data.is_empty() {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    }
    if file.data.len() > max_bytes {
        return Err(AppError::BadRequest(format!(
            "File too large (max {} MB)",
            max_bytes / (1024 * 1024)
        )));
    }
    kind.check_file_type(&file.file_name, &file.content_type)?;

    let key = generate_storage_key(kind, owner_id, &file.file_name);
    storage.upload(&key, &file.data, &file.content_type).await
}

/// Reject suspended and inactive accounts.
pub fn ensure_active(user: &user::Model) -> AppResult<()> {
    match user.status {
        UserStatus::Active => Ok(()),
        UserStatus::Suspended => Err(AppError::Forbidden("Account is suspended".to_string())),
        UserStatus::Inactive => Err(AppError::Forbidden("Account is inactive".to_string())),
    }
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Trim entries and drop blanks and duplicates, keeping order.
pub(crate) fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{MemoryStorage, test_config, test_user, test_volunteer};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: DatabaseConnection) -> (AccountService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::default());
        let service = AccountService::new(Arc::new(db), storage.clone(), &test_config());
        (service, storage)
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_token_roundtrip() {
        let issuer = TokenIssuer::new("secret", 1);
        let user = test_user("u1", UserRole::Organiser);
        let token = issuer.issue(&user).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, UserRole::Organiser);

        let other = TokenIssuer::new("other-secret", 1);
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_clean_list() {
        let cleaned = clean_list(vec![
            " first aid ".to_string(),
            String::new(),
            "first aid".to_string(),
            "driving".to_string(),
        ]);
        assert_eq!(cleaned, vec!["first aid", "driving"]);
    }

    #[test]
    fn test_ensure_active() {
        let mut user = test_user("u1", UserRole::Volunteer);
        assert!(ensure_active(&user).is_ok());
        user.status = UserStatus::Suspended;
        assert!(matches!(ensure_active(&user), Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_signup_rejects_taken_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_user("u1", UserRole::Volunteer)]])
            .into_connection();
        let (service, _) = service(db);

        let result = service
            .signup(SignupInput {
                email: "u1@example.org".to_string(),
                password: "password123".to_string(),
                role: SignupRole::Volunteer,
                name: Some("Ada".to_string()),
                organisation_name: None,
                phone: None,
                dob: None,
                skills: vec![],
                preferred_causes: vec![],
                description: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signup_volunteer() {
        let user = test_user("u1", UserRole::Volunteer);
        let volunteer = test_volunteer("v1", "u1");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[user.clone()]])
            .append_query_results([[volunteer.clone()]])
            .into_connection();
        let (service, _) = service(db);

        let session = service
            .signup(SignupInput {
                email: "u1@example.org".to_string(),
                password: "password123".to_string(),
                role: SignupRole::Volunteer,
                name: Some("Ada".to_string()),
                organisation_name: None,
                phone: None,
                dob: None,
                skills: vec!["first aid".to_string()],
                preferred_causes: vec![],
                description: None,
            })
            .await
            .unwrap();

        assert!(!session.token.is_empty());
        assert!(matches!(session.account.profile, Profile::Volunteer(v) if v.id == "v1"));
    }

    #[tokio::test]
    async fn test_signup_organiser_requires_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[test_user("u1", UserRole::Organiser)]])
            .into_connection();
        let (service, _) = service(db);

        let result = service
            .signup(SignupInput {
                email: "org@example.org".to_string(),
                password: "password123".to_string(),
                role: SignupRole::Organiser,
                name: None,
                organisation_name: None,
                phone: None,
                dob: None,
                skills: vec![],
                preferred_causes: vec![],
                description: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut user = test_user("u1", UserRole::Volunteer);
        user.password_hash = hash_password("password123").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();
        let (service, _) = service(db);

        let result = service
            .login(LoginInput {
                email: "u1@example.org".to_string(),
                password: "not-it".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_upload_nric_resets_verification() {
        let user = test_user("u1", UserRole::Volunteer);
        let mut current = test_volunteer("v1", "u1");
        current.nric_verified = true;
        let mut updated = current.clone();
        updated.nric_verified = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .append_query_results([[updated]])
            .into_connection();
        let (service, storage) = service(db);

        let stored = service
            .upload(
                &user,
                UploadKind::NricImage,
                FileUpload {
                    file_name: "nric.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    data: b"%PDF-1.4".to_vec(),
                },
            )
            .await
            .unwrap();

        assert!(stored.key.starts_with("nric/u1_"));
        assert!(storage.contains(&stored.key));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_file() {
        let storage = MemoryStorage::default();
        let result = store_upload(
            &storage,
            4,
            UploadKind::ProfilePicture,
            "u1",
            &FileUpload {
                file_name: "me.png".to_string(),
                content_type: "image/png".to_string(),
                data: vec![0; 5],
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
