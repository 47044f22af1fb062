//! Certificate service: issue, verify and serve participation certificates.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;
use tracing::{info, warn};
use volunteer_common::{AppError, AppResult, Config, IdGenerator};
use volunteer_db::{
    entities::{
        certificate, json_list,
        user::{self, UserRole},
    },
    repositories::{
        CertificateRepository, EventRepository, OrganiserRepository, RegistrationRepository,
        VolunteerRepository,
    },
};

use super::certificate_pdf::{CertificateDocument, builtin_can_draw, load_fonts, render};

/// Skills printed on a certificate.
const MAX_SKILLS: usize = 3;

/// A certificate file ready to send.
#[derive(Debug, Clone)]
pub struct CertificateFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// What the public verification page shows. Owner ids and file locations
/// stay private.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateVerification {
    pub certificate_id: String,
    pub volunteer_name: String,
    pub event_name: String,
    pub organiser_name: String,
    pub event_date: Option<NaiveDate>,
    pub hours_contributed: f64,
    pub skills_demonstrated: Vec<String>,
    pub issued_at: DateTime<FixedOffset>,
}

impl From<certificate::Model> for CertificateVerification {
    fn from(certificate: certificate::Model) -> Self {
        Self {
            skills_demonstrated: certificate.skill_list(),
            certificate_id: certificate.certificate_id,
            volunteer_name: certificate.volunteer_name,
            event_name: certificate.event_name,
            organiser_name: certificate.organiser_name,
            event_date: certificate.event_date,
            hours_contributed: certificate.hours_contributed,
            issued_at: certificate.issued_at,
        }
    }
}

/// Certificate service for business logic.
#[derive(Clone)]
pub struct CertificateService {
    certificate_repo: CertificateRepository,
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    organiser_repo: OrganiserRepository,
    volunteer_repo: VolunteerRepository,
    output_dir: PathBuf,
    font_path: Option<PathBuf>,
    bold_font_path: Option<PathBuf>,
    verify_base: String,
    id_gen: IdGenerator,
}

impl CertificateService {
    /// Create a new certificate service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        Self {
            certificate_repo: CertificateRepository::new(Arc::clone(&db)),
            registration_repo: RegistrationRepository::new(Arc::clone(&db)),
            event_repo: EventRepository::new(Arc::clone(&db)),
            organiser_repo: OrganiserRepository::new(Arc::clone(&db)),
            volunteer_repo: VolunteerRepository::new(db),
            output_dir: config.certificates.output_dir.clone(),
            font_path: config.certificates.font_path.clone(),
            bold_font_path: config.certificates.bold_font_path.clone(),
            verify_base: config.certificate_verify_base(),
            id_gen: IdGenerator::new(),
        }
    }

    fn verify_url(&self, certificate_id: &str) -> String {
        format!("{}/{}", self.verify_base.trim_end_matches('/'), certificate_id)
    }

    /// Issue the caller's certificate for an event.
    ///
    /// Returns the existing certificate when one was already issued.
    pub async fn generate(
        &self,
        user: &user::Model,
        event_id: &str,
    ) -> AppResult<certificate::Model> {
        if user.role != UserRole::Volunteer {
            return Err(AppError::Forbidden(
                "Only volunteers can generate certificates".to_string(),
            ));
        }

        if let Some(existing) = self
            .certificate_repo
            .find_by_user_and_event(&user.id, event_id)
            .await?
        {
            return Ok(existing);
        }

        let registration = self
            .registration_repo
            .find_by_pair(&user.id, event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("You are not registered for this event".to_string())
            })?;
        if registration.status.is_terminal() {
            return Err(AppError::BadRequest(
                "No certificate for a cancelled or removed registration".to_string(),
            ));
        }

        let event = self.event_repo.get_by_id(event_id).await?;
        let organiser = self.organiser_repo.get_by_id(&event.organiser_id).await?;
        let volunteer = self
            .volunteer_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Volunteer profile not found".to_string()))?;

        let skills: Vec<String> = volunteer.skill_list().into_iter().take(MAX_SKILLS).collect();
        let hours = registration.hours_contributed();
        let event_date = event.first_date();
        let certificate_id = self.id_gen.generate_uuid_v4();
        let file_name = format!("{certificate_id}.pdf");
        let now = Utc::now();

        let fonts = load_fonts(self.font_path.as_deref(), self.bold_font_path.as_deref()).await?;
        if fonts.is_none()
            && ![&volunteer.name, &event.name, &organiser.organisation_name]
                .into_iter()
                .all(|text| builtin_can_draw(text))
        {
            warn!(
                certificate_id = %certificate_id,
                "Certificate text is outside Latin-1 and no certificate font is configured"
            );
        }

        let bytes = render(
            &CertificateDocument {
                certificate_id: &certificate_id,
                volunteer_name: &volunteer.name,
                event_name: &event.name,
                organiser_name: &organiser.organisation_name,
                event_date,
                hours_contributed: hours,
                skills: &skills,
                issued_on: now.date_naive(),
                verify_url: &self.verify_url(&certificate_id),
            },
            fonts.as_ref(),
        )?;
        self.write_file(&file_name, &bytes).await?;

        let model = certificate::ActiveModel {
            id: Set(self.id_gen.generate()),
            certificate_id: Set(certificate_id),
            user_id: Set(user.id.clone()),
            event_id: Set(event_id.to_string()),
            volunteer_name: Set(volunteer.name),
            event_name: Set(event.name),
            organiser_name: Set(organiser.organisation_name),
            event_date: Set(event_date),
            hours_contributed: Set(hours),
            skills_demonstrated: Set(json_list(skills)),
            pdf_path: Set(file_name.clone()),
            issued_at: Set(now.into()),
        };

        match self.certificate_repo.create(model).await {
            Ok(certificate) => {
                info!(
                    certificate_id = %certificate.certificate_id,
                    user_id = %user.id,
                    event_id = %event_id,
                    "Certificate issued"
                );
                Ok(certificate)
            }
            // Lost a race with a concurrent request for the same pair
            Err(AppError::Conflict(_)) => {
                self.remove_file(&file_name).await;
                self.certificate_repo
                    .find_by_user_and_event(&user.id, event_id)
                    .await?
                    .ok_or_else(|| AppError::Internal("Certificate vanished".to_string()))
            }
            Err(e) => {
                self.remove_file(&file_name).await;
                Err(e)
            }
        }
    }

    /// Public lookup by certificate UUID.
    pub async fn verify(&self, certificate_id: &str) -> AppResult<Option<CertificateVerification>> {
        Ok(self
            .certificate_repo
            .find_by_certificate_id(certificate_id)
            .await?
            .map(CertificateVerification::from))
    }

    /// The PDF of a certificate, 404 when the record or file is missing.
    pub async fn download(&self, certificate_id: &str) -> AppResult<CertificateFile> {
        let certificate = self
            .certificate_repo
            .find_by_certificate_id(certificate_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate not found".to_string()))?;

        let path = self.output_dir.join(&certificate.pdf_path);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(CertificateFile {
                file_name: format!("certificate-{}.pdf", certificate.certificate_id),
                bytes,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                "Certificate file not found".to_string(),
            )),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read certificate file: {e}"
            ))),
        }
    }

    /// Certificates issued to the caller, newest first.
    pub async fn list_for_user(&self, user: &user::Model) -> AppResult<Vec<certificate::Model>> {
        self.certificate_repo.find_by_user(&user.id).await
    }

    async fn write_file(&self, file_name: &str, bytes: &[u8]) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        tokio::fs::write(self.output_dir.join(file_name), bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write certificate: {e}")))
    }

    async fn remove_file(&self, file_name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.output_dir.join(file_name)).await {
            warn!(file = %file_name, error = %e, "Failed to remove orphaned certificate");
        }
    }
}
