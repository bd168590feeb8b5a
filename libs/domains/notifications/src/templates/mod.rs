//! Message rendering for notifications and email bodies.
//!
//! One Handlebars template per event kind; the `for_admin` flag switches the
//! wording between the employee's own message and the administrator variant,
//! which additionally names the affected employee.

use domain_profiles::Profile;
use handlebars::Handlebars;
use std::sync::Arc;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{NotificationEvent, NotificationKind};

/// Rendered message content.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

const PROFILE_CREATED: &str = "{{#if for_admin}}A new employee profile was created for \
{{employee_name}} (VTID {{vtid}}).{{else}}Welcome {{employee_name}}, your employee profile has \
been created (VTID {{vtid}}).{{/if}}";

const PROFILE_UPDATED: &str = "{{#if for_admin}}The profile of {{employee_name}} was updated.\
{{else}}Your profile was updated.{{/if}}{{#if updated_fields}} Changed: {{updated_fields}}.{{/if}}";

const PROFILE_DELETED: &str = "The employee profile of {{employee_name}} (VTID {{vtid}}) was \
deleted, together with all certifications it held.";

const CERTIFICATION_CREATED: &str = "{{#if for_admin}}Certification \"{{certification_name}}\" \
was added for {{employee_name}}.{{else}}Certification \"{{certification_name}}\" was added to \
your record.{{/if}}";

const CERTIFICATION_UPDATED: &str = "{{#if for_admin}}Certification \"{{certification_name}}\" \
of {{employee_name}} was updated.{{else}}Your certification \"{{certification_name}}\" was \
updated.{{/if}}{{#if updated_fields}} Changed: {{updated_fields}}.{{/if}}";

const CERTIFICATION_DELETED: &str = "{{#if for_admin}}Certification \"{{certification_name}}\" \
of {{employee_name}} was removed.{{else}}Your certification \"{{certification_name}}\" was \
removed from your record.{{/if}}";

const EXPIRY_APPROACHING: &str = "{{#if for_admin}}Certification \"{{certification_name}}\" of \
{{employee_name}} expires in {{days_value}} day(s).{{else}}Your certification \
\"{{certification_name}}\" expires in {{days_value}} day(s). Please arrange its \
renewal.{{/if}}";

const EXPIRED: &str = "{{#if for_admin}}Certification \"{{certification_name}}\" of \
{{employee_name}} has expired.{{else}}Your certification \"{{certification_name}}\" has \
expired. Please arrange its renewal as soon as possible.{{/if}}";

const CREDENTIALS_ISSUED: &str = "Welcome {{employee_name}}! A login account has been created \
for you.{{#if secret}}\n\nYour username is your email address ({{employee_email}}) and your \
one-time password is: {{secret}}\n\nPlease sign in and change it immediately.{{/if}}";

const GENERAL: &str = "{{#if for_admin}}Notice regarding {{employee_name}}.{{else}}You have a \
new notice.{{/if}}";

/// Template engine with every message template registered.
pub struct MessageCatalog {
    handlebars: Arc<Handlebars<'static>>,
}

impl MessageCatalog {
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        // Bodies are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        let templates: [(NotificationKind, &str); 10] = [
            (NotificationKind::ProfileCreated, PROFILE_CREATED),
            (NotificationKind::ProfileUpdated, PROFILE_UPDATED),
            (NotificationKind::ProfileDeleted, PROFILE_DELETED),
            (NotificationKind::CertificationCreated, CERTIFICATION_CREATED),
            (NotificationKind::CertificationUpdated, CERTIFICATION_UPDATED),
            (NotificationKind::CertificationDeleted, CERTIFICATION_DELETED),
            (NotificationKind::ExpiryApproaching, EXPIRY_APPROACHING),
            (NotificationKind::Expired, EXPIRED),
            (NotificationKind::CredentialsIssued, CREDENTIALS_ISSUED),
            (NotificationKind::General, GENERAL),
        ];

        for (kind, template) in templates {
            handlebars
                .register_template_string(&kind.to_string(), template)
                .map_err(|e| {
                    NotificationError::TemplateError(format!(
                        "Failed to register {}: {}",
                        kind, e
                    ))
                })?;
        }

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    /// Render the message for one recipient.
    ///
    /// `include_secret` is true only for the delivery channel of a
    /// credentials-issued event; persisted records always render without it.
    pub fn render(
        &self,
        event: &NotificationEvent,
        profile: &Profile,
        for_admin: bool,
        include_secret: bool,
    ) -> NotificationResult<RenderedMessage> {
        let updated_fields = if event.updated_fields.is_empty() {
            None
        } else {
            Some(event.updated_fields.join(", "))
        };

        let data = serde_json::json!({
            "for_admin": for_admin,
            "employee_name": profile.full_name(),
            "employee_email": profile.email,
            "vtid": profile.vtid,
            "certification_name": event.certification_name,
            "days_value": event.days_value,
            "updated_fields": updated_fields,
            "secret": if include_secret { event.one_time_secret.as_deref() } else { None },
        });

        let body = self
            .handlebars
            .render(&event.kind.to_string(), &data)
            .map_err(|e| NotificationError::TemplateError(e.to_string()))?;

        Ok(RenderedMessage {
            subject: self.subject(event, profile, for_admin),
            body,
        })
    }

    fn subject(&self, event: &NotificationEvent, profile: &Profile, for_admin: bool) -> String {
        let name = profile.full_name();
        let cert = event.certification_name.as_deref().unwrap_or("certification");
        let days = event.days_value.unwrap_or_default();

        match event.kind {
            NotificationKind::ProfileCreated => {
                if for_admin {
                    format!("New employee profile: {}", name)
                } else {
                    "Your employee profile was created".to_string()
                }
            }
            NotificationKind::ProfileUpdated => {
                if for_admin {
                    format!("Profile updated: {}", name)
                } else {
                    "Your profile was updated".to_string()
                }
            }
            NotificationKind::ProfileDeleted => format!("Employee profile deleted: {}", name),
            NotificationKind::CertificationCreated => {
                if for_admin {
                    format!("Certification added for {}: {}", name, cert)
                } else {
                    format!("Certification added: {}", cert)
                }
            }
            NotificationKind::CertificationUpdated => {
                if for_admin {
                    format!("Certification updated for {}: {}", name, cert)
                } else {
                    format!("Certification updated: {}", cert)
                }
            }
            NotificationKind::CertificationDeleted => {
                if for_admin {
                    format!("Certification removed for {}: {}", name, cert)
                } else {
                    format!("Certification removed: {}", cert)
                }
            }
            NotificationKind::ExpiryApproaching => {
                if for_admin {
                    format!("{}: \"{}\" expires in {} day(s)", name, cert, days)
                } else {
                    format!("Your certification \"{}\" expires in {} day(s)", cert, days)
                }
            }
            NotificationKind::Expired => {
                if for_admin {
                    format!("{}: \"{}\" has expired", name, cert)
                } else {
                    format!("Your certification \"{}\" has expired", cert)
                }
            }
            NotificationKind::CredentialsIssued => "Your login credentials".to_string(),
            NotificationKind::General => "Notification".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_profiles::{CreateProfile, Profile};
    use uuid::Uuid;

    fn profile() -> Profile {
        Profile::new(
            CreateProfile {
                first_name: "Dana".to_string(),
                last_name: "Petrov".to_string(),
                email: "dana@example.com".to_string(),
                job_title: None,
                department: None,
                start_date: None,
                contact: Default::default(),
                address: Default::default(),
                emergency_contact: None,
            },
            1042,
            55555555,
        )
    }

    #[test]
    fn test_admin_variant_names_the_employee() {
        let catalog = MessageCatalog::new().unwrap();
        let event = NotificationEvent::new(NotificationKind::ExpiryApproaching, Uuid::now_v7())
            .with_certification(Uuid::now_v7(), "Forklift Licence")
            .with_days(14);

        let own = catalog.render(&event, &profile(), false, false).unwrap();
        let admin = catalog.render(&event, &profile(), true, false).unwrap();

        assert!(own.body.starts_with("Your certification"));
        assert!(own.body.contains("14 day(s)"));
        assert!(admin.body.contains("Dana Petrov"));
        assert_ne!(own.body, admin.body);
    }

    #[test]
    fn test_secret_only_rendered_when_asked() {
        let catalog = MessageCatalog::new().unwrap();
        let event = NotificationEvent::new(NotificationKind::CredentialsIssued, Uuid::now_v7())
            .with_secret("Xy12AbCd");

        let record = catalog.render(&event, &profile(), false, false).unwrap();
        let email = catalog.render(&event, &profile(), false, true).unwrap();

        assert!(!record.body.contains("Xy12AbCd"));
        assert!(email.body.contains("Xy12AbCd"));
        assert!(email.body.contains("dana@example.com"));
    }

    #[test]
    fn test_updated_fields_listed_when_present() {
        let catalog = MessageCatalog::new().unwrap();
        let event = NotificationEvent::new(NotificationKind::ProfileUpdated, Uuid::now_v7())
            .with_updated_fields(vec!["last_name".to_string(), "email".to_string()]);

        let rendered = catalog.render(&event, &profile(), true, false).unwrap();
        assert!(rendered.body.contains("Changed: last_name, email."));

        let bare = NotificationEvent::new(NotificationKind::ProfileUpdated, Uuid::now_v7());
        let rendered = catalog.render(&bare, &profile(), true, false).unwrap();
        assert!(!rendered.body.contains("Changed:"));
    }
}
