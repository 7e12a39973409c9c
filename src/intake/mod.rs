//! Application Intake Wizard
//!
//! Four linear steps over the application form. Moving forward validates only
//! the current step's fields; moving back never validates. The full record is
//! sent once, from the last step, through an [`ApplicationSink`].

pub mod client;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::db::models::Application;
use crate::validation::{schemas::APPLICATION, ValidationErrors};

pub use client::{IntakeClient, SubmitError};

/// How long the confirmation stays visible after a successful submit.
pub const CONFIRMATION_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Contact,
    Project,
    Requirements,
    Details,
}

impl Step {
    pub const TOTAL: u8 = 4;

    /// 1-based position.
    pub fn number(self) -> u8 {
        match self {
            Self::Contact => 1,
            Self::Project => 2,
            Self::Requirements => 3,
            Self::Details => 4,
        }
    }

    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Contact => &["fullName", "email", "phone", "telegram"],
            Self::Project => &["projectType", "projectProblem", "targetAudience"],
            Self::Requirements => &["budget", "deadline"],
            Self::Details => &["description", "additionalInfo"],
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Contact => Some(Self::Project),
            Self::Project => Some(Self::Requirements),
            Self::Requirements => Some(Self::Details),
            Self::Details => None,
        }
    }

    pub fn prev(self) -> Option<Self> {
        match self {
            Self::Contact => None,
            Self::Project => Some(Self::Contact),
            Self::Requirements => Some(Self::Project),
            Self::Details => Some(Self::Requirements),
        }
    }
}

/// Where a finished application goes.
#[async_trait]
pub trait ApplicationSink: Send + Sync {
    async fn submit(&self, application: &Value) -> Result<Application, SubmitError>;
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{0} field(s) need attention")]
    Invalid(ValidationErrors),
    #[error("submit is only possible from the last step (currently on step {})", .0.number())]
    NotFinalStep(Step),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

#[derive(Debug)]
pub struct Wizard {
    step: Step,
    data: Map<String, Value>,
    errors: ValidationErrors,
    confirmation_until: Option<Instant>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::Contact,
            data: Map::new(),
            errors: ValidationErrors::new(),
            confirmation_until: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Share of completed steps, 0 to 75.
    pub fn progress(&self) -> f64 {
        f64::from(self.step.number() - 1) / f64::from(Step::TOTAL) * 100.0
    }

    /// Inline errors from the last `next` or `submit`.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Set a field value. Editing a field clears its inline error.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.data.insert(field.to_string(), value.into());
        self.errors.remove(field);
    }

    /// Validate the current step and advance. On the last step a successful
    /// check leaves the wizard where it is.
    pub fn next(&mut self) -> Result<Step, WizardError> {
        let errors = APPLICATION.check_fields(&self.data, self.step.fields());
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(WizardError::Invalid(errors));
        }

        self.errors = ValidationErrors::new();
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> Step {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
        self.step
    }

    /// Validate the whole record and send it. On success the wizard resets to
    /// the first step and shows the confirmation; on failure the entered data
    /// is kept and any field errors are exposed through [`Wizard::errors`].
    pub async fn submit(&mut self, sink: &dyn ApplicationSink) -> Result<Application, WizardError> {
        if self.step != Step::Details {
            return Err(WizardError::NotFinalStep(self.step));
        }

        let normalized = match APPLICATION.normalize(&Value::Object(self.data.clone())) {
            Ok(normalized) => normalized,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(WizardError::Invalid(errors));
            }
        };

        match sink.submit(&Value::Object(normalized)).await {
            Ok(application) => {
                tracing::info!(id = %application.id, "Application submitted");
                self.data.clear();
                self.errors = ValidationErrors::new();
                self.step = Step::Contact;
                self.confirmation_until = Some(Instant::now() + CONFIRMATION_DURATION);
                Ok(application)
            }
            Err(SubmitError::Rejected(errors)) => {
                self.errors = errors.clone();
                Err(WizardError::Submit(SubmitError::Rejected(errors)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Application submit failed");
                Err(e.into())
            }
        }
    }

    pub fn showing_confirmation(&self) -> bool {
        self.confirmation_visible_at(Instant::now())
    }

    pub fn confirmation_visible_at(&self, at: Instant) -> bool {
        self.confirmation_until.is_some_and(|until| at < until)
    }
}
