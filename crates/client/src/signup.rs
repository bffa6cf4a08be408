//! Manager signup wizard.
//!
//! Three steps: manager details, branch details, review and submit. Moving
//! forward re-validates the step being left; moving back never validates and
//! never discards input. The draft lives only in memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use pharmacy_core::validation::{
    EmailPolicy, FieldValidator, PasswordPolicy, PhonePolicy, validate_email, validate_form,
    validate_password, validate_password_confirmation, validate_phone, validate_required,
};
use pharmacy_core::{FormValidation, Role};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::{SignupApi, SignupPayload};

/// Shown when the backend rejects a signup without saying why.
pub const DEFAULT_SIGNUP_FAILURE: &str = "Signup failed. Please try again.";

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum SignupStep {
    #[default]
    ManagerInfo,
    BranchInfo,
    Review,
}

impl SignupStep {
    /// 1-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::ManagerInfo => 1,
            Self::BranchInfo => 2,
            Self::Review => 3,
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::ManagerInfo => Self::BranchInfo,
            Self::BranchInfo | Self::Review => Self::Review,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::ManagerInfo | Self::BranchInfo => Self::ManagerInfo,
            Self::Review => Self::BranchInfo,
        }
    }
}

/// Form fields, keyed in `errors` by [`SignupField::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignupField {
    FullName,
    Email,
    Password,
    ConfirmPassword,
    PharmacyName,
    BranchName,
    Phone,
}

impl SignupField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::PharmacyName => "pharmacyName",
            Self::BranchName => "branchName",
            Self::Phone => "phone",
        }
    }
}

/// Step 1 input.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ManagerInfo {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for ManagerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerInfo")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

/// Step 2 input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchInfo {
    pub pharmacy_name: String,
    pub branch_name: String,
    pub phone: String,
    /// Optional.
    pub email: String,
    /// Optional; the branch name is sent when blank.
    pub location: String,
}

/// Everything the wizard holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupDraft {
    pub current_step: SignupStep,
    pub manager_info: ManagerInfo,
    pub branch_info: BranchInfo,
    /// Failing fields of the last forward attempt.
    pub errors: BTreeMap<String, String>,
    pub is_loading: bool,
    pub is_success: bool,
    /// Page-level message of the last failed submit.
    pub error: Option<String>,
}

impl SignupDraft {
    /// The error shown under `field`, if any.
    #[must_use]
    pub fn field_error(&self, field: SignupField) -> Option<&str> {
        self.errors.get(field.as_str()).map(String::as_str)
    }

    /// The request body for the current input.
    #[must_use]
    pub fn payload(&self) -> SignupPayload {
        let manager = &self.manager_info;
        let branch = &self.branch_info;
        let location = if branch.location.trim().is_empty() {
            branch.branch_name.trim()
        } else {
            branch.location.trim()
        };
        let branch_email = Some(branch.email.trim())
            .filter(|email| !email.is_empty())
            .map(str::to_owned);
        SignupPayload {
            full_name: manager.full_name.trim().to_owned(),
            email: manager.email.trim().to_owned(),
            password: manager.password.clone(),
            role_id: Role::Manager.id(),
            pharmacy_name: branch.pharmacy_name.trim().to_owned(),
            branch_name: branch.branch_name.trim().to_owned(),
            location: location.to_owned(),
            phone: branch.phone.trim().to_owned(),
            branch_email,
        }
    }
}

/// Strictness of the wizard's field checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignupPolicy {
    pub email: EmailPolicy,
    pub password: PasswordPolicy,
    pub phone: PhonePolicy,
}

/// Why a submit did not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupError {
    #[error("Signup can only be submitted from the review step")]
    NotOnReviewStep,
    #[error("A signup is already being submitted")]
    AlreadySubmitting,
    #[error("This signup has already been submitted")]
    AlreadySubmitted,
    #[error("Signup cancelled")]
    Cancelled,
    #[error("{0}")]
    Rejected(String),
}

/// The signup wizard state machine.
pub struct SignupWizard {
    api: Arc<dyn SignupApi>,
    policy: SignupPolicy,
    draft: watch::Sender<SignupDraft>,
}

impl SignupWizard {
    #[must_use]
    pub fn new(api: Arc<dyn SignupApi>, policy: SignupPolicy) -> Self {
        Self {
            api,
            policy,
            draft: watch::Sender::new(SignupDraft::default()),
        }
    }

    /// A copy of the current draft.
    #[must_use]
    pub fn draft(&self) -> SignupDraft {
        self.draft.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SignupDraft> {
        self.draft.subscribe()
    }

    #[must_use]
    pub const fn policy(&self) -> SignupPolicy {
        self.policy
    }

    pub fn update_manager_info(&self, edit: impl FnOnce(&mut ManagerInfo)) {
        self.draft.send_modify(|draft| edit(&mut draft.manager_info));
    }

    pub fn update_branch_info(&self, edit: impl FnOnce(&mut BranchInfo)) {
        self.draft.send_modify(|draft| edit(&mut draft.branch_info));
    }

    /// Validate the current step and advance if it passes.
    ///
    /// Returns whether the wizard moved. On failure the field errors are set
    /// and the step is unchanged; on success the errors are cleared. Step 3
    /// is the last step.
    pub fn go_to_next_step(&self) -> bool {
        let mut advanced = false;
        self.draft.send_modify(|draft| {
            let result = self.validate_step(draft);
            if result.is_valid {
                draft.errors.clear();
                draft.current_step = draft.current_step.next();
                advanced = true;
            } else {
                draft.errors = result.errors;
            }
        });
        advanced
    }

    /// Step back, never below step 1. Input is kept.
    pub fn go_to_previous_step(&self) {
        self.draft
            .send_modify(|draft| draft.current_step = draft.current_step.previous());
    }

    /// Back to an empty step 1 with no flags.
    pub fn reset_signup(&self) {
        self.draft.send_replace(SignupDraft::default());
    }

    fn validate_step(&self, draft: &SignupDraft) -> FormValidation {
        match draft.current_step {
            SignupStep::ManagerInfo => self.validate_manager_info(&draft.manager_info),
            SignupStep::BranchInfo => self.validate_branch_info(&draft.branch_info),
            SignupStep::Review => FormValidation {
                is_valid: true,
                errors: BTreeMap::new(),
            },
        }
    }

    fn validate_manager_info(&self, info: &ManagerInfo) -> FormValidation {
        let policy = self.policy;
        let fields: [(&str, FieldValidator<'_>); 4] = [
            (SignupField::FullName.as_str(), &|| {
                validate_required(&info.full_name, "Full name")
            }),
            (SignupField::Email.as_str(), &|| {
                validate_email(&info.email, policy.email).map(drop)
            }),
            (SignupField::Password.as_str(), &|| {
                validate_password(&info.password, policy.password)
            }),
            (SignupField::ConfirmPassword.as_str(), &|| {
                validate_password_confirmation(&info.password, &info.confirm_password)
            }),
        ];
        validate_form(fields)
    }

    fn validate_branch_info(&self, info: &BranchInfo) -> FormValidation {
        let policy = self.policy;
        let fields: [(&str, FieldValidator<'_>); 3] = [
            (SignupField::PharmacyName.as_str(), &|| {
                validate_required(&info.pharmacy_name, "Pharmacy name")
            }),
            (SignupField::BranchName.as_str(), &|| {
                validate_required(&info.branch_name, "Branch name")
            }),
            (SignupField::Phone.as_str(), &|| {
                validate_phone(&info.phone, policy.phone)
            }),
        ];
        validate_form(fields)
    }

    /// Submit the draft. Only allowed on step 3 while no submit is running
    /// and none has succeeded yet.
    ///
    /// Success sets `is_success`. Failure sets `error` and stays on step 3
    /// with all input intact. `is_loading` is false again either way.
    ///
    /// # Errors
    ///
    /// - [`SignupError::NotOnReviewStep`], [`SignupError::AlreadySubmitting`]
    ///   or [`SignupError::AlreadySubmitted`] when the submit is not allowed;
    ///   the draft is unchanged
    /// - [`SignupError::Rejected`] with the message also stored in `error`
    /// - [`SignupError::Cancelled`] when `cancel` fires first; the draft is
    ///   restored to how it was before the submit
    #[instrument(skip_all)]
    pub async fn submit_signup(&self, cancel: &CancellationToken) -> Result<(), SignupError> {
        let mut refusal = None;
        let mut before = None;
        self.draft.send_if_modified(|draft| {
            if draft.current_step != SignupStep::Review {
                refusal = Some(SignupError::NotOnReviewStep);
                return false;
            }
            if draft.is_loading {
                refusal = Some(SignupError::AlreadySubmitting);
                return false;
            }
            if draft.is_success {
                refusal = Some(SignupError::AlreadySubmitted);
                return false;
            }
            before = Some(draft.clone());
            draft.is_loading = true;
            draft.error = None;
            true
        });
        if let Some(refusal) = refusal {
            return Err(refusal);
        }
        let Some(before) = before else {
            return Err(SignupError::NotOnReviewStep);
        };

        let payload = before.payload();
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.draft.send_replace(before);
                return Err(SignupError::Cancelled);
            }
            result = self.api.signup_manager(&payload) => result,
        };

        let failure = match result {
            Ok(response) if response.success => None,
            Ok(response) => Some(
                response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SIGNUP_FAILURE.to_owned()),
            ),
            Err(e) => Some(e.to_string()),
        };

        self.draft.send_modify(|draft| {
            draft.is_loading = false;
            draft.is_success = failure.is_none();
            draft.error.clone_from(&failure);
        });

        match failure {
            None => {
                info!(email = %payload.email, "Manager signup submitted");
                Ok(())
            }
            Some(message) => {
                warn!(email = %payload.email, %message, "Manager signup failed");
                Err(SignupError::Rejected(message))
            }
        }
    }
}
