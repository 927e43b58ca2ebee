use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::OpError;

use super::action::ActionKind;

/// The filesystem call an outcome is about.
#[derive(Debug)]
pub enum Step {
    Symlink { target: PathBuf, link: PathBuf },
    Unlink { link: PathBuf },
    /// The event was dropped before any call was made.
    Skip { name: OsString },
}

#[derive(Debug)]
pub enum Status {
    Done,
    /// The link to remove was already gone. Only used for renames.
    Absent,
    Failed(OpError),
}

impl From<Result<(), OpError>> for Status {
    fn from(result: Result<(), OpError>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(err) => Self::Failed(err),
        }
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub action: ActionKind,
    pub step: Step,
    pub status: Status,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, Status::Failed(_))
    }
}

/// Write an outcome to the log. Failures go out at error level, so they are
/// visible even when running quietly.
pub fn report(outcome: &Outcome) {
    let action = outcome.action;
    match (&outcome.step, &outcome.status) {
        (Step::Symlink { target, link }, Status::Done) => tracing::info!(
            %action,
            "symlinked from {} to {}",
            target.display(),
            link.display()
        ),
        (Step::Symlink { target, link }, Status::Failed(err)) => tracing::error!(
            %action,
            "could not symlink from {} to {}: {err}",
            target.display(),
            link.display()
        ),
        (Step::Unlink { link }, Status::Done) => {
            tracing::info!(%action, "removed symlink {}", link.display())
        }
        (Step::Unlink { link }, Status::Failed(err)) => tracing::error!(
            %action,
            "could not remove symlink {}: {err}",
            link.display()
        ),
        (Step::Symlink { link, .. } | Step::Unlink { link }, Status::Absent) => {
            tracing::debug!(%action, "symlink {} was already absent", link.display())
        }
        (Step::Skip { name }, Status::Failed(err)) => tracing::error!(
            %action,
            "skipping {}: {err}",
            name.to_string_lossy()
        ),
        (Step::Skip { name }, _) => {
            tracing::debug!(%action, "skipping {}", name.to_string_lossy())
        }
    }
}
