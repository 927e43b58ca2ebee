use std::io;
use std::path::{Path, PathBuf};

use crate::error::OpError;

use super::report::{Outcome, Status, Step};

/// What a resolved change asks of the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorAction {
    CreateLink {
        target: PathBuf,
        link: PathBuf,
    },
    RemoveLink {
        link: PathBuf,
    },
    RenameLink {
        old_link: PathBuf,
        new_link: PathBuf,
        new_target: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Remove,
    Rename,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Remove => "remove",
            Self::Rename => "rename",
        })
    }
}

impl MirrorAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::CreateLink { .. } => ActionKind::Create,
            Self::RemoveLink { .. } => ActionKind::Remove,
            Self::RenameLink { .. } => ActionKind::Rename,
        }
    }

    /// Apply the action, returning one outcome per filesystem call.
    ///
    /// A rename is two independent steps: the old link is removed (a missing
    /// one is fine), then the new link is created regardless.
    pub fn execute(self) -> Vec<Outcome> {
        let action = self.kind();
        match self {
            Self::CreateLink { target, link } => {
                let status = Status::from(symlink(&target, &link));
                vec![Outcome {
                    action,
                    step: Step::Symlink { target, link },
                    status,
                }]
            }
            Self::RemoveLink { link } => {
                let status = Status::from(remove_link(&link));
                vec![Outcome {
                    action,
                    step: Step::Unlink { link },
                    status,
                }]
            }
            Self::RenameLink {
                old_link,
                new_link,
                new_target,
            } => {
                let removed = match remove_link(&old_link) {
                    Err(OpError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                        Status::Absent
                    }
                    other => Status::from(other),
                };
                let created = Status::from(symlink(&new_target, &new_link));
                vec![
                    Outcome {
                        action,
                        step: Step::Unlink { link: old_link },
                        status: removed,
                    },
                    Outcome {
                        action,
                        step: Step::Symlink {
                            target: new_target,
                            link: new_link,
                        },
                        status: created,
                    },
                ]
            }
        }
    }
}

fn symlink(target: &Path, link: &Path) -> Result<(), OpError> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

/// Unlink `link`, but only if it is a symlink.
fn remove_link(link: &Path) -> Result<(), OpError> {
    let meta = std::fs::symlink_metadata(link)?;
    if !meta.file_type().is_symlink() {
        return Err(OpError::NotALink(link.to_path_buf()));
    }
    std::fs::remove_file(link)?;
    Ok(())
}
