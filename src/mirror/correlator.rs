use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::PathError;

use super::action::MirrorAction;
use super::path::WatchTarget;

/// The link left behind by a `MovedFrom` that has not been matched yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub link: PathBuf,
    pub cookie: u32,
}

impl PendingMove {
    /// Cookie zero means "unknown" and pairs with anything.
    fn pairs_with(&self, cookie: u32) -> bool {
        self.cookie == 0 || cookie == 0 || self.cookie == cookie
    }
}

/// Pairs the two notifications of a move into one rename.
///
/// Idle when `pending` is empty, armed otherwise.
#[derive(Debug, Default)]
pub struct MoveCorrelator {
    pending: Option<PendingMove>,
}

impl MoveCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    /// Arm with the link for `name`.
    ///
    /// A move that is still pending never got its second half, so its entry
    /// left the watched directory; its link is returned for removal.
    pub fn on_moved_from(
        &mut self,
        target: &WatchTarget,
        name: &OsStr,
        cookie: u32,
    ) -> Result<Option<MirrorAction>, PathError> {
        let link = target.link_path(name)?;
        let orphan = self.pending.replace(PendingMove { link, cookie });
        Ok(orphan.map(|stale| {
            tracing::warn!(
                "no move completed for {}, removing it",
                stale.link.display()
            );
            MirrorAction::RemoveLink { link: stale.link }
        }))
    }

    /// Expire the pending move if its link is `link`.
    ///
    /// An entry that reappears under the pending name means the earlier one
    /// left the watched directory. The stale link is returned for removal so
    /// the caller can link the new entry in its place.
    pub fn expire(&mut self, link: &Path) -> Option<MirrorAction> {
        if self.pending.as_ref().is_none_or(|p| p.link != link) {
            return None;
        }
        let stale = self.pending.take()?;
        tracing::debug!("{} reappeared, dropping its pending move", stale.link.display());
        Some(MirrorAction::RemoveLink { link: stale.link })
    }

    /// Resolve a `MovedTo` into a rename of the pending link, or into a fresh
    /// link if there is nothing to rename from.
    ///
    /// On error the pending move is left in place.
    pub fn on_moved_to(
        &mut self,
        target: &WatchTarget,
        name: &OsStr,
        cookie: u32,
    ) -> Result<Vec<MirrorAction>, PathError> {
        let new_link = target.link_path(name)?;
        let new_target = target.source_path(name)?;

        let mut actions = Vec::with_capacity(2);
        match self.pending.take() {
            Some(pending) if pending.pairs_with(cookie) => {
                actions.push(MirrorAction::RenameLink {
                    old_link: pending.link,
                    new_link,
                    new_target,
                });
            }
            Some(stale) => {
                tracing::warn!(
                    "move of {} does not match cookie {cookie}, removing it",
                    stale.link.display()
                );
                actions.push(MirrorAction::RemoveLink { link: stale.link });
                actions.push(MirrorAction::CreateLink {
                    target: new_target,
                    link: new_link,
                });
            }
            None => {
                tracing::debug!(
                    "could not resolve a matching prior move for {}, linking it",
                    name.to_string_lossy()
                );
                actions.push(MirrorAction::CreateLink {
                    target: new_target,
                    link: new_link,
                });
            }
        }
        Ok(actions)
    }
}
