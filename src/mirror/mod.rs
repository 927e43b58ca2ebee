pub mod action;
pub mod correlator;
pub mod path;
pub mod report;

use crate::error::{EngineError, OpError, PathError};
use crate::watcher::NotificationSource;
use crate::watcher::event::{ChangeEvent, ChangeKind, decode};

use action::{ActionKind, MirrorAction};
use correlator::MoveCorrelator;
use path::WatchTarget;
use report::{Outcome, Status, Step};

/// Keeps the target directory's links in step with the source directory's
/// entries, one notification batch at a time.
pub struct MirrorEngine {
    target: WatchTarget,
    moves: MoveCorrelator,
}

impl MirrorEngine {
    pub fn new(target: WatchTarget) -> Self {
        Self {
            target,
            moves: MoveCorrelator::new(),
        }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Read and apply batches until the source fails.
    ///
    /// Individual mutation failures are reported and do not stop the loop.
    pub fn run<S: NotificationSource>(
        &mut self,
        source: &mut S,
        buffer_len: usize,
    ) -> Result<(), EngineError> {
        let mut buf = vec![0u8; buffer_len];
        loop {
            let n = source.read_batch(&mut buf)?;
            let outcomes = self.process_batch(&buf[..n]);
            let failed = outcomes.iter().filter(|o| o.is_failure()).count();
            tracing::trace!(
                bytes = n,
                outcomes = outcomes.len(),
                failed,
                pending_move = self.moves.pending().is_some(),
                "batch done"
            );
        }
    }

    /// Decode and apply one raw batch in arrival order.
    pub fn process_batch(&mut self, bytes: &[u8]) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for event in decode(bytes, bytes.len()) {
            for outcome in self.dispatch(event) {
                report::report(&outcome);
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    fn dispatch(&mut self, event: ChangeEvent<'_>) -> Vec<Outcome> {
        tracing::debug!(kind = ?event.kind, name = %event.name.to_string_lossy(), cookie = event.cookie, "event");

        let resolved = match event.kind {
            ChangeKind::Created => self.resolve_created(event),
            ChangeKind::Deleted => self
                .target
                .link_path(event.name)
                .map(|link| vec![MirrorAction::RemoveLink { link }]),
            ChangeKind::MovedFrom => self
                .moves
                .on_moved_from(&self.target, event.name, event.cookie)
                .map(|orphan| orphan.into_iter().collect()),
            ChangeKind::MovedTo => self
                .moves
                .on_moved_to(&self.target, event.name, event.cookie),
        };

        match resolved {
            Ok(actions) => actions
                .into_iter()
                .flat_map(MirrorAction::execute)
                .collect(),
            Err(err) => vec![Outcome {
                action: action_kind(event.kind),
                step: Step::Skip {
                    name: event.name.to_os_string(),
                },
                status: Status::Failed(OpError::Path(err)),
            }],
        }
    }

    /// A name that was moved out and is now created again replaces the stale
    /// link instead of colliding with it.
    fn resolve_created(&mut self, event: ChangeEvent<'_>) -> Result<Vec<MirrorAction>, PathError> {
        let target = self.target.source_path(event.name)?;
        let link = self.target.link_path(event.name)?;
        let mut actions: Vec<MirrorAction> = self.moves.expire(&link).into_iter().collect();
        actions.push(MirrorAction::CreateLink { target, link });
        Ok(actions)
    }
}

fn action_kind(kind: ChangeKind) -> ActionKind {
    match kind {
        ChangeKind::Created => ActionKind::Create,
        ChangeKind::Deleted => ActionKind::Remove,
        ChangeKind::MovedFrom | ChangeKind::MovedTo => ActionKind::Rename,
    }
}
