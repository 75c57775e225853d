//! Change events and the routing table
//!
//! Routing is a pure decision: a classified file plus a change kind maps to
//! exactly one action. A partial can be imported from anywhere, so any
//! change to one recompiles everything; a deleted full file has nothing
//! left to compile.

use std::path::PathBuf;

use notify::EventKind;

use crate::classifier::FileType;

/// The coarse change kinds the router cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Changed,
    Removed,
}

impl ChangeKind {
    /// Collapse a notify event kind; access-only and metadata noise return
    /// `None` and never reach the router.
    pub fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Modify(_) => Some(ChangeKind::Changed),
            EventKind::Remove(_) => Some(ChangeKind::Removed),
            _ => None,
        }
    }
}

/// One filesystem change, already split per path.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// What the router decided to do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    Ignore,
    CompileAll,
    CompileOne(PathBuf),
}

/// Map a classified change to an action.
pub fn route(event: &ChangeEvent, file_type: FileType) -> RouteAction {
    match (file_type, event.kind) {
        (FileType::Irrelevant, _) => RouteAction::Ignore,
        (FileType::Partial, _) => RouteAction::CompileAll,
        (FileType::Full, ChangeKind::Removed) => RouteAction::Ignore,
        (FileType::Full, _) => RouteAction::CompileOne(event.path.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: ChangeKind) -> ChangeEvent {
        ChangeEvent {
            kind,
            path: PathBuf::from("/p/src/a.scss"),
        }
    }

    #[test]
    fn partial_change_recompiles_everything() {
        for kind in [ChangeKind::Created, ChangeKind::Changed, ChangeKind::Removed] {
            assert_eq!(route(&event(kind), FileType::Partial), RouteAction::CompileAll);
        }
    }

    #[test]
    fn full_file_change_compiles_that_file() {
        assert_eq!(
            route(&event(ChangeKind::Changed), FileType::Full),
            RouteAction::CompileOne(PathBuf::from("/p/src/a.scss"))
        );
        assert_eq!(
            route(&event(ChangeKind::Created), FileType::Full),
            RouteAction::CompileOne(PathBuf::from("/p/src/a.scss"))
        );
    }

    #[test]
    fn full_file_removal_is_ignored() {
        assert_eq!(
            route(&event(ChangeKind::Removed), FileType::Full),
            RouteAction::Ignore
        );
    }

    #[test]
    fn irrelevant_files_never_route() {
        for kind in [ChangeKind::Created, ChangeKind::Changed, ChangeKind::Removed] {
            assert_eq!(route(&event(kind), FileType::Irrelevant), RouteAction::Ignore);
        }
    }

    #[test]
    fn notify_kinds_collapse() {
        use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

        assert_eq!(
            ChangeKind::from_notify(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            ChangeKind::from_notify(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Changed)
        );
        assert_eq!(
            ChangeKind::from_notify(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Removed)
        );
        assert_eq!(
            ChangeKind::from_notify(&EventKind::Access(AccessKind::Any)),
            None
        );
    }
}
