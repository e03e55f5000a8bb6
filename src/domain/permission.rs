//! Ownership-based authorization gate.
//!
//! Reads are never restricted. Writes need an authenticated requester (collection level) and,
//! for an existing snippet, that requester must be the snippet's owner (object level).

use crate::domain::model::{Owner, Snippet};
use axum::http::Method;

/// The operation a request performs on the snippet resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Highlight,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    /// Listing, retrieval and the highlight view are the safe read class.
    pub fn is_read_only(self) -> bool {
        matches!(self, Action::List | Action::Retrieve | Action::Highlight)
    }

    /// Maps an HTTP method on either the collection (`detail == false`) or a single record.
    pub fn from_method(method: &Method, detail: bool) -> Option<Action> {
        let action = match (method, detail) {
            (m, false) if is_safe_method(m) => Action::List,
            (&Method::POST, false) => Action::Create,
            (m, true) if is_safe_method(m) => Action::Retrieve,
            (&Method::PUT, true) => Action::Update,
            (&Method::PATCH, true) => Action::PartialUpdate,
            (&Method::DELETE, true) => Action::Destroy,
            _ => return None,
        };
        Some(action)
    }
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Who is making the request. Passed explicitly to every gate and service call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Requester {
    #[default]
    Anonymous,
    Authenticated(Owner),
}

impl Requester {
    pub fn owner(&self) -> Option<&Owner> {
        match self {
            Requester::Anonymous => None,
            Requester::Authenticated(owner) => Some(owner),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.owner().is_some()
    }

    /// Username for log lines.
    pub fn label(&self) -> &str {
        self.owner().map_or("<anonymous>", |o| o.username.as_str())
    }
}

/// Why a gate said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// A write was attempted without any identity.
    Unauthenticated,
    /// The identity is known but may not perform this action on this record.
    Forbidden,
}

/// A permission check consulted before an action proceeds.
pub trait Permission: Send + Sync {
    /// Collection-level check, evaluated before any specific record is considered.
    fn has_permission(&self, _action: Action, _requester: &Requester) -> bool {
        true
    }

    /// Record-level check for an existing snippet.
    fn has_object_permission(&self, _action: Action, _requester: &Requester, _snippet: &Snippet) -> bool {
        true
    }
}

/// Writes require any authenticated identity.
pub struct IsAuthenticatedOrReadOnly;

impl Permission for IsAuthenticatedOrReadOnly {
    fn has_permission(&self, action: Action, requester: &Requester) -> bool {
        action.is_read_only() || requester.is_authenticated()
    }
}

/// Writes require the requester to be the snippet's owner.
pub struct IsOwnerOrReadOnly;

impl Permission for IsOwnerOrReadOnly {
    fn has_object_permission(&self, action: Action, requester: &Requester, snippet: &Snippet) -> bool {
        if action.is_read_only() {
            return true;
        }
        // An unset owner never matches, whoever asks.
        match (snippet.owner.as_ref(), requester.owner()) {
            (Some(owner), Some(who)) => owner == who,
            _ => false,
        }
    }
}

/// The permission classes guarding the snippet resource, in evaluation order.
pub const SNIPPET_PERMISSIONS: &[&dyn Permission] = &[&IsAuthenticatedOrReadOnly, &IsOwnerOrReadOnly];

/// Collection-level gate (list and create).
pub fn check_collection(action: Action, requester: &Requester) -> Result<(), Denial> {
    for permission in SNIPPET_PERMISSIONS {
        if !permission.has_permission(action, requester) {
            return Err(denial_for(requester));
        }
    }
    Ok(())
}

/// Full gate for an existing record: collection checks first, then object checks.
pub fn check_object(action: Action, requester: &Requester, snippet: &Snippet) -> Result<(), Denial> {
    check_collection(action, requester)?;
    for permission in SNIPPET_PERMISSIONS {
        if !permission.has_object_permission(action, requester, snippet) {
            return Err(denial_for(requester));
        }
    }
    Ok(())
}

/// `permit(method, requester, record)`: the boolean form of [`check_object`].
pub fn permit(action: Action, requester: &Requester, snippet: &Snippet) -> bool {
    check_object(action, requester, snippet).is_ok()
}

fn denial_for(requester: &Requester) -> Denial {
    if requester.is_authenticated() {
        Denial::Forbidden
    } else {
        Denial::Unauthenticated
    }
}
