//! State reconstruction from replayed event histories.
//!
//! A [`StateRouter`] owns the (event type name → applier) table for one
//! component. Registered once at startup; each dispatch calls
//! [`StateRouter::rebuild`] against the prior history and gets a fresh
//! [`Rebuilt`] value, so no per-root state survives between dispatches.

use std::ops::Deref;

use prost::Message;
use prost_types::Any;

use crate::convert::{name_matches, type_name};
use crate::proto::EventBook;

/// State rebuilt from a prior event history.
///
/// Derefs to the state value; [`Rebuilt::exists`] reports whether the
/// history had any event pages (the aggregate "exists" iff it does).
pub struct Rebuilt<S> {
    state: S,
    exists: bool,
}

impl<S> Rebuilt<S> {
    /// True iff the prior history was non-empty.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Unwrap the state value.
    pub fn into_inner(self) -> S {
        self.state
    }
}

impl<S> Deref for Rebuilt<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

type Applier<S> = Box<dyn Fn(&mut S, &Any) + Send + Sync>;

/// Fluent (event type name → applier) table with auto-decoding.
///
/// Appliers are pure `(state, event) → state` mutations. Unknown event
/// types are skipped silently, so histories written by newer services
/// replay cleanly on older ones. Undecodable payloads of a known type
/// are skipped the same way.
///
/// ```rust,ignore
/// let state = StateRouter::<PlayerState>::new()
///     .on("PlayerRegistered", apply_registered)
///     .on("FundsDeposited", apply_deposited);
///
/// let rebuilt = state.rebuild(prior_events);
/// if rebuilt.exists() { /* ... */ }
/// ```
pub struct StateRouter<S> {
    factory: Box<dyn Fn() -> S + Send + Sync>,
    appliers: Vec<(String, Applier<S>)>,
    snapshot_loaders: Vec<(String, Applier<S>)>,
}

impl<S: Default + Send + Sync + 'static> Default for StateRouter<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Default + Send + Sync + 'static> StateRouter<S> {
    /// Router whose empty state is `S::default()`.
    pub fn new() -> Self {
        Self::with_factory(S::default)
    }
}

impl<S: 'static> StateRouter<S> {
    /// Router with a custom empty-state factory, for states whose zero
    /// value is not the right starting point.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            appliers: Vec::new(),
            snapshot_loaders: Vec::new(),
        }
    }

    /// Register a typed applier for events matching `key`.
    pub fn on<E, F>(mut self, key: impl Into<String>, applier: F) -> Self
    where
        E: Message + Default + 'static,
        F: Fn(&mut S, E) + Send + Sync + 'static,
    {
        let erased: Applier<S> = Box::new(move |state, any| {
            if let Ok(event) = E::decode(any.value.as_slice()) {
                applier(state, event);
            }
        });
        self.appliers.push((key.into(), erased));
        self
    }

    /// Register a typed snapshot loader for snapshot states matching
    /// `key`. Applied once, before any event pages.
    pub fn with_snapshot<T, F>(mut self, key: impl Into<String>, loader: F) -> Self
    where
        T: Message + Default + 'static,
        F: Fn(&mut S, T) + Send + Sync + 'static,
    {
        let erased: Applier<S> = Box::new(move |state, any| {
            if let Ok(seed) = T::decode(any.value.as_slice()) {
                loader(state, seed);
            }
        });
        self.snapshot_loaders.push((key.into(), erased));
        self
    }

    /// Apply one event to existing state. Unknown types are skipped.
    pub fn apply(&self, state: &mut S, event: &Any) {
        let trailing = type_name(&event.type_url);
        if let Some((_, applier)) = self
            .appliers
            .iter()
            .find(|(key, _)| name_matches(trailing, key))
        {
            applier(state, event);
        }
    }

    /// Rebuild state from a prior event history.
    ///
    /// Absent or page-less books yield the empty state with
    /// `exists() == false`. A snapshot prefix seeds the state before
    /// pages are applied; unknown snapshot types are skipped.
    pub fn rebuild(&self, event_book: Option<&EventBook>) -> Rebuilt<S> {
        let mut state = (self.factory)();

        let Some(book) = event_book else {
            return Rebuilt {
                state,
                exists: false,
            };
        };

        if let Some(seed) = book.snapshot.as_ref().and_then(|s| s.state.as_ref()) {
            let trailing = type_name(&seed.type_url);
            if let Some((_, loader)) = self
                .snapshot_loaders
                .iter()
                .find(|(key, _)| name_matches(trailing, key))
            {
                loader(&mut state, seed);
            }
        }

        for page in &book.pages {
            if let Some(event) = &page.event {
                self.apply(&mut state, event);
            }
        }

        Rebuilt {
            state,
            exists: !book.pages.is_empty(),
        }
    }
}
