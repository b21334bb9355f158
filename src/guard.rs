//! The navigation guard.
//!
//! `NavigationGuard` watches a set of trackable panels, remembers which one was
//! active last, and intercepts every activation. When the panel being left still
//! holds unsaved changes, the guard focuses it, asks the user through an
//! [`ExitPrompt`], and acts on the verdict before letting the transition finish.
//!
//! The guard lives behind an `Rc` so the handlers it attaches to each panel's
//! [`LifecycleEvents`] can reach it through a weak reference. Its state sits in a
//! `RefCell` and no borrow is held while calling out to a panel or to the
//! prompt: focus changes made during a resolution re-enter [`activate`] and are
//! dropped by the re-entry flag instead of tripping the borrow checker.
//!
//! [`LifecycleEvents`]: crate::lifecycle::LifecycleEvents
//! [`activate`]: NavigationGuard::activate

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::GuardConfig;
use crate::exit_request::{ExitPrompt, ExitVerdict, request_exit};
use crate::lifecycle::{LifecycleEvent, SubscriptionId};
use crate::trackable::TrackableRef;

/// What a single activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationOutcome {
    /// Raised while an exit request was already being resolved; ignored.
    Suppressed,
    /// No decision needed; the activated panel is now the last active one.
    PassThrough,
    /// The previous panel was committed and the transition completed.
    Saved,
    /// The previous panel's changes were dropped and the transition completed.
    Discarded,
    /// The user refused to leave the previous panel.
    Denied,
    /// The user chose to save but the commit failed; the transition was refused.
    SaveFailed,
}

impl ActivationOutcome {
    /// Whether the activated panel ended up as the last active one.
    pub fn completed(self) -> bool {
        matches!(
            self,
            ActivationOutcome::PassThrough | ActivationOutcome::Saved | ActivationOutcome::Discarded
        )
    }
}

#[derive(Debug)]
struct Attachment {
    panel: TrackableRef,
    subscription: SubscriptionId,
}

#[derive(Debug, Default)]
struct GuardState {
    watched: Vec<TrackableRef>,
    last_active: Option<TrackableRef>,
    suppress_reentry: bool,
    attachments: Vec<Attachment>,
}

impl GuardState {
    fn is_watched(&self, panel: &TrackableRef) -> bool {
        self.watched.contains(panel)
    }

    fn watch(&mut self, panel: &TrackableRef) -> bool {
        if self.is_watched(panel) {
            return false;
        }
        self.watched.push(panel.clone());
        true
    }

    fn unwatch(&mut self, panel: &TrackableRef) -> bool {
        match self.watched.iter().position(|p| p == panel) {
            Some(idx) => {
                self.watched.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    fn is_attached(&self, panel: &TrackableRef) -> bool {
        self.attachments.iter().any(|a| a.panel == *panel)
    }

    fn detach(&mut self, panel: &TrackableRef) -> Option<Attachment> {
        let idx = self.attachments.iter().position(|a| a.panel == *panel)?;
        Some(self.attachments.swap_remove(idx))
    }
}

/// Holds the re-entry flag up for the lifetime of one exit-request resolution.
struct ReentryGuard<'a> {
    state: &'a RefCell<GuardState>,
}

impl<'a> ReentryGuard<'a> {
    fn engage(state: &'a RefCell<GuardState>) -> Self {
        state.borrow_mut().suppress_reentry = true;
        Self { state }
    }
}

impl Drop for ReentryGuard<'_> {
    fn drop(&mut self) {
        // try_borrow_mut: a collaborator may have panicked while we unwind.
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.suppress_reentry = false;
        }
    }
}

/// Per-session coordinator that asks before leaving a panel with unsaved work.
pub struct NavigationGuard {
    state: RefCell<GuardState>,
    prompt: Box<dyn ExitPrompt>,
    config: GuardConfig,
    this: Weak<NavigationGuard>,
}

impl fmt::Debug for NavigationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NavigationGuard {
    /// A guard with the default [`GuardConfig`] that asks through `prompt`.
    pub fn new<P>(prompt: P) -> Rc<Self>
    where
        P: ExitPrompt + 'static,
    {
        Self::with_config(prompt, GuardConfig::default())
    }

    /// A guard that asks through `prompt` and handles failed saves per `config`.
    pub fn with_config<P>(prompt: P, config: GuardConfig) -> Rc<Self>
    where
        P: ExitPrompt + 'static,
    {
        Rc::new_cyclic(|this| Self {
            state: RefCell::new(GuardState::default()),
            prompt: Box::new(prompt),
            config,
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Start tracking `panel`: watch it and attach the guard's lifecycle
    /// handlers. Registering an already registered panel changes nothing.
    pub fn register(&self, panel: &TrackableRef) {
        if !self.state.borrow().is_attached(panel) {
            let subscription = self.attach_handlers(panel);
            self.state.borrow_mut().attachments.push(Attachment {
                panel: panel.clone(),
                subscription,
            });
            tracing::debug!(label = %panel.label(), "registered panel");
        }
        self.watch(panel);
    }

    /// Stop tracking `panel` and detach the guard's handlers. A no-op for
    /// panels that were never registered.
    pub fn unregister(&self, panel: &TrackableRef) {
        let detached = {
            let mut state = self.state.borrow_mut();
            state.unwatch(panel);
            state.detach(panel)
        };
        if let Some(attachment) = detached {
            attachment.panel.events().unsubscribe(attachment.subscription);
            tracing::debug!(label = %panel.label(), "unregistered panel");
        }
    }

    /// Re-sync watched membership with the panel's visibility. Handlers stay
    /// attached either way, so a hidden panel resumes tracking once shown.
    pub fn watch_if_visible(&self, panel: &TrackableRef) {
        if panel.is_visible() {
            self.watch(panel);
        } else {
            self.ignore(panel);
        }
    }

    fn watch(&self, panel: &TrackableRef) {
        if self.state.borrow_mut().watch(panel) {
            tracing::trace!(label = %panel.label(), "watching panel");
        }
    }

    fn ignore(&self, panel: &TrackableRef) {
        if self.state.borrow_mut().unwatch(panel) {
            tracing::trace!(label = %panel.label(), "ignoring panel");
        }
    }

    fn attach_handlers(&self, panel: &TrackableRef) -> SubscriptionId {
        let guard = self.this.clone();
        let sender = panel.downgrade();
        panel.events().subscribe(move |event| {
            let (Some(guard), Some(sender)) = (guard.upgrade(), sender.upgrade()) else {
                return;
            };
            guard.handle_event(&sender, event);
        })
    }

    /// Route a lifecycle notification raised by `panel`.
    pub fn handle_event(&self, panel: &TrackableRef, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Activated => {
                self.activate(panel);
            }
            LifecycleEvent::Closed => self.unregister(panel),
            LifecycleEvent::VisibilityChanged => self.watch_if_visible(panel),
        }
    }

    /// Handle `current` becoming active.
    ///
    /// If the previously active panel holds unsaved changes the user is asked
    /// what to do before `current` is accepted as the new last active panel.
    /// Whatever the answer, focus is handed back to the panel that ends up last
    /// active.
    pub fn activate(&self, current: &TrackableRef) -> ActivationOutcome {
        let (previous, previous_watched) = {
            let state = self.state.borrow();
            if state.suppress_reentry {
                tracing::trace!(label = %current.label(), "activation suppressed during exit request");
                return ActivationOutcome::Suppressed;
            }
            let watched = state
                .last_active
                .as_ref()
                .is_some_and(|prev| state.is_watched(prev));
            (state.last_active.clone(), watched)
        };

        let Some(previous) = previous.filter(|prev| {
            prev != current
                && prev.has_unsaved_changes()
                && (previous_watched || !self.config.skip_unwatched_previous)
        }) else {
            self.set_last_active(current);
            return ActivationOutcome::PassThrough;
        };

        let _reentry = ReentryGuard::engage(&self.state);
        tracing::debug!(
            from = %previous.label(),
            to = %current.label(),
            "leaving panel with unsaved changes"
        );
        previous.take_focus();
        let outcome = self.resolve_exit(&previous, current);
        let focus = self.last_active();
        if let Some(panel) = focus {
            panel.take_focus();
        }
        tracing::info!(
            from = %previous.label(),
            to = %current.label(),
            ?outcome,
            "exit request finished"
        );
        outcome
    }

    fn resolve_exit(&self, previous: &TrackableRef, current: &TrackableRef) -> ActivationOutcome {
        let budget = self.config.prompt_budget();
        for attempt in 1..=budget {
            match request_exit(self.prompt.as_ref(), &**previous) {
                ExitVerdict::AllowAndSave => {
                    let committed = previous
                        .saveable()
                        .map_or(Ok(()), |facet| facet.commit_changes());
                    match committed {
                        Ok(()) => {
                            self.set_last_active(current);
                            return ActivationOutcome::Saved;
                        }
                        Err(err) => {
                            tracing::warn!(
                                error = %err,
                                attempt,
                                budget,
                                "commit failed; keeping panel active"
                            );
                        }
                    }
                }
                ExitVerdict::AllowWithoutSave => {
                    self.set_last_active(current);
                    return ActivationOutcome::Discarded;
                }
                ExitVerdict::Deny => return ActivationOutcome::Denied,
            }
        }
        ActivationOutcome::SaveFailed
    }

    /// The panel the guard considers active, if any.
    pub fn last_active(&self) -> Option<TrackableRef> {
        self.state.borrow().last_active.clone()
    }

    /// Seed the last active panel without running any interception.
    pub fn set_last_active(&self, panel: &TrackableRef) {
        self.state.borrow_mut().last_active = Some(panel.clone());
    }

    pub fn clear_last_active(&self) {
        self.state.borrow_mut().last_active = None;
    }

    pub fn is_watched(&self, panel: &TrackableRef) -> bool {
        self.state.borrow().is_watched(panel)
    }

    /// Whether the guard's handlers are attached to `panel`.
    pub fn is_registered(&self, panel: &TrackableRef) -> bool {
        self.state.borrow().is_attached(panel)
    }

    /// Number of registered panels that are currently visible.
    pub fn watched_len(&self) -> usize {
        self.state.borrow().watched.len()
    }

    /// True only while an exit request is being resolved.
    pub fn is_resolving(&self) -> bool {
        self.state.borrow().suppress_reentry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SaveFailurePolicy;
    use crate::exit_request::{ExitRequest, PromptChoice};
    use crate::lifecycle::LifecycleEvents;
    use crate::trackable::{SaveError, Saveable, Trackable};
    use std::cell::Cell;

    struct Stub {
        label: &'static str,
        visible: Cell<bool>,
        dirty: Cell<bool>,
        saveable: bool,
        fail_commits: Cell<usize>,
        commits: Cell<usize>,
        focus_calls: Cell<usize>,
        events: LifecycleEvents,
    }

    impl Stub {
        fn plain(label: &'static str) -> Rc<Self> {
            Rc::new(Self::build(label, false, false))
        }

        fn editable(label: &'static str, dirty: bool) -> Rc<Self> {
            Rc::new(Self::build(label, true, dirty))
        }

        fn build(label: &'static str, saveable: bool, dirty: bool) -> Self {
            Self {
                label,
                visible: Cell::new(true),
                dirty: Cell::new(dirty),
                saveable,
                fail_commits: Cell::new(0),
                commits: Cell::new(0),
                focus_calls: Cell::new(0),
                events: LifecycleEvents::new(),
            }
        }
    }

    impl Trackable for Stub {
        fn label(&self) -> String {
            self.label.to_string()
        }
        fn is_visible(&self) -> bool {
            self.visible.get()
        }
        fn take_focus(&self) -> bool {
            self.focus_calls.set(self.focus_calls.get() + 1);
            // Focus raises activation, as a toolkit would.
            self.events.emit(LifecycleEvent::Activated);
            true
        }
        fn events(&self) -> &LifecycleEvents {
            &self.events
        }
        fn saveable(&self) -> Option<&dyn Saveable> {
            self.saveable.then_some(self as &dyn Saveable)
        }
    }

    impl Saveable for Stub {
        fn has_unsaved_changes(&self) -> bool {
            self.dirty.get()
        }
        fn commit_changes(&self) -> Result<(), SaveError> {
            self.commits.set(self.commits.get() + 1);
            if self.fail_commits.get() > 0 {
                self.fail_commits.set(self.fail_commits.get() - 1);
                return Err(SaveError::rejected(self.label, "read-only"));
            }
            self.dirty.set(false);
            Ok(())
        }
    }

    fn scripted(answers: Vec<Option<PromptChoice>>) -> (impl ExitPrompt, Rc<Cell<usize>>) {
        let asked = Rc::new(Cell::new(0));
        let counter = asked.clone();
        let answers = RefCell::new(answers.into_iter());
        let prompt = move |_: &ExitRequest| {
            counter.set(counter.get() + 1);
            answers.borrow_mut().next().flatten()
        };
        (prompt, asked)
    }

    fn setup(
        answers: Vec<Option<PromptChoice>>,
        config: GuardConfig,
    ) -> (Rc<NavigationGuard>, Rc<Stub>, Rc<Stub>, Rc<Cell<usize>>) {
        let (prompt, asked) = scripted(answers);
        let guard = NavigationGuard::with_config(prompt, config);
        let report = Stub::editable("Report", true);
        let viewer = Stub::plain("Viewer");
        guard.register(&TrackableRef::from(report.clone()));
        guard.register(&TrackableRef::from(viewer.clone()));
        guard.set_last_active(&TrackableRef::from(report.clone()));
        (guard, report, viewer, asked)
    }

    #[test]
    fn register_twice_keeps_one_membership_and_one_subscription() {
        let (prompt, _) = scripted(vec![]);
        let guard = NavigationGuard::new(prompt);
        let a = Stub::plain("A");
        let r = TrackableRef::from(a.clone());
        guard.register(&r);
        guard.register(&r);
        assert_eq!(guard.watched_len(), 1);
        assert_eq!(a.events.subscriber_count(), 1);
    }

    #[test]
    fn unregister_unknown_panel_is_noop() {
        let (prompt, _) = scripted(vec![]);
        let guard = NavigationGuard::new(prompt);
        let r = TrackableRef::from(Stub::plain("A"));
        guard.unregister(&r);
        guard.unregister(&r);
        assert_eq!(guard.watched_len(), 0);
        assert!(!guard.is_registered(&r));
    }

    #[test]
    fn reactivating_last_active_never_prompts() {
        let (guard, report, _viewer, asked) = setup(vec![], GuardConfig::default());
        let outcome = guard.activate(&TrackableRef::from(report.clone()));
        assert_eq!(outcome, ActivationOutcome::PassThrough);
        assert_eq!(asked.get(), 0);
    }

    #[test]
    fn clean_previous_passes_through() {
        let (guard, report, viewer, asked) = setup(vec![], GuardConfig::default());
        report.dirty.set(false);
        let v = TrackableRef::from(viewer.clone());
        assert_eq!(guard.activate(&v), ActivationOutcome::PassThrough);
        assert_eq!(guard.last_active(), Some(v));
        assert_eq!(asked.get(), 0);
    }

    #[test]
    fn plain_previous_never_prompts() {
        let (prompt, asked) = scripted(vec![]);
        let guard = NavigationGuard::new(prompt);
        let viewer = TrackableRef::from(Stub::plain("Viewer"));
        let other = TrackableRef::from(Stub::plain("Other"));
        guard.set_last_active(&viewer);
        assert_eq!(guard.activate(&other), ActivationOutcome::PassThrough);
        assert_eq!(asked.get(), 0);
    }

    #[test]
    fn discard_moves_on_without_commit() {
        let (guard, report, viewer, asked) =
            setup(vec![Some(PromptChoice::Discard)], GuardConfig::default());
        let v = TrackableRef::from(viewer.clone());
        assert_eq!(guard.activate(&v), ActivationOutcome::Discarded);
        assert_eq!(guard.last_active(), Some(v));
        assert_eq!(report.commits.get(), 0);
        assert_eq!(asked.get(), 1);
    }

    #[test]
    fn save_commits_once_then_moves_on() {
        let (guard, report, viewer, asked) =
            setup(vec![Some(PromptChoice::Save)], GuardConfig::default());
        let v = TrackableRef::from(viewer.clone());
        assert_eq!(guard.activate(&v), ActivationOutcome::Saved);
        assert_eq!(report.commits.get(), 1);
        assert!(!report.dirty.get());
        assert_eq!(guard.last_active(), Some(v));
        assert_eq!(asked.get(), 1);
    }

    #[test]
    fn cancel_and_dismiss_keep_previous() {
        for answer in [Some(PromptChoice::Cancel), None] {
            let (guard, report, viewer, asked) = setup(vec![answer], GuardConfig::default());
            let outcome = guard.activate(&TrackableRef::from(viewer.clone()));
            assert_eq!(outcome, ActivationOutcome::Denied);
            assert_eq!(guard.last_active(), Some(TrackableRef::from(report.clone())));
            assert_eq!(asked.get(), 1);
        }
    }

    #[test]
    fn focus_side_effects_do_not_prompt_again() {
        let (guard, report, viewer, asked) =
            setup(vec![Some(PromptChoice::Cancel)], GuardConfig::default());
        // Activation arrives through the subscription, the same path focus uses.
        viewer.events.emit(LifecycleEvent::Activated);
        assert_eq!(asked.get(), 1);
        // Focus went to the dirty panel before the prompt and again afterwards.
        assert_eq!(report.focus_calls.get(), 2);
        assert!(!guard.is_resolving());
        assert_eq!(guard.last_active(), Some(TrackableRef::from(report.clone())));
    }

    #[test]
    fn allowed_transition_refocuses_new_panel() {
        let (guard, _report, viewer, _) =
            setup(vec![Some(PromptChoice::Discard)], GuardConfig::default());
        guard.activate(&TrackableRef::from(viewer.clone()));
        assert_eq!(viewer.focus_calls.get(), 1);
    }

    #[test]
    fn failed_save_with_deny_policy_keeps_previous() {
        let config = GuardConfig::new().with_save_failure_policy(SaveFailurePolicy::Deny);
        let (guard, report, viewer, asked) = setup(vec![Some(PromptChoice::Save)], config);
        report.fail_commits.set(1);
        let outcome = guard.activate(&TrackableRef::from(viewer.clone()));
        assert_eq!(outcome, ActivationOutcome::SaveFailed);
        assert!(report.dirty.get());
        assert_eq!(guard.last_active(), Some(TrackableRef::from(report.clone())));
        assert_eq!(asked.get(), 1);
    }

    #[test]
    fn failed_save_reprompts_until_success() {
        let (guard, report, viewer, asked) = setup(
            vec![Some(PromptChoice::Save), Some(PromptChoice::Save)],
            GuardConfig::default(),
        );
        report.fail_commits.set(1);
        let v = TrackableRef::from(viewer.clone());
        assert_eq!(guard.activate(&v), ActivationOutcome::Saved);
        assert_eq!(asked.get(), 2);
        assert_eq!(report.commits.get(), 2);
        assert_eq!(guard.last_active(), Some(v));
    }

    #[test]
    fn reprompt_budget_is_bounded() {
        let config = GuardConfig::new().with_max_save_attempts(2);
        let (guard, report, viewer, asked) = setup(vec![Some(PromptChoice::Save); 5], config);
        report.fail_commits.set(10);
        let outcome = guard.activate(&TrackableRef::from(viewer.clone()));
        assert_eq!(outcome, ActivationOutcome::SaveFailed);
        assert_eq!(asked.get(), 2);
    }

    #[test]
    fn reprompt_allows_discard_after_failure() {
        let (guard, report, viewer, _) = setup(
            vec![Some(PromptChoice::Save), Some(PromptChoice::Discard)],
            GuardConfig::default(),
        );
        report.fail_commits.set(1);
        let outcome = guard.activate(&TrackableRef::from(viewer.clone()));
        assert_eq!(outcome, ActivationOutcome::Discarded);
        assert!(outcome.completed());
    }

    #[test]
    fn hidden_previous_prompts_unless_configured_to_skip() {
        let (guard, report, viewer, asked) =
            setup(vec![Some(PromptChoice::Cancel)], GuardConfig::default());
        report.visible.set(false);
        report.events.emit(LifecycleEvent::VisibilityChanged);
        assert!(!guard.is_watched(&TrackableRef::from(report.clone())));
        guard.activate(&TrackableRef::from(viewer.clone()));
        assert_eq!(asked.get(), 1);

        let config = GuardConfig::new().with_skip_unwatched_previous(true);
        let (guard, report, viewer, asked) = setup(vec![], config);
        report.visible.set(false);
        report.events.emit(LifecycleEvent::VisibilityChanged);
        let outcome = guard.activate(&TrackableRef::from(viewer.clone()));
        assert_eq!(outcome, ActivationOutcome::PassThrough);
        assert_eq!(asked.get(), 0);
    }

    #[test]
    fn visibility_toggle_keeps_handlers_attached() {
        let (guard, report, _viewer, _) = setup(vec![], GuardConfig::default());
        let r = TrackableRef::from(report.clone());
        report.visible.set(false);
        report.events.emit(LifecycleEvent::VisibilityChanged);
        assert!(!guard.is_watched(&r));
        assert!(guard.is_registered(&r));
        assert_eq!(report.events.subscriber_count(), 1);
        report.visible.set(true);
        report.events.emit(LifecycleEvent::VisibilityChanged);
        assert!(guard.is_watched(&r));
        assert_eq!(report.events.subscriber_count(), 1);
    }

    #[test]
    fn close_unregisters_but_keeps_last_active() {
        let (guard, report, _viewer, _) = setup(vec![], GuardConfig::default());
        let r = TrackableRef::from(report.clone());
        report.events.emit(LifecycleEvent::Closed);
        assert!(!guard.is_watched(&r));
        assert!(!guard.is_registered(&r));
        assert_eq!(report.events.subscriber_count(), 0);
        assert_eq!(guard.last_active(), Some(r));
    }

    #[test]
    fn reentry_flag_resets_after_prompt_panic() {
        let guard = NavigationGuard::new(|_: &ExitRequest| -> Option<PromptChoice> {
            panic!("prompt exploded")
        });
        let report = TrackableRef::from(Stub::editable("Report", true));
        let viewer = TrackableRef::from(Stub::plain("Viewer"));
        guard.set_last_active(&report);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            guard.activate(&viewer);
        }));
        assert!(result.is_err());
        assert!(!guard.is_resolving());
    }

    #[test]
    fn dropped_guard_leaves_handlers_inert() {
        let (prompt, _) = scripted(vec![]);
        let guard = NavigationGuard::new(prompt);
        let a = Stub::plain("A");
        guard.register(&TrackableRef::from(a.clone()));
        drop(guard);
        a.events.emit(LifecycleEvent::Activated);
        a.events.emit(LifecycleEvent::Closed);
    }
}
