//! Timeline Synchronizer - Keeps per-step state in line with the backend
//!
//! Reconciles three inputs into one rendered timeline:
//! 1. The static step list of the workflow
//! 2. A one-time initial state snapshot
//! 3. Live `status_update` events, across reconnects
//!
//! Updates are last-write-wins. The transport carries no sequence numbers,
//! so a stale event cannot be told apart from a fresh one.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::sync::error::SyncError;
use crate::sync::event::{OutboundEvent, StatusUpdate};
use crate::sync::snapshot::{InitialState, SnapshotSource};
use crate::sync::view::{Banner, NoopView, Presentation, TimelineView};
use crate::timeline::{ConnectionState, Message, OverallState, StepStatus, TimelineDefinition};

pub const WORKFLOW_FAILED_MESSAGE: &str = "Workflow failed at one of the steps.";
pub const WORKFLOW_SUCCEEDED_MESSAGE: &str = "All steps completed successfully.";

/// Current visual state of one step
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStep {
    pub step_id: String,
    pub title: String,
    pub status: StepStatus,
    pub presentation: Presentation,
    pub message: Option<Message>,
    /// Text under the title: the rendered message, or the status label
    pub message_text: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RenderedStep {
    fn pending(step_id: &str, title: &str) -> Self {
        Self {
            step_id: step_id.to_string(),
            title: title.to_string(),
            status: StepStatus::Pending,
            presentation: Presentation::for_status(StepStatus::Pending),
            message: None,
            message_text: StepStatus::Pending.label().to_string(),
            updated_at: None,
        }
    }

    fn apply(&mut self, status: StepStatus, message: Option<Message>) {
        self.status = status;
        self.presentation = Presentation::for_status(status);
        self.message_text = match &message {
            Some(m) => m.render(),
            None => status.label().to_string(),
        };
        self.message = message;
        self.updated_at = Some(Utc::now());
    }
}

/// The rendered timeline: every step node plus the workflow-level indicators
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub steps: Vec<RenderedStep>,
    pub terminal: StepStatus,
    pub connection: ConnectionState,
    pub banner: Option<Banner>,
}

impl Timeline {
    fn from_definition(definition: &TimelineDefinition) -> Self {
        Self {
            steps: definition
                .steps
                .iter()
                .map(|s| RenderedStep::pending(&s.id, s.display_title()))
                .collect(),
            terminal: StepStatus::Pending,
            connection: ConnectionState::Disconnected,
            banner: None,
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&RenderedStep> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    pub fn status_of(&self, step_id: &str) -> Option<StepStatus> {
        self.step(step_id).map(|s| s.status)
    }

    pub fn overall(&self) -> OverallState {
        OverallState::from_terminal(self.terminal)
    }

    fn step_mut(&mut self, step_id: &str) -> Option<&mut RenderedStep> {
        self.steps.iter_mut().find(|s| s.step_id == step_id)
    }
}

pub struct TimelineSynchronizer<V = NoopView> {
    task_id: String,
    definition: TimelineDefinition,
    timeline: Timeline,
    initial_applied: bool,
    view: V,
}

impl TimelineSynchronizer<NoopView> {
    /// Synchronizer that renders nothing; state is read through `timeline()`
    pub fn headless(task_id: &str, definition: TimelineDefinition) -> Result<Self, SyncError> {
        Self::new(task_id, definition, NoopView)
    }
}

impl<V: TimelineView> TimelineSynchronizer<V> {
    /// Create a synchronizer for one workflow instance.
    ///
    /// A blank task id is fatal to this component: the error banner is
    /// rendered once and no updates will ever be processed.
    pub fn new(task_id: &str, definition: TimelineDefinition, mut view: V) -> Result<Self, SyncError> {
        if task_id.trim().is_empty() {
            error!("Task ID is missing; timeline cannot receive updates");
            view.render_banner(&Banner::missing_task_id());
            return Err(SyncError::MissingTaskId);
        }

        let timeline = Timeline::from_definition(&definition);
        for step in &timeline.steps {
            view.render_step(step);
        }

        Ok(Self {
            task_id: task_id.to_string(),
            definition,
            timeline,
            initial_applied: false,
            view,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn definition(&self) -> &TimelineDefinition {
        &self.definition
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn connection(&self) -> ConnectionState {
        self.timeline.connection
    }

    pub fn overall(&self) -> OverallState {
        self.timeline.overall()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Apply the page-load snapshot as if each entry were a live update.
    /// Allowed once per synchronizer.
    pub fn apply_initial_state(&mut self, snapshot: &InitialState) -> Result<(), SyncError> {
        if self.initial_applied {
            return Err(SyncError::InitialStateAlreadyApplied);
        }
        self.initial_applied = true;

        info!(task_id = %self.task_id, entries = snapshot.len(), "Applying initial state");
        for update in snapshot.ordered_updates(&self.definition) {
            self.on_status_event(update);
        }
        Ok(())
    }

    /// Load a snapshot from `source` and apply it
    pub async fn load_initial_state(&mut self, source: &SnapshotSource) -> Result<(), SyncError> {
        let snapshot = source.load().await?;
        self.apply_initial_state(&snapshot)
    }

    /// Re-render a single step. Returns false if the step id is not part of
    /// this timeline.
    pub fn update_step(&mut self, step_id: &str, status: StepStatus, message: Option<Message>) -> bool {
        let is_finish = self.definition.is_finish_step(step_id);

        let Some(step) = self.timeline.step_mut(step_id) else {
            warn!(step_id = %step_id, "Step not found in timeline, ignoring update");
            return false;
        };

        if step.status.is_regression_to(status) {
            warn!(
                step_id = %step_id,
                from = %step.status,
                to = %status,
                "Step status regressed"
            );
        }

        debug!(step_id = %step_id, status = %status, "Updating step");
        step.apply(status, message);
        self.view.render_step(step);

        if is_finish {
            self.timeline.terminal = status;
        }
        true
    }

    /// Handle one `status_update` event and derive the terminal indicator.
    ///
    /// The terminal indicator follows the latest deciding event: a `fail`
    /// from any step sets it to fail, and a later `success` on the last step
    /// sets it back to success. Earlier failed steps keep their own status.
    pub fn on_status_event(&mut self, update: StatusUpdate) {
        let StatusUpdate {
            step_id,
            status,
            message,
        } = update;

        self.update_step(&step_id, status, message);

        if status == StepStatus::Fail {
            self.set_terminal(StepStatus::Fail, WORKFLOW_FAILED_MESSAGE);
        }

        let is_last = self
            .definition
            .last_step()
            .is_some_and(|last| last.id == step_id);
        if is_last && status == StepStatus::Success {
            self.set_terminal(StepStatus::Success, WORKFLOW_SUCCEEDED_MESSAGE);
        }
    }

    /// Live channel (re)connected. Returns the join request to send; joining
    /// is idempotent on the server so this is sent on every connect.
    pub fn on_connect(&mut self) -> OutboundEvent {
        info!(task_id = %self.task_id, "Connected to live status channel");
        self.timeline.connection = ConnectionState::Connected;
        self.show_banner(Banner::connected());
        OutboundEvent::join(&self.task_id)
    }

    /// Live channel lost. Rendered steps are left as they are.
    pub fn on_disconnect(&mut self) {
        error!(task_id = %self.task_id, "Disconnected from live status channel");
        self.timeline.connection = ConnectionState::Disconnected;
        self.show_banner(Banner::disconnected());
    }

    /// Leave request to send when the watcher shuts down
    pub fn leave(&self) -> OutboundEvent {
        OutboundEvent::leave(&self.task_id)
    }

    fn set_terminal(&mut self, status: StepStatus, message: &str) {
        self.timeline.terminal = status;

        if self.definition.has_finish_step() {
            let finish = self.definition.finish_step.clone();
            self.update_step(&finish, status, Some(Message::Plain(message.to_string())));
        }
    }

    fn show_banner(&mut self, banner: Banner) {
        self.view.render_banner(&banner);
        self.timeline.banner = Some(banner);
    }
}
