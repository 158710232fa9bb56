use crate::audio::listener::UtteranceSource;
use crate::config::{HistoryConfig, InteractiveConfig};
use crate::error::{Result, VoxlateError};
use crate::history::{SharedHistory, TranslationRecord};
use crate::interactive::commands::{CommandSource, ControlCommand};
use crate::pipeline::{Pipeline, PipelineOutput};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// State of the interactive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Listening,
    Paused,
    /// Transient: history is displayed, then the previous state resumes.
    ShowingHistory,
    Terminated,
}

impl ControllerState {
    /// State after `command`. `ShowHistory` returns the transient state;
    /// the controller restores the previous one once history is shown.
    pub fn on(self, command: ControlCommand) -> Self {
        match (self, command) {
            (Self::Terminated, _) | (_, ControlCommand::Quit) => Self::Terminated,
            (_, ControlCommand::ShowHistory) => Self::ShowingHistory,
            (Self::Listening, ControlCommand::TogglePause) => Self::Paused,
            (Self::Paused, ControlCommand::TogglePause) => Self::Listening,
            (Self::ShowingHistory, ControlCommand::TogglePause) => Self::ShowingHistory,
        }
    }
}

/// Receives what the loop does, for display.
pub trait ControllerEvents: Send {
    fn state_changed(&mut self, state: ControllerState);
    fn translated(&mut self, output: &PipelineOutput);
    fn history(&mut self, records: &[TranslationRecord]);
    fn error(&mut self, error: &VoxlateError);

    /// Nothing was said before the phrase timeout.
    fn nothing_heard(&mut self) {}
}

/// Recorded controller event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    State(ControllerState),
    Translated(PipelineOutput),
    History(Vec<TranslationRecord>),
    Error(String),
    NothingHeard,
}

/// Collects events into a shared list. Clones share the list.
#[derive(Debug, Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<ControllerEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ControllerEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// States entered, in order.
    pub fn states(&self) -> Vec<ControllerState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ControllerEvent::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ControllerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ControllerEvents for EventCollector {
    fn state_changed(&mut self, state: ControllerState) {
        self.push(ControllerEvent::State(state));
    }

    fn translated(&mut self, output: &PipelineOutput) {
        self.push(ControllerEvent::Translated(output.clone()));
    }

    fn history(&mut self, records: &[TranslationRecord]) {
        self.push(ControllerEvent::History(records.to_vec()));
    }

    fn error(&mut self, error: &VoxlateError) {
        self.push(ControllerEvent::Error(error.to_string()));
    }

    fn nothing_heard(&mut self) {
        self.push(ControllerEvent::NothingHeard);
    }
}

/// Loop timing and display settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub target_language: String,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    pub recent_count: usize,
}

impl ControllerConfig {
    pub fn new(target_language: &str, interactive: &InteractiveConfig, history: &HistoryConfig) -> Self {
        Self {
            target_language: target_language.to_string(),
            poll_interval: Duration::from_millis(interactive.poll_interval_ms),
            error_backoff: Duration::from_millis(interactive.error_backoff_ms),
            recent_count: history.recent_count,
        }
    }
}

/// Drives the pipeline from microphone utterances under keyboard control.
pub struct Controller {
    state: ControllerState,
    pipeline: Arc<Pipeline>,
    history: SharedHistory,
    utterances: Box<dyn UtteranceSource>,
    commands: Box<dyn CommandSource>,
    events: Box<dyn ControllerEvents>,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(
        pipeline: Arc<Pipeline>,
        history: SharedHistory,
        utterances: Box<dyn UtteranceSource>,
        commands: Box<dyn CommandSource>,
        events: Box<dyn ControllerEvents>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            state: ControllerState::Listening,
            pipeline,
            history,
            utterances,
            commands,
            events,
            config,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Run until the user quits.
    ///
    /// Pipeline and capture errors are reported and followed by a backoff;
    /// they never end the loop.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(language = %self.config.target_language, "interactive loop started");

        loop {
            while let Some(command) = self.commands.poll_for_command() {
                self.handle(command).await;
            }

            match self.state {
                ControllerState::Terminated => break,
                ControllerState::Listening => {
                    if let Err(e) = self.listen_once().await {
                        tracing::error!("{e}: {}", e.detail());
                        self.events.error(&e);
                        tokio::time::sleep(self.config.error_backoff).await;
                        continue;
                    }
                }
                ControllerState::Paused | ControllerState::ShowingHistory => {}
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }

        tracing::info!("interactive loop stopped");
        Ok(())
    }

    async fn handle(&mut self, command: ControlCommand) {
        let previous = self.state;
        let next = previous.on(command);
        if next == previous {
            return;
        }

        self.state = next;
        self.events.state_changed(next);

        if next == ControllerState::ShowingHistory {
            let recent = self.history.lock().await.recent(self.config.recent_count);
            self.events.history(&recent);
            self.state = previous;
            self.events.state_changed(previous);
        }
    }

    async fn listen_once(&mut self) -> Result<()> {
        let Some(asset) = self.utterances.next_utterance().await? else {
            self.events.nothing_heard();
            return Ok(());
        };

        let output = self
            .pipeline
            .run_asset(&asset, &self.config.target_language)
            .await?;
        self.events.translated(&output);
        Ok(())
    }
}
