//! The inbound command loop.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use openwire_core::commands::MessageDispatch;
use openwire_core::{DataStructure, OpenWireCodec, Pointer, Result};

use crate::correlator::ResponseCorrelator;
use crate::dispatch::MessageDispatcher;
use crate::listener::CommandListener;

/// Counts of what a pump run routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    pub responses: u64,
    pub dispatches: u64,
    pub other: u64,
}

impl PumpSummary {
    /// Returns the number of commands read.
    pub fn total(&self) -> u64 {
        self.responses + self.dispatches + self.other
    }
}

/// Reads commands from a connection and routes each one.
///
/// Responses complete the correlator's pending slots, message dispatches go to the dispatcher and
/// everything else goes to the optional command listener. Commands with nowhere to go are logged
/// and dropped.
pub struct CommandPump {
    correlator: Arc<ResponseCorrelator>,
    dispatcher: Arc<MessageDispatcher>,
    command_listener: Option<Arc<dyn CommandListener>>,
}

impl CommandPump {
    /// Creates a pump routing into `correlator` and `dispatcher`.
    pub fn new(correlator: Arc<ResponseCorrelator>, dispatcher: Arc<MessageDispatcher>) -> Self {
        Self {
            correlator,
            dispatcher,
            command_listener: None,
        }
    }

    /// Sets the listener that receives commands that are neither responses nor dispatches.
    pub fn with_command_listener(mut self, listener: Arc<dyn CommandListener>) -> Self {
        self.command_listener = Some(listener);
        self
    }

    /// Decodes frames from `reader` with `codec` until the stream ends.
    ///
    /// # Errors
    ///
    /// Returns the first decoding or I/O error. Nothing after a corrupt frame is read.
    pub async fn run<R>(&self, reader: R, codec: OpenWireCodec) -> Result<PumpSummary>
    where
        R: AsyncRead + Unpin,
    {
        self.run_stream(FramedRead::new(reader, codec)).await
    }

    /// Routes commands from an already framed stream until it ends.
    pub async fn run_stream<S>(&self, mut commands: S) -> Result<PumpSummary>
    where
        S: Stream<Item = Result<Box<dyn DataStructure>>> + Unpin,
    {
        let mut summary = PumpSummary::default();
        while let Some(command) = commands.next().await {
            let command = match command {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!(error = %e, routed = summary.total(), "inbound stream failed");
                    return Err(e);
                }
            };
            self.route(command, &mut summary)?;
        }
        tracing::debug!(routed = summary.total(), "inbound stream ended");
        Ok(summary)
    }

    /// Routes one decoded command.
    pub fn route(&self, mut command: Box<dyn DataStructure>, summary: &mut PumpSummary) -> Result<()> {
        if command.as_command().is_some_and(|c| c.is_response()) {
            summary.responses += 1;
            self.correlator.complete(Pointer::from_box(command))?;
            return Ok(());
        }

        if let Some(dispatch) = command.downcast_mut::<MessageDispatch>() {
            summary.dispatches += 1;
            self.dispatcher.dispatch(std::mem::take(dispatch));
            return Ok(());
        }

        summary.other += 1;
        match &self.command_listener {
            Some(listener) => listener.on_command(&Pointer::from_box(command)),
            None => tracing::debug!(
                type_code = command.type_code(),
                "no listener for inbound command"
            ),
        }
        Ok(())
    }
}

impl std::fmt::Debug for CommandPump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPump")
            .field("correlator", &self.correlator)
            .field("dispatcher", &self.dispatcher)
            .field("command_listener", &self.command_listener.is_some())
            .finish()
    }
}
