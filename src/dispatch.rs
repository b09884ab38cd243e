//! Render commands and the per-session queues that carry them.
//!
//! The poll thread never touches a session's socket. It enqueues commands on
//! the session's queue and the session task, which owns the socket, applies
//! them in order.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::sample::{Point, Sample};

/// The charts a session displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chart {
    Now,
    Today,
    Yesterday,
}

/// One update for a session's charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Append points; when `rollover` is set, keep only that many.
    Stream {
        chart: Chart,
        points: Vec<Point>,
        rollover: Option<usize>,
    },
    /// Replace the chart's data wholesale.
    Replace { chart: Chart, points: Vec<Point> },
}

impl RenderCommand {
    pub fn stream(chart: Chart, samples: &[Sample], rollover: Option<usize>) -> Self {
        RenderCommand::Stream {
            chart,
            points: samples.iter().map(Sample::point).collect(),
            rollover,
        }
    }

    pub fn replace(chart: Chart, samples: &[Sample]) -> Self {
        RenderCommand::Replace {
            chart,
            points: samples.iter().map(Sample::point).collect(),
        }
    }

    pub fn chart(&self) -> Chart {
        match self {
            RenderCommand::Stream { chart, .. } | RenderCommand::Replace { chart, .. } => *chart,
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            RenderCommand::Stream { points, .. } | RenderCommand::Replace { points, .. } => points,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Sending half of a session's render queue.
#[derive(Debug, Clone)]
pub struct SessionQueue {
    tx: mpsc::UnboundedSender<RenderCommand>,
}

/// Receiving half, owned by the session task.
pub type SessionReceiver = mpsc::UnboundedReceiver<RenderCommand>;

impl SessionQueue {
    /// Creates a queue and the receiver the session task drains.
    pub fn channel() -> (Self, SessionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Schedules a command for the session. Returns false if the session
    /// has already gone away.
    pub fn schedule(&self, command: RenderCommand) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(_) => {
                debug!("Session queue closed, dropping render command");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
