//! The sink the feed drives when its visible rows change.
//!
//! The feed never draws anything itself. It tells a `Renderer` which groups
//! and rows to create, redraw or drop, keyed by group id and message id.
//! `ChannelRenderer` forwards those instructions as owned `RenderCommand`s
//! to whichever thread owns the UI.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::feed::group::{GroupId, MessageContainer, MessageGroup};
use crate::message::MessageId;

/// Where a newly materialized group goes relative to the rendered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Top,
    Bottom,
}

/// A rendered element the feed wants released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTarget {
    Group(GroupId),
    Message(MessageId),
}

pub trait Renderer {
    /// Create rows for a whole group at one end of the list.
    fn materialize(&mut self, group: &MessageGroup, placement: Placement);
    fn dispose(&mut self, target: RowTarget);
    /// Add one row to the end of an already materialized group.
    fn append(&mut self, group: &MessageGroup, container: &MessageContainer);
    /// Redraw a materialized group from scratch.
    fn rerender(&mut self, group: &MessageGroup);
    /// Restyle a single row in place.
    fn refresh_row(&mut self, group: &MessageGroup, container: &MessageContainer);
}

/// Render instructions sent to the UI thread
#[derive(Debug, Clone)]
pub enum RenderCommand {
    Materialize {
        group: MessageGroup,
        placement: Placement,
    },
    Dispose(RowTarget),
    Append {
        group_id: GroupId,
        container: MessageContainer,
    },
    Rerender(MessageGroup),
    RefreshRow {
        group_id: GroupId,
        container: MessageContainer,
    },
}

/// Renderer that queues commands on a channel.
pub struct ChannelRenderer {
    tx: Sender<RenderCommand>,
}

impl ChannelRenderer {
    pub fn new(tx: Sender<RenderCommand>) -> Self {
        Self { tx }
    }

    /// Create a renderer together with the receiving end for the UI thread.
    pub fn channel() -> (Self, Receiver<RenderCommand>) {
        let (tx, rx) = unbounded();
        (Self::new(tx), rx)
    }

    fn send(&self, command: RenderCommand) {
        // The UI may already be gone during shutdown
        if self.tx.send(command).is_err() {
            tracing::debug!("render command dropped, receiver disconnected");
        }
    }
}

impl Renderer for ChannelRenderer {
    fn materialize(&mut self, group: &MessageGroup, placement: Placement) {
        self.send(RenderCommand::Materialize {
            group: group.clone(),
            placement,
        });
    }

    fn dispose(&mut self, target: RowTarget) {
        self.send(RenderCommand::Dispose(target));
    }

    fn append(&mut self, group: &MessageGroup, container: &MessageContainer) {
        self.send(RenderCommand::Append {
            group_id: group.group_id,
            container: container.clone(),
        });
    }

    fn rerender(&mut self, group: &MessageGroup) {
        self.send(RenderCommand::Rerender(group.clone()));
    }

    fn refresh_row(&mut self, group: &MessageGroup, container: &MessageContainer) {
        self.send(RenderCommand::RefreshRow {
            group_id: group.group_id,
            container: container.clone(),
        });
    }
}
