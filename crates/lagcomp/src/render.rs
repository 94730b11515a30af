use std::cell::RefCell;
use std::rc::Rc;

use crate::entity::Entity;
use crate::error::Result;

/// 0 is the server's view; client views are their entity id plus one.
pub type ViewerId = u32;

pub const SERVER_VIEWER: ViewerId = 0;

pub trait RenderSink {
    /// Displays `entities` as seen by `viewer`. Ids that the sink has no
    /// slot for are a contract violation and come back as an error.
    fn render(&mut self, viewer: ViewerId, entities: &[Entity]) -> Result<()>;
}

pub type SharedSink = Rc<RefCell<dyn RenderSink>>;
