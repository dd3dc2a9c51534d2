//! Session Ports
//!
//! Narrow interfaces to the host game session. The engine never talks to a
//! client directly; a composition root hands it implementations of these
//! traits.

pub mod dispatch;
pub mod error;
pub mod events;
pub mod router;
pub mod scripted;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use dispatch::{UiContext, UiExecutor, UiQueue, UiTask};
pub use error::SessionError;
pub use events::{DIALOG_OPTIONS_GROUP_ID, SessionEvent, VariableChanged, WidgetLoaded};
pub use router::{SessionEventRouter, SessionListener, SubscriptionId};
pub use scripted::ScriptedSession;

/// Numeric id of a session variable
pub type VariableId = i32;

/// Item id used for icon lookups
pub type ItemId = i32;

/// Opaque handle the host uses to identify a rendered dialog option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionHandle(pub u32);

/// A dialog option currently shown to the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOption {
    pub text: String,
    pub handle: OptionHandle,
}

impl DialogOption {
    pub fn new(text: impl Into<String>, handle: OptionHandle) -> Self {
        Self {
            text: text.into(),
            handle,
        }
    }
}

/// Read/write access to live session state
///
/// Reads of widget state are only valid on the UI context; see
/// [`UiExecutor`].
pub trait SessionState: Send + Sync {
    /// Current value of a session variable
    fn variable_value(&self, id: VariableId) -> Result<i32, SessionError>;

    /// Dialog options currently rendered, in display order
    fn dialog_options(&self) -> Result<Vec<DialogOption>, SessionError>;

    /// Ask the host to select (or highlight) a dialog option
    fn select_dialog_option(&self, handle: OptionHandle);
}

/// A resolved image handed back by the host's sprite/item cache
#[derive(Clone, PartialEq, Eq)]
pub struct Icon {
    /// Host-side cache key for the image
    pub key: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Icon({} {}x{})", self.key, self.width, self.height)
    }
}

/// Lazy image lookups
pub trait IconResolver: Send + Sync {
    /// Image for an item, if the host has one
    fn resolve_icon(&self, item_id: ItemId) -> Option<Icon>;

    /// The quest tab sprite shown next to quest names
    fn quest_tab_sprite(&self) -> Option<Icon>;
}

/// Host services every step needs, injected at construction
#[derive(Clone)]
pub struct StepContext {
    pub session: Arc<dyn SessionState>,
    pub ui: Arc<dyn UiExecutor>,
    pub icons: Arc<dyn IconResolver>,
    pub router: Arc<SessionEventRouter>,
    /// Variable whose 0/1 value marks the player being in a cutscene
    pub cutscene_variable: VariableId,
}

impl fmt::Debug for StepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("cutscene_variable", &self.cutscene_variable)
            .field("subscribers", &self.router.len())
            .finish_non_exhaustive()
    }
}
