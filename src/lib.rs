//! `annotator`: the cursor, viewport and selection engine of a text annotator.
//!
//! ## Reading guide
//! - **`text::Text`**: the document (a rope) and its wrapped display lines.
//! - **`cursor::Cursor`** / **`viewport::Viewport`**: where the caret is and what is on screen.
//! - **`keys`**: turns one key gesture into a new caret/viewport snapshot plus effects.
//! - **`annotator::Annotator`**: owns all of the above and talks to the host through
//!   [`AnnotatorCallbacks`].
//! - **`anchors`**: the `<id>…</id>` markup that marks annotated spans.
//! - **`config`**: `annotator.toml`.

pub mod anchors;
pub mod annotator;
pub mod config;
pub mod cursor;
pub mod keys;
pub mod text;
pub mod types;
pub mod utils;
pub mod viewport;

pub use annotator::{Annotator, AnnotatorCallbacks};
pub use config::Config;
pub use keys::{Effect, Gesture, KeyInput, Modifiers, Outcome, Snapshot};
pub use text::Text;
pub use types::{DocumentPos, EditMode, Geometry, HighlightMode, HighlightSchema, ViewportPos};
