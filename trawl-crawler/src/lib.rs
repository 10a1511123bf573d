//! Traversal of a virtualized, endlessly scrolling list.
//!
//! [`ListTraversal`] samples the rows currently rendered inside the list
//! container, handles each row it has not seen on this page, and scrolls
//! once a pass turns up nothing new. Titles are tested against a
//! [`MatchPolicy`]; matches are opened, confirmed by their
//! [`PageSignature`], and navigated back from.
pub mod foreground;
pub mod page;
pub mod policy;
pub mod seen;
pub mod settings;
pub mod traversal;

pub use foreground::ensure_foreground;
pub use page::PageSignature;
pub use policy::MatchPolicy;
pub use seen::SeenSet;
pub use settings::{DetailSettings, TraversalSettings};
pub use traversal::{
    CycleReport, ListTraversal, RowOutcome, StopReason, TraversalReport, TraversalStats,
};
