mod load;
mod model;
mod timeline;

pub use load::{AuthorDirectory, DebateData, TutorialStep, load_debate};
pub use model::{DebateEdge, DebateGraph, DebateNode, NodeKind, RelationKind};
pub use timeline::playback_duration_ms;

#[cfg(test)]
pub(crate) use model::test_fixtures;
