//! Produced scenes. Written by the Scene Writer, referenced by intents and
//! repairs, mirrored by the realtime observer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One finished scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Unique scene identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// The intent this scene fulfills.
    pub intent_id: Uuid,
    /// Episode this scene belongs to.
    pub episode_number: i32,
    /// Position within the episode.
    pub scene_number: i32,
    /// Scene text.
    pub content: String,
    /// Word count of `content`.
    pub word_count: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
