//! Change feed over PostgreSQL `LISTEN`/`NOTIFY`.
//!
//! Every writer (this crate and the remote generation backend) wraps its
//! change events in a [`ChangeEnvelope`] and notifies [`CHANGE_CHANNEL`].
//! Subscribers listen on that channel and filter by project.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use showrunner_core::error::StoreError;
use showrunner_core::feed::{ChangeEvent, ChangeFeed, ChangeStream};
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// The notification channel all change events travel on.
pub const CHANGE_CHANNEL: &str = "showrunner_changes";

/// Wire form of one notification: the event plus its owning project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    /// Project the changed record belongs to.
    pub project_id: Uuid,
    /// The change itself.
    pub event: ChangeEvent,
}

/// Change feed backed by a dedicated `LISTEN` connection per subscription.
#[derive(Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
}

impl PgChangeFeed {
    /// Creates a feed over the given pool. Each subscription checks out its
    /// own listener connection.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self, project_id: Uuid) -> Result<ChangeStream, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|error| StoreError::Infrastructure(error.to_string()))?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(|error| StoreError::Infrastructure(error.to_string()))?;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(notification) => notification,
                    Err(error) => {
                        warn!(%project_id, %error, "change feed connection lost");
                        break;
                    }
                };
                let envelope: ChangeEnvelope =
                    match serde_json::from_str(notification.payload()) {
                        Ok(envelope) => envelope,
                        Err(error) => {
                            warn!(%error, "discarding malformed change notification");
                            continue;
                        }
                    };
                if envelope.project_id != project_id {
                    continue;
                }
                // Receiver dropped means the subscriber went away.
                if tx.send(envelope.event).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use showrunner_core::feed::{ChangeOp, ChangeRecord};
    use showrunner_core::intent::SceneStatus;
    use showrunner_test_support::scene_intent;

    use super::*;

    #[test]
    fn test_envelope_round_trips_through_json() {
        // Arrange
        let project_id = Uuid::new_v4();
        let intent = scene_intent(project_id, 2, 7, SceneStatus::Writing);
        let envelope = ChangeEnvelope {
            project_id,
            event: ChangeEvent {
                op: ChangeOp::Update,
                record: ChangeRecord::Intent(intent.clone()),
            },
        };

        // Act
        let wire = serde_json::to_string(&envelope).unwrap();
        let decoded: ChangeEnvelope = serde_json::from_str(&wire).unwrap();

        // Assert
        assert_eq!(decoded.project_id, project_id);
        assert!(matches!(decoded.event.op, ChangeOp::Update));
        match decoded.event.record {
            ChangeRecord::Intent(decoded_intent) => {
                assert_eq!(decoded_intent.id, intent.id);
                assert_eq!(decoded_intent.status, SceneStatus::Writing);
            }
            other => panic!("expected an intent record, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_tags_the_collection() {
        let project_id = Uuid::new_v4();
        let intent = scene_intent(project_id, 1, 1, SceneStatus::Pending);
        let envelope = ChangeEnvelope {
            project_id,
            event: ChangeEvent {
                op: ChangeOp::Insert,
                record: ChangeRecord::Intent(intent),
            },
        };

        let wire = serde_json::to_value(&envelope).unwrap();

        assert_eq!(wire["event"]["op"], "insert");
        assert_eq!(wire["event"]["record"]["collection"], "intent");
        assert_eq!(wire["event"]["record"]["status"], "pending");
    }
}
