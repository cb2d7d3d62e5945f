//! Generation store database schema.
//!
//! Each collection keeps its full record as a JSONB payload next to the
//! columns the queries filter and order on. The payload is the source of
//! truth; the columns are denormalized copies maintained on every write.

/// SQL to create the narrative-states table.
pub const CREATE_NARRATIVE_STATES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS narrative_states (
    id         UUID PRIMARY KEY,
    project_id UUID NOT NULL UNIQUE,
    payload    JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

/// SQL to create the scene-intents table.
pub const CREATE_SCENE_INTENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS scene_intents (
    id             UUID PRIMARY KEY,
    project_id     UUID NOT NULL,
    episode_number INTEGER NOT NULL,
    scene_number   INTEGER NOT NULL,
    status         VARCHAR(32) NOT NULL,
    payload        JSONB NOT NULL,
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (project_id, episode_number, scene_number)
);

CREATE INDEX IF NOT EXISTS idx_scene_intents_project_order
    ON scene_intents (project_id, episode_number, scene_number);

CREATE INDEX IF NOT EXISTS idx_scene_intents_project_status
    ON scene_intents (project_id, status);
";

/// SQL to create the scene-repairs table.
pub const CREATE_SCENE_REPAIRS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS scene_repairs (
    id         UUID PRIMARY KEY,
    project_id UUID NOT NULL,
    intent_id  UUID NOT NULL,
    status     VARCHAR(32) NOT NULL,
    payload    JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_scene_repairs_project_id
    ON scene_repairs (project_id);
";

/// SQL to create the dispatch-jobs table.
pub const CREATE_DISPATCH_JOBS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS dispatch_jobs (
    id          UUID PRIMARY KEY,
    project_id  UUID NOT NULL,
    kind        VARCHAR(32) NOT NULL,
    intent_id   UUID,
    payload     JSONB NOT NULL,
    enqueued_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_dispatch_jobs_project_kind
    ON dispatch_jobs (project_id, kind);
";

/// All table DDL, in creation order.
pub const ALL_TABLES: [&str; 4] = [
    CREATE_NARRATIVE_STATES_TABLE,
    CREATE_SCENE_INTENTS_TABLE,
    CREATE_SCENE_REPAIRS_TABLE,
    CREATE_DISPATCH_JOBS_TABLE,
];
