use revmeta_types::{ItemId, SnapshotStamp};
use serde::{Deserialize, Serialize};

/// What role an item plays in the revision graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// The primary, live document.
    Canonical,
    /// An immutable point-in-time copy of a canonical item.
    Snapshot,
    /// The in-progress autosave of a canonical item.
    Draft,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Snapshot => "snapshot",
            Self::Draft => "draft",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "canonical" => Some(Self::Canonical),
            "snapshot" => Some(Self::Snapshot),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }
}

/// A stored content item.
///
/// Snapshots and drafts carry `parent = Some(..)`; canonical items never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub parent: Option<ItemId>,
    pub title: String,
    pub body: String,
    pub created: SnapshotStamp,
    pub modified_at: i64,
}

impl ContentItem {
    /// A new canonical item.
    pub fn canonical(
        title: impl Into<String>,
        body: impl Into<String>,
        created: SnapshotStamp,
    ) -> Self {
        Self {
            id: ItemId::new(),
            kind: ItemKind::Canonical,
            parent: None,
            title: title.into(),
            body: body.into(),
            created,
            modified_at: created.wall_time() as i64,
        }
    }

    /// A snapshot of `self`'s current body.
    pub fn snapshot_of(&self, created: SnapshotStamp) -> Self {
        Self {
            id: ItemId::new(),
            kind: ItemKind::Snapshot,
            parent: Some(self.id),
            title: self.title.clone(),
            body: self.body.clone(),
            created,
            modified_at: created.wall_time() as i64,
        }
    }

    /// An empty draft owned by `self`.
    pub fn draft_of(&self, created: SnapshotStamp) -> Self {
        Self {
            id: ItemId::new(),
            kind: ItemKind::Draft,
            parent: Some(self.id),
            title: self.title.clone(),
            body: self.body.clone(),
            created,
            modified_at: created.wall_time() as i64,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.kind == ItemKind::Snapshot
    }

    /// Whether title or body differ from `other`.
    pub fn content_differs(&self, other: &ContentItem) -> bool {
        self.title != other.title || self.body != other.body
    }
}
