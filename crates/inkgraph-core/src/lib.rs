//! inkgraph Core Library
//!
//! The editing core of the inkgraph vector editor: the document graph, snapshot
//! undo history, the change observer that keeps listeners in step with the graph,
//! and the connectivity operations that split and stitch lines.

pub mod editor;
pub mod graph;
pub mod hit;
pub mod history;
pub mod observer;
pub mod project;
pub mod shapes;
pub mod snap;
pub mod storage;

pub use editor::{
    Editor, EditorError, EditorEvent, EditorResult, ImportPayload, Selection, Session, ShapeBundle,
};
pub use graph::{GarbageStats, NodeId, collect_garbage};
pub use history::{Change, Direction, Edit, Field, History, Snapshot};
pub use observer::{Observer, RedrawTarget, Signal};
pub use project::{Options, Project};
pub use snap::{GRID_SIZE, SnapResult, snap_point, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
