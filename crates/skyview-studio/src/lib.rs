pub mod annotation;
pub mod config;
pub mod cut;
pub mod error;
pub mod frame;
pub mod import;
pub mod measure;
pub mod pointer;
pub mod session;
pub mod store;

pub use annotation::{Annotation, DEFAULT_ANNOTATION_TEXT};
pub use config::{SESSION_KEY, StudioConfig};
pub use cut::{CutPlane, CutRanges};
pub use error::{Result, StudioError};
pub use frame::{ClipPlane, FrameDriver};
pub use import::{ImportFormat, validate_import_path};
pub use measure::{MeasurementPhase, MeasurementResult};
pub use pointer::{PointerAction, PointerEvent, PointerHit, route_pointer_down};
pub use session::{
    FileStorage, MemoryStorage, SessionSnapshot, SessionStorage, load_session, save_session,
    try_load_session,
};
pub use store::{InteractionStore, StoreEvent, TransformMode};
