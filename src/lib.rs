pub mod annotation;
pub mod bot;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod operation;

pub use annotation::{
    AnnotationEngine, AnnotationOutcome, AnnotationPipeline, RenderContext, RenderedResult,
};
pub use bot::{Bot, BotOptions, InteractionState, SelectionOutcome};
pub use config::BotConfig;
pub use dispatch::{DispatchProtocol, Selection};
pub use error::{ConfigurationError, DispatchError, RemoteError, RenderError, TransportError};
pub use models::{DetectionInstance, FaceAttributes, FaceRectangle, Point};
pub use operation::{OperationKind, OperationTable};
