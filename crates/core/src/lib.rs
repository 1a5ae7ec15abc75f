pub mod config;
pub mod filename;
pub mod items;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod rasterizer;
pub mod storage;
pub mod testing;
pub mod workspace;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ItemStoreBackendKind,
    SanitizedConfig, StorageBackendKind, UntrackedFilePolicy,
};
pub use filename::{is_pdf, output_key, parse_identifiers, FilenameIdentifiers};
pub use items::{
    AggregationOutcome, CompletionAggregator, ItemStore, OrderItemRecord, RealtimeDbItemStore,
    SqliteItemStore, StoreError,
};
pub use notifier::{NotificationError, Notifier, WebhookNotifier};
pub use pipeline::{
    ConversionEvent, EventOutcome, EventPipeline, EventReport, InputError, PipelineError,
    PushEnvelope, Stage, TrackingOutcome, TriggerSource,
};
pub use rasterizer::{
    ColorDepth, ConversionError, GhostscriptRasterizer, Rasterizer, RasterizerConfig,
    RenderOptions,
};
pub use storage::{GcsStorage, LocalStorage, ObjectStorage, TransferError};
pub use workspace::{delete_workspace, Workspace};
