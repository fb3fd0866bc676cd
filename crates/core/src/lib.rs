pub mod audit;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod notify;
pub mod source;
pub mod stage;
pub mod testing;
pub mod ticket;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, InMemoryAuditStore,
};
pub use broadcast::{BroadcastHub, FailureKind, PipelineEvent, SubscriberId, Subscription};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ProcessorMode,
    SanitizedConfig,
};
pub use engine::{EngineConfig, EngineError, PipelineEngine, RunOutcome};
pub use notify::{DeliveryStatus, EvidenceDraft, Notifier, NotifyError, WebhookNotifier};
pub use source::{
    JsonOwnershipDirectory, JsonTicketSource, OwnershipDirectory, OwnershipRecord, SourceError,
    StaticTicketSource, TicketSource,
};
pub use stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor, StageRegistry};
pub use ticket::{
    InMemoryTicketStore, PipelineStatus, RiskLevel, Stage, StageKind, StageStatus, Ticket,
    TicketError, TicketState, TicketStore,
};
