mod audit;

pub use audit::AuditAction;
pub use audit::AuditActionType;
