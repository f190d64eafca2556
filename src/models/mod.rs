//! Data models for Gatehouse

pub mod enums;
pub mod terminal;
pub mod visit;
pub mod visitor;

// Re-export commonly used types
pub use enums::{CheckoutOutcome, Language, VisitStatus, VisitType};
pub use terminal::{CheckoutMethod, FlowAction, Step, TerminalFlow};
pub use visit::{CreateVisit, Visit};
pub use visitor::{PresentVisitor, RegisterVisitor, TrainingStep, Visitor, VisitVisitor};
