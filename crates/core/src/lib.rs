//! Beacon core types – the BeaconSource resource, its condition machinery,
//! and owner-identity helpers shared by the reconciler.

#![forbid(unsafe_code)]

mod conditions;
mod eventtype;
mod owner;
mod source;
mod status;

pub use conditions::{
    Condition, ConditionManager, ConditionSet, ConditionSeverity, ConditionStatus,
    CONDITION_DEPLOYED, CONDITION_EVENT_TYPES_PROVIDED, CONDITION_READY, CONDITION_SINK_PROVIDED,
    SOURCE_CONDITIONS,
};
pub use eventtype::{EventType, EventTypeSpec};
pub use owner::{controller_reference, is_controlled_by, OwnerIdentity};
pub use source::{BeaconSource, BeaconSourceSpec, Destination, Reference};
pub use status::{deployment_is_available, BeaconSourceStatus};
