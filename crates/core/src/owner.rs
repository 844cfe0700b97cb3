//! Owner identity: the capability any resource needs to expose so children
//! can carry a controller owner reference back to it.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

/// Stable identity fields of a controlling owner. Implemented by any concrete
/// resource type that owns children; children are written against this trait,
/// not a concrete owner.
pub trait OwnerIdentity {
    fn api_version(&self) -> String;
    fn kind(&self) -> String;
    fn name(&self) -> String;
    fn namespace(&self) -> Option<String>;
    fn uid(&self) -> Option<String>;
}

/// Controller owner reference for a child of `owner`. The controller flag
/// makes ownership exclusive; block-owner-deletion ties garbage collection to
/// the owner's lifetime.
pub fn controller_reference(owner: &dyn OwnerIdentity) -> OwnerReference {
    OwnerReference {
        api_version: owner.api_version(),
        kind: owner.kind(),
        name: owner.name(),
        uid: owner.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Whether `meta` carries a controller owner reference pointing at `owner`.
/// Matches on UID; an owner without a UID controls nothing.
pub fn is_controlled_by(meta: &ObjectMeta, owner: &dyn OwnerIdentity) -> bool {
    let Some(uid) = owner.uid() else {
        return false;
    };
    meta.owner_references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|r| r.controller == Some(true) && r.uid == uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owner {
        name: String,
        uid: Option<String>,
    }

    impl OwnerIdentity for Owner {
        fn api_version(&self) -> String {
            "sources.beacon.dev/v1alpha1".into()
        }
        fn kind(&self) -> String {
            "BeaconSource".into()
        }
        fn name(&self) -> String {
            self.name.clone()
        }
        fn namespace(&self) -> Option<String> {
            Some("default".into())
        }
        fn uid(&self) -> Option<String> {
            self.uid.clone()
        }
    }

    #[test]
    fn controller_reference_round_trips_through_is_controlled_by() {
        let owner = Owner { name: "src".into(), uid: Some("abc".into()) };
        let meta = ObjectMeta {
            owner_references: Some(vec![controller_reference(&owner)]),
            ..Default::default()
        };
        assert!(is_controlled_by(&meta, &owner));

        let other = Owner { name: "src".into(), uid: Some("other".into()) };
        assert!(!is_controlled_by(&meta, &other));
    }

    #[test]
    fn non_controller_reference_does_not_count() {
        let owner = Owner { name: "src".into(), uid: Some("abc".into()) };
        let mut reference = controller_reference(&owner);
        reference.controller = Some(false);
        let meta = ObjectMeta {
            owner_references: Some(vec![reference]),
            ..Default::default()
        };
        assert!(!is_controlled_by(&meta, &owner));
    }

    #[test]
    fn owner_without_uid_controls_nothing() {
        let owner = Owner { name: "src".into(), uid: None };
        let meta = ObjectMeta {
            owner_references: Some(vec![controller_reference(&Owner {
                name: "src".into(),
                uid: Some("abc".into()),
            })]),
            ..Default::default()
        };
        assert!(!is_controlled_by(&meta, &owner));
    }
}
