use std::thread;

use vellum_core::{AppError, StoreId};
use vellum_domain::{Capability, CapabilitySet, DefaultPolicy, ObjectRef, Privileges};

use crate::test_support::{FakeStore, grant, principal};

use super::{DynamicAccessor, DynamicObject, RecordType, TypedAccessor, TypedObject};

struct Document;

impl RecordType for Document {
    const CLASS_NAME: &'static str = "Document";
}

struct Ghost;

impl RecordType for Ghost {
    const CLASS_NAME: &'static str = "Ghost";
}

fn document_store() -> FakeStore {
    FakeStore::new("alice", &["Document"])
}

fn typed_object(object: ObjectRef) -> TypedObject<Document> {
    TypedObject::from_ref(object).unwrap_or_else(|_| unreachable!())
}

#[test]
fn defaults_hold_in_both_modes() {
    let store = document_store();
    let object = store.add_object("Document", 1);
    let typed = TypedAccessor::new(&store);
    let dynamic = DynamicAccessor::new(&store);

    let record_default = Privileges::new(DefaultPolicy::RECORD_TEMPLATE);
    assert_eq!(
        typed.privileges().unwrap_or_else(|_| unreachable!()),
        Privileges::new(CapabilitySet::ALL)
    );
    assert_eq!(
        typed
            .class_privileges::<Document>()
            .unwrap_or_else(|_| unreachable!()),
        record_default
    );
    assert_eq!(
        typed
            .object_privileges(&typed_object(object.clone()))
            .unwrap_or_else(|_| unreachable!()),
        record_default
    );
    assert_eq!(
        dynamic
            .class_privileges(Some("Document"))
            .unwrap_or_else(|_| unreachable!()),
        record_default
    );
    assert_eq!(
        dynamic
            .object_privileges(Some(&DynamicObject::from_ref(object)))
            .unwrap_or_else(|_| unreachable!()),
        record_default
    );
}

#[test]
fn class_grant_applies_to_members_only() {
    let store = document_store().with_role("editors", &["alice"]);
    store.grant_class("Document", grant("editors", &[Capability::Delete]));
    let typed = TypedAccessor::new(&store);

    let privileges = typed
        .class_privileges::<Document>()
        .unwrap_or_else(|_| unreachable!());
    assert!(privileges.can_delete());
    assert!(privileges.can_read());

    let outsider = FakeStore::new("bob", &["Document"]).with_role("editors", &["alice"]);
    outsider.grant_class("Document", grant("editors", &[Capability::Delete]));
    let privileges = TypedAccessor::new(&outsider)
        .class_privileges::<Document>()
        .unwrap_or_else(|_| unreachable!());
    assert!(!privileges.can_delete());
}

#[test]
fn closed_store_rejects_every_entry_point() {
    let store = document_store();
    let object = store.add_object("Document", 1);
    store.close();
    let typed = TypedAccessor::new(&store);
    let dynamic = DynamicAccessor::new(&store);

    assert!(matches!(typed.privileges(), Err(AppError::StoreClosed)));
    assert!(matches!(
        typed.class_privileges::<Document>(),
        Err(AppError::StoreClosed)
    ));
    assert!(matches!(
        typed.object_privileges(&typed_object(object.clone())),
        Err(AppError::StoreClosed)
    ));
    assert!(matches!(typed.permissions(), Err(AppError::StoreClosed)));
    assert!(matches!(
        typed.class_permissions::<Document>(),
        Err(AppError::StoreClosed)
    ));
    assert!(matches!(typed.roles(), Err(AppError::StoreClosed)));

    assert!(matches!(dynamic.privileges(), Err(AppError::StoreClosed)));
    assert!(matches!(
        dynamic.class_privileges(None),
        Err(AppError::StoreClosed)
    ));
    assert!(matches!(
        dynamic.object_privileges(None),
        Err(AppError::StoreClosed)
    ));
    assert!(matches!(
        dynamic.class_permissions(Some("Ghost")),
        Err(AppError::StoreClosed)
    ));
    assert!(matches!(
        dynamic.object_privileges(Some(&DynamicObject::from_ref(object))),
        Err(AppError::StoreClosed)
    ));
    assert!(matches!(dynamic.permissions(), Err(AppError::StoreClosed)));
    assert!(matches!(dynamic.roles(), Err(AppError::StoreClosed)));
}

#[test]
fn other_thread_is_rejected_at_every_entry_point() {
    let store = document_store();
    let object = store.add_object("Document", 2);
    let record = typed_object(object.clone());
    let dynamic_object = DynamicObject::from_ref(object);

    let outcomes = thread::scope(|scope| {
        scope
            .spawn(|| {
                let typed = TypedAccessor::new(&store);
                let dynamic = DynamicAccessor::new(&store);
                vec![
                    matches!(typed.privileges(), Err(AppError::WrongContext)),
                    matches!(
                        typed.class_privileges::<Document>(),
                        Err(AppError::WrongContext)
                    ),
                    matches!(
                        typed.object_privileges(&record),
                        Err(AppError::WrongContext)
                    ),
                    matches!(typed.permissions(), Err(AppError::WrongContext)),
                    matches!(
                        typed.class_permissions::<Document>(),
                        Err(AppError::WrongContext)
                    ),
                    matches!(typed.roles(), Err(AppError::WrongContext)),
                    matches!(dynamic.privileges(), Err(AppError::WrongContext)),
                    matches!(
                        dynamic.class_privileges(Some("Document")),
                        Err(AppError::WrongContext)
                    ),
                    matches!(
                        dynamic.object_privileges(Some(&dynamic_object)),
                        Err(AppError::WrongContext)
                    ),
                    matches!(dynamic.permissions(), Err(AppError::WrongContext)),
                    matches!(
                        dynamic.class_permissions(Some("Document")),
                        Err(AppError::WrongContext)
                    ),
                    matches!(dynamic.roles(), Err(AppError::WrongContext)),
                ]
            })
            .join()
            .unwrap_or_default()
    });

    assert_eq!(outcomes, vec![true; 12]);
    assert!(TypedAccessor::new(&store).privileges().is_ok());
}

#[test]
fn unknown_class_is_unknown_type() {
    let store = document_store();

    assert!(matches!(
        TypedAccessor::new(&store).class_privileges::<Ghost>(),
        Err(AppError::UnknownType(_))
    ));
    assert!(matches!(
        DynamicAccessor::new(&store).class_privileges(Some("Ghost")),
        Err(AppError::UnknownType(_))
    ));
    assert!(matches!(
        DynamicAccessor::new(&store).class_permissions(Some("Ghost")),
        Err(AppError::UnknownType(_))
    ));
}

#[test]
fn missing_dynamic_arguments_are_invalid() {
    let store = document_store();
    let dynamic = DynamicAccessor::new(&store);

    assert!(matches!(
        dynamic.class_privileges(None),
        Err(AppError::InvalidArgument(_))
    ));
    assert!(matches!(
        dynamic.class_privileges(Some("  ")),
        Err(AppError::InvalidArgument(_))
    ));
    assert!(matches!(
        dynamic.object_privileges(None),
        Err(AppError::InvalidArgument(_))
    ));
}

#[test]
fn standalone_object_is_unmanaged() {
    let store = document_store();

    assert!(matches!(
        TypedAccessor::new(&store).object_privileges(&TypedObject::<Document>::unmanaged(3_u64)),
        Err(AppError::UnmanagedObject)
    ));
    let standalone = DynamicObject::from_ref(ObjectRef::unmanaged("Document", 3_u64.into()));
    assert!(matches!(
        DynamicAccessor::new(&store).object_privileges(Some(&standalone)),
        Err(AppError::UnmanagedObject)
    ));
}

#[test]
fn deleted_object_is_unmanaged() {
    let store = document_store();
    let object = store.add_object("Document", 4);
    store.remove_object(&object);

    assert!(matches!(
        TypedAccessor::new(&store).object_privileges(&typed_object(object)),
        Err(AppError::UnmanagedObject)
    ));
}

#[test]
fn object_from_other_store_is_rejected() {
    let store = document_store();
    let foreign = ObjectRef::managed(StoreId::new(), "Document", 5_u64.into());

    assert!(matches!(
        TypedAccessor::new(&store).object_privileges(&typed_object(foreign.clone())),
        Err(AppError::CrossStoreReference)
    ));
    assert!(matches!(
        DynamicAccessor::new(&store).object_privileges(Some(&DynamicObject::from_ref(foreign))),
        Err(AppError::CrossStoreReference)
    ));
}

#[test]
fn typed_object_rejects_mismatched_class() {
    let result = TypedObject::<Document>::from_ref(ObjectRef::unmanaged("Invoice", 1_u64.into()));
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
}

#[test]
fn permission_containers_list_system_everyone_entry() {
    let store = document_store().with_role("editors", &["alice"]);
    store.grant_store(grant("editors", &[Capability::Read]));
    store.grant_class("Document", grant("editors", &[Capability::Delete]));
    let dynamic = DynamicAccessor::new(&store);

    let realm = dynamic.permissions().unwrap_or_default();
    assert_eq!(realm.permissions().len(), 2);
    let everyone = realm.permissions().entry_for(DefaultPolicy::EVERYONE_ROLE);
    assert!(everyone.is_some_and(|permission| permission.capabilities() == CapabilitySet::ALL));

    let class = TypedAccessor::new(&store)
        .class_permissions::<Document>()
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(class.name(), "Document");
    assert_eq!(class.permissions().len(), 2);
    let entry = class.permissions().entry_for("editors");
    assert!(entry.is_some_and(|permission| permission.can_delete()));
    let everyone = class.permissions().entry_for(DefaultPolicy::EVERYONE_ROLE);
    assert!(everyone.is_some_and(|permission| {
        permission.capabilities() == DefaultPolicy::RECORD_TEMPLATE
    }));
}

#[test]
fn explicit_everyone_entry_is_listed_once() {
    let store = document_store();
    store.grant_class(
        "Document",
        grant(DefaultPolicy::EVERYONE_ROLE, &[Capability::Query]),
    );

    let class = DynamicAccessor::new(&store)
        .class_permissions(Some("Document"))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(class.permissions().len(), 1);
    let everyone = class.permissions().entry_for(DefaultPolicy::EVERYONE_ROLE);
    assert!(everyone.is_some_and(|permission| {
        permission.capabilities() == CapabilitySet::of(&[Capability::Query])
    }));
}

#[test]
fn roles_include_everyone() {
    let store = document_store().with_role("editors", &["carol"]);
    let roles = DynamicAccessor::new(&store).roles().unwrap_or_default();

    assert_eq!(roles.len(), 2);
    let everyone = roles.iter().find(|role| role.is_everyone());
    let stranger = principal("zed");
    assert!(everyone.is_some_and(|role| role.has_member(&stranger)));
}
