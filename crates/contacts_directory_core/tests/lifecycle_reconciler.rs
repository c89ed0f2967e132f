mod common;

use common::{open_catalog, EXCHANGE_AUTHORITY, EXCHANGE_PACKAGE};
use contacts_directory_core::{
    AccountRef, CallingPackage, DirectoryInfo, LifecycleEvent, LifecycleListener,
    LifecycleReconciler, DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID,
};
use std::sync::Arc;

const ACCOUNT_TYPE: &str = "com.example.exchange.account";

fn ids(catalog: &contacts_directory_core::DirectoryCatalog) -> Vec<i64> {
    catalog
        .list()
        .unwrap()
        .iter()
        .map(|record| record.id())
        .collect()
}

#[test]
fn removed_account_prunes_only_its_directories() {
    let catalog = open_catalog();
    let reconciler = LifecycleReconciler::new(Arc::clone(&catalog));
    let caller = CallingPackage::new(EXCHANGE_PACKAGE);
    let ada = AccountRef::new("ada@example.com", ACCOUNT_TYPE);
    let grace = AccountRef::new("grace@example.com", ACCOUNT_TYPE);

    let ada_id = catalog
        .insert(
            &DirectoryInfo::new(EXCHANGE_PACKAGE, EXCHANGE_AUTHORITY).with_account(&ada),
            &caller,
        )
        .unwrap();
    let grace_id = catalog
        .insert(
            &DirectoryInfo::new(EXCHANGE_PACKAGE, EXCHANGE_AUTHORITY).with_account(&grace),
            &caller,
        )
        .unwrap();
    let unbound_id = catalog
        .insert(&DirectoryInfo::new(EXCHANGE_PACKAGE, EXCHANGE_AUTHORITY), &caller)
        .unwrap();

    let removed = reconciler.on_accounts_changed(&[grace.clone()]).unwrap();

    assert_eq!(removed, 1);
    assert!(catalog.get(ada_id).unwrap().is_none());
    assert_eq!(
        ids(&catalog),
        vec![
            DEFAULT_DIRECTORY_ID,
            LOCAL_INVISIBLE_DIRECTORY_ID,
            grace_id,
            unbound_id
        ]
    );
}

#[test]
fn same_account_name_with_other_type_is_not_a_match() {
    let catalog = open_catalog();
    let reconciler = LifecycleReconciler::new(Arc::clone(&catalog));
    let caller = CallingPackage::new(EXCHANGE_PACKAGE);
    let ada = AccountRef::new("ada@example.com", ACCOUNT_TYPE);

    let id = catalog
        .insert(
            &DirectoryInfo::new(EXCHANGE_PACKAGE, EXCHANGE_AUTHORITY).with_account(&ada),
            &caller,
        )
        .unwrap();

    let other_type = AccountRef::new("ada@example.com", "com.example.other.account");
    let removed = reconciler.on_accounts_changed(&[other_type]).unwrap();

    assert_eq!(removed, 1);
    assert!(catalog.get(id).unwrap().is_none());
}

#[test]
fn uninstalled_package_loses_all_its_directories() {
    let catalog = open_catalog();
    let reconciler = LifecycleReconciler::new(Arc::clone(&catalog));

    catalog
        .insert(
            &DirectoryInfo::new(EXCHANGE_PACKAGE, EXCHANGE_AUTHORITY),
            &CallingPackage::new(EXCHANGE_PACKAGE),
        )
        .unwrap();
    catalog
        .insert(
            &DirectoryInfo::new(EXCHANGE_PACKAGE, "com.example.exchange.second"),
            &CallingPackage::new(EXCHANGE_PACKAGE),
        )
        .unwrap();
    let other_id = catalog
        .insert(
            &DirectoryInfo::new("com.example.ldap", "com.example.ldap.directory"),
            &CallingPackage::new("com.example.ldap"),
        )
        .unwrap();

    let removed = reconciler
        .handle(&LifecycleEvent::PackageUninstalled(
            EXCHANGE_PACKAGE.to_string(),
        ))
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(
        ids(&catalog),
        vec![DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID, other_id]
    );
}

#[test]
fn reserved_directories_survive_every_event() {
    let catalog = open_catalog();
    let reconciler = LifecycleReconciler::new(Arc::clone(&catalog));
    let contacts_package = catalog.contacts_package().to_string();

    assert_eq!(
        reconciler
            .handle(&LifecycleEvent::PackageUninstalled(contacts_package))
            .unwrap(),
        0
    );
    assert_eq!(
        reconciler
            .handle(&LifecycleEvent::AccountsChanged(Vec::new()))
            .unwrap(),
        0
    );
    assert_eq!(
        ids(&catalog),
        vec![DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID]
    );
}

#[test]
fn repeated_events_are_idempotent() {
    let catalog = open_catalog();
    let reconciler = LifecycleReconciler::new(Arc::clone(&catalog));
    let ada = AccountRef::new("ada@example.com", ACCOUNT_TYPE);
    catalog
        .insert(
            &DirectoryInfo::new(EXCHANGE_PACKAGE, EXCHANGE_AUTHORITY).with_account(&ada),
            &CallingPackage::new(EXCHANGE_PACKAGE),
        )
        .unwrap();

    let event = LifecycleEvent::AccountsChanged(Vec::new());
    assert_eq!(reconciler.handle(&event).unwrap(), 1);
    let after_first = ids(&catalog);
    assert_eq!(reconciler.handle(&event).unwrap(), 0);
    assert_eq!(ids(&catalog), after_first);

    let uninstall = LifecycleEvent::PackageUninstalled("com.example.missing".to_string());
    assert_eq!(reconciler.handle(&uninstall).unwrap(), 0);
    assert_eq!(ids(&catalog), after_first);
}
