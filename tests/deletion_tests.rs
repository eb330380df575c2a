use kdbx_rs::{db::fields, Database};

#[test]
fn test_deletion() {
    let mut db = Database::new();

    let (g1_id, g2_id, e1_id, e2_id, e3_id) = {
        let mut root = db.root_mut();

        let mut g1 = root.create_group("G1");
        let e1_id = g1.create_entry().id();

        let mut g2 = g1.create_group("G2");
        let e2_id = g2.create_entry().id();
        let g2_id = g2.id();
        drop(g2);

        let g1_id = g1.id();
        drop(g1);

        let e3_id = root.create_entry().id();

        (g1_id, g2_id, e1_id, e2_id, e3_id)
    };

    // Deleting a nested entry removes it from its group and logs a DeletedObject.
    db.delete_entry(e2_id).unwrap();

    assert!(db.entry(e2_id).is_none());
    assert_eq!(db.group(g2_id).unwrap().entries().count(), 0);
    assert_eq!(db.deleted_objects.len(), 1);
    assert_eq!(db.deleted_objects[0].uuid, e2_id.uuid());

    // Deleting a group cascades: G1 still contains E1 and the now-empty G2.
    db.delete_group(g1_id).unwrap();

    assert!(db.group(g1_id).is_none());
    assert!(db.group(g2_id).is_none());
    assert!(db.entry(e1_id).is_none());

    // Root now only has E3 left, and every removed node got a DeletedObject.
    assert_eq!(db.root().entries().count(), 1);
    assert_eq!(db.root().entries().next().unwrap().id(), e3_id);
    assert_eq!(db.deleted_objects.len(), 4);

    // Deleting an id that no longer exists (e2 was already removed above) is an error and does
    // not touch the log.
    assert!(db.delete_entry(e2_id).is_err());
    assert_eq!(db.deleted_objects.len(), 4);
}

#[test]
fn delete_routes_through_recycle_bin_until_already_trashed() {
    let mut db = Database::new();
    db.meta.recyclebin_enabled = Some(true);

    let entry_id = {
        let mut root = db.root_mut();
        let mut entry = root.create_entry();
        entry.set_unprotected(fields::TITLE, "Doomed");
        entry.id()
    };

    db.delete_entry(entry_id).unwrap();
    assert!(db.entry(entry_id).is_some(), "first delete moves to the recycle bin");
    assert!(db.deleted_objects.is_empty());

    db.delete_entry(entry_id).unwrap();
    assert!(db.entry(entry_id).is_none(), "second delete is a hard delete");
    assert_eq!(db.deleted_objects.len(), 1);
}
