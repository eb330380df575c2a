#![cfg(feature = "save_kdbx4")]

use kdbx_rs::{db::fields, Database, DatabaseKey};

#[test]
fn entry_fields_round_trip_through_save_and_open() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::new();

    {
        let mut root = db.root_mut();

        let mut entry = root.create_entry();
        entry.set_unprotected(fields::TITLE, "Sample Entry");
        entry.set_unprotected(fields::USERNAME, "User Name");
        entry.set_protected(fields::PASSWORD, "Password");
        entry.set_unprotected("custom attribute", "data for custom attribute");
        drop(entry);

        let mut general = root.create_group("General");
        let mut subgroup = general.create_group("Subgroup");
        let mut nested = subgroup.create_entry();
        nested.set_unprotected(fields::TITLE, "test entry");
        nested.set_unprotected(fields::USERNAME, "jdoe");
        nested.set_protected(fields::PASSWORD, "nWuu5AtqsxqNhnYgLwoB");
    }

    let key = DatabaseKey::new().with_password("demopass");
    let mut buf = Vec::new();
    db.save(&mut buf, key.clone())?;

    let db = Database::parse(&buf, key)?;

    let entry = db
        .root()
        .entries()
        .find(|e| e.get_str(fields::TITLE) == Some("Sample Entry"))
        .expect("entry should round-trip");
    assert_eq!(entry.get_str(fields::USERNAME), Some("User Name"));
    assert_eq!(entry.get_str(fields::PASSWORD), Some("Password"));
    assert_eq!(entry.get_str("custom attribute"), Some("data for custom attribute"));

    let nested = db
        .root()
        .entries_recursive()
        .find(|e| e.get_str(fields::TITLE) == Some("test entry"))
        .expect("nested entry should round-trip");
    assert_eq!(nested.get_str(fields::USERNAME), Some("jdoe"));
    assert_eq!(nested.get_str(fields::PASSWORD), Some("nWuu5AtqsxqNhnYgLwoB"));

    Ok(())
}
